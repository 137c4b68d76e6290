//! Single byte-range resolution for the polyfill path.
//!
//! Only `bytes=<start>-<end>` is understood. Anything else the client sends
//! (suffix ranges, multiple ranges, other units, garbage) falls back to the
//! whole object, which is always a correct answer to a range request.

/// An inclusive byte interval within an object of known size.
///
/// Always `start <= end`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ByteRange {
    pub start: u64,
    pub end: u64,
}

impl ByteRange {
    /// The range spanning an object of `total_len` bytes. `total_len` must be non-zero.
    pub fn whole(total_len: u64) -> Self {
        debug_assert!(total_len > 0);
        ByteRange { start: 0, end: total_len - 1 }
    }

    pub fn len(&self) -> u64 {
        self.end - self.start + 1
    }

    /// Half-open form, for `ContentRange::bytes` and slicing.
    pub fn to_exclusive(&self) -> std::ops::Range<u64> {
        self.start..self.end + 1
    }

    /// Resolve a raw `Range` header against an object of `total_len` bytes.
    ///
    /// Returns [`RangeNotSatisfiable`] only when the requested start lies at
    /// or past the end of the object.
    pub fn resolve(header: Option<&str>, total_len: u64) -> Result<ByteRange, RangeNotSatisfiable> {
        if total_len == 0 {
            return Err(RangeNotSatisfiable { complete_length: 0 });
        }
        let whole = ByteRange::whole(total_len);

        let Some(byte_ranges) = header.and_then(|h| h.trim().strip_prefix("bytes=")) else {
            return Ok(whole);
        };
        if byte_ranges.contains(',') {
            tracing::debug!(range = byte_ranges, "multiple ranges requested, serving whole object");
            return Ok(whole);
        }
        let Some((start, end)) = byte_ranges.split_once('-') else {
            return Ok(whole);
        };
        let Ok(start) = start.trim().parse::<u64>() else {
            return Ok(whole);
        };

        if start >= total_len {
            return Err(RangeNotSatisfiable { complete_length: total_len });
        }

        let end = end
            .trim()
            .parse::<u64>()
            .ok()
            .filter(|end| *end < total_len)
            .unwrap_or(whole.end);

        if end < start {
            return Ok(whole);
        }

        Ok(ByteRange { start, end })
    }
}

/// The requested start offset is beyond the object. Answered with `416`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("range not satisfiable for {complete_length} bytes")]
pub struct RangeNotSatisfiable {
    pub complete_length: u64,
}

#[test]
fn test_resolve_range_header() {
    fn unsatisfiable(complete_length: u64) -> Result<ByteRange, RangeNotSatisfiable> {
        Err(RangeNotSatisfiable { complete_length })
    }

    let tests = [
        (None, 1000, Ok(ByteRange { start: 0, end: 999 })),
        (Some("bytes=100-199"), 1000, Ok(ByteRange { start: 100, end: 199 })),
        (Some("bytes=0-0"), 1000, Ok(ByteRange { start: 0, end: 0 })),
        (Some("bytes=999-999"), 1000, Ok(ByteRange { start: 999, end: 999 })),
        (Some(" bytes=10-20 "), 1000, Ok(ByteRange { start: 10, end: 20 })),
        (Some("bytes=500-"), 1000, Ok(ByteRange { start: 500, end: 999 })),
        (Some("bytes=500-abc"), 1000, Ok(ByteRange { start: 500, end: 999 })),
        (Some("bytes=0-24646"), 1000, Ok(ByteRange { start: 0, end: 999 })),
        (Some("bytes=0-1000"), 1000, Ok(ByteRange { start: 0, end: 999 })),
        (Some("bytes=-100"), 1000, Ok(ByteRange { start: 0, end: 999 })),
        (Some("bytes=0-4,-1"), 1000, Ok(ByteRange { start: 0, end: 999 })),
        (Some("bytes=200-100"), 1000, Ok(ByteRange { start: 0, end: 999 })),
        (Some("bleets=100-324"), 1000, Ok(ByteRange { start: 0, end: 999 })),
        (Some("none"), 1000, Ok(ByteRange { start: 0, end: 999 })),
        (Some("bytes="), 1000, Ok(ByteRange { start: 0, end: 999 })),
        (Some("bytes=1000-1200"), 1000, unsatisfiable(1000)),
        (Some("bytes=5000-"), 1000, unsatisfiable(1000)),
        (None, 0, unsatisfiable(0)),
    ];

    for (i, (range_header, total_len, expected)) in tests.iter().enumerate() {
        let result = ByteRange::resolve(*range_header, *total_len);
        assert_eq!(result, *expected, "Failed to resolve range header #{i}: {:?}", range_header);
    }
}

#[cfg(test)]
mod tests {
    use super::ByteRange;

    #[test]
    fn test_resolved_range_stays_in_bounds() {
        let headers = ["bytes=0-", "bytes=3-3", "bytes=7-100", "bytes=9-", "bytes=x-y", "bytes=4-2"];
        for total_len in 1..=12u64 {
            for header in headers {
                if let Ok(range) = ByteRange::resolve(Some(header), total_len) {
                    assert!(range.end >= range.start, "{header} / {total_len}: {range:?}");
                    assert!(range.end < total_len, "{header} / {total_len}: {range:?}");
                }
            }
        }
    }

    #[test]
    fn test_unsatisfiable_is_an_error() {
        let error = ByteRange::resolve(Some("bytes=10-"), 10).unwrap_err();
        let source: &dyn std::error::Error = &error;
        assert_eq!("range not satisfiable for 10 bytes", source.to_string());
    }

    #[test]
    fn test_len_matches_inclusive_bounds() {
        let range = ByteRange { start: 100, end: 199 };
        assert_eq!(100, range.len());
        assert_eq!(100..200, range.to_exclusive());
        assert_eq!(1, ByteRange::whole(1).len());
    }
}
