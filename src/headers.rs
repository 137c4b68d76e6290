//! Outgoing header sets for each transfer path.

use axum::http::header::{self, HeaderMap, HeaderValue};
use axum_extra::headers::{AcceptRanges, AccessControlAllowOrigin, ContentLength, ContentRange, HeaderMapExt};

use crate::range::ByteRange;
use crate::reference::ArchiveKind;

/// CORS and range advertisement, sent on every response.
pub fn error_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();
    headers.typed_insert(AccessControlAllowOrigin::ANY);
    headers.typed_insert(AcceptRanges::bytes());
    headers
}

fn archive_headers(kind: ArchiveKind) -> HeaderMap {
    let mut headers = error_headers();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static(kind.content_type()));
    headers.insert(header::CONTENT_DISPOSITION, HeaderValue::from_static(kind.content_disposition()));
    headers
}

/// Headers for a response relayed from a range-capable origin.
///
/// Length, range, encoding, redirect target and validator come from the
/// origin untouched, since the body is relayed byte for byte.
pub fn pass_through(kind: ArchiveKind, origin: &HeaderMap) -> HeaderMap {
    let mut headers = archive_headers(kind);
    let relayed = [
        header::CONTENT_LENGTH,
        header::CONTENT_RANGE,
        header::CONTENT_ENCODING,
        header::LOCATION,
        header::ETAG,
    ];
    for name in relayed {
        if let Some(value) = origin.get(&name) {
            headers.insert(name, value.clone());
        }
    }
    headers
}

/// Headers for a locally sliced response.
pub fn polyfill(kind: ArchiveKind, range: ByteRange, total_len: u64, etag: Option<HeaderValue>) -> HeaderMap {
    let mut headers = archive_headers(kind);
    // end < total_len is guaranteed by ByteRange::resolve
    if let Ok(content_range) = ContentRange::bytes(range.to_exclusive(), total_len) {
        headers.typed_insert(content_range);
    }
    headers.typed_insert(ContentLength(range.len()));
    if let Some(etag) = etag {
        headers.insert(header::ETAG, etag);
    }
    headers
}

/// Headers for a polyfilled object with no bytes at all.
pub fn polyfill_empty(kind: ArchiveKind, etag: Option<HeaderValue>) -> HeaderMap {
    let mut headers = archive_headers(kind);
    headers.typed_insert(ContentLength(0));
    if let Some(etag) = etag {
        headers.insert(header::ETAG, etag);
    }
    headers
}

#[cfg(test)]
mod tests {
    use axum::http::header::{HeaderMap, HeaderValue};

    use super::*;

    #[test]
    fn test_polyfill_headers() {
        let range = ByteRange { start: 100, end: 199 };
        let headers = polyfill(ArchiveKind::Wacz, range, 1000, Some(HeaderValue::from_static("\"abc\"")));

        assert_eq!("*", headers["access-control-allow-origin"]);
        assert_eq!("bytes", headers["accept-ranges"]);
        assert_eq!("binary/octet-stream", headers["content-type"]);
        assert_eq!("attachment; filename=\"archive.wacz\"", headers["content-disposition"]);
        assert_eq!("bytes 100-199/1000", headers["content-range"]);
        assert_eq!("100", headers["content-length"]);
        assert_eq!("\"abc\"", headers["etag"]);
    }

    #[test]
    fn test_polyfill_whole_object() {
        let headers = polyfill(ArchiveKind::WarcGz, ByteRange::whole(1000), 1000, None);

        assert_eq!("application/x-gzip", headers["content-type"]);
        assert_eq!("attachment; filename=\"archive.warc.gz\"", headers["content-disposition"]);
        assert_eq!("bytes 0-999/1000", headers["content-range"]);
        assert_eq!("1000", headers["content-length"]);
        assert!(headers.get("etag").is_none());
    }

    #[test]
    fn test_pass_through_copies_origin_fields() {
        let mut origin = HeaderMap::new();
        origin.insert("content-length", HeaderValue::from_static("100"));
        origin.insert("content-range", HeaderValue::from_static("bytes 100-199/1000"));
        origin.insert("etag", HeaderValue::from_static("W/\"v1\""));
        origin.insert("content-type", HeaderValue::from_static("text/plain"));
        origin.insert("set-cookie", HeaderValue::from_static("a=b"));

        let headers = pass_through(ArchiveKind::Wacz, &origin);

        assert_eq!("100", headers["content-length"]);
        assert_eq!("bytes 100-199/1000", headers["content-range"]);
        assert_eq!("W/\"v1\"", headers["etag"]);
        assert_eq!("binary/octet-stream", headers["content-type"]);
        assert!(headers.get("set-cookie").is_none());
    }

    #[test]
    fn test_pass_through_keeps_encoding_and_location() {
        let mut origin = HeaderMap::new();
        origin.insert("content-encoding", HeaderValue::from_static("gzip"));
        origin.insert("location", HeaderValue::from_static("/moved.wacz"));

        let headers = pass_through(ArchiveKind::Wacz, &origin);

        assert_eq!("gzip", headers["content-encoding"]);
        assert_eq!("/moved.wacz", headers["location"]);
    }

    #[test]
    fn test_pass_through_without_range() {
        let mut origin = HeaderMap::new();
        origin.insert("content-length", HeaderValue::from_static("1000"));

        let headers = pass_through(ArchiveKind::WarcGz, &origin);

        assert_eq!("1000", headers["content-length"]);
        assert!(headers.get("content-range").is_none());
        assert!(headers.get("etag").is_none());
        assert!(headers.get("content-encoding").is_none());
        assert_eq!("bytes", headers["accept-ranges"]);
    }
}
