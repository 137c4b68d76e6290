//! Origin capability probe.

use axum::http::header::{self, HeaderMap};

use crate::error::OriginError;
use crate::reference::ArchiveReference;

/// What a header-only probe learned about the origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OriginCapability {
    /// Origin advertises `accept-ranges: bytes` *and* a length.
    pub supports_range: bool,
    pub total_len: Option<u64>,
}

impl OriginCapability {
    pub fn from_headers(headers: &HeaderMap) -> Self {
        let total_len = headers
            .get(header::CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.trim().parse::<u64>().ok());

        let accepts_bytes = headers
            .get_all(header::ACCEPT_RANGES)
            .iter()
            .filter_map(|value| value.to_str().ok())
            .flat_map(|value| value.split(','))
            .any(|unit| unit.trim().eq_ignore_ascii_case("bytes"));

        OriginCapability {
            supports_range: accepts_bytes && total_len.is_some(),
            total_len,
        }
    }
}

/// Issue a `HEAD` to the origin. No client headers are forwarded.
pub async fn probe(client: &reqwest::Client, reference: &ArchiveReference) -> Result<OriginCapability, OriginError> {
    let response = client.head(reference.url().clone()).send().await?;

    let status = response.status();
    if !status.is_success() {
        return Err(OriginError::Status(status));
    }

    // read the header rather than `content_length()`, which reports the
    // (empty) body size for HEAD responses
    let capability = OriginCapability::from_headers(response.headers());
    tracing::debug!(
        url = %reference.url(),
        supports_range = capability.supports_range,
        total_len = ?capability.total_len,
        "probed origin",
    );
    Ok(capability)
}
