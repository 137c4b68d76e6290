//! Pass-through and polyfill transfer paths.
//!
//! A range-capable origin gets the client's request forwarded as-is and its
//! answer relayed. Any other origin is fetched whole, once, and the requested
//! range is cut out of the buffered body.

use axum::body::Body;
use axum::http::header::{self, HeaderMap};
use axum::http::{Method, StatusCode};
use axum::response::{IntoResponse, Response};
use bytes::Bytes;

use crate::error::{OriginError, ProxyError};
use crate::headers;
use crate::probe::OriginCapability;
use crate::range::ByteRange;
use crate::reference::ArchiveReference;
use crate::stream::RelayBody;

/// Request headers never sent on to the origin: the hop-by-hop set, plus
/// the host and length of the client's own request.
const NOT_FORWARDED: [&str; 10] = [
    "connection",
    "keep-alive",
    "proxy-authenticate",
    "proxy-authorization",
    "te",
    "trailer",
    "transfer-encoding",
    "upgrade",
    "host",
    "content-length",
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferPath {
    PassThrough,
    Polyfill,
}

impl TransferPath {
    pub fn choose(capability: &OriginCapability) -> Self {
        if capability.supports_range {
            TransferPath::PassThrough
        } else {
            TransferPath::Polyfill
        }
    }
}

/// Fetch the archive along the path `capability` calls for.
pub async fn transfer(
    client: &reqwest::Client,
    reference: &ArchiveReference,
    capability: OriginCapability,
    method: &Method,
    request_headers: &HeaderMap,
) -> Result<Response, ProxyError> {
    let path = TransferPath::choose(&capability);
    tracing::debug!(?path, "transferring");

    match path {
        TransferPath::PassThrough => pass_through(client, reference, method, request_headers).await,
        TransferPath::Polyfill => polyfill(client, reference, capability, method, request_headers).await,
    }
}

async fn pass_through(
    client: &reqwest::Client,
    reference: &ArchiveReference,
    method: &Method,
    request_headers: &HeaderMap,
) -> Result<Response, ProxyError> {
    let response = client
        .request(method.clone(), reference.url().clone())
        .headers(forwarded_headers(request_headers))
        .send()
        .await
        .map_err(OriginError::from)?;

    let status = response.status();
    let headers = headers::pass_through(reference.kind(), response.headers());
    tracing::debug!(%status, "relaying origin response");

    if method == Method::HEAD {
        return Ok((status, headers, Body::empty()).into_response());
    }
    Ok((status, headers, RelayBody::from_response(response)).into_response())
}

async fn polyfill(
    client: &reqwest::Client,
    reference: &ArchiveReference,
    capability: OriginCapability,
    method: &Method,
    request_headers: &HeaderMap,
) -> Result<Response, ProxyError> {
    // without a known length a HEAD cannot describe the range, so measure it
    let fetch_method = match capability.total_len {
        Some(_) => method.clone(),
        None => Method::GET,
    };

    let response = client
        .request(fetch_method.clone(), reference.url().clone())
        .send()
        .await
        .map_err(OriginError::from)?;

    let status = response.status();
    if !status.is_success() {
        return Err(OriginError::Status(status).into());
    }
    let etag = response.headers().get(header::ETAG).cloned();

    let body = if fetch_method == Method::GET {
        Some(response.bytes().await.map_err(OriginError::from)?)
    } else {
        None
    };

    let total_len = match (&body, capability.total_len) {
        (Some(body), Some(probed)) if body.len() as u64 != probed => {
            tracing::warn!(probed, measured = body.len(), "origin length changed since probe");
            body.len() as u64
        }
        (Some(body), None) => body.len() as u64,
        (_, Some(probed)) => probed,
        (None, None) => 0,
    };

    if total_len == 0 {
        let headers = headers::polyfill_empty(reference.kind(), etag);
        return Ok((StatusCode::OK, headers, Body::empty()).into_response());
    }

    let range_header = request_headers.get(header::RANGE).and_then(|value| value.to_str().ok());
    let range = ByteRange::resolve(range_header, total_len)?;
    tracing::debug!(start = range.start, end = range.end, total_len, "serving polyfilled range");

    let headers = headers::polyfill(reference.kind(), range, total_len, etag);
    let body = match body {
        Some(body) if method != Method::HEAD => Body::from(slice(body, range)),
        _ => Body::empty(),
    };

    Ok((StatusCode::PARTIAL_CONTENT, headers, body).into_response())
}

/// The client's request headers minus [`NOT_FORWARDED`] and any header
/// the client's `connection` field names.
fn forwarded_headers(request_headers: &HeaderMap) -> HeaderMap {
    let listed: Vec<String> = request_headers
        .get_all(header::CONNECTION)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(','))
        .map(|name| name.trim().to_ascii_lowercase())
        .filter(|name| !name.is_empty())
        .collect();

    let mut forwarded = request_headers.clone();
    for name in NOT_FORWARDED.iter().copied().chain(listed.iter().map(String::as_str)) {
        forwarded.remove(name);
    }
    forwarded
}

/// Inclusive slice; `range` has already been resolved against `body.len()`.
fn slice(body: Bytes, range: ByteRange) -> Bytes {
    let start = range.start as usize;
    let end = range.end as usize + 1;
    body.slice(start..end)
}
