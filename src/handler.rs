//! axum routes and the per-request pipeline.

use std::sync::Arc;

use axum::extract::State;
use axum::http::header::{self, HeaderMap, HeaderValue};
use axum::http::{Method, StatusCode, Uri};
use axum::response::{IntoResponse, Response};
use axum::routing::any;
use axum::Router;

use crate::allowlist::HostAllowlist;
use crate::embed::{self, ORIGINAL_URL_PARAM};
use crate::error::ProxyError;
use crate::headers;
use crate::probe;
use crate::reference::{self, ArchiveFilter, ArchiveKind, ArchiveReference, ARCHIVE_URL_PARAM};
use crate::transfer;

const WACZ_PROXY_PATH: &str = "/proxy/wacz";

/// Shared, read-only state: the origin client and the host allowlist.
#[derive(Clone)]
pub struct ProxyState {
    client: reqwest::Client,
    allowlist: Arc<dyn HostAllowlist>,
}

impl ProxyState {
    /// `client` must not follow redirects, see [`OriginConfig::build_client`].
    ///
    /// [`OriginConfig::build_client`]: crate::config::OriginConfig::build_client
    pub fn new(client: reqwest::Client, allowlist: impl HostAllowlist + 'static) -> Self {
        ProxyState { client, allowlist: Arc::new(allowlist) }
    }
}

/// All endpoints. Every method is routed so that rejections carry the CORS headers.
pub fn router(state: ProxyState) -> Router {
    Router::new()
        .route("/proxy", any(proxy_any))
        .route(WACZ_PROXY_PATH, any(proxy_wacz))
        .route("/proxy/warc", any(proxy_warc))
        .route("/embed", any(embed_page))
        .with_state(state)
}

async fn proxy_any(State(state): State<ProxyState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    respond(serve_archive(&state, ArchiveFilter::Any, &method, &uri, &headers).await)
}

async fn proxy_wacz(State(state): State<ProxyState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    let filter = ArchiveFilter::Only(ArchiveKind::Wacz);
    respond(serve_archive(&state, filter, &method, &uri, &headers).await)
}

async fn proxy_warc(State(state): State<ProxyState>, method: Method, uri: Uri, headers: HeaderMap) -> Response {
    let filter = ArchiveFilter::Only(ArchiveKind::WarcGz);
    respond(serve_archive(&state, filter, &method, &uri, &headers).await)
}

async fn embed_page(State(state): State<ProxyState>, method: Method, uri: Uri) -> Response {
    respond(render_embed(&state, &method, &uri))
}

fn respond(result: Result<Response, ProxyError>) -> Response {
    result.unwrap_or_else(IntoResponse::into_response)
}

/// Validate, probe, then transfer. One request, two origin round trips at most.
#[tracing::instrument(skip_all, fields(%method, ?filter))]
pub async fn serve_archive(
    state: &ProxyState,
    filter: ArchiveFilter,
    method: &Method,
    uri: &Uri,
    headers: &HeaderMap,
) -> Result<Response, ProxyError> {
    reference::check_method(method)?;
    let raw = reference::query_param(uri.query(), ARCHIVE_URL_PARAM);
    let reference = ArchiveReference::parse(raw.as_deref(), filter, state.allowlist.as_ref())?;
    tracing::info!(url = %reference.url(), kind = %reference.kind(), "serving archive");

    let capability = probe::probe(&state.client, &reference).await?;
    transfer::transfer(&state.client, &reference, capability, method, headers).await
}

fn render_embed(state: &ProxyState, method: &Method, uri: &Uri) -> Result<Response, ProxyError> {
    reference::check_method(method)?;
    let archive = reference::query_param(uri.query(), ARCHIVE_URL_PARAM);
    let archive = ArchiveReference::parse(
        archive.as_deref(),
        ArchiveFilter::Only(ArchiveKind::Wacz),
        state.allowlist.as_ref(),
    )?;
    let original = embed::parse_original(reference::query_param(uri.query(), ORIGINAL_URL_PARAM).as_deref())?;

    let mut headers = headers::error_headers();
    headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("text/html; charset=utf-8"));
    let page = embed::render(&archive, &original, WACZ_PROXY_PATH);
    Ok((StatusCode::OK, headers, page).into_response())
}
