//! Validation of the `archive-url` query parameter.

use std::fmt;

use axum::http::Method;
use url::Url;

use crate::allowlist::HostAllowlist;
use crate::error::{ProxyError, ReferenceError};

pub const ARCHIVE_URL_PARAM: &str = "archive-url";

/// The two archive formats the proxy serves.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArchiveKind {
    Wacz,
    WarcGz,
}

impl ArchiveKind {
    pub fn suffix(self) -> &'static str {
        match self {
            ArchiveKind::Wacz => ".wacz",
            ArchiveKind::WarcGz => ".warc.gz",
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            ArchiveKind::Wacz => "binary/octet-stream",
            ArchiveKind::WarcGz => "application/x-gzip",
        }
    }

    pub fn content_disposition(self) -> &'static str {
        match self {
            ArchiveKind::Wacz => "attachment; filename=\"archive.wacz\"",
            ArchiveKind::WarcGz => "attachment; filename=\"archive.warc.gz\"",
        }
    }

    fn from_path(path: &str) -> Option<ArchiveKind> {
        [ArchiveKind::Wacz, ArchiveKind::WarcGz]
            .into_iter()
            .find(|kind| path.ends_with(kind.suffix()))
    }
}

impl fmt::Display for ArchiveKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.suffix())
    }
}

/// Which archive kinds an endpoint accepts.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveFilter {
    Any,
    Only(ArchiveKind),
}

impl ArchiveFilter {
    pub fn accepts(self, kind: ArchiveKind) -> bool {
        match self {
            ArchiveFilter::Any => true,
            ArchiveFilter::Only(only) => only == kind,
        }
    }
}

/// A validated, allowlisted archive location. Lives for one request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveReference {
    url: Url,
    kind: ArchiveKind,
}

impl ArchiveReference {
    pub fn url(&self) -> &Url {
        &self.url
    }

    pub fn scheme(&self) -> &str {
        self.url.scheme()
    }

    pub fn host(&self) -> &str {
        // validated non-empty at construction
        self.url.host_str().unwrap_or_default()
    }

    pub fn kind(&self) -> ArchiveKind {
        self.kind
    }

    /// Parse and check a raw `archive-url` value.
    pub fn parse(
        raw: Option<&str>,
        filter: ArchiveFilter,
        allowlist: &dyn HostAllowlist,
    ) -> Result<ArchiveReference, ReferenceError> {
        let raw = raw.ok_or(ReferenceError::Missing(ARCHIVE_URL_PARAM))?;
        let url = parse_http_url(raw)?;

        let kind = ArchiveKind::from_path(url.path())
            .filter(|kind| filter.accepts(*kind))
            .ok_or_else(|| ReferenceError::UnsupportedSuffix(url.path().to_string()))?;

        let host = url.host_str().ok_or(ReferenceError::MissingHost)?;
        if !allowlist.contains(host) {
            return Err(ReferenceError::HostNotAllowed(host.to_string()));
        }

        Ok(ArchiveReference { url, kind })
    }
}

/// Parse an absolute `http`/`https` URL.
pub fn parse_http_url(raw: &str) -> Result<Url, ReferenceError> {
    let url = Url::parse(raw.trim())?;
    match url.scheme() {
        "http" | "https" => Ok(url),
        other => Err(ReferenceError::UnsupportedScheme(other.to_string())),
    }
}

/// Only `GET` and `HEAD` reach the origin.
pub fn check_method(method: &Method) -> Result<(), ProxyError> {
    if method == Method::GET || method == Method::HEAD {
        Ok(())
    } else {
        Err(ProxyError::MethodNotAllowed(method.clone()))
    }
}

/// First value of `name` in a raw query string.
pub fn query_param(query: Option<&str>, name: &str) -> Option<String> {
    let query = query?;
    url::form_urlencoded::parse(query.as_bytes())
        .find(|(key, _)| key == name)
        .map(|(_, value)| value.into_owned())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::http::Method;

    use super::*;
    use crate::allowlist::Allowlist;

    fn allowlist() -> Allowlist {
        ["allowed.example", "127.0.0.1"].into_iter().collect()
    }

    fn parse(raw: &str, filter: ArchiveFilter) -> Result<ArchiveReference, ReferenceError> {
        ArchiveReference::parse(Some(raw), filter, &allowlist())
    }

    #[test]
    fn test_accepts_both_kinds_on_generic_endpoint() {
        let wacz = parse("https://allowed.example/foo.wacz", ArchiveFilter::Any).unwrap();
        assert_eq!(ArchiveKind::Wacz, wacz.kind());
        assert_eq!("allowed.example", wacz.host());
        assert_eq!("https", wacz.scheme());

        let warc = parse("http://allowed.example/a/b.warc.gz?x=1", ArchiveFilter::Any).unwrap();
        assert_eq!(ArchiveKind::WarcGz, warc.kind());
    }

    #[test]
    fn test_specialized_endpoint_rejects_other_kind() {
        let only_wacz = ArchiveFilter::Only(ArchiveKind::Wacz);
        let only_warc = ArchiveFilter::Only(ArchiveKind::WarcGz);

        assert!(parse("https://allowed.example/foo.wacz", only_wacz).is_ok());
        assert_matches!(
            parse("https://allowed.example/foo.warc.gz", only_wacz),
            Err(ReferenceError::UnsupportedSuffix(_))
        );
        assert_matches!(
            parse("https://allowed.example/foo.wacz", only_warc),
            Err(ReferenceError::UnsupportedSuffix(_))
        );
    }

    #[test]
    fn test_rejections() {
        assert_matches!(
            ArchiveReference::parse(None, ArchiveFilter::Any, &allowlist()),
            Err(ReferenceError::Missing("archive-url"))
        );
        assert_matches!(parse("not a url", ArchiveFilter::Any), Err(ReferenceError::Malformed(_)));
        assert_matches!(parse("/relative/foo.wacz", ArchiveFilter::Any), Err(ReferenceError::Malformed(_)));
        assert_matches!(
            parse("ftp://allowed.example/foo.wacz", ArchiveFilter::Any),
            Err(ReferenceError::UnsupportedScheme(scheme)) if scheme == "ftp"
        );
        assert_matches!(
            parse("https://allowed.example/foo.zip", ArchiveFilter::Any),
            Err(ReferenceError::UnsupportedSuffix(_))
        );
        assert_matches!(
            parse("https://allowed.example/foo.warc", ArchiveFilter::Any),
            Err(ReferenceError::UnsupportedSuffix(_))
        );
        assert_matches!(
            parse("https://blocked.example/foo.wacz", ArchiveFilter::Any),
            Err(ReferenceError::HostNotAllowed(host)) if host == "blocked.example"
        );
    }

    #[test]
    fn test_suffix_is_matched_on_path_not_query() {
        assert_matches!(
            parse("https://allowed.example/download?file=foo.wacz", ArchiveFilter::Any),
            Err(ReferenceError::UnsupportedSuffix(_))
        );
    }

    #[test]
    fn test_check_method() {
        assert!(check_method(&Method::GET).is_ok());
        assert!(check_method(&Method::HEAD).is_ok());
        for method in [Method::POST, Method::PUT, Method::DELETE, Method::OPTIONS] {
            assert_matches!(check_method(&method), Err(ProxyError::MethodNotAllowed(_)));
        }
    }

    #[test]
    fn test_query_param_decodes() {
        let query = Some("archive-url=https%3A%2F%2Fallowed.example%2Ffoo.wacz&other=1");
        assert_eq!(
            Some("https://allowed.example/foo.wacz".to_string()),
            query_param(query, "archive-url")
        );
        assert_eq!(None, query_param(query, "original-url"));
        assert_eq!(None, query_param(None, "archive-url"));
    }
}
