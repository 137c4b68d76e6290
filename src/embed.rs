//! Static replay page for a single WACZ archive.

use url::Url;

use crate::error::ReferenceError;
use crate::reference::{self, ArchiveReference, ARCHIVE_URL_PARAM};

pub const ORIGINAL_URL_PARAM: &str = "original-url";

const TEMPLATE: &str = include_str!("static/embed.html");

/// Render the embed page. `proxy_path` is the route the page loads the archive through.
pub fn render(archive: &ArchiveReference, original: &Url, proxy_path: &str) -> String {
    let proxy_url = format!(
        "{proxy_path}?{}",
        url::form_urlencoded::Serializer::new(String::new())
            .append_pair(ARCHIVE_URL_PARAM, archive.url().as_str())
            .finish()
    );

    TEMPLATE
        .replace("{{ARCHIVE_URL}}", &escape(archive.url().as_str()))
        .replace("{{ORIGINAL_URL}}", &escape(original.as_str()))
        .replace("{{PROXY_URL}}", &escape(&proxy_url))
}

/// The `original-url` parameter: any absolute http(s) URL.
pub fn parse_original(raw: Option<&str>) -> Result<Url, ReferenceError> {
    let raw = raw.ok_or(ReferenceError::Missing(ORIGINAL_URL_PARAM))?;
    reference::parse_http_url(raw)
}

fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            c => escaped.push(c),
        }
    }
    escaped
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;
    use crate::allowlist::Allowlist;
    use crate::reference::{ArchiveFilter, ArchiveKind};

    #[test]
    fn test_render_substitutes_every_placeholder() {
        let allowlist: Allowlist = ["allowed.example"].into_iter().collect();
        let archive = ArchiveReference::parse(
            Some("https://allowed.example/a.wacz"),
            ArchiveFilter::Only(ArchiveKind::Wacz),
            &allowlist,
        )
        .unwrap();
        let original = parse_original(Some("https://news.example/story?id=1&lang=en")).unwrap();

        let page = render(&archive, &original, "/proxy/wacz");

        assert!(!page.contains("{{"), "unsubstituted placeholder in:\n{page}");
        assert!(page.contains("href=\"https://allowed.example/a.wacz\""));
        assert!(page.contains("url=\"https://news.example/story?id=1&amp;lang=en\""));
        assert!(page.contains(
            "source=\"/proxy/wacz?archive-url=https%3A%2F%2Fallowed.example%2Fa.wacz\""
        ));
    }

    #[test]
    fn test_escape() {
        assert_eq!("&lt;a href=&quot;x&quot;&gt;&amp;&#39;", escape("<a href=\"x\">&'"));
    }

    #[test]
    fn test_original_url_required() {
        assert_matches!(parse_original(None), Err(ReferenceError::Missing("original-url")));
        assert_matches!(parse_original(Some("javascript:alert(1)")), Err(ReferenceError::UnsupportedScheme(_)));
    }
}
