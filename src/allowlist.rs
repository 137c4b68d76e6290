//! Permitted origin hosts.

use std::collections::HashSet;

/// Read-only lookup of origin hostnames the proxy may fetch from.
///
/// Built once at start-up and shared between requests.
pub trait HostAllowlist: Send + Sync {
    /// Returns `true` if `host` may be used as an origin.
    fn contains(&self, host: &str) -> bool;
}

/// [`HostAllowlist`] over a fixed set of hostnames, compared case-insensitively.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Allowlist {
    hosts: HashSet<String>,
}

impl Allowlist {
    pub fn new() -> Self {
        Allowlist::default()
    }

    /// Add a hostname. Blank entries are ignored.
    pub fn insert(&mut self, host: &str) {
        let host = host.trim();
        if !host.is_empty() {
            self.hosts.insert(host.to_ascii_lowercase());
        }
    }

    /// Parses a newline-separated host list, skipping blank lines and `#` comments.
    pub fn parse_lines(text: &str) -> Self {
        let mut allowlist = Allowlist::new();
        allowlist.extend_lines(text);
        allowlist
    }

    pub fn extend_lines(&mut self, text: &str) {
        self.extend(text.lines().map(|line| line.split('#').next().unwrap_or_default()));
    }

    pub fn len(&self) -> usize {
        self.hosts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hosts.is_empty()
    }
}

impl<S: AsRef<str>> FromIterator<S> for Allowlist {
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        let mut allowlist = Allowlist::new();
        allowlist.extend(iter);
        allowlist
    }
}

impl<S: AsRef<str>> Extend<S> for Allowlist {
    fn extend<I: IntoIterator<Item = S>>(&mut self, iter: I) {
        for host in iter {
            self.insert(host.as_ref());
        }
    }
}

impl HostAllowlist for Allowlist {
    fn contains(&self, host: &str) -> bool {
        self.hosts.contains(&host.to_ascii_lowercase())
    }
}
