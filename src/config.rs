//! Start-up configuration.
//!
//! ```toml
//! listen = "0.0.0.0:8080"
//! allowed_hosts = ["archive.example.org"]
//! allowed_hosts_file = "/etc/archive-range-proxy/hosts.txt"
//!
//! [origin]
//! timeout_secs = 300
//! connect_timeout_secs = 10
//! ```

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;
use thiserror::Error;

use crate::allowlist::Allowlist;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", .path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to build origin client: {0}")]
    Client(#[from] reqwest::Error),
}

#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub listen: SocketAddr,
    pub allowed_hosts: Vec<String>,
    pub allowed_hosts_file: Option<PathBuf>,
    pub origin: OriginConfig,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            listen: SocketAddr::from(([0, 0, 0, 0], 8080)),
            allowed_hosts: Vec::new(),
            allowed_hosts_file: None,
            origin: OriginConfig::default(),
        }
    }
}

/// Transport settings for the origin client. These are the only deadlines applied.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OriginConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for OriginConfig {
    fn default() -> Self {
        OriginConfig {
            timeout_secs: 300,
            connect_timeout_secs: 10,
            user_agent: concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Config, ConfigError> {
        let text = read(path)?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse { path: path.to_path_buf(), source })
    }

    /// Inline hosts plus the contents of `allowed_hosts_file`, if set.
    pub fn allowlist(&self) -> Result<Allowlist, ConfigError> {
        let mut allowlist: Allowlist = self.allowed_hosts.iter().collect();
        if let Some(path) = &self.allowed_hosts_file {
            allowlist.extend_lines(&read(path)?);
        }
        Ok(allowlist)
    }
}

impl OriginConfig {
    pub fn build_client(&self) -> Result<reqwest::Client, ConfigError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(self.timeout_secs))
            .connect_timeout(Duration::from_secs(self.connect_timeout_secs))
            .user_agent(self.user_agent.as_str())
            // a redirect could leave the allowlist; 3xx is relayed or fails the probe
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(client)
    }
}

fn read(path: &Path) -> Result<String, ConfigError> {
    std::fs::read_to_string(path).map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })
}
