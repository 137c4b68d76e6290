//! # archive-range-proxy
//!
//! HTTP range responses for web archives (`.wacz` and `.warc.gz`) served
//! through [`axum`][1], whether or not the origin hosting them supports ranges.
//!
//! Each request is validated against a [`HostAllowlist`], then the origin is
//! probed with a `HEAD`. Origins advertising `accept-ranges: bytes` and a
//! length get the client's request forwarded untouched. Everything else is
//! fetched whole and the requested [`ByteRange`] is sliced out locally,
//! always answered with `206 Partial Content`.
//!
//! ```no_run
//! use archive_range_proxy::config::OriginConfig;
//! use archive_range_proxy::{router, Allowlist, ProxyState};
//!
//! #[tokio::main]
//! async fn main() {
//!     let allowlist: Allowlist = ["archive.example.org"].into_iter().collect();
//!     let client = OriginConfig::default().build_client().unwrap();
//!     let app = router(ProxyState::new(client, allowlist));
//!
//!     // serve on localhost:8080
//!     let listener = tokio::net::TcpListener::bind("0.0.0.0:8080").await.unwrap();
//!     axum::serve(listener, app).await.unwrap();
//! }
//! ```
//!
//! [1]: https://docs.rs/axum

mod allowlist;
mod embed;
mod error;
mod handler;
mod headers;
mod probe;
mod range;
mod reference;
mod stream;
mod transfer;

pub mod config;

pub use allowlist::{Allowlist, HostAllowlist};
pub use error::{OriginError, ProxyError, ReferenceError};
pub use handler::{router, serve_archive, ProxyState};
pub use probe::{probe, OriginCapability};
pub use range::{ByteRange, RangeNotSatisfiable};
pub use reference::{ArchiveFilter, ArchiveKind, ArchiveReference};
pub use stream::RelayBody;
pub use transfer::{transfer, TransferPath};
