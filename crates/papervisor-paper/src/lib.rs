//! PaperMC build registry and player identity clients.
//!
//! `PaperClient` implements the core `BuildMetadataSource` and
//! `BinaryFetcher` ports; `IdentityClient` implements `IdentityResolver`.
//! Everything HTTP-specific stays inside this crate.

mod client;
mod config;
mod error;
mod http;
mod identity;
mod models;
mod port;
mod url;

pub use client::{DefaultPaperClient, PARTIAL_SUFFIX, PaperClient};
pub use config::{
    DEFAULT_GEYSER_API_URL, DEFAULT_MOJANG_API_URL, DEFAULT_PAPER_API_URL, PaperClientConfig,
};
pub use error::{PaperError, PaperResult};
pub use http::{HttpBackend, ReqwestBackend};
pub use identity::{DefaultIdentityClient, IdentityClient, bare_gamertag};
