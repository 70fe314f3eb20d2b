//! HTTP backend talking to a silent payment indexer.
//!
//! [`SpIndexerBackend`] implements [`spdetect_core::IndexerBackend`] on top of
//! [`IndexerClient`], which is generic over the [`HttpClient`] doing the actual
//! requests.

mod backend;
pub mod client;
pub mod error;

pub use backend::{IndexerConfig, SpIndexerBackend};
pub use client::{HttpClient, IndexerClient};

#[cfg(feature = "reqwest-client")]
pub use client::ReqwestClient;
