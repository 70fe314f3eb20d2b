mod client;
mod http_trait;
pub mod structs;
#[cfg(feature = "reqwest-client")]
mod reqwest_impl;

pub use client::IndexerClient;
pub use http_trait::HttpClient;

#[cfg(feature = "reqwest-client")]
pub use reqwest_impl::ReqwestClient;
