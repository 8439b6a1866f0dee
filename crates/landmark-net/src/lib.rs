//! Landmark Network Layer
//!
//! Whole-document retrieval for feature sources:
//! 1. Location is classified (http/https URL, file URL, or path)
//! 2. HTTP(S) goes through a hyper client with rustls
//! 3. Paths are read with tokio's filesystem API
//! 4. Non-2xx responses are errors, never partial documents

mod client;
mod source;

pub use client::{HttpClient, HttpClientConfig, HttpError, Response};
pub use source::{FetchError, Location, MemoryFetcher, ResourceFetcher, SourceFetcher};
