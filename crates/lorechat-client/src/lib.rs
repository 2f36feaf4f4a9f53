//! HTTP client for the dialogue backend.
//!
//! [`HttpBackend`] implements the backend ports from `lorechat-core` over
//! the backend's REST API with `reqwest`.

mod http_backend;

pub use http_backend::HttpBackend;
