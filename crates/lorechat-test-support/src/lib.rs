//! Shared test backends and fixtures for lorechat.

mod backend;
pub mod fixtures;

pub use backend::{BackendCall, FailingBackend, InMemoryBackend};
