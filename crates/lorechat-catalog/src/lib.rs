//! Lorechat World Catalog.
//!
//! Holds the locations and characters fetched from the backend. The
//! conversation core only reads from it once it has been loaded.

pub mod application;
pub mod domain;
