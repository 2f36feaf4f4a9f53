//! Catalog application services.

pub mod load_handlers;
