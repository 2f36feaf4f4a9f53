//! Lorechat Core: shared domain abstractions.
//!
//! This crate defines the world model, the error taxonomy and the backend
//! ports that every other crate depends on. It contains no infrastructure
//! code.

pub mod backend;
pub mod error;
pub mod model;
