//! Catalog domain types.

pub mod catalog;
