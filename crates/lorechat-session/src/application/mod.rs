//! Session application services.

pub mod conversation;
pub mod exchange;
pub mod history;
pub mod selection;
