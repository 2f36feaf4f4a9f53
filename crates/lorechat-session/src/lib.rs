//! Lorechat Conversation Session context.
//!
//! Responsible for the location → NPC → dialogue selection flow, history
//! hydration, optimistic echo of player messages and the reply round trip.
//! All session state lives in a single [`SessionStore`]; backend results are
//! applied only if they carry the store's current selection token.
//!
//! [`SessionStore`]: domain::aggregates::SessionStore

pub mod application;
pub mod domain;
