//! History loader.
//!
//! Fetching and applying are separate steps: [`fetch_history`] touches no
//! session state and can run while the user keeps typing; [`apply_history`]
//! runs on the thread that owns the store and drops results whose token has
//! been superseded.

use lorechat_core::backend::{DialogueBackend, DialogueTurn};
use lorechat_core::error::ChatError;
use lorechat_core::model::{CharacterId, Message};
use tracing::{debug, instrument, warn};
use uuid::Uuid;

use crate::domain::aggregates::SessionStore;
use crate::domain::events::SelectionToken;

/// Identifies one history request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct HistoryTicket {
    /// Token the request was issued under.
    pub token: SelectionToken,
    /// The NPC whose history is requested.
    pub npc_id: CharacterId,
    /// Correlation ID of the `SelectNpc` command.
    pub correlation_id: Uuid,
}

/// A completed history fetch, not yet applied.
#[derive(Debug, Clone)]
pub struct HistoryFetched {
    /// The request this result answers.
    pub ticket: HistoryTicket,
    /// Raw turns, or the fetch error.
    pub result: Result<Vec<DialogueTurn>, ChatError>,
}

/// What applying a history result did to the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HistoryOutcome {
    /// The log now holds this many prior turns.
    Loaded(usize),
    /// The fetch failed; the conversation starts with an empty log.
    Unavailable(ChatError),
}

/// Fetches the history for `ticket`.
#[instrument(skip(backend), fields(npc_id = ticket.npc_id, token = %ticket.token))]
pub async fn fetch_history(ticket: HistoryTicket, backend: &dyn DialogueBackend) -> HistoryFetched {
    let result = backend.dialogue_history(ticket.npc_id).await;
    debug!(ok = result.is_ok(), "history fetch finished");
    HistoryFetched { ticket, result }
}

/// Applies a fetched history to the store.
///
/// On success the message log is replaced in one step, each turn's role
/// mapped from the server tag. On fetch failure the log stays empty and the
/// conversation proceeds without prior context.
///
/// # Errors
///
/// Returns `ChatError::StaleResponse` if a newer selection superseded the
/// ticket; the store is left untouched.
pub fn apply_history(
    fetched: HistoryFetched,
    store: &mut SessionStore,
) -> Result<HistoryOutcome, ChatError> {
    let HistoryFetched { ticket, result } = fetched;
    if let Err(stale) = store.ensure_current(ticket.token) {
        debug!(npc_id = ticket.npc_id, token = %ticket.token, "dropping stale history");
        return Err(stale);
    }

    match result {
        Ok(turns) => {
            let messages: Vec<Message> =
                turns.into_iter().map(DialogueTurn::into_message).collect();
            let count = store.replace_history(ticket.token, messages, ticket.correlation_id)?;
            debug!(npc_id = ticket.npc_id, count, "history applied");
            Ok(HistoryOutcome::Loaded(count))
        }
        Err(err) => {
            warn!(npc_id = ticket.npc_id, error = %err, "failed to load dialogue history");
            store.history_unavailable(ticket.token, err.clone(), ticket.correlation_id)?;
            Ok(HistoryOutcome::Unavailable(err))
        }
    }
}

/// Fetches and applies the history for `ticket` in one go.
///
/// # Errors
///
/// See [`apply_history`].
pub async fn load_history(
    ticket: HistoryTicket,
    backend: &dyn DialogueBackend,
    store: &mut SessionStore,
) -> Result<HistoryOutcome, ChatError> {
    let fetched = fetch_history(ticket, backend).await;
    apply_history(fetched, store)
}
