//! Message exchanger.
//!
//! A send is split into three steps so that the round trip can run while
//! the owner of the store keeps handling input:
//!
//! 1. [`handle_send`] trims the input, handles `exit`, echoes the player's
//!    message and returns a [`PendingReply`];
//! 2. [`deliver`] performs the round trip without touching the store;
//! 3. [`apply_reply`] appends the NPC's answer, or records the failure,
//!    unless the selection changed in the meantime.
//!
//! Only one round trip may be outstanding per session. A send while a
//! history load or another reply is pending fails with `SessionBusy`.

use lorechat_core::backend::{DialogueBackend, TurnReply, TurnRequest};
use lorechat_core::error::ChatError;
use tracing::{debug, info, instrument, warn};
use uuid::Uuid;

use crate::application::selection::handle_exit;
use crate::domain::aggregates::{SessionStore, Stage};
use crate::domain::commands::{ExitConversation, RetryUnanswered, SendMessage, SessionCommand};
use crate::domain::events::SelectionToken;

/// Input that closes the conversation instead of being sent.
pub const EXIT_COMMAND: &str = "exit";

/// A player turn waiting to be delivered.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingReply {
    /// Token the turn was sent under.
    pub token: SelectionToken,
    /// Correlation ID of the command that produced the turn.
    pub correlation_id: Uuid,
    /// What goes over the wire.
    pub request: TurnRequest,
}

/// A completed round trip, not yet applied.
#[derive(Debug, Clone)]
pub struct ReplyReceived {
    /// The turn this result answers.
    pub pending: PendingReply,
    /// Backend reply or transport error.
    pub result: Result<TurnReply, ChatError>,
}

/// What `handle_send` did with the input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendStep {
    /// Blank input: nothing happened.
    Ignored,
    /// The input was the exit command; the conversation was closed.
    Exited,
    /// The player's message was echoed; the turn must now be delivered.
    Dispatched(PendingReply),
}

/// Result of a full send round trip.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SendOutcome {
    /// Blank input: nothing happened.
    Ignored,
    /// The conversation was closed.
    Exited,
    /// The NPC answered with this text.
    Replied(String),
}

/// Handles `SendMessage` up to the point where the turn must be delivered.
///
/// # Errors
///
/// - `ChatError::InvalidSelection` outside a conversation;
/// - `ChatError::SessionBusy` while another backend operation is pending.
///
/// No state changes on error.
#[instrument(skip_all, fields(correlation_id = %command.correlation_id))]
pub fn handle_send(command: &SendMessage, store: &mut SessionStore) -> Result<SendStep, ChatError> {
    let text = command.raw_text.trim();
    if text.is_empty() {
        return Ok(SendStep::Ignored);
    }
    if text.eq_ignore_ascii_case(EXIT_COMMAND) {
        handle_exit(
            &ExitConversation {
                correlation_id: command.correlation_id(),
            },
            store,
        )?;
        return Ok(SendStep::Exited);
    }

    let request = turn_request(store, text)?;
    if store.is_busy() {
        return Err(ChatError::SessionBusy);
    }

    let token = store.echo_player(request.message.clone(), command.correlation_id());
    debug!(command = command.command_type(), %token, "player message echoed");
    Ok(SendStep::Dispatched(PendingReply {
        token,
        correlation_id: command.correlation_id(),
        request,
    }))
}

/// Handles `RetryUnanswered`: resends the last player message if it never
/// got an answer. The message is not echoed again.
///
/// # Errors
///
/// - `ChatError::InvalidSelection` outside a conversation;
/// - `ChatError::SessionBusy` while another backend operation is pending;
/// - `ChatError::NothingToRetry` unless the last message is a player
///   message whose round trip failed in this run.
pub fn handle_retry(
    command: &RetryUnanswered,
    store: &mut SessionStore,
) -> Result<PendingReply, ChatError> {
    if store.stage() != Stage::InConversation {
        return Err(ChatError::InvalidSelection(
            "there is no conversation to retry in".to_owned(),
        ));
    }
    if store.is_busy() {
        return Err(ChatError::SessionBusy);
    }
    let text = store
        .unanswered_player_text()
        .ok_or(ChatError::NothingToRetry)?
        .to_owned();
    let request = turn_request(store, &text)?;

    let token = store.retry_reply(text, command.correlation_id());
    info!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        %token,
        "retrying unanswered message"
    );
    Ok(PendingReply {
        token,
        correlation_id: command.correlation_id(),
        request,
    })
}

/// Performs the round trip for `pending`.
#[instrument(skip_all, fields(correlation_id = %pending.correlation_id, token = %pending.token))]
pub async fn deliver(pending: PendingReply, backend: &dyn DialogueBackend) -> ReplyReceived {
    let result = backend.send_turn(&pending.request).await;
    debug!(ok = result.is_ok(), "round trip finished");
    ReplyReceived { pending, result }
}

/// Applies a completed round trip to the store.
///
/// Returns the NPC's text when it was appended. A transport failure or an
/// empty reply is recorded as `ReplyFailed` and returned; the player's
/// message stays in the log.
///
/// # Errors
///
/// - `ChatError::StaleResponse` if the selection changed since the send;
///   the store is left untouched;
/// - the round-trip error (`NetworkFailure`, `Backend`,
///   `MalformedResponse`, `EmptyReply`).
pub fn apply_reply(received: ReplyReceived, store: &mut SessionStore) -> Result<String, ChatError> {
    let ReplyReceived { pending, result } = received;
    if let Err(stale) = store.ensure_current(pending.token) {
        debug!(token = %pending.token, "dropping stale reply");
        return Err(stale);
    }

    match result.and_then(TurnReply::into_text) {
        Ok(text) => {
            store.append_reply(pending.token, text.clone(), pending.correlation_id)?;
            Ok(text)
        }
        Err(err) => {
            warn!(
                correlation_id = %pending.correlation_id,
                error = %err,
                "dialogue round trip failed"
            );
            store.reply_failed(pending.token, err.clone(), pending.correlation_id)?;
            Err(err)
        }
    }
}

/// Runs a full send: echo, round trip, apply.
///
/// # Errors
///
/// See [`handle_send`] and [`apply_reply`].
pub async fn send(
    command: &SendMessage,
    store: &mut SessionStore,
    backend: &dyn DialogueBackend,
) -> Result<SendOutcome, ChatError> {
    match handle_send(command, store)? {
        SendStep::Ignored => Ok(SendOutcome::Ignored),
        SendStep::Exited => Ok(SendOutcome::Exited),
        SendStep::Dispatched(pending) => {
            let received = deliver(pending, backend).await;
            apply_reply(received, store).map(SendOutcome::Replied)
        }
    }
}

fn turn_request(store: &SessionStore, text: &str) -> Result<TurnRequest, ChatError> {
    let session = store.session();
    match (session.selected_npc_id, session.selected_location_id) {
        (Some(character_id), Some(location_id)) => Ok(TurnRequest {
            character_id,
            location_id,
            message: text.to_owned(),
        }),
        _ => Err(ChatError::InvalidSelection(
            "choose an NPC before sending messages".to_owned(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use lorechat_catalog::domain::catalog::WorldCatalog;
    use lorechat_core::model::Message;
    use lorechat_test_support::{BackendCall, FailingBackend, InMemoryBackend, fixtures};

    use super::*;
    use crate::application::history::load_history;
    use crate::application::selection::{handle_select_location, handle_select_npc};
    use crate::domain::commands::{SelectLocation, SelectNpc};
    use crate::domain::events::SessionEventKind;

    async fn talking_to_bram(backend: &InMemoryBackend) -> SessionStore {
        let catalog = WorldCatalog::with_contents(fixtures::locations(), fixtures::characters());
        let mut store = SessionStore::new();
        handle_select_location(&SelectLocation::new(1), &catalog, &mut store).unwrap();
        let ticket = handle_select_npc(&SelectNpc::new(5), &catalog, &mut store).unwrap();
        load_history(ticket, backend, &mut store).await.unwrap();
        store.drain_events();
        store
    }

    #[tokio::test]
    async fn test_blank_input_is_ignored_without_network_call() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let mut store = talking_to_bram(&backend).await;
        let calls_before = backend.calls().len();
        let token_before = store.token();

        // Act / Assert
        for raw in ["", "   ", "\t\n"] {
            let outcome = send(&SendMessage::new(raw), &mut store, &backend).await;
            assert_eq!(outcome, Ok(SendOutcome::Ignored));
        }
        assert!(store.messages().is_empty());
        assert!(store.uncommitted_events().is_empty());
        assert_eq!(store.token(), token_before);
        assert_eq!(backend.calls().len(), calls_before);
    }

    #[tokio::test]
    async fn test_exit_in_any_case_closes_conversation_without_network_call() {
        for raw in ["EXIT", "exit", "Exit", "  eXiT  "] {
            // Arrange
            let backend = InMemoryBackend::tavern_world()
                .with_history(5, vec![fixtures::turn("assistant", "Welcome")]);
            let mut store = talking_to_bram(&backend).await;

            // Act
            let outcome = send(&SendMessage::new(raw), &mut store, &backend).await;

            // Assert
            assert_eq!(outcome, Ok(SendOutcome::Exited), "input {raw:?}");
            assert_eq!(store.stage(), Stage::LocationChosen);
            assert!(store.messages().is_empty());
            assert!(backend.sent_turns().is_empty());
        }
    }

    #[tokio::test]
    async fn test_send_echoes_before_round_trip() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let mut store = talking_to_bram(&backend).await;

        // Act
        let step = handle_send(&SendMessage::new("  Hello  "), &mut store).unwrap();

        // Assert
        assert_eq!(store.messages(), &[Message::player("Hello")]);
        let SendStep::Dispatched(pending) = step else {
            panic!("expected Dispatched");
        };
        assert_eq!(
            pending.request,
            TurnRequest {
                character_id: 5,
                location_id: 1,
                message: "Hello".to_owned(),
            }
        );
        assert!(backend.sent_turns().is_empty());
    }

    #[tokio::test]
    async fn test_reply_is_appended_after_player_message() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        backend.queue_reply_text("Hi there");
        let mut store = talking_to_bram(&backend).await;

        // Act
        let outcome = send(&SendMessage::new("Hello"), &mut store, &backend).await;

        // Assert
        assert_eq!(outcome, Ok(SendOutcome::Replied("Hi there".to_owned())));
        assert_eq!(
            store.messages(),
            &[Message::player("Hello"), Message::npc("Hi there")]
        );
        assert!(!store.is_busy());
    }

    #[tokio::test]
    async fn test_network_failure_keeps_player_message() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let mut store = talking_to_bram(&backend).await;

        // Act
        let outcome = send(&SendMessage::new("Hello"), &mut store, &FailingBackend).await;

        // Assert
        assert!(matches!(outcome, Err(ChatError::NetworkFailure(_))));
        assert_eq!(store.messages(), &[Message::player("Hello")]);
        assert!(!store.is_busy());
        let events = store.drain_events();
        assert!(matches!(
            events.last().unwrap().kind,
            SessionEventKind::ReplyFailed { .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_reply_field_is_empty_reply() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        backend.queue_reply(Ok(TurnReply { reply: None }));
        let mut store = talking_to_bram(&backend).await;

        // Act
        let outcome = send(&SendMessage::new("Hello"), &mut store, &backend).await;

        // Assert
        assert_eq!(outcome, Err(ChatError::EmptyReply));
        assert_eq!(store.messages(), &[Message::player("Hello")]);
    }

    #[tokio::test]
    async fn test_send_while_reply_pending_is_busy() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let mut store = talking_to_bram(&backend).await;
        handle_send(&SendMessage::new("First"), &mut store).unwrap();
        let events_before = store.uncommitted_events().len();

        // Act
        let result = handle_send(&SendMessage::new("Second"), &mut store);

        // Assert
        assert_eq!(result, Err(ChatError::SessionBusy));
        assert_eq!(store.messages(), &[Message::player("First")]);
        assert_eq!(store.uncommitted_events().len(), events_before);
    }

    #[tokio::test]
    async fn test_send_while_history_pending_is_busy() {
        // Arrange
        let catalog = WorldCatalog::with_contents(fixtures::locations(), fixtures::characters());
        let mut store = SessionStore::new();
        handle_select_location(&SelectLocation::new(1), &catalog, &mut store).unwrap();
        handle_select_npc(&SelectNpc::new(5), &catalog, &mut store).unwrap();

        // Act
        let result = handle_send(&SendMessage::new("Hello"), &mut store);

        // Assert
        assert_eq!(result, Err(ChatError::SessionBusy));
        assert!(store.messages().is_empty());
    }

    #[tokio::test]
    async fn test_exit_is_allowed_while_reply_pending() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let mut store = talking_to_bram(&backend).await;
        handle_send(&SendMessage::new("Hello"), &mut store).unwrap();

        // Act
        let step = handle_send(&SendMessage::new("exit"), &mut store).unwrap();

        // Assert
        assert_eq!(step, SendStep::Exited);
        assert!(!store.is_busy());
    }

    #[tokio::test]
    async fn test_reply_after_exit_is_dropped() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        backend.queue_reply_text("Too late");
        let mut store = talking_to_bram(&backend).await;
        let SendStep::Dispatched(pending) =
            handle_send(&SendMessage::new("Hello"), &mut store).unwrap()
        else {
            panic!("expected Dispatched");
        };
        handle_send(&SendMessage::new("exit"), &mut store).unwrap();

        // Act
        let received = deliver(pending, &backend).await;
        let result = apply_reply(received, &mut store);

        // Assert
        assert!(matches!(result, Err(ChatError::StaleResponse { .. })));
        assert!(store.messages().is_empty());
        assert_eq!(store.stage(), Stage::LocationChosen);
    }

    #[tokio::test]
    async fn test_send_outside_conversation_is_invalid() {
        let mut store = SessionStore::new();

        let result = handle_send(&SendMessage::new("Hello"), &mut store);

        assert!(matches!(result, Err(ChatError::InvalidSelection(_))));
        assert!(store.messages().is_empty());
    }

    #[tokio::test]
    async fn test_retry_resends_unanswered_message_without_echo() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        backend.queue_reply(Err(ChatError::NetworkFailure("timeout".into())));
        backend.queue_reply_text("Sorry, what?");
        let mut store = talking_to_bram(&backend).await;
        let _ = send(&SendMessage::new("Hello"), &mut store, &backend).await;

        // Act
        let pending = handle_retry(&RetryUnanswered::new(), &mut store).unwrap();
        let received = deliver(pending, &backend).await;
        let text = apply_reply(received, &mut store).unwrap();

        // Assert
        assert_eq!(text, "Sorry, what?");
        assert_eq!(
            store.messages(),
            &[Message::player("Hello"), Message::npc("Sorry, what?")]
        );
        let sent: Vec<String> = backend
            .sent_turns()
            .into_iter()
            .map(|t| t.message)
            .collect();
        assert_eq!(sent, vec!["Hello".to_owned(), "Hello".to_owned()]);
    }

    #[tokio::test]
    async fn test_retry_with_answered_last_message_is_rejected() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let mut store = talking_to_bram(&backend).await;
        send(&SendMessage::new("Hello"), &mut store, &backend)
            .await
            .unwrap();

        // Act
        let result = handle_retry(&RetryUnanswered::new(), &mut store);

        // Assert
        assert_eq!(result, Err(ChatError::NothingToRetry));
        assert_eq!(
            backend
                .calls()
                .iter()
                .filter(|c| matches!(c, BackendCall::SendTurn(_)))
                .count(),
            1
        );
    }
}
