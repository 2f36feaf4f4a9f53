//! Aggregate root for the Conversation Session context.

use lorechat_core::error::ChatError;
use lorechat_core::model::{CharacterId, LocationId, Message, Role};
use uuid::Uuid;

use super::events::{SelectionToken, SessionEvent, SessionEventKind};

/// Selection stage of the session.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Nothing selected yet.
    NoLocation,
    /// A location is selected, no NPC.
    LocationChosen,
    /// Talking to an NPC at the selected location.
    InConversation,
}

/// The backend operation currently outstanding for the live selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum InFlight {
    /// Waiting for the NPC's dialogue history.
    History,
    /// Waiting for the NPC's reply to a player message.
    Reply,
}

/// The selection and message log of the one conversation in this run.
///
/// Invariants, upheld by [`SessionStore`]:
/// - `selected_npc_id` set implies `selected_location_id` set;
/// - `selected_npc_id` unset implies `messages` is empty.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Session {
    /// The chosen location.
    pub selected_location_id: Option<LocationId>,
    /// The NPC being talked to.
    pub selected_npc_id: Option<CharacterId>,
    /// Conversation log in arrival order.
    pub messages: Vec<Message>,
}

impl Session {
    /// Derives the stage from the selection.
    #[must_use]
    pub fn stage(&self) -> Stage {
        match (self.selected_location_id, self.selected_npc_id) {
            (_, Some(_)) => Stage::InConversation,
            (Some(_), None) => Stage::LocationChosen,
            (None, None) => Stage::NoLocation,
        }
    }
}

/// The single source of truth for session state.
///
/// Transition rules are checked by the application handlers before they
/// call into the store; the store itself only guards against stale tokens.
/// Every mutation records a [`SessionEvent`].
#[derive(Debug, Default)]
pub struct SessionStore {
    session: Session,
    token: SelectionToken,
    in_flight: Option<InFlight>,
    retryable: bool,
    last_sequence_number: u64,
    uncommitted_events: Vec<SessionEvent>,
}

impl SessionStore {
    /// Creates an empty session.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only view of the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        &self.session
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.session.stage()
    }

    /// The message log.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        &self.session.messages
    }

    /// The current selection token.
    #[must_use]
    pub fn token(&self) -> SelectionToken {
        self.token
    }

    /// The outstanding backend operation, if any.
    #[must_use]
    pub fn in_flight(&self) -> Option<InFlight> {
        self.in_flight
    }

    /// Whether a backend operation is outstanding for the live selection.
    #[must_use]
    pub fn is_busy(&self) -> bool {
        self.in_flight.is_some()
    }

    /// Text of the last message if this run sent it and its round trip
    /// failed.
    ///
    /// A trailing player turn that arrived with hydrated history is never
    /// retryable.
    #[must_use]
    pub fn unanswered_player_text(&self) -> Option<&str> {
        if !self.retryable || self.in_flight.is_some() {
            return None;
        }
        match self.session.messages.last() {
            Some(Message {
                role: Role::Player,
                text,
            }) => Some(text.as_str()),
            _ => None,
        }
    }

    /// Events recorded since the last drain.
    #[must_use]
    pub fn uncommitted_events(&self) -> &[SessionEvent] {
        &self.uncommitted_events
    }

    /// Takes the events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        std::mem::take(&mut self.uncommitted_events)
    }

    /// Fails with `StaleResponse` unless `token` is the live token.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::StaleResponse` for superseded tokens.
    pub fn ensure_current(&self, token: SelectionToken) -> Result<(), ChatError> {
        if token == self.token {
            Ok(())
        } else {
            Err(ChatError::StaleResponse {
                token: token.value(),
                current: self.token.value(),
            })
        }
    }

    /// Selects `location_id`, discarding any conversation.
    pub(crate) fn reset_to_location(&mut self, location_id: LocationId, correlation_id: Uuid) {
        self.token = self.token.next();
        self.in_flight = None;
        self.retryable = false;
        self.session = Session {
            selected_location_id: Some(location_id),
            selected_npc_id: None,
            messages: Vec::new(),
        };
        self.record(
            correlation_id,
            SessionEventKind::LocationSelected { location_id },
        );
    }

    /// Starts a conversation with `npc_id` and marks its history as pending.
    ///
    /// Caller must have checked the stage and the NPC's location.
    pub(crate) fn begin_conversation(
        &mut self,
        npc_id: CharacterId,
        correlation_id: Uuid,
    ) -> SelectionToken {
        debug_assert!(self.session.selected_location_id.is_some());
        self.token = self.token.next();
        self.in_flight = Some(InFlight::History);
        self.retryable = false;
        self.session.selected_npc_id = Some(npc_id);
        self.session.messages.clear();
        self.record(
            correlation_id,
            SessionEventKind::NpcSelected {
                npc_id,
                token: self.token,
            },
        );
        self.token
    }

    /// Leaves the conversation, keeping the location.
    pub(crate) fn end_conversation(&mut self, correlation_id: Uuid) {
        let Some(npc_id) = self.session.selected_npc_id.take() else {
            return;
        };
        self.token = self.token.next();
        self.in_flight = None;
        self.retryable = false;
        self.session.messages.clear();
        self.record(
            correlation_id,
            SessionEventKind::ConversationExited { npc_id },
        );
    }

    /// Replaces the message log with fetched history in one step.
    pub(crate) fn replace_history(
        &mut self,
        token: SelectionToken,
        messages: Vec<Message>,
        correlation_id: Uuid,
    ) -> Result<usize, ChatError> {
        self.ensure_current(token)?;
        let npc_id = self.current_npc()?;
        let turns = messages.len();
        self.session.messages = messages;
        self.in_flight = None;
        self.retryable = false;
        self.record(
            correlation_id,
            SessionEventKind::HistoryLoaded { npc_id, turns },
        );
        Ok(turns)
    }

    /// Records that history could not be loaded; the log stays empty.
    pub(crate) fn history_unavailable(
        &mut self,
        token: SelectionToken,
        error: ChatError,
        correlation_id: Uuid,
    ) -> Result<(), ChatError> {
        self.ensure_current(token)?;
        let npc_id = self.current_npc()?;
        self.in_flight = None;
        self.record(
            correlation_id,
            SessionEventKind::HistoryUnavailable { npc_id, error },
        );
        Ok(())
    }

    /// Appends the player's message and marks a reply as pending.
    pub(crate) fn echo_player(&mut self, text: String, correlation_id: Uuid) -> SelectionToken {
        debug_assert_eq!(self.stage(), Stage::InConversation);
        self.session.messages.push(Message::player(text.clone()));
        self.in_flight = Some(InFlight::Reply);
        self.retryable = false;
        self.record(
            correlation_id,
            SessionEventKind::PlayerMessageEchoed { text },
        );
        self.token
    }

    /// Marks a reply to the already-logged last player message as pending.
    pub(crate) fn retry_reply(&mut self, text: String, correlation_id: Uuid) -> SelectionToken {
        self.in_flight = Some(InFlight::Reply);
        self.retryable = false;
        self.record(correlation_id, SessionEventKind::ReplyRetried { text });
        self.token
    }

    /// Appends the NPC's reply.
    pub(crate) fn append_reply(
        &mut self,
        token: SelectionToken,
        text: String,
        correlation_id: Uuid,
    ) -> Result<(), ChatError> {
        self.ensure_current(token)?;
        self.session.messages.push(Message::npc(text.clone()));
        self.in_flight = None;
        self.retryable = false;
        self.record(correlation_id, SessionEventKind::NpcReplied { text });
        Ok(())
    }

    /// Records a failed round trip. The player's message is kept.
    pub(crate) fn reply_failed(
        &mut self,
        token: SelectionToken,
        error: ChatError,
        correlation_id: Uuid,
    ) -> Result<(), ChatError> {
        self.ensure_current(token)?;
        self.in_flight = None;
        self.retryable = true;
        self.record(correlation_id, SessionEventKind::ReplyFailed { error });
        Ok(())
    }

    fn current_npc(&self) -> Result<CharacterId, ChatError> {
        self.session
            .selected_npc_id
            .ok_or_else(|| ChatError::InvalidSelection("no NPC selected".to_owned()))
    }

    fn record(&mut self, correlation_id: Uuid, kind: SessionEventKind) {
        self.last_sequence_number += 1;
        self.uncommitted_events.push(SessionEvent {
            sequence_number: self.last_sequence_number,
            correlation_id,
            kind,
        });
    }
}
