//! Domain events for the Conversation Session context.
//!
//! The store records one event per applied transition. Observers (the CLI)
//! drain them to render output; they are never persisted.

use std::fmt;

use lorechat_core::error::ChatError;
use lorechat_core::model::{CharacterId, LocationId};
use uuid::Uuid;

/// Monotonic selection token.
///
/// Bumped on every selection change so that backend results issued under an
/// older selection can be recognized and dropped.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SelectionToken(u64);

impl SelectionToken {
    /// The token value.
    #[must_use]
    pub fn value(self) -> u64 {
        self.0
    }

    pub(crate) fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl fmt::Display for SelectionToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Event payload variants for the Conversation Session context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionEventKind {
    /// A location was chosen; any previous conversation was discarded.
    LocationSelected {
        /// The selected location.
        location_id: LocationId,
    },
    /// An NPC was chosen and its history requested.
    NpcSelected {
        /// The selected NPC.
        npc_id: CharacterId,
        /// Token the history request was issued under.
        token: SelectionToken,
    },
    /// Prior turns replaced the message log.
    HistoryLoaded {
        /// The NPC the history belongs to.
        npc_id: CharacterId,
        /// Number of turns applied.
        turns: usize,
    },
    /// History could not be fetched; the conversation starts empty.
    HistoryUnavailable {
        /// The NPC whose history failed to load.
        npc_id: CharacterId,
        /// Why the fetch failed.
        error: ChatError,
    },
    /// The player's message was appended before the backend answered.
    PlayerMessageEchoed {
        /// Trimmed message text.
        text: String,
    },
    /// An unanswered player message was sent again.
    ReplyRetried {
        /// The resent text.
        text: String,
    },
    /// The NPC's answer was appended.
    NpcReplied {
        /// Reply text.
        text: String,
    },
    /// The round trip failed; the player's message stays unanswered.
    ReplyFailed {
        /// Why the round trip failed.
        error: ChatError,
    },
    /// The conversation was left; the location stays selected.
    ConversationExited {
        /// The NPC that was being talked to.
        npc_id: CharacterId,
    },
}

/// Domain event envelope for the Conversation Session context.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionEvent {
    /// Position of this event in the session's event stream, from 1.
    pub sequence_number: u64,
    /// Correlation ID of the command that caused the event.
    pub correlation_id: Uuid,
    /// Event-specific payload.
    pub kind: SessionEventKind,
}

impl SessionEvent {
    /// The event type name, used in log fields.
    #[must_use]
    pub fn event_type(&self) -> &'static str {
        match &self.kind {
            SessionEventKind::LocationSelected { .. } => "session.location_selected",
            SessionEventKind::NpcSelected { .. } => "session.npc_selected",
            SessionEventKind::HistoryLoaded { .. } => "session.history_loaded",
            SessionEventKind::HistoryUnavailable { .. } => "session.history_unavailable",
            SessionEventKind::PlayerMessageEchoed { .. } => "session.player_message_echoed",
            SessionEventKind::ReplyRetried { .. } => "session.reply_retried",
            SessionEventKind::NpcReplied { .. } => "session.npc_replied",
            SessionEventKind::ReplyFailed { .. } => "session.reply_failed",
            SessionEventKind::ConversationExited { .. } => "session.conversation_exited",
        }
    }
}
