//! Commands for the Conversation Session context.

use lorechat_core::model::{CharacterId, LocationId};
use uuid::Uuid;

/// Trait that all session commands implement.
pub trait SessionCommand: Send + Sync + std::fmt::Debug {
    /// Stable name used in log fields.
    fn command_type(&self) -> &'static str;

    /// Correlation ID stamped on every event the command produces.
    fn correlation_id(&self) -> Uuid;
}

/// Command to choose the location to explore.
#[derive(Debug, Clone)]
pub struct SelectLocation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The location to select.
    pub location_id: LocationId,
}

impl SelectLocation {
    /// Creates the command with a fresh correlation ID.
    #[must_use]
    pub fn new(location_id: LocationId) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            location_id,
        }
    }
}

impl SessionCommand for SelectLocation {
    fn command_type(&self) -> &'static str {
        "session.select_location"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to start talking to an NPC at the selected location.
#[derive(Debug, Clone)]
pub struct SelectNpc {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// The character to talk to.
    pub npc_id: CharacterId,
}

impl SelectNpc {
    /// Creates the command with a fresh correlation ID.
    #[must_use]
    pub fn new(npc_id: CharacterId) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            npc_id,
        }
    }
}

impl SessionCommand for SelectNpc {
    fn command_type(&self) -> &'static str {
        "session.select_npc"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to leave the current conversation.
#[derive(Debug, Clone)]
pub struct ExitConversation {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl ExitConversation {
    /// Creates the command with a fresh correlation ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
        }
    }
}

impl Default for ExitConversation {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCommand for ExitConversation {
    fn command_type(&self) -> &'static str {
        "session.exit_conversation"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command carrying one line of raw user input.
#[derive(Debug, Clone)]
pub struct SendMessage {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
    /// Untrimmed input as typed.
    pub raw_text: String,
}

impl SendMessage {
    /// Creates the command with a fresh correlation ID.
    #[must_use]
    pub fn new(raw_text: impl Into<String>) -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
            raw_text: raw_text.into(),
        }
    }
}

impl SessionCommand for SendMessage {
    fn command_type(&self) -> &'static str {
        "session.send_message"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}

/// Command to resend the last unanswered player message.
#[derive(Debug, Clone)]
pub struct RetryUnanswered {
    /// The correlation ID for tracing.
    pub correlation_id: Uuid,
}

impl RetryUnanswered {
    /// Creates the command with a fresh correlation ID.
    #[must_use]
    pub fn new() -> Self {
        Self {
            correlation_id: Uuid::new_v4(),
        }
    }
}

impl Default for RetryUnanswered {
    fn default() -> Self {
        Self::new()
    }
}

impl SessionCommand for RetryUnanswered {
    fn command_type(&self) -> &'static str {
        "session.retry_unanswered"
    }

    fn correlation_id(&self) -> Uuid {
        self.correlation_id
    }
}
