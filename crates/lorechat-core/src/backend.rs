//! Backend ports.
//!
//! The dialogue service is an opaque HTTP backend. These traits are the
//! seams the conversation core talks through; `lorechat-client` provides the
//! HTTP implementation and `lorechat-test-support` the in-memory ones.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::ChatError;
use crate::model::{Character, CharacterId, Location, LocationId, Message, Role};

/// One prior turn as returned by `GET /dialogue/{character_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DialogueTurn {
    /// Raw role tag (`"user"` or `"assistant"`).
    pub role: String,
    /// Turn text.
    pub message: String,
}

impl DialogueTurn {
    /// Normalizes the turn into a session [`Message`].
    #[must_use]
    pub fn into_message(self) -> Message {
        Message {
            role: Role::from_server_tag(&self.role),
            text: self.message,
        }
    }
}

/// Parameters of `POST /dialogue`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TurnRequest {
    /// The NPC being addressed.
    pub character_id: CharacterId,
    /// The location the conversation takes place in.
    pub location_id: LocationId,
    /// Trimmed player text.
    pub message: String,
}

/// Body of a successful `POST /dialogue`.
///
/// `reply` is optional so that a body without it decodes and can be
/// reported as an empty reply rather than a decode failure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TurnReply {
    /// The NPC's answer.
    #[serde(default)]
    pub reply: Option<String>,
}

impl TurnReply {
    /// Returns the reply text, or `EmptyReply` if it is missing or blank.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::EmptyReply` when there is no usable text.
    pub fn into_text(self) -> Result<String, ChatError> {
        match self.reply {
            Some(text) if !text.trim().is_empty() => Ok(text),
            _ => Err(ChatError::EmptyReply),
        }
    }
}

/// Global lore document (`GET`/`PUT /lore`).
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Lore {
    /// Lore text.
    #[serde(default)]
    pub content: String,
}

/// Body of `POST /locations`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewLocation {
    /// Display name.
    pub name: String,
    /// Free-text description.
    pub description: Option<String>,
    /// Reputation tiers.
    pub reputation_levels: Vec<String>,
    /// Notable features.
    pub points_of_interest: Vec<String>,
}

/// Body of `POST /characters`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct NewCharacter {
    /// Display name.
    pub name: String,
    /// Age in years.
    pub age: Option<u32>,
    /// Sex.
    pub sex: Option<String>,
    /// Personality traits.
    pub traits: Vec<String>,
    /// Attitude towards the player.
    pub attitude: Option<String>,
    /// Home location.
    pub location_id: LocationId,
}

impl NewLocation {
    /// Checks required fields before the request is sent.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Validation` if the name is blank.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.name.trim().is_empty() {
            return Err(ChatError::Validation(
                "location name must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

impl NewCharacter {
    /// Checks required fields before the request is sent.
    ///
    /// # Errors
    ///
    /// Returns `ChatError::Validation` if the name is blank.
    pub fn validate(&self) -> Result<(), ChatError> {
        if self.name.trim().is_empty() {
            return Err(ChatError::Validation(
                "character name must not be empty".to_owned(),
            ));
        }
        Ok(())
    }
}

/// Read access to the world collections.
#[async_trait]
pub trait WorldSource: Send + Sync {
    /// `GET /locations`.
    async fn list_locations(&self) -> Result<Vec<Location>, ChatError>;

    /// `GET /characters`.
    async fn list_characters(&self) -> Result<Vec<Character>, ChatError>;
}

/// The dialogue endpoints.
#[async_trait]
pub trait DialogueBackend: Send + Sync {
    /// `GET /dialogue/{character_id}`: prior turns, oldest first.
    async fn dialogue_history(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<DialogueTurn>, ChatError>;

    /// `POST /dialogue`: send one player turn and wait for the NPC's answer.
    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply, ChatError>;
}

/// Administration endpoints for lore, locations and characters.
#[async_trait]
pub trait WorldAdmin: Send + Sync {
    /// `GET /lore`.
    async fn lore(&self) -> Result<Lore, ChatError>;

    /// `PUT /lore`.
    async fn replace_lore(&self, content: &str) -> Result<Lore, ChatError>;

    /// `POST /locations`.
    async fn create_location(&self, location: &NewLocation) -> Result<Location, ChatError>;

    /// `DELETE /locations/{id}`.
    async fn delete_location(&self, id: LocationId) -> Result<(), ChatError>;

    /// `POST /characters`.
    async fn create_character(&self, character: &NewCharacter) -> Result<Character, ChatError>;

    /// `DELETE /characters/{id}`.
    async fn delete_character(&self, id: CharacterId) -> Result<(), ChatError>;
}
