//! World and conversation model.

use serde::{Deserialize, Deserializer, Serialize};

/// Backend identifier of a location.
pub type LocationId = i64;

/// Backend identifier of a character.
pub type CharacterId = i64;

/// Role tag the backend uses for turns written by the player.
pub const PLAYER_ROLE_TAG: &str = "user";

/// A place in the world where NPCs can be found.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    /// Location identifier.
    pub id: LocationId,
    /// Display name.
    pub name: String,
    /// Free-text description.
    #[serde(default, deserialize_with = "null_as_default")]
    pub description: String,
    /// Reputation tiers the player can hold here, lowest first.
    #[serde(default, deserialize_with = "null_as_default")]
    pub reputation_levels: Vec<String>,
    /// Notable features of the location.
    #[serde(default, deserialize_with = "null_as_default")]
    pub points_of_interest: Vec<String>,
}

/// A non-player character the user can talk to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    /// Character identifier.
    pub id: CharacterId,
    /// Display name.
    pub name: String,
    /// Age in years, if known.
    #[serde(default)]
    pub age: Option<u32>,
    /// Sex, if known.
    #[serde(default)]
    pub sex: Option<String>,
    /// Personality traits.
    #[serde(default, deserialize_with = "null_as_default")]
    pub traits: Vec<String>,
    /// Attitude towards the player, e.g. "friendly".
    #[serde(default)]
    pub attitude: Option<String>,
    /// The location this character lives in.
    pub location_id: LocationId,
}

/// Who wrote a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    /// The human player.
    Player,
    /// The selected NPC.
    Npc,
}

impl Role {
    /// Maps a backend role tag onto a [`Role`].
    ///
    /// Only the exact tag `"user"` is the player; every other tag
    /// (`"assistant"`, `"npc"`, ...) is the NPC.
    #[must_use]
    pub fn from_server_tag(tag: &str) -> Self {
        if tag == PLAYER_ROLE_TAG {
            Self::Player
        } else {
            Self::Npc
        }
    }
}

/// A single line in the conversation log.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Message {
    /// Author of the message.
    pub role: Role,
    /// Message body.
    pub text: String,
}

impl Message {
    /// A message written by the player.
    #[must_use]
    pub fn player(text: impl Into<String>) -> Self {
        Self {
            role: Role::Player,
            text: text.into(),
        }
    }

    /// A message written by the NPC.
    #[must_use]
    pub fn npc(text: impl Into<String>) -> Self {
        Self {
            role: Role::Npc,
            text: text.into(),
        }
    }
}

/// The backend stores optional columns as `NULL`; treat them as empty.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}
