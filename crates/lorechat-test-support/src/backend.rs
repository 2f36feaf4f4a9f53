//! In-memory implementations of the backend ports.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;
use lorechat_core::backend::{
    DialogueBackend, DialogueTurn, Lore, NewCharacter, NewLocation, TurnReply, TurnRequest,
    WorldAdmin, WorldSource,
};
use lorechat_core::error::ChatError;
use lorechat_core::model::{Character, CharacterId, Location, LocationId};

use crate::fixtures;

/// A backend call recorded by [`InMemoryBackend`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendCall {
    /// `GET /locations`
    ListLocations,
    /// `GET /characters`
    ListCharacters,
    /// `GET /dialogue/{id}`
    DialogueHistory(CharacterId),
    /// `POST /dialogue`
    SendTurn(TurnRequest),
    /// `GET /lore`
    GetLore,
    /// `PUT /lore`
    ReplaceLore(String),
    /// `POST /locations`
    CreateLocation(String),
    /// `DELETE /locations/{id}`
    DeleteLocation(LocationId),
    /// `POST /characters`
    CreateCharacter(String),
    /// `DELETE /characters/{id}`
    DeleteCharacter(CharacterId),
}

#[derive(Debug, Default)]
struct WorldState {
    locations: Vec<Location>,
    characters: Vec<Character>,
    lore: Lore,
}

/// A backend that serves a world held in memory and records every call.
///
/// Replies to `send_turn` come from a queue filled with
/// [`queue_reply`](Self::queue_reply); when the queue is empty the NPC
/// answers with `"You said: {message}"`.
#[derive(Debug, Default)]
pub struct InMemoryBackend {
    world: Mutex<WorldState>,
    histories: Mutex<HashMap<CharacterId, Vec<DialogueTurn>>>,
    failing_ids: Mutex<HashSet<CharacterId>>,
    replies: Mutex<VecDeque<Result<TurnReply, ChatError>>>,
    calls: Mutex<Vec<BackendCall>>,
}

impl InMemoryBackend {
    /// Creates a backend serving the given world.
    #[must_use]
    pub fn new(locations: Vec<Location>, characters: Vec<Character>) -> Self {
        Self {
            world: Mutex::new(WorldState {
                locations,
                characters,
                lore: Lore::default(),
            }),
            ..Self::default()
        }
    }

    /// Creates a backend serving the [`fixtures`] world.
    #[must_use]
    pub fn tavern_world() -> Self {
        Self::new(fixtures::locations(), fixtures::characters())
    }

    /// Sets the stored history for `character_id`.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_history(self, character_id: CharacterId, turns: Vec<DialogueTurn>) -> Self {
        self.histories.lock().unwrap().insert(character_id, turns);
        self
    }

    /// Makes history requests for `character_id` fail with a network error.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn with_failing_history(self, character_id: CharacterId) -> Self {
        self.failing_ids.lock().unwrap().insert(character_id);
        self
    }

    /// Queues the result of the next `send_turn` call.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn queue_reply(&self, reply: Result<TurnReply, ChatError>) {
        self.replies.lock().unwrap().push_back(reply);
    }

    /// Queues a successful reply with the given text.
    pub fn queue_reply_text(&self, text: &str) {
        self.queue_reply(Ok(TurnReply {
            reply: Some(text.to_owned()),
        }));
    }

    /// Returns a snapshot of all recorded calls, in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    pub fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().unwrap().clone()
    }

    /// Returns the turn requests sent so far.
    pub fn sent_turns(&self) -> Vec<TurnRequest> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                BackendCall::SendTurn(request) => Some(request),
                _ => None,
            })
            .collect()
    }

    fn record(&self, call: BackendCall) {
        self.calls.lock().unwrap().push(call);
    }
}

#[async_trait]
impl WorldSource for InMemoryBackend {
    async fn list_locations(&self) -> Result<Vec<Location>, ChatError> {
        self.record(BackendCall::ListLocations);
        Ok(self.world.lock().unwrap().locations.clone())
    }

    async fn list_characters(&self) -> Result<Vec<Character>, ChatError> {
        self.record(BackendCall::ListCharacters);
        Ok(self.world.lock().unwrap().characters.clone())
    }
}

#[async_trait]
impl DialogueBackend for InMemoryBackend {
    async fn dialogue_history(
        &self,
        character_id: CharacterId,
    ) -> Result<Vec<DialogueTurn>, ChatError> {
        self.record(BackendCall::DialogueHistory(character_id));
        if self.failing_ids.lock().unwrap().contains(&character_id) {
            return Err(ChatError::NetworkFailure("connection reset".into()));
        }
        Ok(self
            .histories
            .lock()
            .unwrap()
            .get(&character_id)
            .cloned()
            .unwrap_or_default())
    }

    async fn send_turn(&self, request: &TurnRequest) -> Result<TurnReply, ChatError> {
        self.record(BackendCall::SendTurn(request.clone()));
        let queued = self.replies.lock().unwrap().pop_front();
        queued.unwrap_or_else(|| {
            Ok(TurnReply {
                reply: Some(format!("You said: {}", request.message)),
            })
        })
    }
}

#[async_trait]
impl WorldAdmin for InMemoryBackend {
    async fn lore(&self) -> Result<Lore, ChatError> {
        self.record(BackendCall::GetLore);
        Ok(self.world.lock().unwrap().lore.clone())
    }

    async fn replace_lore(&self, content: &str) -> Result<Lore, ChatError> {
        self.record(BackendCall::ReplaceLore(content.to_owned()));
        let mut world = self.world.lock().unwrap();
        world.lore.content = content.to_owned();
        Ok(world.lore.clone())
    }

    async fn create_location(&self, location: &NewLocation) -> Result<Location, ChatError> {
        self.record(BackendCall::CreateLocation(location.name.clone()));
        let mut world = self.world.lock().unwrap();
        let id = world.locations.iter().map(|l| l.id).max().unwrap_or(0) + 1;
        let created = Location {
            id,
            name: location.name.clone(),
            description: location.description.clone().unwrap_or_default(),
            reputation_levels: location.reputation_levels.clone(),
            points_of_interest: location.points_of_interest.clone(),
        };
        world.locations.push(created.clone());
        Ok(created)
    }

    async fn delete_location(&self, id: LocationId) -> Result<(), ChatError> {
        self.record(BackendCall::DeleteLocation(id));
        let mut world = self.world.lock().unwrap();
        let before = world.locations.len();
        world.locations.retain(|l| l.id != id);
        if world.locations.len() == before {
            return Err(not_found("Location not found"));
        }
        Ok(())
    }

    async fn create_character(&self, character: &NewCharacter) -> Result<Character, ChatError> {
        self.record(BackendCall::CreateCharacter(character.name.clone()));
        let mut world = self.world.lock().unwrap();
        let id = world.characters.iter().map(|c| c.id).max().unwrap_or(0) + 1;
        let created = Character {
            id,
            name: character.name.clone(),
            age: character.age,
            sex: character.sex.clone(),
            traits: character.traits.clone(),
            attitude: character.attitude.clone(),
            location_id: character.location_id,
        };
        world.characters.push(created.clone());
        Ok(created)
    }

    async fn delete_character(&self, id: CharacterId) -> Result<(), ChatError> {
        self.record(BackendCall::DeleteCharacter(id));
        let mut world = self.world.lock().unwrap();
        let before = world.characters.len();
        world.characters.retain(|c| c.id != id);
        if world.characters.len() == before {
            return Err(not_found("Character not found"));
        }
        Ok(())
    }
}

fn not_found(detail: &str) -> ChatError {
    ChatError::Backend {
        status: 404,
        message: detail.to_owned(),
    }
}

/// A backend whose every call fails with a network error. Useful for
/// testing error-handling paths.
#[derive(Debug, Clone, Copy)]
pub struct FailingBackend;

fn refused() -> ChatError {
    ChatError::NetworkFailure("connection refused".into())
}

#[async_trait]
impl WorldSource for FailingBackend {
    async fn list_locations(&self) -> Result<Vec<Location>, ChatError> {
        Err(refused())
    }

    async fn list_characters(&self) -> Result<Vec<Character>, ChatError> {
        Err(refused())
    }
}

#[async_trait]
impl DialogueBackend for FailingBackend {
    async fn dialogue_history(
        &self,
        _character_id: CharacterId,
    ) -> Result<Vec<DialogueTurn>, ChatError> {
        Err(refused())
    }

    async fn send_turn(&self, _request: &TurnRequest) -> Result<TurnReply, ChatError> {
        Err(refused())
    }
}
