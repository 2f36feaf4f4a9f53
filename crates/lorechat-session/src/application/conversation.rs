//! Conversation facade.
//!
//! Bundles the catalog, the session store and the dialogue backend behind
//! the operations a front end needs. The split `begin_*` / `apply_*` pairs
//! let a caller run the backend round trip on its own task; the `async`
//! shorthands run it inline.

use std::sync::Arc;

use lorechat_catalog::domain::catalog::WorldCatalog;
use lorechat_core::backend::DialogueBackend;
use lorechat_core::error::ChatError;
use lorechat_core::model::{CharacterId, LocationId, Message};

use crate::application::exchange::{self, PendingReply, ReplyReceived, SendOutcome, SendStep};
use crate::application::history::{self, HistoryFetched, HistoryOutcome, HistoryTicket};
use crate::application::selection;
use crate::domain::aggregates::{Session, SessionStore, Stage};
use crate::domain::commands::{
    ExitConversation, RetryUnanswered, SelectLocation, SelectNpc, SendMessage,
};
use crate::domain::events::SessionEvent;

/// One player's conversation session against one backend.
pub struct Conversation {
    catalog: WorldCatalog,
    store: SessionStore,
    backend: Arc<dyn DialogueBackend>,
}

impl std::fmt::Debug for Conversation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Conversation")
            .field("catalog", &self.catalog)
            .field("store", &self.store)
            .finish_non_exhaustive()
    }
}

impl Conversation {
    /// Creates a session over an already loaded catalog.
    #[must_use]
    pub fn new(catalog: WorldCatalog, backend: Arc<dyn DialogueBackend>) -> Self {
        Self {
            catalog,
            store: SessionStore::new(),
            backend,
        }
    }

    /// The world catalog.
    #[must_use]
    pub fn catalog(&self) -> &WorldCatalog {
        &self.catalog
    }

    /// Mutable access for reloading the catalog.
    pub fn catalog_mut(&mut self) -> &mut WorldCatalog {
        &mut self.catalog
    }

    /// Read-only view of the session.
    #[must_use]
    pub fn session(&self) -> &Session {
        self.store.session()
    }

    /// Current stage.
    #[must_use]
    pub fn stage(&self) -> Stage {
        self.store.stage()
    }

    /// The message log.
    #[must_use]
    pub fn messages(&self) -> &[Message] {
        self.store.messages()
    }

    /// A handle to the dialogue backend for spawned round trips.
    #[must_use]
    pub fn backend(&self) -> Arc<dyn DialogueBackend> {
        Arc::clone(&self.backend)
    }

    /// Takes the events recorded since the last drain.
    pub fn drain_events(&mut self) -> Vec<SessionEvent> {
        self.store.drain_events()
    }

    /// Selects a location.
    ///
    /// # Errors
    ///
    /// See [`selection::handle_select_location`].
    pub fn select_location(&mut self, location_id: LocationId) -> Result<(), ChatError> {
        selection::handle_select_location(
            &SelectLocation::new(location_id),
            &self.catalog,
            &mut self.store,
        )
    }

    /// Selects an NPC and returns the ticket its history must be fetched
    /// under.
    ///
    /// # Errors
    ///
    /// See [`selection::handle_select_npc`].
    pub fn select_npc(&mut self, npc_id: CharacterId) -> Result<HistoryTicket, ChatError> {
        selection::handle_select_npc(&SelectNpc::new(npc_id), &self.catalog, &mut self.store)
    }

    /// Selects an NPC and loads its history.
    ///
    /// # Errors
    ///
    /// See [`Self::select_npc`] and [`history::apply_history`].
    pub async fn select_npc_and_load(
        &mut self,
        npc_id: CharacterId,
    ) -> Result<HistoryOutcome, ChatError> {
        let ticket = self.select_npc(npc_id)?;
        let fetched = history::fetch_history(ticket, self.backend.as_ref()).await;
        history::apply_history(fetched, &mut self.store)
    }

    /// Applies a history fetched elsewhere.
    ///
    /// # Errors
    ///
    /// See [`history::apply_history`].
    pub fn apply_history(&mut self, fetched: HistoryFetched) -> Result<HistoryOutcome, ChatError> {
        history::apply_history(fetched, &mut self.store)
    }

    /// Leaves the conversation.
    ///
    /// # Errors
    ///
    /// See [`selection::handle_exit`].
    pub fn exit(&mut self) -> Result<(), ChatError> {
        selection::handle_exit(&ExitConversation::new(), &mut self.store)
    }

    /// Handles one line of input up to the round trip.
    ///
    /// # Errors
    ///
    /// See [`exchange::handle_send`].
    pub fn begin_send(&mut self, raw_text: &str) -> Result<SendStep, ChatError> {
        exchange::handle_send(&SendMessage::new(raw_text), &mut self.store)
    }

    /// Prepares a resend of the last unanswered player message.
    ///
    /// # Errors
    ///
    /// See [`exchange::handle_retry`].
    pub fn begin_retry(&mut self) -> Result<PendingReply, ChatError> {
        exchange::handle_retry(&RetryUnanswered::new(), &mut self.store)
    }

    /// Applies a round trip completed elsewhere.
    ///
    /// # Errors
    ///
    /// See [`exchange::apply_reply`].
    pub fn apply_reply(&mut self, received: ReplyReceived) -> Result<String, ChatError> {
        exchange::apply_reply(received, &mut self.store)
    }

    /// Sends one line of input and waits for the NPC's answer.
    ///
    /// # Errors
    ///
    /// See [`exchange::send`].
    pub async fn send(&mut self, raw_text: &str) -> Result<SendOutcome, ChatError> {
        exchange::send(
            &SendMessage::new(raw_text),
            &mut self.store,
            self.backend.as_ref(),
        )
        .await
    }

    /// Resends the last unanswered player message and waits for the answer.
    ///
    /// # Errors
    ///
    /// See [`exchange::handle_retry`] and [`exchange::apply_reply`].
    pub async fn retry(&mut self) -> Result<String, ChatError> {
        let pending = self.begin_retry()?;
        let received = exchange::deliver(pending, self.backend.as_ref()).await;
        self.apply_reply(received)
    }
}
