//! Interactive chat loop.
//!
//! Input lines and backend completions are multiplexed with
//! `tokio::select!`. Round trips run on a `JoinSet`; their results come back
//! to the loop, which is the only place session state is touched.

use std::io::{self, Write};
use std::sync::Arc;

use lorechat_catalog::application::load_handlers::load_world;
use lorechat_catalog::domain::catalog::WorldCatalog;
use lorechat_client::HttpBackend;
use lorechat_core::backend::{DialogueBackend, WorldSource};
use lorechat_core::error::ChatError;
use lorechat_core::model::{CharacterId, LocationId};
use lorechat_session::application::conversation::Conversation;
use lorechat_session::application::exchange::{self, PendingReply, ReplyReceived, SendStep};
use lorechat_session::application::history::{self, HistoryFetched, HistoryTicket};
use lorechat_session::domain::aggregates::Stage;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinSet;
use tracing::{debug, info, instrument, warn};

use crate::config::Config;
use crate::error::AppError;
use crate::input::{self, Input};
use crate::render;

/// A backend round trip that finished on the task set.
#[derive(Debug)]
pub enum Completion {
    /// Dialogue history for a selected NPC.
    History(HistoryFetched),
    /// The NPC's answer to a player message.
    Reply(ReplyReceived),
}

/// Whether the loop should keep reading input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// REPL state: the conversation, the outstanding round trips and the
/// output sink.
pub struct Repl<W: Write> {
    conversation: Conversation,
    world: Arc<dyn WorldSource>,
    tasks: JoinSet<Completion>,
    out: W,
}

impl<W: Write> Repl<W> {
    /// Loads the world catalog and prints the location menu.
    ///
    /// A failed catalog load is reported but does not stop the client;
    /// `/locations` tries again.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if writing to `out` fails.
    pub async fn start(
        world: Arc<dyn WorldSource>,
        dialogue: Arc<dyn DialogueBackend>,
        out: W,
    ) -> Result<Self, AppError> {
        let mut repl = Self {
            conversation: Conversation::new(WorldCatalog::new(), dialogue),
            world,
            tasks: JoinSet::new(),
            out,
        };
        repl.show_locations().await?;
        Ok(repl)
    }

    /// Handles one line of input.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if writing output fails. Session errors are
    /// printed, not returned.
    #[instrument(skip_all, fields(stage = ?self.conversation.stage()))]
    pub async fn handle_line(&mut self, line: &str) -> Result<Flow, AppError> {
        let stage = self.conversation.stage();
        match input::parse(line, stage) {
            Input::Empty => {}
            Input::Quit => return Ok(Flow::Quit),
            Input::Help => writeln!(self.out, "{}", render::HELP)?,
            Input::ListLocations => self.show_locations().await?,
            Input::GoTo(location_id) => self.go_to(location_id)?,
            Input::ListNpcs => self.show_npcs()?,
            Input::Leave => {
                if let Err(err) = self.conversation.exit() {
                    self.report(&err)?;
                }
            }
            Input::Retry => match self.conversation.begin_retry() {
                Ok(pending) => self.spawn_reply(pending),
                Err(err) => self.report(&err)?,
            },
            Input::Pick(id) if stage == Stage::NoLocation => self.go_to(id)?,
            Input::Pick(id) => self.talk_to(id)?,
            Input::Say(text) => match self.conversation.begin_send(&text) {
                Ok(SendStep::Dispatched(pending)) => self.spawn_reply(pending),
                Ok(SendStep::Ignored | SendStep::Exited) => {}
                Err(err) => self.report(&err)?,
            },
            Input::Unknown(hint) => writeln!(self.out, "{hint}")?,
        }
        self.flush_events()?;
        Ok(Flow::Continue)
    }

    /// Whether any round trip is still running.
    #[must_use]
    pub fn has_pending(&self) -> bool {
        !self.tasks.is_empty()
    }

    /// Waits for the next finished round trip.
    pub async fn next_completion(&mut self) -> Option<Completion> {
        loop {
            match self.tasks.join_next().await? {
                Ok(completion) => return Some(completion),
                Err(err) => warn!(error = %err, "backend task did not complete"),
            }
        }
    }

    /// Applies a finished round trip and prints what changed.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if writing output fails.
    pub fn apply(&mut self, completion: Completion) -> Result<(), AppError> {
        let result = match completion {
            Completion::History(fetched) => self.conversation.apply_history(fetched).map(drop),
            Completion::Reply(received) => self.conversation.apply_reply(received).map(drop),
        };
        if let Err(err) = result {
            // Failures are rendered from their event; stale results are dropped.
            debug!(error = %err, "completion not applied");
        }
        self.flush_events()
    }

    /// Applies every outstanding round trip.
    ///
    /// # Errors
    ///
    /// Returns `AppError::Io` if writing output fails.
    pub async fn settle(&mut self) -> Result<(), AppError> {
        while let Some(completion) = self.next_completion().await {
            self.apply(completion)?;
        }
        Ok(())
    }

    async fn show_locations(&mut self) -> Result<(), AppError> {
        if !self.conversation.catalog().is_loaded() {
            let reloaded = load_world(self.conversation.catalog_mut(), self.world.as_ref()).await;
            if let Err(err) = reloaded {
                writeln!(self.out, "! could not load the world: {err}")?;
            }
        }
        match self.conversation.catalog().locations() {
            Some(locations) => writeln!(self.out, "{}", render::location_menu(locations))?,
            None => writeln!(self.out, "Type /locations to try again.")?,
        }
        Ok(())
    }

    fn show_npcs(&mut self) -> Result<(), AppError> {
        match self.conversation.session().selected_location_id {
            Some(location_id) => writeln!(
                self.out,
                "{}",
                render::npc_menu(self.conversation.catalog(), location_id)
            )?,
            None => writeln!(self.out, "Choose a location first.")?,
        }
        Ok(())
    }

    fn go_to(&mut self, location_id: LocationId) -> Result<(), AppError> {
        if let Err(err) = self.conversation.select_location(location_id) {
            self.report(&err)?;
        }
        Ok(())
    }

    fn talk_to(&mut self, npc_id: CharacterId) -> Result<(), AppError> {
        match self.conversation.select_npc(npc_id) {
            Ok(ticket) => self.spawn_history(ticket),
            Err(err) => self.report(&err)?,
        }
        Ok(())
    }

    fn spawn_history(&mut self, ticket: HistoryTicket) {
        let backend = self.conversation.backend();
        self.tasks.spawn(async move {
            Completion::History(history::fetch_history(ticket, backend.as_ref()).await)
        });
    }

    fn spawn_reply(&mut self, pending: PendingReply) {
        let backend = self.conversation.backend();
        self.tasks.spawn(async move {
            Completion::Reply(exchange::deliver(pending, backend.as_ref()).await)
        });
    }

    fn report(&mut self, err: &ChatError) -> io::Result<()> {
        if err.is_user_visible() {
            writeln!(self.out, "! {err}")?;
        }
        Ok(())
    }

    fn flush_events(&mut self) -> Result<(), AppError> {
        for event in self.conversation.drain_events() {
            debug!(
                event_type = event.event_type(),
                sequence_number = event.sequence_number,
                correlation_id = %event.correlation_id,
                "session event"
            );
            let rendered = render::render_event(
                &event,
                self.conversation.catalog(),
                self.conversation.session(),
            );
            if let Some(text) = rendered {
                writeln!(self.out, "{text}")?;
            }
        }
        self.out.flush()?;
        Ok(())
    }
}

/// Runs the interactive client on stdin/stdout until `/quit` or end of
/// input.
///
/// # Errors
///
/// Returns `AppError::Http` if the HTTP client cannot be built and
/// `AppError::Io` on terminal I/O failure.
pub async fn run(config: &Config) -> Result<(), AppError> {
    let backend = Arc::new(HttpBackend::new(&config.api_base, config.timeout)?);
    info!(api_base = %config.api_base, "starting chat");
    let mut repl = Repl::start(backend.clone(), backend, io::stdout()).await?;
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        tokio::select! {
            line = lines.next_line() => {
                let Some(line) = line? else {
                    // Piped input: show the answers to what was sent.
                    repl.settle().await?;
                    break;
                };
                if repl.handle_line(&line).await? == Flow::Quit {
                    break;
                }
            }
            Some(completion) = repl.next_completion(), if repl.has_pending() => {
                repl.apply(completion)?;
            }
        }
    }
    Ok(())
}
