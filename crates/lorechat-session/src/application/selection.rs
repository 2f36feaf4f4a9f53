//! Selection controller.
//!
//! Owns the `NoLocation → LocationChosen → InConversation` transition rules.
//! A rejected transition returns `InvalidSelection` and leaves the store
//! untouched.

use lorechat_catalog::domain::catalog::WorldCatalog;
use lorechat_core::error::ChatError;
use tracing::{info, instrument};

use crate::application::history::HistoryTicket;
use crate::domain::aggregates::{SessionStore, Stage};
use crate::domain::commands::{ExitConversation, SelectLocation, SelectNpc, SessionCommand};

/// Handles `SelectLocation`: valid from any stage if the location is in the
/// catalog. Discards any conversation in progress.
///
/// # Errors
///
/// Returns `ChatError::InvalidSelection` if locations are not loaded or the
/// id is unknown.
#[instrument(skip_all, fields(location_id = command.location_id))]
pub fn handle_select_location(
    command: &SelectLocation,
    catalog: &WorldCatalog,
    store: &mut SessionStore,
) -> Result<(), ChatError> {
    if catalog.locations().is_none() {
        return Err(ChatError::InvalidSelection(
            "locations have not been loaded".to_owned(),
        ));
    }
    let location = catalog.location(command.location_id).ok_or_else(|| {
        ChatError::InvalidSelection(format!("unknown location {}", command.location_id))
    })?;

    store.reset_to_location(location.id, command.correlation_id());

    info!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        location = %location.name,
        "location selected"
    );
    Ok(())
}

/// Handles `SelectNpc`: valid only from `LocationChosen` and only for a
/// character living at the selected location.
///
/// Returns the ticket the history must be fetched under.
///
/// # Errors
///
/// Returns `ChatError::InvalidSelection` if the stage is wrong, the
/// character is unknown, or it lives elsewhere.
#[instrument(skip_all, fields(npc_id = command.npc_id))]
pub fn handle_select_npc(
    command: &SelectNpc,
    catalog: &WorldCatalog,
    store: &mut SessionStore,
) -> Result<HistoryTicket, ChatError> {
    let stage = store.stage();
    if stage != Stage::LocationChosen {
        return Err(ChatError::InvalidSelection(format!(
            "an NPC can only be chosen after a location (stage is {stage:?})"
        )));
    }
    let character = catalog.character(command.npc_id).ok_or_else(|| {
        ChatError::InvalidSelection(format!("unknown character {}", command.npc_id))
    })?;
    let selected_location_id = store.session().selected_location_id;
    if selected_location_id != Some(character.location_id) {
        return Err(ChatError::InvalidSelection(format!(
            "{} is not at the selected location",
            character.name
        )));
    }

    let token = store.begin_conversation(character.id, command.correlation_id());

    info!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        npc = %character.name,
        %token,
        "npc selected"
    );
    Ok(HistoryTicket {
        token,
        npc_id: character.id,
        correlation_id: command.correlation_id(),
    })
}

/// Handles `ExitConversation`: valid only from `InConversation`. Keeps the
/// selected location.
///
/// # Errors
///
/// Returns `ChatError::InvalidSelection` if no conversation is active.
pub fn handle_exit(command: &ExitConversation, store: &mut SessionStore) -> Result<(), ChatError> {
    if store.stage() != Stage::InConversation {
        return Err(ChatError::InvalidSelection(
            "there is no conversation to exit".to_owned(),
        ));
    }

    store.end_conversation(command.correlation_id());

    info!(
        correlation_id = %command.correlation_id(),
        command = command.command_type(),
        "conversation exited"
    );
    Ok(())
}
