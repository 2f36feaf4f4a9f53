//! Text rendering for the terminal client.

use lorechat_catalog::domain::catalog::WorldCatalog;
use lorechat_core::model::{Character, CharacterId, Location, LocationId, Message, Role};
use lorechat_session::domain::aggregates::Session;
use lorechat_session::domain::events::{SessionEvent, SessionEventKind};

/// `"Bram (friendly)"`, or `"Ilsa (attitude unknown)"`.
#[must_use]
pub fn npc_label(character: &Character) -> String {
    let attitude = character
        .attitude
        .as_deref()
        .filter(|a| !a.trim().is_empty())
        .unwrap_or("attitude unknown");
    format!("{} ({attitude})", character.name)
}

/// Numbered list of locations.
#[must_use]
pub fn location_menu(locations: &[Location]) -> String {
    if locations.is_empty() {
        return "There are no locations in this world yet.".to_owned();
    }
    let mut out = String::from("Where do you want to go?");
    for location in locations {
        out.push_str(&format!("\n  [{}] {}", location.id, location.name));
    }
    out
}

/// Numbered list of the NPCs at `location_id`.
#[must_use]
pub fn npc_menu(catalog: &WorldCatalog, location_id: LocationId) -> String {
    let Some(characters) = catalog.characters_at(location_id) else {
        return "Characters have not been loaded.".to_owned();
    };
    let lines: Vec<String> = characters
        .map(|c| format!("  [{}] {}", c.id, npc_label(c)))
        .collect();
    if lines.is_empty() {
        return "Nobody is here. Try another location with /locations.".to_owned();
    }
    format!("Who do you want to talk to?\n{}", lines.join("\n"))
}

/// One log line.
#[must_use]
pub fn message_line(message: &Message, npc_name: &str) -> String {
    match message.role {
        Role::Player => format!("You: {}", message.text),
        Role::Npc => format!("{npc_name}: {}", message.text),
    }
}

/// Renders an event for the player, or `None` if it needs no output.
///
/// `session` is the state after the event was applied.
#[must_use]
pub fn render_event(
    event: &SessionEvent,
    catalog: &WorldCatalog,
    session: &Session,
) -> Option<String> {
    let npc_name = |id: CharacterId| {
        catalog
            .character(id)
            .map_or_else(|| format!("NPC {id}"), |c| c.name.clone())
    };
    let current_npc = || {
        session
            .selected_npc_id
            .map_or_else(|| "NPC".to_owned(), npc_name)
    };

    match &event.kind {
        SessionEventKind::LocationSelected { location_id } => {
            let location = catalog.location(*location_id)?;
            let mut out = format!("You arrive at {}.", location.name);
            if !location.description.is_empty() {
                out.push_str(&format!("\n{}", location.description));
            }
            if !location.reputation_levels.is_empty() {
                out.push_str(&format!(
                    "\nReputation levels: {}",
                    location.reputation_levels.join(", ")
                ));
            }
            if !location.points_of_interest.is_empty() {
                out.push_str(&format!(
                    "\nPoints of interest: {}",
                    location.points_of_interest.join(", ")
                ));
            }
            out.push('\n');
            out.push_str(&npc_menu(catalog, *location_id));
            Some(out)
        }
        SessionEventKind::NpcSelected { npc_id, .. } => Some(format!(
            "You approach {}. (type 'exit' to leave)",
            npc_name(*npc_id)
        )),
        SessionEventKind::HistoryLoaded { npc_id, turns } => {
            if *turns == 0 {
                return None;
            }
            let name = npc_name(*npc_id);
            let lines: Vec<String> = session
                .messages
                .iter()
                .map(|m| message_line(m, &name))
                .collect();
            Some(lines.join("\n"))
        }
        SessionEventKind::HistoryUnavailable { error, .. } => Some(format!(
            "(earlier conversation unavailable: {error})"
        )),
        // The player just typed it.
        SessionEventKind::PlayerMessageEchoed { .. } => None,
        SessionEventKind::ReplyRetried { text } => Some(format!("(resending: {text})")),
        SessionEventKind::NpcReplied { text } => Some(format!("{}: {text}", current_npc())),
        SessionEventKind::ReplyFailed { error } => Some(format!(
            "(no reply: {error}; type /retry to send your message again)"
        )),
        SessionEventKind::ConversationExited { npc_id } => {
            let mut out = format!("You step away from {}.", npc_name(*npc_id));
            if let Some(location_id) = session.selected_location_id {
                out.push('\n');
                out.push_str(&npc_menu(catalog, location_id));
            }
            Some(out)
        }
    }
}

/// Slash command reference.
pub const HELP: &str = "\
Commands:
  /locations       list locations
  /location <id>   go to a location
  /npcs            list NPCs at the current location
  /exit            leave the current conversation
  /retry           resend your last unanswered message
  /help            show this help
  /quit            leave lorechat
Pick a location or NPC by typing its number. In a conversation, type to talk
and 'exit' to leave.";
