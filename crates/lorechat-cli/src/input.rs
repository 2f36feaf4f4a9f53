//! Parsing of REPL input lines.

use lorechat_core::model::LocationId;
use lorechat_session::domain::aggregates::Stage;

/// What a line of input asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// Nothing typed outside a conversation.
    Empty,
    /// `/quit`
    Quit,
    /// `/help`
    Help,
    /// `/locations`
    ListLocations,
    /// `/location <id>`
    GoTo(LocationId),
    /// `/npcs`
    ListNpcs,
    /// `/exit`
    Leave,
    /// `/retry`
    Retry,
    /// A bare number outside a conversation: a location or an NPC id,
    /// depending on the stage.
    Pick(i64),
    /// Text for the NPC, passed on untrimmed.
    Say(String),
    /// Anything else, with a hint for the player.
    Unknown(String),
}

/// Parses one line typed at `stage`.
#[must_use]
pub fn parse(line: &str, stage: Stage) -> Input {
    let trimmed = line.trim();
    if let Some(command) = trimmed.strip_prefix('/') {
        return parse_command(command);
    }
    if stage == Stage::InConversation {
        return Input::Say(line.to_owned());
    }
    if trimmed.is_empty() {
        return Input::Empty;
    }
    match trimmed.parse::<i64>() {
        Ok(id) => Input::Pick(id),
        Err(_) => Input::Unknown(match stage {
            Stage::NoLocation => "type a location number, or /help".to_owned(),
            _ => "type an NPC number, /locations to move on, or /help".to_owned(),
        }),
    }
}

fn parse_command(command: &str) -> Input {
    let mut parts = command.split_whitespace();
    let name = parts.next().unwrap_or_default().to_ascii_lowercase();
    let argument = parts.next();
    match (name.as_str(), argument) {
        ("quit" | "q", _) => Input::Quit,
        ("help" | "h" | "?", _) => Input::Help,
        ("locations", _) => Input::ListLocations,
        ("location", Some(id)) => id.parse().map_or_else(
            |_| Input::Unknown(format!("{id:?} is not a location number")),
            Input::GoTo,
        ),
        ("location", None) => Input::Unknown("usage: /location <id>".to_owned()),
        ("npcs", _) => Input::ListNpcs,
        ("exit" | "leave", _) => Input::Leave,
        ("retry", _) => Input::Retry,
        _ => Input::Unknown(format!("unknown command /{name}, try /help")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_number_is_pick_outside_conversation() {
        assert_eq!(parse(" 5 ", Stage::NoLocation), Input::Pick(5));
        assert_eq!(parse("7", Stage::LocationChosen), Input::Pick(7));
    }

    #[test]
    fn test_text_in_conversation_is_said_verbatim() {
        assert_eq!(
            parse("  12 apples  ", Stage::InConversation),
            Input::Say("  12 apples  ".to_owned())
        );
        assert_eq!(parse("", Stage::InConversation), Input::Say(String::new()));
    }

    #[test]
    fn test_slash_commands_work_in_every_stage() {
        for stage in [
            Stage::NoLocation,
            Stage::LocationChosen,
            Stage::InConversation,
        ] {
            assert_eq!(parse("/quit", stage), Input::Quit);
            assert_eq!(parse("/RETRY", stage), Input::Retry);
            assert_eq!(parse("/location 2", stage), Input::GoTo(2));
            assert_eq!(parse("/npcs", stage), Input::ListNpcs);
            assert_eq!(parse("/Exit", stage), Input::Leave);
        }
    }

    #[test]
    fn test_bad_location_argument_is_unknown() {
        assert!(matches!(
            parse("/location tavern", Stage::NoLocation),
            Input::Unknown(_)
        ));
        assert!(matches!(
            parse("/location", Stage::NoLocation),
            Input::Unknown(_)
        ));
    }

    #[test]
    fn test_blank_outside_conversation_is_empty() {
        assert_eq!(parse("   ", Stage::LocationChosen), Input::Empty);
    }

    #[test]
    fn test_words_outside_conversation_are_unknown() {
        assert!(matches!(
            parse("hello", Stage::NoLocation),
            Input::Unknown(_)
        ));
    }
}
