//! `lorechat admin` subcommands.

use std::io::Write;

use clap::Subcommand;
use lorechat_core::backend::{NewCharacter, NewLocation, WorldAdmin, WorldSource};
use lorechat_core::model::{CharacterId, LocationId};
use tracing::{info, instrument};

use crate::error::AppError;
use crate::render::npc_label;

/// World administration.
#[derive(Debug, Clone, Subcommand)]
pub enum AdminCommand {
    /// Read or replace the global lore.
    Lore {
        #[command(subcommand)]
        action: LoreAction,
    },
    /// Manage locations.
    Locations {
        #[command(subcommand)]
        action: LocationAction,
    },
    /// Manage characters.
    Characters {
        #[command(subcommand)]
        action: CharacterAction,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum LoreAction {
    /// Print the lore.
    Show,
    /// Replace the lore.
    Set {
        /// New lore text.
        text: String,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum LocationAction {
    /// List all locations.
    List,
    /// Create a location.
    Add {
        /// Display name.
        name: String,
        /// Free-text description.
        #[arg(long)]
        description: Option<String>,
        /// Reputation tier, lowest first. Repeatable.
        #[arg(long = "reputation-level")]
        reputation_levels: Vec<String>,
        /// Notable feature. Repeatable.
        #[arg(long = "point-of-interest")]
        points_of_interest: Vec<String>,
    },
    /// Delete a location.
    Rm {
        /// Location id.
        id: LocationId,
    },
}

#[derive(Debug, Clone, Subcommand)]
pub enum CharacterAction {
    /// List all characters with their locations.
    List,
    /// Create a character.
    Add {
        /// Display name.
        name: String,
        /// Home location id.
        #[arg(long)]
        location_id: LocationId,
        /// Age in years.
        #[arg(long)]
        age: Option<u32>,
        /// Sex.
        #[arg(long)]
        sex: Option<String>,
        /// Personality trait. Repeatable.
        #[arg(long = "trait")]
        traits: Vec<String>,
        /// Attitude towards the player.
        #[arg(long)]
        attitude: Option<String>,
    },
    /// Delete a character.
    Rm {
        /// Character id.
        id: CharacterId,
    },
}

/// Runs one admin command against `backend`, printing to `out`.
///
/// # Errors
///
/// Returns `AppError::Chat` for validation and backend failures, and
/// `AppError::Io` if writing fails.
#[instrument(skip(backend, out))]
pub async fn run<B, W>(command: AdminCommand, backend: &B, out: &mut W) -> Result<(), AppError>
where
    B: WorldAdmin + WorldSource + ?Sized,
    W: Write,
{
    match command {
        AdminCommand::Lore { action } => lore(action, backend, out).await,
        AdminCommand::Locations { action } => locations(action, backend, out).await,
        AdminCommand::Characters { action } => characters(action, backend, out).await,
    }
}

async fn lore<B, W>(action: LoreAction, backend: &B, out: &mut W) -> Result<(), AppError>
where
    B: WorldAdmin + WorldSource + ?Sized,
    W: Write,
{
    match action {
        LoreAction::Show => {
            let lore = backend.lore().await?;
            if lore.content.is_empty() {
                writeln!(out, "(no lore yet)")?;
            } else {
                writeln!(out, "{}", lore.content)?;
            }
        }
        LoreAction::Set { text } => {
            let lore = backend.replace_lore(&text).await?;
            info!(chars = lore.content.chars().count(), "lore replaced");
            writeln!(
                out,
                "Lore updated ({} characters).",
                lore.content.chars().count()
            )?;
        }
    }
    Ok(())
}

async fn locations<B, W>(action: LocationAction, backend: &B, out: &mut W) -> Result<(), AppError>
where
    B: WorldAdmin + WorldSource + ?Sized,
    W: Write,
{
    match action {
        LocationAction::List => {
            let locations = backend.list_locations().await?;
            if locations.is_empty() {
                writeln!(out, "No locations.")?;
            }
            for location in locations {
                if location.description.is_empty() {
                    writeln!(out, "[{}] {}", location.id, location.name)?;
                } else {
                    writeln!(
                        out,
                        "[{}] {}: {}",
                        location.id, location.name, location.description
                    )?;
                }
            }
        }
        LocationAction::Add {
            name,
            description,
            reputation_levels,
            points_of_interest,
        } => {
            let new_location = NewLocation {
                name: name.trim().to_owned(),
                description,
                reputation_levels,
                points_of_interest,
            };
            new_location.validate()?;
            let created = backend.create_location(&new_location).await?;
            info!(id = created.id, "location created");
            writeln!(out, "Created location [{}] {}.", created.id, created.name)?;
        }
        LocationAction::Rm { id } => {
            backend.delete_location(id).await?;
            info!(id, "location deleted");
            writeln!(out, "Deleted location {id}.")?;
        }
    }
    Ok(())
}

async fn characters<B, W>(action: CharacterAction, backend: &B, out: &mut W) -> Result<(), AppError>
where
    B: WorldAdmin + WorldSource + ?Sized,
    W: Write,
{
    match action {
        CharacterAction::List => {
            let characters = backend.list_characters().await?;
            let locations = backend.list_locations().await?;
            if characters.is_empty() {
                writeln!(out, "No characters.")?;
            }
            for character in characters {
                let place = locations
                    .iter()
                    .find(|l| l.id == character.location_id)
                    .map_or_else(
                        || format!("location {}", character.location_id),
                        |l| l.name.clone(),
                    );
                writeln!(
                    out,
                    "[{}] {} at {place}",
                    character.id,
                    npc_label(&character)
                )?;
            }
        }
        CharacterAction::Add {
            name,
            location_id,
            age,
            sex,
            traits,
            attitude,
        } => {
            let new_character = NewCharacter {
                name: name.trim().to_owned(),
                age,
                sex,
                traits,
                attitude,
                location_id,
            };
            new_character.validate()?;
            let created = backend.create_character(&new_character).await?;
            info!(id = created.id, "character created");
            writeln!(out, "Created character [{}] {}.", created.id, created.name)?;
        }
        CharacterAction::Rm { id } => {
            backend.delete_character(id).await?;
            info!(id, "character deleted");
            writeln!(out, "Deleted character {id}.")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use lorechat_core::error::ChatError;
    use lorechat_test_support::{BackendCall, InMemoryBackend};

    use super::*;

    async fn run_to_string(
        command: AdminCommand,
        backend: &InMemoryBackend,
    ) -> (Result<(), AppError>, String) {
        let mut out = Vec::new();
        let result = run(command, backend, &mut out).await;
        (result, String::from_utf8(out).unwrap())
    }

    #[tokio::test]
    async fn test_lore_set_then_show() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let set = AdminCommand::Lore {
            action: LoreAction::Set {
                text: "Old gods sleep.".to_owned(),
            },
        };
        let show = AdminCommand::Lore {
            action: LoreAction::Show,
        };

        // Act
        let (set_result, set_out) = run_to_string(set, &backend).await;
        let (_, show_out) = run_to_string(show, &backend).await;

        // Assert
        assert!(set_result.is_ok());
        assert_eq!(set_out, "Lore updated (15 characters).\n");
        assert_eq!(show_out, "Old gods sleep.\n");
    }

    #[tokio::test]
    async fn test_characters_list_shows_location_names() {
        let backend = InMemoryBackend::tavern_world();

        let (_, out) = run_to_string(
            AdminCommand::Characters {
                action: CharacterAction::List,
            },
            &backend,
        )
        .await;

        assert!(out.contains("[5] Bram (friendly) at Tavern"));
        assert!(out.contains("[6] Ilsa (attitude unknown) at Tavern"));
        assert!(out.contains("[7] Dorn (wary) at Forge"));
    }

    #[tokio::test]
    async fn test_add_location_with_blank_name_sends_nothing() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let command = AdminCommand::Locations {
            action: LocationAction::Add {
                name: "   ".to_owned(),
                description: None,
                reputation_levels: Vec::new(),
                points_of_interest: Vec::new(),
            },
        };

        // Act
        let (result, _) = run_to_string(command, &backend).await;

        // Assert
        assert!(matches!(
            result,
            Err(AppError::Chat(ChatError::Validation(_)))
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_add_character_reports_new_id() {
        let backend = InMemoryBackend::tavern_world();
        let command = AdminCommand::Characters {
            action: CharacterAction::Add {
                name: "Wren".to_owned(),
                location_id: 2,
                age: None,
                sex: None,
                traits: vec!["shy".to_owned()],
                attitude: None,
            },
        };

        let (result, out) = run_to_string(command, &backend).await;

        assert!(result.is_ok());
        assert_eq!(out, "Created character [8] Wren.\n");
        assert_eq!(
            backend.calls(),
            vec![BackendCall::CreateCharacter("Wren".to_owned())]
        );
    }

    #[tokio::test]
    async fn test_remove_missing_location_fails_with_backend_404() {
        let backend = InMemoryBackend::tavern_world();

        let (result, _) = run_to_string(
            AdminCommand::Locations {
                action: LocationAction::Rm { id: 42 },
            },
            &backend,
        )
        .await;

        assert!(matches!(
            result,
            Err(AppError::Chat(ChatError::Backend { status: 404, .. }))
        ));
    }
}
