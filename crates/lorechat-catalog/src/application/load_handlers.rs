//! Load handlers for the World Catalog.
//!
//! Each handler fetches one full collection and swaps it into the catalog.
//! A failed fetch leaves that collection not loaded; the failure is logged
//! here once and returned to the caller. Nothing is retried.

use lorechat_core::backend::WorldSource;
use lorechat_core::error::ChatError;
use tracing::{debug, info, warn};

use crate::domain::catalog::WorldCatalog;

/// Counts of what a full catalog load produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CatalogLoadSummary {
    /// Number of locations loaded.
    pub locations: usize,
    /// Number of characters loaded.
    pub characters: usize,
}

/// Fetches all locations and replaces the catalog's locations.
///
/// # Errors
///
/// Returns the source's error; the catalog's locations are then not loaded.
pub async fn load_locations(
    catalog: &mut WorldCatalog,
    source: &dyn WorldSource,
) -> Result<usize, ChatError> {
    match source.list_locations().await {
        Ok(locations) => {
            let count = locations.len();
            catalog.replace_locations(locations);
            debug!(count, "locations loaded");
            Ok(count)
        }
        Err(err) => {
            catalog.clear_locations();
            warn!(error = %err, "failed to load locations");
            Err(err)
        }
    }
}

/// Fetches all characters and replaces the catalog's characters.
///
/// # Errors
///
/// Returns the source's error; the catalog's characters are then not loaded.
pub async fn load_characters(
    catalog: &mut WorldCatalog,
    source: &dyn WorldSource,
) -> Result<usize, ChatError> {
    match source.list_characters().await {
        Ok(characters) => {
            let count = characters.len();
            catalog.replace_characters(characters);
            debug!(count, "characters loaded");
            Ok(count)
        }
        Err(err) => {
            catalog.clear_characters();
            warn!(error = %err, "failed to load characters");
            Err(err)
        }
    }
}

/// Loads both collections.
///
/// Both fetches are attempted even if the first fails, so a partial catalog
/// is still usable.
///
/// # Errors
///
/// Returns the first error encountered.
pub async fn load_world(
    catalog: &mut WorldCatalog,
    source: &dyn WorldSource,
) -> Result<CatalogLoadSummary, ChatError> {
    let locations = load_locations(catalog, source).await;
    let characters = load_characters(catalog, source).await;

    let orphans = catalog.orphaned_characters().count();
    if orphans > 0 {
        warn!(orphans, "characters reference unknown locations");
    }

    let summary = CatalogLoadSummary {
        locations: locations?,
        characters: characters?,
    };
    info!(
        locations = summary.locations,
        characters = summary.characters,
        "world catalog loaded"
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use lorechat_core::error::ChatError;
    use lorechat_test_support::{BackendCall, FailingBackend, InMemoryBackend, fixtures};

    use super::*;

    #[tokio::test]
    async fn test_load_world_fills_both_collections() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let mut catalog = WorldCatalog::new();

        // Act
        let summary = load_world(&mut catalog, &backend).await.unwrap();

        // Assert
        assert_eq!(summary.locations, fixtures::locations().len());
        assert_eq!(summary.characters, fixtures::characters().len());
        assert!(catalog.is_loaded());
        assert_eq!(catalog.location(1).unwrap().name, "Tavern");
    }

    #[tokio::test]
    async fn test_load_world_fetches_each_collection_once() {
        // Arrange
        let backend = InMemoryBackend::tavern_world();
        let mut catalog = WorldCatalog::new();

        // Act
        load_world(&mut catalog, &backend).await.unwrap();

        // Assert
        assert_eq!(
            backend.calls(),
            vec![BackendCall::ListLocations, BackendCall::ListCharacters]
        );
    }

    #[tokio::test]
    async fn test_failed_load_leaves_collection_not_loaded() {
        // Arrange
        let mut catalog =
            WorldCatalog::with_contents(fixtures::locations(), fixtures::characters());

        // Act
        let result = load_locations(&mut catalog, &FailingBackend).await;

        // Assert
        match result {
            Err(ChatError::NetworkFailure(_)) => {}
            other => panic!("expected NetworkFailure, got {other:?}"),
        }
        assert!(catalog.locations().is_none());
        assert!(catalog.characters().is_some());
    }

    #[tokio::test]
    async fn test_load_world_attempts_both_even_after_failure() {
        // Arrange
        let mut catalog = WorldCatalog::new();

        // Act
        let result = load_world(&mut catalog, &FailingBackend).await;

        // Assert
        assert!(result.is_err());
        assert!(catalog.locations().is_none());
        assert!(catalog.characters().is_none());
    }

    #[tokio::test]
    async fn test_reload_replaces_previous_contents() {
        // Arrange
        let backend = InMemoryBackend::new(vec![fixtures::forge()], Vec::new());
        let mut catalog =
            WorldCatalog::with_contents(fixtures::locations(), fixtures::characters());

        // Act
        load_world(&mut catalog, &backend).await.unwrap();

        // Assert
        assert!(catalog.location(1).is_none());
        assert!(catalog.location(2).is_some());
        assert_eq!(catalog.characters_at(2).unwrap().count(), 0);
    }
}
