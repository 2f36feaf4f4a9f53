//! The world catalog.

use lorechat_core::model::{Character, CharacterId, Location, LocationId};

/// Locations and characters fetched from the backend.
///
/// Each collection is either not loaded (`None`) or fully loaded; a
/// replacement swaps the whole collection at once.
#[derive(Debug, Clone, Default)]
pub struct WorldCatalog {
    locations: Option<Vec<Location>>,
    characters: Option<Vec<Character>>,
}

impl WorldCatalog {
    /// Creates an empty catalog with nothing loaded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a catalog from already-fetched collections.
    #[must_use]
    pub fn with_contents(locations: Vec<Location>, characters: Vec<Character>) -> Self {
        Self {
            locations: Some(locations),
            characters: Some(characters),
        }
    }

    /// Replaces all locations.
    pub fn replace_locations(&mut self, locations: Vec<Location>) {
        self.locations = Some(locations);
    }

    /// Replaces all characters.
    pub fn replace_characters(&mut self, characters: Vec<Character>) {
        self.characters = Some(characters);
    }

    /// Marks the locations as not loaded.
    pub fn clear_locations(&mut self) {
        self.locations = None;
    }

    /// Marks the characters as not loaded.
    pub fn clear_characters(&mut self) {
        self.characters = None;
    }

    /// All locations, or `None` if they have not been loaded.
    #[must_use]
    pub fn locations(&self) -> Option<&[Location]> {
        self.locations.as_deref()
    }

    /// All characters, or `None` if they have not been loaded.
    #[must_use]
    pub fn characters(&self) -> Option<&[Character]> {
        self.characters.as_deref()
    }

    /// Both collections have been loaded.
    #[must_use]
    pub fn is_loaded(&self) -> bool {
        self.locations.is_some() && self.characters.is_some()
    }

    /// Looks up a location by id.
    #[must_use]
    pub fn location(&self, id: LocationId) -> Option<&Location> {
        self.locations()?.iter().find(|l| l.id == id)
    }

    /// Looks up a character by id.
    #[must_use]
    pub fn character(&self, id: CharacterId) -> Option<&Character> {
        self.characters()?.iter().find(|c| c.id == id)
    }

    /// Characters living at `location_id`.
    ///
    /// Returns `None` while characters are not loaded. An empty iterator
    /// means the location has no NPCs. The iterator is cheap to clone, so it
    /// can be walked more than once.
    #[must_use]
    pub fn characters_at(&self, location_id: LocationId) -> Option<CharactersAt<'_>> {
        Some(CharactersAt {
            inner: self.characters()?.iter(),
            location_id,
        })
    }

    /// Characters whose `location_id` does not match any loaded location.
    ///
    /// Empty while either collection is not loaded.
    pub fn orphaned_characters(&self) -> impl Iterator<Item = &Character> {
        let locations = self.locations().unwrap_or_default();
        let characters: &[Character] = if self.locations.is_some() {
            self.characters().unwrap_or_default()
        } else {
            &[]
        };
        characters
            .iter()
            .filter(move |c| !locations.iter().any(|l| l.id == c.location_id))
    }
}

/// Lazy iterator over the characters at one location.
#[derive(Debug, Clone)]
pub struct CharactersAt<'a> {
    inner: std::slice::Iter<'a, Character>,
    location_id: LocationId,
}

impl<'a> Iterator for CharactersAt<'a> {
    type Item = &'a Character;

    fn next(&mut self) -> Option<Self::Item> {
        let location_id = self.location_id;
        self.inner.find(|c| c.location_id == location_id)
    }
}
