//! World fixtures.
//!
//! Tavern (1) holds Bram (5) and Ilsa (6); Forge (2) holds Dorn (7);
//! Crypt (3) is empty.

use lorechat_core::backend::DialogueTurn;
use lorechat_core::model::{Character, Location};

/// Location 1.
#[must_use]
pub fn tavern() -> Location {
    Location {
        id: 1,
        name: "Tavern".to_owned(),
        description: "A smoky common room by the river.".to_owned(),
        reputation_levels: vec!["stranger".to_owned(), "regular".to_owned()],
        points_of_interest: vec!["hearth".to_owned(), "notice board".to_owned()],
    }
}

/// Location 2.
#[must_use]
pub fn forge() -> Location {
    Location {
        id: 2,
        name: "Forge".to_owned(),
        description: "Hot, loud and full of sparks.".to_owned(),
        reputation_levels: Vec::new(),
        points_of_interest: vec!["anvil".to_owned()],
    }
}

/// Location 3, with no characters.
#[must_use]
pub fn crypt() -> Location {
    Location {
        id: 3,
        name: "Crypt".to_owned(),
        description: String::new(),
        reputation_levels: Vec::new(),
        points_of_interest: Vec::new(),
    }
}

/// Character 5, at the tavern.
#[must_use]
pub fn bram() -> Character {
    Character {
        id: 5,
        name: "Bram".to_owned(),
        age: Some(52),
        sex: Some("male".to_owned()),
        traits: vec!["gruff".to_owned(), "honest".to_owned()],
        attitude: Some("friendly".to_owned()),
        location_id: 1,
    }
}

/// Character 6, at the tavern.
#[must_use]
pub fn ilsa() -> Character {
    Character {
        id: 6,
        name: "Ilsa".to_owned(),
        age: None,
        sex: Some("female".to_owned()),
        traits: vec!["curious".to_owned()],
        attitude: None,
        location_id: 1,
    }
}

/// Character 7, at the forge.
#[must_use]
pub fn dorn() -> Character {
    Character {
        id: 7,
        name: "Dorn".to_owned(),
        age: Some(34),
        sex: None,
        traits: Vec::new(),
        attitude: Some("wary".to_owned()),
        location_id: 2,
    }
}

/// All fixture locations.
#[must_use]
pub fn locations() -> Vec<Location> {
    vec![tavern(), forge(), crypt()]
}

/// All fixture characters.
#[must_use]
pub fn characters() -> Vec<Character> {
    vec![bram(), ilsa(), dorn()]
}

/// A history turn with a raw server role tag.
#[must_use]
pub fn turn(role: &str, message: &str) -> DialogueTurn {
    DialogueTurn {
        role: role.to_owned(),
        message: message.to_owned(),
    }
}
