use rickdash::source::{Page, PageInfo};
use rickdash::types::{Character, CharacterStatus, LocationRef};

pub fn character(id: &str, name: &str, location: &str) -> Character {
    Character {
        id: id.to_string(),
        name: name.to_string(),
        status: CharacterStatus::Alive,
        species: "Human".to_string(),
        gender: "Male".to_string(),
        origin: LocationRef::named("Earth (C-137)"),
        location: LocationRef::named(location),
        image: format!("https://rickandmortyapi.com/api/character/avatar/{id}.jpeg"),
    }
}

pub fn rick() -> Character {
    character("1", "Rick Sanchez", "Citadel of Ricks")
}

pub fn morty() -> Character {
    character("2", "Morty Smith", "Citadel of Ricks")
}

pub fn summer() -> Character {
    character("3", "Summer Smith", "Earth (Replacement Dimension)")
}

pub fn beth() -> Character {
    character("4", "Beth Smith", "Earth (Replacement Dimension)")
}

pub fn page(results: Vec<Character>, next: Option<u32>) -> Page<Character> {
    Page {
        info: PageInfo {
            count: 826,
            pages: 42,
            next,
            prev: None,
        },
        results,
    }
}

pub fn names(characters: &[Character]) -> Vec<&str> {
    characters.iter().map(|c| c.name.as_str()).collect()
}
