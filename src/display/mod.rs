//! Terminal rendering of characters and location breakdowns.

use owo_colors::OwoColorize;
use tabled::settings::Style;
use tabled::{Table, Tabled};

use crate::analytics::{self, LocationCount};
use crate::types::{Character, CharacterDetail, CharacterStatus};

/// A row in the character table
#[derive(Tabled)]
struct CharacterRow {
    #[tabled(rename = "ID")]
    id: String,
    #[tabled(rename = "Name")]
    name: String,
    #[tabled(rename = "Status")]
    status: String,
    #[tabled(rename = "Species")]
    species: String,
    #[tabled(rename = "Gender")]
    gender: String,
    #[tabled(rename = "Location")]
    location: String,
}

impl From<&Character> for CharacterRow {
    fn from(character: &Character) -> Self {
        CharacterRow {
            id: character.id.clone(),
            name: character.name.clone(),
            status: character.status.to_string(),
            species: character.species.clone(),
            gender: character.gender.clone(),
            location: character.location.name.clone(),
        }
    }
}

/// A row in the location breakdown table
#[derive(Tabled)]
struct LocationRow {
    #[tabled(rename = "Location")]
    name: String,
    #[tabled(rename = "Characters")]
    count: usize,
    #[tabled(rename = "Share")]
    share: String,
}

/// Colored status badge. Table cells stay uncolored so widths line up.
pub fn format_status_colored(status: CharacterStatus) -> String {
    let badge = format!("[{status}]");
    match status {
        CharacterStatus::Alive => badge.green().to_string(),
        CharacterStatus::Dead => badge.red().to_string(),
        CharacterStatus::Unknown => badge.dimmed().to_string(),
    }
}

pub fn character_table(characters: &[Character]) -> String {
    let rows: Vec<CharacterRow> = characters.iter().map(CharacterRow::from).collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

pub fn location_table(counts: &[LocationCount]) -> String {
    let total = analytics::total(counts);
    let rows: Vec<LocationRow> = counts
        .iter()
        .map(|c| LocationRow {
            name: c.name.clone(),
            count: c.count,
            share: format!("{:.1}%", c.share(total)),
        })
        .collect();
    Table::new(rows).with(Style::rounded()).to_string()
}

/// Summary line under a listing, e.g. `40 of 826 characters (page 2 of 42)`.
pub fn format_page_summary(shown: usize, count: u32, pages: u32, next: Option<u32>) -> String {
    let loaded_pages = match next {
        Some(next) => next.saturating_sub(1),
        None => pages,
    };
    format!("{shown} of {count} characters (page {loaded_pages} of {pages})")
}

pub fn format_character_detail(detail: &CharacterDetail) -> String {
    let character = &detail.character;
    let mut out = String::new();

    out.push_str(&format!(
        "{} {} {}\n\n",
        character.id.cyan(),
        character.name.bold(),
        format_status_colored(character.status)
    ));

    let species = if detail.kind.is_empty() {
        character.species.clone()
    } else {
        format!("{} ({})", character.species, detail.kind)
    };
    out.push_str(&format!("{}: {}\n", "species".cyan(), species));
    out.push_str(&format!("{}: {}\n", "gender".cyan(), character.gender));

    for (label, location) in [("origin", &character.origin), ("location", &character.location)] {
        match &location.dimension {
            Some(dimension) => out.push_str(&format!(
                "{}: {} [{}]\n",
                label.cyan(),
                location.name,
                dimension.dimmed()
            )),
            None => out.push_str(&format!("{}: {}\n", label.cyan(), location.name)),
        }
    }

    if !detail.episodes.is_empty() {
        out.push_str(&format!("\n{} ({}):\n", "episodes".cyan(), detail.episodes.len()));
        for episode in &detail.episodes {
            out.push_str(&format!("  {} {}\n", episode.code.dimmed(), episode.name));
        }
    }

    if let Some(created) = &detail.created {
        out.push_str(&format!("\n{}", format!("Created: {created}").dimmed()));
    }

    out.trim_end().to_string()
}
