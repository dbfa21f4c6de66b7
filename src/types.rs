use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::RickdashError;

/// Facet value meaning "no constraint".
pub const FACET_ALL: &str = "all";

pub const VALID_STATUSES: &[&str] = &["all", "alive", "dead", "unknown"];

pub const VALID_GENDERS: &[&str] = &["all", "female", "male", "genderless", "unknown"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum CharacterStatus {
    Alive,
    Dead,
    #[default]
    #[serde(rename = "unknown")]
    Unknown,
}

impl fmt::Display for CharacterStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CharacterStatus::Alive => write!(f, "Alive"),
            CharacterStatus::Dead => write!(f, "Dead"),
            CharacterStatus::Unknown => write!(f, "unknown"),
        }
    }
}

impl FromStr for CharacterStatus {
    type Err = RickdashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "alive" => Ok(CharacterStatus::Alive),
            "dead" => Ok(CharacterStatus::Dead),
            "unknown" => Ok(CharacterStatus::Unknown),
            _ => Err(RickdashError::Other(format!("invalid status '{s}'"))),
        }
    }
}

impl CharacterStatus {
    /// Lenient conversion for API payloads; anything unexpected is unknown.
    pub fn from_api(s: Option<&str>) -> Self {
        s.and_then(|s| s.parse().ok()).unwrap_or_default()
    }
}

/// A place a character comes from or currently is.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct LocationRef {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub name: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimension: Option<String>,
}

impl LocationRef {
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Default::default()
        }
    }
}

/// A character as listed by the paginated characters query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Character {
    pub id: String,
    pub name: String,
    pub status: CharacterStatus,
    pub species: String,
    pub gender: String,
    pub origin: LocationRef,
    pub location: LocationRef,
    pub image: String,
}

/// Episode reference on a character detail.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EpisodeRef {
    pub id: String,
    pub name: String,
    /// Season/episode code, e.g. `S01E01`.
    pub code: String,
}

/// Full character record from the by-id query.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CharacterDetail {
    #[serde(flatten)]
    pub character: Character,
    /// Sub-species or variant, often empty.
    #[serde(rename = "type")]
    pub kind: String,
    pub episodes: Vec<EpisodeRef>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub created: Option<String>,
}
