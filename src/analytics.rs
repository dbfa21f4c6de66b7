//! Aggregations over loaded characters.

use std::collections::HashMap;

use serde::Serialize;

use crate::types::Character;

/// Name the API uses for a location it does not know.
const UNKNOWN_LOCATION: &str = "unknown";

/// Number of characters currently at one location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LocationCount {
    pub name: String,
    pub count: usize,
}

impl LocationCount {
    /// Percentage of `total` this location accounts for.
    pub fn share(&self, total: usize) -> f64 {
        if total == 0 {
            return 0.0;
        }
        self.count as f64 * 100.0 / total as f64
    }
}

/// Count characters per current location.
///
/// Characters with an empty or `"unknown"` location are skipped. The result
/// is ordered by count, highest first; equal counts keep first-seen order.
pub fn group_by_location(characters: &[Character]) -> Vec<LocationCount> {
    let mut index: HashMap<&str, usize> = HashMap::new();
    let mut counts: Vec<LocationCount> = Vec::new();

    for character in characters {
        let name = character.location.name.as_str();
        if name.is_empty() || name == UNKNOWN_LOCATION {
            continue;
        }
        match index.get(name) {
            Some(&i) => counts[i].count += 1,
            None => {
                index.insert(name, counts.len());
                counts.push(LocationCount {
                    name: name.to_string(),
                    count: 1,
                });
            }
        }
    }

    // Stable sort keeps first-seen order between equal counts.
    counts.sort_by(|a, b| b.count.cmp(&a.count));
    counts
}

/// Sum of all counts, i.e. the characters with a known location.
pub fn total(counts: &[LocationCount]) -> usize {
    counts.iter().map(|c| c.count).sum()
}
