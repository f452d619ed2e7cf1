// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Room-type vocabulary
//!
//! Dataset labels are free text ("Stairs", "Living room", "core"). They are
//! folded into a small enum so rules and pattern labels compare exactly.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Room-type labels that never become rooms.
pub const IGNORED_LABELS: [&str; 6] = [
    "structure",
    "door",
    "window",
    "entrance door",
    "balcony",
    "shaft",
];

/// Room category of a space.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum RoomType {
    Bathroom,
    Kitchen,
    Bedroom,
    Livingroom,
    Dining,
    Storeroom,
    Corridor,
    Stair,
    /// Vertical circulation core serving several apartments
    Core,
    Other(String),
}

impl RoomType {
    /// Parse a dataset label (case and whitespace insensitive)
    pub fn parse(label: &str) -> Self {
        let folded = normalize_label(label);
        match folded.as_str() {
            "bathroom" | "bath" | "wc" => Self::Bathroom,
            "kitchen" => Self::Kitchen,
            "bedroom" => Self::Bedroom,
            "livingroom" | "living_room" | "living" => Self::Livingroom,
            "dining" | "dining_room" => Self::Dining,
            "storeroom" | "storage" => Self::Storeroom,
            "corridor" | "hallway" => Self::Corridor,
            "stair" | "stairs" | "staircase" => Self::Stair,
            "core" | "stair_core" | "stair-core" | "staircore" => Self::Core,
            _ => Self::Other(folded),
        }
    }

    /// Canonical display name
    pub fn as_str(&self) -> &str {
        match self {
            Self::Bathroom => "Bathroom",
            Self::Kitchen => "Kitchen",
            Self::Bedroom => "Bedroom",
            Self::Livingroom => "Livingroom",
            Self::Dining => "Dining",
            Self::Storeroom => "Storeroom",
            Self::Corridor => "Corridor",
            Self::Stair => "Stair",
            Self::Core => "Core",
            Self::Other(s) => s,
        }
    }

    /// Lowercase label used for mining and pattern matching
    pub fn normalized_label(&self) -> String {
        normalize_label(self.as_str())
    }

    #[inline]
    pub fn is_core(&self) -> bool {
        matches!(self, Self::Core)
    }
}

impl From<String> for RoomType {
    fn from(s: String) -> Self {
        Self::parse(&s)
    }
}

impl From<RoomType> for String {
    fn from(t: RoomType) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for RoomType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Lowercase, trim and join internal whitespace runs with `_`.
pub fn normalize_label(label: &str) -> String {
    label
        .split_whitespace()
        .collect::<Vec<_>>()
        .join("_")
        .to_lowercase()
}

/// True for labels such as Door or Balcony that are not rooms.
pub fn is_ignored_label(label: &str) -> bool {
    let lowered = label.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase();
    IGNORED_LABELS.contains(&lowered.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_aliases() {
        assert_eq!(RoomType::parse("Stairs"), RoomType::Stair);
        assert_eq!(RoomType::parse(" Living  room "), RoomType::Livingroom);
        assert_eq!(RoomType::parse("core"), RoomType::Core);
        assert_eq!(RoomType::parse("Stair Core"), RoomType::Core);
        assert_eq!(RoomType::parse("BATHROOM"), RoomType::Bathroom);
        assert_eq!(
            RoomType::parse("Laundry Room"),
            RoomType::Other("laundry_room".to_string())
        );
    }

    #[test]
    fn test_normalized_label() {
        assert_eq!(RoomType::Livingroom.normalized_label(), "livingroom");
        assert_eq!(normalize_label("  Entrance   Door "), "entrance_door");
    }

    #[test]
    fn test_ignored_labels() {
        assert!(is_ignored_label("Entrance Door"));
        assert!(is_ignored_label(" entrance \t DOOR "));
        assert!(is_ignored_label("balcony"));
        assert!(!is_ignored_label("Kitchen"));
    }

    #[test]
    fn test_serde_as_string() {
        let json = serde_json::to_string(&RoomType::Bathroom).unwrap();
        assert_eq!(json, "\"Bathroom\"");
        let back: RoomType = serde_json::from_str("\"stairs\"").unwrap();
        assert_eq!(back, RoomType::Stair);
    }
}
