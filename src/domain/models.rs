use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// One of the three racing disciplines served by the racing API.
///
/// Declaration order is the ordinal used when per-category results are
/// merged: Greyhound, then Harness, then Horse.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, ToSchema,
)]
#[serde(rename_all = "snake_case")]
pub enum CategoryId {
    Greyhound,
    Harness,
    Horse,
}

impl CategoryId {
    /// Every category, in ordinal order.
    pub const ALL: [CategoryId; 3] = [CategoryId::Greyhound, CategoryId::Harness, CategoryId::Horse];

    /// Identifier the racing API uses for category-scoped queries.
    pub fn external_id(self) -> &'static str {
        match self {
            CategoryId::Greyhound => "9daef0d7-bf3c-4f50-921d-8e818c60fe61",
            CategoryId::Harness => "161d9be2-e909-4326-8c2c-35ed71fb460b",
            CategoryId::Horse => "4a2788f8-e825-4d36-9894-efd4baf1cfae",
        }
    }

    /// Reverse lookup of [`CategoryId::external_id`]. Unknown ids yield `None`.
    pub fn from_external_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|c| c.external_id() == id)
    }

    pub fn display_name(self) -> &'static str {
        match self {
            CategoryId::Greyhound => "Greyhound Racing",
            CategoryId::Harness => "Harness Racing",
            CategoryId::Horse => "Horse Racing",
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            CategoryId::Greyhound => "\u{1F9AE}",
            CategoryId::Harness => "\u{1F683}",
            CategoryId::Horse => "\u{1F3C7}",
        }
    }

    pub fn color(self) -> CategoryColor {
        match self {
            CategoryId::Greyhound => CategoryColor::Red,
            CategoryId::Harness => CategoryColor::Yellow,
            CategoryId::Horse => CategoryColor::Green,
        }
    }
}

/// Accent color a category is rendered with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "lowercase")]
pub enum CategoryColor {
    Green,
    Red,
    Yellow,
}

impl CategoryColor {
    pub fn hex(self) -> &'static str {
        match self {
            CategoryColor::Green => "#38A169",
            CategoryColor::Red => "#E53E3E",
            CategoryColor::Yellow => "#D69E2E",
        }
    }
}

/// An upcoming race as decoded from the racing API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Race {
    pub id: String,
    pub name: String,
    pub number: u32,
    pub meeting_name: String,
    pub category: CategoryId,
    pub advertised_start: DateTime<Utc>,
}

/// Projection of a [`Race`] ready for display, rebuilt on every tick.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct RaceDisplayModel {
    /// Race identifier, copied from the source race
    pub id: String,
    /// Race name (e.g. "Maiden Plate")
    pub race_name: String,
    /// Race number within the meeting
    pub race_number: u32,
    /// Meeting / venue name
    pub meeting_name: String,
    /// Pre-formatted countdown: "2m 33s", "LIVE", ...
    pub countdown_text: String,
    /// Whether the race is inside its live window
    pub is_live: bool,
    pub category: CategoryId,
    /// Pictogram shown next to the category name
    pub category_emoji: String,
    pub category_color: CategoryColor,
    /// `category_color` as a `#RRGGBB` string
    pub color_hex: String,
    /// Screen-reader description of the card
    pub content_description: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_external_id_round_trips_for_every_category() {
        for category in CategoryId::ALL {
            assert_eq!(
                CategoryId::from_external_id(category.external_id()),
                Some(category)
            );
        }
    }

    #[test]
    fn test_unknown_external_id() {
        assert_eq!(CategoryId::from_external_id("not-a-category"), None);
        assert_eq!(CategoryId::from_external_id(""), None);
    }

    #[test]
    fn test_category_colors() {
        assert_eq!(CategoryId::Horse.color(), CategoryColor::Green);
        assert_eq!(CategoryId::Greyhound.color(), CategoryColor::Red);
        assert_eq!(CategoryId::Harness.color(), CategoryColor::Yellow);
        assert_eq!(CategoryColor::Green.hex(), "#38A169");
    }

    #[test]
    fn test_ordinal_order() {
        let mut categories = vec![CategoryId::Horse, CategoryId::Greyhound, CategoryId::Harness];
        categories.sort();
        assert_eq!(categories, CategoryId::ALL.to_vec());
    }

    #[test]
    fn test_category_serializes_snake_case() {
        let json = serde_json::to_string(&CategoryId::Greyhound).unwrap();
        assert_eq!(json, "\"greyhound\"");
        let parsed: CategoryId = serde_json::from_str("\"horse\"").unwrap();
        assert_eq!(parsed, CategoryId::Horse);
    }
}
