use crate::clock::SharedClock;
use crate::domain::countdown::{format_countdown, is_race_live};
use crate::domain::models::{CategoryId, Race, RaceDisplayModel};

/// Builds [`RaceDisplayModel`]s against the current time.
#[derive(Clone)]
pub struct RaceDisplayMapper {
    clock: SharedClock,
}

impl RaceDisplayMapper {
    pub fn new(clock: SharedClock) -> Self {
        Self { clock }
    }

    /// Map a single race. The clock is read once so the countdown text and
    /// the live flag always agree.
    pub fn to_display_model(&self, race: &Race) -> RaceDisplayModel {
        let now = self.clock.now();
        let countdown_text = format_countdown(race.advertised_start, now);
        let is_live = is_race_live(race.advertised_start, now);

        RaceDisplayModel {
            id: race.id.clone(),
            race_name: race.name.clone(),
            race_number: race.number,
            meeting_name: race.meeting_name.clone(),
            content_description: content_description(
                race.category,
                race.number,
                &race.meeting_name,
                &countdown_text,
                is_live,
            ),
            countdown_text,
            is_live,
            category: race.category,
            category_emoji: race.category.emoji().to_string(),
            category_color: race.category.color(),
            color_hex: race.category.color().hex().to_string(),
        }
    }

    pub fn to_display_models(&self, races: &[Race]) -> Vec<RaceDisplayModel> {
        races.iter().map(|r| self.to_display_model(r)).collect()
    }
}

fn content_description(
    category: CategoryId,
    race_number: u32,
    meeting_name: &str,
    countdown_text: &str,
    is_live: bool,
) -> String {
    let status = if is_live {
        "Race is currently live.".to_string()
    } else {
        format!("Starting in {}.", countdown_text)
    };
    format!(
        "{} race number {} at {}. {}",
        category.display_name(),
        race_number,
        meeting_name,
        status
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::domain::models::CategoryColor;
    use chrono::DateTime;
    use std::sync::Arc;

    fn race(start: i64, category: CategoryId) -> Race {
        Race {
            id: "race-7".to_string(),
            name: "Maiden Plate".to_string(),
            number: 7,
            meeting_name: "Flemington".to_string(),
            category,
            advertised_start: DateTime::from_timestamp(start, 0).unwrap(),
        }
    }

    #[test]
    fn test_upcoming_race() {
        let mapper = RaceDisplayMapper::new(Arc::new(ManualClock::at(1000)));
        let model = mapper.to_display_model(&race(1150, CategoryId::Horse));

        assert_eq!(model.id, "race-7");
        assert_eq!(model.race_name, "Maiden Plate");
        assert_eq!(model.race_number, 7);
        assert_eq!(model.countdown_text, "2m 30s");
        assert!(!model.is_live);
        assert_eq!(model.category_color, CategoryColor::Green);
        assert_eq!(model.color_hex, "#38A169");
        assert_eq!(model.category_emoji, "\u{1F3C7}");
        assert_eq!(
            model.content_description,
            "Horse Racing race number 7 at Flemington. Starting in 2m 30s."
        );
    }

    #[test]
    fn test_live_race() {
        let mapper = RaceDisplayMapper::new(Arc::new(ManualClock::at(1000)));
        let model = mapper.to_display_model(&race(990, CategoryId::Greyhound));

        assert_eq!(model.countdown_text, "LIVE");
        assert!(model.is_live);
        assert_eq!(model.category_color, CategoryColor::Red);
        assert_eq!(
            model.content_description,
            "Greyhound Racing race number 7 at Flemington. Race is currently live."
        );
    }

    #[test]
    fn test_countdown_follows_clock() {
        let clock = Arc::new(ManualClock::at(1000));
        let mapper = RaceDisplayMapper::new(clock.clone());
        let r = race(1030, CategoryId::Harness);

        assert_eq!(mapper.to_display_model(&r).countdown_text, "30s");
        clock.advance(1);
        assert_eq!(mapper.to_display_model(&r).countdown_text, "29s");
        clock.advance(29);
        assert_eq!(mapper.to_display_model(&r).countdown_text, "LIVE");
    }
}
