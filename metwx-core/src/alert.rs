//! Traffic-light station alert.
//!
//! A coarse heuristic kept separate from the scored classifier: it looks at
//! wind, visibility and weather phrases, then escalates to red when an
//! advisory's area covers the station.

use serde::Serialize;
use tracing::debug;

use crate::current::CurrentConditions;
use crate::hazard::ParsedHazardAdvisory;
use crate::model::Decoded;
use crate::station::StationLocator;

const SEVERE_PHRASES: &[&str] = &["thunderstorm", "tornado", "ts"];
const PRECIPITATION_PHRASES: &[&str] = &["rain", "snow", "ra", "sn"];

/// Visibility assumed when the report carries none.
const DEFAULT_VISIBILITY_SM: f64 = 10.0;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
    Green,
    Yellow,
    Red,
}

impl AlertLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            AlertLevel::Green => "green",
            AlertLevel::Yellow => "yellow",
            AlertLevel::Red => "red",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationAlert {
    pub overall: AlertLevel,
    pub wind_speed: f64,
    pub visibility: f64,
    pub hazards: Vec<String>,
    pub weather_phenomena: Vec<String>,
}

/// Weather phrases in lowercase: each group's description, then its codes.
fn weather_phrases(current: &CurrentConditions) -> Vec<String> {
    let mut phrases = Vec::new();
    for wx in &current.weather {
        if !wx.description.is_empty() {
            phrases.push(wx.description.to_lowercase());
        }
        phrases.extend(wx.phenomena.iter().map(|p| p.code.to_lowercase()));
    }
    phrases
}

fn mentions(phrases: &[String], words: &[&str]) -> bool {
    phrases
        .iter()
        .any(|phrase| words.iter().any(|w| phrase.contains(w)))
}

pub fn station_alert(
    current: &CurrentConditions,
    advisories: &[ParsedHazardAdvisory],
    locator: &dyn StationLocator,
) -> StationAlert {
    let wind_speed = current.wind.present().map_or(0.0, |w| w.speed_knots());
    let visibility = current
        .visibility
        .present()
        .map_or(DEFAULT_VISIBILITY_SM, |v| v.statute_miles());
    let weather_phenomena = weather_phrases(current);

    let mut hazards = Vec::new();
    let mut overall = if wind_speed >= 25.0
        || visibility < 3.0
        || mentions(&weather_phenomena, SEVERE_PHRASES)
    {
        hazards.push("Severe weather conditions".to_string());
        AlertLevel::Red
    } else if wind_speed >= 15.0
        || visibility < 5.0
        || mentions(&weather_phenomena, PRECIPITATION_PHRASES)
    {
        hazards.push("Significant weather conditions".to_string());
        AlertLevel::Yellow
    } else {
        AlertLevel::Green
    };

    match locator.locate(&current.station) {
        Some(position) => {
            for advisory in advisories.iter().filter_map(Decoded::report) {
                if advisory.bbox.is_some_and(|bbox| bbox.contains(position)) {
                    overall = AlertLevel::Red;
                    hazards.push(format!("SIGMET: {}", advisory.hazard.label()));
                }
            }
        }
        None if !advisories.is_empty() => {
            debug!(
                station = %current.station,
                advisories = advisories.len(),
                "station position unknown, advisory overlap not checked"
            );
        }
        None => {}
    }

    StationAlert {
        overall,
        wind_speed,
        visibility,
        hazards,
        weather_phenomena,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::current::decode_current;
    use crate::hazard::decode_hazard_feed;
    use crate::station::{Coordinates, StationTable};

    fn current(text: &str) -> CurrentConditions {
        decode_current(text).report().cloned().expect("decodes")
    }

    fn table() -> StationTable {
        let mut table = StationTable::new();
        table.insert(
            "KMEM",
            Coordinates {
                latitude: 35.04,
                longitude: -89.98,
            },
        );
        table
    }

    #[test]
    fn quiet_day_is_green() {
        let alert = station_alert(
            &current("KMEM 261953Z 18008KT 10SM FEW040 25/15 A3002"),
            &[],
            &table(),
        );

        assert_eq!(alert.overall, AlertLevel::Green);
        assert_eq!(alert.wind_speed, 8.0);
        assert!(alert.hazards.is_empty());
    }

    #[test]
    fn missing_groups_use_defaults() {
        let alert = station_alert(&current("KMEM 261953Z"), &[], &table());

        assert_eq!(alert.wind_speed, 0.0);
        assert_eq!(alert.visibility, 10.0);
        assert_eq!(alert.overall, AlertLevel::Green);
    }

    #[test]
    fn thresholds() {
        let red = station_alert(&current("KMEM 261953Z 18025KT 10SM"), &[], &table());
        assert_eq!(red.overall, AlertLevel::Red);

        let red = station_alert(&current("KMEM 261953Z 18005KT 2SM"), &[], &table());
        assert_eq!(red.overall, AlertLevel::Red);

        let yellow = station_alert(&current("KMEM 261953Z 18015KT 10SM"), &[], &table());
        assert_eq!(yellow.overall, AlertLevel::Yellow);
        assert_eq!(yellow.hazards, ["Significant weather conditions"]);

        let yellow = station_alert(&current("KMEM 261953Z 18005KT 4SM"), &[], &table());
        assert_eq!(yellow.overall, AlertLevel::Yellow);
    }

    #[test]
    fn weather_phrases_drive_the_level() {
        let alert = station_alert(&current("KMEM 261953Z 18005KT 10SM TSRA"), &[], &table());
        assert_eq!(alert.overall, AlertLevel::Red);
        assert_eq!(
            alert.weather_phenomena,
            ["moderate thunderstorm rain", "ts", "ra"]
        );

        let alert = station_alert(&current("KMEM 261953Z 18005KT 10SM -SN"), &[], &table());
        assert_eq!(alert.overall, AlertLevel::Yellow);
    }

    #[test]
    fn covering_advisory_forces_red() {
        let advisories = decode_hazard_feed(
            "SEV ICE FL080/160 WI 3600N 09100W - 3400N 08800W\n\nTURB WI 4000N 07500W - 4100N 07300W",
        );
        let alert = station_alert(
            &current("KMEM 261953Z 18005KT 10SM FEW040"),
            &advisories,
            &table(),
        );

        assert_eq!(alert.overall, AlertLevel::Red);
        assert_eq!(alert.hazards, ["SIGMET: Icing"]);
    }

    #[test]
    fn unknown_station_skips_advisory_check() {
        let advisories = decode_hazard_feed("SEV ICE WI 9000N 18000W - 9000S 18000E");
        let alert = station_alert(
            &current("ZZZZ 261953Z 18005KT 10SM"),
            &advisories,
            &table(),
        );

        assert_eq!(advisories.len(), 1);
        assert!(advisories[0].report().is_some_and(|a| a.bbox.is_some()));
        assert_eq!(alert.overall, AlertLevel::Green);
        assert!(alert.hazards.is_empty());
    }
}
