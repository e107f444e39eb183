//! Per-station and route briefings built from decoded reports.

use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::alert::{AlertLevel, StationAlert, station_alert};
use crate::classify::{ClassificationResult, Classifier};
use crate::current::{CurrentConditions, ParsedCurrentConditions};
use crate::forecast::ParsedForecast;
use crate::hazard::ParsedHazardAdvisory;
use crate::model::{FieldValue, WeatherObservation};
use crate::station::{Coordinates, StationLocator};

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StationBriefing {
    pub station: String,
    pub coordinates: Option<Coordinates>,
    pub generated_at: DateTime<Utc>,
    pub observed_at: Option<DateTime<Utc>>,
    pub current: ParsedCurrentConditions,
    pub forecast: Option<ParsedForecast>,
    pub classification: ClassificationResult,
    pub alert: Option<StationAlert>,
    pub summary_text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RouteBriefing {
    pub departure: StationBriefing,
    pub arrival: StationBriefing,
}

/// Builds briefings with a fixed classifier and station lookup.
pub struct Briefer<'a> {
    classifier: Classifier,
    locator: &'a dyn StationLocator,
}

impl<'a> Briefer<'a> {
    pub fn new(classifier: Classifier, locator: &'a dyn StationLocator) -> Self {
        Self {
            classifier,
            locator,
        }
    }

    pub fn brief_station(
        &self,
        station: &str,
        current: ParsedCurrentConditions,
        forecast: Option<ParsedForecast>,
        advisories: &[ParsedHazardAdvisory],
        generated_at: DateTime<Utc>,
    ) -> StationBriefing {
        let station = station.to_uppercase();
        let decoded = current.report();
        let classification = self.classifier.classify(
            decoded,
            forecast.as_ref().and_then(|f| f.report()),
        );
        let alert = decoded.map(|c| station_alert(c, advisories, self.locator));
        let observed_at = decoded
            .and_then(|c| c.observation_time.present())
            .and_then(|t| t.resolve(generated_at));

        let summary_text = match (decoded, &alert) {
            (Some(c), Some(alert)) => summary_text(c, alert),
            _ => format!(
                "Weather Report for {station}: current conditions unavailable ({})",
                current.failure().map_or("no report", |f| f.error.as_str())
            ),
        };

        StationBriefing {
            coordinates: self.locator.locate(&station),
            station,
            generated_at,
            observed_at,
            current,
            forecast,
            classification,
            alert,
            summary_text,
        }
    }

    pub fn brief_route(&self, departure: StationBriefing, arrival: StationBriefing) -> RouteBriefing {
        RouteBriefing { departure, arrival }
    }
}

fn describe<T>(field: &FieldValue<T>, description: impl Fn(&T) -> &str) -> String {
    match field {
        FieldValue::Present(value) => description(value).to_string(),
        FieldValue::Malformed { raw, .. } => format!("Unreadable ({raw})"),
        FieldValue::Absent => "Unknown".to_string(),
    }
}

/// Multi-line, human-readable summary of current conditions and alert level.
pub fn summary_text(current: &CurrentConditions, alert: &StationAlert) -> String {
    let time = current
        .observation_time
        .present()
        .map_or_else(|| "Unknown time".to_string(), ToString::to_string);

    let mut lines = vec![
        format!("Weather Report for {} at {time}", current.station),
        format!(
            "Temperature: {}",
            describe(&current.temperature, |t| t.description.as_str())
        ),
        format!("Wind: {}", describe(&current.wind, |w| w.description.as_str())),
        format!(
            "Visibility: {}",
            describe(&current.visibility, |v| v.description.as_str())
        ),
    ];
    if !current.weather.is_empty() {
        lines.push(format!("Weather: {}", format_weather_phenomena(&current.weather)));
    }
    if !alert.hazards.is_empty() {
        lines.push(String::new());
        lines.push(format!("HAZARDS: {}", alert.hazards.join("; ")));
    }

    lines.push(String::new());
    lines.push(
        match alert.overall {
            AlertLevel::Red => "SEVERE CONDITIONS - EXERCISE EXTREME CAUTION",
            AlertLevel::Yellow => "SIGNIFICANT CONDITIONS - USE CAUTION",
            AlertLevel::Green => "CONDITIONS APPEAR FAVORABLE",
        }
        .to_string(),
    );
    lines.join("\n")
}

/// Comma-joined weather descriptions, or "Clear conditions" when there are none.
pub fn format_weather_phenomena(weather: &[WeatherObservation]) -> String {
    let descriptions: Vec<&str> = weather
        .iter()
        .map(|wx| {
            if wx.description.trim().is_empty() {
                wx.raw.trim()
            } else {
                wx.description.trim()
            }
        })
        .filter(|d| !d.is_empty())
        .collect();

    if descriptions.is_empty() {
        "Clear conditions".to_string()
    } else {
        descriptions.join(", ")
    }
}
