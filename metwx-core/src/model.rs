use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize, Serializer, ser::SerializeStruct};
use std::fmt;

use crate::error::DecodeError;

/// Report dialects understood by the decoders.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportFormat {
    Current,
    Forecast,
    HazardFeed,
    PilotReports,
}

impl ReportFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            ReportFormat::Current => "current-conditions",
            ReportFormat::Forecast => "forecast",
            ReportFormat::HazardFeed => "hazard-advisory",
            ReportFormat::PilotReports => "pilot-report",
        }
    }

    pub const fn all() -> &'static [ReportFormat] {
        &[
            ReportFormat::Current,
            ReportFormat::Forecast,
            ReportFormat::HazardFeed,
            ReportFormat::PilotReports,
        ]
    }
}

impl fmt::Display for ReportFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Raw report text together with the dialect it is written in.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RawReport {
    text: String,
    format: ReportFormat,
}

impl RawReport {
    pub fn new(format: ReportFormat, text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            format,
        }
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn format(&self) -> ReportFormat {
        self.format
    }
}

/// A single decoded field.
///
/// `Absent` means the field was not present (or not attempted), `Malformed`
/// means a token had the field's shape but did not decode.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue<T> {
    Absent,
    Malformed {
        raw: String,
        reason: String,
    },
    Present(T),
}

impl<T> FieldValue<T> {
    pub fn malformed(raw: impl Into<String>, reason: impl Into<String>) -> Self {
        FieldValue::Malformed {
            raw: raw.into(),
            reason: reason.into(),
        }
    }

    pub fn present(&self) -> Option<&T> {
        match self {
            FieldValue::Present(value) => Some(value),
            _ => None,
        }
    }

    pub fn is_absent(&self) -> bool {
        matches!(self, FieldValue::Absent)
    }

    pub fn is_malformed(&self) -> bool {
        matches!(self, FieldValue::Malformed { .. })
    }
}

impl<T> Default for FieldValue<T> {
    fn default() -> Self {
        FieldValue::Absent
    }
}

impl<T: Serialize> Serialize for FieldValue<T> {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        match self {
            FieldValue::Absent => serializer.serialize_none(),
            FieldValue::Present(value) => value.serialize(serializer),
            FieldValue::Malformed { raw, reason } => {
                let mut state = serializer.serialize_struct("Malformed", 2)?;
                state.serialize_field("raw", raw)?;
                state.serialize_field("error", reason)?;
                state.end()
            }
        }
    }
}

/// Whole-result failure. Serialized in place of the decoded record.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DecodeFailure {
    pub error: String,
    pub raw_text: String,
}

/// Outcome of decoding one report: either the record or a single error value.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum Decoded<T> {
    Report(T),
    Failed(DecodeFailure),
}

impl<T> Decoded<T> {
    pub fn failed(error: &DecodeError, raw_text: &str) -> Self {
        Decoded::Failed(DecodeFailure {
            error: error.to_string(),
            raw_text: raw_text.to_string(),
        })
    }

    pub fn report(&self) -> Option<&T> {
        match self {
            Decoded::Report(report) => Some(report),
            Decoded::Failed(_) => None,
        }
    }

    pub fn failure(&self) -> Option<&DecodeFailure> {
        match self {
            Decoded::Report(_) => None,
            Decoded::Failed(failure) => Some(failure),
        }
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, Decoded::Failed(_))
    }
}

/// Day-of-month plus UTC time of day, as carried by `DDHHMMZ` groups.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimeStamp {
    pub day: u8,
    pub hour: u8,
    pub minute: u8,
}

impl TimeStamp {
    /// Anchor the day-of-month to the latest calendar date not after `reference`.
    pub fn resolve(&self, reference: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut year = reference.year();
        let mut month = reference.month();

        for _ in 0..12 {
            let candidate = NaiveDate::from_ymd_opt(year, month, u32::from(self.day))
                .and_then(|date| date.and_hms_opt(self.hour.into(), self.minute.into(), 0))
                .map(|naive| naive.and_utc());

            if let Some(candidate) = candidate.filter(|c| *c <= reference) {
                return Some(candidate);
            }

            if month == 1 {
                month = 12;
                year -= 1;
            } else {
                month -= 1;
            }
        }

        None
    }
}

impl fmt::Display for TimeStamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}, {:02}:{:02} UTC", self.day, self.hour, self.minute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum WindUnit {
    Knots,
    MetersPerSecond,
}

impl WindUnit {
    pub fn as_str(&self) -> &'static str {
        match self {
            WindUnit::Knots => "knots",
            WindUnit::MetersPerSecond => "meters per second",
        }
    }

    fn to_knots(self, value: f64) -> f64 {
        match self {
            WindUnit::Knots => value,
            WindUnit::MetersPerSecond => value * 1.943_844,
        }
    }
}

/// Variable wind direction sector, e.g. `200V250`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DirectionRange {
    pub from: u16,
    pub to: u16,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Wind {
    pub direction_degrees: Option<u16>,
    pub direction_variable: bool,
    pub speed: u16,
    pub gust: Option<u16>,
    pub unit: WindUnit,
    pub variable_range: Option<DirectionRange>,
    pub description: String,
}

impl Wind {
    pub fn speed_knots(&self) -> f64 {
        self.unit.to_knots(f64::from(self.speed))
    }

    pub fn gust_knots(&self) -> Option<f64> {
        self.gust.map(|g| self.unit.to_knots(f64::from(g)))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityUnit {
    StatuteMiles,
    Meters,
}

const METERS_PER_STATUTE_MILE: f64 = 1609.344;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Visibility {
    pub distance: f64,
    pub unit: VisibilityUnit,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub greater_than: bool,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub less_than: bool,
    pub description: String,
}

impl Visibility {
    pub fn statute_miles(&self) -> f64 {
        match self.unit {
            VisibilityUnit::StatuteMiles => self.distance,
            VisibilityUnit::Meters => self.distance / METERS_PER_STATUTE_MILE,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intensity {
    Light,
    Moderate,
    Heavy,
}

impl Intensity {
    pub fn title(&self) -> &'static str {
        match self {
            Intensity::Light => "Light",
            Intensity::Moderate => "Moderate",
            Intensity::Heavy => "Heavy",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Phenomenon {
    pub code: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WeatherObservation {
    pub raw: String,
    pub intensity: Intensity,
    pub vicinity: bool,
    pub phenomena: Vec<Phenomenon>,
    pub description: String,
}

impl WeatherObservation {
    pub fn has_code(&self, code: &str) -> bool {
        self.phenomena.iter().any(|p| p.code == code)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CloudCover {
    Clear,
    Few,
    Scattered,
    Broken,
    Overcast,
    VerticalVisibility,
}

impl CloudCover {
    pub fn label(&self) -> &'static str {
        match self {
            CloudCover::Clear => "Clear",
            CloudCover::Few => "Few",
            CloudCover::Scattered => "Scattered",
            CloudCover::Broken => "Broken",
            CloudCover::Overcast => "Overcast",
            CloudCover::VerticalVisibility => "Vertical Visibility",
        }
    }

    /// Broken and overcast layers form a ceiling.
    pub fn is_ceiling(&self) -> bool {
        matches!(self, CloudCover::Broken | CloudCover::Overcast)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CloudLayer {
    #[serde(rename = "type")]
    pub cover: CloudCover,
    pub code: &'static str,
    pub height_feet: Option<u32>,
    pub convective: Option<&'static str>,
    pub description: String,
}

impl CloudLayer {
    /// Height of this layer when it counts as a ceiling.
    pub fn ceiling_feet(&self) -> Option<u32> {
        self.height_feet.filter(|_| self.cover.is_ceiling())
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Temperature {
    pub temperature_celsius: i32,
    pub dewpoint_celsius: i32,
    pub temperature_fahrenheit: i32,
    pub dewpoint_fahrenheit: i32,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Pressure {
    pub inches_hg: f64,
    pub hectopascals: f64,
    pub description: String,
}
