//! Core library for the `metwx` CLI.
//!
//! This crate defines:
//! - Field decoders and parsers for the four report dialects (current
//!   conditions, forecasts, area hazard advisories, pilot reports)
//! - Severity scoring, the station alert heuristic and briefings
//! - Station lookup and bounding-box collaborators
//! - Configuration and an abstraction over raw report sources
//!
//! Decoding is synchronous and does no I/O; only [`source`] touches the network.

pub mod alert;
pub mod briefing;
pub mod classify;
pub mod config;
pub mod current;
pub mod error;
pub mod fields;
pub mod forecast;
pub mod hazard;
pub mod model;
pub mod pilot;
pub mod source;
pub mod station;

mod tokens;

use serde::Serialize;

pub use alert::{AlertLevel, StationAlert, station_alert};
pub use briefing::{Briefer, RouteBriefing, StationBriefing};
pub use classify::{Category, ClassificationResult, Classifier, ClassifierThresholds, classify};
pub use config::{Config, SourceConfig};
pub use current::{CurrentConditions, ParsedCurrentConditions, decode_current};
pub use error::DecodeError;
pub use forecast::{Forecast, ParsedForecast, decode_forecast};
pub use hazard::{
    HazardAdvisory, HazardAnalysis, ParsedHazardAdvisory, analyze_hazards,
    decode_hazard_advisory, decode_hazard_feed,
};
pub use model::{Decoded, DecodeFailure, FieldValue, RawReport, ReportFormat};
pub use pilot::{
    ParsedPilotReport, PilotReport, PilotReportDigest, categorize_pilot_reports,
    decode_pilot_report, decode_pilot_reports,
};
pub use source::{ReportRequest, ReportSource};
pub use station::{BoundingBox, Coordinates, StationLocator, StationTable};

/// Result of decoding a [`RawReport`] with the decoder for its format.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum DecodedReport {
    Current(ParsedCurrentConditions),
    Forecast(ParsedForecast),
    HazardFeed(Vec<ParsedHazardAdvisory>),
    PilotReports(Vec<ParsedPilotReport>),
}

impl DecodedReport {
    pub fn format(&self) -> ReportFormat {
        match self {
            DecodedReport::Current(_) => ReportFormat::Current,
            DecodedReport::Forecast(_) => ReportFormat::Forecast,
            DecodedReport::HazardFeed(_) => ReportFormat::HazardFeed,
            DecodedReport::PilotReports(_) => ReportFormat::PilotReports,
        }
    }

    /// Number of entries that failed to decode.
    pub fn failures(&self) -> usize {
        match self {
            DecodedReport::Current(r) => usize::from(r.is_failed()),
            DecodedReport::Forecast(r) => usize::from(r.is_failed()),
            DecodedReport::HazardFeed(rs) => rs.iter().filter(|r| r.is_failed()).count(),
            DecodedReport::PilotReports(rs) => rs.iter().filter(|r| r.is_failed()).count(),
        }
    }
}

/// Decode a raw report with the decoder for its format tag.
pub fn decode(report: &RawReport) -> DecodedReport {
    let text = report.text();
    match report.format() {
        ReportFormat::Current => DecodedReport::Current(decode_current(text)),
        ReportFormat::Forecast => DecodedReport::Forecast(decode_forecast(text)),
        ReportFormat::HazardFeed => DecodedReport::HazardFeed(decode_hazard_feed(text)),
        ReportFormat::PilotReports => DecodedReport::PilotReports(decode_pilot_reports(text)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_on_format() {
        for format in ReportFormat::all() {
            let decoded = decode(&RawReport::new(*format, ""));
            assert_eq!(decoded.format(), *format);
            assert_eq!(decoded.failures(), 1, "{format}");
        }
    }

    #[test]
    fn current_conditions_dispatch() {
        let raw = RawReport::new(ReportFormat::Current, "KJFK 261951Z 26008KT 10SM CLR");
        let DecodedReport::Current(parsed) = decode(&raw) else {
            panic!("expected current conditions");
        };
        assert_eq!(parsed.report().map(|c| c.station.as_str()), Some("KJFK"));
    }
}
