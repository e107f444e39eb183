//! Fetching raw report text.
//!
//! The decoders never call into this module; callers fetch a [`RawReport`]
//! here and hand its text to [`crate::decode`].

use async_trait::async_trait;
use std::fmt::Debug;

use crate::{
    Config, RawReport, ReportFormat,
    source::aviationweather::AviationWeatherSource,
    station::BoundingBox,
};

pub mod aviationweather;

/// What to fetch: a report dialect and, where the endpoint filters by it, a station.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRequest {
    pub format: ReportFormat,
    pub station: Option<String>,
}

impl ReportRequest {
    pub fn new(format: ReportFormat, station: Option<&str>) -> Self {
        Self {
            format,
            station: station.map(str::to_uppercase),
        }
    }

    pub fn current(station: &str) -> Self {
        Self::new(ReportFormat::Current, Some(station))
    }

    pub fn forecast(station: &str) -> Self {
        Self::new(ReportFormat::Forecast, Some(station))
    }

    pub fn hazards() -> Self {
        Self::new(ReportFormat::HazardFeed, None)
    }

    pub fn pilot_reports(station: &str) -> Self {
        Self::new(ReportFormat::PilotReports, Some(station))
    }
}

#[async_trait]
pub trait ReportSource: Send + Sync + Debug {
    async fn fetch(&self, request: &ReportRequest) -> anyhow::Result<RawReport>;
}

/// Construct the report source described by the config.
pub fn source_from_config(config: &Config) -> anyhow::Result<Box<dyn ReportSource>> {
    let source = AviationWeatherSource::new(&config.source)?;
    Ok(Box::new(source))
}

/// Area to search for pilot reports around a station.
///
/// The radius is accepted but not applied yet: the search always covers the
/// whole globe and the upstream service filters by station.
pub fn pilot_report_search_area(station: &str, radius_nm: u32) -> BoundingBox {
    tracing::trace!(station, radius_nm, "pilot report search area");
    BoundingBox::WORLD
}
