use anyhow::{Context, Result, anyhow};
use async_trait::async_trait;
use reqwest::Client;
use std::time::Duration;
use tracing::debug;

use crate::{
    config::SourceConfig,
    model::{RawReport, ReportFormat},
    source::{ReportRequest, ReportSource, pilot_report_search_area},
};

/// Raw-text client for the aviationweather.gov data API.
#[derive(Debug, Clone)]
pub struct AviationWeatherSource {
    base_url: String,
    pilot_report_radius_nm: u32,
    http: Client,
}

impl AviationWeatherSource {
    pub fn new(config: &SourceConfig) -> Result<Self> {
        let http = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .context("Failed to build HTTP client")?;

        Ok(Self {
            base_url: config.base_url.trim_end_matches('/').to_string(),
            pilot_report_radius_nm: config.pilot_report_radius_nm,
            http,
        })
    }

    /// Endpoint URL and query parameters for a request.
    fn endpoint(&self, request: &ReportRequest) -> Result<(String, Vec<(&'static str, String)>)> {
        let path = match request.format {
            ReportFormat::Current => "metar",
            ReportFormat::Forecast => "taf",
            ReportFormat::HazardFeed => "isigmet",
            ReportFormat::PilotReports => "pirep",
        };
        let mut query = vec![("format", "raw".to_string())];

        match (request.format, request.station.as_deref()) {
            (ReportFormat::HazardFeed, _) => {}
            (ReportFormat::Current, Some(station)) => {
                query.push(("ids", station.to_string()));
                query.push(("hours", "3".to_string()));
            }
            (ReportFormat::Forecast, Some(station)) => {
                query.push(("ids", station.to_string()));
            }
            (ReportFormat::PilotReports, Some(station)) => {
                let area = pilot_report_search_area(station, self.pilot_report_radius_nm);
                query.push(("id", station.to_string()));
                query.push((
                    "bbox",
                    format!(
                        "{},{},{},{}",
                        area.lat_min, area.lon_min, area.lat_max, area.lon_max
                    ),
                ));
            }
            (format, None) => {
                return Err(anyhow!("A station is required to fetch {format} reports"));
            }
        }

        Ok((format!("{}/{path}", self.base_url), query))
    }
}

#[async_trait]
impl ReportSource for AviationWeatherSource {
    async fn fetch(&self, request: &ReportRequest) -> Result<RawReport> {
        let (url, query) = self.endpoint(request)?;
        debug!(%url, report = %request.format, "fetching");

        let res = self
            .http
            .get(&url)
            .query(&query)
            .send()
            .await
            .with_context(|| format!("Failed to send request to {url}"))?;

        let status = res.status();
        let body = res
            .text()
            .await
            .with_context(|| format!("Failed to read response body from {url}"))?;

        if !status.is_success() {
            return Err(anyhow!(
                "Request to {url} failed with status {}: {}",
                status,
                truncate_body(&body),
            ));
        }

        let text = body.trim();
        let station_required = matches!(
            request.format,
            ReportFormat::Current | ReportFormat::Forecast
        );
        if station_required && (text.is_empty() || text.starts_with("No ")) {
            return Err(anyhow!(
                "No {} data available for station {}",
                request.format,
                request.station.as_deref().unwrap_or("?")
            ));
        }

        Ok(RawReport::new(request.format, text))
    }
}

fn truncate_body(body: &str) -> String {
    const MAX: usize = 200;
    match body.char_indices().nth(MAX) {
        Some((cut, _)) => format!("{}...", &body[..cut]),
        None => body.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source() -> AviationWeatherSource {
        AviationWeatherSource::new(&SourceConfig {
            base_url: "https://example.test/api/data/".to_string(),
            ..SourceConfig::default()
        })
        .expect("client builds")
    }

    #[test]
    fn current_conditions_endpoint() {
        let (url, query) = source()
            .endpoint(&ReportRequest::current("kjfk"))
            .expect("endpoint");

        assert_eq!(url, "https://example.test/api/data/metar");
        assert!(query.contains(&("ids", "KJFK".to_string())));
        assert!(query.contains(&("format", "raw".to_string())));
    }

    #[test]
    fn hazard_feed_needs_no_station() {
        let (url, query) = source().endpoint(&ReportRequest::hazards()).expect("endpoint");

        assert!(url.ends_with("/isigmet"));
        assert_eq!(query, [("format", "raw".to_string())]);
    }

    #[test]
    fn pilot_reports_search_the_whole_globe() {
        let (url, query) = source()
            .endpoint(&ReportRequest::pilot_reports("KDEN"))
            .expect("endpoint");

        assert!(url.ends_with("/pirep"));
        assert!(query.contains(&("bbox", "-90,-180,90,180".to_string())));
    }

    #[test]
    fn station_required_for_forecasts() {
        let request = ReportRequest::new(ReportFormat::Forecast, None);
        let err = source().endpoint(&request).unwrap_err();
        assert!(err.to_string().contains("A station is required"));
    }

    #[test]
    fn truncates_long_bodies() {
        let body = "x".repeat(250);
        let out = truncate_body(&body);
        assert_eq!(out.len(), 203);
        assert!(out.ends_with("..."));
        assert_eq!(truncate_body("short"), "short");
    }
}
