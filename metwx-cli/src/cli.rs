use std::{
    fs,
    io::{self, IsTerminal, Read},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result, anyhow};
use chrono::{DateTime, Utc};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use inquire::{CustomType, Text};
use metwx_core::{
    Briefer, Classifier, Config, HazardAnalysis, ParsedForecast, ParsedHazardAdvisory, RawReport,
    ReportFormat, ReportRequest, ReportSource, StationBriefing, StationTable, analyze_hazards,
    categorize_pilot_reports, decode, decode_current, decode_forecast, decode_hazard_feed,
    decode_pilot_reports, source::source_from_config,
};
use serde::Serialize;
use tracing::{info, warn};

use crate::render;

/// Top-level CLI struct.
#[derive(Debug, Parser)]
#[command(
    name = "metwx",
    version,
    about = "Decode, score and brief aviation weather reports"
)]
pub struct Cli {
    /// Print JSON instead of text.
    #[arg(long, global = true)]
    pub json: bool,

    /// More log output on stderr (-v debug, -vv trace). RUST_LOG overrides.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum FormatArg {
    /// Current conditions (METAR/SPECI).
    Metar,
    /// Terminal forecast (TAF).
    Taf,
    /// Area hazard advisories (SIGMET/AIRMET), blank-line separated.
    Sigmet,
    /// Pilot reports, one per line.
    Pirep,
}

impl From<FormatArg> for ReportFormat {
    fn from(value: FormatArg) -> Self {
        match value {
            FormatArg::Metar => ReportFormat::Current,
            FormatArg::Taf => ReportFormat::Forecast,
            FormatArg::Sigmet => ReportFormat::HazardFeed,
            FormatArg::Pirep => ReportFormat::PilotReports,
        }
    }
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Set the default station and report source settings.
    ///
    /// Without flags, prompts for each value.
    Configure {
        #[arg(long)]
        station: Option<String>,

        #[arg(long)]
        base_url: Option<String>,

        /// HTTP timeout in seconds.
        #[arg(long)]
        timeout: Option<u64>,

        /// Pilot report search radius in nautical miles.
        #[arg(long)]
        radius: Option<u32>,
    },

    /// Decode a report given as arguments, read from stdin, or fetched.
    Decode {
        #[arg(value_enum)]
        format: FormatArg,

        /// Report text. Read from stdin when omitted.
        text: Vec<String>,

        /// Fetch the latest report instead of reading it.
        #[arg(long, conflicts_with = "text")]
        fetch: bool,

        /// Station to fetch for; defaults to the configured station.
        #[arg(long, requires = "fetch")]
        station: Option<String>,
    },

    /// Score current conditions (and the forecast trend) for a station.
    Classify {
        station: Option<String>,

        /// Use this current-conditions text instead of fetching.
        #[arg(long)]
        metar: Option<String>,

        /// Use this forecast text instead of fetching.
        #[arg(long)]
        taf: Option<String>,
    },

    /// Full briefing for one station.
    Brief { station: Option<String> },

    /// Briefings for a departure and an arrival station.
    Route { departure: String, arrival: String },

    /// Decode and summarise active hazard advisories.
    Hazards {
        /// Read advisories from a file instead of fetching.
        #[arg(long)]
        file: Option<PathBuf>,
    },

    /// Decode and categorise pilot reports near a station.
    Pireps {
        station: Option<String>,

        /// Read reports from a file instead of fetching.
        #[arg(long, conflicts_with = "station")]
        file: Option<PathBuf>,
    },
}

impl Cli {
    pub async fn run(self) -> Result<()> {
        let mut config = Config::load()?;
        let json = self.json;

        match self.command {
            Command::Configure {
                station,
                base_url,
                timeout,
                radius,
            } => configure(&mut config, station, base_url, timeout, radius),

            Command::Decode {
                format,
                text,
                fetch,
                station,
            } => {
                let format = ReportFormat::from(format);
                let raw = if fetch {
                    let request = match format {
                        ReportFormat::HazardFeed => ReportRequest::hazards(),
                        _ => ReportRequest::new(
                            format,
                            Some(resolve_station(&config, station)?.as_str()),
                        ),
                    };
                    source_from_config(&config)?.fetch(&request).await?
                } else {
                    RawReport::new(format, read_text(text)?)
                };

                let decoded = decode(&raw);
                if decoded.failures() > 0 {
                    warn!(failures = decoded.failures(), "some reports did not decode");
                }
                emit(json, &decoded, render::decoded)
            }

            Command::Classify {
                station,
                metar,
                taf,
            } => {
                let (current, forecast) = match metar {
                    Some(metar) => (decode_current(&metar), taf.as_deref().map(decode_forecast)),
                    None => {
                        let station = resolve_station(&config, station)?;
                        let source = source_from_config(&config)?;
                        let current = fetch_text(source.as_ref(), ReportRequest::current(&station))
                            .await?;
                        let forecast = match taf {
                            Some(taf) => Some(decode_forecast(&taf)),
                            None => optional_forecast(source.as_ref(), &station).await,
                        };
                        (decode_current(&current), forecast)
                    }
                };

                let classifier = Classifier::new(config.thresholds.clone());
                let result = classifier.classify(
                    current.report(),
                    forecast.as_ref().and_then(|f| f.report()),
                );
                emit(json, &result, render::classification)
            }

            Command::Brief { station } => {
                let station = resolve_station(&config, station)?;
                let source = source_from_config(&config)?;
                let table = StationTable::builtin();
                let briefer = Briefer::new(Classifier::new(config.thresholds.clone()), &table);
                let advisories = active_advisories(source.as_ref()).await;

                let briefing =
                    station_briefing(source.as_ref(), &briefer, &station, &advisories, Utc::now())
                        .await?;
                emit(json, &briefing, render::briefing)
            }

            Command::Route { departure, arrival } => {
                let source = source_from_config(&config)?;
                let table = StationTable::builtin();
                let briefer = Briefer::new(Classifier::new(config.thresholds.clone()), &table);
                let advisories = active_advisories(source.as_ref()).await;
                let now = Utc::now();

                let (departure, arrival) = tokio::try_join!(
                    station_briefing(source.as_ref(), &briefer, &departure, &advisories, now),
                    station_briefing(source.as_ref(), &briefer, &arrival, &advisories, now),
                )?;
                let route = briefer.brief_route(departure, arrival);
                emit(json, &route, render::route)
            }

            Command::Hazards { file } => {
                let text = match file {
                    Some(path) => read_file(&path)?,
                    None => {
                        let source = source_from_config(&config)?;
                        fetch_text(source.as_ref(), ReportRequest::hazards()).await?
                    }
                };

                let advisories = if text.trim().is_empty() {
                    Vec::new()
                } else {
                    decode_hazard_feed(&text)
                };
                let analysis = analyze_hazards(&advisories);

                let report = HazardReport {
                    advisories: &advisories,
                    analysis: &analysis,
                };
                emit(json, &report, |r| render::hazards(r.advisories, r.analysis))
            }

            Command::Pireps { station, file } => {
                let text = match file {
                    Some(path) => read_file(&path)?,
                    None => {
                        let station = resolve_station(&config, station)?;
                        let source = source_from_config(&config)?;
                        fetch_text(source.as_ref(), ReportRequest::pilot_reports(&station)).await?
                    }
                };

                let reports = decode_pilot_reports(&text);
                let digest = categorize_pilot_reports(&reports);
                emit(json, &digest, render::digest)
            }
        }
    }
}

#[derive(Serialize)]
struct HazardReport<'a> {
    advisories: &'a [ParsedHazardAdvisory],
    analysis: &'a HazardAnalysis,
}

fn emit<T: Serialize>(json: bool, value: &T, text: impl FnOnce(&T)) -> Result<()> {
    if json {
        print_json(value)
    } else {
        text(value);
        Ok(())
    }
}

fn print_json<T: Serialize + ?Sized>(value: &T) -> Result<()> {
    let out = serde_json::to_string_pretty(value).context("Failed to serialize output")?;
    println!("{out}");
    Ok(())
}

fn resolve_station(config: &Config, station: Option<String>) -> Result<String> {
    match station {
        Some(station) => Ok(station.trim().to_uppercase()),
        None => Ok(config.default_station()?.to_string()),
    }
}

fn read_text(args: Vec<String>) -> Result<String> {
    if !args.is_empty() {
        return Ok(args.join(" "));
    }

    let mut stdin = io::stdin();
    if stdin.is_terminal() {
        return Err(anyhow!(
            "No report text given.\n\
             Hint: pass the report as arguments, pipe it on stdin, or use --fetch."
        ));
    }

    let mut text = String::new();
    stdin
        .read_to_string(&mut text)
        .context("Failed to read report text from stdin")?;
    Ok(text)
}

fn read_file(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("Failed to read {}", path.display()))
}

async fn fetch_text(source: &dyn ReportSource, request: ReportRequest) -> Result<String> {
    let raw = source.fetch(&request).await?;
    Ok(raw.text().to_string())
}

async fn optional_forecast(
    source: &dyn ReportSource,
    station: &str,
) -> Option<ParsedForecast> {
    match source.fetch(&ReportRequest::forecast(station)).await {
        Ok(raw) => Some(decode_forecast(raw.text())),
        Err(err) => {
            warn!(station, error = %err, "no forecast available");
            None
        }
    }
}

/// Active advisories; a failed fetch or an empty feed yields none.
async fn active_advisories(source: &dyn ReportSource) -> Vec<ParsedHazardAdvisory> {
    match source.fetch(&ReportRequest::hazards()).await {
        Ok(raw) if raw.text().trim().is_empty() => Vec::new(),
        Ok(raw) => decode_hazard_feed(raw.text()),
        Err(err) => {
            warn!(error = %err, "hazard advisories unavailable");
            Vec::new()
        }
    }
}

async fn station_briefing(
    source: &dyn ReportSource,
    briefer: &Briefer<'_>,
    station: &str,
    advisories: &[ParsedHazardAdvisory],
    now: DateTime<Utc>,
) -> Result<StationBriefing> {
    let station = station.trim().to_uppercase();
    let current = fetch_text(source, ReportRequest::current(&station))
        .await
        .with_context(|| format!("No current conditions for {station}"))?;
    let forecast = optional_forecast(source, &station).await;

    info!(%station, "briefing");
    Ok(briefer.brief_station(
        &station,
        decode_current(&current),
        forecast,
        advisories,
        now,
    ))
}

fn configure(
    config: &mut Config,
    station: Option<String>,
    base_url: Option<String>,
    timeout: Option<u64>,
    radius: Option<u32>,
) -> Result<()> {
    let interactive =
        station.is_none() && base_url.is_none() && timeout.is_none() && radius.is_none();

    if interactive {
        let current = config.default_station.clone().unwrap_or_default();
        let station = Text::new("Default station (ICAO):")
            .with_default(&current)
            .prompt()?;
        if !station.trim().is_empty() {
            config.set_default_station(&station);
        }

        config.source.base_url = Text::new("Report source URL:")
            .with_default(&config.source.base_url)
            .prompt()?;
        config.source.timeout_secs = CustomType::<u64>::new("HTTP timeout (seconds):")
            .with_default(config.source.timeout_secs)
            .with_error_message("Please enter a whole number of seconds")
            .prompt()?;
        config.source.pilot_report_radius_nm =
            CustomType::<u32>::new("Pilot report radius (nautical miles):")
                .with_default(config.source.pilot_report_radius_nm)
                .with_error_message("Please enter a whole number")
                .prompt()?;
    } else {
        if let Some(station) = station {
            config.set_default_station(&station);
        }
        if let Some(base_url) = base_url {
            config.source.base_url = base_url;
        }
        if let Some(timeout) = timeout {
            config.source.timeout_secs = timeout;
        }
        if let Some(radius) = radius {
            config.source.pilot_report_radius_nm = radius;
        }
    }

    let path = config.save()?;
    println!("Configuration saved to {}", path.display());
    Ok(())
}
