//! Pilot report (PIREP) decoding.
//!
//! A report is a run of slash tags (`/OV`, `/TM`, `/FL`, ...) in any order.
//! Each tag's value runs to the next known tag; a repeated tag keeps its first
//! value.

use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{DecodeError, guard};
use crate::model::{Decoded, FieldValue, ReportFormat};

pub type ParsedPilotReport = Decoded<PilotReport>;

static TAG: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"/(OV|TM|FL|TY|TB|IC|SK|WX|TA|TP|WV|RM)").expect("valid tag pattern")
});
static REPORT_TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})$").expect("valid time pattern"));
static FLIGHT_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2,3})$").expect("valid flight level pattern"));
static TEMPERATURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([M-])?(\d{1,2})$").expect("valid temperature pattern"));
static WIND: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3})(\d{2,3})(?:KT)?$").expect("valid wind pattern"));
static ALTITUDES: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(\d+)(?:-(\d+))?").expect("valid altitude pattern"));

const CANDIDATE_MARKERS: &[&str] = &["UA", "UUA", "/OV", "/TM", "/FL", "/TY"];
const URGENT_KEYWORDS: &[&str] = &[
    "URGENT",
    "UUA",
    "SEVERE",
    "EXTREME",
    "MODERATE",
    "SEV TURB",
    "SEV ICE",
    "LLWS",
    "WINDSHEAR",
    "MICROBURST",
];

const TURBULENCE_SCALE: &[(&str, ReportedIntensity)] = &[
    ("NEG", ReportedIntensity::None),
    ("SMTH", ReportedIntensity::Smooth),
    ("LGT", ReportedIntensity::Light),
    ("MOD", ReportedIntensity::Moderate),
    ("SEV", ReportedIntensity::Severe),
    ("EXTRM", ReportedIntensity::Extreme),
];
const ICING_SCALE: &[(&str, ReportedIntensity)] = &[
    ("NEG", ReportedIntensity::None),
    ("TRC", ReportedIntensity::Trace),
    ("LGT", ReportedIntensity::Light),
    ("MOD", ReportedIntensity::Moderate),
    ("SEV", ReportedIntensity::Severe),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Tag {
    Location,
    Time,
    FlightLevel,
    AircraftType,
    Turbulence,
    Icing,
    Sky,
    Weather,
    Temperature,
    Wind,
    Remarks,
}

impl Tag {
    fn from_code(code: &str) -> Option<Self> {
        Some(match code {
            "OV" => Tag::Location,
            "TM" => Tag::Time,
            "FL" => Tag::FlightLevel,
            "TY" => Tag::AircraftType,
            "TB" => Tag::Turbulence,
            "IC" => Tag::Icing,
            "SK" => Tag::Sky,
            "WX" => Tag::Weather,
            "TA" | "TP" => Tag::Temperature,
            "WV" => Tag::Wind,
            "RM" => Tag::Remarks,
            _ => return None,
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Urgency {
    Routine,
    Urgent,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ReportedIntensity {
    None,
    Smooth,
    Trace,
    Light,
    Moderate,
    Severe,
    Extreme,
    Unknown,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct AltitudeRange {
    pub lower: u32,
    pub upper: Option<u32>,
}

/// Turbulence or icing as reported: severity keyword plus optional altitudes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConditionReport {
    pub severity: ReportedIntensity,
    pub altitude_range: Option<AltitudeRange>,
    pub raw_text: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ReportTime {
    pub hour: u8,
    pub minute: u8,
}

impl ReportTime {
    pub fn description(&self) -> String {
        format!("{:02}:{:02} UTC", self.hour, self.minute)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct FlightLevel {
    pub level: u16,
    pub feet: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ReportedWind {
    pub direction_degrees: u16,
    pub speed_kt: u16,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PilotReport {
    pub raw_text: String,
    pub station: Option<String>,
    pub report_type: Option<String>,
    pub urgency: Urgency,
    pub location: FieldValue<String>,
    pub time: FieldValue<ReportTime>,
    pub flight_level: FieldValue<FlightLevel>,
    pub aircraft_type: FieldValue<String>,
    pub turbulence: FieldValue<ConditionReport>,
    pub icing: FieldValue<ConditionReport>,
    pub sky_conditions: FieldValue<String>,
    pub weather: FieldValue<String>,
    pub temperature_celsius: FieldValue<i32>,
    pub wind: FieldValue<ReportedWind>,
    pub remarks: Option<String>,
}

impl PilotReport {
    pub fn is_urgent(&self) -> bool {
        self.urgency == Urgency::Urgent
    }
}

/// Decode every pilot report line in `text`. Lines without any report marker
/// are skipped.
pub fn decode_pilot_reports(text: &str) -> Vec<ParsedPilotReport> {
    if text.trim().is_empty() {
        return vec![decode_pilot_report(text)];
    }

    let reports: Vec<ParsedPilotReport> = text
        .lines()
        .map(str::trim)
        .filter(|line| is_candidate(line))
        .map(decode_pilot_report)
        .collect();

    if reports.is_empty() {
        return vec![guard(ReportFormat::PilotReports, text, || {
            Err(DecodeError::NoPilotReports)
        })];
    }
    reports
}

fn is_candidate(line: &str) -> bool {
    let upper = line.to_ascii_uppercase();
    CANDIDATE_MARKERS.iter().any(|m| upper.contains(m))
}

pub fn decode_pilot_report(text: &str) -> ParsedPilotReport {
    guard(ReportFormat::PilotReports, text, || parse(text))
}

fn parse(text: &str) -> Result<PilotReport, DecodeError> {
    if text.trim().is_empty() {
        return Err(DecodeError::empty(ReportFormat::PilotReports));
    }

    let upper = text.trim().to_ascii_uppercase();
    let (prefix, fields) = split_tags(&upper);
    let value = |tag: Tag| fields.iter().find(|(t, _)| *t == tag).map(|(_, v)| *v);

    let (station, report_type) = header(prefix);
    let urgency = if report_type.as_deref() == Some("UUA")
        || URGENT_KEYWORDS.iter().any(|k| upper.contains(k))
    {
        Urgency::Urgent
    } else {
        Urgency::Routine
    };

    Ok(PilotReport {
        raw_text: text.to_string(),
        station,
        report_type,
        urgency,
        location: field(value(Tag::Location), |v| Some(v.to_string())),
        time: field(value(Tag::Time), report_time),
        flight_level: field(value(Tag::FlightLevel), flight_level),
        aircraft_type: field(value(Tag::AircraftType), |v| {
            v.split_whitespace().next().map(str::to_string)
        }),
        turbulence: field(value(Tag::Turbulence), |v| {
            Some(condition_report(v, TURBULENCE_SCALE))
        }),
        icing: field(value(Tag::Icing), |v| Some(condition_report(v, ICING_SCALE))),
        sky_conditions: field(value(Tag::Sky), |v| Some(v.to_string())),
        weather: field(value(Tag::Weather), |v| Some(v.to_string())),
        temperature_celsius: field(value(Tag::Temperature), temperature),
        wind: field(value(Tag::Wind), wind),
        remarks: value(Tag::Remarks)
            .filter(|v| !v.is_empty())
            .map(str::to_string),
    })
}

/// Text before the first tag, and each known tag with its trimmed value.
fn split_tags(upper: &str) -> (&str, Vec<(Tag, &str)>) {
    let marks: Vec<(usize, usize, Tag)> = TAG
        .captures_iter(upper)
        .filter_map(|caps| {
            let whole = caps.get(0)?;
            // `/SKC` or `/OVC` inside a value is not a tag.
            let next = upper[whole.end()..].chars().next();
            if next.is_some_and(|c| c.is_ascii_alphabetic()) {
                return None;
            }
            Some((whole.start(), whole.end(), Tag::from_code(&caps[1])?))
        })
        .collect();

    let prefix = &upper[..marks.first().map_or(upper.len(), |(start, _, _)| *start)];
    let fields = marks
        .iter()
        .enumerate()
        .map(|(i, (_, end, tag))| {
            let stop = marks.get(i + 1).map_or(upper.len(), |(next, _, _)| *next);
            (*tag, upper[*end..stop].trim())
        })
        .collect();

    (prefix, fields)
}

/// Reporting station and `UA`/`UUA` type from the text before the first tag.
fn header(prefix: &str) -> (Option<String>, Option<String>) {
    let tokens: Vec<&str> = prefix.split_whitespace().collect();
    match tokens.iter().position(|t| *t == "UA" || *t == "UUA") {
        Some(at) => (
            at.checked_sub(1).map(|i| tokens[i].to_string()),
            Some(tokens[at].to_string()),
        ),
        None => (tokens.first().map(|t| t.to_string()), None),
    }
}

/// Absent when the tag is missing, malformed when its value does not decode.
fn field<T>(value: Option<&str>, decode: impl Fn(&str) -> Option<T>) -> FieldValue<T> {
    match value {
        None => FieldValue::Absent,
        Some("") => FieldValue::malformed("", "empty value"),
        Some(v) => match decode(v) {
            Some(decoded) => FieldValue::Present(decoded),
            None => FieldValue::malformed(v, "unrecognised value"),
        },
    }
}

fn report_time(value: &str) -> Option<ReportTime> {
    let caps = REPORT_TIME.captures(value)?;
    let hour: u8 = caps[1].parse().ok()?;
    let minute: u8 = caps[2].parse().ok()?;
    (hour <= 23 && minute <= 59).then_some(ReportTime { hour, minute })
}

fn flight_level(value: &str) -> Option<FlightLevel> {
    let level: u16 = FLIGHT_LEVEL.captures(value)?[1].parse().ok()?;
    Some(FlightLevel {
        level,
        feet: u32::from(level) * 100,
    })
}

fn temperature(value: &str) -> Option<i32> {
    let caps = TEMPERATURE.captures(value)?;
    let degrees: i32 = caps[2].parse().ok()?;
    Some(if caps.get(1).is_some() { -degrees } else { degrees })
}

fn wind(value: &str) -> Option<ReportedWind> {
    let caps = WIND.captures(value)?;
    let direction_degrees: u16 = caps[1].parse().ok()?;
    let speed_kt: u16 = caps[2].parse().ok()?;
    Some(ReportedWind {
        direction_degrees,
        speed_kt,
        description: format!("{direction_degrees:03}° at {speed_kt} knots"),
    })
}

fn condition_report(value: &str, scale: &[(&str, ReportedIntensity)]) -> ConditionReport {
    let severity = scale
        .iter()
        .find(|(code, _)| value.contains(code))
        .map_or(ReportedIntensity::Unknown, |(_, intensity)| *intensity);

    let altitude_range = ALTITUDES.captures(value).and_then(|caps| {
        Some(AltitudeRange {
            lower: caps[1].parse().ok()?,
            upper: caps.get(2).and_then(|u| u.as_str().parse().ok()),
        })
    });

    ConditionReport {
        severity,
        altitude_range,
        raw_text: value.to_string(),
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct PilotReportDigest {
    pub urgent_reports: Vec<PilotReport>,
    pub routine_reports: Vec<PilotReport>,
    pub total_count: usize,
    pub has_turbulence: bool,
    pub has_icing: bool,
    pub has_weather: bool,
    pub summary: Vec<String>,
}

/// Split decoded reports by urgency and flag reported conditions.
/// Failed decodes are not counted.
pub fn categorize_pilot_reports(reports: &[ParsedPilotReport]) -> PilotReportDigest {
    let mut digest = PilotReportDigest::default();

    for report in reports.iter().filter_map(Decoded::report) {
        digest.total_count += 1;
        digest.has_turbulence |= report.turbulence.present().is_some();
        digest.has_icing |= report.icing.present().is_some();
        digest.has_weather |=
            report.weather.present().is_some() || report.sky_conditions.present().is_some();

        if report.is_urgent() {
            digest.urgent_reports.push(report.clone());
        } else {
            digest.routine_reports.push(report.clone());
        }
    }

    if !digest.urgent_reports.is_empty() {
        digest.summary.push(format!(
            "{} urgent pilot report(s)",
            digest.urgent_reports.len()
        ));
    }
    if !digest.routine_reports.is_empty() {
        digest.summary.push(format!(
            "{} routine pilot report(s)",
            digest.routine_reports.len()
        ));
    }
    if digest.has_turbulence {
        digest.summary.push("Turbulence reported".to_string());
    }
    if digest.has_icing {
        digest.summary.push("Icing conditions reported".to_string());
    }

    digest
}
