//! Area-hazard advisory (SIGMET) decoding.
//!
//! Advisories are free text, so each field is found by searching the whole
//! uppercased text. Keyword fields use ordered ladders: the first rung with a
//! matching keyword wins.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;
use tracing::debug;

use crate::error::{DecodeError, guard};
use crate::model::{Decoded, ReportFormat};
use crate::station::{BoundingBox, Coordinates};

pub type ParsedHazardAdvisory = Decoded<HazardAdvisory>;

const COORD: &str = r"(?:\d{4}[NS]\s*\d{5}[EW]|[NS]\d{4}\s*[EW]\d{5})";

static COORD_RUN: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(r"{COORD}(?:\s*-\s*{COORD})*")).expect("valid coordinate run pattern")
});
static COORD_PAIR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(\d{2})(\d{2})([NS])\s*(\d{3})(\d{2})([EW])|([NS])(\d{2})(\d{2})\s*([EW])(\d{3})(\d{2})",
    )
    .expect("valid coordinate pattern")
});
static REGION_PAIR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2,4}-[A-Z]{2,4}\b").expect("valid region pair pattern"));
static REGION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b[A-Z]{2}\b").expect("valid region pattern"));
static FLIGHT_LEVEL: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"FL(\d{3})(?:/(\d{3}))?").expect("valid flight level pattern"));
static FEET_RANGE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(\d{1,2}),?(\d{3})\s*-\s*(\d{1,2}),?(\d{3})\s*FT").expect("valid feet range")
});
static VALIDITY: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b(?:\d{2})?(\d{4})/(?:\d{2})?(\d{4})\b").expect("valid validity pattern")
});
static MOVING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"MOV\s+([NSEW]+)\s+(\d+)\s*KT").expect("valid movement pattern")
});
static MOVING_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"MOV\s+FROM\s+(\d{3})(\d{2,3})KT").expect("valid movement-from pattern")
});

/// Two-letter words that are abbreviations or plain English, not regions.
const NOT_REGIONS: &[&str] = &[
    "TS", "VA", "TC", "GR", "NC", "DS", "SS", "FT", "FL", "KT", "CB", "IN", "OF", "TO", "BY", "AT",
    "OR",
];

/// One ladder keyword with its anchoring.
#[derive(Debug, Clone, Copy)]
enum Keyword {
    /// Whole word: neighbours must not be letters or digits.
    Word(&'static str),
    /// Plain substring.
    Phrase(&'static str),
}

impl Keyword {
    fn found_in(self, upper: &str) -> bool {
        match self {
            Keyword::Phrase(p) => upper.contains(p),
            Keyword::Word(w) => upper.match_indices(w).any(|(at, _)| {
                let before = upper[..at].chars().next_back();
                let after = upper[at + w.len()..].chars().next();
                !before.is_some_and(|c| c.is_ascii_alphanumeric())
                    && !after.is_some_and(|c| c.is_ascii_alphanumeric())
            }),
        }
    }
}

type Ladder<T> = &'static [(T, &'static [Keyword])];

fn first_rung<T: Copy>(ladder: Ladder<T>, upper: &str) -> Option<T> {
    ladder
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| k.found_in(upper)))
        .map(|(value, _)| *value)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub enum HazardType {
    Turbulence,
    Icing,
    Thunderstorms,
    #[serde(rename = "Dust/Sand")]
    DustSand,
    #[serde(rename = "Volcanic Ash")]
    VolcanicAsh,
    #[serde(rename = "Tropical Cyclone")]
    TropicalCyclone,
    #[serde(rename = "Squall Line")]
    SquallLine,
    Hail,
    #[serde(rename = "Mountain Wave")]
    MountainWave,
    #[serde(rename = "Unknown Hazard")]
    Unknown,
}

impl HazardType {
    pub fn label(&self) -> &'static str {
        match self {
            HazardType::Turbulence => "Turbulence",
            HazardType::Icing => "Icing",
            HazardType::Thunderstorms => "Thunderstorms",
            HazardType::DustSand => "Dust/Sand",
            HazardType::VolcanicAsh => "Volcanic Ash",
            HazardType::TropicalCyclone => "Tropical Cyclone",
            HazardType::SquallLine => "Squall Line",
            HazardType::Hail => "Hail",
            HazardType::MountainWave => "Mountain Wave",
            HazardType::Unknown => "Unknown Hazard",
        }
    }
}

static HAZARD_LADDER: Ladder<HazardType> = &[
    (HazardType::Turbulence, &[Keyword::Phrase("TURB")]),
    (
        HazardType::Icing,
        &[Keyword::Word("ICE"), Keyword::Word("ICG"), Keyword::Phrase("ICING")],
    ),
    (
        HazardType::Thunderstorms,
        &[
            Keyword::Word("TS"),
            Keyword::Word("TSGR"),
            Keyword::Phrase("THUNDERSTORM"),
            Keyword::Phrase("CONVECTIVE"),
        ],
    ),
    (
        HazardType::DustSand,
        &[
            Keyword::Phrase("DUST"),
            Keyword::Phrase("SAND"),
            Keyword::Word("DS"),
            Keyword::Word("SS"),
        ],
    ),
    (
        HazardType::VolcanicAsh,
        &[Keyword::Word("VA"), Keyword::Phrase("VOLCANIC")],
    ),
    (
        HazardType::TropicalCyclone,
        &[Keyword::Word("TC"), Keyword::Phrase("TROPICAL")],
    ),
    (
        HazardType::SquallLine,
        &[Keyword::Word("SQL"), Keyword::Phrase("SQUALL")],
    ),
    (HazardType::Hail, &[Keyword::Word("GR"), Keyword::Phrase("HAIL")]),
    (
        HazardType::MountainWave,
        &[Keyword::Word("MTW"), Keyword::Phrase("MOUNTAIN WAVE")],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum HazardSeverity {
    Severe,
    Moderate,
    Light,
    Extreme,
    #[serde(rename = "Not Specified")]
    NotSpecified,
}

/// Extreme is deliberately checked last.
static SEVERITY_LADDER: Ladder<HazardSeverity> = &[
    (
        HazardSeverity::Severe,
        &[Keyword::Word("SEV"), Keyword::Phrase("SEVERE")],
    ),
    (
        HazardSeverity::Moderate,
        &[Keyword::Word("MOD"), Keyword::Phrase("MODERATE")],
    ),
    (
        HazardSeverity::Light,
        &[Keyword::Phrase("LIGHT"), Keyword::Word("LGT")],
    ),
    (HazardSeverity::Extreme, &[Keyword::Phrase("EXTREME")]),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Outlook {
    Intensifying,
    Weakening,
    #[serde(rename = "No Change")]
    NoChange,
    Continuing,
    #[serde(rename = "Not specified")]
    NotSpecified,
}

static OUTLOOK_LADDER: Ladder<Outlook> = &[
    (
        Outlook::Intensifying,
        &[Keyword::Phrase("INTSF"), Keyword::Phrase("INTENSIFYING")],
    ),
    (
        Outlook::Weakening,
        &[Keyword::Phrase("WKN"), Keyword::Phrase("WEAKENING")],
    ),
    (
        Outlook::NoChange,
        &[Keyword::Word("NC"), Keyword::Phrase("NO CHANGE")],
    ),
    (
        Outlook::Continuing,
        &[Keyword::Word("CONT"), Keyword::Phrase("CONTINUING")],
    ),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct AltitudeBand {
    pub flight_level_ft: Option<u32>,
    pub base_ft: Option<u32>,
    pub top_ft: Option<u32>,
}

impl AltitudeBand {
    pub fn is_empty(&self) -> bool {
        self.flight_level_ft.is_none() && self.base_ft.is_none() && self.top_ft.is_none()
    }
}

/// Validity labels as written in the advisory; there is no day component.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidityWindow {
    pub start: String,
    pub end: String,
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Movement {
    Moving { direction: String, speed_kt: u16 },
    Stationary,
    NotSpecified,
}

impl Movement {
    pub fn description(&self) -> String {
        match self {
            Movement::Moving {
                direction,
                speed_kt,
            } => format!("Moving {direction} at {speed_kt} knots"),
            Movement::Stationary => "Stationary".to_string(),
            Movement::NotSpecified => "Movement not specified".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HazardAdvisory {
    pub raw_text: String,
    pub hazard: HazardType,
    pub severity: HazardSeverity,
    pub area: String,
    pub altitude: AltitudeBand,
    pub validity: Option<ValidityWindow>,
    pub movement: Movement,
    pub outlook: Outlook,
    pub bbox: Option<BoundingBox>,
    pub notes: Vec<String>,
}

pub fn decode_hazard_advisory(text: &str) -> ParsedHazardAdvisory {
    guard(ReportFormat::HazardFeed, text, || parse(text))
}

/// Decode a feed of advisories separated by blank lines.
pub fn decode_hazard_feed(text: &str) -> Vec<ParsedHazardAdvisory> {
    if text.trim().is_empty() {
        return vec![decode_hazard_advisory(text)];
    }

    let mut advisories = Vec::new();
    let mut segment: Vec<&str> = Vec::new();
    for line in text.lines().chain(std::iter::once("")) {
        if line.trim().is_empty() {
            if !segment.is_empty() {
                advisories.push(decode_hazard_advisory(&segment.join("\n")));
                segment.clear();
            }
        } else {
            segment.push(line.trim_end());
        }
    }
    advisories
}

fn parse(text: &str) -> Result<HazardAdvisory, DecodeError> {
    if text.trim().is_empty() {
        return Err(DecodeError::empty(ReportFormat::HazardFeed));
    }

    let upper = text.to_ascii_uppercase();
    let mut notes = Vec::new();

    let hazard = first_rung(HAZARD_LADDER, &upper).unwrap_or_else(|| {
        notes.push("hazard type not recognised".to_string());
        HazardType::Unknown
    });
    let severity = first_rung(SEVERITY_LADDER, &upper).unwrap_or_else(|| {
        notes.push("severity not specified".to_string());
        HazardSeverity::NotSpecified
    });
    let area = extract_area(&upper).unwrap_or_else(|| {
        notes.push("area not specified".to_string());
        "Area not specified".to_string()
    });

    let altitude = extract_altitude(&upper);
    if altitude.is_empty() {
        notes.push("altitude not specified".to_string());
    }

    let validity = extract_validity(&upper);
    if validity.is_none() {
        notes.push("validity not specified".to_string());
    }

    let movement = extract_movement(&upper);
    if movement == Movement::NotSpecified {
        notes.push("movement not specified".to_string());
    }

    let outlook = first_rung(OUTLOOK_LADDER, &upper).unwrap_or(Outlook::NotSpecified);
    let bbox = BoundingBox::from_points(coordinates(&upper));

    Ok(HazardAdvisory {
        raw_text: text.to_string(),
        hazard,
        severity,
        area,
        altitude,
        validity,
        movement,
        outlook,
        bbox,
        notes,
    })
}

fn extract_area(upper: &str) -> Option<String> {
    if let Some(m) = COORD_RUN.find(upper) {
        return Some(m.as_str().to_string());
    }
    if let Some(m) = REGION_PAIR.find(upper) {
        return Some(m.as_str().to_string());
    }
    REGION
        .find_iter(upper)
        .map(|m| m.as_str())
        .find(|code| !NOT_REGIONS.contains(code))
        .map(|code| format!("Area including {code}"))
}

fn extract_altitude(upper: &str) -> AltitudeBand {
    let mut band = AltitudeBand::default();

    if let Some(caps) = FLIGHT_LEVEL.captures(upper) {
        let level = caps[1].parse::<u32>().ok().map(|fl| fl * 100);
        band.flight_level_ft = level;
        if let Some(top) = caps.get(2) {
            band.base_ft = level;
            band.top_ft = top.as_str().parse::<u32>().ok().map(|fl| fl * 100);
        }
    }

    if let Some(caps) = FEET_RANGE.captures(upper) {
        band.base_ft = format!("{}{}", &caps[1], &caps[2]).parse().ok();
        band.top_ft = format!("{}{}", &caps[3], &caps[4]).parse().ok();
    }

    if upper.contains("SFC") || upper.contains("SURFACE") {
        band.base_ft = Some(0);
    }

    band
}

fn extract_validity(upper: &str) -> Option<ValidityWindow> {
    let caps = VALIDITY.captures(upper)?;
    let (start, end) = (caps[1].to_string(), caps[2].to_string());
    let text = format!("Valid {start}-{end}Z");
    Some(ValidityWindow { start, end, text })
}

fn extract_movement(upper: &str) -> Movement {
    if let Some(caps) = MOVING.captures(upper) {
        if let Ok(speed_kt) = caps[2].parse() {
            return Movement::Moving {
                direction: caps[1].to_string(),
                speed_kt,
            };
        }
    }
    if let Some(caps) = MOVING_FROM.captures(upper) {
        if let Ok(speed_kt) = caps[2].parse() {
            return Movement::Moving {
                direction: format!("from {}°", &caps[1]),
                speed_kt,
            };
        }
    }
    if upper.contains("STNR") || upper.contains("STATIONARY") {
        return Movement::Stationary;
    }
    Movement::NotSpecified
}

fn coordinates(upper: &str) -> Vec<Coordinates> {
    COORD_PAIR
        .captures_iter(upper)
        .filter_map(|caps| {
            // Groups 1-6 hold `ddmmN dddmmW`, groups 7-12 hold `Nddmm Wdddmm`.
            let (lat, lon) = if caps.get(1).is_some() {
                (
                    angle(&caps[1], &caps[2], &caps[3])?,
                    angle(&caps[4], &caps[5], &caps[6])?,
                )
            } else {
                (
                    angle(&caps[8], &caps[9], &caps[7])?,
                    angle(&caps[11], &caps[12], &caps[10])?,
                )
            };
            Some(Coordinates {
                latitude: lat,
                longitude: lon,
            })
        })
        .collect()
}

fn angle(degrees: &str, minutes: &str, hemisphere: &str) -> Option<f64> {
    let value = degrees.parse::<f64>().ok()? + minutes.parse::<f64>().ok()? / 60.0;
    Some(match hemisphere {
        "S" | "W" => -value,
        _ => value,
    })
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct HazardAnalysis {
    pub active_advisories: usize,
    pub hazard_summary: BTreeMap<HazardType, usize>,
    pub flight_impacts: Vec<String>,
    pub recommendations: Vec<String>,
}

const HIGH_IMPACT: &[HazardType] = &[
    HazardType::Turbulence,
    HazardType::Icing,
    HazardType::Thunderstorms,
    HazardType::VolcanicAsh,
];

fn recommendation(hazard: HazardType) -> Option<&'static str> {
    match hazard {
        HazardType::Turbulence => Some("Consider turbulence avoidance and secure cabin"),
        HazardType::Icing => Some("Verify anti-ice/de-ice systems operational"),
        HazardType::Thunderstorms => Some("Plan for weather deviations and delays"),
        HazardType::VolcanicAsh => Some("AVOID - Volcanic ash can cause engine failure"),
        _ => None,
    }
}

/// Summarise decoded advisories for flight planning. Failed decodes are skipped.
pub fn analyze_hazards(advisories: &[ParsedHazardAdvisory]) -> HazardAnalysis {
    let decoded: Vec<&HazardAdvisory> = advisories.iter().filter_map(Decoded::report).collect();
    let skipped = advisories.len() - decoded.len();
    if skipped > 0 {
        debug!(skipped, "ignoring undecoded advisories");
    }

    let mut analysis = HazardAnalysis {
        active_advisories: decoded.len(),
        ..Default::default()
    };
    for advisory in &decoded {
        *analysis.hazard_summary.entry(advisory.hazard).or_default() += 1;
    }

    if decoded.is_empty() {
        analysis
            .recommendations
            .push("No active SIGMETs - Monitor for updates".to_string());
        return analysis;
    }

    analysis
        .flight_impacts
        .push(format!("{} active SIGMET(s)", decoded.len()));
    for hazard in HIGH_IMPACT {
        let Some(count) = analysis.hazard_summary.get(hazard) else {
            continue;
        };
        analysis
            .flight_impacts
            .push(format!("{count} {} SIGMET(s) active", hazard.label()));
        if let Some(line) = recommendation(*hazard) {
            analysis.recommendations.push(line.to_string());
        }
    }

    analysis
}
