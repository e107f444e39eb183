//! Terminal forecast (TAF) decoding.
//!
//! The header is strict: a missing or malformed header rejects the whole
//! report. The body is split into a base segment and change-group segments,
//! and every segment's conditions go through [`decode_conditions`].

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

use crate::error::{DecodeError, guard};
use crate::fields::{
    decode_cloud, decode_time, decode_visibility, decode_weather, decode_wind, looks_like_cloud,
    looks_like_visibility, looks_like_wind,
};
use crate::model::{
    CloudLayer, Decoded, FieldValue, ReportFormat, TimeStamp, Visibility, WeatherObservation, Wind,
};
use crate::tokens::{Cursor, settle};

pub type ParsedForecast = Decoded<Forecast>;

static STATION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\w{4}$").expect("valid station pattern"));
static PERIOD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{2})(\d{2})/(\d{2})(\d{2})$").expect("valid period pattern")
});
static FROM_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^FM(\d{6})$").expect("valid FM pattern"));
static PROB_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^PROB(\d{2})$").expect("valid PROB pattern"));

const HEADER_MARKER: &str = "TAF";
const AMENDMENTS: &[&str] = &["AMD", "COR"];
const NO_SIGNIFICANT_WEATHER: &str = "NSW";

/// Day of month and hour, as used by validity periods.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct DayHour {
    pub day: u8,
    pub hour: u8,
}

impl fmt::Display for DayHour {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Day {}, {:02}:00 UTC", self.day, self.hour)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ValidityPeriod {
    pub from: DayHour,
    pub to: DayHour,
    pub duration_hours: i32,
    pub description: String,
}

impl ValidityPeriod {
    /// `DDHH/DDHH`. Hour 24 is allowed as an end-of-day marker.
    pub fn parse(token: &str) -> Option<Self> {
        let caps = PERIOD.captures(token)?;
        let field = |i: usize| caps[i].parse::<u8>().ok();
        let from = DayHour {
            day: field(1)?,
            hour: field(2)?,
        };
        let to = DayHour {
            day: field(3)?,
            hour: field(4)?,
        };

        let in_range = |dh: &DayHour| (1..=31).contains(&dh.day) && dh.hour <= 24;
        if !in_range(&from) || !in_range(&to) {
            return None;
        }

        Some(Self {
            from,
            to,
            duration_hours: duration_hours(from, to),
            description: format!(
                "Valid from Day {} {:02}:00Z to Day {} {:02}:00Z",
                from.day, from.hour, to.day, to.hour
            ),
        })
    }
}

/// Hours between two day/hour points. Month rollover assumes a 31-day month.
pub fn duration_hours(from: DayHour, to: DayHour) -> i32 {
    let (sd, sh) = (i32::from(from.day), i32::from(from.hour));
    let (ed, eh) = (i32::from(to.day), i32::from(to.hour));

    if ed >= sd {
        (ed - sd) * 24 + (eh - sh)
    } else {
        (31 - sd + ed) * 24 + (eh - sh)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeKind {
    From,
    Temporary,
    Becoming,
    Probability { percent: u8, temporary: bool },
}

impl ChangeKind {
    pub fn label(&self) -> String {
        match self {
            Self::From => "From".to_string(),
            Self::Temporary => "Temporary".to_string(),
            Self::Becoming => "Becoming".to_string(),
            Self::Probability {
                percent,
                temporary: false,
            } => format!("{percent}% Probability"),
            Self::Probability {
                percent,
                temporary: true,
            } => format!("{percent}% Probability Temporary"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChangeWindow {
    At(TimeStamp),
    Period(ValidityPeriod),
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChangeGroup {
    pub raw: String,
    pub kind: ChangeKind,
    pub description: String,
    pub window: ChangeWindow,
    pub conditions: ForecastConditions,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub struct ForecastConditions {
    pub raw: String,
    pub wind: FieldValue<Wind>,
    pub visibility: FieldValue<Visibility>,
    pub weather: Vec<WeatherObservation>,
    pub clouds: Vec<CloudLayer>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub no_significant_weather: bool,
    pub parsing_errors: Vec<String>,
}

impl ForecastConditions {
    pub fn ceiling_feet(&self) -> Option<u32> {
        self.clouds.iter().filter_map(CloudLayer::ceiling_feet).min()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Forecast {
    pub raw_text: String,
    pub station: String,
    pub amendment: Option<String>,
    pub issue_time: TimeStamp,
    pub valid_period: ValidityPeriod,
    pub base_forecast: Option<ForecastConditions>,
    pub change_groups: Vec<ChangeGroup>,
}

impl Forecast {
    /// Base conditions followed by every change group's conditions.
    pub fn all_conditions(&self) -> impl Iterator<Item = &ForecastConditions> {
        self.base_forecast
            .iter()
            .chain(self.change_groups.iter().map(|g| &g.conditions))
    }
}

pub fn decode_forecast(text: &str) -> ParsedForecast {
    guard(ReportFormat::Forecast, text, || parse(text))
}

fn parse(text: &str) -> Result<Forecast, DecodeError> {
    if text.trim().is_empty() {
        return Err(DecodeError::empty(ReportFormat::Forecast));
    }

    let body = text.trim().trim_end_matches('=');
    let tokens: Vec<&str> = body.split_whitespace().collect();
    let mut cursor = Cursor::new(&tokens);

    cursor
        .take_if(|t| t == HEADER_MARKER)
        .ok_or(DecodeError::MissingForecastHeader)?;
    let amendment = cursor
        .take_if(|t| AMENDMENTS.contains(&t))
        .map(str::to_string);

    let station = cursor.next().ok_or(DecodeError::MissingForecastHeader)?;
    if !STATION.is_match(station) {
        return Err(DecodeError::invalid_header("station", station));
    }

    let issued = cursor.next().ok_or(DecodeError::MissingForecastHeader)?;
    let issue_time =
        decode_time(issued).ok_or_else(|| DecodeError::invalid_header("issue time", issued))?;

    let period = cursor.next().ok_or(DecodeError::MissingForecastHeader)?;
    let valid_period = ValidityPeriod::parse(period)
        .ok_or_else(|| DecodeError::invalid_header("valid period", period))?;

    let (base, segments) = split_segments(cursor.rest());
    let base_forecast = (!base.is_empty()).then(|| conditions_from(base));
    let change_groups = segments.into_iter().map(change_group).collect();

    Ok(Forecast {
        raw_text: text.to_string(),
        station: station.to_string(),
        amendment,
        issue_time,
        valid_period,
        base_forecast,
        change_groups,
    })
}

/// A change marker recognised at some token position.
struct Marker {
    kind: ChangeKind,
    window: ChangeWindow,
    len: usize,
}

fn marker_at(tokens: &[&str]) -> Option<Marker> {
    let first = *tokens.first()?;
    let period_at = |i: usize| tokens.get(i).and_then(|t| ValidityPeriod::parse(t));

    if let Some(caps) = FROM_MARKER.captures(first) {
        let time = decode_time(&format!("{}Z", &caps[1]))?;
        return Some(Marker {
            kind: ChangeKind::From,
            window: ChangeWindow::At(time),
            len: 1,
        });
    }

    let (kind, len) = match first {
        "TEMPO" => (ChangeKind::Temporary, 1),
        "BECMG" => (ChangeKind::Becoming, 1),
        _ => {
            let percent = PROB_MARKER.captures(first)?[1].parse().ok()?;
            let temporary = tokens.get(1) == Some(&"TEMPO");
            (
                ChangeKind::Probability { percent, temporary },
                if temporary { 2 } else { 1 },
            )
        }
    };

    let period = period_at(len)?;
    Some(Marker {
        kind,
        window: ChangeWindow::Period(period),
        len: len + 1,
    })
}

/// Base tokens, then one (marker, segment tokens) pair per change group.
fn split_segments<'a>(tokens: &'a [&'a str]) -> (&'a [&'a str], Vec<(Marker, &'a [&'a str])>) {
    let mut starts = Vec::new();
    let mut i = 0;
    while i < tokens.len() {
        match marker_at(&tokens[i..]) {
            Some(marker) => {
                let len = marker.len;
                starts.push((i, marker));
                i += len;
            }
            None => i += 1,
        }
    }

    let base_end = starts.first().map_or(tokens.len(), |(start, _)| *start);
    let mut segments = Vec::with_capacity(starts.len());
    let mut iter = starts.into_iter().peekable();
    while let Some((start, marker)) = iter.next() {
        let end = iter.peek().map_or(tokens.len(), |(next, _)| *next);
        segments.push((marker, &tokens[start..end]));
    }

    (&tokens[..base_end], segments)
}

fn change_group((marker, tokens): (Marker, &[&str])) -> ChangeGroup {
    ChangeGroup {
        raw: tokens.join(" "),
        description: marker.kind.label(),
        kind: marker.kind,
        window: marker.window,
        conditions: conditions_from(&tokens[marker.len..]),
    }
}

/// Decode a block of forecast conditions: wind, visibility, weather, clouds.
pub fn decode_conditions(text: &str) -> ForecastConditions {
    let tokens: Vec<&str> = text.split_whitespace().collect();
    conditions_from(&tokens)
}

fn conditions_from(tokens: &[&str]) -> ForecastConditions {
    let mut out = ForecastConditions {
        raw: tokens.join(" "),
        ..Default::default()
    };
    let mut cursor = Cursor::new(tokens);

    while let Some(token) = cursor.peek() {
        if let Some(vis) = cursor.split_visibility() {
            out.visibility = FieldValue::Present(vis);
            continue;
        }
        cursor.advance(1);

        if token == NO_SIGNIFICANT_WEATHER {
            out.no_significant_weather = true;
        } else if looks_like_wind(token) {
            out.wind = settle(token, "wind", decode_wind, &mut out.parsing_errors);
        } else if looks_like_visibility(token) {
            out.visibility = settle(token, "visibility", decode_visibility, &mut out.parsing_errors);
        } else if let Some(wx) = decode_weather(token) {
            out.weather.push(wx);
        } else if looks_like_cloud(token) {
            match decode_cloud(token) {
                Some(layer) => out.clouds.push(layer),
                None => out
                    .parsing_errors
                    .push(format!("Malformed cloud layer: {token}")),
            }
        } else {
            out.parsing_errors.push(format!("Unknown component: {token}"));
        }
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CloudCover, Intensity};

    fn decoded(text: &str) -> Forecast {
        match decode_forecast(text) {
            Decoded::Report(forecast) => forecast,
            Decoded::Failed(f) => panic!("unexpected failure: {}", f.error),
        }
    }

    #[test]
    fn from_groups() {
        let taf = decoded(
            "TAF KJFK 261720Z 2618/2724 26008KT P6SM FEW250 FM270200 27012KT P6SM SCT250 FM271400 28015KT P6SM BKN250",
        );

        assert_eq!(taf.station, "KJFK");
        assert_eq!(taf.issue_time.to_string(), "Day 26, 17:20 UTC");
        assert_eq!(taf.valid_period.duration_hours, 30);
        assert_eq!(taf.change_groups.len(), 2);

        let first = &taf.change_groups[0];
        assert_eq!(first.kind, ChangeKind::From);
        assert_eq!(
            first.window,
            ChangeWindow::At(TimeStamp {
                day: 27,
                hour: 2,
                minute: 0
            })
        );
        assert_eq!(first.conditions.wind.present().map(|w| w.speed), Some(12));

        let base = taf.base_forecast.as_ref().expect("base forecast");
        assert_eq!(base.clouds.len(), 1);
        assert!(base.parsing_errors.is_empty());
    }

    #[test]
    fn tempo_and_becoming_periods() {
        let taf = decoded(
            "TAF KSEA 261720Z 2618/2724 21008KT 5SM -RA BKN008 OVC015 TEMPO 2620/2624 3SM RA BR BKN005 BECMG 2702/2704 30015G25KT",
        );

        let tempo = &taf.change_groups[0];
        assert_eq!(tempo.kind, ChangeKind::Temporary);
        let ChangeWindow::Period(period) = &tempo.window else {
            panic!("tempo carries a period");
        };
        assert_eq!(period.duration_hours, 4);
        assert_eq!(tempo.conditions.weather.len(), 2);
        assert_eq!(tempo.conditions.weather[0].intensity, Intensity::Moderate);
        assert_eq!(tempo.conditions.ceiling_feet(), Some(500));

        let becmg = &taf.change_groups[1];
        assert_eq!(becmg.kind, ChangeKind::Becoming);
        assert_eq!(becmg.conditions.wind.present().and_then(|w| w.gust), Some(25));
    }

    #[test]
    fn probability_groups() {
        let taf = decoded(
            "TAF KORD 261720Z 2618/2724 27012KT P6SM SCT250 PROB30 2620/2622 TSRA BKN030CB PROB40 TEMPO 2700/2704 1SM +SN",
        );

        assert_eq!(taf.change_groups.len(), 2);
        assert_eq!(
            taf.change_groups[0].kind,
            ChangeKind::Probability {
                percent: 30,
                temporary: false
            }
        );
        assert_eq!(taf.change_groups[0].conditions.clouds[0].convective, Some("CB"));
        assert_eq!(taf.change_groups[1].description, "40% Probability Temporary");
        assert_eq!(
            taf.change_groups[1].conditions.visibility.present().map(|v| v.distance),
            Some(1.0)
        );
    }

    #[test]
    fn amendment_terminator_and_nsw() {
        let taf = decoded("TAF AMD EGLL 261100Z 2612/2718 24010KT 9999 SCT030 BECMG 2614/2616 NSW=");

        assert_eq!(taf.amendment.as_deref(), Some("AMD"));
        assert_eq!(taf.station, "EGLL");
        let becmg = &taf.change_groups[0];
        assert!(becmg.conditions.no_significant_weather);
        assert!(becmg.conditions.parsing_errors.is_empty());
    }

    #[test]
    fn month_rollover_uses_31_days() {
        let from = DayHour { day: 30, hour: 18 };
        let to = DayHour { day: 1, hour: 12 };
        assert_eq!(duration_hours(from, to), 42);
    }

    #[test]
    fn marker_without_period_stays_in_conditions() {
        let taf = decoded("TAF KLAX 261740Z 2618/2724 25005KT P6SM FEW015 TEMPO BKN015");

        assert!(taf.change_groups.is_empty());
        let base = taf.base_forecast.expect("base");
        assert_eq!(base.parsing_errors, ["Unknown component: TEMPO"]);
        assert_eq!(base.clouds[1].cover, CloudCover::Broken);
    }

    #[test]
    fn missing_header_is_a_hard_failure() {
        for text in [
            "KJFK 261720Z 2618/2724 26008KT P6SM",
            "TAF KJFK",
            "METAR KJFK 261951Z 26008KT",
        ] {
            let failure = decode_forecast(text).failure().cloned().expect("must fail");
            assert_eq!(failure.error, "Invalid TAF format - missing header");
            assert_eq!(failure.raw_text, text);
        }
    }

    #[test]
    fn bad_header_fields_are_rejected() {
        let result = decode_forecast("TAF KJFK 261720Z 2618-2724 26008KT");
        let failure = result.failure().expect("must fail");
        assert!(failure.error.contains("valid period"));

        let result = decode_forecast("TAF KJFK 329920Z 2618/2724 26008KT");
        assert!(result.failure().expect("must fail").error.contains("issue time"));
    }

    #[test]
    fn failure_serializes_without_partial_fields() {
        let json = serde_json::to_value(decode_forecast("FORECAST KJFK")).expect("serialize");
        let object = json.as_object().expect("object");
        assert_eq!(object.len(), 2);
        assert!(object.contains_key("error"));
        assert!(object.contains_key("raw_text"));
    }

    #[test]
    fn empty_forecast() {
        let failure = decode_forecast("  ").failure().cloned().expect("must fail");
        assert_eq!(failure.error, "Empty forecast report provided");
    }

    #[test]
    fn standalone_conditions() {
        let conditions = decode_conditions("VRB03KT 1 1/2SM BR OVC004 WS020/27045KT");
        assert_eq!(conditions.visibility.present().map(|v| v.distance), Some(1.5));
        assert_eq!(conditions.parsing_errors, ["Unknown component: WS020/27045KT"]);
    }
}
