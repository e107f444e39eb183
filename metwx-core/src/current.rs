//! Current-conditions (METAR/SPECI) decoding.
//!
//! Lenient and positional: the fixed-order groups at the front are optional,
//! and every later token is tried against each group kind in turn. Tokens that
//! match nothing are kept in `parsing_errors`.

use serde::Serialize;

use crate::error::{DecodeError, guard};
use crate::fields::{
    decode_cloud, decode_pressure, decode_temperature, decode_time, decode_variable_direction,
    decode_visibility, decode_weather, decode_wind, looks_like_cloud, looks_like_pressure,
    looks_like_temperature, looks_like_time, looks_like_visibility, looks_like_wind,
};
use crate::model::{
    CloudLayer, Decoded, FieldValue, Pressure, ReportFormat, Temperature, TimeStamp, Visibility,
    WeatherObservation, Wind,
};
use crate::tokens::{Cursor, settle_into};

pub type ParsedCurrentConditions = Decoded<CurrentConditions>;

const REPORT_TYPES: &[&str] = &["METAR", "SPECI"];
const MODIFIERS: &[&str] = &["AUTO", "COR", "NIL"];
const REMARKS_MARKER: &str = "RMK";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CurrentConditions {
    pub raw_text: String,
    pub report_type: Option<String>,
    pub station: String,
    pub observation_time: FieldValue<TimeStamp>,
    pub modifiers: Vec<String>,
    pub wind: FieldValue<Wind>,
    pub visibility: FieldValue<Visibility>,
    pub weather: Vec<WeatherObservation>,
    pub clouds: Vec<CloudLayer>,
    pub temperature: FieldValue<Temperature>,
    pub pressure: FieldValue<Pressure>,
    pub remarks: Option<String>,
    pub parsing_errors: Vec<String>,
}

impl CurrentConditions {
    /// Height of the lowest broken or overcast layer.
    pub fn ceiling_feet(&self) -> Option<u32> {
        self.clouds.iter().filter_map(CloudLayer::ceiling_feet).min()
    }
}

pub fn decode_current(text: &str) -> ParsedCurrentConditions {
    guard(ReportFormat::Current, text, || parse(text))
}

fn parse(text: &str) -> Result<CurrentConditions, DecodeError> {
    if text.trim().is_empty() {
        return Err(DecodeError::empty(ReportFormat::Current));
    }

    let tokens: Vec<&str> = text.split_whitespace().collect();
    let mut cursor = Cursor::new(&tokens);
    let mut parsing_errors = Vec::new();

    let report_type = cursor
        .take_if(|t| REPORT_TYPES.contains(&t))
        .map(str::to_string);

    let station = cursor
        .next()
        .map(str::to_string)
        .ok_or(DecodeError::MissingStation)?;

    let observation_time = cursor.field(
        "observation time",
        decode_time,
        looks_like_time,
        &mut parsing_errors,
    );

    let mut modifiers = Vec::new();
    while let Some(modifier) = cursor.take_if(|t| MODIFIERS.contains(&t)) {
        modifiers.push(modifier.to_string());
    }

    let mut wind = cursor.field("wind", decode_wind, looks_like_wind, &mut parsing_errors);
    if let FieldValue::Present(w) = &mut wind {
        if let Some(range) = cursor.peek().and_then(decode_variable_direction) {
            w.variable_range = Some(range);
            cursor.advance(1);
        }
    }

    let visibility = match cursor.split_visibility() {
        Some(vis) => FieldValue::Present(vis),
        None => cursor.field(
            "visibility",
            decode_visibility,
            looks_like_visibility,
            &mut parsing_errors,
        ),
    };

    let mut weather = Vec::new();
    let mut clouds = Vec::new();
    let mut temperature = FieldValue::Absent;
    let mut pressure = FieldValue::Absent;
    let mut remarks = None;

    while let Some(token) = cursor.next() {
        if let Some(wx) = decode_weather(token) {
            weather.push(wx);
            continue;
        }

        if looks_like_cloud(token) {
            match decode_cloud(token) {
                Some(layer) => clouds.push(layer),
                None => parsing_errors.push(format!("Malformed cloud layer: {token}")),
            }
            continue;
        }

        if looks_like_temperature(token) {
            settle_into(
                &mut temperature,
                token,
                "temperature",
                decode_temperature,
                &mut parsing_errors,
            );
            continue;
        }

        if looks_like_pressure(token) {
            settle_into(&mut pressure, token, "pressure", decode_pressure, &mut parsing_errors);
            continue;
        }

        if token == REMARKS_MARKER {
            remarks = Some(cursor.rest().join(" "));
            break;
        }

        parsing_errors.push(format!("Unknown component: {token}"));
    }

    Ok(CurrentConditions {
        raw_text: text.to_string(),
        report_type,
        station,
        observation_time,
        modifiers,
        wind,
        visibility,
        weather,
        clouds,
        temperature,
        pressure,
        remarks,
        parsing_errors,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{CloudCover, Intensity, VisibilityUnit};

    fn decoded(text: &str) -> CurrentConditions {
        match decode_current(text) {
            Decoded::Report(report) => report,
            Decoded::Failed(f) => panic!("unexpected failure: {}", f.error),
        }
    }

    #[test]
    fn clear_day_report() {
        let report = decoded("METAR KJFK 261951Z 26008KT 10SM FEW250 24/18 A2995 RMK AO2 SLP141");

        assert_eq!(report.report_type.as_deref(), Some("METAR"));
        assert_eq!(report.station, "KJFK");
        assert_eq!(report.observation_time.present().map(|t| t.day), Some(26));
        assert_eq!(report.wind.present().map(|w| w.speed), Some(8));
        assert_eq!(report.visibility.present().map(|v| v.distance), Some(10.0));
        assert_eq!(report.clouds.len(), 1);
        assert_eq!(report.temperature.present().map(|t| t.temperature_celsius), Some(24));
        assert!(report.pressure.present().is_some());
        assert_eq!(report.remarks.as_deref(), Some("AO2 SLP141"));
        assert!(report.parsing_errors.is_empty());
    }

    #[test]
    fn weather_and_multiple_layers() {
        let report = decoded("METAR KORD 261951Z 27012G18KT 5SM -RA BKN008 OVC015 18/16 A2985");

        assert_eq!(report.weather.len(), 1);
        assert_eq!(report.weather[0].intensity, Intensity::Light);
        assert_eq!(report.clouds.len(), 2);
        assert_eq!(report.clouds[1].cover, CloudCover::Overcast);
        assert_eq!(report.ceiling_feet(), Some(800));
    }

    #[test]
    fn report_type_is_optional() {
        let report = decoded("KSFO 261956Z 28008KT 1/4SM FG VV002 15/15 A3001");

        assert!(report.report_type.is_none());
        assert_eq!(report.station, "KSFO");
        assert_eq!(report.visibility.present().map(|v| v.distance), Some(0.25));
        assert_eq!(report.clouds[0].cover, CloudCover::VerticalVisibility);
    }

    #[test]
    fn modifiers_variable_sector_and_split_visibility() {
        let report = decoded("SPECI KDEN 011853Z AUTO 31015G27KT 280V340 1 1/2SM -SN OVC012 M02/M05 A2990");

        assert_eq!(report.modifiers, ["AUTO"]);
        let wind = report.wind.present().expect("wind present");
        assert_eq!(wind.variable_range.map(|r| (r.from, r.to)), Some((280, 340)));
        assert_eq!(report.visibility.present().map(|v| v.distance), Some(1.5));
        assert!(report.parsing_errors.is_empty());
    }

    #[test]
    fn metric_report_with_qnh() {
        let report = decoded("EGLL 261950Z 24012KT 9999 SCT035 17/09 Q1018");

        let vis = report.visibility.present().expect("visibility present");
        assert_eq!(vis.unit, VisibilityUnit::Meters);
        assert_eq!(report.pressure.present().map(|p| p.hectopascals), Some(1018.0));
    }

    #[test]
    fn unknown_tokens_are_recorded() {
        let report = decoded("KJFK 261951Z 26008KT 10SM NOSIG FEW250 24/18 A2995");

        assert_eq!(report.parsing_errors, ["Unknown component: NOSIG"]);
        assert_eq!(report.clouds.len(), 1);
    }

    #[test]
    fn malformed_fields_are_distinguished_from_absent() {
        let report = decoded("KJFK 269951Z 2608KT 10SM BKN/// 15/ A2995");

        assert!(report.observation_time.is_malformed());
        assert!(report.wind.is_malformed());
        assert!(report.temperature.is_malformed());
        assert!(report.clouds.is_empty());
        assert_eq!(report.parsing_errors.len(), 4);
    }

    #[test]
    fn later_groups_do_not_replace_decoded_values() {
        let report = decoded("KJFK 261951Z 26008KT 10SM 24/18 15/ A2995 Q1013 M1/4SM");

        assert_eq!(report.temperature.present().map(|t| t.temperature_celsius), Some(24));
        assert_eq!(report.temperature.present().map(|t| t.dewpoint_celsius), Some(18));
        assert_eq!(report.pressure.present().map(|p| p.inches_hg), Some(29.95));
        assert_eq!(
            report.parsing_errors,
            [
                "Duplicate temperature: 15/",
                "Duplicate pressure: Q1013",
                "Unknown component: M1/4SM",
            ]
        );
    }

    #[test]
    fn missing_groups_are_absent() {
        let report = decoded("KJFK FEW250");

        assert!(report.observation_time.is_absent());
        assert!(report.wind.is_absent());
        assert!(report.visibility.is_absent());
        assert_eq!(report.clouds.len(), 1);
    }

    #[test]
    fn empty_input_is_an_error() {
        for text in ["", "   \n\t"] {
            let result = decode_current(text);
            let failure = result.failure().expect("empty input must fail");
            assert!(failure.error.contains("Empty"));
        }
    }

    #[test]
    fn report_type_without_station_is_an_error() {
        let result = decode_current("METAR");
        assert!(result.is_failed());
    }
}
