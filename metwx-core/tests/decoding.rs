use metwx_core::{
    Category, DecodedReport, RawReport, ReportFormat, analyze_hazards, categorize_pilot_reports,
    classify, decode, decode_current, decode_forecast, decode_hazard_feed, decode_pilot_reports,
    fields,
    hazard::HazardType,
    model::{CloudCover, Intensity, VisibilityUnit, WindUnit},
    pilot::Urgency,
};
use serde_json::json;

#[test]
fn field_decoders() {
    let wind = fields::decode_wind("26008KT").expect("wind");
    assert_eq!(wind.direction_degrees, Some(260));
    assert_eq!(wind.speed, 8);
    assert_eq!(wind.gust, None);
    assert_eq!(wind.unit, WindUnit::Knots);

    let wind = fields::decode_wind("09014G25KT").expect("gusting wind");
    assert_eq!(wind.direction_degrees, Some(90));
    assert_eq!(wind.gust, Some(25));

    let vis = fields::decode_visibility("P6SM").expect("visibility");
    assert_eq!(vis.distance, 6.0);
    assert!(vis.greater_than);
    assert_eq!(vis.unit, VisibilityUnit::StatuteMiles);

    let cloud = fields::decode_cloud("BKN005").expect("cloud");
    assert_eq!(cloud.cover, CloudCover::Broken);
    assert_eq!(cloud.height_feet, Some(500));

    let temp = fields::decode_temperature("M05/M12").expect("temperature");
    assert_eq!(
        (
            temp.temperature_celsius,
            temp.dewpoint_celsius,
            temp.temperature_fahrenheit,
            temp.dewpoint_fahrenheit
        ),
        (-5, -12, 23, 10)
    );

    let pressure = fields::decode_pressure("A2995").expect("pressure");
    assert_eq!(pressure.inches_hg, 29.95);
    assert!((pressure.hectopascals - 1014.2).abs() < 0.05);

    let wx = fields::decode_weather("+TSRA").expect("weather");
    assert_eq!(wx.intensity, Intensity::Heavy);
    let names: Vec<&str> = wx.phenomena.iter().map(|p| p.description).collect();
    assert_eq!(names, ["Thunderstorm", "Rain"]);
}

#[test]
fn current_conditions_json_shape() {
    let parsed = decode_current(
        "METAR KSFO 261956Z 28016G24KT 10SM FEW008 BKN200 18/12 A2998 RMK AO2 SLP152",
    );
    let json = serde_json::to_value(&parsed).expect("serialize");

    assert_eq!(json["station"], "KSFO");
    assert!(json.get("error").is_none());
    assert_eq!(json["wind"]["speed"], 16);
    assert_eq!(json["wind"]["gust"], 24);
    assert_eq!(json["clouds"][1]["type"], "broken");
    assert_eq!(json["temperature"]["temperature_celsius"], 18);
    assert_eq!(json["remarks"], "AO2 SLP152");
    assert_eq!(json["parsing_errors"], json!([]));
}

#[test]
fn failures_carry_error_and_raw_text_only() {
    let parsed = decode_current("   ");
    let json = serde_json::to_value(&parsed).expect("serialize");

    assert_eq!(json["error"], "Empty current-conditions report provided");
    assert_eq!(json["raw_text"], "   ");
    assert!(json.get("station").is_none());
}

#[test]
fn malformed_fields_stay_distinct_from_absent_ones() {
    let parsed = decode_current("KBOS 261954Z 270XXKT 10SM");
    let json = serde_json::to_value(&parsed).expect("serialize");

    assert_eq!(json["wind"]["raw"], "270XXKT");
    assert!(json["wind"]["error"].is_string());
    assert!(json["temperature"].is_null());
}

#[test]
fn forecast_header_failure_has_no_partial_fields() {
    let parsed = decode_forecast("KJFK 261720Z 2618/2724 26008KT P6SM");
    let json = serde_json::to_value(&parsed).expect("serialize");

    let keys: Vec<&String> = json.as_object().expect("object").keys().collect();
    assert_eq!(keys, ["error", "raw_text"]);
    assert_eq!(json["error"], "Invalid TAF format - missing header");
}

#[test]
fn full_forecast() {
    let parsed = decode_forecast(
        "TAF KDEN 261720Z 2618/2724 22015G25KT P6SM SCT080 BKN150 \
         TEMPO 2620/2624 VRB25G40KT 2SM TSRA BKN050CB \
         FM270300 30010KT P6SM SKC \
         PROB30 2710/2714 4SM -SHRA BR BKN030=",
    );
    let taf = parsed.report().expect("decodes");

    assert_eq!(taf.valid_period.duration_hours, 30);
    assert_eq!(taf.change_groups.len(), 3);

    let labels: Vec<String> = taf.change_groups.iter().map(|g| g.kind.label()).collect();
    assert_eq!(labels, ["Temporary", "From", "30% Probability"]);

    let tempo = &taf.change_groups[0].conditions;
    assert!(tempo.wind.present().is_some_and(|w| w.direction_variable));
    assert!(tempo.parsing_errors.is_empty());

    assert_eq!(taf.all_conditions().count(), 4);
}

#[test]
fn hazard_feed_and_analysis() {
    let feed = "\
SIGMET NOVEMBER 2 VALID 261800/262200 SEV TURB FCST WI 4000N 10500W - 3800N 10200W - 3700N 10600W FL280/380 MOV NE 20KT NC

CONVECTIVE SIGMET 45C VALID UNTIL 2155Z TS AREA WI 3300N 09700W - 3100N 09400W MOV FROM 24025KT TOPS ABV FL450

AIRMET ZULU MOD ICE BTN FL080 AND FL160 NY-PA STNR";

    let advisories = decode_hazard_feed(feed);
    assert_eq!(advisories.len(), 3);
    assert!(advisories.iter().all(|a| !a.is_failed()));

    let analysis = analyze_hazards(&advisories);
    assert_eq!(analysis.active_advisories, 3);
    assert_eq!(
        analysis.hazard_summary.get(&HazardType::Turbulence),
        Some(&1)
    );
    assert_eq!(
        analysis.hazard_summary.get(&HazardType::Thunderstorms),
        Some(&1)
    );
    assert_eq!(analysis.hazard_summary.get(&HazardType::Icing), Some(&1));
    assert_eq!(analysis.flight_impacts[0], "3 active SIGMET(s)");
}

#[test]
fn pilot_report_feed() {
    let feed = "\
DEN UA /OV DEN270020/TM 1635/FL120/TY B738/SK OVC080/TA M08/TB MOD 100-140
COS UUA /OV COS/TM 1640/FL090/TY PC12/TB SEV/RM LLWS
random header line";

    let reports = decode_pilot_reports(feed);
    assert_eq!(reports.len(), 2);

    let urgent = reports[1].report().expect("decodes");
    assert_eq!(urgent.urgency, Urgency::Urgent);

    let digest = categorize_pilot_reports(&reports);
    assert_eq!(digest.total_count, 2);
    assert_eq!(digest.urgent_reports.len(), 1);
    assert!(digest.has_turbulence);
    assert!(!digest.has_icing);
}

#[test]
fn classification_properties() {
    let metar = decode_current("KXYZ 261951Z 27030KT 1/2SM");
    let result = classify(metar.report(), None);
    assert_eq!(result.score, 7);
    assert_eq!(result.category, Category::Significant);

    let metar = decode_current("KSEA 261953Z 21008KT 5SM -RA BKN008 OVC015 12/10 A2992");
    let taf = decode_forecast("TAF KSEA 261720Z 2618/2724 21008KT 5SM -RA BKN008 TEMPO 2620/2624 2SM RA BR");
    let without_trend = classify(metar.report(), None);
    let with_trend = classify(metar.report(), taf.report());

    assert_eq!(with_trend.score, without_trend.score + 1);
    assert!(
        with_trend
            .reasoning
            .contains(&"Forecast shows deteriorating visibility (temporary)".to_string())
    );

    let unknown = classify(decode_current("").report(), None);
    assert_eq!(unknown.category, Category::Unknown);
}

#[test]
fn dispatch_by_format() {
    let raw = RawReport::new(ReportFormat::PilotReports, "OKC UA /OV OKC/TB LGT");
    match decode(&raw) {
        DecodedReport::PilotReports(reports) => assert_eq!(reports.len(), 1),
        other => panic!("unexpected dispatch: {:?}", other.format()),
    }
}

const HOSTILE_TEXTS: &[&str] = &[
    "ß",
    "KJFK ß 26008KT ß/ß Aßßß",
    "METAR",
    "SPECI 261951Z",
    "KJFK 261951Z 26008KT M1/4SM 1/0SM BKN/// ///// A//// Q99999 RMK",
    "KJFK 999999Z VRBKT 999V KT SM 1 /SM",
    "TAF",
    "TAF KDEN",
    "TAF KDEN 261720Z 2618/2724 FM",
    "TAF KDEN 261720Z 2618/2724 TEMPO",
    "TAF KDEN 261720Z 2618/2724 PROB30",
    "TAF KDEN 261720Z 2618/2724 PROB30 TEMPO 9999/9999 BECMG FM99",
    "TAF KDEN 261720Z 0000/3225 FM261800 ß",
    "/OV",
    "UA /OV",
    "KDEN UUA /OV /TM /FL /TP /TB /IC /WX /TA /WV /RM",
    "UA /FL999 /TA M /WV 999 /TM 9999 /OV ß",
    "SEV TURB FL999/ FL",
    "ß FL999/ MOV ß 99KT",
    "WI 9999N 99999W - N9999 E99999 MOV FROM 99999KT",
    "\u{1F32A} TS \u{00A0} CB",
];

/// Failures must come from a decoder rejecting the text, never from a
/// recovered fault, and a result never carries both a station and an error.
fn assert_clean<T: serde::Serialize>(text: &str, parsed: &[metwx_core::Decoded<T>]) {
    for result in parsed {
        let json = serde_json::to_value(result).expect("serialize");
        let error = json.get("error").and_then(|e| e.as_str());
        let station = json.get("station").filter(|s| !s.is_null());

        if let Some(error) = error {
            assert!(
                !error.starts_with("Failed to parse"),
                "decoder fault on {text:?}: {error}"
            );
        }
        assert!(
            !(error.is_some() && station.is_some()),
            "station and error both set for {text:?}"
        );
    }
}

#[test]
fn hostile_input_never_faults_any_decoder() {
    for text in HOSTILE_TEXTS {
        let current = decode_current(text);
        assert_clean(text, std::slice::from_ref(&current));
        assert!(current.is_failed() != current.report().is_some());

        let forecast = decode_forecast(text);
        assert_clean(text, std::slice::from_ref(&forecast));
        assert!(forecast.is_failed() != forecast.report().is_some());

        assert_clean(text, &decode_hazard_feed(text));
        assert_clean(text, &decode_pilot_reports(text));
    }
}
