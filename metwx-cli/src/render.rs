//! Plain-text output for terminal use.

use metwx_core::{
    ClassificationResult, CurrentConditions, Decoded, DecodedReport, FieldValue, Forecast,
    HazardAdvisory, HazardAnalysis, ParsedHazardAdvisory, PilotReport, PilotReportDigest,
    RouteBriefing, StationBriefing, briefing::format_weather_phenomena,
    forecast::ForecastConditions,
};

fn field<T>(value: &FieldValue<T>, describe: impl Fn(&T) -> String) -> String {
    match value {
        FieldValue::Present(v) => describe(v),
        FieldValue::Malformed { raw, reason } => format!("unreadable '{raw}' ({reason})"),
        FieldValue::Absent => "-".to_string(),
    }
}

fn report_or_error<T>(decoded: &Decoded<T>) -> Option<&T> {
    match decoded {
        Decoded::Report(report) => Some(report),
        Decoded::Failed(f) => {
            println!("error: {}", f.error);
            println!("  raw: {}", f.raw_text.trim());
            None
        }
    }
}

fn errors(list: &[String]) {
    for e in list {
        println!("  ! {e}");
    }
}

pub fn decoded(report: &DecodedReport) {
    match report {
        DecodedReport::Current(parsed) => {
            if let Some(c) = report_or_error(parsed) {
                current(c);
            }
        }
        DecodedReport::Forecast(parsed) => {
            if let Some(f) = report_or_error(parsed) {
                forecast(f);
            }
        }
        DecodedReport::HazardFeed(advisories) => {
            for (i, parsed) in advisories.iter().enumerate() {
                if i > 0 {
                    println!();
                }
                if let Some(a) = report_or_error(parsed) {
                    advisory(a);
                }
            }
        }
        DecodedReport::PilotReports(reports) => {
            for parsed in reports {
                if let Some(r) = report_or_error(parsed) {
                    pilot_report(r);
                }
            }
        }
    }
}

fn current(c: &CurrentConditions) {
    println!(
        "{} {}",
        c.report_type.as_deref().unwrap_or("Report"),
        c.station
    );
    println!("  Observed:    {}", field(&c.observation_time, ToString::to_string));
    println!("  Wind:        {}", field(&c.wind, |w| w.description.clone()));
    println!("  Visibility:  {}", field(&c.visibility, |v| v.description.clone()));
    println!("  Weather:     {}", format_weather_phenomena(&c.weather));
    for layer in &c.clouds {
        println!("  Clouds:      {}", layer.description);
    }
    println!("  Temperature: {}", field(&c.temperature, |t| t.description.clone()));
    println!("  Pressure:    {}", field(&c.pressure, |p| p.description.clone()));
    if let Some(remarks) = &c.remarks {
        println!("  Remarks:     {remarks}");
    }
    errors(&c.parsing_errors);
}

fn conditions(indent: &str, c: &ForecastConditions) {
    if !c.wind.is_absent() {
        println!("{indent}Wind:       {}", field(&c.wind, |w| w.description.clone()));
    }
    if !c.visibility.is_absent() {
        println!(
            "{indent}Visibility: {}",
            field(&c.visibility, |v| v.description.clone())
        );
    }
    if !c.weather.is_empty() {
        println!("{indent}Weather:    {}", format_weather_phenomena(&c.weather));
    }
    if c.no_significant_weather {
        println!("{indent}Weather:    No significant weather");
    }
    for layer in &c.clouds {
        println!("{indent}Clouds:     {}", layer.description);
    }
    for e in &c.parsing_errors {
        println!("{indent}! {e}");
    }
}

fn forecast(f: &Forecast) {
    println!(
        "Forecast for {}{} issued {}",
        f.station,
        f.amendment.as_deref().map(|a| format!(" ({a})")).unwrap_or_default(),
        f.issue_time
    );
    println!(
        "  {} ({} hours)",
        f.valid_period.description, f.valid_period.duration_hours
    );
    if let Some(base) = &f.base_forecast {
        conditions("    ", base);
    }
    for group in &f.change_groups {
        println!("  {}", group.description);
        conditions("    ", &group.conditions);
    }
}

fn advisory(a: &HazardAdvisory) {
    println!("{} ({:?})", a.hazard.label(), a.severity);
    println!("  Area:     {}", a.area);
    if !a.altitude.is_empty() {
        let ft = |v: Option<u32>| v.map_or("-".to_string(), |f| format!("{f} ft"));
        println!(
            "  Altitude: FL {} / base {} / top {}",
            ft(a.altitude.flight_level_ft),
            ft(a.altitude.base_ft),
            ft(a.altitude.top_ft)
        );
    }
    if let Some(validity) = &a.validity {
        println!("  Validity: {}", validity.text);
    }
    println!("  Movement: {}", a.movement.description());
    println!("  Outlook:  {:?}", a.outlook);
}

fn pilot_report(r: &PilotReport) {
    let station = r.station.as_deref().unwrap_or("?");
    let kind = r.report_type.as_deref().unwrap_or("PIREP");
    println!(
        "{station} {kind} {:?} at {}",
        r.urgency,
        field(&r.time, |t| t.description())
    );
    println!("  Location:   {}", field(&r.location, Clone::clone));
    println!(
        "  Altitude:   {}",
        field(&r.flight_level, |fl| format!("{} ft", fl.feet))
    );
    println!("  Aircraft:   {}", field(&r.aircraft_type, Clone::clone));
    println!(
        "  Turbulence: {}",
        field(&r.turbulence, |t| format!("{:?}", t.severity))
    );
    println!(
        "  Icing:      {}",
        field(&r.icing, |i| format!("{:?}", i.severity))
    );
    if let Some(remarks) = &r.remarks {
        println!("  Remarks:    {remarks}");
    }
}

pub fn classification(result: &ClassificationResult) {
    println!(
        "{} (score {}, confidence {:?})",
        result.category.as_str(),
        result.score,
        result.confidence
    );
    for line in &result.reasoning {
        println!("  - {line}");
    }
}

pub fn briefing(b: &StationBriefing) {
    println!("{}", b.summary_text);
    println!();
    classification(&b.classification);
    if let Some(forecast) = b.forecast.as_ref().and_then(Decoded::report) {
        println!();
        self::forecast(forecast);
    }
}

pub fn route(r: &RouteBriefing) {
    println!("== Departure: {} ==", r.departure.station);
    briefing(&r.departure);
    println!();
    println!("== Arrival: {} ==", r.arrival.station);
    briefing(&r.arrival);
}

pub fn hazards(advisories: &[ParsedHazardAdvisory], analysis: &HazardAnalysis) {
    for a in advisories.iter().filter_map(Decoded::report) {
        advisory(a);
        println!();
    }
    for (hazard, count) in &analysis.hazard_summary {
        println!("{}: {count}", hazard.label());
    }
    for line in analysis.flight_impacts.iter().chain(&analysis.recommendations) {
        println!("- {line}");
    }
}

pub fn digest(d: &PilotReportDigest) {
    for line in &d.summary {
        println!("- {line}");
    }
    if d.total_count == 0 {
        println!("No pilot reports");
        return;
    }
    for r in d.urgent_reports.iter().chain(&d.routine_reports) {
        println!();
        pilot_report(r);
    }
}
