//! Single-token field decoders shared by the report parsers.
//!
//! Every `decode_*` function takes one whitespace-delimited token and returns
//! `None` when the token is not of that kind. The matching `looks_like_*`
//! recognizers are looser: a token that looks like a field but does not decode
//! is reported by the parsers as malformed rather than unknown.

use regex::Regex;
use std::sync::LazyLock;

use crate::model::{
    CloudCover, CloudLayer, DirectionRange, Intensity, Phenomenon, Pressure, Temperature,
    TimeStamp, Visibility, VisibilityUnit, WeatherObservation, Wind, WindUnit,
};

/// Weather phenomenon codes, descriptors first.
static PHENOMENA: &[Phenomenon] = &[
    Phenomenon { code: "MI", description: "Shallow" },
    Phenomenon { code: "PR", description: "Partial" },
    Phenomenon { code: "BC", description: "Patches" },
    Phenomenon { code: "DR", description: "Drifting" },
    Phenomenon { code: "BL", description: "Blowing" },
    Phenomenon { code: "SH", description: "Showers" },
    Phenomenon { code: "TS", description: "Thunderstorm" },
    Phenomenon { code: "FZ", description: "Freezing" },
    Phenomenon { code: "DZ", description: "Drizzle" },
    Phenomenon { code: "RA", description: "Rain" },
    Phenomenon { code: "SN", description: "Snow" },
    Phenomenon { code: "SG", description: "Snow Grains" },
    Phenomenon { code: "IC", description: "Ice Crystals" },
    Phenomenon { code: "PL", description: "Ice Pellets" },
    Phenomenon { code: "GR", description: "Hail" },
    Phenomenon { code: "GS", description: "Small Hail/Snow Pellets" },
    Phenomenon { code: "UP", description: "Unknown Precipitation" },
    Phenomenon { code: "BR", description: "Mist" },
    Phenomenon { code: "FG", description: "Fog" },
    Phenomenon { code: "FU", description: "Smoke" },
    Phenomenon { code: "VA", description: "Volcanic Ash" },
    Phenomenon { code: "DU", description: "Dust" },
    Phenomenon { code: "SA", description: "Sand" },
    Phenomenon { code: "HZ", description: "Haze" },
    Phenomenon { code: "PY", description: "Spray" },
    Phenomenon { code: "PO", description: "Dust/Sand Whirls" },
    Phenomenon { code: "SQ", description: "Squalls" },
    Phenomenon { code: "FC", description: "Funnel Cloud/Tornado" },
    Phenomenon { code: "SS", description: "Sandstorm" },
    Phenomenon { code: "DS", description: "Duststorm" },
];

static CLOUD_COVERS: &[(&str, CloudCover)] = &[
    ("SKC", CloudCover::Clear),
    ("CLR", CloudCover::Clear),
    ("FEW", CloudCover::Few),
    ("SCT", CloudCover::Scattered),
    ("BKN", CloudCover::Broken),
    ("OVC", CloudCover::Overcast),
    ("VV", CloudCover::VerticalVisibility),
];

static TIME: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{2})(\d{2})(\d{2})Z$").expect("valid time pattern"));
static TIME_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{6}Z$").expect("valid time shape"));
static WIND: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\d{3}|VRB)(\d{2,3})(?:G(\d{2,3}))?(KT|MPS)$").expect("valid wind pattern")
});
static WIND_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3}|VRB)\S*(KT|MPS)$").expect("valid wind shape"));
static VARIABLE_DIRECTION: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(\d{3})V(\d{3})$").expect("valid variation pattern"));
static VIS_MILES: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^([PM])?(\d{1,2})(?:/(\d{1,2}))?SM$").expect("valid visibility pattern")
});
static VIS_METERS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}$").expect("valid metric visibility pattern"));
static CLOUD: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(SKC|CLR|FEW|SCT|BKN|OVC|VV)(\d{3})?(CB|TCU)?$").expect("valid cloud pattern")
});
static CLOUD_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(SKC|CLR|FEW|SCT|BKN|OVC|VV)").expect("valid cloud shape"));
static TEMPERATURE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(M?)(\d{2})/(M?)(\d{2})$").expect("valid temperature pattern")
});
static TEMPERATURE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^M?\d{1,2}/(M?\d{0,2})?$").expect("valid temperature shape"));
static PRESSURE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([AQ])(\d{4})$").expect("valid pressure pattern"));
static PRESSURE_SHAPE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[AQ][\d/]{4}$").expect("valid pressure shape"));

const HPA_PER_INHG: f64 = 33.8639;

pub fn phenomenon(code: &str) -> Option<Phenomenon> {
    PHENOMENA.iter().find(|p| p.code == code).copied()
}

/// `DDHHMMZ`.
pub fn decode_time(token: &str) -> Option<TimeStamp> {
    let caps = TIME.captures(token)?;
    let day: u8 = caps[1].parse().ok()?;
    let hour: u8 = caps[2].parse().ok()?;
    let minute: u8 = caps[3].parse().ok()?;

    if !(1..=31).contains(&day) || hour > 23 || minute > 59 {
        return None;
    }

    Some(TimeStamp { day, hour, minute })
}

pub fn looks_like_time(token: &str) -> bool {
    TIME_SHAPE.is_match(token)
}

/// `(DDD|VRB)SS[S](Gg[g])(KT|MPS)`.
pub fn decode_wind(token: &str) -> Option<Wind> {
    let caps = WIND.captures(token)?;

    let direction = match &caps[1] {
        "VRB" => None,
        digits => Some(digits.parse::<u16>().ok().filter(|d| *d <= 360)?),
    };
    let speed: u16 = caps[2].parse().ok()?;
    let gust = match caps.get(3) {
        Some(g) => Some(g.as_str().parse::<u16>().ok()?),
        None => None,
    };
    let unit = if &caps[4] == "KT" {
        WindUnit::Knots
    } else {
        WindUnit::MetersPerSecond
    };

    let mut description = match direction {
        Some(0) if speed == 0 => "Calm".to_string(),
        Some(dir) => format!("From {dir:03}° at {speed} {}", unit.as_str()),
        None => format!("Variable direction at {speed} {}", unit.as_str()),
    };
    if let Some(g) = gust {
        description.push_str(&format!(", gusting to {g} {}", unit.as_str()));
    }

    Some(Wind {
        direction_degrees: direction,
        direction_variable: direction.is_none(),
        speed,
        gust,
        unit,
        variable_range: None,
        description,
    })
}

pub fn looks_like_wind(token: &str) -> bool {
    WIND_SHAPE.is_match(token)
}

/// `dddVddd` sector that may follow the wind group.
pub fn decode_variable_direction(token: &str) -> Option<DirectionRange> {
    let caps = VARIABLE_DIRECTION.captures(token)?;
    let from: u16 = caps[1].parse().ok()?;
    let to: u16 = caps[2].parse().ok()?;
    (from <= 360 && to <= 360).then_some(DirectionRange { from, to })
}

/// Statute miles (`10SM`, `1/2SM`, `P6SM`, `M1/4SM`) or four-digit meters.
pub fn decode_visibility(token: &str) -> Option<Visibility> {
    if VIS_METERS.is_match(token) {
        let distance: f64 = token.parse().ok()?;
        return Some(Visibility {
            distance,
            unit: VisibilityUnit::Meters,
            greater_than: false,
            less_than: false,
            description: format!("{distance} meters"),
        });
    }

    let caps = VIS_MILES.captures(token)?;
    let marker = caps.get(1).map(|m| m.as_str());
    let numerator: f64 = caps[2].parse().ok()?;
    let distance = match caps.get(3) {
        Some(den) => {
            let den: f64 = den.as_str().parse().ok()?;
            if den == 0.0 {
                return None;
            }
            numerator / den
        }
        None => numerator,
    };

    let body = token.trim_start_matches(['P', 'M']).trim_end_matches("SM");
    let (greater_than, less_than, description) = match marker {
        Some("P") => (true, false, format!("Greater than {body} statute miles")),
        Some(_) => (false, true, format!("Less than {body} statute miles")),
        None => (false, false, format!("{body} statute miles")),
    };

    Some(Visibility {
        distance,
        unit: VisibilityUnit::StatuteMiles,
        greater_than,
        less_than,
        description,
    })
}

/// Mixed-number statute miles split over two tokens, e.g. `1 1/2SM`.
pub fn decode_split_visibility(whole: &str, fraction: &str) -> Option<Visibility> {
    if whole.len() != 1 || !whole.chars().all(|c| c.is_ascii_digit()) || !fraction.contains('/') {
        return None;
    }

    let part = decode_visibility(fraction)?;
    if part.greater_than || part.less_than || part.unit != VisibilityUnit::StatuteMiles {
        return None;
    }

    let whole: f64 = whole.parse().ok()?;
    let body = fraction.trim_end_matches("SM");
    Some(Visibility {
        distance: whole + part.distance,
        description: format!("{whole} {body} statute miles"),
        ..part
    })
}

pub fn looks_like_visibility(token: &str) -> bool {
    token.ends_with("SM") || VIS_METERS.is_match(token)
}

/// Intensity/vicinity prefix followed by phenomenon codes, e.g. `+TSRA`, `VCSH`.
///
/// A token is a weather group only when the text after the prefix is purely
/// alphabetic and begins with a known code. Inside the group, unknown
/// characters are skipped.
pub fn decode_weather(token: &str) -> Option<WeatherObservation> {
    let (intensity, rest) = if let Some(rest) = token.strip_prefix('-') {
        (Intensity::Light, rest)
    } else if let Some(rest) = token.strip_prefix('+') {
        (Intensity::Heavy, rest)
    } else {
        (Intensity::Moderate, token)
    };
    let (vicinity, body) = match rest.strip_prefix("VC") {
        Some(body) => (true, body),
        None => (false, rest),
    };

    if body.is_empty() || !body.chars().all(|c| c.is_ascii_uppercase()) {
        return None;
    }
    phenomenon(body.get(..2)?)?;

    let mut phenomena = Vec::new();
    let mut i = 0;
    while i < body.len() {
        let matched = [2, 1]
            .into_iter()
            .find_map(|len| body.get(i..i + len).and_then(phenomenon).map(|p| (p, len)));

        match matched {
            Some((p, len)) => {
                phenomena.push(p);
                i += len;
            }
            None => i += 1,
        }
    }

    let words: Vec<String> = phenomena.iter().map(|p| p.description.to_lowercase()).collect();
    let mut description = format!("{} {}", intensity.title(), words.join(" "));
    if vicinity {
        description.push_str(" in the vicinity");
    }

    Some(WeatherObservation {
        raw: token.to_string(),
        intensity,
        vicinity,
        phenomena,
        description,
    })
}

/// Cover code plus three-digit height in hundreds of feet, e.g. `BKN005`.
pub fn decode_cloud(token: &str) -> Option<CloudLayer> {
    let caps = CLOUD.captures(token)?;
    let (code, cover) = CLOUD_COVERS
        .iter()
        .find(|(code, _)| *code == &caps[1])
        .copied()?;

    let height_feet = match caps.get(2) {
        Some(h) => Some(h.as_str().parse::<u32>().ok()? * 100),
        None if cover == CloudCover::Clear => None,
        None => return None,
    };
    let convective = caps.get(3).map(|c| if c.as_str() == "CB" { "CB" } else { "TCU" });

    let mut description = match height_feet {
        Some(h) => format!("{} at {} feet", cover.label(), group_thousands(h)),
        None => "Sky clear".to_string(),
    };
    if let Some(c) = convective {
        description.push_str(&format!(" ({c})"));
    }

    Some(CloudLayer {
        cover,
        code,
        height_feet,
        convective,
        description,
    })
}

pub fn looks_like_cloud(token: &str) -> bool {
    CLOUD_SHAPE.is_match(token)
}

/// `TT/DD` with `M` marking negative values.
pub fn decode_temperature(token: &str) -> Option<Temperature> {
    let caps = TEMPERATURE.captures(token)?;
    let signed = |sign: &str, digits: &str| -> Option<i32> {
        let value: i32 = digits.parse().ok()?;
        Some(if sign == "M" { -value } else { value })
    };

    let temperature_celsius = signed(&caps[1], &caps[2])?;
    let dewpoint_celsius = signed(&caps[3], &caps[4])?;
    let temperature_fahrenheit = celsius_to_fahrenheit(temperature_celsius);
    let dewpoint_fahrenheit = celsius_to_fahrenheit(dewpoint_celsius);

    Some(Temperature {
        temperature_celsius,
        dewpoint_celsius,
        temperature_fahrenheit,
        dewpoint_fahrenheit,
        description: format!(
            "{temperature_celsius}°C ({temperature_fahrenheit}°F), dewpoint {dewpoint_celsius}°C ({dewpoint_fahrenheit}°F)"
        ),
    })
}

pub fn looks_like_temperature(token: &str) -> bool {
    TEMPERATURE_SHAPE.is_match(token)
}

/// Altimeter `Annnn` (hundredths of inHg) or QNH `Qnnnn` (hPa).
pub fn decode_pressure(token: &str) -> Option<Pressure> {
    let caps = PRESSURE.captures(token)?;
    let value: f64 = caps[2].parse().ok()?;

    let (inches_hg, hectopascals) = if &caps[1] == "A" {
        let inches = value / 100.0;
        (inches, round_to(inches * HPA_PER_INHG, 1))
    } else {
        (round_to(value / HPA_PER_INHG, 2), value)
    };

    Some(Pressure {
        inches_hg,
        hectopascals,
        description: format!("{inches_hg:.2} inHg ({hectopascals:.1} hPa)"),
    })
}

pub fn looks_like_pressure(token: &str) -> bool {
    PRESSURE_SHAPE.is_match(token)
}

pub fn celsius_to_fahrenheit(celsius: i32) -> i32 {
    (f64::from(celsius) * 9.0 / 5.0 + 32.0).round() as i32
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

pub(crate) fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn time_group() {
        let ts = decode_time("261951Z").expect("valid time");
        assert_eq!((ts.day, ts.hour, ts.minute), (26, 19, 51));
        assert_eq!(ts.to_string(), "Day 26, 19:51 UTC");

        assert!(decode_time("262551Z").is_none());
        assert!(looks_like_time("262551Z"));
        assert!(!looks_like_time("2619Z"));
    }

    #[test]
    fn wind_steady() {
        let wind = decode_wind("26008KT").expect("valid wind");
        assert_eq!(wind.direction_degrees, Some(260));
        assert_eq!(wind.speed, 8);
        assert_eq!(wind.gust, None);
        assert_eq!(wind.unit, WindUnit::Knots);
        assert!(!wind.direction_variable);
    }

    #[test]
    fn wind_with_gust() {
        let wind = decode_wind("09014G25KT").expect("valid wind");
        assert_eq!(wind.direction_degrees, Some(90));
        assert_eq!(wind.speed, 14);
        assert_eq!(wind.gust, Some(25));
        assert_eq!(wind.unit, WindUnit::Knots);
        assert_eq!(wind.description, "From 090° at 14 knots, gusting to 25 knots");
    }

    #[test]
    fn wind_variable_and_metric() {
        let wind = decode_wind("VRB03MPS").expect("valid wind");
        assert_eq!(wind.direction_degrees, None);
        assert!(wind.direction_variable);
        assert_eq!(wind.unit, WindUnit::MetersPerSecond);
        assert!((wind.speed_knots() - 5.83).abs() < 0.01);
    }

    #[test]
    fn wind_rejects_partial_matches() {
        assert!(decode_wind("2600KT").is_none());
        assert!(looks_like_wind("2600KT"));
        assert!(decode_wind("26008KTS").is_none());
        assert!(decode_wind("A2995").is_none());
    }

    #[test]
    fn visibility_sentinels() {
        let vis = decode_visibility("P6SM").expect("valid visibility");
        assert_eq!(vis.distance, 6.0);
        assert!(vis.greater_than);
        assert_eq!(vis.unit, VisibilityUnit::StatuteMiles);

        let vis = decode_visibility("M1/4SM").expect("valid visibility");
        assert_eq!(vis.distance, 0.25);
        assert!(vis.less_than);
    }

    #[test]
    fn visibility_fractions_and_meters() {
        assert_eq!(decode_visibility("1/2SM").map(|v| v.distance), Some(0.5));
        assert_eq!(decode_visibility("10SM").map(|v| v.distance), Some(10.0));

        let metric = decode_visibility("0800").expect("valid metric visibility");
        assert_eq!(metric.unit, VisibilityUnit::Meters);
        assert_eq!(metric.distance, 800.0);

        assert!(decode_visibility("1/0SM").is_none());
    }

    #[test]
    fn visibility_split_over_two_tokens() {
        let vis = decode_split_visibility("1", "1/2SM").expect("valid mixed number");
        assert_eq!(vis.distance, 1.5);
        assert_eq!(vis.description, "1 1/2 statute miles");

        assert!(decode_split_visibility("1", "2SM").is_none());
        assert!(decode_split_visibility("12", "1/2SM").is_none());
    }

    #[test]
    fn weather_heavy_thunderstorm_rain() {
        let wx = decode_weather("+TSRA").expect("valid weather");
        assert_eq!(wx.intensity, Intensity::Heavy);
        let codes: Vec<_> = wx.phenomena.iter().map(|p| p.description).collect();
        assert_eq!(codes, ["Thunderstorm", "Rain"]);
        assert_eq!(wx.description, "Heavy thunderstorm rain");
    }

    #[test]
    fn weather_vicinity_and_light() {
        let wx = decode_weather("VCSH").expect("valid weather");
        assert!(wx.vicinity);
        assert_eq!(wx.intensity, Intensity::Moderate);
        assert!(wx.has_code("SH"));

        let wx = decode_weather("-FZRA").expect("valid weather");
        assert_eq!(wx.intensity, Intensity::Light);
        assert!(wx.has_code("FZ") && wx.has_code("RA"));
    }

    #[test]
    fn weather_skips_unknown_characters() {
        let wx = decode_weather("RAXSN").expect("leading code present");
        let codes: Vec<_> = wx.phenomena.iter().map(|p| p.code).collect();
        assert_eq!(codes, ["RA", "SN"]);
    }

    #[test]
    fn weather_rejects_other_groups() {
        for token in ["RMK", "TEMPO", "AUTO", "NOSIG", "OVC010", "SKC", "BKN", "-", "VC"] {
            assert!(decode_weather(token).is_none(), "{token} should not be weather");
        }
    }

    #[test]
    fn cloud_layers() {
        let layer = decode_cloud("BKN005").expect("valid cloud");
        assert_eq!(layer.cover, CloudCover::Broken);
        assert_eq!(layer.height_feet, Some(500));
        assert_eq!(layer.ceiling_feet(), Some(500));

        let layer = decode_cloud("FEW250").expect("valid cloud");
        assert_eq!(layer.description, "Few at 25,000 feet");
        assert_eq!(layer.ceiling_feet(), None);

        let layer = decode_cloud("OVC010CB").expect("valid cloud");
        assert_eq!(layer.convective, Some("CB"));

        let layer = decode_cloud("VV002").expect("valid cloud");
        assert_eq!(layer.cover, CloudCover::VerticalVisibility);
        assert_eq!(layer.height_feet, Some(200));

        let clear = decode_cloud("CLR").expect("valid clear sky");
        assert_eq!(clear.cover, CloudCover::Clear);
        assert_eq!(clear.height_feet, None);
    }

    #[test]
    fn cloud_malformed_height() {
        assert!(decode_cloud("BKN///").is_none());
        assert!(looks_like_cloud("BKN///"));
        assert!(decode_cloud("OVC").is_none());
    }

    #[test]
    fn temperature_below_zero() {
        let t = decode_temperature("M05/M12").expect("valid temperature");
        assert_eq!(t.temperature_celsius, -5);
        assert_eq!(t.dewpoint_celsius, -12);
        assert_eq!(t.temperature_fahrenheit, 23);
        assert_eq!(t.dewpoint_fahrenheit, 10);
    }

    #[test]
    fn temperature_missing_dewpoint_is_malformed() {
        assert!(decode_temperature("15/").is_none());
        assert!(looks_like_temperature("15/"));
        assert!(!looks_like_temperature("1/2SM"));
        assert!(!looks_like_temperature("M1/4SM"));
    }

    #[test]
    fn pressure_altimeter() {
        let p = decode_pressure("A2995").expect("valid altimeter");
        assert!((p.inches_hg - 29.95).abs() < 1e-9);
        assert!((p.hectopascals - 1014.2).abs() < 0.05);
    }

    #[test]
    fn pressure_qnh() {
        let p = decode_pressure("Q1013").expect("valid qnh");
        assert_eq!(p.hectopascals, 1013.0);
        assert!((p.inches_hg - 29.91).abs() < 1e-9);
    }

    #[test]
    fn thousands_grouping() {
        assert_eq!(group_thousands(500), "500");
        assert_eq!(group_thousands(25000), "25,000");
        assert_eq!(group_thousands(1200000), "1,200,000");
    }
}
