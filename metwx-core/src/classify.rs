//! Severity scoring of decoded conditions.
//!
//! Five independent factors (wind, visibility, weather, ceiling,
//! temperature) are scored and summed; an optional forecast adds one point
//! when any change group shows deterioration. The total is bucketed into a
//! category by fixed thresholds.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::current::CurrentConditions;
use crate::fields::group_thousands;
use crate::forecast::{ChangeGroup, Forecast};
use crate::model::{Intensity, VisibilityUnit, WeatherObservation};

const SEVERE_CODES: &[&str] = &["TS", "GR", "FC", "SS", "SQ"];
const SIGNIFICANT_CODES: &[&str] = &["RA", "SN", "FG", "BR", "FZ", "SH", "IC", "PL"];
const TREND_SEVERE_CODES: &[&str] = &["TS", "GR", "FC"];

/// Scoring thresholds. Units: knots, statute miles, meters, feet, Celsius.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClassifierThresholds {
    pub wind_minor_kt: f64,
    pub wind_significant_kt: f64,
    pub wind_severe_kt: f64,
    pub gust_significant_kt: f64,
    pub gust_severe_kt: f64,
    pub visibility_severe_sm: f64,
    pub visibility_significant_sm: f64,
    pub visibility_severe_m: f64,
    pub visibility_significant_m: f64,
    pub ceiling_severe_ft: u32,
    pub ceiling_significant_ft: u32,
    pub ceiling_minor_ft: u32,
    pub temperature_hot_c: i32,
    pub temperature_cold_c: i32,
    pub severe_score: u32,
    pub significant_score: u32,
}

impl Default for ClassifierThresholds {
    fn default() -> Self {
        Self {
            wind_minor_kt: 10.0,
            wind_significant_kt: 15.0,
            wind_severe_kt: 25.0,
            gust_significant_kt: 20.0,
            gust_severe_kt: 35.0,
            visibility_severe_sm: 1.0,
            visibility_significant_sm: 3.0,
            visibility_severe_m: 1600.0,
            visibility_significant_m: 5000.0,
            ceiling_severe_ft: 500,
            ceiling_significant_ft: 1000,
            ceiling_minor_ft: 3000,
            temperature_hot_c: 40,
            temperature_cold_c: -20,
            severe_score: 8,
            significant_score: 4,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Category {
    Clear,
    Significant,
    Severe,
    Unknown,
}

impl Category {
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Clear => "Clear",
            Category::Significant => "Significant",
            Category::Severe => "Severe",
            Category::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Confidence {
    High,
    Low,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Serialize)]
pub enum Impact {
    #[default]
    None,
    Minor,
    Significant,
    Severe,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct FactorAssessment {
    pub score: u32,
    pub impact: Impact,
    pub reasons: Vec<String>,
}

impl FactorAssessment {
    fn add(&mut self, points: u32, impact: Impact) {
        self.score += points;
        self.impact = self.impact.max(impact);
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct Factors {
    pub wind: FactorAssessment,
    pub visibility: FactorAssessment,
    pub weather: FactorAssessment,
    pub clouds: FactorAssessment,
    pub temperature: FactorAssessment,
}

impl Factors {
    fn iter(&self) -> impl Iterator<Item = &FactorAssessment> {
        [
            &self.wind,
            &self.visibility,
            &self.weather,
            &self.clouds,
            &self.temperature,
        ]
        .into_iter()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClassificationResult {
    pub category: Category,
    pub score: u32,
    pub confidence: Confidence,
    pub reasoning: Vec<String>,
    pub factors: Factors,
}

/// Score decoded conditions with the default thresholds.
pub fn classify(
    current: Option<&CurrentConditions>,
    forecast: Option<&Forecast>,
) -> ClassificationResult {
    Classifier::default().classify(current, forecast)
}

#[derive(Debug, Clone, Default)]
pub struct Classifier {
    thresholds: ClassifierThresholds,
}

impl Classifier {
    pub fn new(thresholds: ClassifierThresholds) -> Self {
        Self { thresholds }
    }

    pub fn thresholds(&self) -> &ClassifierThresholds {
        &self.thresholds
    }

    pub fn classify(
        &self,
        current: Option<&CurrentConditions>,
        forecast: Option<&Forecast>,
    ) -> ClassificationResult {
        let Some(current) = current else {
            return ClassificationResult {
                category: Category::Unknown,
                score: 0,
                confidence: Confidence::Low,
                reasoning: vec!["Unable to classify due to parsing errors".to_string()],
                factors: Factors::default(),
            };
        };

        let factors = Factors {
            wind: self.wind(current),
            visibility: self.visibility(current),
            weather: self.weather(&current.weather),
            clouds: self.clouds(current),
            temperature: self.temperature(current),
        };

        let mut score: u32 = factors.iter().map(|f| f.score).sum();
        let mut reasoning: Vec<String> = factors
            .iter()
            .flat_map(|f| f.reasons.iter().cloned())
            .collect();

        if let Some(forecast) = forecast {
            let trends = self.trends(forecast);
            if !trends.is_empty() {
                score += 1;
                reasoning.extend(trends);
            }
        }

        let category = self.category(score);
        if reasoning.is_empty() {
            reasoning.push(format!(
                "Weather conditions are {} with minimal impact on flight operations",
                category.as_str().to_lowercase()
            ));
        }

        debug!(station = %current.station, score, category = category.as_str(), "classified");

        ClassificationResult {
            category,
            score,
            confidence: Confidence::High,
            reasoning,
            factors,
        }
    }

    fn category(&self, score: u32) -> Category {
        if score >= self.thresholds.severe_score {
            Category::Severe
        } else if score >= self.thresholds.significant_score {
            Category::Significant
        } else {
            Category::Clear
        }
    }

    fn wind(&self, current: &CurrentConditions) -> FactorAssessment {
        let t = &self.thresholds;
        let mut factor = FactorAssessment::default();
        let Some(wind) = current.wind.present() else {
            return factor;
        };

        let speed = wind.speed_knots();
        let mut reason = if speed >= t.wind_severe_kt {
            factor.add(3, Impact::Severe);
            Some(format!("Strong winds at {speed:.0} knots"))
        } else if speed >= t.wind_significant_kt {
            factor.add(2, Impact::Significant);
            Some(format!("Moderate winds at {speed:.0} knots"))
        } else if speed >= t.wind_minor_kt {
            factor.add(1, Impact::Minor);
            Some(format!("Light winds at {speed:.0} knots"))
        } else {
            None
        };

        if let Some(gust) = wind.gust_knots() {
            if gust >= t.gust_severe_kt {
                factor.add(3, Impact::Severe);
                reason = Some(format!("Strong gusts to {gust:.0} knots"));
            } else if gust >= t.gust_significant_kt {
                factor.add(2, Impact::Significant);
                reason = Some(format!("Moderate gusts to {gust:.0} knots"));
            } else {
                factor.add(1, Impact::None);
            }
        }

        if wind.direction_variable {
            factor.add(1, Impact::None);
            reason.get_or_insert_with(|| "Variable wind direction".to_string());
        }

        factor.reasons.extend(reason);
        factor
    }

    fn visibility(&self, current: &CurrentConditions) -> FactorAssessment {
        let t = &self.thresholds;
        let mut factor = FactorAssessment::default();
        let Some(vis) = current.visibility.present() else {
            return factor;
        };

        let (severe, significant, unit) = match vis.unit {
            VisibilityUnit::Meters => (t.visibility_severe_m, t.visibility_significant_m, "meters"),
            VisibilityUnit::StatuteMiles => (
                t.visibility_severe_sm,
                t.visibility_significant_sm,
                "statute miles",
            ),
        };

        let distance = vis.distance;
        if distance <= severe {
            factor.add(4, Impact::Severe);
            factor
                .reasons
                .push(format!("Very low visibility: {distance} {unit}"));
        } else if distance <= significant {
            factor.add(2, Impact::Significant);
            factor
                .reasons
                .push(format!("Reduced visibility: {distance} {unit}"));
        }
        factor
    }

    fn weather(&self, observations: &[WeatherObservation]) -> FactorAssessment {
        let mut factor = FactorAssessment::default();

        for wx in observations {
            for p in &wx.phenomena {
                let desc = p.description.to_lowercase();
                if SEVERE_CODES.contains(&p.code) {
                    factor.add(4, Impact::Severe);
                    factor.reasons.push(format!("Severe weather: {desc}"));
                } else if SIGNIFICANT_CODES.contains(&p.code) {
                    if wx.intensity == Intensity::Heavy {
                        factor.add(3, Impact::Severe);
                        factor.reasons.push(format!("Heavy {desc}"));
                    } else {
                        factor.add(2, Impact::Significant);
                        factor
                            .reasons
                            .push(format!("{} {desc}", wx.intensity.title()));
                    }
                }
            }

            if wx.intensity == Intensity::Heavy && factor.score == 0 {
                factor.add(2, Impact::Significant);
                factor
                    .reasons
                    .push("Heavy precipitation intensity".to_string());
            }
        }
        factor
    }

    fn clouds(&self, current: &CurrentConditions) -> FactorAssessment {
        let t = &self.thresholds;
        let mut factor = FactorAssessment::default();
        let Some((layer, height)) = current
            .clouds
            .iter()
            .filter_map(|c| Some((c, c.ceiling_feet()?)))
            .min_by_key(|(_, height)| *height)
        else {
            return factor;
        };

        let label = layer.cover.label().to_lowercase();
        let feet = group_thousands(height);
        if height <= t.ceiling_severe_ft {
            factor.add(3, Impact::Severe);
            factor
                .reasons
                .push(format!("Very low ceiling: {label} at {feet} feet"));
        } else if height <= t.ceiling_significant_ft {
            factor.add(2, Impact::Significant);
            factor
                .reasons
                .push(format!("Low ceiling: {label} at {feet} feet"));
        } else if height <= t.ceiling_minor_ft {
            factor.add(1, Impact::Minor);
            factor
                .reasons
                .push(format!("Moderate ceiling: {label} at {feet} feet"));
        }
        factor
    }

    fn temperature(&self, current: &CurrentConditions) -> FactorAssessment {
        let t = &self.thresholds;
        let mut factor = FactorAssessment::default();
        let Some(temp) = current.temperature.present() else {
            return factor;
        };

        let c = temp.temperature_celsius;
        if c >= t.temperature_hot_c {
            factor.add(2, Impact::Significant);
            factor.reasons.push(format!("Very high temperature: {c}°C"));
        } else if c <= t.temperature_cold_c {
            factor.add(2, Impact::Significant);
            factor.reasons.push(format!("Very low temperature: {c}°C"));
        }
        factor
    }

    /// Narrative lines for change groups that show deterioration.
    fn trends(&self, forecast: &Forecast) -> Vec<String> {
        forecast
            .change_groups
            .iter()
            .flat_map(|group| self.group_trends(group))
            .collect()
    }

    fn group_trends(&self, group: &ChangeGroup) -> Vec<String> {
        let t = &self.thresholds;
        let label = group.kind.label().to_lowercase();
        let conditions = &group.conditions;
        let mut lines = Vec::new();

        if conditions
            .visibility
            .present()
            .is_some_and(|v| v.statute_miles() <= t.visibility_significant_sm)
        {
            lines.push(format!("Forecast shows deteriorating visibility ({label})"));
        }

        for wx in &conditions.weather {
            if TREND_SEVERE_CODES.iter().any(|code| wx.has_code(code)) {
                lines.push(format!("Forecast shows severe weather ({label})"));
            }
        }

        for layer in &conditions.clouds {
            if layer
                .ceiling_feet()
                .is_some_and(|h| h <= t.ceiling_significant_ft)
            {
                lines.push(format!("Forecast shows low ceiling ({label})"));
            }
        }

        lines
    }
}
