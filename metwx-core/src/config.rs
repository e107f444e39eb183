use anyhow::{Context, Result, anyhow, ensure};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs, io,
    path::{Path, PathBuf},
};

use crate::classify::ClassifierThresholds;

pub const DEFAULT_BASE_URL: &str = "https://aviationweather.gov/api/data";
const CONFIG_FILE: &str = "config.toml";

/// Where and how raw reports are fetched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SourceConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Search radius for pilot reports around a station, in nautical miles.
    pub pilot_report_radius_nm: u32,
}

impl Default for SourceConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout_secs: 10,
            pilot_report_radius_nm: 100,
        }
    }
}

/// Top-level configuration stored on disk.
///
/// Example TOML:
/// ```toml
/// default_station = "KJFK"
///
/// [source]
/// timeout_secs = 15
///
/// [thresholds]
/// wind_severe_kt = 30.0
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct Config {
    pub default_station: Option<String>,
    pub source: SourceConfig,
    pub thresholds: ClassifierThresholds,
}

impl Config {
    pub fn default_station(&self) -> Result<&str> {
        self.default_station.as_deref().ok_or_else(|| {
            anyhow!(
                "No station given and no default station configured.\n\
                 Hint: pass a station (e.g. `metwx brief KJFK`) or run `metwx configure --station KJFK`."
            )
        })
    }

    pub fn set_default_station(&mut self, station: &str) {
        self.default_station = Some(station.trim().to_uppercase());
    }

    /// `config.toml` in the platform config directory for metwx.
    pub fn config_file_path() -> Result<PathBuf> {
        ProjectDirs::from("dev", "metwx", "metwx")
            .map(|dirs| dirs.config_dir().join(CONFIG_FILE))
            .context("No home directory available to hold the metwx config")
    }

    /// The user's config. A fresh install has no file and gets defaults.
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::config_file_path()?)
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        match fs::read_to_string(path) {
            Ok(contents) => Self::from_toml(&contents)
                .with_context(|| format!("Invalid metwx config in {}", path.display())),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(Self::default()),
            Err(err) => Err(err).with_context(|| format!("Cannot read {}", path.display())),
        }
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        let config: Self = toml::from_str(contents)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        ensure!(
            !self.source.base_url.trim().is_empty(),
            "source.base_url must not be empty"
        );
        ensure!(
            self.source.timeout_secs > 0,
            "source.timeout_secs must be at least 1"
        );
        Ok(())
    }

    /// Writes to the platform location and returns where it went.
    pub fn save(&self) -> Result<PathBuf> {
        let path = Self::config_file_path()?;
        self.save_to(&path)?;
        Ok(path)
    }

    pub fn save_to(&self, path: &Path) -> Result<()> {
        self.validate()?;
        if let Some(dir) = path.parent() {
            fs::create_dir_all(dir)
                .with_context(|| format!("Cannot create {}", dir.display()))?;
        }
        let toml = toml::to_string_pretty(self).context("Config is not representable as TOML")?;
        fs::write(path, toml).with_context(|| format!("Cannot write {}", path.display()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_station_errors_when_not_set() {
        let cfg = Config::default();
        let err = cfg.default_station().unwrap_err();

        let msg = err.to_string();
        assert!(msg.contains("no default station configured"));
        assert!(msg.contains("Hint: pass a station"));
    }

    #[test]
    fn set_default_station_normalizes() {
        let mut cfg = Config::default();
        cfg.set_default_station(" kjfk ");

        assert_eq!(cfg.default_station().expect("station set"), "KJFK");
    }

    #[test]
    fn partial_toml_keeps_defaults() {
        let cfg = Config::from_toml(
            r#"
default_station = "KSEA"

[source]
timeout_secs = 30

[thresholds]
wind_severe_kt = 30.0
"#,
        )
        .expect("parses");

        assert_eq!(cfg.default_station.as_deref(), Some("KSEA"));
        assert_eq!(cfg.source.timeout_secs, 30);
        assert_eq!(cfg.source.base_url, DEFAULT_BASE_URL);
        assert_eq!(cfg.source.pilot_report_radius_nm, 100);
        assert_eq!(cfg.thresholds.wind_severe_kt, 30.0);
        assert_eq!(cfg.thresholds.significant_score, 4);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(Config::from_toml("").expect("parses"), Config::default());
    }

    #[test]
    fn toml_roundtrip() {
        let mut cfg = Config::default();
        cfg.set_default_station("EGLL");
        cfg.source.pilot_report_radius_nm = 50;

        let text = toml::to_string_pretty(&cfg).expect("serializes");
        assert_eq!(Config::from_toml(&text).expect("parses"), cfg);
    }

    fn scratch_path(name: &str) -> PathBuf {
        std::env::temp_dir()
            .join(format!("metwx-config-{}-{name}", std::process::id()))
            .join(CONFIG_FILE)
    }

    #[test]
    fn missing_file_loads_defaults() {
        let path = scratch_path("missing");
        assert_eq!(Config::load_from(&path).expect("defaults"), Config::default());
    }

    #[test]
    fn saved_config_loads_back() {
        let path = scratch_path("saved");
        let mut cfg = Config::default();
        cfg.set_default_station("kden");
        cfg.source.timeout_secs = 20;

        cfg.save_to(&path).expect("saves");
        let loaded = Config::load_from(&path).expect("loads");
        let _ = fs::remove_dir_all(path.parent().expect("scratch dir"));

        assert_eq!(loaded, cfg);
    }

    #[test]
    fn invalid_values_are_rejected() {
        let err = Config::from_toml("[source]\ntimeout_secs = 0\n").unwrap_err();
        assert!(err.to_string().contains("timeout_secs"));

        let err = Config::from_toml("[source]\nbase_url = \" \"\n").unwrap_err();
        assert!(err.to_string().contains("base_url"));
    }

    #[test]
    fn unreadable_toml_names_the_file() {
        let path = scratch_path("broken");
        fs::create_dir_all(path.parent().expect("scratch dir")).expect("mkdir");
        fs::write(&path, "default_station = [").expect("write");

        let err = Config::load_from(&path).unwrap_err();
        let _ = fs::remove_dir_all(path.parent().expect("scratch dir"));

        assert!(format!("{err:#}").contains("Invalid metwx config in"));
    }
}
