use std::{fmt::Display, path::Path};

use ansi_term::Colour;
use anyhow::{Context, Result};
use clap::ValueEnum;
use serde::{Deserialize, Serialize};
use tracing::warn;

pub const CONFIG_FILE: &str = "config.json";

/// Presentation settings. Loaded once per invocation and passed into the
/// render calls explicitly, there is no ambient theme state.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub theme: ChartTheme,
    pub unit: DurationUnit,
}

impl AppConfig {
    /// Reads the config file, falling back to defaults when it is missing.
    /// A file that no longer parses is reported and ignored rather than
    /// blocking the diary.
    pub fn load(application_data_path: &Path) -> AppConfig {
        let path = application_data_path.join(CONFIG_FILE);
        let Ok(content) = std::fs::read_to_string(&path) else {
            return AppConfig::default();
        };
        match serde_json::from_str(&content) {
            Ok(config) => config,
            Err(e) => {
                warn!("Ignoring malformed config at {path:?}: {e}");
                AppConfig::default()
            }
        }
    }

    pub fn save(&self, application_data_path: &Path) -> Result<()> {
        let path = application_data_path.join(CONFIG_FILE);
        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(&path, content).with_context(|| format!("Failed to write {path:?}"))
    }
}

/// Color the chart bars are painted with. Green matches the default of
/// the diary this replaced.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum ChartTheme {
    #[default]
    Green,
    Blue,
    Purple,
    Red,
    Yellow,
    Cyan,
}

impl ChartTheme {
    pub fn colour(self) -> Colour {
        match self {
            ChartTheme::Green => Colour::Green,
            ChartTheme::Blue => Colour::Blue,
            ChartTheme::Purple => Colour::Purple,
            ChartTheme::Red => Colour::Red,
            ChartTheme::Yellow => Colour::Yellow,
            ChartTheme::Cyan => Colour::Cyan,
        }
    }
}

impl Display for ChartTheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ChartTheme::Green => write!(f, "green"),
            ChartTheme::Blue => write!(f, "blue"),
            ChartTheme::Purple => write!(f, "purple"),
            ChartTheme::Red => write!(f, "red"),
            ChartTheme::Yellow => write!(f, "yellow"),
            ChartTheme::Cyan => write!(f, "cyan"),
        }
    }
}

/// Unit `add --duration` is entered in and durations are displayed in.
/// Storage is always minutes regardless of this setting.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DurationUnit {
    #[default]
    Minutes,
    Hours,
}

impl DurationUnit {
    pub fn to_minutes(self, value: f64) -> f64 {
        match self {
            DurationUnit::Minutes => value,
            DurationUnit::Hours => value * 60.0,
        }
    }
}

impl Display for DurationUnit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DurationUnit::Minutes => write!(f, "minutes"),
            DurationUnit::Hours => write!(f, "hours"),
        }
    }
}
