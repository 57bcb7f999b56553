use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::{debug, info};
use serde::Deserialize;

use crate::adapt::{AdaptationMethod, AdaptationSettings};
use crate::cgats::ExportOptions;
use crate::colorimetry::astm::{Illuminant, Observer, WeightingKey};
use crate::data::model::MeasurementMode;

/// Tool configuration loaded from a YAML file.
#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct Settings {
    /// Weighting-table dataset (.csv, .json or .parquet).  When absent the
    /// synthetic tables are used.
    pub reference_tables: Option<PathBuf>,

    pub defaults: MeasurementDefaults,

    pub adaptation: AdaptationConfig,

    pub cgats: CgatsConfig,
}

/// Default illuminant/observer/table and measurement mode.
#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct MeasurementDefaults {
    pub illuminant: Illuminant,
    pub observer: Observer,
    pub table: u32,
    pub mode: MeasurementMode,
}

impl Default for MeasurementDefaults {
    fn default() -> Self {
        Self {
            illuminant: Illuminant::D50,
            observer: Observer::TwoDegree,
            table: 5,
            mode: MeasurementMode::M1,
        }
    }
}

#[derive(Debug, Deserialize, Clone, PartialEq, Default)]
#[serde(default)]
pub struct AdaptationConfig {
    pub method: AdaptationMethod,
}

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(default)]
pub struct CgatsConfig {
    pub originator: String,
    pub descriptor: String,
}

impl Default for CgatsConfig {
    fn default() -> Self {
        let options = ExportOptions::default();
        Self {
            originator: options.originator,
            descriptor: options.descriptor,
        }
    }
}

impl Settings {
    /// Load from `path`, or return defaults when no path is given.
    ///
    /// An explicitly given file that is missing or malformed is an error.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            debug!("no config file given, using defaults");
            return Ok(Self::default());
        };
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let settings: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("parsing config {}", path.display()))?;
        info!(
            "loaded configuration from {} (defaults {})",
            path.display(),
            settings.weighting_key()
        );
        Ok(settings)
    }

    pub fn weighting_key(&self) -> WeightingKey {
        WeightingKey::new(
            self.defaults.illuminant,
            self.defaults.observer,
            self.defaults.table,
        )
    }

    pub fn adaptation_settings(&self) -> AdaptationSettings {
        AdaptationSettings {
            mode: self.defaults.mode,
            illuminant: self.defaults.illuminant,
            observer: self.defaults.observer,
            table: self.defaults.table,
            method: self.adaptation.method,
            ..AdaptationSettings::default()
        }
    }

    pub fn export_options(&self) -> ExportOptions {
        ExportOptions {
            originator: self.cgats.originator.clone(),
            descriptor: self.cgats.descriptor.clone(),
            ..ExportOptions::default()
        }
    }
}
