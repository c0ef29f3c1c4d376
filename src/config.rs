use crate::{
    error::Error,
    profile::Version,
    report::ReportConfig,
    scoring::Breakpoints,
    validate::{ImageBounds, Requirement, DEFAULT_CONFIDENCE_THRESHOLD},
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

/// Engine configuration. Every field has a default, so a TOML file only
/// needs the values it changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub version: Version,
    /// Minimum landmark visibility for a landmark to be used.
    pub confidence_threshold: f32,
    pub requirement: Requirement,
    pub image_bounds: ImageBounds,
    pub breakpoints: Breakpoints,
    pub report: ReportConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            version: Version::default(),
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            requirement: Requirement::default(),
            image_bounds: ImageBounds::default(),
            breakpoints: Breakpoints::default(),
            report: ReportConfig::default(),
        }
    }
}

impl Config {
    pub fn load(path: &Path) -> Result<Self, Error> {
        let content =
            fs::read_to_string(path).map_err(|e| Error::ReadConfig(e, path.to_owned()))?;
        Self::from_toml(&content)
    }

    pub fn from_toml(content: &str) -> Result<Self, Error> {
        toml::from_str(content).map_err(Error::ParseConfig)
    }

    pub fn to_toml(&self) -> Result<String, Error> {
        toml::to_string_pretty(self).map_err(Error::SerializeConfig)
    }

    pub fn validate(&self) -> Result<(), Error> {
        if !(self.confidence_threshold > 0.0 && self.confidence_threshold <= 1.0) {
            return Err(Error::InvalidConfidenceThreshold(self.confidence_threshold));
        }
        self.image_bounds.validate()?;
        self.report.validate()?;
        self.breakpoints.validate()?;
        self.version.profile().check_weights()
    }
}
