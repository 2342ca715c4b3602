//! Chart settings, read from JSON.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::ephemeris::{CalculationFlags, EphemerisSource, HouseSystem, SiderealMode};
use crate::ConfigurationError;

/// Constant offset used when the oracle's own ayanamsa is not wanted.
pub const DEFAULT_FIXED_AYANAMSA: f64 = 24.0;

/// Where the ayanamsa subtracted from tropical longitudes comes from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(tag = "source", rename_all = "snake_case")]
pub enum AyanamsaSource {
    /// The time-dependent value reported by the oracle for the sidereal mode.
    #[default]
    Oracle,
    /// A single constant for every date.
    Fixed { degrees: f64 },
}

impl AyanamsaSource {
    /// Picks the value for one chart.
    pub fn resolve(self, oracle_ayanamsa: f64) -> f64 {
        match self {
            AyanamsaSource::Oracle => oracle_ayanamsa,
            AyanamsaSource::Fixed { degrees } => degrees,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ChartSettings {
    pub house_system: char,
    pub sidereal_mode: String,
    pub ayanamsa: AyanamsaSource,
    pub ephemeris_source: EphemerisSource,
    /// Directory holding Swiss Ephemeris data files.
    pub ephemeris_path: Option<PathBuf>,
}

impl Default for ChartSettings {
    fn default() -> Self {
        ChartSettings {
            house_system: HouseSystem::Equal.code(),
            sidereal_mode: "lahiri".to_string(),
            ayanamsa: AyanamsaSource::Oracle,
            ephemeris_source: EphemerisSource::Swiss,
            ephemeris_path: None,
        }
    }
}

impl ChartSettings {
    pub fn from_json_str(text: &str) -> Result<Self, ConfigurationError> {
        let settings: ChartSettings = serde_json::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self, ConfigurationError> {
        let path = path.as_ref();
        let text = fs::read_to_string(path).map_err(|source| ConfigurationError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<(), ConfigurationError> {
        self.house_system()?;
        self.calculation_flags()?;
        if let AyanamsaSource::Fixed { degrees } = self.ayanamsa {
            if !degrees.is_finite() || !(0.0..360.0).contains(&degrees) {
                return Err(ConfigurationError::InvalidAyanamsa { degrees });
            }
        }
        Ok(())
    }

    pub fn house_system(&self) -> Result<HouseSystem, ConfigurationError> {
        HouseSystem::from_code(self.house_system)
    }

    pub fn calculation_flags(&self) -> Result<CalculationFlags, ConfigurationError> {
        Ok(CalculationFlags {
            source: self.ephemeris_source,
            sidereal_mode: SiderealMode::from_name(&self.sidereal_mode)?,
        })
    }

    /// Subtract `degrees` for every date instead of the oracle's value.
    pub fn with_fixed_ayanamsa(mut self, degrees: f64) -> Self {
        self.ayanamsa = AyanamsaSource::Fixed { degrees };
        self
    }
}
