//! # Engine Settings
//!
//! Tunables shared by every calculator, loaded from TOML. Every field has a
//! default, so a settings file only needs the values it changes.
//!
//! ```toml
//! code_edition = "NEC 2020"
//!
//! [lighting]
//! max_spacing_ratio = 1.2
//!
//! [voltage_drop]
//! recommended_max_percent = 5.0
//! ```
//!
//! ## Example
//!
//! ```rust
//! use calc_core::settings::EngineSettings;
//!
//! let settings = EngineSettings::from_toml_str("[lighting]\nmax_spacing_ratio = 1.2").unwrap();
//! assert_eq!(settings.lighting.max_spacing_ratio, 1.2);
//! assert_eq!(settings.voltage_drop.recommended_max_percent, 3.0);
//! ```

use std::fs;
use std::io::ErrorKind;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

/// Largest accepted `lighting.max_grid_dimension`.
pub const MAX_GRID_DIMENSION: u32 = 1000;

/// Luminaire layout search limits
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LightingSettings {
    /// Maximum spacing-to-mounting-height ratio
    pub max_spacing_ratio: f64,
    /// Hard cap on rows and columns examined by the grid search
    pub max_grid_dimension: u32,
}

impl Default for LightingSettings {
    fn default() -> Self {
        LightingSettings {
            max_spacing_ratio: 1.0,
            max_grid_dimension: 100,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VoltageDropSettings {
    /// Drops above this percentage are flagged (210.19(A) informational note)
    pub recommended_max_percent: f64,
}

impl Default for VoltageDropSettings {
    fn default() -> Self {
        VoltageDropSettings {
            recommended_max_percent: 3.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DwellingSettings {
    /// Voltage used to convert the service load to amperes
    pub service_voltage: f64,
    /// General lighting load per ft² (Table 220.12)
    pub general_lighting_va_per_unit_area: f64,
}

impl Default for DwellingSettings {
    fn default() -> Self {
        DwellingSettings {
            service_voltage: 240.0,
            general_lighting_va_per_unit_area: 3.0,
        }
    }
}

/// Settings for the calculation engine.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineSettings {
    /// Code edition the reference tables follow (e.g., "NEC 2020")
    pub code_edition: String,
    pub lighting: LightingSettings,
    pub voltage_drop: VoltageDropSettings,
    pub dwelling: DwellingSettings,
}

impl Default for EngineSettings {
    fn default() -> Self {
        EngineSettings {
            code_edition: "NEC 2020".to_string(),
            lighting: LightingSettings::default(),
            voltage_drop: VoltageDropSettings::default(),
            dwelling: DwellingSettings::default(),
        }
    }
}

impl EngineSettings {
    pub fn from_toml_str(text: &str) -> CalcResult<Self> {
        let settings: EngineSettings = toml::from_str(text)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load settings from a TOML file. A missing file yields the defaults.
    pub fn load(path: impl AsRef<Path>) -> CalcResult<Self> {
        let path = path.as_ref();
        match fs::read_to_string(path) {
            Ok(text) => {
                let settings = Self::from_toml_str(&text)?;
                tracing::info!(path = %path.display(), "loaded engine settings");
                Ok(settings)
            }
            Err(e) if e.kind() == ErrorKind::NotFound => {
                tracing::debug!(path = %path.display(), "settings file not found, using defaults");
                Ok(Self::default())
            }
            Err(e) => Err(CalcError::serialization(format!("{}: {}", path.display(), e))),
        }
    }

    pub fn to_toml_string(&self) -> CalcResult<String> {
        toml::to_string_pretty(self).map_err(|e| CalcError::serialization(e.to_string()))
    }

    pub fn validate(&self) -> CalcResult<()> {
        if !(self.lighting.max_spacing_ratio > 0.0) {
            return Err(CalcError::invalid_input(
                "lighting.max_spacing_ratio",
                self.lighting.max_spacing_ratio.to_string(),
                "Spacing ratio must be positive",
            ));
        }
        if !(1..=MAX_GRID_DIMENSION).contains(&self.lighting.max_grid_dimension) {
            return Err(CalcError::invalid_input(
                "lighting.max_grid_dimension",
                self.lighting.max_grid_dimension.to_string(),
                format!("Grid dimension cap must be between 1 and {}", MAX_GRID_DIMENSION),
            ));
        }
        if !(self.voltage_drop.recommended_max_percent > 0.0) {
            return Err(CalcError::invalid_input(
                "voltage_drop.recommended_max_percent",
                self.voltage_drop.recommended_max_percent.to_string(),
                "Percentage must be positive",
            ));
        }
        if !(self.dwelling.service_voltage > 0.0) {
            return Err(CalcError::invalid_input(
                "dwelling.service_voltage",
                self.dwelling.service_voltage.to_string(),
                "Service voltage must be positive",
            ));
        }
        if self.dwelling.general_lighting_va_per_unit_area < 0.0 {
            return Err(CalcError::invalid_input(
                "dwelling.general_lighting_va_per_unit_area",
                self.dwelling.general_lighting_va_per_unit_area.to_string(),
                "Lighting load cannot be negative",
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.code_edition, "NEC 2020");
        assert_eq!(settings.lighting.max_spacing_ratio, 1.0);
        assert_eq!(settings.lighting.max_grid_dimension, 100);
        assert_eq!(settings.dwelling.service_voltage, 240.0);
    }

    #[test]
    fn test_partial_toml() {
        let settings = EngineSettings::from_toml_str("[dwelling]\nservice_voltage = 208.0\n").unwrap();
        assert_eq!(settings.dwelling.service_voltage, 208.0);
        assert_eq!(settings.dwelling.general_lighting_va_per_unit_area, 3.0);
        assert_eq!(settings.code_edition, "NEC 2020");
    }

    #[test]
    fn test_toml_roundtrip() {
        let mut settings = EngineSettings::default();
        settings.lighting.max_spacing_ratio = 1.4;
        let text = settings.to_toml_string().unwrap();
        let back = EngineSettings::from_toml_str(&text).unwrap();
        assert_eq!(settings, back);
    }

    #[test]
    fn test_rejects_bad_values() {
        let err = EngineSettings::from_toml_str("[lighting]\nmax_spacing_ratio = 0.0\n").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        let err = EngineSettings::from_toml_str("[lighting]\nmax_grid_dimension = 5000\n").unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        let err = EngineSettings::from_toml_str("code_edition = 5").unwrap_err();
        assert_eq!(err.error_code(), "SERIALIZATION_ERROR");
    }

    #[test]
    fn test_missing_file_defaults() {
        let settings = EngineSettings::load("/nonexistent/wireline-settings.toml").unwrap();
        assert_eq!(settings, EngineSettings::default());
    }
}
