//! # Transformer Sizing
//!
//! Selects a standard transformer rating for a load and sizes its
//! overcurrent protection per Table 450.3(B).
//!
//! ```text
//! kVA  = V × I / 1000          (single-phase)
//! kVA  = V × I × √3 / 1000     (three-phase)
//! FLA  = kVA × 1000 / V        (single-phase)
//! FLA  = kVA × 1000 / (V × √3) (three-phase)
//! ```
//!
//! | Scheme                  | Primary                             | Secondary          |
//! |-------------------------|-------------------------------------|--------------------|
//! | Primary only            | 125 % (≥ 9 A), 167 % (< 9 A), 300 % (< 2 A) | see below  |
//! | Primary and secondary   | 250 %                               | 125 % (≥ 9 A), 167 % (< 9 A) |
//!
//! A primary-only scheme still needs a secondary device when its primary
//! multiplier is above 125 %; that device is sized like the
//! primary-and-secondary column. Each maximum is rounded up to the next
//! standard device rating.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::transformer::{calculate, ProtectionScheme, TransformerInput, TransformerLoad};
//! use calc_core::conductors::Phase;
//!
//! let input = TransformerInput {
//!     label: "T-1".to_string(),
//!     phase: Phase::Three,
//!     primary_voltage: 480.0,
//!     secondary_voltage: 208.0,
//!     load: TransformerLoad::Kva { kva: 70.0 },
//!     protection: ProtectionScheme::PrimaryOnly,
//! };
//! let result = calculate(&input).unwrap();
//! assert_eq!(result.standard_kva, 75.0);
//! assert_eq!(result.primary_protection_a, 125.0);
//! assert!(result.secondary.is_none());
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::{next_standard_size, SINGLE_PHASE_KVA, STANDARD_OCPD_RATINGS, THREE_PHASE_KVA};
use crate::conductors::Phase;
use crate::errors::{CalcError, CalcResult};
use crate::units::{Kva, VoltAmperes};

use super::{form, nec_ref};

/// Current below which the 167 % multiplier applies.
const SMALL_CURRENT_A: f64 = 9.0;
/// Primary current below which the 300 % multiplier applies.
const TINY_CURRENT_A: f64 = 2.0;

/// How the load is specified.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum TransformerLoad {
    /// Load given directly in kVA
    Kva { kva: f64 },
    /// Load given as line current at the secondary voltage
    Amps { amps: f64 },
}

/// Where overcurrent protection is installed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ProtectionScheme {
    #[default]
    PrimaryOnly,
    PrimaryAndSecondary,
}

impl ProtectionScheme {
    /// Maximum primary device as a fraction of primary FLA.
    pub fn primary_multiplier(&self, primary_fla: f64) -> f64 {
        match self {
            ProtectionScheme::PrimaryAndSecondary => 2.5,
            ProtectionScheme::PrimaryOnly if primary_fla < TINY_CURRENT_A => 3.0,
            ProtectionScheme::PrimaryOnly if primary_fla < SMALL_CURRENT_A => 1.67,
            ProtectionScheme::PrimaryOnly => 1.25,
        }
    }

    /// Maximum secondary device as a fraction of secondary FLA, when a
    /// secondary device is required.
    pub fn secondary_multiplier(&self, primary_fla: f64, secondary_fla: f64) -> Option<f64> {
        let required = match self {
            ProtectionScheme::PrimaryAndSecondary => true,
            ProtectionScheme::PrimaryOnly => self.primary_multiplier(primary_fla) > 1.25,
        };
        if !required {
            None
        } else if secondary_fla < SMALL_CURRENT_A {
            Some(1.67)
        } else {
            Some(1.25)
        }
    }
}

/// Input parameters for transformer sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerInput {
    #[serde(default)]
    pub label: String,
    pub phase: Phase,
    pub primary_voltage: f64,
    pub secondary_voltage: f64,
    pub load: TransformerLoad,
    #[serde(default)]
    pub protection: ProtectionScheme,
}

impl TransformerInput {
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.primary_voltage > 0.0) {
            return Err(CalcError::invalid_input(
                "Primary Voltage",
                self.primary_voltage.to_string(),
                "Voltage must be positive",
            ));
        }
        if !(self.secondary_voltage > 0.0) {
            return Err(CalcError::invalid_input(
                "Secondary Voltage",
                self.secondary_voltage.to_string(),
                "Voltage must be positive",
            ));
        }
        match self.load {
            TransformerLoad::Kva { kva } if !(kva > 0.0) => Err(CalcError::invalid_input(
                "kVA",
                kva.to_string(),
                "Load must be positive",
            )),
            TransformerLoad::Amps { amps } if !(amps > 0.0) => Err(CalcError::invalid_input(
                "Load Current",
                amps.to_string(),
                "Load must be positive",
            )),
            _ => Ok(()),
        }
    }

    /// Load in kVA before rounding to a standard size.
    pub fn required_kva(&self) -> f64 {
        match self.load {
            TransformerLoad::Kva { kva } => kva,
            TransformerLoad::Amps { amps } => {
                Kva::from(VoltAmperes::from_line_current(amps, self.secondary_voltage, self.phase)).0
            }
        }
    }
}

/// Textual form for [`TransformerInput`]. Exactly one of `kva` and
/// `load_current` is filled in.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TransformerForm {
    pub label: String,
    pub phase: String,
    pub primary_voltage: String,
    pub secondary_voltage: String,
    pub kva: String,
    pub load_current: String,
    pub secondary_protection: String,
}

impl TransformerForm {
    pub fn parse(&self) -> CalcResult<TransformerInput> {
        let kva = form::optional_f64(&self.kva, "kVA")?;
        let amps = form::optional_f64(&self.load_current, "Load Current")?;
        let load = match (kva, amps) {
            (Some(kva), None) => TransformerLoad::Kva { kva },
            (None, Some(amps)) => TransformerLoad::Amps { amps },
            (None, None) => return Err(CalcError::missing_field("kVA")),
            (Some(_), Some(_)) => {
                return Err(CalcError::invalid_input(
                    "Load Current",
                    &self.load_current,
                    "Enter either kVA or load current, not both",
                ))
            }
        };
        let protection = if form::flag(&self.secondary_protection, "Secondary Protection")? {
            ProtectionScheme::PrimaryAndSecondary
        } else {
            ProtectionScheme::PrimaryOnly
        };
        Ok(TransformerInput {
            label: self.label.clone(),
            phase: form::required_with(&self.phase, "Phase", Phase::from_str_flexible)?,
            primary_voltage: form::required_f64(&self.primary_voltage, "Primary Voltage")?,
            secondary_voltage: form::required_f64(&self.secondary_voltage, "Secondary Voltage")?,
            load,
            protection,
        })
    }
}

/// Secondary overcurrent device sizing.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SecondaryProtection {
    pub multiplier: f64,
    pub max_protection_a: f64,
    pub protection_a: f64,
}

/// Results from transformer sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransformerResult {
    pub required_kva: f64,
    /// Standard rating selected (kVA)
    pub standard_kva: f64,
    pub primary_fla_a: f64,
    pub secondary_fla_a: f64,
    pub protection: ProtectionScheme,
    pub primary_multiplier: f64,
    pub primary_max_protection_a: f64,
    /// Standard primary device rating (A)
    pub primary_protection_a: f64,
    pub secondary: Option<SecondaryProtection>,
    pub references: Vec<String>,
}

fn standard_device(calculation: &str, max_a: f64) -> CalcResult<f64> {
    next_standard_size(STANDARD_OCPD_RATINGS, max_a).ok_or_else(|| {
        CalcError::calculation_failed(calculation, format!("{:.1} A exceeds the largest standard rating", max_a))
    })
}

/// Size a transformer and its overcurrent protection.
pub fn calculate(input: &TransformerInput) -> CalcResult<TransformerResult> {
    input.validate()?;

    let required_kva = input.required_kva();
    let catalog = match input.phase {
        Phase::Single => SINGLE_PHASE_KVA,
        Phase::Three => THREE_PHASE_KVA,
    };
    let standard_kva = next_standard_size(catalog, required_kva).ok_or_else(|| {
        CalcError::calculation_failed(
            "Transformer",
            format!("{:.1} kVA exceeds the largest standard {} rating", required_kva, input.phase),
        )
    })?;

    let rating = VoltAmperes::from(Kva(standard_kva));
    let primary_fla_a = rating.line_current(input.primary_voltage, input.phase);
    let secondary_fla_a = rating.line_current(input.secondary_voltage, input.phase);

    let primary_multiplier = input.protection.primary_multiplier(primary_fla_a);
    let primary_max_protection_a = primary_fla_a * primary_multiplier;
    let primary_protection_a = standard_device("Transformer primary", primary_max_protection_a)?;

    let secondary = match input.protection.secondary_multiplier(primary_fla_a, secondary_fla_a) {
        Some(multiplier) => {
            let max_protection_a = secondary_fla_a * multiplier;
            Some(SecondaryProtection {
                multiplier,
                max_protection_a,
                protection_a: standard_device("Transformer secondary", max_protection_a)?,
            })
        }
        None => None,
    };

    Ok(TransformerResult {
        required_kva,
        standard_kva,
        primary_fla_a,
        secondary_fla_a,
        protection: input.protection,
        primary_multiplier,
        primary_max_protection_a,
        primary_protection_a,
        secondary,
        references: vec![
            nec_ref::TRANSFORMER_PROTECTION.to_string(),
            nec_ref::STANDARD_RATINGS.to_string(),
        ],
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(phase: Phase, primary: f64, secondary: f64, load: TransformerLoad) -> TransformerInput {
        TransformerInput {
            label: String::new(),
            phase,
            primary_voltage: primary,
            secondary_voltage: secondary,
            load,
            protection: ProtectionScheme::PrimaryOnly,
        }
    }

    #[test]
    fn test_three_phase_primary_only() {
        let result = calculate(&input(Phase::Three, 480.0, 208.0, TransformerLoad::Kva { kva: 75.0 })).unwrap();
        assert_eq!(result.standard_kva, 75.0);
        // 75000 / (480 × √3) = 90.2 A
        assert!((result.primary_fla_a - 90.21).abs() < 0.01);
        assert!((result.secondary_fla_a - 208.18).abs() < 0.01);
        assert_eq!(result.primary_multiplier, 1.25);
        assert_eq!(result.primary_protection_a, 125.0);
        assert!(result.secondary.is_none());
    }

    #[test]
    fn test_primary_and_secondary() {
        let mut transformer = input(Phase::Three, 480.0, 208.0, TransformerLoad::Kva { kva: 75.0 });
        transformer.protection = ProtectionScheme::PrimaryAndSecondary;
        let result = calculate(&transformer).unwrap();
        // 90.2 × 2.5 = 225.5 → 250
        assert_eq!(result.primary_multiplier, 2.5);
        assert_eq!(result.primary_protection_a, 250.0);
        let secondary = result.secondary.unwrap();
        // 208.2 × 1.25 = 260.2 → 300
        assert_eq!(secondary.multiplier, 1.25);
        assert_eq!(secondary.protection_a, 300.0);
    }

    #[test]
    fn test_amps_rounds_up_to_standard_kva() {
        let result = calculate(&input(Phase::Single, 480.0, 240.0, TransformerLoad::Amps { amps: 100.0 })).unwrap();
        assert!((result.required_kva - 24.0).abs() < 1e-9);
        assert_eq!(result.standard_kva, 25.0);
        assert!((result.secondary_fla_a - 104.17).abs() < 0.01);
    }

    #[test]
    fn test_small_primary_multipliers() {
        // 1 kVA at 480 V: 2.08 A → 167 %
        let result = calculate(&input(Phase::Single, 480.0, 120.0, TransformerLoad::Kva { kva: 1.0 })).unwrap();
        assert_eq!(result.primary_multiplier, 1.67);
        assert_eq!(result.primary_protection_a, 6.0);
        // secondary 8.33 A × 1.67 = 13.9 → 15
        let secondary = result.secondary.unwrap();
        assert_eq!(secondary.multiplier, 1.67);
        assert_eq!(secondary.protection_a, 15.0);

        // 1 kVA at 600 V: 1.67 A → 300 %
        let result = calculate(&input(Phase::Single, 600.0, 120.0, TransformerLoad::Kva { kva: 1.0 })).unwrap();
        assert_eq!(result.primary_multiplier, 3.0);
        assert_eq!(result.primary_protection_a, 6.0);
        assert!(result.secondary.is_some());
    }

    #[test]
    fn test_primary_only_above_125_percent_needs_secondary() {
        // 3 kVA 480/240 V: primary 6.25 A → 167 %, secondary 12.5 A → 125 %
        let result = calculate(&input(Phase::Single, 480.0, 240.0, TransformerLoad::Kva { kva: 3.0 })).unwrap();
        assert!((result.primary_fla_a - 6.25).abs() < 1e-9);
        assert_eq!(result.primary_multiplier, 1.67);
        assert_eq!(result.primary_protection_a, 15.0);
        let secondary = result.secondary.unwrap();
        assert_eq!(secondary.multiplier, 1.25);
        assert!((secondary.max_protection_a - 15.625).abs() < 1e-9);
        assert_eq!(secondary.protection_a, 20.0);
    }

    #[test]
    fn test_load_beyond_catalog() {
        let err = calculate(&input(Phase::Single, 480.0, 240.0, TransformerLoad::Kva { kva: 600.0 })).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_zero_load_rejected() {
        let err = calculate(&input(Phase::Three, 480.0, 208.0, TransformerLoad::Amps { amps: 0.0 })).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_form_exactly_one_load() {
        let form = TransformerForm {
            phase: "3".to_string(),
            primary_voltage: "480".to_string(),
            secondary_voltage: "208".to_string(),
            load_current: "150".to_string(),
            secondary_protection: "yes".to_string(),
            ..Default::default()
        };
        let parsed = form.parse().unwrap();
        assert_eq!(parsed.load, TransformerLoad::Amps { amps: 150.0 });
        assert_eq!(parsed.protection, ProtectionScheme::PrimaryAndSecondary);

        let both = TransformerForm {
            kva: "45".to_string(),
            ..form.clone()
        };
        assert_eq!(both.parse().unwrap_err().error_code(), "INVALID_INPUT");

        let neither = TransformerForm {
            load_current: String::new(),
            ..form
        };
        assert_eq!(neither.parse().unwrap_err().error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_load_serde_tag() {
        let json = serde_json::to_string(&TransformerLoad::Kva { kva: 45.0 }).unwrap();
        assert_eq!(json, r#"{"type":"kva","kva":45.0}"#);
    }
}
