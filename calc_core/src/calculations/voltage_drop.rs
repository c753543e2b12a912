//! # Voltage Drop
//!
//! Conductor voltage drop for a single- or three-phase circuit.
//!
//! ```text
//! single-phase: Vd = 2 × R × L × I / 1000
//! three-phase:  Vd = √3 × R × L × I / 1000
//! ```
//!
//! `R` is ohms per 1000 ft, either the DC resistance of Chapter 9 Table 8
//! or the AC effective impedance of Chapter 9 Table 9:
//!
//! ```text
//! Ze = R × PF + XL × sin(acos(PF))
//! ```
//!
//! Parallel sets divide `R` by the number of conductors per phase.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::voltage_drop::{calculate, ResistanceBasis, VoltageDropInput};
//! use calc_core::conductors::{ConductorMaterial, ConductorSize, Phase};
//! use calc_core::reference::ReferenceLookup;
//! use calc_core::settings::EngineSettings;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let lookup = ReferenceLookup::bundled().unwrap();
//! let input = VoltageDropInput {
//!     label: "Branch 12".to_string(),
//!     material: ConductorMaterial::Copper,
//!     size: ConductorSize::Awg(12),
//!     phase: Phase::Single,
//!     system_voltage: 120.0,
//!     load_current_a: 16.0,
//!     one_way_length_ft: 100.0,
//!     basis: ResistanceBasis::Dc,
//!     parallel_sets: 1,
//! };
//! let result = calculate(&input, &lookup, &EngineSettings::default()).await.unwrap();
//! // 2 × 1.93 × 100 × 16 / 1000 = 6.18 V
//! assert!((result.voltage_drop_v - 6.176).abs() < 1e-9);
//! assert!(result.exceeds_recommended);
//! # });
//! ```

use serde::{Deserialize, Serialize};

use crate::conductors::{ConductorMaterial, ConductorSize, Phase, RacewayMaterial};
use crate::errors::{CalcError, CalcResult};
use crate::reference::{ReferenceLookup, ReferenceStore};
use crate::settings::EngineSettings;

use super::form;

/// Where conductor resistance comes from
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ResistanceBasis {
    /// DC resistance (Chapter 9 Table 8)
    #[default]
    Dc,
    /// AC effective impedance (Chapter 9 Table 9)
    Ac {
        raceway: RacewayMaterial,
        power_factor: f64,
    },
}

/// Input parameters for a voltage drop calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoltageDropInput {
    #[serde(default)]
    pub label: String,
    pub material: ConductorMaterial,
    pub size: ConductorSize,
    pub phase: Phase,
    /// Line-to-line (three-phase) or line voltage (single-phase)
    pub system_voltage: f64,
    pub load_current_a: f64,
    /// One-way circuit length, ft
    pub one_way_length_ft: f64,
    #[serde(default)]
    pub basis: ResistanceBasis,
    /// Conductors in parallel per phase
    #[serde(default = "default_sets")]
    pub parallel_sets: u32,
}

fn default_sets() -> u32 {
    1
}

impl VoltageDropInput {
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.system_voltage > 0.0) {
            return Err(CalcError::invalid_input(
                "System Voltage",
                self.system_voltage.to_string(),
                "Voltage must be positive",
            ));
        }
        if !(self.load_current_a >= 0.0) {
            return Err(CalcError::invalid_input(
                "Load Current",
                self.load_current_a.to_string(),
                "Current cannot be negative",
            ));
        }
        if !(self.one_way_length_ft > 0.0) {
            return Err(CalcError::invalid_input(
                "One-Way Length",
                self.one_way_length_ft.to_string(),
                "Length must be positive",
            ));
        }
        if self.parallel_sets == 0 {
            return Err(CalcError::invalid_input(
                "Parallel Sets",
                "0",
                "At least one conductor per phase is required",
            ));
        }
        if let ResistanceBasis::Ac { power_factor, .. } = self.basis {
            if !(power_factor > 0.0 && power_factor <= 1.0) {
                return Err(CalcError::invalid_input(
                    "Power Factor",
                    power_factor.to_string(),
                    "Power factor must be greater than 0 and at most 1",
                ));
            }
        }
        Ok(())
    }

    /// Circuit multiplier: 2 for single-phase, √3 for three-phase.
    pub fn circuit_multiplier(&self) -> f64 {
        match self.phase {
            Phase::Single => 2.0,
            Phase::Three => Phase::Three.multiplier(),
        }
    }
}

/// Textual form for [`VoltageDropInput`].
///
/// An empty raceway selects the DC basis; a power factor left empty with a
/// raceway given defaults to 0.85.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct VoltageDropForm {
    pub label: String,
    pub material: String,
    pub size: String,
    pub phase: String,
    pub system_voltage: String,
    pub load_current: String,
    pub one_way_length: String,
    pub raceway: String,
    pub power_factor: String,
    pub parallel_sets: String,
}

impl VoltageDropForm {
    pub fn parse(&self) -> CalcResult<VoltageDropInput> {
        let basis = if self.raceway.trim().is_empty() {
            ResistanceBasis::Dc
        } else {
            ResistanceBasis::Ac {
                raceway: form::required_with(&self.raceway, "Raceway", RacewayMaterial::from_str_flexible)?,
                power_factor: form::optional_f64(&self.power_factor, "Power Factor")?.unwrap_or(0.85),
            }
        };
        Ok(VoltageDropInput {
            label: self.label.clone(),
            material: form::required_with(&self.material, "Material", ConductorMaterial::from_str_flexible)?,
            size: form::required_with(&self.size, "Conductor Size", ConductorSize::from_str_flexible)?,
            phase: form::required_with(&self.phase, "Phase", Phase::from_str_flexible)?,
            system_voltage: form::required_f64(&self.system_voltage, "System Voltage")?,
            load_current_a: form::required_f64(&self.load_current, "Load Current")?,
            one_way_length_ft: form::required_f64(&self.one_way_length, "One-Way Length")?,
            basis,
            parallel_sets: form::optional_u32(&self.parallel_sets, "Parallel Sets")?.unwrap_or(1),
        })
    }
}

/// Results from a voltage drop calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VoltageDropResult {
    /// Per-conductor resistance or effective impedance, ohms per 1000 ft
    pub conductor_ohms_per_kft: f64,
    /// After dividing by parallel sets
    pub effective_ohms_per_kft: f64,
    pub voltage_drop_v: f64,
    pub voltage_drop_percent: f64,
    pub end_voltage_v: f64,
    pub recommended_max_percent: f64,
    pub exceeds_recommended: bool,
}

/// AC effective impedance per 1000 ft.
pub fn effective_impedance(resistance: f64, reactance: f64, power_factor: f64) -> f64 {
    let theta = power_factor.acos();
    resistance * power_factor + reactance * theta.sin()
}

/// Calculate voltage drop.
pub async fn calculate<S: ReferenceStore>(
    input: &VoltageDropInput,
    lookup: &ReferenceLookup<S>,
    settings: &EngineSettings,
) -> CalcResult<VoltageDropResult> {
    input.validate()?;

    let conductor_ohms_per_kft = match input.basis {
        ResistanceBasis::Dc => {
            lookup
                .conductor_properties(input.material, input.size)
                .await?
                .dc_resistance_per_kft
        }
        ResistanceBasis::Ac { raceway, power_factor } => {
            let row = lookup.conductor_impedance(input.material, input.size, raceway).await?;
            effective_impedance(row.ac_resistance_per_kft, row.reactance_per_kft, power_factor)
        }
    };
    let effective_ohms_per_kft = conductor_ohms_per_kft / f64::from(input.parallel_sets);

    let voltage_drop_v =
        input.circuit_multiplier() * effective_ohms_per_kft * input.one_way_length_ft * input.load_current_a / 1000.0;

    if voltage_drop_v > input.system_voltage {
        return Err(CalcError::calculation_failed(
            "Voltage Drop",
            format!(
                "Drop of {:.1} V exceeds the {:.0} V system voltage; use a larger conductor or shorter run",
                voltage_drop_v, input.system_voltage
            ),
        ));
    }

    let voltage_drop_percent = voltage_drop_v / input.system_voltage * 100.0;
    let recommended_max_percent = settings.voltage_drop.recommended_max_percent;

    Ok(VoltageDropResult {
        conductor_ohms_per_kft,
        effective_ohms_per_kft,
        voltage_drop_v,
        voltage_drop_percent,
        end_voltage_v: input.system_voltage - voltage_drop_v,
        recommended_max_percent,
        exceeds_recommended: voltage_drop_percent > recommended_max_percent,
    })
}
