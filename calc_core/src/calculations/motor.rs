//! # Motor Branch Circuit
//!
//! Sizes the branch circuit of a single general-purpose AC motor from the
//! Article 430 tables.
//!
//! ```text
//! FLC                  Table 430.248 / 430.250 by hp, voltage, phase
//! conductor ampacity = FLC × 1.25                               430.22
//! overload           = FLA × 1.25 (SF ≥ 1.15 or rise ≤ 40 °C)
//!                      FLA × 1.15 otherwise                     430.32(A)(1)
//! SC/GF protection   = FLC × Table 430.52 percentage            430.52
//! ```
//!
//! Fuses map to the maximum-fuse tables; breakers round up to the next
//! standard rating of 240.6(A).
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::motor::{calculate, MotorInput};
//! use calc_core::conductors::{ConductorMaterial, Phase, ProtectiveDevice};
//! use calc_core::reference::ReferenceLookup;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let lookup = ReferenceLookup::bundled().unwrap();
//! let input = MotorInput {
//!     label: "Exhaust fan".to_string(),
//!     horsepower: 10.0,
//!     voltage: 460,
//!     phase: Phase::Three,
//!     nameplate_fla: Some(13.0),
//!     service_factor: 1.15,
//!     temperature_rise_c: None,
//!     device: ProtectiveDevice::InverseTimeBreaker,
//!     conductor_material: ConductorMaterial::Copper,
//! };
//! let result = calculate(&input, &lookup).await.unwrap();
//! assert_eq!(result.flc_a, 14.0);
//! assert_eq!(result.min_conductor_ampacity_a, 17.5);
//! // 14 A × 250 % = 35 A
//! assert_eq!(result.protection_rating_a, 35.0);
//! # });
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::{next_standard_size, STANDARD_OCPD_RATINGS};
use crate::conductors::{parse_horsepower, ConductorMaterial, ConductorSize, Phase, ProtectiveDevice, TemperatureRating};
use crate::errors::{CalcError, CalcResult};
use crate::reference::{ReferenceLookup, ReferenceStore};

use super::{form, nec_ref};

/// Continuous-duty multiplier on FLC for branch-circuit conductors
pub const CONDUCTOR_FACTOR: f64 = 1.25;
/// Overload multiplier for SF ≥ 1.15 or rise ≤ 40 °C
pub const OVERLOAD_FACTOR_HIGH: f64 = 1.25;
/// Overload multiplier for all other motors
pub const OVERLOAD_FACTOR_LOW: f64 = 1.15;

/// Input parameters for a motor branch circuit.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorInput {
    #[serde(default)]
    pub label: String,
    pub horsepower: f64,
    /// Nominal motor voltage (115, 230, 208, 460)
    pub voltage: u32,
    pub phase: Phase,
    /// Nameplate full-load amps; the table FLC is used when absent
    #[serde(default)]
    pub nameplate_fla: Option<f64>,
    #[serde(default = "default_service_factor")]
    pub service_factor: f64,
    /// Marked temperature rise, °C
    #[serde(default)]
    pub temperature_rise_c: Option<f64>,
    #[serde(default)]
    pub device: ProtectiveDevice,
    #[serde(default)]
    pub conductor_material: ConductorMaterial,
}

fn default_service_factor() -> f64 {
    1.0
}

impl MotorInput {
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.horsepower > 0.0) {
            return Err(CalcError::invalid_input(
                "Horsepower",
                self.horsepower.to_string(),
                "Horsepower must be positive",
            ));
        }
        if self.voltage == 0 {
            return Err(CalcError::invalid_input("Voltage", "0", "Voltage must be positive"));
        }
        if let Some(fla) = self.nameplate_fla {
            if !(fla > 0.0) {
                return Err(CalcError::invalid_input(
                    "Nameplate FLA",
                    fla.to_string(),
                    "Full-load amps must be positive",
                ));
            }
        }
        if !(self.service_factor >= 1.0) {
            return Err(CalcError::invalid_input(
                "Service Factor",
                self.service_factor.to_string(),
                "Service factor must be at least 1.0",
            ));
        }
        Ok(())
    }

    /// 430.32(A)(1) overload multiplier.
    pub fn overload_factor(&self) -> f64 {
        let high_service_factor = self.service_factor >= 1.15;
        let low_rise = self.temperature_rise_c.is_some_and(|rise| rise <= 40.0);
        if high_service_factor || low_rise {
            OVERLOAD_FACTOR_HIGH
        } else {
            OVERLOAD_FACTOR_LOW
        }
    }
}

/// Textual form for [`MotorInput`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct MotorForm {
    pub label: String,
    /// "5", "7.5", "1/2", "1-1/2"
    pub horsepower: String,
    pub voltage: String,
    pub phase: String,
    pub nameplate_fla: String,
    pub service_factor: String,
    pub temperature_rise: String,
    pub device: String,
    pub material: String,
}

impl MotorForm {
    pub fn parse(&self) -> CalcResult<MotorInput> {
        let horsepower = form::required_with(&self.horsepower, "Horsepower", |s| {
            parse_horsepower(s).ok_or_else(|| CalcError::invalid_input("Horsepower", s, "Not a valid horsepower"))
        })?;
        let device = if self.device.trim().is_empty() {
            ProtectiveDevice::default()
        } else {
            form::required_with(&self.device, "Protective Device", ProtectiveDevice::from_str_flexible)?
        };
        let conductor_material = if self.material.trim().is_empty() {
            ConductorMaterial::default()
        } else {
            form::required_with(&self.material, "Material", ConductorMaterial::from_str_flexible)?
        };
        Ok(MotorInput {
            label: self.label.clone(),
            horsepower,
            voltage: form::required_u32(&self.voltage, "Voltage")?,
            phase: form::required_with(&self.phase, "Phase", Phase::from_str_flexible)?,
            nameplate_fla: form::optional_f64(&self.nameplate_fla, "Nameplate FLA")?,
            service_factor: form::optional_f64(&self.service_factor, "Service Factor")?.unwrap_or(1.0),
            temperature_rise_c: form::optional_f64(&self.temperature_rise, "Temperature Rise")?,
            device,
            conductor_material,
        })
    }
}

/// Results from a motor branch circuit calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MotorResult {
    /// Table full-load current (A)
    pub flc_a: f64,
    /// FLC × 1.25 (A)
    pub min_conductor_ampacity_a: f64,
    pub conductor_size: ConductorSize,
    pub conductor_rating: TemperatureRating,
    pub conductor_ampacity_a: f64,
    /// FLA the overload is based on (A)
    pub fla_a: f64,
    pub overload_factor: f64,
    /// Maximum overload trip (A)
    pub overload_a: f64,
    pub device: ProtectiveDevice,
    /// Table 430.52 percentage of FLC
    pub protection_percent: f64,
    /// FLC × percentage (A)
    pub max_protection_a: f64,
    /// Standard device rating (A)
    pub protection_rating_a: f64,
    pub references: Vec<String>,
}

/// Smallest conductor whose usable ampacity meets `required_a`.
///
/// Uses the 75 °C column, or 60 °C for 14 through 1 AWG on circuits of
/// 100 A or less (110.14(C)(1)(a)).
pub async fn select_conductor<S: ReferenceStore>(
    material: ConductorMaterial,
    required_a: f64,
    lookup: &ReferenceLookup<S>,
) -> CalcResult<(ConductorSize, TemperatureRating, f64)> {
    let column_75 = lookup.ampacity_column(material, TemperatureRating::C75).await?;
    let column_60 = lookup.ampacity_column(material, TemperatureRating::C60).await?;

    for entry in &column_75 {
        let (rating, ampacity) = if required_a <= 100.0 && entry.size.is_small() {
            let row = column_60
                .iter()
                .find(|e| e.size == entry.size)
                .ok_or_else(|| CalcError::data_not_found("ampacity", format!("{} {} 60°C", material, entry.size)))?;
            (TemperatureRating::C60, row.ampacity)
        } else {
            (TemperatureRating::C75, entry.ampacity)
        };
        if ampacity >= required_a {
            return Ok((entry.size, rating, ampacity));
        }
    }

    Err(CalcError::calculation_failed(
        "Motor",
        format!(
            "No single {} conductor carries {:.1} A; use parallel conductors",
            material.display_name().to_lowercase(),
            required_a
        ),
    ))
}

/// Calculate a motor branch circuit.
pub async fn calculate<S: ReferenceStore>(input: &MotorInput, lookup: &ReferenceLookup<S>) -> CalcResult<MotorResult> {
    input.validate()?;

    let flc_a = lookup.motor_flc(input.horsepower, input.voltage, input.phase).await?.flc;
    let min_conductor_ampacity_a = flc_a * CONDUCTOR_FACTOR;
    let (conductor_size, conductor_rating, conductor_ampacity_a) =
        select_conductor(input.conductor_material, min_conductor_ampacity_a, lookup).await?;

    let fla_a = input.nameplate_fla.unwrap_or(flc_a);
    let overload_factor = input.overload_factor();
    let overload_a = fla_a * overload_factor;

    let protection_percent = lookup.motor_protection_percentage(input.device).await?.percent;
    let max_protection_a = flc_a * protection_percent / 100.0;

    let protection_rating_a = match input.device.fuse_class() {
        Some(class) => {
            lookup
                .motor_fuse_size(class, input.horsepower, input.voltage, input.phase)
                .await?
                .fuse_amps
        }
        None => next_standard_size(STANDARD_OCPD_RATINGS, max_protection_a).ok_or_else(|| {
            CalcError::calculation_failed(
                "Motor",
                format!("{:.1} A exceeds the largest standard rating", max_protection_a),
            )
        })?,
    };

    Ok(MotorResult {
        flc_a,
        min_conductor_ampacity_a,
        conductor_size,
        conductor_rating,
        conductor_ampacity_a,
        fla_a,
        overload_factor,
        overload_a,
        device: input.device,
        protection_percent,
        max_protection_a,
        protection_rating_a,
        references: [
            nec_ref::MOTOR_FLC,
            nec_ref::MOTOR_CONDUCTORS,
            nec_ref::MOTOR_OVERLOAD,
            nec_ref::MOTOR_PROTECTION,
            nec_ref::STANDARD_RATINGS,
        ]
        .iter()
        .map(|r| r.to_string())
        .collect(),
    })
}
