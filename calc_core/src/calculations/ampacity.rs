//! # Ampacity Derating
//!
//! Allowable ampacity of a conductor after ambient temperature correction
//! and bundling adjustment, limited by the temperature rating of its
//! terminations.
//!
//! ```text
//! adjusted  = base (Table 310.16, insulation column) × Ct × Cadj
//! allowable = min(adjusted, Table 310.16 at the termination rating)
//! ```
//!
//! Terminations default to 60 °C for 14 through 1 AWG and 75 °C for larger
//! conductors (110.14(C)(1)).
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::ampacity::{calculate, AmpacityInput};
//! use calc_core::conductors::{ConductorMaterial, ConductorSize, TemperatureRating};
//! use calc_core::reference::ReferenceLookup;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let lookup = ReferenceLookup::bundled().unwrap();
//! let input = AmpacityInput {
//!     label: "Feeder A".to_string(),
//!     material: ConductorMaterial::Copper,
//!     size: ConductorSize::Aught(1),
//!     insulation_rating: TemperatureRating::C90,
//!     ambient_c: 30.0,
//!     current_carrying_conductors: 6,
//!     termination_rating: None,
//! };
//! let result = calculate(&input, &lookup).await.unwrap();
//! // 170 A × 1.00 × 0.80 = 136 A, under the 150 A 75 °C termination limit
//! assert!((result.allowable_ampacity_a - 136.0).abs() < 1e-9);
//! # });
//! ```

use serde::{Deserialize, Serialize};

use crate::conductors::{ConductorMaterial, ConductorSize, TemperatureRating};
use crate::errors::{CalcError, CalcResult};
use crate::reference::{ReferenceLookup, ReferenceStore};

use super::form;
use super::nec_ref;

/// Input parameters for an ampacity derating calculation.
///
/// ## JSON Example
///
/// ```json
/// {
///   "label": "Feeder A",
///   "material": "copper",
///   "size": "1/0",
///   "insulation_rating": "90C",
///   "ambient_c": 40.0,
///   "current_carrying_conductors": 6,
///   "termination_rating": null
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmpacityInput {
    #[serde(default)]
    pub label: String,
    pub material: ConductorMaterial,
    pub size: ConductorSize,
    /// Insulation column of Table 310.16 the derating starts from
    pub insulation_rating: TemperatureRating,
    /// Ambient temperature, °C
    pub ambient_c: f64,
    /// Current-carrying conductors in the raceway or cable
    pub current_carrying_conductors: u32,
    /// Terminal temperature rating; `None` applies the 110.14(C) default
    #[serde(default)]
    pub termination_rating: Option<TemperatureRating>,
}

impl AmpacityInput {
    pub fn validate(&self) -> CalcResult<()> {
        if !self.ambient_c.is_finite() || !(-40.0..=100.0).contains(&self.ambient_c) {
            return Err(CalcError::invalid_input(
                "Ambient Temperature",
                self.ambient_c.to_string(),
                "Ambient must be between -40 and 100 °C",
            ));
        }
        if self.current_carrying_conductors == 0 {
            return Err(CalcError::invalid_input(
                "Current-Carrying Conductors",
                "0",
                "At least one conductor is required",
            ));
        }
        Ok(())
    }

    /// Termination rating applied to the limit, never above the insulation.
    pub fn effective_termination_rating(&self) -> TemperatureRating {
        let default = if self.size.is_small() {
            TemperatureRating::C60
        } else {
            TemperatureRating::C75
        };
        self.termination_rating.unwrap_or(default).min(self.insulation_rating)
    }
}

/// Textual form for [`AmpacityInput`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct AmpacityForm {
    pub label: String,
    pub material: String,
    pub size: String,
    pub insulation_rating: String,
    /// °C unless suffixed with `F`; defaults to 30 °C when empty
    pub ambient_temperature: String,
    /// Defaults to 3 when empty
    pub conductor_count: String,
    pub termination_rating: String,
}

impl AmpacityForm {
    pub fn parse(&self) -> CalcResult<AmpacityInput> {
        let termination_rating = if self.termination_rating.trim().is_empty() {
            None
        } else {
            Some(form::required_with(
                &self.termination_rating,
                "Termination Rating",
                TemperatureRating::from_str_flexible,
            )?)
        };
        Ok(AmpacityInput {
            label: self.label.clone(),
            material: form::required_with(&self.material, "Material", ConductorMaterial::from_str_flexible)?,
            size: form::required_with(&self.size, "Conductor Size", ConductorSize::from_str_flexible)?,
            insulation_rating: form::required_with(
                &self.insulation_rating,
                "Insulation Rating",
                TemperatureRating::from_str_flexible,
            )?,
            ambient_c: form::optional_temperature_c(&self.ambient_temperature, "Ambient Temperature")?.unwrap_or(30.0),
            current_carrying_conductors: form::optional_u32(&self.conductor_count, "Current-Carrying Conductors")?
                .unwrap_or(3),
            termination_rating,
        })
    }
}

/// Which limit set the allowable ampacity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmpacityLimit {
    /// Conditions of use (temperature and bundling)
    ConditionsOfUse,
    /// Terminal temperature rating
    Termination,
}

/// Results from an ampacity derating calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AmpacityResult {
    /// Table 310.16 ampacity in the insulation column (A)
    pub base_ampacity_a: f64,
    pub temperature_correction_factor: f64,
    pub adjustment_factor: f64,
    /// Base × correction × adjustment (A)
    pub adjusted_ampacity_a: f64,
    pub termination_rating: TemperatureRating,
    /// Table 310.16 ampacity at the termination rating (A)
    pub termination_ampacity_a: f64,
    /// Lesser of adjusted and termination ampacity (A)
    pub allowable_ampacity_a: f64,
    pub limited_by: AmpacityLimit,
    /// 240.4(D) maximum overcurrent device for small conductors (A)
    pub max_overcurrent_device_a: Option<f64>,
    pub references: Vec<String>,
}

/// 240.4(D) overcurrent limit for small conductors.
pub fn small_conductor_ocpd_limit(material: ConductorMaterial, size: ConductorSize) -> Option<f64> {
    match (material, size) {
        (ConductorMaterial::Copper, ConductorSize::Awg(14)) => Some(15.0),
        (ConductorMaterial::Copper, ConductorSize::Awg(12)) => Some(20.0),
        (ConductorMaterial::Copper, ConductorSize::Awg(10)) => Some(30.0),
        (ConductorMaterial::Aluminum, ConductorSize::Awg(12)) => Some(15.0),
        (ConductorMaterial::Aluminum, ConductorSize::Awg(10)) => Some(25.0),
        _ => None,
    }
}

/// Calculate allowable ampacity.
pub async fn calculate<S: ReferenceStore>(
    input: &AmpacityInput,
    lookup: &ReferenceLookup<S>,
) -> CalcResult<AmpacityResult> {
    input.validate()?;

    let base = lookup
        .ampacity(input.material, input.size, input.insulation_rating)
        .await?
        .ampacity;
    let temperature_correction_factor = lookup
        .temperature_correction(input.insulation_rating, input.ambient_c)
        .await?
        .factor;
    let adjustment_factor = lookup
        .conductor_adjustment(input.current_carrying_conductors)
        .await?
        .factor;

    let adjusted_ampacity_a = base * temperature_correction_factor * adjustment_factor;

    let termination_rating = input.effective_termination_rating();
    let termination_ampacity_a = lookup
        .ampacity(input.material, input.size, termination_rating)
        .await?
        .ampacity;

    let (allowable_ampacity_a, limited_by) = if termination_ampacity_a < adjusted_ampacity_a {
        (termination_ampacity_a, AmpacityLimit::Termination)
    } else {
        (adjusted_ampacity_a, AmpacityLimit::ConditionsOfUse)
    };

    let max_overcurrent_device_a = small_conductor_ocpd_limit(input.material, input.size);

    let mut references = vec![
        nec_ref::AMPACITY_TABLE.to_string(),
        nec_ref::TEMPERATURE_CORRECTION.to_string(),
        nec_ref::BUNDLING_ADJUSTMENT.to_string(),
        nec_ref::TERMINATIONS.to_string(),
    ];
    if max_overcurrent_device_a.is_some() {
        references.push(nec_ref::SMALL_CONDUCTOR.to_string());
    }

    Ok(AmpacityResult {
        base_ampacity_a: base,
        temperature_correction_factor,
        adjustment_factor,
        adjusted_ampacity_a,
        termination_rating,
        termination_ampacity_a,
        allowable_ampacity_a,
        limited_by,
        max_overcurrent_device_a,
        references,
    })
}
