//! # Dwelling Service Load
//!
//! Standard-method service calculation for a one-family dwelling (Article
//! 220, Part III). Every step's value is kept in the result for audit.
//!
//! ```text
//! general lighting   = floor area × 3 VA/ft²                     220.12
//! small appliance    = max(circuits, 2) × 1500 VA                220.52(A)
//! laundry            = max(circuits, 1) × 1500 VA                220.52(B)
//! general demand     = first 3000 VA at 100 %, remainder at 35 %  Table 220.42
//! fixed appliances   = 75 % when four or more                    220.53
//! dryer              = max(nameplate, 5000 VA)                   220.54
//! range              = 8 kW up to 12 kW, +5 % per kW over        Table 220.55
//! HVAC               = larger of heating or cooling              220.60
//! ```
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::dwelling_load::{general_demand_va, range_demand_va};
//!
//! assert_eq!(general_demand_va(3000.0), 3000.0);
//! assert!((general_demand_va(4000.0) - 3350.0).abs() < 1e-9);
//! assert_eq!(range_demand_va(12.0), 8000.0);
//! assert!((range_demand_va(13.0) - 8400.0).abs() < 1e-9);
//! ```

use serde::{Deserialize, Serialize};

use crate::catalog::{next_standard_size, SERVICE_RATINGS};
use crate::errors::{CalcError, CalcResult};
use crate::settings::DwellingSettings;

use super::{form, nec_ref};

/// VA per small-appliance or laundry branch circuit
pub const BRANCH_CIRCUIT_VA: f64 = 1500.0;
/// Portion of the general load taken at 100 %
pub const GENERAL_FIRST_TIER_VA: f64 = 3000.0;
/// Demand factor on the general load above the first tier
pub const GENERAL_REMAINDER_FACTOR: f64 = 0.35;
/// Demand factor for four or more fixed appliances
pub const FIXED_APPLIANCE_FACTOR: f64 = 0.75;
/// Minimum dryer load
pub const DRYER_MIN_VA: f64 = 5000.0;
/// Column C demand for one range up to 12 kW
pub const RANGE_BASE_VA: f64 = 8000.0;
/// Increase per full kW over 12 kW
pub const RANGE_INCREASE_PER_KW: f64 = 0.05;

/// Input parameters for a dwelling service load calculation.
///
/// A dryer or range left as `None` is absent; any given nameplate, 0
/// included, gets the 220.54 / Table 220.55 minimums.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DwellingLoadInput {
    #[serde(default)]
    pub label: String,
    pub floor_area_ft2: f64,
    #[serde(default)]
    pub small_appliance_circuits: u32,
    #[serde(default)]
    pub laundry_circuits: u32,
    /// Nameplate VA of each fastened-in-place appliance
    #[serde(default)]
    pub fixed_appliances_va: Vec<f64>,
    #[serde(default)]
    pub dryer_va: Option<f64>,
    /// Range nameplate, kW
    #[serde(default)]
    pub range_kw: Option<f64>,
    #[serde(default)]
    pub heating_va: f64,
    #[serde(default)]
    pub cooling_va: f64,
}

impl DwellingLoadInput {
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.floor_area_ft2 > 0.0) {
            return Err(CalcError::invalid_input(
                "Floor Area",
                self.floor_area_ft2.to_string(),
                "Floor area must be positive",
            ));
        }
        let non_negative = [
            ("Dryer", self.dryer_va.unwrap_or(0.0)),
            ("Range", self.range_kw.unwrap_or(0.0)),
            ("Heating", self.heating_va),
            ("Cooling", self.cooling_va),
        ];
        for (field, value) in non_negative {
            if !(value >= 0.0) {
                return Err(CalcError::invalid_input(field, value.to_string(), "Load cannot be negative"));
            }
        }
        if let Some(bad) = self.fixed_appliances_va.iter().find(|va| !(**va >= 0.0)) {
            return Err(CalcError::invalid_input(
                "Fixed Appliances",
                bad.to_string(),
                "Load cannot be negative",
            ));
        }
        Ok(())
    }
}

/// Textual form for [`DwellingLoadInput`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct DwellingLoadForm {
    pub label: String,
    pub floor_area: String,
    pub small_appliance_circuits: String,
    pub laundry_circuits: String,
    /// Comma-separated VA values
    pub fixed_appliances: String,
    pub dryer: String,
    pub range_kw: String,
    pub heating: String,
    pub cooling: String,
}

impl DwellingLoadForm {
    pub fn parse(&self) -> CalcResult<DwellingLoadInput> {
        let fixed_appliances_va = if self.fixed_appliances.trim().is_empty() {
            Vec::new()
        } else {
            form::number_list(&self.fixed_appliances, "Fixed Appliances")?
        };
        let zero_if_empty = |value: &str, label: &str| form::optional_f64(value, label).map(|v| v.unwrap_or(0.0));
        Ok(DwellingLoadInput {
            label: self.label.clone(),
            floor_area_ft2: form::required_f64(&self.floor_area, "Floor Area")?,
            small_appliance_circuits: form::optional_u32(&self.small_appliance_circuits, "Small Appliance Circuits")?
                .unwrap_or(2),
            laundry_circuits: form::optional_u32(&self.laundry_circuits, "Laundry Circuits")?.unwrap_or(1),
            fixed_appliances_va,
            dryer_va: form::optional_f64(&self.dryer, "Dryer")?,
            range_kw: form::optional_f64(&self.range_kw, "Range")?,
            heating_va: zero_if_empty(&self.heating, "Heating")?,
            cooling_va: zero_if_empty(&self.cooling, "Cooling")?,
        })
    }
}

/// Results from a dwelling service load calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DwellingLoadResult {
    pub general_lighting_va: f64,
    pub small_appliance_va: f64,
    pub laundry_va: f64,
    /// Lighting + small appliance + laundry
    pub general_subtotal_va: f64,
    /// After the Table 220.42 tiers
    pub general_demand_va: f64,
    pub fixed_appliance_count: usize,
    pub fixed_appliance_connected_va: f64,
    pub fixed_appliance_demand_factor: f64,
    pub fixed_appliance_demand_va: f64,
    pub dryer_demand_va: f64,
    pub range_demand_va: f64,
    pub hvac_demand_va: f64,
    pub total_demand_va: f64,
    pub service_voltage: f64,
    pub total_demand_a: f64,
    /// Next standard service rating, `None` above 400 A
    pub recommended_service_a: Option<f64>,
    pub references: Vec<String>,
}

/// Table 220.42 tiers: first 3000 VA at 100 %, remainder at 35 %.
pub fn general_demand_va(subtotal_va: f64) -> f64 {
    let first = subtotal_va.min(GENERAL_FIRST_TIER_VA);
    let remainder = (subtotal_va - GENERAL_FIRST_TIER_VA).max(0.0);
    first + remainder * GENERAL_REMAINDER_FACTOR
}

/// Table 220.55 Column C for a single range.
pub fn range_demand_va(nameplate_kw: f64) -> f64 {
    if nameplate_kw <= 12.0 {
        return RANGE_BASE_VA;
    }
    let kw_over = (nameplate_kw - 12.0).ceil();
    RANGE_BASE_VA * (1.0 + RANGE_INCREASE_PER_KW * kw_over)
}

/// Dryer demand, never below 5000 VA.
pub fn dryer_demand_va(nameplate_va: f64) -> f64 {
    nameplate_va.max(DRYER_MIN_VA)
}

/// Calculate the dwelling service load.
pub fn calculate(input: &DwellingLoadInput, settings: &DwellingSettings) -> CalcResult<DwellingLoadResult> {
    input.validate()?;

    let general_lighting_va = input.floor_area_ft2 * settings.general_lighting_va_per_unit_area;
    let small_appliance_va = f64::from(input.small_appliance_circuits.max(2)) * BRANCH_CIRCUIT_VA;
    let laundry_va = f64::from(input.laundry_circuits.max(1)) * BRANCH_CIRCUIT_VA;
    let general_subtotal_va = general_lighting_va + small_appliance_va + laundry_va;
    let general_demand_va = general_demand_va(general_subtotal_va);

    let fixed_appliance_count = input.fixed_appliances_va.len();
    let fixed_appliance_connected_va: f64 = input.fixed_appliances_va.iter().sum();
    let fixed_appliance_demand_factor = if fixed_appliance_count >= 4 {
        FIXED_APPLIANCE_FACTOR
    } else {
        1.0
    };
    let fixed_appliance_demand_va = fixed_appliance_connected_va * fixed_appliance_demand_factor;

    let dryer_demand_va = input.dryer_va.map_or(0.0, dryer_demand_va);
    let range_demand_va = input.range_kw.map_or(0.0, range_demand_va);
    let hvac_demand_va = input.heating_va.max(input.cooling_va);

    let total_demand_va =
        general_demand_va + fixed_appliance_demand_va + dryer_demand_va + range_demand_va + hvac_demand_va;
    let total_demand_a = total_demand_va / settings.service_voltage;

    Ok(DwellingLoadResult {
        general_lighting_va,
        small_appliance_va,
        laundry_va,
        general_subtotal_va,
        general_demand_va,
        fixed_appliance_count,
        fixed_appliance_connected_va,
        fixed_appliance_demand_factor,
        fixed_appliance_demand_va,
        dryer_demand_va,
        range_demand_va,
        hvac_demand_va,
        total_demand_va,
        service_voltage: settings.service_voltage,
        total_demand_a,
        recommended_service_a: next_standard_size(SERVICE_RATINGS, total_demand_a),
        references: [
            nec_ref::GENERAL_LIGHTING,
            nec_ref::SMALL_APPLIANCE_LAUNDRY,
            nec_ref::LIGHTING_DEMAND,
            nec_ref::FIXED_APPLIANCES,
            nec_ref::DRYER,
            nec_ref::RANGE,
            nec_ref::NONCOINCIDENT,
        ]
        .iter()
        .map(|r| r.to_string())
        .collect(),
    })
}
