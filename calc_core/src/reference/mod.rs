//! # Reference Data
//!
//! Code-reference tables the calculators consult: ampacity, conductor
//! resistance and impedance, conduit and wire areas, box-fill allowances,
//! temperature correction, bundling adjustment, motor tables, and
//! coefficients of utilization.
//!
//! ## Layers
//!
//! - [`ReferenceStore`] - the query interface of the data store. Every
//!   query is asynchronous and returns the row, or `None` for a miss.
//! - [`MemoryReferenceStore`] - an in-memory store populated from the
//!   bundled TOML tables ([`ReferenceBundle`]).
//! - [`ReferenceLookup`] - the lookup layer calculators are handed. It turns
//!   misses into [`CalcError::DataNotFound`](crate::errors::CalcError) with
//!   the offending key, and interpolates coefficient-of-utilization curves.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::conductors::{ConductorMaterial, ConductorSize, TemperatureRating};
//! use calc_core::reference::ReferenceLookup;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let lookup = ReferenceLookup::bundled().unwrap();
//! let row = lookup
//!     .ampacity(ConductorMaterial::Copper, ConductorSize::Awg(12), TemperatureRating::C75)
//!     .await
//!     .unwrap();
//! assert_eq!(row.ampacity, 25.0);
//! # });
//! ```

pub mod bundle;
pub mod interpolate;
pub mod lookup;
pub mod memory;

pub use bundle::ReferenceBundle;
pub use interpolate::interpolate_cu;
pub use lookup::ReferenceLookup;
pub use memory::{MemoryReferenceStore, TableSummary};

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::conductors::{
    BoxFillCategory, ConductorMaterial, ConductorSize, ConduitType, FuseClass, InsulationType, Phase,
    ProtectiveDevice, RacewayMaterial, TemperatureRating, TradeSize,
};

// ============================================================================
// Table Rows
// ============================================================================

/// Table 310.16 row: allowable ampacity for one material/size/rating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AmpacityEntry {
    pub material: ConductorMaterial,
    pub size: ConductorSize,
    pub temperature_rating: TemperatureRating,
    /// Amperes
    pub ampacity: f64,
}

/// Chapter 9 Table 8 row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConductorPropertiesEntry {
    pub material: ConductorMaterial,
    pub size: ConductorSize,
    /// DC resistance at 75 °C, ohms per 1000 ft
    pub dc_resistance_per_kft: f64,
    pub circular_mils: f64,
}

/// Chapter 9 Table 9 row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConductorImpedanceEntry {
    pub material: ConductorMaterial,
    pub size: ConductorSize,
    pub raceway: RacewayMaterial,
    /// Ohms per 1000 ft
    pub ac_resistance_per_kft: f64,
    /// Ohms per 1000 ft
    pub reactance_per_kft: f64,
}

/// Fraction of conduit area one conductor may occupy (Chapter 9 Table 1).
pub const FILL_ONE_WIRE: f64 = 0.53;
/// Fraction of conduit area two conductors may occupy.
pub const FILL_TWO_WIRES: f64 = 0.31;
/// Fraction of conduit area more than two conductors may occupy.
pub const FILL_OVER_TWO_WIRES: f64 = 0.40;

/// Chapter 9 Table 4 row with the Table 1 allowable areas precomputed.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConduitAreaEntry {
    pub conduit_type: ConduitType,
    pub trade_size: TradeSize,
    /// Total internal area, in²
    pub area_in2: f64,
    pub fill_one_wire_in2: f64,
    pub fill_two_wires_in2: f64,
    pub fill_over_two_wires_in2: f64,
}

impl ConduitAreaEntry {
    pub fn new(conduit_type: ConduitType, trade_size: TradeSize, area_in2: f64) -> Self {
        ConduitAreaEntry {
            conduit_type,
            trade_size,
            area_in2,
            fill_one_wire_in2: area_in2 * FILL_ONE_WIRE,
            fill_two_wires_in2: area_in2 * FILL_TWO_WIRES,
            fill_over_two_wires_in2: area_in2 * FILL_OVER_TWO_WIRES,
        }
    }

    /// Table 1 allowable area for `conductor_count` conductors.
    pub fn allowable_area_in2(&self, conductor_count: u32) -> f64 {
        match conductor_count {
            0 | 1 => self.fill_one_wire_in2,
            2 => self.fill_two_wires_in2,
            _ => self.fill_over_two_wires_in2,
        }
    }
}

/// Chapter 9 Table 5 row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct WireAreaEntry {
    pub insulation: InsulationType,
    pub size: ConductorSize,
    /// Area including insulation, in²
    pub area_in2: f64,
}

/// Table 314.16(B) allowance for one item category and size.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxFillAllowanceEntry {
    pub category: BoxFillCategory,
    /// `None` for categories not sized by a conductor
    pub size: Option<ConductorSize>,
    /// in³ per allowance
    pub volume_in3: f64,
    /// Allowances per counted item
    pub multiplier: u32,
}

/// Table 310.15(B)(1) point.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TemperatureCorrectionEntry {
    pub temperature_rating: TemperatureRating,
    /// Ambient °C (midpoint of the table band)
    pub ambient_c: f64,
    pub factor: f64,
}

/// Table 310.15(C)(1) range; bounds are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConductorAdjustmentEntry {
    pub min_count: u32,
    pub max_count: u32,
    pub factor: f64,
}

impl ConductorAdjustmentEntry {
    pub fn contains(&self, count: u32) -> bool {
        (self.min_count..=self.max_count).contains(&count)
    }
}

/// Tables 430.248 / 430.250 row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorFlcEntry {
    pub horsepower: f64,
    pub voltage: u32,
    pub phase: Phase,
    /// Full-load current, amperes
    pub flc: f64,
}

/// Table 430.52 row.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorProtectionPercentageEntry {
    pub device: ProtectiveDevice,
    /// Percent of FLC
    pub percent: f64,
}

/// Maximum standard fuse for a motor, one row per fuse class.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MotorFuseSizeEntry {
    pub class: FuseClass,
    pub horsepower: f64,
    pub voltage: u32,
    pub phase: Phase,
    /// Amperes
    pub fuse_amps: f64,
}

/// One point on a coefficient-of-utilization curve.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CuPoint {
    pub room_cavity_ratio: f64,
    pub cu: f64,
}

/// CU curve for one reflectance combination, points ascending by ratio.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CoefficientOfUtilizationTable {
    /// Ceiling cavity reflectance, percent
    pub ceiling: u32,
    /// Wall reflectance, percent
    pub wall: u32,
    /// Floor cavity reflectance, percent
    pub floor: u32,
    pub points: Vec<CuPoint>,
}

impl CoefficientOfUtilizationTable {
    /// Build a table, sorting the points by room cavity ratio.
    pub fn new(ceiling: u32, wall: u32, floor: u32, mut points: Vec<CuPoint>) -> Self {
        points.sort_by(|a, b| a.room_cavity_ratio.total_cmp(&b.room_cavity_ratio));
        CoefficientOfUtilizationTable {
            ceiling,
            wall,
            floor,
            points,
        }
    }
}

// ============================================================================
// Store Interface
// ============================================================================

/// Query interface of a reference data store.
///
/// Stores are read-only once populated, so implementations are shared
/// freely between concurrent calculations. A query returns `None` (or an
/// empty list) when no row matches.
pub trait ReferenceStore: Send + Sync {
    fn ampacity(
        &self,
        material: ConductorMaterial,
        size: ConductorSize,
        rating: TemperatureRating,
    ) -> impl Future<Output = Option<AmpacityEntry>> + Send;

    /// Every size in one material/rating column, ascending by size.
    fn ampacity_column(
        &self,
        material: ConductorMaterial,
        rating: TemperatureRating,
    ) -> impl Future<Output = Vec<AmpacityEntry>> + Send;

    fn conductor_properties(
        &self,
        material: ConductorMaterial,
        size: ConductorSize,
    ) -> impl Future<Output = Option<ConductorPropertiesEntry>> + Send;

    fn conductor_impedance(
        &self,
        material: ConductorMaterial,
        size: ConductorSize,
        raceway: RacewayMaterial,
    ) -> impl Future<Output = Option<ConductorImpedanceEntry>> + Send;

    fn conduit_area(
        &self,
        conduit_type: ConduitType,
        trade_size: TradeSize,
    ) -> impl Future<Output = Option<ConduitAreaEntry>> + Send;

    /// Every trade size of one conduit type, ascending by area.
    fn conduit_areas(&self, conduit_type: ConduitType) -> impl Future<Output = Vec<ConduitAreaEntry>> + Send;

    fn wire_area(
        &self,
        insulation: InsulationType,
        size: ConductorSize,
    ) -> impl Future<Output = Option<WireAreaEntry>> + Send;

    fn box_fill_allowance(
        &self,
        category: BoxFillCategory,
        size: Option<ConductorSize>,
    ) -> impl Future<Output = Option<BoxFillAllowanceEntry>> + Send;

    /// The stored row whose ambient temperature is closest to `ambient_c`.
    fn temperature_correction(
        &self,
        rating: TemperatureRating,
        ambient_c: f64,
    ) -> impl Future<Output = Option<TemperatureCorrectionEntry>> + Send;

    /// The range containing `count`.
    fn conductor_adjustment(&self, count: u32) -> impl Future<Output = Option<ConductorAdjustmentEntry>> + Send;

    fn motor_flc(
        &self,
        horsepower: f64,
        voltage: u32,
        phase: Phase,
    ) -> impl Future<Output = Option<MotorFlcEntry>> + Send;

    fn motor_protection_percentage(
        &self,
        device: ProtectiveDevice,
    ) -> impl Future<Output = Option<MotorProtectionPercentageEntry>> + Send;

    fn motor_fuse_size(
        &self,
        class: FuseClass,
        horsepower: f64,
        voltage: u32,
        phase: Phase,
    ) -> impl Future<Output = Option<MotorFuseSizeEntry>> + Send;

    fn cu_table(
        &self,
        ceiling: u32,
        wall: u32,
        floor: u32,
    ) -> impl Future<Output = Option<CoefficientOfUtilizationTable>> + Send;
}
