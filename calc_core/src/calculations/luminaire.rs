//! # Luminaire Layout (Lumen Method)
//!
//! Zonal-cavity lumen method with a bounded grid search for the fixture
//! layout.
//!
//! ```text
//! cavity height  hc  = ceiling − work plane
//! RCR                = 2.5 × hc × (L + W) / (L × W)
//! effective lumens   = lamp lumens × CU × LLF
//! fixtures           = ⌈fc × area / effective lumens⌉
//! foot-candles       = fixtures × effective lumens / area
//! ```
//!
//! "Rows" count fixture positions along the room length and "columns"
//! positions across its width. The spacing constraint compares each bay
//! (dimension ÷ count) against the mounting height above the work plane.
//!
//! Two problems are solved:
//!
//! - [`LuminaireTarget::FixtureCount`]: how many fixtures reach a target
//!   illuminance, and in which grid.
//! - [`LuminaireTarget::Footcandles`]: what illuminance a given number of
//!   fixtures delivers.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::luminaire::{calculate, CuSource, LayoutChoice, LuminaireInput, LuminaireTarget};
//! use calc_core::reference::ReferenceLookup;
//! use calc_core::settings::LightingSettings;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let lookup = ReferenceLookup::bundled().unwrap();
//! let input = LuminaireInput {
//!     label: "Office 101".to_string(),
//!     room_length_ft: 20.0,
//!     room_width_ft: 15.0,
//!     ceiling_height_ft: 9.0,
//!     work_plane_height_ft: 2.5,
//!     fixture_lumens: 3000.0,
//!     light_loss_factor: 0.8,
//!     fixture_watts: 32.0,
//!     cu: CuSource::Manual { cu: 0.7 },
//!     target: LuminaireTarget::FixtureCount {
//!         desired_footcandles: 50.0,
//!         layout: LayoutChoice::Auto,
//!     },
//! };
//! let result = calculate(&input, &lookup, &LightingSettings::default()).await.unwrap();
//! assert_eq!(result.min_fixtures, Some(9));
//! // 6.5 ft mounting height forces 4 rows × 3 columns
//! assert_eq!((result.rows, result.columns), (4, 3));
//! # });
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::reference::{ReferenceLookup, ReferenceStore};
use crate::settings::{LightingSettings, MAX_GRID_DIMENSION};

use super::form;

/// Tolerance on the spacing-ratio comparison.
const RATIO_EPSILON: f64 = 1e-9;

// ============================================================================
// Layout Choices
// ============================================================================

/// Where the coefficient of utilization comes from.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CuSource {
    /// Interpolate the bundled CU table for these reflectances (percent)
    Table { ceiling: f64, wall: f64, floor: f64 },
    /// Use a known CU directly
    Manual { cu: f64 },
}

/// Fixed layout shapes; the fixture count follows from the shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FixedPattern {
    TwoByTwo,
    TwoByThree,
    ThreeByThree,
    TwoByFour,
    ThreeByFour,
    FourByFour,
}

impl FixedPattern {
    pub const ALL: [FixedPattern; 6] = [
        FixedPattern::TwoByTwo,
        FixedPattern::TwoByThree,
        FixedPattern::ThreeByThree,
        FixedPattern::TwoByFour,
        FixedPattern::ThreeByFour,
        FixedPattern::FourByFour,
    ];

    /// (rows, columns)
    pub fn dimensions(&self) -> (u32, u32) {
        match self {
            FixedPattern::TwoByTwo => (2, 2),
            FixedPattern::TwoByThree => (2, 3),
            FixedPattern::ThreeByThree => (3, 3),
            FixedPattern::TwoByFour => (2, 4),
            FixedPattern::ThreeByFour => (3, 4),
            FixedPattern::FourByFour => (4, 4),
        }
    }

    /// Parse "2x3", "2 × 3", "2 by 3".
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let normalized = s.trim().to_lowercase().replace(['×', '*'], "x").replace("by", "x").replace(' ', "");
        FixedPattern::ALL
            .into_iter()
            .find(|p| {
                let (r, c) = p.dimensions();
                normalized == format!("{}x{}", r, c)
            })
            .ok_or_else(|| CalcError::invalid_input("layout", s, "Expected 2x2, 2x3, 3x3, 2x4, 3x4 or 4x4"))
    }
}

/// Layout for the fixture-count problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayoutChoice {
    /// Search for the grid with the fewest fixtures
    #[default]
    Auto,
    /// A grid chosen by the user, checked against the constraints
    Manual { rows: u32, columns: u32 },
    Fixed { pattern: FixedPattern },
}

/// Layout for the foot-candle problem.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CountLayout {
    /// Arrange this many fixtures in the grid closest to the room's shape
    Grid { fixture_count: u32 },
    Fixed { pattern: FixedPattern },
}

/// What to solve for.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "solve_for", rename_all = "snake_case")]
pub enum LuminaireTarget {
    FixtureCount {
        desired_footcandles: f64,
        #[serde(default)]
        layout: LayoutChoice,
    },
    Footcandles { layout: CountLayout },
}

// ============================================================================
// Input
// ============================================================================

/// Input parameters for a luminaire layout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuminaireInput {
    #[serde(default)]
    pub label: String,
    pub room_length_ft: f64,
    pub room_width_ft: f64,
    pub ceiling_height_ft: f64,
    pub work_plane_height_ft: f64,
    /// Initial lumens per fixture
    pub fixture_lumens: f64,
    pub light_loss_factor: f64,
    #[serde(default)]
    pub fixture_watts: f64,
    pub cu: CuSource,
    pub target: LuminaireTarget,
}

fn positive(value: f64, field: &str) -> CalcResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), "Must be greater than zero"))
    }
}

fn percent(value: f64, field: &str) -> CalcResult<()> {
    if (0.0..=100.0).contains(&value) {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), "Reflectance must be between 0 and 100"))
    }
}

impl LuminaireInput {
    pub fn validate(&self) -> CalcResult<()> {
        positive(self.room_length_ft, "Room Length")?;
        positive(self.room_width_ft, "Room Width")?;
        positive(self.ceiling_height_ft, "Ceiling Height")?;
        if !(self.work_plane_height_ft >= 0.0) {
            return Err(CalcError::invalid_input(
                "Work Plane Height",
                self.work_plane_height_ft.to_string(),
                "Height cannot be negative",
            ));
        }
        if self.work_plane_height_ft >= self.ceiling_height_ft {
            return Err(CalcError::invalid_input(
                "Work Plane Height",
                self.work_plane_height_ft.to_string(),
                "Work-plane height must be less than ceiling height",
            ));
        }
        positive(self.fixture_lumens, "Fixture Lumens")?;
        if !(self.light_loss_factor > 0.0 && self.light_loss_factor <= 1.0) {
            return Err(CalcError::invalid_input(
                "Light Loss Factor",
                self.light_loss_factor.to_string(),
                "Light loss factor must be greater than 0 and at most 1",
            ));
        }
        if !(self.fixture_watts >= 0.0) {
            return Err(CalcError::invalid_input(
                "Fixture Watts",
                self.fixture_watts.to_string(),
                "Wattage cannot be negative",
            ));
        }

        match self.cu {
            CuSource::Table { ceiling, wall, floor } => {
                percent(ceiling, "Ceiling Reflectance")?;
                percent(wall, "Wall Reflectance")?;
                percent(floor, "Floor Reflectance")?;
            }
            CuSource::Manual { cu } => {
                if !(0.0..=1.0).contains(&cu) {
                    return Err(CalcError::invalid_input(
                        "Coefficient of Utilization",
                        cu.to_string(),
                        "CU must be between 0 and 1",
                    ));
                }
            }
        }

        match self.target {
            LuminaireTarget::FixtureCount {
                desired_footcandles,
                layout,
            } => {
                positive(desired_footcandles, "Desired Foot-candles")?;
                if let LayoutChoice::Manual { rows, columns } = layout {
                    if rows == 0 || columns == 0 {
                        return Err(CalcError::invalid_input(
                            "Rows",
                            format!("{} x {}", rows, columns),
                            "Rows and columns must be at least 1",
                        ));
                    }
                }
            }
            LuminaireTarget::Footcandles {
                layout: CountLayout::Grid { fixture_count: 0 },
            } => {
                return Err(CalcError::invalid_input(
                    "Number of Fixtures",
                    "0",
                    "At least one fixture is required",
                ));
            }
            LuminaireTarget::Footcandles { .. } => {}
        }
        Ok(())
    }

    pub fn room_area_ft2(&self) -> f64 {
        self.room_length_ft * self.room_width_ft
    }

    /// Distance from the work plane to the ceiling, which is also the
    /// mounting height used by the spacing constraint.
    pub fn cavity_height_ft(&self) -> f64 {
        self.ceiling_height_ft - self.work_plane_height_ft
    }

    pub fn room_cavity_ratio(&self) -> f64 {
        room_cavity_ratio(self.room_length_ft, self.room_width_ft, self.cavity_height_ft())
    }
}

/// `RCR = 2.5 × hc × (L + W) / (L × W)`
pub fn room_cavity_ratio(length: f64, width: f64, cavity_height: f64) -> f64 {
    2.5 * cavity_height * (length + width) / (length * width)
}

/// Textual form for [`LuminaireInput`].
///
/// `solve_for` is "fixtures" (default) or "footcandles". `layout` is
/// "auto" (or "grid"), "manual" or a fixed shape such as "3x3". A filled-in
/// `cu` overrides the reflectances.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LuminaireForm {
    pub label: String,
    pub room_length: String,
    pub room_width: String,
    pub ceiling_height: String,
    pub work_plane_height: String,
    pub fixture_lumens: String,
    pub light_loss_factor: String,
    pub fixture_watts: String,
    pub cu: String,
    pub ceiling_reflectance: String,
    pub wall_reflectance: String,
    pub floor_reflectance: String,
    pub solve_for: String,
    pub desired_footcandles: String,
    pub fixture_count: String,
    pub layout: String,
    pub rows: String,
    pub columns: String,
}

impl LuminaireForm {
    pub fn parse(&self) -> CalcResult<LuminaireInput> {
        let cu = match form::optional_f64(&self.cu, "Coefficient of Utilization")? {
            Some(cu) => CuSource::Manual { cu },
            None => CuSource::Table {
                ceiling: form::required_f64(&self.ceiling_reflectance, "Ceiling Reflectance")?,
                wall: form::required_f64(&self.wall_reflectance, "Wall Reflectance")?,
                floor: form::required_f64(&self.floor_reflectance, "Floor Reflectance")?,
            },
        };

        let layout = self.layout.trim().to_lowercase();
        let fixed = match layout.as_str() {
            "" | "auto" | "grid" | "manual" => None,
            _ => Some(form::required_with(&self.layout, "Layout", FixedPattern::from_str_flexible)?),
        };

        let target = match self.solve_for.trim().to_lowercase().replace(['-', ' ', '_'], "").as_str() {
            "" | "fixtures" | "fixturecount" => {
                let layout = match fixed {
                    Some(pattern) => LayoutChoice::Fixed { pattern },
                    None if layout == "manual" => LayoutChoice::Manual {
                        rows: form::required_u32(&self.rows, "Rows")?,
                        columns: form::required_u32(&self.columns, "Columns")?,
                    },
                    None => LayoutChoice::Auto,
                };
                LuminaireTarget::FixtureCount {
                    desired_footcandles: form::required_f64(&self.desired_footcandles, "Desired Foot-candles")?,
                    layout,
                }
            }
            "footcandles" | "fc" => {
                let layout = match fixed {
                    Some(pattern) => CountLayout::Fixed { pattern },
                    None => CountLayout::Grid {
                        fixture_count: form::required_u32(&self.fixture_count, "Number of Fixtures")?,
                    },
                };
                LuminaireTarget::Footcandles { layout }
            }
            _ => {
                return Err(CalcError::invalid_input(
                    "Solve For",
                    &self.solve_for,
                    "Expected fixtures or footcandles",
                ))
            }
        };

        Ok(LuminaireInput {
            label: self.label.clone(),
            room_length_ft: form::required_f64(&self.room_length, "Room Length")?,
            room_width_ft: form::required_f64(&self.room_width, "Room Width")?,
            ceiling_height_ft: form::required_f64(&self.ceiling_height, "Ceiling Height")?,
            work_plane_height_ft: form::required_f64(&self.work_plane_height, "Work Plane Height")?,
            fixture_lumens: form::required_f64(&self.fixture_lumens, "Fixture Lumens")?,
            light_loss_factor: form::required_f64(&self.light_loss_factor, "Light Loss Factor")?,
            fixture_watts: form::optional_f64(&self.fixture_watts, "Fixture Watts")?.unwrap_or(0.0),
            cu,
            target,
        })
    }
}

// ============================================================================
// Result
// ============================================================================

/// How fixtures sit in the room, which decides the spacing formula.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Placement {
    /// End fixtures on the room boundary: spacing = dimension ÷ (n − 1)
    Grid,
    /// Fixtures centered in equal bays: spacing = dimension ÷ n
    Bays,
}

impl Placement {
    pub fn spacing(&self, dimension: f64, count: u32) -> f64 {
        match self {
            Placement::Grid if count > 1 => dimension / f64::from(count - 1),
            Placement::Grid => dimension,
            Placement::Bays => dimension / f64::from(count),
        }
    }
}

/// Results from a luminaire layout calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LuminaireResult {
    pub room_area_ft2: f64,
    pub cavity_height_ft: f64,
    pub room_cavity_ratio: f64,
    pub coefficient_of_utilization: f64,
    pub effective_lumens_per_fixture: f64,
    /// Fixtures needed for the target, when solving for fixture count
    pub min_fixtures: Option<u32>,
    pub rows: u32,
    pub columns: u32,
    pub fixture_count: u32,
    pub footcandles: f64,
    /// Whether the layout reaches the target, when solving for fixture count
    pub meets_target: Option<bool>,
    pub placement: Placement,
    /// Distance between fixtures along the length
    pub length_spacing_ft: f64,
    /// Distance between fixtures across the width
    pub width_spacing_ft: f64,
    pub length_offset_ft: f64,
    pub width_offset_ft: f64,
    /// Larger of the two bay spacings (dimension ÷ n) ÷ mounting height
    pub spacing_ratio: f64,
    /// Whether `spacing_ratio` is within the maximum
    pub spacing_ok: bool,
    /// Larger of the two reported fixture spacings ÷ mounting height; for
    /// grid placement this uses dimension ÷ (n − 1) and can exceed
    /// `spacing_ratio`
    pub fixture_spacing_ratio: f64,
    pub total_watts: f64,
    pub watts_per_ft2: f64,
}

// ============================================================================
// Layout Search
// ============================================================================

fn grid_cap(settings: &LightingSettings) -> u32 {
    settings.max_grid_dimension.clamp(1, MAX_GRID_DIMENSION)
}

/// Fixture count of a caller-chosen `rows × columns` grid, rejecting grids
/// wider than the configured cap.
fn manual_grid_count(rows: u32, columns: u32, settings: &LightingSettings) -> CalcResult<u32> {
    let cap = grid_cap(settings);
    let grid = || format!("{} x {}", rows, columns);
    if rows > cap || columns > cap {
        return Err(CalcError::invalid_input(
            "Rows",
            grid(),
            format!("Rows and columns are limited to {}", cap),
        ));
    }
    rows.checked_mul(columns)
        .ok_or_else(|| CalcError::invalid_input("Rows", grid(), "Grid is too large"))
}

/// Bay spacing ÷ mounting height for a `rows × columns` grid; the larger
/// of the two directions.
pub fn bay_spacing_ratio(length: f64, width: f64, mounting_height: f64, rows: u32, columns: u32) -> f64 {
    let along = length / f64::from(rows) / mounting_height;
    let across = width / f64::from(columns) / mounting_height;
    along.max(across)
}

/// Fewest fixtures in a grid that holds at least `min_fixtures` with every
/// bay no wider than the maximum spacing.
///
/// Candidates run rows-major from 1×1; the first grid reaching the minimum
/// count wins ties. Rows and columns are each capped at
/// `settings.max_grid_dimension`.
pub fn search_grid(
    length: f64,
    width: f64,
    mounting_height: f64,
    min_fixtures: u32,
    settings: &LightingSettings,
) -> CalcResult<(u32, u32)> {
    let max_spacing = mounting_height * settings.max_spacing_ratio;
    let cap = grid_cap(settings);

    // Fewest positions that keep each bay within the maximum spacing.
    let min_rows = ((length / max_spacing).ceil() as u32).max(1);
    let min_columns = ((width / max_spacing).ceil() as u32).max(1);
    let needed = min_fixtures.max(1);
    let max_rows = min_rows.max(needed.div_ceil(min_columns)).min(cap);
    let max_columns = min_columns.max(needed.div_ceil(min_rows)).min(cap);

    tracing::debug!(
        min_fixtures,
        max_spacing,
        max_rows,
        max_columns,
        "searching luminaire grid"
    );

    let mut best: Option<(u32, u32)> = None;
    for rows in 1..=max_rows {
        for columns in 1..=max_columns {
            let count = rows * columns;
            if count < needed {
                continue;
            }
            let ratio = bay_spacing_ratio(length, width, mounting_height, rows, columns);
            if ratio > settings.max_spacing_ratio + RATIO_EPSILON {
                continue;
            }
            if best.map_or(true, |(r, c)| count < r * c) {
                best = Some((rows, columns));
            }
        }
    }

    match best {
        Some((rows, columns)) => {
            tracing::debug!(rows, columns, "selected luminaire grid");
            Ok((rows, columns))
        }
        None => Err(CalcError::calculation_failed(
            "Luminaire Layout",
            format!(
                "No grid up to {cap} x {cap} keeps fixture spacing within {:.2} ft",
                max_spacing
            ),
        )),
    }
}

/// Factor `fixture_count` into the grid whose rows:columns ratio is closest
/// to the room's length:width. The first closest factorization wins.
pub fn grid_for_count(fixture_count: u32, length: f64, width: f64) -> (u32, u32) {
    let room_aspect = length / width;
    let mut best = (1, fixture_count);
    let mut best_difference = f64::INFINITY;
    for rows in (1..=fixture_count).filter(|r| fixture_count % r == 0) {
        let columns = fixture_count / rows;
        let difference = (f64::from(rows) / f64::from(columns) - room_aspect).abs();
        if difference < best_difference {
            best = (rows, columns);
            best_difference = difference;
        }
    }
    best
}

// ============================================================================
// Calculation
// ============================================================================

async fn resolve_cu<S: ReferenceStore>(input: &LuminaireInput, lookup: &ReferenceLookup<S>) -> CalcResult<f64> {
    match input.cu {
        CuSource::Manual { cu } => Ok(cu),
        CuSource::Table { ceiling, wall, floor } => {
            lookup
                .coefficient_of_utilization(
                    ceiling.round() as u32,
                    wall.round() as u32,
                    floor.round() as u32,
                    input.room_cavity_ratio(),
                )
                .await
        }
    }
}

/// Calculate a luminaire layout.
pub async fn calculate<S: ReferenceStore>(
    input: &LuminaireInput,
    lookup: &ReferenceLookup<S>,
    settings: &LightingSettings,
) -> CalcResult<LuminaireResult> {
    input.validate()?;

    let length = input.room_length_ft;
    let width = input.room_width_ft;
    let area = input.room_area_ft2();
    let cavity_height_ft = input.cavity_height_ft();
    let room_cavity_ratio = input.room_cavity_ratio();

    let cu = resolve_cu(input, lookup).await?;
    let effective_lumens = input.fixture_lumens * cu * input.light_loss_factor;
    if !(effective_lumens > 0.0) {
        return Err(CalcError::calculation_failed(
            "Luminaire Layout",
            "Effective lumens per fixture must be greater than zero",
        ));
    }

    let (rows, columns, placement, min_fixtures) = match input.target {
        LuminaireTarget::FixtureCount {
            desired_footcandles,
            layout,
        } => {
            let min_fixtures = (desired_footcandles * area / effective_lumens).ceil() as u32;
            let (rows, columns, placement) = match layout {
                LayoutChoice::Auto => {
                    let (rows, columns) = search_grid(length, width, cavity_height_ft, min_fixtures, settings)?;
                    (rows, columns, Placement::Grid)
                }
                LayoutChoice::Manual { rows, columns } => {
                    let count = manual_grid_count(rows, columns, settings)?;
                    if count < min_fixtures {
                        return Err(CalcError::calculation_failed(
                            "Luminaire Layout",
                            format!(
                                "{} x {} gives {} fixtures; at least {} are needed",
                                rows, columns, count, min_fixtures
                            ),
                        ));
                    }
                    let ratio = bay_spacing_ratio(length, width, cavity_height_ft, rows, columns);
                    if ratio > settings.max_spacing_ratio + RATIO_EPSILON {
                        return Err(CalcError::calculation_failed(
                            "Luminaire Layout",
                            format!(
                                "{} x {} spacing ratio {:.2} exceeds the maximum {:.2}",
                                rows, columns, ratio, settings.max_spacing_ratio
                            ),
                        ));
                    }
                    (rows, columns, Placement::Grid)
                }
                LayoutChoice::Fixed { pattern } => {
                    let (rows, columns) = pattern.dimensions();
                    (rows, columns, Placement::Bays)
                }
            };
            (rows, columns, placement, Some(min_fixtures))
        }
        LuminaireTarget::Footcandles { layout } => {
            let (rows, columns, placement) = match layout {
                CountLayout::Grid { fixture_count } => {
                    let cap = u64::from(grid_cap(settings));
                    if u64::from(fixture_count) > cap * cap {
                        return Err(CalcError::invalid_input(
                            "Number of Fixtures",
                            fixture_count.to_string(),
                            format!("At most {} fixtures are supported", cap * cap),
                        ));
                    }
                    let (rows, columns) = grid_for_count(fixture_count, length, width);
                    (rows, columns, Placement::Grid)
                }
                CountLayout::Fixed { pattern } => {
                    let (rows, columns) = pattern.dimensions();
                    (rows, columns, Placement::Bays)
                }
            };
            (rows, columns, placement, None)
        }
    };

    let fixture_count = rows
        .checked_mul(columns)
        .ok_or_else(|| CalcError::calculation_failed("Luminaire Layout", "Fixture count overflow"))?;
    let footcandles = f64::from(fixture_count) * effective_lumens / area;
    let meets_target = match input.target {
        LuminaireTarget::FixtureCount {
            desired_footcandles, ..
        } => Some(footcandles + RATIO_EPSILON >= desired_footcandles),
        LuminaireTarget::Footcandles { .. } => None,
    };

    let length_spacing_ft = placement.spacing(length, rows);
    let width_spacing_ft = placement.spacing(width, columns);
    let spacing_ratio = bay_spacing_ratio(length, width, cavity_height_ft, rows, columns);
    let fixture_spacing_ratio = length_spacing_ft.max(width_spacing_ft) / cavity_height_ft;
    let total_watts = f64::from(fixture_count) * input.fixture_watts;

    Ok(LuminaireResult {
        room_area_ft2: area,
        cavity_height_ft,
        room_cavity_ratio,
        coefficient_of_utilization: cu,
        effective_lumens_per_fixture: effective_lumens,
        min_fixtures,
        rows,
        columns,
        fixture_count,
        footcandles,
        meets_target,
        placement,
        length_spacing_ft,
        width_spacing_ft,
        length_offset_ft: length_spacing_ft / 2.0,
        width_offset_ft: width_spacing_ft / 2.0,
        spacing_ratio,
        spacing_ok: spacing_ratio <= settings.max_spacing_ratio + RATIO_EPSILON,
        fixture_spacing_ratio,
        total_watts,
        watts_per_ft2: total_watts / area,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::MemoryReferenceStore;

    fn lookup() -> ReferenceLookup<MemoryReferenceStore> {
        ReferenceLookup::bundled().unwrap()
    }

    fn office(target: LuminaireTarget) -> LuminaireInput {
        LuminaireInput {
            label: String::new(),
            room_length_ft: 20.0,
            room_width_ft: 15.0,
            ceiling_height_ft: 9.0,
            work_plane_height_ft: 2.5,
            fixture_lumens: 3000.0,
            light_loss_factor: 0.8,
            fixture_watts: 30.0,
            cu: CuSource::Manual { cu: 0.7 },
            target,
        }
    }

    fn fixture_count(layout: LayoutChoice) -> LuminaireTarget {
        LuminaireTarget::FixtureCount {
            desired_footcandles: 50.0,
            layout,
        }
    }

    #[tokio::test]
    async fn test_auto_grid() {
        let input = office(fixture_count(LayoutChoice::Auto));
        let result = calculate(&input, &lookup(), &LightingSettings::default()).await.unwrap();

        assert!((result.room_cavity_ratio - 1.8958).abs() < 1e-3);
        assert!((result.effective_lumens_per_fixture - 1680.0).abs() < 1e-9);
        assert_eq!(result.min_fixtures, Some(9));
        assert_eq!((result.rows, result.columns), (4, 3));
        assert_eq!(result.fixture_count, 12);
        assert!((result.footcandles - 67.2).abs() < 1e-9);
        assert_eq!(result.meets_target, Some(true));
        assert_eq!(result.placement, Placement::Grid);
        // boundary-anchored: 20 / 3 and 15 / 2
        assert!((result.length_spacing_ft - 6.6667).abs() < 1e-3);
        assert_eq!(result.width_spacing_ft, 7.5);
        assert_eq!(result.width_offset_ft, 3.75);
        // bays are 5 ft each way; the reported 7.5 ft spacing is wider
        assert!((result.spacing_ratio - 5.0 / 6.5).abs() < 1e-9);
        assert!(result.spacing_ok);
        assert!((result.fixture_spacing_ratio - 7.5 / 6.5).abs() < 1e-9);
        assert_eq!(result.total_watts, 360.0);
        assert!((result.watts_per_ft2 - 1.2).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_relaxed_spacing_needs_fewer_fixtures() {
        let settings = LightingSettings {
            max_spacing_ratio: 1.5,
            ..LightingSettings::default()
        };
        let input = office(fixture_count(LayoutChoice::Auto));
        let result = calculate(&input, &lookup(), &settings).await.unwrap();
        // 9.75 ft bays: at least 3 × 2, and 9 needed. 3 × 3 is the first 9.
        assert_eq!((result.rows, result.columns), (3, 3));
    }

    #[test]
    fn test_search_exhaustion() {
        let settings = LightingSettings {
            max_spacing_ratio: 1.0,
            max_grid_dimension: 2,
        };
        let err = search_grid(100.0, 100.0, 5.0, 4, &settings).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_search_first_minimal_wins() {
        // no spacing pressure: 1 × 6 comes first in rows-major order
        let settings = LightingSettings::default();
        assert_eq!(search_grid(10.0, 10.0, 20.0, 6, &settings).unwrap(), (1, 6));
        assert_eq!(search_grid(10.0, 10.0, 20.0, 1, &settings).unwrap(), (1, 1));
    }

    #[tokio::test]
    async fn test_manual_layout_checks() {
        let settings = LightingSettings::default();

        let input = office(fixture_count(LayoutChoice::Manual { rows: 4, columns: 3 }));
        let result = calculate(&input, &lookup(), &settings).await.unwrap();
        assert_eq!(result.fixture_count, 12);

        // 9 fixtures but 6.67 ft bays against 6.5 ft mounting height
        let input = office(fixture_count(LayoutChoice::Manual { rows: 3, columns: 3 }));
        let err = calculate(&input, &lookup(), &settings).await.unwrap_err();
        assert!(err.to_string().contains("spacing ratio"));

        let input = office(fixture_count(LayoutChoice::Manual { rows: 2, columns: 4 }));
        let err = calculate(&input, &lookup(), &settings).await.unwrap_err();
        assert!(err.to_string().contains("at least 9"));
    }

    #[tokio::test]
    async fn test_oversized_manual_grid_rejected() {
        let settings = LightingSettings::default();
        let input = office(fixture_count(LayoutChoice::Manual {
            rows: 70_000,
            columns: 70_000,
        }));
        let err = calculate(&input, &lookup(), &settings).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("limited to 100"));

        // a huge cap is clamped, so the product still cannot overflow
        let wide = LightingSettings {
            max_grid_dimension: u32::MAX,
            ..LightingSettings::default()
        };
        let err = calculate(&input, &lookup(), &wide).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[tokio::test]
    async fn test_large_fixture_count_rejected() {
        let input = office(LuminaireTarget::Footcandles {
            layout: CountLayout::Grid {
                fixture_count: 4_000_000_000,
            },
        });
        let err = calculate(&input, &lookup(), &LightingSettings::default()).await.unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("Number of Fixtures"));

        // the cap itself is accepted
        let input = office(LuminaireTarget::Footcandles {
            layout: CountLayout::Grid { fixture_count: 10_000 },
        });
        let result = calculate(&input, &lookup(), &LightingSettings::default()).await.unwrap();
        assert_eq!(result.fixture_count, 10_000);
    }

    #[tokio::test]
    async fn test_fixed_pattern_back_computes() {
        let settings = LightingSettings::default();
        let input = office(fixture_count(LayoutChoice::Fixed {
            pattern: FixedPattern::TwoByTwo,
        }));
        let result = calculate(&input, &lookup(), &settings).await.unwrap();
        assert_eq!(result.fixture_count, 4);
        assert!((result.footcandles - 22.4).abs() < 1e-9);
        assert_eq!(result.meets_target, Some(false));
        // centered in bays: 20 / 2
        assert_eq!(result.placement, Placement::Bays);
        assert_eq!(result.length_spacing_ft, 10.0);
        assert_eq!(result.length_offset_ft, 5.0);
    }

    #[tokio::test]
    async fn test_footcandles_for_count() {
        let input = office(LuminaireTarget::Footcandles {
            layout: CountLayout::Grid { fixture_count: 12 },
        });
        let result = calculate(&input, &lookup(), &LightingSettings::default()).await.unwrap();
        assert_eq!((result.rows, result.columns), (4, 3));
        assert!((result.footcandles - 67.2).abs() < 1e-9);
        assert_eq!(result.min_fixtures, None);
        assert_eq!(result.meets_target, None);
    }

    #[test]
    fn test_grid_for_count() {
        assert_eq!(grid_for_count(12, 20.0, 15.0), (4, 3));
        assert_eq!(grid_for_count(7, 20.0, 15.0), (1, 7));
        assert_eq!(grid_for_count(1, 20.0, 15.0), (1, 1));
        assert_eq!(grid_for_count(8, 40.0, 10.0), (4, 2));
    }

    #[tokio::test]
    async fn test_cu_from_table() {
        let mut input = office(fixture_count(LayoutChoice::Auto));
        input.cu = CuSource::Table {
            ceiling: 80.0,
            wall: 50.0,
            floor: 20.0,
        };
        let result = calculate(&input, &lookup(), &LightingSettings::default()).await.unwrap();
        // RCR 1.896 between 1 (0.66) and 2 (0.60)
        assert!((result.coefficient_of_utilization - 0.6062).abs() < 1e-3);

        input.cu = CuSource::Table {
            ceiling: 80.0,
            wall: 50.0,
            floor: 35.0,
        };
        let err = calculate(&input, &lookup(), &LightingSettings::default()).await.unwrap_err();
        assert_eq!(err.error_code(), "TABLE_NOT_FOUND");
    }

    #[tokio::test]
    async fn test_zero_cu_fails() {
        let mut input = office(fixture_count(LayoutChoice::Auto));
        input.cu = CuSource::Manual { cu: 0.0 };
        let err = calculate(&input, &lookup(), &LightingSettings::default()).await.unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_validation() {
        let mut input = office(fixture_count(LayoutChoice::Auto));
        input.work_plane_height_ft = 9.0;
        assert!(input
            .validate()
            .unwrap_err()
            .to_string()
            .contains("less than ceiling height"));

        let mut input = office(fixture_count(LayoutChoice::Auto));
        input.cu = CuSource::Table {
            ceiling: 120.0,
            wall: 50.0,
            floor: 20.0,
        };
        assert!(input.validate().unwrap_err().to_string().contains("Ceiling Reflectance"));
    }

    #[test]
    fn test_form() {
        let form = LuminaireForm {
            room_length: "20".to_string(),
            room_width: "15".to_string(),
            ceiling_height: "9".to_string(),
            work_plane_height: "2.5".to_string(),
            fixture_lumens: "3,000".to_string(),
            light_loss_factor: "0.8".to_string(),
            cu: "0.7".to_string(),
            desired_footcandles: "50".to_string(),
            layout: "3 x 3".to_string(),
            ..Default::default()
        };
        let input = form.parse().unwrap();
        assert_eq!(input.cu, CuSource::Manual { cu: 0.7 });
        assert_eq!(
            input.target,
            LuminaireTarget::FixtureCount {
                desired_footcandles: 50.0,
                layout: LayoutChoice::Fixed {
                    pattern: FixedPattern::ThreeByThree
                },
            }
        );

        let bad = LuminaireForm {
            room_length: "twenty".to_string(),
            ..form.clone()
        };
        assert!(bad.parse().unwrap_err().to_string().contains("Room Length"));

        let count = LuminaireForm {
            solve_for: "footcandles".to_string(),
            layout: String::new(),
            fixture_count: "12".to_string(),
            ..form
        };
        assert_eq!(
            count.parse().unwrap().target,
            LuminaireTarget::Footcandles {
                layout: CountLayout::Grid { fixture_count: 12 }
            }
        );
    }
}
