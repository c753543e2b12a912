//! # Conduit Fill and Raceway Sizing
//!
//! Conductor fill per Chapter 9 Table 1: the total area of all conductors
//! (Table 5, including insulation) may not exceed a fraction of the conduit
//! internal area (Table 4) that depends on the conductor count.
//!
//! | Conductors | Allowable fill |
//! |------------|----------------|
//! | 1          | 53 %           |
//! | 2          | 31 %           |
//! | over 2     | 40 %           |
//! | nipple ≤ 24 in (Note 4) | 60 % |
//!
//! Raceway sizing inverts the check: the smallest trade size whose internal
//! area is at least `total conductor area / allowable fraction`.
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::conduit_fill::fill_fraction;
//!
//! assert_eq!(fill_fraction(1, false), 0.53);
//! assert_eq!(fill_fraction(2, false), 0.31);
//! assert_eq!(fill_fraction(3, false), 0.40);
//! assert_eq!(fill_fraction(3, true), 0.60);
//! ```

use serde::{Deserialize, Serialize};

use crate::conductors::{ConductorSize, ConduitType, InsulationType, TradeSize};
use crate::errors::{CalcError, CalcResult};
use crate::reference::{ReferenceLookup, ReferenceStore, FILL_ONE_WIRE, FILL_OVER_TWO_WIRES, FILL_TWO_WIRES};

use super::form;

/// Allowable fill for conduit nipples not exceeding 24 in (Chapter 9 Note 4).
pub const FILL_NIPPLE: f64 = 0.60;

/// Allowable fraction of conduit area for `conductor_count` conductors.
pub fn fill_fraction(conductor_count: u32, nipple: bool) -> f64 {
    if nipple {
        return FILL_NIPPLE;
    }
    match conductor_count {
        0 | 1 => FILL_ONE_WIRE,
        2 => FILL_TWO_WIRES,
        _ => FILL_OVER_TWO_WIRES,
    }
}

/// One group of identical conductors.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConductorGroup {
    pub size: ConductorSize,
    #[serde(default)]
    pub insulation: InsulationType,
    pub quantity: u32,
}

/// Conductor group with its looked-up area.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ConductorAreaLine {
    pub size: ConductorSize,
    pub insulation: InsulationType,
    pub quantity: u32,
    pub area_each_in2: f64,
    pub area_total_in2: f64,
}

fn validate_groups(conductors: &[ConductorGroup]) -> CalcResult<()> {
    if conductors.is_empty() {
        return Err(CalcError::missing_field("Conductors"));
    }
    if let Some(group) = conductors.iter().find(|g| g.quantity == 0) {
        return Err(CalcError::invalid_input(
            "Quantity",
            format!("0 × {} {}", group.size, group.insulation),
            "Quantity must be at least 1",
        ));
    }
    Ok(())
}

async fn conductor_areas<S: ReferenceStore>(
    conductors: &[ConductorGroup],
    lookup: &ReferenceLookup<S>,
) -> CalcResult<Vec<ConductorAreaLine>> {
    let mut lines = Vec::with_capacity(conductors.len());
    for group in conductors {
        let area_each_in2 = lookup.wire_area(group.insulation, group.size).await?.area_in2;
        lines.push(ConductorAreaLine {
            size: group.size,
            insulation: group.insulation,
            quantity: group.quantity,
            area_each_in2,
            area_total_in2: area_each_in2 * f64::from(group.quantity),
        });
    }
    Ok(lines)
}

/// Parse "3 x 12 THHN, 1 x 10 AWG XHHW" into conductor groups.
///
/// The quantity prefix is optional (defaults to 1) and the insulation
/// suffix is optional (defaults to THHN).
pub fn parse_conductor_list(value: &str, label: &str) -> CalcResult<Vec<ConductorGroup>> {
    let groups = value
        .split([',', ';'])
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| parse_conductor_group(item, label))
        .collect::<CalcResult<Vec<_>>>()?;
    if groups.is_empty() {
        return Err(CalcError::missing_field(label));
    }
    Ok(groups)
}

fn parse_conductor_group(item: &str, label: &str) -> CalcResult<ConductorGroup> {
    let invalid = || CalcError::invalid_input(label, item, "Expected entries like '3 x 12 AWG THHN'");

    // "3 x 12" has a quantity; "12 XHHW" does not
    let digits_end = item.find(|c: char| !c.is_ascii_digit()).unwrap_or(item.len());
    let quantity_rest = item[digits_end..]
        .trim_start()
        .strip_prefix(['x', 'X', '×'])
        .map(str::trim_start)
        .filter(|rest| digits_end > 0 && rest.starts_with(|c: char| c.is_ascii_digit() || c == '#'));
    let (quantity, rest) = match quantity_rest {
        Some(rest) => (item[..digits_end].parse::<u32>().map_err(|_| invalid())?, rest),
        None => (1, item),
    };

    let (size_text, insulation) = match rest.rsplit_once(' ') {
        Some((head, tail)) => match InsulationType::from_str_flexible(tail) {
            Ok(insulation) => (head, insulation),
            Err(_) => (rest, InsulationType::default()),
        },
        None => (rest, InsulationType::default()),
    };
    let size = ConductorSize::from_str_flexible(size_text).map_err(|_| invalid())?;

    Ok(ConductorGroup {
        size,
        insulation,
        quantity,
    })
}

// ============================================================================
// Conduit Fill
// ============================================================================

/// Input parameters for a conduit fill check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConduitFillInput {
    #[serde(default)]
    pub label: String,
    pub conduit_type: ConduitType,
    pub trade_size: TradeSize,
    pub conductors: Vec<ConductorGroup>,
    /// Nipple not exceeding 24 in
    #[serde(default)]
    pub nipple: bool,
}

impl ConduitFillInput {
    pub fn validate(&self) -> CalcResult<()> {
        validate_groups(&self.conductors)
    }

    pub fn conductor_count(&self) -> u32 {
        self.conductors.iter().map(|g| g.quantity).sum()
    }
}

/// Textual form for [`ConduitFillInput`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConduitFillForm {
    pub label: String,
    pub conduit_type: String,
    pub trade_size: String,
    /// e.g. "3 x 12 THHN, 1 x 12 XHHW"
    pub conductors: String,
    pub nipple: String,
}

impl ConduitFillForm {
    pub fn parse(&self) -> CalcResult<ConduitFillInput> {
        Ok(ConduitFillInput {
            label: self.label.clone(),
            conduit_type: form::required_with(&self.conduit_type, "Conduit Type", ConduitType::from_str_flexible)?,
            trade_size: form::required_with(&self.trade_size, "Trade Size", TradeSize::from_str_flexible)?,
            conductors: parse_conductor_list(&self.conductors, "Conductors")?,
            nipple: form::flag(&self.nipple, "Nipple")?,
        })
    }
}

/// Results from a conduit fill check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConduitFillResult {
    pub lines: Vec<ConductorAreaLine>,
    pub conductor_count: u32,
    pub total_conductor_area_in2: f64,
    pub conduit_area_in2: f64,
    pub fill_fraction: f64,
    pub allowable_area_in2: f64,
    /// Conductor area as a percentage of conduit area
    pub fill_percent: f64,
    pub overfilled: bool,
    /// Allowable minus used; negative when overfilled
    pub remaining_area_in2: f64,
    /// For a single conductor type: how many of it would fit
    pub max_same_conductors: Option<u32>,
}

/// Most conductors of one area that fit, accounting for the count-dependent
/// fill fraction.
pub fn max_conductors_of_area(conduit_area_in2: f64, conductor_area_in2: f64, nipple: bool) -> u32 {
    if conductor_area_in2 <= 0.0 {
        return 0;
    }
    let fits = |n: u32| f64::from(n) * conductor_area_in2 <= conduit_area_in2 * fill_fraction(n, nipple);

    let bulk = (conduit_area_in2 * fill_fraction(3, nipple) / conductor_area_in2).floor() as u32;
    if nipple || bulk >= 3 {
        // floor can land one off on exact boundaries
        return if fits(bulk + 1) { bulk + 1 } else { bulk };
    }
    [2, 1].into_iter().find(|&n| fits(n)).unwrap_or(0)
}

/// Check conductor fill for a conduit.
pub async fn calculate<S: ReferenceStore>(
    input: &ConduitFillInput,
    lookup: &ReferenceLookup<S>,
) -> CalcResult<ConduitFillResult> {
    input.validate()?;

    let lines = conductor_areas(&input.conductors, lookup).await?;
    let conduit = lookup.conduit_area(input.conduit_type, input.trade_size).await?;

    let conductor_count = input.conductor_count();
    let total_conductor_area_in2: f64 = lines.iter().map(|l| l.area_total_in2).sum();
    let fill_fraction = fill_fraction(conductor_count, input.nipple);
    let allowable_area_in2 = if input.nipple {
        conduit.area_in2 * FILL_NIPPLE
    } else {
        conduit.allowable_area_in2(conductor_count)
    };

    let max_same_conductors = match lines.as_slice() {
        [only] => Some(max_conductors_of_area(conduit.area_in2, only.area_each_in2, input.nipple)),
        _ => None,
    };

    Ok(ConduitFillResult {
        conductor_count,
        total_conductor_area_in2,
        conduit_area_in2: conduit.area_in2,
        fill_fraction,
        allowable_area_in2,
        fill_percent: total_conductor_area_in2 / conduit.area_in2 * 100.0,
        overfilled: total_conductor_area_in2 > allowable_area_in2,
        remaining_area_in2: allowable_area_in2 - total_conductor_area_in2,
        max_same_conductors,
        lines,
    })
}

// ============================================================================
// Raceway Sizing
// ============================================================================

/// Input parameters for raceway sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RacewaySizingInput {
    #[serde(default)]
    pub label: String,
    pub conduit_type: ConduitType,
    pub conductors: Vec<ConductorGroup>,
    #[serde(default)]
    pub nipple: bool,
}

impl RacewaySizingInput {
    pub fn validate(&self) -> CalcResult<()> {
        validate_groups(&self.conductors)
    }
}

/// Textual form for [`RacewaySizingInput`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct RacewaySizingForm {
    pub label: String,
    pub conduit_type: String,
    pub conductors: String,
    pub nipple: String,
}

impl RacewaySizingForm {
    pub fn parse(&self) -> CalcResult<RacewaySizingInput> {
        Ok(RacewaySizingInput {
            label: self.label.clone(),
            conduit_type: form::required_with(&self.conduit_type, "Conduit Type", ConduitType::from_str_flexible)?,
            conductors: parse_conductor_list(&self.conductors, "Conductors")?,
            nipple: form::flag(&self.nipple, "Nipple")?,
        })
    }
}

/// Results from raceway sizing.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RacewaySizingResult {
    pub lines: Vec<ConductorAreaLine>,
    pub conductor_count: u32,
    pub total_conductor_area_in2: f64,
    pub fill_fraction: f64,
    /// Total conductor area ÷ fill fraction
    pub required_area_in2: f64,
    pub trade_size: TradeSize,
    pub conduit_area_in2: f64,
    pub fill_percent: f64,
}

/// Select the smallest conduit that holds the conductors.
pub async fn size_raceway<S: ReferenceStore>(
    input: &RacewaySizingInput,
    lookup: &ReferenceLookup<S>,
) -> CalcResult<RacewaySizingResult> {
    input.validate()?;

    let lines = conductor_areas(&input.conductors, lookup).await?;
    let conductor_count: u32 = input.conductors.iter().map(|g| g.quantity).sum();
    let total_conductor_area_in2: f64 = lines.iter().map(|l| l.area_total_in2).sum();
    let fill_fraction = fill_fraction(conductor_count, input.nipple);
    let required_area_in2 = total_conductor_area_in2 / fill_fraction;

    let catalog = lookup.conduit_areas(input.conduit_type).await?;
    let selected = catalog
        .iter()
        .find(|entry| entry.area_in2 >= required_area_in2)
        .ok_or_else(|| {
            CalcError::calculation_failed(
                "Raceway Sizing",
                format!(
                    "{:.3} in² required exceeds the largest {} listed",
                    required_area_in2, input.conduit_type
                ),
            )
        })?;

    tracing::debug!(
        conduit = %input.conduit_type,
        trade_size = %selected.trade_size,
        required_area_in2,
        "selected raceway"
    );

    Ok(RacewaySizingResult {
        conductor_count,
        total_conductor_area_in2,
        fill_fraction,
        required_area_in2,
        trade_size: selected.trade_size,
        conduit_area_in2: selected.area_in2,
        fill_percent: total_conductor_area_in2 / selected.area_in2 * 100.0,
        lines,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::{ConduitAreaEntry, MemoryReferenceStore, WireAreaEntry};

    fn lookup() -> ReferenceLookup<MemoryReferenceStore> {
        ReferenceLookup::bundled().unwrap()
    }

    fn thhn(size: ConductorSize, quantity: u32) -> ConductorGroup {
        ConductorGroup {
            size,
            insulation: InsulationType::Thhn,
            quantity,
        }
    }

    #[test]
    fn test_fill_fraction_boundaries() {
        assert_eq!(fill_fraction(1, false), 0.53);
        assert_eq!(fill_fraction(2, false), 0.31);
        assert_eq!(fill_fraction(3, false), 0.40);
        assert_eq!(fill_fraction(40, false), 0.40);
        assert_eq!(fill_fraction(1, true), 0.60);
    }

    #[tokio::test]
    async fn test_allowable_area_comes_from_table_row() {
        let mut row = ConduitAreaEntry::new(ConduitType::Emt, TradeSize::Half, 0.304);
        assert_eq!(row.allowable_area_in2(1), 0.304 * 0.53);
        assert_eq!(row.allowable_area_in2(2), 0.304 * 0.31);
        assert_eq!(row.allowable_area_in2(7), 0.304 * 0.40);

        // The stored row's allowable area is used as published.
        row.fill_over_two_wires_in2 = 0.122;
        let mut store = MemoryReferenceStore::new();
        store.insert_conduit_area(row);
        store.insert_wire_area(WireAreaEntry {
            insulation: InsulationType::Thhn,
            size: ConductorSize::Awg(12),
            area_in2: 0.0133,
        });
        let input = ConduitFillInput {
            label: String::new(),
            conduit_type: ConduitType::Emt,
            trade_size: TradeSize::Half,
            conductors: vec![thhn(ConductorSize::Awg(12), 3)],
            nipple: false,
        };
        let lookup = ReferenceLookup::new(store);
        let result = calculate(&input, &lookup).await.unwrap();
        assert_eq!(result.allowable_area_in2, 0.122);

        let nipple = ConduitFillInput { nipple: true, ..input };
        let result = calculate(&nipple, &lookup).await.unwrap();
        assert_eq!(result.allowable_area_in2, 0.304 * 0.60);
    }

    #[tokio::test]
    async fn test_fill_check() {
        let input = ConduitFillInput {
            label: "Home run".to_string(),
            conduit_type: ConduitType::Emt,
            trade_size: TradeSize::Half,
            conductors: vec![thhn(ConductorSize::Awg(12), 4), thhn(ConductorSize::Awg(10), 2)],
            nipple: false,
        };
        let result = calculate(&input, &lookup()).await.unwrap();
        let total = 4.0 * 0.0133 + 2.0 * 0.0211;
        assert_eq!(result.conductor_count, 6);
        assert!((result.total_conductor_area_in2 - total).abs() < 1e-12);
        assert_eq!(result.fill_fraction, 0.40);
        assert!((result.allowable_area_in2 - 0.304 * 0.40).abs() < 1e-12);
        assert!(!result.overfilled);
        assert_eq!(result.max_same_conductors, None);
        assert_eq!(result.lines.len(), 2);
    }

    #[tokio::test]
    async fn test_overfill() {
        let input = ConduitFillInput {
            label: String::new(),
            conduit_type: ConduitType::Emt,
            trade_size: TradeSize::Half,
            conductors: vec![thhn(ConductorSize::Awg(8), 4)],
            nipple: false,
        };
        let result = calculate(&input, &lookup()).await.unwrap();
        // 4 × 0.0366 = 0.1464 > 0.1216
        assert!(result.overfilled);
        assert!(result.remaining_area_in2 < 0.0);
        assert_eq!(result.max_same_conductors, Some(3));
    }

    #[test]
    fn test_max_conductors() {
        // 12 AWG THHN in 1/2" EMT: 0.1216 / 0.0133 = 9.14
        assert_eq!(max_conductors_of_area(0.304, 0.0133, false), 9);
        // one large conductor that fits only alone at 53 %
        assert_eq!(max_conductors_of_area(0.304, 0.15, false), 1);
        assert_eq!(max_conductors_of_area(0.304, 0.2, false), 0);
        // 0.60 / 0.07 = 8.57
        assert_eq!(max_conductors_of_area(1.0, 0.07, true), 8);
    }

    #[tokio::test]
    async fn test_raceway_sizing() {
        let input = RacewaySizingInput {
            label: String::new(),
            conduit_type: ConduitType::Emt,
            conductors: vec![thhn(ConductorSize::Aught(3), 3), thhn(ConductorSize::Awg(4), 1)],
            nipple: false,
        };
        let result = size_raceway(&input, &lookup()).await.unwrap();
        let total = 3.0 * 0.2679 + 0.0824;
        assert!((result.required_area_in2 - total / 0.40).abs() < 1e-12);
        // 2.215 in² required: 2" EMT (3.356) is the first at or above
        assert_eq!(result.trade_size, TradeSize::Two);
    }

    #[tokio::test]
    async fn test_raceway_too_large() {
        let input = RacewaySizingInput {
            label: String::new(),
            conduit_type: ConduitType::PvcSch80,
            conductors: vec![thhn(ConductorSize::Kcmil(750), 6)],
            nipple: false,
        };
        let err = size_raceway(&input, &lookup()).await.unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_conductor_list_parsing() {
        let groups = parse_conductor_list("3 x 12 THHN, 1x10 AWG xhhw; 6", "Conductors").unwrap();
        assert_eq!(groups.len(), 3);
        assert_eq!(groups[0], thhn(ConductorSize::Awg(12), 3));
        assert_eq!(groups[1].insulation, InsulationType::Xhhw);
        assert_eq!(groups[1].size, ConductorSize::Awg(10));
        assert_eq!(groups[2], thhn(ConductorSize::Awg(6), 1));

        let bare = parse_conductor_list("12 XHHW", "Conductors").unwrap();
        assert_eq!(bare[0].quantity, 1);
        assert_eq!(bare[0].insulation, InsulationType::Xhhw);
        assert!(parse_conductor_list("3 x bogus", "Conductors").is_err());
        assert!(parse_conductor_list("", "Conductors").is_err());
    }

    #[test]
    fn test_zero_quantity_rejected() {
        let input = ConduitFillInput {
            label: String::new(),
            conduit_type: ConduitType::Emt,
            trade_size: TradeSize::Half,
            conductors: vec![thhn(ConductorSize::Awg(12), 0)],
            nipple: false,
        };
        assert!(input.validate().is_err());
    }
}
