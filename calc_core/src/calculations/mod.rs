//! # Field Calculations
//!
//! This module contains every electrical calculation. Each one follows the
//! pattern:
//!
//! - `*Input` - Typed input parameters (JSON-serializable)
//! - `*Form` - The same inputs as raw text fields, with `parse()`
//! - `*Result` - Calculation results with every intermediate value
//! - `calculate(input, ...) -> CalcResult<*Result>` - The calculation
//!
//! Calculators that read reference tables are `async` and take a
//! [`ReferenceLookup`]; the rest are plain functions.
//!
//! ## Available Calculations
//!
//! - [`ampacity`] - Conductor ampacity derating (310.15, 110.14(C))
//! - [`voltage_drop`] - Single- and three-phase voltage drop
//! - [`conduit_fill`] - Conduit fill check and raceway sizing (Chapter 9)
//! - [`box_fill`] - Outlet box fill (314.16)
//! - [`dwelling_load`] - Dwelling service load, standard method (Article 220)
//! - [`motor`] - Motor branch circuit (Article 430)
//! - [`transformer`] - Transformer sizing and protection (450.3(B))
//! - [`fault_current`] - Available fault current at a transformer secondary
//! - [`luminaire`] - Lumen-method luminaire layout
//! - [`bending`] - Conduit bending marks
//! - [`resistance`] - Series and parallel resistor networks
//! - [`ohms_law`] - Ohm's law and power

pub mod ampacity;
pub mod bending;
pub mod box_fill;
pub mod conduit_fill;
pub mod dwelling_load;
pub mod fault_current;
pub mod form;
pub mod luminaire;
pub mod motor;
pub mod ohms_law;
pub mod resistance;
pub mod transformer;
pub mod voltage_drop;

use std::collections::BTreeMap;

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};
use crate::reference::{ReferenceLookup, ReferenceStore};
use crate::settings::EngineSettings;

// Re-export commonly used types
pub use ampacity::{AmpacityInput, AmpacityResult};
pub use bending::{BendingInput, BendingResult};
pub use box_fill::{BoxFillInput, BoxFillResult};
pub use conduit_fill::{ConduitFillInput, ConduitFillResult, RacewaySizingInput, RacewaySizingResult};
pub use dwelling_load::{DwellingLoadInput, DwellingLoadResult};
pub use fault_current::{FaultCurrentInput, FaultCurrentResult};
pub use luminaire::{LuminaireInput, LuminaireResult};
pub use motor::{MotorInput, MotorResult};
pub use ohms_law::{OhmsLawInput, OhmsLawResult};
pub use resistance::{ResistanceInput, ResistanceResult};
pub use transformer::{TransformerInput, TransformerResult};
pub use voltage_drop::{VoltageDropInput, VoltageDropResult};

/// NEC section references attached to results.
pub mod nec_ref {
    pub const AMPACITY_TABLE: &str = "NEC Table 310.16";
    pub const TEMPERATURE_CORRECTION: &str = "NEC Table 310.15(B)(1)";
    pub const BUNDLING_ADJUSTMENT: &str = "NEC Table 310.15(C)(1)";
    pub const TERMINATIONS: &str = "NEC 110.14(C)";
    pub const SMALL_CONDUCTOR: &str = "NEC 240.4(D)";
    pub const BOX_FILL: &str = "NEC 314.16(B)";
    pub const GENERAL_LIGHTING: &str = "NEC 220.12";
    pub const SMALL_APPLIANCE_LAUNDRY: &str = "NEC 220.52";
    pub const LIGHTING_DEMAND: &str = "NEC Table 220.42";
    pub const FIXED_APPLIANCES: &str = "NEC 220.53";
    pub const DRYER: &str = "NEC 220.54";
    pub const RANGE: &str = "NEC Table 220.55, Note 1";
    pub const NONCOINCIDENT: &str = "NEC 220.60";
    pub const MOTOR_FLC: &str = "NEC Tables 430.248 / 430.250";
    pub const MOTOR_CONDUCTORS: &str = "NEC 430.22";
    pub const MOTOR_OVERLOAD: &str = "NEC 430.32(A)(1)";
    pub const MOTOR_PROTECTION: &str = "NEC Table 430.52";
    pub const TRANSFORMER_PROTECTION: &str = "NEC Table 450.3(B)";
    pub const STANDARD_RATINGS: &str = "NEC 240.6(A)";
}

// ============================================================================
// Calculation Items
// ============================================================================

/// Enum wrapper for every calculation input.
///
/// Lets a caller hand any calculation to [`calculate_item`] as one JSON
/// document:
///
/// ```json
/// { "type": "FaultCurrent", "kva": 75, "secondary_voltage": 208,
///   "phase": "three", "impedance_percent": 4.5 }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationItem {
    Ampacity(AmpacityInput),
    VoltageDrop(VoltageDropInput),
    ConduitFill(ConduitFillInput),
    RacewaySizing(RacewaySizingInput),
    BoxFill(BoxFillInput),
    DwellingLoad(DwellingLoadInput),
    Motor(MotorInput),
    Transformer(TransformerInput),
    FaultCurrent(FaultCurrentInput),
    Luminaire(LuminaireInput),
    Bending(BendingInput),
    Resistance(ResistanceInput),
    OhmsLaw(OhmsLawInput),
}

impl CalculationItem {
    /// Form names accepted by [`parse_form`].
    pub const FORM_NAMES: [&'static str; 13] = [
        "ampacity",
        "voltage_drop",
        "conduit_fill",
        "raceway_sizing",
        "box_fill",
        "dwelling_load",
        "motor",
        "transformer",
        "fault_current",
        "luminaire",
        "bending",
        "resistance",
        "ohms_law",
    ];

    /// Get the user-provided label for this calculation
    pub fn label(&self) -> &str {
        match self {
            CalculationItem::Ampacity(i) => &i.label,
            CalculationItem::VoltageDrop(i) => &i.label,
            CalculationItem::ConduitFill(i) => &i.label,
            CalculationItem::RacewaySizing(i) => &i.label,
            CalculationItem::BoxFill(i) => &i.label,
            CalculationItem::DwellingLoad(i) => &i.label,
            CalculationItem::Motor(i) => &i.label,
            CalculationItem::Transformer(i) => &i.label,
            CalculationItem::FaultCurrent(i) => &i.label,
            CalculationItem::Luminaire(i) => &i.label,
            CalculationItem::Bending(i) => &i.label,
            CalculationItem::Resistance(i) => &i.label,
            CalculationItem::OhmsLaw(i) => &i.label,
        }
    }

    /// Get the calculation type as a string
    pub fn calc_type(&self) -> &'static str {
        match self {
            CalculationItem::Ampacity(_) => "Ampacity",
            CalculationItem::VoltageDrop(_) => "VoltageDrop",
            CalculationItem::ConduitFill(_) => "ConduitFill",
            CalculationItem::RacewaySizing(_) => "RacewaySizing",
            CalculationItem::BoxFill(_) => "BoxFill",
            CalculationItem::DwellingLoad(_) => "DwellingLoad",
            CalculationItem::Motor(_) => "Motor",
            CalculationItem::Transformer(_) => "Transformer",
            CalculationItem::FaultCurrent(_) => "FaultCurrent",
            CalculationItem::Luminaire(_) => "Luminaire",
            CalculationItem::Bending(_) => "Bending",
            CalculationItem::Resistance(_) => "Resistance",
            CalculationItem::OhmsLaw(_) => "OhmsLaw",
        }
    }
}

/// Result of any calculation, tagged like [`CalculationItem`].
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum CalculationOutput {
    Ampacity(AmpacityResult),
    VoltageDrop(VoltageDropResult),
    ConduitFill(ConduitFillResult),
    RacewaySizing(RacewaySizingResult),
    BoxFill(BoxFillResult),
    DwellingLoad(DwellingLoadResult),
    Motor(MotorResult),
    Transformer(TransformerResult),
    FaultCurrent(FaultCurrentResult),
    Luminaire(LuminaireResult),
    Bending(BendingResult),
    Resistance(ResistanceResult),
    OhmsLaw(OhmsLawResult),
}

/// Run any calculation.
pub async fn calculate_item<S: ReferenceStore>(
    item: &CalculationItem,
    lookup: &ReferenceLookup<S>,
    settings: &EngineSettings,
) -> CalcResult<CalculationOutput> {
    tracing::debug!(calc_type = item.calc_type(), label = item.label(), "running calculation");
    let output = match item {
        CalculationItem::Ampacity(i) => CalculationOutput::Ampacity(ampacity::calculate(i, lookup).await?),
        CalculationItem::VoltageDrop(i) => {
            CalculationOutput::VoltageDrop(voltage_drop::calculate(i, lookup, settings).await?)
        }
        CalculationItem::ConduitFill(i) => CalculationOutput::ConduitFill(conduit_fill::calculate(i, lookup).await?),
        CalculationItem::RacewaySizing(i) => {
            CalculationOutput::RacewaySizing(conduit_fill::size_raceway(i, lookup).await?)
        }
        CalculationItem::BoxFill(i) => CalculationOutput::BoxFill(box_fill::calculate(i, lookup).await?),
        CalculationItem::DwellingLoad(i) => {
            CalculationOutput::DwellingLoad(dwelling_load::calculate(i, &settings.dwelling)?)
        }
        CalculationItem::Motor(i) => CalculationOutput::Motor(motor::calculate(i, lookup).await?),
        CalculationItem::Transformer(i) => CalculationOutput::Transformer(transformer::calculate(i)?),
        CalculationItem::FaultCurrent(i) => CalculationOutput::FaultCurrent(fault_current::calculate(i)?),
        CalculationItem::Luminaire(i) => {
            CalculationOutput::Luminaire(luminaire::calculate(i, lookup, &settings.lighting).await?)
        }
        CalculationItem::Bending(i) => CalculationOutput::Bending(bending::calculate(i)?),
        CalculationItem::Resistance(i) => CalculationOutput::Resistance(resistance::calculate(i)?),
        CalculationItem::OhmsLaw(i) => CalculationOutput::OhmsLaw(ohms_law::calculate(i)?),
    };
    Ok(output)
}

/// What a caller displays: either the output or the error, never both.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CalculationReport {
    pub label: String,
    pub calc_type: String,
    pub code_edition: String,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub output: Option<CalculationOutput>,
    #[serde(skip_serializing_if = "Option::is_none", default)]
    pub error: Option<CalcError>,
}

impl CalculationReport {
    pub fn new(item: &CalculationItem, settings: &EngineSettings, result: CalcResult<CalculationOutput>) -> Self {
        let (output, error) = match result {
            Ok(output) => (Some(output), None),
            Err(error) => (None, Some(error)),
        };
        CalculationReport {
            label: item.label().to_string(),
            calc_type: item.calc_type().to_string(),
            code_edition: settings.code_edition.clone(),
            output,
            error,
        }
    }

    pub fn is_ok(&self) -> bool {
        self.error.is_none()
    }
}

// ============================================================================
// Forms
// ============================================================================

fn form_from_fields<F: DeserializeOwned>(calculator: &str, fields: &BTreeMap<String, String>) -> CalcResult<F> {
    let object: serde_json::Map<String, serde_json::Value> = fields
        .iter()
        .map(|(k, v)| (k.clone(), serde_json::Value::String(v.clone())))
        .collect();
    serde_json::from_value(serde_json::Value::Object(object))
        .map_err(|e| CalcError::invalid_input(format!("{} form", calculator), "", e.to_string()))
}

/// Build a calculation from named text fields, as typed into a form.
///
/// ```rust
/// use std::collections::BTreeMap;
/// use calc_core::calculations::{parse_form, CalculationItem};
///
/// let fields = BTreeMap::from([
///     ("connection".to_string(), "parallel".to_string()),
///     ("resistors".to_string(), "100, 100".to_string()),
/// ]);
/// let item = parse_form("resistance", &fields).unwrap();
/// assert_eq!(item.calc_type(), "Resistance");
/// ```
pub fn parse_form(calculator: &str, fields: &BTreeMap<String, String>) -> CalcResult<CalculationItem> {
    let name = calculator.trim().to_lowercase().replace('-', "_");
    let item = match name.as_str() {
        "ampacity" => CalculationItem::Ampacity(form_from_fields::<ampacity::AmpacityForm>(&name, fields)?.parse()?),
        "voltage_drop" => {
            CalculationItem::VoltageDrop(form_from_fields::<voltage_drop::VoltageDropForm>(&name, fields)?.parse()?)
        }
        "conduit_fill" => {
            CalculationItem::ConduitFill(form_from_fields::<conduit_fill::ConduitFillForm>(&name, fields)?.parse()?)
        }
        "raceway_sizing" => CalculationItem::RacewaySizing(
            form_from_fields::<conduit_fill::RacewaySizingForm>(&name, fields)?.parse()?,
        ),
        "box_fill" => CalculationItem::BoxFill(form_from_fields::<box_fill::BoxFillForm>(&name, fields)?.parse()?),
        "dwelling_load" => CalculationItem::DwellingLoad(
            form_from_fields::<dwelling_load::DwellingLoadForm>(&name, fields)?.parse()?,
        ),
        "motor" => CalculationItem::Motor(form_from_fields::<motor::MotorForm>(&name, fields)?.parse()?),
        "transformer" => {
            CalculationItem::Transformer(form_from_fields::<transformer::TransformerForm>(&name, fields)?.parse()?)
        }
        "fault_current" => CalculationItem::FaultCurrent(
            form_from_fields::<fault_current::FaultCurrentForm>(&name, fields)?.parse()?,
        ),
        "luminaire" => {
            CalculationItem::Luminaire(form_from_fields::<luminaire::LuminaireForm>(&name, fields)?.parse()?)
        }
        "bending" => CalculationItem::Bending(form_from_fields::<bending::BendingForm>(&name, fields)?.parse()?),
        "resistance" => {
            CalculationItem::Resistance(form_from_fields::<resistance::ResistanceForm>(&name, fields)?.parse()?)
        }
        "ohms_law" => CalculationItem::OhmsLaw(form_from_fields::<ohms_law::OhmsLawForm>(&name, fields)?.parse()?),
        _ => {
            return Err(CalcError::invalid_input(
                "calculator",
                calculator,
                format!("Expected one of: {}", CalculationItem::FORM_NAMES.join(", ")),
            ))
        }
    };
    Ok(item)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::MemoryReferenceStore;

    fn lookup() -> ReferenceLookup<MemoryReferenceStore> {
        ReferenceLookup::bundled().unwrap()
    }

    fn fields(pairs: &[(&str, &str)]) -> BTreeMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn test_item_json_round_trip() {
        let json = r#"{
            "type": "FaultCurrent",
            "label": "MDP",
            "kva": 75.0,
            "secondary_voltage": 208.0,
            "phase": "three",
            "impedance_percent": 4.5
        }"#;
        let item: CalculationItem = serde_json::from_str(json).unwrap();
        assert_eq!(item.label(), "MDP");
        assert_eq!(item.calc_type(), "FaultCurrent");

        let back = serde_json::to_value(&item).unwrap();
        assert_eq!(back["type"], "FaultCurrent");
        assert_eq!(back["kva"], 75.0);
    }

    #[tokio::test]
    async fn test_calculate_item_dispatch() {
        let item = parse_form(
            "ampacity",
            &fields(&[("material", "cu"), ("size", "1/0"), ("insulation_rating", "75")]),
        )
        .unwrap();
        let output = calculate_item(&item, &lookup(), &EngineSettings::default()).await.unwrap();
        match output {
            CalculationOutput::Ampacity(result) => assert_eq!(result.base_ampacity_a, 150.0),
            other => panic!("unexpected output {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_report_holds_error_or_output() {
        let settings = EngineSettings::default();
        let item = parse_form("resistance", &fields(&[("connection", "parallel"), ("resistors", "10, 0")])).unwrap();
        let result = calculate_item(&item, &lookup(), &settings).await;
        let report = CalculationReport::new(&item, &settings, result);
        assert!(!report.is_ok());
        assert!(report.output.is_none());
        assert_eq!(report.code_edition, "NEC 2020");

        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["error"]["type"], "CalculationFailed");
        assert!(json.get("output").is_none());
    }

    #[test]
    fn test_parse_form_errors() {
        let err = parse_form("wattmeter", &BTreeMap::new()).unwrap_err();
        assert!(err.to_string().contains("ohms_law"));

        let err = parse_form("resistance", &fields(&[("resistors", "10"), ("colour", "red")])).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
        assert!(err.to_string().contains("colour"));

        let err = parse_form("motor", &fields(&[("voltage", "460"), ("phase", "3")])).unwrap_err();
        assert_eq!(err, CalcError::missing_field("Horsepower"));
    }

    #[test]
    fn test_every_form_name_is_known() {
        for name in CalculationItem::FORM_NAMES {
            let err = parse_form(name, &BTreeMap::new()).err();
            // empty forms fail on a missing field, never on the name
            if let Some(err) = err {
                assert!(!err.to_string().contains("Expected one of"), "{name}: {err}");
            }
        }
    }
}
