//! # Available Fault Current
//!
//! Transformer-impedance (infinite bus) method: the secondary full-load
//! current divided by the per-unit impedance.
//!
//! ```text
//! FLA   = kVA × 1000 / V          (single-phase)
//! FLA   = kVA × 1000 / (V × √3)   (three-phase)
//! I_sc  = FLA / (Z% / 100)
//! ```

use serde::{Deserialize, Serialize};

use crate::conductors::Phase;
use crate::errors::{CalcError, CalcResult};
use crate::units::{Kva, VoltAmperes};

use super::form;

/// Input parameters for an available fault current calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultCurrentInput {
    #[serde(default)]
    pub label: String,
    pub kva: f64,
    pub secondary_voltage: f64,
    pub phase: Phase,
    /// Nameplate impedance, percent
    pub impedance_percent: f64,
}

impl FaultCurrentInput {
    pub fn validate(&self) -> CalcResult<()> {
        if !(self.kva > 0.0) {
            return Err(CalcError::invalid_input("kVA", self.kva.to_string(), "kVA must be positive"));
        }
        if !(self.secondary_voltage > 0.0) {
            return Err(CalcError::invalid_input(
                "Secondary Voltage",
                self.secondary_voltage.to_string(),
                "Voltage must be positive",
            ));
        }
        if !(self.impedance_percent >= 0.0) {
            return Err(CalcError::invalid_input(
                "Impedance",
                self.impedance_percent.to_string(),
                "Impedance cannot be negative",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct FaultCurrentForm {
    pub label: String,
    pub kva: String,
    pub secondary_voltage: String,
    pub phase: String,
    pub impedance: String,
}

impl FaultCurrentForm {
    pub fn parse(&self) -> CalcResult<FaultCurrentInput> {
        Ok(FaultCurrentInput {
            label: self.label.clone(),
            kva: form::required_f64(&self.kva, "kVA")?,
            secondary_voltage: form::required_f64(&self.secondary_voltage, "Secondary Voltage")?,
            phase: form::required_with(&self.phase, "Phase", Phase::from_str_flexible)?,
            impedance_percent: form::required_f64(self.impedance.trim_end_matches('%'), "Impedance")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FaultCurrentResult {
    pub secondary_fla_a: f64,
    /// 100 / Z%
    pub multiplier: f64,
    pub available_fault_current_a: f64,
    pub available_fault_current_ka: f64,
}

pub fn calculate(input: &FaultCurrentInput) -> CalcResult<FaultCurrentResult> {
    input.validate()?;
    if input.impedance_percent == 0.0 {
        return Err(CalcError::calculation_failed(
            "Fault Current",
            "Transformer impedance is zero; fault current is unbounded",
        ));
    }

    let secondary_fla_a = VoltAmperes::from(Kva(input.kva)).line_current(input.secondary_voltage, input.phase);
    let multiplier = 100.0 / input.impedance_percent;
    let available_fault_current_a = secondary_fla_a * multiplier;

    Ok(FaultCurrentResult {
        secondary_fla_a,
        multiplier,
        available_fault_current_a,
        available_fault_current_ka: available_fault_current_a / 1000.0,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(kva: f64, volts: f64, phase: Phase, z: f64) -> FaultCurrentInput {
        FaultCurrentInput {
            label: String::new(),
            kva,
            secondary_voltage: volts,
            phase,
            impedance_percent: z,
        }
    }

    #[test]
    fn test_three_phase() {
        let result = calculate(&input(500.0, 480.0, Phase::Three, 5.0)).unwrap();
        // 601.4 A × 20
        assert!((result.secondary_fla_a - 601.41).abs() < 0.01);
        assert_eq!(result.multiplier, 20.0);
        assert!((result.available_fault_current_a - 12028.1).abs() < 0.1);
        assert!((result.available_fault_current_ka - 12.028).abs() < 1e-3);
    }

    #[test]
    fn test_single_phase() {
        let result = calculate(&input(25.0, 240.0, Phase::Single, 2.0)).unwrap();
        assert!((result.secondary_fla_a - 104.1667).abs() < 1e-3);
        assert!((result.available_fault_current_a - 5208.33).abs() < 0.01);
    }

    #[test]
    fn test_zero_impedance() {
        let err = calculate(&input(75.0, 208.0, Phase::Three, 0.0)).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");

        let err = calculate(&input(75.0, 208.0, Phase::Three, -1.0)).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_INPUT");
    }

    #[test]
    fn test_form_accepts_percent_sign() {
        let form = FaultCurrentForm {
            kva: "75".to_string(),
            secondary_voltage: "208".to_string(),
            phase: "three".to_string(),
            impedance: "4.5%".to_string(),
            ..Default::default()
        };
        assert_eq!(form.parse().unwrap().impedance_percent, 4.5);
    }
}
