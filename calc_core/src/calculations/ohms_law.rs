//! Ohm's law and the power relations: given any two of voltage, current,
//! resistance and power, solve the other two.
//!
//! ```text
//! V = I × R        P = V × I
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

use super::form;

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct OhmsLawInput {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub voltage_v: Option<f64>,
    #[serde(default)]
    pub current_a: Option<f64>,
    #[serde(default)]
    pub resistance_ohms: Option<f64>,
    #[serde(default)]
    pub power_w: Option<f64>,
}

impl OhmsLawInput {
    pub fn validate(&self) -> CalcResult<()> {
        let known = [
            ("Voltage", self.voltage_v),
            ("Current", self.current_a),
            ("Resistance", self.resistance_ohms),
            ("Power", self.power_w),
        ];
        for (field, value) in known {
            if let Some(v) = value {
                if !(v >= 0.0) || !v.is_finite() {
                    return Err(CalcError::invalid_input(field, v.to_string(), "Cannot be negative"));
                }
            }
        }
        let given = known.iter().filter(|(_, v)| v.is_some()).count();
        if given != 2 {
            return Err(CalcError::invalid_input(
                "Ohm's Law",
                format!("{} values", given),
                "Enter exactly two of voltage, current, resistance and power",
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct OhmsLawForm {
    pub label: String,
    pub voltage: String,
    pub current: String,
    pub resistance: String,
    pub power: String,
}

impl OhmsLawForm {
    pub fn parse(&self) -> CalcResult<OhmsLawInput> {
        Ok(OhmsLawInput {
            label: self.label.clone(),
            voltage_v: form::optional_f64(&self.voltage, "Voltage")?,
            current_a: form::optional_f64(&self.current, "Current")?,
            resistance_ohms: form::optional_f64(&self.resistance, "Resistance")?,
            power_w: form::optional_f64(&self.power, "Power")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OhmsLawResult {
    pub voltage_v: f64,
    pub current_a: f64,
    pub resistance_ohms: f64,
    pub power_w: f64,
}

fn divide(numerator: f64, denominator: f64, what: &str) -> CalcResult<f64> {
    if denominator == 0.0 {
        return Err(CalcError::calculation_failed(
            "Ohm's Law",
            format!("{} is zero (division by zero)", what),
        ));
    }
    Ok(numerator / denominator)
}

pub fn calculate(input: &OhmsLawInput) -> CalcResult<OhmsLawResult> {
    input.validate()?;

    let (v, i) = match (input.voltage_v, input.current_a, input.resistance_ohms, input.power_w) {
        (Some(v), Some(i), None, None) => (v, i),
        (Some(v), None, Some(r), None) => (v, divide(v, r, "Resistance")?),
        (Some(v), None, None, Some(p)) => (v, divide(p, v, "Voltage")?),
        (None, Some(i), Some(r), None) => (i * r, i),
        (None, Some(i), None, Some(p)) => (divide(p, i, "Current")?, i),
        (None, None, Some(r), Some(p)) => ((p * r).sqrt(), divide(p, r, "Resistance")?.sqrt()),
        _ => return Err(CalcError::internal("Ohm's law input passed validation with the wrong count")),
    };

    let resistance_ohms = match input.resistance_ohms {
        Some(r) => r,
        None => divide(v, i, "Current")?,
    };

    Ok(OhmsLawResult {
        voltage_v: v,
        current_a: i,
        resistance_ohms,
        power_w: input.power_w.unwrap_or(v * i),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn solve(v: Option<f64>, i: Option<f64>, r: Option<f64>, p: Option<f64>) -> CalcResult<OhmsLawResult> {
        calculate(&OhmsLawInput {
            label: String::new(),
            voltage_v: v,
            current_a: i,
            resistance_ohms: r,
            power_w: p,
        })
    }

    #[test]
    fn test_every_pair() {
        let expected = OhmsLawResult {
            voltage_v: 120.0,
            current_a: 10.0,
            resistance_ohms: 12.0,
            power_w: 1200.0,
        };
        let pairs = [
            solve(Some(120.0), Some(10.0), None, None),
            solve(Some(120.0), None, Some(12.0), None),
            solve(Some(120.0), None, None, Some(1200.0)),
            solve(None, Some(10.0), Some(12.0), None),
            solve(None, Some(10.0), None, Some(1200.0)),
            solve(None, None, Some(12.0), Some(1200.0)),
        ];
        for result in pairs {
            let result = result.unwrap();
            assert!((result.voltage_v - expected.voltage_v).abs() < 1e-9);
            assert!((result.current_a - expected.current_a).abs() < 1e-9);
            assert!((result.resistance_ohms - expected.resistance_ohms).abs() < 1e-9);
            assert!((result.power_w - expected.power_w).abs() < 1e-9);
        }
    }

    #[test]
    fn test_wrong_count() {
        assert_eq!(solve(Some(120.0), None, None, None).unwrap_err().error_code(), "INVALID_INPUT");
        assert_eq!(
            solve(Some(120.0), Some(1.0), Some(120.0), None).unwrap_err().error_code(),
            "INVALID_INPUT"
        );
    }

    #[test]
    fn test_zero_divisor() {
        let err = solve(Some(120.0), None, Some(0.0), None).unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
        // open circuit: no current, resistance undefined
        assert!(solve(Some(120.0), Some(0.0), None, None).is_err());
    }
}
