//! Series and parallel resistor networks.
//!
//! ```text
//! series:   R = R1 + R2 + … + Rn
//! parallel: R = 1 / (1/R1 + 1/R2 + … + 1/Rn)
//! ```

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

use super::form;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Connection {
    #[default]
    Series,
    Parallel,
}

impl Connection {
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_lowercase().as_str() {
            "series" | "s" => Ok(Connection::Series),
            "parallel" | "p" => Ok(Connection::Parallel),
            _ => Err(CalcError::invalid_input("connection", s, "Expected series or parallel")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResistanceInput {
    #[serde(default)]
    pub label: String,
    #[serde(default)]
    pub connection: Connection,
    /// Ohms
    pub resistors: Vec<f64>,
}

impl ResistanceInput {
    pub fn validate(&self) -> CalcResult<()> {
        if self.resistors.is_empty() {
            return Err(CalcError::missing_field("Resistors"));
        }
        for (i, &r) in self.resistors.iter().enumerate() {
            if !(r >= 0.0) || !r.is_finite() {
                return Err(CalcError::invalid_input(
                    format!("Resistor {}", i + 1),
                    r.to_string(),
                    "Resistance cannot be negative",
                ));
            }
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ResistanceForm {
    pub label: String,
    pub connection: String,
    /// "100, 220, 470"
    pub resistors: String,
}

impl ResistanceForm {
    pub fn parse(&self) -> CalcResult<ResistanceInput> {
        let connection = if self.connection.trim().is_empty() {
            Connection::default()
        } else {
            form::required_with(&self.connection, "Connection", Connection::from_str_flexible)?
        };
        Ok(ResistanceInput {
            label: self.label.clone(),
            connection,
            resistors: form::number_list(&self.resistors, "Resistors")?,
        })
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ResistanceResult {
    pub connection: Connection,
    pub resistor_count: usize,
    pub total_ohms: f64,
}

pub fn calculate(input: &ResistanceInput) -> CalcResult<ResistanceResult> {
    input.validate()?;

    let total_ohms = match input.connection {
        Connection::Series => input.resistors.iter().sum(),
        Connection::Parallel => {
            if input.resistors.iter().any(|&r| r == 0.0) {
                return Err(CalcError::calculation_failed(
                    "Resistance",
                    "A zero-ohm resistor in parallel shorts the network (division by zero)",
                ));
            }
            1.0 / input.resistors.iter().map(|r| 1.0 / r).sum::<f64>()
        }
    };

    Ok(ResistanceResult {
        connection: input.connection,
        resistor_count: input.resistors.len(),
        total_ohms,
    })
}
