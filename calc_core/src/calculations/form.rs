//! Textual form parsing.
//!
//! Calculator forms hold raw `String` fields as typed by the user. These
//! helpers turn one field into a typed value, naming the field by its human
//! label when it cannot be parsed.

use crate::errors::{CalcError, CalcResult};
use crate::units::{Celsius, Fahrenheit};

/// Parse a required number.
pub fn required_f64(value: &str, label: &str) -> CalcResult<f64> {
    optional_f64(value, label)?.ok_or_else(|| CalcError::missing_field(label))
}

/// Parse an optional number; an empty field is `None`.
pub fn optional_f64(value: &str, label: &str) -> CalcResult<Option<f64>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    match trimmed.replace(',', "").parse::<f64>() {
        Ok(n) if n.is_finite() => Ok(Some(n)),
        _ => Err(CalcError::invalid_input(label, value, "Not a valid number")),
    }
}

/// Parse a required whole number.
pub fn required_u32(value: &str, label: &str) -> CalcResult<u32> {
    optional_u32(value, label)?.ok_or_else(|| CalcError::missing_field(label))
}

/// Parse an optional whole number; an empty field is `None`.
pub fn optional_u32(value: &str, label: &str) -> CalcResult<Option<u32>> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    trimmed
        .parse::<u32>()
        .map(Some)
        .map_err(|_| CalcError::invalid_input(label, value, "Not a valid whole number"))
}

/// Parse a required field with a domain parser, relabeling its error.
pub fn required_with<T>(value: &str, label: &str, parse: impl FnOnce(&str) -> CalcResult<T>) -> CalcResult<T> {
    if value.trim().is_empty() {
        return Err(CalcError::missing_field(label));
    }
    parse(value).map_err(|e| match e {
        CalcError::InvalidInput { reason, .. } => CalcError::invalid_input(label, value, reason),
        other => other,
    })
}

/// Parse a comma- or whitespace-separated list of numbers.
pub fn number_list(value: &str, label: &str) -> CalcResult<Vec<f64>> {
    let values = value
        .split(|c: char| c == ',' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .map(|part| match part.parse::<f64>() {
            Ok(n) if n.is_finite() => Ok(n),
            _ => Err(CalcError::invalid_input(label, part, "Not a valid number")),
        })
        .collect::<CalcResult<Vec<_>>>()?;
    if values.is_empty() {
        return Err(CalcError::missing_field(label));
    }
    Ok(values)
}

/// Parse an optional temperature in °C. A trailing `F` or `°F` reads the
/// value as Fahrenheit; `C`, `°C` or no suffix as Celsius.
pub fn optional_temperature_c(value: &str, label: &str) -> CalcResult<Option<f64>> {
    let upper = value.trim().to_uppercase();
    if let Some(number) = upper.strip_suffix('F') {
        let number = number.trim_end().trim_end_matches('°');
        return Ok(optional_f64(number, label)?.map(|f| Celsius::from(Fahrenheit(f)).0));
    }
    let number = upper.strip_suffix('C').unwrap_or(&upper).trim_end().trim_end_matches('°');
    optional_f64(number, label)
}

/// Parse a yes/no field; empty is `false`.
pub fn flag(value: &str, label: &str) -> CalcResult<bool> {
    match value.trim().to_lowercase().as_str() {
        "" | "no" | "n" | "false" | "0" | "off" => Ok(false),
        "yes" | "y" | "true" | "1" | "on" => Ok(true),
        _ => Err(CalcError::invalid_input(label, value, "Expected yes or no")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conductors::ConductorSize;

    #[test]
    fn test_numbers() {
        assert_eq!(required_f64(" 20 ", "Room Length").unwrap(), 20.0);
        assert_eq!(required_f64("1,500", "Floor Area").unwrap(), 1500.0);
        assert_eq!(optional_f64("", "Override").unwrap(), None);

        let err = required_f64("abc", "Room Length").unwrap_err();
        assert!(err.to_string().contains("Room Length"));
        assert_eq!(required_f64("", "Room Length").unwrap_err().error_code(), "MISSING_FIELD");
        assert!(required_f64("NaN", "Room Length").is_err());
    }

    #[test]
    fn test_relabel() {
        let err = required_with("bogus", "Conductor Size", ConductorSize::from_str_flexible).unwrap_err();
        match err {
            CalcError::InvalidInput { field, .. } => assert_eq!(field, "Conductor Size"),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_number_list() {
        assert_eq!(number_list("10, 20 30", "Resistors").unwrap(), vec![10.0, 20.0, 30.0]);
        assert!(number_list("10, x", "Resistors").is_err());
        assert!(number_list(" ", "Resistors").is_err());
    }

    #[test]
    fn test_temperature() {
        assert_eq!(optional_temperature_c("40", "Ambient").unwrap(), Some(40.0));
        assert_eq!(optional_temperature_c("40 °C", "Ambient").unwrap(), Some(40.0));
        let c = optional_temperature_c("104F", "Ambient").unwrap().unwrap();
        assert!((c - 40.0).abs() < 1e-9);
        assert_eq!(optional_temperature_c("", "Ambient").unwrap(), None);
        assert!(optional_temperature_c("hot", "Ambient").is_err());
    }

    #[test]
    fn test_flag() {
        assert!(flag("Yes", "Nipple").unwrap());
        assert!(!flag("", "Nipple").unwrap());
        assert!(flag("maybe", "Nipple").is_err());
    }
}
