//! # Unit Types
//!
//! Type-safe wrappers for the units electricians work in. These provide
//! compile-time safety against unit confusion while remaining lightweight
//! (just f64 wrappers).
//!
//! ## US Customary Units (Primary)
//!
//! Field work in the US is done in:
//! - Power: volt-amperes (VA), kilovolt-amperes (kVA)
//! - Temperature: degrees Celsius for NEC tables, Fahrenheit on site
//!
//! ## Example
//!
//! ```rust
//! use calc_core::units::{Celsius, Fahrenheit, Kva, VoltAmperes};
//!
//! let ambient: Celsius = Fahrenheit(104.0).into();
//! assert!((ambient.0 - 40.0).abs() < 1e-9);
//!
//! let service: VoltAmperes = Kva(25.0).into();
//! assert_eq!(service.0, 25_000.0);
//! ```

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul};

use crate::conductors::Phase;

// ============================================================================
// Power Units
// ============================================================================

/// Apparent power in volt-amperes
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct VoltAmperes(pub f64);

/// Apparent power in kilovolt-amperes (1 kVA = 1000 VA)
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Kva(pub f64);

impl From<VoltAmperes> for Kva {
    fn from(va: VoltAmperes) -> Self {
        Kva(va.0 / 1000.0)
    }
}

impl From<Kva> for VoltAmperes {
    fn from(kva: Kva) -> Self {
        VoltAmperes(kva.0 * 1000.0)
    }
}

impl Add for VoltAmperes {
    type Output = Self;
    fn add(self, rhs: Self) -> Self {
        VoltAmperes(self.0 + rhs.0)
    }
}

impl Mul<f64> for VoltAmperes {
    type Output = Self;
    fn mul(self, rhs: f64) -> Self {
        VoltAmperes(self.0 * rhs)
    }
}

impl VoltAmperes {
    /// Line current drawn by this load at the given line voltage.
    ///
    /// ```text
    /// single-phase: I = VA / V
    /// three-phase:  I = VA / (V × √3)
    /// ```
    pub fn line_current(self, volts: f64, phase: Phase) -> f64 {
        self.0 / (volts * phase.multiplier())
    }

    /// Apparent power of a load drawing `amps` at `volts`.
    pub fn from_line_current(amps: f64, volts: f64, phase: Phase) -> Self {
        VoltAmperes(amps * volts * phase.multiplier())
    }
}

// ============================================================================
// Temperature Units
// ============================================================================

/// Temperature in degrees Celsius, the unit NEC correction tables use
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Celsius(pub f64);

/// Temperature in degrees Fahrenheit
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Fahrenheit(pub f64);

impl From<Fahrenheit> for Celsius {
    fn from(f: Fahrenheit) -> Self {
        Celsius((f.0 - 32.0) * 5.0 / 9.0)
    }
}

impl From<Celsius> for Fahrenheit {
    fn from(c: Celsius) -> Self {
        Fahrenheit(c.0 * 9.0 / 5.0 + 32.0)
    }
}
