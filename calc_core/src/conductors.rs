//! # Conductors and Raceways
//!
//! Categorical keys shared by the reference tables and the calculators:
//! conductor sizes, materials, insulation, temperature ratings, raceway and
//! conduit types, phases, and motor protective devices.
//!
//! ## Conductor Size Ordering
//!
//! AWG numbers run backwards (14 AWG is smaller than 12 AWG), the aught
//! sizes continue past 1 AWG (1/0 < 2/0 < 3/0 < 4/0), and kcmil sizes run
//! forwards and are always larger than any AWG size. [`ConductorSize`]
//! orders by cross-section, so `max` picks the physically larger wire.
//!
//! ```rust
//! use calc_core::conductors::{larger_of, ConductorSize};
//!
//! assert_eq!(larger_of("10 AWG", "12 AWG").unwrap(), "10 AWG");
//! assert_eq!(larger_of("1 AWG", "1/0").unwrap(), "1/0");
//! assert_eq!(larger_of("250 kcmil", "4/0").unwrap(), "250 kcmil");
//!
//! let size = ConductorSize::from_str_flexible("#12").unwrap();
//! assert_eq!(size.to_string(), "12 AWG");
//! ```

use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::errors::{CalcError, CalcResult};

// ============================================================================
// Conductor Size
// ============================================================================

/// A conductor size in AWG, aught (1/0 through 4/0), or kcmil notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum ConductorSize {
    /// American Wire Gauge 40 through 1 (larger number = smaller wire)
    Awg(u8),
    /// Aught sizes: `Aught(1)` is 1/0, `Aught(4)` is 4/0
    Aught(u8),
    /// Thousands of circular mils
    Kcmil(u16),
}

impl ConductorSize {
    /// Parse from common string representations.
    ///
    /// Accepts "12", "12 AWG", "#12", "1/0", "2/0 AWG", "00", "250",
    /// "250 kcmil" and "250 MCM". Bare numbers of 100 or more are kcmil.
    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let invalid = |reason: &str| CalcError::invalid_input("conductor size", s, reason);

        let normalized = s.trim().to_uppercase().replace(['#', ' '], "");
        if normalized.is_empty() {
            return Err(invalid("Conductor size is empty"));
        }

        if let Some(number) = normalized
            .strip_suffix("KCMIL")
            .or_else(|| normalized.strip_suffix("MCM"))
        {
            let kcmil: u16 = number.parse().map_err(|_| invalid("Expected a kcmil number"))?;
            if kcmil == 0 {
                return Err(invalid("Size must be positive"));
            }
            return Ok(ConductorSize::Kcmil(kcmil));
        }

        let body = normalized.strip_suffix("AWG").unwrap_or(&normalized);

        if let Some(aught) = body.strip_suffix("/0") {
            let n: u8 = aught.parse().map_err(|_| invalid("Expected an aught size like 1/0"))?;
            if !(1..=4).contains(&n) {
                return Err(invalid("Aught sizes run from 1/0 to 4/0"));
            }
            return Ok(ConductorSize::Aught(n));
        }

        if !body.is_empty() && body.chars().all(|c| c == '0') {
            let n = body.len() as u8;
            if n > 4 {
                return Err(invalid("Aught sizes run from 1/0 to 4/0"));
            }
            return Ok(ConductorSize::Aught(n));
        }

        let n: u16 = body.parse().map_err(|_| invalid("Not a recognized conductor size"))?;
        match n {
            1..=40 => Ok(ConductorSize::Awg(n as u8)),
            100..=u16::MAX => Ok(ConductorSize::Kcmil(n)),
            _ => Err(invalid("Not a recognized conductor size")),
        }
    }

    /// Rank by cross-section: larger rank = larger conductor.
    fn rank(&self) -> i32 {
        match *self {
            ConductorSize::Awg(n) => -(n as i32),
            ConductorSize::Aught(n) => n as i32,
            ConductorSize::Kcmil(k) => 1000 + k as i32,
        }
    }

    /// 14 AWG through 1 AWG (and anything finer), the range 110.14(C)(1)(a)
    /// limits to 60 °C terminations.
    pub fn is_small(&self) -> bool {
        matches!(self, ConductorSize::Awg(_))
    }

    /// The physically larger of two sizes.
    pub fn larger(self, other: Self) -> Self {
        self.max(other)
    }
}

impl Ord for ConductorSize {
    fn cmp(&self, other: &Self) -> Ordering {
        self.rank().cmp(&other.rank())
    }
}

impl PartialOrd for ConductorSize {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl fmt::Display for ConductorSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConductorSize::Awg(n) => write!(f, "{} AWG", n),
            ConductorSize::Aught(n) => write!(f, "{}/0", n),
            ConductorSize::Kcmil(k) => write!(f, "{} kcmil", k),
        }
    }
}

impl FromStr for ConductorSize {
    type Err = CalcError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_str_flexible(s)
    }
}

impl TryFrom<String> for ConductorSize {
    type Error = CalcError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        Self::from_str_flexible(&value)
    }
}

impl From<ConductorSize> for String {
    fn from(size: ConductorSize) -> Self {
        size.to_string()
    }
}

/// Return the canonical name of the larger of two conductor sizes.
pub fn larger_of(a: &str, b: &str) -> CalcResult<String> {
    let a = ConductorSize::from_str_flexible(a)?;
    let b = ConductorSize::from_str_flexible(b)?;
    Ok(a.larger(b).to_string())
}

// ============================================================================
// Conductor Material
// ============================================================================

/// Conductor metal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConductorMaterial {
    #[default]
    Copper,
    Aluminum,
}

impl ConductorMaterial {
    pub const ALL: [ConductorMaterial; 2] = [ConductorMaterial::Copper, ConductorMaterial::Aluminum];

    pub fn code(&self) -> &'static str {
        match self {
            ConductorMaterial::Copper => "copper",
            ConductorMaterial::Aluminum => "aluminum",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "CU" | "COPPER" => Ok(ConductorMaterial::Copper),
            "AL" | "ALUMINUM" | "ALUMINIUM" => Ok(ConductorMaterial::Aluminum),
            _ => Err(CalcError::invalid_input("material", s, "Expected copper or aluminum")),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConductorMaterial::Copper => "Copper",
            ConductorMaterial::Aluminum => "Aluminum",
        }
    }
}

impl fmt::Display for ConductorMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Temperature Rating
// ============================================================================

/// Insulation temperature rating column of Table 310.16
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Default)]
pub enum TemperatureRating {
    #[serde(rename = "60C")]
    C60,
    #[default]
    #[serde(rename = "75C")]
    C75,
    #[serde(rename = "90C")]
    C90,
}

impl TemperatureRating {
    pub const ALL: [TemperatureRating; 3] = [
        TemperatureRating::C60,
        TemperatureRating::C75,
        TemperatureRating::C90,
    ];

    pub fn celsius(&self) -> u32 {
        match self {
            TemperatureRating::C60 => 60,
            TemperatureRating::C75 => 75,
            TemperatureRating::C90 => 90,
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let digits: String = s.chars().filter(|c| c.is_ascii_digit()).collect();
        match digits.as_str() {
            "60" => Ok(TemperatureRating::C60),
            "75" => Ok(TemperatureRating::C75),
            "90" => Ok(TemperatureRating::C90),
            _ => Err(CalcError::invalid_input(
                "temperature rating",
                s,
                "Expected 60, 75 or 90 °C",
            )),
        }
    }
}

impl fmt::Display for TemperatureRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}°C", self.celsius())
    }
}

// ============================================================================
// Insulation
// ============================================================================

/// Insulation types with Chapter 9 Table 5 areas
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum InsulationType {
    /// THHN / THWN / THWN-2
    #[default]
    Thhn,
    /// XHHW / XHHW-2
    Xhhw,
    /// THW / THW-2
    Thw,
}

impl InsulationType {
    pub const ALL: [InsulationType; 3] = [InsulationType::Thhn, InsulationType::Xhhw, InsulationType::Thw];

    pub fn code(&self) -> &'static str {
        match self {
            InsulationType::Thhn => "thhn",
            InsulationType::Xhhw => "xhhw",
            InsulationType::Thw => "thw",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().replace(['-', ' '], "").as_str() {
            "THHN" | "THWN" | "THWN2" | "THHN/THWN" | "THHN/THWN2" => Ok(InsulationType::Thhn),
            "XHHW" | "XHHW2" => Ok(InsulationType::Xhhw),
            "THW" | "THW2" => Ok(InsulationType::Thw),
            _ => Err(CalcError::invalid_input("insulation", s, "Expected THHN, XHHW or THW")),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            InsulationType::Thhn => "THHN/THWN-2",
            InsulationType::Xhhw => "XHHW-2",
            InsulationType::Thw => "THW",
        }
    }
}

impl fmt::Display for InsulationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

// ============================================================================
// Raceways
// ============================================================================

/// Conduit material as it affects AC resistance and reactance (Chapter 9 Table 9)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RacewayMaterial {
    #[default]
    Pvc,
    Aluminum,
    Steel,
}

impl RacewayMaterial {
    pub const ALL: [RacewayMaterial; 3] = [RacewayMaterial::Pvc, RacewayMaterial::Aluminum, RacewayMaterial::Steel];

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().as_str() {
            "PVC" => Ok(RacewayMaterial::Pvc),
            "AL" | "ALUMINUM" | "ALUMINIUM" => Ok(RacewayMaterial::Aluminum),
            "STEEL" | "EMT" | "RMC" | "IMC" => Ok(RacewayMaterial::Steel),
            _ => Err(CalcError::invalid_input("raceway", s, "Expected PVC, aluminum or steel")),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            RacewayMaterial::Pvc => "PVC",
            RacewayMaterial::Aluminum => "Aluminum",
            RacewayMaterial::Steel => "Steel",
        }
    }
}

impl fmt::Display for RacewayMaterial {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Conduit types with Chapter 9 Table 4 dimensions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ConduitType {
    #[default]
    Emt,
    PvcSch40,
    PvcSch80,
    Rmc,
}

impl ConduitType {
    pub const ALL: [ConduitType; 4] = [
        ConduitType::Emt,
        ConduitType::PvcSch40,
        ConduitType::PvcSch80,
        ConduitType::Rmc,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            ConduitType::Emt => "emt",
            ConduitType::PvcSch40 => "pvc_sch40",
            ConduitType::PvcSch80 => "pvc_sch80",
            ConduitType::Rmc => "rmc",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().replace(['-', ' ', '_'], "").as_str() {
            "EMT" => Ok(ConduitType::Emt),
            "PVC" | "PVC40" | "PVCSCH40" | "SCH40" => Ok(ConduitType::PvcSch40),
            "PVC80" | "PVCSCH80" | "SCH80" => Ok(ConduitType::PvcSch80),
            "RMC" | "RIGID" | "GRC" => Ok(ConduitType::Rmc),
            _ => Err(CalcError::invalid_input("conduit type", s, "Expected EMT, PVC-40, PVC-80 or RMC")),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ConduitType::Emt => "EMT",
            ConduitType::PvcSch40 => "PVC Schedule 40",
            ConduitType::PvcSch80 => "PVC Schedule 80",
            ConduitType::Rmc => "RMC",
        }
    }
}

impl fmt::Display for ConduitType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Conduit trade size, ascending
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum TradeSize {
    #[serde(rename = "1/2")]
    Half,
    #[serde(rename = "3/4")]
    ThreeQuarter,
    #[serde(rename = "1")]
    One,
    #[serde(rename = "1-1/4")]
    OneAndQuarter,
    #[serde(rename = "1-1/2")]
    OneAndHalf,
    #[serde(rename = "2")]
    Two,
    #[serde(rename = "2-1/2")]
    TwoAndHalf,
    #[serde(rename = "3")]
    Three,
    #[serde(rename = "3-1/2")]
    ThreeAndHalf,
    #[serde(rename = "4")]
    Four,
}

impl TradeSize {
    pub const ALL: [TradeSize; 10] = [
        TradeSize::Half,
        TradeSize::ThreeQuarter,
        TradeSize::One,
        TradeSize::OneAndQuarter,
        TradeSize::OneAndHalf,
        TradeSize::Two,
        TradeSize::TwoAndHalf,
        TradeSize::Three,
        TradeSize::ThreeAndHalf,
        TradeSize::Four,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            TradeSize::Half => "1/2",
            TradeSize::ThreeQuarter => "3/4",
            TradeSize::One => "1",
            TradeSize::OneAndQuarter => "1-1/4",
            TradeSize::OneAndHalf => "1-1/2",
            TradeSize::Two => "2",
            TradeSize::TwoAndHalf => "2-1/2",
            TradeSize::Three => "3",
            TradeSize::ThreeAndHalf => "3-1/2",
            TradeSize::Four => "4",
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let normalized = s.trim().trim_end_matches('"').replace(' ', "-");
        let normalized = normalized.trim_end_matches("-in").trim_end_matches("in");
        Self::ALL
            .iter()
            .copied()
            .find(|size| size.code() == normalized)
            .or_else(|| match normalized {
                "0.5" | ".5" => Some(TradeSize::Half),
                "0.75" | ".75" => Some(TradeSize::ThreeQuarter),
                "1.25" => Some(TradeSize::OneAndQuarter),
                "1.5" => Some(TradeSize::OneAndHalf),
                "2.5" => Some(TradeSize::TwoAndHalf),
                "3.5" => Some(TradeSize::ThreeAndHalf),
                _ => None,
            })
            .ok_or_else(|| CalcError::invalid_input("trade size", s, "Expected a trade size from 1/2 to 4"))
    }
}

impl fmt::Display for TradeSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}\"", self.code())
    }
}

// ============================================================================
// Box Fill
// ============================================================================

/// Item categories counted toward outlet box fill (314.16(B))
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BoxFillCategory {
    /// Each conductor originating outside the box
    Conductor,
    /// Each device yoke (counts double)
    Device,
    /// All equipment grounding conductors combined
    Ground,
    /// Internal cable clamps, one or more
    Clamp,
    /// Each luminaire stud or hickey
    SupportFitting,
}

impl BoxFillCategory {
    pub const ALL: [BoxFillCategory; 5] = [
        BoxFillCategory::Conductor,
        BoxFillCategory::Device,
        BoxFillCategory::Ground,
        BoxFillCategory::Clamp,
        BoxFillCategory::SupportFitting,
    ];

    /// Number of volume allowances each counted item takes.
    pub fn default_multiplier(&self) -> u32 {
        match self {
            BoxFillCategory::Device => 2,
            _ => 1,
        }
    }
}

// ============================================================================
// Power System
// ============================================================================

/// Supply phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    #[default]
    Single,
    Three,
}

impl Phase {
    /// 1 for single-phase, √3 for three-phase.
    pub fn multiplier(&self) -> f64 {
        match self {
            Phase::Single => 1.0,
            Phase::Three => 3.0_f64.sqrt(),
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().replace(['-', ' ', '_'], "").as_str() {
            "1" | "1PH" | "1PHASE" | "SINGLE" | "SINGLEPHASE" => Ok(Phase::Single),
            "3" | "3PH" | "3PHASE" | "THREE" | "THREEPHASE" => Ok(Phase::Three),
            _ => Err(CalcError::invalid_input("phase", s, "Expected single or three")),
        }
    }
}

impl fmt::Display for Phase {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Phase::Single => write!(f, "1Ø"),
            Phase::Three => write!(f, "3Ø"),
        }
    }
}

/// Motor branch-circuit short-circuit and ground-fault protective devices (Table 430.52)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum ProtectiveDevice {
    NonTimeDelayFuse,
    TimeDelayFuse,
    InstantaneousTripBreaker,
    #[default]
    InverseTimeBreaker,
}

impl ProtectiveDevice {
    pub const ALL: [ProtectiveDevice; 4] = [
        ProtectiveDevice::NonTimeDelayFuse,
        ProtectiveDevice::TimeDelayFuse,
        ProtectiveDevice::InstantaneousTripBreaker,
        ProtectiveDevice::InverseTimeBreaker,
    ];

    /// Fuse table to consult, or None for breakers.
    pub fn fuse_class(&self) -> Option<FuseClass> {
        match self {
            ProtectiveDevice::NonTimeDelayFuse => Some(FuseClass::NonTimeDelay),
            ProtectiveDevice::TimeDelayFuse => Some(FuseClass::TimeDelay),
            ProtectiveDevice::InstantaneousTripBreaker | ProtectiveDevice::InverseTimeBreaker => None,
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        match s.trim().to_uppercase().replace(['-', ' ', '_'], "").as_str() {
            "NONTIMEDELAYFUSE" | "NTD" | "FUSE" => Ok(ProtectiveDevice::NonTimeDelayFuse),
            "TIMEDELAYFUSE" | "TD" | "DUALELEMENT" | "DUALELEMENTFUSE" => Ok(ProtectiveDevice::TimeDelayFuse),
            "INSTANTANEOUSTRIPBREAKER" | "INSTANTANEOUS" | "MCP" => Ok(ProtectiveDevice::InstantaneousTripBreaker),
            "INVERSETIMEBREAKER" | "INVERSETIME" | "BREAKER" | "CB" => Ok(ProtectiveDevice::InverseTimeBreaker),
            _ => Err(CalcError::invalid_input("device type", s, "Unknown protective device")),
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            ProtectiveDevice::NonTimeDelayFuse => "Non-Time-Delay Fuse",
            ProtectiveDevice::TimeDelayFuse => "Dual-Element (Time-Delay) Fuse",
            ProtectiveDevice::InstantaneousTripBreaker => "Instantaneous-Trip Breaker",
            ProtectiveDevice::InverseTimeBreaker => "Inverse-Time Breaker",
        }
    }
}

impl fmt::Display for ProtectiveDevice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// The two motor fuse-size tables
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FuseClass {
    NonTimeDelay,
    TimeDelay,
}

// ============================================================================
// Horsepower
// ============================================================================

/// Parse a horsepower rating: "5", "7.5", "1/2", "1-1/2", "7 1/2".
pub fn parse_horsepower(s: &str) -> Option<f64> {
    let s = s.trim().trim_end_matches(|c: char| c.is_ascii_alphabetic()).trim();
    let fraction = |part: &str| -> Option<f64> {
        let (num, den) = part.split_once('/')?;
        let num: f64 = num.trim().parse().ok()?;
        let den: f64 = den.trim().parse().ok()?;
        (den != 0.0).then(|| num / den)
    };

    let value = if let Some((whole, frac)) = s.split_once(['-', ' ']) {
        whole.trim().parse::<f64>().ok()? + fraction(frac)?
    } else if s.contains('/') {
        fraction(s)?
    } else {
        s.parse().ok()?
    };
    (value.is_finite() && value > 0.0).then_some(value)
}

/// Integer key for a horsepower rating (thousandths of a horsepower).
pub fn horsepower_key(hp: f64) -> u32 {
    (hp * 1000.0).round() as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_size_parsing() {
        assert_eq!(ConductorSize::from_str_flexible("12").unwrap(), ConductorSize::Awg(12));
        assert_eq!(ConductorSize::from_str_flexible("#10 awg").unwrap(), ConductorSize::Awg(10));
        assert_eq!(ConductorSize::from_str_flexible("1/0").unwrap(), ConductorSize::Aught(1));
        assert_eq!(ConductorSize::from_str_flexible("4/0 AWG").unwrap(), ConductorSize::Aught(4));
        assert_eq!(ConductorSize::from_str_flexible("000").unwrap(), ConductorSize::Aught(3));
        assert_eq!(ConductorSize::from_str_flexible("250").unwrap(), ConductorSize::Kcmil(250));
        assert_eq!(ConductorSize::from_str_flexible("500 MCM").unwrap(), ConductorSize::Kcmil(500));
        assert!(ConductorSize::from_str_flexible("5/0").is_err());
        assert!(ConductorSize::from_str_flexible("60").is_err());
        assert!(ConductorSize::from_str_flexible("").is_err());
    }

    #[test]
    fn test_size_ordering() {
        assert!(ConductorSize::Awg(10) > ConductorSize::Awg(12));
        assert!(ConductorSize::Aught(1) > ConductorSize::Awg(1));
        assert!(ConductorSize::Aught(4) > ConductorSize::Aught(3));
        assert!(ConductorSize::Kcmil(250) > ConductorSize::Aught(4));
        assert!(ConductorSize::Kcmil(500) > ConductorSize::Kcmil(250));
    }

    #[test]
    fn test_larger_of() {
        assert_eq!(larger_of("10 AWG", "12 AWG").unwrap(), "10 AWG");
        assert_eq!(larger_of("1 AWG", "1/0").unwrap(), "1/0");
        assert_eq!(larger_of("250 kcmil", "4/0").unwrap(), "250 kcmil");
        assert!(larger_of("12", "bogus").is_err());
    }

    #[test]
    fn test_size_serde_as_string() {
        let json = serde_json::to_string(&ConductorSize::Aught(2)).unwrap();
        assert_eq!(json, "\"2/0\"");
        let size: ConductorSize = serde_json::from_str("\"6 AWG\"").unwrap();
        assert_eq!(size, ConductorSize::Awg(6));
        assert!(serde_json::from_str::<ConductorSize>("\"nope\"").is_err());
    }

    #[test]
    fn test_small_conductor() {
        assert!(ConductorSize::Awg(1).is_small());
        assert!(!ConductorSize::Aught(1).is_small());
        assert!(!ConductorSize::Kcmil(250).is_small());
    }

    #[test]
    fn test_trade_size_parsing() {
        assert_eq!(TradeSize::from_str_flexible("3/4").unwrap(), TradeSize::ThreeQuarter);
        assert_eq!(TradeSize::from_str_flexible("1-1/4\"").unwrap(), TradeSize::OneAndQuarter);
        assert_eq!(TradeSize::from_str_flexible("1 1/2").unwrap(), TradeSize::OneAndHalf);
        assert_eq!(TradeSize::from_str_flexible("2.5").unwrap(), TradeSize::TwoAndHalf);
        assert!(TradeSize::from_str_flexible("6").is_err());
    }

    #[test]
    fn test_enum_parsing() {
        assert_eq!(ConductorMaterial::from_str_flexible("Cu").unwrap(), ConductorMaterial::Copper);
        assert_eq!(TemperatureRating::from_str_flexible("75°C").unwrap(), TemperatureRating::C75);
        assert_eq!(InsulationType::from_str_flexible("THWN-2").unwrap(), InsulationType::Thhn);
        assert_eq!(ConduitType::from_str_flexible("pvc 40").unwrap(), ConduitType::PvcSch40);
        assert_eq!(Phase::from_str_flexible("3-phase").unwrap(), Phase::Three);
        assert_eq!(
            ProtectiveDevice::from_str_flexible("dual element").unwrap(),
            ProtectiveDevice::TimeDelayFuse
        );
    }

    #[test]
    fn test_horsepower_parsing() {
        assert_eq!(parse_horsepower("5"), Some(5.0));
        assert_eq!(parse_horsepower("1/2"), Some(0.5));
        assert_eq!(parse_horsepower("1-1/2"), Some(1.5));
        assert_eq!(parse_horsepower("7 1/2 hp"), Some(7.5));
        assert_eq!(parse_horsepower("0"), None);
        assert_eq!(parse_horsepower("abc"), None);
        assert_eq!(horsepower_key(1.0 / 6.0), 167);
    }
}
