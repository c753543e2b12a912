//! # Outlet Box Fill
//!
//! Required box volume per 314.16(B). Each item counts as one or more
//! volume allowances from Table 314.16(B), sized by a conductor:
//!
//! | Item | Allowances | Sized by |
//! |------|------------|----------|
//! | Conductor from outside the box | 1 each | that conductor |
//! | Device yoke | 2 each | largest conductor on any device |
//! | Equipment grounding conductors | 1 total | largest ground |
//! | Internal cable clamps | 1 total | largest conductor |
//! | Luminaire stud or hickey | 1 each | largest conductor |
//!
//! ## Example
//!
//! ```rust
//! use calc_core::calculations::box_fill::{calculate, BoxConductor, BoxFillInput};
//! use calc_core::conductors::ConductorSize;
//! use calc_core::reference::ReferenceLookup;
//!
//! # tokio::runtime::Builder::new_current_thread().build().unwrap().block_on(async {
//! let lookup = ReferenceLookup::bundled().unwrap();
//! let input = BoxFillInput {
//!     label: "Kitchen receptacle".to_string(),
//!     conductors: vec![BoxConductor { size: ConductorSize::Awg(12), quantity: 4 }],
//!     device_yokes: 1,
//!     device_conductor_size: None,
//!     ground_sizes: vec![ConductorSize::Awg(12), ConductorSize::Awg(12)],
//!     internal_clamps: false,
//!     support_fittings: 0,
//!     box_volume_in3: Some(18.0),
//! };
//! let result = calculate(&input, &lookup).await.unwrap();
//! // 4 + 2 + 1 allowances × 2.25 in³
//! assert_eq!(result.required_volume_in3, 15.75);
//! assert_eq!(result.fits, Some(true));
//! # });
//! ```

use serde::{Deserialize, Serialize};

use crate::conductors::{BoxFillCategory, ConductorSize};
use crate::errors::{CalcError, CalcResult};
use crate::reference::{ReferenceLookup, ReferenceStore};

use super::conduit_fill::parse_conductor_list;
use super::{form, nec_ref};

/// Conductors of one size entering the box.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxConductor {
    pub size: ConductorSize,
    pub quantity: u32,
}

/// Input parameters for a box fill calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxFillInput {
    #[serde(default)]
    pub label: String,
    /// Insulated conductors originating outside the box
    #[serde(default)]
    pub conductors: Vec<BoxConductor>,
    #[serde(default)]
    pub device_yokes: u32,
    /// Largest conductor terminating on a device; defaults to the largest
    /// conductor in the box
    #[serde(default)]
    pub device_conductor_size: Option<ConductorSize>,
    /// Every equipment grounding conductor (counted once combined)
    #[serde(default)]
    pub ground_sizes: Vec<ConductorSize>,
    #[serde(default)]
    pub internal_clamps: bool,
    /// Luminaire studs and hickeys
    #[serde(default)]
    pub support_fittings: u32,
    /// Box volume to check against, in³
    #[serde(default)]
    pub box_volume_in3: Option<f64>,
}

impl BoxFillInput {
    pub fn validate(&self) -> CalcResult<()> {
        if let Some(c) = self.conductors.iter().find(|c| c.quantity == 0) {
            return Err(CalcError::invalid_input(
                "Conductors",
                format!("0 × {}", c.size),
                "Quantity must be at least 1",
            ));
        }
        let needs_largest = self.internal_clamps
            || self.support_fittings > 0
            || (self.device_yokes > 0 && self.device_conductor_size.is_none());
        if needs_largest && self.conductors.is_empty() {
            return Err(CalcError::missing_field("Conductors"));
        }
        if let Some(volume) = self.box_volume_in3 {
            if !(volume > 0.0) {
                return Err(CalcError::invalid_input(
                    "Box Volume",
                    volume.to_string(),
                    "Box volume must be positive",
                ));
            }
        }
        Ok(())
    }

    /// Largest insulated conductor in the box.
    pub fn largest_conductor(&self) -> Option<ConductorSize> {
        self.conductors.iter().map(|c| c.size).max()
    }
}

/// Textual form for [`BoxFillInput`].
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BoxFillForm {
    pub label: String,
    /// e.g. "4 x 12, 2 x 14"
    pub conductors: String,
    pub device_yokes: String,
    pub device_conductor_size: String,
    /// e.g. "12, 12, 14"
    pub grounds: String,
    pub internal_clamps: String,
    pub support_fittings: String,
    pub box_volume: String,
}

impl BoxFillForm {
    pub fn parse(&self) -> CalcResult<BoxFillInput> {
        let conductors = if self.conductors.trim().is_empty() {
            Vec::new()
        } else {
            parse_conductor_list(&self.conductors, "Conductors")?
                .into_iter()
                .map(|g| BoxConductor {
                    size: g.size,
                    quantity: g.quantity,
                })
                .collect()
        };
        let device_conductor_size = if self.device_conductor_size.trim().is_empty() {
            None
        } else {
            Some(form::required_with(
                &self.device_conductor_size,
                "Device Conductor Size",
                ConductorSize::from_str_flexible,
            )?)
        };
        let ground_sizes = self
            .grounds
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(|s| form::required_with(s, "Grounds", ConductorSize::from_str_flexible))
            .collect::<CalcResult<Vec<_>>>()?;

        Ok(BoxFillInput {
            label: self.label.clone(),
            conductors,
            device_yokes: form::optional_u32(&self.device_yokes, "Device Yokes")?.unwrap_or(0),
            device_conductor_size,
            ground_sizes,
            internal_clamps: form::flag(&self.internal_clamps, "Internal Clamps")?,
            support_fittings: form::optional_u32(&self.support_fittings, "Support Fittings")?.unwrap_or(0),
            box_volume_in3: form::optional_f64(&self.box_volume, "Box Volume")?,
        })
    }
}

/// One counted item.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BoxFillLine {
    pub category: BoxFillCategory,
    pub size: ConductorSize,
    /// Volume allowances counted
    pub allowances: u32,
    pub volume_each_in3: f64,
    pub volume_total_in3: f64,
}

/// Results from a box fill calculation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BoxFillResult {
    pub lines: Vec<BoxFillLine>,
    pub total_allowances: u32,
    pub required_volume_in3: f64,
    pub box_volume_in3: Option<f64>,
    /// Box volume minus required
    pub remaining_volume_in3: Option<f64>,
    pub fits: Option<bool>,
    pub references: Vec<String>,
}

/// Calculate required box volume.
pub async fn calculate<S: ReferenceStore>(
    input: &BoxFillInput,
    lookup: &ReferenceLookup<S>,
) -> CalcResult<BoxFillResult> {
    input.validate()?;

    let largest = input.largest_conductor();
    let mut items: Vec<(BoxFillCategory, ConductorSize, u32)> = input
        .conductors
        .iter()
        .map(|c| (BoxFillCategory::Conductor, c.size, c.quantity))
        .collect();

    if input.device_yokes > 0 {
        let size = input
            .device_conductor_size
            .or(largest)
            .ok_or_else(|| CalcError::missing_field("Device Conductor Size"))?;
        items.push((BoxFillCategory::Device, size, input.device_yokes));
    }
    if let Some(size) = input.ground_sizes.iter().copied().max() {
        items.push((BoxFillCategory::Ground, size, 1));
    }
    if let Some(size) = largest {
        if input.internal_clamps {
            items.push((BoxFillCategory::Clamp, size, 1));
        }
        if input.support_fittings > 0 {
            items.push((BoxFillCategory::SupportFitting, size, input.support_fittings));
        }
    }

    let mut lines = Vec::with_capacity(items.len());
    for (category, size, count) in items {
        let row = lookup.box_fill_allowance(category, Some(size)).await?;
        let allowances = count * row.multiplier;
        lines.push(BoxFillLine {
            category,
            size,
            allowances,
            volume_each_in3: row.volume_in3,
            volume_total_in3: row.volume_in3 * f64::from(allowances),
        });
    }

    let required_volume_in3: f64 = lines.iter().map(|l| l.volume_total_in3).sum();
    let remaining_volume_in3 = input.box_volume_in3.map(|v| v - required_volume_in3);

    Ok(BoxFillResult {
        total_allowances: lines.iter().map(|l| l.allowances).sum(),
        required_volume_in3,
        box_volume_in3: input.box_volume_in3,
        fits: remaining_volume_in3.map(|r| r >= 0.0),
        remaining_volume_in3,
        lines,
        references: vec![nec_ref::BOX_FILL.to_string()],
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::reference::MemoryReferenceStore;

    fn lookup() -> ReferenceLookup<MemoryReferenceStore> {
        ReferenceLookup::bundled().unwrap()
    }

    fn empty() -> BoxFillInput {
        BoxFillInput {
            label: String::new(),
            conductors: Vec::new(),
            device_yokes: 0,
            device_conductor_size: None,
            ground_sizes: Vec::new(),
            internal_clamps: false,
            support_fittings: 0,
            box_volume_in3: None,
        }
    }

    #[tokio::test]
    async fn test_mixed_sizes() {
        let input = BoxFillInput {
            conductors: vec![
                BoxConductor {
                    size: ConductorSize::Awg(14),
                    quantity: 4,
                },
                BoxConductor {
                    size: ConductorSize::Awg(12),
                    quantity: 2,
                },
            ],
            device_yokes: 2,
            ground_sizes: vec![ConductorSize::Awg(14), ConductorSize::Awg(12), ConductorSize::Awg(14)],
            internal_clamps: true,
            box_volume_in3: Some(20.0),
            ..empty()
        };
        let result = calculate(&input, &lookup()).await.unwrap();
        // conductors 4×2.0 + 2×2.25 = 12.5
        // devices 2 yokes × 2 × 2.25 (largest 12 AWG) = 9.0
        // grounds 1 × 2.25, clamps 1 × 2.25
        assert!((result.required_volume_in3 - 26.0).abs() < 1e-9);
        assert_eq!(result.total_allowances, 4 + 2 + 4 + 1 + 1);
        assert_eq!(result.fits, Some(false));
        assert!((result.remaining_volume_in3.unwrap() + 6.0).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_single_ground_allowance() {
        let input = BoxFillInput {
            ground_sizes: vec![ConductorSize::Awg(12); 4],
            ..empty()
        };
        let result = calculate(&input, &lookup()).await.unwrap();
        assert_eq!(result.lines.len(), 1);
        assert_eq!(result.lines[0].allowances, 1);
        assert_eq!(result.required_volume_in3, 2.25);
    }

    #[tokio::test]
    async fn test_device_size_override() {
        let input = BoxFillInput {
            conductors: vec![BoxConductor {
                size: ConductorSize::Awg(10),
                quantity: 2,
            }],
            device_yokes: 1,
            device_conductor_size: Some(ConductorSize::Awg(14)),
            support_fittings: 1,
            ..empty()
        };
        let result = calculate(&input, &lookup()).await.unwrap();
        let device = result
            .lines
            .iter()
            .find(|l| l.category == BoxFillCategory::Device)
            .unwrap();
        assert_eq!(device.size, ConductorSize::Awg(14));
        assert_eq!(device.volume_total_in3, 4.0);
        let stud = result
            .lines
            .iter()
            .find(|l| l.category == BoxFillCategory::SupportFitting)
            .unwrap();
        assert_eq!(stud.size, ConductorSize::Awg(10));
    }

    #[tokio::test]
    async fn test_size_without_allowance() {
        let input = BoxFillInput {
            conductors: vec![BoxConductor {
                size: ConductorSize::Awg(4),
                quantity: 2,
            }],
            ..empty()
        };
        let err = calculate(&input, &lookup()).await.unwrap_err();
        assert_eq!(err.error_code(), "DATA_NOT_FOUND");
    }

    #[test]
    fn test_clamps_need_conductors() {
        let input = BoxFillInput {
            internal_clamps: true,
            ..empty()
        };
        assert_eq!(input.validate().unwrap_err().error_code(), "MISSING_FIELD");
    }

    #[test]
    fn test_form() {
        let form = BoxFillForm {
            conductors: "4 x 14, 2 x 12".to_string(),
            device_yokes: "1".to_string(),
            grounds: "14, 12".to_string(),
            internal_clamps: "yes".to_string(),
            box_volume: "18".to_string(),
            ..Default::default()
        };
        let input = form.parse().unwrap();
        assert_eq!(input.conductors.len(), 2);
        assert_eq!(input.largest_conductor(), Some(ConductorSize::Awg(12)));
        assert_eq!(input.ground_sizes.len(), 2);
        assert!(input.internal_clamps);
        assert_eq!(input.box_volume_in3, Some(18.0));
    }
}
