//! # Conduit Bending
//!
//! Mark positions for hand-bent EMT. All distances are in inches, measured
//! from the end of the conduit.
//!
//! | Angle | Multiplier | Shrink per inch of depth |
//! |-------|------------|--------------------------|
//! | 10°   | 6.0        | 1/16                     |
//! | 22.5° | 2.6        | 3/16                     |
//! | 30°   | 2.0        | 1/4                      |
//! | 45°   | 1.414      | 3/8                      |
//! | 60°   | 1.2        | 1/2                      |
//!
//! - Offset: bends are `depth × multiplier` apart; the second mark sits at
//!   the obstruction plus shrink.
//! - Three-point saddle: 45° center bend with 22.5° outer bends
//!   `2.5 × depth` either side, shrinking 3/16" per inch of depth.
//! - Four-point saddle: two offsets separated by the obstruction width.
//! - 90° stub: the mark is the stub height less the bender take-up.
//!
//! These tables are static and do not go through the reference store.

use serde::{Deserialize, Serialize};

use crate::conductors::TradeSize;
use crate::errors::{CalcError, CalcResult};

use super::form;

/// Outer-bend distance from the saddle center, per inch of depth.
pub const SADDLE_SPREAD_PER_INCH: f64 = 2.5;
/// Three-point saddle shrink per inch of depth.
pub const SADDLE_SHRINK_PER_INCH: f64 = 3.0 / 16.0;

/// Offset and saddle bend angles
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BendAngle {
    #[serde(rename = "10")]
    Deg10,
    #[serde(rename = "22.5")]
    Deg22_5,
    #[default]
    #[serde(rename = "30")]
    Deg30,
    #[serde(rename = "45")]
    Deg45,
    #[serde(rename = "60")]
    Deg60,
}

impl BendAngle {
    pub const ALL: [BendAngle; 5] = [
        BendAngle::Deg10,
        BendAngle::Deg22_5,
        BendAngle::Deg30,
        BendAngle::Deg45,
        BendAngle::Deg60,
    ];

    pub fn degrees(&self) -> f64 {
        match self {
            BendAngle::Deg10 => 10.0,
            BendAngle::Deg22_5 => 22.5,
            BendAngle::Deg30 => 30.0,
            BendAngle::Deg45 => 45.0,
            BendAngle::Deg60 => 60.0,
        }
    }

    /// Distance between bends per inch of offset depth.
    pub fn multiplier(&self) -> f64 {
        match self {
            BendAngle::Deg10 => 6.0,
            BendAngle::Deg22_5 => 2.6,
            BendAngle::Deg30 => 2.0,
            BendAngle::Deg45 => 1.414,
            BendAngle::Deg60 => 1.2,
        }
    }

    /// Conduit shortening per inch of offset depth.
    pub fn shrink_per_inch(&self) -> f64 {
        match self {
            BendAngle::Deg10 => 1.0 / 16.0,
            BendAngle::Deg22_5 => 3.0 / 16.0,
            BendAngle::Deg30 => 1.0 / 4.0,
            BendAngle::Deg45 => 3.0 / 8.0,
            BendAngle::Deg60 => 1.0 / 2.0,
        }
    }

    pub fn from_str_flexible(s: &str) -> CalcResult<Self> {
        let trimmed = s.trim().trim_end_matches(['°', 'd', 'D']).trim();
        let degrees: f64 = trimmed
            .parse()
            .map_err(|_| CalcError::invalid_input("bend angle", s, "Not a valid angle"))?;
        BendAngle::ALL
            .into_iter()
            .find(|a| (a.degrees() - degrees).abs() < 1e-6)
            .ok_or_else(|| CalcError::invalid_input("bend angle", s, "Expected 10, 22.5, 30, 45 or 60 degrees"))
    }
}

/// Hand-bender take-up and 90° gain for EMT, inches.
pub fn stub_take_up(trade_size: TradeSize) -> Option<(f64, f64)> {
    match trade_size {
        TradeSize::Half => Some((5.0, 2.625)),
        TradeSize::ThreeQuarter => Some((6.0, 3.25)),
        TradeSize::One => Some((8.0, 4.0)),
        TradeSize::OneAndQuarter => Some((11.0, 5.75)),
        _ => None,
    }
}

/// The bend to lay out.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "bend", rename_all = "snake_case")]
pub enum BendType {
    Offset {
        depth_in: f64,
        #[serde(default)]
        angle: BendAngle,
        distance_to_obstruction_in: f64,
    },
    ThreePointSaddle {
        depth_in: f64,
        distance_to_center_in: f64,
    },
    FourPointSaddle {
        depth_in: f64,
        #[serde(default)]
        angle: BendAngle,
        distance_to_obstruction_in: f64,
        obstruction_width_in: f64,
    },
    Stub {
        height_in: f64,
        trade_size: TradeSize,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BendingInput {
    #[serde(default)]
    pub label: String,
    pub bend: BendType,
}

fn non_negative(value: f64, field: &str) -> CalcResult<()> {
    if value >= 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), "Cannot be negative"))
    }
}

fn positive(value: f64, field: &str) -> CalcResult<()> {
    if value > 0.0 && value.is_finite() {
        Ok(())
    } else {
        Err(CalcError::invalid_input(field, value.to_string(), "Must be greater than zero"))
    }
}

impl BendingInput {
    pub fn validate(&self) -> CalcResult<()> {
        match self.bend {
            BendType::Offset {
                depth_in,
                distance_to_obstruction_in,
                ..
            } => {
                positive(depth_in, "Offset Depth")?;
                non_negative(distance_to_obstruction_in, "Distance to Obstruction")
            }
            BendType::ThreePointSaddle {
                depth_in,
                distance_to_center_in,
            } => {
                positive(depth_in, "Saddle Depth")?;
                non_negative(distance_to_center_in, "Distance to Center")
            }
            BendType::FourPointSaddle {
                depth_in,
                distance_to_obstruction_in,
                obstruction_width_in,
                ..
            } => {
                positive(depth_in, "Saddle Depth")?;
                non_negative(distance_to_obstruction_in, "Distance to Obstruction")?;
                positive(obstruction_width_in, "Obstruction Width")
            }
            BendType::Stub { height_in, .. } => positive(height_in, "Stub Height"),
        }
    }
}

/// Textual form for [`BendingInput`]. `bend` is "offset", "saddle3",
/// "saddle4" or "stub".
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BendingForm {
    pub label: String,
    pub bend: String,
    pub depth: String,
    pub angle: String,
    pub distance: String,
    pub width: String,
    pub height: String,
    pub trade_size: String,
}

impl BendingForm {
    fn angle(&self) -> CalcResult<BendAngle> {
        if self.angle.trim().is_empty() {
            Ok(BendAngle::default())
        } else {
            form::required_with(&self.angle, "Bend Angle", BendAngle::from_str_flexible)
        }
    }

    pub fn parse(&self) -> CalcResult<BendingInput> {
        let bend = match self.bend.trim().to_lowercase().replace(['-', ' ', '_'], "").as_str() {
            "offset" => BendType::Offset {
                depth_in: form::required_f64(&self.depth, "Offset Depth")?,
                angle: self.angle()?,
                distance_to_obstruction_in: form::required_f64(&self.distance, "Distance to Obstruction")?,
            },
            "saddle3" | "threepointsaddle" | "3pointsaddle" => BendType::ThreePointSaddle {
                depth_in: form::required_f64(&self.depth, "Saddle Depth")?,
                distance_to_center_in: form::required_f64(&self.distance, "Distance to Center")?,
            },
            "saddle4" | "fourpointsaddle" | "4pointsaddle" => BendType::FourPointSaddle {
                depth_in: form::required_f64(&self.depth, "Saddle Depth")?,
                angle: self.angle()?,
                distance_to_obstruction_in: form::required_f64(&self.distance, "Distance to Obstruction")?,
                obstruction_width_in: form::required_f64(&self.width, "Obstruction Width")?,
            },
            "stub" | "90" | "stub90" => BendType::Stub {
                height_in: form::required_f64(&self.height, "Stub Height")?,
                trade_size: form::required_with(&self.trade_size, "Trade Size", TradeSize::from_str_flexible)?,
            },
            "" => return Err(CalcError::missing_field("Bend Type")),
            _ => {
                return Err(CalcError::invalid_input(
                    "Bend Type",
                    &self.bend,
                    "Expected offset, saddle3, saddle4 or stub",
                ))
            }
        };
        Ok(BendingInput {
            label: self.label.clone(),
            bend,
        })
    }
}

/// One mark on the conduit.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BendMark {
    pub name: String,
    /// From the conduit end, inches
    pub distance_in: f64,
    pub angle_deg: f64,
}

impl BendMark {
    fn new(name: &str, distance_in: f64, angle_deg: f64) -> Self {
        BendMark {
            name: name.to_string(),
            distance_in,
            angle_deg,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BendingResult {
    pub marks: Vec<BendMark>,
    /// Between consecutive bends of one offset
    pub distance_between_bends_in: Option<f64>,
    /// Total conduit shortening
    pub shrink_in: f64,
    pub take_up_in: Option<f64>,
    pub gain_in: Option<f64>,
}

fn first_mark_check(distance: f64) -> CalcResult<()> {
    if distance < 0.0 {
        return Err(CalcError::calculation_failed(
            "Conduit Bending",
            format!("First bend falls {:.2} in. past the conduit end; start farther back", -distance),
        ));
    }
    Ok(())
}

/// Lay out the bend marks.
pub fn calculate(input: &BendingInput) -> CalcResult<BendingResult> {
    input.validate()?;

    match input.bend {
        BendType::Offset {
            depth_in,
            angle,
            distance_to_obstruction_in,
        } => {
            let between = depth_in * angle.multiplier();
            let shrink = depth_in * angle.shrink_per_inch();
            let second = distance_to_obstruction_in + shrink;
            let first = second - between;
            first_mark_check(first)?;
            Ok(BendingResult {
                marks: vec![
                    BendMark::new("Bend 1", first, angle.degrees()),
                    BendMark::new("Bend 2", second, angle.degrees()),
                ],
                distance_between_bends_in: Some(between),
                shrink_in: shrink,
                take_up_in: None,
                gain_in: None,
            })
        }
        BendType::ThreePointSaddle {
            depth_in,
            distance_to_center_in,
        } => {
            let shrink = depth_in * SADDLE_SHRINK_PER_INCH;
            let center = distance_to_center_in + shrink;
            let spread = depth_in * SADDLE_SPREAD_PER_INCH;
            first_mark_check(center - spread)?;
            Ok(BendingResult {
                marks: vec![
                    BendMark::new("Outer 1", center - spread, 22.5),
                    BendMark::new("Center", center, 45.0),
                    BendMark::new("Outer 2", center + spread, 22.5),
                ],
                distance_between_bends_in: Some(spread),
                shrink_in: shrink,
                take_up_in: None,
                gain_in: None,
            })
        }
        BendType::FourPointSaddle {
            depth_in,
            angle,
            distance_to_obstruction_in,
            obstruction_width_in,
        } => {
            let between = depth_in * angle.multiplier();
            let shrink = depth_in * angle.shrink_per_inch();
            let second = distance_to_obstruction_in + shrink;
            let first = second - between;
            first_mark_check(first)?;
            let third = second + obstruction_width_in;
            let fourth = third + between;
            Ok(BendingResult {
                marks: vec![
                    BendMark::new("Bend 1", first, angle.degrees()),
                    BendMark::new("Bend 2", second, angle.degrees()),
                    BendMark::new("Bend 3", third, angle.degrees()),
                    BendMark::new("Bend 4", fourth, angle.degrees()),
                ],
                distance_between_bends_in: Some(between),
                shrink_in: 2.0 * shrink,
                take_up_in: None,
                gain_in: None,
            })
        }
        BendType::Stub { height_in, trade_size } => {
            let (take_up, gain) = stub_take_up(trade_size)
                .ok_or_else(|| CalcError::data_not_found("stub take-up", format!("EMT {}", trade_size)))?;
            if height_in < take_up {
                return Err(CalcError::calculation_failed(
                    "Conduit Bending",
                    format!(
                        "{} in. stub is shorter than the {} in. take-up for {} EMT",
                        height_in, take_up, trade_size
                    ),
                ));
            }
            Ok(BendingResult {
                marks: vec![BendMark::new("Stub", height_in - take_up, 90.0)],
                distance_between_bends_in: None,
                shrink_in: 0.0,
                take_up_in: Some(take_up),
                gain_in: Some(gain),
            })
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bend(bend: BendType) -> BendingResult {
        calculate(&BendingInput {
            label: String::new(),
            bend,
        })
        .unwrap()
    }

    #[test]
    fn test_offset_30() {
        let result = bend(BendType::Offset {
            depth_in: 6.0,
            angle: BendAngle::Deg30,
            distance_to_obstruction_in: 36.0,
        });
        // 6 × 2 = 12 apart, 6 × 1/4 = 1.5 shrink
        assert_eq!(result.distance_between_bends_in, Some(12.0));
        assert_eq!(result.shrink_in, 1.5);
        assert_eq!(result.marks[1].distance_in, 37.5);
        assert_eq!(result.marks[0].distance_in, 25.5);
    }

    #[test]
    fn test_offset_too_close() {
        let err = calculate(&BendingInput {
            label: String::new(),
            bend: BendType::Offset {
                depth_in: 10.0,
                angle: BendAngle::Deg10,
                distance_to_obstruction_in: 20.0,
            },
        })
        .unwrap_err();
        assert_eq!(err.error_code(), "CALCULATION_FAILED");
    }

    #[test]
    fn test_three_point_saddle() {
        let result = bend(BendType::ThreePointSaddle {
            depth_in: 4.0,
            distance_to_center_in: 30.0,
        });
        // 4 × 3/16 = 0.75 shrink, outer marks 10 in. either side
        assert_eq!(result.shrink_in, 0.75);
        let marks: Vec<f64> = result.marks.iter().map(|m| m.distance_in).collect();
        assert_eq!(marks, vec![20.75, 30.75, 40.75]);
        assert_eq!(result.marks[1].angle_deg, 45.0);
    }

    #[test]
    fn test_four_point_saddle() {
        let result = bend(BendType::FourPointSaddle {
            depth_in: 4.0,
            angle: BendAngle::Deg45,
            distance_to_obstruction_in: 24.0,
            obstruction_width_in: 8.0,
        });
        // 4 × 1.414 = 5.656 apart, 1.5 shrink per offset
        assert_eq!(result.shrink_in, 3.0);
        let marks: Vec<f64> = result.marks.iter().map(|m| m.distance_in).collect();
        assert!((marks[0] - 19.844).abs() < 1e-9);
        assert_eq!(marks[1], 25.5);
        assert_eq!(marks[2], 33.5);
        assert!((marks[3] - 39.156).abs() < 1e-9);
    }

    #[test]
    fn test_stub() {
        let result = bend(BendType::Stub {
            height_in: 12.0,
            trade_size: TradeSize::ThreeQuarter,
        });
        assert_eq!(result.marks[0].distance_in, 6.0);
        assert_eq!(result.gain_in, Some(3.25));

        let err = calculate(&BendingInput {
            label: String::new(),
            bend: BendType::Stub {
                height_in: 12.0,
                trade_size: TradeSize::Two,
            },
        })
        .unwrap_err();
        assert_eq!(err.error_code(), "DATA_NOT_FOUND");
    }

    #[test]
    fn test_angle_parsing() {
        assert_eq!(BendAngle::from_str_flexible("22.5°").unwrap(), BendAngle::Deg22_5);
        assert_eq!(BendAngle::from_str_flexible(" 45 ").unwrap(), BendAngle::Deg45);
        assert!(BendAngle::from_str_flexible("90").is_err());
    }

    #[test]
    fn test_form() {
        let form = BendingForm {
            bend: "offset".to_string(),
            depth: "6".to_string(),
            distance: "36".to_string(),
            ..Default::default()
        };
        assert_eq!(
            form.parse().unwrap().bend,
            BendType::Offset {
                depth_in: 6.0,
                angle: BendAngle::Deg30,
                distance_to_obstruction_in: 36.0,
            }
        );

        let stub = BendingForm {
            bend: "stub".to_string(),
            height: "10".to_string(),
            trade_size: "1/2".to_string(),
            ..Default::default()
        };
        assert!(matches!(stub.parse().unwrap().bend, BendType::Stub { height_in, .. } if height_in == 10.0));
    }
}
