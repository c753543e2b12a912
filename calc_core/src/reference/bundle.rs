//! Bundled reference tables.
//!
//! The tables ship inside the crate as `data/reference_tables.toml` and are
//! parsed once on first use. Rows are stored in wide form (one row per size
//! with a column per rating, voltage or raceway) and normalized into
//! per-key entries by [`ReferenceBundle::normalize`].

use once_cell::sync::Lazy;
use serde::Deserialize;

use crate::conductors::{
    horsepower_key, parse_horsepower, BoxFillCategory, ConductorMaterial, ConductorSize, ConduitType, FuseClass,
    InsulationType, Phase, ProtectiveDevice, RacewayMaterial, TemperatureRating, TradeSize,
};
use crate::errors::{CalcError, CalcResult};

use super::{
    AmpacityEntry, BoxFillAllowanceEntry, CoefficientOfUtilizationTable, ConductorAdjustmentEntry,
    ConductorImpedanceEntry, ConductorPropertiesEntry, ConduitAreaEntry, CuPoint, MotorFlcEntry,
    MotorFuseSizeEntry, MotorProtectionPercentageEntry, TemperatureCorrectionEntry, WireAreaEntry,
};

const BUNDLED_TABLES: &str = include_str!("../../data/reference_tables.toml");

static BUNDLED: Lazy<CalcResult<ReferenceBundle>> = Lazy::new(|| ReferenceBundle::from_toml_str(BUNDLED_TABLES));

#[derive(Debug, Clone, Deserialize)]
struct ByMaterial<R> {
    copper: Vec<R>,
    aluminum: Vec<R>,
}

impl<R> ByMaterial<R> {
    fn iter(&self) -> impl Iterator<Item = (ConductorMaterial, &R)> {
        self.copper
            .iter()
            .map(|r| (ConductorMaterial::Copper, r))
            .chain(self.aluminum.iter().map(|r| (ConductorMaterial::Aluminum, r)))
    }
}

#[derive(Debug, Clone, Deserialize)]
struct ConduitAreas {
    emt: Vec<(TradeSize, f64)>,
    pvc_sch40: Vec<(TradeSize, f64)>,
    pvc_sch80: Vec<(TradeSize, f64)>,
    rmc: Vec<(TradeSize, f64)>,
}

#[derive(Debug, Clone, Deserialize)]
struct WireAreas {
    thhn: Vec<(ConductorSize, f64)>,
    xhhw: Vec<(ConductorSize, f64)>,
    thw: Vec<(ConductorSize, f64)>,
}

#[derive(Debug, Clone, Deserialize)]
struct BoxFillVolumes {
    volumes: Vec<(ConductorSize, f64)>,
}

#[derive(Debug, Clone, Deserialize)]
struct Rows<R> {
    rows: Vec<R>,
}

#[derive(Debug, Clone, Deserialize)]
struct MotorProtection {
    non_time_delay_fuse: f64,
    time_delay_fuse: f64,
    instantaneous_trip_breaker: f64,
    inverse_time_breaker: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
enum Cell {
    Number(f64),
    Text(String),
}

/// Horsepower rows with one value column per listed voltage.
#[derive(Debug, Clone, Deserialize)]
struct MotorTable {
    voltages: Vec<u32>,
    rows: Vec<Vec<Cell>>,
}

impl MotorTable {
    /// Flatten into (horsepower, voltage, value) triples.
    fn cells(&self, table: &str) -> CalcResult<Vec<(f64, u32, f64)>> {
        let mut out = Vec::with_capacity(self.rows.len() * self.voltages.len());
        for row in &self.rows {
            let (hp_cell, values) = row
                .split_first()
                .ok_or_else(|| CalcError::serialization(format!("{table}: empty row")))?;
            let hp = match hp_cell {
                Cell::Text(text) => parse_horsepower(text),
                Cell::Number(n) => Some(*n),
            }
            .ok_or_else(|| CalcError::serialization(format!("{table}: bad horsepower {hp_cell:?}")))?;

            if values.len() != self.voltages.len() {
                return Err(CalcError::serialization(format!(
                    "{table}: {hp} hp row has {} values for {} voltages",
                    values.len(),
                    self.voltages.len()
                )));
            }
            for (voltage, cell) in self.voltages.iter().zip(values) {
                match cell {
                    Cell::Number(value) => out.push((hp, *voltage, *value)),
                    Cell::Text(text) => {
                        return Err(CalcError::serialization(format!("{table}: expected a number, found '{text}'")))
                    }
                }
            }
        }
        Ok(out)
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MotorTables {
    single_phase: MotorTable,
    three_phase: MotorTable,
}

impl MotorTables {
    fn cells(&self, table: &str) -> CalcResult<Vec<(f64, u32, Phase, f64)>> {
        let single = self.single_phase.cells(table)?.into_iter().map(|(hp, v, x)| (hp, v, Phase::Single, x));
        let three = self.three_phase.cells(table)?.into_iter().map(|(hp, v, x)| (hp, v, Phase::Three, x));
        Ok(single.chain(three).collect())
    }
}

#[derive(Debug, Clone, Deserialize)]
struct MotorFuseTables {
    non_time_delay: MotorTables,
    time_delay: MotorTables,
}

#[derive(Debug, Clone, Deserialize)]
struct CuRecord {
    ceiling: u32,
    wall: u32,
    floor: u32,
    points: Vec<(f64, f64)>,
}

/// The bundled tables as parsed from TOML.
#[derive(Debug, Clone, Deserialize)]
pub struct ReferenceBundle {
    ampacity: ByMaterial<(ConductorSize, f64, f64, f64)>,
    conductor_properties: ByMaterial<(ConductorSize, f64, f64)>,
    conductor_impedance: ByMaterial<(ConductorSize, f64, f64, f64, f64, f64)>,
    conduit_area: ConduitAreas,
    wire_area: WireAreas,
    box_fill: BoxFillVolumes,
    temperature_correction: Rows<(f64, f64, f64, f64)>,
    conductor_adjustment: Rows<(u32, u32, f64)>,
    motor_protection: MotorProtection,
    motor_flc: MotorTables,
    motor_fuse: MotorFuseTables,
    coefficient_of_utilization: Vec<CuRecord>,
}

/// Normalized entries, one per key, ready for insertion into a store.
#[derive(Debug, Clone, Default)]
pub struct NormalizedTables {
    pub ampacity: Vec<AmpacityEntry>,
    pub conductor_properties: Vec<ConductorPropertiesEntry>,
    pub conductor_impedance: Vec<ConductorImpedanceEntry>,
    pub conduit_areas: Vec<ConduitAreaEntry>,
    pub wire_areas: Vec<WireAreaEntry>,
    pub box_fill: Vec<BoxFillAllowanceEntry>,
    pub temperature_correction: Vec<TemperatureCorrectionEntry>,
    pub conductor_adjustment: Vec<ConductorAdjustmentEntry>,
    pub motor_flc: Vec<MotorFlcEntry>,
    pub motor_protection: Vec<MotorProtectionPercentageEntry>,
    pub motor_fuse: Vec<MotorFuseSizeEntry>,
    pub cu_tables: Vec<CoefficientOfUtilizationTable>,
}

impl ReferenceBundle {
    /// Parse a bundle from TOML text.
    pub fn from_toml_str(text: &str) -> CalcResult<Self> {
        Ok(toml::from_str(text)?)
    }

    /// The tables compiled into this crate.
    pub fn bundled() -> CalcResult<&'static ReferenceBundle> {
        BUNDLED.as_ref().map_err(|e| e.clone())
    }

    /// Expand wide rows into one entry per key.
    pub fn normalize(&self) -> CalcResult<NormalizedTables> {
        let mut tables = NormalizedTables::default();

        for (material, &(size, c60, c75, c90)) in self.ampacity.iter() {
            for (rating, ampacity) in TemperatureRating::ALL.into_iter().zip([c60, c75, c90]) {
                tables.ampacity.push(AmpacityEntry {
                    material,
                    size,
                    temperature_rating: rating,
                    ampacity,
                });
            }
        }

        for (material, &(size, dc_resistance_per_kft, circular_mils)) in self.conductor_properties.iter() {
            tables.conductor_properties.push(ConductorPropertiesEntry {
                material,
                size,
                dc_resistance_per_kft,
                circular_mils,
            });
        }

        for (material, &(size, r_pvc, r_al, r_steel, x_nonmagnetic, x_steel)) in self.conductor_impedance.iter() {
            let columns = [
                (RacewayMaterial::Pvc, r_pvc, x_nonmagnetic),
                (RacewayMaterial::Aluminum, r_al, x_nonmagnetic),
                (RacewayMaterial::Steel, r_steel, x_steel),
            ];
            for (raceway, ac_resistance_per_kft, reactance_per_kft) in columns {
                tables.conductor_impedance.push(ConductorImpedanceEntry {
                    material,
                    size,
                    raceway,
                    ac_resistance_per_kft,
                    reactance_per_kft,
                });
            }
        }

        let conduits = [
            (ConduitType::Emt, &self.conduit_area.emt),
            (ConduitType::PvcSch40, &self.conduit_area.pvc_sch40),
            (ConduitType::PvcSch80, &self.conduit_area.pvc_sch80),
            (ConduitType::Rmc, &self.conduit_area.rmc),
        ];
        for (conduit_type, rows) in conduits {
            for &(trade_size, area) in rows {
                tables.conduit_areas.push(ConduitAreaEntry::new(conduit_type, trade_size, area));
            }
        }

        let wires = [
            (InsulationType::Thhn, &self.wire_area.thhn),
            (InsulationType::Xhhw, &self.wire_area.xhhw),
            (InsulationType::Thw, &self.wire_area.thw),
        ];
        for (insulation, rows) in wires {
            for &(size, area_in2) in rows {
                tables.wire_areas.push(WireAreaEntry {
                    insulation,
                    size,
                    area_in2,
                });
            }
        }

        for &(size, volume_in3) in &self.box_fill.volumes {
            for category in BoxFillCategory::ALL {
                tables.box_fill.push(BoxFillAllowanceEntry {
                    category,
                    size: Some(size),
                    volume_in3,
                    multiplier: category.default_multiplier(),
                });
            }
        }

        for &(ambient_c, f60, f75, f90) in &self.temperature_correction.rows {
            for (rating, factor) in TemperatureRating::ALL.into_iter().zip([f60, f75, f90]) {
                // zero marks a rating not permitted at this ambient
                if factor > 0.0 {
                    tables.temperature_correction.push(TemperatureCorrectionEntry {
                        temperature_rating: rating,
                        ambient_c,
                        factor,
                    });
                }
            }
        }

        for &(min_count, max_count, factor) in &self.conductor_adjustment.rows {
            if min_count > max_count {
                return Err(CalcError::serialization(format!(
                    "conductor adjustment range {min_count}-{max_count} is inverted"
                )));
            }
            tables.conductor_adjustment.push(ConductorAdjustmentEntry {
                min_count,
                max_count,
                factor,
            });
        }

        let protection = &self.motor_protection;
        tables.motor_protection = [
            (ProtectiveDevice::NonTimeDelayFuse, protection.non_time_delay_fuse),
            (ProtectiveDevice::TimeDelayFuse, protection.time_delay_fuse),
            (ProtectiveDevice::InstantaneousTripBreaker, protection.instantaneous_trip_breaker),
            (ProtectiveDevice::InverseTimeBreaker, protection.inverse_time_breaker),
        ]
        .into_iter()
        .map(|(device, percent)| MotorProtectionPercentageEntry { device, percent })
        .collect();

        tables.motor_flc = self
            .motor_flc
            .cells("motor_flc")?
            .into_iter()
            .map(|(horsepower, voltage, phase, flc)| MotorFlcEntry {
                horsepower,
                voltage,
                phase,
                flc,
            })
            .collect();

        for (class, source) in [
            (FuseClass::NonTimeDelay, &self.motor_fuse.non_time_delay),
            (FuseClass::TimeDelay, &self.motor_fuse.time_delay),
        ] {
            for (horsepower, voltage, phase, fuse_amps) in source.cells("motor_fuse")? {
                tables.motor_fuse.push(MotorFuseSizeEntry {
                    class,
                    horsepower,
                    voltage,
                    phase,
                    fuse_amps,
                });
            }
        }

        for record in &self.coefficient_of_utilization {
            let points = record
                .points
                .iter()
                .map(|&(room_cavity_ratio, cu)| CuPoint { room_cavity_ratio, cu })
                .collect();
            tables.cu_tables.push(CoefficientOfUtilizationTable::new(
                record.ceiling,
                record.wall,
                record.floor,
                points,
            ));
        }

        // every motor fuse row must have a matching FLC row
        for fuse in &tables.motor_fuse {
            let key = horsepower_key(fuse.horsepower);
            let has_flc = tables
                .motor_flc
                .iter()
                .any(|f| horsepower_key(f.horsepower) == key && f.voltage == fuse.voltage && f.phase == fuse.phase);
            if !has_flc {
                return Err(CalcError::serialization(format!(
                    "motor_fuse: {} hp {} V {} has no full-load current row",
                    fuse.horsepower, fuse.voltage, fuse.phase
                )));
            }
        }

        Ok(tables)
    }
}
