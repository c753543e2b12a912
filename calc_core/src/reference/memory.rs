//! In-memory reference store.
//!
//! Point lookups go through hash maps keyed by the composite key of each
//! table, so a key resolves to at most one row. Inserting a row whose key is
//! already present replaces it, which makes [`MemoryReferenceStore::populate`]
//! idempotent.

use std::collections::HashMap;
use std::future::{ready, Future};

use serde::Serialize;

use crate::conductors::{
    horsepower_key, BoxFillCategory, ConductorMaterial, ConductorSize, ConduitType, FuseClass, InsulationType, Phase,
    ProtectiveDevice, RacewayMaterial, TemperatureRating, TradeSize,
};
use crate::errors::CalcResult;

use super::bundle::{NormalizedTables, ReferenceBundle};
use super::{
    AmpacityEntry, BoxFillAllowanceEntry, CoefficientOfUtilizationTable, ConductorAdjustmentEntry,
    ConductorImpedanceEntry, ConductorPropertiesEntry, ConduitAreaEntry, MotorFlcEntry, MotorFuseSizeEntry,
    MotorProtectionPercentageEntry, ReferenceStore, TemperatureCorrectionEntry, WireAreaEntry,
};

type MotorKey = (u32, u32, Phase);

/// Row counts per table, for diagnostics and the CLI `tables` command.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct TableSummary {
    pub ampacity: usize,
    pub conductor_properties: usize,
    pub conductor_impedance: usize,
    pub conduit_areas: usize,
    pub wire_areas: usize,
    pub box_fill: usize,
    pub temperature_correction: usize,
    pub conductor_adjustment: usize,
    pub motor_flc: usize,
    pub motor_protection: usize,
    pub motor_fuse: usize,
    pub cu_tables: usize,
}

/// Reference store held entirely in memory.
#[derive(Debug, Clone, Default)]
pub struct MemoryReferenceStore {
    ampacity: HashMap<(ConductorMaterial, ConductorSize, TemperatureRating), AmpacityEntry>,
    conductor_properties: HashMap<(ConductorMaterial, ConductorSize), ConductorPropertiesEntry>,
    conductor_impedance: HashMap<(ConductorMaterial, ConductorSize, RacewayMaterial), ConductorImpedanceEntry>,
    conduit_areas: HashMap<(ConduitType, TradeSize), ConduitAreaEntry>,
    wire_areas: HashMap<(InsulationType, ConductorSize), WireAreaEntry>,
    box_fill: HashMap<(BoxFillCategory, Option<ConductorSize>), BoxFillAllowanceEntry>,
    /// Per rating, ascending by ambient temperature
    temperature_correction: HashMap<TemperatureRating, Vec<TemperatureCorrectionEntry>>,
    /// Ascending by `min_count`
    conductor_adjustment: Vec<ConductorAdjustmentEntry>,
    motor_flc: HashMap<MotorKey, MotorFlcEntry>,
    motor_protection: HashMap<ProtectiveDevice, MotorProtectionPercentageEntry>,
    motor_fuse: HashMap<(FuseClass, u32, u32, Phase), MotorFuseSizeEntry>,
    cu_tables: HashMap<(u32, u32, u32), CoefficientOfUtilizationTable>,
}

impl MemoryReferenceStore {
    /// An empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// A store populated from the tables bundled with the crate.
    pub fn bundled() -> CalcResult<Self> {
        let mut store = Self::new();
        store.populate(ReferenceBundle::bundled()?)?;
        Ok(store)
    }

    /// Insert every row of a bundle, replacing rows with the same key.
    pub fn populate(&mut self, bundle: &ReferenceBundle) -> CalcResult<()> {
        let tables = bundle.normalize()?;
        self.insert_tables(tables);
        let summary = self.summary();
        tracing::info!(
            ampacity = summary.ampacity,
            conduit_areas = summary.conduit_areas,
            motor_flc = summary.motor_flc,
            cu_tables = summary.cu_tables,
            "reference store populated"
        );
        Ok(())
    }

    fn insert_tables(&mut self, tables: NormalizedTables) {
        tables.ampacity.into_iter().for_each(|e| self.insert_ampacity(e));
        for e in tables.conductor_properties {
            self.conductor_properties.insert((e.material, e.size), e);
        }
        for e in tables.conductor_impedance {
            self.conductor_impedance.insert((e.material, e.size, e.raceway), e);
        }
        tables.conduit_areas.into_iter().for_each(|e| self.insert_conduit_area(e));
        tables.wire_areas.into_iter().for_each(|e| self.insert_wire_area(e));
        for e in tables.box_fill {
            self.box_fill.insert((e.category, e.size), e);
        }
        tables
            .temperature_correction
            .into_iter()
            .for_each(|e| self.insert_temperature_correction(e));
        tables
            .conductor_adjustment
            .into_iter()
            .for_each(|e| self.insert_conductor_adjustment(e));
        for e in tables.motor_flc {
            self.motor_flc.insert((horsepower_key(e.horsepower), e.voltage, e.phase), e);
        }
        for e in tables.motor_protection {
            self.motor_protection.insert(e.device, e);
        }
        for e in tables.motor_fuse {
            self.motor_fuse
                .insert((e.class, horsepower_key(e.horsepower), e.voltage, e.phase), e);
        }
        tables.cu_tables.into_iter().for_each(|t| self.insert_cu_table(t));
    }

    pub fn insert_ampacity(&mut self, entry: AmpacityEntry) {
        self.ampacity
            .insert((entry.material, entry.size, entry.temperature_rating), entry);
    }

    pub fn insert_conduit_area(&mut self, entry: ConduitAreaEntry) {
        self.conduit_areas.insert((entry.conduit_type, entry.trade_size), entry);
    }

    pub fn insert_wire_area(&mut self, entry: WireAreaEntry) {
        self.wire_areas.insert((entry.insulation, entry.size), entry);
    }

    pub fn insert_temperature_correction(&mut self, entry: TemperatureCorrectionEntry) {
        let curve = self.temperature_correction.entry(entry.temperature_rating).or_default();
        curve.retain(|e| e.ambient_c != entry.ambient_c);
        curve.push(entry);
        curve.sort_by(|a, b| a.ambient_c.total_cmp(&b.ambient_c));
    }

    pub fn insert_conductor_adjustment(&mut self, entry: ConductorAdjustmentEntry) {
        self.conductor_adjustment
            .retain(|e| (e.min_count, e.max_count) != (entry.min_count, entry.max_count));
        self.conductor_adjustment.push(entry);
        self.conductor_adjustment.sort_by_key(|e| e.min_count);
    }

    pub fn insert_cu_table(&mut self, table: CoefficientOfUtilizationTable) {
        let table = CoefficientOfUtilizationTable::new(table.ceiling, table.wall, table.floor, table.points);
        self.cu_tables.insert((table.ceiling, table.wall, table.floor), table);
    }

    /// Reflectance combinations with a CU table, sorted.
    pub fn cu_selectors(&self) -> Vec<(u32, u32, u32)> {
        let mut keys: Vec<_> = self.cu_tables.keys().copied().collect();
        keys.sort_unstable_by(|a, b| b.cmp(a));
        keys
    }

    pub fn summary(&self) -> TableSummary {
        TableSummary {
            ampacity: self.ampacity.len(),
            conductor_properties: self.conductor_properties.len(),
            conductor_impedance: self.conductor_impedance.len(),
            conduit_areas: self.conduit_areas.len(),
            wire_areas: self.wire_areas.len(),
            box_fill: self.box_fill.len(),
            temperature_correction: self.temperature_correction.values().map(Vec::len).sum(),
            conductor_adjustment: self.conductor_adjustment.len(),
            motor_flc: self.motor_flc.len(),
            motor_protection: self.motor_protection.len(),
            motor_fuse: self.motor_fuse.len(),
            cu_tables: self.cu_tables.len(),
        }
    }

    fn nearest_correction(&self, rating: TemperatureRating, ambient_c: f64) -> Option<TemperatureCorrectionEntry> {
        let curve = self.temperature_correction.get(&rating)?;
        // ties go to the hotter row, which carries the smaller factor
        curve
            .iter()
            .copied()
            .min_by(|a, b| {
                let da = (a.ambient_c - ambient_c).abs();
                let db = (b.ambient_c - ambient_c).abs();
                da.total_cmp(&db).then(b.ambient_c.total_cmp(&a.ambient_c))
            })
    }
}

impl ReferenceStore for MemoryReferenceStore {
    fn ampacity(
        &self,
        material: ConductorMaterial,
        size: ConductorSize,
        rating: TemperatureRating,
    ) -> impl Future<Output = Option<AmpacityEntry>> + Send {
        ready(self.ampacity.get(&(material, size, rating)).copied())
    }

    fn ampacity_column(
        &self,
        material: ConductorMaterial,
        rating: TemperatureRating,
    ) -> impl Future<Output = Vec<AmpacityEntry>> + Send {
        let mut column: Vec<_> = self
            .ampacity
            .values()
            .filter(|e| e.material == material && e.temperature_rating == rating)
            .copied()
            .collect();
        column.sort_by_key(|e| e.size);
        ready(column)
    }

    fn conductor_properties(
        &self,
        material: ConductorMaterial,
        size: ConductorSize,
    ) -> impl Future<Output = Option<ConductorPropertiesEntry>> + Send {
        ready(self.conductor_properties.get(&(material, size)).copied())
    }

    fn conductor_impedance(
        &self,
        material: ConductorMaterial,
        size: ConductorSize,
        raceway: RacewayMaterial,
    ) -> impl Future<Output = Option<ConductorImpedanceEntry>> + Send {
        ready(self.conductor_impedance.get(&(material, size, raceway)).copied())
    }

    fn conduit_area(
        &self,
        conduit_type: ConduitType,
        trade_size: TradeSize,
    ) -> impl Future<Output = Option<ConduitAreaEntry>> + Send {
        ready(self.conduit_areas.get(&(conduit_type, trade_size)).copied())
    }

    fn conduit_areas(&self, conduit_type: ConduitType) -> impl Future<Output = Vec<ConduitAreaEntry>> + Send {
        let mut sizes: Vec<_> = self
            .conduit_areas
            .values()
            .filter(|e| e.conduit_type == conduit_type)
            .copied()
            .collect();
        sizes.sort_by(|a, b| a.area_in2.total_cmp(&b.area_in2));
        ready(sizes)
    }

    fn wire_area(
        &self,
        insulation: InsulationType,
        size: ConductorSize,
    ) -> impl Future<Output = Option<WireAreaEntry>> + Send {
        ready(self.wire_areas.get(&(insulation, size)).copied())
    }

    fn box_fill_allowance(
        &self,
        category: BoxFillCategory,
        size: Option<ConductorSize>,
    ) -> impl Future<Output = Option<BoxFillAllowanceEntry>> + Send {
        ready(self.box_fill.get(&(category, size)).copied())
    }

    fn temperature_correction(
        &self,
        rating: TemperatureRating,
        ambient_c: f64,
    ) -> impl Future<Output = Option<TemperatureCorrectionEntry>> + Send {
        ready(self.nearest_correction(rating, ambient_c))
    }

    fn conductor_adjustment(&self, count: u32) -> impl Future<Output = Option<ConductorAdjustmentEntry>> + Send {
        ready(self.conductor_adjustment.iter().find(|e| e.contains(count)).copied())
    }

    fn motor_flc(
        &self,
        horsepower: f64,
        voltage: u32,
        phase: Phase,
    ) -> impl Future<Output = Option<MotorFlcEntry>> + Send {
        ready(self.motor_flc.get(&(horsepower_key(horsepower), voltage, phase)).copied())
    }

    fn motor_protection_percentage(
        &self,
        device: ProtectiveDevice,
    ) -> impl Future<Output = Option<MotorProtectionPercentageEntry>> + Send {
        ready(self.motor_protection.get(&device).copied())
    }

    fn motor_fuse_size(
        &self,
        class: FuseClass,
        horsepower: f64,
        voltage: u32,
        phase: Phase,
    ) -> impl Future<Output = Option<MotorFuseSizeEntry>> + Send {
        ready(
            self.motor_fuse
                .get(&(class, horsepower_key(horsepower), voltage, phase))
                .copied(),
        )
    }

    fn cu_table(
        &self,
        ceiling: u32,
        wall: u32,
        floor: u32,
    ) -> impl Future<Output = Option<CoefficientOfUtilizationTable>> + Send {
        ready(self.cu_tables.get(&(ceiling, wall, floor)).cloned())
    }
}
