//! Lookup layer handed to calculators.
//!
//! Wraps a [`ReferenceStore`] and turns each `None` into a
//! [`CalcError::DataNotFound`] naming the table and the key combination that
//! missed, so calculators can propagate misses with `?`.

use std::sync::Arc;

use crate::conductors::{
    BoxFillCategory, ConductorMaterial, ConductorSize, ConduitType, FuseClass, InsulationType, Phase,
    ProtectiveDevice, RacewayMaterial, TemperatureRating, TradeSize,
};
use crate::errors::{CalcError, CalcResult};

use super::interpolate::interpolate_cu;
use super::memory::MemoryReferenceStore;
use super::{
    AmpacityEntry, BoxFillAllowanceEntry, ConductorAdjustmentEntry, ConductorImpedanceEntry,
    ConductorPropertiesEntry, ConduitAreaEntry, MotorFlcEntry, MotorFuseSizeEntry,
    MotorProtectionPercentageEntry, ReferenceStore, TemperatureCorrectionEntry, WireAreaEntry,
};

/// Half the width of a temperature-correction band. A query further above
/// the nearest stored ambient than this is outside every band the rating is
/// permitted in.
const AMBIENT_BAND_HALF_WIDTH_C: f64 = 2.5;

fn found<T>(row: Option<T>, table: &str, key: impl FnOnce() -> String) -> CalcResult<T> {
    match row {
        Some(row) => {
            tracing::trace!(table, "lookup hit");
            Ok(row)
        }
        None => {
            let key = key();
            tracing::warn!(table, key = %key, "lookup miss");
            Err(CalcError::data_not_found(table, key))
        }
    }
}

/// Shared, cheaply clonable handle to a reference store.
#[derive(Debug)]
pub struct ReferenceLookup<S> {
    store: Arc<S>,
}

impl<S> Clone for ReferenceLookup<S> {
    fn clone(&self) -> Self {
        ReferenceLookup {
            store: Arc::clone(&self.store),
        }
    }
}

impl ReferenceLookup<MemoryReferenceStore> {
    /// A lookup over a fresh in-memory store loaded with the bundled tables.
    pub fn bundled() -> CalcResult<Self> {
        Ok(Self::new(MemoryReferenceStore::bundled()?))
    }
}

impl<S: ReferenceStore> ReferenceLookup<S> {
    pub fn new(store: S) -> Self {
        Self::from_arc(Arc::new(store))
    }

    pub fn from_arc(store: Arc<S>) -> Self {
        ReferenceLookup { store }
    }

    pub fn store(&self) -> &S {
        &self.store
    }

    pub async fn ampacity(
        &self,
        material: ConductorMaterial,
        size: ConductorSize,
        rating: TemperatureRating,
    ) -> CalcResult<AmpacityEntry> {
        let row = self.store.ampacity(material, size, rating).await;
        found(row, "ampacity", || format!("{} {} {}", material, size, rating))
    }

    /// All sizes in one material/rating column, smallest first.
    pub async fn ampacity_column(
        &self,
        material: ConductorMaterial,
        rating: TemperatureRating,
    ) -> CalcResult<Vec<AmpacityEntry>> {
        let column = self.store.ampacity_column(material, rating).await;
        let column = (!column.is_empty()).then_some(column);
        found(column, "ampacity", || format!("{} {}", material, rating))
    }

    pub async fn conductor_properties(
        &self,
        material: ConductorMaterial,
        size: ConductorSize,
    ) -> CalcResult<ConductorPropertiesEntry> {
        let row = self.store.conductor_properties(material, size).await;
        found(row, "conductor properties", || format!("{} {}", material, size))
    }

    pub async fn conductor_impedance(
        &self,
        material: ConductorMaterial,
        size: ConductorSize,
        raceway: RacewayMaterial,
    ) -> CalcResult<ConductorImpedanceEntry> {
        let row = self.store.conductor_impedance(material, size, raceway).await;
        found(row, "conductor impedance", || {
            format!("{} {} in {} raceway", material, size, raceway)
        })
    }

    pub async fn conduit_area(&self, conduit_type: ConduitType, trade_size: TradeSize) -> CalcResult<ConduitAreaEntry> {
        let row = self.store.conduit_area(conduit_type, trade_size).await;
        found(row, "conduit area", || format!("{} {}", trade_size, conduit_type))
    }

    /// Every catalog size of a conduit type, smallest area first.
    pub async fn conduit_areas(&self, conduit_type: ConduitType) -> CalcResult<Vec<ConduitAreaEntry>> {
        let sizes = self.store.conduit_areas(conduit_type).await;
        let sizes = (!sizes.is_empty()).then_some(sizes);
        found(sizes, "conduit area", || conduit_type.to_string())
    }

    pub async fn wire_area(&self, insulation: InsulationType, size: ConductorSize) -> CalcResult<WireAreaEntry> {
        let row = self.store.wire_area(insulation, size).await;
        found(row, "wire area", || format!("{} {}", size, insulation))
    }

    pub async fn box_fill_allowance(
        &self,
        category: BoxFillCategory,
        size: Option<ConductorSize>,
    ) -> CalcResult<BoxFillAllowanceEntry> {
        let row = self.store.box_fill_allowance(category, size).await;
        found(row, "box fill", || match size {
            Some(size) => format!("{:?} {}", category, size),
            None => format!("{:?} N/A", category),
        })
    }

    /// Correction factor for the band containing `ambient_c`.
    ///
    /// The store answers with the nearest stored ambient; an ambient hotter
    /// than every band permitted for the rating is a miss.
    pub async fn temperature_correction(
        &self,
        rating: TemperatureRating,
        ambient_c: f64,
    ) -> CalcResult<TemperatureCorrectionEntry> {
        let row = self
            .store
            .temperature_correction(rating, ambient_c)
            .await
            .filter(|row| ambient_c - row.ambient_c <= AMBIENT_BAND_HALF_WIDTH_C);
        found(row, "temperature correction", || format!("{} at {} °C ambient", rating, ambient_c))
    }

    pub async fn conductor_adjustment(&self, count: u32) -> CalcResult<ConductorAdjustmentEntry> {
        let row = self.store.conductor_adjustment(count).await;
        found(row, "conductor adjustment", || format!("{} current-carrying conductors", count))
    }

    pub async fn motor_flc(&self, horsepower: f64, voltage: u32, phase: Phase) -> CalcResult<MotorFlcEntry> {
        let row = self.store.motor_flc(horsepower, voltage, phase).await;
        found(row, "motor FLC", || format!("{} hp {} V {}", horsepower, voltage, phase))
    }

    pub async fn motor_protection_percentage(
        &self,
        device: ProtectiveDevice,
    ) -> CalcResult<MotorProtectionPercentageEntry> {
        let row = self.store.motor_protection_percentage(device).await;
        found(row, "motor protection", || device.to_string())
    }

    pub async fn motor_fuse_size(
        &self,
        class: FuseClass,
        horsepower: f64,
        voltage: u32,
        phase: Phase,
    ) -> CalcResult<MotorFuseSizeEntry> {
        let row = self.store.motor_fuse_size(class, horsepower, voltage, phase).await;
        found(row, "motor fuse size", || {
            format!("{:?} {} hp {} V {}", class, horsepower, voltage, phase)
        })
    }

    /// Interpolated coefficient of utilization.
    ///
    /// A missing reflectance combination is [`CalcError::TableNotFound`]; a
    /// ratio outside the curve clamps to its end points.
    pub async fn coefficient_of_utilization(
        &self,
        ceiling: u32,
        wall: u32,
        floor: u32,
        room_cavity_ratio: f64,
    ) -> CalcResult<f64> {
        let key = || format!("ceiling {}% / wall {}% / floor {}%", ceiling, wall, floor);
        let Some(table) = self.store.cu_table(ceiling, wall, floor).await else {
            let key = key();
            tracing::warn!(key = %key, "no coefficient of utilization table");
            return Err(CalcError::table_not_found("coefficient of utilization", key));
        };
        let cu = interpolate_cu(&table.points, room_cavity_ratio)
            .ok_or_else(|| CalcError::table_not_found("coefficient of utilization", key()))?;
        tracing::debug!(room_cavity_ratio, cu, "interpolated coefficient of utilization");
        Ok(cu)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup() -> ReferenceLookup<MemoryReferenceStore> {
        ReferenceLookup::bundled().unwrap()
    }

    #[tokio::test]
    async fn test_miss_names_key() {
        let err = lookup()
            .ampacity(ConductorMaterial::Aluminum, ConductorSize::Awg(14), TemperatureRating::C75)
            .await
            .unwrap_err();
        assert_eq!(err.error_code(), "DATA_NOT_FOUND");
        assert!(err.to_string().contains("14 AWG"));
        assert!(err.to_string().contains("Aluminum"));
    }

    #[tokio::test]
    async fn test_temperature_not_permitted() {
        let lookup = lookup();
        // 60 °C insulation has no band above 55 °C
        let err = lookup
            .temperature_correction(TemperatureRating::C60, 58.0)
            .await
            .unwrap_err();
        assert!(err.is_lookup_miss());

        let ok = lookup.temperature_correction(TemperatureRating::C60, 55.0).await.unwrap();
        assert_eq!(ok.factor, 0.41);

        // cold ambients fall into the lowest band
        let cold = lookup.temperature_correction(TemperatureRating::C90, -10.0).await.unwrap();
        assert_eq!(cold.factor, 1.15);
    }

    #[tokio::test]
    async fn test_cu_table_not_found_is_distinct() {
        let lookup = lookup();
        let err = lookup.coefficient_of_utilization(90, 90, 90, 1.0).await.unwrap_err();
        assert_eq!(err.error_code(), "TABLE_NOT_FOUND");

        // out-of-range ratio clamps instead of failing
        let high = lookup.coefficient_of_utilization(80, 50, 20, 25.0).await.unwrap();
        assert_eq!(high, 0.29);
    }

    #[tokio::test]
    async fn test_cu_interpolates() {
        let cu = lookup().coefficient_of_utilization(80, 50, 20, 1.5).await.unwrap();
        assert!((cu - 0.63).abs() < 1e-9);
    }

    #[tokio::test]
    async fn test_clones_share_store() {
        let a = lookup();
        let b = a.clone();
        assert!(std::ptr::eq(a.store(), b.store()));
    }
}
