//! Cross-module properties checked through the public API.

use calc_core::calculations::conduit_fill::{self, fill_fraction, ConductorGroup, ConduitFillInput};
use calc_core::calculations::dwelling_load::{general_demand_va, range_demand_va};
use calc_core::calculations::luminaire::{self, CuSource, LayoutChoice, LuminaireInput, LuminaireTarget};
use calc_core::calculations::resistance::{self, Connection, ResistanceInput};
use calc_core::catalog::{next_standard_size, STANDARD_OCPD_RATINGS};
use calc_core::conductors::{larger_of, ConductorSize, ConduitType, InsulationType, TradeSize};
use calc_core::reference::{
    interpolate_cu, ConduitAreaEntry, CuPoint, MemoryReferenceStore, ReferenceLookup, WireAreaEntry,
};
use calc_core::settings::LightingSettings;

fn curve() -> Vec<CuPoint> {
    [(1.0, 0.80), (2.0, 0.70), (3.0, 0.62)]
        .into_iter()
        .map(|(room_cavity_ratio, cu)| CuPoint { room_cavity_ratio, cu })
        .collect()
}

#[test]
fn cu_interpolation_clamps_and_hits_stored_points() {
    let points = curve();
    assert_eq!(interpolate_cu(&points, 0.2), Some(0.80));
    assert_eq!(interpolate_cu(&points, 1.0), Some(0.80));
    assert_eq!(interpolate_cu(&points, 3.0), Some(0.62));
    assert_eq!(interpolate_cu(&points, 9.0), Some(0.62));
    assert_eq!(interpolate_cu(&points, 2.0), Some(0.70));

    let mid = interpolate_cu(&points, 1.5).unwrap();
    assert!((mid - 0.75).abs() < 1e-12);
    assert_eq!(interpolate_cu(&[], 1.0), None);
}

#[test]
fn larger_conductor_ordering() {
    assert_eq!(larger_of("10 AWG", "12 AWG").unwrap(), "10 AWG");
    assert_eq!(larger_of("1 AWG", "1/0").unwrap(), "1/0");
    assert_eq!(larger_of("250 kcmil", "4/0").unwrap(), "250 kcmil");
    assert!(larger_of("banana", "4/0").is_err());
}

#[test]
fn fill_fraction_at_boundary_counts() {
    assert_eq!(fill_fraction(1, false), 0.53);
    assert_eq!(fill_fraction(2, false), 0.31);
    assert_eq!(fill_fraction(3, false), 0.40);
}

#[test]
fn parallel_resistance_identities() {
    let run = |connection, resistors: Vec<f64>| {
        resistance::calculate(&ResistanceInput {
            label: String::new(),
            connection,
            resistors,
        })
    };

    assert_eq!(run(Connection::Parallel, vec![220.0, 220.0]).unwrap().total_ohms, 110.0);
    assert_eq!(run(Connection::Series, vec![47.0]).unwrap().total_ohms, 47.0);
    assert_eq!(run(Connection::Parallel, vec![47.0]).unwrap().total_ohms, 47.0);

    let err = run(Connection::Parallel, vec![10.0, 0.0]).unwrap_err();
    assert_eq!(err.error_code(), "CALCULATION_FAILED");
}

#[test]
fn dwelling_demand_tiers() {
    assert_eq!(general_demand_va(3000.0), 3000.0);
    assert!((general_demand_va(4000.0) - 3350.0).abs() < 1e-9);
}

#[test]
fn range_demand_boundary() {
    assert_eq!(range_demand_va(12.0), 8000.0);
    assert!((range_demand_va(13.0) - 8400.0).abs() < 1e-9);
}

#[test]
fn standard_size_search() {
    assert_eq!(next_standard_size(STANDARD_OCPD_RATINGS, 47.3), Some(50.0));
    assert_eq!(next_standard_size(STANDARD_OCPD_RATINGS, 50.0), Some(50.0));
}

#[tokio::test]
async fn luminaire_office_scenario() {
    let input = LuminaireInput {
        label: "Office".to_string(),
        room_length_ft: 20.0,
        room_width_ft: 15.0,
        ceiling_height_ft: 9.0,
        work_plane_height_ft: 2.5,
        fixture_lumens: 3000.0,
        light_loss_factor: 0.8,
        fixture_watts: 0.0,
        cu: CuSource::Manual { cu: 0.7 },
        target: LuminaireTarget::FixtureCount {
            desired_footcandles: 50.0,
            layout: LayoutChoice::Auto,
        },
    };
    let lookup = ReferenceLookup::new(MemoryReferenceStore::new());
    let result = luminaire::calculate(&input, &lookup, &LightingSettings::default())
        .await
        .unwrap();

    assert_eq!(result.cavity_height_ft, 6.5);
    assert!((result.room_cavity_ratio - 2.5 * 6.5 * 35.0 / 300.0).abs() < 1e-12);
    assert!((result.effective_lumens_per_fixture - 1680.0).abs() < 1e-9);
    assert_eq!(result.min_fixtures, Some(9));
    assert!(result.fixture_count >= 9);
    assert_eq!(result.meets_target, Some(true));
}

#[tokio::test]
async fn fill_equal_to_allowable_is_not_overfill() {
    let mut store = MemoryReferenceStore::new();
    store.insert_conduit_area(ConduitAreaEntry::new(ConduitType::Emt, TradeSize::One, 2.0));
    store.insert_wire_area(WireAreaEntry {
        insulation: InsulationType::Thhn,
        size: ConductorSize::Awg(2),
        area_in2: 1.06,
    });
    let lookup = ReferenceLookup::new(store);

    let input = ConduitFillInput {
        label: String::new(),
        conduit_type: ConduitType::Emt,
        trade_size: TradeSize::One,
        conductors: vec![ConductorGroup {
            size: ConductorSize::Awg(2),
            insulation: InsulationType::Thhn,
            quantity: 1,
        }],
        nipple: false,
    };
    let result = conduit_fill::calculate(&input, &lookup).await.unwrap();
    assert_eq!(result.total_conductor_area_in2, result.allowable_area_in2);
    assert!(!result.overfilled);
    assert_eq!(result.remaining_area_in2, 0.0);
}
