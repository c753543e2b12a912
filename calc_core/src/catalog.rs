//! # Standard Catalog Sizes
//!
//! Fixed ascending lists of standard ratings, and the "next standard size at
//! or above" search shared by the motor, transformer and dwelling
//! calculators.
//!
//! ```rust
//! use calc_core::catalog::{next_standard_size, STANDARD_OCPD_RATINGS};
//!
//! assert_eq!(next_standard_size(STANDARD_OCPD_RATINGS, 47.3), Some(50.0));
//! assert_eq!(next_standard_size(STANDARD_OCPD_RATINGS, 50.0), Some(50.0));
//! ```

/// Standard ampere ratings for fuses and inverse-time breakers (240.6(A)).
pub const STANDARD_OCPD_RATINGS: &[f64] = &[
    1.0, 3.0, 6.0, 10.0, 15.0, 20.0, 25.0, 30.0, 35.0, 40.0, 45.0, 50.0, 60.0, 70.0, 80.0, 90.0, 100.0, 110.0, 125.0,
    150.0, 175.0, 200.0, 225.0, 250.0, 300.0, 350.0, 400.0, 450.0, 500.0, 600.0, 700.0, 800.0, 1000.0, 1200.0,
    1600.0, 2000.0, 2500.0, 3000.0, 4000.0, 5000.0, 6000.0,
];

/// Standard single-phase transformer ratings, kVA.
pub const SINGLE_PHASE_KVA: &[f64] = &[
    1.0, 1.5, 2.0, 3.0, 5.0, 7.5, 10.0, 15.0, 25.0, 37.5, 50.0, 75.0, 100.0, 167.0, 250.0, 333.0, 500.0,
];

/// Standard three-phase transformer ratings, kVA.
pub const THREE_PHASE_KVA: &[f64] = &[
    3.0, 6.0, 9.0, 15.0, 30.0, 45.0, 75.0, 112.5, 150.0, 225.0, 300.0, 500.0, 750.0, 1000.0, 1500.0, 2000.0, 2500.0,
];

/// Standard residential service ratings, amperes.
pub const SERVICE_RATINGS: &[f64] = &[100.0, 125.0, 150.0, 200.0, 225.0, 300.0, 400.0];

/// First entry of an ascending list that is at or above `value`.
///
/// Returns `None` when `value` exceeds the largest entry.
pub fn next_standard_size(sizes: &[f64], value: f64) -> Option<f64> {
    sizes.iter().copied().find(|&size| size >= value)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lists_ascending() {
        for list in [STANDARD_OCPD_RATINGS, SINGLE_PHASE_KVA, THREE_PHASE_KVA, SERVICE_RATINGS] {
            assert!(list.windows(2).all(|w| w[0] < w[1]));
        }
    }

    #[test]
    fn test_next_standard_size() {
        assert_eq!(next_standard_size(STANDARD_OCPD_RATINGS, 47.3), Some(50.0));
        assert_eq!(next_standard_size(STANDARD_OCPD_RATINGS, 50.0), Some(50.0));
        assert_eq!(next_standard_size(STANDARD_OCPD_RATINGS, 0.0), Some(1.0));
        assert_eq!(next_standard_size(STANDARD_OCPD_RATINGS, 6001.0), None);
        assert_eq!(next_standard_size(THREE_PHASE_KVA, 100.0), Some(112.5));
    }
}
