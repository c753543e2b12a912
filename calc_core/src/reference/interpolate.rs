//! Linear interpolation over coefficient-of-utilization curves.

use super::CuPoint;

/// Interpolate a CU value at `room_cavity_ratio`.
///
/// `points` must be sorted ascending by ratio. Queries at or below the first
/// point return its value, queries at or above the last point return the
/// last value. Between points the bracketing pair with
/// `lower.ratio <= query < upper.ratio` is interpolated linearly. Returns
/// `None` only for an empty curve.
pub fn interpolate_cu(points: &[CuPoint], room_cavity_ratio: f64) -> Option<f64> {
    let first = points.first()?;
    let last = points.last()?;

    if room_cavity_ratio <= first.room_cavity_ratio {
        return Some(first.cu);
    }
    if room_cavity_ratio >= last.room_cavity_ratio {
        return Some(last.cu);
    }

    // index of the first point strictly above the query
    let upper_idx = points.partition_point(|p| p.room_cavity_ratio <= room_cavity_ratio);
    let lower = points[upper_idx - 1];
    let upper = points[upper_idx];

    if upper.room_cavity_ratio == lower.room_cavity_ratio {
        return Some(lower.cu);
    }

    let t = (room_cavity_ratio - lower.room_cavity_ratio) / (upper.room_cavity_ratio - lower.room_cavity_ratio);
    Some(lower.cu + t * (upper.cu - lower.cu))
}
