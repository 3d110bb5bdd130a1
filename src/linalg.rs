//! Some shared linear algebra concepts

use nalgebra::Vector3;
use prefix_num_ops::real::*;

/// Position in the detector (m)
pub type Position = Vector3<f64>;

/// Direction in the detector (unit vector, or close to one for external data)
pub type Direction = Vector3<f64>;

/// Convenience const for accessing the X coordinate of a 3-vector
pub const X: usize = 0;

/// Convenience const for accessing the Y coordinate of a 3-vector
pub const Y: usize = 1;

/// Convenience const for accessing the Z coordinate of a 3-vector
pub const Z: usize = 2;

/// Build a 3-vector from a fixed-size array, scaling every coordinate
pub fn scaled(coords: [f64; 3], factor: f64) -> Vector3<f64> {
    Vector3::new(coords[X] * factor, coords[Y] * factor, coords[Z] * factor)
}

/// Unit vector pointing from `from` to `to`
///
/// Returns None when both points coincide, as there is no sensible direction
/// to report then.
///
pub fn unit_direction(from: &Position, to: &Position) -> Option<Direction> {
    let diff = to - from;
    let norm = sqrt(diff.dot(&diff));
    if norm == 0. {
        return None;
    }
    Some(diff / norm)
}

/// Squared distance to the detector axis (in the XY plane)
pub fn planar_r2(pos: &Position) -> f64 {
    pos[X] * pos[X] + pos[Y] * pos[Y]
}
