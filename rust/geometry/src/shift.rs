// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Display-frame offset for large world coordinates

use cityjson_lite_core::{Coordinate, ModelBounds};
use nalgebra::{Matrix4, Vector3};

/// Coordinate shift for RTC (Relative-to-Center) rendering
///
/// The offset is subtracted from every coordinate in f64 before the cast to
/// f32, so buffers stay precise for models placed in projected CRS space.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct CoordinateShift {
    /// X offset (subtracted from all X coordinates)
    pub x: f64,
    /// Y offset (subtracted from all Y coordinates)
    pub y: f64,
    /// Z offset (subtracted from all Z coordinates)
    pub z: f64,
}

impl CoordinateShift {
    /// Create a new coordinate shift
    #[inline]
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Horizontal centre of the bounds; z stays on the model's datum.
    pub fn from_bounds(bounds: &ModelBounds) -> Self {
        if !bounds.is_valid() {
            return Self::default();
        }
        let (x, y, _) = bounds.centroid();
        Self { x, y, z: 0.0 }
    }

    /// Check if shift is significant (>10km from origin)
    #[inline]
    pub fn is_significant(&self) -> bool {
        const THRESHOLD: f64 = 10000.0; // 10km
        self.x.abs() > THRESHOLD || self.y.abs() > THRESHOLD || self.z.abs() > THRESHOLD
    }

    /// Shift one coordinate and narrow it to f32.
    #[inline]
    pub fn apply(&self, v: &Coordinate) -> [f32; 3] {
        [
            (v[0] - self.x) as f32,
            (v[1] - self.y) as f32,
            (v[2] - self.z) as f32,
        ]
    }

    /// Matrix taking world coordinates into the shifted frame.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        Matrix4::new_translation(&Vector3::new(-self.x, -self.y, -self.z))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use nalgebra::Point3;

    #[test]
    fn test_coordinate_shift_creation() {
        let shift = CoordinateShift::new(500000.0, 5000000.0, 100.0);
        assert!(shift.is_significant());
        assert!(!CoordinateShift::default().is_significant());
    }

    #[test]
    fn test_shift_preserves_precision() {
        // Without shifting: 446000.123 as f32 rounds to a 1/32 m grid
        let v = [84000.123, 446000.123, 12.5];
        let shift = CoordinateShift::new(84000.0, 446000.0, 0.0);
        let p = shift.apply(&v);
        assert!((p[0] - 0.123).abs() < 1e-5);
        assert!((p[1] - 0.123).abs() < 1e-5);
        assert_eq!(p[2], 12.5);
    }

    #[test]
    fn test_from_bounds_keeps_z_datum() {
        let bounds = ModelBounds::from_vertices(&[[100.0, 200.0, 10.0], [300.0, 400.0, 50.0]]);
        let shift = CoordinateShift::from_bounds(&bounds);
        assert_eq!(shift, CoordinateShift::new(200.0, 300.0, 0.0));

        assert_eq!(
            CoordinateShift::from_bounds(&ModelBounds::new()),
            CoordinateShift::default()
        );
    }

    #[test]
    fn test_matrix_matches_apply() {
        let shift = CoordinateShift::new(200.0, 300.0, 0.0);
        let v = [210.0, 290.0, 5.0];
        let local = shift.apply(&v);
        let p = shift.to_matrix().transform_point(&Point3::new(v[0], v[1], v[2]));
        assert_relative_eq!(p.x, local[0] as f64);
        assert_relative_eq!(p.y, local[1] as f64);
        assert_relative_eq!(p.z, local[2] as f64);
    }
}
