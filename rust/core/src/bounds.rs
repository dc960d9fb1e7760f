// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Model bounds calculation for large coordinate handling
//!
//! City models are usually stored in projected CRS coordinates (hundreds of
//! kilometres from the origin). The bounding box is computed in f64 so the
//! display frame can be centred before anything is cast to f32.

use crate::document::Coordinate;

/// Model bounds in f64 precision
#[derive(Debug, Clone)]
pub struct ModelBounds {
    pub min_x: f64,
    pub min_y: f64,
    pub min_z: f64,
    pub max_x: f64,
    pub max_y: f64,
    pub max_z: f64,
    /// Number of points sampled
    pub sample_count: usize,
}

impl ModelBounds {
    /// Create new bounds initialized to invalid state
    pub fn new() -> Self {
        Self {
            min_x: f64::MAX,
            min_y: f64::MAX,
            min_z: f64::MAX,
            max_x: f64::MIN,
            max_y: f64::MIN,
            max_z: f64::MIN,
            sample_count: 0,
        }
    }

    /// Bounds of a whole coordinate table. Non-finite vertices are skipped.
    pub fn from_vertices(vertices: &[Coordinate]) -> Self {
        let mut bounds = Self::new();
        for v in vertices {
            if v.iter().all(|c| c.is_finite()) {
                bounds.expand(v[0], v[1], v[2]);
            }
        }
        bounds
    }

    /// Check if bounds are valid (at least one point added)
    #[inline]
    pub fn is_valid(&self) -> bool {
        self.sample_count > 0
    }

    /// Expand bounds to include a point
    #[inline]
    pub fn expand(&mut self, x: f64, y: f64, z: f64) {
        self.min_x = self.min_x.min(x);
        self.min_y = self.min_y.min(y);
        self.min_z = self.min_z.min(z);
        self.max_x = self.max_x.max(x);
        self.max_y = self.max_y.max(y);
        self.max_z = self.max_z.max(z);
        self.sample_count += 1;
    }

    /// Get centroid (center of bounding box)
    #[inline]
    pub fn centroid(&self) -> (f64, f64, f64) {
        if !self.is_valid() {
            return (0.0, 0.0, 0.0);
        }
        (
            (self.min_x + self.max_x) / 2.0,
            (self.min_y + self.max_y) / 2.0,
            (self.min_z + self.max_z) / 2.0,
        )
    }
}

impl Default for ModelBounds {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_bounds() {
        let bounds = ModelBounds::from_vertices(&[]);
        assert!(!bounds.is_valid());
        assert_eq!(bounds.centroid(), (0.0, 0.0, 0.0));
    }

    #[test]
    fn test_centroid() {
        let bounds = ModelBounds::from_vertices(&[
            [84000.0, 446000.0, 0.0],
            [84100.0, 446200.0, 30.0],
            [f64::NAN, 0.0, 0.0],
        ]);
        assert_eq!(bounds.sample_count, 2);
        assert_eq!(bounds.centroid(), (84050.0, 446100.0, 15.0));
        assert_eq!(bounds.max_y, 446200.0);
    }
}
