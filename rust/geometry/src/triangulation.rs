// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Polygon triangulation utilities
//!
//! Wrapper around earcutr for planar polygons with holes in 3D. A polygon is
//! given as one flattened array of vertex ids (outer ring, then each hole) and
//! the start offsets of the holes within it.

use crate::{Error, Point2, Point3, Result, Vector3};
use cityjson_lite_core::{Coordinate, VertexId};

/// Calculate the normal of a polygon using Newell's method
///
/// Robust for concave and slightly non-planar rings. Returns the zero vector
/// for degenerate input (fewer than 3 points or zero area).
#[inline]
pub fn newell_normal(points: &[Point3<f64>]) -> Vector3<f64> {
    let n = points.len();
    if n < 3 {
        return Vector3::zeros();
    }

    let mut normal = Vector3::<f64>::zeros();

    for i in 0..n {
        let current = &points[i];
        let next = &points[(i + 1) % n];

        normal.x += (current.y - next.y) * (current.z + next.z);
        normal.y += (current.z - next.z) * (current.x + next.x);
        normal.z += (current.x - next.x) * (current.y + next.y);
    }

    normal.try_normalize(1e-12).unwrap_or_else(Vector3::zeros)
}

/// Orthonormal in-plane axes for a unit normal
///
/// The X axis is the seed (1.1, 1.1, 1.1) made orthogonal to the normal
/// (Gram-Schmidt); when the seed is nearly parallel to the normal it is moved
/// by (1, 2, 3) first. Y = normal x X.
pub fn plane_basis(normal: &Vector3<f64>) -> (Vector3<f64>, Vector3<f64>) {
    let mut seed = Vector3::new(1.1, 1.1, 1.1).normalize();
    if (seed - normal).norm() < 0.01 || (seed + normal).norm() < 0.01 {
        seed += Vector3::new(1.0, 2.0, 3.0);
    }

    let x_axis = (seed - normal * seed.dot(normal))
        .try_normalize(1e-12)
        .unwrap_or_else(|| seed.normalize());
    let y_axis = normal.cross(&x_axis);

    (x_axis, y_axis)
}

/// Project 3D points onto the plane of `normal`
#[inline]
pub fn project_to_2d(points_3d: &[Point3<f64>], normal: &Vector3<f64>) -> Vec<Point2<f64>> {
    let (x_axis, y_axis) = plane_basis(normal);
    points_3d
        .iter()
        .map(|p| {
            let v = p.coords;
            Point2::new(v.dot(&x_axis), v.dot(&y_axis))
        })
        .collect()
}

/// Triangulate a flat 2D polygon with holes
/// Returns triangle indices into `points`
#[inline]
pub fn triangulate_polygon(points: &[Point2<f64>], holes: &[usize]) -> Result<Vec<usize>> {
    let n = points.len();

    if n < 3 {
        return Err(Error::TriangulationError(
            "Need at least 3 points to triangulate".to_string(),
        ));
    }

    // FAST PATH: Triangle - no triangulation needed
    if n == 3 && holes.is_empty() {
        return Ok(vec![0, 1, 2]);
    }

    // Flatten points for earcutr
    let mut vertices = Vec::with_capacity(n * 2);
    for p in points {
        vertices.push(p.x);
        vertices.push(p.y);
    }

    let indices = earcutr::earcut(&vertices, holes, 2)
        .map_err(|e| Error::TriangulationError(format!("{:?}", e)))?;

    Ok(indices)
}

/// Triangulate one surface given as a flattened ring array
///
/// Returns triangle corners as positions into `boundary`. Fewer than 3
/// vertices yields no triangles; exactly 3 is emitted as-is. Every vertex id
/// must resolve to a finite coordinate.
pub fn triangulate_ring_set(
    boundary: &[VertexId],
    holes: &[usize],
    vertices: &[Coordinate],
) -> Result<Vec<usize>> {
    if boundary.len() < 3 {
        return Ok(Vec::new());
    }

    let points = boundary
        .iter()
        .map(|&id| {
            let v = vertices
                .get(id as usize)
                .ok_or(Error::VertexOutOfRange {
                    index: id as usize,
                    len: vertices.len(),
                })?;
            if v.iter().any(|c| !c.is_finite()) {
                return Err(Error::TriangulationError(format!(
                    "vertex {} has a non-finite coordinate",
                    id
                )));
            }
            Ok(Point3::new(v[0], v[1], v[2]))
        })
        .collect::<Result<Vec<_>>>()?;

    if points.len() == 3 {
        return Ok(vec![0, 1, 2]);
    }

    let normal = newell_normal(&points);
    let projected = project_to_2d(&points, &normal);

    triangulate_polygon(&projected, holes)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn centroid(vertices: &[Coordinate], boundary: &[VertexId], tri: &[usize]) -> (f64, f64) {
        let mut x = 0.0;
        let mut y = 0.0;
        for &i in tri {
            let v = vertices[boundary[i] as usize];
            x += v[0];
            y += v[1];
        }
        (x / 3.0, y / 3.0)
    }

    #[test]
    fn test_newell_normal_xy_plane() {
        let points = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(1.0, 1.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
        ];
        let normal = newell_normal(&points);
        assert_relative_eq!(normal.z, 1.0, epsilon = 1e-12);
        assert_relative_eq!(normal.x, 0.0, epsilon = 1e-12);
    }

    #[test]
    fn test_newell_normal_degenerate() {
        let collinear = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        assert_eq!(newell_normal(&collinear), Vector3::zeros());
        assert_eq!(newell_normal(&collinear[..2]), Vector3::zeros());
    }

    #[test]
    fn test_plane_basis_is_orthonormal() {
        let seed_aligned = Vector3::new(1.0, 1.0, 1.0).normalize();
        for normal in [
            Vector3::z(),
            Vector3::x(),
            Vector3::new(0.0, 1.0, 1.0).normalize(),
            seed_aligned,
            -seed_aligned,
        ] {
            let (x, y) = plane_basis(&normal);
            assert_relative_eq!(x.norm(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(y.norm(), 1.0, epsilon = 1e-9);
            assert_relative_eq!(x.dot(&normal), 0.0, epsilon = 1e-9);
            assert_relative_eq!(y.dot(&normal), 0.0, epsilon = 1e-9);
            assert_relative_eq!(x.dot(&y), 0.0, epsilon = 1e-9);
        }
    }

    #[test]
    fn test_triangle_passes_through() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]];
        assert_eq!(
            triangulate_ring_set(&[2, 0, 1], &[], &vertices).unwrap(),
            vec![0, 1, 2]
        );
    }

    #[test]
    fn test_short_ring_yields_nothing() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0]];
        assert!(triangulate_ring_set(&[0, 1], &[], &vertices).unwrap().is_empty());
        assert!(triangulate_ring_set(&[], &[], &vertices).unwrap().is_empty());
    }

    #[test]
    fn test_convex_ring_yields_k_minus_2_triangles() {
        // Regular hexagon tilted out of every axis plane
        let k = 6;
        let vertices: Vec<Coordinate> = (0..k)
            .map(|i| {
                let a = i as f64 * std::f64::consts::TAU / k as f64;
                let (x, y) = (a.cos(), a.sin());
                [x, y, 0.5 * x + 0.25 * y]
            })
            .collect();
        let boundary: Vec<VertexId> = (0..k as u32).collect();

        let indices = triangulate_ring_set(&boundary, &[], &vertices).unwrap();
        assert_eq!(indices.len(), (k - 2) * 3);

        let mut used: Vec<VertexId> = indices.iter().map(|&i| boundary[i]).collect();
        used.sort_unstable();
        used.dedup();
        assert_eq!(used, boundary);
    }

    #[test]
    fn test_vertical_wall() {
        let vertices = [
            [0.0, 0.0, 0.0],
            [4.0, 0.0, 0.0],
            [4.0, 0.0, 3.0],
            [0.0, 0.0, 3.0],
        ];
        let indices = triangulate_ring_set(&[0, 1, 2, 3], &[], &vertices).unwrap();
        assert_eq!(indices.len(), 6);
    }

    #[test]
    fn test_square_with_hole() {
        let vertices = [
            [0.0, 0.0, 0.0],
            [10.0, 0.0, 0.0],
            [10.0, 10.0, 0.0],
            [0.0, 10.0, 0.0],
            [3.0, 3.0, 0.0],
            [3.0, 7.0, 0.0],
            [7.0, 7.0, 0.0],
            [7.0, 3.0, 0.0],
        ];
        let boundary: Vec<VertexId> = (0..8).collect();
        let indices = triangulate_ring_set(&boundary, &[4], &vertices).unwrap();

        assert_eq!(indices.len() % 3, 0);
        // 8 vertices, 1 hole: n + 2h - 2 = 8 triangles
        assert_eq!(indices.len(), 24);

        for tri in indices.chunks_exact(3) {
            let (cx, cy) = centroid(&vertices, &boundary, tri);
            let inside_hole = cx > 3.0 && cx < 7.0 && cy > 3.0 && cy < 7.0;
            assert!(!inside_hole, "triangle {:?} lies in the hole", tri);
        }
    }

    #[test]
    fn test_out_of_range_vertex_is_an_error() {
        let vertices = [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]];
        assert!(matches!(
            triangulate_ring_set(&[0, 1, 2, 42], &[], &vertices),
            Err(Error::VertexOutOfRange { index: 42, len: 3 })
        ));
    }
}
