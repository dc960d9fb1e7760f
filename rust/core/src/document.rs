// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityJSON document model
//!
//! Only the members consumed by the geometry pipeline are decoded; everything
//! else (attributes, parent/child links, metadata beyond the extent) is skipped.

use crate::error::{Error, Result};
use crate::geometry::Geometry;
use indexmap::IndexMap;
use nalgebra::Matrix4;
use serde::Deserialize;
use std::borrow::Cow;

/// A 3D coordinate as stored in `vertices`.
pub type Coordinate = [f64; 3];

/// Vertex compression parameters (`transform` member).
#[derive(Debug, Clone, Copy, PartialEq, Deserialize)]
pub struct Transform {
    pub scale: [f64; 3],
    pub translate: [f64; 3],
}

impl Transform {
    /// Reject scales that would collapse or poison the coordinates.
    pub fn validate(&self) -> Result<()> {
        for (axis, s) in self.scale.iter().enumerate() {
            if !s.is_finite() || *s == 0.0 {
                return Err(Error::InvalidTransform(format!(
                    "scale[{}] = {} is not a usable scale factor",
                    axis, s
                )));
            }
        }
        if self.translate.iter().any(|t| !t.is_finite()) {
            return Err(Error::InvalidTransform(
                "translate contains a non-finite value".to_string(),
            ));
        }
        Ok(())
    }

    /// Decompress one vertex.
    #[inline]
    pub fn apply(&self, v: &Coordinate) -> Coordinate {
        [
            v[0] * self.scale[0] + self.translate[0],
            v[1] * self.scale[1] + self.translate[1],
            v[2] * self.scale[2] + self.translate[2],
        ]
    }

    /// The transform as a 4x4 scale-then-translate matrix.
    pub fn to_matrix(&self) -> Matrix4<f64> {
        #[rustfmt::skip]
        let m = Matrix4::new(
            self.scale[0], 0.0, 0.0, self.translate[0],
            0.0, self.scale[1], 0.0, self.translate[1],
            0.0, 0.0, self.scale[2], self.translate[2],
            0.0, 0.0, 0.0, 1.0,
        );
        m
    }
}

/// One CityObject. Only its type and geometries are consumed.
#[derive(Debug, Clone, Deserialize)]
pub struct CityObject {
    #[serde(rename = "type")]
    pub object_type: String,
    #[serde(default)]
    pub geometry: Vec<Geometry>,
}

impl CityObject {
    #[inline]
    pub fn has_geometry(&self) -> bool {
        !self.geometry.is_empty()
    }
}

/// An appearance material (X3D-style).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Material {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub diffuse_color: Option<[f64; 3]>,
    #[serde(default)]
    pub transparency: Option<f64>,
}

/// An appearance texture image reference.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Texture {
    #[serde(rename = "type", default)]
    pub format: String,
    #[serde(default)]
    pub image: String,
}

/// `appearance` member.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct Appearance {
    #[serde(default)]
    pub materials: Vec<Material>,
    #[serde(default)]
    pub textures: Vec<Texture>,
    /// Shared UV table referenced by texture values.
    #[serde(rename = "vertices-texture", default)]
    pub vertices_texture: Vec<[f64; 2]>,
}

/// `geometry-templates` member.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct GeometryTemplates {
    #[serde(default)]
    pub templates: Vec<Geometry>,
    /// Template-local coordinates, never affected by `transform`.
    #[serde(rename = "vertices-templates", default)]
    pub vertices_templates: Vec<Coordinate>,
}

/// `metadata` member (extent only).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub geographical_extent: Option<[f64; 6]>,
}

/// A CityJSON 1.0 / 1.1 document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CityJsonDocument {
    #[serde(rename = "type", default)]
    pub doc_type: String,
    #[serde(default)]
    pub version: Option<String>,
    #[serde(rename = "CityObjects", default)]
    pub city_objects: IndexMap<String, CityObject>,
    #[serde(default)]
    pub vertices: Vec<Coordinate>,
    #[serde(default)]
    pub transform: Option<Transform>,
    #[serde(default)]
    pub appearance: Option<Appearance>,
    #[serde(rename = "geometry-templates", default)]
    pub geometry_templates: Option<GeometryTemplates>,
    #[serde(default)]
    pub metadata: Option<Metadata>,
}

impl CityJsonDocument {
    /// Decode a document from JSON text.
    pub fn from_json(content: &str) -> Result<Self> {
        Ok(serde_json::from_str(content)?)
    }

    /// Decode a document from JSON bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        Ok(serde_json::from_slice(bytes)?)
    }

    /// Decode a document from an already-parsed JSON value.
    pub fn from_value(value: serde_json::Value) -> Result<Self> {
        Ok(serde_json::from_value(value)?)
    }

    /// Decompress `vertices` in place and drop the transform.
    ///
    /// Template vertices are not affected. Calling this twice is a no-op.
    pub fn apply_transform(&mut self) -> Result<()> {
        let Some(transform) = self.transform.take() else {
            return Ok(());
        };

        if let Err(e) = transform.validate() {
            self.transform = Some(transform);
            return Err(e);
        }

        for v in self.vertices.iter_mut() {
            *v = transform.apply(v);
        }

        tracing::debug!(
            vertices = self.vertices.len(),
            scale = ?transform.scale,
            translate = ?transform.translate,
            "applied vertex transform"
        );

        Ok(())
    }

    /// World coordinates of `vertices`, decompressing on the fly when a
    /// transform is still pending. Borrows when there is nothing to apply.
    pub fn world_vertices(&self) -> Result<Cow<'_, [Coordinate]>> {
        match &self.transform {
            None => Ok(Cow::Borrowed(self.vertices.as_slice())),
            Some(transform) => {
                transform.validate()?;
                Ok(Cow::Owned(
                    self.vertices.iter().map(|v| transform.apply(v)).collect(),
                ))
            }
        }
    }

    /// The pending transform as a matrix (identity if none).
    pub fn transform_matrix(&self) -> Matrix4<f64> {
        self.transform
            .as_ref()
            .map(Transform::to_matrix)
            .unwrap_or_else(Matrix4::identity)
    }

    /// Object ids in document order; the position is the object index.
    pub fn object_ids(&self) -> impl Iterator<Item = &str> {
        self.city_objects.keys().map(String::as_str)
    }

    /// Document-order index of an object id.
    #[inline]
    pub fn object_index(&self, id: &str) -> Option<usize> {
        self.city_objects.get_index_of(id)
    }

    /// Coordinates of one vertex.
    #[inline]
    pub fn vertex(&self, id: usize) -> Result<&Coordinate> {
        self.vertices.get(id).ok_or(Error::VertexOutOfRange {
            index: id,
            len: self.vertices.len(),
        })
    }

    /// Template-local coordinate table (empty without templates).
    pub fn template_vertices(&self) -> &[Coordinate] {
        self.geometry_templates
            .as_ref()
            .map(|t| t.vertices_templates.as_slice())
            .unwrap_or(&[])
    }

    /// Template geometries (empty without templates).
    pub fn templates(&self) -> &[Geometry] {
        self.geometry_templates
            .as_ref()
            .map(|t| t.templates.as_slice())
            .unwrap_or(&[])
    }

    /// Shared UV table (empty without textures).
    pub fn texture_vertices(&self) -> &[[f64; 2]] {
        self.appearance
            .as_ref()
            .map(|a| a.vertices_texture.as_slice())
            .unwrap_or(&[])
    }
}

impl std::str::FromStr for CityJsonDocument {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_json(s)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    const DOC: &str = r#"{
        "type": "CityJSON",
        "version": "1.1",
        "transform": {"scale": [0.01, 0.01, 0.01], "translate": [1000.0, 2000.0, 0.0]},
        "CityObjects": {
            "b2": {"type": "Building", "geometry": [
                {"type": "MultiSurface", "lod": "2", "boundaries": [[[0, 1, 2, 3]]]}
            ]},
            "a1": {"type": "Road", "attributes": {"name": "Main"}},
            "c3": {"type": "CityFurniture", "geometry": [
                {"type": "GeometryInstance", "template": 0, "boundaries": [1],
                 "transformationMatrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]}
            ]}
        },
        "vertices": [[0, 0, 0], [100, 0, 0], [100, 100, 0], [0, 100, 0]],
        "geometry-templates": {
            "templates": [{"type": "MultiPoint", "lod": "1", "boundaries": [0]}],
            "vertices-templates": [[0.5, 0.5, 0.5]]
        }
    }"#;

    #[test]
    fn test_decode_preserves_object_order() {
        let doc: CityJsonDocument = DOC.parse().unwrap();
        let ids: Vec<&str> = doc.object_ids().collect();
        assert_eq!(ids, vec!["b2", "a1", "c3"]);
        assert_eq!(doc.object_index("c3"), Some(2));
        assert!(!doc.city_objects["a1"].has_geometry());
        assert_eq!(doc.templates().len(), 1);
        assert_eq!(doc.template_vertices(), &[[0.5, 0.5, 0.5]]);
    }

    #[test]
    fn test_apply_transform() {
        let mut doc = CityJsonDocument::from_json(DOC).unwrap();
        doc.apply_transform().unwrap();
        assert!(doc.transform.is_none());

        let v = doc.vertex(2).unwrap();
        assert_relative_eq!(v[0], 1001.0);
        assert_relative_eq!(v[1], 2001.0);
        assert_relative_eq!(v[2], 0.0);

        // Second call is a no-op
        doc.apply_transform().unwrap();
        assert_relative_eq!(doc.vertex(2).unwrap()[0], 1001.0);

        // Template vertices are untouched
        assert_eq!(doc.template_vertices()[0], [0.5, 0.5, 0.5]);
    }

    #[test]
    fn test_world_vertices() {
        let mut doc = CityJsonDocument::from_json(DOC).unwrap();
        let world = doc.world_vertices().unwrap();
        assert!(matches!(world, Cow::Owned(_)));
        assert_relative_eq!(world[2][0], 1001.0);
        assert_relative_eq!(world[2][1], 2001.0);
        // Stored vertices stay compressed
        assert_eq!(doc.vertices[2], [100.0, 100.0, 0.0]);

        doc.apply_transform().unwrap();
        let world = doc.world_vertices().unwrap();
        assert!(matches!(world, Cow::Borrowed(_)));
        assert_relative_eq!(world[2][0], 1001.0);

        doc.transform = Some(Transform {
            scale: [1.0, f64::NAN, 1.0],
            translate: [0.0; 3],
        });
        assert!(matches!(
            doc.world_vertices(),
            Err(Error::InvalidTransform(_))
        ));
    }

    #[test]
    fn test_transform_matrix_matches_apply() {
        let doc = CityJsonDocument::from_json(DOC).unwrap();
        let m = doc.transform_matrix();
        let p = m.transform_point(&nalgebra::Point3::new(100.0, 100.0, 0.0));
        assert_relative_eq!(p.x, 1001.0);
        assert_relative_eq!(p.y, 2001.0);
    }

    #[test]
    fn test_zero_scale_rejected() {
        let mut doc = CityJsonDocument {
            transform: Some(Transform {
                scale: [0.0, 1.0, 1.0],
                translate: [0.0; 3],
            }),
            vertices: vec![[1.0, 1.0, 1.0]],
            ..Default::default()
        };
        assert!(matches!(
            doc.apply_transform(),
            Err(Error::InvalidTransform(_))
        ));
        // Document is left untouched
        assert!(doc.transform.is_some());
        assert_eq!(doc.vertices[0], [1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_vertex_out_of_range() {
        let doc = CityJsonDocument::from_json(DOC).unwrap();
        assert!(matches!(
            doc.vertex(99),
            Err(Error::VertexOutOfRange { index: 99, len: 4 })
        ));
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            CityJsonDocument::from_json("{not json"),
            Err(Error::Json(_))
        ));
    }
}
