// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! CityJSON geometry objects
//!
//! Boundaries are nested arrays of vertex indices whose depth depends on the
//! geometry type. Once the `type` tag is known the depth is fixed, so every
//! variant carries explicit per-kind types instead of a generic recursive tree:
//!
//! | Type | Boundaries | Semantic / material values |
//! |------|------------|----------------------------|
//! | MultiPoint | `[VertexId]` | one per point |
//! | MultiLineString | `[LineString]` | one per line string |
//! | MultiSurface, CompositeSurface | `Shell` | one per surface |
//! | Solid | `[Shell]` | one list per shell |
//! | MultiSolid, CompositeSolid | `[[Shell]]` | one list per shell per solid |

use indexmap::IndexMap;
use serde::{Deserialize, Deserializer};
use smallvec::SmallVec;

/// Index into a document-owned coordinate table.
pub type VertexId = u32;

/// One closed loop of a polygon (outer boundary or hole).
pub type Ring = Vec<VertexId>;

/// A polygon: the outer ring followed by zero or more hole rings.
pub type Surface = Vec<Ring>;

/// A set of surfaces (one shell of a solid, or the body of a MultiSurface).
pub type Shell = Vec<Surface>;

/// Open polyline of a MultiLineString.
pub type LineString = Vec<VertexId>;

/// Texture entry of one ring: `[textureIndex, uv0, uv1, ...]`, or `[null]`.
pub type TextureRing = Vec<Option<u32>>;

/// Texture entries for every ring of one surface.
pub type TextureSurface = Vec<TextureRing>;

/// Values attached to each surface of one shell (`null` = unassigned).
pub type ShellValues<T> = Vec<Option<T>>;

/// Per-shell values of a Solid. A whole shell may be `null`.
pub type SolidValues<T> = Vec<Option<ShellValues<T>>>;

/// Per-solid values of a MultiSolid / CompositeSolid.
pub type MultiSolidValues<T> = Vec<Option<SolidValues<T>>>;

/// A semantic surface classification (e.g. `RoofSurface`).
#[derive(Debug, Clone, Deserialize)]
pub struct SemanticSurface {
    #[serde(rename = "type")]
    pub surface_type: String,
}

/// Semantic classification of a geometry.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "V: Deserialize<'de> + Default"))]
pub struct Semantics<V> {
    #[serde(default)]
    pub surfaces: Vec<SemanticSurface>,
    #[serde(default)]
    pub values: V,
}

/// One material theme: either a uniform `value` or per-surface `values`.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "V: Deserialize<'de>"))]
pub struct MaterialTheme<V> {
    #[serde(default)]
    pub value: Option<u32>,
    #[serde(default)]
    pub values: Option<V>,
}

/// One texture theme.
#[derive(Debug, Clone, Deserialize)]
#[serde(bound(deserialize = "V: Deserialize<'de> + Default"))]
pub struct TextureTheme<V> {
    #[serde(default)]
    pub values: V,
}

/// Material values of one theme, resolved for a single shell.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MaterialValues<'a> {
    /// Every surface uses the same material.
    Uniform(u32),
    /// One entry per surface of the shell.
    PerSurface(&'a [Option<u32>]),
}

/// Semantic, material and texture values of a single shell.
///
/// Borrowed from the owning geometry so parsers never copy the nested arrays.
#[derive(Debug, Clone, Default)]
pub struct ShellAppearance<'a> {
    pub semantics: Option<&'a [Option<usize>]>,
    pub surfaces: &'a [SemanticSurface],
    pub materials: SmallVec<[(&'a str, MaterialValues<'a>); 2]>,
    pub textures: SmallVec<[(&'a str, &'a [Option<TextureSurface>]); 2]>,
}

/// MultiPoint geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiPointGeometry {
    #[serde(default, deserialize_with = "deserialize_lod")]
    pub lod: Option<String>,
    #[serde(default)]
    pub boundaries: Vec<VertexId>,
    #[serde(default)]
    pub semantics: Option<Semantics<ShellValues<usize>>>,
}

/// MultiLineString geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiLineStringGeometry {
    #[serde(default, deserialize_with = "deserialize_lod")]
    pub lod: Option<String>,
    #[serde(default)]
    pub boundaries: Vec<LineString>,
    #[serde(default)]
    pub semantics: Option<Semantics<ShellValues<usize>>>,
}

/// MultiSurface / CompositeSurface geometry: the boundaries are one shell.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiSurfaceGeometry {
    #[serde(default, deserialize_with = "deserialize_lod")]
    pub lod: Option<String>,
    #[serde(default)]
    pub boundaries: Shell,
    #[serde(default)]
    pub semantics: Option<Semantics<ShellValues<usize>>>,
    #[serde(default)]
    pub material: IndexMap<String, MaterialTheme<ShellValues<u32>>>,
    #[serde(default)]
    pub texture: IndexMap<String, TextureTheme<ShellValues<TextureSurface>>>,
}

/// Solid geometry: exterior shell followed by interior shells.
#[derive(Debug, Clone, Deserialize)]
pub struct SolidGeometry {
    #[serde(default, deserialize_with = "deserialize_lod")]
    pub lod: Option<String>,
    #[serde(default)]
    pub boundaries: Vec<Shell>,
    #[serde(default)]
    pub semantics: Option<Semantics<SolidValues<usize>>>,
    #[serde(default)]
    pub material: IndexMap<String, MaterialTheme<SolidValues<u32>>>,
    #[serde(default)]
    pub texture: IndexMap<String, TextureTheme<SolidValues<TextureSurface>>>,
}

/// MultiSolid / CompositeSolid geometry.
#[derive(Debug, Clone, Deserialize)]
pub struct MultiSolidGeometry {
    #[serde(default, deserialize_with = "deserialize_lod")]
    pub lod: Option<String>,
    #[serde(default)]
    pub boundaries: Vec<Vec<Shell>>,
    #[serde(default)]
    pub semantics: Option<Semantics<MultiSolidValues<usize>>>,
    #[serde(default)]
    pub material: IndexMap<String, MaterialTheme<MultiSolidValues<u32>>>,
    #[serde(default)]
    pub texture: IndexMap<String, TextureTheme<MultiSolidValues<TextureSurface>>>,
}

/// Reference to a geometry template, placed at an anchor vertex.
#[derive(Debug, Clone, Deserialize)]
pub struct GeometryInstance {
    /// Index into `geometry-templates.templates`.
    pub template: usize,
    /// Single anchor vertex id (index into the document vertices).
    #[serde(default)]
    pub boundaries: Vec<VertexId>,
    /// Row-major 4x4 matrix; its translation part is replaced by the anchor.
    #[serde(rename = "transformationMatrix")]
    pub transformation_matrix: [f64; 16],
}

impl GeometryInstance {
    /// Anchor vertex id, if present.
    #[inline]
    pub fn anchor(&self) -> Option<VertexId> {
        self.boundaries.first().copied()
    }
}

/// A CityJSON geometry, dispatched on its `type` member.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "type")]
pub enum Geometry {
    MultiPoint(MultiPointGeometry),
    MultiLineString(MultiLineStringGeometry),
    MultiSurface(MultiSurfaceGeometry),
    CompositeSurface(MultiSurfaceGeometry),
    Solid(SolidGeometry),
    MultiSolid(MultiSolidGeometry),
    CompositeSolid(MultiSolidGeometry),
    GeometryInstance(GeometryInstance),
    /// Any type tag this crate does not know. Ignored by every consumer.
    #[serde(other)]
    Unknown,
}

impl Geometry {
    /// The CityJSON `type` tag of this geometry.
    pub fn type_name(&self) -> &'static str {
        match self {
            Geometry::MultiPoint(_) => "MultiPoint",
            Geometry::MultiLineString(_) => "MultiLineString",
            Geometry::MultiSurface(_) => "MultiSurface",
            Geometry::CompositeSurface(_) => "CompositeSurface",
            Geometry::Solid(_) => "Solid",
            Geometry::MultiSolid(_) => "MultiSolid",
            Geometry::CompositeSolid(_) => "CompositeSolid",
            Geometry::GeometryInstance(_) => "GeometryInstance",
            Geometry::Unknown => "Unknown",
        }
    }

    /// LoD label, if the geometry carries one.
    pub fn lod(&self) -> Option<&str> {
        match self {
            Geometry::MultiPoint(g) => g.lod.as_deref(),
            Geometry::MultiLineString(g) => g.lod.as_deref(),
            Geometry::MultiSurface(g) | Geometry::CompositeSurface(g) => g.lod.as_deref(),
            Geometry::Solid(g) => g.lod.as_deref(),
            Geometry::MultiSolid(g) | Geometry::CompositeSolid(g) => g.lod.as_deref(),
            Geometry::GeometryInstance(_) | Geometry::Unknown => None,
        }
    }

    /// True for the surface-based kinds that are triangulated.
    #[inline]
    pub fn is_surface_based(&self) -> bool {
        matches!(
            self,
            Geometry::MultiSurface(_)
                | Geometry::CompositeSurface(_)
                | Geometry::Solid(_)
                | Geometry::MultiSolid(_)
                | Geometry::CompositeSolid(_)
        )
    }
}

impl MultiSurfaceGeometry {
    /// The single shell with its appearance.
    pub fn shell(&self) -> (&Shell, ShellAppearance<'_>) {
        let (semantics, surfaces) = match &self.semantics {
            Some(s) => (Some(s.values.as_slice()), s.surfaces.as_slice()),
            None => (None, &[][..]),
        };

        let materials = self
            .material
            .iter()
            .filter_map(|(theme, m)| {
                material_values(m.value, m.values.as_deref()).map(|v| (theme.as_str(), v))
            })
            .collect();

        let textures = self
            .texture
            .iter()
            .map(|(theme, t)| (theme.as_str(), t.values.as_slice()))
            .collect();

        (
            &self.boundaries,
            ShellAppearance {
                semantics,
                surfaces,
                materials,
                textures,
            },
        )
    }
}

impl SolidGeometry {
    /// Every shell with its appearance, in boundary order.
    pub fn shells(&self) -> impl Iterator<Item = (&Shell, ShellAppearance<'_>)> + '_ {
        self.boundaries.iter().enumerate().map(move |(i, shell)| {
            let (semantics, surfaces) = match &self.semantics {
                Some(s) => (
                    s.values.get(i).and_then(|v| v.as_deref()),
                    s.surfaces.as_slice(),
                ),
                None => (None, &[][..]),
            };

            let materials = self
                .material
                .iter()
                .filter_map(|(theme, m)| {
                    let values = m
                        .values
                        .as_ref()
                        .and_then(|v| v.get(i))
                        .and_then(|v| v.as_deref());
                    material_values(m.value, values).map(|v| (theme.as_str(), v))
                })
                .collect();

            let textures = self
                .texture
                .iter()
                .filter_map(|(theme, t)| {
                    t.values
                        .get(i)
                        .and_then(|v| v.as_deref())
                        .map(|v| (theme.as_str(), v))
                })
                .collect();

            (
                shell,
                ShellAppearance {
                    semantics,
                    surfaces,
                    materials,
                    textures,
                },
            )
        })
    }
}

impl MultiSolidGeometry {
    /// Every shell of every solid with its appearance, in boundary order.
    pub fn shells(&self) -> impl Iterator<Item = (&Shell, ShellAppearance<'_>)> + '_ {
        self.boundaries.iter().enumerate().flat_map(move |(i, solid)| {
            solid.iter().enumerate().map(move |(j, shell)| {
                let (semantics, surfaces) = match &self.semantics {
                    Some(s) => (
                        nested_shell(&s.values, i, j),
                        s.surfaces.as_slice(),
                    ),
                    None => (None, &[][..]),
                };

                let materials = self
                    .material
                    .iter()
                    .filter_map(|(theme, m)| {
                        let values = m.values.as_ref().and_then(|v| nested_shell(v, i, j));
                        material_values(m.value, values).map(|v| (theme.as_str(), v))
                    })
                    .collect();

                let textures = self
                    .texture
                    .iter()
                    .filter_map(|(theme, t)| {
                        nested_shell(&t.values, i, j).map(|v| (theme.as_str(), v))
                    })
                    .collect();

                (
                    shell,
                    ShellAppearance {
                        semantics,
                        surfaces,
                        materials,
                        textures,
                    },
                )
            })
        })
    }
}

#[inline]
fn nested_shell<T>(values: &MultiSolidValues<T>, solid: usize, shell: usize) -> Option<&[Option<T>]> {
    values
        .get(solid)
        .and_then(|s| s.as_ref())
        .and_then(|s| s.get(shell))
        .and_then(|s| s.as_deref())
}

/// A uniform `value` wins over `values`; a theme with neither is dropped.
#[inline]
fn material_values(value: Option<u32>, values: Option<&[Option<u32>]>) -> Option<MaterialValues<'_>> {
    match (value, values) {
        (Some(v), _) => Some(MaterialValues::Uniform(v)),
        (None, Some(values)) => Some(MaterialValues::PerSurface(values)),
        (None, None) => None,
    }
}

/// Accepts the 1.0 numeric form (`2`, `1.3`) and the 1.1 string form (`"2.2"`).
fn deserialize_lod<'de, D>(deserializer: D) -> std::result::Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::String(s)) => Some(s),
        Some(serde_json::Value::Number(n)) => Some(n.to_string()),
        _ => None,
    })
}
