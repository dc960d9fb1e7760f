// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry template instancing
//!
//! Templates are parsed once against `vertices-templates`. Every
//! `GeometryInstance` then contributes one 4x4 transform (rotation/scale from
//! its `transformationMatrix`, translation from its anchor vertex) to the set
//! of its template.
//!
//! Triangle templates stay shared: one buffer plus N transforms and N identity
//! rows for hardware instancing. Line and point templates are copied once per
//! instance with the transform baked into the buffer.

use crate::error::{Error, Result};
use crate::geometry_data::{GeometryData, GeometryDataSnapshot, GeometryType};
use crate::interner::Interner;
use crate::parsers::{default_parsers, GeometrySource, VertexTables};
use crate::shift::CoordinateShift;
use cityjson_lite_core::{CityJsonDocument, Coordinate, Geometry, GeometryInstance};
use nalgebra::{Matrix4, Point3};
use rayon::prelude::*;
use serde::{Serialize, Serializer};
use std::collections::BTreeMap;

/// Parsed rows of one template for one primitive kind.
#[derive(Debug, Clone)]
pub struct TemplateGeometry {
    pub template: usize,
    pub data: GeometryData,
}

/// Per-instance transforms and identity rows of one template.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InstanceSet {
    /// Serialized column-major, 16 values per instance
    #[serde(serialize_with = "serialize_matrices")]
    pub matrices: Vec<Matrix4<f64>>,
    pub object_ids: Vec<i32>,
    pub object_types: Vec<i32>,
    pub geometry_ids: Vec<i32>,
}

impl InstanceSet {
    pub fn push(&mut self, matrix: Matrix4<f64>, object_id: i32, object_type: i32, geometry_id: i32) {
        self.matrices.push(matrix);
        self.object_ids.push(object_id);
        self.object_types.push(object_type);
        self.geometry_ids.push(geometry_id);
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.matrices.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.matrices.is_empty()
    }
}

fn serialize_matrices<S: Serializer>(
    matrices: &[Matrix4<f64>],
    serializer: S,
) -> std::result::Result<S::Ok, S::Error> {
    serializer.collect_seq(matrices.iter().map(|m| m.as_slice()))
}

/// Triangle template drawn once per instance from a shared buffer.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SharedTemplate {
    pub template: usize,
    /// Template-local positions
    pub vertex_buffer: Vec<f32>,
    pub geometry_data: GeometryDataSnapshot,
    pub instances: InstanceSet,
}

/// One instance of a line or point template with its transform applied.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MaterializedInstance {
    pub template: usize,
    /// Position of the instance within its template's [`InstanceSet`]
    pub instance: usize,
    pub vertex_buffer: Vec<f32>,
    pub geometry_data: GeometryDataSnapshot,
}

/// Instancing output for one template and primitive kind.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum InstancedTemplate {
    Shared(SharedTemplate),
    Materialized { instances: Vec<MaterializedInstance> },
}

/// Resolves geometry templates and their instances for one document.
#[derive(Debug, Clone, Copy, Default)]
pub struct Instancer {
    shift: CoordinateShift,
}

impl Instancer {
    /// Instancer producing world-space translations.
    pub fn new() -> Self {
        Self::default()
    }

    /// Instancer whose translations are expressed in a shifted display frame.
    pub fn with_shift(shift: CoordinateShift) -> Self {
        Self { shift }
    }

    pub fn shift(&self) -> &CoordinateShift {
        &self.shift
    }

    /// Parse every template once, one entry per (template, kind) with rows.
    pub fn parse_templates(
        &self,
        doc: &CityJsonDocument,
        interner: &mut Interner,
    ) -> Vec<TemplateGeometry> {
        let tables = VertexTables::templates(doc);
        let source = GeometrySource::template();
        let mut parsers = default_parsers();
        let mut parsed = Vec::new();

        for (template, geometry) in doc.templates().iter().enumerate() {
            if !parsers.iter().any(|p| p.handles(geometry)) {
                tracing::debug!(
                    template,
                    geometry_type = geometry.type_name(),
                    "template geometry not handled by any parser"
                );
                continue;
            }

            for parser in parsers.iter_mut() {
                parser.parse_geometry(geometry, &source, &tables, interner);
                if parser.count() > 0 {
                    parsed.push(TemplateGeometry {
                        template,
                        data: parser.take(),
                    });
                }
            }
        }

        parsed
    }

    /// Transform of one instance: its matrix with the translation column
    /// replaced by the (shifted) anchor vertex.
    pub fn instance_transform(
        &self,
        instance: &GeometryInstance,
        vertices: &[Coordinate],
    ) -> Result<Matrix4<f64>> {
        let anchor = instance.anchor().ok_or(Error::MissingAnchor)? as usize;
        let v = vertices.get(anchor).ok_or(Error::VertexOutOfRange {
            index: anchor,
            len: vertices.len(),
        })?;

        let mut matrix = Matrix4::from_row_slice(&instance.transformation_matrix);
        matrix[(0, 3)] = v[0] - self.shift.x;
        matrix[(1, 3)] = v[1] - self.shift.y;
        matrix[(2, 3)] = v[2] - self.shift.z;
        Ok(matrix)
    }

    /// Every resolvable instance in the document, grouped by template index.
    ///
    /// Anchors are read in world coordinates, so a pending `transform` is
    /// applied first. Fails only if that transform is unusable.
    pub fn collect_instances(
        &self,
        doc: &CityJsonDocument,
        interner: &mut Interner,
    ) -> Result<BTreeMap<usize, InstanceSet>> {
        let vertices = doc.world_vertices()?;
        let template_count = doc.templates().len();
        let mut sets: BTreeMap<usize, InstanceSet> = BTreeMap::new();

        for (object_index, (id, object)) in doc.city_objects.iter().enumerate() {
            for (geometry_index, geometry) in object.geometry.iter().enumerate() {
                let Geometry::GeometryInstance(instance) = geometry else {
                    continue;
                };

                if instance.template >= template_count {
                    let e = Error::TemplateOutOfRange {
                        template: instance.template,
                        count: template_count,
                    };
                    tracing::warn!(object = %id, error = %e, "dropping geometry instance");
                    continue;
                }

                let matrix = match self.instance_transform(instance, &vertices) {
                    Ok(matrix) => matrix,
                    Err(e) => {
                        tracing::warn!(object = %id, error = %e, "dropping geometry instance");
                        continue;
                    }
                };

                let object_type = interner.intern_object_type(&object.object_type);
                sets.entry(instance.template).or_default().push(
                    matrix,
                    object_index as i32,
                    object_type,
                    geometry_index as i32,
                );
            }
        }

        Ok(sets)
    }

    /// Parse templates, collect instances and build the renderer output.
    pub fn run(
        &self,
        doc: &CityJsonDocument,
        interner: &mut Interner,
    ) -> Result<Vec<InstancedTemplate>> {
        let templates = self.parse_templates(doc, interner);
        let sets = self.collect_instances(doc, interner)?;
        let template_vertices = doc.template_vertices();
        let mut output = Vec::new();

        for (&template, set) in &sets {
            let mut parsed = templates.iter().filter(|t| t.template == template).peekable();
            if parsed.peek().is_none() {
                tracing::warn!(
                    template,
                    instances = set.len(),
                    "template has no geometry, dropping its instances"
                );
                continue;
            }

            for geometry in parsed {
                match geometry.data.geometry_type() {
                    GeometryType::Triangles => {
                        output.push(InstancedTemplate::Shared(SharedTemplate {
                            template,
                            vertex_buffer: geometry.data.get_vertices(template_vertices)?,
                            geometry_data: geometry.data.clone().into_object(),
                            instances: set.clone(),
                        }));
                    }
                    GeometryType::Lines | GeometryType::Points => {
                        let instances = (0..set.len())
                            .into_par_iter()
                            .map(|j| materialize(geometry, set, j, template_vertices))
                            .collect::<Result<Vec<_>>>()?;
                        output.push(InstancedTemplate::Materialized { instances });
                    }
                }
            }
        }

        tracing::info!(
            templates = templates.len(),
            instanced = sets.values().map(InstanceSet::len).sum::<usize>(),
            outputs = output.len(),
            "resolved geometry instances"
        );

        Ok(output)
    }
}

/// Copy a template for one instance and bake its transform into the buffer.
fn materialize(
    geometry: &TemplateGeometry,
    set: &InstanceSet,
    instance: usize,
    vertices: &[Coordinate],
) -> Result<MaterializedInstance> {
    let mut data = geometry.data.clone();
    data.set_object_id(set.object_ids[instance]);
    data.set_object_type(set.object_types[instance]);
    data.set_geometry_idx(set.geometry_ids[instance]);

    let matrix = &set.matrices[instance];
    let mut vertex_buffer = Vec::with_capacity(data.count() * 3);
    for &id in data.vertex_ids() {
        let v = vertices.get(id as usize).ok_or(Error::VertexOutOfRange {
            index: id as usize,
            len: vertices.len(),
        })?;
        let p = matrix.transform_point(&Point3::new(v[0], v[1], v[2]));
        vertex_buffer.extend_from_slice(&[p.x as f32, p.y as f32, p.z as f32]);
    }

    Ok(MaterializedInstance {
        template: geometry.template,
        instance,
        vertex_buffer,
        geometry_data: data.into_object(),
    })
}
