// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

#![allow(dead_code)]

use cityjson_lite_geometry::{
    GeometryDataSnapshot, GeometryType, MATERIAL_SENTINEL, TEXTURE_SENTINEL,
};
use cityjson_lite_processing::ChunkMessage;

/// Mixed document: every geometry kind, materials, textures, semantics,
/// an object without geometry and one unknown geometry type.
pub const MIXED: &str = r#"{
    "type": "CityJSON",
    "version": "1.1",
    "CityObjects": {
        "b0": {"type": "Building", "geometry": [
            {"type": "MultiSurface", "lod": "2", "boundaries": [[[0, 1, 2, 3]], [[4, 5, 6, 7]]],
             "material": {"irradiation": {"values": [1, null]}}}
        ]},
        "r1": {"type": "Road", "geometry": [
            {"type": "MultiLineString", "lod": "1", "boundaries": [[0, 1, 2], [3, 0]]}
        ]},
        "t2": {"type": "SolitaryVegetationObject", "geometry": [
            {"type": "MultiPoint", "lod": "1", "boundaries": [8, 9]}
        ]},
        "g3": {"type": "CityObjectGroup"},
        "b4": {"type": "Building", "geometry": [
            {"type": "Solid", "lod": "2", "boundaries": [[
                [[0, 3, 2, 1]], [[4, 5, 6, 7]], [[0, 1, 5, 4]]
            ]],
             "semantics": {
                 "surfaces": [{"type": "GroundSurface"}, {"type": "RoofSurface"}, {"type": "WallSurface"}],
                 "values": [[0, 1, 2]]
             },
             "texture": {"summer": {"values": [[
                 [[0, 0, 1, 2, 3]], [[null]], [[0, 3, 2, 1, 0]]
             ]]}}}
        ]},
        "x5": {"type": "GenericCityObject", "geometry": [
            {"type": "CompositeSurface", "lod": "3", "boundaries": [[[0, 1, 5, 4], [8, 9, 10]]]},
            {"type": "TIN", "boundaries": []}
        ]},
        "b6": {"type": "BuildingPart", "geometry": [
            {"type": "MultiSurface", "lod": "2", "boundaries": [[[1, 2, 6, 5]]],
             "material": {"paint": {"value": 4}}}
        ]}
    },
    "vertices": [
        [0, 0, 0], [10, 0, 0], [10, 10, 0], [0, 10, 0],
        [0, 0, 10], [10, 0, 10], [10, 10, 10], [0, 10, 10],
        [2, 0, 2], [4, 0, 2], [3, 0, 4]
    ],
    "appearance": {
        "textures": [{"type": "PNG", "image": "facade.png"}],
        "vertices-texture": [[0, 0], [1, 0], [1, 1], [0, 1]]
    }
}"#;

/// `n` single-quad Buildings.
pub fn buildings(n: usize) -> String {
    let objects: Vec<String> = (0..n)
        .map(|i| {
            format!(
                r#""b{i}": {{"type": "Building", "geometry": [
                    {{"type": "MultiSurface", "lod": "2", "boundaries": [[[0, 1, 2, 3]]]}}
                ]}}"#
            )
        })
        .collect();
    format!(
        r#"{{"type": "CityJSON", "version": "1.1", "CityObjects": {{{}}},
            "vertices": [[0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0]]}}"#,
        objects.join(",")
    )
}

/// Concatenate the chunks of one kind in emission order, padding themes
/// that only appear in some chunks.
pub fn concat(chunks: &[ChunkMessage], kind: GeometryType) -> (Vec<f32>, GeometryDataSnapshot) {
    let mut buffer = Vec::new();
    let mut out = GeometryDataSnapshot {
        geometry_type: kind,
        object_ids: Vec::new(),
        object_type: Vec::new(),
        semantic_surfaces: Vec::new(),
        geometry_ids: Vec::new(),
        boundary_ids: Vec::new(),
        lod_ids: Vec::new(),
        materials: Default::default(),
        textures: Default::default(),
    };

    for chunk in chunks.iter().filter(|c| c.geometry_data.geometry_type == kind) {
        let data = &chunk.geometry_data;
        let offset = out.len();

        buffer.extend_from_slice(&chunk.vertex_buffer);
        out.object_ids.extend_from_slice(&data.object_ids);
        out.object_type.extend_from_slice(&data.object_type);
        out.semantic_surfaces.extend_from_slice(&data.semantic_surfaces);
        out.geometry_ids.extend_from_slice(&data.geometry_ids);
        out.boundary_ids.extend_from_slice(&data.boundary_ids);
        out.lod_ids.extend_from_slice(&data.lod_ids);

        for (theme, values) in &data.materials {
            let column = out.materials.entry(theme.clone()).or_default();
            column.resize(offset, MATERIAL_SENTINEL);
            column.extend_from_slice(values);
        }
        for (theme, values) in &data.textures {
            let column = out.textures.entry(theme.clone()).or_default();
            column.index.resize(offset, TEXTURE_SENTINEL.index);
            column.uvs.resize(offset, TEXTURE_SENTINEL.uv);
            column.index.extend_from_slice(&values.index);
            column.uvs.extend_from_slice(&values.uvs);
        }
    }

    let len = out.len();
    for column in out.materials.values_mut() {
        column.resize(len, MATERIAL_SENTINEL);
    }
    for column in out.textures.values_mut() {
        column.index.resize(len, TEXTURE_SENTINEL.index);
        column.uvs.resize(len, TEXTURE_SENTINEL.uv);
    }

    (buffer, out)
}
