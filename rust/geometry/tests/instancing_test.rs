// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Geometry template instancing against a small document with one triangle
//! template, one point template and instances of both.

use approx::assert_relative_eq;
use cityjson_lite_core::CityJsonDocument;
use cityjson_lite_geometry::{
    CoordinateShift, GeometryType, InstancedTemplate, Instancer, Interner, Point3,
};

const DOC: &str = r#"{
    "type": "CityJSON",
    "version": "1.1",
    "CityObjects": {
        "tree-1": {"type": "SolitaryVegetationObject", "geometry": [
            {"type": "GeometryInstance", "template": 0, "boundaries": [5],
             "transformationMatrix": [0,-1,0,0, 1,0,0,0, 0,0,1,0, 0,0,0,1]}
        ]},
        "lamp-1": {"type": "CityFurniture", "geometry": [
            {"type": "MultiPoint", "boundaries": [0]},
            {"type": "GeometryInstance", "template": 1, "boundaries": [1],
             "transformationMatrix": [2,0,0,0, 0,2,0,0, 0,0,2,0, 0,0,0,1]}
        ]},
        "tree-2": {"type": "SolitaryVegetationObject", "geometry": [
            {"type": "GeometryInstance", "template": 0, "boundaries": [2],
             "transformationMatrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]}
        ]},
        "ghost": {"type": "CityFurniture", "geometry": [
            {"type": "GeometryInstance", "template": 7, "boundaries": [0],
             "transformationMatrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]},
            {"type": "GeometryInstance", "template": 0, "boundaries": [99],
             "transformationMatrix": [1,0,0,0, 0,1,0,0, 0,0,1,0, 0,0,0,1]}
        ]}
    },
    "vertices": [
        [0, 0, 0], [10, 0, 0], [20, 0, 0], [30, 0, 0], [40, 0, 0], [100, 200, 3]
    ],
    "geometry-templates": {
        "templates": [
            {"type": "MultiSurface", "lod": "2", "boundaries": [[[0, 1, 2]], [[0, 2, 3]]]},
            {"type": "MultiPoint", "lod": "1", "boundaries": [4, 5]}
        ],
        "vertices-templates": [
            [0, 0, 0], [1, 0, 0], [1, 1, 0], [0, 1, 0], [0, 0, 5], [1, 0, 5]
        ]
    }
}"#;

fn document() -> CityJsonDocument {
    CityJsonDocument::from_json(DOC).unwrap()
}

#[test]
fn test_anchor_replaces_translation() {
    let doc = document();
    let mut interner = Interner::with_default_palette();
    let sets = Instancer::new().collect_instances(&doc, &mut interner).unwrap();

    let trees = &sets[&0];
    assert_eq!(trees.len(), 2);
    assert_eq!(trees.object_ids, vec![0, 2]);
    assert_eq!(trees.geometry_ids, vec![0, 0]);

    let m = trees.matrices[0];
    assert_eq!(m[(0, 3)], 100.0);
    assert_eq!(m[(1, 3)], 200.0);
    assert_eq!(m[(2, 3)], 3.0);

    // The out-of-range template and the bad anchor are dropped
    assert_eq!(sets.len(), 2);
    assert_eq!(sets[&1].len(), 1);
}

#[test]
fn test_triangle_template_is_shared() {
    let doc = document();
    let mut interner = Interner::with_default_palette();
    let output = Instancer::new().run(&doc, &mut interner).unwrap();

    let shared: Vec<_> = output
        .iter()
        .filter_map(|t| match t {
            InstancedTemplate::Shared(s) => Some(s),
            _ => None,
        })
        .collect();
    assert_eq!(shared.len(), 1);

    let tree = shared[0];
    assert_eq!(tree.template, 0);
    assert_eq!(tree.geometry_data.geometry_type, GeometryType::Triangles);
    assert_eq!(tree.geometry_data.len(), 6);
    assert_eq!(tree.vertex_buffer.len(), 18);
    // Template rows carry no object identity
    assert!(tree.geometry_data.object_ids.iter().all(|&v| v == -1));

    let vegetation = interner.object_colors().get_index_of("SolitaryVegetationObject").unwrap() as i32;
    assert_eq!(tree.instances.object_types, vec![vegetation, vegetation]);
}

#[test]
fn test_point_template_is_materialized() {
    let doc = document();
    let mut interner = Interner::with_default_palette();
    let output = Instancer::new().run(&doc, &mut interner).unwrap();

    let instances = output
        .iter()
        .find_map(|t| match t {
            InstancedTemplate::Materialized { instances } => Some(instances),
            _ => None,
        })
        .unwrap();
    assert_eq!(instances.len(), 1);

    let lamp = &instances[0];
    assert_eq!(lamp.template, 1);
    assert_eq!(lamp.geometry_data.object_ids, vec![1, 1]);
    assert_eq!(lamp.geometry_data.geometry_ids, vec![1, 1]);
    let furniture = interner.object_colors().get_index_of("CityFurniture").unwrap() as i32;
    assert_eq!(lamp.geometry_data.object_type, vec![furniture, furniture]);

    // Scale 2 about the anchor (10, 0, 0)
    assert_eq!(lamp.vertex_buffer, vec![10.0, 0.0, 10.0, 12.0, 0.0, 10.0]);
}

#[test]
fn test_shifted_instances() {
    let doc = document();
    let mut interner = Interner::new();
    let shift = CoordinateShift::new(100.0, 200.0, 0.0);
    let sets = Instancer::with_shift(shift).collect_instances(&doc, &mut interner).unwrap();

    let m = sets[&0].matrices[0];
    let origin = m.transform_point(&Point3::origin());
    assert_relative_eq!(origin.x, 0.0);
    assert_relative_eq!(origin.y, 0.0);
    assert_relative_eq!(origin.z, 3.0);
}

#[test]
fn test_document_without_templates() {
    let doc = CityJsonDocument::from_json(
        r#"{"type":"CityJSON","CityObjects":{"a":{"type":"Building","geometry":[
            {"type":"GeometryInstance","template":0,"boundaries":[0],
             "transformationMatrix":[1,0,0,0,0,1,0,0,0,0,1,0,0,0,0,1]}
        ]}},"vertices":[[0,0,0]]}"#,
    )
    .unwrap();
    let mut interner = Interner::new();
    let output = Instancer::new().run(&doc, &mut interner).unwrap();
    assert!(output.is_empty());
}

#[test]
fn test_compressed_anchor_is_decompressed() {
    let doc = CityJsonDocument::from_json(
        r#"{"type":"CityJSON","version":"1.1",
            "transform":{"scale":[0.001,0.001,0.001],"translate":[85000.0,446000.0,0.0]},
            "CityObjects":{"lamp":{"type":"CityFurniture","geometry":[
                {"type":"GeometryInstance","template":0,"boundaries":[0],
                 "transformationMatrix":[1,0,0,0,0,1,0,0,0,0,1,0,0,0,0,1]}
            ]}},
            "vertices":[[10000,20000,0]],
            "geometry-templates":{
                "templates":[{"type":"MultiPoint","lod":"1","boundaries":[0]}],
                "vertices-templates":[[0.0,0.0,1.0]]
            }}"#,
    )
    .unwrap();
    assert!(doc.transform.is_some());

    let mut interner = Interner::new();
    let sets = Instancer::new().collect_instances(&doc, &mut interner).unwrap();
    let m = sets[&0].matrices[0];
    assert_relative_eq!(m[(0, 3)], 85010.0, epsilon = 1e-6);
    assert_relative_eq!(m[(1, 3)], 446020.0, epsilon = 1e-6);

    let output = Instancer::new().run(&doc, &mut interner).unwrap();
    let InstancedTemplate::Materialized { instances } = &output[0] else {
        panic!("point templates are materialized");
    };
    assert_relative_eq!(instances[0].vertex_buffer[0], 85010.0, epsilon = 1e-2);
    assert_relative_eq!(instances[0].vertex_buffer[1], 446020.0, epsilon = 1e-2);
    assert_relative_eq!(instances[0].vertex_buffer[2], 1.0, epsilon = 1e-4);
}
