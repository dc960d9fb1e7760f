// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Append-only lookup tables shared by every parser of a document
//!
//! Object type names, semantic surface type names and LoD labels are mapped to
//! small integer codes in first-seen order. A code, once handed out, stays
//! valid for the rest of the document; there is no removal API.

use crate::geometry_data::TextureValue;
use cityjson_lite_core::{MaterialValues, SemanticSurface, TextureSurface};
use indexmap::{IndexMap, IndexSet};
use rustc_hash::FxHasher;
use serde::Serialize;
use smallvec::SmallVec;
use std::hash::{Hash, Hasher};

/// Standard CityObject type palette. Building comes first so it keeps code 0.
pub const DEFAULT_OBJECT_COLORS: &[(&str, u32)] = &[
    ("Building", 0x7497df),
    ("BuildingPart", 0x7497df),
    ("BuildingInstallation", 0x7497df),
    ("Bridge", 0x999999),
    ("BridgePart", 0x999999),
    ("BridgeInstallation", 0x999999),
    ("BridgeConstructionElement", 0x999999),
    ("CityObjectGroup", 0xffffb3),
    ("CityFurniture", 0xcc0000),
    ("GenericCityObject", 0xcc0000),
    ("LandUse", 0xffffb3),
    ("PlantCover", 0x39ac39),
    ("Railway", 0x000000),
    ("Road", 0x999999),
    ("SolitaryVegetationObject", 0x39ac39),
    ("TINRelief", 0xffdb99),
    ("TransportSquare", 0x999999),
    ("Tunnel", 0x999999),
    ("TunnelPart", 0x999999),
    ("TunnelInstallation", 0x999999),
    ("WaterBody", 0x4da6ff),
];

/// Standard semantic surface palette.
pub const DEFAULT_SURFACE_COLORS: &[(&str, u32)] = &[
    ("GroundSurface", 0x999999),
    ("WallSurface", 0xffffff),
    ("RoofSurface", 0xff0000),
    ("TrafficArea", 0x6e6e6e),
    ("AuxiliaryTrafficArea", 0x2c8200),
    ("Window", 0x0059ff),
    ("Door", 0x640000),
];

/// Owned copy of the tables, attached to every chunk message.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct InternTables {
    pub lods: Vec<String>,
    pub object_colors: IndexMap<String, u32>,
    pub surface_colors: IndexMap<String, u32>,
}

/// Name-to-code tables for one document.
#[derive(Debug, Clone, Default)]
pub struct Interner {
    object_colors: IndexMap<String, u32>,
    surface_colors: IndexMap<String, u32>,
    lods: IndexSet<String>,
}

impl Interner {
    /// Empty tables.
    pub fn new() -> Self {
        Self::default()
    }

    /// Tables seeded with the standard object and surface palettes.
    pub fn with_default_palette() -> Self {
        let mut interner = Self::new();
        interner.seed_object_colors(
            DEFAULT_OBJECT_COLORS
                .iter()
                .map(|&(name, color)| (name.to_string(), color)),
        );
        for &(name, color) in DEFAULT_SURFACE_COLORS {
            interner.surface_colors.insert(name.to_string(), color);
        }
        interner
    }

    /// Code of an object type name, assigning the next code if unseen.
    pub fn intern_object_type(&mut self, name: &str) -> i32 {
        intern_color(&mut self.object_colors, name)
    }

    /// Semantic surface code of surface `ring_index` within a shell.
    ///
    /// Returns -1 when the geometry has no semantics or the surface has no
    /// (valid) entry.
    pub fn intern_surface_type(
        &mut self,
        ring_index: usize,
        semantics: Option<&[Option<usize>]>,
        surfaces: &[SemanticSurface],
    ) -> i32 {
        let Some(values) = semantics else {
            return -1;
        };
        match values
            .get(ring_index)
            .copied()
            .flatten()
            .and_then(|idx| surfaces.get(idx))
        {
            Some(surface) => intern_color(&mut self.surface_colors, &surface.surface_type),
            None => -1,
        }
    }

    /// Code of a LoD label, or -1 if the geometry has none.
    pub fn intern_lod(&mut self, lod: Option<&str>) -> i32 {
        let Some(lod) = lod else {
            return -1;
        };
        match self.lods.get_index_of(lod) {
            Some(idx) => idx as i32,
            None => self.lods.insert_full(lod.to_string()).0 as i32,
        }
    }

    /// Pre-register LoD labels; already known labels keep their code.
    pub fn seed_lods<I, S>(&mut self, lods: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for lod in lods {
            self.lods.insert(lod.into());
        }
    }

    /// Pre-register object types with explicit colours; known types keep
    /// their code and colour.
    pub fn seed_object_colors<I>(&mut self, colors: I)
    where
        I: IntoIterator<Item = (String, u32)>,
    {
        for (name, color) in colors {
            self.object_colors.entry(name).or_insert(color);
        }
    }

    /// Material index of every theme that has a value for surface `ring_index`.
    pub fn extract_theme_values<'a>(
        themes: &[(&'a str, MaterialValues<'_>)],
        ring_index: usize,
    ) -> SmallVec<[(&'a str, i32); 2]> {
        themes
            .iter()
            .filter_map(|&(theme, values)| {
                let value = match values {
                    MaterialValues::Uniform(v) => Some(v),
                    MaterialValues::PerSurface(values) => values.get(ring_index).copied().flatten(),
                };
                value.map(|v| (theme, v as i32))
            })
            .collect()
    }

    /// Texture index and UV of one flattened corner of surface `surface_index`.
    ///
    /// `flat_index` is a position in the surface's flattened ring array and
    /// `holes` the start offsets of the hole rings within it. `rings` maps
    /// each flattened ring to its index in the source surface, since
    /// degenerate holes are left out of the flattening; rings past its end map
    /// to themselves. Themes without a resolvable texture or UV for that
    /// corner are left out.
    pub fn extract_texture_uv<'a>(
        surface_index: usize,
        flat_index: usize,
        holes: &[usize],
        rings: &[usize],
        themes: &[(&'a str, &[Option<TextureSurface>])],
        uv_table: &[[f64; 2]],
    ) -> SmallVec<[(&'a str, TextureValue); 2]> {
        let flat_ring = holes.iter().take_while(|&&h| h <= flat_index).count();
        let ring_start = if flat_ring == 0 { 0 } else { holes[flat_ring - 1] };
        let position = flat_index - ring_start;
        let ring = rings.get(flat_ring).copied().unwrap_or(flat_ring);

        themes
            .iter()
            .filter_map(|&(theme, values)| {
                let entry = values.get(surface_index)?.as_ref()?.get(ring)?;
                let texture = (*entry.first()?)?;
                let uv_index = (*entry.get(1 + position)?)?;
                let uv = uv_table.get(uv_index as usize)?;
                Some((
                    theme,
                    TextureValue {
                        index: texture as i32,
                        uv: [uv[0] as f32, uv[1] as f32],
                    },
                ))
            })
            .collect()
    }

    pub fn object_colors(&self) -> &IndexMap<String, u32> {
        &self.object_colors
    }

    pub fn surface_colors(&self) -> &IndexMap<String, u32> {
        &self.surface_colors
    }

    /// LoD labels in code order.
    pub fn lods(&self) -> impl Iterator<Item = &str> {
        self.lods.iter().map(String::as_str)
    }

    /// Owned copy of all three tables.
    pub fn tables(&self) -> InternTables {
        InternTables {
            lods: self.lods.iter().cloned().collect(),
            object_colors: self.object_colors.clone(),
            surface_colors: self.surface_colors.clone(),
        }
    }
}

fn intern_color(table: &mut IndexMap<String, u32>, name: &str) -> i32 {
    match table.get_index_of(name) {
        Some(idx) => idx as i32,
        None => table.insert_full(name.to_string(), color_for(name)).0 as i32,
    }
}

/// Deterministic 24-bit colour for names outside the palette.
fn color_for(name: &str) -> u32 {
    let mut hasher = FxHasher::default();
    name.hash(&mut hasher);
    (hasher.finish() as u32) & 0x00ff_ffff
}
