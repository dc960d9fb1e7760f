// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

//! Parser configuration, optionally loaded from environment variables.

use crate::error::{Error, Result};
use cityjson_lite_geometry::Interner;

/// Flush threshold unless configured otherwise.
pub const DEFAULT_CHUNK_SIZE: usize = 2000;

/// Parse pipeline configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct ParserConfig {
    /// Pending CityObjects are flushed once their count exceeds this.
    pub chunk_size: usize,
    /// Seed the interner with the standard object and surface palettes.
    pub use_default_palette: bool,
    /// LoD labels registered before parsing, in code order.
    pub lods: Vec<String>,
    /// Object type colours registered before parsing, in code order.
    pub object_colors: Vec<(String, u32)>,
}

impl ParserConfig {
    /// Load configuration from environment variables.
    pub fn from_env() -> Self {
        Self {
            chunk_size: std::env::var("CITYJSON_CHUNK_SIZE")
                .unwrap_or_else(|_| DEFAULT_CHUNK_SIZE.to_string())
                .parse()
                .unwrap_or(DEFAULT_CHUNK_SIZE),
            use_default_palette: std::env::var("CITYJSON_DEFAULT_PALETTE")
                .unwrap_or_else(|_| "true".into())
                .parse()
                .unwrap_or(true),
            ..Self::default()
        }
    }

    pub fn with_chunk_size(mut self, chunk_size: usize) -> Self {
        self.chunk_size = chunk_size;
        self
    }

    pub fn with_default_palette(mut self, enabled: bool) -> Self {
        self.use_default_palette = enabled;
        self
    }

    pub fn with_lods<I, S>(mut self, lods: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.lods = lods.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_object_colors<I, S>(mut self, colors: I) -> Self
    where
        I: IntoIterator<Item = (S, u32)>,
        S: Into<String>,
    {
        self.object_colors = colors.into_iter().map(|(n, c)| (n.into(), c)).collect();
        self
    }

    pub fn validate(&self) -> Result<()> {
        if self.chunk_size == 0 {
            return Err(Error::InvalidConfig(
                "chunk_size must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Fresh interner with the configured palette and seeds.
    pub fn build_interner(&self) -> Interner {
        let mut interner = if self.use_default_palette {
            Interner::with_default_palette()
        } else {
            Interner::new()
        };
        interner.seed_object_colors(self.object_colors.iter().cloned());
        interner.seed_lods(self.lods.iter().cloned());
        interner
    }
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            use_default_palette: true,
            lods: Vec::new(),
            object_colors: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = ParserConfig::default();
        assert_eq!(config.chunk_size, 2000);
        assert!(config.use_default_palette);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let config = ParserConfig::default().with_chunk_size(0);
        assert!(matches!(config.validate(), Err(Error::InvalidConfig(_))));
    }

    #[test]
    fn test_from_env() {
        std::env::set_var("CITYJSON_CHUNK_SIZE", "50");
        std::env::set_var("CITYJSON_DEFAULT_PALETTE", "not-a-bool");
        let config = ParserConfig::from_env();
        std::env::remove_var("CITYJSON_CHUNK_SIZE");
        std::env::remove_var("CITYJSON_DEFAULT_PALETTE");

        assert_eq!(config.chunk_size, 50);
        // Unparseable values fall back to the default
        assert!(config.use_default_palette);
    }

    #[test]
    fn test_build_interner() {
        let config = ParserConfig::default()
            .with_default_palette(false)
            .with_lods(["2", "1"])
            .with_object_colors([("Road", 0x999999)]);
        let mut interner = config.build_interner();

        assert_eq!(interner.intern_object_type("Road"), 0);
        assert_eq!(interner.intern_lod(Some("1")), 1);
        assert_eq!(interner.object_colors().len(), 1);

        let mut palette = ParserConfig::default().build_interner();
        assert_eq!(palette.intern_object_type("Building"), 0);
    }
}
