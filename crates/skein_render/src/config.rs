//! Pipeline configuration, loaded once at startup.

use serde::Deserialize;

use crate::error::{RenderError, RenderResult};

/// Configuration for renderables and the render pipe.
///
/// Every field has a default, so a config file only lists overrides:
///
/// ```toml
/// round_pixels = true
/// max_textures_per_batch = 8
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct RenderConfig {
    /// Default round-pixel flag for new renderables.
    pub round_pixels: bool,
    /// Whether new renderables advance their pose from the frame clock.
    pub auto_update: bool,
    /// Batch entries constructed up front per pool.
    pub pool_prewarm: usize,
    /// Texture slots available to one draw batch.
    pub max_textures_per_batch: u16,
    /// Vertices reserved by a fresh buffer batcher.
    pub initial_vertex_capacity: usize,
}

impl Default for RenderConfig {
    fn default() -> Self {
        Self {
            round_pixels: false,
            auto_update: true,
            pool_prewarm: 32,
            max_textures_per_batch: 16,
            initial_vertex_capacity: 4096,
        }
    }
}

impl RenderConfig {
    /// Parses a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`RenderError::InvalidConfig`] if the document does not parse
    /// or asks for zero texture slots.
    pub fn from_toml_str(source: &str) -> RenderResult<Self> {
        let config: Self =
            toml::from_str(source).map_err(|e| RenderError::InvalidConfig(e.to_string()))?;
        if config.max_textures_per_batch == 0 {
            return Err(RenderError::InvalidConfig(
                "max_textures_per_batch must be at least 1".to_owned(),
            ));
        }
        Ok(config)
    }
}
