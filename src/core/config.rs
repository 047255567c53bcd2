//! Configuration system for the marker overlay
//!
//! Mirrors the preset-plus-override shape used for map performance tuning:
//! pick an [`OverlayProfile`], resolve it into [`OverlayConfig`], and tweak
//! individual fields as needed. Configs are serde types and can be loaded
//! from JSON.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::{
    core::constants::{HIT_TARGET_SCALE, MARKER_DIAMETER, SELECTED_MARKER_DIAMETER},
    MapError, Result,
};

#[derive(Debug, Clone, PartialEq, Default)]
pub enum OverlayProfile {
    #[default]
    Balanced,
    /// Small caches, fewer parallel photo fetches
    LowMemory,
    /// Many markers on screen: bigger caches, smaller markers
    HighDensity,
    Custom(OverlayConfig),
}

impl OverlayProfile {
    pub fn resolve(&self) -> OverlayConfig {
        match self {
            Self::Balanced => OverlayConfig::default(),
            Self::LowMemory => OverlayConfig {
                cache: CacheConfig {
                    position_capacity: 512,
                    icon_capacity: 64,
                    photo_capacity: 32,
                },
                loader: LoaderConfig {
                    max_concurrent: 2,
                    ..LoaderConfig::default()
                },
                ..OverlayConfig::default()
            },
            Self::HighDensity => OverlayConfig {
                marker: MarkerStyleConfig {
                    diameter: 44,
                    selected_diameter: 60,
                    border_width: 2.5,
                    selected_border_width: 4.0,
                    ..MarkerStyleConfig::default()
                },
                hit_target: HitTargetConfig { scale: 1.2 },
                cache: CacheConfig {
                    position_capacity: 16_384,
                    icon_capacity: 1024,
                    photo_capacity: 512,
                },
                loader: LoaderConfig {
                    max_concurrent: 8,
                    ..LoaderConfig::default()
                },
            },
            Self::Custom(config) => config.clone(),
        }
    }
}

/// Complete overlay configuration
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct OverlayConfig {
    pub marker: MarkerStyleConfig,
    pub hit_target: HitTargetConfig,
    pub cache: CacheConfig,
    pub loader: LoaderConfig,
}

impl OverlayConfig {
    /// Parses a JSON document. Missing fields take their defaults.
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads and parses a JSON config file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }

    pub fn validate(&self) -> Result<()> {
        let marker = &self.marker;
        if marker.diameter < 8 || marker.selected_diameter < 8 {
            return Err(MapError::Config("marker diameters must be at least 8 px".into()));
        }
        if marker.border_width < 0.0 || marker.border_width * 2.0 >= marker.diameter as f32 {
            return Err(MapError::Config(format!(
                "border width {} does not fit a {} px marker",
                marker.border_width, marker.diameter
            )));
        }
        if marker.selected_border_width < 0.0
            || marker.selected_border_width * 2.0 >= marker.selected_diameter as f32
        {
            return Err(MapError::Config(format!(
                "selected border width {} does not fit a {} px marker",
                marker.selected_border_width, marker.selected_diameter
            )));
        }
        if marker.shadow_blur < 0.0 {
            return Err(MapError::Config("shadow blur must not be negative".into()));
        }
        if !(1.0..=3.0).contains(&self.hit_target.scale) {
            return Err(MapError::Config(format!(
                "hit target scale {} outside 1.0..=3.0",
                self.hit_target.scale
            )));
        }
        if self.cache.position_capacity == 0
            || self.cache.icon_capacity == 0
            || self.cache.photo_capacity == 0
        {
            return Err(MapError::Config("cache capacities must be non-zero".into()));
        }
        if self.loader.max_concurrent == 0 {
            return Err(MapError::Config("loader needs at least one concurrent fetch".into()));
        }
        Ok(())
    }
}

/// Look of the circular native markers
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarkerStyleConfig {
    /// Outer diameter of an unselected marker, in pixels
    pub diameter: u32,
    /// Outer diameter of the selected marker
    pub selected_diameter: u32,
    pub border_width: f32,
    pub selected_border_width: f32,
    /// RGBA border color of unselected markers
    pub border_color: [u8; 4],
    /// Selected markers take their category color for the border
    pub tint_selected_border: bool,
    /// Gaussian blur sigma of the drop shadow
    pub shadow_blur: f32,
    pub shadow_offset: (f32, f32),
    pub shadow_alpha: u8,
}

impl Default for MarkerStyleConfig {
    fn default() -> Self {
        Self {
            diameter: MARKER_DIAMETER,
            selected_diameter: SELECTED_MARKER_DIAMETER,
            border_width: 3.0,
            selected_border_width: 5.0,
            border_color: [255, 255, 255, 255],
            tint_selected_border: true,
            shadow_blur: 3.0,
            shadow_offset: (0.0, 2.0),
            shadow_alpha: 96,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HitTargetConfig {
    /// Hit target size relative to the marker icon
    pub scale: f64,
}

impl Default for HitTargetConfig {
    fn default() -> Self {
        Self {
            scale: HIT_TARGET_SCALE,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Projected positions kept per camera signature
    pub position_capacity: usize,
    /// Composed marker icons, keyed by POI and variant
    pub icon_capacity: usize,
    /// Decoded photos held in memory by the HTTP loader
    pub photo_capacity: usize,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            position_capacity: 4096,
            icon_capacity: 256,
            photo_capacity: 128,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LoaderConfig {
    /// Maximum photo downloads in flight
    pub max_concurrent: usize,
    pub timeout_ms: u64,
    pub user_agent: String,
    /// Downloaded photos are also kept here when set
    pub disk_cache_dir: Option<PathBuf>,
}

impl Default for LoaderConfig {
    fn default() -> Self {
        Self {
            max_concurrent: 4,
            timeout_ms: 15_000,
            user_agent: concat!("maplet-overlay/", env!("CARGO_PKG_VERSION")).to_string(),
            disk_cache_dir: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_presets_are_valid() {
        for profile in [
            OverlayProfile::Balanced,
            OverlayProfile::LowMemory,
            OverlayProfile::HighDensity,
        ] {
            assert!(profile.resolve().validate().is_ok(), "{:?}", profile);
        }
    }

    #[test]
    fn test_custom_profile_round_trips() {
        let mut config = OverlayConfig::default();
        config.hit_target.scale = 1.5;
        assert_eq!(OverlayProfile::Custom(config.clone()).resolve(), config);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config =
            OverlayConfig::from_json_str(r#"{ "marker": { "diameter": 48 }, "loader": { "max_concurrent": 2 } }"#)
                .unwrap();

        assert_eq!(config.marker.diameter, 48);
        assert_eq!(config.marker.selected_diameter, SELECTED_MARKER_DIAMETER);
        assert_eq!(config.loader.max_concurrent, 2);
        assert_eq!(config.hit_target.scale, HIT_TARGET_SCALE);
    }

    #[test]
    fn test_invalid_configs_are_rejected() {
        assert!(matches!(
            OverlayConfig::from_json_str(r#"{ "hit_target": { "scale": 0.5 } }"#),
            Err(MapError::Config(_))
        ));
        assert!(matches!(
            OverlayConfig::from_json_str(r#"{ "marker": { "border_width": 40.0 } }"#),
            Err(MapError::Config(_))
        ));
        assert!(matches!(
            OverlayConfig::from_json_str(r#"{ "cache": { "icon_capacity": 0 } }"#),
            Err(MapError::Config(_))
        ));
        assert!(matches!(
            OverlayConfig::from_json_str("not json"),
            Err(MapError::Serialization(_))
        ));
    }
}
