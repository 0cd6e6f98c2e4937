//! Viewer configuration
//!
//! Every section has working defaults; a JSON document only needs to name the
//! fields it overrides.

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::time::Duration;

use serde::Deserialize;

use crate::catalog::{logical_name, ModelId, Vehicle};
use crate::error::{Result, ViewerError};

/// Top-level viewer configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ViewerConfig {
    /// Base URL that relative model identifiers are joined onto
    pub origin_base_url: String,
    /// Logical name -> versioned identifier
    pub models: BTreeMap<String, String>,
    pub cache: CacheConfig,
    pub facts: FactsConfig,
    pub scene: SceneConfig,
    pub timing: TimingConfig,
}

impl Default for ViewerConfig {
    fn default() -> Self {
        let models = [
            (Vehicle::Perseverance, "static/models/perseverance-dev.glb.gz"),
            (Vehicle::Ingenuity, "static/models/ingenuity-dev.glb.gz"),
        ]
        .into_iter()
        .map(|(v, path)| (v.logical_name().to_string(), path.to_string()))
        .collect();

        Self {
            origin_base_url: "http://localhost:8080".to_string(),
            models,
            cache: CacheConfig::default(),
            facts: FactsConfig::default(),
            scene: SceneConfig::default(),
            timing: TimingConfig::default(),
        }
    }
}

impl ViewerConfig {
    /// Parse and validate a JSON configuration document
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timing.frame_rate == 0 {
            return Err(ViewerError::Config("frame_rate must be positive".into()));
        }
        if self.timing.duration_tick_ms == 0 {
            return Err(ViewerError::Config(
                "duration_tick_ms must be positive".into(),
            ));
        }
        if self.timing.duration_units == 0 {
            return Err(ViewerError::Config(
                "duration_units must be positive".into(),
            ));
        }
        for (name, identifier) in &self.models {
            if logical_name(identifier) != name {
                return Err(ViewerError::Config(format!(
                    "model {identifier:?} is listed under {name:?}"
                )));
            }
        }
        Ok(())
    }

    /// Identifier the manifest lists for a vehicle
    pub fn model_id(&self, vehicle: Vehicle) -> Result<ModelId> {
        let identifier = self.models.get(vehicle.logical_name()).ok_or_else(|| {
            ViewerError::UnsupportedModel(format!(
                "no model listed for {}",
                vehicle.logical_name()
            ))
        })?;
        ModelId::new(identifier.as_str())
    }
}

/// Origin cache settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    pub name: String,
    /// Directory for the on-disk origin cache; in-memory when unset
    pub dir: Option<PathBuf>,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            name: "models_cache".to_string(),
            dir: None,
        }
    }
}

/// Fact provider settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FactsConfig {
    pub encyclopedia_url: String,
    /// Reserved key of the fact-sheet snapshot map
    pub store_key: String,
    /// Directory for the on-disk key/value store; in-memory when unset
    pub store_dir: Option<PathBuf>,
}

impl Default for FactsConfig {
    fn default() -> Self {
        Self {
            encyclopedia_url: "https://en.wikipedia.org".to_string(),
            store_key: "wikis".to_string(),
            store_dir: None,
        }
    }
}

/// Camera, lighting and backdrop settings
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SceneConfig {
    /// Background, fog and environment color (0xRRGGBB)
    pub clear_color: u32,
    pub fov_degrees: f32,
    pub near: f32,
    pub far: f32,
    pub camera_position: [f32; 3],
    pub max_orbit_distance: f32,
    pub fog_near: f32,
    pub fog_far: f32,
    pub ambient_intensity: f32,
    pub grid_size: f32,
    pub grid_divisions: u32,
    /// Height of the floor grid and the model group
    pub floor_y: f32,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            clear_color: 0xd9c7b2,
            fov_degrees: 45.0,
            near: 0.1,
            far: 1000.0,
            camera_position: [0.0, 4.0, -5.0],
            max_orbit_distance: 50.0,
            fog_near: 0.1,
            fog_far: 60.0,
            ambient_intensity: 2.0,
            grid_size: 100.0,
            grid_divisions: 100,
            floor_y: -0.5,
        }
    }
}

/// Frame and duration-ticker timing
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct TimingConfig {
    pub frame_rate: u32,
    pub duration_tick_ms: u64,
    /// Number of magnitude units in the mission duration text
    pub duration_units: usize,
}

impl Default for TimingConfig {
    fn default() -> Self {
        Self {
            frame_rate: 60,
            duration_tick_ms: 1000,
            duration_units: 3,
        }
    }
}

impl TimingConfig {
    pub fn frame_period(&self) -> Duration {
        Duration::from_secs_f64(1.0 / self.frame_rate.max(1) as f64)
    }

    pub fn duration_tick(&self) -> Duration {
        Duration::from_millis(self.duration_tick_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        let config = ViewerConfig::default();
        config.validate().unwrap();
        assert_eq!(config.cache.name, "models_cache");
        assert_eq!(config.facts.store_key, "wikis");
        assert_eq!(config.scene.clear_color, 0xd9c7b2);
        assert_eq!(config.timing.duration_tick(), Duration::from_secs(1));
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = ViewerConfig::from_json_str(
            r#"{
                "models": { "ingenuity": "static/models/ingenuity-abc.glb.gz" },
                "timing": { "frame_rate": 30 }
            }"#,
        )
        .unwrap();

        assert_eq!(config.timing.frame_rate, 30);
        assert_eq!(config.timing.duration_units, 3);
        assert_eq!(
            config.model_id(Vehicle::Ingenuity).unwrap().as_str(),
            "static/models/ingenuity-abc.glb.gz"
        );
        assert!(config.model_id(Vehicle::Perseverance).is_err());
    }

    #[test]
    fn test_mismatched_manifest_rejected() {
        let result = ViewerConfig::from_json_str(
            r#"{ "models": { "ingenuity": "static/models/perseverance-1.glb.gz" } }"#,
        );
        assert!(matches!(result, Err(ViewerError::Config(_))));
    }

    #[test]
    fn test_zero_frame_rate_rejected() {
        let result = ViewerConfig::from_json_str(r#"{ "timing": { "frame_rate": 0 } }"#);
        assert!(result.is_err());
    }
}
