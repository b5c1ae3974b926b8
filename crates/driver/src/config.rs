use std::path::Path;

use serde::{Deserialize, Serialize};
use tickframe_clock::ClockConfig;
use tickframe_render::{BatchConfig, Projection};

use crate::error::DriverError;

/// Everything needed to start the clock and the renderer. Missing sections
/// and fields take their defaults.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub clock: ClockConfig,
    pub batching: BatchConfig,
    pub projection: Projection,
}

impl EngineConfig {
    pub fn load(path: &Path) -> Result<Self, DriverError> {
        let json = std::fs::read_to_string(path)?;
        let config: Self = serde_json::from_str(&json)?;
        tracing::info!(path = %path.display(), "engine config loaded");
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<(), DriverError> {
        let json = serde_json::to_string_pretty(self)?;
        std::fs::write(path, json)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partial_json_fills_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, r#"{ "clock": { "ticks_per_second": 60 } }"#).unwrap();

        let config = EngineConfig::load(&path).unwrap();
        assert_eq!(config.clock.ticks_per_second, 60);
        assert_eq!(config.clock.frame_window, 100);
        assert_eq!(config.batching, BatchConfig::default());
        assert_eq!(config.projection, Projection::default());
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        let mut config = EngineConfig::default();
        config.batching.max_batches_per_key = 4;
        config.projection.width = 640;
        config.save(&path).unwrap();

        assert_eq!(EngineConfig::load(&path).unwrap(), config);
    }

    #[test]
    fn missing_file_is_io_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = EngineConfig::load(&dir.path().join("absent.json")).unwrap_err();
        assert!(matches!(err, DriverError::Io(_)));
    }

    #[test]
    fn malformed_json_is_json_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("engine.json");
        std::fs::write(&path, "{ clock: ").unwrap();
        assert!(matches!(
            EngineConfig::load(&path).unwrap_err(),
            DriverError::Json(_)
        ));
    }
}
