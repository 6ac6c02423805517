//! Panel parameters, loaded from `config/panel_params.yaml`

use crate::common::DEFAULT_TIMEOUT_SECS;
use crate::control::DEFAULT_CONTROLLER_NAMESPACE;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PanelConfig {
    /// Directory file dialogs open in until one is used
    pub start_directory: PathBuf,

    /// Dispatch timeout of a new, unsaved trajectory
    pub default_timeout: f64,

    /// Namespace of the joint trajectory controller
    pub controller_namespace: String,

    pub simulation: SimulationConfig,

    pub dispatcher: DispatcherConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SimulationConfig {
    /// Playback time multiplier of the simulated controller
    pub time_scale: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatcherConfig {
    pub worker_threads: usize,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            start_directory: PathBuf::from("/home"),
            default_timeout: DEFAULT_TIMEOUT_SECS,
            controller_namespace: DEFAULT_CONTROLLER_NAMESPACE.to_string(),
            simulation: SimulationConfig::default(),
            dispatcher: DispatcherConfig::default(),
        }
    }
}

impl Default for SimulationConfig {
    fn default() -> Self {
        SimulationConfig { time_scale: 1.0 }
    }
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        DispatcherConfig { worker_threads: 1 }
    }
}

impl PanelConfig {
    /// Load configuration from a YAML file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config from {}", path.display()))?;
        let config: Self = serde_yaml::from_str(&content)
            .with_context(|| format!("Failed to parse config from {}", path.display()))?;
        Ok(config)
    }

    /// Load `path` if it exists, otherwise fall back to defaults
    pub fn load_or_default(path: &Path) -> Result<Self> {
        if path.exists() {
            Self::load(path)
        } else {
            Ok(Self::default())
        }
    }

    /// Full name of the trajectory action
    pub fn action_name(&self) -> String {
        crate::control::action_name(&self.controller_namespace)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_file_keeps_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("panel_params.yaml");
        std::fs::write(&path, "default_timeout: 12.5\nsimulation:\n  time_scale: 0.5\n").unwrap();

        let config = PanelConfig::load(&path).unwrap();

        assert_eq!(config.default_timeout, 12.5);
        assert_eq!(config.simulation.time_scale, 0.5);
        assert_eq!(config.start_directory, PathBuf::from("/home"));
        assert_eq!(
            config.action_name(),
            "/scaled_pos_joint_traj_controller/follow_joint_trajectory"
        );
    }

    #[test]
    fn test_missing_file_uses_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let config = PanelConfig::load_or_default(&dir.path().join("absent.yaml")).unwrap();
        assert_eq!(config, PanelConfig::default());
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bad.yaml");
        std::fs::write(&path, "default_timeout: [not, a, number]\n").unwrap();

        let err = PanelConfig::load(&path).unwrap_err();
        assert!(err.to_string().contains("Failed to parse config"));
    }
}
