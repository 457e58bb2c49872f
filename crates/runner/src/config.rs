//! Harness configuration.

use anyhow::{Context, Result};
use kernelbench_problems::ProblemOptions;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// Largest tier evaluated unless the caller raises the cap.
pub const DEFAULT_MAX_ELEMENTS: usize = 10_000_000;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HarnessConfig {
    pub warmup_runs: usize,
    pub runs: usize,
    /// Test cases with more elements than this are skipped. `None` runs every tier.
    pub max_elements: Option<usize>,
    pub problem: ProblemOptions,
}

impl Default for HarnessConfig {
    fn default() -> Self {
        Self {
            warmup_runs: 1,
            runs: 5,
            max_elements: Some(DEFAULT_MAX_ELEMENTS),
            problem: ProblemOptions::default(),
        }
    }
}

impl HarnessConfig {
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let json = fs::read_to_string(path)
            .with_context(|| format!("failed to read harness config {}", path.display()))?;
        let config = serde_json::from_str(&json)
            .with_context(|| format!("invalid harness config {}", path.display()))?;
        Ok(config)
    }

    pub fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let json = serde_json::to_string_pretty(self)?;
        fs::write(path, json)?;
        Ok(())
    }

    pub fn admits(&self, elements: usize) -> bool {
        self.max_elements.map_or(true, |limit| elements <= limit)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kernelbench_kernels::config::Device;

    #[test]
    fn partial_config_falls_back_to_defaults() {
        let config: HarnessConfig =
            serde_json::from_str(r#"{"runs": 2, "problem": {"device": "cpu", "seed": null}}"#)
                .unwrap();
        assert_eq!(config.runs, 2);
        assert_eq!(config.warmup_runs, 1);
        assert_eq!(config.max_elements, Some(DEFAULT_MAX_ELEMENTS));
        assert_eq!(config.problem.device, Device::Cpu);
        assert_eq!(config.problem.seed, None);
        assert_eq!(config.problem.tolerance.atol, 1e-5);
    }

    #[test]
    fn element_cap() {
        let config = HarnessConfig::default();
        assert!(config.admits(DEFAULT_MAX_ELEMENTS));
        assert!(!config.admits(DEFAULT_MAX_ELEMENTS + 1));

        let uncapped = HarnessConfig {
            max_elements: None,
            ..HarnessConfig::default()
        };
        assert!(uncapped.admits(usize::MAX));
    }

    #[test]
    fn missing_file_reports_path() {
        let err = HarnessConfig::load("/nonexistent/kernelbench.json").unwrap_err();
        assert!(format!("{:#}", err).contains("/nonexistent/kernelbench.json"));
    }
}
