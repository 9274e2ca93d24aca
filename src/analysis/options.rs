//! Analysis options, loadable from a `classcheck.yaml` file.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

/// Default options file names to search for.
const DEFAULT_OPTIONS_NAMES: &[&str] = &["classcheck.yaml", ".classcheck.yaml"];

/// Tunable knobs for one analysis run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AnalysisOptions {
    /// Maximum fixpoint iterations per loop before the flow engine
    /// declares divergence and abandons the method.
    pub max_loop_iterations: u32,
}

impl Default for AnalysisOptions {
    fn default() -> Self {
        Self {
            max_loop_iterations: 64,
        }
    }
}

impl AnalysisOptions {
    /// Load options from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> anyhow::Result<Self> {
        let text = fs::read_to_string(path.as_ref())?;
        let options = serde_yaml::from_str(&text)?;
        Ok(options)
    }

    /// Look for an options file in `dir`; fall back to defaults.
    pub fn discover<P: AsRef<Path>>(dir: P) -> anyhow::Result<Self> {
        for name in DEFAULT_OPTIONS_NAMES {
            let candidate = dir.as_ref().join(name);
            if candidate.is_file() {
                return Self::load(candidate);
            }
        }
        Ok(Self::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        assert_eq!(AnalysisOptions::default().max_loop_iterations, 64);
    }

    #[test]
    fn test_load_yaml() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("classcheck.yaml");
        std::fs::write(&path, "max_loop_iterations: 8\n").unwrap();

        let options = AnalysisOptions::load(&path).unwrap();
        assert_eq!(options.max_loop_iterations, 8);
    }

    #[test]
    fn test_discover_falls_back_to_defaults() {
        let temp = TempDir::new().unwrap();
        let options = AnalysisOptions::discover(temp.path()).unwrap();
        assert_eq!(options, AnalysisOptions::default());
    }
}
