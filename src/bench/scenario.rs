//! Scenario files: ordered player inputs with expected substrings.
//!
//! A scenario is a YAML or JSON sequence:
//!
//! ```yaml
//! - input: look
//!   expect_description_contains: [ruins]
//! - input: read the inscription
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{ArcanumError, Result};

/// One scripted player input and the substrings its reply must contain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioStep {
    /// Raw player input
    #[serde(default)]
    pub input: String,
    /// Substrings (case-insensitive) that must all appear in the reply
    #[serde(default)]
    pub expect_description_contains: Vec<String>,
}

impl ScenarioStep {
    /// Create a step.
    pub fn new(input: &str, expected: &[&str]) -> Self {
        Self {
            input: input.to_string(),
            expect_description_contains: expected.iter().map(|s| s.to_string()).collect(),
        }
    }
}

/// A loaded scenario.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Scenario {
    /// File stem, used to name logs
    pub id: String,
    /// Source path (empty for in-memory scenarios)
    pub path: PathBuf,
    /// Steps in play order
    pub steps: Vec<ScenarioStep>,
}

impl Scenario {
    /// Build an in-memory scenario.
    pub fn new(id: &str, steps: Vec<ScenarioStep>) -> Self {
        Self {
            id: id.to_string(),
            path: PathBuf::new(),
            steps,
        }
    }

    /// Load a scenario from a `.yaml`, `.yml` or `.json` file.
    ///
    /// An empty or `null` document is a scenario with no steps.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| {
            ArcanumError::Scenario(format!("failed to read {}: {}", path.display(), e))
        })?;

        let steps: Option<Vec<ScenarioStep>> = match extension(path).as_deref() {
            Some("yaml") | Some("yml") => {
                if content.trim().is_empty() {
                    None
                } else {
                    serde_yaml::from_str(&content)?
                }
            }
            Some("json") => serde_json::from_str(&content)?,
            _ => {
                return Err(ArcanumError::Scenario(format!(
                    "unsupported scenario format: {} (expected .yaml, .yml or .json)",
                    path.display()
                )))
            }
        };

        Ok(Self {
            id: scenario_id(path),
            path: path.to_path_buf(),
            steps: steps.unwrap_or_default(),
        })
    }

    /// Number of steps.
    pub fn len(&self) -> usize {
        self.steps.len()
    }

    /// True if the scenario has no steps.
    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }
}

/// Scenario identifier derived from a path: the file stem.
pub fn scenario_id(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "scenario".to_string())
}

fn extension(path: &Path) -> Option<String> {
    path.extension()
        .map(|e| e.to_string_lossy().to_ascii_lowercase())
}

fn is_yaml(path: &Path) -> bool {
    matches!(extension(path).as_deref(), Some("yaml") | Some("yml"))
}

/// Expand directories to the YAML scenarios they contain (sorted); files pass through.
pub fn resolve_scenario_paths(paths: &[PathBuf]) -> Result<Vec<PathBuf>> {
    let mut resolved = Vec::new();
    for path in paths {
        if path.is_dir() {
            let mut found: Vec<PathBuf> = std::fs::read_dir(path)?
                .filter_map(|entry| entry.ok().map(|e| e.path()))
                .filter(|p| p.is_file() && is_yaml(p))
                .collect();
            found.sort();
            resolved.extend(found);
        } else {
            resolved.push(path.clone());
        }
    }
    Ok(resolved)
}
