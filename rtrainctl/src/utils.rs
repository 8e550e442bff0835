use std::{fs::File, path::Path};

use anyhow::{Context, Result};
use configs::experiment::ExperimentConfig;

/// Loads an experiment configuration file.
/// Files ending in `.json` are decoded as JSON, everything else as YAML.
pub fn load_experiment(path: &Path) -> Result<ExperimentConfig> {
    let file =
        File::open(path).with_context(|| format!("Failed to open file {}", path.display()))?;
    if path.extension().map_or(false, |ext| ext == "json") {
        serde_json::from_reader(file)
            .with_context(|| format!("Failed to parse file {}", path.display()))
    } else {
        serde_yaml::from_reader(file)
            .with_context(|| format!("Failed to parse file {}", path.display()))
    }
}
