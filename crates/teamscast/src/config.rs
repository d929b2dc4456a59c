use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use anyhow::{Context, Result};
use serde::Deserialize;

const DEFAULT_CONFIG_NAME: &str = "teamscast.toml";

#[derive(Debug, Deserialize)]
pub struct Config {
    pub hooks: HashMap<String, Endpoint>,
}

/// Delivery endpoint for a named hook.
#[derive(Debug, Clone, Deserialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum Endpoint {
    Webhook {
        url: String,
    },
    /// File sink used for dry runs and tests: deliveries land as JSON files.
    Mock {
        path: PathBuf,
    },
}

impl Config {
    /// Load configuration from an explicit path, or search upward from current dir.
    pub fn load(path_override: Option<PathBuf>) -> Result<Self> {
        let path = match path_override {
            Some(p) => p,
            None => find_upwards(DEFAULT_CONFIG_NAME)
                .context("Failed to locate teamscast.toml in current or parent directories")?,
        };

        let contents = fs::read_to_string(&path)
            .with_context(|| format!("Reading config file {}", path.display()))?;
        let cfg: Config = toml::from_str(&contents)
            .with_context(|| format!("Parsing TOML config {}", path.display()))?;
        Ok(cfg)
    }

    pub fn hook(&self, name: &str) -> Result<&Endpoint> {
        self.hooks
            .get(name)
            .with_context(|| format!("Hook '{}' not found in config", name))
    }

    /// Hook names in a stable order, for `--all` dispatch.
    pub fn hook_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.hooks.keys().cloned().collect();
        names.sort();
        names
    }
}

fn find_upwards(file_name: &str) -> Option<PathBuf> {
    let mut dir = std::env::current_dir().ok()?;
    loop {
        let candidate = dir.join(file_name);
        if candidate.exists() {
            return Some(candidate);
        }
        if !dir.pop() {
            break;
        }
    }
    None
}
