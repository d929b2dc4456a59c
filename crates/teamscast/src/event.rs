use std::path::Path;

use anyhow::{Context, Result};
use serde::Deserialize;

/// CI event context, deserialized from a GitHub-Actions-style event JSON
/// file. Every field is optional so partial payloads still parse; the card
/// builder degrades gracefully around missing pieces.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CiEvent {
    pub repository: Option<Repository>,
    pub sender: Option<Sender>,
    #[serde(default)]
    pub commits: Vec<Commit>,
    pub head_commit: Option<HeadCommit>,
    /// Link comparing the pushed range.
    pub compare: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Repository {
    pub name: String,
    pub html_url: String,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Sender {
    pub login: String,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Commit {
    pub id: Option<String>,
    pub message: Option<String>,
    pub url: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct HeadCommit {
    pub timestamp: Option<String>,
}

impl CiEvent {
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Reading event file {}", path.display()))?;
        let event: CiEvent = serde_json::from_str(&contents)
            .with_context(|| format!("Parsing event JSON {}", path.display()))?;
        Ok(event)
    }
}
