//! Recent target list persistence and retrieval.

use super::RecentTarget;
use crate::config::Config;
use crate::exec::ExecTarget;
use anyhow::{Context, Result};
use std::path::PathBuf;

/// Most targets kept in the list
pub const MAX_RECENT: usize = 20;

/// Recent targets, most recent first
pub struct RecentTargets {
    entries: Vec<RecentTarget>,
    /// Path to the recent targets file
    path: PathBuf,
}

impl RecentTargets {
    /// Load recent targets from the config directory
    pub fn load() -> Result<Self> {
        let path = Config::config_dir()?.join("recent.json");
        Self::load_from(path)
    }

    /// Load recent targets from a specific file, or start empty if missing
    pub fn load_from(path: PathBuf) -> Result<Self> {
        let entries: Vec<RecentTarget> = if path.exists() {
            let content =
                std::fs::read_to_string(&path).context("Failed to read recent targets file")?;
            serde_json::from_str(&content).context("Failed to parse recent targets file")?
        } else {
            Vec::new()
        };

        Ok(Self { entries, path })
    }

    /// Create a new empty list that never touches disk (for testing)
    pub fn empty() -> Self {
        Self {
            entries: Vec::new(),
            path: PathBuf::new(),
        }
    }

    /// Save recent targets to disk
    pub fn save(&self) -> Result<()> {
        if self.path.as_os_str().is_empty() {
            return Ok(()); // Skip saving if no path set (empty list)
        }

        // Ensure parent directory exists
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let content = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize recent targets")?;

        std::fs::write(&self.path, content).context("Failed to write recent targets file")?;

        Ok(())
    }

    /// Record an attach, moving the target to the front
    pub fn record(&mut self, target: ExecTarget, backend_url: Option<String>) -> Result<()> {
        self.entries.retain(|entry| entry.target != target);
        self.entries.insert(0, RecentTarget::new(target, backend_url));
        self.entries.truncate(MAX_RECENT);
        self.save()
    }

    /// Most recently attached target
    pub fn latest(&self) -> Option<&RecentTarget> {
        self.entries.first()
    }

    /// All entries, most recent first
    pub fn entries(&self) -> &[RecentTarget] {
        &self.entries
    }

    pub fn count(&self) -> usize {
        self.entries.len()
    }
}
