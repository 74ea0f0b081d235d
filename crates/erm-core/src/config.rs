//! Project configuration stored in `.erm/config.json`.

use crate::error::LoadError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::debug;

/// Directory holding the configuration, relative to the analysed path.
pub const CONFIG_DIR: &str = ".erm";

const CONFIG_FILE: &str = "config.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ErmConfig {
    pub version: String,
    /// Diagram title.
    pub title: String,
    /// Diagram caption.
    pub description: String,
    /// Directory names skipped when scanning sources.
    pub ignore: Vec<String>,
    /// Default hop bound for path queries.
    pub max_depth: usize,
    /// Entities left out of exported diagrams.
    pub hidden: Vec<String>,
}

impl Default for ErmConfig {
    fn default() -> Self {
        Self {
            version: "1.0".to_string(),
            title: String::new(),
            description: String::new(),
            ignore: vec![
                "target".to_string(),
                "build".to_string(),
                "out".to_string(),
                "node_modules".to_string(),
                ".git".to_string(),
                CONFIG_DIR.to_string(),
            ],
            max_depth: 5,
            hidden: Vec::new(),
        }
    }
}

impl ErmConfig {
    /// Location of the config file for a project root.
    pub fn path_for(root: &Path) -> PathBuf {
        root.join(CONFIG_DIR).join(CONFIG_FILE)
    }

    /// Loads the config for `root`, falling back to defaults when the file
    /// does not exist.
    pub fn load_or_default(root: &Path) -> Result<Self, LoadError> {
        let path = Self::path_for(root);
        if !path.is_file() {
            debug!(path = %path.display(), "no config file, using defaults");
            return Ok(Self::default());
        }

        let source = std::fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
        Ok(serde_json::from_str(&source)?)
    }

    /// Writes the config under `root`, creating the config directory.
    pub fn save(&self, root: &Path) -> Result<PathBuf, LoadError> {
        let dir = root.join(CONFIG_DIR);
        std::fs::create_dir_all(&dir).map_err(|e| LoadError::io(&dir, e))?;

        let path = dir.join(CONFIG_FILE);
        std::fs::write(&path, serde_json::to_string_pretty(self)?)
            .map_err(|e| LoadError::io(&path, e))?;
        Ok(path)
    }

    pub fn is_ignored(&self, dir_name: &str) -> bool {
        self.ignore.iter().any(|i| i == dir_name)
    }
}
