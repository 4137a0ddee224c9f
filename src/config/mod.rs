//! Configuration for Missionboard.
//!
//! Configuration lives in `board.toml` inside the data directory. Every
//! field is optional; a missing file means full defaults. The data
//! directory itself resolves with the priority:
//! explicit path > `MB_DATA_DIR` env var > platform data dir.

use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

use crate::Result;
use crate::models::agents::{AgentProfile, builtin_roster};

/// Config file name inside the data directory.
pub const CONFIG_FILE: &str = "board.toml";

/// Database file name inside the data directory.
pub const DB_FILE: &str = "board.db";

/// Board-wide configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct BoardConfig {
    /// Address the server binds to
    pub host: String,

    /// Port the server binds to
    pub port: u16,

    /// Name used as comment author and message sender
    pub operator: String,

    /// Prefix for sequential ticket ids (e.g., "TASK")
    pub ticket_prefix: String,

    /// Agent roster; defaults to the built-in squad
    pub agents: Vec<AgentProfile>,
}

impl Default for BoardConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 4400,
            operator: "Bernardo".to_string(),
            ticket_prefix: "TASK".to_string(),
            agents: builtin_roster(),
        }
    }
}

impl BoardConfig {
    /// Load configuration from `board.toml` in the given data directory.
    /// A missing file yields the defaults.
    pub fn load(data_dir: &Path) -> Result<Self> {
        let path = data_dir.join(CONFIG_FILE);
        if !path.exists() {
            return Ok(Self::default());
        }
        let raw = fs::read_to_string(&path)?;
        Ok(toml::from_str(&raw)?)
    }
}

/// Resolve the data directory.
///
/// Priority: explicit path > MB_DATA_DIR env var > platform data dir.
pub fn resolve_data_dir(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(path) = std::env::var("MB_DATA_DIR") {
        return Ok(PathBuf::from(path));
    }
    let base = dirs::data_dir()
        .ok_or_else(|| crate::Error::Other("could not determine a data directory".to_string()))?;
    Ok(base.join("missionboard"))
}
