use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{CrossNavError, Result};

/// Name of the configuration file stored inside the `.crossnav` directory.
pub const CONFIG_FILENAME: &str = "config.json";

/// Name of the hidden directory used to store crossnav metadata.
pub const CROSSNAV_DIR: &str = ".crossnav";

/// Name of the SQLite database file inside the `.crossnav` directory.
pub const DB_FILENAME: &str = "crossnav.db";

/// Configuration for a crossnav project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CrossNavConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Root directory of the project the index covers.
    pub root_dir: String,
    /// Default query mode: prefer a declaration over a definition when both
    /// are resolvable. Individual queries may override this.
    pub declaration_only: bool,
}

impl Default for CrossNavConfig {
    fn default() -> Self {
        Self {
            version: 1,
            root_dir: String::new(),
            declaration_only: false,
        }
    }
}

/// Returns the path to the `.crossnav` directory within the given project root.
pub fn get_crossnav_dir(project_root: &Path) -> PathBuf {
    project_root.join(CROSSNAV_DIR)
}

/// Returns the path to the configuration file within the `.crossnav` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_crossnav_dir(project_root).join(CONFIG_FILENAME)
}

/// Returns the path to the database file within the `.crossnav` directory.
pub fn get_db_path(project_root: &Path) -> PathBuf {
    get_crossnav_dir(project_root).join(DB_FILENAME)
}

/// Loads the configuration from disk.
///
/// If the configuration file does not exist, returns a default configuration
/// with `root_dir` set to the given project root.
pub fn load_config(project_root: &Path) -> Result<CrossNavConfig> {
    let config_path = get_config_path(project_root);

    if !config_path.exists() {
        return Ok(CrossNavConfig {
            root_dir: project_root.to_string_lossy().to_string(),
            ..CrossNavConfig::default()
        });
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| CrossNavError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    let config: CrossNavConfig =
        serde_json::from_str(&contents).map_err(|e| CrossNavError::Config {
            message: format!(
                "failed to parse config file '{}': {}",
                config_path.display(),
                e
            ),
        })?;

    Ok(config)
}

/// Saves the configuration to disk using an atomic write.
///
/// Writes to a temporary file first and then renames it into place, so a
/// partial write never corrupts the configuration.
pub fn save_config(project_root: &Path, config: &CrossNavConfig) -> Result<()> {
    let crossnav_dir = get_crossnav_dir(project_root);
    fs::create_dir_all(&crossnav_dir).map_err(|e| CrossNavError::Config {
        message: format!(
            "failed to create crossnav directory '{}': {}",
            crossnav_dir.display(),
            e
        ),
    })?;

    let config_path = get_config_path(project_root);
    let tmp_path = config_path.with_extension("tmp");

    let json = serde_json::to_string_pretty(config).map_err(|e| CrossNavError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, &json).map_err(|e| CrossNavError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, &config_path).map_err(|e| CrossNavError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            config_path.display(),
            e
        ),
    })?;

    Ok(())
}
