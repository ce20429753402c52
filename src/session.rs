use std::{
    fs, io,
    path::{Path, PathBuf},
};

use log::{debug, info};
use serde_derive::{Deserialize, Serialize};
use thiserror::Error;
use toml::value::{Table, Value};
use xdg::{BaseDirectories, BaseDirectoriesError};

use crate::config::Config;
use crate::tools::ToolManager;

const CURRENT_VERSION: i64 = 1;
const SESSION_FILE: &str = "tools.toml";
const XDG_PREFIX: &str = "scenetools";

#[derive(Error, Debug)]
pub enum SessionFileError {
    #[error("XDG context error: {0}")]
    Xdg(#[from] BaseDirectoriesError),

    #[error("Error accessing file: {0}")]
    Io(#[from] io::Error),

    #[error("Decoding toml failed: {0}")]
    TomlDecoding(#[from] toml::de::Error),

    #[error("Encoding toml failed: {0}")]
    TomlEncoding(#[from] toml::ser::Error),

    #[error("Unsupported session file version {0}")]
    UnsupportedVersion(i64),
}

#[derive(Serialize, Deserialize)]
struct SessionFile {
    #[serde(default = "current_version")]
    version: i64,
    last_modified: String,
    #[serde(default)]
    tools: Vec<Table>,
}

fn current_version() -> i64 {
    CURRENT_VERSION
}

/// Write the manager's tool set to a versioned toml file.
///
/// With no explicit path the file goes to the XDG config home under
/// `scenetools/tools.toml`. Returns the path written.
pub fn save_session(
    path: Option<&Path>,
    manager: &ToolManager,
) -> Result<PathBuf, SessionFileError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => BaseDirectories::with_prefix(XDG_PREFIX)?.place_config_file(SESSION_FILE)?,
    };

    let mut config = Config::new();
    manager.save(&mut config);
    let tools = config
        .get("tools")
        .and_then(Value::as_array)
        .map(|entries| {
            entries
                .iter()
                .filter_map(|entry| entry.as_table().cloned())
                .collect()
        })
        .unwrap_or_default();

    let file = SessionFile {
        version: CURRENT_VERSION,
        last_modified: chrono::Utc::now().to_rfc3339(),
        tools,
    };
    fs::write(&path, toml::to_string(&file)?)?;
    info!("tool session saved to '{}'", path.display());
    Ok(path)
}

/// Restore a tool set previously written by [`save_session`].
///
/// A missing file is a fresh start, not an error: the manager is left
/// untouched and `Ok(false)` is returned.
pub fn load_session(
    path: Option<&Path>,
    manager: &mut ToolManager,
) -> Result<bool, SessionFileError> {
    let path = match path {
        Some(p) => p.to_path_buf(),
        None => BaseDirectories::with_prefix(XDG_PREFIX)?.get_config_file(SESSION_FILE),
    };
    if !path.exists() {
        debug!("no tool session at '{}'", path.display());
        return Ok(false);
    }

    let content = fs::read_to_string(&path)?;
    let file: SessionFile = toml::from_str(&content)?;
    if file.version != CURRENT_VERSION {
        return Err(SessionFileError::UnsupportedVersion(file.version));
    }
    debug!("restoring tool session last modified {}", file.last_modified);

    let mut config = Config::new();
    config.insert(
        "tools",
        Value::Array(file.tools.into_iter().map(Value::Table).collect()),
    );
    manager.load(&config);
    info!("tool session restored from '{}'", path.display());
    Ok(true)
}
