use std::fs;
use std::io;
use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::debug;

use reel_tree::DEFAULT_ROOT_NAME;

use crate::error::{DiskError, DiskResult};

/// Name of the optional configuration file inside a store directory.
pub const CONFIG_FILE_NAME: &str = "reel.toml";

/// Layout and formatting of a store directory.
///
/// Every field has a default, so a partial `reel.toml` is valid.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// File holding the tree document.
    pub document_name: String,
    /// Extension of recording payload files.
    pub payload_extension: String,
    /// Name given to the root folder when a store is created.
    pub root_name: String,
    /// Whether the document is written pretty-printed.
    pub pretty: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            document_name: "store.json".into(),
            payload_extension: "m4a".into(),
            root_name: DEFAULT_ROOT_NAME.into(),
            pretty: true,
        }
    }
}

impl StoreConfig {
    /// Read `reel.toml` from `dir`, falling back to defaults if it is absent.
    pub fn load(dir: &Path) -> DiskResult<Self> {
        let path = dir.join(CONFIG_FILE_NAME);
        let text = match fs::read_to_string(&path) {
            Ok(text) => text,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!(path = %path.display(), "no config file; using defaults");
                return Ok(Self::default());
            }
            Err(e) => return Err(e.into()),
        };
        toml::from_str(&text)
            .map_err(|e| DiskError::Config(format!("{}: {e}", path.display())))
    }

    /// Write this configuration as `reel.toml` in `dir`.
    pub fn save(&self, dir: &Path) -> DiskResult<()> {
        let text = toml::to_string_pretty(self).map_err(|e| DiskError::Config(e.to_string()))?;
        fs::create_dir_all(dir)?;
        fs::write(dir.join(CONFIG_FILE_NAME), text)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let c = StoreConfig::default();
        assert_eq!(c.document_name, "store.json");
        assert_eq!(c.payload_extension, "m4a");
        assert_eq!(c.root_name, "Recordings");
        assert!(c.pretty);
    }

    #[test]
    fn missing_file_gives_defaults() {
        let dir = tempfile::tempdir().unwrap();
        assert_eq!(StoreConfig::load(dir.path()).unwrap(), StoreConfig::default());
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "payload_extension = \"wav\"\n").unwrap();
        let c = StoreConfig::load(dir.path()).unwrap();
        assert_eq!(c.payload_extension, "wav");
        assert_eq!(c.document_name, "store.json");
    }

    #[test]
    fn save_then_load() {
        let dir = tempfile::tempdir().unwrap();
        let c = StoreConfig {
            root_name: "Voice Memos".into(),
            pretty: false,
            ..Default::default()
        };
        c.save(dir.path()).unwrap();
        assert_eq!(StoreConfig::load(dir.path()).unwrap(), c);
    }

    #[test]
    fn malformed_file_is_config_error() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join(CONFIG_FILE_NAME), "pretty = \"very\"").unwrap();
        assert!(matches!(StoreConfig::load(dir.path()), Err(DiskError::Config(_))));
    }
}
