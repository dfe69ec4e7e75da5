//! Daemon configuration file.
//!
//! The config is a flat INI file handed to the daemon as its single
//! command-line argument. Sections map to [`ConfigGroup`]s; the
//! controller consumes values through `group("system")` lookups rather
//! than a typed settings struct because the legacy surface is small and
//! re-read on a schedule (certificate path, roster path) instead of once
//! at boot.
//!
//! Recognized `[system]` keys: `ident`, `name`, `email`, `hostname`,
//! `location`, `certificates`, `whazzup`.
//!
//! Each group carries a `changed` flag, set whenever (re)loading alters
//! the group's contents. The controller clears it after reconfiguring.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ini::Ini;
use thiserror::Error;

/// Configuration errors. A missing or unparseable file at boot is fatal.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// The config file does not exist.
    #[error("config file not found: {0}")]
    Missing(PathBuf),

    /// The config file could not be read or parsed.
    #[error("failed to read config file: {0}")]
    Read(#[from] ini::Error),
}

/// One INI section.
#[derive(Debug, Clone, Default)]
pub struct ConfigGroup {
    entries: HashMap<String, String>,
    /// Set when a (re)load altered this group; cleared by the consumer.
    pub changed: bool,
}

impl ConfigGroup {
    /// Raw string value for a key.
    pub fn entry(&self, key: &str) -> Option<&str> {
        self.entries.get(key).map(String::as_str)
    }

    /// Path value for a key, with `~/` expanded to the home directory.
    pub fn path_entry(&self, key: &str) -> Option<PathBuf> {
        self.entry(key).map(expand_tilde)
    }

    /// Acknowledge the current contents.
    pub fn clear_changed(&mut self) {
        self.changed = false;
    }
}

/// Loaded configuration with per-group change tracking.
#[derive(Debug)]
pub struct ConfigManager {
    path: PathBuf,
    groups: HashMap<String, ConfigGroup>,
}

impl ConfigManager {
    /// Load the file at `path`. A missing file is an error (boot-fatal),
    /// never silently defaulted: a federation node with no identity must
    /// not come up.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::Missing(path.to_path_buf()));
        }
        let ini = Ini::load_from_file(path)?;
        Ok(Self {
            path: path.to_path_buf(),
            groups: groups_from_ini(&ini),
        })
    }

    /// Re-read the file, marking every group whose contents differ.
    ///
    /// Groups that vanished from the file are dropped; brand-new groups
    /// arrive with `changed` set.
    pub fn reload(&mut self) -> Result<(), ConfigError> {
        if !self.path.exists() {
            return Err(ConfigError::Missing(self.path.clone()));
        }
        let ini = Ini::load_from_file(&self.path)?;
        let mut fresh = groups_from_ini(&ini);

        for (name, group) in &mut fresh {
            group.changed = match self.groups.get(name) {
                Some(old) => old.entries != group.entries || old.changed,
                None => true,
            };
        }
        self.groups = fresh;
        Ok(())
    }

    pub fn group(&self, name: &str) -> Option<&ConfigGroup> {
        self.groups.get(name)
    }

    pub fn group_mut(&mut self, name: &str) -> Option<&mut ConfigGroup> {
        self.groups.get_mut(name)
    }

    /// Convenience lookup of a `[system]` entry.
    pub fn system_entry(&self, key: &str) -> Option<&str> {
        self.group("system").and_then(|g| g.entry(key))
    }

    /// Convenience lookup of a `[system]` path entry, tilde-expanded.
    pub fn system_path(&self, key: &str) -> Option<PathBuf> {
        self.group("system").and_then(|g| g.path_entry(key))
    }
}

fn groups_from_ini(ini: &Ini) -> HashMap<String, ConfigGroup> {
    let mut groups: HashMap<String, ConfigGroup> = HashMap::new();
    for (section, properties) in ini.iter() {
        // Keys outside any [section] have nowhere to live in the group
        // model and are ignored.
        let Some(name) = section else { continue };
        let group = groups.entry(name.to_string()).or_default();
        // A fresh load counts as a change until the consumer acknowledges.
        group.changed = true;
        for (key, value) in properties.iter() {
            group.entries.insert(key.to_string(), value.to_string());
        }
    }
    groups
}

/// Parse a boolean config value.
/// Accepts: true/false, yes/no, 1/0, on/off (case-insensitive).
pub fn parse_bool(value: &str) -> bool {
    let v = value.trim().to_lowercase();
    v == "true" || v == "1" || v == "yes" || v == "on"
}

/// Expand `~/` to the home directory in a path value.
fn expand_tilde(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(stripped);
        }
    }
    PathBuf::from(path)
}
