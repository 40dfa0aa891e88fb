//! Configuration management with layered loading
//!
//! Precedence (lowest to highest):
//! 1. Compiled defaults
//! 2. Global config: `$XDG_CONFIG_HOME/notetree/notetree.toml`
//! 3. Local config: `<dir>/.notetree.toml`
//! 4. Environment variables: `NOTETREE_*` prefix

use std::path::{Path, PathBuf};

use config::{Config, ConfigError, Environment};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use tracing::debug;
use uuid::Uuid;

use crate::application::ApplicationError;
use crate::domain::OrphanPolicy;

const APP_NAME: &str = "notetree";

/// Unified configuration for notetree.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct Settings {
    /// Snapshot file holding users, categories, comments and likes
    pub data_file: PathBuf,
    /// Handling of records unreachable from any root
    pub orphans: OrphanPolicy,
    /// User the CLI acts as when `--as` is not given
    #[serde(skip_serializing_if = "Option::is_none")]
    pub acting_user: Option<Uuid>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_file: default_data_file(),
            orphans: OrphanPolicy::default(),
            acting_user: None,
        }
    }
}

/// Raw settings for intermediate parsing; `None` means "inherit".
#[derive(Debug, Clone, Deserialize, Default)]
#[serde(default)]
pub struct RawSettings {
    pub data_file: Option<PathBuf>,
    pub orphans: Option<OrphanPolicy>,
    pub acting_user: Option<Uuid>,
}

fn default_data_file() -> PathBuf {
    ProjectDirs::from("", "", APP_NAME)
        .map(|dirs| dirs.data_dir().join("notetree.json"))
        .unwrap_or_else(|| PathBuf::from("notetree.json"))
}

/// Get the XDG config directory for notetree.
pub fn global_config_dir() -> Option<PathBuf> {
    ProjectDirs::from("", "", APP_NAME).map(|dirs| dirs.config_dir().to_path_buf())
}

/// Get the path to the global config file.
pub fn global_config_path() -> Option<PathBuf> {
    global_config_dir().map(|dir| dir.join("notetree.toml"))
}

/// Get the path to the local config file in a directory.
pub fn local_config_path(dir: &Path) -> PathBuf {
    dir.join(".notetree.toml")
}

/// Load a TOML file into RawSettings for manual merging.
fn load_raw_settings(path: &Path) -> Result<RawSettings, ApplicationError> {
    let content = std::fs::read_to_string(path).map_err(|e| ApplicationError::Config {
        message: format!("read {}: {}", path.display(), e),
    })?;
    toml::from_str(&content).map_err(|e| ApplicationError::Config {
        message: format!("parse {}: {}", path.display(), e),
    })
}

fn config_err(e: ConfigError) -> ApplicationError {
    ApplicationError::Config {
        message: e.to_string(),
    }
}

impl Settings {
    /// Expand `~`, `$VAR` and `${VAR}` in path fields. Unknown variables are left as is.
    fn expand_paths(&mut self) {
        let raw = self.data_file.to_string_lossy().to_string();
        let expanded = shellexpand::full(&raw)
            .map(|s| s.into_owned())
            .unwrap_or_else(|_| shellexpand::tilde(&raw).into_owned());
        self.data_file = PathBuf::from(expanded);
    }

    /// Overlay wins where it specifies a value.
    fn merge_with(&self, overlay: &RawSettings) -> Self {
        Self {
            data_file: overlay
                .data_file
                .clone()
                .unwrap_or_else(|| self.data_file.clone()),
            orphans: overlay.orphans.unwrap_or(self.orphans),
            acting_user: overlay.acting_user.or(self.acting_user),
        }
    }

    /// Load settings with layered precedence.
    ///
    /// # Arguments
    /// * `local_dir` - Optional directory holding a `.notetree.toml`
    pub fn load(local_dir: Option<&Path>) -> Result<Self, ApplicationError> {
        Self::load_from(global_config_path().as_deref(), local_dir)
    }

    /// Like [`Settings::load`] with an explicit global config file.
    pub fn load_from(
        global: Option<&Path>,
        local_dir: Option<&Path>,
    ) -> Result<Self, ApplicationError> {
        let mut current = Self::default();

        if let Some(global_path) = global {
            if global_path.exists() {
                debug!("loading global config {}", global_path.display());
                let raw = load_raw_settings(global_path)?;
                current = current.merge_with(&raw);
            }
        }

        if let Some(dir) = local_dir {
            let local_path = local_config_path(dir);
            if local_path.exists() {
                debug!("loading local config {}", local_path.display());
                let raw = load_raw_settings(&local_path)?;
                current = current.merge_with(&raw);
            }
        }

        current = Self::apply_env_overrides(current)?;
        current.expand_paths();

        Ok(current)
    }

    /// Apply NOTETREE_* environment variables as explicit overrides.
    fn apply_env_overrides(mut settings: Self) -> Result<Self, ApplicationError> {
        let config = Config::builder()
            .add_source(
                Environment::with_prefix("NOTETREE")
                    .prefix_separator("_")
                    .separator("__"),
            )
            .build()
            .map_err(config_err)?;

        if let Ok(val) = config.get_string("data_file") {
            settings.data_file = PathBuf::from(val);
        }
        if let Ok(val) = config.get_string("orphans") {
            settings.orphans = parse_orphans(&val)?;
        }
        if let Ok(val) = config.get_string("acting_user") {
            let id = Uuid::parse_str(&val).map_err(|e| ApplicationError::Config {
                message: format!("NOTETREE_ACTING_USER: {e}"),
            })?;
            settings.acting_user = Some(id);
        }

        Ok(settings)
    }

    /// Show the effective configuration as TOML.
    pub fn to_toml(&self) -> Result<String, ApplicationError> {
        toml::to_string_pretty(self).map_err(|e| ApplicationError::Config {
            message: format!("serialize config: {e}"),
        })
    }

    /// Generate a template config file.
    pub fn template() -> String {
        r#"# notetree configuration
#
# Locations (by precedence, lowest to highest):
#   Global: ~/.config/notetree/notetree.toml
#   Local:  <dir>/.notetree.toml
#   Env:    NOTETREE_* environment variables

# Snapshot file with users, categories, comments and likes
# data_file = "~/.local/share/notetree/notetree.json"

# Records whose parent chain never reaches a root:
#   "drop"   leave them out and log a warning
#   "reject" fail with a data-integrity error
# orphans = "drop"

# Default acting user (overridden by --as)
# acting_user = "00000000-0000-0000-0000-000000000000"
"#
        .to_string()
    }
}

fn parse_orphans(value: &str) -> Result<OrphanPolicy, ApplicationError> {
    match value.to_ascii_lowercase().as_str() {
        "drop" => Ok(OrphanPolicy::Drop),
        "reject" => Ok(OrphanPolicy::Reject),
        other => Err(ApplicationError::Config {
            message: format!("invalid orphans policy '{other}' (expected drop or reject)"),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn given_partial_overlay_when_merging_then_unset_fields_inherit() {
        let base = Settings {
            data_file: PathBuf::from("/data/base.json"),
            orphans: OrphanPolicy::Reject,
            acting_user: None,
        };
        let overlay = RawSettings {
            data_file: Some(PathBuf::from("/data/local.json")),
            ..Default::default()
        };

        let merged = base.merge_with(&overlay);

        assert_eq!(merged.data_file, PathBuf::from("/data/local.json"));
        assert_eq!(merged.orphans, OrphanPolicy::Reject);
    }

    #[test]
    fn given_tilde_path_when_expanding_then_home_is_substituted() {
        let mut settings = Settings {
            data_file: PathBuf::from("~/notes.json"),
            ..Default::default()
        };
        settings.expand_paths();
        assert!(!settings.data_file.to_string_lossy().starts_with('~'));
    }

    #[test]
    fn given_mixed_case_when_parsing_orphans_then_accepted() {
        assert_eq!(parse_orphans("Reject").unwrap(), OrphanPolicy::Reject);
        assert!(parse_orphans("keep").is_err());
    }

    #[test]
    fn given_template_when_parsed_then_yields_empty_overlay() {
        let raw: RawSettings = toml::from_str(&Settings::template()).unwrap();
        assert!(raw.data_file.is_none());
        assert!(raw.orphans.is_none());
    }
}
