use ini::{Ini, Properties};
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::exif::TagEntry;

/// Default location of the configuration file, relative to the working directory.
pub const DEFAULT_CONFIG_PATH: &str = "config/config.ini";

pub const SETTINGS_SECTION: &str = "Settings";
pub const EXIF_SECTION: &str = "EXIF";
pub const HISTORY_SECTION: &str = "History";

/// Maximum number of entries kept per history list.
pub const HISTORY_LIMIT: usize = 20;

/// Errors that make a configuration unusable for a batch or query run.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Config file not found at {}", .0.display())]
    NotFound(PathBuf),

    #[error("Failed to parse config file {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: ini::Error,
    },

    #[error("Config file must contain [Settings] and [EXIF] sections.")]
    MissingSections,

    #[error("'target_extensions' is not defined or is empty in the [Settings] section.")]
    MissingExtensions,

    #[error("Invalid boolean '{value}' for '{key}' in the [Settings] section.")]
    InvalidBool { key: String, value: String },

    #[error("Failed to write config file {}: {source}", .path.display())]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// The `[Settings]` section.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Copy each file to `<file>.bak` before writing.
    pub create_backup: bool,
    /// File name suffixes to process, e.g. `.jpg`. Never empty.
    pub target_extensions: Vec<String>,
}

/// The optional `[History]` section: previously used values for the GUI drop-downs.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct History {
    pub camera_models: Vec<String>,
    pub lens_models: Vec<String>,
}

impl History {
    /// Remember a model/lens pair, newest first.
    pub fn record(&mut self, camera_model: &str, lens_model: &str) {
        push_recent(&mut self.camera_models, camera_model);
        push_recent(&mut self.lens_models, lens_model);
    }
}

/// Move `value` to the front of `list`, dropping duplicates and the oldest overflow.
fn push_recent(list: &mut Vec<String>, value: &str) {
    let value = value.trim();
    if value.is_empty() {
        return;
    }
    list.retain(|v| v != value);
    list.insert(0, value.to_string());
    list.truncate(HISTORY_LIMIT);
}

/// Everything a batch run needs, validated up front.
#[derive(Debug, Clone)]
pub struct BatchPlan {
    pub settings: Settings,
    pub entries: Vec<TagEntry>,
}

/// An INI configuration file bound to the path it was loaded from.
///
/// Sections and keys that this crate does not understand are kept as-is and
/// written back unchanged by [`ConfigFile::save`].
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
    ini: Ini,
}

impl ConfigFile {
    /// Load the config at `path`.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            return Err(ConfigError::NotFound(path.to_path_buf()));
        }
        let ini = Ini::load_from_file(path).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        log::debug!("Loaded config from {}", path.display());
        Ok(Self {
            path: path.to_path_buf(),
            ini,
        })
    }

    /// An empty config that will be written to `path` on save.
    pub fn empty(path: &Path) -> Self {
        Self {
            path: path.to_path_buf(),
            ini: Ini::new(),
        }
    }

    /// Parse config text; `path` is only used for saving and error messages.
    pub fn parse(path: &Path, text: &str) -> Result<Self, ConfigError> {
        let ini = Ini::load_from_str(text).map_err(|e| ConfigError::Parse {
            path: path.to_path_buf(),
            source: ini::Error::Parse(e),
        })?;
        Ok(Self {
            path: path.to_path_buf(),
            ini,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Validate and return the `[Settings]` section.
    pub fn settings(&self) -> Result<Settings, ConfigError> {
        let section = self
            .ini
            .section(Some(SETTINGS_SECTION))
            .ok_or(ConfigError::MissingExtensions)?;

        let target_extensions = get_ci(section, "target_extensions")
            .map(split_list)
            .unwrap_or_default();
        if target_extensions.is_empty() {
            return Err(ConfigError::MissingExtensions);
        }

        let create_backup = match get_ci(section, "create_backup") {
            Some(raw) => parse_bool(raw).ok_or_else(|| ConfigError::InvalidBool {
                key: "create_backup".to_string(),
                value: raw.to_string(),
            })?,
            None => false,
        };

        Ok(Settings {
            create_backup,
            target_extensions,
        })
    }

    /// The `[EXIF]` entries in file order, or `None` when the section is missing.
    pub fn exif_entries(&self) -> Option<Vec<TagEntry>> {
        self.ini.section(Some(EXIF_SECTION)).map(|section| {
            section
                .iter()
                .map(|(key, value)| TagEntry::new(key, value))
                .collect()
        })
    }

    /// Validate everything a batch run needs.
    pub fn batch_plan(&self) -> Result<BatchPlan, ConfigError> {
        if self.ini.section(Some(SETTINGS_SECTION)).is_none()
            || self.ini.section(Some(EXIF_SECTION)).is_none()
        {
            return Err(ConfigError::MissingSections);
        }
        let settings = self.settings()?;
        let entries = self.exif_entries().unwrap_or_default();
        Ok(BatchPlan { settings, entries })
    }

    /// Set an `[EXIF]` value, keeping the existing key spelling if present.
    pub fn set_exif_value(&mut self, key: &str, value: &str) {
        set_ci(&mut self.ini, EXIF_SECTION, key, value);
    }

    pub fn history(&self) -> History {
        let Some(section) = self.ini.section(Some(HISTORY_SECTION)) else {
            return History::default();
        };
        History {
            camera_models: get_ci(section, "camera_models")
                .map(split_list)
                .unwrap_or_default(),
            lens_models: get_ci(section, "lens_models")
                .map(split_list)
                .unwrap_or_default(),
        }
    }

    pub fn set_history(&mut self, history: &History) {
        set_ci(
            &mut self.ini,
            HISTORY_SECTION,
            "camera_models",
            &history.camera_models.join(","),
        );
        set_ci(
            &mut self.ini,
            HISTORY_SECTION,
            "lens_models",
            &history.lens_models.join(","),
        );
    }

    /// Write the config back to the path it was loaded from.
    pub fn save(&self) -> Result<(), ConfigError> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;
        }
        self.ini
            .write_to_file(&self.path)
            .map_err(|source| ConfigError::Write {
                path: self.path.clone(),
                source,
            })?;
        log::info!("Config saved to {}", self.path.display());
        Ok(())
    }
}

/// Case-insensitive key lookup.
fn get_ci<'a>(section: &'a Properties, key: &str) -> Option<&'a str> {
    section
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case(key))
        .map(|(_, v)| v)
}

fn set_ci(ini: &mut Ini, section: &str, key: &str, value: &str) {
    let existing = ini.section(Some(section)).and_then(|props| {
        props
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(key))
            .map(|(k, _)| k.to_string())
    });
    ini.with_section(Some(section))
        .set(existing.as_deref().unwrap_or(key), value);
}

/// Split a comma-separated list, trimming entries and dropping empty ones.
fn split_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(String::from)
        .collect()
}

fn parse_bool(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "yes" | "true" | "on" => Some(true),
        "0" | "no" | "false" | "off" => Some(false),
        _ => None,
    }
}
