//! Persistent signal → action bindings
//!
//! Stored as versioned TOML, one record per signal with its ordered action
//! list (default first):
//!
//! ```toml
//! version = 1
//!
//! [[binding]]
//! signal = "FF30CF"
//! actions = ["Move mouse left", "Left arrow"]
//! ```
//!
//! Loading is lenient: unknown action names and bad records are dropped with
//! a warning, and an unreadable file yields an empty mapping.

use std::io;
use std::path::{Path, PathBuf};

use irplus_engine::{ActionId, Bindings, Signal};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

/// Current on-disk format version
pub const FORMAT_VERSION: u32 = 1;

/// Errors from reading or writing the bindings file
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("Malformed bindings file: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("Failed to encode bindings: {0}")]
    Encode(#[from] toml::ser::Error),
    #[error("Unsupported bindings format version {0} (expected {expected})", expected = FORMAT_VERSION)]
    UnsupportedVersion(u32),
}

#[derive(Debug, Serialize, Deserialize)]
struct BindingFile {
    version: u32,
    #[serde(default, rename = "binding")]
    bindings: Vec<BindingRecord>,
}

#[derive(Debug, Serialize, Deserialize)]
struct BindingRecord {
    signal: String,
    actions: Vec<String>,
}

/// File-backed binding storage
#[derive(Debug, Clone)]
pub struct ConfigStore {
    path: PathBuf,
}

impl ConfigStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Get the default bindings file path
    pub fn default_path() -> PathBuf {
        crate::config::config_dir().join("bindings.toml")
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load bindings, falling back to an empty mapping on any failure.
    pub fn load(&self) -> Bindings {
        match self.try_load() {
            Ok(bindings) => bindings,
            Err(e) => {
                warn!("Ignoring saved bindings: {}", e);
                Bindings::new()
            }
        }
    }

    /// Load bindings; a missing file is an empty mapping.
    pub fn try_load(&self) -> Result<Bindings, StoreError> {
        let content = match std::fs::read_to_string(&self.path) {
            Ok(content) => content,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("No bindings file at {:?}", self.path);
                return Ok(Bindings::new());
            }
            Err(e) => return Err(self.io_error(e)),
        };
        parse_bindings(&content)
    }

    /// Write all bindings, replacing the file atomically.
    pub fn save(&self, bindings: &Bindings) -> Result<(), StoreError> {
        let file = BindingFile {
            version: FORMAT_VERSION,
            bindings: bindings
                .iter()
                .map(|(signal, actions)| BindingRecord {
                    signal: signal.to_string(),
                    actions: actions.iter().map(|a| a.name().to_string()).collect(),
                })
                .collect(),
        };
        let content = toml::to_string_pretty(&file)?;

        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let tmp = self.path.with_extension("toml.tmp");
        std::fs::write(&tmp, content).map_err(|e| self.io_error(e))?;
        std::fs::rename(&tmp, &self.path).map_err(|e| self.io_error(e))?;
        Ok(())
    }

    /// Remove every saved binding.
    pub fn clear(&self) -> Result<(), StoreError> {
        self.save(&Bindings::new())
    }

    /// Make `action` the default for `signal`, keeping older actions behind
    /// it. Returns the updated bindings.
    ///
    /// A file that cannot be read or parsed is left alone and the error is
    /// returned, so existing bindings are never overwritten.
    pub fn bind(&self, signal: Signal, action: ActionId) -> Result<Bindings, StoreError> {
        let mut bindings = self.try_load()?;
        bindings.prepend(signal, action);
        self.save(&bindings)?;
        Ok(bindings)
    }

    fn io_error(&self, source: io::Error) -> StoreError {
        StoreError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

fn parse_bindings(content: &str) -> Result<Bindings, StoreError> {
    let file: BindingFile = toml::from_str(content)?;
    if file.version != FORMAT_VERSION {
        return Err(StoreError::UnsupportedVersion(file.version));
    }

    let mut bindings = Bindings::new();
    for record in file.bindings {
        let signal = match Signal::new(&record.signal) {
            Ok(signal) => signal,
            Err(e) => {
                warn!("Skipping binding: {}", e);
                continue;
            }
        };

        let actions: Vec<ActionId> = record
            .actions
            .iter()
            .filter_map(|name| match name.parse::<ActionId>() {
                Ok(action) => Some(action),
                Err(e) => {
                    warn!("Signal {}: {}", signal, e);
                    None
                }
            })
            .collect();

        if bindings.get(&signal).is_some() {
            warn!("Signal {} listed twice, keeping the last entry", signal);
        }
        if let Err(e) = bindings.insert(signal, actions) {
            warn!("Skipping binding: {}", e);
        }
    }
    Ok(bindings)
}
