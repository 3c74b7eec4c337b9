//! JSON snapshots of a [`DockState`].
//!
//! Loading always goes through [`migrate_state`], so older or damaged snapshots still
//! produce a valid state. The only load failures are unreadable files and text that is not
//! JSON at all.

use std::path::Path;

use crate::model::{DockState, migrate_state};

#[derive(Debug)]
pub enum DockPersistenceError {
    Json(serde_json::Error),
    Io(std::io::Error),
}

impl std::fmt::Display for DockPersistenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Json(err) => write!(f, "json error: {err}"),
            Self::Io(err) => write!(f, "io error: {err}"),
        }
    }
}

impl std::error::Error for DockPersistenceError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Json(err) => Some(err),
            Self::Io(err) => Some(err),
        }
    }
}

impl From<std::io::Error> for DockPersistenceError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<serde_json::Error> for DockPersistenceError {
    fn from(err: serde_json::Error) -> Self {
        Self::Json(err)
    }
}

impl DockState {
    /// Hydrate a snapshot produced by [`Self::to_json_string`] (any schema version).
    ///
    /// # Errors
    /// Fails only if `json` is not valid JSON text.
    pub fn from_json_str(json: &str) -> Result<Self, DockPersistenceError> {
        let raw: serde_json::Value = serde_json::from_str(json)?;
        Ok(migrate_state(&raw))
    }

    /// # Errors
    /// Fails if the file can't be read or does not contain JSON.
    pub fn load_from_json_file(path: impl AsRef<Path>) -> Result<Self, DockPersistenceError> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json_str(&text)
    }
}

#[cfg(feature = "serde")]
impl DockState {
    /// # Errors
    /// Only if serialization itself fails, which a valid state never does.
    pub fn to_json_string(&self) -> Result<String, DockPersistenceError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// # Errors
    /// Fails if the file can't be written.
    pub fn save_to_json_file(&self, path: impl AsRef<Path>) -> Result<(), DockPersistenceError> {
        let json = self.to_json_string()?;
        std::fs::write(path, json)?;
        Ok(())
    }
}
