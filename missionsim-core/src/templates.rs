//! Named mission templates.
//!
//! A template named `delivery` lives in `<root>/mission_delivery.json` and is
//! parsed and validated exactly like a mission handed in by a caller.
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use log::debug;
use thiserror::Error;

use crate::model::Mission;
use crate::validation::MissionError;

const FILE_PREFIX: &str = "mission_";
const FILE_SUFFIX: &str = ".json";

/// Source of named, ready-to-run missions.
pub trait TemplateSource {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Load and validate the template called `name`.
    ///
    /// # Errors
    ///
    /// Returns an error if the template is missing, unreadable or invalid.
    fn load_template(&self, name: &str) -> Result<Mission, Self::Error>;

    /// Names of every available template, sorted.
    ///
    /// # Errors
    ///
    /// Returns an error if the template catalogue cannot be read.
    fn list_templates(&self) -> Result<Vec<String>, Self::Error>;
}

#[derive(Debug, Error)]
pub enum TemplateError {
    #[error("template {name} not found at {}", path.display())]
    NotFound { name: String, path: PathBuf },
    #[error("invalid template name {name:?}: use letters, digits, '-' or '_'")]
    InvalidName { name: String },
    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("template {name} is not valid mission JSON: {source}")]
    Parse {
        name: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("template {name} failed validation: {source}")]
    Invalid {
        name: String,
        #[source]
        source: MissionError,
    },
}

/// Templates stored as `mission_<name>.json` files in one directory.
#[derive(Debug, Clone)]
pub struct DirectoryTemplates {
    root: PathBuf,
}

impl DirectoryTemplates {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    #[must_use]
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// File backing the template `name`. Fails on names that could escape the root.
    ///
    /// # Errors
    ///
    /// Returns [`TemplateError::InvalidName`] for empty names or names with
    /// characters outside `[A-Za-z0-9_-]`.
    pub fn path_for(&self, name: &str) -> Result<PathBuf, TemplateError> {
        if !is_valid_name(name) {
            return Err(TemplateError::InvalidName {
                name: name.to_string(),
            });
        }
        Ok(self.root.join(format!("{FILE_PREFIX}{name}{FILE_SUFFIX}")))
    }
}

fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

fn template_name(file_name: &str) -> Option<&str> {
    file_name
        .strip_prefix(FILE_PREFIX)?
        .strip_suffix(FILE_SUFFIX)
        .filter(|name| is_valid_name(name))
}

impl TemplateSource for DirectoryTemplates {
    type Error = TemplateError;

    fn load_template(&self, name: &str) -> Result<Mission, TemplateError> {
        let path = self.path_for(name)?;
        debug!("loading template {name} from {}", path.display());
        let raw = match fs::read_to_string(&path) {
            Ok(raw) => raw,
            Err(err) if err.kind() == io::ErrorKind::NotFound => {
                return Err(TemplateError::NotFound {
                    name: name.to_string(),
                    path,
                });
            }
            Err(source) => return Err(TemplateError::Io { path, source }),
        };
        let mission: Mission =
            serde_json::from_str(&raw).map_err(|source| TemplateError::Parse {
                name: name.to_string(),
                source,
            })?;
        mission.validate().map_err(|source| TemplateError::Invalid {
            name: name.to_string(),
            source,
        })?;
        Ok(mission)
    }

    fn list_templates(&self) -> Result<Vec<String>, TemplateError> {
        let entries = fs::read_dir(&self.root).map_err(|source| TemplateError::Io {
            path: self.root.clone(),
            source,
        })?;
        let mut names = Vec::new();
        for entry in entries {
            let entry = entry.map_err(|source| TemplateError::Io {
                path: self.root.clone(),
                source,
            })?;
            if let Some(name) = entry.file_name().to_str().and_then(template_name) {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }
}
