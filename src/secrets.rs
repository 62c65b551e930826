// src/secrets.rs
//! Locates the Gemini API key.
//!
//! Secrets files are searched first, in order, then the process environment.
//! Every configured key name is tried against each source; the first
//! non-blank value wins.

use crate::config::SecretsConfig;
use crate::error::SecretError;
use std::fmt;
use std::path::{Path, PathBuf};

/// The API key. `Debug` never prints the value.
#[derive(Clone, PartialEq, Eq)]
pub struct ApiKey(String);

impl ApiKey {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ApiKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ApiKey(***)")
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SecretSource {
    File(PathBuf),
    Env,
}

impl fmt::Display for SecretSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SecretSource::File(path) => write!(f, "secrets file {}", path.display()),
            SecretSource::Env => f.write_str("environment"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedSecret {
    pub key: ApiKey,
    pub source: SecretSource,
    /// Key name the value was found under.
    pub name: String,
}

type EnvLookup = Box<dyn Fn(&str) -> Option<String> + Send + Sync>;

pub struct SecretLoader {
    files: Vec<PathBuf>,
    keys: Vec<String>,
    env: EnvLookup,
}

impl SecretLoader {
    pub fn new(files: Vec<PathBuf>, keys: Vec<String>) -> Self {
        Self {
            files,
            keys,
            env: Box::new(|name| std::env::var(name).ok()),
        }
    }

    pub fn from_config(config: &SecretsConfig) -> Self {
        Self::new(config.files.clone(), config.keys.clone())
    }

    /// Replace the environment lookup.
    pub fn with_env<F>(mut self, lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String> + Send + Sync + 'static,
    {
        self.env = Box::new(lookup);
        self
    }

    pub fn load(&self) -> Result<LoadedSecret, SecretError> {
        for path in &self.files {
            if let Some((name, value)) = self.read_file(path)? {
                return Ok(LoadedSecret {
                    key: ApiKey::new(value),
                    source: SecretSource::File(path.clone()),
                    name,
                });
            }
        }

        for name in &self.keys {
            if let Some(value) = (self.env)(name).and_then(non_blank) {
                return Ok(LoadedSecret {
                    key: ApiKey::new(value),
                    source: SecretSource::Env,
                    name: name.clone(),
                });
            }
        }

        Err(SecretError::Missing {
            keys: self.keys.clone(),
        })
    }

    fn read_file(&self, path: &Path) -> Result<Option<(String, String)>, SecretError> {
        let content = match std::fs::read_to_string(path) {
            Ok(c) => c,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(None),
            Err(source) => {
                return Err(SecretError::Read {
                    path: path.to_path_buf(),
                    source,
                });
            }
        };

        let table: toml::Table = toml::from_str(&content).map_err(|e| SecretError::Parse {
            path: path.to_path_buf(),
            message: e.to_string(),
        })?;

        Ok(self.keys.iter().find_map(|name| {
            table
                .get(name)
                .and_then(|v| v.as_str())
                .and_then(|v| non_blank(v.to_string()))
                .map(|v| (name.clone(), v))
        }))
    }
}

fn non_blank(value: String) -> Option<String> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        None
    } else {
        Some(trimmed.to_string())
    }
}
