//! Credential resolution.
//!
//! Credentials are looked up through the [`CredentialProvider`] capability so
//! that the migration never reaches for the terminal directly. The binary uses
//! [`EnvCredentials`]; tests and embedders hand in [`StaticCredentials`].

use dialoguer::Password;
use std::collections::HashMap;
use std::sync::Mutex;
use tracing::debug;

use crate::error::{Error, Result};

/// Pinecone API key.
pub const PINECONE_API_KEY: &str = "PINECONE_API_KEY";
/// Pinecone environment, e.g. `us-east-1-aws`.
pub const PINECONE_ENVIRONMENT: &str = "PINECONE_ENVIRONMENT";
/// Qdrant cluster URL.
pub const QDRANT_URL: &str = "QDRANT_URL";
/// Qdrant API key.
pub const QDRANT_API_KEY: &str = "QDRANT_API_KEY";

/// Resolves a named configuration value.
pub trait CredentialProvider: Send + Sync {
    /// Returns the value for `name`.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Config`] if the value cannot be obtained.
    fn resolve(&self, name: &str) -> Result<String>;
}

/// Environment lookup with a non-echoing interactive fallback.
///
/// Values obtained from the prompt are cached for the lifetime of the
/// resolver and are never written anywhere.
pub struct EnvCredentials {
    cache: Mutex<HashMap<String, String>>,
    interactive: bool,
}

impl Default for EnvCredentials {
    fn default() -> Self {
        Self::new()
    }
}

impl EnvCredentials {
    /// Creates a resolver that prompts when a terminal is attended.
    pub fn new() -> Self {
        Self {
            cache: Mutex::default(),
            interactive: console::user_attended(),
        }
    }

    /// Creates a resolver that never prompts; unset variables are errors.
    pub fn non_interactive() -> Self {
        Self {
            cache: Mutex::default(),
            interactive: false,
        }
    }

    fn prompt(&self, name: &str) -> Result<String> {
        if !self.interactive {
            return Err(Error::Config(format!(
                "{name} is not set and no terminal is available to prompt for it"
            )));
        }

        Password::new()
            .with_prompt(format!("Enter your {}", name.replace('_', " ")))
            .interact()
            .map_err(|e| Error::Config(format!("Input cancelled for {name}: {e}")))
    }
}

impl CredentialProvider for EnvCredentials {
    fn resolve(&self, name: &str) -> Result<String> {
        let mut cache = self
            .cache
            .lock()
            .map_err(|_| Error::Config("credential cache poisoned".to_string()))?;

        if let Some(value) = cache.get(name) {
            return Ok(value.clone());
        }

        let value = match std::env::var(name) {
            Ok(v) if !v.is_empty() => {
                debug!("Resolved {} from environment", name);
                v
            }
            _ => self.prompt(name)?,
        };

        cache.insert(name.to_string(), value.clone());
        Ok(value)
    }
}

/// Fixed set of values.
#[derive(Debug, Clone, Default)]
pub struct StaticCredentials {
    values: HashMap<String, String>,
}

impl StaticCredentials {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a value, builder style.
    #[must_use]
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }
}

impl CredentialProvider for StaticCredentials {
    fn resolve(&self, name: &str) -> Result<String> {
        self.values
            .get(name)
            .cloned()
            .ok_or_else(|| Error::Config(format!("{name} is not configured")))
    }
}
