//! Discord client secret handling
//!
//! The secret authenticates the relay to Discord's token endpoint. It is
//! never stored in the TOML config: it comes from the DISCORD_CLIENT_SECRET
//! env var or a secret file, and the wrapper keeps it out of Debug/Display
//! output and zeroes it on drop.

use std::fmt;
use std::path::Path;
use zeroize::Zeroize;

use crate::error::ConfigError;

/// The Discord application client secret, redacted in logs.
pub struct ClientSecret(String);

impl ClientSecret {
    pub fn new(value: String) -> Self {
        Self(value)
    }

    /// Resolve the secret from the environment or a secret file.
    ///
    /// DISCORD_CLIENT_SECRET takes precedence; otherwise the file is read
    /// and trimmed. A whitespace-only file yields `None`, as does having
    /// neither source — the config validation turns that into an error.
    pub fn resolve(secret_file: Option<&Path>) -> Result<Option<Self>, ConfigError> {
        if let Ok(secret) = std::env::var("DISCORD_CLIENT_SECRET") {
            return Ok(Some(Self::new(secret)));
        }
        let Some(file) = secret_file else {
            return Ok(None);
        };
        let secret = std::fs::read_to_string(file).map_err(|e| {
            ConfigError::Invalid(format!(
                "failed to read client_secret_file {}: {e}",
                file.display()
            ))
        })?;
        let secret = secret.trim();
        if secret.is_empty() {
            return Ok(None);
        }
        Ok(Some(Self::new(secret.to_owned())))
    }

    /// Expose the inner value (use sparingly)
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl fmt::Display for ClientSecret {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[REDACTED]")
    }
}

impl Drop for ClientSecret {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}
