//! Symbolic error codes surfaced to the application
//!
//! Every failure in the login and callback flows is converted at the handler
//! boundary into one of these codes and carried on the error-page URL as
//! `?error=<CODE>`. No Rust error escapes a handler.

use thiserror::Error;

/// Error codes appended to `{app_url}/auth/error?error=<CODE>`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthErrorCode {
    /// `/login` called without a caller token
    GetTokenFailed,
    /// `/callback` called without a state parameter
    StateNotFound,
    /// State is not (or no longer) pending
    InvalidState,
    /// Transport failure talking to Discord
    RequestError,
    /// Token endpoint returned a non-success status
    CannotGetToken,
    /// User endpoint returned a non-success status
    CannotGetUser,
    /// Session store failed to persist
    CannotStoreToken,
}

impl AuthErrorCode {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::GetTokenFailed => "GET_TOKEN_FAILED",
            Self::StateNotFound => "STATE_NOT_FOUND",
            Self::InvalidState => "INVALID_STATE",
            Self::RequestError => "REQUEST_ERROR",
            Self::CannotGetToken => "CANNOT_GET_TOKEN",
            Self::CannotGetUser => "CANNOT_GET_USER",
            Self::CannotStoreToken => "CANNOT_STORE_TOKEN",
        }
    }
}

impl From<&discord_auth::Error> for AuthErrorCode {
    fn from(err: &discord_auth::Error) -> Self {
        match err {
            discord_auth::Error::Http(_) => Self::RequestError,
            discord_auth::Error::TokenExchange(_) => Self::CannotGetToken,
            discord_auth::Error::UserFetch(_) => Self::CannotGetUser,
            discord_auth::Error::StoreParse(_) | discord_auth::Error::Io(_) => {
                Self::CannotStoreToken
            }
        }
    }
}

/// Startup errors that abort the service before it serves requests.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("configuration error: {0}")]
    Invalid(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
}
