//! Error types for Discord OAuth operations

/// Errors from OAuth operations and the session store.
///
/// `Http` covers transport failures (connection refused, timeout); the
/// endpoint-specific variants cover non-success HTTP statuses and malformed
/// bodies. The relay maps each variant to a symbolic redirect code.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("HTTP request failed: {0}")]
    Http(String),

    #[error("token exchange failed: {0}")]
    TokenExchange(String),

    #[error("user fetch failed: {0}")]
    UserFetch(String),

    #[error("store parse error: {0}")]
    StoreParse(String),

    #[error("I/O error: {0}")]
    Io(String),
}

/// Result alias for auth operations.
pub type Result<T> = std::result::Result<T, Error>;
