//! Discord OAuth constants
//!
//! Endpoint paths are relative to a configurable API base so the relay can
//! point at a mock server in tests. The production base is `DISCORD_API_BASE`.
//! Client id and secret are deployment configuration, not constants — they
//! live in the relay's config.

/// Discord's public HTTP API base
pub const DISCORD_API_BASE: &str = "https://discord.com/api";

/// Authorization endpoint path (user-facing consent page)
pub const AUTHORIZE_PATH: &str = "/oauth2/authorize";

/// Token endpoint path for authorization code exchange
pub const TOKEN_PATH: &str = "/oauth2/token";

/// Current-user endpoint path, called with the bearer access token
pub const CURRENT_USER_PATH: &str = "/users/@me";

/// OAuth scopes requested during authorization.
/// `identify` grants the user id, `email` the verified address.
pub const SCOPES: &str = "identify email";
