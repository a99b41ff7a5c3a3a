//! OAuth state generation and authorization URL construction
//!
//! The state value binds an authorization request to its callback and
//! mitigates cross-site request forgery. It is minted per login attempt,
//! stored alongside the caller token, and consumed exactly once when the
//! provider redirects back.

use rand::RngExt;

use crate::constants::{AUTHORIZE_PATH, SCOPES};

/// Generate a cryptographically random state value.
///
/// Produces 7 random bytes hex-encoded, so every state is exactly 14
/// lowercase hex characters. The value is opaque to Discord; it only has to
/// be unpredictable and unique for the lifetime of one login round trip.
pub fn generate_state() -> String {
    let mut bytes = [0u8; 7];
    rand::rng().fill(&mut bytes);
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Build the full authorization URL with all required OAuth parameters.
///
/// `api_base` is Discord's API base (or a mock in tests). The authorization
/// server returns `state` unchanged in the callback query string.
pub fn build_authorization_url(
    api_base: &str,
    client_id: &str,
    redirect_uri: &str,
    state: &str,
) -> String {
    format!(
        "{}{}?client_id={}&redirect_uri={}&response_type=code&scope={}&state={}",
        api_base,
        AUTHORIZE_PATH,
        client_id,
        urlencoded(redirect_uri),
        SCOPES.replace(' ', "+"),
        state,
    )
}

/// Minimal URL encoding for parameter values.
/// Only encodes characters that would break URL parameter parsing.
fn urlencoded(s: &str) -> String {
    s.replace(':', "%3A").replace('/', "%2F")
}
