//! Current-user lookup
//!
//! GETs Discord's `/users/@me` with the freshly exchanged bearer token.
//! Only the user id is persisted; the rest of the profile is ignored.

use serde::Deserialize;

use crate::constants::CURRENT_USER_PATH;
use crate::error::{Error, Result};

/// The authenticated Discord user, as returned by `/users/@me`.
#[derive(Debug, Deserialize)]
pub struct DiscordUser {
    /// Discord snowflake id, serialized as a string
    pub id: String,
}

/// Fetch the authenticated user using the bearer access token.
pub async fn fetch_current_user(
    client: &reqwest::Client,
    api_base: &str,
    access_token: &str,
) -> Result<DiscordUser> {
    let response = client
        .get(format!("{api_base}{CURRENT_USER_PATH}"))
        .bearer_auth(access_token)
        .send()
        .await
        .map_err(|e| Error::Http(format!("user fetch request failed: {e}")))?;

    let status = response.status();
    if !status.is_success() {
        let body = response
            .text()
            .await
            .unwrap_or_else(|_| String::from("<no body>"));
        return Err(Error::UserFetch(format!(
            "user endpoint returned {status}: {body}"
        )));
    }

    response
        .json::<DiscordUser>()
        .await
        .map_err(|e| Error::UserFetch(format!("invalid user response: {e}")))
}
