//! Discord OAuth login library
//!
//! Provides state generation, authorization URL construction, token exchange,
//! user lookup, and the JSON-file session store for the Discord login relay.
//! This crate is a standalone library with no dependency on the relay binary —
//! it can be tested and used independently.
//!
//! Login flow:
//! 1. Relay calls `state::generate_state()` and records it via
//!    `store::SessionStore::insert_state()`
//! 2. User authorizes via `state::build_authorization_url()`
//! 3. Relay consumes the state with `store::SessionStore::take_state()`
//! 4. Relay calls `token::exchange_code()` with the authorization code
//! 5. Relay calls `user::fetch_current_user()` with the access token
//! 6. Credential stored via `store::SessionStore::insert_credential()`

pub mod constants;
pub mod error;
pub mod state;
pub mod store;
pub mod token;
pub mod user;

pub use constants::*;
pub use error::{Error, Result};
pub use state::{build_authorization_url, generate_state};
pub use store::{Credential, SessionStore};
pub use token::{TokenResponse, exchange_code};
pub use user::{DiscordUser, fetch_current_user};
