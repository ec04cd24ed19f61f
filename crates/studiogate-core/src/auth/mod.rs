//! Authentication module for managing the client session.
//!
//! This module provides:
//! - `SessionStore`: token + user state with persistence and expiry checks
//! - `TokenClaims`: lazy, unverified decoding of the token payload
//!
//! Sessions are persisted under a single storage key and cleared as soon as
//! the token is found to be expired.

pub mod claims;
pub mod session;

pub use claims::{ClaimsError, Expiry, TokenClaims};
pub use session::{
    AuthState, Authenticator, LoginOutcome, Session, SessionStore, SESSION_STORAGE_KEY,
};
