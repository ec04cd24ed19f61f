//! Client-side session lifecycle for the studio front end.
//!
//! - `auth`: session store, token claims, login/logout
//! - `storage`: the storage port and its backends
//! - `api`: HTTP client that carries the bearer token and handles 401s
//! - `router`: route table, locations and the navigation guard
//! - `mail`: unread mail counter
//! - `context`: wires everything together for a front end

pub mod api;
pub mod auth;
pub mod config;
pub mod context;
pub mod mail;
pub mod models;
pub mod router;
pub mod storage;

pub use api::{ApiClient, ApiError};
pub use auth::{AuthState, LoginOutcome, Session, SessionStore};
pub use config::{Config, StorageBackend};
pub use context::AppContext;
pub use mail::MailStore;
pub use models::{LoginResponse, UnreadCount, UserRef};
pub use router::{Location, NavigationError, Router};
pub use storage::{Storage, StorageError};
