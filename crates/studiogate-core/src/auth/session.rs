use std::future::Future;
use std::sync::{Mutex, MutexGuard, PoisonError};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tracing::{debug, info, warn};

use super::claims::token_expired_at;
use crate::api::ApiError;
use crate::models::{LoginRequest, LoginResponse, UserRef};
use crate::storage::{Storage, StorageError};

/// Storage key holding the serialized session
pub const SESSION_STORAGE_KEY: &str = "auth";

/// Persisted session shape: `{"token": "...", "user": {...} | null}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub user: Option<UserRef>,
}

impl Session {
    pub fn is_authed(&self) -> bool {
        !self.token.is_empty() && self.user.is_some()
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        token_expired_at(&self.token, now)
    }

    /// A user without a token is not a session.
    fn normalized(mut self) -> Self {
        if self.token.is_empty() {
            self.user = None;
        }
        self
    }
}

/// Authentication state published to subscribers after every change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AuthState {
    Anonymous,
    Authenticated { user: UserRef },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginOutcome {
    Applied,
    /// A later login started before this one finished; its response was dropped.
    Superseded,
}

/// Anything that can exchange credentials for a token.
pub trait Authenticator {
    fn authenticate(
        &self,
        request: &LoginRequest,
    ) -> impl Future<Output = Result<LoginResponse, ApiError>> + Send;
}

struct Inner {
    session: Session,
    login_generation: u64,
}

/// Single source of truth for authentication state.
///
/// Shared as `Arc<SessionStore>` between the router and the API client.
/// Token and user are always replaced or cleared together under one lock.
pub struct SessionStore {
    storage: Box<dyn Storage>,
    inner: Mutex<Inner>,
    changes: watch::Sender<AuthState>,
}

impl SessionStore {
    pub fn new(storage: impl Storage + 'static) -> Self {
        let (changes, _) = watch::channel(AuthState::Anonymous);
        Self {
            storage: Box::new(storage),
            inner: Mutex::new(Inner {
                session: Session::default(),
                login_generation: 0,
            }),
            changes,
        }
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Restore the persisted session, dropping it right away if expired.
    ///
    /// A storage read error counts as no session, and the follow-up logout
    /// removes the stored copy. A locked keychain or a wrong passphrase
    /// therefore costs the user their saved session.
    pub fn init(&self) {
        let restored = self.load_persisted();
        self.lock().session = restored;

        if self.is_expired() {
            debug!("No usable persisted session");
            self.logout();
        } else {
            if let Some(user) = self.user() {
                info!(user_id = user.id, "Restored session");
            }
            self.publish();
        }
    }

    fn load_persisted(&self) -> Session {
        match self.storage.get(SESSION_STORAGE_KEY) {
            Ok(Some(raw)) => match serde_json::from_str::<Session>(&raw) {
                Ok(session) => session.normalized(),
                Err(e) => {
                    warn!(error = %e, "Ignoring unparsable persisted session");
                    Session::default()
                }
            },
            Ok(None) => Session::default(),
            Err(e) => {
                warn!(error = %e, "Failed to read persisted session");
                Session::default()
            }
        }
    }

    pub fn is_authed(&self) -> bool {
        self.lock().session.is_authed()
    }

    pub fn is_expired(&self) -> bool {
        self.is_expired_at(Utc::now())
    }

    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        self.lock().session.is_expired_at(now)
    }

    /// Current token, if any
    pub fn token(&self) -> Option<String> {
        let inner = self.lock();
        (!inner.session.token.is_empty()).then(|| inner.session.token.clone())
    }

    pub fn user(&self) -> Option<UserRef> {
        self.lock().session.user.clone()
    }

    pub fn snapshot(&self) -> Session {
        self.lock().session.clone()
    }

    pub fn subscribe(&self) -> watch::Receiver<AuthState> {
        self.changes.subscribe()
    }

    /// Exchange credentials for a session and persist it.
    ///
    /// Endpoint errors come back untouched. If another login starts while
    /// this one is in flight, only the newest response is applied.
    pub async fn login<A: Authenticator>(
        &self,
        api: &A,
        email: &str,
        password: &str,
    ) -> Result<LoginOutcome, ApiError> {
        let ticket = {
            let mut inner = self.lock();
            inner.login_generation += 1;
            inner.login_generation
        };

        let request = LoginRequest {
            email: email.to_string(),
            password: password.to_string(),
        };
        let response = api.authenticate(&request).await?;

        {
            let mut inner = self.lock();
            if inner.login_generation != ticket {
                debug!(ticket, current = inner.login_generation, "Discarding stale login response");
                return Ok(LoginOutcome::Superseded);
            }
            inner.session = Session {
                token: response.access_token,
                user: Some(response.user),
            };
        }

        if let Err(e) = self.persist() {
            warn!(error = %e, "Failed to persist session");
        }
        if let Some(user) = self.user() {
            info!(user_id = user.id, "Logged in");
        }
        self.publish();
        Ok(LoginOutcome::Applied)
    }

    /// Clear the session in memory and in storage. Safe to repeat.
    pub fn logout(&self) {
        let was_authed = {
            let mut inner = self.lock();
            let was_authed = inner.session.is_authed();
            inner.session = Session::default();
            was_authed
        };

        if let Err(e) = self.storage.remove(SESSION_STORAGE_KEY) {
            warn!(error = %e, "Failed to remove persisted session");
        }
        if was_authed {
            info!("Logged out");
        }
        self.publish();
    }

    /// Write the current session to storage, replacing any previous copy.
    pub fn persist(&self) -> Result<(), StorageError> {
        let session = self.snapshot();
        let raw = serde_json::to_string(&session)
            .map_err(|e| StorageError::Corrupt(e.to_string()))?;
        self.storage.set(SESSION_STORAGE_KEY, &raw)
    }

    fn publish(&self) {
        let state = match self.user() {
            Some(user) if self.is_authed() => AuthState::Authenticated { user },
            _ => AuthState::Anonymous,
        };
        self.changes.send_if_modified(|current| {
            if *current == state {
                false
            } else {
                *current = state;
                true
            }
        });
    }
}
