use std::sync::Arc;

use tracing::debug;

use super::location::{normalize_path, Location};
use super::routes::Route;
use crate::auth::SessionStore;

pub const LOGIN_PATH: &str = "/login";
pub const HOME_PATH: &str = "/";

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GuardDecision {
    Allow,
    Redirect(Location),
}

/// Gates navigation on session state.
pub struct NavigationGuard {
    session: Arc<SessionStore>,
    login_path: String,
    home_path: String,
}

impl NavigationGuard {
    pub fn new(session: Arc<SessionStore>) -> Self {
        Self::with_paths(session, LOGIN_PATH, HOME_PATH)
    }

    pub fn with_paths(session: Arc<SessionStore>, login_path: &str, home_path: &str) -> Self {
        Self {
            session,
            login_path: normalize_path(login_path),
            home_path: normalize_path(home_path),
        }
    }

    pub fn login_path(&self) -> &str {
        &self.login_path
    }

    pub fn home_path(&self) -> &str {
        &self.home_path
    }

    /// Decide whether navigation to `to` (matched as `route`) may proceed.
    ///
    /// Protected routes need an authenticated, unexpired session; otherwise
    /// the session is cleared and the user is sent to login with `next` set
    /// to the requested full path. A signed-in user asking for the login page
    /// is sent home instead.
    pub fn before_each(&self, to: &Location, route: &Route) -> GuardDecision {
        let signed_in = self.session.is_authed() && !self.session.is_expired();

        if route.requires_auth && !signed_in {
            debug!(to = %to, "Protected route without a valid session");
            self.session.logout();
            let login = Location::new(self.login_path.as_str()).with_query("next", to.full_path());
            return GuardDecision::Redirect(login);
        }

        if to.path == self.login_path && signed_in {
            debug!("Already signed in, leaving login page");
            return GuardDecision::Redirect(Location::new(self.home_path.as_str()));
        }

        GuardDecision::Allow
    }
}
