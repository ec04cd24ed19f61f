use std::sync::{Mutex, MutexGuard, PoisonError};

use thiserror::Error;
use tracing::debug;

use super::guard::{GuardDecision, NavigationGuard};
use super::location::Location;
use super::routes::RouteTable;

/// Redirects followed within a single navigation before giving up.
pub const MAX_REDIRECTS: usize = 10;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum NavigationError {
    #[error("No route matches {0}")]
    NotFound(String),

    #[error("Too many redirects while navigating to {0}")]
    RedirectLoop(String),
}

/// Route table + guard + history stack.
pub struct Router {
    routes: RouteTable,
    guard: NavigationGuard,
    history: Mutex<Vec<Location>>,
}

impl Router {
    /// Starts at the home path without consulting the guard.
    pub fn new(routes: RouteTable, guard: NavigationGuard) -> Self {
        let start = Location::new(guard.home_path());
        Self {
            routes,
            guard,
            history: Mutex::new(vec![start]),
        }
    }

    fn history_lock(&self) -> MutexGuard<'_, Vec<Location>> {
        self.history.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    pub fn login_path(&self) -> &str {
        self.guard.login_path()
    }

    pub fn current(&self) -> Location {
        self.history_lock().last().cloned().unwrap_or_default()
    }

    pub fn history(&self) -> Vec<Location> {
        self.history_lock().clone()
    }

    /// Navigate and record a new history entry.
    pub fn push(&self, to: impl Into<Location>) -> Result<Location, NavigationError> {
        let resolved = self.resolve(to.into())?;
        self.history_lock().push(resolved.clone());
        Ok(resolved)
    }

    /// Navigate, overwriting the current history entry.
    pub fn replace(&self, to: impl Into<Location>) -> Result<Location, NavigationError> {
        let resolved = self.resolve(to.into())?;
        let mut history = self.history_lock();
        history.pop();
        history.push(resolved.clone());
        Ok(resolved)
    }

    /// Follow record redirects and guard decisions to the final location.
    pub fn resolve(&self, to: Location) -> Result<Location, NavigationError> {
        let requested = to.full_path();
        let mut target = to;

        for _ in 0..=MAX_REDIRECTS {
            let route = self
                .routes
                .resolve(&target.path)
                .ok_or_else(|| NavigationError::NotFound(target.path.clone()))?;

            if let Some(redirect) = &route.redirect {
                debug!(from = %target, to = %redirect, "Route redirect");
                target = Location::parse(redirect);
                continue;
            }

            match self.guard.before_each(&target, route) {
                GuardDecision::Allow => return Ok(target),
                GuardDecision::Redirect(next) => {
                    debug!(from = %target, to = %next, "Guard redirect");
                    target = next;
                }
            }
        }

        Err(NavigationError::RedirectLoop(requested))
    }
}
