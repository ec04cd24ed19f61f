//! Client-side routing: locations, the route table and the navigation guard.
//!
//! Every navigation resolves the target against the `RouteTable`, follows
//! record redirects (e.g. the catch-all), then asks the `NavigationGuard`
//! whether the session may enter. The guard can bounce the navigation to
//! the login page or away from it.

pub mod guard;
pub mod location;
pub mod navigator;
pub mod routes;

pub use guard::{GuardDecision, NavigationGuard, HOME_PATH, LOGIN_PATH};
pub use location::Location;
pub use navigator::{NavigationError, Router, MAX_REDIRECTS};
pub use routes::{Route, RouteRecord, RouteTable};
