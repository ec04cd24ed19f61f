//! API client for the application backend.
//!
//! Every request carries `Authorization: Bearer <token>` when a session
//! token exists. A 401 from any endpoint clears the session and, when a
//! router is attached, replaces the current location with the login page.

use std::sync::Arc;
use std::time::Duration;

use reqwest::{header, Client, Response};
use serde::{de::DeserializeOwned, Serialize};
use tracing::{debug, info, warn};

use super::ApiError;
use crate::auth::{Authenticator, SessionStore};
use crate::models::{LoginRequest, LoginResponse, UnreadCount};
use crate::router::{Location, Router};

/// HTTP request timeout in seconds.
pub const DEFAULT_TIMEOUT_SECS: u64 = 30;

const LOGIN_ENDPOINT: &str = "/auth/login";
const UNREAD_COUNT_ENDPOINT: &str = "/mail/unread-count";

/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: String,
    session: Arc<SessionStore>,
    router: Option<Arc<Router>>,
}

impl ApiClient {
    pub fn new(base_url: &str, session: Arc<SessionStore>) -> Result<Self, ApiError> {
        Self::with_timeout(base_url, session, Duration::from_secs(DEFAULT_TIMEOUT_SECS))
    }

    pub fn with_timeout(
        base_url: &str,
        session: Arc<SessionStore>,
        timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            session,
            router: None,
        })
    }

    /// Attach the router that 401 responses should redirect.
    pub fn with_router(mut self, router: Arc<Router>) -> Self {
        self.router = Some(router);
        self
    }

    pub fn session(&self) -> &Arc<SessionStore> {
        &self.session
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.base_url, path.trim_start_matches('/'))
    }

    fn auth_headers(&self) -> header::HeaderMap {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = self.session.token() {
            match header::HeaderValue::from_str(&format!("Bearer {}", token)) {
                Ok(value) => {
                    headers.insert(header::AUTHORIZATION, value);
                }
                Err(_) => warn!("Session token is not a valid header value, sending request without it"),
            }
        }
        headers
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(&self, response: Response) -> Result<Response, ApiError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        if status == reqwest::StatusCode::UNAUTHORIZED {
            self.handle_unauthorized();
        }
        Err(ApiError::from_status(status, &body))
    }

    fn handle_unauthorized(&self) {
        info!("Received 401, clearing session");
        self.session.logout();

        let Some(router) = &self.router else {
            return;
        };
        let current = router.current();
        if current.path == router.login_path() {
            return;
        }

        let target = Location::new(router.login_path()).with_query("next", current.full_path());
        if let Err(e) = router.replace(target) {
            warn!(error = %e, "Failed to redirect to login");
        }
    }

    async fn parse<T: DeserializeOwned>(response: Response, url: &str) -> Result<T, ApiError> {
        let text = response.text().await?;
        serde_json::from_str(&text).map_err(|e| {
            ApiError::InvalidResponse(format!("Failed to parse JSON response from {}: {}", url, e))
        })
    }

    pub async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "GET");

        let response = self
            .client
            .get(&url)
            .headers(self.auth_headers())
            .send()
            .await?;

        let response = self.check_response(response).await?;
        Self::parse(response, &url).await
    }

    pub async fn post<T: DeserializeOwned, B: Serialize + ?Sized>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError> {
        let url = self.url(path);
        debug!(url = %url, "POST");

        let response = self
            .client
            .post(&url)
            .headers(self.auth_headers())
            .json(body)
            .send()
            .await?;

        let response = self.check_response(response).await?;
        Self::parse(response, &url).await
    }

    pub async fn fetch_unread_count(&self) -> Result<UnreadCount, ApiError> {
        self.get(UNREAD_COUNT_ENDPOINT).await
    }
}

impl Authenticator for ApiClient {
    async fn authenticate(&self, request: &LoginRequest) -> Result<LoginResponse, ApiError> {
        self.post(LOGIN_ENDPOINT, request).await
    }
}
