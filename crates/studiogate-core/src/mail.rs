//! Unread mail counter shown in the main layout.

use tracing::error;

use crate::api::ApiClient;

pub const UNREAD_ERROR_MESSAGE: &str = "Failed to fetch unread mail count";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailStore {
    pub unread: u32,
    pub loading: bool,
    pub error: Option<String>,
}

impl MailStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn has_unread(&self) -> bool {
        self.unread > 0
    }

    /// Refresh the counter. Failures are recorded in `error`, never returned.
    pub async fn fetch_unread(&mut self, api: &ApiClient) {
        self.loading = true;
        self.error = None;

        match api.fetch_unread_count().await {
            Ok(count) => self.unread = count.unread,
            Err(e) => {
                error!(error = %e, "Mail store error");
                self.error = Some(UNREAD_ERROR_MESSAGE.to_string());
            }
        }

        self.loading = false;
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_has_unread_and_reset() {
        let mut store = MailStore {
            unread: 3,
            loading: true,
            error: Some("x".into()),
        };
        assert!(store.has_unread());
        store.reset();
        assert_eq!(store, MailStore::new());
        assert!(!store.has_unread());
    }
}
