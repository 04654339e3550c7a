//! Access-log viewer, gated by role.

use tracing::debug;

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::models::{AccessLogEntry, Role};

/// Message shown when a role outside {HR, Admin} reaches for the logs.
pub const LOGS_FORBIDDEN: &str = "Access logs are restricted to HR and Admin roles.";

pub struct LogViewer {
    api: ApiClient,
    entries: Vec<AccessLogEntry>,
}

impl LogViewer {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            entries: Vec::new(),
        }
    }

    pub fn entries(&self) -> &[AccessLogEntry] {
        &self.entries
    }

    /// Fetch the full log collection, replacing any prior entries. Only HR
    /// and Admin may read logs; other roles are refused without a request.
    pub async fn load(&mut self, role: Role) -> Result<()> {
        if !role.can_view_logs() {
            return Err(Error::Forbidden(LOGS_FORBIDDEN.to_string()));
        }
        let entries = self.api.logs().await?;
        debug!(count = entries.len(), "access logs loaded");
        self.entries = entries;
        Ok(())
    }

    pub fn reset(&mut self) {
        self.entries.clear();
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::api::testing::FakeTransport;
    use crate::models::Credential;

    fn viewer(transport: Arc<FakeTransport>) -> LogViewer {
        let api = ApiClient::with_transport("http://svc.test", transport);
        api.credential().set(Credential::new("T1"));
        LogViewer::new(api)
    }

    fn entry(log_id: i64, action: &str) -> serde_json::Value {
        json!({
            "log_id": log_id,
            "action": action,
            "user_uuid": "u-1",
            "doc_uuid": null,
            "timestamp": "2025-11-02T09:30:00"
        })
    }

    #[tokio::test]
    async fn ineligible_roles_are_refused_without_a_request() {
        let transport = Arc::new(FakeTransport::default());
        let mut viewer = viewer(transport.clone());

        for role in [Role::Finance, Role::Legal] {
            let err = viewer.load(role).await.unwrap_err();
            assert!(matches!(err, Error::Forbidden(_)));
        }
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn load_replaces_prior_entries_wholesale() {
        let transport = Arc::new(FakeTransport::default());
        transport.push_json(200, json!([entry(1, "login"), entry(2, "upload")]));
        transport.push_json(200, json!([entry(3, "download")]));
        let mut viewer = viewer(transport);

        viewer.load(Role::Hr).await.unwrap();
        assert_eq!(viewer.entries().len(), 2);

        viewer.load(Role::Admin).await.unwrap();
        assert_eq!(viewer.entries().len(), 1);
        assert_eq!(viewer.entries()[0].log_id, 3);
    }

    #[tokio::test]
    async fn failed_load_keeps_prior_entries() {
        let transport = Arc::new(FakeTransport::default());
        transport.push_json(200, json!([entry(1, "login")]));
        transport.push_network_error("connection reset");
        let mut viewer = viewer(transport);

        viewer.load(Role::Hr).await.unwrap();
        let err = viewer.load(Role::Hr).await.unwrap_err();
        assert!(matches!(err, Error::Network(_)));
        assert_eq!(viewer.entries().len(), 1);
    }
}
