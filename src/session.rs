//! Session store: credential lifecycle and authenticated identity.
//!
//! The bearer credential is the only state surviving a process restart. It is
//! persisted as a single token file under the data directory, written on
//! login and removed on logout.

use std::fs;
use std::io::ErrorKind;
use std::path::PathBuf;

use tracing::{debug, info, warn};

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::models::{Credential, Identity, Role};

pub struct SessionStore {
    api: ApiClient,
    token_path: PathBuf,
    identity: Option<Identity>,
}

impl SessionStore {
    pub fn new(api: ApiClient, token_path: PathBuf) -> Self {
        Self {
            api,
            token_path,
            identity: None,
        }
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.identity.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.identity.is_some() && self.api.credential().is_set()
    }

    /// Restore a persisted credential from the token file, if one exists.
    ///
    /// Restoring does not authenticate by itself; callers follow up with
    /// [`refresh_identity`](Self::refresh_identity).
    pub fn restore(&mut self) -> bool {
        let Ok(token) = fs::read_to_string(&self.token_path) else {
            return false;
        };
        let token = token.trim();
        if token.is_empty() {
            return false;
        }
        self.api.credential().set(Credential::new(token));
        debug!("restored persisted credential");
        true
    }

    /// Exchange a username and password for a credential, persist it and
    /// resolve the identity behind it.
    pub async fn login(&mut self, username: &str, password: &str) -> Result<Identity> {
        if username.is_empty() || password.is_empty() {
            return Err(Error::Validation(
                "Username and password are required.".to_string(),
            ));
        }
        let credential = self.api.login(username, password).await?;
        self.api.credential().set(credential.clone());
        self.persist(&credential);
        self.refresh_identity().await
    }

    /// Register a new account. Success does not authenticate; the caller is
    /// expected to switch to the login flow.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        confirm_password: &str,
        role: Role,
        email: Option<&str>,
    ) -> Result<()> {
        if username.is_empty() || password.is_empty() || confirm_password.is_empty() {
            return Err(Error::Validation(
                "Username and password are required.".to_string(),
            ));
        }
        if password != confirm_password {
            return Err(Error::Validation("Passwords do not match".to_string()));
        }
        self.api.register(username, password, role, email).await
    }

    /// Resolve the identity behind the current credential.
    ///
    /// Any failure here, network errors included, invalidates the session: a
    /// credential that cannot be resolved is treated as expired.
    pub async fn refresh_identity(&mut self) -> Result<Identity> {
        if !self.api.credential().is_set() {
            self.logout();
            return Err(Error::Unauthorized);
        }
        match self.api.me().await {
            Ok(identity) => {
                info!(username = %identity.username, role = %identity.role, "identity resolved");
                self.identity = Some(identity.clone());
                Ok(identity)
            }
            Err(e) => {
                debug!("identity refresh failed, clearing session: {e}");
                self.logout();
                Err(Error::Unauthorized)
            }
        }
    }

    /// Clear the credential and identity and drop the persisted token.
    /// Idempotent.
    pub fn logout(&mut self) {
        self.api.credential().clear();
        self.identity = None;
        match fs::remove_file(&self.token_path) {
            Ok(()) => debug!("removed persisted credential"),
            Err(e) if e.kind() == ErrorKind::NotFound => {}
            Err(e) => warn!("failed to remove persisted credential: {e}"),
        }
    }

    fn persist(&self, credential: &Credential) {
        if let Some(parent) = self.token_path.parent() {
            if let Err(e) = fs::create_dir_all(parent) {
                warn!("failed to create data directory: {e}");
                return;
            }
        }
        if let Err(e) = fs::write(&self.token_path, credential.as_str()) {
            warn!("failed to persist credential: {e}");
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::api::testing::FakeTransport;

    fn store(transport: Arc<FakeTransport>, dir: &tempfile::TempDir) -> SessionStore {
        let api = ApiClient::with_transport("http://svc.test", transport);
        SessionStore::new(api, dir.path().join("token"))
    }

    #[tokio::test]
    async fn login_with_empty_fields_issues_no_request() {
        let transport = Arc::new(FakeTransport::default());
        let dir = tempfile::tempdir().unwrap();
        let mut session = store(transport.clone(), &dir);

        let err = session.login("", "pw").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = session.login("alice", "").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn login_persists_credential_and_resolves_identity() {
        let transport = Arc::new(FakeTransport::default());
        transport.push_json(200, json!({"access_token": "T1", "token_type": "bearer"}));
        transport.push_json(200, json!({"username": "alice", "role": "HR"}));
        let dir = tempfile::tempdir().unwrap();
        let mut session = store(transport, &dir);

        let identity = session.login("alice", "pw123").await.unwrap();
        assert_eq!(identity.username, "alice");
        assert_eq!(identity.role, Role::Hr);
        assert!(session.is_authenticated());
        assert_eq!(fs::read_to_string(dir.path().join("token")).unwrap(), "T1");
    }

    #[tokio::test]
    async fn restore_round_trips_the_token_file() {
        let transport = Arc::new(FakeTransport::default());
        transport.push_json(200, json!({"access_token": "T1", "token_type": "bearer"}));
        transport.push_json(200, json!({"username": "alice", "role": "HR"}));
        let dir = tempfile::tempdir().unwrap();
        {
            let mut session = store(transport.clone(), &dir);
            session.login("alice", "pw123").await.unwrap();
        }

        // Fresh store, same directory: the credential comes back.
        let mut session = store(transport, &dir);
        assert!(session.restore());
    }

    #[tokio::test]
    async fn restore_without_token_file_is_a_noop() {
        let transport = Arc::new(FakeTransport::default());
        let dir = tempfile::tempdir().unwrap();
        let mut session = store(transport, &dir);
        assert!(!session.restore());
        assert!(!session.is_authenticated());
    }

    #[tokio::test]
    async fn register_with_mismatched_passwords_issues_no_request() {
        let transport = Arc::new(FakeTransport::default());
        let dir = tempfile::tempdir().unwrap();
        let session = store(transport.clone(), &dir);

        let err = session
            .register("bob", "a", "b", Role::Finance, None)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Validation(ref msg) if msg == "Passwords do not match"));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn identity_refresh_treats_network_failure_as_auth_failure() {
        let transport = Arc::new(FakeTransport::default());
        transport.push_json(200, json!({"access_token": "T1", "token_type": "bearer"}));
        transport.push_json(200, json!({"username": "alice", "role": "HR"}));
        let dir = tempfile::tempdir().unwrap();
        let mut session = store(transport.clone(), &dir);
        session.login("alice", "pw123").await.unwrap();

        transport.push_network_error("connection reset");
        let err = session.refresh_identity().await.unwrap_err();
        assert!(matches!(err, Error::Unauthorized));
        assert!(!session.is_authenticated());
        assert!(!dir.path().join("token").exists());
    }

    #[tokio::test]
    async fn logout_is_idempotent() {
        let transport = Arc::new(FakeTransport::default());
        let dir = tempfile::tempdir().unwrap();
        let mut session = store(transport, &dir);

        session.logout();
        session.logout();
        assert!(!session.is_authenticated());
    }
}
