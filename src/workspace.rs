//! View controller for the document workspace.
//!
//! Owns the screen state machine and dispatches user intents to the session,
//! document, upload and log stores. Rendering is the caller's concern: the
//! visible surface is fully determined by [`Workspace::screen`] plus the
//! store accessors.

use std::path::PathBuf;

use tracing::debug;

use crate::api::ApiClient;
use crate::documents::DocumentStore;
use crate::error::Error;
use crate::logs::{LogViewer, LOGS_FORBIDDEN};
use crate::models::{Identity, NamedBlob, PendingUpload, Role};
use crate::session::SessionStore;
use crate::upload::UploadCoordinator;

/// Which authentication form is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthMode {
    Login,
    Register,
}

/// Which modal surface is open over the workspace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Modal {
    None,
    Detail,
    Upload,
    Logs,
}

/// Top-level screen state.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Screen {
    Unauthenticated { mode: AuthMode },
    Workspace { modal: Modal },
}

/// The single user-visible message produced by the last operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Error(String),
    Info(String),
}

pub struct Workspace {
    session: SessionStore,
    documents: DocumentStore,
    upload: UploadCoordinator,
    logs: LogViewer,
    screen: Screen,
    notice: Option<Notice>,
}

impl Workspace {
    /// Build a workspace whose stores all share one credential cell.
    pub fn new(api: ApiClient, token_path: PathBuf) -> Self {
        Self {
            session: SessionStore::new(api.clone(), token_path),
            documents: DocumentStore::new(api.clone()),
            upload: UploadCoordinator::new(api.clone()),
            logs: LogViewer::new(api),
            screen: Screen::Unauthenticated {
                mode: AuthMode::Login,
            },
            notice: None,
        }
    }

    pub fn screen(&self) -> Screen {
        self.screen
    }

    pub fn notice(&self) -> Option<&Notice> {
        self.notice.as_ref()
    }

    pub fn take_notice(&mut self) -> Option<Notice> {
        self.notice.take()
    }

    pub fn identity(&self) -> Option<&Identity> {
        self.session.identity()
    }

    pub fn documents(&self) -> &DocumentStore {
        &self.documents
    }

    pub fn upload(&self) -> &UploadCoordinator {
        &self.upload
    }

    pub fn logs(&self) -> &LogViewer {
        &self.logs
    }

    /// Whether the log-view action should be offered at all.
    pub fn can_view_logs(&self) -> bool {
        self.session
            .identity()
            .is_some_and(|identity| identity.role.can_view_logs())
    }

    /// Restore a persisted session at startup. With no stored credential the
    /// login form shows; otherwise the identity is resolved eagerly and the
    /// workspace opens only on success.
    pub async fn start(&mut self) {
        if !self.session.restore() {
            self.screen = Screen::Unauthenticated {
                mode: AuthMode::Login,
            };
            return;
        }
        match self.session.refresh_identity().await {
            Ok(_) => {
                self.screen = Screen::Workspace { modal: Modal::None };
                if let Err(e) = self.documents.list_all().await {
                    self.fail(e);
                }
            }
            Err(_) => {
                // The session store already cleared itself.
                self.reset_stores();
                self.screen = Screen::Unauthenticated {
                    mode: AuthMode::Login,
                };
            }
        }
    }

    pub async fn login(&mut self, username: &str, password: &str) {
        self.notice = None;
        match self.session.login(username, password).await {
            Ok(_) => {
                self.screen = Screen::Workspace { modal: Modal::None };
                if let Err(e) = self.documents.list_all().await {
                    self.fail(e);
                }
            }
            Err(e) => self.fail(e),
        }
    }

    /// Register a new account. Success switches back to the login form; it
    /// never authenticates directly.
    pub async fn register(
        &mut self,
        username: &str,
        password: &str,
        confirm_password: &str,
        role: Role,
        email: Option<&str>,
    ) {
        self.notice = None;
        match self
            .session
            .register(username, password, confirm_password, role, email)
            .await
        {
            Ok(()) => {
                self.screen = Screen::Unauthenticated {
                    mode: AuthMode::Login,
                };
                self.notice = Some(Notice::Info(
                    "Registration successful! Please log in.".to_string(),
                ));
            }
            Err(e) => self.fail(e),
        }
    }

    /// Switch between the login and register forms.
    pub fn switch_mode(&mut self, mode: AuthMode) {
        if let Screen::Unauthenticated { .. } = self.screen {
            self.screen = Screen::Unauthenticated { mode };
            self.notice = None;
        }
    }

    pub fn logout(&mut self) {
        self.session.logout();
        self.reset_stores();
        self.screen = Screen::Unauthenticated {
            mode: AuthMode::Login,
        };
        self.notice = None;
    }

    pub async fn refresh_documents(&mut self) {
        self.notice = None;
        if let Err(e) = self.documents.list_all().await {
            self.fail(e);
        }
    }

    pub async fn search(&mut self, query: &str) {
        self.notice = None;
        if let Err(e) = self.documents.search(query).await {
            self.fail(e);
        }
    }

    /// Fetch detail for one document and open the detail modal. On failure
    /// the previous selection and modal state stay as they were.
    pub async fn view_document(&mut self, docid: i64) {
        self.notice = None;
        match self.documents.fetch_detail(docid).await {
            Ok(()) => self.screen = Screen::Workspace { modal: Modal::Detail },
            Err(e) => self.fail(e),
        }
    }

    /// Download one document's content. The result goes to the caller; the
    /// stores are left untouched.
    pub async fn download(&mut self, docid: i64) -> Option<NamedBlob> {
        self.notice = None;
        match self.documents.download(docid).await {
            Ok(blob) => Some(blob),
            Err(e) => {
                self.fail(e);
                None
            }
        }
    }

    pub fn open_upload(&mut self) {
        if let Screen::Workspace { .. } = self.screen {
            self.screen = Screen::Workspace {
                modal: Modal::Upload,
            };
            self.notice = None;
        }
    }

    pub fn select_file(&mut self, upload: PendingUpload) {
        self.upload.select_file(upload);
    }

    /// Submit the staged upload. A completed upload closes the modal and
    /// refreshes the collection; a submit racing an in-flight upload is
    /// ignored.
    pub async fn submit_upload(&mut self) {
        self.notice = None;
        match self.upload.submit().await {
            Ok(true) => {
                self.screen = Screen::Workspace { modal: Modal::None };
                self.notice = Some(Notice::Info(
                    "Document uploaded successfully!".to_string(),
                ));
                if let Err(e) = self.documents.list_all().await {
                    self.fail(e);
                }
            }
            Ok(false) => {}
            Err(e) => self.fail(e),
        }
    }

    /// Fetch the access logs and open the logs modal. Ineligible roles are
    /// refused locally; the log viewer is never reached for them.
    pub async fn open_logs(&mut self) {
        self.notice = None;
        let Some(role) = self.session.identity().map(|identity| identity.role) else {
            self.fail(Error::Unauthorized);
            return;
        };
        if !role.can_view_logs() {
            self.fail(Error::Forbidden(LOGS_FORBIDDEN.to_string()));
            return;
        }
        match self.logs.load(role).await {
            Ok(()) => self.screen = Screen::Workspace { modal: Modal::Logs },
            Err(e) => self.fail(e),
        }
    }

    /// Close whichever modal is open. Closing the upload modal drops the
    /// staged file.
    pub fn close_modal(&mut self) {
        if let Screen::Workspace { modal } = self.screen {
            if modal == Modal::Upload {
                self.upload.clear();
            }
            self.screen = Screen::Workspace { modal: Modal::None };
        }
    }

    fn reset_stores(&mut self) {
        self.documents.reset();
        self.logs.reset();
        self.upload.clear();
    }

    /// Route an operation failure into the single user-visible notice. An
    /// unauthorized response from any endpoint invalidates the whole
    /// session; every other failure leaves caches in last-known-good state.
    fn fail(&mut self, error: Error) {
        debug!("operation failed: {error}");
        let message = error.user_message();
        if matches!(error, Error::Unauthorized) {
            self.session.logout();
            self.reset_stores();
            self.screen = Screen::Unauthenticated {
                mode: AuthMode::Login,
            };
        }
        self.notice = Some(Notice::Error(message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Async flows are covered by the integration tests; these exercise the
    // synchronous screen transitions.

    fn workspace() -> Workspace {
        let api = ApiClient::with_transport(
            "http://svc.test",
            std::sync::Arc::new(crate::api::testing::FakeTransport::default()),
        );
        let dir = std::env::temp_dir().join("docdesk-workspace-unit");
        Workspace::new(api, dir.join("token"))
    }

    #[test]
    fn starts_on_the_login_form() {
        let workspace = workspace();
        assert_eq!(
            workspace.screen(),
            Screen::Unauthenticated {
                mode: AuthMode::Login
            }
        );
    }

    #[test]
    fn switch_mode_only_applies_while_unauthenticated() {
        let mut workspace = workspace();
        workspace.switch_mode(AuthMode::Register);
        assert_eq!(
            workspace.screen(),
            Screen::Unauthenticated {
                mode: AuthMode::Register
            }
        );

        workspace.screen = Screen::Workspace { modal: Modal::None };
        workspace.switch_mode(AuthMode::Register);
        assert_eq!(workspace.screen(), Screen::Workspace { modal: Modal::None });
    }

    #[test]
    fn upload_modal_cannot_open_before_login() {
        let mut workspace = workspace();
        workspace.open_upload();
        assert_eq!(
            workspace.screen(),
            Screen::Unauthenticated {
                mode: AuthMode::Login
            }
        );
    }

    #[test]
    fn closing_the_upload_modal_drops_the_staged_file() {
        let mut workspace = workspace();
        workspace.screen = Screen::Workspace { modal: Modal::None };
        workspace.open_upload();
        workspace.select_file(PendingUpload::new("a.txt", b"x".to_vec()));
        workspace.close_modal();

        assert_eq!(workspace.screen(), Screen::Workspace { modal: Modal::None });
        assert!(workspace.upload().pending().is_none());
    }

    #[test]
    fn logs_are_not_offered_without_an_identity() {
        let workspace = workspace();
        assert!(!workspace.can_view_logs());
    }
}
