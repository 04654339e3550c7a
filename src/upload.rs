//! Upload coordinator: the lifecycle of a single in-flight upload.
//!
//! At most one file is staged at a time and at most one upload request is
//! outstanding. A failed submission keeps the selection so the user can
//! retry.

use tracing::{debug, info};

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::models::PendingUpload;

/// Where the coordinator is in the upload lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UploadState {
    Idle,
    FileSelected,
    Submitting,
}

pub struct UploadCoordinator {
    api: ApiClient,
    state: UploadState,
    pending: Option<PendingUpload>,
}

impl UploadCoordinator {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            state: UploadState::Idle,
            pending: None,
        }
    }

    pub fn state(&self) -> UploadState {
        self.state
    }

    pub fn pending(&self) -> Option<&PendingUpload> {
        self.pending.as_ref()
    }

    /// Stage a file, replacing any earlier selection. Ignored while an
    /// upload is in flight.
    pub fn select_file(&mut self, upload: PendingUpload) {
        if self.state == UploadState::Submitting {
            debug!("ignoring file selection while an upload is in flight");
            return;
        }
        debug!(filename = %upload.filename, "file selected for upload");
        self.pending = Some(upload);
        self.state = UploadState::FileSelected;
    }

    /// Submit the staged file. Returns `true` when an upload completed.
    ///
    /// A submit while another upload is in flight is ignored, not queued;
    /// a submit with nothing staged fails validation without any request.
    pub async fn submit(&mut self) -> Result<bool> {
        match self.state {
            UploadState::Submitting => {
                debug!("upload already in flight, ignoring submit");
                return Ok(false);
            }
            UploadState::Idle => {
                return Err(Error::Validation(
                    "Please select a file to upload.".to_string(),
                ));
            }
            UploadState::FileSelected => {}
        }
        let Some(ref file) = self.pending else {
            return Err(Error::Validation(
                "Please select a file to upload.".to_string(),
            ));
        };

        self.state = UploadState::Submitting;
        let result = self.api.upload(file).await;
        match result {
            Ok(()) => {
                info!(filename = %file.filename, "upload complete");
                self.state = UploadState::Idle;
                self.pending = None;
                Ok(true)
            }
            Err(e) => {
                // Selection is kept so the user can retry.
                self.state = UploadState::FileSelected;
                Err(e)
            }
        }
    }

    /// Drop the selection (the upload surface was closed without
    /// submitting). An in-flight upload is left alone.
    pub fn clear(&mut self) {
        if self.state == UploadState::Submitting {
            return;
        }
        self.state = UploadState::Idle;
        self.pending = None;
    }
}
