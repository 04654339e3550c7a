//! Domain types shared across the workspace stores.
//!
//! Wire shapes follow the document service's JSON responses; unknown fields
//! are ignored on deserialization.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

/// Opaque bearer token proving an authenticated session.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    // The token value must never reach logs.
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// Roles the service recognizes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Role {
    #[serde(rename = "HR")]
    Hr,
    Finance,
    Legal,
    Admin,
}

impl Role {
    /// Whether this role may read the access logs.
    pub fn can_view_logs(self) -> bool {
        matches!(self, Role::Hr | Role::Admin)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Role::Hr => "HR",
            Role::Finance => "Finance",
            Role::Legal => "Legal",
            Role::Admin => "Admin",
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "hr" => Ok(Role::Hr),
            "finance" => Ok(Role::Finance),
            "legal" => Ok(Role::Legal),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other} (expected HR, Finance, Legal or Admin)")),
        }
    }
}

/// Authenticated user resolved from the current credential.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub username: String,
    pub role: Role,
}

/// Lightweight listing record for a document.
///
/// `relevance_score` is present only on search results.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DocumentSummary {
    pub docid: i64,
    pub filename: String,
    #[serde(default)]
    pub author: Option<String>,
    pub category: String,
    pub upload_date: NaiveDateTime,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance_score: Option<f64>,
}

/// Full record fetched on demand for one document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentDetail {
    pub docid: i64,
    pub filename: String,
    #[serde(default)]
    pub author: Option<String>,
    pub category: String,
    #[serde(default)]
    pub summary: Option<String>,
    #[serde(default)]
    pub content_preview: String,
    #[serde(default)]
    pub upload_date: Option<NaiveDateTime>,
}

/// Audit record of an action taken against a document or account.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccessLogEntry {
    pub log_id: i64,
    pub action: String,
    pub user_uuid: String,
    #[serde(default)]
    pub doc_uuid: Option<i64>,
    pub timestamp: NaiveDateTime,
}

/// A file staged for upload, with optional metadata form fields.
#[derive(Debug, Clone)]
pub struct PendingUpload {
    pub filename: String,
    pub bytes: Vec<u8>,
    pub category: Option<String>,
    pub author: Option<String>,
    pub summary: Option<String>,
}

impl PendingUpload {
    pub fn new(filename: impl Into<String>, bytes: Vec<u8>) -> Self {
        Self {
            filename: filename.into(),
            bytes,
            category: None,
            author: None,
            summary: None,
        }
    }

    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    pub fn with_author(mut self, author: impl Into<String>) -> Self {
        self.author = Some(author.into());
        self
    }

    pub fn with_summary(mut self, summary: impl Into<String>) -> Self {
        self.summary = Some(summary.into());
        self
    }
}

/// Downloaded document content, named after its cached summary.
#[derive(Debug, Clone)]
pub struct NamedBlob {
    pub filename: String,
    pub bytes: Vec<u8>,
}
