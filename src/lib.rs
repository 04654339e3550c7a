//! Client-side workspace for a remote document-management service.
//!
//! The library owns all session and collection state: authentication and the
//! persisted bearer credential ([`session`]), the cached document collection
//! and selected detail ([`documents`]), the single-upload lifecycle
//! ([`upload`]), the role-gated access logs ([`logs`]) and the screen state
//! machine coordinating them ([`workspace`]). The remote service is reached
//! only through [`api`], whose transport is swappable for tests.

pub mod api;
pub mod config;
pub mod documents;
pub mod error;
pub mod logs;
pub mod models;
pub mod session;
pub mod upload;
pub mod workspace;

pub use error::{Error, Result};
