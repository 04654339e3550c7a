//! HTTP client for the document service.
//!
//! Every remote endpoint the workspace consumes is wrapped here. Requests go
//! through the [`Transport`] trait so tests can substitute a scripted fake
//! for the real reqwest client.

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{multipart, Method};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use tracing::debug;

use crate::error::{Error, Result};
use crate::models::{
    AccessLogEntry, Credential, DocumentDetail, DocumentSummary, Identity, PendingUpload, Role,
};

const USER_AGENT: &str = concat!("docdesk/", env!("CARGO_PKG_VERSION"));

/// Shared credential cell read by every outbound request.
///
/// The session store is the only writer; replacement is always wholesale,
/// never a partial update.
#[derive(Clone, Default)]
pub struct CredentialCell(Arc<Mutex<Option<Credential>>>);

impl CredentialCell {
    pub fn get(&self) -> Option<Credential> {
        self.0.lock().unwrap().clone()
    }

    pub fn set(&self, credential: Credential) {
        *self.0.lock().unwrap() = Some(credential);
    }

    pub fn clear(&self) {
        *self.0.lock().unwrap() = None;
    }

    pub fn is_set(&self) -> bool {
        self.0.lock().unwrap().is_some()
    }
}

/// One outbound request, transport-agnostic.
#[derive(Debug)]
pub struct ApiRequest {
    pub method: Method,
    pub url: String,
    pub bearer: Option<Credential>,
    pub body: RequestBody,
}

#[derive(Debug)]
pub enum RequestBody {
    Empty,
    Form(Vec<(&'static str, String)>),
    Json(serde_json::Value),
    Multipart(MultipartBody),
}

/// A multipart upload: one file part plus plain text fields.
#[derive(Debug)]
pub struct MultipartBody {
    pub file_name: String,
    pub file_bytes: Vec<u8>,
    pub fields: Vec<(&'static str, String)>,
}

/// Raw response handed back by a transport.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Vec<u8>,
}

impl ApiResponse {
    fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// The service reports errors as `{"detail": "..."}`.
    fn detail(&self) -> Option<String> {
        serde_json::from_slice::<ErrorBody>(&self.body)
            .ok()
            .and_then(|body| body.detail)
    }
}

#[derive(Deserialize)]
struct ErrorBody {
    detail: Option<String>,
}

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

/// Executes one request and returns the raw response.
///
/// Transport failures map to [`Error::Network`]; status handling stays in
/// [`ApiClient`].
#[async_trait]
pub trait Transport: Send + Sync {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// Production transport backed by reqwest.
pub struct HttpTransport {
    client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(timeout: Duration) -> Self {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout)
            .gzip(true)
            .brotli(true)
            .build()
            .expect("Failed to create HTTP client");

        Self { client }
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let mut builder = self.client.request(request.method, &request.url);
        if let Some(ref credential) = request.bearer {
            builder = builder.bearer_auth(credential.as_str());
        }
        builder = match request.body {
            RequestBody::Empty => builder,
            RequestBody::Form(fields) => builder.form(&fields),
            RequestBody::Json(value) => builder.json(&value),
            RequestBody::Multipart(body) => {
                let mut form = multipart::Form::new().part(
                    "file",
                    multipart::Part::bytes(body.file_bytes).file_name(body.file_name),
                );
                for (name, value) in body.fields {
                    form = form.text(name, value);
                }
                builder.multipart(form)
            }
        };

        let response = builder
            .send()
            .await
            .map_err(|e| Error::Network(e.to_string()))?;
        let status = response.status().as_u16();
        let body = response
            .bytes()
            .await
            .map_err(|e| Error::Network(e.to_string()))?
            .to_vec();

        Ok(ApiResponse { status, body })
    }
}

/// Typed client for the document service endpoints.
///
/// Cloning is cheap and all clones share the same credential cell, so every
/// store issues requests under the currently active credential.
#[derive(Clone)]
pub struct ApiClient {
    transport: Arc<dyn Transport>,
    base_url: String,
    credential: CredentialCell,
}

impl ApiClient {
    pub fn new(base_url: &str, timeout: Duration) -> Self {
        Self::with_transport(base_url, Arc::new(HttpTransport::new(timeout)))
    }

    /// Build a client over a custom transport (tests use a scripted fake).
    pub fn with_transport(base_url: impl Into<String>, transport: Arc<dyn Transport>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            transport,
            base_url,
            credential: CredentialCell::default(),
        }
    }

    /// The shared credential cell. The session store is its only writer.
    pub fn credential(&self) -> &CredentialCell {
        &self.credential
    }

    /// Exchange a username and password for a bearer credential.
    pub async fn login(&self, username: &str, password: &str) -> Result<Credential> {
        let request = ApiRequest {
            method: Method::POST,
            url: format!("{}/token", self.base_url),
            bearer: None,
            body: RequestBody::Form(vec![
                ("username", username.to_string()),
                ("password", password.to_string()),
            ]),
        };
        let response = Self::check(self.send(request).await?, "Login failed.")?;
        let token: TokenResponse = Self::parse(&response)?;
        Ok(Credential::new(token.access_token))
    }

    /// Register a new account. Registration does not authenticate.
    pub async fn register(
        &self,
        username: &str,
        password: &str,
        role: Role,
        email: Option<&str>,
    ) -> Result<()> {
        let mut payload = serde_json::json!({
            "username": username,
            "password": password,
            "role": role,
        });
        if let Some(email) = email {
            payload["email"] = email.into();
        }
        let request = ApiRequest {
            method: Method::POST,
            url: format!("{}/users/", self.base_url),
            bearer: None,
            body: RequestBody::Json(payload),
        };
        Self::check(self.send(request).await?, "Registration failed.")?;
        Ok(())
    }

    /// Resolve the identity behind the current credential.
    pub async fn me(&self) -> Result<Identity> {
        let response = self
            .get(format!("{}/users/me", self.base_url), "Failed to fetch user data.")
            .await?;
        Self::parse(&response)
    }

    /// List all document summaries.
    pub async fn list_documents(&self) -> Result<Vec<DocumentSummary>> {
        let response = self
            .get(
                format!("{}/documents/", self.base_url),
                "Failed to fetch documents.",
            )
            .await?;
        Self::parse(&response)
    }

    /// Ranked search over documents.
    pub async fn search(&self, query: &str) -> Result<Vec<DocumentSummary>> {
        let response = self
            .get(
                format!(
                    "{}/search/?query={}",
                    self.base_url,
                    urlencoding::encode(query)
                ),
                "Search failed.",
            )
            .await?;
        Self::parse(&response)
    }

    /// Fetch full detail for one document.
    pub async fn document(&self, docid: i64) -> Result<DocumentDetail> {
        let response = self
            .get(
                format!("{}/documents/{docid}", self.base_url),
                "Failed to retrieve document.",
            )
            .await?;
        Self::parse(&response)
    }

    /// Fetch the raw content of one document.
    pub async fn download(&self, docid: i64) -> Result<Vec<u8>> {
        let response = self
            .get(
                format!("{}/documents/{docid}/download", self.base_url),
                "Download failed.",
            )
            .await?;
        Ok(response.body)
    }

    /// Upload a staged file as a multipart form.
    pub async fn upload(&self, upload: &PendingUpload) -> Result<()> {
        let bearer = self.authed()?;
        let mut fields = vec![(
            "category",
            upload
                .category
                .clone()
                .unwrap_or_else(|| "General".to_string()),
        )];
        if let Some(ref author) = upload.author {
            fields.push(("author", author.clone()));
        }
        if let Some(ref summary) = upload.summary {
            fields.push(("summary", summary.clone()));
        }
        let request = ApiRequest {
            method: Method::POST,
            url: format!("{}/documents/", self.base_url),
            bearer: Some(bearer),
            body: RequestBody::Multipart(MultipartBody {
                file_name: upload.filename.clone(),
                file_bytes: upload.bytes.clone(),
                fields,
            }),
        };
        Self::check(self.send(request).await?, "Upload failed.")?;
        Ok(())
    }

    /// Fetch the full access-log collection.
    pub async fn logs(&self) -> Result<Vec<AccessLogEntry>> {
        let response = self
            .get(format!("{}/logs/", self.base_url), "Failed to fetch logs.")
            .await?;
        Self::parse(&response)
    }

    async fn get(&self, url: String, fallback: &str) -> Result<ApiResponse> {
        let bearer = self.authed()?;
        let request = ApiRequest {
            method: Method::GET,
            url,
            bearer: Some(bearer),
            body: RequestBody::Empty,
        };
        Self::check(self.send(request).await?, fallback)
    }

    fn authed(&self) -> Result<Credential> {
        self.credential.get().ok_or(Error::Unauthorized)
    }

    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        debug!(method = %request.method, url = %request.url, "issuing request");
        self.transport.execute(request).await
    }

    /// Map a response status into the error taxonomy, using the service
    /// `detail` message when it provides one.
    fn check(response: ApiResponse, fallback: &str) -> Result<ApiResponse> {
        if response.is_success() {
            return Ok(response);
        }
        match response.status {
            401 => Err(Error::Unauthorized),
            403 => Err(Error::Forbidden(
                response.detail().unwrap_or_else(|| fallback.to_string()),
            )),
            _ => Err(Error::Service(
                response.detail().unwrap_or_else(|| fallback.to_string()),
            )),
        }
    }

    fn parse<T: DeserializeOwned>(response: &ApiResponse) -> Result<T> {
        serde_json::from_slice(&response.body)
            .map_err(|e| Error::Service(format!("malformed response: {e}")))
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use std::collections::VecDeque;
    use std::sync::Mutex;

    use super::*;

    type Hook = Box<dyn Fn() + Send + Sync>;

    /// Scripted transport: pops one canned response per request and records
    /// everything that was sent.
    #[derive(Default)]
    pub(crate) struct FakeTransport {
        responses: Mutex<VecDeque<Result<ApiResponse>>>,
        requests: Mutex<Vec<ApiRequest>>,
        hook: Mutex<Option<Hook>>,
    }

    impl FakeTransport {
        pub fn push_json(&self, status: u16, body: serde_json::Value) {
            self.responses.lock().unwrap().push_back(Ok(ApiResponse {
                status,
                body: body.to_string().into_bytes(),
            }));
        }

        pub fn push_bytes(&self, status: u16, body: Vec<u8>) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Ok(ApiResponse { status, body }));
        }

        pub fn push_network_error(&self, message: &str) {
            self.responses
                .lock()
                .unwrap()
                .push_back(Err(Error::Network(message.to_string())));
        }

        /// Run once while the next request is in flight.
        pub fn set_in_flight_hook(&self, hook: impl Fn() + Send + Sync + 'static) {
            *self.hook.lock().unwrap() = Some(Box::new(hook));
        }

        pub fn request_count(&self) -> usize {
            self.requests.lock().unwrap().len()
        }

        pub fn urls(&self) -> Vec<String> {
            self.requests
                .lock()
                .unwrap()
                .iter()
                .map(|request| request.url.clone())
                .collect()
        }

        /// Inspect the most recent recorded request.
        pub fn with_last_request<R>(&self, f: impl FnOnce(&ApiRequest) -> R) -> R {
            let requests = self.requests.lock().unwrap();
            f(requests.last().expect("no request was recorded"))
        }
    }

    #[async_trait]
    impl Transport for FakeTransport {
        async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
            self.requests.lock().unwrap().push(request);
            if let Some(hook) = self.hook.lock().unwrap().take() {
                hook();
            }
            self.responses
                .lock()
                .unwrap()
                .pop_front()
                .expect("request issued with no scripted response")
        }
    }
}
