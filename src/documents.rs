//! Document collection cache.
//!
//! Holds the last-fetched set of summaries and the currently selected detail.
//! Collections are replaced wholesale on every fetch; there is no
//! incremental merge.

use tracing::debug;

use crate::api::ApiClient;
use crate::error::{Error, Result};
use crate::models::{Credential, DocumentDetail, DocumentSummary, NamedBlob};

pub struct DocumentStore {
    api: ApiClient,
    documents: Vec<DocumentSummary>,
    selected: Option<DocumentDetail>,
}

impl DocumentStore {
    pub fn new(api: ApiClient) -> Self {
        Self {
            api,
            documents: Vec::new(),
            selected: None,
        }
    }

    pub fn documents(&self) -> &[DocumentSummary] {
        &self.documents
    }

    pub fn selected(&self) -> Option<&DocumentDetail> {
        self.selected.as_ref()
    }

    /// Fetch the full collection, replacing the cache. A plain listing
    /// carries no relevance scores.
    pub async fn list_all(&mut self) -> Result<()> {
        let issued = self.api.credential().get();
        let documents = self.api.list_documents().await?;
        self.apply(issued, documents);
        Ok(())
    }

    /// Ranked search. An empty query is equivalent to listing everything.
    pub async fn search(&mut self, query: &str) -> Result<()> {
        if query.is_empty() {
            return self.list_all().await;
        }
        let issued = self.api.credential().get();
        let documents = self.api.search(query).await?;
        self.apply(issued, documents);
        Ok(())
    }

    /// Fetch detail for one document and select it. On failure the previous
    /// selection stays untouched.
    pub async fn fetch_detail(&mut self, docid: i64) -> Result<()> {
        let detail = self.api.document(docid).await?;
        self.selected = Some(detail);
        Ok(())
    }

    /// Fetch the raw content of one document as a named blob. The filename
    /// comes from the cached summary, so the document must appear in the
    /// current listing first. Cached state is not mutated.
    pub async fn download(&self, docid: i64) -> Result<NamedBlob> {
        let filename = self
            .documents
            .iter()
            .find(|doc| doc.docid == docid)
            .map(|doc| doc.filename.clone())
            .ok_or_else(|| {
                Error::Precondition(format!("document {docid} is not in the current listing"))
            })?;
        let bytes = self.api.download(docid).await?;
        Ok(NamedBlob { filename, bytes })
    }

    /// Drop the cached collection and the selection.
    pub fn reset(&mut self) {
        self.documents.clear();
        self.selected = None;
    }

    /// Replace the collection, unless the active credential changed while
    /// the request was outstanding (a logout raced the fetch).
    fn apply(&mut self, issued: Option<Credential>, documents: Vec<DocumentSummary>) {
        if self.api.credential().get() != issued {
            debug!("discarding stale collection response");
            return;
        }
        self.documents = documents;
    }
}
