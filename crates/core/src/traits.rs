use crate::{BatchReport, IndexedDocument, SearchError, SearchHit, SearchQuery};
use async_trait::async_trait;

/// Capability boundary for the external search index.
#[async_trait]
pub trait DocumentIndex {
    /// Creates the index schema when it is absent; a no-op when it exists.
    async fn ensure_index(&self) -> Result<(), SearchError>;

    async fn upsert_documents(
        &self,
        documents: &[IndexedDocument],
    ) -> Result<BatchReport, SearchError>;

    async fn query(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError>;

    async fn delete_by_id(&self, ids: &[String]) -> Result<BatchReport, SearchError>;

    /// Capability flag discovered once at startup; lower index tiers report
    /// `false` and queries run in standard mode.
    fn supports_semantic_mode(&self) -> bool;
}
