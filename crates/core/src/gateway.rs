use crate::models::{SearchHit, SearchQuery};
use crate::traits::DocumentIndex;
use crate::SearchError;
use std::sync::Arc;

/// Validates and forwards search and delete requests to the external index.
pub struct QueryGateway<I> {
    index: Arc<I>,
}

impl<I> QueryGateway<I>
where
    I: DocumentIndex + Send + Sync,
{
    pub fn new(index: Arc<I>) -> Self {
        Self { index }
    }

    /// Rejects blank queries before any external call. Semantic mode degrades
    /// to standard ranking when the index tier does not support it; every
    /// other failure propagates, since a failed search has no partial answer.
    pub async fn search(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError> {
        if query.query_text.trim().is_empty() {
            return Err(SearchError::EmptyQuery);
        }

        let mut effective = query.clone();
        if effective.use_semantic_mode && !self.index.supports_semantic_mode() {
            tracing::debug!(
                query_text = %effective.query_text,
                "semantic mode not supported by the index tier; using standard ranking"
            );
            effective.use_semantic_mode = false;
        }

        self.index.query(&effective).await
    }

    /// True only when every batch item succeeded. A missing document and a
    /// transport failure both collapse to `false`; this never raises.
    pub async fn delete(&self, id: &str) -> bool {
        let ids = [id.to_string()];

        match self.index.delete_by_id(&ids).await {
            Ok(report) => report.all_succeeded(),
            Err(error) => {
                tracing::warn!(document_id = %id, error = %error, "delete request failed");
                false
            }
        }
    }
}
