use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// File-type tag stored with every document; uploads are PDF-only.
pub const PDF_FILE_TYPE: &str = "PDF";

/// One uploaded file as received from the boundary, before any processing.
#[derive(Debug, Clone)]
pub struct UploadedFile {
    pub file_name: String,
    pub bytes: Vec<u8>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexedDocument {
    pub id: String,
    pub file_name: String,
    pub file_type: String,
    pub content: String,
    pub uploaded_date: DateTime<Utc>,
    pub file_size_in_bytes: u64,
}

impl IndexedDocument {
    /// Assigns the document key exactly once; it never changes afterwards.
    pub fn new(file_name: impl Into<String>, content: String, file_size_in_bytes: u64) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            file_name: file_name.into(),
            file_type: PDF_FILE_TYPE.to_string(),
            content,
            uploaded_date: Utc::now(),
            file_size_in_bytes,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SearchQuery {
    pub query_text: String,
    #[serde(default = "default_semantic_mode")]
    pub use_semantic_mode: bool,
    #[serde(default = "default_top_count")]
    pub top_count: usize,
}

impl SearchQuery {
    pub fn new(query_text: impl Into<String>) -> Self {
        Self {
            query_text: query_text.into(),
            use_semantic_mode: default_semantic_mode(),
            top_count: default_top_count(),
        }
    }
}

fn default_semantic_mode() -> bool {
    true
}

fn default_top_count() -> usize {
    10
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    pub file_name: String,
    pub score: f64,
    #[serde(default)]
    pub excerpts: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadOutcome {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub file_name: String,
    pub success: bool,
    pub message: String,
}

impl UploadOutcome {
    pub fn indexed(id: impl Into<String>, file_name: impl Into<String>) -> Self {
        Self {
            id: Some(id.into()),
            file_name: file_name.into(),
            success: true,
            message: "document uploaded and indexed successfully".to_string(),
        }
    }

    pub fn failed(file_name: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            id: None,
            file_name: file_name.into(),
            success: false,
            message: message.into(),
        }
    }
}

/// Per-item success report returned by the index for a bulk upsert or delete.
#[derive(Debug, Clone, Default)]
pub struct BatchReport {
    pub items: Vec<BatchItemResult>,
}

#[derive(Debug, Clone)]
pub struct BatchItemResult {
    pub key: String,
    pub succeeded: bool,
    pub status: Option<String>,
}

impl BatchReport {
    /// An empty report confirms nothing, so it does not count as success.
    pub fn all_succeeded(&self) -> bool {
        !self.items.is_empty() && self.items.iter().all(|item| item.succeeded)
    }

    pub fn first_failure(&self) -> Option<&BatchItemResult> {
        self.items.iter().find(|item| !item.succeeded)
    }
}
