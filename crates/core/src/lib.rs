pub mod error;
pub mod extractor;
pub mod gateway;
pub mod models;
pub mod pipeline;
pub mod storage;
pub mod stores;
pub mod traits;

pub use error::{IngestError, SearchError};
pub use extractor::{extract_text_with_fallback, DefaultExtractor, LopdfExtractor, PdfExtractor};
pub use gateway::QueryGateway;
pub use models::{
    BatchItemResult, BatchReport, IndexedDocument, SearchHit, SearchQuery, UploadOutcome,
    UploadedFile, PDF_FILE_TYPE,
};
pub use pipeline::{validate_upload, IngestionPipeline, ACCEPTED_EXTENSION};
pub use storage::WorkingStorage;
pub use stores::SearchIndexStore;
pub use traits::DocumentIndex;
