use crate::extractor::PdfExtractor;
use crate::models::{IndexedDocument, UploadOutcome, UploadedFile};
use crate::storage::WorkingStorage;
use crate::traits::DocumentIndex;
use crate::IngestError;
use std::path::{Path, PathBuf};
use std::sync::Arc;

pub const ACCEPTED_EXTENSION: &str = "pdf";

/// Fails fast on uploads the pipeline will not accept. Runs before any side
/// effect, so a rejected upload touches neither storage nor the index.
pub fn validate_upload(upload: &UploadedFile) -> Result<(), IngestError> {
    if upload.bytes.is_empty() {
        return Err(IngestError::InvalidUpload("file is empty".to_string()));
    }

    let is_pdf = Path::new(&upload.file_name)
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case(ACCEPTED_EXTENSION));

    if !is_pdf {
        return Err(IngestError::InvalidUpload(
            "only PDF files are supported".to_string(),
        ));
    }

    Ok(())
}

/// Orchestrates one upload end to end: validate, stage, extract, materialize,
/// ensure the index, upsert. Collaborators arrive through the constructor.
pub struct IngestionPipeline<I, X> {
    index: Arc<I>,
    extractor: Arc<X>,
    storage: WorkingStorage,
}

impl<I, X> IngestionPipeline<I, X>
where
    I: DocumentIndex + Send + Sync,
    X: PdfExtractor + 'static,
{
    pub fn new(index: Arc<I>, extractor: Arc<X>, storage: WorkingStorage) -> Self {
        Self {
            index,
            extractor,
            storage,
        }
    }

    /// Never lets a fault escape: every error becomes a `success:false`
    /// outcome carrying the error text and the original file name.
    pub async fn ingest(&self, upload: UploadedFile) -> UploadOutcome {
        let file_name = upload.file_name.clone();

        match self.run(upload).await {
            Ok(outcome) => outcome,
            Err(error) => {
                tracing::warn!(file_name = %file_name, error = %error, "upload failed");
                UploadOutcome::failed(file_name, error.to_string())
            }
        }
    }

    async fn run(&self, upload: UploadedFile) -> Result<UploadOutcome, IngestError> {
        validate_upload(&upload)?;

        let staged = self.storage.store(&upload.file_name, &upload.bytes).await?;
        let content = self.extract(staged).await;

        // Byte size comes from the upload itself, not the staged copy.
        let document =
            IndexedDocument::new(&upload.file_name, content, upload.bytes.len() as u64);

        self.index
            .ensure_index()
            .await
            .map_err(|error| IngestError::IndexUnavailable(error.to_string()))?;

        match self
            .index
            .upsert_documents(std::slice::from_ref(&document))
            .await
        {
            Ok(report) if report.all_succeeded() => {
                tracing::info!(
                    document_id = %document.id,
                    file_name = %document.file_name,
                    "document indexed"
                );
                Ok(UploadOutcome::indexed(document.id, document.file_name))
            }
            Ok(report) => {
                let detail = report
                    .first_failure()
                    .and_then(|item| item.status.clone())
                    .unwrap_or_else(|| "index reported no item results".to_string());
                tracing::warn!(
                    document_id = %document.id,
                    file_name = %document.file_name,
                    detail = %detail,
                    "index rejected document"
                );
                Ok(UploadOutcome::failed(
                    document.file_name,
                    format!("document was processed but could not be indexed: {detail}"),
                ))
            }
            Err(error) => Ok(UploadOutcome::failed(
                document.file_name,
                format!("document was processed but could not be indexed: {error}"),
            )),
        }
    }

    /// Extraction failure does not stop the pipeline; the error text is
    /// indexed as the document content so the upload stays searchable by name.
    async fn extract(&self, staged: PathBuf) -> String {
        let extractor = Arc::clone(&self.extractor);
        let result = tokio::task::spawn_blocking(move || extractor.extract_text(&staged)).await;

        match result {
            Ok(Ok(text)) => text,
            Ok(Err(error)) => {
                tracing::warn!(error = %error, "text extraction failed; indexing the error text");
                format!("Error extracting text: {error}")
            }
            Err(join_error) => {
                tracing::warn!(error = %join_error, "extraction task aborted; indexing the error text");
                format!("Error extracting text: {join_error}")
            }
        }
    }
}
