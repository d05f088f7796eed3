//! HTTP surface for the document index.
//!
//! Three endpoints, mapped straight onto the core pipeline and gateway:
//!
//! - `POST /api/documents/upload` – multipart PDF upload; stages the file,
//!   extracts its text, and upserts the record into the search index.
//! - `POST /api/documents/search` – forwards a query to the index, degrading
//!   semantic mode when the index tier lacks it.
//! - `DELETE /api/documents/{id}` – removes one document by key.

use axum::{
    extract::{DefaultBodyLimit, Multipart, Path, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{delete, post},
    Json, Router,
};
use pdf_index_core::{
    validate_upload, DocumentIndex, IngestionPipeline, PdfExtractor, QueryGateway, SearchError,
    SearchQuery, UploadedFile,
};
use std::sync::Arc;

/// Uploads larger than this are refused at the transport layer.
const MAX_UPLOAD_BYTES: usize = 50 * 1024 * 1024;

pub struct AppService<I, X> {
    pub pipeline: IngestionPipeline<I, X>,
    pub gateway: QueryGateway<I>,
}

pub fn create_router<I, X>(service: Arc<AppService<I, X>>) -> Router
where
    I: DocumentIndex + Send + Sync + 'static,
    X: PdfExtractor + 'static,
{
    Router::new()
        .route("/api/documents/upload", post(upload_document::<I, X>))
        .route("/api/documents/search", post(search_documents::<I, X>))
        .route("/api/documents/:id", delete(delete_document::<I, X>))
        .layer(DefaultBodyLimit::max(MAX_UPLOAD_BYTES))
        .with_state(service)
}

async fn upload_document<I, X>(
    State(service): State<Arc<AppService<I, X>>>,
    mut multipart: Multipart,
) -> Response
where
    I: DocumentIndex + Send + Sync + 'static,
    X: PdfExtractor + 'static,
{
    loop {
        let field = match multipart.next_field().await {
            Ok(Some(field)) => field,
            Ok(None) => return (StatusCode::BAD_REQUEST, "no file uploaded").into_response(),
            Err(error) => {
                return (
                    StatusCode::BAD_REQUEST,
                    format!("malformed multipart body: {error}"),
                )
                    .into_response()
            }
        };

        if field.file_name().is_none() && field.name() != Some("file") {
            continue;
        }

        let file_name = field.file_name().unwrap_or_default().to_string();
        let bytes = match field.bytes().await {
            Ok(bytes) => bytes,
            Err(error) => {
                return (
                    StatusCode::BAD_REQUEST,
                    format!("could not read upload: {error}"),
                )
                    .into_response()
            }
        };

        let upload = UploadedFile {
            file_name,
            bytes: bytes.to_vec(),
        };

        // Reject before the pipeline runs so bad input answers 400, not 500.
        if let Err(error) = validate_upload(&upload) {
            return (StatusCode::BAD_REQUEST, error.to_string()).into_response();
        }

        let outcome = service.pipeline.ingest(upload).await;
        let status = if outcome.success {
            StatusCode::OK
        } else {
            StatusCode::INTERNAL_SERVER_ERROR
        };

        return (status, Json(outcome)).into_response();
    }
}

async fn search_documents<I, X>(
    State(service): State<Arc<AppService<I, X>>>,
    Json(query): Json<SearchQuery>,
) -> Response
where
    I: DocumentIndex + Send + Sync + 'static,
    X: PdfExtractor + 'static,
{
    match service.gateway.search(&query).await {
        Ok(hits) => (StatusCode::OK, Json(hits)).into_response(),
        Err(SearchError::EmptyQuery) => {
            (StatusCode::BAD_REQUEST, SearchError::EmptyQuery.to_string()).into_response()
        }
        Err(error) => {
            tracing::error!(query_text = %query.query_text, error = %error, "search failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("error searching documents: {error}"),
            )
                .into_response()
        }
    }
}

async fn delete_document<I, X>(
    State(service): State<Arc<AppService<I, X>>>,
    Path(id): Path<String>,
) -> Response
where
    I: DocumentIndex + Send + Sync + 'static,
    X: PdfExtractor + 'static,
{
    if service.gateway.delete(&id).await {
        (StatusCode::OK, format!("document {id} deleted successfully")).into_response()
    } else {
        (StatusCode::NOT_FOUND, format!("document {id} not found")).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::{create_router, AppService};
    use async_trait::async_trait;
    use axum::{
        body::{to_bytes, Body},
        http::{Method, Request, StatusCode},
    };
    use pdf_index_core::{
        BatchItemResult, BatchReport, DocumentIndex, IndexedDocument, IngestError,
        IngestionPipeline, PdfExtractor, QueryGateway, SearchError, SearchHit, SearchQuery,
        UploadOutcome, WorkingStorage,
    };
    use std::path::Path;
    use std::sync::Arc;
    use tower::ServiceExt;

    #[derive(Default)]
    struct StubIndex {
        delete_missing: bool,
    }

    #[async_trait]
    impl DocumentIndex for StubIndex {
        async fn ensure_index(&self) -> Result<(), SearchError> {
            Ok(())
        }

        async fn upsert_documents(
            &self,
            documents: &[IndexedDocument],
        ) -> Result<BatchReport, SearchError> {
            let items = documents
                .iter()
                .map(|document| BatchItemResult {
                    key: document.id.clone(),
                    succeeded: true,
                    status: None,
                })
                .collect();
            Ok(BatchReport { items })
        }

        async fn query(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError> {
            Ok(vec![SearchHit {
                id: "doc-1".to_string(),
                file_name: "report.pdf".to_string(),
                score: 1.2,
                excerpts: vec![format!("matched {}", query.query_text)],
            }])
        }

        async fn delete_by_id(&self, ids: &[String]) -> Result<BatchReport, SearchError> {
            let items = ids
                .iter()
                .map(|id| BatchItemResult {
                    key: id.clone(),
                    succeeded: !self.delete_missing,
                    status: self.delete_missing.then(|| "not_found".to_string()),
                })
                .collect();
            Ok(BatchReport { items })
        }

        fn supports_semantic_mode(&self) -> bool {
            false
        }
    }

    struct StubExtractor;

    impl PdfExtractor for StubExtractor {
        fn extract_text(&self, _path: &Path) -> Result<String, IngestError> {
            Ok("Q1 results".to_string())
        }
    }

    fn test_router(index: StubIndex, staging: &Path) -> axum::Router {
        let index = Arc::new(index);
        create_router(Arc::new(AppService {
            pipeline: IngestionPipeline::new(
                index.clone(),
                Arc::new(StubExtractor),
                WorkingStorage::new(staging),
            ),
            gateway: QueryGateway::new(index),
        }))
    }

    fn multipart_request(file_name: &str, bytes: &[u8]) -> Request<Body> {
        let boundary = "test-boundary";
        let mut body = Vec::new();
        body.extend_from_slice(
            format!(
                "--{boundary}\r\nContent-Disposition: form-data; name=\"file\"; \
                 filename=\"{file_name}\"\r\nContent-Type: application/pdf\r\n\r\n"
            )
            .as_bytes(),
        );
        body.extend_from_slice(bytes);
        body.extend_from_slice(format!("\r\n--{boundary}--\r\n").as_bytes());

        Request::builder()
            .method(Method::POST)
            .uri("/api/documents/upload")
            .header(
                "content-type",
                format!("multipart/form-data; boundary={boundary}"),
            )
            .body(Body::from(body))
            .expect("request")
    }

    #[tokio::test]
    async fn upload_round_trips_an_outcome_with_an_id() {
        let staging = tempfile::tempdir().expect("tempdir");
        let app = test_router(StubIndex::default(), staging.path());

        let response = app
            .oneshot(multipart_request("report.pdf", b"%PDF-1.4 fake"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let outcome: UploadOutcome = serde_json::from_slice(&body).expect("outcome json");
        assert!(outcome.success);
        assert_eq!(outcome.file_name, "report.pdf");
        assert!(outcome.id.is_some());
    }

    #[tokio::test]
    async fn non_pdf_upload_is_refused_with_400() {
        let staging = tempfile::tempdir().expect("tempdir");
        let app = test_router(StubIndex::default(), staging.path());

        let response = app
            .oneshot(multipart_request("notes.txt", b"plain text"))
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            std::fs::read_dir(staging.path()).expect("read dir").count(),
            0
        );
    }

    #[tokio::test]
    async fn search_returns_hits_and_rejects_blank_queries() {
        let staging = tempfile::tempdir().expect("tempdir");
        let app = test_router(StubIndex::default(), staging.path());

        let response = app
            .clone()
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/documents/search")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query_text": "Q1"}"#))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(response.status(), StatusCode::OK);
        let body = to_bytes(response.into_body(), usize::MAX).await.expect("body");
        let hits: Vec<SearchHit> = serde_json::from_slice(&body).expect("hits json");
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].id, "doc-1");

        let blank = app
            .oneshot(
                Request::builder()
                    .method(Method::POST)
                    .uri("/api/documents/search")
                    .header("content-type", "application/json")
                    .body(Body::from(r#"{"query_text": "  "}"#))
                    .expect("request"),
            )
            .await
            .expect("router response");

        assert_eq!(blank.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn delete_maps_gateway_false_to_404() {
        let staging = tempfile::tempdir().expect("tempdir");
        let app = test_router(StubIndex::default(), staging.path());

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/documents/doc-1")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::OK);

        let staging = tempfile::tempdir().expect("tempdir");
        let app = test_router(
            StubIndex {
                delete_missing: true,
            },
            staging.path(),
        );

        let response = app
            .oneshot(
                Request::builder()
                    .method(Method::DELETE)
                    .uri("/api/documents/ghost")
                    .body(Body::empty())
                    .expect("request"),
            )
            .await
            .expect("router response");
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
