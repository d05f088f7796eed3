use thiserror::Error;

#[derive(Debug, Error)]
pub enum IngestError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid upload: {0}")]
    InvalidUpload(String),

    #[error("pdf parse error: {0}")]
    PdfParse(String),

    #[error("remote extraction failed: {0}")]
    RemoteExtraction(String),

    #[error("path has no file name: {0}")]
    MissingFileName(String),

    #[error("search index unavailable: {0}")]
    IndexUnavailable(String),

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),
}

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("invalid response from {backend}: {details}")]
    BackendResponse { backend: String, details: String },

    #[error("http error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("url parse error: {0}")]
    Url(#[from] url::ParseError),

    #[error("serialize error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("search query cannot be empty")]
    EmptyQuery,

    #[error("search request failed: {0}")]
    Request(String),
}
