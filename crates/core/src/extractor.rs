use crate::error::IngestError;
use base64::{engine::general_purpose::STANDARD, Engine};
use lopdf::Document;
use reqwest::blocking::Client;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Serialize)]
struct RemoteExtractionRequest {
    pdf_base64: String,
    source_path: String,
}

#[derive(Debug, Clone, Deserialize)]
struct RemoteExtractionResponse {
    pages: Option<Vec<RemoteExtractionPage>>,
    text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
struct RemoteExtractionPage {
    #[serde(default)]
    page: Option<u32>,
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Clone)]
pub struct RemoteExtractionConfig {
    pub endpoint: String,
    pub api_key: Option<String>,
}

/// Produces the full text of a staged PDF. Implementations are synchronous;
/// callers run them on a blocking task.
pub trait PdfExtractor: Send + Sync {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError>;
}

#[derive(Default)]
pub struct LopdfExtractor;

impl PdfExtractor for LopdfExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        let document =
            Document::load(path).map_err(|error| IngestError::PdfParse(error.to_string()))?;

        let mut pages = Vec::new();
        for (page_no, _page_id) in document.get_pages() {
            let text = document
                .extract_text(&[page_no])
                .map_err(|error| IngestError::PdfParse(error.to_string()))?;

            if !text.trim().is_empty() {
                pages.push(text);
            }
        }

        Ok(pages.join("\n"))
    }
}

/// Default extractor: parses locally and, when local parsing fails, retries
/// through the remote extraction endpoint if one is configured.
#[derive(Default)]
pub struct DefaultExtractor;

impl PdfExtractor for DefaultExtractor {
    fn extract_text(&self, path: &Path) -> Result<String, IngestError> {
        extract_text_with_fallback(path)
    }
}

pub fn extract_text_with_fallback(path: &Path) -> Result<String, IngestError> {
    match LopdfExtractor.extract_text(path) {
        Ok(text) => Ok(text),
        Err(IngestError::PdfParse(parse_error)) => match extract_with_remote(path) {
            Ok(Some(text)) => Ok(text),
            Ok(None) => Err(IngestError::PdfParse(parse_error)),
            Err(remote_error) => Err(IngestError::PdfParse(format!(
                "{parse_error}; remote extraction fallback failed: {remote_error}"
            ))),
        },
        Err(error) => Err(error),
    }
}

fn parse_remote_config() -> Option<RemoteExtractionConfig> {
    let endpoint = std::env::var("EXTRACTION_ENDPOINT").ok()?;
    let endpoint = endpoint.trim().to_string();
    if endpoint.is_empty() {
        return None;
    }

    let api_key = std::env::var("EXTRACTION_API_KEY").ok().and_then(|value| {
        let key = value.trim().to_string();
        if key.is_empty() {
            None
        } else {
            Some(key)
        }
    });

    Some(RemoteExtractionConfig { endpoint, api_key })
}

fn extract_with_remote(path: &Path) -> Result<Option<String>, IngestError> {
    let cfg = match parse_remote_config() {
        Some(cfg) => cfg,
        None => return Ok(None),
    };

    let pdf = std::fs::read(path).map_err(IngestError::Io)?;
    let payload = RemoteExtractionRequest {
        pdf_base64: STANDARD.encode(pdf),
        source_path: path.to_string_lossy().to_string(),
    };

    let mut request = Client::new()
        .post(&cfg.endpoint)
        .header("content-type", "application/json")
        .json(&payload);

    if let Some(api_key) = cfg.api_key {
        request = request.bearer_auth(api_key);
    }

    let response = request.send()?;

    if !response.status().is_success() {
        return Err(IngestError::RemoteExtraction(format!(
            "extraction request to {} returned {}",
            cfg.endpoint,
            response.status()
        )));
    }

    let payload: RemoteExtractionResponse = response.json()?;
    let text = payload_to_text(&payload, path)?;

    Ok(Some(text))
}

fn payload_to_text(payload: &RemoteExtractionResponse, path: &Path) -> Result<String, IngestError> {
    if let Some(listed) = &payload.pages {
        let mut ordered = listed
            .iter()
            .filter_map(|page| {
                let text = page.text.as_ref().map(|value| value.trim().to_string())?;
                if text.is_empty() {
                    None
                } else {
                    Some((page.page.unwrap_or(1), text))
                }
            })
            .collect::<Vec<_>>();

        if !ordered.is_empty() {
            ordered.sort_by_key(|(number, _)| *number);
            return Ok(ordered
                .into_iter()
                .map(|(_, text)| text)
                .collect::<Vec<_>>()
                .join("\n"));
        }
    }

    if let Some(raw_text) = &payload.text {
        let pages = raw_text
            .split('\u{000c}')
            .map(|chunk| chunk.trim())
            .filter(|chunk| !chunk.is_empty())
            .collect::<Vec<_>>();

        if !pages.is_empty() {
            return Ok(pages.join("\n"));
        }
    }

    Err(IngestError::RemoteExtraction(format!(
        "extraction response was empty for {}",
        path.display()
    )))
}
