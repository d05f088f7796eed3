use crate::models::{BatchItemResult, BatchReport, IndexedDocument, SearchHit, SearchQuery};
use crate::traits::DocumentIndex;
use crate::SearchError;
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, StatusCode};
use serde_json::{json, Value};
use url::Url;

const BACKEND: &str = "search-index";

pub struct SearchIndexStore {
    client: Client,
    endpoint: String,
    index_name: String,
    api_key: Option<String>,
    semantic_supported: bool,
}

impl SearchIndexStore {
    pub fn new(
        endpoint: &str,
        index_name: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, SearchError> {
        let parsed = Url::parse(endpoint)?;

        Ok(Self {
            client: Client::new(),
            endpoint: parsed.as_str().trim_end_matches('/').to_string(),
            index_name: index_name.into(),
            api_key,
            semantic_supported: false,
        })
    }

    /// Builds the store and probes the semantic capability once. The probe
    /// never fails the startup; an unreachable or lower-tier service simply
    /// leaves the store in standard mode.
    pub async fn connect(
        endpoint: &str,
        index_name: impl Into<String>,
        api_key: Option<String>,
    ) -> Result<Self, SearchError> {
        let mut store = Self::new(endpoint, index_name, api_key)?;
        store.semantic_supported = store.probe_semantic_support().await;
        Ok(store)
    }

    pub fn with_semantic_mode(mut self, supported: bool) -> Self {
        self.semantic_supported = supported;
        self
    }

    fn semantic_pipeline_name(&self) -> String {
        format!("{}-semantic", self.index_name)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.api_key {
            Some(key) => request.bearer_auth(key),
            None => request,
        }
    }

    async fn probe_semantic_support(&self) -> bool {
        let request = self.authorize(self.client.get(format!(
            "{}/_search/pipeline/{}",
            self.endpoint,
            self.semantic_pipeline_name()
        )));

        match request.send().await {
            Ok(response) => {
                let supported = response.status() == StatusCode::OK;
                tracing::debug!(
                    index = %self.index_name,
                    supported,
                    "semantic capability probe completed"
                );
                supported
            }
            Err(error) => {
                tracing::warn!(
                    index = %self.index_name,
                    error = %error,
                    "semantic capability probe failed; assuming standard mode"
                );
                false
            }
        }
    }

    async fn send_bulk(&self, operations: Vec<Value>) -> Result<BatchReport, SearchError> {
        if operations.is_empty() {
            return Ok(BatchReport::default());
        }

        let payload: String = operations
            .iter()
            .map(serde_json::to_string)
            .collect::<Result<Vec<_>, serde_json::Error>>()?
            .join("\n")
            + "\n";

        let response = self
            .authorize(
                self.client
                    .post(format!("{}/_bulk", self.endpoint))
                    .header("Content-Type", "application/x-ndjson"),
            )
            .body(payload)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: BACKEND.to_string(),
                details: response.status().to_string(),
            });
        }

        let body: Value = response.json().await?;
        Ok(parse_bulk_report(&body))
    }
}

#[async_trait]
impl DocumentIndex for SearchIndexStore {
    async fn ensure_index(&self) -> Result<(), SearchError> {
        let response = self
            .authorize(
                self.client
                    .head(format!("{}/{}", self.endpoint, self.index_name)),
            )
            .send()
            .await?;

        if response.status() == StatusCode::OK {
            return Ok(());
        }

        if !response.status().is_client_error() {
            return Err(SearchError::BackendResponse {
                backend: BACKEND.to_string(),
                details: response.status().to_string(),
            });
        }

        tracing::info!(index = %self.index_name, "index missing, creating it");

        let response = self
            .authorize(
                self.client
                    .put(format!("{}/{}", self.endpoint, self.index_name)),
            )
            .json(&index_schema())
            .send()
            .await?;

        if response.status().is_server_error() || response.status().is_client_error() {
            return Err(SearchError::Request(format!(
                "index setup failed with {}",
                response.status()
            )));
        }

        Ok(())
    }

    async fn upsert_documents(
        &self,
        documents: &[IndexedDocument],
    ) -> Result<BatchReport, SearchError> {
        let mut operations = Vec::new();

        for document in documents {
            operations.push(json!({
                "index": {
                    "_index": self.index_name,
                    "_id": document.id,
                }
            }));
            operations.push(serde_json::to_value(document)?);
        }

        self.send_bulk(operations).await
    }

    async fn query(&self, query: &SearchQuery) -> Result<Vec<SearchHit>, SearchError> {
        let body = json!({
            "size": query.top_count,
            "track_total_hits": true,
            "_source": ["file_name"],
            "query": {
                "multi_match": {
                    "query": query.query_text,
                    "fields": ["content", "file_name"]
                }
            },
            "highlight": {
                "fields": {
                    "content": {}
                }
            }
        });

        let mut request = self
            .client
            .post(format!("{}/{}/_search", self.endpoint, self.index_name));

        if query.use_semantic_mode {
            request = request.query(&[("search_pipeline", self.semantic_pipeline_name())]);
        }

        let response = self.authorize(request).json(&body).send().await?;

        if !response.status().is_success() {
            return Err(SearchError::BackendResponse {
                backend: BACKEND.to_string(),
                details: response.status().to_string(),
            });
        }

        let response_json: Value = response.json().await?;
        let hits = response_json
            .pointer("/hits/hits")
            .and_then(Value::as_array)
            .cloned()
            .unwrap_or_default();

        let mut result = Vec::new();

        for raw in hits {
            let id = raw
                .pointer("/_id")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let file_name = raw
                .pointer("/_source/file_name")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string();
            let score = raw.pointer("/_score").and_then(Value::as_f64).unwrap_or(0.0);
            let excerpts = raw
                .pointer("/highlight/content")
                .and_then(Value::as_array)
                .map(|fragments| {
                    fragments
                        .iter()
                        .filter_map(Value::as_str)
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();

            result.push(SearchHit {
                id,
                file_name,
                score,
                excerpts,
            });
        }

        Ok(result)
    }

    async fn delete_by_id(&self, ids: &[String]) -> Result<BatchReport, SearchError> {
        let operations = ids
            .iter()
            .map(|id| {
                json!({
                    "delete": {
                        "_index": self.index_name,
                        "_id": id,
                    }
                })
            })
            .collect();

        self.send_bulk(operations).await
    }

    fn supports_semantic_mode(&self) -> bool {
        self.semantic_supported
    }
}

/// Field schema derived from the `IndexedDocument` shape: the file name is
/// searchable with a keyword subfield for sorting and faceting, the content
/// uses a language-aware analyzer, the rest are filterable scalars.
fn index_schema() -> Value {
    json!({
        "settings": {
            "number_of_shards": 1,
            "number_of_replicas": 0
        },
        "mappings": {
            "properties": {
                "id": {"type": "keyword"},
                "file_name": {
                    "type": "text",
                    "fields": {
                        "keyword": {"type": "keyword"}
                    }
                },
                "file_type": {"type": "keyword"},
                "content": {"type": "text", "analyzer": "english"},
                "uploaded_date": {"type": "date"},
                "file_size_in_bytes": {"type": "long"}
            }
        }
    })
}

fn parse_bulk_report(body: &Value) -> BatchReport {
    let items = body
        .pointer("/items")
        .and_then(Value::as_array)
        .cloned()
        .unwrap_or_default();

    let mut report = BatchReport::default();

    for raw in items {
        let Some(action) = raw.as_object().and_then(|map| map.values().next()) else {
            continue;
        };

        let key = action
            .pointer("/_id")
            .and_then(Value::as_str)
            .unwrap_or_default()
            .to_string();
        let status_code = action.pointer("/status").and_then(Value::as_u64).unwrap_or(0);
        let error = action
            .pointer("/error/type")
            .and_then(Value::as_str)
            .map(str::to_string);
        let outcome = action
            .pointer("/result")
            .and_then(Value::as_str)
            .map(str::to_string);

        report.items.push(BatchItemResult {
            key,
            succeeded: error.is_none() && (200..300).contains(&status_code),
            status: error.or(outcome),
        });
    }

    report
}
