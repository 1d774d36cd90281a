//! RAGFlow HTTP API client.
//!
//! The [`KnowledgeBase`] trait is the seam the sync manager depends on;
//! [`RagflowClient`] implements it with `reqwest`. Every call is a single
//! request with no retries. A call succeeds only when the HTTP status is
//! 2xx **and** the JSON envelope carries `code == 0`.
//!
//! | Operation | Request |
//! |-----------|---------|
//! | [`list_datasets`](KnowledgeBase::list_datasets) | `GET /api/v1/datasets` |
//! | [`get_or_create_dataset`](KnowledgeBase::get_or_create_dataset) | `POST /api/v1/datasets` when no dataset has the name |
//! | [`create_document`](KnowledgeBase::create_document) | `POST /api/v1/datasets/{id}/documents` (multipart) |
//! | [`add_chunk`](KnowledgeBase::add_chunk) | `POST /api/v1/datasets/{id}/documents/{doc}/chunks` |

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::time::Duration;
use thiserror::Error;

use crate::config::RagflowConfig;
use crate::models::{Chunk, Dataset, Document};

/// Failure of a single API call.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("HTTP error! status: {status}: {body}")]
    Status { status: u16, body: String },
    #[error("RAGFlow rejected the request (code {code}): {message}")]
    Rejected { code: i64, message: String },
    #[error("unexpected response format: {0}")]
    Malformed(String),
}

/// Remote knowledge-base operations used by the sync manager.
#[async_trait]
pub trait KnowledgeBase: Send + Sync {
    /// All datasets visible to the API key. Never fails: errors are logged
    /// and reported as an empty list.
    async fn list_datasets(&self) -> Vec<Dataset>;

    /// Find a dataset by exact name, creating it when absent.
    async fn get_or_create_dataset(&self, name: &str) -> Result<Dataset, ApiError>;

    /// Upload a note as a new document and return it.
    async fn create_document(
        &self,
        dataset_id: &str,
        name: &str,
        content: &str,
    ) -> Result<Document, ApiError>;

    /// Attach one chunk of text to an existing document.
    async fn add_chunk(
        &self,
        dataset_id: &str,
        document_id: &str,
        content: &str,
    ) -> Result<Chunk, ApiError>;
}

/// Response envelope shared by every endpoint.
#[derive(Debug, Deserialize)]
struct Envelope {
    code: i64,
    #[serde(default)]
    data: Option<Value>,
    #[serde(default)]
    message: Option<String>,
}

/// Client for one RAGFlow instance.
pub struct RagflowClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    chunk_token_num: usize,
}

impl RagflowClient {
    pub fn new(config: &RagflowConfig, chunk_token_num: usize) -> Result<Self, ApiError> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_secs {
            builder = builder.timeout(Duration::from_secs(secs));
        }
        Ok(Self {
            client: builder.build()?,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            api_key: config.api_key.clone(),
            chunk_token_num,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn bearer(&self) -> String {
        format!("Bearer {}", self.api_key)
    }

    /// Send a request and unwrap the envelope's `data`.
    async fn call(&self, request: reqwest::RequestBuilder) -> Result<Value, ApiError> {
        let response = request
            .header("Authorization", self.bearer())
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ApiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let envelope: Envelope = response
            .json()
            .await
            .map_err(|e| ApiError::Malformed(format!("invalid JSON body: {}", e)))?;

        if envelope.code != 0 {
            return Err(ApiError::Rejected {
                code: envelope.code,
                message: envelope.message.unwrap_or_default(),
            });
        }

        match envelope.data {
            Some(Value::Null) | None => Err(ApiError::Malformed("missing data".to_string())),
            Some(data) => Ok(data),
        }
    }

    async fn try_list_datasets(&self) -> Result<Vec<Dataset>, ApiError> {
        let data = self
            .call(self.client.get(self.url("/api/v1/datasets")))
            .await?;
        decode(data, "dataset list")
    }

    async fn create_dataset(&self, name: &str) -> Result<Dataset, ApiError> {
        let body = serde_json::json!({
            "name": name,
            "chunk_method": "naive",
            "parser_config": {
                "chunk_token_num": self.chunk_token_num,
                "delimiter": "\\n",
                "layout_recognize": true
            }
        });
        let data = self
            .call(self.client.post(self.url("/api/v1/datasets")).json(&body))
            .await?;
        decode(data, "dataset")
    }
}

fn decode<T: DeserializeOwned>(data: Value, what: &str) -> Result<T, ApiError> {
    serde_json::from_value(data).map_err(|e| ApiError::Malformed(format!("{}: {}", what, e)))
}

#[async_trait]
impl KnowledgeBase for RagflowClient {
    async fn list_datasets(&self) -> Vec<Dataset> {
        match self.try_list_datasets().await {
            Ok(datasets) => datasets,
            Err(e) => {
                tracing::warn!("Failed to list datasets: {}", e);
                Vec::new()
            }
        }
    }

    async fn get_or_create_dataset(&self, name: &str) -> Result<Dataset, ApiError> {
        if let Some(existing) = self
            .list_datasets()
            .await
            .into_iter()
            .find(|d| d.name == name)
        {
            tracing::debug!(dataset = %existing.id, "using existing dataset");
            return Ok(existing);
        }

        let dataset = self.create_dataset(name).await.inspect_err(|e| {
            tracing::error!("Failed to create dataset: {}", e);
        })?;
        tracing::info!(dataset = %dataset.id, name, "created dataset");
        Ok(dataset)
    }

    async fn create_document(
        &self,
        dataset_id: &str,
        name: &str,
        content: &str,
    ) -> Result<Document, ApiError> {
        let part = Part::text(content.to_string())
            .file_name(name.to_string())
            .mime_str("text/markdown")?;
        let form = Form::new().part("file", part);
        let url = self.url(&format!("/api/v1/datasets/{}/documents", dataset_id));

        let data = self
            .call(self.client.post(url).multipart(form))
            .await
            .inspect_err(|e| tracing::error!("Failed to create document: {}", e))?;

        let documents: Vec<Document> = decode(data, "document list")?;
        documents
            .into_iter()
            .next()
            .ok_or_else(|| ApiError::Malformed("empty document list".to_string()))
    }

    async fn add_chunk(
        &self,
        dataset_id: &str,
        document_id: &str,
        content: &str,
    ) -> Result<Chunk, ApiError> {
        let url = self.url(&format!(
            "/api/v1/datasets/{}/documents/{}/chunks",
            dataset_id, document_id
        ));
        let body = serde_json::json!({ "content": content });

        let data = self
            .call(self.client.post(url).json(&body))
            .await
            .inspect_err(|e| tracing::error!("Failed to add chunk: {}", e))?;

        // Newer servers nest the chunk under `data.chunk`.
        let data = match data {
            Value::Object(mut map) if map.contains_key("chunk") => {
                map.remove("chunk").unwrap_or(Value::Null)
            }
            other => other,
        };
        decode(data, "chunk")
    }
}
