//! HTTP client for the Legal Assist query and source endpoints.

use async_trait::async_trait;
use legalassist_core::{Citation, ConversationContext, QueryResponse, SourceDocument};
use reqwest::StatusCode;
use serde::Serialize;
use tracing::{info, warn};

use crate::config::{ClientConfig, QueryEndpoint};
use crate::error::ClientError;
use crate::normalize::parse_query_response;
use crate::source::{SourceRequest, placeholder_source};
use crate::viewer::SourceFetcher;

#[derive(Serialize)]
struct QueryRequest<'a> {
    query: &'a str,
    context: &'a ConversationContext,
    no_llm: bool,
    verbose: bool,
}

#[derive(Serialize)]
struct LegacyQueryRequest<'a> {
    query: &'a str,
    stream: bool,
}

/// Client for the backend's `/rag/query`, `/api/v1/query` and `/rag/source` endpoints.
pub struct RagClient {
    client: reqwest::Client,
    config: ClientConfig,
}

impl RagClient {
    /// Create a client; base URLs have trailing slashes trimmed and every
    /// request is bounded by `config.timeout`.
    pub fn new(config: ClientConfig) -> Result<Self, ClientError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config: config.normalized(),
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// Send a question with the current context and normalize the answer.
    ///
    /// Transport failures, non-2xx statuses and undecodable bodies are all
    /// errors here; the caller turns them into an inline error turn.
    pub async fn send_query(
        &self,
        query: &str,
        context: &ConversationContext,
    ) -> Result<QueryResponse, ClientError> {
        let request = match self.config.endpoint {
            QueryEndpoint::Rag => {
                let url = format!("{}/rag/query", self.config.rag_base);
                info!(url = %url, ?context, "sending query");
                self.client.post(url).json(&QueryRequest {
                    query,
                    context,
                    no_llm: self.config.no_llm,
                    verbose: self.config.verbose,
                })
            }
            QueryEndpoint::Legacy => {
                let url = format!("{}/api/v1/query", self.config.legacy_base);
                info!(url = %url, "sending query to legacy endpoint");
                self.client.post(url).json(&LegacyQueryRequest {
                    query,
                    stream: false,
                })
            }
        };

        let resp = request.send().await?;
        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let response = parse_query_response(&body)?;
        info!(
            tier = %response.tier,
            case_type = ?response.case_type,
            stage = ?response.stage,
            citations = response.citations.len(),
            timeline = response.timeline.len(),
            "query answered"
        );
        Ok(response)
    }

    /// Fetch the verbatim text of a source, failing on any problem.
    ///
    /// HTTP 404 maps to [`ClientError::NotFound`].
    pub async fn try_fetch_source(
        &self,
        source_type: &str,
        source_id: &str,
        highlight_snippet: Option<&str>,
    ) -> Result<SourceDocument, ClientError> {
        let url = format!("{}/rag/source", self.config.rag_base);
        info!(url = %url, source_type, source_id, "fetching source");
        let resp = self
            .client
            .post(&url)
            .json(&SourceRequest {
                source_type,
                source_id,
                highlight_snippet,
            })
            .send()
            .await?;

        let status = resp.status();
        if status == StatusCode::NOT_FOUND {
            return Err(ClientError::NotFound(format!("{source_type}:{source_id}")));
        }
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(ClientError::Server {
                status: status.as_u16(),
                body,
            });
        }

        let body = resp.text().await?;
        let document: SourceDocument = serde_json::from_str(&body)?;
        info!(title = %document.title, chars = document.content.len(), "source fetched");
        Ok(document)
    }

    /// Fetch a source, degrading to a labelled placeholder on any failure.
    ///
    /// The viewer always has something to show; the placeholder's content
    /// starts with the fixed marker so it is never mistaken for real text.
    pub async fn fetch_source(
        &self,
        source_type: &str,
        source_id: &str,
        highlight_snippet: Option<&str>,
    ) -> SourceDocument {
        match self
            .try_fetch_source(source_type, source_id, highlight_snippet)
            .await
        {
            Ok(document) => document,
            Err(e) => {
                warn!(error = %e, source_type, source_id, "source unavailable, using placeholder");
                placeholder_source(source_type, source_id)
            }
        }
    }
}

#[async_trait]
impl SourceFetcher for RagClient {
    async fn fetch(&self, citation: &Citation) -> Result<SourceDocument, ClientError> {
        Ok(self
            .fetch_source(
                &citation.source_type,
                &citation.source_id,
                citation.snippet.as_deref(),
            )
            .await)
    }
}
