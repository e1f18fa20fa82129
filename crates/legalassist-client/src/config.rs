//! Client configuration, gathered once at startup and passed down.

use std::time::Duration;

pub const DEFAULT_RAG_API_BASE: &str = "http://127.0.0.1:8000";
pub const DEFAULT_LEGACY_API_URL: &str = "http://localhost:8000";
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Which query endpoint answers questions.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum QueryEndpoint {
    /// `POST {rag_base}/rag/query`, with context carry-over.
    #[default]
    Rag,
    /// `POST {legacy_base}/api/v1/query`, the original stateless endpoint.
    Legacy,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientConfig {
    pub rag_base: String,
    pub legacy_base: String,
    pub endpoint: QueryEndpoint,
    pub timeout: Duration,
    /// Ask the backend to answer from retrieval only.
    pub no_llm: bool,
    /// Ask the backend for diagnostic detail in its answer.
    pub verbose: bool,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            rag_base: DEFAULT_RAG_API_BASE.to_string(),
            legacy_base: DEFAULT_LEGACY_API_URL.to_string(),
            endpoint: QueryEndpoint::Rag,
            timeout: DEFAULT_TIMEOUT,
            no_llm: false,
            verbose: false,
        }
    }
}

impl ClientConfig {
    /// Config pointing both endpoints at one base URL.
    pub fn with_base(base_url: impl Into<String>) -> Self {
        let base = base_url.into();
        Self {
            rag_base: base.clone(),
            legacy_base: base,
            ..Self::default()
        }
    }

    /// Trim trailing slashes so paths can be appended with `format!`.
    pub fn normalized(mut self) -> Self {
        self.rag_base = self.rag_base.trim_end_matches('/').to_string();
        self.legacy_base = self.legacy_base.trim_end_matches('/').to_string();
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn trailing_slashes_trimmed() {
        let config = ClientConfig {
            rag_base: "http://127.0.0.1:8000/".into(),
            legacy_base: "http://localhost:8000//".into(),
            ..Default::default()
        }
        .normalized();
        assert_eq!(config.rag_base, "http://127.0.0.1:8000");
        assert_eq!(config.legacy_base, "http://localhost:8000");
    }

    #[test]
    fn defaults() {
        let config = ClientConfig::default();
        assert_eq!(config.endpoint, QueryEndpoint::Rag);
        assert_eq!(config.timeout, DEFAULT_TIMEOUT);
        assert!(!config.no_llm);
    }
}
