//! Source documents: request body, placeholder fallback and the per-session cache.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use legalassist_core::{PLACEHOLDER_MARKER, SourceDocument, SourceMetadata};
use serde::Serialize;

/// Body of `POST /rag/source`.
#[derive(Debug, Serialize)]
pub struct SourceRequest<'a> {
    pub source_type: &'a str,
    pub source_id: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub highlight_snippet: Option<&'a str>,
}

/// Synthetic document shown when the source endpoint is missing or down.
///
/// Title and content say plainly that this is a fallback; the content
/// always starts with [`PLACEHOLDER_MARKER`].
pub fn placeholder_source(source_type: &str, source_id: &str) -> SourceDocument {
    SourceDocument {
        source_type: source_type.to_string(),
        title: format!("Mock Source: {source_id}"),
        section_id: source_id.to_string(),
        content: format!(
            "{PLACEHOLDER_MARKER}\n\n\
             This is a placeholder because the backend endpoint \"/rag/source\" returned 404 or failed.\n\n\
             In a real scenario, this would contain the verbatim legal text for {source_id}. \
             Use :retry to attempt the real fetch again."
        ),
        legal_references: vec!["BNSS Section 100".to_string(), "BNS Section 45".to_string()],
        last_updated: Some("2024-01-26".to_string()),
        highlights: Vec::new(),
        metadata: Some(SourceMetadata {
            procedural_stage: Some("pre_fir".to_string()),
            stakeholders: vec!["citizen".to_string(), "victim".to_string()],
            action_type: Some("right".to_string()),
            time_limit: Some("immediately".to_string()),
            sop_group: Some("complaint".to_string()),
            priority: Some(2),
        }),
    }
}

#[derive(Debug, Clone)]
pub struct CachedSource {
    pub document: SourceDocument,
    pub fetched_at: DateTime<Utc>,
}

/// Real source documents fetched this session, keyed by `"type:id"`.
#[derive(Debug, Default)]
pub struct SourceCache {
    entries: BTreeMap<String, CachedSource>,
}

impl SourceCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&CachedSource> {
        self.entries.get(key)
    }

    /// Store a fetched document. Placeholders are never cached so a later
    /// open retries the real endpoint.
    pub fn insert(&mut self, key: String, document: SourceDocument) -> bool {
        if document.is_placeholder() {
            return false;
        }
        self.entries.insert(
            key,
            CachedSource {
                document,
                fetched_at: Utc::now(),
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &CachedSource)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn real_doc(id: &str) -> SourceDocument {
        SourceDocument {
            source_type: "bns".into(),
            title: format!("BNS Section {id}"),
            section_id: id.into(),
            content: "Whoever commits murder shall be punished...".into(),
            legal_references: vec![],
            last_updated: None,
            highlights: vec![],
            metadata: None,
        }
    }

    #[test]
    fn placeholder_is_clearly_labelled() {
        let doc = placeholder_source("bns", "103");
        assert!(doc.is_placeholder());
        assert!(doc.content.contains("MOCK CONTENT"));
        assert_eq!(doc.title, "Mock Source: 103");
        assert_eq!(doc.section_id, "103");
        assert_eq!(doc.source_type, "bns");
    }

    #[test]
    fn request_omits_missing_snippet() {
        let req = SourceRequest {
            source_type: "bns",
            source_id: "103",
            highlight_snippet: None,
        };
        assert_eq!(
            serde_json::to_string(&req).unwrap(),
            r#"{"source_type":"bns","source_id":"103"}"#
        );
    }

    #[test]
    fn cache_skips_placeholders() {
        let mut cache = SourceCache::new();
        assert!(!cache.insert("bns:103".into(), placeholder_source("bns", "103")));
        assert!(cache.is_empty());

        assert!(cache.insert("bns:103".into(), real_doc("103")));
        assert_eq!(cache.len(), 1);
        assert_eq!(cache.get("bns:103").unwrap().document.title, "BNS Section 103");
        assert!(cache.get("bns:104").is_none());
    }
}
