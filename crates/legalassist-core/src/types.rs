//! Normalized response model shared by the HTTP client, the conversation
//! state and the renderer.
//!
//! Backend payloads vary in shape between versions; the client's
//! normalization adapter maps them onto these types, so everything past the
//! client boundary sees exactly one shape.

use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Deserializer, Serialize};

/// Fixed marker at the start of every placeholder source document.
pub const PLACEHOLDER_MARKER: &str = "[MOCK CONTENT - BACKEND ENDPOINT NOT FOUND]";

/// `null` decodes the same as a missing field.
fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Default + Deserialize<'de>,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

/// Backend-assigned urgency/category of an answer.
///
/// Unknown values are kept verbatim in [`Tier::Other`] so that a newer
/// backend never breaks parsing.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Tier {
    Tier1,
    Tier2Evidence,
    Tier2Compensation,
    Tier3,
    #[default]
    Standard,
    Other(String),
}

impl Tier {
    pub fn as_str(&self) -> &str {
        match self {
            Tier::Tier1 => "tier1",
            Tier::Tier2Evidence => "tier2_evidence",
            Tier::Tier2Compensation => "tier2_compensation",
            Tier::Tier3 => "tier3",
            Tier::Standard => "standard",
            Tier::Other(s) => s,
        }
    }
}

impl From<String> for Tier {
    fn from(s: String) -> Self {
        match s.as_str() {
            "tier1" => Tier::Tier1,
            "tier2_evidence" => Tier::Tier2Evidence,
            "tier2_compensation" => Tier::Tier2Compensation,
            "tier3" => Tier::Tier3,
            "standard" => Tier::Standard,
            _ => Tier::Other(s),
        }
    }
}

impl From<&str> for Tier {
    fn from(s: &str) -> Self {
        Tier::from(s.to_string())
    }
}

impl From<Tier> for String {
    fn from(t: Tier) -> Self {
        t.as_str().to_string()
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// How strongly the backend stands behind an answer.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum Confidence {
    #[default]
    High,
    Medium,
    Low,
    Other(String),
}

impl Confidence {
    pub fn as_str(&self) -> &str {
        match self {
            Confidence::High => "high",
            Confidence::Medium => "medium",
            Confidence::Low => "low",
            Confidence::Other(s) => s,
        }
    }

    /// Medium and low confidence attach a caveat to procedural timelines.
    pub fn is_uncertain(&self) -> bool {
        matches!(self, Confidence::Medium | Confidence::Low)
    }
}

impl From<String> for Confidence {
    fn from(s: String) -> Self {
        match s.as_str() {
            "high" => Confidence::High,
            "medium" => Confidence::Medium,
            "low" => Confidence::Low,
            _ => Confidence::Other(s),
        }
    }
}

impl From<&str> for Confidence {
    fn from(s: &str) -> Self {
        Confidence::from(s.to_string())
    }
}

impl From<Confidence> for String {
    fn from(c: Confidence) -> Self {
        c.as_str().to_string()
    }
}

/// A reference from an answer to a retrievable source.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub source_type: String,
    pub source_id: String,
    pub display: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevance: Option<f32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub snippet: Option<String>,
}

impl Citation {
    pub fn new(
        source_type: impl Into<String>,
        source_id: impl Into<String>,
        display: impl Into<String>,
    ) -> Self {
        Self {
            source_type: source_type.into(),
            source_id: source_id.into(),
            display: display.into(),
            relevance: None,
            snippet: None,
        }
    }

    /// Parse a `"source_type:source_id"` key, as used by older backends and
    /// by sentence-citation mappings. Keys without a colon are kept whole as
    /// a generic reference.
    pub fn from_key(key: &str) -> Self {
        let key = key.trim();
        match key.split_once(':') {
            Some((source_type, source_id)) => Self::new(source_type, source_id, key),
            None => Self::new("reference", key, key),
        }
    }

    /// Cache and mapping key: `"{source_type}:{source_id}"`.
    pub fn key(&self) -> String {
        format!("{}:{}", self.source_type, self.source_id)
    }
}

/// One answer sentence, addressable by its sentence id.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Sentence {
    pub sid: String,
    pub text: String,
}

/// Association of answer sentences to the citations that support them.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SentenceCitations {
    #[serde(default, deserialize_with = "null_as_default")]
    pub sentences: Vec<Sentence>,
    /// sid → citation keys (`"source_type:source_id"`).
    #[serde(default, deserialize_with = "null_as_default")]
    pub mapping: BTreeMap<String, Vec<String>>,
}

impl SentenceCitations {
    pub fn keys_for(&self, sid: &str) -> &[String] {
        self.mapping.get(sid).map(Vec::as_slice).unwrap_or(&[])
    }
}

/// A single step of a procedural timeline.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimelineItem {
    pub stage: String,
    pub action: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deadline: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub mandatory: bool,
    #[serde(default, deserialize_with = "null_as_default")]
    pub legal_basis: Vec<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub is_anchor: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audience: Option<String>,
}

impl TimelineItem {
    /// Anchor items addressed to the victim are actions the user must take
    /// themselves; everything else is handled by an authority.
    pub fn is_victim_critical(&self) -> bool {
        self.is_anchor && self.audience.as_deref() == Some("victim")
    }
}

/// A backend request to disambiguate intent from a fixed option set.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClarificationRequest {
    #[serde(rename = "type")]
    pub kind: String,
    pub options: Vec<String>,
    pub prompt: String,
}

/// Out-of-band notice attached to an answer (degraded mode, stale data).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemNotice {
    #[serde(default = "default_notice_level")]
    pub level: String,
    pub message: String,
}

fn default_notice_level() -> String {
    "info".to_string()
}

impl SystemNotice {
    pub fn is_warning(&self) -> bool {
        self.level.eq_ignore_ascii_case("warning")
    }
}

/// The single internal shape of an assistant answer.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct QueryResponse {
    pub answer: String,
    pub tier: Tier,
    pub case_type: Option<String>,
    pub stage: Option<String>,
    pub citations: Vec<Citation>,
    pub timeline: Vec<TimelineItem>,
    pub sentence_citations: Option<SentenceCitations>,
    pub clarification_needed: Option<ClarificationRequest>,
    pub confidence: Confidence,
    pub system_notice: Option<SystemNotice>,
    pub safety_alert: Option<String>,
    pub immediate_action_plan: Vec<String>,
    pub procedure_steps: Vec<String>,
    pub important_notes: Vec<String>,
    pub legal_basis: Option<String>,
    pub intent: Option<String>,
    pub user_context: Option<String>,
}

impl QueryResponse {
    /// Find a citation of this answer by its `"type:id"` key.
    pub fn citation_by_key(&self, key: &str) -> Option<&Citation> {
        let (source_type, source_id) = key.split_once(':')?;
        self.citations
            .iter()
            .find(|c| c.source_type == source_type && c.source_id == source_id)
    }
}

/// Character range of a source document worth drawing attention to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HighlightRange {
    pub start: usize,
    pub end: usize,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Procedural metadata the backend attaches to some sources.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceMetadata {
    #[serde(default)]
    pub procedural_stage: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub stakeholders: Vec<String>,
    #[serde(default)]
    pub action_type: Option<String>,
    #[serde(default)]
    pub time_limit: Option<String>,
    #[serde(default)]
    pub sop_group: Option<String>,
    #[serde(default)]
    pub priority: Option<i64>,
}

/// Verbatim text of a cited source.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SourceDocument {
    pub source_type: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub section_id: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub content: String,
    #[serde(default, deserialize_with = "null_as_default")]
    pub legal_references: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_updated: Option<String>,
    #[serde(default, deserialize_with = "null_as_default")]
    pub highlights: Vec<HighlightRange>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<SourceMetadata>,
}

impl SourceDocument {
    /// True for the synthetic document substituted when the source
    /// endpoint is unavailable.
    pub fn is_placeholder(&self) -> bool {
        self.content.starts_with(PLACEHOLDER_MARKER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_tier_is_preserved() {
        let tier: Tier = serde_json::from_str(r#""tier9_experimental""#).unwrap();
        assert_eq!(tier, Tier::Other("tier9_experimental".into()));
        assert_eq!(serde_json::to_string(&tier).unwrap(), r#""tier9_experimental""#);
    }

    #[test]
    fn known_tiers_parse() {
        assert_eq!(Tier::from("tier1"), Tier::Tier1);
        assert_eq!(Tier::from("tier2_compensation"), Tier::Tier2Compensation);
        assert_eq!(Tier::default(), Tier::Standard);
    }

    #[test]
    fn confidence_uncertainty() {
        assert!(!Confidence::High.is_uncertain());
        assert!(Confidence::Medium.is_uncertain());
        assert!(Confidence::Low.is_uncertain());
        assert!(!Confidence::from("unsure").is_uncertain());
    }

    #[test]
    fn citation_key_parsing() {
        let c = Citation::from_key("bns:103");
        assert_eq!(c.source_type, "bns");
        assert_eq!(c.source_id, "103");
        assert_eq!(c.display, "bns:103");
        assert_eq!(c.key(), "bns:103");

        let bare = Citation::from_key("BNSS Section 173");
        assert_eq!(bare.source_type, "reference");
        assert_eq!(bare.source_id, "BNSS Section 173");
    }

    #[test]
    fn timeline_item_defaults() {
        let json = r#"{"stage": "investigation", "action": "Police record statement"}"#;
        let item: TimelineItem = serde_json::from_str(json).unwrap();
        assert!(!item.mandatory);
        assert!(!item.is_anchor);
        assert!(item.legal_basis.is_empty());
        assert!(!item.is_victim_critical());
    }

    #[test]
    fn citation_lookup_by_key() {
        let response = QueryResponse {
            citations: vec![
                Citation::new("bnss", "173", "BNSS Section 173"),
                Citation::new("bns", "103", "BNS Section 103"),
            ],
            ..Default::default()
        };
        let found = response.citation_by_key("bns:103").unwrap();
        assert_eq!(found.display, "BNS Section 103");
        assert!(response.citation_by_key("bns:999").is_none());
        assert!(response.citation_by_key("malformed").is_none());
    }

    #[test]
    fn source_document_tolerates_nulls() {
        let json = r#"{
            "source_type": "bns",
            "title": "Murder",
            "section_id": "103",
            "content": "Whoever commits murder...",
            "legal_references": null,
            "last_updated": null,
            "highlights": null,
            "metadata": {"procedural_stage": "trial", "stakeholders": null, "priority": null}
        }"#;
        let doc: SourceDocument = serde_json::from_str(json).unwrap();
        assert!(doc.highlights.is_empty());
        assert!(doc.legal_references.is_empty());
        assert!(doc.last_updated.is_none());
        let meta = doc.metadata.unwrap();
        assert!(meta.stakeholders.is_empty());
        assert_eq!(meta.procedural_stage.as_deref(), Some("trial"));
        assert!(!doc.content.is_empty());
    }

    #[test]
    fn timeline_item_null_flags() {
        let json = r#"{"stage": "trial", "action": "Attend hearing", "mandatory": null, "is_anchor": null, "legal_basis": null}"#;
        let item: TimelineItem = serde_json::from_str(json).unwrap();
        assert!(!item.mandatory);
        assert!(!item.is_anchor);
        assert!(item.legal_basis.is_empty());
    }

    #[test]
    fn placeholder_detection() {
        let doc = SourceDocument {
            source_type: "bns".into(),
            title: "Mock Source: 103".into(),
            section_id: "103".into(),
            content: format!("{PLACEHOLDER_MARKER}\n\nplaceholder"),
            legal_references: vec![],
            last_updated: None,
            highlights: vec![],
            metadata: None,
        };
        assert!(doc.is_placeholder());
    }
}
