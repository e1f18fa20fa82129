//! Backend payload normalization.
//!
//! The backend has shipped several response shapes: tier data nested under
//! `tier_info`, citations as `"type:id"` strings or as objects, and the older
//! `/api/v1/query` shape with `sources` and numeric confidence. This module
//! is the only place that knows about any of them; it produces a
//! [`QueryResponse`] with every optional field defaulted.

use legalassist_core::{
    Citation, ClarificationRequest, Confidence, QueryResponse, Tier, TimelineItem,
};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Prompt used when a clarification carries neither `question` nor `reason`.
pub const DEFAULT_CLARIFICATION_PROMPT: &str = "Please select an option to proceed:";

/// Numeric confidence at or above this is reported as high.
const HIGH_CONFIDENCE: f64 = 0.75;
/// Numeric confidence at or above this (and below high) is reported as medium.
const MEDIUM_CONFIDENCE: f64 = 0.5;

/// Every top-level field is held as raw JSON, so a field of the wrong type
/// degrades to its default instead of failing the whole answer.
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawQueryResponse {
    answer: Option<Value>,
    tier: Option<Value>,
    tier_info: Option<Value>,
    case_type: Option<Value>,
    stage: Option<Value>,
    citations: Option<Value>,
    sources: Option<Value>,
    timeline: Option<Value>,
    sentence_citations: Option<Value>,
    clarification_needed: Option<Value>,
    confidence: Option<Value>,
    system_notice: Option<Value>,
    safety_alert: Option<Value>,
    immediate_action_plan: Option<Value>,
    procedure_steps: Option<Value>,
    important_notes: Option<Value>,
    legal_basis: Option<Value>,
    metadata: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawTierInfo {
    tier: Option<Value>,
    case_type: Option<Value>,
    detected_stages: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawClarification {
    #[serde(rename = "type")]
    kind: Option<Value>,
    options: Option<Value>,
    question: Option<Value>,
    reason: Option<Value>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RawMetadata {
    confidence: Option<Value>,
    intent: Option<Value>,
    user_context: Option<Value>,
}

/// Parse and normalize a raw query response body.
pub fn parse_query_response(body: &str) -> Result<QueryResponse, serde_json::Error> {
    let value: Value = serde_json::from_str(body)?;
    normalize_query_response(value)
}

/// Normalize an already-decoded query response.
///
/// Fails only when the payload is not a JSON object at all; individual
/// malformed fields are dropped with a warning.
pub fn normalize_query_response(value: Value) -> Result<QueryResponse, serde_json::Error> {
    if !value.is_object() {
        return Err(<serde_json::Error as serde::de::Error>::custom(
            "query response is not a JSON object",
        ));
    }
    let raw: RawQueryResponse = serde_json::from_value(value)?;
    let tier_info: RawTierInfo = nested(raw.tier_info, "tier_info").unwrap_or_default();
    let metadata: RawMetadata = nested(raw.metadata, "metadata").unwrap_or_default();

    let tier = text(tier_info.tier, "tier_info.tier")
        .or_else(|| text(raw.tier, "tier"))
        .map(Tier::from)
        .unwrap_or_default();
    let case_type = text(tier_info.case_type, "tier_info.case_type")
        .or_else(|| text(raw.case_type, "case_type"));
    let stage = strings(tier_info.detected_stages, "tier_info.detected_stages")
        .into_iter()
        .next()
        .or_else(|| text(raw.stage, "stage"));

    let mut citations: Vec<Citation> = array(raw.citations, "citations")
        .iter()
        .filter_map(citation_from_value)
        .collect();
    citations.extend(
        array(raw.sources, "sources")
            .iter()
            .filter_map(citation_from_source),
    );

    let confidence = raw
        .confidence
        .filter(|v| !v.is_null())
        .or(metadata.confidence.filter(|v| !v.is_null()))
        .map(|v| confidence_from_value(&v))
        .unwrap_or_default();

    Ok(QueryResponse {
        answer: text(raw.answer, "answer").unwrap_or_default(),
        tier,
        case_type,
        stage,
        citations,
        timeline: array(raw.timeline, "timeline")
            .into_iter()
            .filter_map(|v| lenient::<TimelineItem>(v, "timeline item"))
            .collect(),
        sentence_citations: nested(raw.sentence_citations, "sentence citations"),
        clarification_needed: nested::<RawClarification>(raw.clarification_needed, "clarification")
            .and_then(clarification_from_raw),
        confidence,
        system_notice: nested(raw.system_notice, "system notice"),
        safety_alert: text(raw.safety_alert, "safety_alert"),
        immediate_action_plan: strings(raw.immediate_action_plan, "immediate_action_plan"),
        procedure_steps: strings(raw.procedure_steps, "procedure_steps"),
        important_notes: strings(raw.important_notes, "important_notes"),
        legal_basis: text(raw.legal_basis, "legal_basis"),
        intent: text(metadata.intent, "metadata.intent"),
        user_context: text(metadata.user_context, "metadata.user_context"),
    })
}

fn lenient<T: DeserializeOwned>(value: Value, what: &str) -> Option<T> {
    match serde_json::from_value(value) {
        Ok(v) => Some(v),
        Err(e) => {
            warn!(error = %e, "dropping malformed {what}");
            None
        }
    }
}

/// An optional object field; `null` counts as absent.
fn nested<T: DeserializeOwned>(value: Option<Value>, what: &str) -> Option<T> {
    value
        .filter(|v| !v.is_null())
        .and_then(|v| lenient(v, what))
}

/// An optional list field. Anything other than an array is dropped.
fn array(value: Option<Value>, what: &str) -> Vec<Value> {
    match value {
        None | Some(Value::Null) => Vec::new(),
        Some(Value::Array(items)) => items,
        Some(other) => {
            warn!(field = what, value = %other, "expected a list, dropping");
            Vec::new()
        }
    }
}

/// A scalar field as text. Empty strings count as absent, numbers are
/// stringified, and anything else is dropped with a warning.
fn text(value: Option<Value>, what: &str) -> Option<String> {
    let value = value.filter(|v| !v.is_null())?;
    let s = scalar_string(&value);
    if s.is_none() && !value.is_string() {
        warn!(field = what, value = %value, "dropping non-scalar field");
    }
    s
}

/// A list of strings. A bare string counts as a one-item list; items that
/// are not scalars are dropped.
fn strings(value: Option<Value>, what: &str) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .into_iter()
            .filter_map(|item| text(Some(item), what))
            .collect(),
        other => text(other, what).into_iter().collect(),
    }
}

fn scalar_string(value: &Value) -> Option<String> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn citation_from_value(value: &Value) -> Option<Citation> {
    match value {
        Value::String(s) if !s.trim().is_empty() => Some(Citation::from_key(s)),
        Value::Object(map) => {
            let source_type = map.get("source_type").and_then(scalar_string);
            let source_id = map.get("source_id").and_then(scalar_string);
            let (Some(source_type), Some(source_id)) = (source_type, source_id) else {
                warn!(citation = %value, "dropping citation without source_type/source_id");
                return None;
            };
            let display = map
                .get("display")
                .and_then(scalar_string)
                .unwrap_or_else(|| format!("{source_type}:{source_id}"));
            Some(Citation {
                source_type,
                source_id,
                display,
                relevance: map.get("relevance").and_then(Value::as_f64).map(|f| f as f32),
                snippet: map.get("snippet").and_then(scalar_string),
            })
        }
        _ => {
            warn!(citation = %value, "dropping unrecognised citation");
            None
        }
    }
}

/// Entry of the `/api/v1/query` `sources` list: `{law, section, citation, text}`.
fn citation_from_source(value: &Value) -> Option<Citation> {
    let Value::Object(map) = value else {
        warn!(source = %value, "dropping unrecognised source");
        return None;
    };
    let field = |key: &str| map.get(key).and_then(scalar_string);
    let (Some(law), Some(section)) = (field("law"), field("section")) else {
        warn!(source = %value, "dropping source without law/section");
        return None;
    };
    let display = field("citation").unwrap_or_else(|| format!("{law} {section}"));
    Some(Citation {
        source_type: law,
        source_id: section,
        display,
        relevance: None,
        snippet: field("text"),
    })
}

fn confidence_from_value(value: &Value) -> Confidence {
    match value {
        Value::String(s) => Confidence::from(s.to_ascii_lowercase()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f >= HIGH_CONFIDENCE => Confidence::High,
            Some(f) if f >= MEDIUM_CONFIDENCE => Confidence::Medium,
            Some(_) => Confidence::Low,
            None => Confidence::default(),
        },
        _ => Confidence::default(),
    }
}

fn clarification_from_raw(raw: RawClarification) -> Option<ClarificationRequest> {
    let options = strings(raw.options, "clarification options");
    if options.is_empty() {
        // Nothing to choose from: treating it as pending would lock the input.
        warn!("ignoring clarification without options");
        return None;
    }
    let prompt = text(raw.question, "clarification question")
        .or_else(|| text(raw.reason, "clarification reason"))
        .unwrap_or_else(|| DEFAULT_CLARIFICATION_PROMPT.to_string());
    Some(ClarificationRequest {
        kind: text(raw.kind, "clarification type").unwrap_or_default(),
        options,
        prompt,
    })
}
