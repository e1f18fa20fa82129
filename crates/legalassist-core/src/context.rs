//! Conversational context carried from one turn to the next.
//!
//! The backend uses `last_case_type` and `last_stage` to keep topic
//! continuity across turns. The client never infers them; it only echoes
//! what the backend (or the user, via a clarification) supplied.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::types::QueryResponse;

/// Topic continuity sent with every query.
///
/// Serialized with explicit nulls, which is what the backend expects on the
/// first turn.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConversationContext {
    pub last_case_type: Option<String>,
    pub last_stage: Option<String>,
}

impl ConversationContext {
    pub fn is_empty(&self) -> bool {
        self.last_case_type.is_none() && self.last_stage.is_none()
    }
}

/// Merge the case type and stage of a fresh answer into the context.
///
/// Fields are sticky: a field is only overwritten by an explicit value from
/// the response, otherwise the previous value is kept.
pub fn update_context(prev: &ConversationContext, response: &QueryResponse) -> ConversationContext {
    ConversationContext {
        last_case_type: response
            .case_type
            .clone()
            .or_else(|| prev.last_case_type.clone()),
        last_stage: response.stage.clone().or_else(|| prev.last_stage.clone()),
    }
}

/// Apply a clarification choice directly to the context.
///
/// The user's selection is authoritative, so it is written before the next
/// request goes out instead of waiting for the backend to echo it.
/// Unrecognised clarification kinds leave the context unchanged.
pub fn apply_clarification(
    prev: &ConversationContext,
    kind: &str,
    option: &str,
) -> ConversationContext {
    let mut next = prev.clone();
    match kind {
        "case_type" | "last_case_type" => next.last_case_type = Some(option.to_string()),
        "stage" | "last_stage" => next.last_stage = Some(option.to_string()),
        other => debug!(kind = other, "clarification kind does not map to a context field"),
    }
    next
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ctx(case_type: Option<&str>, stage: Option<&str>) -> ConversationContext {
        ConversationContext {
            last_case_type: case_type.map(String::from),
            last_stage: stage.map(String::from),
        }
    }

    fn response(case_type: Option<&str>, stage: Option<&str>) -> QueryResponse {
        QueryResponse {
            case_type: case_type.map(String::from),
            stage: stage.map(String::from),
            ..Default::default()
        }
    }

    #[test]
    fn missing_fields_are_sticky() {
        let prev = ctx(Some("FIR"), Some("reporting"));
        let next = update_context(&prev, &response(None, None));
        assert_eq!(next, prev);
    }

    #[test]
    fn present_case_type_always_wins() {
        for prev in [ctx(None, None), ctx(Some("FIR"), None), ctx(Some("theft"), Some("trial"))] {
            let next = update_context(&prev, &response(Some("cyber_fraud"), None));
            assert_eq!(next.last_case_type.as_deref(), Some("cyber_fraud"));
            assert_eq!(next.last_stage, prev.last_stage);
        }
    }

    #[test]
    fn stage_updates_independently() {
        let prev = ctx(Some("FIR"), Some("reporting"));
        let next = update_context(&prev, &response(None, Some("investigation")));
        assert_eq!(next, ctx(Some("FIR"), Some("investigation")));
    }

    #[test]
    fn clarification_stage_writes_stage() {
        let prev = ctx(Some("FIR"), None);
        assert_eq!(
            apply_clarification(&prev, "stage", "post_fir"),
            ctx(Some("FIR"), Some("post_fir"))
        );
        assert_eq!(
            apply_clarification(&prev, "last_stage", "trial"),
            ctx(Some("FIR"), Some("trial"))
        );
    }

    #[test]
    fn clarification_case_type_writes_case_type() {
        let prev = ctx(Some("FIR"), Some("reporting"));
        assert_eq!(
            apply_clarification(&prev, "case_type", "domestic_violence"),
            ctx(Some("domestic_violence"), Some("reporting"))
        );
        assert_eq!(
            apply_clarification(&prev, "last_case_type", "theft"),
            ctx(Some("theft"), Some("reporting"))
        );
    }

    #[test]
    fn unknown_clarification_kind_is_ignored() {
        let prev = ctx(None, Some("reporting"));
        assert_eq!(apply_clarification(&prev, "jurisdiction", "Delhi"), prev);
    }

    #[test]
    fn empty_context_serializes_with_nulls() {
        let json = serde_json::to_string(&ConversationContext::default()).unwrap();
        assert_eq!(json, r#"{"last_case_type":null,"last_stage":null}"#);
    }
}
