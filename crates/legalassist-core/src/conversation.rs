//! In-memory conversation state for one session.
//!
//! [`Conversation`] is the single owner of the turn list and the carried
//! context. Turns are only ever appended; the in-flight flag serializes
//! queries so assistant turns land in the order their requests were issued.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::context::{ConversationContext, apply_clarification, update_context};
use crate::error::SessionError;
use crate::types::{ClarificationRequest, QueryResponse};

/// Reply shown in place of an answer when the query path fails.
pub const ERROR_REPLY: &str = "I apologize, but I encountered an error while processing your request. Please check if the backend is running.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Assistant,
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Role::User => f.write_str("user"),
            Role::Assistant => f.write_str("assistant"),
        }
    }
}

/// One entry of the conversation. Immutable once appended.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Turn {
    pub id: u64,
    pub role: Role,
    pub content: String,
    /// Structured answer fields; only set on successful assistant turns.
    pub response: Option<QueryResponse>,
    /// Set on the inline error turn appended when a query fails.
    pub failed: bool,
    pub timestamp: DateTime<Utc>,
}

impl Turn {
    pub fn clarification(&self) -> Option<&ClarificationRequest> {
        self.response
            .as_ref()
            .and_then(|r| r.clarification_needed.as_ref())
    }
}

/// A query that has been admitted and must now be sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PendingQuery {
    pub query: String,
    pub context: ConversationContext,
}

#[derive(Debug, Default)]
pub struct Conversation {
    turns: Vec<Turn>,
    context: ConversationContext,
    next_id: u64,
    in_flight: bool,
}

impl Conversation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn turns(&self) -> &[Turn] {
        &self.turns
    }

    pub fn context(&self) -> &ConversationContext {
        &self.context
    }

    pub fn last_turn(&self) -> Option<&Turn> {
        self.turns.last()
    }

    /// Most recent successful assistant answer, if any.
    pub fn last_response(&self) -> Option<&QueryResponse> {
        self.turns.iter().rev().find_map(|t| t.response.as_ref())
    }

    pub fn is_in_flight(&self) -> bool {
        self.in_flight
    }

    /// The clarification the user must answer before typing free text.
    ///
    /// Pending iff the latest turn is an assistant turn carrying a
    /// clarification and no request is in flight.
    pub fn pending_clarification(&self) -> Option<&ClarificationRequest> {
        if self.in_flight {
            return None;
        }
        self.turns
            .last()
            .filter(|t| t.role == Role::Assistant)
            .and_then(Turn::clarification)
    }

    pub fn is_clarification_pending(&self) -> bool {
        self.pending_clarification().is_some()
    }

    pub fn append_user_turn(&mut self, text: impl Into<String>) -> &Turn {
        self.push(Role::User, text.into(), None, false)
    }

    pub fn append_assistant_turn(&mut self, response: QueryResponse) -> &Turn {
        let content = response.answer.clone();
        self.push(Role::Assistant, content, Some(response), false)
    }

    pub fn append_error_turn(&mut self) -> &Turn {
        self.push(Role::Assistant, ERROR_REPLY.to_string(), None, true)
    }

    /// Admit a free-text query.
    ///
    /// Rejected while another request is in flight or while a clarification
    /// is waiting for an answer.
    pub fn begin_query(&mut self, text: &str) -> Result<PendingQuery, SessionError> {
        if self.in_flight {
            return Err(SessionError::RequestInFlight);
        }
        if self.is_clarification_pending() {
            return Err(SessionError::ClarificationPending);
        }
        self.start(text)
    }

    /// Answer the pending clarification with one of its options.
    ///
    /// `choice` is either a 1-based option number or the option text
    /// (case-insensitive). The context field named by the clarification kind
    /// is updated before the query is admitted, so the request already
    /// carries the user's choice.
    pub fn select_option(&mut self, choice: &str) -> Result<PendingQuery, SessionError> {
        if self.in_flight {
            return Err(SessionError::RequestInFlight);
        }
        let clarification = self
            .pending_clarification()
            .ok_or(SessionError::NoClarification)?;
        let option = resolve_option(clarification, choice)
            .ok_or_else(|| SessionError::UnknownOption(choice.trim().to_string()))?;
        let kind = clarification.kind.clone();

        self.context = apply_clarification(&self.context, &kind, &option);
        debug!(kind = %kind, option = %option, "clarification resolved");
        self.start(&option)
    }

    /// Record the outcome of the in-flight query.
    ///
    /// Success appends the answer and merges its case type and stage into
    /// the context. Failure appends an inline error turn and leaves the
    /// context as it was, so the user can simply send again.
    pub fn complete_query<E: fmt::Display>(&mut self, result: Result<QueryResponse, E>) -> &Turn {
        if !self.in_flight {
            warn!("query completed with no request in flight");
        }
        self.in_flight = false;
        match result {
            Ok(response) => {
                self.context = update_context(&self.context, &response);
                self.append_assistant_turn(response)
            }
            Err(e) => {
                warn!(error = %e, "query failed");
                self.append_error_turn()
            }
        }
    }

    fn start(&mut self, text: &str) -> Result<PendingQuery, SessionError> {
        let query = text.trim();
        if query.is_empty() {
            return Err(SessionError::EmptyQuery);
        }
        self.append_user_turn(query);
        self.in_flight = true;
        Ok(PendingQuery {
            query: query.to_string(),
            context: self.context.clone(),
        })
    }

    fn push(
        &mut self,
        role: Role,
        content: String,
        response: Option<QueryResponse>,
        failed: bool,
    ) -> &Turn {
        self.next_id += 1;
        self.turns.push(Turn {
            id: self.next_id,
            role,
            content,
            response,
            failed,
            timestamp: Utc::now(),
        });
        &self.turns[self.turns.len() - 1]
    }
}

fn resolve_option(clarification: &ClarificationRequest, choice: &str) -> Option<String> {
    let choice = choice.trim();
    if let Ok(n) = choice.parse::<usize>() {
        return n
            .checked_sub(1)
            .and_then(|i| clarification.options.get(i))
            .cloned();
    }
    clarification
        .options
        .iter()
        .find(|o| o.eq_ignore_ascii_case(choice))
        .cloned()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Citation, TimelineItem, Tier};

    fn clarifying(kind: &str, options: &[&str]) -> QueryResponse {
        QueryResponse {
            answer: "Which stage is your case at?".into(),
            clarification_needed: Some(ClarificationRequest {
                kind: kind.into(),
                options: options.iter().map(|s| s.to_string()).collect(),
                prompt: "Which stage is your case at?".into(),
            }),
            ..Default::default()
        }
    }

    #[test]
    fn zero_fir_scenario() {
        let mut convo = Conversation::new();
        let pending = convo.begin_query("How do I file a Zero FIR?").unwrap();
        assert_eq!(pending.context, ConversationContext::default());
        assert!(convo.is_in_flight());

        let response = QueryResponse {
            answer: "You can file a Zero FIR at any police station.".into(),
            tier: Tier::Tier1,
            case_type: Some("FIR".into()),
            stage: Some("reporting".into()),
            citations: vec![Citation::new("bnss", "173", "BNSS Section 173")],
            timeline: vec![TimelineItem {
                stage: "reporting".into(),
                action: "Visit nearest police station".into(),
                deadline: None,
                mandatory: true,
                legal_basis: vec!["BNSS Section 173".into()],
                is_anchor: true,
                audience: Some("victim".into()),
            }],
            ..Default::default()
        };
        let turn = convo.complete_query::<String>(Ok(response));
        assert_eq!(turn.role, Role::Assistant);
        assert!(!convo.is_in_flight());
        assert_eq!(convo.context().last_case_type.as_deref(), Some("FIR"));
        assert_eq!(convo.context().last_stage.as_deref(), Some("reporting"));
        assert_eq!(convo.turns().len(), 2);
    }

    #[test]
    fn second_query_rejected_while_in_flight() {
        let mut convo = Conversation::new();
        convo.begin_query("first").unwrap();
        assert_eq!(convo.begin_query("second"), Err(SessionError::RequestInFlight));
        assert_eq!(convo.turns().len(), 1);
    }

    #[test]
    fn empty_query_rejected() {
        let mut convo = Conversation::new();
        assert_eq!(convo.begin_query("   "), Err(SessionError::EmptyQuery));
        assert!(convo.turns().is_empty());
        assert!(!convo.is_in_flight());
    }

    #[test]
    fn failure_appends_error_turn_and_keeps_context() {
        let mut convo = Conversation::new();
        convo.begin_query("first").unwrap();
        convo.complete_query::<String>(Ok(QueryResponse {
            case_type: Some("theft".into()),
            ..Default::default()
        }));
        let before = convo.context().clone();

        convo.begin_query("second").unwrap();
        let turn = convo.complete_query(Err::<QueryResponse, _>("connection refused"));
        assert!(turn.failed);
        assert_eq!(turn.content, ERROR_REPLY);
        assert_eq!(convo.context(), &before);

        // The user can retry straight away.
        assert!(convo.begin_query("second again").is_ok());
    }

    #[test]
    fn clarification_blocks_free_text() {
        let mut convo = Conversation::new();
        convo.begin_query("my phone was stolen").unwrap();
        convo.complete_query::<String>(Ok(clarifying("stage", &["pre_fir", "post_fir"])));

        assert!(convo.is_clarification_pending());
        assert_eq!(
            convo.begin_query("hello?"),
            Err(SessionError::ClarificationPending)
        );
    }

    #[test]
    fn stage_option_updates_context_before_request() {
        let mut convo = Conversation::new();
        convo.begin_query("my phone was stolen").unwrap();
        convo.complete_query::<String>(Ok(clarifying("stage", &["pre_fir", "post_fir"])));

        let pending = convo.select_option("post_fir").unwrap();
        assert_eq!(pending.query, "post_fir");
        assert_eq!(pending.context.last_stage.as_deref(), Some("post_fir"));
        assert_eq!(convo.context().last_stage.as_deref(), Some("post_fir"));
        assert!(!convo.is_clarification_pending());
        assert_eq!(convo.last_turn().unwrap().role, Role::User);
    }

    #[test]
    fn option_by_number_and_case_insensitive_text() {
        let mut convo = Conversation::new();
        convo.begin_query("help").unwrap();
        convo.complete_query::<String>(Ok(clarifying("case_type", &["Theft", "Cyber_Fraud"])));

        let pending = convo.select_option("2").unwrap();
        assert_eq!(pending.query, "Cyber_Fraud");
        assert_eq!(pending.context.last_case_type.as_deref(), Some("Cyber_Fraud"));

        let mut convo = Conversation::new();
        convo.begin_query("help").unwrap();
        convo.complete_query::<String>(Ok(clarifying("case_type", &["Theft", "Cyber_Fraud"])));
        assert_eq!(convo.select_option("theft").unwrap().query, "Theft");
    }

    #[test]
    fn unknown_option_rejected_without_side_effects() {
        let mut convo = Conversation::new();
        convo.begin_query("help").unwrap();
        convo.complete_query::<String>(Ok(clarifying("stage", &["pre_fir"])));
        let before = convo.context().clone();

        assert_eq!(
            convo.select_option("5"),
            Err(SessionError::UnknownOption("5".into()))
        );
        assert_eq!(
            convo.select_option("trial"),
            Err(SessionError::UnknownOption("trial".into()))
        );
        assert_eq!(convo.context(), &before);
        assert!(convo.is_clarification_pending());
    }

    #[test]
    fn select_without_clarification_fails() {
        let mut convo = Conversation::new();
        assert_eq!(convo.select_option("1"), Err(SessionError::NoClarification));
    }

    #[test]
    fn turn_ids_increase() {
        let mut convo = Conversation::new();
        convo.append_user_turn("a");
        convo.append_error_turn();
        convo.append_user_turn("b");
        let ids: Vec<u64> = convo.turns().iter().map(|t| t.id).collect();
        assert_eq!(ids, vec![1, 2, 3]);
    }
}
