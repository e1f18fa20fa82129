//! Mapping a normalized answer onto ordered display sections.
//!
//! [`render_response`] is deterministic and order-preserving. Each section
//! is omitted when its data is absent. Nothing here touches a terminal; the
//! CLI decides how a section looks.

use crate::labels::{ConfidenceBadge, TierBadge, confidence_badge, tier_badge};
use crate::types::{
    Citation, ClarificationRequest, Confidence, QueryResponse, SentenceCitations, TimelineItem,
};

pub const EMERGENCY_NUMBER: &str = "112";

pub const TIMELINE_CAVEAT: &str = "Some procedural steps may vary by facts or jurisdiction.";

const VICTIM_DISTRESS: &str = "victim_distress";

/// Check/uncheck state of the immediate action plan.
///
/// Local view state: it lives as long as the rendered answer and is never
/// sent to the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checklist {
    steps: Vec<String>,
    checked: Vec<bool>,
}

impl Checklist {
    pub fn new(steps: Vec<String>) -> Self {
        let checked = vec![false; steps.len()];
        Self { steps, checked }
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn items(&self) -> impl Iterator<Item = (&str, bool)> {
        self.steps
            .iter()
            .map(String::as_str)
            .zip(self.checked.iter().copied())
    }

    pub fn is_checked(&self, index: usize) -> bool {
        self.checked.get(index).copied().unwrap_or(false)
    }

    /// Flip one step; returns the new state, or `None` if out of range.
    pub fn toggle(&mut self, index: usize) -> Option<bool> {
        let slot = self.checked.get_mut(index)?;
        *slot = !*slot;
        Some(*slot)
    }

    pub fn completed(&self) -> usize {
        self.checked.iter().filter(|c| **c).count()
    }
}

/// One answer sentence with the citations that support it.
#[derive(Debug, Clone, PartialEq)]
pub struct SentenceSpan {
    pub sid: String,
    pub text: String,
    pub citation_keys: Vec<String>,
    /// The first mapped citation; opening the span opens this one.
    pub target: Option<Citation>,
}

impl SentenceSpan {
    pub fn is_clickable(&self) -> bool {
        self.target.is_some()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnswerBody {
    Text(String),
    Sentences(Vec<SentenceSpan>),
}

/// A timeline split into actions for the user and steps for authorities.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineView {
    pub critical: Vec<TimelineItem>,
    pub procedural: Vec<TimelineItem>,
    pub caveat: Option<&'static str>,
}

impl TimelineView {
    pub fn is_empty(&self) -> bool {
        self.critical.is_empty() && self.procedural.is_empty()
    }

    /// Plain-text checklist suitable for copying out of the terminal.
    pub fn checklist_text(&self) -> String {
        let mut lines = Vec::new();
        if !self.critical.is_empty() {
            lines.push("CRITICAL ACTIONS (YOU):".to_string());
            for item in &self.critical {
                match &item.deadline {
                    Some(d) => lines.push(format!("[ ] {} (Due: {})", item.action, d)),
                    None => lines.push(format!("[ ] {}", item.action)),
                }
            }
            lines.push(String::new());
        }
        if !self.procedural.is_empty() {
            lines.push("PROCEDURAL STEPS:".to_string());
            for item in &self.procedural {
                lines.push(format!("[ ] {} ({})", item.action, item.stage));
            }
            lines.push(String::new());
        }
        if let Some(caveat) = self.caveat {
            lines.push(format!("NOTE: {caveat}"));
        }
        lines.join("\n")
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Section {
    SystemNotice {
        title: &'static str,
        message: String,
        warning: bool,
    },
    SafetyAlert {
        message: String,
        emergency_number: &'static str,
    },
    ActionPlan(Checklist),
    Answer {
        heading: &'static str,
        body: AnswerBody,
        legal_basis: Option<String>,
    },
    ProcedureSteps(Vec<String>),
    ImportantNotes(Vec<String>),
    Timeline(TimelineView),
    Citations(Vec<Citation>),
    Clarification(ClarificationRequest),
}

impl Section {
    pub fn name(&self) -> &'static str {
        match self {
            Section::SystemNotice { .. } => "system_notice",
            Section::SafetyAlert { .. } => "safety_alert",
            Section::ActionPlan(_) => "action_plan",
            Section::Answer { .. } => "answer",
            Section::ProcedureSteps(_) => "procedure_steps",
            Section::ImportantNotes(_) => "important_notes",
            Section::Timeline(_) => "timeline",
            Section::Citations(_) => "citations",
            Section::Clarification(_) => "clarification",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct RenderedResponse {
    pub tier: TierBadge,
    pub confidence: Option<ConfidenceBadge>,
    /// Free-form backend tags (intent, user context).
    pub tags: Vec<String>,
    pub sections: Vec<Section>,
}

impl RenderedResponse {
    pub fn section_names(&self) -> Vec<&'static str> {
        self.sections.iter().map(Section::name).collect()
    }

    pub fn checklist_mut(&mut self) -> Option<&mut Checklist> {
        self.sections.iter_mut().find_map(|s| match s {
            Section::ActionPlan(c) => Some(c),
            _ => None,
        })
    }

    pub fn timeline(&self) -> Option<&TimelineView> {
        self.sections.iter().find_map(|s| match s {
            Section::Timeline(t) => Some(t),
            _ => None,
        })
    }

    pub fn sentence(&self, sid: &str) -> Option<&SentenceSpan> {
        self.sections.iter().find_map(|s| match s {
            Section::Answer {
                body: AnswerBody::Sentences(spans),
                ..
            } => spans.iter().find(|span| span.sid == sid),
            _ => None,
        })
    }
}

/// Render one assistant answer.
pub fn render_response(response: &QueryResponse) -> RenderedResponse {
    let mut sections = Vec::new();

    if let Some(notice) = &response.system_notice {
        let warning = notice.is_warning();
        sections.push(Section::SystemNotice {
            title: if warning { "Notice" } else { "Info" },
            message: notice.message.clone(),
            warning,
        });
    }

    if let Some(alert) = non_empty(&response.safety_alert) {
        sections.push(Section::SafetyAlert {
            message: alert.to_string(),
            emergency_number: EMERGENCY_NUMBER,
        });
    }

    if !response.immediate_action_plan.is_empty() {
        sections.push(Section::ActionPlan(Checklist::new(
            response.immediate_action_plan.clone(),
        )));
    }

    if let Some(body) = answer_body(response) {
        sections.push(Section::Answer {
            heading: if is_victim_context(response) {
                "Guidance & Advice"
            } else {
                "Legal Analysis"
            },
            body,
            legal_basis: non_empty(&response.legal_basis).map(String::from),
        });
    }

    if !response.procedure_steps.is_empty() {
        sections.push(Section::ProcedureSteps(response.procedure_steps.clone()));
    }

    if !response.important_notes.is_empty() {
        sections.push(Section::ImportantNotes(response.important_notes.clone()));
    }

    let timeline = partition_timeline(&response.timeline, &response.confidence);
    if !timeline.is_empty() {
        sections.push(Section::Timeline(timeline));
    }

    if !response.citations.is_empty() {
        sections.push(Section::Citations(response.citations.clone()));
    }

    if let Some(clarification) = &response.clarification_needed {
        sections.push(Section::Clarification(clarification.clone()));
    }

    let tags = [&response.intent, &response.user_context]
        .into_iter()
        .filter_map(non_empty)
        .map(String::from)
        .collect();

    RenderedResponse {
        tier: tier_badge(&response.tier),
        confidence: confidence_badge(&response.confidence),
        tags,
        sections,
    }
}

/// Split a timeline into victim-critical and procedural groups.
///
/// A pure filter preserving the original order within each group.
pub fn partition_timeline(items: &[TimelineItem], confidence: &Confidence) -> TimelineView {
    let (critical, procedural): (Vec<_>, Vec<_>) = items
        .iter()
        .cloned()
        .partition(TimelineItem::is_victim_critical);
    TimelineView {
        critical,
        procedural,
        caveat: confidence.is_uncertain().then_some(TIMELINE_CAVEAT),
    }
}

fn is_victim_context(response: &QueryResponse) -> bool {
    response.user_context.as_deref() == Some(VICTIM_DISTRESS)
        || non_empty(&response.safety_alert).is_some()
}

fn answer_body(response: &QueryResponse) -> Option<AnswerBody> {
    if let Some(sc) = &response.sentence_citations
        && !sc.sentences.is_empty()
    {
        return Some(AnswerBody::Sentences(sentence_spans(response, sc)));
    }
    if response.answer.trim().is_empty() {
        return None;
    }
    Some(AnswerBody::Text(response.answer.clone()))
}

fn sentence_spans(response: &QueryResponse, sc: &SentenceCitations) -> Vec<SentenceSpan> {
    sc.sentences
        .iter()
        .map(|sentence| {
            let keys = sc.keys_for(&sentence.sid).to_vec();
            let target = keys.first().map(|key| {
                response
                    .citation_by_key(key)
                    .cloned()
                    .unwrap_or_else(|| Citation::from_key(key))
            });
            SentenceSpan {
                sid: sentence.sid.clone(),
                text: sentence.text.clone(),
                citation_keys: keys,
                target,
            }
        })
        .collect()
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}
