//! Legal Assist core: response model, conversation state, context carry-over
//! and the response renderer. No I/O lives here.

pub mod context;
pub mod conversation;
mod error;
pub mod highlight;
pub mod labels;
pub mod render;
pub mod types;

pub use context::{ConversationContext, apply_clarification, update_context};
pub use conversation::{Conversation, ERROR_REPLY, PendingQuery, Role, Turn};
pub use error::SessionError;
pub use highlight::{Segment, highlight_segments};
pub use render::{RenderedResponse, Section, render_response};
pub use types::{
    Citation, ClarificationRequest, Confidence, HighlightRange, PLACEHOLDER_MARKER,
    QueryResponse, Sentence, SentenceCitations, SourceDocument, SourceMetadata, SystemNotice,
    Tier, TimelineItem,
};
