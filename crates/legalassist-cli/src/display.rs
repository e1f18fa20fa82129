//! Terminal cards for answers, sources and session state.
//!
//! Everything here is presentation only: the section order, badges and
//! timeline split come from `legalassist_core::render`.

use std::io::{self, Write};

use legalassist_client::{SourceCache, ViewerState};
use legalassist_core::labels::{
    BadgeVariant, ConfidenceBadge, ConfidenceLevel, TierBadge, source_type_label, stage_label,
};
use legalassist_core::render::{AnswerBody, Checklist, SentenceSpan, TimelineView};
use legalassist_core::{
    Citation, ClarificationRequest, ConversationContext, RenderedResponse, Role, Section,
    SourceDocument, TimelineItem, Turn, highlight_segments,
};
use owo_colors::OwoColorize;

const MAX_HISTORY_CHARS: usize = 72;

// ── Answers ──

/// Print one rendered answer, section by section.
pub fn print_response(rendered: &RenderedResponse) {
    println!();
    print_badges(&rendered.tier, rendered.confidence.as_ref());
    if !rendered.tags.is_empty() {
        println!("  {}", rendered.tags.join(" · ").dimmed());
    }
    println!();

    for section in &rendered.sections {
        print_section(section);
    }
}

fn print_badges(tier: &TierBadge, confidence: Option<&ConfidenceBadge>) {
    let tier_text = format!("[{}]", tier.label);
    match tier.variant {
        BadgeVariant::Destructive => print!("{}", tier_text.bright_red().bold()),
        BadgeVariant::Secondary => print!("{}", tier_text.cyan()),
        BadgeVariant::Outline => print!("{}", tier_text.dimmed()),
    }
    if let Some(badge) = confidence {
        let text = format!("[{}]", badge.label);
        match badge.level {
            ConfidenceLevel::High => print!("  {}", text.bright_green()),
            ConfidenceLevel::Medium => print!("  {}", text.yellow()),
            ConfidenceLevel::Low => print!("  {}", text.bright_red()),
        }
        print!("  {}", badge.description.dimmed());
    }
    println!();
}

fn print_section(section: &Section) {
    match section {
        Section::SystemNotice {
            title,
            message,
            warning,
        } => {
            if *warning {
                println!("{} {}", format!("[{title}]").yellow().bold(), message.yellow());
            } else {
                println!("{} {}", format!("[{title}]").blue(), message);
            }
        }
        Section::SafetyAlert {
            message,
            emergency_number,
        } => {
            println!("{}", "=== SAFETY ALERT ===".bright_red().bold());
            println!("{}", message.bright_red());
            println!(
                "  {} {}",
                "Emergency:".bold(),
                format!("call {emergency_number}").bright_red().bold()
            );
        }
        Section::ActionPlan(checklist) => {
            println!("{}", "Immediate Action Plan".bold());
            print_checklist(checklist);
            println!("  {}", "(:check N to mark a step done)".dimmed());
        }
        Section::Answer {
            heading,
            body,
            legal_basis,
        } => {
            println!("{}", heading.bold());
            match body {
                AnswerBody::Text(text) => println!("{text}"),
                AnswerBody::Sentences(spans) => print_sentences(spans),
            }
            if let Some(basis) = legal_basis {
                println!("  {:<26} {}", "Legal basis".dimmed(), basis);
            }
        }
        Section::ProcedureSteps(steps) => {
            println!("{}", "Procedure".bold());
            for (i, step) in steps.iter().enumerate() {
                println!("  {}. {}", i + 1, step);
            }
        }
        Section::ImportantNotes(notes) => {
            println!("{}", "Important Notes".bold());
            for note in notes {
                println!("  ! {}", note.yellow());
            }
        }
        Section::Timeline(view) => print_timeline(view),
        Section::Citations(citations) => print_citations(citations),
        Section::Clarification(request) => print_clarification(request),
    }
    println!();
}

pub fn print_checklist(checklist: &Checklist) {
    for (i, (step, done)) in checklist.items().enumerate() {
        let mark = if done { "[x]" } else { "[ ]" };
        if done {
            println!("  {} {}. {}", mark.green(), i + 1, step.dimmed());
        } else {
            println!("  {} {}. {}", mark, i + 1, step);
        }
    }
    println!(
        "  {}",
        format!("{}/{} done", checklist.completed(), checklist.len()).dimmed()
    );
}

fn print_sentences(spans: &[SentenceSpan]) {
    for span in spans {
        if span.is_clickable() {
            println!(
                "{} {}",
                span.text,
                format!("[{}: {}]", span.sid, span.citation_keys.join(", ")).cyan()
            );
        } else {
            println!("{}", span.text);
        }
    }
    println!("  {}", "(:sentence SID to open the supporting source)".dimmed());
}

fn print_timeline(view: &TimelineView) {
    println!("{}", "Timeline".bold());
    if !view.critical.is_empty() {
        println!("  {}", "Critical actions (you)".bright_red());
        for item in &view.critical {
            print_timeline_item(item);
        }
    }
    if !view.procedural.is_empty() {
        println!("  {}", "Procedural steps".cyan());
        for item in &view.procedural {
            print_timeline_item(item);
        }
    }
    if let Some(caveat) = view.caveat {
        println!("  {}", caveat.yellow());
    }
    println!("  {}", "(:export to print a plain checklist)".dimmed());
}

fn print_timeline_item(item: &TimelineItem) {
    let anchor = if item.is_anchor { "*" } else { "-" };
    print!("    {} {:<22} {}", anchor, stage_label(&item.stage), item.action);
    if let Some(deadline) = &item.deadline {
        print!("  {}", format!("(due: {deadline})").yellow());
    }
    if item.mandatory {
        print!("  {}", "mandatory".bright_red());
    }
    println!();
    if !item.legal_basis.is_empty() {
        println!("      {}", item.legal_basis.join(", ").dimmed());
    }
}

fn print_citations(citations: &[Citation]) {
    println!("{} ({})", "Sources".bold(), citations.len());
    for (i, citation) in citations.iter().enumerate() {
        print!(
            "  {} {:<10} {}",
            format!("[{}]", i + 1).cyan(),
            source_type_label(&citation.source_type),
            citation.display
        );
        if let Some(relevance) = citation.relevance {
            print!("  {}", format!("({:.0}%)", relevance * 100.0).dimmed());
        }
        println!();
    }
    println!("  {}", "(:open N to read a source)".dimmed());
}

pub fn print_clarification(request: &ClarificationRequest) {
    println!(
        "{}  {}",
        "?".bright_cyan().bold(),
        request.prompt.bright_white().bold()
    );
    for (i, option) in request.options.iter().enumerate() {
        println!("   {}  {}", format!("[{}]", i + 1).cyan(), option);
    }
    println!("   {}", "(enter a number or the option text)".dimmed());
}

pub fn print_error_reply(content: &str) {
    println!();
    println!("{}", content.red());
    println!();
}

// ── Sources ──

pub fn print_viewer_state(state: &ViewerState) {
    match state {
        ViewerState::Idle => {}
        ViewerState::Loading { citation } => {
            println!("{}", format!("Loading {}...", citation.display).dimmed());
        }
        ViewerState::Loaded { document, .. } => print_source(document),
        ViewerState::Failed { citation, message } => {
            println!();
            println!("=== {} ===", citation.display);
            println!("{}", message.red());
            println!("  {}", "(:retry to try again, :close to dismiss)".dimmed());
            println!();
        }
    }
}

/// Print a source document as a card, highlighted passages in bold.
pub fn print_source(document: &SourceDocument) {
    println!();
    println!(
        "=== {} {} ===",
        source_type_label(&document.source_type),
        document.section_id
    );
    println!("{}", document.title.bold());
    println!();

    if let Some(updated) = &document.last_updated {
        println!("  {:<26} {}", "Last updated", updated);
    }
    if !document.legal_references.is_empty() {
        println!(
            "  {:<26} {}",
            "References",
            document.legal_references.join(", ")
        );
    }
    if let Some(meta) = &document.metadata {
        let fields = [
            ("Procedural stage", meta.procedural_stage.as_deref()),
            ("Action type", meta.action_type.as_deref()),
            ("Time limit", meta.time_limit.as_deref()),
            ("SOP group", meta.sop_group.as_deref()),
        ];
        for (label, value) in fields {
            if let Some(v) = value {
                println!("  {:<26} {}", label, v);
            }
        }
        if !meta.stakeholders.is_empty() {
            println!("  {:<26} {}", "Stakeholders", meta.stakeholders.join(", "));
        }
        if let Some(p) = meta.priority {
            println!("  {:<26} {}", "Priority", p);
        }
    }
    println!();

    if document.is_placeholder() {
        println!("{}", document.content.yellow());
    } else {
        print_highlighted(document);
    }
    println!();
}

fn print_highlighted(document: &SourceDocument) {
    let segments = highlight_segments(&document.content, &document.highlights);
    let mut reasons = Vec::new();
    for segment in &segments {
        if segment.highlighted {
            print!("{}", segment.text.black().on_yellow());
            if let Some(reason) = &segment.reason {
                reasons.push(reason.as_str());
            }
        } else {
            print!("{}", segment.text);
        }
    }
    println!();
    if !reasons.is_empty() {
        println!();
        for reason in reasons {
            println!("  {} {}", "^".yellow(), reason.dimmed());
        }
    }
}

pub fn print_source_cache(cache: Option<&SourceCache>) {
    let Some(cache) = cache.filter(|c| !c.is_empty()) else {
        println!("No sources fetched yet.");
        return;
    };
    println!("Fetched sources ({}):", cache.len());
    for (key, entry) in cache.iter() {
        println!(
            "  {:<26} {}  {}",
            key,
            entry.document.title,
            entry.fetched_at.format("%H:%M:%S").to_string().dimmed()
        );
    }
}

// ── Session ──

pub fn print_context(context: &ConversationContext) {
    println!("Conversation context");
    println!(
        "  {:<26} {}",
        "Case type",
        context.last_case_type.as_deref().unwrap_or("-")
    );
    println!(
        "  {:<26} {}",
        "Stage",
        context.last_stage.as_deref().map(stage_label).as_deref().unwrap_or("-")
    );
}

pub fn print_history(turns: &[Turn]) {
    if turns.is_empty() {
        println!("No messages yet.");
        return;
    }
    for turn in turns {
        let who = match turn.role {
            Role::User => "you".bold().to_string(),
            Role::Assistant if turn.failed => "assistant".red().to_string(),
            Role::Assistant => "assistant".cyan().to_string(),
        };
        println!(
            "  {} {:<9} {}",
            turn.timestamp.format("%H:%M:%S").to_string().dimmed(),
            who,
            truncate(&turn.content, MAX_HISTORY_CHARS)
        );
    }
}

pub fn print_banner(endpoint: &str) {
    println!("{}", "Legal Assist".bold());
    println!("  {:<26} {}", "Backend", endpoint);
    println!(
        "  {}",
        "Ask a question in plain language. :help lists commands.".dimmed()
    );
    println!(
        "  {}",
        "This is legal information, not legal advice.".dimmed()
    );
    println!();
}

pub fn print_help() {
    println!("Commands");
    let rows = [
        (":open N", "read source N of the last answer"),
        (":sentence SID", "read the source behind an answer sentence"),
        (":retry", "retry the last source fetch"),
        (":close", "close the source viewer"),
        (":sources", "list sources fetched this session"),
        (":check N", "toggle step N of the action plan"),
        (":export", "print the timeline as a plain checklist"),
        (":context", "show the carried-over case type and stage"),
        (":history", "list the conversation so far"),
        (":help", "this list"),
        (":quit", "leave"),
    ];
    for (cmd, what) in rows {
        println!("  {:<26} {}", cmd, what);
    }
}

pub fn print_prompt(clarification_pending: bool) -> io::Result<()> {
    if clarification_pending {
        print!("{} ", "option>".bright_magenta());
    } else {
        print!("{} ", ">".bright_magenta());
    }
    io::stdout().flush()
}

pub fn print_hint(message: &str) {
    println!("{}", message.dimmed());
}

pub fn print_warning(message: &str) {
    println!("{} {}", "!".yellow(), message);
}

// ── Helpers ──

/// First line of `text`, cut to `max` characters with an ellipsis.
fn truncate(text: &str, max: usize) -> String {
    let line = text.lines().next().unwrap_or("");
    if line.chars().count() > max {
        let cut: String = line.chars().take(max.saturating_sub(3)).collect();
        format!("{cut}...")
    } else {
        line.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn truncate_keeps_short_lines() {
        assert_eq!(truncate("File a Zero FIR.", 72), "File a Zero FIR.");
    }

    #[test]
    fn truncate_cuts_on_chars_and_first_line() {
        assert_eq!(truncate("abcdefghij", 8), "abcde...");
        assert_eq!(truncate("first\nsecond", 72), "first");
        assert_eq!(truncate("धारा १०३ हत्या", 6), "धार...");
    }
}
