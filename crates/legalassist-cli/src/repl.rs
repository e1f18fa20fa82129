//! Chat REPL: one conversation, one citation viewer, one query in flight.
//!
//! The query runs on its own task while input keeps being read, so sources
//! and session state can be inspected before the answer arrives.

use std::sync::Arc;

use legalassist_client::{CitationViewer, ClientError, QueryEndpoint, RagClient};
use legalassist_core::{
    Citation, Conversation, PendingQuery, QueryResponse, RenderedResponse, Section, SessionError,
    render_response,
};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::task::JoinHandle;
use tokio::task::JoinError;
use tracing::debug;

use crate::display;

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    /// Free text: a question, or an answer to a pending clarification.
    Message(String),
    Open(usize),
    Sentence(String),
    Retry,
    Close,
    Sources,
    Check(usize),
    Export,
    Context,
    History,
    Help,
    Quit,
}

/// Parse one input line. `Err` carries a usage hint.
fn parse_command(line: &str) -> Result<Command, String> {
    let line = line.trim();
    let Some(rest) = line.strip_prefix(':') else {
        return Ok(Command::Message(line.to_string()));
    };
    let (name, arg) = match rest.split_once(char::is_whitespace) {
        Some((name, arg)) => (name, arg.trim()),
        None => (rest, ""),
    };
    match name {
        "open" | "o" => parse_index(arg, ":open N").map(Command::Open),
        "sentence" | "s" if !arg.is_empty() => Ok(Command::Sentence(arg.to_string())),
        "sentence" | "s" => Err("usage: :sentence SID".to_string()),
        "retry" => Ok(Command::Retry),
        "close" => Ok(Command::Close),
        "sources" => Ok(Command::Sources),
        "check" => parse_index(arg, ":check N").map(Command::Check),
        "export" => Ok(Command::Export),
        "context" => Ok(Command::Context),
        "history" => Ok(Command::History),
        "help" | "h" | "?" => Ok(Command::Help),
        "quit" | "q" | "exit" => Ok(Command::Quit),
        other => Err(format!("unknown command :{other} (try :help)")),
    }
}

/// 1-based index argument.
fn parse_index(arg: &str, usage: &str) -> Result<usize, String> {
    match arg.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n),
        _ => Err(format!("usage: {usage} (N starts at 1)")),
    }
}

/// The `n`th (1-based) citation listed under an answer.
fn nth_citation(rendered: &RenderedResponse, n: usize) -> Option<&Citation> {
    rendered.sections.iter().find_map(|s| match s {
        Section::Citations(citations) => n.checked_sub(1).and_then(|i| citations.get(i)),
        _ => None,
    })
}

type QueryOutcome = Result<Result<QueryResponse, ClientError>, JoinError>;

struct Session {
    client: Arc<RagClient>,
    conversation: Conversation,
    viewer: CitationViewer,
    /// The latest answer as shown, including its checklist state.
    rendered: Option<RenderedResponse>,
    /// The query in flight, if any. Input keeps being read while it runs.
    query: Option<JoinHandle<Result<QueryResponse, ClientError>>>,
}

impl Session {
    fn new(client: RagClient) -> Self {
        Self {
            client: Arc::new(client),
            conversation: Conversation::new(),
            viewer: CitationViewer::with_cache(),
            rendered: None,
            query: None,
        }
    }

    fn endpoint_url(&self) -> String {
        let config = self.client.config();
        match config.endpoint {
            QueryEndpoint::Rag => format!("{}/rag/query", config.rag_base),
            QueryEndpoint::Legacy => format!("{}/api/v1/query", config.legacy_base),
        }
    }

    /// Handle one command; returns false when the user asked to leave.
    async fn handle(&mut self, command: Command) -> bool {
        match command {
            Command::Message(text) if text.is_empty() => {}
            Command::Message(text) => self.submit(&text),
            Command::Open(n) => {
                let citation = self
                    .rendered
                    .as_ref()
                    .and_then(|r| nth_citation(r, n))
                    .cloned();
                match citation {
                    Some(citation) => self.open(citation).await,
                    None => display::print_warning(&format!("no source [{n}] in the last answer")),
                }
            }
            Command::Sentence(sid) => {
                let span = self.rendered.as_ref().and_then(|r| r.sentence(&sid));
                match span.map(|s| s.target.clone()) {
                    Some(Some(citation)) => self.open(citation).await,
                    Some(None) => {
                        display::print_warning(&format!("sentence {sid} has no citation"))
                    }
                    None => display::print_warning(&format!("no sentence {sid} in the last answer")),
                }
            }
            Command::Retry => match self.viewer.retry() {
                Some(ticket) => {
                    display::print_hint(&format!("Retrying {}...", ticket.citation().display));
                    let state = self.viewer.load(self.client.as_ref(), ticket).await;
                    display::print_viewer_state(state);
                }
                None => display::print_warning("nothing to retry"),
            },
            Command::Close => {
                self.viewer.close();
                display::print_hint("Source viewer closed.");
            }
            Command::Sources => display::print_source_cache(self.viewer.cache()),
            Command::Check(n) => self.check(n),
            Command::Export => match self.rendered.as_ref().and_then(|r| r.timeline()) {
                Some(timeline) => println!("{}", timeline.checklist_text()),
                None => display::print_warning("the last answer has no timeline"),
            },
            Command::Context => display::print_context(self.conversation.context()),
            Command::History => display::print_history(self.conversation.turns()),
            Command::Help => display::print_help(),
            Command::Quit => return false,
        }
        true
    }

    /// Admit free text as a new query or as the answer to the pending
    /// clarification.
    fn admit(&mut self, text: &str) -> Result<PendingQuery, SessionError> {
        if self.conversation.is_clarification_pending() {
            self.conversation.select_option(text)
        } else {
            self.conversation.begin_query(text)
        }
    }

    fn submit(&mut self, text: &str) {
        match self.admit(text) {
            Ok(pending) => self.start_query(pending),
            Err(SessionError::UnknownOption(choice)) => {
                display::print_warning(&format!("\"{choice}\" is not one of the options"));
                if let Some(request) = self.conversation.pending_clarification() {
                    display::print_clarification(request);
                }
            }
            Err(e) => display::print_warning(&e.to_string()),
        }
    }

    /// Send the query on its own task so sources can be browsed meanwhile.
    fn start_query(&mut self, pending: PendingQuery) {
        debug!(query = %pending.query, context = ?pending.context, "submitting");
        display::print_hint("Thinking... (commands such as :open and :context still work)");
        let client = Arc::clone(&self.client);
        self.query = Some(tokio::spawn(async move {
            client.send_query(&pending.query, &pending.context).await
        }));
    }

    fn finish_query(&mut self, outcome: QueryOutcome) {
        self.query = None;
        let result = outcome
            .map_err(anyhow::Error::from)
            .and_then(|r| r.map_err(anyhow::Error::from));

        let turn = self.conversation.complete_query(result);
        match &turn.response {
            Some(response) => {
                let rendered = render_response(response);
                display::print_response(&rendered);
                self.rendered = Some(rendered);
            }
            None => display::print_error_reply(&turn.content),
        }
    }

    async fn open(&mut self, citation: Citation) {
        let ticket = self.viewer.open(citation);
        display::print_viewer_state(self.viewer.state());
        let state = self.viewer.load(self.client.as_ref(), ticket).await;
        display::print_viewer_state(state);
    }

    fn check(&mut self, n: usize) {
        let Some(checklist) = self.rendered.as_mut().and_then(|r| r.checklist_mut()) else {
            display::print_warning("the last answer has no action plan");
            return;
        };
        match checklist.toggle(n - 1) {
            Some(_) => display::print_checklist(checklist),
            None => display::print_warning(&format!(
                "the action plan has {} steps",
                checklist.len()
            )),
        }
    }
}

/// Resolves when the in-flight query finishes; never resolves when idle.
async fn query_done(
    query: &mut Option<JoinHandle<Result<QueryResponse, ClientError>>>,
) -> QueryOutcome {
    match query {
        Some(handle) => handle.await,
        None => std::future::pending().await,
    }
}

/// Run the interactive chat until `:quit` or end of input.
pub async fn run(client: RagClient) -> anyhow::Result<()> {
    let mut session = Session::new(client);
    display::print_banner(&session.endpoint_url());

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    display::print_prompt(false)?;
    loop {
        tokio::select! {
            outcome = query_done(&mut session.query) => {
                session.finish_query(outcome);
            }
            line = lines.next_line() => {
                let Some(line) = line? else {
                    println!();
                    break;
                };
                match parse_command(&line) {
                    Ok(command) => {
                        if !session.handle(command).await {
                            break;
                        }
                    }
                    Err(usage) => display::print_warning(&usage),
                }
            }
        }
        display::print_prompt(session.conversation.is_clarification_pending())?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use legalassist_client::ClientConfig;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    /// Backend that accepts connections but never answers.
    async fn silent_backend() -> (TcpListener, RagClient) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        let client = RagClient::new(ClientConfig::with_base(base)).unwrap();
        (listener, client)
    }

    /// Backend answering one request with a fixed JSON body.
    async fn answering_backend(body: &'static str) -> RagClient {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let base = format!("http://{}", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let (mut socket, _) = listener.accept().await.unwrap();
            let mut buf = [0u8; 8192];
            let _ = socket.read(&mut buf).await;
            let response = format!(
                "HTTP/1.1 200 OK\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            socket.write_all(response.as_bytes()).await.unwrap();
            socket.shutdown().await.ok();
        });
        RagClient::new(ClientConfig::with_base(base)).unwrap()
    }

    #[tokio::test]
    async fn commands_run_while_query_in_flight() {
        let (_listener, client) = silent_backend().await;
        let mut session = Session::new(client);

        assert!(session.handle(Command::Message("How do I file a Zero FIR?".into())).await);
        assert!(session.query.is_some());
        assert!(session.conversation.is_in_flight());

        assert!(session.handle(Command::Context).await);
        assert!(session.handle(Command::Sources).await);
        assert_eq!(session.admit("second question"), Err(SessionError::RequestInFlight));
        assert_eq!(session.conversation.turns().len(), 1);
    }

    #[tokio::test]
    async fn finished_query_is_rendered() {
        let client = answering_backend(
            r#"{"answer":"File a Zero FIR.","tier_info":{"tier":"tier1","case_type":"FIR"},"citations":["bnss:173"]}"#,
        )
        .await;
        let mut session = Session::new(client);
        session.submit("How do I file a Zero FIR?");

        let outcome = query_done(&mut session.query).await;
        session.finish_query(outcome);

        assert!(session.query.is_none());
        assert!(!session.conversation.is_in_flight());
        assert_eq!(session.conversation.context().last_case_type.as_deref(), Some("FIR"));
        let rendered = session.rendered.as_ref().unwrap();
        assert_eq!(nth_citation(rendered, 1).map(|c| c.key()), Some("bnss:173".into()));
        assert!(session.admit("next question").is_ok());
    }

    #[test]
    fn plain_text_is_a_message() {
        assert_eq!(
            parse_command("  How do I file a Zero FIR?  "),
            Ok(Command::Message("How do I file a Zero FIR?".into()))
        );
        assert_eq!(parse_command("2"), Ok(Command::Message("2".into())));
    }

    #[test]
    fn commands_with_arguments() {
        assert_eq!(parse_command(":open 2"), Ok(Command::Open(2)));
        assert_eq!(parse_command(":o 1"), Ok(Command::Open(1)));
        assert_eq!(parse_command(":check  3"), Ok(Command::Check(3)));
        assert_eq!(
            parse_command(":sentence s2"),
            Ok(Command::Sentence("s2".into()))
        );
    }

    #[test]
    fn bad_arguments_give_usage() {
        assert!(parse_command(":open").is_err());
        assert!(parse_command(":open 0").is_err());
        assert!(parse_command(":check x").is_err());
        assert!(parse_command(":sentence").is_err());
        assert!(parse_command(":frobnicate").unwrap_err().contains("unknown command"));
    }

    #[test]
    fn bare_commands() {
        assert_eq!(parse_command(":retry"), Ok(Command::Retry));
        assert_eq!(parse_command(":close"), Ok(Command::Close));
        assert_eq!(parse_command(":sources"), Ok(Command::Sources));
        assert_eq!(parse_command(":export"), Ok(Command::Export));
        assert_eq!(parse_command(":context"), Ok(Command::Context));
        assert_eq!(parse_command(":history"), Ok(Command::History));
        assert_eq!(parse_command(":help"), Ok(Command::Help));
        assert_eq!(parse_command(":q"), Ok(Command::Quit));
    }

    #[test]
    fn citations_are_numbered_from_one() {
        let response = QueryResponse {
            answer: "Murder is punishable under BNS 103.".into(),
            citations: vec![
                Citation::new("bns", "103", "BNS 103"),
                Citation::new("bnss", "173", "BNSS 173"),
            ],
            ..Default::default()
        };
        let rendered = render_response(&response);
        assert_eq!(nth_citation(&rendered, 1).map(|c| c.key()), Some("bns:103".into()));
        assert_eq!(nth_citation(&rendered, 2).map(|c| c.key()), Some("bnss:173".into()));
        assert!(nth_citation(&rendered, 0).is_none());
        assert!(nth_citation(&rendered, 3).is_none());
    }
}
