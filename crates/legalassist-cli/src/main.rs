mod display;
mod repl;

use std::time::Duration;

use anyhow::Context;
use clap::{Parser, Subcommand};
use legalassist_client::{ClientConfig, QueryEndpoint, RagClient};
use legalassist_core::{Conversation, render_response};
use tracing::Level;

#[derive(Parser)]
#[command(name = "legalassist")]
#[command(about = "Legal Assist: ask questions about Indian criminal law and procedure", long_about = None)]
#[command(version)]
struct Cli {
    /// Base URL of the RAG backend (`/rag/query`, `/rag/source`).
    #[arg(long, env = "LEGAL_ASSIST_RAG_API_BASE", default_value = legalassist_client::config::DEFAULT_RAG_API_BASE, global = true)]
    rag_base: String,

    /// Base URL of the legacy backend (`/api/v1/query`).
    #[arg(long, env = "LEGAL_ASSIST_API_URL", default_value = legalassist_client::config::DEFAULT_LEGACY_API_URL, global = true)]
    api_url: String,

    /// Request timeout in seconds.
    #[arg(long, env = "LEGAL_ASSIST_TIMEOUT_SECS", default_value_t = 30, global = true)]
    timeout_secs: u64,

    /// Send questions to the legacy `/api/v1/query` endpoint.
    #[arg(long, global = true)]
    legacy: bool,

    /// Ask the backend to answer from retrieval only.
    #[arg(long, global = true)]
    no_llm: bool,

    /// Ask the backend for diagnostic detail.
    #[arg(long, global = true)]
    verbose: bool,

    /// Log level for diagnostics on stderr.
    #[arg(long, env = "LEGAL_ASSIST_LOG", default_value = "warn", global = true)]
    log: Level,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive chat session (default)
    Chat,
    /// Ask a single question and print the answer
    Ask {
        /// The question, in plain language
        #[arg(required = true, num_args = 1..)]
        query: Vec<String>,
    },
    /// Fetch and print the verbatim text of a legal source
    Source {
        /// Source type, e.g. `bns`, `bnss`, `sop`
        source_type: String,
        /// Source identifier, e.g. `103`
        source_id: String,
        /// Passage to highlight in the returned text
        #[arg(long)]
        highlight: Option<String>,
    },
}

impl Cli {
    fn client_config(&self) -> ClientConfig {
        ClientConfig {
            rag_base: self.rag_base.clone(),
            legacy_base: self.api_url.clone(),
            endpoint: if self.legacy {
                QueryEndpoint::Legacy
            } else {
                QueryEndpoint::Rag
            },
            timeout: Duration::from_secs(self.timeout_secs),
            no_llm: self.no_llm,
            verbose: self.verbose,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_max_level(cli.log)
        .with_target(false)
        .init();

    let config = cli.client_config();
    tracing::debug!(?config, "legalassist v{}", env!("CARGO_PKG_VERSION"));
    let client = RagClient::new(config).context("building HTTP client")?;

    match cli.command.unwrap_or(Commands::Chat) {
        Commands::Chat => repl::run(client).await,
        Commands::Ask { query } => ask(&client, &query.join(" ")).await,
        Commands::Source {
            source_type,
            source_id,
            highlight,
        } => {
            let document = client
                .fetch_source(&source_type, &source_id, highlight.as_deref())
                .await;
            display::print_source(&document);
            Ok(())
        }
    }
}

async fn ask(client: &RagClient, query: &str) -> anyhow::Result<()> {
    let mut conversation = Conversation::new();
    let pending = conversation.begin_query(query)?;
    let result = client.send_query(&pending.query, &pending.context).await;
    let failed = result.is_err();

    let turn = conversation.complete_query(result);
    match &turn.response {
        Some(response) => {
            display::print_response(&render_response(response));
            if response.clarification_needed.is_some() {
                display::print_hint("Run `legalassist chat` to answer the clarification.");
            }
        }
        None => display::print_error_reply(&turn.content),
    }

    if failed {
        anyhow::bail!("query failed; see the log above for details");
    }
    Ok(())
}
