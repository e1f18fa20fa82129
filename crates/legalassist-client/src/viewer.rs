//! Citation viewer: on-demand display of one cited source.
//!
//! State machine per invocation: `Idle → Loading → {Loaded | Failed}`.
//! Loads are identified by a [`LoadTicket`]; a ticket that was superseded
//! by a newer `open`, or that arrives after `close`, is discarded rather
//! than cancelled, so a slow response can never overwrite newer state.

use async_trait::async_trait;
use legalassist_core::{Citation, SourceDocument};
use tracing::debug;

use crate::error::ClientError;
use crate::source::SourceCache;

/// Anything that can resolve a citation to its source document.
#[async_trait]
pub trait SourceFetcher: Send + Sync {
    async fn fetch(&self, citation: &Citation) -> Result<SourceDocument, ClientError>;
}

#[derive(Debug, Clone, PartialEq)]
pub enum ViewerState {
    Idle,
    Loading {
        citation: Citation,
    },
    Loaded {
        citation: Citation,
        document: SourceDocument,
    },
    Failed {
        citation: Citation,
        message: String,
    },
}

/// Handle for one load attempt.
#[derive(Debug, Clone, PartialEq)]
pub struct LoadTicket {
    generation: u64,
    citation: Citation,
    /// Skip the cache (user-initiated retry).
    refresh: bool,
}

impl LoadTicket {
    pub fn citation(&self) -> &Citation {
        &self.citation
    }
}

#[derive(Debug)]
pub struct CitationViewer {
    state: ViewerState,
    generation: u64,
    cache: Option<SourceCache>,
}

impl Default for CitationViewer {
    fn default() -> Self {
        Self::new()
    }
}

impl CitationViewer {
    pub fn new() -> Self {
        Self {
            state: ViewerState::Idle,
            generation: 0,
            cache: None,
        }
    }

    /// Viewer that remembers real documents across citations.
    pub fn with_cache() -> Self {
        Self {
            cache: Some(SourceCache::new()),
            ..Self::new()
        }
    }

    pub fn state(&self) -> &ViewerState {
        &self.state
    }

    pub fn cache(&self) -> Option<&SourceCache> {
        self.cache.as_ref()
    }

    pub fn is_idle(&self) -> bool {
        matches!(self.state, ViewerState::Idle)
    }

    /// Enter `Loading` for `citation`. Any earlier ticket becomes stale.
    pub fn open(&mut self, citation: Citation) -> LoadTicket {
        self.begin(citation, false)
    }

    /// Re-attempt the real fetch after a failure or a placeholder.
    ///
    /// Returns `None` when there is nothing to retry.
    pub fn retry(&mut self) -> Option<LoadTicket> {
        let citation = match &self.state {
            ViewerState::Failed { citation, .. } => citation.clone(),
            ViewerState::Loaded { citation, document } if document.is_placeholder() => {
                citation.clone()
            }
            _ => return None,
        };
        Some(self.begin(citation, true))
    }

    /// Return to `Idle`, discarding the loaded document and any pending load.
    pub fn close(&mut self) {
        self.generation += 1;
        self.state = ViewerState::Idle;
    }

    /// Apply the outcome of a load. Returns false if the ticket was stale
    /// and the result discarded.
    pub fn finish(
        &mut self,
        ticket: LoadTicket,
        result: Result<SourceDocument, ClientError>,
    ) -> bool {
        if ticket.generation != self.generation
            || !matches!(self.state, ViewerState::Loading { .. })
        {
            debug!(
                citation = %ticket.citation.key(),
                "discarding stale source load"
            );
            return false;
        }
        self.state = match result {
            Ok(document) => {
                if let Some(cache) = self.cache.as_mut() {
                    cache.insert(ticket.citation.key(), document.clone());
                }
                ViewerState::Loaded {
                    citation: ticket.citation,
                    document,
                }
            }
            Err(e) => ViewerState::Failed {
                citation: ticket.citation,
                message: format!("Failed to fetch source content: {e}"),
            },
        };
        true
    }

    /// Drive a ticket to completion, consulting the cache first unless the
    /// ticket is a retry.
    pub async fn load<F>(&mut self, fetcher: &F, ticket: LoadTicket) -> &ViewerState
    where
        F: SourceFetcher + ?Sized,
    {
        let cached = if ticket.refresh {
            None
        } else {
            self.cache
                .as_ref()
                .and_then(|c| c.get(&ticket.citation.key()))
                .map(|c| c.document.clone())
        };
        let result = match cached {
            Some(document) => {
                debug!(citation = %ticket.citation.key(), "source served from cache");
                Ok(document)
            }
            None => fetcher.fetch(&ticket.citation).await,
        };
        self.finish(ticket, result);
        &self.state
    }

    /// Open a citation and load it in one step.
    pub async fn show<F>(&mut self, fetcher: &F, citation: Citation) -> &ViewerState
    where
        F: SourceFetcher + ?Sized,
    {
        let ticket = self.open(citation);
        self.load(fetcher, ticket).await
    }

    fn begin(&mut self, citation: Citation, refresh: bool) -> LoadTicket {
        self.generation += 1;
        self.state = ViewerState::Loading {
            citation: citation.clone(),
        };
        LoadTicket {
            generation: self.generation,
            citation,
            refresh,
        }
    }
}
