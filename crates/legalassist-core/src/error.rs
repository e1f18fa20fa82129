use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum SessionError {
    #[error("query text is empty")]
    EmptyQuery,

    #[error("a request is already in flight")]
    RequestInFlight,

    #[error("a clarification is pending; choose one of the offered options")]
    ClarificationPending,

    #[error("no clarification is pending")]
    NoClarification,

    #[error("'{0}' is not one of the offered options")]
    UnknownOption(String),
}
