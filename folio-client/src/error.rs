use crate::api::{self, Scope};

/// Failure of a single request to the remote service
#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum TransportError {
    /// The request could not be completed (connection, timeout...)
    #[error("network error: {0}")]
    Network(String),

    /// The server answered with an error payload
    #[error(transparent)]
    Api(#[from] api::Error),

    /// The server answered successfully but with something we cannot read
    #[error("malformed response: {0}")]
    Malformed(String),
}

impl TransportError {
    /// Whether re-sending the same request later may succeed
    pub fn is_retryable(&self) -> bool {
        match self {
            TransportError::Network(_) => true,
            TransportError::Api(e) => e.status_code().is_server_error(),
            TransportError::Malformed(_) => false,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum FetchError {
    #[error("failed fetching {what}")]
    Transport {
        what: String,
        #[source]
        source: TransportError,
    },

    #[error(transparent)]
    ScopeNotFound(api::Error),

    #[error("loading comments of {0} was abandoned")]
    Abandoned(Scope),
}

impl FetchError {
    pub fn transport(what: impl ToString, source: TransportError) -> FetchError {
        FetchError::Transport {
            what: what.to_string(),
            source,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, thiserror::Error)]
pub enum SubmitError {
    /// The comment was refused, sending it again unchanged will not help
    #[error("comment rejected: {0}")]
    ValidationRejected(api::Error),

    #[error("failed submitting comment: {0}")]
    Transient(TransportError),
}

impl SubmitError {
    pub fn is_retryable(&self) -> bool {
        match self {
            SubmitError::ValidationRejected(_) => false,
            SubmitError::Transient(e) => e.is_retryable(),
        }
    }
}

impl From<TransportError> for SubmitError {
    fn from(e: TransportError) -> SubmitError {
        match e {
            TransportError::Api(err) if !err.status_code().is_server_error() => {
                SubmitError::ValidationRejected(err)
            }
            e => SubmitError::Transient(e),
        }
    }
}
