use aws_sdk_dynamodb::error::DisplayErrorContext;

/// Failures raised by the course, topic, user and roadmap stores.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("{entity} not found: {key}")]
    NotFound { entity: &'static str, key: String },

    #[error("DynamoDB request failed: {0}")]
    Dynamo(String),

    #[error("malformed {entity} record: {reason}")]
    Malformed { entity: &'static str, reason: String },

    #[error("invalid pagination cursor: {0}")]
    InvalidCursor(String),

    /// In-process stores use this to simulate an unreachable backend.
    #[error("store unavailable: {0}")]
    Unavailable(String),
}

impl StoreError {
    pub fn not_found(entity: &'static str, key: impl Into<String>) -> Self {
        StoreError::NotFound {
            entity,
            key: key.into(),
        }
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, StoreError::NotFound { .. })
    }
}

/// Flatten an SDK error with its full source chain.
pub(crate) fn dynamo_err<E: std::error::Error>(err: E) -> StoreError {
    StoreError::Dynamo(DisplayErrorContext(err).to_string())
}

/// Failures talking to the roadmap generator or the challenge model.
#[derive(Debug, thiserror::Error)]
pub enum GeneratorError {
    #[error("request to {url} failed: {source}")]
    Request {
        url: String,
        #[source]
        source: reqwest::Error,
    },

    #[error("{url} returned {status}: {body}")]
    Status {
        url: String,
        status: u16,
        body: String,
    },

    #[error("could not decode response from {url}: {reason}")]
    Decode { url: String, reason: String },

    #[error("{0}")]
    Unavailable(String),
}

/// Errors surfaced to the AppSync caller. They render as a single opaque
/// GraphQL error message.
#[derive(Debug, thiserror::Error)]
pub enum LearningError {
    #[error(transparent)]
    Store(#[from] StoreError),

    #[error(transparent)]
    Generator(#[from] GeneratorError),

    #[error("invalid arguments: {0}")]
    InvalidArguments(String),

    #[error("{0}")]
    Precondition(String),

    #[error("could not encode response: {0}")]
    Encode(String),

    #[error("unhandled operation")]
    UnhandledOperation,
}

impl From<serde_json::Error> for LearningError {
    fn from(err: serde_json::Error) -> Self {
        LearningError::InvalidArguments(err.to_string())
    }
}

/// Missing or unparsable startup configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("{0} must be set")]
    Missing(&'static str),

    #[error("{name} is not valid: {value}")]
    Invalid { name: &'static str, value: String },
}
