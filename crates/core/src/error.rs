use thiserror::Error;

#[derive(Error, Debug)]
pub enum RootscopeError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON serialization/deserialization error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("Configuration error: {0}")]
    Config(String),
    #[error("Invalid path pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("URL error: {0}")]
    Url(#[from] url::ParseError),
    #[error(transparent)]
    Container(#[from] ContainerError),
    #[error(transparent)]
    Usage(#[from] UsageError),
}

/// Broken caller contracts. These are programming errors and are never retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UsageError {
    #[error("already scanned container {0}")]
    AlreadyScanned(String),
    #[error("resource {0} is already open, close it before opening it again")]
    ResourceAlreadyOpen(String),
}

/// Failures of one container. Recoverable at the granularity of that container.
#[derive(Error, Debug)]
pub enum ContainerError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("unsupported container format: {0}")]
    Format(String),
    #[error("resource not found: {0}")]
    MissingResource(String),
    #[error("reader pool exhausted ({capacity} containers open)")]
    PoolExhausted { capacity: usize },
    #[error("container unavailable: {0}")]
    Unavailable(String),
}

pub type Result<T> = std::result::Result<T, RootscopeError>;
