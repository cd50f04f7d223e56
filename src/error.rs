use std::io;
use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Group path unavailable: {}: {source}", path.display())]
    PathUnavailable {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Unparseable pid at {}:{line}: {content:?}", path.display())]
    ParseError { path: PathBuf, line: usize, content: String },

    #[error("RDT slot pool exhausted (capacity {capacity})")]
    PoolExhausted { capacity: usize },

    #[error("Failed to open counter {metric} for target {target} on cpu {cpu}: {source}")]
    CounterOpenFailed {
        target: i32,
        cpu: u32,
        metric: String,
        #[source]
        source: io::Error,
    },

    #[error("Counter {operation} failed: {source}")]
    CounterControlFailed {
        operation: &'static str,
        #[source]
        source: io::Error,
    },

    #[error("Counter read failed: {source}")]
    CounterReadFailed {
        #[source]
        source: io::Error,
    },

    #[error("RDT error: {0}")]
    Rdt(String),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Logging setup failed: {0}")]
    Logging(String),

    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl Error {
    pub(crate) fn path_unavailable<P: Into<PathBuf>>(path: P, source: io::Error) -> Self {
        Error::PathUnavailable { path: path.into(), source }
    }

    pub(crate) fn parse<P: Into<PathBuf>, S: Into<String>>(path: P, line: usize, content: S) -> Self {
        Error::ParseError {
            path: path.into(),
            line,
            content: content.into(),
        }
    }

    pub(crate) fn counter_open<S: Into<String>>(target: i32, cpu: u32, metric: S, source: io::Error) -> Self {
        Error::CounterOpenFailed {
            target,
            cpu,
            metric: metric.into(),
            source,
        }
    }

    pub(crate) fn counter_control(operation: &'static str, source: io::Error) -> Self {
        Error::CounterControlFailed { operation, source }
    }

    pub(crate) fn counter_read(source: io::Error) -> Self {
        Error::CounterReadFailed { source }
    }

    pub(crate) fn rdt<S: Into<String>>(msg: S) -> Self {
        Error::Rdt(msg.into())
    }

    pub(crate) fn invalid_config<S: Into<String>>(msg: S) -> Self {
        Error::InvalidConfig(msg.into())
    }

    pub(crate) fn logging<S: Into<String>>(msg: S) -> Self {
        Error::Logging(msg.into())
    }
}

/// Result type for pgos operations
pub type Result<T> = std::result::Result<T, Error>;
