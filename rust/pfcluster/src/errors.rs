use std::fmt::Display;

/// Problems with an [`crate::EngineConfig`] detected before any pass runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    InvertedRange {
        field: &'static str,
        low: f64,
        high: f64,
    },
    NonPositive {
        field: &'static str,
        value: f64,
    },
    NonFinite {
        field: &'static str,
    },
    ZeroConcurrency,
}

impl Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::InvertedRange { field, low, high } => {
                write!(f, "{field}: lower bound {low} is above upper bound {high}")
            }
            Self::NonPositive { field, value } => {
                write!(f, "{field}: expected a positive value, got {value}")
            }
            Self::NonFinite { field } => write!(f, "{field}: expected a finite value"),
            Self::ZeroConcurrency => write!(f, "concurrency: at least one worker is required"),
        }
    }
}

#[derive(Debug)]
pub enum PfClusterError {
    Config(ConfigError),
    WorkerPool {
        msg: String,
    },
    UnknownModification {
        id: String,
        context: String,
    },
}

impl Display for PfClusterError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Config(e) => write!(f, "Invalid configuration: {}", e),
            Self::WorkerPool { msg } => write!(f, "Unable to build the worker pool: {}", msg),
            Self::UnknownModification { id, context } => {
                write!(f, "Unknown modification '{}' referenced by {}", id, context)
            }
        }
    }
}

impl std::error::Error for PfClusterError {}

impl PfClusterError {
    pub fn unknown_modification(id: impl Display, context: impl Display) -> Self {
        Self::UnknownModification {
            id: id.to_string(),
            context: context.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, PfClusterError>;

impl From<ConfigError> for PfClusterError {
    fn from(x: ConfigError) -> Self {
        Self::Config(x)
    }
}

impl From<rayon::ThreadPoolBuildError> for PfClusterError {
    fn from(x: rayon::ThreadPoolBuildError) -> Self {
        Self::WorkerPool { msg: x.to_string() }
    }
}
