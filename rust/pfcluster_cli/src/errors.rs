#[derive(Debug)]
pub enum CliError {
    Config {
        source: String,
    },
    ParseError {
        msg: String,
        path: Option<String>,
    },
    Io {
        source: String,
        path: Option<String>,
    },
    Engine {
        source: String,
    },
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Config { source } => write!(f, "Error interpreting the config: {}", source),
            CliError::ParseError { msg, path } => {
                if let Some(path) = path {
                    write!(f, "Error parsing {}: {}", path, msg)
                } else {
                    write!(f, "Error parsing config: {}", msg)
                }
            }
            CliError::Io { source, path } => {
                if let Some(path) = path {
                    write!(f, "Error reading file {}: {}", path, source)
                } else {
                    write!(f, "Error reading file: {}", source)
                }
            }
            CliError::Engine { source } => write!(f, "Error running the analysis: {}", source),
        }
    }
}

impl From<pfcluster::PfClusterError> for CliError {
    fn from(e: pfcluster::PfClusterError) -> Self {
        CliError::Engine {
            source: e.to_string(),
        }
    }
}
