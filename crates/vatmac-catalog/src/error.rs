use thiserror::Error;

#[derive(Debug, Error)]
pub enum CatalogError {
    #[error("failed to read catalog file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("JSON deserialization error for {context}: {source}")]
    Deserialize {
        context: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to parse static catalogs: {0}")]
    StaticParse(#[from] serde_yaml::Error),

    #[error("static catalog validation failed: {0}")]
    Validation(String),
}

/// Why a scraper run did not complete.
///
/// Every variant that had a running child carries whatever output was
/// captured before the failure so the caller can surface it.
#[derive(Debug, Error)]
pub enum ScrapeError {
    #[error("Python not found. Please install Python 3.")]
    PythonNotFound,

    #[error("failed to spawn scraper: {0}")]
    Spawn(#[source] std::io::Error),

    #[error("scraper timed out after {timeout_secs}s")]
    Timeout {
        timeout_secs: u64,
        stdout: String,
        stderr: String,
    },

    #[error("scraper output exceeded {limit} bytes")]
    OutputTooLarge {
        limit: usize,
        stdout: String,
        stderr: String,
    },

    #[error("scraper exited with {status}")]
    Failed {
        status: String,
        stdout: String,
        stderr: String,
    },
}

impl ScrapeError {
    /// Captured diagnostic output: stderr when non-empty, else stdout.
    #[must_use]
    pub fn details(&self) -> Option<&str> {
        match self {
            ScrapeError::Timeout { stdout, stderr, .. }
            | ScrapeError::OutputTooLarge { stdout, stderr, .. }
            | ScrapeError::Failed { stdout, stderr, .. } => [stderr, stdout]
                .into_iter()
                .map(String::as_str)
                .find(|s| !s.trim().is_empty()),
            ScrapeError::PythonNotFound | ScrapeError::Spawn(_) => None,
        }
    }
}
