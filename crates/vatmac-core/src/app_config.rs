use std::net::SocketAddr;
use std::path::PathBuf;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Environment {
    Development,
    Test,
    Production,
}

impl std::fmt::Display for Environment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Environment::Development => write!(f, "development"),
            Environment::Test => write!(f, "test"),
            Environment::Production => write!(f, "production"),
        }
    }
}

#[derive(Clone)]
pub struct AppConfig {
    pub env: Environment,
    pub bind_addr: SocketAddr,
    pub log_level: String,
    /// JSON file written by the external scraper and read on every prices request.
    pub catalog_path: PathBuf,
    /// Working directory the scraper script is launched from.
    pub scraper_dir: PathBuf,
    pub scraper_script: String,
    /// Interpreter override; `None` probes `python3` then `python`.
    pub scraper_python: Option<String>,
    pub scraper_timeout_secs: u64,
    pub scraper_max_output_bytes: usize,
    /// Shared bearer secret for the scrape trigger. `None` leaves it open.
    pub cron_secret: Option<String>,
    pub rate_timeout_secs: u64,
    pub rate_user_agent: String,
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("bind_addr", &self.bind_addr)
            .field("log_level", &self.log_level)
            .field("catalog_path", &self.catalog_path)
            .field("scraper_dir", &self.scraper_dir)
            .field("scraper_script", &self.scraper_script)
            .field("scraper_python", &self.scraper_python)
            .field("scraper_timeout_secs", &self.scraper_timeout_secs)
            .field("scraper_max_output_bytes", &self.scraper_max_output_bytes)
            .field(
                "cron_secret",
                &self.cron_secret.as_ref().map(|_| "[redacted]"),
            )
            .field("rate_timeout_secs", &self.rate_timeout_secs)
            .field("rate_user_agent", &self.rate_user_agent)
            .finish()
    }
}
