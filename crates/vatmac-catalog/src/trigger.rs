//! Running the external scraper that refreshes the catalog file.

use std::future::Future;
use std::path::PathBuf;
use std::process::Stdio;
use std::time::{Duration, Instant};

use chrono::{DateTime, Utc};
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::process::Command;
use tokio::task::JoinHandle;
use vatmac_core::AppConfig;

use crate::error::ScrapeError;
use crate::loader::JsonCatalogFile;
use crate::types::ScrapeSummary;

/// Lines of stdout kept in a successful outcome.
pub const STDOUT_TAIL_LINES: usize = 20;

/// Interpreters probed, in order, when none is configured.
const PYTHON_CANDIDATES: [&str; 2] = ["python3", "python"];

/// How long to wait for output pipes to drain after killing a timed-out run.
const DRAIN_GRACE: Duration = Duration::from_secs(2);

/// Result of a completed scraper run.
#[derive(Debug, Clone)]
pub struct ScrapeOutcome {
    pub duration: Duration,
    /// Last [`STDOUT_TAIL_LINES`] lines of stdout.
    pub stdout_tail: String,
    /// `None` when the run wrote nothing to stderr.
    pub stderr: Option<String>,
    /// Modification time of the catalog file after the run.
    pub file_updated: Option<DateTime<Utc>>,
    pub summary: Option<ScrapeSummary>,
}

/// Something that can refresh the scraped catalog on demand.
pub trait ScrapeTrigger {
    fn trigger_scrape(&self) -> impl Future<Output = Result<ScrapeOutcome, ScrapeError>> + Send;
}

/// Runs `<python> <script>` in the scraper directory.
#[derive(Debug, Clone)]
pub struct ExternalScraper {
    dir: PathBuf,
    script: String,
    python: Option<String>,
    timeout: Duration,
    max_output_bytes: usize,
    output: JsonCatalogFile,
}

impl ExternalScraper {
    #[must_use]
    pub fn new(
        dir: impl Into<PathBuf>,
        script: impl Into<String>,
        output: JsonCatalogFile,
    ) -> Self {
        Self {
            dir: dir.into(),
            script: script.into(),
            python: None,
            timeout: Duration::from_secs(280),
            max_output_bytes: 10 * 1024 * 1024,
            output,
        }
    }

    #[must_use]
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(
            &config.scraper_dir,
            config.scraper_script.clone(),
            JsonCatalogFile::new(&config.catalog_path),
        )
        .with_python(config.scraper_python.clone())
        .with_timeout(Duration::from_secs(config.scraper_timeout_secs))
        .with_max_output_bytes(config.scraper_max_output_bytes)
    }

    /// Interpreter to run; `None` probes `python3` then `python`.
    #[must_use]
    pub fn with_python(mut self, python: Option<String>) -> Self {
        self.python = python;
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Per-stream cap on captured stdout/stderr.
    #[must_use]
    pub fn with_max_output_bytes(mut self, max_output_bytes: usize) -> Self {
        self.max_output_bytes = max_output_bytes;
        self
    }

    async fn resolve_python(&self) -> Result<String, ScrapeError> {
        if let Some(python) = &self.python {
            return Ok(python.clone());
        }
        for candidate in PYTHON_CANDIDATES {
            let probe = Command::new(candidate)
                .arg("--version")
                .stdout(Stdio::null())
                .stderr(Stdio::null())
                .status()
                .await;
            if probe.is_ok_and(|status| status.success()) {
                return Ok(candidate.to_owned());
            }
        }
        Err(ScrapeError::PythonNotFound)
    }

    async fn run(&self) -> Result<ScrapeOutcome, ScrapeError> {
        let started = Instant::now();
        let python = self.resolve_python().await?;

        tracing::info!(
            python = %python,
            script = %self.script,
            dir = %self.dir.display(),
            "starting scraper"
        );

        let mut child = Command::new(&python)
            .arg(&self.script)
            .current_dir(&self.dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(ScrapeError::Spawn)?;

        let stdout_task = spawn_capture(child.stdout.take(), self.max_output_bytes);
        let stderr_task = spawn_capture(child.stderr.take(), self.max_output_bytes);

        let waited = tokio::time::timeout(self.timeout, child.wait()).await;

        let status = match waited {
            Ok(Ok(status)) => status,
            Ok(Err(e)) => {
                let stdout = finish_capture(stdout_task).await;
                let stderr = finish_capture(stderr_task).await;
                return Err(ScrapeError::Failed {
                    status: e.to_string(),
                    stdout: stdout.text(),
                    stderr: stderr.text(),
                });
            }
            Err(_) => {
                if let Err(e) = child.kill().await {
                    tracing::warn!(error = %e, "failed to kill timed-out scraper");
                }
                let stdout = finish_capture(stdout_task).await;
                let stderr = finish_capture(stderr_task).await;
                return Err(ScrapeError::Timeout {
                    timeout_secs: self.timeout.as_secs(),
                    stdout: stdout.text(),
                    stderr: stderr.text(),
                });
            }
        };

        let stdout = finish_capture(stdout_task).await;
        let stderr = finish_capture(stderr_task).await;

        if stdout.overflowed || stderr.overflowed {
            return Err(ScrapeError::OutputTooLarge {
                limit: self.max_output_bytes,
                stdout: stdout.text(),
                stderr: stderr.text(),
            });
        }

        if !status.success() {
            return Err(ScrapeError::Failed {
                status: status.to_string(),
                stdout: stdout.text(),
                stderr: stderr.text(),
            });
        }

        let stderr_text = stderr.text();
        if !stderr_text.trim().is_empty() {
            tracing::warn!(stderr = %stderr_text, "scraper wrote to stderr");
        }

        Ok(ScrapeOutcome {
            duration: started.elapsed(),
            stdout_tail: tail_lines(&stdout.text(), STDOUT_TAIL_LINES),
            stderr: Some(stderr_text).filter(|s| !s.is_empty()),
            file_updated: self.output.modified().await,
            summary: self.output.read_summary().await,
        })
    }
}

impl ScrapeTrigger for ExternalScraper {
    async fn trigger_scrape(&self) -> Result<ScrapeOutcome, ScrapeError> {
        let result = self.run().await;
        match &result {
            Ok(outcome) => tracing::info!(
                duration_ms = outcome.duration.as_millis(),
                "scraper completed"
            ),
            Err(e) => tracing::error!(error = %e, "scraper failed"),
        }
        result
    }
}

/// Bytes read from one output stream, up to the cap.
#[derive(Debug, Default)]
struct Captured {
    bytes: Vec<u8>,
    overflowed: bool,
}

impl Captured {
    fn text(&self) -> String {
        String::from_utf8_lossy(&self.bytes).into_owned()
    }
}

fn spawn_capture<R>(stream: Option<R>, limit: usize) -> Option<JoinHandle<Captured>>
where
    R: AsyncRead + Unpin + Send + 'static,
{
    stream.map(|s| tokio::spawn(capture(s, limit)))
}

/// Reads `stream` to EOF, keeping at most `limit` bytes. Excess output is
/// drained and discarded so the child never blocks on a full pipe.
async fn capture<R>(mut stream: R, limit: usize) -> Captured
where
    R: AsyncRead + Unpin,
{
    let mut captured = Captured::default();
    let mut buf = [0u8; 8192];
    loop {
        match stream.read(&mut buf).await {
            Ok(0) => break,
            Ok(n) => {
                let room = limit.saturating_sub(captured.bytes.len());
                if n > room {
                    captured.overflowed = true;
                }
                captured.bytes.extend_from_slice(&buf[..n.min(room)]);
            }
            Err(e) => {
                tracing::warn!(error = %e, "error reading scraper output");
                break;
            }
        }
    }
    captured
}

/// Collects a capture task, giving up after [`DRAIN_GRACE`] if a grandchild
/// still holds the pipe open.
async fn finish_capture(task: Option<JoinHandle<Captured>>) -> Captured {
    let Some(mut task) = task else {
        return Captured::default();
    };
    match tokio::time::timeout(DRAIN_GRACE, &mut task).await {
        Ok(Ok(captured)) => captured,
        Ok(Err(e)) => {
            tracing::warn!(error = %e, "scraper output task failed");
            Captured::default()
        }
        Err(_) => {
            task.abort();
            Captured::default()
        }
    }
}

/// Last `n` lines of `text`, newline-joined.
#[must_use]
pub fn tail_lines(text: &str, n: usize) -> String {
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);
    lines[start..].join("\n")
}
