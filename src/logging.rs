//! Append-only session log — one timestamped line per significant event.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Utc;
use owo_colors::OwoColorize as _;

/// Timestamped line writer for the session log file.
///
/// Every significant event (resolution warning, dispatch terminal status,
/// aggregate completion) lands here. Lines are appended with a
/// `[%Y-%m-%d %H:%M:%S UTC]` prefix and, unless the sink is quiet, echoed
/// dimmed to the console.
pub struct LogSink {
    path: PathBuf,
    quiet: bool,
}

impl LogSink {
    /// Create a sink writing to `~/.machina/logs/session-<timestamp>.log`.
    ///
    /// # Errors
    ///
    /// Returns an error if the home directory cannot be determined or the
    /// log directory cannot be created.
    pub fn new(quiet: bool) -> Result<Self> {
        let home =
            dirs::home_dir().ok_or_else(|| anyhow::anyhow!("cannot determine home directory"))?;
        let dir = home.join(".machina").join("logs");
        std::fs::create_dir_all(&dir)
            .with_context(|| format!("creating log directory {}", dir.display()))?;
        let name = format!("session-{}.log", Utc::now().format("%Y%m%dT%H%M%SZ"));
        Ok(Self { path: dir.join(name), quiet })
    }

    /// Create a sink writing to an explicit path (used in tests).
    #[must_use]
    pub fn with_path(path: PathBuf, quiet: bool) -> Self {
        Self { path, quiet }
    }

    /// Path of the log file backing this sink.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Append one timestamped line and echo it to the console.
    ///
    /// Log-file write failures are reported to stderr but never abort the
    /// operation being logged.
    pub fn line(&self, msg: &str) {
        let stamped = format!("[{}] {msg}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"));
        if let Err(e) = self.append(&stamped) {
            eprintln!("warning: cannot write session log: {e:#}");
        }
        if !self.quiet {
            println!("{}", stamped.dimmed());
        }
    }

    /// Append a resolution or dispatch warning.
    pub fn warn(&self, msg: &str) {
        self.line(&format!("[WARN] {msg}"));
    }

    fn append(&self, line: &str) -> Result<()> {
        use std::io::Write as _;
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("creating directory {}", parent.display()))?;
        }
        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .with_context(|| format!("opening log file {}", self.path.display()))?;
        writeln!(file, "{line}").with_context(|| format!("writing {}", self.path.display()))?;
        Ok(())
    }
}
