//! Logging setup
//!
//! One-shot commands log to stderr. The TUI owns the terminal, so it logs to
//! a daily file under the data dir instead (`reasoning-lab-YYYY-MM-DD.log`,
//! kept for 7 days).

use chrono::{Local, NaiveDate};
use std::fs::{self, OpenOptions};
use std::path::{Path, PathBuf};
use std::sync::Mutex;
use tracing_subscriber::EnvFilter;

const LOG_PREFIX: &str = "reasoning-lab-";
const LOG_RETENTION_DAYS: i64 = 7;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogTarget {
    Stderr,
    File,
}

pub fn log_dir() -> PathBuf {
    dirs::data_dir()
        .map(|p| p.join("reasoning-lab").join("logs"))
        .unwrap_or_else(|| PathBuf::from("logs"))
}

fn env_filter(verbose: bool, default_level: &str) -> EnvFilter {
    if verbose {
        return EnvFilter::new("reasoning_lab_lib=debug,reasoning_lab=debug");
    }
    EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level))
}

/// Install the global subscriber. Returns the log file path in file mode.
pub fn init_logging(verbose: bool, target: LogTarget) -> Option<PathBuf> {
    match target {
        LogTarget::Stderr => {
            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter(verbose, "warn"))
                .with_writer(std::io::stderr)
                .try_init();
            None
        }
        LogTarget::File => {
            let dir = log_dir();
            fs::create_dir_all(&dir).ok()?;
            prune_old_logs(&dir, Local::now().date_naive());

            let path = dir.join(log_file_name(Local::now().date_naive()));
            let file = OpenOptions::new().create(true).append(true).open(&path).ok()?;

            let _ = tracing_subscriber::fmt()
                .with_env_filter(env_filter(verbose, "info"))
                .with_writer(Mutex::new(file))
                .with_ansi(false)
                .try_init();
            Some(path)
        }
    }
}

fn log_file_name(day: NaiveDate) -> String {
    format!("{}{}.log", LOG_PREFIX, day.format("%Y-%m-%d"))
}

/// Delete our log files older than the retention window
fn prune_old_logs(dir: &Path, today: NaiveDate) {
    let cutoff = today - chrono::Duration::days(LOG_RETENTION_DAYS);
    let Ok(entries) = fs::read_dir(dir) else { return };

    for entry in entries.flatten() {
        let path = entry.path();
        let date = path
            .file_name()
            .and_then(|n| n.to_str())
            .and_then(|n| n.strip_prefix(LOG_PREFIX))
            .and_then(|n| n.strip_suffix(".log"))
            .and_then(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d").ok());

        if matches!(date, Some(d) if d < cutoff) {
            let _ = fs::remove_file(&path);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    #[test]
    fn test_log_file_name() {
        let day = NaiveDate::from_ymd_opt(2024, 3, 9).unwrap();
        assert_eq!(log_file_name(day), "reasoning-lab-2024-03-09.log");
    }

    #[test]
    fn test_prune_old_logs_keeps_recent_and_foreign_files() {
        let dir = tempdir().unwrap();
        let today = NaiveDate::from_ymd_opt(2024, 3, 20).unwrap();
        for name in [
            "reasoning-lab-2024-03-01.log",
            "reasoning-lab-2024-03-19.log",
            "other-2024-01-01.log",
        ] {
            fs::write(dir.path().join(name), "x").unwrap();
        }

        prune_old_logs(dir.path(), today);

        assert!(!dir.path().join("reasoning-lab-2024-03-01.log").exists());
        assert!(dir.path().join("reasoning-lab-2024-03-19.log").exists());
        assert!(dir.path().join("other-2024-01-01.log").exists());
    }
}
