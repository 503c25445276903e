use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

#[derive(Clone, Copy, Debug, PartialEq, PartialOrd)]
pub enum VerbosityLevel {
    Silent = 0,    // Errors only
    Summary = 1,   // Warnings and final summary (default)
    Detailed = 2,  // One line per enriched address
    Debug = 3,     // Every resolver step
}

impl VerbosityLevel {
    pub fn from_verbose_count(count: u8) -> Self {
        match count {
            0 => VerbosityLevel::Summary,
            1 => VerbosityLevel::Detailed,
            2.. => VerbosityLevel::Debug,
        }
    }

    /// Default filter directive when `RUST_LOG` is unset
    pub fn filter_directive(&self) -> &'static str {
        match self {
            VerbosityLevel::Silent => "emailenrich=error",
            VerbosityLevel::Summary => "emailenrich=warn",
            VerbosityLevel::Detailed => "emailenrich=info",
            VerbosityLevel::Debug => "emailenrich=debug,info",
        }
    }
}

/// Install the global subscriber: compact stderr output, plus an optional
/// plain-text copy appended to `log_file`. `RUST_LOG` overrides the level.
pub fn init_tracing(verbosity: VerbosityLevel, log_file: Option<&Path>) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(verbosity.filter_directive()));

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file: {}", path.display()))?;
            Some(
                tracing_subscriber::fmt::layer()
                    .with_ansi(false)
                    .with_target(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .with_target(false)
                .with_thread_ids(false)
                .with_file(false)
                .with_line_number(false)
                .with_writer(std::io::stderr)
                .compact(),
        )
        .with(file_layer)
        .try_init()
        .context("Failed to install tracing subscriber")?;

    Ok(())
}

/// Progress bar for batch runs; hidden when verbosity is `Silent`
pub struct BatchProgress {
    bar: ProgressBar,
}

impl BatchProgress {
    pub fn new(total: u64, verbosity: VerbosityLevel) -> Self {
        let bar = if verbosity == VerbosityLevel::Silent {
            ProgressBar::hidden()
        } else {
            ProgressBar::new(total)
        };

        bar.set_style(
            ProgressStyle::default_bar()
                .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_bar())
                .progress_chars("##-"),
        );
        bar.set_message("Enriching...");

        Self { bar }
    }

    /// Advance one address
    pub fn advance(&self, email: &str) {
        self.bar.set_message(email.to_string());
        self.bar.inc(1);
    }

    pub fn finish(&self) {
        self.bar.finish_and_clear();
    }

    pub fn position(&self) -> u64 {
        self.bar.position()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_verbosity_from_count() {
        assert_eq!(VerbosityLevel::from_verbose_count(0), VerbosityLevel::Summary);
        assert_eq!(VerbosityLevel::from_verbose_count(1), VerbosityLevel::Detailed);
        assert_eq!(VerbosityLevel::from_verbose_count(5), VerbosityLevel::Debug);
        assert!(VerbosityLevel::Debug > VerbosityLevel::Summary);
    }

    #[test]
    fn test_filter_directives_parse() {
        for level in [
            VerbosityLevel::Silent,
            VerbosityLevel::Summary,
            VerbosityLevel::Detailed,
            VerbosityLevel::Debug,
        ] {
            assert!(EnvFilter::try_new(level.filter_directive()).is_ok());
        }
    }

    #[test]
    fn test_progress_counts() {
        let progress = BatchProgress::new(2, VerbosityLevel::Silent);
        progress.advance("a@b.com");
        progress.advance("c@d.com");
        assert_eq!(progress.position(), 2);
        progress.finish();
    }
}
