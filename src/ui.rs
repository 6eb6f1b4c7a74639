//! Stage progress for the command-line surface, written to stderr.

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use std::time::{Duration, Instant};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum UiMode {
    Auto,
    Plain,
    Pretty,
    Quiet,
}

impl std::str::FromStr for UiMode {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> anyhow::Result<Self> {
        match value {
            "auto" => Ok(UiMode::Auto),
            "plain" => Ok(UiMode::Plain),
            "pretty" => Ok(UiMode::Pretty),
            "quiet" => Ok(UiMode::Quiet),
            other => Err(anyhow::anyhow!(
                "unknown ui mode '{}' (expected auto, plain, pretty or quiet)",
                other
            )),
        }
    }
}

#[derive(Clone, Debug)]
pub struct Ui {
    mode: UiMode,
    is_tty: bool,
}

impl Ui {
    pub fn new(mode: UiMode, is_tty: bool) -> Self {
        Self { mode, is_tty }
    }

    /// Spinners only when stderr is a terminal, unless forced.
    fn use_pretty(&self) -> bool {
        match self.mode {
            UiMode::Pretty => true,
            UiMode::Auto => self.is_tty,
            UiMode::Plain | UiMode::Quiet => false,
        }
    }

    pub fn stage(&self, name: &str) -> StageGuard {
        if self.mode == UiMode::Quiet {
            return StageGuard::new(name.to_string(), None, false);
        }
        if self.use_pretty() {
            let spinner = ProgressBar::new_spinner();
            spinner.set_draw_target(ProgressDrawTarget::stderr());
            spinner.enable_steady_tick(Duration::from_millis(120));
            let style = ProgressStyle::with_template("{spinner} {msg}")
                .unwrap_or_else(|_| ProgressStyle::default_spinner());
            spinner.set_style(style);
            spinner.set_message(format!("{name}…"));
            StageGuard::new(name.to_string(), Some(spinner), true)
        } else {
            eprintln!("==> {}", name);
            StageGuard::new(name.to_string(), None, true)
        }
    }
}

/// Reports the stage's elapsed time when dropped.
pub struct StageGuard {
    name: String,
    start: Instant,
    spinner: Option<ProgressBar>,
    report: bool,
}

impl StageGuard {
    fn new(name: String, spinner: Option<ProgressBar>, report: bool) -> Self {
        Self {
            name,
            start: Instant::now(),
            spinner,
            report,
        }
    }

    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }
}

impl Drop for StageGuard {
    fn drop(&mut self) {
        if !self.report {
            return;
        }
        let message = format!("✔ {} ({})", self.name, format_duration(self.elapsed()));
        if let Some(spinner) = &self.spinner {
            spinner.finish_with_message(message);
        } else {
            eprintln!("{message}");
        }
    }
}

fn format_duration(duration: Duration) -> String {
    if duration.as_secs() >= 1 {
        format!("{:.2}s", duration.as_secs_f64())
    } else {
        format!("{}ms", duration.as_millis())
    }
}
