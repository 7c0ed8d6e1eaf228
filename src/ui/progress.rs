use console::style;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

use crate::ui::icons::CROSS;

/// Spinner shown on stderr while the board is fetched or a move is being
/// confirmed. Hidden entirely when `quiet` is set so piped output stays
/// clean.
pub struct LoadSpinner {
    bar: ProgressBar,
}

impl LoadSpinner {
    pub fn start(message: &str, quiet: bool) -> Self {
        let bar = if quiet {
            ProgressBar::hidden()
        } else {
            ProgressBar::new_spinner()
        };
        let spinner_style = ProgressStyle::default_spinner()
            .template("{spinner:.cyan} {msg}")
            .expect("progress bar template is a valid static string");
        bar.set_style(spinner_style);
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(100));
        Self { bar }
    }

    pub fn fail(self, message: &str) {
        self.bar
            .finish_with_message(format!("{}{}", CROSS, style(message).red()));
    }

    /// Removes the spinner line without leaving a message.
    pub fn clear(self) {
        self.bar.finish_and_clear();
    }
}
