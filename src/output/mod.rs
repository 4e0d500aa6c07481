//! Human-readable terminal output.
//!
//! Status lines all go through [`OutputContext`] so quiet mode and color
//! handling are decided once, at startup. Fatal errors never pass through
//! here; `main` renders those on stderr after the command returns.

pub mod json;
pub mod progress;
pub mod styles;

use console::Term;
use owo_colors::OwoColorize as _;
pub use styles::Styles;

pub struct OutputContext {
    pub styles: Styles,
    /// Whether stdout is a TTY; spinners are pointless in a pipe.
    pub is_tty: bool,
    pub quiet: bool,
}

impl OutputContext {
    /// Colors require a TTY, no `--no-color`, and no `NO_COLOR` in the
    /// environment; any one of them forces plain text.
    #[must_use]
    pub fn new(no_color: bool, quiet: bool) -> Self {
        let is_tty = Term::stdout().is_term();
        let use_colors = !no_color && is_tty && std::env::var("NO_COLOR").is_err();

        let mut styles = Styles::default();
        if use_colors {
            styles.colorize();
        }

        Self {
            styles,
            is_tty,
            quiet,
        }
    }

    #[must_use]
    pub fn show_progress(&self) -> bool {
        self.is_tty && !self.quiet
    }

    /// `✓ <msg>`, suppressed when quiet.
    pub fn success(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "✓".style(self.styles.success));
        }
    }

    /// `⚠ <msg>`, suppressed when quiet.
    pub fn warn(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "⚠".style(self.styles.warning));
        }
    }

    /// `ℹ <msg>`, suppressed when quiet.
    pub fn info(&self, msg: &str) {
        if !self.quiet {
            println!("  {} {msg}", "ℹ".style(self.styles.info));
        }
    }

    pub fn header(&self, msg: &str) {
        if !self.quiet {
            println!("  {}", msg.style(self.styles.header));
        }
    }

    /// Key-value line with the key dimmed.
    pub fn kv(&self, key: &str, value: &str) {
        if !self.quiet {
            println!("  {}  {value}", key.style(self.styles.dim));
        }
    }
}
