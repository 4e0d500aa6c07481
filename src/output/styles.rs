//! Color stylesheet for [`OutputContext`](super::OutputContext).

use owo_colors::Style;

/// Every style starts plain; [`colorize`](Styles::colorize) switches them
/// on, so the one `--no-color` decision at startup governs all output.
#[derive(Default, Clone)]
pub struct Styles {
    pub success: Style,
    pub warning: Style,
    pub info: Style,
    /// Secondary text, e.g. the key half of a key-value line.
    pub dim: Style,
    pub header: Style,
}

impl Styles {
    pub fn colorize(&mut self) {
        self.success = Style::new().green();
        self.warning = Style::new().yellow();
        self.info = Style::new().blue();
        self.dim = Style::new().dimmed();
        self.header = Style::new().bold().cyan();
    }
}
