use console::style;

/// Styled terminal messages for command results.
pub struct Output {
    quiet: bool,
}

impl Output {
    pub fn new() -> Self {
        Self { quiet: false }
    }

    /// Suppress everything except errors.
    pub fn quiet(quiet: bool) -> Self {
        Self { quiet }
    }

    pub fn success(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("✓").green(), message);
        }
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("⚠").yellow(), message);
        }
    }

    pub fn info(&self, message: &str) {
        if !self.quiet {
            println!("{} {}", style("ℹ").blue(), message);
        }
    }

    pub fn header(&self, message: &str) {
        if !self.quiet {
            println!("\n{}", style(message).bold().underlined());
        }
    }

    /// Indented `label: value` line under a header.
    pub fn field(&self, label: &str, value: impl std::fmt::Display) {
        if !self.quiet {
            println!("  {:<18} {}", style(format!("{}:", label)).dim(), value);
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
