//! Displayable state of one task: a coloured symbol, a padded label, body text
//! and an optional suffix notice.

use crossterm::style::Stylize;

use crate::render::visible_width;

/// Leading glyph of a status line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    Pending,
    Active,
    Ok,
    Failed,
    Header,
    Warn,
    Info,
}

impl Symbol {
    fn styled(self) -> String {
        match self {
            Symbol::Pending => "?".yellow().to_string(),
            Symbol::Active => "?".yellow().bold().to_string(),
            Symbol::Ok => "✓".green().bold().to_string(),
            Symbol::Failed => "✘".red().bold().to_string(),
            Symbol::Header => "⁜".green().bold().to_string(),
            Symbol::Warn => "!".yellow().bold().to_string(),
            Symbol::Info => "i".blue().bold().to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StatusLine {
    symbol: Symbol,
    label: String,
    label_width: usize,
    body: String,
    suffix: Option<String>,
}

impl StatusLine {
    /// A job line, pending until a worker picks it up. `label_width` aligns
    /// the bodies of all lines in a run.
    pub fn new(label: impl Into<String>, label_width: usize) -> Self {
        Self {
            symbol: Symbol::Pending,
            label: label.into(),
            label_width,
            body: "Pending".to_string(),
            suffix: None,
        }
    }

    /// A label-less line such as the run header or a one-off notice.
    pub fn notice(symbol: Symbol, body: impl Into<String>) -> Self {
        Self {
            symbol,
            label: String::new(),
            label_width: 0,
            body: body.into(),
            suffix: None,
        }
    }

    pub fn suffix(&self) -> Option<&str> {
        self.suffix.as_deref()
    }

    pub fn set(&mut self, symbol: Symbol, body: impl Into<String>) {
        self.symbol = symbol;
        self.body = body.into();
    }

    pub fn set_suffix(&mut self, suffix: impl Into<String>) {
        self.suffix = Some(suffix.into());
    }

    pub fn clear_suffix(&mut self) {
        self.suffix = None;
    }

    /// Render with ANSI colours.
    pub fn render(&self) -> String {
        let mut out = self.symbol.styled();
        out.push(' ');
        if !self.label.is_empty() {
            let pad = self.label_width.saturating_sub(visible_width(&self.label));
            let padded = format!("{}{}", self.label, " ".repeat(pad));
            out.push_str(&padded.magenta().to_string());
            out.push_str("  ");
        }
        if self.symbol == Symbol::Pending {
            out.push_str(&self.body.as_str().dark_grey().to_string());
        } else {
            out.push_str(&self.body);
        }
        if let Some(suffix) = &self.suffix {
            out.push_str("  ");
            out.push_str(&suffix.as_str().yellow().to_string());
        }
        out
    }
}
