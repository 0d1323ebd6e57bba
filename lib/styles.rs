//! CLI styles for clap and terminal spinners.

use clap::builder::styling::{AnsiColor, Color, Style, Styles};
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

//--------------------------------------------------------------------------------------------------
// Types
//--------------------------------------------------------------------------------------------------

/// A one-line spinner that ends with a success or failure mark.
pub struct Spinner {
    bar: ProgressBar,
    message: String,
    indent: usize,
}

//--------------------------------------------------------------------------------------------------
// Methods
//--------------------------------------------------------------------------------------------------

impl Spinner {
    pub fn new(message: impl Into<String>) -> Self {
        Self::with_indent(message, 2)
    }

    /// Start a spinner indented by `indent` spaces.
    pub fn with_indent(message: impl Into<String>, indent: usize) -> Self {
        let message = message.into();
        let bar = ProgressBar::new_spinner();
        let template = format!("{}{{spinner:.cyan}} {{msg}}", " ".repeat(indent));
        if let Ok(style) = ProgressStyle::default_spinner().template(&template) {
            bar.set_style(style);
        }
        bar.set_message(message.clone());
        bar.enable_steady_tick(Duration::from_millis(80));
        Self {
            bar,
            message,
            indent,
        }
    }

    /// Update the message.
    pub fn set_message(&mut self, message: impl Into<String>) {
        self.message = message.into();
        self.bar.set_message(self.message.clone());
    }

    /// Finish with a check mark and an optional final message.
    pub fn succeed(self, message: Option<&str>) {
        self.finish("✓".bright_green().to_string(), message);
    }

    /// Finish with a cross and an optional final message.
    pub fn fail(self, message: Option<&str>) {
        self.finish("✗".bright_red().to_string(), message);
    }

    fn finish(self, mark: String, message: Option<&str>) {
        self.bar.finish_and_clear();
        println!(
            "{}{} {}",
            " ".repeat(self.indent),
            mark,
            message.unwrap_or(&self.message)
        );
    }
}

//--------------------------------------------------------------------------------------------------
// Functions
//--------------------------------------------------------------------------------------------------

pub fn styles() -> Styles {
    Styles::styled()
        .header(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Yellow))),
        )
        .usage(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
        .literal(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .placeholder(Style::new().fg_color(Some(Color::Ansi(AnsiColor::Cyan))))
        .error(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .invalid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Red))),
        )
        .valid(
            Style::new()
                .bold()
                .fg_color(Some(Color::Ansi(AnsiColor::Green))),
        )
}
