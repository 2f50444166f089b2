//! Terminal output helpers

use std::time::Duration;

use indicatif::{ProgressBar, ProgressStyle};
use owo_colors::{OwoColorize, colors::css};

/// Whether the terminal is too narrow for the detailed catalog layout.
pub fn is_narrow() -> bool {
    terminal_size::terminal_size().is_some_and(|(width, _)| width.0 < 60)
}

/// A spinner on stderr while a network call is in flight.
///
/// Hidden when stderr is not a terminal.
pub fn spinner(message: impl Into<String>) -> ProgressBar {
    let bar = ProgressBar::new_spinner().with_message(message.into());
    if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
        bar.set_style(style);
    }
    bar.enable_steady_tick(Duration::from_millis(100));
    bar
}

fn paint(text: &str, styled: impl FnOnce(&str) -> String) -> String {
    if supports_color::on(supports_color::Stream::Stdout).is_some() {
        styled(text)
    } else {
        text.to_string()
    }
}

/// Status colouring for command output. Plain text when colour is off.
pub trait Colorize: AsRef<str> {
    /// Green, for completed actions.
    fn success(&self) -> String {
        paint(self.as_ref(), |text| text.fg::<css::Green>().to_string())
    }

    /// Amber, for refusals and missing records.
    fn warning(&self) -> String {
        paint(self.as_ref(), |text| text.fg::<css::Orange>().to_string())
    }

    /// Blue, for prices and links.
    fn info(&self) -> String {
        paint(self.as_ref(), |text| text.fg::<css::LightBlue>().to_string())
    }

    /// Dimmed, for secondary details.
    fn dim(&self) -> String {
        paint(self.as_ref(), |text| text.dimmed().to_string())
    }
}

impl Colorize for str {}

impl Colorize for String {}
