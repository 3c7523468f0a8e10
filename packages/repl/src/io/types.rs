//! I/O types shared by the shell core and its hosts.

use serde::{Deserialize, Serialize};

/// A line of input from the user.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InputLine {
    pub line: String,
}

/// A signal from the host (Ctrl+C, Ctrl+D).
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "signal", rename_all = "lowercase")]
pub enum Signal {
    Interrupt,
    Eof,
}

/// Output to be written by the shell.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Output {
    pub text: String,
    #[serde(default)]
    pub style: OutputStyle,
}

impl Output {
    fn styled(text: impl Into<String>, style: OutputStyle) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }

    /// Plain output, possibly carrying its own ANSI codes.
    pub fn normal(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Normal)
    }

    /// A failed command's message.
    pub fn error(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Error)
    }

    /// Status messages such as the goodbye line.
    pub fn info(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Info)
    }

    /// The start-up banner.
    pub fn banner(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Banner)
    }

    /// A change delivered to one of the shell's subscriptions.
    pub fn notification(text: impl Into<String>) -> Self {
        Self::styled(text, OutputStyle::Notification)
    }
}

/// Style hint for output rendering.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum OutputStyle {
    /// Already contains ANSI codes if applicable.
    #[default]
    Normal,
    Error,
    Info,
    Banner,
    Notification,
}

/// Prompt state sent from core to host before each input.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptConfig {
    /// Records held by the backing store.
    pub record_count: usize,
    /// Live subscriptions opened from the shell.
    pub subscription_count: usize,
}

/// Why the shell loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ExitReason {
    /// `exit` or `quit`.
    UserExit,
    /// Ctrl+D.
    Eof,
}
