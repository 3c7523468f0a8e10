//! I/O abstraction for the shell.
//!
//! The core talks to the user only through [`IoHost`], so the same loop runs
//! against a terminal or a scripted host in tests.

pub mod types;

pub use types::*;

/// Error type for host I/O.
#[derive(Debug, thiserror::Error)]
pub enum IoError {
    #[error("I/O error: {0}")]
    Io(String),
}

impl From<std::io::Error> for IoError {
    fn from(e: std::io::Error) -> Self {
        IoError::Io(e.to_string())
    }
}

/// Host interface for shell I/O.
pub trait IoHost {
    /// Wait for input to become available.
    ///
    /// After this returns, either `read_input()` yields a line or
    /// `read_signal()` yields a signal.
    fn wait_for_input(&mut self) -> Result<(), IoError>;

    /// The next input line, if one is ready.
    fn read_input(&mut self) -> Result<Option<InputLine>, IoError>;

    /// Any pending signal (Ctrl+C, Ctrl+D).
    fn read_signal(&mut self) -> Result<Option<Signal>, IoError>;

    fn write_output(&mut self, output: Output) -> Result<(), IoError>;

    /// Update the prompt rendered before the next input.
    fn write_prompt(&mut self, config: PromptConfig) -> Result<(), IoError>;

    fn flush(&mut self) -> Result<(), IoError> {
        Ok(())
    }
}
