//! Platform-specific hosts. The terminal host uses Reedline.

pub mod terminal;

pub use terminal::{EditModeChoice, TerminalHost};
