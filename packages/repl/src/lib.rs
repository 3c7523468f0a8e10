//! # recordfs-repl
//!
//! An interactive shell over a recordfs client backed by an in-memory
//! store. Useful for trying path expressions, watching subscriptions fire,
//! and calling RPC endpoints.
//!
//! ## Usage
//!
//! ```bash
//! recordfs
//!
//! # Inside the shell:
//! > set users/alice {"name": "Alice"}
//! > sub users/alice@name
//! > set users/alice@name "Alicia"
//! ~ users.alice@name "Alicia"
//! > merge users/alice {"age": 30}
//! > call echo {"hello": "world"}
//! ```

pub mod commands;
pub mod completer;
pub mod host;
pub mod io;
pub mod session;
pub mod shell;

pub use host::{EditModeChoice, TerminalHost};
pub use io::ExitReason;
pub use session::{Session, SessionError};
pub use shell::ReplCore;

use recordfs_core::SplitPolicy;

/// Errors that end the shell.
#[derive(Debug, thiserror::Error)]
pub enum ReplError {
    #[error(transparent)]
    Session(#[from] SessionError),

    #[error(transparent)]
    Io(#[from] io::IoError),

    #[error("terminal setup failed: {0}")]
    Terminal(#[from] std::io::Error),
}

/// Shell start-up options.
#[derive(Debug, Clone, Copy, Default)]
pub struct Options {
    /// `None` detects the mode from the environment.
    pub edit_mode: Option<EditModeChoice>,
    pub split: SplitPolicy,
}

/// Run the shell in the terminal until the user exits.
pub fn run(options: Options) -> Result<ExitReason, ReplError> {
    let mut core = ReplCore::new(options.split)?;
    let mut host = TerminalHost::new(options.edit_mode)?;
    Ok(core.run(&mut host)?)
}
