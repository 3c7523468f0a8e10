//! Error types shared by every recordfs layer.

/// Errors raised by the record layer and the stores behind it.
///
/// The type is `Clone` because one failed record fetch is reported to every
/// caller that was waiting on it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    /// The path expression could not be turned into a canonical path.
    #[error("invalid path format: {message}")]
    InvalidPathFormat { message: String },

    /// A snapshot or read addressed a record the store does not hold.
    #[error("record not found: {name}")]
    RecordNotFound { name: String },

    /// The store connection or protocol failed.
    #[error("store transport error: {message}")]
    Transport { message: String },

    /// An RPC provider failed, or no provider answered.
    #[error("rpc '{name}' failed: {message}")]
    Rpc { name: String, message: String },

    /// The store rejected the login credentials.
    #[error("login rejected: {message}")]
    Auth { message: String },

    /// A value could not be converted to or from its typed form.
    #[error("serialization error: {message}")]
    Serialization { message: String },
}

impl Error {
    /// Create an [`Error::InvalidPathFormat`].
    pub fn invalid_path(message: impl Into<String>) -> Self {
        Error::InvalidPathFormat {
            message: message.into(),
        }
    }

    /// Create an [`Error::RecordNotFound`] for record `name`.
    pub fn not_found(name: impl Into<String>) -> Self {
        Error::RecordNotFound { name: name.into() }
    }

    /// Create an [`Error::Transport`].
    pub fn transport(message: impl Into<String>) -> Self {
        Error::Transport {
            message: message.into(),
        }
    }

    /// Create an [`Error::Rpc`] for endpoint `name`.
    pub fn rpc(name: impl Into<String>, message: impl Into<String>) -> Self {
        Error::Rpc {
            name: name.into(),
            message: message.into(),
        }
    }

    /// True for [`Error::RecordNotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::RecordNotFound { .. })
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Serialization {
            message: e.to_string(),
        }
    }
}

/// Result alias for record layer operations.
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_path_display() {
        let e = Error::invalid_path("bad path");
        let display = e.to_string();
        assert!(display.contains("invalid path format"));
        assert!(display.contains("bad path"));
    }

    #[test]
    fn not_found_display_names_record() {
        let e = Error::not_found("users.alice");
        assert_eq!(e.to_string(), "record not found: users.alice");
        assert!(e.is_not_found());
    }

    #[test]
    fn rpc_display() {
        let e = Error::rpc("users.refresh", "NO_RPC_PROVIDER");
        let display = e.to_string();
        assert!(display.contains("users.refresh"));
        assert!(display.contains("NO_RPC_PROVIDER"));
        assert!(!e.is_not_found());
    }

    #[test]
    fn json_error_conversion() {
        let json_err = serde_json::from_str::<u32>("\"nope\"").unwrap_err();
        let e: Error = json_err.into();
        assert!(matches!(e, Error::Serialization { .. }));
    }

    #[test]
    fn errors_clone_equal() {
        let e = Error::transport("connection reset");
        assert_eq!(e.clone(), e);
    }
}
