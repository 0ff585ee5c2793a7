//! Mail transport error types.

use thiserror::Error;

/// Failures talking to the mail store or shaping its messages.
#[derive(Error, Debug)]
pub enum EmailError {
    #[error("could not reach mail server: {0}")]
    ConnectionFailed(String),

    #[error("TLS handshake failed: {0}")]
    TlsError(String),

    #[error("mail server rejected login: {0}")]
    AuthenticationFailed(String),

    /// No usable password source.
    #[error("mail account password unavailable: {0}")]
    CredentialsNotFound(String),

    /// The server answered with NO/BAD or an unexpected response.
    #[error("mail server refused command: {0}")]
    ProtocolError(String),

    #[error("unreadable message: {0}")]
    ParseError(String),

    /// An outgoing message could not be rendered to RFC 822.
    #[error("could not render outgoing message: {0}")]
    BuildError(String),

    #[error("mail transport I/O: {0}")]
    IoError(#[from] std::io::Error),

    #[error("folder '{0}' does not exist")]
    FolderNotFound(String),

    /// Settings the transport cannot work with.
    #[error("unsupported mail settings: {0}")]
    ConfigError(String),

    /// A round trip exceeded its deadline. Carries the command name.
    #[error("{0} did not complete in time")]
    Timeout(String),
}

impl EmailError {
    /// Whether the error indicates a broken session that a reconnect may fix.
    pub fn is_transport(&self) -> bool {
        matches!(
            self,
            EmailError::ConnectionFailed(_)
                | EmailError::TlsError(_)
                | EmailError::IoError(_)
                | EmailError::Timeout(_)
        )
    }
}

impl From<async_native_tls::Error> for EmailError {
    fn from(err: async_native_tls::Error) -> Self {
        Self::TlsError(err.to_string())
    }
}

impl From<async_imap::error::Error> for EmailError {
    fn from(err: async_imap::error::Error) -> Self {
        match err {
            async_imap::error::Error::Io(e) => Self::IoError(e),
            async_imap::error::Error::ConnectionLost => {
                Self::ConnectionFailed("connection lost".to_string())
            }
            other => Self::ProtocolError(other.to_string()),
        }
    }
}

pub type Result<T> = std::result::Result<T, EmailError>;
