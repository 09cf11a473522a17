//! Error types for the inbox-responder crate.
//!
//! All errors implement [`std::error::Error`] and provide context about what went wrong.
//! Errors are categorized by their retryability - see [`Error::is_retryable`].
//!
//! Two failure classes deliberately do NOT appear here: a message that fails to
//! parse is skipped with a warning (partial-thread degradation), and a respond
//! capability that declines to answer is the normal escalate-to-a-human path.

use thiserror::Error;

/// Result type alias using [`Error`].
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while polling, resolving, or replying.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    // ─────────────────────────────────────────────────────────────────────────
    // Configuration / validation errors (NOT retryable)
    // ─────────────────────────────────────────────────────────────────────────
    /// Invalid email address format.
    #[error("invalid email format: {email}")]
    InvalidEmailFormat {
        /// The invalid email address.
        email: String,
    },

    /// Invalid configuration provided.
    #[error("invalid configuration: {message}")]
    InvalidConfig {
        /// Description of the configuration error.
        message: String,
    },

    /// Invalid DNS name for TLS.
    #[error("invalid DNS name for host '{host}'")]
    InvalidDnsName {
        /// The invalid hostname.
        host: String,
        /// The underlying DNS name error.
        #[source]
        source: rustls::client::InvalidDnsNameError,
    },

    /// A message identifier that is not a valid IMAP UID.
    #[error("invalid message identifier: {id}")]
    InvalidMessageId {
        /// The identifier that failed to parse.
        id: String,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Network / connection errors (RETRYABLE)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to establish TCP connection.
    #[error("failed to connect to {target}")]
    TcpConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Failed to establish TLS connection.
    #[error("failed to establish TLS connection to {target}")]
    TlsConnect {
        /// The target address that failed.
        target: String,
        /// The underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // IMAP protocol errors (RETRYABLE - could be transient server issues)
    // ─────────────────────────────────────────────────────────────────────────
    /// IMAP login failed.
    #[error("IMAP login failed for {email}")]
    ImapLogin {
        /// The email address used for login.
        email: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to select mailbox.
    #[error("failed to select mailbox '{mailbox}'")]
    SelectMailbox {
        /// The mailbox name.
        mailbox: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP NOOP failed.
    #[error("IMAP NOOP command failed")]
    ImapNoop {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP search failed.
    #[error("IMAP search failed for query {query}")]
    ImapSearch {
        /// The search query that failed.
        query: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP fetch failed.
    #[error("IMAP fetch failed for UID {uid}")]
    ImapFetch {
        /// The UID that failed.
        uid: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// Failed to read a message from the fetch stream.
    #[error("failed to fetch message from stream")]
    FetchMessage {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP store (flag update) failed.
    #[error("failed to store flags on UID {uid}")]
    ImapStore {
        /// The UID whose flags failed to update.
        uid: String,
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    /// IMAP logout failed.
    #[error("IMAP logout failed")]
    ImapLogout {
        /// The underlying IMAP error.
        #[source]
        source: async_imap::error::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // SMTP errors (RETRYABLE - transient relay issues)
    // ─────────────────────────────────────────────────────────────────────────
    /// Failed to build or verify the SMTP transport.
    #[error("failed to connect to SMTP relay {host}")]
    SmtpConnect {
        /// The SMTP relay hostname.
        host: String,
        /// The underlying SMTP error.
        #[source]
        source: lettre::transport::smtp::Error,
    },

    /// The SMTP relay answered the connection probe negatively.
    #[error("SMTP relay {host} refused the connection probe")]
    SmtpUnavailable {
        /// The SMTP relay hostname.
        host: String,
    },

    /// Sending a reply failed. The source message is left unread when this
    /// occurs - the mark-as-read step only runs after a successful send.
    #[error("failed to send reply to {recipient}")]
    SmtpSend {
        /// The intended recipient address.
        recipient: String,
        /// The underlying SMTP error.
        #[source]
        source: lettre::transport::smtp::Error,
    },

    // ─────────────────────────────────────────────────────────────────────────
    // Reply construction errors (NOT retryable - bad input won't change)
    // ─────────────────────────────────────────────────────────────────────────
    /// An address in an outbound reply failed to parse.
    #[error("invalid address in outbound reply: {address}")]
    InvalidAddress {
        /// The offending address.
        address: String,
        /// The underlying address parse error.
        #[source]
        source: lettre::address::AddressError,
    },

    /// Building the outbound MIME message failed.
    #[error("failed to build outbound reply")]
    BuildReply {
        /// The underlying message construction error.
        #[source]
        source: lettre::error::Error,
    },
}

impl Error {
    /// Returns `true` if this error represents a transient failure that might succeed on retry.
    ///
    /// The responder loop does not retry within a cycle; transient errors abort
    /// the cycle and the next cycle (or a supervisor restart) gets a fresh
    /// connection. This classification exists for hosts that want their own
    /// retry or alerting policy:
    ///
    /// ```ignore
    /// if error.is_retryable() {
    ///     // Backoff and retry
    /// } else {
    ///     // Fail permanently
    /// }
    /// ```
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            // RETRYABLE errors: network, IMAP protocol, SMTP relay
            Error::TcpConnect { .. }
            | Error::TlsConnect { .. }
            | Error::ImapLogin { .. }
            | Error::SelectMailbox { .. }
            | Error::ImapNoop { .. }
            | Error::ImapSearch { .. }
            | Error::ImapFetch { .. }
            | Error::FetchMessage { .. }
            | Error::ImapStore { .. }
            | Error::SmtpConnect { .. }
            | Error::SmtpUnavailable { .. }
            | Error::SmtpSend { .. } => true,

            // NOT retryable: config errors, logout, reply construction
            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::InvalidDnsName { .. }
            | Error::InvalidMessageId { .. }
            | Error::ImapLogout { .. }
            | Error::InvalidAddress { .. }
            | Error::BuildReply { .. } => false,
        }
    }

    /// Returns the error category for metrics/logging purposes.
    #[must_use]
    pub fn category(&self) -> ErrorCategory {
        match self {
            Error::InvalidEmailFormat { .. }
            | Error::InvalidConfig { .. }
            | Error::InvalidDnsName { .. }
            | Error::InvalidMessageId { .. } => ErrorCategory::Configuration,

            Error::TcpConnect { .. } | Error::TlsConnect { .. } => ErrorCategory::Network,

            Error::ImapLogin { .. }
            | Error::SelectMailbox { .. }
            | Error::ImapNoop { .. }
            | Error::ImapSearch { .. }
            | Error::ImapFetch { .. }
            | Error::FetchMessage { .. }
            | Error::ImapStore { .. }
            | Error::ImapLogout { .. } => ErrorCategory::Protocol,

            Error::SmtpConnect { .. }
            | Error::SmtpUnavailable { .. }
            | Error::SmtpSend { .. }
            | Error::InvalidAddress { .. }
            | Error::BuildReply { .. } => ErrorCategory::Send,
        }
    }
}

/// Error categories for metrics and logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorCategory {
    /// Configuration or validation errors.
    Configuration,
    /// Network connectivity errors.
    Network,
    /// IMAP protocol errors.
    Protocol,
    /// SMTP send or reply construction errors.
    Send,
}

impl std::fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ErrorCategory::Configuration => write!(f, "configuration"),
            ErrorCategory::Network => write!(f, "network"),
            ErrorCategory::Protocol => write!(f, "protocol"),
            ErrorCategory::Send => write!(f, "send"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_retryable_classification() {
        // Configuration errors are not retryable
        let err = Error::InvalidEmailFormat {
            email: "bad".into(),
        };
        assert!(!err.is_retryable());

        // Network errors are retryable
        let err = Error::TcpConnect {
            target: "imap.example.com:993".into(),
            source: std::io::Error::new(std::io::ErrorKind::ConnectionRefused, "refused"),
        };
        assert!(err.is_retryable());

        // A bad message identifier won't get better on retry
        let err = Error::InvalidMessageId { id: "nope".into() };
        assert!(!err.is_retryable());
    }

    #[test]
    fn test_error_categories() {
        let err = Error::InvalidEmailFormat {
            email: "bad".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Configuration);

        let err = Error::TlsConnect {
            target: "imap.example.com:993".into(),
            source: std::io::Error::new(std::io::ErrorKind::Other, "handshake"),
        };
        assert_eq!(err.category(), ErrorCategory::Network);

        let err = Error::InvalidMessageId { id: "x".into() };
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }

    #[test]
    fn test_display_includes_context() {
        let err = Error::SmtpUnavailable {
            host: "smtp.example.com".into(),
        };
        assert!(err.to_string().contains("smtp.example.com"));
        assert!(err.is_retryable());
        assert_eq!(err.category(), ErrorCategory::Send);
    }
}
