//! High-level IMAP mailbox operations.
//!
//! The [`MailboxClient`] wraps one authenticated IMAP session and exposes the
//! read side of the responder: listing unread conversations, resolving a
//! single conversation, and flagging a handled message. It is the unit the
//! [`Responder`](crate::Responder) acquires at the start of every cycle and
//! releases at the end.
//!
//! # Example
//!
//! ```no_run
//! use inbox_responder::{MailerConfig, MailboxClient};
//!
//! # async fn example() -> inbox_responder::Result<()> {
//! let config = MailerConfig::builder()
//!     .email("support@example.com")
//!     .password("app-password")
//!     .build()?;
//!
//! let mut client = MailboxClient::connect(config).await?;
//! for thread in client.list_unread_threads().await? {
//!     println!("{} message(s) in thread", thread.len());
//! }
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```

use crate::config::MailerConfig;
use crate::connection;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::session::{self, AuthConfig, ImapSession};
use crate::thread;
use std::collections::HashSet;
use tracing::{debug, instrument};

/// The mailbox every cycle reads from.
const MAILBOX: &str = "INBOX";

/// An authenticated IMAP session scoped to the support inbox.
///
/// Create using [`MailboxClient::connect`]; call
/// [`logout`](Self::logout) when done. The client is read-only except for
/// [`mark_seen`](Self::mark_seen).
pub struct MailboxClient {
    session: Box<ImapSession>,
    config: MailerConfig,
}

impl MailboxClient {
    /// Connects to the IMAP server, authenticates, and selects the inbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the connection cannot be established,
    /// authentication fails, or the mailbox cannot be selected. All three are
    /// transport-fatal for the cycle that attempted them.
    #[instrument(
        name = "MailboxClient::connect",
        skip_all,
        fields(
            email = %config.email(),
            imap_host = %config.effective_imap_host()
        )
    )]
    pub async fn connect(config: MailerConfig) -> Result<Self> {
        let imap_host = config.effective_imap_host();
        let target_addr = config.imap_address();

        let tls_stream = connection::establish_tls_connection(&imap_host, &target_addr).await?;

        let auth_config = AuthConfig {
            email: config.email(),
            password: config.password(),
        };
        let mut session = session::authenticate(tls_stream, &auth_config).await?;

        session::select_mailbox(&mut session, MAILBOX).await?;

        debug!("Client connected and ready");

        Ok(Self {
            session: Box::new(session),
            config,
        })
    }

    /// Lists unread conversations addressed to the support address.
    ///
    /// The unread set is a snapshot: mail arriving mid-listing is picked up
    /// on the next cycle. Each unread message is resolved into its full
    /// conversation; unread messages that turn out to share a conversation
    /// produce a single entry. Listing never alters any flags.
    ///
    /// # Errors
    ///
    /// Returns an error if an IMAP search or fetch fails. A message that
    /// merely fails to parse is skipped, not an error.
    #[instrument(name = "MailboxClient::list_unread_threads", skip(self))]
    pub async fn list_unread_threads(&mut self) -> Result<Vec<Vec<Message>>> {
        let uids =
            session::search_unread(&mut self.session, self.config.support_address()).await?;

        let mut threads: Vec<Vec<Message>> = Vec::new();
        let mut covered: HashSet<String> = HashSet::new();

        for uid in uids {
            if covered.contains(&uid.to_string()) {
                debug!(uid, "Unread message already part of a resolved thread");
                continue;
            }

            let thread = thread::resolve(&mut self.session, uid).await?;
            if thread.is_empty() {
                debug!(uid, "Message vanished before fetch, nothing to process");
                continue;
            }

            covered.extend(thread.iter().map(|message| message.id.clone()));
            threads.push(thread);
        }

        debug!(thread_count = threads.len(), "Listed unread threads");

        Ok(threads)
    }

    /// Resolves the full conversation containing the given message.
    ///
    /// Messages are returned in ascending date order. An empty result means
    /// the message no longer exists; treat it as nothing to process.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMessageId`] for an identifier this client
    /// never produced, or an IMAP error if the resolution searches fail.
    pub async fn resolve_thread(&mut self, message_id: &str) -> Result<Vec<Message>> {
        let uid = parse_uid(message_id)?;
        thread::resolve(&mut self.session, uid).await
    }

    /// Flags a message `\Seen`, recording it as handled.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidMessageId`] for a malformed identifier, or an
    /// IMAP error if the store fails.
    pub async fn mark_seen(&mut self, message_id: &str) -> Result<()> {
        let uid = parse_uid(message_id)?;
        session::mark_seen(&mut self.session, uid).await
    }

    /// Logs out from the IMAP server.
    ///
    /// # Errors
    ///
    /// Returns an error if the logout command fails; the underlying
    /// connection is dropped either way.
    #[instrument(name = "MailboxClient::logout", skip(self))]
    pub async fn logout(&mut self) -> Result<()> {
        session::logout(&mut self.session).await
    }

    /// Returns the mailbox address used for this connection.
    #[must_use]
    pub fn email(&self) -> &str {
        self.config.email()
    }
}

impl std::fmt::Debug for MailboxClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailboxClient")
            .field("email", &self.config.email())
            .field("imap_host", &self.config.effective_imap_host())
            .field("mailbox", &MAILBOX)
            .finish_non_exhaustive()
    }
}

fn parse_uid(message_id: &str) -> Result<u32> {
    message_id
        .parse()
        .map_err(|_| Error::InvalidMessageId {
            id: message_id.to_string(),
        })
}
