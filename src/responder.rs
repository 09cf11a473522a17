//! The unattended responder loop.
//!
//! A [`Responder`] repeatedly drains the unread support queue: each cycle it
//! opens fresh IMAP and SMTP sessions, snapshots the unread conversations,
//! asks the injected [`Respond`] capability for a reply to each, sends the
//! replies it gets, and flags the answered messages `\Seen`. Between cycles
//! it sleeps for the configured interval, forever.
//!
//! Declining to reply is the escalation path, not a failure: the message
//! stays unread for a human to pick up.
//!
//! # Example
//!
//! ```no_run
//! use inbox_responder::{MailerConfig, Message, Responder, RespondFn};
//!
//! # async fn example() -> inbox_responder::Result<()> {
//! let config = MailerConfig::builder()
//!     .email("support@example.com")
//!     .password("app-password")
//!     .build()?;
//!
//! let capability = RespondFn::new(
//!     |thread: Vec<Message>| async move {
//!         let latest = thread.last()?;
//!         Some(Message::new(
//!             latest.to_address.clone(),
//!             latest.from_address.clone(),
//!             latest.subject.clone(),
//!             "<p>Thanks, we are on it.</p>",
//!         ))
//!     },
//!     "canned acknowledgement",
//! );
//!
//! Responder::new(config).run(&capability).await
//! # }
//! ```

use crate::client::MailboxClient;
use crate::config::MailerConfig;
use crate::error::{Error, Result};
use crate::message::Message;
use crate::smtp::{self, SmtpSender};
use async_trait::async_trait;
use lettre::AsyncTransport;
use std::future::Future;
use tracing::{debug, info, instrument, warn};

/// An injected capability that drafts replies.
///
/// Invoked once per unread conversation per cycle with the full thread,
/// oldest message first. Returning `None` leaves the conversation unread for
/// human follow-up - it is the only mechanism for doing so, and it is not an
/// error. Implementations may run arbitrarily long external computation; the
/// responder awaits them sequentially.
///
/// For ad-hoc capabilities and test doubles see [`RespondFn`].
#[async_trait]
pub trait Respond: Send + Sync {
    /// Produces a reply to the conversation, or `None` to escalate.
    async fn respond(&self, thread: &[Message]) -> Option<Message>;

    /// Returns a human-readable description of this capability.
    ///
    /// Used in logging.
    fn description(&self) -> &str;
}

/// Respond capability backed by a closure.
///
/// # Example
///
/// ```
/// use inbox_responder::{Message, RespondFn};
///
/// // Answer everything with a canned acknowledgement
/// let capability = RespondFn::new(
///     |thread: Vec<Message>| async move {
///         let latest = thread.last()?;
///         Some(Message::new(
///             latest.to_address.clone(),
///             latest.from_address.clone(),
///             latest.subject.clone(),
///             "<p>We received your message.</p>",
///         ))
///     },
///     "canned acknowledgement",
/// );
/// ```
pub struct RespondFn<F> {
    respond_fn: F,
    description: String,
}

impl<F, Fut> RespondFn<F>
where
    F: Fn(Vec<Message>) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Message>> + Send + 'static,
{
    /// Creates a new closure-based respond capability.
    #[must_use]
    pub fn new(respond_fn: F, description: impl Into<String>) -> Self {
        Self {
            respond_fn,
            description: description.into(),
        }
    }
}

#[async_trait]
impl<F, Fut> Respond for RespondFn<F>
where
    F: Fn(Vec<Message>) -> Fut + Send + Sync,
    Fut: Future<Output = Option<Message>> + Send + 'static,
{
    async fn respond(&self, thread: &[Message]) -> Option<Message> {
        (self.respond_fn)(thread.to_vec()).await
    }

    fn description(&self) -> &str {
        &self.description
    }
}

impl<F> std::fmt::Debug for RespondFn<F> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RespondFn")
            .field("description", &self.description)
            .finish_non_exhaustive()
    }
}

/// The driver that polls the mailbox and answers unread conversations.
///
/// Created from a [`MailerConfig`]; see the [module docs](self) for the
/// cycle semantics and the crate docs for failure semantics.
#[derive(Debug, Clone)]
pub struct Responder {
    config: MailerConfig,
}

impl Responder {
    /// Creates a responder for the configured mailbox.
    #[must_use]
    pub fn new(config: MailerConfig) -> Self {
        Self { config }
    }

    /// Returns the configuration this responder runs with.
    #[must_use]
    pub fn config(&self) -> &MailerConfig {
        &self.config
    }

    /// Runs one cycle: connect, drain the unread set, disconnect.
    ///
    /// Threads are handled strictly sequentially, in the order the poller
    /// returned them - the mail session is a single stateful connection that
    /// does not tolerate concurrent use. The IMAP session is logged out even
    /// when the cycle fails, so no authenticated session outlives the cycle.
    ///
    /// # Errors
    ///
    /// Transport failures (connect, authenticate, search, fetch, send, store)
    /// abort the cycle and propagate. A send failure propagates before the
    /// mark-as-read step, so an unsent reply always leaves its source message
    /// unread.
    #[instrument(
        name = "Responder::process",
        skip_all,
        fields(email = %self.config.email(), support = %self.config.support_address())
    )]
    pub async fn process(&self, respond: &dyn Respond) -> Result<()> {
        let mut client = MailboxClient::connect(self.config.clone()).await?;

        let outcome = self.drain_cycle(&mut client, respond).await;

        // Released even on error: a half-open authenticated session must not
        // outlive the cycle
        if let Err(e) = client.logout().await {
            warn!(error = %e, "IMAP logout failed");
        }

        outcome
    }

    /// Runs forever: process a cycle, sleep, repeat.
    ///
    /// There is no self-termination path. The first cycle error propagates
    /// and ends the loop so a supervisor can restart the process with fresh
    /// connections; hosts wanting graceful shutdown should race this future
    /// against their shutdown signal with `tokio::select!`.
    ///
    /// # Errors
    ///
    /// Returns the first cycle error.
    pub async fn run(&self, respond: &dyn Respond) -> Result<()> {
        info!(
            interval_secs = self.config.poll_interval.as_secs(),
            capability = respond.description(),
            "Responder started"
        );

        loop {
            self.process(respond).await?;

            debug!(
                delay_secs = self.config.poll_interval.as_secs(),
                "Cycle complete, sleeping"
            );
            tokio::time::sleep(self.config.poll_interval).await;
        }
    }

    async fn drain_cycle(
        &self,
        client: &mut MailboxClient,
        respond: &dyn Respond,
    ) -> Result<()> {
        // Probe the relay up front so a dead relay aborts before any
        // capability work is spent
        let smtp = smtp::build_transport(&self.config)?;
        smtp::verify(&smtp, &self.config).await?;

        info!("Fetching unread threads");
        let threads = client.list_unread_threads().await?;

        for thread in &threads {
            self.answer_thread(client, &smtp, respond, thread).await?;
        }

        Ok(())
    }

    async fn answer_thread(
        &self,
        client: &mut MailboxClient,
        smtp: &SmtpSender,
        respond: &dyn Respond,
        thread: &[Message],
    ) -> Result<()> {
        let Some(most_recent) = thread.last() else {
            return Ok(());
        };

        debug!(
            thread_len = thread.len(),
            message = %most_recent.to_record(),
            "Handling unread thread"
        );

        let Some(reply) = respond.respond(thread).await else {
            info!(
                id = %most_recent.id,
                capability = respond.description(),
                "No reply produced, leaving message unread"
            );
            return Ok(());
        };

        let in_reply_to = most_recent
            .message_id
            .clone()
            .unwrap_or_else(|| most_recent.id.clone());
        let outbound = reply.to_reply(&in_reply_to, self.config.support_address())?;

        info!(reply = %reply.to_record(), "Sending reply");
        smtp.send(outbound)
            .await
            .map_err(|source| Error::SmtpSend {
                recipient: reply.to_address.clone(),
                source,
            })?;

        // Only a delivered reply may flip the seen flag
        if self.config.mark_read {
            client.mark_seen(&most_recent.id).await?;
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn thread_of_one() -> Vec<Message> {
        let mut msg = Message::new(
            "alice@example.com",
            "support@example.com",
            "Help",
            "My payment failed.",
        );
        msg.id = "7".into();
        msg.message_id = Some("<m1@x.com>".into());
        vec![msg]
    }

    #[tokio::test]
    async fn test_respond_fn_canned_reply() {
        let capability = RespondFn::new(
            |thread: Vec<Message>| async move {
                let latest = thread.last()?;
                Some(Message::new(
                    latest.to_address.clone(),
                    latest.from_address.clone(),
                    latest.subject.clone(),
                    "<p>On it.</p>",
                ))
            },
            "canned reply",
        );

        let thread = thread_of_one();
        let reply = capability.respond(&thread).await.expect("reply");

        // Addressed back to the sender, from the support mailbox
        assert_eq!(reply.from_address, "support@example.com");
        assert_eq!(reply.to_address, "alice@example.com");
        assert_eq!(reply.subject, "Help");
        assert_eq!(capability.description(), "canned reply");
    }

    #[tokio::test]
    async fn test_respond_fn_declines() {
        let capability = RespondFn::new(
            |_thread: Vec<Message>| async move { None },
            "always unsure",
        );

        let thread = thread_of_one();
        assert!(capability.respond(&thread).await.is_none());
    }

    #[tokio::test]
    async fn test_respond_fn_sees_whole_thread_oldest_first() {
        let capability = RespondFn::new(
            |thread: Vec<Message>| async move {
                let bodies: Vec<String> = thread.iter().map(|m| m.body.clone()).collect();
                Some(Message::new(
                    "support@example.com",
                    "alice@example.com",
                    "Re",
                    bodies.join("|"),
                ))
            },
            "concatenator",
        );

        let mut first = Message::new("alice@example.com", "support@example.com", "Help", "one");
        first.id = "1".into();
        let mut second = Message::new("alice@example.com", "support@example.com", "Help", "two");
        second.id = "2".into();

        let reply = capability.respond(&[first, second]).await.expect("reply");
        assert_eq!(reply.body, "one|two");
    }
}
