//! # inbox-responder
//!
//! Async IMAP/SMTP responder for unattended support mailboxes.
//!
//! This crate provides a high-level, async API for:
//! - Polling a mailbox for unread messages addressed to a support address
//! - Reconstructing full conversation threads from fragmentary header
//!   evidence (vendor thread id, then `References`)
//! - Handing each thread to an injected respond capability and sending its
//!   replies over SMTP, with correct read/unread bookkeeping
//!
//! ## Features
//!
//! - **`observability`**: Enables OpenTelemetry integration for distributed tracing.
//!   Without this feature, tracing spans are still emitted but require no OTEL dependencies.
//!
//! ## Quick Start
//!
//! ```no_run
//! use inbox_responder::{MailerConfig, Message, Responder, RespondFn};
//!
//! # async fn example() -> inbox_responder::Result<()> {
//! // Configure the mailbox - servers are discovered from the domain
//! let config = MailerConfig::builder()
//!     .email("support@example.com")
//!     .password("app-password")  // Use app-specific password for Gmail
//!     .build()?;
//!
//! // The respond capability: full thread in, optional reply out.
//! // Returning None leaves the message unread for a human.
//! let capability = RespondFn::new(
//!     |thread: Vec<Message>| async move {
//!         let latest = thread.last()?;
//!         Some(Message::new(
//!             latest.to_address.clone(),
//!             latest.from_address.clone(),
//!             latest.subject.clone(),
//!             "<p>Thanks - a human will follow up shortly.</p>",
//!         ))
//!     },
//!     "acknowledgement",
//! );
//!
//! // Poll, answer, sleep, repeat - until the process is stopped
//! Responder::new(config).run(&capability).await
//! # }
//! ```
//!
//! ## One-shot mailbox access
//!
//! The read side is usable on its own, e.g. to inspect what the responder
//! would see:
//!
//! ```no_run
//! use inbox_responder::{MailerConfig, MailboxClient};
//!
//! # async fn example() -> inbox_responder::Result<()> {
//! # let config = MailerConfig::builder().email("a@b.c").password("x").build()?;
//! let mut client = MailboxClient::connect(config).await?;
//! for thread in client.list_unread_threads().await? {
//!     for message in &thread {
//!         println!("{}", message.to_record());
//!     }
//! }
//! client.logout().await?;
//! # Ok(())
//! # }
//! ```
//!
//! ## Failure semantics
//!
//! The responder is meant to run unattended:
//!
//! - Transport failures abort the current cycle, propagate out of
//!   [`Responder::run`], and leave restart policy to the host's supervisor.
//!   The IMAP session is logged out even on the error path.
//! - A message that fails to parse is dropped from its thread with a
//!   warning; resolution continues with the rest.
//! - A respond capability that declines is not an error - the message stays
//!   unread, which is the escalate-to-a-human path.
//! - A reply that fails to send never marks its source message read, so a
//!   restart re-answers it (at-least-once delivery).
//!
//! Use [`Error::is_retryable`] to classify failures in a custom supervisor.
//!
//! ## Observability
//!
//! The crate uses `tracing` for instrumentation. All major operations emit
//! spans with structured fields suitable for distributed tracing.
//!
//! ### Span Naming Convention
//!
//! - `MailboxClient::connect` - IMAP connection
//! - `MailboxClient::list_unread_threads` - Unread-queue snapshot
//! - `thread::resolve` - Conversation reconstruction
//! - `Responder::process` - One poll/answer cycle
//! - `session::authenticate` - IMAP authentication
//! - `connection::establish_tls` - TLS connection
//! - `smtp::verify` - SMTP relay probe
//!
//! ### Standard Fields
//!
//! - `email` - Mailbox address
//! - `support` - Support address unread mail is filtered on
//! - `imap_host` / `smtp_host` - Server hostnames
//! - `uid` - Message UID
//! - `thread_len` - Messages in the conversation being handled
//!
//! Enable the `observability` feature for OpenTelemetry integration.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Public modules
pub mod config;
pub mod error;
pub mod known_servers;
pub mod message;
pub mod responder;

// Internal modules
mod client;
mod connection;
mod parser;
mod session;
mod smtp;
mod thread;

// Re-exports for ergonomic API
pub use client::MailboxClient;
pub use config::{MailerConfig, MailerConfigBuilder};
pub use email_address::EmailAddress;
pub use error::{Error, ErrorCategory, Result};
pub use known_servers::{MailHosts, ServerRegistry};
pub use message::Message;
pub use responder::{Respond, RespondFn, Responder};
