//! The immutable email value passed between the poller, the respond
//! capability, and the send step.

use crate::error::{Error, Result};
use chrono::{DateTime, Utc};
use lettre::message::header::ContentType;
use lettre::message::Mailbox;

/// One email message.
///
/// Instances are created by the parser when a raw protocol message is fetched,
/// or by a respond capability when it drafts a reply. They are plain values:
/// nothing here talks to the network.
///
/// Two identifiers coexist:
///
/// - [`id`](Self::id) is the protocol-assigned UID, an opaque string used for
///   IMAP search/fetch/store. Empty for drafted replies.
/// - [`message_id`](Self::message_id) is the RFC 5322 `Message-ID` header
///   value (angle brackets included), used for outbound threading headers.
///
/// # Example
///
/// ```
/// use inbox_responder::Message;
///
/// let reply = Message::new(
///     "support@example.com",
///     "alice@example.com",
///     "Re: Help",
///     "<p>All sorted.</p>",
/// );
/// assert!(reply.id.is_empty());
/// ```
#[derive(Debug, Clone)]
pub struct Message {
    /// Protocol-assigned identifier (IMAP UID), opaque. Empty for replies.
    pub id: String,
    /// RFC 5322 `Message-ID` header value, if the message carried one.
    pub message_id: Option<String>,
    /// Sender address.
    pub from_address: String,
    /// Recipient address.
    pub to_address: String,
    /// Subject line.
    pub subject: String,
    /// Plain-text body with any quoted-reply trailer already stripped.
    pub body: String,
    /// Message date.
    pub date: DateTime<Utc>,
}

impl Message {
    /// Creates a message from the four required fields.
    ///
    /// The identifier is left empty, `message_id` unset, and `date` is read
    /// from the clock here, in the constructor body - every call observes a
    /// fresh instant. Callers needing the protocol identifier or a specific
    /// date set the fields directly; the parser does exactly that.
    #[must_use]
    pub fn new(
        from_address: impl Into<String>,
        to_address: impl Into<String>,
        subject: impl Into<String>,
        body: impl Into<String>,
    ) -> Self {
        Self {
            id: String::new(),
            message_id: None,
            from_address: from_address.into(),
            to_address: to_address.into(),
            subject: subject.into(),
            body: body.into(),
            date: Utc::now(),
        }
    }

    /// Renders this message as a transport-ready outbound reply.
    ///
    /// `in_reply_to` lands in both `In-Reply-To` and `References` so threaded
    /// clients attach the reply to the right conversation; `reply_to` becomes
    /// the `Reply-To` header. The body is sent as `text/html`, wrapped in a
    /// minimal document.
    ///
    /// # Errors
    ///
    /// Returns an error if an address fails to parse or the MIME message
    /// cannot be built.
    pub fn to_reply(&self, in_reply_to: &str, reply_to: &str) -> Result<lettre::Message> {
        lettre::Message::builder()
            .from(parse_mailbox(&self.from_address)?)
            .to(parse_mailbox(&self.to_address)?)
            .reply_to(parse_mailbox(reply_to)?)
            .subject(&self.subject)
            .in_reply_to(in_reply_to.to_string())
            .references(in_reply_to.to_string())
            .header(ContentType::TEXT_HTML)
            .body(format!("<html><body>{}</body></html>", self.body))
            .map_err(|source| Error::BuildReply { source })
    }

    /// Formats all fields as a single line for diagnostic logging.
    ///
    /// The date is rendered RFC 2822 style. Not a wire format; only ever fed
    /// to the log.
    #[must_use]
    pub fn to_record(&self) -> String {
        format!(
            "id={} message_id={} from={} to={} subject={:?} date={} body={:?}",
            if self.id.is_empty() { "-" } else { &self.id },
            self.message_id.as_deref().unwrap_or("-"),
            self.from_address,
            self.to_address,
            self.subject,
            self.date.to_rfc2822(),
            self.body,
        )
    }
}

fn parse_mailbox(address: &str) -> Result<Mailbox> {
    address.parse().map_err(|source| Error::InvalidAddress {
        address: address.to_string(),
        source,
    })
}
