//! Internal module for parsing fetched messages.
//!
//! Parsing is resilient by design: a malformed message yields `None` (with a
//! warning) instead of an error, so one bad message degrades the thread it
//! belongs to rather than aborting the whole resolution.

use crate::message::Message;
use chrono::{DateTime, Utc};
use mailparse::{parse_mail, MailHeaderMap, ParsedMail};
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, warn};

/// `Message-ID` tokens inside a `References` header: the substring between
/// `<` and `>`.
static REFERENCE_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<([^>]+)>").expect("valid regex"));

/// A successfully parsed message plus the threading evidence that does not
/// belong in the [`Message`] value itself.
#[derive(Debug, Clone)]
pub(crate) struct ParsedMessage {
    /// The message value handed to respond capabilities.
    pub message: Message,
    /// Identifiers listed in the `References` header, brackets stripped,
    /// oldest first. Empty when the header is absent.
    pub references: Vec<String>,
}

/// Parses an IMAP fetch result into a [`ParsedMessage`].
///
/// Returns `None` (logged) when the fetch has no body or the MIME tree is
/// malformed.
pub(crate) fn parse_message(fetch: &async_imap::types::Fetch) -> Option<ParsedMessage> {
    let id = fetch
        .uid
        .map_or_else(|| fetch.message.to_string(), |uid| uid.to_string());

    let Some(raw) = fetch.body() else {
        debug!(id = %id, "Message has no body");
        return None;
    };

    parse_raw(raw, &id)
}

/// Parses raw RFC 822 bytes into a [`ParsedMessage`] carrying the given
/// protocol identifier.
pub(crate) fn parse_raw(raw: &[u8], id: &str) -> Option<ParsedMessage> {
    let parsed = match parse_mail(raw) {
        Ok(p) => p,
        Err(e) => {
            warn!(id = %id, error = %e, "Failed to parse email, skipping message");
            return None;
        }
    };

    let headers = &parsed.headers;
    let subject = headers.get_first_value("Subject").unwrap_or_default();
    let from_address = single_address(&parsed, "From");
    let to_address = single_address(&parsed, "To");
    let message_id = headers
        .get_first_value("Message-ID")
        .map(|v| v.trim().to_string());
    let references = headers
        .get_first_value("References")
        .map(|v| extract_references(&v))
        .unwrap_or_default();
    let date = parse_date(headers.get_first_value("Date").as_deref());
    let body = extract_body_text(&parsed);

    Some(ParsedMessage {
        message: Message {
            id: id.to_string(),
            message_id,
            from_address,
            to_address,
            subject,
            body,
            date,
        },
        references,
    })
}

/// Extracts the bare address of the first mailbox in an address header.
///
/// A missing or unparsable header degrades to an empty string; the message
/// itself is still usable.
fn single_address(parsed: &ParsedMail<'_>, header: &str) -> String {
    parsed
        .headers
        .get_first_header(header)
        .and_then(|h| mailparse::addrparse_header(h).ok())
        .and_then(|list| list.extract_single_info())
        .map(|info| info.addr)
        .unwrap_or_default()
}

/// Parses an RFC 2822 date header, falling back to the current instant.
fn parse_date(value: Option<&str>) -> DateTime<Utc> {
    value
        .and_then(|v| mailparse::dateparse(v).ok())
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0))
        .unwrap_or_else(Utc::now)
}

/// Extracts every `<…>` identifier from a `References` header value.
pub(crate) fn extract_references(value: &str) -> Vec<String> {
    REFERENCE_ID
        .captures_iter(value)
        .map(|caps| caps[1].to_string())
        .collect()
}

/// Extracts the plain-text body from a parsed message and strips any
/// trailing quoted-reply block.
///
/// Multipart: the parts are walked in document order and the first
/// `text/plain` part wins; later plain parts (signatures in alternate parts)
/// are ignored. Non-multipart: the single payload is decoded regardless of
/// its declared type. Decode failures degrade to an empty body.
fn extract_body_text(parsed: &ParsedMail<'_>) -> String {
    let body = if parsed.subparts.is_empty() {
        parsed.get_body().unwrap_or_else(|e| {
            debug!(error = %e, "Failed to decode message payload");
            String::new()
        })
    } else {
        first_plain_text(parsed).unwrap_or_default()
    };

    strip_quoted_reply(&body)
}

/// Depth-first, document-order scan for the first `text/plain` part.
fn first_plain_text(part: &ParsedMail<'_>) -> Option<String> {
    if part.ctype.mimetype.eq_ignore_ascii_case("text/plain") {
        return part.get_body().ok();
    }
    part.subparts.iter().find_map(first_plain_text)
}

/// Truncates a body at the first quoted-history marker line.
///
/// The de-facto client convention for quoted history is a line of the shape
/// `On <date>, <author> wrote:`; everything from that line on is dropped and
/// the remainder trimmed. A whitespace-only result is returned as-is
/// (empty) - the caller decides how to treat it.
pub(crate) fn strip_quoted_reply(raw_body: &str) -> String {
    let mut pruned: Vec<&str> = Vec::new();
    for line in raw_body.split('\n') {
        if line.trim().starts_with("On ") && line.contains(" wrote:") {
            break;
        }
        pruned.push(line);
    }
    pruned.join("\n").trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_message() {
        let raw = b"From: Alice <alice@example.com>\r\n\
                    To: support@example.com\r\n\
                    Subject: Help\r\n\
                    Message-ID: <m1@mail.example.com>\r\n\
                    Date: Mon, 1 Jan 2024 10:00:00 +0000\r\n\
                    \r\n\
                    My payment failed.";
        let parsed = parse_raw(raw, "7").unwrap();

        assert_eq!(parsed.message.id, "7");
        assert_eq!(parsed.message.from_address, "alice@example.com");
        assert_eq!(parsed.message.to_address, "support@example.com");
        assert_eq!(parsed.message.subject, "Help");
        assert_eq!(
            parsed.message.message_id.as_deref(),
            Some("<m1@mail.example.com>")
        );
        assert_eq!(parsed.message.body, "My payment failed.");
        assert_eq!(parsed.message.date.to_rfc2822(), "Mon, 1 Jan 2024 10:00:00 +0000");
        assert!(parsed.references.is_empty());
    }

    #[test]
    fn test_parse_references() {
        let raw = b"From: alice@example.com\r\n\
                    To: support@example.com\r\n\
                    Subject: Re: Help\r\n\
                    References: <m1@x.com> <m2@x.com>\r\n\
                    \r\n\
                    Still broken.";
        let parsed = parse_raw(raw, "9").unwrap();

        assert_eq!(parsed.references, vec!["m1@x.com", "m2@x.com"]);
    }

    #[test]
    fn test_multipart_takes_first_plain_part() {
        let raw = b"From: alice@example.com\r\n\
                    To: support@example.com\r\n\
                    Subject: Help\r\n\
                    Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
                    \r\n\
                    --b1\r\n\
                    Content-Type: text/html\r\n\
                    \r\n\
                    <p>rich text</p>\r\n\
                    --b1\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    plain text\r\n\
                    --b1\r\n\
                    Content-Type: text/plain\r\n\
                    \r\n\
                    ignored second plain part\r\n\
                    --b1--\r\n";
        let parsed = parse_raw(raw, "1").unwrap();

        // First text/plain wins; the html part and the second plain part are skipped
        assert_eq!(parsed.message.body, "plain text");
    }

    #[test]
    fn test_multipart_without_plain_part_yields_empty_body() {
        let raw = b"From: alice@example.com\r\n\
                    To: support@example.com\r\n\
                    Subject: Help\r\n\
                    Content-Type: multipart/alternative; boundary=\"b1\"\r\n\
                    \r\n\
                    --b1\r\n\
                    Content-Type: text/html\r\n\
                    \r\n\
                    <p>only html</p>\r\n\
                    --b1--\r\n";
        let parsed = parse_raw(raw, "1").unwrap();

        assert_eq!(parsed.message.body, "");
    }

    #[test]
    fn test_missing_date_falls_back_to_now() {
        let raw = b"From: alice@example.com\r\n\
                    To: support@example.com\r\n\
                    Subject: Help\r\n\
                    \r\n\
                    body";
        let before = Utc::now();
        let parsed = parse_raw(raw, "1").unwrap();
        assert!(parsed.message.date >= before);
    }

    #[test]
    fn test_strip_quoted_reply() {
        let body = "Thanks, that worked!\n\
                    \n\
                    On Mon, Jan 1, 2024 at 10:00 AM, Alice <a@x.com> wrote:\n\
                    > My payment failed.\n\
                    > Please help.";
        assert_eq!(strip_quoted_reply(body), "Thanks, that worked!");
    }

    #[test]
    fn test_strip_quoted_reply_indented_marker() {
        // Marker line may be indented; the check runs on the trimmed line
        let body = "Done.\n  On Tue, Jan 2, 2024, Bob <b@x.com> wrote:\n> hi";
        assert_eq!(strip_quoted_reply(body), "Done.");
    }

    #[test]
    fn test_strip_quoted_reply_ignores_plain_on_lines() {
        // "On " without " wrote:" on the same line is regular prose
        let body = "On Mondays we deploy.\nSee you then.";
        assert_eq!(strip_quoted_reply(body), "On Mondays we deploy.\nSee you then.");
    }

    #[test]
    fn test_strip_quoted_reply_whole_body_quoted() {
        let body = "On Mon, Jan 1, 2024, Alice <a@x.com> wrote:\n> old text";
        assert_eq!(strip_quoted_reply(body), "");
    }

    #[test]
    fn test_extract_references_empty_and_malformed() {
        assert!(extract_references("").is_empty());
        assert!(extract_references("no brackets here").is_empty());
        assert_eq!(extract_references("<a@x.com>"), vec!["a@x.com"]);
    }

    #[test]
    fn test_unparsable_headers_degrade_to_empty_fields() {
        // No From/To at all - still a usable message
        let raw = b"Subject: orphan\r\n\r\nbody";
        let parsed = parse_raw(raw, "3").unwrap();
        assert_eq!(parsed.message.from_address, "");
        assert_eq!(parsed.message.to_address, "");
        assert_eq!(parsed.message.body, "body");
    }
}
