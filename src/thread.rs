//! Internal two-tier conversation reconstruction.
//!
//! Thread identity is not explicit in the protocol; it is inferred from two
//! independent signals, tried in a fixed order:
//!
//! 1. A vendor thread identifier (Gmail's `X-GM-THRID`). Authoritative when
//!    present - the whole mailbox is searched for it and the hits ARE the
//!    thread.
//! 2. The seed's `References` header: each listed `Message-ID` is searched
//!    for, hits are merged into the thread, deduplicated by protocol
//!    identifier.
//!
//! When neither signal yields anything, the thread is the seed alone. The
//! tier order is load-bearing: downstream behavior (which messages get
//! replies) depends on it, so no `In-Reply-To`-only fallback is attempted.

use crate::error::Result;
use crate::message::Message;
use crate::parser::{self, ParsedMessage};
use crate::session::{self, ImapSession};
use tracing::{debug, instrument};

/// Resolves the full conversation a message belongs to.
///
/// Returns messages in ascending date order. An empty result means the seed
/// vanished between search and fetch - nothing to process, not an error.
/// Members that fail to parse are silently excluded (partial-thread
/// degradation beats total failure).
#[instrument(name = "thread::resolve", skip(session))]
pub(crate) async fn resolve(session: &mut ImapSession, uid: u32) -> Result<Vec<Message>> {
    let Some(seed) = fetch_and_parse(session, uid).await? else {
        return Ok(Vec::new());
    };

    // Tier 1: vendor thread id, authoritative when the search produces hits
    if let Some(thread_id) = session::fetch_vendor_thread_id(session, uid).await? {
        let member_uids = session::search_vendor_thread(session, thread_id).await?;
        if !member_uids.is_empty() {
            debug!(
                thread_id,
                member_count = member_uids.len(),
                "Resolved thread via vendor id"
            );

            let mut thread = Vec::with_capacity(member_uids.len());
            for member in member_uids {
                if let Some(parsed) = fetch_and_parse(session, member).await? {
                    thread.push(parsed.message);
                }
            }
            sort_by_date(&mut thread);
            return Ok(thread);
        }
    }

    // Tier 2: merge every message the References header points at
    let ParsedMessage {
        message: seed_message,
        references,
    } = seed;

    if !references.is_empty() {
        let mut thread = vec![seed_message];
        for reference in &references {
            for member in session::search_message_id(session, reference).await? {
                if contains_id(&thread, member) {
                    continue;
                }
                if let Some(parsed) = fetch_and_parse(session, member).await? {
                    thread.push(parsed.message);
                }
            }
        }
        sort_by_date(&mut thread);

        debug!(
            reference_count = references.len(),
            member_count = thread.len(),
            "Resolved thread via references"
        );
        return Ok(thread);
    }

    // Neither signal: the conversation is the seed alone
    Ok(vec![seed_message])
}

async fn fetch_and_parse(session: &mut ImapSession, uid: u32) -> Result<Option<ParsedMessage>> {
    let Some(fetch) = session::fetch_message(session, uid).await? else {
        return Ok(None);
    };
    Ok(parser::parse_message(&fetch))
}

/// Ascending date order; the last element becomes the reply target.
pub(crate) fn sort_by_date(thread: &mut [Message]) {
    thread.sort_by_key(|message| message.date);
}

/// Dedup check on the protocol identifier, not on content.
pub(crate) fn contains_id(thread: &[Message], uid: u32) -> bool {
    let uid = uid.to_string();
    thread.iter().any(|message| message.id == uid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn message(id: &str, hour: u32) -> Message {
        Message {
            id: id.into(),
            message_id: Some(format!("<{id}@x.com>")),
            from_address: "alice@example.com".into(),
            to_address: "support@example.com".into(),
            subject: "Help".into(),
            body: "body".into(),
            date: Utc.with_ymd_and_hms(2024, 1, 1, hour, 0, 0).unwrap(),
        }
    }

    #[test]
    fn test_sort_by_date_ascending() {
        let mut thread = vec![message("3", 12), message("1", 8), message("2", 10)];
        sort_by_date(&mut thread);

        let ids: Vec<&str> = thread.iter().map(|m| m.id.as_str()).collect();
        assert_eq!(ids, ["1", "2", "3"]);
        // Most recent message is the last element
        assert_eq!(thread.last().unwrap().id, "3");
    }

    #[test]
    fn test_sort_is_stable_for_equal_dates() {
        let mut thread = vec![message("a", 9), message("b", 9)];
        sort_by_date(&mut thread);
        assert_eq!(thread[0].id, "a");
        assert_eq!(thread[1].id, "b");
    }

    #[test]
    fn test_contains_id_matches_identifier_not_content() {
        let thread = vec![message("7", 9)];
        assert!(contains_id(&thread, 7));
        assert!(!contains_id(&thread, 8));
    }
}
