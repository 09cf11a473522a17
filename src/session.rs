//! Internal IMAP session management.
//!
//! This module wraps async-imap operations with proper error handling. Every
//! fetch here uses `BODY.PEEK[]` - reading mail for resolution must never
//! flip the `\Seen` flag; only [`mark_seen`] writes to the mailbox.

use crate::connection::TlsStream;
use crate::error::{Error, Result};
use async_imap::types::Fetch;
use async_imap::Session;
use futures::StreamExt;
use regex::Regex;
use std::sync::LazyLock;
use tracing::{debug, instrument};

/// Type alias for IMAP session over TLS.
pub(crate) type ImapSession = Session<TlsStream>;

/// The numeric id in an `X-GM-THRID` fetch response.
static VENDOR_THREAD_ID: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"X-GM-THRID\s+(\d+)").expect("valid regex"));

/// Authentication configuration for IMAP.
pub(crate) struct AuthConfig<'a> {
    pub email: &'a str,
    pub password: &'a str,
}

/// Authenticates to IMAP server and returns a session.
#[instrument(
    name = "session::authenticate",
    skip_all,
    fields(email = %config.email)
)]
pub(crate) async fn authenticate(
    tls_stream: TlsStream,
    config: &AuthConfig<'_>,
) -> Result<ImapSession> {
    let client = async_imap::Client::new(tls_stream);

    debug!("Authenticating to IMAP server");

    client
        .login(config.email, config.password)
        .await
        .map_err(|e| Error::ImapLogin {
            email: config.email.to_string(),
            source: e.0,
        })
}

/// Selects a mailbox (typically "INBOX").
#[instrument(name = "session::select", skip(session), fields(mailbox = %mailbox))]
pub(crate) async fn select_mailbox(session: &mut ImapSession, mailbox: &str) -> Result<()> {
    debug!("Selecting mailbox");

    session
        .select(mailbox)
        .await
        .map_err(|source| Error::SelectMailbox {
            mailbox: mailbox.to_string(),
            source,
        })?;

    Ok(())
}

/// Searches for unseen messages addressed to the given recipient.
///
/// Returns UIDs in ascending order.
#[instrument(
    name = "session::search_unread",
    skip(session),
    fields(to_address = %to_address)
)]
pub(crate) async fn search_unread(
    session: &mut ImapSession,
    to_address: &str,
) -> Result<Vec<u32>> {
    // NOOP to ensure we have latest state
    session
        .noop()
        .await
        .map_err(|source| Error::ImapNoop { source })?;

    let query = format!(r#"UNSEEN TO "{to_address}""#);
    let uids = run_uid_search(session, &query).await?;

    debug!(uid_count = uids.len(), "Found unseen messages");

    Ok(uids)
}

/// Searches the mailbox for every message in a vendor thread.
pub(crate) async fn search_vendor_thread(
    session: &mut ImapSession,
    thread_id: u64,
) -> Result<Vec<u32>> {
    run_uid_search(session, &format!("X-GM-THRID {thread_id}")).await
}

/// Searches the mailbox for messages whose `Message-ID` header equals the
/// given identifier (brackets added here).
pub(crate) async fn search_message_id(
    session: &mut ImapSession,
    message_id: &str,
) -> Result<Vec<u32>> {
    run_uid_search(session, &format!(r#"HEADER Message-ID "<{message_id}>""#)).await
}

async fn run_uid_search(session: &mut ImapSession, query: &str) -> Result<Vec<u32>> {
    let uids = session
        .uid_search(query)
        .await
        .map_err(|source| Error::ImapSearch {
            query: query.to_string(),
            source,
        })?;

    let mut uids: Vec<u32> = uids.into_iter().collect();
    uids.sort_unstable();
    Ok(uids)
}

/// Fetches one message body without touching its flags.
///
/// Returns `None` when the server has nothing for the UID (expunged between
/// search and fetch).
pub(crate) async fn fetch_message(
    session: &mut ImapSession,
    uid: u32,
) -> Result<Option<Fetch>> {
    debug!(uid, "Fetching message");

    let uid_str = uid.to_string();
    let mut stream = session
        .uid_fetch(&uid_str, "BODY.PEEK[]")
        .await
        .map_err(|source| Error::ImapFetch {
            uid: uid_str.clone(),
            source,
        })?;

    let mut found = None;
    while let Some(item) = stream.next().await {
        let fetch = item.map_err(|source| Error::FetchMessage { source })?;
        if found.is_none() && fetch.body().is_some() {
            found = Some(fetch);
        }
    }

    Ok(found)
}

/// Reads the vendor-specific thread identifier of a message, if the server
/// exposes one.
///
/// The attribute is a non-standard fetch item (Gmail's `X-GM-THRID`), so the
/// raw command response is scanned rather than a typed accessor. Servers
/// without the extension reject the fetch item; that is reported as "no
/// vendor id", not an error, so resolution can fall back to `References`.
#[instrument(name = "session::fetch_vendor_thread_id", skip(session))]
pub(crate) async fn fetch_vendor_thread_id(
    session: &mut ImapSession,
    uid: u32,
) -> Result<Option<u64>> {
    let id = match session
        .run_command(format!("UID FETCH {uid} (X-GM-THRID)"))
        .await
    {
        Ok(id) => id,
        Err(e) => {
            debug!(uid, error = %e, "Server rejected vendor thread id fetch");
            return Ok(None);
        }
    };

    let mut response: Vec<u8> = Vec::new();
    while let Some(item) = session.read_response().await {
        match item {
            Ok(data) => {
                response.extend_from_slice(data.borrow_owner());
                if data.request_id() == Some(&id) {
                    break;
                }
            }
            Err(e) => {
                debug!(uid, error = %e, "Server rejected vendor thread id fetch");
                return Ok(None);
            }
        }
    }

    Ok(extract_vendor_thread_id(&response))
}

/// Scans a raw fetch response for the vendor thread id.
pub(crate) fn extract_vendor_thread_id(response: &[u8]) -> Option<u64> {
    let text = String::from_utf8_lossy(response);
    VENDOR_THREAD_ID
        .captures(&text)
        .and_then(|caps| caps[1].parse().ok())
}

/// Flags a message `\Seen`.
///
/// This is the only flag-altering operation in the crate; the responder calls
/// it strictly after a reply was accepted by the SMTP relay.
#[instrument(name = "session::mark_seen", skip(session))]
pub(crate) async fn mark_seen(session: &mut ImapSession, uid: u32) -> Result<()> {
    let uid_str = uid.to_string();
    let mut updates = session
        .uid_store(&uid_str, "+FLAGS (\\Seen)")
        .await
        .map_err(|source| Error::ImapStore {
            uid: uid_str.clone(),
            source,
        })?;

    // The store response streams the updated flags; drain it
    while let Some(update) = updates.next().await {
        update.map_err(|source| Error::ImapStore {
            uid: uid_str.clone(),
            source,
        })?;
    }

    Ok(())
}

/// Logs out from IMAP session.
#[instrument(name = "session::logout", skip(session))]
pub(crate) async fn logout(session: &mut ImapSession) -> Result<()> {
    debug!("Logging out");

    session
        .logout()
        .await
        .map_err(|source| Error::ImapLogout { source })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extract_vendor_thread_id() {
        let response = b"* 5 FETCH (UID 42 X-GM-THRID 1764985801829568163)\r\nA4 OK Success\r\n";
        assert_eq!(
            extract_vendor_thread_id(response),
            Some(1_764_985_801_829_568_163)
        );
    }

    #[test]
    fn test_extract_vendor_thread_id_absent() {
        let response = b"* 5 FETCH (UID 42 FLAGS (\\Seen))\r\nA4 OK Success\r\n";
        assert_eq!(extract_vendor_thread_id(response), None);
    }

    #[test]
    fn test_extract_vendor_thread_id_non_numeric() {
        let response = b"* 5 FETCH (X-GM-THRID abc)\r\n";
        assert_eq!(extract_vendor_thread_id(response), None);
    }
}
