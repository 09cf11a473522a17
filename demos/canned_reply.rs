//! Demo: Run the responder with a canned reply capability.
//!
//! This demonstrates the full unattended loop - poll the support inbox,
//! answer every unread conversation with an acknowledgement, mark answered
//! messages read, sleep, repeat. A capability that is "unsure" declines, and
//! the message stays unread for a human.
//!
//! # Usage
//!
//! ```bash
//! export EMAIL_ADDRESS="your@email.com"
//! export EMAIL_PASSWORD="your-app-password"
//! # Optional: answer mail sent to an alias instead of the mailbox address
//! export SUPPORT_ADDRESS="support@yourdomain.com"
//! cargo run --example canned_reply
//! ```
//!
//! For Gmail, you'll need to use an [App Password](https://support.google.com/accounts/answer/185833).

use inbox_responder::{MailerConfig, Message, Responder, RespondFn};
use std::env;
use std::time::Duration;

/// A real capability would call a model or a human here; this one drafts a
/// fixed acknowledgement and declines when the question looks like something
/// it should not answer.
fn draft_reply(thread: &[Message]) -> Option<Message> {
    let latest = thread.last()?;

    if unsure(&latest.body) {
        // Escalate: leaving the message unread keeps it in the human queue
        return None;
    }

    Some(Message::new(
        latest.to_address.clone(),
        latest.from_address.clone(),
        latest.subject.clone(),
        format!(
            "<p>Thanks for reaching out - we received your message about \
             {:?} and will get back to you shortly.</p>",
            latest.subject
        ),
    ))
}

/// Questions about money are for humans.
fn unsure(body: &str) -> bool {
    let lower = body.to_lowercase();
    ["refund", "chargeback", "legal"]
        .iter()
        .any(|word| lower.contains(word))
}

#[tokio::main]
async fn main() -> inbox_responder::Result<()> {
    let email = env::var("EMAIL_ADDRESS").expect("EMAIL_ADDRESS environment variable required");
    let password =
        env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD environment variable required");

    let mut builder = MailerConfig::builder()
        .email(&email)
        .password(password)
        .poll_interval(Duration::from_secs(30));

    if let Ok(support) = env::var("SUPPORT_ADDRESS") {
        builder = builder.support_address(support);
    }

    let config = builder.build()?;

    println!("Responding from {} every 30s (Ctrl+C to stop)...", email);

    let capability = RespondFn::new(
        |thread: Vec<Message>| async move { draft_reply(&thread) },
        "canned acknowledgement",
    );

    Responder::new(config).run(&capability).await
}
