//! Demo: List the unread conversations the responder would answer.
//!
//! Connects to the mailbox, snapshots the unread support queue with full
//! thread reconstruction, prints every message, and disconnects. Read-only -
//! no flags are touched and nothing is sent.
//!
//! # Usage
//!
//! ```bash
//! export EMAIL_ADDRESS="your@email.com"
//! export EMAIL_PASSWORD="your-app-password"
//! cargo run --example list_threads
//! ```

use inbox_responder::{MailboxClient, MailerConfig};
use std::env;

#[tokio::main]
async fn main() -> inbox_responder::Result<()> {
    let email = env::var("EMAIL_ADDRESS").expect("EMAIL_ADDRESS environment variable required");
    let password =
        env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD environment variable required");

    println!("Connecting to IMAP server for {}...", email);

    let config = MailerConfig::builder().email(&email).password(password).build()?;

    let mut client = MailboxClient::connect(config).await?;

    let threads = client.list_unread_threads().await?;
    println!("Found {} unread conversation(s)\n", threads.len());

    for (i, thread) in threads.iter().enumerate() {
        println!("Thread {} ({} message(s)):", i + 1, thread.len());
        for message in thread {
            println!("  {}", message.to_record());
        }
        if let Some(most_recent) = thread.last() {
            println!("  -> reply would go to {}\n", most_recent.from_address);
        }
    }

    client.logout().await?;

    Ok(())
}
