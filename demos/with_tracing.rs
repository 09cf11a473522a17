//! Demo: Using tracing for observability.
//!
//! This demonstrates how to enable structured logging using the `tracing`
//! ecosystem. All major operations in inbox-responder emit tracing spans and
//! events - connection, authentication, thread resolution, sends, and flag
//! updates.
//!
//! # Usage
//!
//! ```bash
//! export EMAIL_ADDRESS="your@email.com"
//! export EMAIL_PASSWORD="your-app-password"
//! # Set log level (trace, debug, info, warn, error)
//! export RUST_LOG=inbox_responder=debug
//!
//! cargo run --example with_tracing
//! ```

use inbox_responder::{MailerConfig, Message, Responder, RespondFn};
use std::env;
use tracing_subscriber::fmt::format::FmtSpan;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> inbox_responder::Result<()> {
    // Initialize tracing subscriber with environment filter
    // Use RUST_LOG environment variable to control log levels
    // Example: RUST_LOG=inbox_responder=debug,info
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("inbox_responder=info")),
        )
        .with_span_events(FmtSpan::ENTER | FmtSpan::EXIT)
        .with_target(true)
        .with_thread_ids(false)
        .with_file(false)
        .with_line_number(false)
        .init();

    let email = env::var("EMAIL_ADDRESS").expect("EMAIL_ADDRESS environment variable required");
    let password =
        env::var("EMAIL_PASSWORD").expect("EMAIL_PASSWORD environment variable required");

    tracing::info!(email = %email, "Starting inbox-responder example");

    let config = MailerConfig::builder().email(&email).password(password).build()?;

    tracing::debug!("Configuration built successfully");

    // A capability that always escalates - the cycle runs end to end but
    // nothing is sent and nothing is marked read
    let capability = RespondFn::new(
        |_thread: Vec<Message>| async move { None },
        "always escalate (dry run)",
    );

    // One cycle - emits spans for connection, TLS, authentication, search,
    // per-thread resolution, and logout
    let responder = Responder::new(config);
    responder.process(&capability).await?;

    tracing::info!("Cycle completed successfully");

    Ok(())
}
