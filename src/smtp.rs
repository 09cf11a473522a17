//! Internal SMTP transport setup.
//!
//! Replies go out through a STARTTLS submission relay using the same
//! credentials as the IMAP login. The transport is built fresh each cycle and
//! dropped when the cycle ends.

use crate::config::MailerConfig;
use crate::error::{Error, Result};
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, Tokio1Executor};
use tracing::{debug, instrument};

/// Async SMTP transport used for one cycle's sends.
pub(crate) type SmtpSender = AsyncSmtpTransport<Tokio1Executor>;

/// Builds the SMTP transport for the configured relay.
pub(crate) fn build_transport(config: &MailerConfig) -> Result<SmtpSender> {
    let host = config.effective_smtp_host();

    let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&host)
        .map_err(|source| Error::SmtpConnect {
            host: host.clone(),
            source,
        })?
        .port(config.smtp_port)
        .credentials(Credentials::new(
            config.email().to_string(),
            config.password().to_string(),
        ))
        .build();

    Ok(transport)
}

/// Probes the relay: connect, STARTTLS, authenticate.
///
/// Run at cycle start so a dead or misconfigured relay aborts the cycle
/// before any thread is answered, rather than after the first respond call.
#[instrument(name = "smtp::verify", skip_all, fields(smtp_host = %config.effective_smtp_host()))]
pub(crate) async fn verify(transport: &SmtpSender, config: &MailerConfig) -> Result<()> {
    let host = config.effective_smtp_host();

    let ok = transport
        .test_connection()
        .await
        .map_err(|source| Error::SmtpConnect {
            host: host.clone(),
            source,
        })?;

    if !ok {
        return Err(Error::SmtpUnavailable { host });
    }

    debug!("SMTP relay verified");
    Ok(())
}
