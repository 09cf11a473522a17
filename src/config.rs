//! Configuration for the mailbox responder.
//!
//! Use [`MailerConfigBuilder`] to create a configuration with sensible defaults:
//!
//! ```
//! use inbox_responder::MailerConfig;
//!
//! let config = MailerConfig::builder()
//!     .email("support@example.com")
//!     .password("app-password")
//!     .build()
//!     .expect("valid config");
//! ```

use crate::error::{Error, Result};
use crate::known_servers::{self, ServerRegistry};
use email_address::EmailAddress;
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;

/// Configuration for the IMAP mailbox and SMTP relay.
///
/// Create using [`MailerConfig::builder()`].
///
/// Note: The `password` field is stored as a [`SecretString`] to prevent
/// accidental logging of sensitive credentials. Addresses are stored as
/// validated [`EmailAddress`] values.
#[derive(Clone)]
pub struct MailerConfig {
    /// Mailbox address (used for login and server discovery).
    email: EmailAddress,
    /// Mailbox password or app-specific password (protected from accidental logging).
    password: SecretString,
    /// Support address unread mail is filtered on and replies carry in
    /// `Reply-To`. Defaults to the mailbox address.
    support_address: Option<EmailAddress>,
    /// IMAP server hostname (auto-discovered from the email domain if not set).
    pub imap_host: Option<String>,
    /// IMAP server port (default: 993 for IMAPS).
    pub imap_port: u16,
    /// SMTP relay hostname (auto-discovered from the email domain if not set).
    pub smtp_host: Option<String>,
    /// SMTP relay port (default: 587 for STARTTLS submission).
    pub smtp_port: u16,
    /// Pause between poll cycles.
    pub poll_interval: Duration,
    /// Whether a successfully answered message is flagged `\Seen`.
    pub mark_read: bool,
}

impl std::fmt::Debug for MailerConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MailerConfig")
            .field("email", &self.email.as_str())
            .field("password", &"[REDACTED]")
            .field("support_address", &self.support_address())
            .field("imap_host", &self.imap_host)
            .field("imap_port", &self.imap_port)
            .field("smtp_host", &self.smtp_host)
            .field("smtp_port", &self.smtp_port)
            .field("poll_interval", &self.poll_interval)
            .field("mark_read", &self.mark_read)
            .finish()
    }
}

impl MailerConfig {
    /// Creates a new configuration builder.
    #[must_use]
    pub fn builder() -> MailerConfigBuilder {
        MailerConfigBuilder::default()
    }

    /// Returns the mailbox address as a string slice.
    #[must_use]
    pub fn email(&self) -> &str {
        self.email.as_str()
    }

    /// Returns the password as a string slice.
    ///
    /// Use this method when you need to pass the password to authentication.
    /// The password is intentionally not directly accessible to prevent accidental logging.
    #[must_use]
    pub fn password(&self) -> &str {
        self.password.expose_secret()
    }

    /// Returns the support address, falling back to the mailbox address.
    #[must_use]
    pub fn support_address(&self) -> &str {
        self.support_address
            .as_ref()
            .unwrap_or(&self.email)
            .as_str()
    }

    /// Returns the effective IMAP host, either explicitly configured or
    /// discovered from the email domain.
    #[must_use]
    pub fn effective_imap_host(&self) -> String {
        if let Some(host) = &self.imap_host {
            host.clone()
        } else {
            known_servers::discover_hosts(self.email.as_str()).imap
        }
    }

    /// Returns the effective SMTP relay host, either explicitly configured or
    /// discovered from the email domain.
    #[must_use]
    pub fn effective_smtp_host(&self) -> String {
        if let Some(host) = &self.smtp_host {
            host.clone()
        } else {
            known_servers::discover_hosts(self.email.as_str()).smtp
        }
    }

    /// Returns the full IMAP server address as "host:port".
    #[must_use]
    pub fn imap_address(&self) -> String {
        format!("{}:{}", self.effective_imap_host(), self.imap_port)
    }
}

/// Validates an email address format.
fn validate_email(email: &str) -> Result<EmailAddress> {
    EmailAddress::parse_with_options(email, email_address::Options::default()).map_err(|_| {
        Error::InvalidEmailFormat {
            email: email.to_string(),
        }
    })
}

/// Builder for [`MailerConfig`].
#[derive(Debug, Default)]
pub struct MailerConfigBuilder {
    email: Option<String>,
    password: Option<String>,
    support_address: Option<String>,
    imap_host: Option<String>,
    imap_port: Option<u16>,
    smtp_host: Option<String>,
    smtp_port: Option<u16>,
    poll_interval: Option<Duration>,
    mark_read: Option<bool>,
    server_registry: Option<ServerRegistry>,
}

impl MailerConfigBuilder {
    /// Sets the mailbox address (required).
    ///
    /// The email domain is used to auto-discover the mail servers if they are
    /// not explicitly set.
    #[must_use]
    pub fn email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    /// Sets the password (required).
    ///
    /// For Gmail/Outlook, use an app-specific password.
    #[must_use]
    pub fn password(mut self, password: impl Into<String>) -> Self {
        self.password = Some(password.into());
        self
    }

    /// Sets the support address unread mail is filtered on.
    ///
    /// Defaults to the mailbox address. Useful when the mailbox receives mail
    /// for several aliases and only one of them is the support queue.
    #[must_use]
    pub fn support_address(mut self, address: impl Into<String>) -> Self {
        self.support_address = Some(address.into());
        self
    }

    /// Sets the IMAP server hostname explicitly.
    ///
    /// If not set, the server is auto-discovered from the email domain.
    #[must_use]
    pub fn imap_host(mut self, host: impl Into<String>) -> Self {
        self.imap_host = Some(host.into());
        self
    }

    /// Sets the IMAP server port.
    ///
    /// Default is 993 (IMAPS with TLS).
    #[must_use]
    pub fn imap_port(mut self, port: u16) -> Self {
        self.imap_port = Some(port);
        self
    }

    /// Sets the SMTP relay hostname explicitly.
    ///
    /// If not set, the relay is auto-discovered from the email domain.
    #[must_use]
    pub fn smtp_host(mut self, host: impl Into<String>) -> Self {
        self.smtp_host = Some(host.into());
        self
    }

    /// Sets the SMTP relay port.
    ///
    /// Default is 587 (submission with STARTTLS).
    #[must_use]
    pub fn smtp_port(mut self, port: u16) -> Self {
        self.smtp_port = Some(port);
        self
    }

    /// Sets the pause between poll cycles.
    ///
    /// Default is 60 seconds.
    #[must_use]
    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = Some(interval);
        self
    }

    /// Sets whether answered messages are flagged `\Seen` after a successful
    /// send.
    ///
    /// Default is `true`. With `false` the mailbox is never written to, which
    /// is useful for dry runs - but every cycle will then re-answer the same
    /// messages.
    #[must_use]
    pub fn mark_read(mut self, mark_read: bool) -> Self {
        self.mark_read = Some(mark_read);
        self
    }

    /// Sets a custom server registry for host discovery.
    ///
    /// The registry is used during [`build()`](Self::build) to resolve the
    /// IMAP and SMTP hosts when they are not set explicitly.
    ///
    /// # Example
    ///
    /// ```
    /// use inbox_responder::{MailerConfig, ServerRegistry};
    ///
    /// let mut registry = ServerRegistry::with_defaults();
    /// registry.register("mycompany.com", "mail.internal", "relay.internal");
    ///
    /// let config = MailerConfig::builder()
    ///     .email("support@mycompany.com")
    ///     .password("secret")
    ///     .server_registry(registry)
    ///     .build()
    ///     .expect("valid config");
    ///
    /// assert_eq!(config.effective_imap_host(), "mail.internal");
    /// assert_eq!(config.effective_smtp_host(), "relay.internal");
    /// ```
    #[must_use]
    pub fn server_registry(mut self, registry: ServerRegistry) -> Self {
        self.server_registry = Some(registry);
        self
    }

    /// Builds the configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if required fields are missing or an address is invalid.
    pub fn build(self) -> Result<MailerConfig> {
        let email_raw = self.email.ok_or_else(|| Error::InvalidConfig {
            message: "email is required".into(),
        })?;
        let email = validate_email(&email_raw)?;

        let password_raw = self.password.ok_or_else(|| Error::InvalidConfig {
            message: "password is required".into(),
        })?;

        let support_address = self
            .support_address
            .map(|addr| validate_email(&addr))
            .transpose()?;

        // Resolve hosts: explicit > registry > default discovery (deferred)
        let (imap_host, smtp_host) = match self.server_registry {
            Some(registry) => {
                let hosts = registry.discover(email.as_str());
                (
                    self.imap_host.or(Some(hosts.imap)),
                    self.smtp_host.or(Some(hosts.smtp)),
                )
            }
            None => (self.imap_host, self.smtp_host),
        };

        Ok(MailerConfig {
            email,
            password: SecretString::from(password_raw),
            support_address,
            imap_host,
            imap_port: self.imap_port.unwrap_or(993),
            smtp_host,
            smtp_port: self.smtp_port.unwrap_or(587),
            poll_interval: self.poll_interval.unwrap_or(Duration::from_secs(60)),
            mark_read: self.mark_read.unwrap_or(true),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder_minimal() {
        let config = MailerConfig::builder()
            .email("support@example.com")
            .password("secret")
            .build()
            .unwrap();

        assert_eq!(config.email(), "support@example.com");
        assert_eq!(config.password(), "secret");
        assert_eq!(config.support_address(), "support@example.com");
        assert_eq!(config.imap_port, 993);
        assert_eq!(config.smtp_port, 587);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert!(config.mark_read);
    }

    #[test]
    fn test_builder_full() {
        let config = MailerConfig::builder()
            .email("bot@example.com")
            .password("secret")
            .support_address("help@example.com")
            .imap_host("mail.example.com")
            .imap_port(994)
            .smtp_host("relay.example.com")
            .smtp_port(2525)
            .poll_interval(Duration::from_secs(30))
            .mark_read(false)
            .build()
            .unwrap();

        assert_eq!(config.support_address(), "help@example.com");
        assert_eq!(config.imap_host, Some("mail.example.com".into()));
        assert_eq!(config.imap_port, 994);
        assert_eq!(config.smtp_host, Some("relay.example.com".into()));
        assert_eq!(config.smtp_port, 2525);
        assert_eq!(config.poll_interval, Duration::from_secs(30));
        assert!(!config.mark_read);
    }

    #[test]
    fn test_builder_missing_email() {
        let result = MailerConfig::builder().password("secret").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_missing_password() {
        let result = MailerConfig::builder().email("support@example.com").build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_invalid_email() {
        let result = MailerConfig::builder()
            .email("invalid-email")
            .password("secret")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_builder_invalid_support_address() {
        let result = MailerConfig::builder()
            .email("support@example.com")
            .password("secret")
            .support_address("not-an-address")
            .build();
        assert!(result.is_err());
    }

    #[test]
    fn test_host_discovery_from_domain() {
        let config = MailerConfig::builder()
            .email("support@gmail.com")
            .password("secret")
            .build()
            .unwrap();

        assert_eq!(config.effective_imap_host(), "imap.gmail.com");
        assert_eq!(config.effective_smtp_host(), "smtp.gmail.com");
        assert_eq!(config.imap_address(), "imap.gmail.com:993");
    }

    #[test]
    fn test_explicit_host_overrides_registry() {
        let mut registry = ServerRegistry::new();
        registry.register("mycompany.com", "mail.internal", "relay.internal");

        let config = MailerConfig::builder()
            .email("support@mycompany.com")
            .password("secret")
            .imap_host("custom.host.com")
            .server_registry(registry)
            .build()
            .unwrap();

        // Explicit IMAP host takes precedence; SMTP still comes from the registry
        assert_eq!(config.effective_imap_host(), "custom.host.com");
        assert_eq!(config.effective_smtp_host(), "relay.internal");
    }

    #[test]
    fn test_password_not_in_debug() {
        let config = MailerConfig::builder()
            .email("support@example.com")
            .password("super-secret-password")
            .build()
            .unwrap();

        let debug_str = format!("{config:?}");
        assert!(!debug_str.contains("super-secret-password"));
        assert!(debug_str.contains("[REDACTED]"));
    }
}
