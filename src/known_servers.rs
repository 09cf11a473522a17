//! IMAP/SMTP server discovery from email domains.
//!
//! The responder speaks both protocols, so discovery yields a paired
//! [`MailHosts`] for a domain: the IMAP host it polls and the SMTP relay it
//! sends through. Built-in mappings cover common providers and can be
//! extended or overridden at runtime.
//!
//! # Example
//!
//! ```
//! use inbox_responder::known_servers::{ServerRegistry, discover_hosts};
//!
//! // Use built-in discovery
//! let hosts = discover_hosts("user@gmail.com");
//! assert_eq!(hosts.imap, "imap.gmail.com");
//! assert_eq!(hosts.smtp, "smtp.gmail.com");
//!
//! // Create a custom registry for your application
//! let mut registry = ServerRegistry::with_defaults();
//! registry.register("mycompany.com", "mail.mycompany.com", "relay.mycompany.com");
//! assert_eq!(registry.discover("user@mycompany.com").smtp, "relay.mycompany.com");
//! ```

use std::collections::HashMap;
use std::sync::LazyLock;

/// The IMAP and SMTP hostnames serving one email domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailHosts {
    /// IMAP server hostname (polled for unread mail).
    pub imap: String,
    /// SMTP relay hostname (replies are sent through it).
    pub smtp: String,
}

impl MailHosts {
    fn new(imap: impl Into<String>, smtp: impl Into<String>) -> Self {
        Self {
            imap: imap.into(),
            smtp: smtp.into(),
        }
    }
}

/// Map of email domains to their IMAP/SMTP server pairs.
static KNOWN_SERVERS: LazyLock<HashMap<&'static str, (&'static str, &'static str)>> =
    LazyLock::new(|| {
        let mut m = HashMap::new();

        // Google
        m.insert("gmail.com", ("imap.gmail.com", "smtp.gmail.com"));
        m.insert("googlemail.com", ("imap.gmail.com", "smtp.gmail.com"));

        // Yahoo
        m.insert("yahoo.com", ("imap.mail.yahoo.com", "smtp.mail.yahoo.com"));

        // Microsoft
        m.insert("hotmail.com", ("imap-mail.outlook.com", "smtp-mail.outlook.com"));
        m.insert("outlook.com", ("imap-mail.outlook.com", "smtp-mail.outlook.com"));
        m.insert("live.com", ("imap-mail.outlook.com", "smtp-mail.outlook.com"));

        // AOL
        m.insert("aol.com", ("imap.aol.com", "smtp.aol.com"));

        // Yandex
        m.insert("yandex.ru", ("imap.yandex.ru", "smtp.yandex.ru"));
        m.insert("yandex.com", ("imap.yandex.ru", "smtp.yandex.ru"));

        // Apple
        m.insert("icloud.com", ("imap.mail.me.com", "smtp.mail.me.com"));
        m.insert("me.com", ("imap.mail.me.com", "smtp.mail.me.com"));
        m.insert("mac.com", ("imap.mail.me.com", "smtp.mail.me.com"));

        // German providers
        m.insert("web.de", ("imap.web.de", "smtp.web.de"));
        m.insert("gmx.de", ("imap.gmx.net", "mail.gmx.net"));
        m.insert("gmx.net", ("imap.gmx.net", "mail.gmx.net"));
        m.insert("gmx.com", ("imap.gmx.net", "mail.gmx.net"));

        // Mail.ru network
        m.insert("mail.ru", ("imap.mail.ru", "smtp.mail.ru"));
        m.insert("bk.ru", ("imap.mail.ru", "smtp.mail.ru"));
        m.insert("inbox.ru", ("imap.mail.ru", "smtp.mail.ru"));
        m.insert("list.ru", ("imap.mail.ru", "smtp.mail.ru"));

        m
    });

/// A customizable registry for mail server discovery.
///
/// This allows you to add custom domain mappings at runtime, in addition to
/// (or overriding) the built-in defaults.
///
/// # Example
///
/// ```
/// use inbox_responder::known_servers::ServerRegistry;
///
/// // Start with defaults and add custom mappings
/// let mut registry = ServerRegistry::with_defaults();
/// registry.register("mycompany.com", "imap.mycompany.internal", "smtp.mycompany.internal");
///
/// assert_eq!(registry.discover("user@mycompany.com").imap, "imap.mycompany.internal");
/// assert_eq!(registry.discover("user@gmail.com").imap, "imap.gmail.com"); // Built-in
/// ```
#[derive(Debug, Clone)]
pub struct ServerRegistry {
    custom: HashMap<String, MailHosts>,
    use_defaults: bool,
}

impl Default for ServerRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ServerRegistry {
    /// Creates an empty registry without built-in defaults.
    ///
    /// Use [`Self::with_defaults`] if you want to include the standard mappings.
    #[must_use]
    pub fn new() -> Self {
        Self {
            custom: HashMap::new(),
            use_defaults: false,
        }
    }

    /// Creates a registry that includes built-in default mappings.
    ///
    /// Custom mappings added via [`Self::register`] will override defaults.
    #[must_use]
    pub fn with_defaults() -> Self {
        Self {
            custom: HashMap::new(),
            use_defaults: true,
        }
    }

    /// Registers a custom domain mapping.
    ///
    /// This will override any existing mapping (including built-in defaults).
    pub fn register(
        &mut self,
        domain: impl Into<String>,
        imap_host: impl Into<String>,
        smtp_host: impl Into<String>,
    ) {
        self.custom.insert(
            domain.into().to_lowercase(),
            MailHosts::new(imap_host, smtp_host),
        );
    }

    /// Removes a custom mapping.
    ///
    /// Note: This only removes custom mappings, not built-in defaults.
    pub fn unregister(&mut self, domain: &str) -> Option<MailHosts> {
        self.custom.remove(&domain.to_lowercase())
    }

    /// Discovers the mail hosts for an email address.
    ///
    /// Resolution order:
    /// 1. Custom mappings (added via [`Self::register`])
    /// 2. Built-in defaults (if [`Self::with_defaults`] was used)
    /// 3. Fallback to `imap.{domain}` / `smtp.{domain}`
    #[must_use]
    pub fn discover(&self, email: &str) -> MailHosts {
        let domain = email_domain(email);

        if let Some(hosts) = self.custom.get(&domain) {
            return hosts.clone();
        }

        if self.use_defaults {
            if let Some(&(imap, smtp)) = KNOWN_SERVERS.get(domain.as_str()) {
                return MailHosts::new(imap, smtp);
            }
        }

        MailHosts::new(format!("imap.{domain}"), format!("smtp.{domain}"))
    }

    /// Returns `true` if the domain has a known server mapping.
    #[must_use]
    pub fn is_known(&self, domain: &str) -> bool {
        let domain_lower = domain.to_lowercase();
        self.custom.contains_key(&domain_lower)
            || (self.use_defaults && KNOWN_SERVERS.contains_key(domain_lower.as_str()))
    }
}

fn email_domain(email: &str) -> String {
    email.split('@').nth(1).unwrap_or(email).to_lowercase()
}

/// Discovers the mail hosts for an email address using the built-in mappings.
///
/// If the domain is unknown, falls back to `imap.{domain}` / `smtp.{domain}`.
///
/// # Example
///
/// ```
/// use inbox_responder::known_servers::discover_hosts;
///
/// assert_eq!(discover_hosts("user@gmail.com").smtp, "smtp.gmail.com");
/// assert_eq!(discover_hosts("user@custom.org").imap, "imap.custom.org");
/// ```
#[must_use]
pub fn discover_hosts(email: &str) -> MailHosts {
    let domain = email_domain(email);

    KNOWN_SERVERS.get(domain.as_str()).map_or_else(
        || MailHosts::new(format!("imap.{domain}"), format!("smtp.{domain}")),
        |&(imap, smtp)| MailHosts::new(imap, smtp),
    )
}
