//! Account discovery through GNOME Online Accounts
//!
//! Enumerates the objects exported by the `org.gnome.OnlineAccounts`
//! service on the session bus, keeps the ones that are both mail
//! accounts and `OAuth2`-based, and reads their server settings and a
//! fresh access token.

use crate::account::{Account, Endpoint};
use crate::error::{Error, Result};
use secrecy::SecretString;
use tracing::{debug, info, warn};
use zbus::{Connection, fdo::ObjectManagerProxy, proxy};

const SERVICE: &str = "org.gnome.OnlineAccounts";
const MANAGER_PATH: &str = "/org/gnome/OnlineAccounts";
const MAIL_INTERFACE: &str = "org.gnome.OnlineAccounts.Mail";
const OAUTH2_INTERFACE: &str = "org.gnome.OnlineAccounts.OAuth2Based";

#[proxy(
    interface = "org.gnome.OnlineAccounts.OAuth2Based",
    default_service = "org.gnome.OnlineAccounts",
    gen_blocking = false
)]
trait OAuth2Based {
    /// Returns the access token and its lifetime in seconds.
    fn get_access_token(&self) -> zbus::Result<(String, i32)>;
}

#[proxy(
    interface = "org.gnome.OnlineAccounts.Mail",
    default_service = "org.gnome.OnlineAccounts",
    gen_blocking = false
)]
trait Mail {
    #[zbus(property)]
    fn email_address(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn imap_host(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn imap_use_ssl(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn imap_use_tls(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn imap_user_name(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn imap_accept_ssl_errors(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn smtp_host(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn smtp_use_ssl(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn smtp_use_tls(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn smtp_user_name(&self) -> zbus::Result<String>;

    #[zbus(property)]
    fn smtp_accept_ssl_errors(&self) -> zbus::Result<bool>;
}

/// Server settings of one side of a GOA mail account, as exported on
/// the `Mail` interface.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ServerProperties {
    pub host: String,
    pub use_ssl: bool,
    pub use_tls: bool,
    pub user_name: String,
    pub accept_ssl_errors: bool,
}

/// The `Mail` interface properties the account mapping needs.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MailProperties {
    pub email_address: String,
    pub imap: ServerProperties,
    pub smtp: ServerProperties,
}

impl MailProperties {
    /// Turn the exported settings and an access token into an
    /// [`Account`].
    ///
    /// Empty user names fall back to the account's email address.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Account`] if either server has no host.
    pub fn into_account(self, token: String) -> Result<Account> {
        let receiver = endpoint("IMAP", self.imap, &self.email_address)?;
        let sender = endpoint("SMTP", self.smtp, &self.email_address)?;

        Ok(Account {
            email: self.email_address,
            receiver,
            sender,
            auth_token: SecretString::from(token),
        })
    }
}

fn endpoint(kind: &str, server: ServerProperties, email: &str) -> Result<Endpoint> {
    if server.host.is_empty() {
        return Err(Error::Account(format!("{kind} host not set for {email}")));
    }

    let username = if server.user_name.is_empty() {
        email.to_string()
    } else {
        server.user_name
    };

    Ok(Endpoint {
        host: server.host,
        secure: server.use_ssl,
        starttls: server.use_tls,
        username,
        accept_invalid_certs: server.accept_ssl_errors,
    })
}

/// Whether an exported object is an `OAuth2`-based mail account.
#[must_use]
pub fn is_oauth2_mail_account<'a, I>(interfaces: I) -> bool
where
    I: IntoIterator<Item = &'a str>,
{
    let (mut mail, mut oauth2) = (false, false);
    for name in interfaces {
        mail |= name == MAIL_INTERFACE;
        oauth2 |= name == OAUTH2_INTERFACE;
    }
    mail && oauth2
}

/// Fetch every `OAuth2` mail account from the session's account manager.
///
/// Accounts are returned ordered by their object path. An account
/// whose settings cannot be used (no IMAP or SMTP host) is skipped with
/// a warning so the others can still be checked.
///
/// # Errors
///
/// Returns an error if the session bus is unreachable, the account
/// manager is not running, or an account's properties cannot be read.
pub async fn fetch_accounts() -> Result<Vec<Account>> {
    let connection = Connection::session().await?;

    let manager = ObjectManagerProxy::builder(&connection)
        .destination(SERVICE)?
        .path(MANAGER_PATH)?
        .build()
        .await?;
    let objects = manager.get_managed_objects().await?;

    let mut paths: Vec<String> = objects
        .iter()
        .filter(|(_, interfaces)| {
            is_oauth2_mail_account(interfaces.keys().map(|name| name.as_str()))
        })
        .map(|(path, _)| path.to_string())
        .collect();
    paths.sort();
    debug!("Found {} OAuth2 mail account(s)", paths.len());

    let mut accounts = Vec::with_capacity(paths.len());
    for path in paths {
        let (properties, token) = fetch_account(&connection, &path).await?;
        accounts.extend(usable_account(&path, properties, token));
    }

    drop(connection);
    info!("Loaded {} account(s) from {}", accounts.len(), SERVICE);
    Ok(accounts)
}

/// Map the settings of the account at `path`, or log why it is skipped.
fn usable_account(path: &str, properties: MailProperties, token: String) -> Option<Account> {
    properties
        .into_account(token)
        .inspect_err(|e| warn!("Skipping account {}: {}", path, e))
        .ok()
}

async fn fetch_account(connection: &Connection, path: &str) -> Result<(MailProperties, String)> {
    debug!("Reading account {}", path);

    let oauth2 = OAuth2BasedProxy::builder(connection)
        .path(path)?
        .build()
        .await?;
    let (token, _expires_in) = oauth2.get_access_token().await?;

    let mail = MailProxy::builder(connection).path(path)?.build().await?;
    let properties = MailProperties {
        email_address: mail.email_address().await?,
        imap: ServerProperties {
            host: mail.imap_host().await?,
            use_ssl: mail.imap_use_ssl().await?,
            use_tls: mail.imap_use_tls().await?,
            user_name: mail.imap_user_name().await?,
            accept_ssl_errors: mail.imap_accept_ssl_errors().await?,
        },
        smtp: ServerProperties {
            host: mail.smtp_host().await?,
            use_ssl: mail.smtp_use_ssl().await?,
            use_tls: mail.smtp_use_tls().await?,
            user_name: mail.smtp_user_name().await?,
            accept_ssl_errors: mail.smtp_accept_ssl_errors().await?,
        },
    };

    Ok((properties, token))
}
