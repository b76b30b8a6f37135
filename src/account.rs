//! Mail account descriptors

use secrecy::SecretString;

/// One side (inbound or outbound) of a mail account.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    pub host: String,
    /// Connect with implicit TLS.
    pub secure: bool,
    /// Upgrade a plain connection with STARTTLS when not `secure`.
    pub starttls: bool,
    pub username: String,
    /// Skip certificate verification for this server.
    pub accept_invalid_certs: bool,
}

/// A mail account with `OAuth2` credentials.
///
/// The bearer token is shared by both endpoints and is redacted in
/// `Debug` output.
#[derive(Debug)]
pub struct Account {
    pub email: String,
    pub receiver: Endpoint,
    pub sender: Endpoint,
    pub auth_token: SecretString,
}

impl Account {
    /// The name used when reporting on this account.
    #[must_use]
    pub fn display_name(&self) -> &str {
        if self.receiver.username.is_empty() {
            &self.email
        } else {
            &self.receiver.username
        }
    }
}
