//! Outbound submission session

use crate::account::Account;
use crate::connection::Security;
use crate::error::{Error, Result};
use lettre::transport::smtp::authentication::{Credentials, Mechanism};
use lettre::transport::smtp::client::{Tls, TlsParameters};
use lettre::{AsyncSmtpTransport, Tokio1Executor};
use secrecy::{ExposeSecret, SecretString};
use std::time::Duration;
use tracing::{debug, info};

/// SMTPS port, used when the account asks for implicit TLS.
pub const SMTP_TLS_PORT: u16 = 465;
/// Submission port, upgraded with STARTTLS when requested.
pub const SMTP_SUBMISSION_PORT: u16 = 587;

/// SMTP connection configuration for one account
#[derive(Debug)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    pub security: Security,
    pub username: String,
    pub token: SecretString,
    pub accept_invalid_certs: bool,
    /// Limit on every SMTP command, including connecting.
    pub timeout: Duration,
}

impl SmtpConfig {
    /// Derive the outbound settings of an account.
    ///
    /// Port 465 with implicit TLS when the account is `secure`,
    /// otherwise port 587.
    #[must_use]
    pub fn from_account(account: &Account, timeout: Duration) -> Self {
        let endpoint = &account.sender;
        let (port, security) = if endpoint.secure {
            (SMTP_TLS_PORT, Security::Tls)
        } else if endpoint.starttls {
            (SMTP_SUBMISSION_PORT, Security::StartTls)
        } else {
            (SMTP_SUBMISSION_PORT, Security::Plain)
        };

        Self {
            host: endpoint.host.clone(),
            port,
            security,
            username: endpoint.username.clone(),
            token: SecretString::from(account.auth_token.expose_secret().to_owned()),
            accept_invalid_certs: endpoint.accept_invalid_certs,
            timeout,
        }
    }
}

/// An XOAUTH2-authenticated SMTP transport.
///
/// Building the transport does not touch the network; connections are
/// opened by [`Sender::verify`].
pub struct Sender {
    transport: AsyncSmtpTransport<Tokio1Executor>,
    host: String,
}

impl Sender {
    /// Build the transport.
    ///
    /// # Errors
    ///
    /// Returns an error if the TLS parameters cannot be built.
    pub fn new(config: &SmtpConfig) -> Result<Self> {
        let tls = match config.security {
            Security::Tls => Tls::Wrapper(tls_parameters(config)?),
            Security::StartTls => Tls::Required(tls_parameters(config)?),
            Security::Plain => Tls::None,
        };

        let credentials = Credentials::new(
            config.username.clone(),
            config.token.expose_secret().to_owned(),
        );

        let transport = AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(&config.host)
            .port(config.port)
            .tls(tls)
            .credentials(credentials)
            .authentication(vec![Mechanism::Xoauth2])
            .timeout(Some(config.timeout))
            .build();

        debug!(
            "Built SMTP transport for {}:{} ({:?})",
            config.host, config.port, config.security
        );

        Ok(Self {
            transport,
            host: config.host.clone(),
        })
    }

    /// Connect, authenticate and quit.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the server cannot be reached or
    /// rejects the credentials, and [`Error::NotConnected`] if the
    /// session comes up unhealthy.
    pub async fn verify(&self) -> Result<()> {
        if self.transport.test_connection().await? {
            info!("Connected to SMTP server {}", self.host);
            Ok(())
        } else {
            Err(Error::NotConnected(self.host.clone()))
        }
    }

    /// Release the transport and any pooled connections.
    pub fn close(self) {
        drop(self.transport);
        debug!("Closed SMTP transport for {}", self.host);
    }
}

fn tls_parameters(config: &SmtpConfig) -> Result<TlsParameters> {
    Ok(TlsParameters::builder(config.host.clone())
        .dangerous_accept_invalid_certs(config.accept_invalid_certs)
        .build()?)
}
