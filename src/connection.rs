//! IMAP connection, TLS and XOAUTH2 helpers
//!
//! Provides the low-level `connect()` used by [`Receiver`] to open an
//! authenticated session over implicit TLS, STARTTLS, or plain TCP.
//!
//! [`Receiver`]: crate::Receiver

use crate::account::Account;
use crate::error::Result;
use async_imap::Session;
use futures::io::{AsyncRead, AsyncWrite};
use rustls::pki_types::ServerName;
use secrecy::{ExposeSecret, SecretString};
use std::fmt;
use std::sync::Arc;
use tokio::net::TcpStream;
use tokio_rustls::TlsConnector;
use tokio_rustls::client::TlsStream;
use tokio_util::compat::TokioAsyncReadCompatExt;
use tracing::{debug, info};

/// IMAPS port, used when the account asks for implicit TLS.
pub const IMAP_TLS_PORT: u16 = 993;
/// Plain IMAP port, upgraded with STARTTLS when requested.
pub const IMAP_PORT: u16 = 143;

/// Any byte stream an IMAP session can run over.
pub trait ImapStream: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug {}

impl<T> ImapStream for T where T: AsyncRead + AsyncWrite + Unpin + Send + fmt::Debug {}

/// An authenticated IMAP session over TLS or plain TCP.
pub type ImapSession = Session<Box<dyn ImapStream>>;

/// How the connection to the server is secured.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Security {
    /// TLS from the first byte.
    Tls,
    /// Plain connection upgraded with STARTTLS before authenticating.
    StartTls,
    /// No TLS at all.
    Plain,
}

/// IMAP connection configuration for one account
#[derive(Debug)]
pub struct ImapConfig {
    pub host: String,
    pub port: u16,
    pub security: Security,
    pub username: String,
    pub token: SecretString,
    /// Skip certificate verification.
    pub accept_invalid_certs: bool,
}

impl ImapConfig {
    /// Derive the inbound settings of an account.
    ///
    /// Port 993 with implicit TLS when the account is `secure`,
    /// otherwise port 143 (with STARTTLS if the account asks for it).
    #[must_use]
    pub fn from_account(account: &Account) -> Self {
        let endpoint = &account.receiver;
        let (port, security) = if endpoint.secure {
            (IMAP_TLS_PORT, Security::Tls)
        } else if endpoint.starttls {
            (IMAP_PORT, Security::StartTls)
        } else {
            (IMAP_PORT, Security::Plain)
        };

        Self {
            host: endpoint.host.clone(),
            port,
            security,
            username: endpoint.username.clone(),
            token: SecretString::from(account.auth_token.expose_secret().to_owned()),
            accept_invalid_certs: endpoint.accept_invalid_certs,
        }
    }
}

/// SASL XOAUTH2 initial response for IMAP `AUTHENTICATE`.
///
/// `async-imap` base64-encodes the response before sending it.
pub struct XOAuth2 {
    response: String,
}

impl XOAuth2 {
    pub fn new(user: &str, token: &SecretString) -> Self {
        Self {
            response: format!(
                "user={user}\x01auth=Bearer {}\x01\x01",
                token.expose_secret()
            ),
        }
    }
}

impl async_imap::Authenticator for XOAuth2 {
    type Response = String;

    fn process(&mut self, _challenge: &[u8]) -> Self::Response {
        self.response.clone()
    }
}

/// Build a TLS connector.
///
/// Verifies against the bundled Mozilla roots unless
/// `accept_invalid_certs` is set, in which case any certificate is
/// accepted.
fn tls_connector(accept_invalid_certs: bool) -> TlsConnector {
    let config = if accept_invalid_certs {
        rustls::ClientConfig::builder()
            .dangerous()
            .with_custom_certificate_verifier(Arc::new(DangerousVerifier))
            .with_no_client_auth()
    } else {
        let mut roots = rustls::RootCertStore::empty();
        roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
        rustls::ClientConfig::builder()
            .with_root_certificates(roots)
            .with_no_client_auth()
    };
    TlsConnector::from(Arc::new(config))
}

async fn tls_handshake(config: &ImapConfig, tcp: TcpStream) -> Result<TlsStream<TcpStream>> {
    let server_name = ServerName::try_from(config.host.clone())?;
    let tls_stream = tls_connector(config.accept_invalid_certs)
        .connect(server_name, tcp)
        .await?;
    debug!("TLS established with {}", config.host);
    Ok(tls_stream)
}

/// Open a fresh authenticated IMAP session.
///
/// Connects to `config.host:config.port` via TCP, secures the
/// connection according to `config.security`, and authenticates with
/// `AUTHENTICATE XOAUTH2`.
pub async fn connect(config: &ImapConfig) -> Result<ImapSession> {
    let addr = format!("{}:{}", config.host, config.port);
    debug!(
        "Connecting to IMAP server at {} ({:?})",
        addr, config.security
    );

    let tcp_stream = TcpStream::connect(&addr).await?;

    let mut client = match config.security {
        Security::Tls => {
            let tls_stream = tls_handshake(config, tcp_stream).await?;
            async_imap::Client::new(Box::new(tls_stream.compat()) as Box<dyn ImapStream>)
        }
        Security::StartTls => {
            let mut client = async_imap::Client::new(tcp_stream.compat());
            client.run_command_and_check_ok("STARTTLS", None).await?;

            let inner = client.into_inner().into_inner();
            let tls_stream = tls_handshake(config, inner).await?;
            async_imap::Client::new(Box::new(tls_stream.compat()) as Box<dyn ImapStream>)
        }
        Security::Plain => {
            async_imap::Client::new(Box::new(tcp_stream.compat()) as Box<dyn ImapStream>)
        }
    };

    // The greeting is not sent again after STARTTLS.
    if config.security != Security::StartTls {
        client.run_command_and_check_ok("CAPABILITY", None).await?;
    }

    let session = client
        .authenticate("XOAUTH2", XOAuth2::new(&config.username, &config.token))
        .await
        .map_err(|(e, _)| e)?;

    info!("Connected to IMAP server {}", config.host);
    Ok(session)
}

/// Certificate verifier that accepts all certificates
/// (for accounts configured to accept SSL errors).
#[derive(Debug)]
struct DangerousVerifier;

impl rustls::client::danger::ServerCertVerifier for DangerousVerifier {
    fn verify_server_cert(
        &self,
        _end_entity: &rustls::pki_types::CertificateDer<'_>,
        _intermediates: &[rustls::pki_types::CertificateDer<'_>],
        _server_name: &rustls::pki_types::ServerName<'_>,
        _ocsp_response: &[u8],
        _now: rustls::pki_types::UnixTime,
    ) -> std::result::Result<rustls::client::danger::ServerCertVerified, rustls::Error> {
        Ok(rustls::client::danger::ServerCertVerified::assertion())
    }

    fn verify_tls12_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn verify_tls13_signature(
        &self,
        _message: &[u8],
        _cert: &rustls::pki_types::CertificateDer<'_>,
        _dss: &rustls::DigitallySignedStruct,
    ) -> std::result::Result<rustls::client::danger::HandshakeSignatureValid, rustls::Error> {
        Ok(rustls::client::danger::HandshakeSignatureValid::assertion())
    }

    fn supported_verify_schemes(&self) -> Vec<rustls::SignatureScheme> {
        rustls::crypto::ring::default_provider()
            .signature_verification_algorithms
            .supported_schemes()
    }
}
