//! Error types for goa-mailcheck
//!
//! Failures raised by the protocol crates are carried as-is through
//! `#[from]` variants so callers see the library's own error value.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IMAP error: {0}")]
    Imap(#[from] async_imap::error::Error),

    #[error("SMTP error: {0}")]
    Smtp(#[from] lettre::transport::smtp::Error),

    #[error("D-Bus error: {0}")]
    Dbus(#[from] zbus::Error),

    #[error("D-Bus method error: {0}")]
    DbusFdo(#[from] zbus::fdo::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Invalid server name: {0}")]
    ServerName(#[from] rustls::pki_types::InvalidDnsNameError),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Account error: {0}")]
    Account(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("Server {0} did not accept the connection")]
    NotConnected(String),
}

pub type Result<T> = std::result::Result<T, Error>;
