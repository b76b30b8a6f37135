//! GNOME Online Accounts mail connectivity check
//!
//! Reads every `OAuth2` mail account from
//! [GNOME Online Accounts](https://gitlab.gnome.org/GNOME/gnome-online-accounts)
//! over the session bus, then signs in to its IMAP server with
//! `XOAUTH2`, rebuilds the folder tree, streams message envelopes, and
//! verifies the SMTP server accepts the same token.
//!
//! The folder tree is rebuilt by [`build_folder_tree`] from the flat
//! [`MailboxInfo`] listing the server returns.

mod account;
mod config;
mod connection;
pub mod driver;
mod error;
mod flag;
mod folder;
pub mod goa;
mod mailbox;
mod message;
mod receiver;
mod sender;
mod tree;

pub use account::{Account, Endpoint};
pub use config::{Config, OutputFormat};
pub use connection::{ImapConfig, Security};
pub use error::{Error, Result};
pub use flag::Flag;
pub use folder::{Folder, FolderKind};
pub use mailbox::MailboxInfo;
pub use message::MessageEnvelope;
pub use receiver::{MailboxLock, Receiver};
pub use sender::{Sender, SmtpConfig};
pub use tree::build_folder_tree;
