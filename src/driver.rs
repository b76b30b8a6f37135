//! Per-account connectivity check
//!
//! Accounts are processed one at a time: the inbound session is opened,
//! optionally walked, and closed before the outbound transport is
//! verified. The first failure stops the run.

use crate::account::Account;
use crate::config::{Config, OutputFormat};
use crate::connection::ImapConfig;
use crate::error::Result;
use crate::flag::Flag;
use crate::folder::{Folder, FolderKind};
use crate::message::MessageEnvelope;
use crate::receiver::Receiver;
use crate::sender::{Sender, SmtpConfig};
use chrono::DateTime;
use futures::TryStreamExt;
use serde::Serialize;
use std::io::{self, Write};
use tracing::{error, info};

/// One message line of JSON output.
#[derive(Serialize)]
struct MessageLine<'a> {
    mailbox: &'a str,
    #[serde(flatten)]
    message: &'a MessageEnvelope,
}

/// Check every account, up to `config.account_limit`.
///
/// # Errors
///
/// Returns the first error raised while checking an account; later
/// accounts are not attempted.
pub async fn run<W: Write>(accounts: &[Account], config: &Config, out: &mut W) -> Result<()> {
    let limit = config.account_limit.unwrap_or(usize::MAX);
    info!(
        "Checking {} of {} accounts",
        accounts.len().min(limit),
        accounts.len()
    );

    for account in accounts.iter().take(limit) {
        if let Err(e) = check_account(account, config, out).await {
            error!("Account {} failed: {}", account.display_name(), e);
            return Err(e);
        }
    }

    Ok(())
}

async fn check_account<W: Write>(account: &Account, config: &Config, out: &mut W) -> Result<()> {
    let name = account.display_name();

    let imap = ImapConfig::from_account(account);
    info!("Connecting to {}", imap.host);
    check_receiver(&imap, name, config, out).await?;

    let smtp = SmtpConfig::from_account(account, config.smtp_timeout);
    info!("Connecting to {}", smtp.host);
    check_sender(&smtp, name).await
}

/// Connect to the inbound server and, if `config.fetch_messages` is
/// set, print every root folder and the messages it holds.
///
/// Folders that contain other folders are printed as `<name> ...` and
/// not opened.
///
/// # Errors
///
/// Returns an error if connecting, listing, fetching, writing to `out`,
/// or logging out fails.
pub async fn check_receiver<W: Write>(
    imap: &ImapConfig,
    name: &str,
    config: &Config,
    out: &mut W,
) -> Result<()> {
    let mut receiver = Receiver::connect(imap).await?;
    info!("Account {} connected (Receive)", name);

    if config.fetch_messages {
        let roots = receiver.init_folders().await?.to_vec();
        for folder in &roots {
            if folder.kind == FolderKind::Folder {
                write_folder(out, config.output, folder)?;
                continue;
            }

            let messages = receiver.fetch_mailbox(&folder.path);
            futures::pin_mut!(messages);
            while let Some(message) = messages.try_next().await? {
                write_message(out, config.output, &folder.path, &message)?;
            }
        }
    }

    receiver.disconnect().await
}

/// Verify the outbound server accepts the account's credentials.
///
/// # Errors
///
/// Returns an error if the transport cannot be built or the server
/// cannot be reached or rejects the login.
pub async fn check_sender(smtp: &SmtpConfig, name: &str) -> Result<()> {
    let sender = Sender::new(smtp)?;
    sender.verify().await?;
    info!("Account {} connected (Send)", name);
    sender.close();
    Ok(())
}

fn write_folder<W: Write>(out: &mut W, format: OutputFormat, folder: &Folder) -> Result<()> {
    match format {
        OutputFormat::Text => writeln!(out, "{} ...", folder.name)?,
        OutputFormat::Json => {
            serde_json::to_writer(&mut *out, folder).map_err(io::Error::from)?;
            writeln!(out)?;
        }
    }
    Ok(())
}

fn write_message<W: Write>(
    out: &mut W,
    format: OutputFormat,
    mailbox: &str,
    message: &MessageEnvelope,
) -> Result<()> {
    match format {
        OutputFormat::Text => {
            let date = message
                .date
                .as_ref()
                .map(DateTime::to_rfc3339)
                .unwrap_or_default();
            let flags: Vec<&str> = message.flags.iter().map(Flag::as_imap_str).collect();
            writeln!(
                out,
                "{}\t{}\t{}\t{}\t{}\t{}",
                mailbox,
                message.uid,
                date,
                flags.join(" "),
                message.from.join(", "),
                message.subject.as_deref().unwrap_or_default()
            )?;
        }
        OutputFormat::Json => {
            let line = MessageLine { mailbox, message };
            serde_json::to_writer(&mut *out, &line).map_err(io::Error::from)?;
            writeln!(out)?;
        }
    }
    Ok(())
}
