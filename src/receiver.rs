//! Inbound mailbox session

use crate::connection::{self, ImapConfig, ImapSession};
use crate::error::{Error, Result};
use crate::folder::Folder;
use crate::mailbox::MailboxInfo;
use crate::message::{FETCH_QUERY, MessageEnvelope};
use crate::tree::build_folder_tree;
use async_stream::try_stream;
use futures::{Stream, StreamExt, stream};
use tracing::{debug, info};

/// An authenticated IMAP session for one account.
///
/// Messages are only read while a mailbox is locked; see
/// [`Receiver::lock`] and [`Receiver::fetch_mailbox`].
pub struct Receiver {
    session: ImapSession,
    host: String,
    folders: Vec<Folder>,
    locked: Option<String>,
}

impl Receiver {
    /// Connect and authenticate.
    ///
    /// # Errors
    ///
    /// Returns an error if the TCP connection, TLS handshake, or
    /// XOAUTH2 authentication fails.
    pub async fn connect(config: &ImapConfig) -> Result<Self> {
        let session = connection::connect(config).await?;
        Ok(Self {
            session,
            host: config.host.clone(),
            folders: Vec::new(),
            locked: None,
        })
    }

    /// List every mailbox on the server.
    ///
    /// # Errors
    ///
    /// Returns an error if the LIST command fails.
    pub async fn list(&mut self) -> Result<Vec<MailboxInfo>> {
        let mut names = self.session.list(Some(""), Some("*")).await?;

        let mut mailboxes = Vec::new();
        while let Some(name) = names.next().await {
            mailboxes.push(MailboxInfo::from_name(&name?));
        }

        debug!("Listed {} mailboxes on {}", mailboxes.len(), self.host);
        Ok(mailboxes)
    }

    /// List the mailboxes and rebuild the folder tree from them.
    ///
    /// The roots are kept and available afterwards from
    /// [`Receiver::folders`].
    ///
    /// # Errors
    ///
    /// Returns an error if the LIST command fails.
    pub async fn init_folders(&mut self) -> Result<&[Folder]> {
        let mailboxes = self.list().await?;
        self.folders = build_folder_tree(&mailboxes);
        Ok(&self.folders)
    }

    /// Root folders from the last [`Receiver::init_folders`] call.
    #[must_use]
    pub fn folders(&self) -> &[Folder] {
        &self.folders
    }

    /// The mailbox currently held by a [`MailboxLock`], if any.
    #[must_use]
    pub fn locked_mailbox(&self) -> Option<&str> {
        self.locked.as_deref()
    }

    /// Select `path` and hold it until the returned lock is dropped.
    ///
    /// # Errors
    ///
    /// Returns an error if the SELECT command fails; no lock is held in
    /// that case.
    pub async fn lock(&mut self, path: &str) -> Result<MailboxLock<'_>> {
        let mailbox = self.session.select(path).await?;
        self.locked = Some(path.to_string());
        debug!("Locked {} ({} messages)", path, mailbox.exists);

        Ok(MailboxLock {
            receiver: self,
            path: path.to_string(),
            exists: mailbox.exists,
        })
    }

    /// Stream the envelopes of every message in `path`.
    ///
    /// The mailbox is locked on first poll and released when the
    /// stream ends or is dropped. After yielding an error the stream
    /// ends on the next poll.
    pub fn fetch_mailbox<'a>(
        &'a mut self,
        path: &'a str,
    ) -> impl Stream<Item = Result<MessageEnvelope>> + 'a {
        try_stream! {
            let mut lock = self.lock(path).await?;
            let messages = lock.messages().await?;
            futures::pin_mut!(messages);
            while let Some(message) = messages.next().await {
                yield message?;
            }
        }
    }

    /// Log out and close the connection.
    ///
    /// # Errors
    ///
    /// Returns an error if the LOGOUT command fails.
    pub async fn disconnect(mut self) -> Result<()> {
        self.session.logout().await?;
        info!("Disconnected from IMAP server {}", self.host);
        Ok(())
    }
}

/// Exclusive hold on a selected mailbox.
///
/// Borrowing the [`Receiver`] mutably keeps any other mailbox from
/// being selected while the lock is alive. Dropping it releases the
/// mailbox.
pub struct MailboxLock<'a> {
    receiver: &'a mut Receiver,
    path: String,
    exists: u32,
}

impl MailboxLock<'_> {
    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Number of messages in the mailbox when it was selected.
    #[must_use]
    pub const fn exists(&self) -> u32 {
        self.exists
    }

    /// Fetch the envelope of every message, lazily.
    ///
    /// Nothing is sent to the server for an empty mailbox.
    ///
    /// # Errors
    ///
    /// Returns an error if the FETCH command cannot be issued. Errors
    /// for individual messages are yielded by the stream.
    pub async fn messages(&mut self) -> Result<impl Stream<Item = Result<MessageEnvelope>> + '_> {
        let fetches = if self.exists == 0 {
            None
        } else {
            Some(self.receiver.session.fetch("1:*", FETCH_QUERY).await?)
        };

        Ok(stream::iter(fetches).flatten().map(|item| {
            item.map_err(Error::from)
                .and_then(|fetch| MessageEnvelope::try_from(&fetch))
        }))
    }
}

impl Drop for MailboxLock<'_> {
    fn drop(&mut self) {
        self.receiver.locked = None;
        debug!("Released {}", self.path);
    }
}
