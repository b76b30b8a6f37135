//! Message envelopes streamed from a mailbox

use crate::error::{Error, Result};
use crate::flag::Flag;
use async_imap::imap_proto::types::Address;
use async_imap::types::Fetch;
use chrono::{DateTime, FixedOffset};
use serde::Serialize;

/// Data items requested for every message.
pub const FETCH_QUERY: &str = "(UID FLAGS ENVELOPE)";

/// The envelope of one message, as returned by
/// `FETCH (UID FLAGS ENVELOPE)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MessageEnvelope {
    /// Sequence number within the selected mailbox.
    pub seq: u32,
    pub uid: u32,
    pub flags: Vec<Flag>,
    pub date: Option<DateTime<FixedOffset>>,
    pub subject: Option<String>,
    pub from: Vec<String>,
    pub message_id: Option<String>,
}

impl TryFrom<&Fetch> for MessageEnvelope {
    type Error = Error;

    fn try_from(fetch: &Fetch) -> Result<Self> {
        let uid = fetch.uid.ok_or_else(|| {
            Error::Protocol(format!(
                "FETCH response for message {} has no UID",
                fetch.message
            ))
        })?;
        let flags = fetch.flags().map(|f| Flag::from(&f)).collect();

        let mut envelope = Self {
            seq: fetch.message,
            uid,
            flags,
            date: None,
            subject: None,
            from: Vec::new(),
            message_id: None,
        };

        if let Some(env) = fetch.envelope() {
            envelope.date = text(env.date.as_deref()).as_deref().and_then(parse_date);
            envelope.subject = text(env.subject.as_deref());
            envelope.message_id = text(env.message_id.as_deref());
            envelope.from = env
                .from
                .iter()
                .flatten()
                .filter_map(format_address)
                .collect();
        }

        Ok(envelope)
    }
}

fn text(raw: Option<&[u8]>) -> Option<String> {
    raw.map(|bytes| String::from_utf8_lossy(bytes).trim().to_string())
        .filter(|s| !s.is_empty())
}

/// Parse an RFC 2822 `Date:` value; unparseable dates are dropped.
fn parse_date(raw: &str) -> Option<DateTime<FixedOffset>> {
    DateTime::parse_from_rfc2822(raw).ok()
}

/// Render an envelope address as `Name <mailbox@host>` or
/// `mailbox@host`.
fn format_address(addr: &Address<'_>) -> Option<String> {
    let mailbox = text(addr.mailbox.as_deref())?;
    let email = match text(addr.host.as_deref()) {
        Some(host) => format!("{mailbox}@{host}"),
        None => mailbox,
    };

    Some(match text(addr.name.as_deref()) {
        Some(name) => format!("{name} <{email}>"),
        None => email,
    })
}
