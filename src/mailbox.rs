//! Mailbox metadata from the IMAP LIST response

use async_imap::types::{Name, NameAttribute};
use serde::Serialize;

const INBOX: &str = "INBOX";

/// One mailbox as reported by the server.
///
/// `name` is the last hierarchy segment of `path`; `parent_path` is
/// everything before it. Top-level mailboxes have no parent.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MailboxInfo {
    pub path: String,
    pub name: String,
    pub delimiter: Option<String>,
    /// RFC 6154 special-use attribute, e.g. `\Sent`.
    pub special_use: Option<String>,
    pub parent_path: Option<String>,
}

impl MailboxInfo {
    /// Build a record from the raw pieces of a LIST line.
    ///
    /// The INBOX (matched case-insensitively) always gets the `\Inbox`
    /// special use unless the server tagged it otherwise.
    #[must_use]
    pub fn new(path: &str, delimiter: Option<&str>, special_use: Option<&str>) -> Self {
        let (parent_path, name) = delimiter
            .filter(|d| !d.is_empty())
            .and_then(|delim| path.rsplit_once(delim))
            .filter(|(parent, _)| !parent.is_empty())
            .map_or((None, path), |(parent, name)| {
                (Some(parent.to_string()), name)
            });

        let special_use = special_use.map(str::to_string).or_else(|| {
            path.eq_ignore_ascii_case(INBOX)
                .then(|| "\\Inbox".to_string())
        });

        Self {
            path: path.to_string(),
            name: name.to_string(),
            delimiter: delimiter.map(str::to_string),
            special_use,
            parent_path,
        }
    }

    /// Convert a LIST response entry.
    ///
    /// Servers without SPECIAL-USE send no role attributes; for those, a
    /// top-level mailbox (or a direct child of INBOX) with a well-known
    /// name such as `Sent Items` or `Spam` gets the matching tag.
    #[must_use]
    pub fn from_name(name: &Name) -> Self {
        let special_use = name.attributes().iter().find_map(special_use_tag);
        let mut info = Self::new(name.name(), name.delimiter(), special_use);
        if info.special_use.is_none() && info.is_top_level() {
            info.special_use = special_use_by_name(&info.name).map(str::to_string);
        }
        info
    }

    fn is_top_level(&self) -> bool {
        self.parent_path
            .as_deref()
            .is_none_or(|parent| parent.eq_ignore_ascii_case(INBOX))
    }
}

/// Guess a special-use tag from a mailbox name (case-insensitive).
fn special_use_by_name(name: &str) -> Option<&'static str> {
    const NAMES: &[(&str, &[&str])] = &[
        (
            "\\Sent",
            &["sent", "sent items", "sent mail", "sent messages", "gesendet"],
        ),
        ("\\Drafts", &["drafts", "draft", "entw\u{fc}rfe"]),
        (
            "\\Trash",
            &["trash", "bin", "deleted", "deleted items", "deleted messages"],
        ),
        (
            "\\Junk",
            &["junk", "spam", "junk e-mail", "junk email", "bulk mail"],
        ),
        ("\\Archive", &["archive", "archives"]),
    ];

    let lower = name.to_lowercase();
    NAMES
        .iter()
        .find(|(_, names)| names.contains(&lower.as_str()))
        .map(|(tag, _)| *tag)
}

/// Map a LIST attribute to its special-use tag, if it is one.
fn special_use_tag(attr: &NameAttribute<'_>) -> Option<&'static str> {
    match attr {
        NameAttribute::All => Some("\\All"),
        NameAttribute::Archive => Some("\\Archive"),
        NameAttribute::Drafts => Some("\\Drafts"),
        NameAttribute::Junk => Some("\\Junk"),
        NameAttribute::Sent => Some("\\Sent"),
        NameAttribute::Trash => Some("\\Trash"),
        NameAttribute::Extension(ext) => match ext.as_ref() {
            "\\Inbox" => Some("\\Inbox"),
            // Older servers (Gmail among them) still send \Spam
            "\\Spam" => Some("\\Junk"),
            _ => None,
        },
        _ => None,
    }
}
