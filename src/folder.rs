//! Folder tree types
//!
//! A [`Folder`] is one node of the folder tree rebuilt from the flat
//! mailbox listing. Its [`FolderKind`] comes from the server's
//! special-use tag, except that any folder holding subfolders is a
//! plain [`FolderKind::Folder`].

use serde::Serialize;
use std::fmt;

/// The role a folder plays in the tree.
///
/// # Examples
///
/// ```
/// use goa_mailcheck::FolderKind;
///
/// assert_eq!(FolderKind::from_special_use(Some("\\Sent")), FolderKind::Sent);
/// assert_eq!(FolderKind::from_special_use(Some("\\Flagged")), FolderKind::Regular);
/// assert_eq!(FolderKind::from_special_use(None), FolderKind::Regular);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum FolderKind {
    /// A mailbox without a recognised special use.
    #[default]
    Regular,
    /// A mailbox that contains other mailboxes.
    Folder,
    Inbox,
    Sent,
    Trash,
    Drafts,
    Junk,
    Archive,
    /// The virtual "all mail" mailbox.
    All,
}

impl FolderKind {
    /// Resolve a special-use tag (`\Inbox`, `\Sent`, ...) to a kind.
    ///
    /// Matching is exact; unknown or absent tags are
    /// [`FolderKind::Regular`].
    #[must_use]
    pub fn from_special_use(tag: Option<&str>) -> Self {
        match tag {
            Some("\\Inbox") => Self::Inbox,
            Some("\\Sent") => Self::Sent,
            Some("\\Trash") => Self::Trash,
            Some("\\Drafts") => Self::Drafts,
            Some("\\Junk") => Self::Junk,
            Some("\\Archive") => Self::Archive,
            Some("\\All") => Self::All,
            _ => Self::Regular,
        }
    }

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Regular => "regular",
            Self::Folder => "folder",
            Self::Inbox => "inbox",
            Self::Sent => "sent",
            Self::Trash => "trash",
            Self::Drafts => "drafts",
            Self::Junk => "junk",
            Self::Archive => "archive",
            Self::All => "all",
        }
    }
}

impl fmt::Display for FolderKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A node of the folder tree.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Folder {
    pub name: String,
    pub kind: FolderKind,
    /// Full mailbox path, as used by SELECT.
    pub path: String,
    pub children: Vec<Self>,
    /// Set when another mailbox names this one as its child.
    pub nested: bool,
}

impl Folder {
    /// Depth-first iterator over this folder and all its descendants.
    pub fn walk(&self) -> impl Iterator<Item = &Self> {
        let mut stack = vec![self];
        std::iter::from_fn(move || {
            let next = stack.pop()?;
            stack.extend(next.children.iter().rev());
            Some(next)
        })
    }
}
