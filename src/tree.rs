//! Folder tree reconstruction
//!
//! The server lists mailboxes as a flat, unordered sequence. The tree
//! is rebuilt in two passes over that sequence: the first indexes one
//! node per path, the second links every record that names a parent
//! into that parent's children. Parents may be listed after their
//! children, so no pass relies on ordering.

use crate::folder::{Folder, FolderKind};
use crate::mailbox::MailboxInfo;
use indexmap::IndexMap;
use tracing::warn;

struct Node<'a> {
    name: &'a str,
    kind: FolderKind,
    nested: bool,
    children: Vec<usize>,
}

/// Build the folder forest from a mailbox listing.
///
/// Roots come back in listing order. A record whose `parent_path`
/// names an unknown mailbox is marked nested but attached nowhere, so
/// it does not appear in the result at all. When two records share a
/// path, the later one wins.
///
/// # Examples
///
/// ```
/// use goa_mailcheck::{FolderKind, MailboxInfo, build_folder_tree};
///
/// let listing = [
///     MailboxInfo::new("INBOX", Some("/"), None),
///     MailboxInfo::new("INBOX/2023", Some("/"), None),
/// ];
/// let roots = build_folder_tree(&listing);
///
/// assert_eq!(roots.len(), 1);
/// assert_eq!(roots[0].kind, FolderKind::Folder);
/// assert_eq!(roots[0].children[0].path, "INBOX/2023");
/// ```
#[must_use]
pub fn build_folder_tree(mailboxes: &[MailboxInfo]) -> Vec<Folder> {
    let mut index: IndexMap<&str, Node<'_>> = IndexMap::with_capacity(mailboxes.len());
    for mailbox in mailboxes {
        index.insert(
            mailbox.path.as_str(),
            Node {
                name: mailbox.name.as_str(),
                kind: FolderKind::from_special_use(mailbox.special_use.as_deref()),
                nested: false,
                children: Vec::new(),
            },
        );
    }

    for mailbox in mailboxes {
        let Some(parent_path) = mailbox.parent_path.as_deref() else {
            continue;
        };
        let Some(child) = index.get_index_of(mailbox.path.as_str()) else {
            continue;
        };
        index[child].nested = true;

        let Some(parent) = index.get_mut(parent_path) else {
            warn!(
                "Mailbox {} names unknown parent {}; it will not be shown",
                mailbox.path, parent_path
            );
            continue;
        };
        parent.kind = FolderKind::Folder;
        parent.children.push(child);
    }

    let mut ancestors = Vec::new();
    (0..index.len())
        .filter(|&i| !index[i].nested)
        .filter_map(|i| materialize(&index, i, &mut ancestors))
        .collect()
}

/// Turn the node at `at` and its subtree into owned [`Folder`]s.
///
/// `ancestors` holds the chain of nodes above `at`; a child already on
/// that chain is skipped so a malformed listing cannot loop forever.
fn materialize(
    index: &IndexMap<&str, Node<'_>>,
    at: usize,
    ancestors: &mut Vec<usize>,
) -> Option<Folder> {
    let (path, node) = index.get_index(at)?;

    ancestors.push(at);
    let mut children = Vec::with_capacity(node.children.len());
    for &child in &node.children {
        if !ancestors.contains(&child) {
            children.extend(materialize(index, child, ancestors));
        }
    }
    ancestors.pop();

    Some(Folder {
        name: node.name.to_string(),
        kind: node.kind,
        path: (*path).to_string(),
        children,
        nested: node.nested,
    })
}
