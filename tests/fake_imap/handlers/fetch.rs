//! FETCH command handler.
//!
//! Answers `FETCH <set> (UID FLAGS ENVELOPE)` for every message in the
//! selected folder; the sequence set is ignored since the client only
//! ever asks for `1:*`. The envelope is a parenthesised list of ten
//! fields (RFC 3501 Section 7.4.2):
//!
//! ```text
//! * 1 FETCH (UID 7 FLAGS (\Seen) ENVELOPE ("<date>" "<subject>"
//!     (("Alice" NIL "alice" "example.com")) NIL NIL NIL NIL NIL NIL
//!     "<7@fake.test>"))
//! ```
//!
//! A message without a UID is sent without the `UID` item.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::{Mailbox, TestMessage};
use tokio::io::{AsyncRead, AsyncWrite, BufReader};

/// Date every test message carries.
pub const MESSAGE_DATE: &str = "Mon, 01 Jan 2024 12:00:00 +0000";

fn fetch_line(seq: usize, message: &TestMessage) -> String {
    let uid = message
        .uid
        .map(|uid| format!("UID {uid} "))
        .unwrap_or_default();
    let flags = if message.seen { "\\Seen" } else { "" };
    let message_id = message.uid.unwrap_or_default();

    format!(
        "* {seq} FETCH ({uid}FLAGS ({flags}) ENVELOPE (\"{MESSAGE_DATE}\" \"{}\" \
         ((\"Alice\" NIL \"alice\" \"example.com\")) NIL NIL NIL NIL NIL NIL \
         \"<{message_id}@fake.test>\"))\r\n",
        message.subject
    )
}

/// Handle the FETCH command.
pub async fn handle_fetch<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    mailbox: &Mailbox,
    selected_folder: Option<&str>,
    stream: &mut BufReader<S>,
) {
    let Some(folder_name) = selected_folder else {
        let resp = format!("{tag} BAD No folder selected\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    let Some(folder) = mailbox.get_folder(folder_name) else {
        let resp = format!("{tag} BAD Folder not found\r\n");
        let _ = write_line(stream, &resp).await;
        return;
    };

    for (idx, message) in folder.messages.iter().enumerate() {
        // 1-based sequence number
        let line = fetch_line(idx + 1, message);
        if write_line(stream, &line).await.is_err() {
            return;
        }
    }

    let resp = format!("{tag} OK FETCH completed\r\n");
    let _ = write_line(stream, &resp).await;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::BufReader;

    async fn run(tag: &str, mailbox: &Mailbox, selected: Option<&str>) -> String {
        let (client, server) = tokio::io::duplex(4096);
        let mut stream = BufReader::new(server);

        handle_fetch(tag, mailbox, selected, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        tokio::io::AsyncReadExt::read_to_end(&mut BufReader::new(client), &mut buf)
            .await
            .unwrap();
        String::from_utf8(buf).unwrap()
    }

    #[tokio::test]
    async fn sends_one_line_per_message() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .message(42, true, "Hello")
            .message(43, false, "Again")
            .build();

        let output = run("A1", &mailbox, Some("INBOX")).await;

        assert!(output.contains("* 1 FETCH (UID 42 FLAGS (\\Seen) ENVELOPE"));
        assert!(output.contains("* 2 FETCH (UID 43 FLAGS () ENVELOPE"));
        assert!(output.contains("\"Hello\""));
        assert!(output.ends_with("A1 OK FETCH completed\r\n"));
    }

    #[tokio::test]
    async fn broken_message_has_no_uid() {
        let mailbox = MailboxBuilder::new()
            .folder("INBOX")
            .broken_message("Oops")
            .build();

        let output = run("A1", &mailbox, Some("INBOX")).await;

        assert!(output.contains("* 1 FETCH (FLAGS () ENVELOPE"));
        assert!(!output.contains("UID"));
    }

    #[tokio::test]
    async fn no_folder_selected_returns_bad() {
        let mailbox = MailboxBuilder::new().folder("INBOX").build();

        let output = run("A1", &mailbox, None).await;

        assert!(output.contains("A1 BAD No folder selected"));
    }
}
