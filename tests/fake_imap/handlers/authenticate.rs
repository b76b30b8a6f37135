//! AUTHENTICATE command handler.
//!
//! Only the `XOAUTH2` SASL mechanism is supported. The exchange is a
//! single round trip:
//!
//! ```text
//! Client:  A0002 AUTHENTICATE XOAUTH2
//! Server:  +
//! Client:  dXNlcj1...AQE=
//! Server:  A0002 OK AUTHENTICATE completed
//! ```
//!
//! The client's line is the base64 encoding of
//! `user=<user>\x01auth=Bearer <token>\x01\x01`.

use crate::fake_imap::io::write_line;
use crate::fake_imap::mailbox::Mailbox;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, BufReader};

/// Split a decoded XOAUTH2 response into `(user, token)`.
fn parse_xoauth2(decoded: &str) -> Option<(&str, &str)> {
    let mut user = None;
    let mut token = None;
    for part in decoded.split('\x01') {
        if let Some(u) = part.strip_prefix("user=") {
            user = Some(u);
        } else if let Some(t) = part.strip_prefix("auth=Bearer ") {
            token = Some(t);
        }
    }
    Some((user?, token?))
}

/// Handle the AUTHENTICATE command. Returns `true` when the client
/// presented the mailbox's credentials.
pub async fn handle_authenticate<S: AsyncRead + AsyncWrite + Unpin>(
    tag: &str,
    mechanism: &str,
    mailbox: &Mailbox,
    stream: &mut BufReader<S>,
) -> bool {
    if !mechanism.eq_ignore_ascii_case("XOAUTH2") {
        let resp = format!("{tag} NO Unsupported mechanism\r\n");
        let _ = write_line(stream, &resp).await;
        return false;
    }

    // async-imap base64-decodes the challenge, so it must be empty.
    if write_line(stream, "+ \r\n").await.is_err() {
        return false;
    }

    let mut line = String::new();
    if stream.read_line(&mut line).await.is_err() {
        return false;
    }

    let accepted = STANDARD
        .decode(line.trim())
        .ok()
        .and_then(|bytes| String::from_utf8(bytes).ok())
        .is_some_and(|decoded| {
            parse_xoauth2(&decoded) == Some((mailbox.user.as_str(), mailbox.token.as_str()))
        });

    let resp = if accepted {
        format!("{tag} OK AUTHENTICATE completed\r\n")
    } else {
        format!("{tag} NO [AUTHENTICATIONFAILED] Invalid credentials\r\n")
    };
    let _ = write_line(stream, &resp).await;
    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fake_imap::mailbox::MailboxBuilder;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    async fn run(mechanism: &str, client_line: &str) -> (String, bool) {
        let mailbox = MailboxBuilder::new().credentials("u@x.org", "tok").build();
        let (mut client, server) = tokio::io::duplex(1024);
        client.write_all(client_line.as_bytes()).await.unwrap();

        let mut stream = BufReader::new(server);
        let ok = handle_authenticate("A1", mechanism, &mailbox, &mut stream).await;
        drop(stream);

        let mut buf = Vec::new();
        client.read_to_end(&mut buf).await.unwrap();
        (String::from_utf8(buf).unwrap(), ok)
    }

    #[test]
    fn parses_xoauth2_response() {
        assert_eq!(
            parse_xoauth2("user=a@b.c\x01auth=Bearer t0k\x01\x01"),
            Some(("a@b.c", "t0k"))
        );
        assert_eq!(parse_xoauth2("user=a@b.c\x01\x01"), None);
    }

    #[tokio::test]
    async fn accepts_matching_credentials() {
        let line = STANDARD.encode("user=u@x.org\x01auth=Bearer tok\x01\x01") + "\r\n";
        let (output, ok) = run("XOAUTH2", &line).await;
        assert!(ok);
        assert!(output.starts_with("+ \r\n"));
        assert!(output.ends_with("A1 OK AUTHENTICATE completed\r\n"));
    }

    #[tokio::test]
    async fn rejects_wrong_token() {
        let line = STANDARD.encode("user=u@x.org\x01auth=Bearer nope\x01\x01") + "\r\n";
        let (output, ok) = run("XOAUTH2", &line).await;
        assert!(!ok);
        assert!(output.contains("A1 NO [AUTHENTICATIONFAILED]"));
    }

    #[tokio::test]
    async fn rejects_other_mechanisms() {
        let (output, ok) = run("PLAIN", "").await;
        assert!(!ok);
        assert_eq!(output, "A1 NO Unsupported mechanism\r\n");
    }
}
