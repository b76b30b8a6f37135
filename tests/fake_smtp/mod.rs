//! Fake SMTP submission server for integration testing
//!
//! Plain TCP only. It answers just enough of RFC 5321 for a client to
//! connect, authenticate with `AUTH XOAUTH2` and quit:
//!
//! ```text
//!   Server:  220 fake.test ESMTP ready
//!   Client:  EHLO client
//!   Server:  250-fake.test
//!   Server:  250 AUTH XOAUTH2
//!   Client:  AUTH XOAUTH2 <base64 response>
//!   Server:  235 2.7.0 Accepted
//!   Client:  NOOP
//!   Server:  250 2.0.0 OK
//!   Client:  QUIT
//!   Server:  221 2.0.0 Bye
//! ```

#![allow(dead_code)]

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

/// A fake SMTP server on localhost with an OS-assigned port.
pub struct FakeSmtpServer {
    port: u16,
    handle: tokio::task::JoinHandle<()>,
}

impl FakeSmtpServer {
    /// Start a server that accepts only `user` with bearer `token`.
    pub async fn start(user: &str, token: &str) -> Self {
        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind to ephemeral port");
        let port = listener.local_addr().unwrap().port();

        let expected = Arc::new(format!("user={user}\x01auth=Bearer {token}\x01\x01"));
        let handle = tokio::spawn(async move {
            while let Ok((stream, _addr)) = listener.accept().await {
                let expected = expected.clone();
                tokio::spawn(async move {
                    let _ = handle_connection(stream, &expected).await;
                });
            }
        });

        Self { port, handle }
    }

    pub const fn port(&self) -> u16 {
        self.port
    }
}

impl Drop for FakeSmtpServer {
    fn drop(&mut self) {
        self.handle.abort();
    }
}

async fn handle_connection(stream: TcpStream, expected: &str) -> std::io::Result<()> {
    let mut reader = BufReader::new(stream);
    reply(&mut reader, "220 fake.test ESMTP ready\r\n").await?;

    loop {
        let mut line = String::new();
        if reader.read_line(&mut line).await? == 0 {
            return Ok(());
        }

        let line = line.trim_end();
        let (verb, arg) = line.split_once(' ').unwrap_or((line, ""));

        match verb.to_ascii_uppercase().as_str() {
            "EHLO" | "HELO" => {
                reply(&mut reader, "250-fake.test\r\n250 AUTH XOAUTH2\r\n").await?;
            }
            "AUTH" => {
                let response = arg
                    .strip_prefix("XOAUTH2 ")
                    .and_then(|encoded| STANDARD.decode(encoded).ok())
                    .and_then(|bytes| String::from_utf8(bytes).ok());
                if response.as_deref() == Some(expected) {
                    reply(&mut reader, "235 2.7.0 Accepted\r\n").await?;
                } else {
                    reply(&mut reader, "535 5.7.8 Authentication failed\r\n").await?;
                }
            }
            "NOOP" => reply(&mut reader, "250 2.0.0 OK\r\n").await?,
            "QUIT" => {
                reply(&mut reader, "221 2.0.0 Bye\r\n").await?;
                return Ok(());
            }
            _ => reply(&mut reader, "502 5.5.2 Command not implemented\r\n").await?,
        }
    }
}

async fn reply(stream: &mut BufReader<TcpStream>, line: &str) -> std::io::Result<()> {
    stream.get_mut().write_all(line.as_bytes()).await?;
    stream.get_mut().flush().await
}
