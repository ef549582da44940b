//! A scripted relay on the loopback interface, for exercising
//! [`SmtpDispatcher`](crate::SmtpDispatcher) end to end.
//!
//! The relay accepts a single connection, never offers `STARTTLS` and only
//! knows the `PLAIN` mechanism.

mod command;

use std::io::ErrorKind;

use lettre::Address;
use line::{read_line, write_flush, ReadLineError};
use secrecy::ExposeSecret;
use tokio::{
    io::{AsyncRead, AsyncWrite, BufReader},
    net::TcpListener,
};
use tracing::{debug, info, instrument};

use self::command::Command;
use crate::Relay;

pub const HOSTNAME: &str = "relay.test";

/// How the relay treats its client.
#[derive(Debug, Clone)]
pub struct Policy {
    pub username: String,
    pub password: String,
    /// Answer every `RCPT` with a permanent failure.
    pub reject_recipients: bool,
}

impl Policy {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            reject_recipients: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Received {
    pub from: Address,
    pub recipients: Vec<Address>,
    /// Message content with the dot-stuffing removed, lines joined by CRLF.
    pub data: String,
}

/// Everything the relay saw during a session.
#[derive(Debug, Default)]
pub struct Transcript {
    pub authenticated: Option<String>,
    pub messages: Vec<Received>,
}

pub struct TestRelay {
    listener: TcpListener,
    policy: Policy,
}

impl TestRelay {
    pub async fn bind(policy: Policy) -> std::io::Result<Self> {
        let listener = TcpListener::bind("127.0.0.1:0").await?;
        info!("Binding {}", listener.local_addr()?);
        Ok(Self { listener, policy })
    }

    pub fn relay(&self) -> std::io::Result<Relay> {
        let addr = self.listener.local_addr()?;
        Ok(Relay::new(addr.ip().to_string(), addr.port()))
    }

    /// Serve one client until it quits or hangs up.
    #[instrument(skip_all)]
    pub async fn serve_one(self) -> std::io::Result<Transcript> {
        let (stream, addr) = self.listener.accept().await?;
        info!("Got connection from: {}", addr);

        Session::new(stream, &self.policy).run().await
    }
}

struct Session<'a, IO> {
    stream: BufReader<IO>,
    policy: &'a Policy,
    envelope: Option<(Address, Vec<Address>)>,
    transcript: Transcript,
}

impl<'a, IO: AsyncRead + AsyncWrite + Unpin> Session<'a, IO> {
    fn new(stream: IO, policy: &'a Policy) -> Self {
        Self {
            stream: BufReader::new(stream),
            policy,
            envelope: None,
            transcript: Transcript::default(),
        }
    }

    async fn reply(&mut self, line: impl AsRef<[u8]>) -> std::io::Result<()> {
        write_flush(&mut self.stream, line).await
    }

    /// Read the next line into `buf`. Returns `false` once the client is gone.
    async fn next_line(&mut self, buf: &mut Vec<u8>) -> std::io::Result<bool> {
        buf.clear();
        match read_line(&mut self.stream, buf).await {
            Ok(()) => Ok(true),
            Err(ReadLineError::Eof) => Ok(false),
            Err(ReadLineError::Io(e)) if e.kind() == ErrorKind::ConnectionReset => Ok(false),
            Err(ReadLineError::Io(e)) => Err(e),
            Err(e @ ReadLineError::BufferNotEmpty) => {
                Err(std::io::Error::new(ErrorKind::InvalidInput, e))
            }
        }
    }

    async fn run(mut self) -> std::io::Result<Transcript> {
        self.reply(format!("220 {HOSTNAME} ESMTP ready\r\n")).await?;

        let mut buf = Vec::new();
        while self.next_line(&mut buf).await? {
            let Ok(cmd) = Command::try_from(buf.as_slice()) else {
                self.reply("500 5.5.2 syntax error\r\n").await?;
                continue;
            };

            match cmd {
                Command::Helo { domain } => {
                    debug!(?domain, "received helo");
                    self.envelope = None;
                    self.reply(format!("250 {HOSTNAME}\r\n")).await?;
                }
                Command::Ehlo { domain } => {
                    debug!(?domain, "received ehlo");
                    self.envelope = None;
                    self.reply(format!("250-{HOSTNAME}\r\n250 AUTH PLAIN\r\n"))
                        .await?;
                }
                Command::Auth {
                    mechanism,
                    initial_response,
                } => self.auth(&mechanism, initial_response).await?,
                Command::Mail { from } => {
                    if self.transcript.authenticated.is_none() {
                        self.reply("530 5.7.0 authentication required\r\n").await?;
                    } else {
                        self.envelope = Some((from, Vec::new()));
                        self.reply("250 2.1.0 ok\r\n").await?;
                    }
                }
                Command::Rcpt { to } => {
                    let reply = match &mut self.envelope {
                        None => "503 5.5.1 need MAIL command\r\n",
                        Some(_) if self.policy.reject_recipients => {
                            "554 5.7.1 recipient rejected\r\n"
                        }
                        Some((_, recipients)) => {
                            recipients.push(to);
                            "250 2.1.5 ok\r\n"
                        }
                    };
                    self.reply(reply).await?;
                }
                Command::Data => self.data().await?,
                Command::Rset => {
                    self.envelope = None;
                    self.reply("250 2.0.0 ok\r\n").await?;
                }
                Command::Noop => self.reply("250 2.0.0 ok\r\n").await?,
                Command::Quit => {
                    // the client may hang up before reading this
                    self.reply("221 2.0.0 bye\r\n").await.ok();
                    break;
                }
            }
        }

        Ok(self.transcript)
    }

    async fn auth(
        &mut self,
        mechanism: &str,
        initial_response: Option<String>,
    ) -> std::io::Result<()> {
        if mechanism != "PLAIN" {
            return self
                .reply("504 5.5.4 unrecognized authentication type\r\n")
                .await;
        }

        let response = match initial_response {
            Some(response) => response,
            None => {
                self.reply("334 \r\n").await?;
                let mut buf = Vec::new();
                if !self.next_line(&mut buf).await? {
                    return Ok(());
                }
                String::from_utf8_lossy(&buf).into_owned()
            }
        };

        match auth::plain::decode_base64(&response) {
            Ok(credentials)
                if credentials.username == self.policy.username
                    && credentials.password.expose_secret() == &self.policy.password =>
            {
                debug!(username = %credentials.username, "authenticated");
                self.transcript.authenticated = Some(credentials.username);
                self.reply("235 2.7.0 authentication successful\r\n").await
            }
            Ok(_) => {
                self.reply("535 5.7.8 authentication credentials invalid\r\n")
                    .await
            }
            Err(e) => {
                debug!(%e, "malformed PLAIN response");
                self.reply("501 5.5.2 cannot decode response\r\n").await
            }
        }
    }

    async fn data(&mut self) -> std::io::Result<()> {
        let (from, recipients) = match self.envelope.take() {
            None => return self.reply("503 5.5.1 need MAIL command\r\n").await,
            Some((from, recipients)) if recipients.is_empty() => {
                self.envelope = Some((from, recipients));
                return self.reply("554 5.5.1 no valid recipients\r\n").await;
            }
            Some(envelope) => envelope,
        };

        self.reply("354 end data with <CR><LF>.<CR><LF>\r\n").await?;

        let mut lines = Vec::new();
        let mut buf = Vec::new();
        loop {
            if !self.next_line(&mut buf).await? {
                return Err(ErrorKind::UnexpectedEof.into());
            }
            if buf == b"." {
                break;
            }
            // lines starting with a dot are escaped with another one (RFC 5321)
            let line = buf.strip_prefix(b".").unwrap_or(&buf[..]);
            lines.push(String::from_utf8_lossy(line).into_owned());
        }

        let queue_id = format!("relay-{}", self.transcript.messages.len() + 1);
        debug!(%queue_id, %from, ?recipients, "message received");
        self.transcript.messages.push(Received {
            from,
            recipients,
            data: lines.join("\r\n"),
        });

        self.reply(format!("250 Ok {queue_id}\r\n")).await
    }
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt};

    use super::{Policy, Session};

    #[tokio::test]
    async fn scripted_session() -> anyhow::Result<()> {
        let (mut client, server) = tokio::io::duplex(8192);
        let policy = Policy::new("bob", "hunter2");

        client.write_all(b"EHLO client.example\r\n").await?;
        client.write_all(b"MAIL FROM:<a@x.com>\r\n").await?;
        client.write_all(b"AUTH PLAIN AGJvYgBodW50ZXIy\r\n").await?;
        client.write_all(b"MAIL FROM:<a@x.com>\r\n").await?;
        client.write_all(b"RCPT TO:<b@x.com>\r\n").await?;
        client.write_all(b"DATA\r\n").await?;
        client.write_all(b"Subject: hi\r\n\r\n..leading dot\r\n.\r\n").await?;
        client.write_all(b"QUIT\r\n").await?;

        let transcript = Session::new(server, &policy).run().await?;

        let mut out = String::new();
        client.read_to_string(&mut out).await?;
        let codes: Vec<_> = out.lines().map(|l| &l[..4]).collect();
        assert_eq!(
            codes,
            ["220 ", "250-", "250 ", "530 ", "235 ", "250 ", "250 ", "354 ", "250 ", "221 "]
        );

        assert_eq!(transcript.authenticated.as_deref(), Some("bob"));
        assert_eq!(transcript.messages.len(), 1);
        assert_eq!(transcript.messages[0].data, "Subject: hi\r\n\r\n.leading dot");

        Ok(())
    }
}
