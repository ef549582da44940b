//! SMTP submission: the relay endpoint, the outgoing message and the
//! [`Dispatcher`] that hands it to the relay.

#![warn(clippy::pedantic)]

use std::fmt;

pub mod client;
mod error;
pub mod message;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::SmtpDispatcher;
pub use error::{Error, ErrorKind};
pub use message::{Outgoing, Receipt};

/// Amazon SES submission endpoint in `ap-south-1`.
pub const DEFAULT_HOST: &str = "email-smtp.ap-south-1.amazonaws.com";

/// The mail submission port ([RFC 6409](https://datatracker.ietf.org/doc/html/rfc6409)).
pub const SUBMISSION_PORT: u16 = 587;

/// Where to submit mail.
///
/// The connection always starts in plain text and is upgraded with
/// `STARTTLS` when the relay offers it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relay {
    pub host: String,
    pub port: u16,
}

impl Relay {
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
        }
    }
}

impl Default for Relay {
    fn default() -> Self {
        Self::new(DEFAULT_HOST, SUBMISSION_PORT)
    }
}

impl fmt::Display for Relay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.host, self.port)
    }
}

/// Sends a single message on behalf of the given credentials.
#[async_trait::async_trait]
pub trait Dispatcher: Send + Sync {
    async fn dispatch(
        &self,
        credentials: auth::Credentials,
        message: Outgoing,
    ) -> Result<Receipt, Error>;
}
