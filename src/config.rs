//! Settings read from the process environment.

use secrecy::SecretString;
use smtp::{message::DEFAULT_SENDER_NAME, Outgoing};
use tracing::debug;

use crate::Draft;

pub const SMTP_USERNAME: &str = "SMTP_USERNAME";
pub const SMTP_PASSWORD: &str = "SMTP_PASSWORD";
pub const SENDER_EMAIL: &str = "SENDER_EMAIL";
pub const RECEIVER_EMAIL: &str = "RECEIVER_EMAIL";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("environment variable {0} is not set")]
    Missing(&'static str),
}

/// The raw settings. Nothing is checked when loading; a missing value only
/// becomes an error once it is needed.
#[derive(Debug, Clone, Default)]
pub struct Config {
    pub username: Option<String>,
    pub password: Option<SecretString>,
    pub sender: Option<String>,
    pub receiver: Option<String>,
}

impl Config {
    pub fn from_env() -> Self {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Build the configuration from any source of variables. Empty values
    /// count as unset.
    pub fn from_lookup(mut lookup: impl FnMut(&str) -> Option<String>) -> Self {
        let mut get = |name: &str| {
            let value = lookup(name).filter(|value| !value.is_empty());
            debug!(variable = name, present = value.is_some(), "read variable");
            value
        };

        Self {
            username: get(SMTP_USERNAME),
            password: get(SMTP_PASSWORD).map(SecretString::new),
            sender: get(SENDER_EMAIL),
            receiver: get(RECEIVER_EMAIL),
        }
    }

    pub fn credentials(&self) -> Result<auth::Credentials, Error> {
        Ok(auth::Credentials {
            username: require(&self.username, SMTP_USERNAME)?.to_owned(),
            password: self
                .password
                .clone()
                .ok_or(Error::Missing(SMTP_PASSWORD))?,
        })
    }

    /// Address the draft from the configured sender to the configured
    /// receiver.
    pub fn outgoing(&self, draft: Draft) -> Result<Outgoing, Error> {
        Ok(Outgoing {
            sender_name: DEFAULT_SENDER_NAME.to_owned(),
            sender: require(&self.sender, SENDER_EMAIL)?.to_owned(),
            recipient: require(&self.receiver, RECEIVER_EMAIL)?.to_owned(),
            subject: draft.subject,
            body: draft.body,
        })
    }
}

fn require<'a>(value: &'a Option<String>, name: &'static str) -> Result<&'a str, Error> {
    value.as_deref().ok_or(Error::Missing(name))
}
