use lettre::address::AddressError;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("invalid {role} address {address:?}")]
    Address {
        role: &'static str,
        address: String,
        #[source]
        source: AddressError,
    },
    #[error("failed to build message")]
    Message(#[from] lettre::error::Error),
    #[error("smtp transport error")]
    Transport(#[from] lettre::transport::smtp::Error),
}

/// Coarse classification of a failed dispatch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The message could not be put together from the configuration.
    Configuration,
    /// The relay did not accept the credentials.
    Authentication,
    /// The relay could not be reached or the TLS upgrade failed.
    Connection,
    /// The relay refused the message.
    Rejected,
}

impl Error {
    #[must_use]
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Address { .. } | Self::Message(_) => ErrorKind::Configuration,
            Self::Transport(e) => match e.status() {
                // 530 authentication required, 534 mechanism too weak,
                // 535 invalid credentials (RFC 4954)
                Some(code) if matches!(code.to_string().as_str(), "530" | "534" | "535") => {
                    ErrorKind::Authentication
                }
                Some(_) => ErrorKind::Rejected,
                None if e.is_response() || e.is_client() => ErrorKind::Rejected,
                None => ErrorKind::Connection,
            },
        }
    }
}
