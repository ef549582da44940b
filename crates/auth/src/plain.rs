//! The `PLAIN` SASL mechanism ([RFC 4616](https://datatracker.ietf.org/doc/html/rfc4616)).

use base64::{engine::general_purpose::STANDARD, Engine as _};

use crate::Credentials;

#[derive(Debug, thiserror::Error)]
pub enum DecodeError {
    #[error("invalid base64")]
    Base64(#[from] base64::DecodeError),
    #[error("invalid utf-8")]
    Utf8(#[from] std::str::Utf8Error),
    #[error("missing username or password")]
    MissingParts,
}

/// Decode plain credentials.
///
/// # Examples
///
/// ```
/// # use auth::plain::{decode, DecodeError};
/// # use secrecy::ExposeSecret;
/// let credentials = decode(b"\0bob\0hunter2")?;
/// assert_eq!(credentials.username, "bob");
/// assert_eq!(credentials.password.expose_secret(), "hunter2");
/// # Ok::<(), DecodeError>(())
/// ```
pub fn decode(data: &[u8]) -> Result<Credentials, DecodeError> {
    let mut parts = std::str::from_utf8(data)?.splitn(3, '\0').skip(1);
    let username = parts.next().ok_or(DecodeError::MissingParts)?;
    let password = parts.next().ok_or(DecodeError::MissingParts)?;

    Ok(Credentials::new(username, password))
}

/// Decode the base64 initial response of an `AUTH PLAIN` command.
///
/// Often, the credentials will be base64-encoded like so:
///
/// ```text
/// C: AUTH PLAIN AGJvYgBodW50ZXIy
/// ```
pub fn decode_base64(response: &str) -> Result<Credentials, DecodeError> {
    decode(&STANDARD.decode(response.trim())?)
}
