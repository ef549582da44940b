use secrecy::SecretString;

#[cfg(feature = "plain")]
pub mod plain;

/// Username and password used to log in to a relay.
///
/// The password is redacted from the `Debug` output.
#[derive(Debug, Clone)]
pub struct Credentials {
    pub username: String,
    pub password: SecretString,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::new(password.into()),
        }
    }
}
