use lettre::{
    message::{header::ContentType, Mailbox},
    Address, Message,
};
use uuid::Uuid;

use crate::Error;

/// Display name used in the `From` header.
pub const DEFAULT_SENDER_NAME: &str = "Ritik";

/// A plain text message with a single recipient.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub sender_name: String,
    pub sender: String,
    pub recipient: String,
    pub subject: String,
    pub body: String,
}

/// What is left of a message once the relay accepted it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Receipt {
    /// The `Message-ID` header of the sent message, angle brackets included.
    pub message_id: String,
    /// First line of the relay's final reply, e.g. `Ok 0109018c...`.
    pub reply: String,
}

fn parse_address(role: &'static str, address: &str) -> Result<Address, Error> {
    address.parse().map_err(|source| Error::Address {
        role,
        address: address.to_owned(),
        source,
    })
}

impl Outgoing {
    /// Build the lettre message along with its freshly generated
    /// `Message-ID`.
    pub(crate) fn build(self) -> Result<(Message, String), Error> {
        let sender = parse_address("sender", &self.sender)?;
        let recipient = parse_address("recipient", &self.recipient)?;
        let message_id = format!("<{}@{}>", Uuid::new_v4(), sender.domain());
        let sender_name = Some(self.sender_name).filter(|name| !name.is_empty());

        let message = Message::builder()
            .from(Mailbox::new(sender_name, sender))
            .to(Mailbox::new(None, recipient))
            .subject(self.subject)
            .message_id(Some(message_id.clone()))
            .header(ContentType::TEXT_PLAIN)
            .body(self.body)?;

        Ok((message, message_id))
    }
}
