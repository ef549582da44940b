use lettre::{
    transport::smtp::{
        authentication::Credentials as SmtpCredentials,
        client::{Tls, TlsParameters},
    },
    AsyncSmtpTransport, AsyncTransport, Tokio1Executor,
};
use secrecy::ExposeSecret;
use tracing::{debug, info, instrument};

use crate::{Dispatcher, Error, Outgoing, Receipt, Relay};

/// Submits mail to a [`Relay`] over a fresh connection per message.
#[derive(Debug, Clone, Default)]
pub struct SmtpDispatcher {
    relay: Relay,
}

impl SmtpDispatcher {
    #[must_use]
    pub fn new(relay: Relay) -> Self {
        Self { relay }
    }

    #[must_use]
    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    fn transport(
        &self,
        credentials: &auth::Credentials,
    ) -> Result<AsyncSmtpTransport<Tokio1Executor>, Error> {
        let tls = TlsParameters::new(self.relay.host.clone())?;
        let credentials = SmtpCredentials::new(
            credentials.username.clone(),
            credentials.password.expose_secret().clone(),
        );

        Ok(
            AsyncSmtpTransport::<Tokio1Executor>::builder_dangerous(self.relay.host.as_str())
                .port(self.relay.port)
                .tls(Tls::Opportunistic(tls))
                .credentials(credentials)
                .build(),
        )
    }
}

#[async_trait::async_trait]
impl Dispatcher for SmtpDispatcher {
    #[instrument(skip_all, fields(relay = %self.relay))]
    async fn dispatch(
        &self,
        credentials: auth::Credentials,
        message: Outgoing,
    ) -> Result<Receipt, Error> {
        let (message, message_id) = message.build()?;
        let transport = self.transport(&credentials)?;

        debug!(%message_id, "submitting message");
        let response = transport.send(message).await?;
        let reply = response.first_line().unwrap_or_default().to_owned();
        info!(%message_id, code = %response.code(), %reply, "message accepted");

        Ok(Receipt { message_id, reply })
    }
}
