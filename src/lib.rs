//! Prompt for a subject and a body, then mail them through a relay.

pub mod config;
pub mod prompt;

use line::write_flush;
use smtp::{Dispatcher, Receipt};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::{debug, info, instrument};

pub use config::Config;
pub use prompt::Prompt;

pub const SUBJECT_QUESTION: &str = "Enter the subject of the mail: ";
pub const TEXT_QUESTION: &str = "Enter the text of the mail: ";

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("failed to read from prompt")]
    Prompt(#[from] prompt::Error),
    #[error(transparent)]
    Config(#[from] config::Error),
    #[error("failed to send mail")]
    Dispatch(#[from] smtp::Error),
    #[error("failed to write output")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// The dispatch error classification, if this error has one.
    pub fn kind(&self) -> Option<smtp::ErrorKind> {
        match self {
            Self::Config(_) => Some(smtp::ErrorKind::Configuration),
            Self::Dispatch(e) => Some(e.kind()),
            Self::Prompt(_) | Self::Io(_) => None,
        }
    }
}

/// What the user typed in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Draft {
    pub subject: String,
    pub body: String,
}

impl Draft {
    /// Ask for the subject, then for the text.
    ///
    /// ```
    /// # use mailprompt::{Draft, Prompt};
    /// # tokio_test::block_on(async {
    /// let mut output = Vec::new();
    /// let mut prompt = Prompt::new("Hello\nWorld\n".as_bytes(), &mut output);
    ///
    /// let draft = Draft::ask(&mut prompt).await.unwrap();
    /// assert_eq!(draft.subject, "Hello");
    /// assert_eq!(draft.body, "World");
    /// # });
    /// ```
    pub async fn ask<R, W>(prompt: &mut Prompt<R, W>) -> Result<Self, prompt::Error>
    where
        R: AsyncBufRead + Unpin,
        W: AsyncWrite + Unpin,
    {
        let subject = prompt.ask(SUBJECT_QUESTION).await?;
        let body = prompt.ask(TEXT_QUESTION).await?;
        Ok(Self { subject, body })
    }
}

/// Run the whole interaction: two questions on `input`/`output`, one
/// message through `dispatcher`, and a confirmation line on `output`.
///
/// `input` is dropped as soon as both answers are in, whatever happens
/// afterwards.
#[instrument(skip_all)]
pub async fn run<R, W, D>(
    config: &Config,
    input: R,
    mut output: W,
    dispatcher: &D,
) -> Result<Receipt, Error>
where
    R: AsyncBufRead + Unpin,
    W: AsyncWrite + Unpin,
    D: Dispatcher + ?Sized,
{
    let draft = {
        let mut prompt = Prompt::new(input, &mut output);
        Draft::ask(&mut prompt).await?
    };
    debug!(
        subject_len = draft.subject.len(),
        body_len = draft.body.len(),
        "draft complete"
    );

    let credentials = config.credentials()?;
    let message = config.outgoing(draft)?;

    let receipt = dispatcher.dispatch(credentials, message).await?;
    info!(message_id = %receipt.message_id, "message sent");

    write_flush(&mut output, format!("Message sent: {}\n", receipt.message_id)).await?;

    Ok(receipt)
}
