//! Asking the user for input, one line at a time.

use line::{read_line, write_flush, ReadLineError};
use tokio::io::{AsyncBufRead, AsyncWrite};
use tracing::instrument;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("input ended before an answer was given")]
    Eof,
    #[error("answer is not valid utf-8")]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl From<ReadLineError> for Error {
    fn from(e: ReadLineError) -> Self {
        match e {
            ReadLineError::Io(e) => Self::Io(e),
            ReadLineError::Eof => Self::Eof,
            e @ ReadLineError::BufferNotEmpty => {
                Self::Io(std::io::Error::new(std::io::ErrorKind::InvalidInput, e))
            }
        }
    }
}

pub struct Prompt<R, W> {
    reader: R,
    writer: W,
}

impl<R: AsyncBufRead + Unpin, W: AsyncWrite + Unpin> Prompt<R, W> {
    pub fn new(reader: R, writer: W) -> Self {
        Self { reader, writer }
    }

    /// Print `question` and wait for a line of input. The answer is
    /// returned verbatim, minus the line terminator.
    #[instrument(skip(self))]
    pub async fn ask(&mut self, question: &str) -> Result<String, Error> {
        write_flush(&mut self.writer, question).await?;

        let mut buf = Vec::new();
        read_line(&mut self.reader, &mut buf).await?;
        Ok(String::from_utf8(buf)?)
    }

    #[cfg(test)]
    fn into_inner(self) -> (R, W) {
        (self.reader, self.writer)
    }
}
