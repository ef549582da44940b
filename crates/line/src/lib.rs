//! Line oriented helpers shared by the prompt and the test relay.

use tokio::io::{AsyncBufRead, AsyncBufReadExt, AsyncWrite, AsyncWriteExt};
use tracing::debug;

pub async fn write<S: AsyncWrite + Unpin>(
    stream: &mut S,
    src: impl AsRef<[u8]>,
) -> std::io::Result<()> {
    let src = src.as_ref();
    debug!("write: {:?}", String::from_utf8_lossy(src));
    stream.write_all(src).await
}

pub async fn write_flush<S: AsyncWrite + Unpin>(
    stream: &mut S,
    src: impl AsRef<[u8]>,
) -> std::io::Result<()> {
    write(stream, src).await?;
    stream.flush().await
}

#[derive(Debug, thiserror::Error)]
pub enum ReadLineError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("unexpected end of input")]
    Eof,
    #[error("line buffer is not empty")]
    BufferNotEmpty,
}

/// Read a single line into `buf`, without the trailing line terminator.
///
/// A final line that is not terminated is returned as is. Only when
/// nothing at all could be read is [`ReadLineError::Eof`] returned.
/// `buf` must be empty on entry, otherwise nothing is read and
/// [`ReadLineError::BufferNotEmpty`] is returned.
///
/// ```
/// # tokio_test::block_on(async {
/// let mut reader = "Hello\r\nWorld".as_bytes();
/// let mut buf = Vec::new();
///
/// line::read_line(&mut reader, &mut buf).await.unwrap();
/// assert_eq!(buf, b"Hello");
///
/// buf.clear();
/// line::read_line(&mut reader, &mut buf).await.unwrap();
/// assert_eq!(buf, b"World");
///
/// buf.clear();
/// assert!(matches!(
///     line::read_line(&mut reader, &mut buf).await,
///     Err(line::ReadLineError::Eof)
/// ));
/// # });
/// ```
pub async fn read_line<R: AsyncBufRead + Unpin>(
    reader: &mut R,
    buf: &mut Vec<u8>,
) -> Result<(), ReadLineError> {
    if !buf.is_empty() {
        return Err(ReadLineError::BufferNotEmpty);
    }

    if reader.read_until(b'\n', buf).await? == 0 {
        return Err(ReadLineError::Eof);
    }

    debug!("read: {:?}", String::from_utf8_lossy(buf));

    let rpos = buf
        .iter()
        .rposition(|&c| c != b'\r' && c != b'\n')
        .map(|pos| pos + 1)
        .unwrap_or(0);
    buf.truncate(rpos);

    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::io::{AsyncReadExt, AsyncWriteExt, BufReader};

    use super::{read_line, write_flush, ReadLineError};

    #[tokio::test]
    async fn empty_lines() -> anyhow::Result<()> {
        let mut reader = "\n\r\n".as_bytes();
        let mut buf = Vec::new();

        read_line(&mut reader, &mut buf).await?;
        assert!(buf.is_empty());
        read_line(&mut reader, &mut buf).await?;
        assert!(buf.is_empty());

        assert!(matches!(
            read_line(&mut reader, &mut buf).await,
            Err(ReadLineError::Eof)
        ));

        Ok(())
    }

    #[tokio::test]
    async fn keeps_inner_whitespace() {
        let mut reader = "  spaced  out \t\r\n".as_bytes();
        let mut buf = Vec::new();

        read_line(&mut reader, &mut buf).await.unwrap();
        assert_eq!(buf, b"  spaced  out \t");
    }

    #[tokio::test]
    async fn leftover_buffer() -> anyhow::Result<()> {
        let mut reader = "second\n".as_bytes();
        let mut buf = b"first".to_vec();

        assert!(matches!(
            read_line(&mut reader, &mut buf).await,
            Err(ReadLineError::BufferNotEmpty)
        ));
        assert_eq!(buf, b"first");

        buf.clear();
        read_line(&mut reader, &mut buf).await?;
        assert_eq!(buf, b"second");

        Ok(())
    }

    #[tokio::test]
    async fn duplex() -> anyhow::Result<()> {
        let (mut client, server) = tokio::io::duplex(64);
        let mut server = BufReader::new(server);

        client.write_all(b"ping\r\n").await?;

        let mut buf = Vec::new();
        read_line(&mut server, &mut buf).await?;
        assert_eq!(buf, b"ping");

        write_flush(&mut server, "pong\r\n").await?;
        drop(server);

        let mut out = String::new();
        client.read_to_string(&mut out).await?;
        assert_eq!(out, "pong\r\n");

        Ok(())
    }
}
