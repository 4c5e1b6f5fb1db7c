//! The chunked byte-copy loop.

use tokio::io::{AsyncRead, AsyncReadExt, AsyncWrite, AsyncWriteExt};
use tokio_util::sync::CancellationToken;

/// How a copy run ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum CopyOutcome {
    /// The source reached end of stream and the writer was flushed.
    Completed,
    /// The run's token fired; nothing was written after that.
    Interrupted,
    /// A read, write or flush failed.
    Failed(String),
}

/// Move bytes from `reader` to `writer` in chunks of at most `chunk_size`.
///
/// `on_chunk` runs after each chunk is written. The token is checked after
/// every chunk and also interrupts a pending read.
pub(crate) async fn copy_chunks<R, W, F>(
    reader: &mut R,
    writer: &mut W,
    chunk_size: usize,
    token: &CancellationToken,
    mut on_chunk: F,
) -> CopyOutcome
where
    R: AsyncRead + Unpin + ?Sized,
    W: AsyncWrite + Unpin + ?Sized,
    F: FnMut(usize),
{
    let mut buf = vec![0u8; chunk_size.max(1)];

    loop {
        let read = tokio::select! {
            biased;
            _ = token.cancelled() => return interrupted(writer).await,
            read = reader.read(&mut buf) => read,
        };

        let n = match read {
            Ok(0) => {
                return match writer.flush().await {
                    Ok(()) => CopyOutcome::Completed,
                    Err(e) => CopyOutcome::Failed(format!("flush failed: {}", e)),
                };
            }
            Ok(n) => n,
            Err(e) => return CopyOutcome::Failed(format!("read failed: {}", e)),
        };

        if let Err(e) = writer.write_all(&buf[..n]).await {
            return CopyOutcome::Failed(format!("write failed: {}", e));
        }

        on_chunk(n);

        // Checkpoint
        if token.is_cancelled() {
            return interrupted(writer).await;
        }
    }
}

async fn interrupted<W>(writer: &mut W) -> CopyOutcome
where
    W: AsyncWrite + Unpin + ?Sized,
{
    if let Err(e) = writer.flush().await {
        tracing::warn!("Failed to flush partial download: {}", e);
    }
    CopyOutcome::Interrupted
}
