//! Page output file
//!
//! One JSON object per line, flushed after every page so a crash or a
//! deadline leaves every received page on disk.

use std::path::Path;

use tokio::fs::File;
use tokio::io::{AsyncWrite, AsyncWriteExt, BufWriter};

use super::ClientError;
use crate::models::PageResult;

/// Line-delimited JSON writer for received pages
pub struct NdjsonWriter<W: AsyncWrite + Unpin> {
    inner: BufWriter<W>,
    lines: u64,
}

impl NdjsonWriter<File> {
    /// Create (or truncate) the output file
    pub async fn create(path: impl AsRef<Path>) -> Result<Self, ClientError> {
        let file = File::create(path.as_ref()).await?;
        Ok(Self::new(file))
    }
}

impl<W: AsyncWrite + Unpin> NdjsonWriter<W> {
    pub fn new(writer: W) -> Self {
        Self {
            inner: BufWriter::new(writer),
            lines: 0,
        }
    }

    /// Append one page and flush it
    pub async fn write_page(&mut self, page: &PageResult) -> Result<(), ClientError> {
        let mut line = serde_json::to_vec(page)?;
        line.push(b'\n');

        self.inner.write_all(&line).await?;
        self.inner.flush().await?;
        self.lines += 1;
        Ok(())
    }

    pub async fn flush(&mut self) -> Result<(), ClientError> {
        self.inner.flush().await?;
        Ok(())
    }

    /// Pages written so far
    pub fn lines(&self) -> u64 {
        self.lines
    }

    pub fn into_inner(self) -> W {
        self.inner.into_inner()
    }
}
