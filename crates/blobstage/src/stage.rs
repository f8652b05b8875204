// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Local stages holding a full copy of a remote object
//!
//! A stage is written once (the download), sealed, and then read through a
//! [`StagedSource`] that the parquet decoder can seek freely. The file
//! variant is the only code that touches the temp directory.

use crate::policy::StagingDecision;
use crate::progress::Progress;
use crate::Result;
use bytes::Bytes;
use parquet::file::reader::{ChunkReader, Length};
use std::fs::File;
use std::io::{Read, Seek, SeekFrom};
use std::path::Path;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tempfile::TempPath;
use tokio::io::{AsyncSeekExt, AsyncWrite, AsyncWriteExt};

const TEMP_PREFIX: &str = "blobstage-";
const TEMP_SUFFIX: &str = ".parquet";

/// Growable in-memory buffer, frozen into `Bytes` when sealed.
#[derive(Debug, Default)]
pub struct MemoryStage {
    buffer: Vec<u8>,
    sealed: Option<Bytes>,
}

/// Uniquely named temporary file, removed on release.
#[derive(Debug)]
pub struct FileStage {
    file: Option<tokio::fs::File>,
    path: Option<TempPath>,
}

#[derive(Debug)]
pub enum Stage {
    Memory(MemoryStage),
    File(FileStage),
}

impl Stage {
    /// Allocate an empty stage for an object of `expected_len` bytes.
    /// `dir` overrides the platform temp directory for file stages.
    pub fn allocate(decision: StagingDecision, expected_len: u64, dir: Option<&Path>) -> Result<Self> {
        match decision {
            StagingDecision::InMemory => {
                let capacity = usize::try_from(expected_len).unwrap_or(0);
                Ok(Stage::Memory(MemoryStage {
                    buffer: Vec::with_capacity(capacity),
                    sealed: None,
                }))
            }
            StagingDecision::TemporaryFile => {
                let mut builder = tempfile::Builder::new();
                let _ = builder.prefix(TEMP_PREFIX).suffix(TEMP_SUFFIX);
                let named = match dir {
                    Some(dir) => builder.tempfile_in(dir)?,
                    None => builder.tempfile()?,
                };
                let (file, path) = named.into_parts();
                Ok(Stage::File(FileStage {
                    file: Some(tokio::fs::File::from_std(file)),
                    path: Some(path),
                }))
            }
        }
    }

    #[must_use]
    pub fn decision(&self) -> StagingDecision {
        match self {
            Stage::Memory(_) => StagingDecision::InMemory,
            Stage::File(_) => StagingDecision::TemporaryFile,
        }
    }

    /// Path of the backing file, for file stages.
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        match self {
            Stage::Memory(_) => None,
            Stage::File(stage) => stage.path.as_deref(),
        }
    }

    /// Finish writing, rewind to position 0 and hand out a readable view.
    pub async fn seal(&mut self) -> Result<StagedSource> {
        match self {
            Stage::Memory(stage) => {
                let bytes = match &stage.sealed {
                    Some(bytes) => bytes.clone(),
                    None => {
                        let bytes = Bytes::from(std::mem::take(&mut stage.buffer));
                        stage.sealed = Some(bytes.clone());
                        bytes
                    }
                };
                Ok(StagedSource::Memory(bytes))
            }
            Stage::File(stage) => {
                let file = stage.file.as_mut().ok_or_else(|| {
                    std::io::Error::other("file stage already released")
                })?;
                file.flush().await?;
                let _ = file.seek(SeekFrom::Start(0)).await?;
                let mut reader = file.try_clone().await?.into_std().await;
                let _ = reader.seek(SeekFrom::Start(0))?;
                Ok(StagedSource::File(Arc::new(reader)))
            }
        }
    }

    /// Close the file handle, then delete the file. Cleanup faults are
    /// reported through `progress` and never returned.
    pub fn release(self, progress: &Progress) {
        match self {
            Stage::Memory(_) => {}
            Stage::File(mut stage) => {
                drop(stage.file.take());
                if let Some(path) = stage.path.take() {
                    let display = path.display().to_string();
                    match path.close() {
                        Ok(()) => progress.report(&format!("Deleted Temp File [{display}]")),
                        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {}
                        Err(e) => progress.fault(&format!(
                            "Failed to delete Temp File [{display}]: {e}"
                        )),
                    }
                }
            }
        }
    }
}

impl AsyncWrite for Stage {
    fn poll_write(
        self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &[u8],
    ) -> Poll<std::io::Result<usize>> {
        match self.get_mut() {
            Stage::Memory(stage) => {
                if stage.sealed.is_some() {
                    return Poll::Ready(Err(sealed_error()));
                }
                Pin::new(&mut stage.buffer).poll_write(cx, buf)
            }
            Stage::File(stage) => match stage.file.as_mut() {
                Some(file) => Pin::new(file).poll_write(cx, buf),
                None => Poll::Ready(Err(sealed_error())),
            },
        }
    }

    fn poll_flush(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        match self.get_mut() {
            Stage::Memory(_) => Poll::Ready(Ok(())),
            Stage::File(stage) => match stage.file.as_mut() {
                Some(file) => Pin::new(file).poll_flush(cx),
                None => Poll::Ready(Ok(())),
            },
        }
    }

    fn poll_shutdown(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<std::io::Result<()>> {
        self.poll_flush(cx)
    }
}

fn sealed_error() -> std::io::Error {
    std::io::Error::other("stage is no longer writable")
}

/// Read-only, seekable view of a sealed stage.
///
/// Cloning is cheap: memory stages share the frozen buffer and file
/// stages share one duplicated handle.
#[derive(Debug, Clone)]
pub enum StagedSource {
    Memory(Bytes),
    File(Arc<File>),
}

impl Length for StagedSource {
    fn len(&self) -> u64 {
        match self {
            StagedSource::Memory(bytes) => <Bytes as Length>::len(bytes),
            StagedSource::File(file) => <File as Length>::len(file),
        }
    }
}

impl ChunkReader for StagedSource {
    type T = Box<dyn Read + Send>;

    fn get_read(&self, start: u64) -> parquet::errors::Result<Self::T> {
        match self {
            StagedSource::Memory(bytes) => Ok(Box::new(<Bytes as ChunkReader>::get_read(bytes, start)?)),
            StagedSource::File(file) => Ok(Box::new(<File as ChunkReader>::get_read(file, start)?)),
        }
    }

    fn get_bytes(&self, start: u64, length: usize) -> parquet::errors::Result<Bytes> {
        match self {
            StagedSource::Memory(bytes) => <Bytes as ChunkReader>::get_bytes(bytes, start, length),
            StagedSource::File(file) => <File as ChunkReader>::get_bytes(file, start, length),
        }
    }
}
