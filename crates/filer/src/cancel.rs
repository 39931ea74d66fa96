// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

//! Cancellation for filer operations.
//!
//! [`CancellableFiler`] wraps any filer so that every call gives up with
//! [`Error::Cancelled`] once the token fires. Readers flowing in or out are
//! woken by the cancel, so a read stalled on the network fails promptly.

use crate::error::{Error, Result};
use crate::filer::{DeleteMode, FileInfo, FileReader, Filer, WriteMode};
use async_trait::async_trait;
use std::future::Future;
use std::pin::Pin;
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};
use tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned};

pub struct CancellableFiler {
    inner: Box<dyn Filer>,
    token: CancellationToken,
}

impl CancellableFiler {
    #[must_use]
    pub fn new(inner: Box<dyn Filer>, token: CancellationToken) -> Self {
        Self { inner, token }
    }

    async fn race<T, F>(&self, op: F) -> Result<T>
    where
        F: Future<Output = Result<T>> + Send,
    {
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(Error::Cancelled),
            result = op => result,
        }
    }
}

#[async_trait]
impl Filer for CancellableFiler {
    async fn write(&self, name: &str, reader: FileReader, mode: WriteMode) -> Result<()> {
        let reader = CancellableReader::wrap(reader, self.token.clone());
        self.race(self.inner.write(name, reader, mode)).await
    }

    async fn read(&self, name: &str) -> Result<FileReader> {
        let reader = self.race(self.inner.read(name)).await?;
        Ok(CancellableReader::wrap(reader, self.token.clone()))
    }

    async fn delete(&self, name: &str, mode: DeleteMode) -> Result<()> {
        self.race(self.inner.delete(name, mode)).await
    }

    async fn read_dir(&self, name: &str) -> Result<Vec<FileInfo>> {
        self.race(self.inner.read_dir(name)).await
    }

    async fn mkdir(&self, name: &str) -> Result<()> {
        self.race(self.inner.mkdir(name)).await
    }

    async fn stat(&self, name: &str) -> Result<FileInfo> {
        self.race(self.inner.stat(name)).await
    }
}

/// A reader that fails with `Cancelled` once its token fires
pub struct CancellableReader {
    inner: FileReader,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

impl CancellableReader {
    #[must_use]
    pub fn wrap(inner: FileReader, token: CancellationToken) -> FileReader {
        Box::pin(Self {
            inner,
            cancelled: Box::pin(token.cancelled_owned()),
        })
    }
}

impl AsyncRead for CancellableReader {
    fn poll_read(
        mut self: Pin<&mut Self>,
        cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<std::io::Result<()>> {
        // Registers the waker so a cancel interrupts a pending read
        if self.cancelled.as_mut().poll(cx).is_ready() {
            return Poll::Ready(Err(Error::Cancelled.into_io()));
        }
        self.inner.as_mut().poll_read(cx, buf)
    }
}
