//! In-memory driver for tests

use crate::driver::{ConnectTarget, Driver};
use crate::sanitize::{escape_string, EscapeMode};
use crate::{Error, Result};
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug, Default)]
pub(crate) struct MemoryDriver {
    fail_open: bool,
    fail_close: bool,
    stall_open: bool,
    opened: AtomicUsize,
    closed: AtomicUsize,
}

#[derive(Debug)]
pub(crate) struct MemoryHandle;

impl MemoryDriver {
    pub(crate) fn failing_open(mut self) -> Self {
        self.fail_open = true;
        self
    }

    /// `open` never completes
    pub(crate) fn stalling_open(mut self) -> Self {
        self.stall_open = true;
        self
    }

    pub(crate) fn failing_close(mut self) -> Self {
        self.fail_close = true;
        self
    }

    pub(crate) fn opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub(crate) fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }
}

impl Driver for MemoryDriver {
    type Handle = MemoryHandle;

    async fn open(&self, target: &ConnectTarget) -> Result<MemoryHandle> {
        if self.stall_open {
            std::future::pending::<()>().await;
        }
        if self.fail_open {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::ConnectionRefused,
                format!("{} refused the connection", target.hostname),
            )));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(MemoryHandle)
    }

    async fn close(&self, _handle: MemoryHandle) -> Result<()> {
        if self.fail_close {
            return Err(Error::Io(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "connection already gone",
            )));
        }
        self.closed.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    fn escape(&self, _handle: &MemoryHandle, text: &str) -> String {
        escape_string(text, EscapeMode::Backslash)
    }
}
