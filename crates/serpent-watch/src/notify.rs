// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Delivery of encoded messages to a remote process.

use serpent::Term;
use std::io::{self, Write};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::Mutex;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum NotifyError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("receiver for {0} is gone")]
    Disconnected(String),
}

/// Fire-and-forget message delivery.
pub trait Notifier: Send + Sync {
    fn cast(&self, pid: &str, message: &Term) -> Result<(), NotifyError>;
}

/// Writes `pid ! term` lines to stdout.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutNotifier;

impl Notifier for StdoutNotifier {
    fn cast(&self, pid: &str, message: &Term) -> Result<(), NotifyError> {
        let mut out = io::stdout().lock();
        writeln!(out, "{} ! {}", pid, message)?;
        out.flush()?;
        Ok(())
    }
}

/// Forwards casts into an in-process channel.
#[derive(Debug)]
pub struct ChannelNotifier {
    tx: Mutex<Sender<(String, Term)>>,
}

impl ChannelNotifier {
    pub fn new() -> (Self, Receiver<(String, Term)>) {
        let (tx, rx) = mpsc::channel();
        (Self { tx: Mutex::new(tx) }, rx)
    }
}

impl Notifier for ChannelNotifier {
    fn cast(&self, pid: &str, message: &Term) -> Result<(), NotifyError> {
        let tx = self
            .tx
            .lock()
            .map_err(|_| NotifyError::Disconnected(pid.to_string()))?;
        tx.send((pid.to_string(), message.clone()))
            .map_err(|_| NotifyError::Disconnected(pid.to_string()))
    }
}
