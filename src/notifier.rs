/*
 * This file is part of Rustpio.
 *
 * Copyright (C) 2026 Rustpio contributors
 *
 * Rustpio is free software: you can redistribute it and/or modify
 * it under the terms of the GNU General Public License as published by
 * the Free Software Foundation, either version 3 of the License, or
 * (at your option) any later version.
 *
 * Rustpio is distributed in the hope that it will be useful,
 * but WITHOUT ANY WARRANTY; without even the implied warranty of
 * MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE. See the
 * GNU General Public License for more details.
 *
 * You should have received a copy of the GNU General Public License
 * along with Rustpio. If not, see <https://www.gnu.org/licenses/>.
 */

//! Notification channels
//!
//! A [`Notifier`] owns one driver notification handle and the readable
//! pipe bound to it at `<prefix><handle>`. The driver appends one 12-byte
//! record per monitored level change (plus periodic watchdog records);
//! [`NotificationStream`] buffers partial reads so a record is never
//! interpreted before all of it has arrived.
//!
//! Records for a single channel arrive in non-decreasing tick order.
//! Consumers recover per-pin transitions by diffing `level` against the
//! previous record, restricted to the monitored bitmask; see
//! [`rp_protocol::level_transitions`].

use std::fs::OpenOptions;
use std::io::{self, Read};
use std::os::unix::fs::OpenOptionsExt;
use std::sync::Arc;

use tracing::debug;

use rp_error::{Result, RustpioError};
use rp_protocol::{Notification, NOTIFICATION_LENGTH};

use crate::constants::DEFAULT_NOTIFY_BUFFER_BYTES;
use crate::driver::{self, GpioDriver};
use crate::settings::Settings;

/// Configuration for opening a [`Notifier`]
pub struct NotifierOptions {
    /// Buffer size requested from the driver
    pub buffer_bytes: u32,
    /// Bitmask to start monitoring immediately
    pub bits: Option<u32>,
    /// Pipe path prefix override; defaults to the settings value
    pub pipe_prefix: Option<String>,
}

impl Default for NotifierOptions {
    fn default() -> Self {
        Self {
            buffer_bytes: DEFAULT_NOTIFY_BUFFER_BYTES,
            bits: None,
            pipe_prefix: None,
        }
    }
}

/// Byte stream of notification records with partial-read buffering
pub struct NotificationStream {
    file: std::fs::File,
    pending: Vec<u8>,
}

impl NotificationStream {
    fn open(path: &str) -> Result<Self> {
        // Non-blocking so opening and reading never stall when the driver
        // has not written yet
        let file = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(path)
            .map_err(|e| {
                RustpioError::connection(format!("cannot open notification pipe {}: {}", path, e))
            })?;
        Ok(Self {
            file,
            pending: Vec::with_capacity(NOTIFICATION_LENGTH * 64),
        })
    }

    /// Next complete record, or `None` when fewer than
    /// [`NOTIFICATION_LENGTH`] bytes are currently available. Partial
    /// records stay buffered for the next call.
    pub fn read_record(&mut self) -> Result<Option<Notification>> {
        let mut buf = [0u8; 1024];
        while self.pending.len() < NOTIFICATION_LENGTH {
            match self.file.read(&mut buf) {
                Ok(0) => break,
                Ok(n) => self.pending.extend_from_slice(&buf[..n]),
                Err(e) if e.kind() == io::ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }
        if self.pending.len() < NOTIFICATION_LENGTH {
            return Ok(None);
        }
        let record = Notification::parse(&self.pending[..NOTIFICATION_LENGTH])
            .map_err(RustpioError::protocol)?;
        self.pending.drain(..NOTIFICATION_LENGTH);
        Ok(Some(record))
    }

    /// Every complete record currently available
    pub fn read_records(&mut self) -> Result<Vec<Notification>> {
        let mut out = Vec::new();
        while let Some(record) = self.read_record()? {
            out.push(record);
        }
        Ok(out)
    }
}

impl Read for NotificationStream {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        // Serve buffered bytes before touching the pipe again
        if !self.pending.is_empty() {
            let n = buf.len().min(self.pending.len());
            buf[..n].copy_from_slice(&self.pending[..n]);
            self.pending.drain(..n);
            return Ok(n);
        }
        self.file.read(buf)
    }
}

/// One notification channel: a driver handle plus its backing pipe
pub struct Notifier {
    handle: u32,
    driver: Arc<dyn GpioDriver>,
    stream: NotificationStream,
    monitored: u32,
    started: bool,
    closed: bool,
}

impl Notifier {
    /// Channel on the shared driver handle, initializing it on first use
    pub fn open() -> Result<Self> {
        Self::with_driver(driver::shared_driver()?, NotifierOptions::default())
    }

    /// Channel on the shared driver, monitoring `bits` immediately
    pub fn open_with_bits(bits: u32) -> Result<Self> {
        Self::with_driver(
            driver::shared_driver()?,
            NotifierOptions {
                bits: Some(bits),
                ..NotifierOptions::default()
            },
        )
    }

    /// Channel on a specific driver handle
    pub fn with_driver(driver: Arc<dyn GpioDriver>, options: NotifierOptions) -> Result<Self> {
        let handle = driver.notify_open_with_size(options.buffer_bytes)?;
        let prefix = match options.pipe_prefix {
            Some(prefix) => prefix,
            None => Settings::load().notify_pipe_prefix,
        };
        let path = format!("{}{}", prefix, handle);
        let stream = NotificationStream::open(&path)?;
        debug!(handle, path = %path, "notification channel open");

        let mut notifier = Self {
            handle,
            driver,
            stream,
            monitored: 0,
            started: false,
            closed: false,
        };
        if let Some(bits) = options.bits {
            notifier.start(bits)?;
        }
        Ok(notifier)
    }

    /// The driver-assigned channel handle
    pub fn handle(&self) -> u32 {
        self.handle
    }

    /// Bitmask currently monitored
    pub fn monitored_bits(&self) -> u32 {
        self.monitored
    }

    pub fn is_started(&self) -> bool {
        self.started
    }

    /// Begin or re-arm monitoring. Calling again with a new bitmask
    /// updates the monitored set without reopening the stream.
    pub fn start(&mut self, bits: u32) -> Result<()> {
        self.driver.notify_begin(self.handle, bits)?;
        self.monitored = bits;
        self.started = true;
        Ok(())
    }

    /// Pause emission. The handle stays open and records already buffered
    /// remain readable.
    pub fn stop(&mut self) -> Result<()> {
        self.driver.notify_pause(self.handle)?;
        self.started = false;
        Ok(())
    }

    /// Release the driver handle. Idempotent. The stream keeps yielding
    /// whatever was buffered before the close; no new bytes arrive.
    pub fn close(&mut self) -> Result<()> {
        if self.closed {
            return Ok(());
        }
        self.driver.notify_close(self.handle)?;
        self.closed = true;
        self.started = false;
        debug!(handle = self.handle, "notification channel closed");
        Ok(())
    }

    /// The underlying byte stream
    pub fn stream(&mut self) -> &mut NotificationStream {
        &mut self.stream
    }
}
