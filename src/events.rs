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

//! Interrupt event dispatch
//!
//! Driver callbacks run on a driver-owned thread. The hand-off into
//! application context is a per-pin subscription slot: each subscriber
//! holds the receiving end of a channel and drains it wherever it likes.
//! Fan-out happens in callback context and never blocks; events arriving
//! after the slot is disarmed are dropped.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tracing::trace;

use crate::driver::IsrCallback;

/// One edge or watchdog occurrence on a pin.
///
/// `level` is 0 or 1 for a real transition, [`crate::constants::TIMEOUT`]
/// for a watchdog expiry. `tick` is the driver's microsecond counter and
/// wraps at 2^32.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InterruptEvent {
    pub gpio: u32,
    pub level: u8,
    pub tick: u32,
}

/// Receiving end of one pin subscription, drained in application context.
pub struct InterruptReceiver {
    inner: mpsc::Receiver<InterruptEvent>,
}

impl InterruptReceiver {
    /// Block until the next event or until the sending side is gone
    pub fn recv(&self) -> Option<InterruptEvent> {
        self.inner.recv().ok()
    }

    /// Block up to `timeout` for the next event
    pub fn recv_timeout(&self, timeout: Duration) -> Option<InterruptEvent> {
        self.inner.recv_timeout(timeout).ok()
    }

    /// Next event if one is already queued
    pub fn try_recv(&self) -> Option<InterruptEvent> {
        self.inner.try_recv().ok()
    }

    /// Drain everything currently queued
    pub fn drain(&self) -> Vec<InterruptEvent> {
        self.inner.try_iter().collect()
    }
}

/// The per-pin subscription registry plus the armed flag that gates
/// delivery. The dispatcher handed to the driver shares this state, so
/// disarming is visible to callbacks already in flight.
pub(crate) struct InterruptSlot {
    armed: Arc<AtomicBool>,
    subscribers: Arc<Mutex<Vec<mpsc::Sender<InterruptEvent>>>>,
}

impl InterruptSlot {
    pub fn new() -> Self {
        Self {
            armed: Arc::new(AtomicBool::new(false)),
            subscribers: Arc::new(Mutex::new(Vec::new())),
        }
    }

    /// Register a new observer for this pin
    pub fn subscribe(&self) -> InterruptReceiver {
        let (tx, rx) = mpsc::channel();
        self.subscribers.lock().push(tx);
        InterruptReceiver { inner: rx }
    }

    pub fn arm(&self) {
        self.armed.store(true, Ordering::Release);
    }

    /// Stop delivery. Callbacks already in flight see the flag and drop
    /// their event instead of sending.
    pub fn disarm(&self) {
        self.armed.store(false, Ordering::Release);
    }

    pub fn is_armed(&self) -> bool {
        self.armed.load(Ordering::Acquire)
    }

    /// Build the callback handed to the driver. Runs in driver-callback
    /// context: gated on the armed flag, then fanned out to every live
    /// subscriber. Subscribers whose receiver is gone are pruned.
    pub fn dispatcher(&self) -> IsrCallback {
        let armed = Arc::clone(&self.armed);
        let subscribers = Arc::clone(&self.subscribers);
        Box::new(move |gpio, level, tick| {
            if !armed.load(Ordering::Acquire) {
                trace!(gpio, "dropping event after cancellation");
                return;
            }
            let event = InterruptEvent { gpio, level, tick };
            subscribers.lock().retain(|tx| tx.send(event).is_ok());
        })
    }
}
