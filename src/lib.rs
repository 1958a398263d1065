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

//! Rustpio
//!
//! Client library for the pigpio daemon. Pin configuration, digital and
//! PWM/servo output, edge-triggered interrupts and binary notification
//! streams, all forwarded to the daemon over its socket protocol.
//!
//! # Module Structure
//!
//! - `pin` - per-line control and interrupt registration
//! - `notifier` - notification channels over the daemon's record pipes
//! - `events` - interrupt events and the cross-thread hand-off
//! - `driver` - the driver trait and the shared process-wide handle
//! - `daemon` - socket transport speaking the daemon protocol
//! - `settings` - daemon address and pipe path resolution
//! - `constants` - integer constants mirrored from the driver
//!
//! # Example
//!
//! ```no_run
//! use rustpio::{Pin, Mode, Edge};
//!
//! let button = Pin::new(17)?;
//! button.set_mode(Mode::Input)?;
//!
//! let events = button.subscribe();
//! button.enable_interrupt(Edge::Rising, 0)?;
//! while let Some(event) = events.recv() {
//!     println!("level {} at tick {}", event.level, event.tick);
//! }
//! # Ok::<(), rustpio::RustpioError>(())
//! ```

pub mod constants;
pub mod daemon;
pub mod driver;
pub mod events;
pub mod notifier;
pub mod pin;
pub mod settings;

// Re-export primary types
pub use pin::{Pin, PinOptions};
pub use notifier::{NotificationStream, Notifier, NotifierOptions};
pub use events::{InterruptEvent, InterruptReceiver};

// Re-export driver seam and lifecycle
pub use daemon::DaemonDriver;
pub use driver::{
    configure_clock, initialize, initialize_with, is_initialized, terminate, GpioDriver,
    IsrCallback,
};

// Re-export settings
pub use settings::Settings;

// Re-export error types
pub use rp_error::{Result, RustpioError};

// Re-export wire-level types shared with the daemon
pub use rp_protocol::{
    level_transitions, ClockSource, Edge, Mode, Notification, Pud, Transition,
    NOTIFICATION_LENGTH,
};
