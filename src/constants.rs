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

//! Constants mirrored from the driver
//!
//! Centralizes every integer constant the driver defines for callers that
//! work with raw values. The typed enums in [`rp_protocol`] are the
//! preferred API; these exist for parity with the driver's own headers.

use rp_protocol::{ClockSource, Edge, Mode, Pud};

/* mode */
pub const INPUT: u32 = Mode::Input.as_u32();
pub const OUTPUT: u32 = Mode::Output.as_u32();
pub const ALT0: u32 = Mode::Alt0.as_u32();
pub const ALT1: u32 = Mode::Alt1.as_u32();
pub const ALT2: u32 = Mode::Alt2.as_u32();
pub const ALT3: u32 = Mode::Alt3.as_u32();
pub const ALT4: u32 = Mode::Alt4.as_u32();
pub const ALT5: u32 = Mode::Alt5.as_u32();

/* pud */
pub const PUD_OFF: u32 = Pud::Off.as_u32();
pub const PUD_DOWN: u32 = Pud::Down.as_u32();
pub const PUD_UP: u32 = Pud::Up.as_u32();

/* isr */
pub const RISING_EDGE: u32 = Edge::Rising.as_u32();
pub const FALLING_EDGE: u32 = Edge::Falling.as_u32();
pub const EITHER_EDGE: u32 = Edge::Either.as_u32();

/// Level delivered to a watcher when its timeout expires instead of an edge
pub const TIMEOUT: u8 = rp_protocol::TIMEOUT_LEVEL;

/* gpio numbers */
pub const MIN_GPIO: u32 = rp_protocol::MIN_GPIO;
pub const MAX_GPIO: u32 = rp_protocol::MAX_GPIO;
pub const MAX_USER_GPIO: u32 = rp_protocol::MAX_USER_GPIO;

/* clock */
pub const CLOCK_PWM: u32 = ClockSource::Pwm.as_u32();
pub const CLOCK_PCM: u32 = ClockSource::Pcm.as_u32();

/// Bytes per record on the notification stream
pub const NOTIFICATION_LENGTH: usize = rp_protocol::NOTIFICATION_LENGTH;

/// Default notification buffer requested from the driver (1 MiB)
pub const DEFAULT_NOTIFY_BUFFER_BYTES: u32 = 1_048_576;

/// Path prefix of the per-handle notification pipes exposed by the driver
pub const NOTIFICATION_PIPE_PATH_PREFIX: &str = "/dev/pigpio";

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_mode_constants_match_driver_header() {
        assert_eq!(INPUT, 0);
        assert_eq!(OUTPUT, 1);
        assert_eq!(ALT5, 2);
        assert_eq!(ALT4, 3);
        assert_eq!(ALT0, 4);
        assert_eq!(ALT1, 5);
        assert_eq!(ALT2, 6);
        assert_eq!(ALT3, 7);
    }

    #[test]
    fn test_misc_constants() {
        assert_eq!(PUD_UP, 2);
        assert_eq!(EITHER_EDGE, 2);
        assert_eq!(TIMEOUT, 2);
        assert_eq!(MAX_GPIO, 53);
        assert_eq!(MAX_USER_GPIO, 31);
        assert_eq!(NOTIFICATION_LENGTH, 12);
    }
}
