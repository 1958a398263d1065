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

//! Single-pin control
//!
//! A [`Pin`] owns the configuration of one GPIO line and its single
//! interrupt watcher slot. Every operation forwards to the driver; range
//! checks on duty cycles, pulse widths and frequencies are the driver's
//! and surface as [`RustpioError::Driver`].
//!
//! One `Pin` per physical line per process: constructing a second `Pin`
//! for the same number is a caller error and is not detected or merged.

use std::sync::Arc;

use tracing::debug;

use rp_error::{Result, RustpioError};
use rp_protocol::{validate_gpio, Edge, Mode, Pud};

use crate::driver::{self, GpioDriver};
use crate::events::{InterruptReceiver, InterruptSlot};

/// Initial configuration applied while constructing a [`Pin`]
#[derive(Default)]
pub struct PinOptions {
    pub mode: Option<Mode>,
    pub pull_up_down: Option<Pud>,
    pub edge: Option<Edge>,
    pub timeout_ms: u32,
}

/// One addressable GPIO line
pub struct Pin {
    gpio: u32,
    driver: Arc<dyn GpioDriver>,
    slot: InterruptSlot,
}

impl Pin {
    /// Pin on the shared driver handle, initializing it on first use
    pub fn new(gpio: u32) -> Result<Self> {
        Self::with_driver(gpio, driver::shared_driver()?)
    }

    /// Pin on the shared driver with initial configuration applied
    pub fn with_options(gpio: u32, options: PinOptions) -> Result<Self> {
        let pin = Self::new(gpio)?;
        if let Some(mode) = options.mode {
            pin.set_mode(mode)?;
        }
        if let Some(pud) = options.pull_up_down {
            pin.set_pull_up_down(pud)?;
        }
        if let Some(edge) = options.edge {
            pin.enable_interrupt(edge, options.timeout_ms)?;
        }
        Ok(pin)
    }

    /// Pin on a specific driver handle
    pub fn with_driver(gpio: u32, driver: Arc<dyn GpioDriver>) -> Result<Self> {
        validate_gpio(gpio).map_err(|_| RustpioError::invalid_argument("gpio", gpio))?;
        Ok(Self {
            gpio,
            driver,
            slot: InterruptSlot::new(),
        })
    }

    /// The line number this pin addresses
    pub fn gpio(&self) -> u32 {
        self.gpio
    }

    /// Set the pin function.
    ///
    /// Changing the mode while an interrupt watcher is active is undefined
    /// in the driver; disable the watcher first.
    pub fn set_mode(&self, mode: Mode) -> Result<()> {
        self.driver.set_mode(self.gpio, mode)
    }

    pub fn get_mode(&self) -> Result<Mode> {
        self.driver.get_mode(self.gpio)
    }

    pub fn set_pull_up_down(&self, pud: Pud) -> Result<()> {
        self.driver.set_pull_up_down(self.gpio, pud)
    }

    /// Instantaneous level, 0 or 1
    pub fn read(&self) -> Result<u8> {
        self.driver.read(self.gpio)
    }

    pub fn write(&self, level: u8) -> Result<()> {
        self.driver.write(self.gpio, level)
    }

    /// Start PWM with the given duty cycle (0 to the configured range)
    pub fn pwm_write(&self, duty_cycle: u32) -> Result<()> {
        self.driver.pwm_write(self.gpio, duty_cycle)
    }

    pub fn pwm_duty_cycle(&self) -> Result<u32> {
        self.driver.pwm_duty_cycle(self.gpio)
    }

    pub fn set_pwm_range(&self, range: u32) -> Result<()> {
        self.driver.set_pwm_range(self.gpio, range)
    }

    pub fn pwm_range(&self) -> Result<u32> {
        self.driver.pwm_range(self.gpio)
    }

    pub fn pwm_real_range(&self) -> Result<u32> {
        self.driver.pwm_real_range(self.gpio)
    }

    pub fn set_pwm_frequency(&self, frequency: u32) -> Result<()> {
        self.driver.set_pwm_frequency(self.gpio, frequency)
    }

    pub fn pwm_frequency(&self) -> Result<u32> {
        self.driver.pwm_frequency(self.gpio)
    }

    /// Start servo pulses: 0 switches off, otherwise 500-2500 microseconds
    pub fn servo_write(&self, pulse_width: u32) -> Result<()> {
        self.driver.servo_write(self.gpio, pulse_width)
    }

    pub fn servo_pulse_width(&self) -> Result<u32> {
        self.driver.servo_pulse_width(self.gpio)
    }

    /// Hardware PWM on a capable pin: frequency in hertz, duty cycle
    /// 0-1,000,000
    pub fn hardware_pwm_write(&self, frequency: u32, duty_cycle: u32) -> Result<()> {
        self.driver.hardware_pwm_write(self.gpio, frequency, duty_cycle)
    }

    /// Arm the single edge watcher for this pin.
    ///
    /// Replaces any prior registration atomically. With `timeout_ms > 0`
    /// subscribers additionally receive watchdog events carrying level
    /// [`crate::constants::TIMEOUT`] when no edge arrives in the window.
    pub fn enable_interrupt(&self, edge: Edge, timeout_ms: u32) -> Result<()> {
        debug!(gpio = self.gpio, ?edge, timeout_ms, "arming interrupt watcher");
        // Armed before registration so the very first callback is not lost
        self.slot.arm();
        let result =
            self.driver
                .set_isr_func(self.gpio, edge, timeout_ms, Some(self.slot.dispatcher()));
        if result.is_err() {
            self.slot.disarm();
        }
        result
    }

    /// Cancel the watcher. Idempotent: a pin without an active watcher is
    /// left untouched and no driver call is made.
    pub fn disable_interrupt(&self) -> Result<()> {
        if !self.slot.is_armed() {
            return Ok(());
        }
        self.slot.disarm();
        debug!(gpio = self.gpio, "cancelled interrupt watcher");
        self.driver.set_isr_func(self.gpio, Edge::Either, 0, None)
    }

    /// Observe this pin's interrupt events. Valid before or after
    /// [`enable_interrupt`](Self::enable_interrupt); events flow only
    /// while a watcher is armed.
    pub fn subscribe(&self) -> InterruptReceiver {
        self.slot.subscribe()
    }
}
