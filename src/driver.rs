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

//! Driver collaborator seam
//!
//! [`GpioDriver`] is the boundary behind which all hardware work happens.
//! The process holds at most one shared driver handle, created lazily on
//! first use and torn down explicitly with [`terminate`]. Pins and
//! notifiers constructed without an explicit driver use the shared handle.

use std::sync::Arc;

use lazy_static::lazy_static;
use parking_lot::RwLock;
use tracing::info;

use rp_error::{Result, RustpioError};
use rp_protocol::{validate_clock_micros, ClockSource, Edge, Mode, Pud};

use crate::daemon::DaemonDriver;
use crate::settings::Settings;

/// Callback invoked by the driver on a qualifying edge or watchdog expiry,
/// with (gpio, level, tick). Runs on a driver-owned thread.
pub type IsrCallback = Box<dyn Fn(u32, u8, u32) + Send + Sync>;

/// Operations the external GPIO driver performs on our behalf.
///
/// Every method is a direct pass-through; the driver owns pin muxing, PWM
/// timing and notification buffering. Implementations must be safe to call
/// from multiple threads.
#[cfg_attr(test, mockall::automock)]
pub trait GpioDriver: Send + Sync {
    fn set_mode(&self, gpio: u32, mode: Mode) -> Result<()>;
    fn get_mode(&self, gpio: u32) -> Result<Mode>;
    fn set_pull_up_down(&self, gpio: u32, pud: Pud) -> Result<()>;
    fn read(&self, gpio: u32) -> Result<u8>;
    fn write(&self, gpio: u32, level: u8) -> Result<()>;
    fn pwm_write(&self, gpio: u32, duty_cycle: u32) -> Result<()>;
    fn pwm_duty_cycle(&self, gpio: u32) -> Result<u32>;
    fn set_pwm_range(&self, gpio: u32, range: u32) -> Result<()>;
    fn pwm_range(&self, gpio: u32) -> Result<u32>;
    fn pwm_real_range(&self, gpio: u32) -> Result<u32>;
    fn set_pwm_frequency(&self, gpio: u32, frequency: u32) -> Result<()>;
    fn pwm_frequency(&self, gpio: u32) -> Result<u32>;
    fn servo_write(&self, gpio: u32, pulse_width: u32) -> Result<()>;
    fn servo_pulse_width(&self, gpio: u32) -> Result<u32>;
    fn hardware_pwm_write(&self, gpio: u32, frequency: u32, duty_cycle: u32) -> Result<()>;

    /// Register (`Some`) or cancel (`None`) the single edge watcher for a
    /// pin. Registering replaces any prior watcher atomically. With
    /// `timeout_ms > 0` the driver also delivers watchdog callbacks with
    /// level [`crate::constants::TIMEOUT`] when no edge arrives in time.
    fn set_isr_func(
        &self,
        gpio: u32,
        edge: Edge,
        timeout_ms: u32,
        callback: Option<IsrCallback>,
    ) -> Result<()>;

    fn notify_open_with_size(&self, buffer_bytes: u32) -> Result<u32>;
    fn notify_begin(&self, handle: u32, bits: u32) -> Result<()>;
    fn notify_pause(&self, handle: u32) -> Result<()>;
    fn notify_close(&self, handle: u32) -> Result<()>;

    fn configure_clock(&self, micros: u32, peripheral: ClockSource) -> Result<()>;

    /// Release daemon-side resources. Called once from [`terminate`].
    fn shutdown(&self) -> Result<()>;
}

lazy_static! {
    static ref DRIVER: RwLock<Option<Arc<dyn GpioDriver>>> = RwLock::new(None);
}

/// Connect the shared driver handle if none exists yet and return it.
/// Subsequent calls return the existing handle.
pub fn initialize() -> Result<Arc<dyn GpioDriver>> {
    if let Some(driver) = DRIVER.read().clone() {
        return Ok(driver);
    }
    let mut guard = DRIVER.write();
    if let Some(driver) = guard.as_ref() {
        return Ok(Arc::clone(driver));
    }
    let settings = Settings::load();
    info!(addr = %settings.daemon_addr(), "connecting gpio driver");
    let driver: Arc<dyn GpioDriver> = Arc::new(DaemonDriver::connect(settings)?);
    *guard = Some(Arc::clone(&driver));
    Ok(driver)
}

/// Install a specific driver as the shared handle.
///
/// Fails with `AlreadyInitialized` when a handle is already installed;
/// call [`terminate`] first to replace it.
pub fn initialize_with(driver: Arc<dyn GpioDriver>) -> Result<()> {
    let mut guard = DRIVER.write();
    if guard.is_some() {
        return Err(RustpioError::AlreadyInitialized);
    }
    *guard = Some(driver);
    Ok(())
}

/// Tear down the shared driver handle explicitly.
pub fn terminate() -> Result<()> {
    let driver = DRIVER.write().take().ok_or(RustpioError::NotInitialized)?;
    driver.shutdown()?;
    info!("gpio driver terminated");
    Ok(())
}

/// Whether a shared driver handle is currently installed
pub fn is_initialized() -> bool {
    DRIVER.read().is_some()
}

/// Shared handle for components constructed without an explicit driver.
/// Initializes lazily, matching the original library's init-on-first-use.
pub(crate) fn shared_driver() -> Result<Arc<dyn GpioDriver>> {
    initialize()
}

/// Select the sample period and timing peripheral used by the driver clock.
///
/// Validates the arguments, then initializes the driver and forwards the
/// request. Against a remote daemon the sample rate is fixed at daemon
/// launch; the daemon driver records the request and warns instead.
pub fn configure_clock(micros: u32, peripheral: ClockSource) -> Result<()> {
    validate_clock_micros(micros)
        .map_err(|_| RustpioError::invalid_argument("clock sample period", micros))?;
    let driver = initialize()?;
    driver.configure_clock(micros, peripheral)
}
