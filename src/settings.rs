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

//! Daemon connection settings
//!
//! Resolution order: built-in defaults, then the optional settings file,
//! then the daemon's own environment variables (`PIGPIO_ADDR`,
//! `PIGPIO_PORT`), which always win so existing daemon client setups keep
//! working unchanged.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::constants::NOTIFICATION_PIPE_PATH_PREFIX;

/// Default daemon host
pub const DEFAULT_HOST: &str = "localhost";

/// Default daemon port
pub const DEFAULT_PORT: u16 = 8888;

/// Default connect timeout in milliseconds
pub const DEFAULT_CONNECT_TIMEOUT_MS: u64 = 3000;

/// Default per-request socket timeout in milliseconds
pub const DEFAULT_IO_TIMEOUT_MS: u64 = 5000;

/// Settings file location
pub const SETTINGS_FILE: &str = "/etc/rustpio/settings.json";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Daemon host name or address
    pub host: String,
    /// Daemon TCP port
    pub port: u16,
    /// Socket connect timeout, milliseconds
    pub connect_timeout_ms: u64,
    /// Socket read/write timeout per request, milliseconds
    pub io_timeout_ms: u64,
    /// Path prefix for per-handle notification pipes
    pub notify_pipe_prefix: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            connect_timeout_ms: DEFAULT_CONNECT_TIMEOUT_MS,
            io_timeout_ms: DEFAULT_IO_TIMEOUT_MS,
            notify_pipe_prefix: NOTIFICATION_PIPE_PATH_PREFIX.to_string(),
        }
    }
}

impl Settings {
    /// Defaults, settings file, then environment overrides
    pub fn load() -> Self {
        let mut settings = Self::read_file(Path::new(SETTINGS_FILE)).unwrap_or_default();
        settings.apply_env();
        settings
    }

    /// Settings from a specific file with environment overrides applied
    pub fn load_from(path: &Path) -> Self {
        let mut settings = Self::read_file(path).unwrap_or_default();
        settings.apply_env();
        settings
    }

    fn read_file(path: &Path) -> Option<Self> {
        let raw = fs::read_to_string(path).ok()?;
        match serde_json::from_str(&raw) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(path = %path.display(), error = %e, "ignoring unparseable settings file");
                None
            }
        }
    }

    fn apply_env(&mut self) {
        if let Ok(addr) = std::env::var("PIGPIO_ADDR") {
            if !addr.is_empty() {
                self.host = addr;
            }
        }
        if let Ok(port) = std::env::var("PIGPIO_PORT") {
            match port.parse::<u16>() {
                Ok(p) if p > 0 => self.port = p,
                _ => tracing::warn!(value = %port, "ignoring invalid PIGPIO_PORT"),
            }
        }
    }

    /// `host:port` form used for socket connects
    pub fn daemon_addr(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }

    /// Path of the notification pipe for a driver-assigned handle
    pub fn notify_pipe_path(&self, handle: u32) -> String {
        format!("{}{}", self.notify_pipe_prefix, handle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::io::Write;

    fn clear_env() {
        std::env::remove_var("PIGPIO_ADDR");
        std::env::remove_var("PIGPIO_PORT");
    }

    #[test]
    #[serial]
    fn test_defaults() {
        clear_env();
        let settings = Settings::load_from(Path::new("/nonexistent/settings.json"));
        assert_eq!(settings.daemon_addr(), "localhost:8888");
        assert_eq!(settings.notify_pipe_path(3), "/dev/pigpio3");
    }

    #[test]
    #[serial]
    fn test_env_overrides() {
        std::env::set_var("PIGPIO_ADDR", "192.168.1.5");
        std::env::set_var("PIGPIO_PORT", "7777");
        let settings = Settings::load_from(Path::new("/nonexistent/settings.json"));
        assert_eq!(settings.daemon_addr(), "192.168.1.5:7777");
        clear_env();
    }

    #[test]
    #[serial]
    fn test_invalid_port_ignored() {
        clear_env();
        std::env::set_var("PIGPIO_PORT", "not-a-port");
        let settings = Settings::load_from(Path::new("/nonexistent/settings.json"));
        assert_eq!(settings.port, DEFAULT_PORT);
        clear_env();
    }

    #[test]
    #[serial]
    fn test_settings_file() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut f = std::fs::File::create(&path).unwrap();
        write!(
            f,
            r#"{{"host": "pi4", "port": 9000, "notify_pipe_prefix": "{}/pipe"}}"#,
            dir.path().display()
        )
        .unwrap();

        let settings = Settings::load_from(&path);
        assert_eq!(settings.host, "pi4");
        assert_eq!(settings.port, 9000);
        // Unspecified fields keep their defaults
        assert_eq!(settings.io_timeout_ms, DEFAULT_IO_TIMEOUT_MS);
        assert!(settings.notify_pipe_path(1).ends_with("/pipe1"));
    }

    #[test]
    #[serial]
    fn test_garbage_settings_file_falls_back() {
        clear_env();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        std::fs::write(&path, "{ not json").unwrap();
        let settings = Settings::load_from(&path);
        assert_eq!(settings, Settings::default());
    }
}
