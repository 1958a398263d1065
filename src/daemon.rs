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

//! Daemon-backed driver
//!
//! Speaks the daemon's socket protocol: 16-byte command frames whose reply
//! echoes cmd/p1/p2 and carries a signed result in the final word. One
//! reconnect is attempted when the socket dies mid-request.
//!
//! The daemon has no server-side ISR registration, so edge watchers are
//! implemented the way the reference client library does it: a private
//! notification handle whose pipe is drained by a reader thread, diffing
//! level snapshots and invoking the registered callbacks. That thread
//! belongs to this driver; the wrapper layer above spawns nothing.

use std::collections::HashMap;
use std::fs::{File, OpenOptions};
use std::io::{Read, Write};
use std::net::{TcpStream, ToSocketAddrs};
use std::os::unix::fs::OpenOptionsExt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use parking_lot::Mutex;
use tracing::{debug, warn};

use rp_error::{Result, RustpioError};
use rp_protocol::{
    cmd, result_code, result_code_name, validate_user_gpio, ClockSource, CmdFrame, Edge, Mode,
    Notification, Pud, CMD_FRAME_LENGTH, NOTIFICATION_LENGTH, TIMEOUT_LEVEL,
};

use crate::driver::{GpioDriver, IsrCallback};
use crate::settings::Settings;

/// Idle delay of the pipe reader when no bytes are available
const READER_IDLE_MS: u64 = 5;

/// Translate a daemon result word into Ok(value) or the error taxonomy
fn check(res: i32) -> Result<u32> {
    if res >= 0 {
        return Ok(res as u32);
    }
    if res == result_code::PI_NO_HANDLE {
        return Err(RustpioError::resource_exhausted(
            "no free notification handles",
        ));
    }
    Err(RustpioError::Driver {
        code: res,
        name: result_code_name(res),
    })
}

/// One command socket with request/reply framing
struct SocketClient {
    stream: TcpStream,
    settings: Settings,
}

impl SocketClient {
    fn connect(settings: Settings) -> Result<Self> {
        let stream = Self::open_stream(&settings)?;
        Ok(Self { stream, settings })
    }

    fn open_stream(settings: &Settings) -> Result<TcpStream> {
        let addr_str = settings.daemon_addr();
        let addr = addr_str
            .to_socket_addrs()
            .map_err(|e| RustpioError::connection(format!("cannot resolve {}: {}", addr_str, e)))?
            .next()
            .ok_or_else(|| {
                RustpioError::connection(format!("no addresses for {}", addr_str))
            })?;

        let stream =
            TcpStream::connect_timeout(&addr, Duration::from_millis(settings.connect_timeout_ms))
                .map_err(|e| {
                    RustpioError::connection(format!("cannot connect to {}: {}", addr_str, e))
                })?;
        let io_timeout = Some(Duration::from_millis(settings.io_timeout_ms));
        stream
            .set_read_timeout(io_timeout)
            .map_err(|e| RustpioError::connection(format!("cannot set read timeout: {}", e)))?;
        stream
            .set_write_timeout(io_timeout)
            .map_err(|e| RustpioError::connection(format!("cannot set write timeout: {}", e)))?;
        stream
            .set_nodelay(true)
            .map_err(|e| RustpioError::connection(format!("cannot disable nagle: {}", e)))?;
        Ok(stream)
    }

    /// Send one command and read its reply, reconnecting once on failure
    fn request(&mut self, cmd: u32, p1: u32, p2: u32) -> Result<i32> {
        self.request_with_retry(cmd, p1, p2, &[], true)
    }

    /// Command with extension words appended after the frame; p3 carries
    /// the extension byte count
    fn request_ext(&mut self, cmd: u32, p1: u32, p2: u32, ext: &[u32]) -> Result<i32> {
        self.request_with_retry(cmd, p1, p2, ext, true)
    }

    fn request_with_retry(
        &mut self,
        cmd: u32,
        p1: u32,
        p2: u32,
        ext: &[u32],
        allow_retry: bool,
    ) -> Result<i32> {
        let mut frame = CmdFrame::new(cmd, p1, p2);
        frame.p3 = (ext.len() * 4) as u32;
        let mut wire = frame.encode().to_vec();
        for word in ext {
            wire.extend_from_slice(&word.to_le_bytes());
        }

        if let Err(e) = self.stream.write_all(&wire) {
            if allow_retry {
                warn!(error = %e, "daemon socket write failed, reconnecting");
                self.stream = Self::open_stream(&self.settings)?;
                return self.request_with_retry(cmd, p1, p2, ext, false);
            }
            return Err(RustpioError::connection(format!("request failed: {}", e)));
        }

        let mut buf = [0u8; CMD_FRAME_LENGTH];
        if let Err(e) = self.stream.read_exact(&mut buf) {
            if allow_retry {
                warn!(error = %e, "daemon socket read failed, reconnecting");
                self.stream = Self::open_stream(&self.settings)?;
                return self.request_with_retry(cmd, p1, p2, ext, false);
            }
            return Err(RustpioError::connection(format!("reply failed: {}", e)));
        }

        let reply = CmdFrame::decode(&buf).map_err(RustpioError::protocol)?;
        // The daemon echoes the request words; a mismatch means the stream
        // is out of step with a previous request
        if reply.cmd != frame.cmd || reply.p1 != frame.p1 || reply.p2 != frame.p2 {
            return Err(RustpioError::protocol(format!(
                "reply echo mismatch: sent cmd {} got cmd {}",
                frame.cmd, reply.cmd
            )));
        }
        Ok(reply.result())
    }
}

/// One registered edge watcher. The callback is shared so dispatch can
/// invoke it without holding the registry lock.
struct WatcherSlot {
    edge: Edge,
    callback: Arc<IsrCallback>,
}

type WatcherMap = Arc<Mutex<HashMap<u32, WatcherSlot>>>;

/// Private notification channel feeding the edge watchers
struct IsrEngine {
    handle: u32,
    slots: WatcherMap,
    shutdown: Arc<AtomicBool>,
    reader: Option<JoinHandle<()>>,
}

impl IsrEngine {
    /// Open a notification handle and start draining its pipe. The pipe is
    /// opened before notifications begin so no record is missed.
    fn start(client: &Mutex<SocketClient>, settings: &Settings) -> Result<Self> {
        let handle = check(client.lock().request(cmd::NO, 0, 0)?)?;
        let path = settings.notify_pipe_path(handle);
        let pipe = OpenOptions::new()
            .read(true)
            .custom_flags(libc::O_NONBLOCK)
            .open(&path)
            .map_err(|e| {
                RustpioError::connection(format!("cannot open notification pipe {}: {}", path, e))
            })?;
        debug!(handle, path = %path, "interrupt engine started");

        let slots: WatcherMap = Arc::new(Mutex::new(HashMap::new()));
        let shutdown = Arc::new(AtomicBool::new(false));
        let reader = {
            let slots = Arc::clone(&slots);
            let shutdown = Arc::clone(&shutdown);
            thread::Builder::new()
                .name("rustpio-isr".into())
                .spawn(move || reader_loop(pipe, slots, shutdown))
                .map_err(RustpioError::Io)?
        };

        Ok(Self {
            handle,
            slots,
            shutdown,
            reader: Some(reader),
        })
    }

    fn monitored_bits(&self) -> u32 {
        self.slots.lock().keys().fold(0, |bits, gpio| bits | (1 << gpio))
    }

    fn register(
        &mut self,
        client: &Mutex<SocketClient>,
        gpio: u32,
        edge: Edge,
        timeout_ms: u32,
        callback: IsrCallback,
    ) -> Result<()> {
        self.slots.lock().insert(
            gpio,
            WatcherSlot {
                edge,
                callback: Arc::new(callback),
            },
        );
        let bits = self.monitored_bits();
        check(client.lock().request(cmd::NB, self.handle, bits)?)?;
        // Arm or cancel the per-pin watchdog in the same step
        check(client.lock().request(cmd::WDOG, gpio, timeout_ms)?)?;
        Ok(())
    }

    fn unregister(&mut self, client: &Mutex<SocketClient>, gpio: u32) -> Result<()> {
        if self.slots.lock().remove(&gpio).is_none() {
            return Ok(());
        }
        check(client.lock().request(cmd::WDOG, gpio, 0)?)?;
        let bits = self.monitored_bits();
        if bits == 0 {
            check(client.lock().request(cmd::NP, self.handle, 0)?)?;
        } else {
            check(client.lock().request(cmd::NB, self.handle, bits)?)?;
        }
        Ok(())
    }

    /// Stop the reader and release the daemon handle. Closing the handle
    /// ends the pipe's writer, which unblocks the reader loop.
    fn stop(mut self, client: &Mutex<SocketClient>) -> Result<()> {
        self.shutdown.store(true, Ordering::Release);
        let close_result = client.lock().request(cmd::NC, self.handle, 0).and_then(check);
        if let Some(reader) = self.reader.take() {
            let _ = reader.join();
        }
        close_result.map(|_| ())
    }
}

/// Drain the notification pipe: buffer until full records are available,
/// then diff level snapshots against the previous record and invoke the
/// matching watchers. Watchdog records dispatch to their pin directly.
fn reader_loop(mut pipe: File, slots: WatcherMap, shutdown: Arc<AtomicBool>) {
    let mut pending: Vec<u8> = Vec::with_capacity(NOTIFICATION_LENGTH * 64);
    let mut last_level: Option<u32> = None;
    let mut buf = [0u8; 1024];

    loop {
        if shutdown.load(Ordering::Acquire) {
            return;
        }
        match pipe.read(&mut buf) {
            // No writer yet, or between bursts
            Ok(0) => thread::sleep(Duration::from_millis(READER_IDLE_MS)),
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                while pending.len() >= NOTIFICATION_LENGTH {
                    match Notification::parse(&pending[..NOTIFICATION_LENGTH]) {
                        Ok(record) => dispatch_record(&record, &slots, &mut last_level),
                        Err(e) => warn!(error = %e, "skipping bad notification record"),
                    }
                    pending.drain(..NOTIFICATION_LENGTH);
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::WouldBlock => {
                thread::sleep(Duration::from_millis(READER_IDLE_MS));
            }
            Err(e) => {
                warn!(error = %e, "notification pipe read failed, stopping watcher thread");
                return;
            }
        }
    }
}

fn dispatch_record(record: &Notification, slots: &WatcherMap, last_level: &mut Option<u32>) {
    if let Some(gpio) = record.watchdog_gpio() {
        let callback = slots
            .lock()
            .get(&(gpio as u32))
            .map(|slot| Arc::clone(&slot.callback));
        if let Some(callback) = callback {
            callback(gpio as u32, TIMEOUT_LEVEL, record.tick);
        }
        return;
    }

    let prev = last_level.replace(record.level);
    // The first record is the baseline snapshot, not an edge
    let Some(prev) = prev else { return };

    // Collect matches first: callbacks run without the registry lock so
    // they may safely issue driver requests of their own
    let due: Vec<(u32, u8, Arc<IsrCallback>)> = slots
        .lock()
        .iter()
        .filter_map(|(gpio, slot)| {
            let level = record.level_of(*gpio);
            let was = ((prev >> *gpio) & 1) as u8;
            if level != was && slot.edge.matches(level) {
                Some((*gpio, level, Arc::clone(&slot.callback)))
            } else {
                None
            }
        })
        .collect();
    for (gpio, level, callback) in due {
        callback(gpio, level, record.tick);
    }
}

/// Driver implementation backed by a running daemon
pub struct DaemonDriver {
    client: Mutex<SocketClient>,
    settings: Settings,
    isr: Mutex<Option<IsrEngine>>,
}

impl DaemonDriver {
    /// Connect the command socket
    pub fn connect(settings: Settings) -> Result<Self> {
        let client = SocketClient::connect(settings.clone())?;
        Ok(Self {
            client: Mutex::new(client),
            settings,
            isr: Mutex::new(None),
        })
    }

    fn request(&self, cmd: u32, p1: u32, p2: u32) -> Result<u32> {
        check(self.client.lock().request(cmd, p1, p2)?)
    }
}

impl GpioDriver for DaemonDriver {
    fn set_mode(&self, gpio: u32, mode: Mode) -> Result<()> {
        self.request(cmd::MODES, gpio, mode.as_u32()).map(|_| ())
    }

    fn get_mode(&self, gpio: u32) -> Result<Mode> {
        let raw = self.request(cmd::MODEG, gpio, 0)?;
        Mode::try_from(raw).map_err(RustpioError::protocol)
    }

    fn set_pull_up_down(&self, gpio: u32, pud: Pud) -> Result<()> {
        self.request(cmd::PUD, gpio, pud.as_u32()).map(|_| ())
    }

    fn read(&self, gpio: u32) -> Result<u8> {
        self.request(cmd::READ, gpio, 0).map(|level| level as u8)
    }

    fn write(&self, gpio: u32, level: u8) -> Result<()> {
        self.request(cmd::WRITE, gpio, level as u32).map(|_| ())
    }

    fn pwm_write(&self, gpio: u32, duty_cycle: u32) -> Result<()> {
        self.request(cmd::PWM, gpio, duty_cycle).map(|_| ())
    }

    fn pwm_duty_cycle(&self, gpio: u32) -> Result<u32> {
        self.request(cmd::GDC, gpio, 0)
    }

    fn set_pwm_range(&self, gpio: u32, range: u32) -> Result<()> {
        self.request(cmd::PRS, gpio, range).map(|_| ())
    }

    fn pwm_range(&self, gpio: u32) -> Result<u32> {
        self.request(cmd::PRG, gpio, 0)
    }

    fn pwm_real_range(&self, gpio: u32) -> Result<u32> {
        self.request(cmd::PRRG, gpio, 0)
    }

    fn set_pwm_frequency(&self, gpio: u32, frequency: u32) -> Result<()> {
        self.request(cmd::PFS, gpio, frequency).map(|_| ())
    }

    fn pwm_frequency(&self, gpio: u32) -> Result<u32> {
        self.request(cmd::PFG, gpio, 0)
    }

    fn servo_write(&self, gpio: u32, pulse_width: u32) -> Result<()> {
        self.request(cmd::SERVO, gpio, pulse_width).map(|_| ())
    }

    fn servo_pulse_width(&self, gpio: u32) -> Result<u32> {
        self.request(cmd::GPW, gpio, 0)
    }

    fn hardware_pwm_write(&self, gpio: u32, frequency: u32, duty_cycle: u32) -> Result<()> {
        // HP carries the duty cycle as an extension word after the frame
        let res = self
            .client
            .lock()
            .request_ext(cmd::HP, gpio, frequency, &[duty_cycle])?;
        check(res).map(|_| ())
    }

    fn set_isr_func(
        &self,
        gpio: u32,
        edge: Edge,
        timeout_ms: u32,
        callback: Option<IsrCallback>,
    ) -> Result<()> {
        validate_user_gpio(gpio).map_err(|_| RustpioError::invalid_argument("gpio", gpio))?;

        let mut engine_guard = self.isr.lock();
        match callback {
            Some(callback) => {
                if engine_guard.is_none() {
                    *engine_guard = Some(IsrEngine::start(&self.client, &self.settings)?);
                }
                let engine = engine_guard.as_mut().unwrap();
                engine.register(&self.client, gpio, edge, timeout_ms, callback)
            }
            None => match engine_guard.as_mut() {
                Some(engine) => engine.unregister(&self.client, gpio),
                None => Ok(()),
            },
        }
    }

    fn notify_open_with_size(&self, buffer_bytes: u32) -> Result<u32> {
        // The daemon sizes its own buffers; the request records intent
        debug!(buffer_bytes, "opening notification handle");
        self.request(cmd::NO, 0, 0)
    }

    fn notify_begin(&self, handle: u32, bits: u32) -> Result<()> {
        self.request(cmd::NB, handle, bits).map(|_| ())
    }

    fn notify_pause(&self, handle: u32) -> Result<()> {
        self.request(cmd::NP, handle, 0).map(|_| ())
    }

    fn notify_close(&self, handle: u32) -> Result<()> {
        self.request(cmd::NC, handle, 0).map(|_| ())
    }

    fn configure_clock(&self, micros: u32, peripheral: ClockSource) -> Result<()> {
        // The daemon's sample rate is fixed by its own launch flags; there
        // is no socket command to change it after the fact
        warn!(
            micros,
            ?peripheral,
            "clock configuration requested; a running daemon keeps its launch-time clock"
        );
        Ok(())
    }

    fn shutdown(&self) -> Result<()> {
        if let Some(engine) = self.isr.lock().take() {
            engine.stop(&self.client)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::constants::DEFAULT_NOTIFY_BUFFER_BYTES;
    use std::net::TcpListener;
    use std::sync::mpsc;

    /// Minimal in-process daemon: answers each frame via `responder`
    fn fake_daemon<F>(responder: F) -> std::net::SocketAddr
    where
        F: Fn(CmdFrame) -> i32 + Send + 'static,
    {
        let listener = TcpListener::bind("127.0.0.1:0").unwrap();
        let addr = listener.local_addr().unwrap();
        thread::spawn(move || {
            while let Ok((mut stream, _)) = listener.accept() {
                let mut buf = [0u8; CMD_FRAME_LENGTH];
                while stream.read_exact(&mut buf).is_ok() {
                    let mut frame = CmdFrame::decode(&buf).unwrap();
                    // Consume any extension words before replying
                    if frame.p3 > 0 {
                        let mut ext = vec![0u8; frame.p3 as usize];
                        if stream.read_exact(&mut ext).is_err() {
                            break;
                        }
                    }
                    frame.p3 = responder(frame) as u32;
                    if stream.write_all(&frame.encode()).is_err() {
                        break;
                    }
                }
            }
        });
        addr
    }

    fn settings_for(addr: std::net::SocketAddr, pipe_prefix: Option<String>) -> Settings {
        Settings {
            host: addr.ip().to_string(),
            port: addr.port(),
            notify_pipe_prefix: pipe_prefix
                .unwrap_or_else(|| "/nonexistent/pipe".to_string()),
            ..Settings::default()
        }
    }

    #[test]
    fn test_request_round_trip() {
        let addr = fake_daemon(|frame| match frame.cmd {
            cmd::MODEG => Mode::Output.as_u32() as i32,
            cmd::READ => 1,
            _ => 0,
        });
        let driver = DaemonDriver::connect(settings_for(addr, None)).unwrap();

        driver.set_mode(17, Mode::Output).unwrap();
        assert_eq!(driver.get_mode(17).unwrap(), Mode::Output);
        assert_eq!(driver.read(17).unwrap(), 1);
    }

    #[test]
    fn test_setters_round_trip_including_extensions() {
        let addr = fake_daemon(|frame| match frame.cmd {
            cmd::GPW => 1500,
            _ => 0,
        });
        let driver = DaemonDriver::connect(settings_for(addr, None)).unwrap();

        driver.set_pull_up_down(17, Pud::Down).unwrap();
        driver.servo_write(17, 1500).unwrap();
        assert_eq!(driver.servo_pulse_width(17).unwrap(), 1500);
        // HP ships the duty cycle as an extension word after the frame;
        // the fake daemon consumes it before answering, so a follow-up
        // request proves the stream stayed in step
        driver.hardware_pwm_write(18, 800_000, 250_000).unwrap();
        driver.write(17, 0).unwrap();
    }

    #[test]
    fn test_negative_result_is_driver_error() {
        let addr = fake_daemon(|frame| match frame.cmd {
            cmd::PWM => result_code::PI_BAD_DUTYCYCLE,
            _ => 0,
        });
        let driver = DaemonDriver::connect(settings_for(addr, None)).unwrap();

        let result = driver.pwm_write(18, 4_000_000);
        match result {
            Err(RustpioError::Driver { code, name }) => {
                assert_eq!(code, result_code::PI_BAD_DUTYCYCLE);
                assert_eq!(name, "PI_BAD_DUTYCYCLE");
            }
            other => panic!("expected driver error, got {:?}", other),
        }
    }

    #[test]
    fn test_no_handle_maps_to_resource_exhausted() {
        let addr = fake_daemon(|frame| match frame.cmd {
            cmd::NO => result_code::PI_NO_HANDLE,
            _ => 0,
        });
        let driver = DaemonDriver::connect(settings_for(addr, None)).unwrap();

        let result = driver.notify_open_with_size(DEFAULT_NOTIFY_BUFFER_BYTES);
        assert!(matches!(result, Err(RustpioError::ResourceExhausted(_))));
    }

    #[test]
    fn test_isr_rejects_non_user_gpio() {
        let addr = fake_daemon(|_| 0);
        let driver = DaemonDriver::connect(settings_for(addr, None)).unwrap();

        let result = driver.set_isr_func(32, Edge::Rising, 0, Some(Box::new(|_, _, _| {})));
        assert!(matches!(
            result,
            Err(RustpioError::InvalidArgument { what: "gpio", .. })
        ));
    }

    #[test]
    fn test_isr_engine_dispatches_edges() {
        let addr = fake_daemon(|_| 0);
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/pipe", dir.path().display());
        // Handle 0 comes back from the fake daemon's NO
        std::fs::write(format!("{}0", prefix), b"").unwrap();

        let driver = DaemonDriver::connect(settings_for(addr, Some(prefix.clone()))).unwrap();

        let (tx, rx) = mpsc::channel();
        driver
            .set_isr_func(
                17,
                Edge::Rising,
                0,
                Some(Box::new(move |gpio, level, tick| {
                    tx.send((gpio, level, tick)).unwrap();
                })),
            )
            .unwrap();

        // Baseline snapshot, then a rising edge on 17, then a falling one
        // (filtered out by Edge::Rising)
        let records = [
            Notification { seqno: 0, flags: 0, tick: 100, level: 0 },
            Notification { seqno: 1, flags: 0, tick: 200, level: 1 << 17 },
            Notification { seqno: 2, flags: 0, tick: 300, level: 0 },
        ];
        let mut bytes = Vec::new();
        for r in &records {
            bytes.extend_from_slice(&r.encode());
        }
        let mut pipe = OpenOptions::new()
            .append(true)
            .open(format!("{}0", prefix))
            .unwrap();
        pipe.write_all(&bytes).unwrap();

        let (gpio, level, tick) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!((gpio, level, tick), (17, 1, 200));
        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());

        driver.shutdown().unwrap();
    }

    #[test]
    fn test_isr_engine_dispatches_watchdog() {
        let addr = fake_daemon(|_| 0);
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/pipe", dir.path().display());
        std::fs::write(format!("{}0", prefix), b"").unwrap();

        let driver = DaemonDriver::connect(settings_for(addr, Some(prefix.clone()))).unwrap();

        let (tx, rx) = mpsc::channel();
        driver
            .set_isr_func(
                4,
                Edge::Either,
                250,
                Some(Box::new(move |gpio, level, tick| {
                    tx.send((gpio, level, tick)).unwrap();
                })),
            )
            .unwrap();

        let wdog = Notification {
            seqno: 0,
            flags: rp_protocol::NTFY_FLAGS_WDOG | 4,
            tick: 999,
            level: 0,
        };
        let mut pipe = OpenOptions::new()
            .append(true)
            .open(format!("{}0", prefix))
            .unwrap();
        pipe.write_all(&wdog.encode()).unwrap();

        let (gpio, level, tick) = rx.recv_timeout(Duration::from_secs(2)).unwrap();
        assert_eq!((gpio, level, tick), (4, TIMEOUT_LEVEL, 999));

        driver.shutdown().unwrap();
    }

    #[test]
    fn test_cancelled_watcher_stops_dispatch() {
        let addr = fake_daemon(|_| 0);
        let dir = tempfile::tempdir().unwrap();
        let prefix = format!("{}/pipe", dir.path().display());
        std::fs::write(format!("{}0", prefix), b"").unwrap();

        let driver = DaemonDriver::connect(settings_for(addr, Some(prefix.clone()))).unwrap();

        let (tx, rx) = mpsc::channel();
        driver
            .set_isr_func(
                9,
                Edge::Either,
                0,
                Some(Box::new(move |gpio, level, tick| {
                    let _ = tx.send((gpio, level, tick));
                })),
            )
            .unwrap();
        driver.set_isr_func(9, Edge::Either, 0, None).unwrap();

        let records = [
            Notification { seqno: 0, flags: 0, tick: 10, level: 0 },
            Notification { seqno: 1, flags: 0, tick: 20, level: 1 << 9 },
        ];
        let mut bytes = Vec::new();
        for r in &records {
            bytes.extend_from_slice(&r.encode());
        }
        let mut pipe = OpenOptions::new()
            .append(true)
            .open(format!("{}0", prefix))
            .unwrap();
        pipe.write_all(&bytes).unwrap();

        assert!(rx.recv_timeout(Duration::from_millis(300)).is_err());
        driver.shutdown().unwrap();
    }
}
