use serde::{Deserialize, Serialize};

/// Size of one command frame on the daemon socket (four u32 words)
pub const CMD_FRAME_LENGTH: usize = 16;

/// Size of one notification record on the notification pipe
pub const NOTIFICATION_LENGTH: usize = 12;

/// Notification flags bit: record was emitted by the watchdog timer,
/// not by a level change. The low five flag bits carry the gpio number.
pub const NTFY_FLAGS_WDOG: u16 = 1 << 5;

/// Mask extracting the watchdog gpio from the flags word
pub const NTFY_FLAGS_GPIO_MASK: u16 = 0x1f;

/// Lowest addressable gpio number
pub const MIN_GPIO: u32 = 0;

/// Highest addressable gpio number
pub const MAX_GPIO: u32 = 53;

/// Highest gpio number covered by notifications and user-level operations
pub const MAX_USER_GPIO: u32 = 31;

/// Level reported to a watcher callback when its watchdog expires
pub const TIMEOUT_LEVEL: u8 = 2;

/// Socket command numbers understood by the daemon.
///
/// These are part of the daemon's external protocol and must not change.
pub mod cmd {
    pub const MODES: u32 = 0;
    pub const MODEG: u32 = 1;
    pub const PUD: u32 = 2;
    pub const READ: u32 = 3;
    pub const WRITE: u32 = 4;
    pub const PWM: u32 = 5;
    pub const PRS: u32 = 6;
    pub const PFS: u32 = 7;
    pub const SERVO: u32 = 8;
    pub const WDOG: u32 = 9;
    pub const TICK: u32 = 16;
    pub const HWVER: u32 = 17;
    pub const NO: u32 = 18;
    pub const NB: u32 = 19;
    pub const NP: u32 = 20;
    pub const NC: u32 = 21;
    pub const PRG: u32 = 22;
    pub const PFG: u32 = 23;
    pub const PRRG: u32 = 24;
    pub const PIGPV: u32 = 26;
    pub const GDC: u32 = 83;
    pub const GPW: u32 = 84;
    pub const HP: u32 = 86;
}

/// Result codes the daemon reports for failed operations.
pub mod result_code {
    pub const PI_BAD_USER_GPIO: i32 = -2;
    pub const PI_BAD_GPIO: i32 = -3;
    pub const PI_BAD_MODE: i32 = -4;
    pub const PI_BAD_LEVEL: i32 = -5;
    pub const PI_BAD_PUD: i32 = -6;
    pub const PI_BAD_PULSEWIDTH: i32 = -7;
    pub const PI_BAD_DUTYCYCLE: i32 = -8;
    pub const PI_BAD_WDOG_TIMEOUT: i32 = -15;
    pub const PI_NO_HANDLE: i32 = -24;
    pub const PI_BAD_HANDLE: i32 = -25;
    pub const PI_NOT_PERMITTED: i32 = -41;
}

/// Symbolic name for a daemon result code, for error messages and logs
pub fn result_code_name(code: i32) -> &'static str {
    use result_code::*;
    match code {
        PI_BAD_USER_GPIO => "PI_BAD_USER_GPIO",
        PI_BAD_GPIO => "PI_BAD_GPIO",
        PI_BAD_MODE => "PI_BAD_MODE",
        PI_BAD_LEVEL => "PI_BAD_LEVEL",
        PI_BAD_PUD => "PI_BAD_PUD",
        PI_BAD_PULSEWIDTH => "PI_BAD_PULSEWIDTH",
        PI_BAD_DUTYCYCLE => "PI_BAD_DUTYCYCLE",
        PI_BAD_WDOG_TIMEOUT => "PI_BAD_WDOG_TIMEOUT",
        PI_NO_HANDLE => "PI_NO_HANDLE",
        PI_BAD_HANDLE => "PI_BAD_HANDLE",
        PI_NOT_PERMITTED => "PI_NOT_PERMITTED",
        _ => "PI_UNKNOWN",
    }
}

/// One command frame: cmd plus three parameter words, little-endian on the
/// wire. The daemon's reply echoes cmd/p1/p2 and carries the result in the
/// final word.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CmdFrame {
    pub cmd: u32,
    pub p1: u32,
    pub p2: u32,
    pub p3: u32,
}

impl CmdFrame {
    pub fn new(cmd: u32, p1: u32, p2: u32) -> Self {
        Self { cmd, p1, p2, p3: 0 }
    }

    pub fn encode(&self) -> [u8; CMD_FRAME_LENGTH] {
        let mut buf = [0u8; CMD_FRAME_LENGTH];
        buf[0..4].copy_from_slice(&self.cmd.to_le_bytes());
        buf[4..8].copy_from_slice(&self.p1.to_le_bytes());
        buf[8..12].copy_from_slice(&self.p2.to_le_bytes());
        buf[12..16].copy_from_slice(&self.p3.to_le_bytes());
        buf
    }

    pub fn decode(buf: &[u8]) -> Result<Self, String> {
        if buf.len() < CMD_FRAME_LENGTH {
            return Err(format!(
                "Command frame too short: {} < {} bytes",
                buf.len(),
                CMD_FRAME_LENGTH
            ));
        }
        Ok(Self {
            cmd: u32::from_le_bytes(buf[0..4].try_into().unwrap()),
            p1: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            p2: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
            p3: u32::from_le_bytes(buf[12..16].try_into().unwrap()),
        })
    }

    /// Result word of a reply frame, as the daemon's signed result code
    pub fn result(&self) -> i32 {
        self.p3 as i32
    }
}

/// Pin function mode.
///
/// The numeric values are the driver's own; the alternate functions are not
/// in numeric order by design of the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    Input,
    Output,
    Alt0,
    Alt1,
    Alt2,
    Alt3,
    Alt4,
    Alt5,
}

impl Mode {
    pub const fn as_u32(self) -> u32 {
        match self {
            Mode::Input => 0,
            Mode::Output => 1,
            Mode::Alt5 => 2,
            Mode::Alt4 => 3,
            Mode::Alt0 => 4,
            Mode::Alt1 => 5,
            Mode::Alt2 => 6,
            Mode::Alt3 => 7,
        }
    }
}

impl TryFrom<u32> for Mode {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, String> {
        match value {
            0 => Ok(Mode::Input),
            1 => Ok(Mode::Output),
            2 => Ok(Mode::Alt5),
            3 => Ok(Mode::Alt4),
            4 => Ok(Mode::Alt0),
            5 => Ok(Mode::Alt1),
            6 => Ok(Mode::Alt2),
            7 => Ok(Mode::Alt3),
            other => Err(format!("Unknown mode value {}", other)),
        }
    }
}

/// Pull resistor configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Pud {
    Off,
    Down,
    Up,
}

impl Pud {
    pub const fn as_u32(self) -> u32 {
        match self {
            Pud::Off => 0,
            Pud::Down => 1,
            Pud::Up => 2,
        }
    }
}

impl TryFrom<u32> for Pud {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, String> {
        match value {
            0 => Ok(Pud::Off),
            1 => Ok(Pud::Down),
            2 => Ok(Pud::Up),
            other => Err(format!("Unknown pull value {}", other)),
        }
    }
}

/// Interrupt trigger condition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Edge {
    Rising,
    Falling,
    Either,
}

impl Edge {
    pub const fn as_u32(self) -> u32 {
        match self {
            Edge::Rising => 0,
            Edge::Falling => 1,
            Edge::Either => 2,
        }
    }

    /// Whether a transition to `level` qualifies for this edge
    pub fn matches(self, level: u8) -> bool {
        match self {
            Edge::Rising => level == 1,
            Edge::Falling => level == 0,
            Edge::Either => true,
        }
    }
}

impl TryFrom<u32> for Edge {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, String> {
        match value {
            0 => Ok(Edge::Rising),
            1 => Ok(Edge::Falling),
            2 => Ok(Edge::Either),
            other => Err(format!("Unknown edge value {}", other)),
        }
    }
}

/// Clock peripheral used for timing
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ClockSource {
    Pwm,
    Pcm,
}

impl ClockSource {
    pub const fn as_u32(self) -> u32 {
        match self {
            ClockSource::Pwm => 0,
            ClockSource::Pcm => 1,
        }
    }
}

impl TryFrom<u32> for ClockSource {
    type Error = String;

    fn try_from(value: u32) -> Result<Self, String> {
        match value {
            0 => Ok(ClockSource::Pwm),
            1 => Ok(ClockSource::Pcm),
            other => Err(format!("Unknown clock peripheral {}", other)),
        }
    }
}

/// One notification record: a snapshot of all user gpio levels at a tick.
///
/// All fields are little-endian on the wire; the daemon writes its native C
/// struct and runs on little-endian hardware.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    /// Monotonically increasing per channel, wraps at 2^16
    pub seqno: u16,
    /// Bit 5 set means watchdog-only record; low 5 bits carry the gpio
    pub flags: u16,
    /// Microseconds since driver start, wraps at 2^32
    pub tick: u32,
    /// Instantaneous level bitmask of all 32 user gpio lines
    pub level: u32,
}

impl Notification {
    /// Parse one record from the first NOTIFICATION_LENGTH bytes of `buf`
    pub fn parse(buf: &[u8]) -> Result<Self, String> {
        if buf.len() < NOTIFICATION_LENGTH {
            return Err(format!(
                "Notification record too short: {} < {} bytes",
                buf.len(),
                NOTIFICATION_LENGTH
            ));
        }
        Ok(Self {
            seqno: u16::from_le_bytes(buf[0..2].try_into().unwrap()),
            flags: u16::from_le_bytes(buf[2..4].try_into().unwrap()),
            tick: u32::from_le_bytes(buf[4..8].try_into().unwrap()),
            level: u32::from_le_bytes(buf[8..12].try_into().unwrap()),
        })
    }

    pub fn encode(&self) -> [u8; NOTIFICATION_LENGTH] {
        let mut buf = [0u8; NOTIFICATION_LENGTH];
        buf[0..2].copy_from_slice(&self.seqno.to_le_bytes());
        buf[2..4].copy_from_slice(&self.flags.to_le_bytes());
        buf[4..8].copy_from_slice(&self.tick.to_le_bytes());
        buf[8..12].copy_from_slice(&self.level.to_le_bytes());
        buf
    }

    /// True for records emitted by the watchdog timer rather than an edge
    pub fn is_watchdog(&self) -> bool {
        self.flags & NTFY_FLAGS_WDOG != 0
    }

    /// The gpio a watchdog record refers to, if this is one
    pub fn watchdog_gpio(&self) -> Option<u8> {
        if self.is_watchdog() {
            Some((self.flags & NTFY_FLAGS_GPIO_MASK) as u8)
        } else {
            None
        }
    }

    /// Instantaneous level of one gpio in this snapshot
    pub fn level_of(&self, gpio: u32) -> u8 {
        ((self.level >> gpio) & 1) as u8
    }
}

/// A single per-pin level transition recovered from two snapshots
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub gpio: u8,
    pub level: u8,
}

/// Recover per-pin transitions between two level snapshots, restricted to
/// the monitored bitmask. Changes on unmonitored bits are ignored.
pub fn level_transitions(prev: u32, curr: u32, monitored: u32) -> Vec<Transition> {
    let mut out = Vec::new();
    let mut changed = (prev ^ curr) & monitored;
    while changed != 0 {
        let gpio = changed.trailing_zeros() as u8;
        out.push(Transition {
            gpio,
            level: ((curr >> gpio) & 1) as u8,
        });
        changed &= changed - 1;
    }
    out
}

pub fn validate_gpio(gpio: u32) -> Result<(), String> {
    if gpio > MAX_GPIO {
        return Err(format!("Gpio {} out of range 0-{}", gpio, MAX_GPIO));
    }
    Ok(())
}

pub fn validate_user_gpio(gpio: u32) -> Result<(), String> {
    if gpio > MAX_USER_GPIO {
        return Err(format!("User gpio {} out of range 0-{}", gpio, MAX_USER_GPIO));
    }
    Ok(())
}

/// Sample periods the driver clock accepts, in microseconds
pub const VALID_CLOCK_MICROS: &[u32] = &[1, 2, 4, 5, 8, 10];

pub fn validate_clock_micros(micros: u32) -> Result<(), String> {
    if !VALID_CLOCK_MICROS.contains(&micros) {
        return Err(format!(
            "Clock sample period {} us not one of {:?}",
            micros, VALID_CLOCK_MICROS
        ));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cmd_frame_roundtrip() {
        let frame = CmdFrame::new(cmd::MODES, 17, 1);
        let bytes = frame.encode();
        assert_eq!(bytes.len(), CMD_FRAME_LENGTH);
        let decoded = CmdFrame::decode(&bytes).unwrap();
        assert_eq!(decoded, frame);
    }

    #[test]
    fn test_cmd_frame_little_endian() {
        let frame = CmdFrame::new(cmd::WRITE, 0x0102_0304, 1);
        let bytes = frame.encode();
        assert_eq!(bytes[0], cmd::WRITE as u8);
        assert_eq!(&bytes[4..8], &[0x04, 0x03, 0x02, 0x01]);
    }

    #[test]
    fn test_cmd_frame_decode_short() {
        assert!(CmdFrame::decode(&[0u8; 15]).is_err());
    }

    #[test]
    fn test_cmd_frame_result_negative() {
        let mut frame = CmdFrame::new(cmd::MODES, 99, 0);
        frame.p3 = result_code::PI_BAD_GPIO as u32;
        assert_eq!(frame.result(), -3);
    }

    #[test]
    fn test_notification_parse() {
        // seqno=1, flags=0, tick=0x78563412, level=0xFFFFFFFF
        let raw = [
            0x01, 0x00, 0x00, 0x00, 0x12, 0x34, 0x56, 0x78, 0xFF, 0xFF, 0xFF, 0xFF,
        ];
        let n = Notification::parse(&raw).unwrap();
        assert_eq!(n.seqno, 1);
        assert!(!n.is_watchdog());
        assert_eq!(n.tick, 2_018_915_346);
        assert_eq!(n.level, 0xFFFF_FFFF);
    }

    #[test]
    fn test_notification_parse_short() {
        assert!(Notification::parse(&[0u8; 11]).is_err());
    }

    #[test]
    fn test_notification_roundtrip() {
        let n = Notification {
            seqno: 0xABCD,
            flags: 0,
            tick: 123_456_789,
            level: 0x0002_0010,
        };
        assert_eq!(Notification::parse(&n.encode()).unwrap(), n);
    }

    #[test]
    fn test_notification_watchdog_gpio() {
        let n = Notification {
            seqno: 7,
            flags: NTFY_FLAGS_WDOG | 17,
            tick: 1000,
            level: 0,
        };
        assert!(n.is_watchdog());
        assert_eq!(n.watchdog_gpio(), Some(17));

        let plain = Notification {
            seqno: 8,
            flags: 0,
            tick: 1001,
            level: 0,
        };
        assert_eq!(plain.watchdog_gpio(), None);
    }

    #[test]
    fn test_level_of() {
        let n = Notification {
            seqno: 0,
            flags: 0,
            tick: 0,
            level: 1 << 4,
        };
        assert_eq!(n.level_of(4), 1);
        assert_eq!(n.level_of(5), 0);
    }

    #[test]
    fn test_level_transitions_restricted_to_monitored() {
        let monitored = (1 << 4) | (1 << 17);
        // Pin 4 rises, pin 17 unchanged, pin 9 rises but is not monitored
        let prev = 1 << 17;
        let curr = (1 << 17) | (1 << 4) | (1 << 9);
        let transitions = level_transitions(prev, curr, monitored);
        assert_eq!(
            transitions,
            vec![Transition { gpio: 4, level: 1 }]
        );
    }

    #[test]
    fn test_level_transitions_both_directions() {
        let monitored = (1 << 4) | (1 << 17);
        let prev = 1 << 4;
        let curr = 1 << 17;
        let transitions = level_transitions(prev, curr, monitored);
        assert_eq!(transitions.len(), 2);
        assert!(transitions.contains(&Transition { gpio: 4, level: 0 }));
        assert!(transitions.contains(&Transition { gpio: 17, level: 1 }));
    }

    #[test]
    fn test_level_transitions_none() {
        assert!(level_transitions(0xFFFF, 0xFFFF, 0xFF).is_empty());
    }

    #[test]
    fn test_mode_values() {
        // Alternate functions are deliberately not in numeric order
        assert_eq!(Mode::Input.as_u32(), 0);
        assert_eq!(Mode::Output.as_u32(), 1);
        assert_eq!(Mode::Alt5.as_u32(), 2);
        assert_eq!(Mode::Alt0.as_u32(), 4);
        assert_eq!(Mode::Alt3.as_u32(), 7);
        for v in 0..8 {
            assert_eq!(Mode::try_from(v).unwrap().as_u32(), v);
        }
        assert!(Mode::try_from(8).is_err());
    }

    #[test]
    fn test_pud_values() {
        for v in 0..3 {
            assert_eq!(Pud::try_from(v).unwrap().as_u32(), v);
        }
        assert!(Pud::try_from(3).is_err());
    }

    #[test]
    fn test_edge_matching() {
        assert!(Edge::Rising.matches(1));
        assert!(!Edge::Rising.matches(0));
        assert!(Edge::Falling.matches(0));
        assert!(!Edge::Falling.matches(1));
        assert!(Edge::Either.matches(0));
        assert!(Edge::Either.matches(1));
    }

    #[test]
    fn test_validate_gpio() {
        assert!(validate_gpio(0).is_ok());
        assert!(validate_gpio(MAX_GPIO).is_ok());
        assert!(validate_gpio(MAX_GPIO + 1).is_err());
        assert!(validate_user_gpio(MAX_USER_GPIO).is_ok());
        assert!(validate_user_gpio(MAX_USER_GPIO + 1).is_err());
    }

    #[test]
    fn test_validate_clock_micros() {
        assert!(validate_clock_micros(5).is_ok());
        assert!(validate_clock_micros(3).is_err());
        assert!(validate_clock_micros(0).is_err());
    }

    #[test]
    fn test_result_code_names() {
        assert_eq!(result_code_name(result_code::PI_NO_HANDLE), "PI_NO_HANDLE");
        assert_eq!(result_code_name(result_code::PI_BAD_MODE), "PI_BAD_MODE");
        assert_eq!(result_code_name(-9999), "PI_UNKNOWN");
    }
}
