// Cursormap Event Record
// The event record handed out by the system's "get next event" call

use std::fmt;
use std::str::FromStr;

use crate::Modifiers;

/// Bits of the message carrying the physical key code.
pub const KEY_CODE_MASK: u32 = 0x0000_FF00;

/// Bits of the message carrying the character code.
pub const CHAR_CODE_MASK: u32 = 0x0000_00FF;

/// Bits of the message that belong to the key payload. Everything above is
/// ancillary state (keyboard address and friends) and is never rewritten.
pub const KEY_PAYLOAD_MASK: u32 = KEY_CODE_MASK | CHAR_CODE_MASK;

/// Kind of an event record, decoded from its `what` field.
///
/// Only `KeyDown` (3) and `AutoKey` (5) are inspected by the remap engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum EventKind {
    #[default]
    Null,
    MouseDown,
    MouseUp,
    KeyDown,
    KeyUp,
    AutoKey,
    Update,
    Disk,
    Activate,
    Network,
    Driver,
    App1,
    App2,
    App3,
    App4,
    /// Any code not listed above, carried through untouched
    Other(u16),
}

impl EventKind {
    /// Create an EventKind from the raw `what` value
    pub fn from_u16(value: u16) -> Self {
        match value {
            0 => EventKind::Null,
            1 => EventKind::MouseDown,
            2 => EventKind::MouseUp,
            3 => EventKind::KeyDown,
            4 => EventKind::KeyUp,
            5 => EventKind::AutoKey,
            6 => EventKind::Update,
            7 => EventKind::Disk,
            8 => EventKind::Activate,
            10 => EventKind::Network,
            11 => EventKind::Driver,
            12 => EventKind::App1,
            13 => EventKind::App2,
            14 => EventKind::App3,
            15 => EventKind::App4,
            other => EventKind::Other(other),
        }
    }

    /// Convert back to the raw `what` value
    pub fn to_u16(self) -> u16 {
        match self {
            EventKind::Null => 0,
            EventKind::MouseDown => 1,
            EventKind::MouseUp => 2,
            EventKind::KeyDown => 3,
            EventKind::KeyUp => 4,
            EventKind::AutoKey => 5,
            EventKind::Update => 6,
            EventKind::Disk => 7,
            EventKind::Activate => 8,
            EventKind::Network => 10,
            EventKind::Driver => 11,
            EventKind::App1 => 12,
            EventKind::App2 => 13,
            EventKind::App3 => 14,
            EventKind::App4 => 15,
            EventKind::Other(code) => code,
        }
    }

    /// Returns true for the two kinds the remap engine inspects
    pub fn is_key_press(self) -> bool {
        matches!(self, EventKind::KeyDown | EventKind::AutoKey)
    }

    /// Returns true only for auto-key events, which carry no modifier state
    pub fn is_repeat(self) -> bool {
        matches!(self, EventKind::AutoKey)
    }

    /// Name table used for parsing and display
    const NAMES: &'static [(&'static str, EventKind)] = &[
        ("null", EventKind::Null),
        ("mouse-down", EventKind::MouseDown),
        ("mouse-up", EventKind::MouseUp),
        ("key-down", EventKind::KeyDown),
        ("key-up", EventKind::KeyUp),
        ("auto-key", EventKind::AutoKey),
        ("update", EventKind::Update),
        ("disk", EventKind::Disk),
        ("activate", EventKind::Activate),
        ("network", EventKind::Network),
        ("driver", EventKind::Driver),
        ("app1", EventKind::App1),
        ("app2", EventKind::App2),
        ("app3", EventKind::App3),
        ("app4", EventKind::App4),
    ];
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match Self::NAMES.iter().find(|(_, kind)| kind == self) {
            Some((name, _)) => write!(f, "{}", name),
            None => write!(f, "other({})", self.to_u16()),
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    /// Parse a kind by its display name or raw `what` code
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let name = s.trim().to_ascii_lowercase();
        if let Ok(code) = name.parse::<u16>() {
            return Ok(EventKind::from_u16(code));
        }
        Self::NAMES
            .iter()
            .find(|(known, _)| *known == name)
            .map(|(_, kind)| *kind)
            .ok_or_else(|| format!("Unknown event kind: {}", s))
    }
}

/// Event-class mask forwarded to the underlying event source.
///
/// The engine never interprets it; it is only passed through.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct EventMask(pub u16);

impl EventMask {
    /// Accept every event class
    pub const EVERY_EVENT: EventMask = EventMask(0xFFFF);

    /// Mask selecting a single event kind (`1 << what`)
    pub fn for_kind(kind: EventKind) -> Self {
        match kind.to_u16() {
            code @ 0..=15 => EventMask(1 << code),
            _ => EventMask(0),
        }
    }

    /// Check whether an event kind is selected by this mask
    pub fn accepts(self, kind: EventKind) -> bool {
        self.0 & Self::for_kind(kind).0 != 0
    }
}

impl Default for EventMask {
    fn default() -> Self {
        EventMask::EVERY_EVENT
    }
}

/// Global mouse position at the time of the event
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct Point {
    pub v: i16,
    pub h: i16,
}

/// A single event record.
///
/// Owned by the event source; the engine borrows it mutably for the
/// duration of one poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EventRecord {
    pub what: EventKind,
    pub message: u32,
    pub when: u32,
    pub where_: Point,
    pub modifiers: Modifiers,
}

impl EventRecord {
    /// Build a keyboard event from its key code and character code
    pub fn key(what: EventKind, key_code: u8, char_code: u8, modifiers: Modifiers) -> Self {
        Self {
            what,
            message: (u32::from(key_code) << 8) | u32::from(char_code),
            modifiers,
            ..Self::default()
        }
    }

    /// Physical key code from the message
    pub fn key_code(&self) -> u8 {
        ((self.message & KEY_CODE_MASK) >> 8) as u8
    }

    /// Character code from the message
    pub fn char_code(&self) -> u8 {
        (self.message & CHAR_CODE_MASK) as u8
    }

    /// Lower two bytes of the message (key code and character code)
    pub fn key_payload(&self) -> u16 {
        (self.message & KEY_PAYLOAD_MASK) as u16
    }

    /// Replace the lower two bytes of the message, keeping the ancillary bytes
    pub fn set_key_payload(&mut self, payload: u16) {
        self.message = (self.message & !KEY_PAYLOAD_MASK) | u32::from(payload);
    }

    /// Replace only the character code byte
    pub fn set_char_code(&mut self, char_code: u8) {
        self.message = (self.message & !CHAR_CODE_MASK) | u32::from(char_code);
    }
}
