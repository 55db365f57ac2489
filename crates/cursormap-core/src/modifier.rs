// Cursormap Modifier Field
// The 16-bit modifier word of an event record

use std::fmt;
use std::str::FromStr;

use bitflags::bitflags;

bitflags! {
    /// Modifier flags of an event record.
    ///
    /// Only key-down events carry reliable modifier bits; auto-key events
    /// do not.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct Modifiers: u16 {
        const ACTIVE = 0x0001;
        const BUTTON_STATE = 0x0080;
        const COMMAND = 0x0100;
        const SHIFT = 0x0200;
        /// Alpha lock, the caps-lock indicator
        const CAPS_LOCK = 0x0400;
        const OPTION = 0x0800;
        const CONTROL = 0x1000;
        const RIGHT_SHIFT = 0x2000;
        const RIGHT_OPTION = 0x4000;
        const RIGHT_CONTROL = 0x8000;

        // Unnamed bits pass through untouched
        const _ = !0;
    }
}

impl Modifiers {
    /// Name table used for parsing and display
    const NAMES: &'static [(&'static str, Modifiers)] = &[
        ("active", Modifiers::ACTIVE),
        ("button", Modifiers::BUTTON_STATE),
        ("command", Modifiers::COMMAND),
        ("shift", Modifiers::SHIFT),
        ("caps-lock", Modifiers::CAPS_LOCK),
        ("option", Modifiers::OPTION),
        ("control", Modifiers::CONTROL),
        ("right-shift", Modifiers::RIGHT_SHIFT),
        ("right-option", Modifiers::RIGHT_OPTION),
        ("right-control", Modifiers::RIGHT_CONTROL),
    ];
}

impl fmt::Display for Modifiers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut rest = self.bits();
        let mut first = true;
        for (name, flag) in Self::NAMES {
            if self.contains(*flag) {
                if !first {
                    write!(f, "+")?;
                }
                write!(f, "{}", name)?;
                rest &= !flag.bits();
                first = false;
            }
        }
        if rest != 0 {
            if !first {
                write!(f, "+")?;
            }
            write!(f, "{:#06x}", rest)?;
        } else if first {
            write!(f, "none")?;
        }
        Ok(())
    }
}

impl FromStr for Modifiers {
    type Err = String;

    /// Parse a `+`-separated list of names such as `shift+caps-lock`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.is_empty() || trimmed.eq_ignore_ascii_case("none") {
            return Ok(Modifiers::empty());
        }

        let mut modifiers = Modifiers::empty();
        for part in trimmed.split('+') {
            let part = part.trim().to_ascii_lowercase();
            let flag = Self::NAMES
                .iter()
                .find(|(name, _)| *name == part)
                .map(|(_, flag)| *flag)
                .ok_or_else(|| format!("Unknown modifier: {}", part))?;
            modifiers.insert(flag);
        }
        Ok(modifiers)
    }
}
