// Cursormap Substitution Table
// Fixed four-entry map from physical key code to replacement payload

use std::fmt;

/// Number of entries in a substitution table
pub const TABLE_LEN: usize = 4;

/// Two-byte replacement payload.
///
/// High byte is the replacement key code, low byte the replacement character
/// code. The value 0x0000 marks an empty slot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[repr(transparent)]
pub struct Replacement(pub u16);

impl Replacement {
    pub const UP_ARROW: Replacement = Replacement(0x4D1E);
    pub const LEFT_ARROW: Replacement = Replacement(0x461C);
    pub const DOWN_ARROW: Replacement = Replacement(0x481F);
    pub const RIGHT_ARROW: Replacement = Replacement(0x421D);

    /// Build from a key code and character code
    pub fn new(key_code: u8, char_code: u8) -> Self {
        Replacement(u16::from_be_bytes([key_code, char_code]))
    }

    /// Replacement key code
    pub fn key_code(self) -> u8 {
        self.0.to_be_bytes()[0]
    }

    /// Replacement character code
    pub fn char_code(self) -> u8 {
        self.0.to_be_bytes()[1]
    }

    /// True for the empty slot value
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl fmt::Display for Replacement {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:#06X}", self.0)
    }
}

/// One row of the table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct SubstitutionEntry {
    pub source_key: u8,
    pub replacement: Replacement,
}

impl SubstitutionEntry {
    pub fn new(source_key: u8, replacement: Replacement) -> Self {
        Self {
            source_key,
            replacement,
        }
    }
}

/// Named key sets for the four source keys, in up/left/down/right order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyPreset {
    /// `= [ ] \`
    Brackets,
    /// `I J K L`
    Ijkl,
    /// `W A S D`
    Wasd,
    /// Keypad `8 4 5 6`
    Keypad,
}

impl KeyPreset {
    /// Source key codes for this preset
    pub fn keys(self) -> [u8; TABLE_LEN] {
        match self {
            KeyPreset::Brackets => [0x18, 0x21, 0x1E, 0x2A],
            KeyPreset::Ijkl => [0x22, 0x26, 0x28, 0x25],
            KeyPreset::Wasd => [0x0D, 0x00, 0x01, 0x02],
            KeyPreset::Keypad => [0x5B, 0x56, 0x57, 0x58],
        }
    }

    /// Look up a preset by name
    pub fn from_name(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "brackets" => Some(KeyPreset::Brackets),
            "ijkl" => Some(KeyPreset::Ijkl),
            "wasd" => Some(KeyPreset::Wasd),
            "keypad" => Some(KeyPreset::Keypad),
            _ => None,
        }
    }
}

/// Ordered table of exactly four substitutions.
///
/// Lookup scans every entry without stopping early, so when two entries share
/// a source key the later one wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubstitutionTable {
    entries: [SubstitutionEntry; TABLE_LEN],
}

impl SubstitutionTable {
    /// Create a table from its four entries
    pub fn new(entries: [SubstitutionEntry; TABLE_LEN]) -> Self {
        Self { entries }
    }

    /// Pair four source keys with the four arrow replacements
    pub fn arrows_for(keys: [u8; TABLE_LEN]) -> Self {
        let replacements = [
            Replacement::UP_ARROW,
            Replacement::LEFT_ARROW,
            Replacement::DOWN_ARROW,
            Replacement::RIGHT_ARROW,
        ];
        let mut entries = [SubstitutionEntry::default(); TABLE_LEN];
        for (entry, (key, replacement)) in entries.iter_mut().zip(keys.into_iter().zip(replacements)) {
            *entry = SubstitutionEntry::new(key, replacement);
        }
        Self { entries }
    }

    /// Arrow table for a named key preset
    pub fn from_preset(preset: KeyPreset) -> Self {
        Self::arrows_for(preset.keys())
    }

    /// Get all entries in scan order
    pub fn entries(&self) -> &[SubstitutionEntry; TABLE_LEN] {
        &self.entries
    }

    /// Find the replacement for a key.
    ///
    /// Returns the replacement of the last entry whose source key matches,
    /// or None when nothing matches or the last match is an empty slot.
    pub fn lookup(&self, key: u8) -> Option<Replacement> {
        let mut found = Replacement::default();
        for entry in &self.entries {
            if entry.source_key == key {
                found = entry.replacement;
            }
        }
        (!found.is_empty()).then_some(found)
    }

    /// Source keys that appear in more than one entry
    pub fn duplicate_keys(&self) -> Vec<u8> {
        let mut duplicates = Vec::new();
        for (i, entry) in self.entries.iter().enumerate() {
            let repeated = self.entries[..i]
                .iter()
                .any(|earlier| earlier.source_key == entry.source_key);
            if repeated && !duplicates.contains(&entry.source_key) {
                duplicates.push(entry.source_key);
            }
        }
        duplicates
    }
}

impl Default for SubstitutionTable {
    fn default() -> Self {
        Self::from_preset(KeyPreset::Brackets)
    }
}
