// Cursormap Engine State
// The two cells carried between polls

/// State carried from one poll to the next.
///
/// Lets a held key keep repeating as its substitute even though auto-key
/// events carry no modifier bits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineState {
    /// Physical key code of the most recent substitution
    pub last_remapped_key: Option<u8>,
    /// Whether the most recent inspected event was substituted
    pub last_event_was_remap: bool,
}

impl EngineState {
    /// Install-time state: no key, no remap
    pub fn new() -> Self {
        Self::default()
    }

    /// True if `key` continues the previous substitution
    pub fn is_continuation(&self, key: u8) -> bool {
        self.last_event_was_remap && self.last_remapped_key == Some(key)
    }

    /// Record a substitution of `key`
    pub fn record_remap(&mut self, key: u8) {
        self.last_remapped_key = Some(key);
        self.last_event_was_remap = true;
    }

    /// Break any repeat continuation. The last key is kept.
    pub fn break_chain(&mut self) {
        self.last_event_was_remap = false;
    }
}
