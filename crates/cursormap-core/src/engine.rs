// Cursormap Remap Engine
// Tail filter over the system's "get next event" call
//
// Calls through to the wrapped source first, then inspects key-down and
// auto-key events:
// - a key is substituted when the gating modifier is down, or when it
//   repeats the key substituted on the previous event
// - the gating modifier is cleared from a substituted event
// - in neutralizing mode caps lock is hidden from every key event and
//   unshifted capitals are folded to lowercase

use strum_macros::{Display, EnumString};

use crate::event::{EventMask, EventRecord};
use crate::source::EventSource;
use crate::table::{Replacement, SubstitutionTable};
use crate::{EngineState, ModifierMode, Modifiers};

/// Offset between an ASCII capital and its lowercase letter
const CASE_OFFSET: u8 = b'a' - b'A';

/// What to do with the continuation state when a substitution is attempted
/// but the key is not in the table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString)]
#[strum(serialize_all = "kebab-case", ascii_case_insensitive)]
pub enum ContinuationPolicy {
    /// Leave the state untouched; a stale continuation may survive
    #[default]
    Preserve,
    /// Clear the continuation flag
    ResetOnMiss,
}

/// Configuration for the remap engine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct EngineConfig {
    /// The four substitutions
    pub table: SubstitutionTable,
    /// Which modifier gates substitution
    pub mode: ModifierMode,
    /// Continuation handling on an attempted miss
    pub continuation: ContinuationPolicy,
}

impl EngineConfig {
    pub fn new(table: SubstitutionTable, mode: ModifierMode) -> Self {
        Self {
            table,
            mode,
            continuation: ContinuationPolicy::default(),
        }
    }

    pub fn with_continuation(mut self, continuation: ContinuationPolicy) -> Self {
        self.continuation = continuation;
        self
    }
}

/// Result of inspecting a single event
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RemapOutcome {
    /// Event left exactly as the source produced it
    Unchanged,
    /// Key payload replaced
    Substituted(Replacement),
    /// Only caps lock neutralization touched the event
    Neutralized,
}

/// Remap engine wrapping the next event source in the chain.
///
/// Single-threaded: every poll runs to completion and mutates the engine's
/// own state in place.
#[derive(Debug)]
pub struct RemapEngine<S> {
    source: S,
    config: EngineConfig,
    state: EngineState,
}

impl<S: EventSource> RemapEngine<S> {
    /// Create a new engine in its install-time state
    pub fn new(source: S, config: EngineConfig) -> Self {
        log::debug!(
            "remap engine installed: mode={} continuation={}",
            config.mode,
            config.continuation
        );
        Self {
            source,
            config,
            state: EngineState::new(),
        }
    }

    /// Shortcut for a table and mode with the default continuation policy
    pub fn with_table_and_mode(source: S, table: SubstitutionTable, mode: ModifierMode) -> Self {
        Self::new(source, EngineConfig::new(table, mode))
    }

    /// Poll the wrapped source and filter the result.
    ///
    /// Returns the availability flag and the (possibly rewritten) event,
    /// exactly as the wrapped source would.
    pub fn poll(&mut self, mask: EventMask) -> (bool, EventRecord) {
        let mut event = EventRecord::default();
        let available = self.get_next_event(mask, &mut event);
        (available, event)
    }

    /// Call through to the wrapped source and filter what it returns.
    ///
    /// None when the source had no event; the record then holds whatever
    /// the source wrote.
    pub fn filter_next(&mut self, mask: EventMask, event: &mut EventRecord) -> Option<RemapOutcome> {
        if self.source.get_next_event(mask, event) {
            Some(self.remap(event))
        } else {
            None
        }
    }

    /// Get the engine configuration
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Get the carried state
    pub fn state(&self) -> &EngineState {
        &self.state
    }

    /// Get the wrapped source
    pub fn source(&self) -> &S {
        &self.source
    }

    /// Get the wrapped source mutably
    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    /// Consume the engine, returning the wrapped source
    pub fn into_source(self) -> S {
        self.source
    }

    /// Restore the install-time state
    pub fn reset(&mut self) {
        self.state = EngineState::new();
    }

    /// Inspect one available event and rewrite it in place.
    ///
    /// Events other than key-down and auto-key are left alone and do not
    /// touch the carried state.
    pub fn remap(&mut self, event: &mut EventRecord) -> RemapOutcome {
        if !event.what.is_key_press() {
            return RemapOutcome::Unchanged;
        }

        let original = *event;
        let key = event.key_code();
        let mode = self.config.mode;

        // Auto-key events carry no usable modifier bits
        let modifier_active = !event.what.is_repeat() && event.modifiers.contains(mode.gate());
        let is_continuation = self.state.is_continuation(key);

        let mut outcome = RemapOutcome::Unchanged;
        if modifier_active || is_continuation {
            match self.config.table.lookup(key) {
                Some(replacement) => {
                    event.set_key_payload(replacement.0);
                    match mode {
                        ModifierMode::OptionGated => event.modifiers.remove(Modifiers::OPTION),
                        ModifierMode::CapsLockGatedPreserving => {
                            event.modifiers.remove(Modifiers::CAPS_LOCK)
                        }
                        // Cleared below on every key event
                        ModifierMode::CapsLockGatedNeutralizing => {}
                    }
                    self.state.record_remap(key);
                    outcome = RemapOutcome::Substituted(replacement);
                    log::trace!(
                        "{} key {:#04X} -> {} (continuation: {})",
                        event.what,
                        key,
                        replacement,
                        is_continuation && !modifier_active
                    );
                }
                None => {
                    if self.config.continuation == ContinuationPolicy::ResetOnMiss {
                        self.state.break_chain();
                    }
                }
            }
        } else {
            self.state.break_chain();
        }

        if mode.neutralizes_caps_lock() {
            neutralize_caps_lock(event);
        }

        match outcome {
            RemapOutcome::Unchanged if *event != original => RemapOutcome::Neutralized,
            other => other,
        }
    }
}

impl<S: EventSource> EventSource for RemapEngine<S> {
    fn get_next_event(&mut self, mask: EventMask, event: &mut EventRecord) -> bool {
        self.filter_next(mask, event).is_some()
    }
}

/// Hide caps lock from an event and undo its effect on letters.
///
/// Capitals typed with shift held are left as they are.
fn neutralize_caps_lock(event: &mut EventRecord) {
    event.modifiers.remove(Modifiers::CAPS_LOCK);

    let char_code = event.char_code();
    if char_code.is_ascii_uppercase() && !event.modifiers.contains(Modifiers::SHIFT) {
        event.set_char_code(char_code + CASE_OFFSET);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::event::EventKind;
    use crate::source::ScriptedSource;
    use crate::table::SubstitutionEntry;

    fn key_down(key: u8, ch: u8, modifiers: Modifiers) -> EventRecord {
        EventRecord::key(EventKind::KeyDown, key, ch, modifiers)
    }

    fn auto_key(key: u8, ch: u8) -> EventRecord {
        EventRecord::key(EventKind::AutoKey, key, ch, Modifiers::empty())
    }

    fn engine(mode: ModifierMode) -> RemapEngine<ScriptedSource> {
        RemapEngine::with_table_and_mode(ScriptedSource::new(), SubstitutionTable::default(), mode)
    }

    #[test]
    fn test_option_gated_substitution_keeps_shift() {
        let mut engine = engine(ModifierMode::OptionGated);
        let mut event = key_down(0x1E, b']', Modifiers::OPTION | Modifiers::SHIFT);
        event.message |= 0x0012_0000;

        let outcome = engine.remap(&mut event);

        assert_eq!(outcome, RemapOutcome::Substituted(Replacement::DOWN_ARROW));
        assert_eq!(event.message, 0x0012_481F);
        assert_eq!(event.modifiers, Modifiers::SHIFT);
        assert_eq!(engine.state().last_remapped_key, Some(0x1E));
        assert!(engine.state().last_event_was_remap);
    }

    #[test]
    fn test_option_gated_without_option_passes_through() {
        let mut engine = engine(ModifierMode::OptionGated);
        let mut event = key_down(0x18, b'=', Modifiers::CAPS_LOCK);
        let before = event;

        assert_eq!(engine.remap(&mut event), RemapOutcome::Unchanged);
        assert_eq!(event, before);
    }

    #[test]
    fn test_caps_lock_preserving_clears_only_caps_lock() {
        let mut engine = engine(ModifierMode::CapsLockGatedPreserving);
        let mut event = key_down(0x21, b'[', Modifiers::CAPS_LOCK | Modifiers::COMMAND);

        engine.remap(&mut event);

        assert_eq!(event.key_payload(), 0x461C);
        assert_eq!(event.modifiers, Modifiers::COMMAND);
    }

    #[test]
    fn test_caps_lock_preserving_does_not_fold_case() {
        let mut engine = engine(ModifierMode::CapsLockGatedPreserving);
        let mut event = key_down(0x0E, b'E', Modifiers::CAPS_LOCK);

        assert_eq!(engine.remap(&mut event), RemapOutcome::Unchanged);
        assert_eq!(event.char_code(), b'E');
        assert!(event.modifiers.contains(Modifiers::CAPS_LOCK));
    }

    #[test]
    fn test_neutralizing_folds_unmapped_capitals() {
        let mut engine = engine(ModifierMode::CapsLockGatedNeutralizing);
        let mut event = key_down(0x0E, b'E', Modifiers::CAPS_LOCK);

        assert_eq!(engine.remap(&mut event), RemapOutcome::Neutralized);
        assert_eq!(event.char_code(), b'e');
        assert_eq!(event.key_code(), 0x0E);
        assert_eq!(event.modifiers, Modifiers::empty());
    }

    #[test]
    fn test_neutralizing_keeps_shifted_capitals() {
        let mut engine = engine(ModifierMode::CapsLockGatedNeutralizing);
        let mut event = key_down(0x0E, b'E', Modifiers::CAPS_LOCK | Modifiers::SHIFT);

        engine.remap(&mut event);

        assert_eq!(event.char_code(), b'E');
        assert_eq!(event.modifiers, Modifiers::SHIFT);
    }

    #[test]
    fn test_neutralizing_leaves_non_letters() {
        let mut engine = engine(ModifierMode::CapsLockGatedNeutralizing);
        let mut event = key_down(0x12, b'1', Modifiers::empty());
        let before = event;

        assert_eq!(engine.remap(&mut event), RemapOutcome::Unchanged);
        assert_eq!(event, before);
    }

    #[test]
    fn test_neutralizing_applies_to_auto_key() {
        let mut engine = engine(ModifierMode::CapsLockGatedNeutralizing);
        let mut repeat = EventRecord::key(EventKind::AutoKey, 0x04, b'H', Modifiers::CAPS_LOCK);

        assert_eq!(engine.remap(&mut repeat), RemapOutcome::Neutralized);
        assert_eq!(repeat.key_payload(), 0x0468);
        assert_eq!(repeat.modifiers, Modifiers::empty());
    }

    #[test]
    fn test_neutralizing_folds_substituted_character() {
        let table = SubstitutionTable::new([
            SubstitutionEntry::new(0x18, Replacement(0x4D1E)),
            SubstitutionEntry::new(0x21, Replacement(0x461C)),
            SubstitutionEntry::new(0x1E, Replacement(0x481F)),
            SubstitutionEntry::new(0x22, Replacement(0x4D41)),
        ]);
        let mut engine = RemapEngine::with_table_and_mode(
            ScriptedSource::new(),
            table,
            ModifierMode::CapsLockGatedNeutralizing,
        );

        // The replacement carries 'A'; the fold sees it, not the typed 'i'
        let mut event = key_down(0x22, b'i', Modifiers::CAPS_LOCK);
        assert_eq!(
            engine.remap(&mut event),
            RemapOutcome::Substituted(Replacement(0x4D41))
        );
        assert_eq!(event.key_payload(), 0x4D61);
        assert_eq!(event.modifiers, Modifiers::empty());

        let mut shifted = key_down(0x22, b'I', Modifiers::CAPS_LOCK | Modifiers::SHIFT);
        engine.remap(&mut shifted);
        assert_eq!(shifted.key_payload(), 0x4D41);
        assert_eq!(shifted.modifiers, Modifiers::SHIFT);
    }

    #[test]
    fn test_auto_key_continues_substitution() {
        let mut engine = engine(ModifierMode::CapsLockGatedNeutralizing);
        let mut down = key_down(0x18, b'=', Modifiers::CAPS_LOCK);
        engine.remap(&mut down);

        let mut repeat = auto_key(0x18, b'=');
        let outcome = engine.remap(&mut repeat);

        assert_eq!(outcome, RemapOutcome::Substituted(Replacement::UP_ARROW));
        assert_eq!(repeat.key_payload(), 0x4D1E);
    }

    #[test]
    fn test_auto_key_without_prior_remap_is_not_substituted() {
        let mut engine = engine(ModifierMode::OptionGated);
        // Even with the gate bit present, auto-key modifiers are ignored
        let mut repeat = EventRecord::key(EventKind::AutoKey, 0x18, b'=', Modifiers::OPTION);
        let before = repeat;

        assert_eq!(engine.remap(&mut repeat), RemapOutcome::Unchanged);
        assert_eq!(repeat, before);
        assert!(!engine.state().last_event_was_remap);
    }

    #[test]
    fn test_ungated_key_down_breaks_chain() {
        let mut engine = engine(ModifierMode::OptionGated);
        engine.remap(&mut key_down(0x18, b'=', Modifiers::OPTION));
        engine.remap(&mut key_down(0x21, b'[', Modifiers::empty()));

        let mut repeat = auto_key(0x18, b'=');
        assert_eq!(engine.remap(&mut repeat), RemapOutcome::Unchanged);
        assert_eq!(repeat.key_payload(), 0x183D);
    }

    #[test]
    fn test_key_down_of_same_key_continues_without_gate() {
        let mut engine = engine(ModifierMode::OptionGated);
        engine.remap(&mut key_down(0x18, b'=', Modifiers::OPTION));

        let mut again = key_down(0x18, b'=', Modifiers::empty());
        assert_eq!(
            engine.remap(&mut again),
            RemapOutcome::Substituted(Replacement::UP_ARROW)
        );
    }

    #[test]
    fn test_attempted_miss_preserves_continuation() {
        let mut engine = engine(ModifierMode::OptionGated);
        engine.remap(&mut key_down(0x18, b'=', Modifiers::OPTION));

        // Gated but unmapped: state is left as-is
        let mut miss = key_down(0x00, b'a', Modifiers::OPTION);
        assert_eq!(engine.remap(&mut miss), RemapOutcome::Unchanged);
        assert_eq!(engine.state().last_remapped_key, Some(0x18));
        assert!(engine.state().last_event_was_remap);

        let mut repeat = auto_key(0x18, b'=');
        assert_eq!(
            engine.remap(&mut repeat),
            RemapOutcome::Substituted(Replacement::UP_ARROW)
        );
    }

    #[test]
    fn test_attempted_miss_resets_with_policy() {
        let config = EngineConfig::new(SubstitutionTable::default(), ModifierMode::OptionGated)
            .with_continuation(ContinuationPolicy::ResetOnMiss);
        let mut engine = RemapEngine::new(ScriptedSource::new(), config);
        engine.remap(&mut key_down(0x18, b'=', Modifiers::OPTION));
        engine.remap(&mut key_down(0x00, b'a', Modifiers::OPTION));

        assert!(!engine.state().last_event_was_remap);
        let mut repeat = auto_key(0x18, b'=');
        assert_eq!(engine.remap(&mut repeat), RemapOutcome::Unchanged);
    }

    #[test]
    fn test_last_match_wins() {
        let table = SubstitutionTable::new([
            SubstitutionEntry::new(0x12, Replacement(0x4D1E)),
            SubstitutionEntry::new(0x13, Replacement(0x461C)),
            SubstitutionEntry::new(0x12, Replacement(0x481F)),
            SubstitutionEntry::new(0x14, Replacement(0x421D)),
        ]);
        let mut engine =
            RemapEngine::with_table_and_mode(ScriptedSource::new(), table, ModifierMode::OptionGated);
        let mut event = key_down(0x12, b'1', Modifiers::OPTION);

        engine.remap(&mut event);

        assert_eq!(event.key_payload(), 0x481F);
    }

    #[test]
    fn test_other_kinds_leave_state_alone() {
        let mut engine = engine(ModifierMode::CapsLockGatedNeutralizing);
        engine.remap(&mut key_down(0x18, b'=', Modifiers::CAPS_LOCK));
        let state = *engine.state();

        let mut key_up = EventRecord::key(EventKind::KeyUp, 0x0E, b'E', Modifiers::CAPS_LOCK);
        let before = key_up;
        assert_eq!(engine.remap(&mut key_up), RemapOutcome::Unchanged);
        assert_eq!(key_up, before);
        assert_eq!(*engine.state(), state);
    }

    #[test]
    fn test_reset_restores_install_state() {
        let mut engine = engine(ModifierMode::OptionGated);
        engine.remap(&mut key_down(0x18, b'=', Modifiers::OPTION));
        engine.reset();
        assert_eq!(*engine.state(), EngineState::new());
    }

    #[test]
    fn test_poll_without_event_is_transparent() {
        let mut engine = engine(ModifierMode::CapsLockGatedNeutralizing);
        let (available, event) = engine.poll(EventMask::EVERY_EVENT);
        assert!(!available);
        assert_eq!(event, EventRecord::default());
        assert_eq!(engine.source().calls(), 1);
    }

    #[test]
    fn test_filter_next_reports_outcome() {
        let source = ScriptedSource::from_events([
            key_down(0x18, b'=', Modifiers::CAPS_LOCK),
            key_down(0x0E, b'E', Modifiers::CAPS_LOCK),
        ]);
        let mut engine = RemapEngine::new(source, EngineConfig::default());
        let mut event = EventRecord::default();

        assert_eq!(
            engine.filter_next(EventMask::EVERY_EVENT, &mut event),
            Some(RemapOutcome::Substituted(Replacement::UP_ARROW))
        );
        assert_eq!(
            engine.filter_next(EventMask::EVERY_EVENT, &mut event),
            Some(RemapOutcome::Neutralized)
        );
        assert_eq!(engine.filter_next(EventMask::EVERY_EVENT, &mut event), None);
    }

    #[test]
    fn test_continuation_policy_names() {
        assert_eq!(
            "reset-on-miss".parse::<ContinuationPolicy>().unwrap(),
            ContinuationPolicy::ResetOnMiss
        );
        assert_eq!(ContinuationPolicy::Preserve.to_string(), "preserve");
    }
}
