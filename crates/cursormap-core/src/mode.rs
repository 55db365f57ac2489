// Cursormap Modifier Mode
// Which modifier gates a substitution, and what happens to it afterwards

use strum_macros::{Display, EnumIter, EnumString, IntoStaticStr};

use crate::Modifiers;

/// Gating mode of the remap engine.
///
/// The legacy patch block stores this as a single byte:
///   0 == option
///   1 == caps lock, normal caps behavior kept
///   2 == caps lock, caps behavior neutralized
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Display, EnumString, EnumIter, IntoStaticStr,
)]
#[strum(ascii_case_insensitive)]
pub enum ModifierMode {
    /// Substitute while option is held; clear option on the rewritten event
    #[strum(to_string = "option")]
    OptionGated,
    /// Substitute while caps lock is on; clear caps lock on the rewritten event
    #[strum(to_string = "caps-lock")]
    CapsLockGatedPreserving,
    /// Substitute while caps lock is on; hide caps lock from every key event
    #[default]
    #[strum(to_string = "caps-lock-neutralizing")]
    CapsLockGatedNeutralizing,
}

impl ModifierMode {
    /// Create a ModifierMode from its patch-block byte
    pub fn from_u8(value: u8) -> Option<Self> {
        match value {
            0 => Some(ModifierMode::OptionGated),
            1 => Some(ModifierMode::CapsLockGatedPreserving),
            2 => Some(ModifierMode::CapsLockGatedNeutralizing),
            _ => None,
        }
    }

    /// Convert to the patch-block byte
    pub fn to_u8(self) -> u8 {
        match self {
            ModifierMode::OptionGated => 0,
            ModifierMode::CapsLockGatedPreserving => 1,
            ModifierMode::CapsLockGatedNeutralizing => 2,
        }
    }

    /// The modifier bit that must be set on a key-down for a substitution
    pub fn gate(self) -> Modifiers {
        match self {
            ModifierMode::OptionGated => Modifiers::OPTION,
            ModifierMode::CapsLockGatedPreserving | ModifierMode::CapsLockGatedNeutralizing => {
                Modifiers::CAPS_LOCK
            }
        }
    }

    /// True for the mode that hides caps lock from every key event
    pub fn neutralizes_caps_lock(self) -> bool {
        matches!(self, ModifierMode::CapsLockGatedNeutralizing)
    }
}
