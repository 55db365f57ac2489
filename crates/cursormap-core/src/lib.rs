// Cursormap Core Library
// Key substitution filter over a legacy "get next event" call

pub mod config;
pub mod engine;
pub mod event;
pub mod mode;
pub mod modifier;
pub mod patch_block;
pub mod source;
pub mod state;
pub mod table;

pub use config::{default_config_content, Config, ConfigError};
pub use engine::{ContinuationPolicy, EngineConfig, RemapEngine, RemapOutcome};
pub use event::{EventKind, EventMask, EventRecord, Point};
pub use mode::ModifierMode;
pub use modifier::Modifiers;
pub use patch_block::{PatchBlock, PatchBlockError};
pub use source::{EventSource, FnSource, ScriptedSource};
pub use state::EngineState;
pub use table::{KeyPreset, Replacement, SubstitutionEntry, SubstitutionTable};
