// Cursormap Patch Block
// Hand-editable table embedded in a filter's code image
//
// Layout, starting anywhere in the image:
//   "KEYMAP>>\0"   start marker
//   4 bytes        source key codes
//   1 byte         modifier mode (0, 1, 2)
//   "<<KEYMAP\0"   end marker
//   0-1 bytes      padding to an even offset
//   4 x u16 BE     replacements

use crate::engine::EngineConfig;
use crate::table::{Replacement, SubstitutionEntry, SubstitutionTable, TABLE_LEN};
use crate::ModifierMode;

/// Marker in front of the editable block
pub const START_MARKER: &[u8] = b"KEYMAP>>\0";

/// Marker between the key bytes and the replacements
pub const END_MARKER: &[u8] = b"<<KEYMAP\0";

/// Errors decoding a patch block
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum PatchBlockError {
    #[error("start marker not found")]
    MissingStartMarker,

    #[error("end marker not found at offset {0}")]
    MissingEndMarker(usize),

    #[error("image ends inside the patch block (needed {needed} bytes at offset {offset})")]
    Truncated { offset: usize, needed: usize },

    #[error("invalid modifier mode byte: {0}")]
    InvalidMode(u8),
}

/// A decoded patch block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PatchBlock {
    /// Offset of the start marker within the image
    pub offset: usize,
    pub table: SubstitutionTable,
    pub mode: ModifierMode,
}

impl PatchBlock {
    /// Engine configuration using the block's table and mode
    pub fn to_engine_config(&self) -> EngineConfig {
        EngineConfig::new(self.table, self.mode)
    }
}

fn take<'a>(image: &'a [u8], offset: usize, needed: usize) -> Result<&'a [u8], PatchBlockError> {
    image
        .get(offset..offset + needed)
        .ok_or(PatchBlockError::Truncated { offset, needed })
}

/// Locate and decode the first patch block in an image
pub fn decode(image: &[u8]) -> Result<PatchBlock, PatchBlockError> {
    let offset = image
        .windows(START_MARKER.len())
        .position(|window| window == START_MARKER)
        .ok_or(PatchBlockError::MissingStartMarker)?;

    let mut cursor = offset + START_MARKER.len();
    let keys = take(image, cursor, TABLE_LEN)?;
    cursor += TABLE_LEN;

    let mode_byte = take(image, cursor, 1)?[0];
    let mode = ModifierMode::from_u8(mode_byte).ok_or(PatchBlockError::InvalidMode(mode_byte))?;
    cursor += 1;

    if take(image, cursor, END_MARKER.len())? != END_MARKER {
        return Err(PatchBlockError::MissingEndMarker(cursor));
    }
    cursor += END_MARKER.len();
    cursor += cursor % 2;

    let words = take(image, cursor, TABLE_LEN * 2)?;
    let mut entries = [SubstitutionEntry::default(); TABLE_LEN];
    for (i, entry) in entries.iter_mut().enumerate() {
        let replacement = u16::from_be_bytes([words[i * 2], words[i * 2 + 1]]);
        *entry = SubstitutionEntry::new(keys[i], Replacement(replacement));
    }

    log::debug!("patch block at offset {:#x}: mode={}", offset, mode);

    Ok(PatchBlock {
        offset,
        table: SubstitutionTable::new(entries),
        mode,
    })
}

/// Encode a table and mode as a patch block starting at an even offset
pub fn encode(table: &SubstitutionTable, mode: ModifierMode) -> Vec<u8> {
    let mut block = Vec::with_capacity(32);
    block.extend_from_slice(START_MARKER);
    block.extend(table.entries().iter().map(|entry| entry.source_key));
    block.push(mode.to_u8());
    block.extend_from_slice(END_MARKER);
    if block.len() % 2 != 0 {
        block.push(0);
    }
    for entry in table.entries() {
        block.extend_from_slice(&entry.replacement.0.to_be_bytes());
    }
    block
}
