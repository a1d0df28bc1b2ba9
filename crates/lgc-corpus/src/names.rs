//! Language and text id validation.
//!
//! Ids become path segments of item names and members of space-separated
//! child lists, and text ids additionally prefix dotted token locations,
//! so the forbidden characters follow from those encodings.

use crate::error::{CorpusError, CorpusResult};

/// The language table's own item lives at `/langs`, so no language may
/// take that id.
const RESERVED_LANG_IDS: &[&str] = &["langs"];

fn valid_id_chars(id: &str) -> bool {
    !id.is_empty()
        && !id
            .chars()
            .any(|c| c == '/' || c == '.' || c.is_whitespace())
}

/// Validate a language id.
pub fn validate_lang_id(id: &str) -> CorpusResult<()> {
    if !valid_id_chars(id) || RESERVED_LANG_IDS.contains(&id) {
        return Err(CorpusError::InvalidId(id.to_string()));
    }
    Ok(())
}

/// Validate a text id.
pub fn validate_text_id(id: &str) -> CorpusResult<()> {
    if !valid_id_chars(id) {
        return Err(CorpusError::InvalidId(id.to_string()));
    }
    Ok(())
}
