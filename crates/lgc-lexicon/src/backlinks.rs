use std::collections::HashMap;

use lgc_store::{Item, StoreResult};
use tracing::debug;

/// Inverted derivational indices for one lexicon.
///
/// Built in a single additive pass over the lexicon table: every entry in
/// a record's `pp` list contributes a part → whole edge, every `cf`
/// reference a canonical → variant edge. Multiple wholes referencing one
/// part accumulate; nothing is ever overwritten. The structure is cached
/// on the lexicon item and rebuilt after the next mutation.
#[derive(Debug, Default)]
pub struct LexiconBacklinks {
    part_of: HashMap<String, Vec<String>>,
    variants: HashMap<String, Vec<String>>,
}

impl LexiconBacklinks {
    /// Build the indices by scanning every record of the lexicon item.
    pub(crate) fn build(item: &Item) -> StoreResult<Self> {
        let built = item.with_table(|table| {
            let mut bl = Self::default();
            for (form, record) in table.iter() {
                if let Some(pp) = record.get("pp") {
                    for part in pp.split_whitespace() {
                        bl.part_of
                            .entry(part.to_string())
                            .or_default()
                            .push(form.to_string());
                    }
                }
                if let Some(cf) = record.get("cf") {
                    bl.variants
                        .entry(cf.to_string())
                        .or_default()
                        .push(form.to_string());
                }
            }
            bl
        })?;
        debug!(
            item = %item.name(),
            parts = built.part_of.len(),
            canonicals = built.variants.len(),
            "built lexicon backlinks"
        );
        Ok(built)
    }

    /// Forms that list `form` among their constituents.
    pub fn wholes(&self, form: &str) -> &[String] {
        self.part_of.get(form).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Variant spellings whose canonical form is `form`.
    pub fn variant_forms(&self, form: &str) -> &[String] {
        self.variants.get(form).map(Vec::as_slice).unwrap_or(&[])
    }
}
