use std::collections::BTreeMap;
use std::sync::Arc;

use lgc_store::{Format, Item, ItemDisk, Record, Table};

use crate::error::LexiconResult;
use crate::lexicon::validate_form;
use crate::loc::Loc;

/// Per-language token index: form → direct occurrence locations.
///
/// Persisted as a table item at `/<langid>/index`; each row's `oo` field
/// holds a comma-separated list of [`Loc`]s. The index is regenerated
/// from the corpus texts rather than edited by hand, so rows without
/// occurrences are dropped on rewrite.
#[derive(Clone)]
pub struct TokenIndex {
    item: Arc<Item>,
}

impl TokenIndex {
    /// Open the token index for `langid`.
    pub fn open(disk: &Arc<ItemDisk>, langid: &str) -> LexiconResult<Self> {
        let item = disk.intern(&format!("/{langid}/index"), Format::Table)?;
        Ok(Self { item })
    }

    /// The item name this index is persisted under.
    pub fn item_name(&self) -> &str {
        self.item.name()
    }

    /// Forms with at least one recorded occurrence, in sorted order.
    pub fn forms(&self) -> LexiconResult<Vec<String>> {
        Ok(self
            .item
            .with_table(|t| t.ids().map(str::to_string).collect())?)
    }

    /// Direct occurrence locations for `form` (empty when unrecorded).
    pub fn locations(&self, form: &str) -> LexiconResult<Vec<Loc>> {
        self.item.with_table(|t| match t.get(form) {
            Some(row) => row
                .get("oo")
                .unwrap_or("")
                .split(',')
                .filter(|s| !s.is_empty())
                .map(str::parse)
                .collect(),
            None => Ok(Vec::new()),
        })?
    }

    /// Number of direct occurrences recorded for `form`.
    pub fn occurrence_count(&self, form: &str) -> LexiconResult<usize> {
        Ok(self.locations(form)?.len())
    }

    /// Append one occurrence of `form`.
    pub fn add_location(&self, form: &str, loc: &Loc) -> LexiconResult<()> {
        validate_form(form)?;
        self.item.with_table_mut(|t| {
            let mut row = t.remove(form).unwrap_or_default();
            let oo = match row.get("oo") {
                Some(prior) if !prior.is_empty() => format!("{prior},{loc}"),
                _ => loc.to_string(),
            };
            row.set("oo", oo);
            t.insert(form, row);
        })?;
        Ok(())
    }

    /// Replace the whole index. Forms with no occurrences are dropped.
    pub fn replace_all(&self, entries: &BTreeMap<String, Vec<Loc>>) -> LexiconResult<()> {
        for form in entries.keys() {
            validate_form(form)?;
        }
        self.item.with_table_mut(|t| {
            let mut table = Table::new();
            for (form, locs) in entries {
                if locs.is_empty() {
                    continue;
                }
                let rendered: Vec<String> = locs.iter().map(Loc::to_string).collect();
                let mut row = Record::new();
                row.set("oo", rendered.join(","));
                table.insert(form, row);
            }
            *t = table;
        })?;
        Ok(())
    }

    /// Drop every recorded occurrence.
    pub fn clear(&self) -> LexiconResult<()> {
        self.item.with_table_mut(|t| *t = Table::new())?;
        Ok(())
    }
}

impl std::fmt::Debug for TokenIndex {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenIndex")
            .field("item", &self.item.name())
            .finish()
    }
}
