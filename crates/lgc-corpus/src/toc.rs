use std::collections::HashMap;
use std::sync::Arc;

use lgc_store::{Format, Item, ItemDisk, Record};
use tracing::debug;

use crate::error::{CorpusError, CorpusResult};
use crate::names::validate_text_id;
use crate::sentence::sentence_item_name;

/// Table of contents for one language: textid → metadata record at
/// `/<langid>/toc`.
///
/// Metadata records optionally carry a space-separated list of child text
/// ids under `ch`. Parent/child is recovered on demand, not stored per
/// child: [`parent`] inverts the `ch` lists into a cached child → parent
/// map, rebuilt after any Toc mutation.
///
/// [`parent`]: Toc::parent
#[derive(Clone)]
pub struct Toc {
    disk: Arc<ItemDisk>,
    langid: String,
    item: Arc<Item>,
}

pub(crate) struct TocBacklinks {
    parent: HashMap<String, String>,
}

impl TocBacklinks {
    /// Invert every record's `ch` list in one linear scan.
    ///
    /// Two aggregates claiming the same child make the corpus malformed;
    /// the scan rejects it rather than silently letting one parent win.
    fn build(item: &Item) -> CorpusResult<Self> {
        item.with_table(|table| {
            let mut parent: HashMap<String, String> = HashMap::new();
            for (id, record) in table.iter() {
                let Some(ch) = record.get("ch") else {
                    continue;
                };
                for child in ch.split_whitespace() {
                    if let Some(first) = parent.insert(child.to_string(), id.to_string()) {
                        return Err(CorpusError::DuplicateChild {
                            child: child.to_string(),
                            first,
                            second: id.to_string(),
                        });
                    }
                }
            }
            Ok(Self { parent })
        })?
    }
}

impl Toc {
    pub(crate) fn open(disk: &Arc<ItemDisk>, langid: &str) -> CorpusResult<Self> {
        let item = disk.intern(&format!("/{langid}/toc"), Format::Table)?;
        Ok(Self {
            disk: Arc::clone(disk),
            langid: langid.to_string(),
            item,
        })
    }

    /// The language this table of contents belongs to.
    pub fn langid(&self) -> &str {
        &self.langid
    }

    pub(crate) fn disk(&self) -> &Arc<ItemDisk> {
        &self.disk
    }

    /// The item name this table is persisted under.
    pub fn item_name(&self) -> &str {
        self.item.name()
    }

    /// Number of texts.
    pub fn len(&self) -> CorpusResult<usize> {
        Ok(self.item.with_table(|t| t.len())?)
    }

    /// Returns `true` if the language has no texts.
    pub fn is_empty(&self) -> CorpusResult<bool> {
        Ok(self.item.with_table(|t| t.is_empty())?)
    }

    /// Returns `true` if a text with `textid` exists.
    pub fn contains(&self, textid: &str) -> CorpusResult<bool> {
        Ok(self.item.with_table(|t| t.contains(textid))?)
    }

    /// All text ids, in sorted order.
    pub fn ids(&self) -> CorpusResult<Vec<String>> {
        Ok(self
            .item
            .with_table(|t| t.ids().map(str::to_string).collect())?)
    }

    /// The metadata record of a text.
    pub fn metadata(&self, textid: &str) -> CorpusResult<Record> {
        self.item
            .with_table(|t| t.get(textid).cloned())?
            .ok_or_else(|| CorpusError::TextNotFound(textid.to_string()))
    }

    /// One metadata field of a text.
    pub fn get_field(&self, textid: &str, tag: &str) -> CorpusResult<Option<String>> {
        Ok(self.metadata(textid)?.get(tag).map(str::to_string))
    }

    /// Set one metadata field of a text and mark the table modified.
    pub fn set_field(&self, textid: &str, tag: &str, value: &str) -> CorpusResult<()> {
        if !self.contains(textid)? {
            return Err(CorpusError::TextNotFound(textid.to_string()));
        }
        self.item.with_table_mut(|t| {
            if let Some(row) = t.get_mut(textid) {
                row.set(tag, value);
            }
        })?;
        Ok(())
    }

    /// Add a text. A duplicate id is an error.
    pub fn insert(&self, textid: &str, record: Record) -> CorpusResult<()> {
        validate_text_id(textid)?;
        if self.contains(textid)? {
            return Err(CorpusError::DuplicateText(textid.to_string()));
        }
        self.item.with_table_mut(|t| t.insert(textid, record))?;
        Ok(())
    }

    /// Delete a text: drop the table entry (invalidating the cached
    /// parent map) and remove its sentence item from the disk.
    ///
    /// A failing backing delete propagates; the operation must not leave
    /// the entry gone while the sentence file silently survives.
    pub fn remove(&self, textid: &str) -> CorpusResult<()> {
        if !self.contains(textid)? {
            return Err(CorpusError::TextNotFound(textid.to_string()));
        }
        self.item.with_table_mut(|t| {
            t.remove(textid);
        })?;
        self.disk
            .remove(&sentence_item_name(&self.langid, textid))?;
        debug!(langid = %self.langid, textid = %textid, "removed text");
        Ok(())
    }

    /// The child text ids of a text (empty for a simple text).
    pub fn children(&self, textid: &str) -> CorpusResult<Vec<String>> {
        Ok(self
            .get_field(textid, "ch")?
            .map(|ch| ch.split_whitespace().map(str::to_string).collect())
            .unwrap_or_default())
    }

    /// Make a text an aggregate over the given children.
    pub fn set_children(&self, textid: &str, children: &[&str]) -> CorpusResult<()> {
        for child in children {
            validate_text_id(child)?;
        }
        self.set_field(textid, "ch", &children.join(" "))
    }

    /// The parent of a text, or `None` if it is a root.
    ///
    /// O(1) after the first call per table generation: the child → parent
    /// map is built once and cached until the next mutation.
    pub fn parent(&self, textid: &str) -> CorpusResult<Option<String>> {
        if !self.contains(textid)? {
            return Err(CorpusError::TextNotFound(textid.to_string()));
        }
        Ok(self.backlinks()?.parent.get(textid).cloned())
    }

    fn backlinks(&self) -> CorpusResult<Arc<TocBacklinks>> {
        self.item.cached_backlinks(|| TocBacklinks::build(&self.item))
    }
}

impl std::fmt::Debug for Toc {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Toc").field("langid", &self.langid).finish()
    }
}
