//! Record formats: the codecs that parse a raw item file into an
//! in-memory structure and serialize it back.
//!
//! Three concrete formats are provided:
//!
//! - [`records`] -- a flat list of [`Record`]s
//! - [`tables`] -- an id-keyed [`Table`], layered on the records codec
//! - [`plists`] -- a list of property-lists, where duplicate tags and tag
//!   order are significant (sentence storage)
//!
//! [`Format`] names the codec an [`crate::Item`] uses; [`Contents`] is the
//! parsed payload it caches.

use std::collections::BTreeMap;
use std::fmt;

use crate::error::{StoreError, StoreResult};
use crate::record::Record;

/// Which record codec an item uses.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Format {
    /// Id-keyed table of records.
    Table,
    /// List of property-lists.
    Plists,
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Format::Table => f.write_str("table"),
            Format::Plists => f.write_str("plists"),
        }
    }
}

/// An id-keyed table of records.
///
/// Keys are the records' `id` fields. Iteration is in key order, which
/// also makes serialization deterministic.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Table {
    rows: BTreeMap<String, Record>,
}

impl Table {
    /// Create an empty table.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Returns `true` if the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Returns `true` if a row with `id` exists.
    pub fn contains(&self, id: &str) -> bool {
        self.rows.contains_key(id)
    }

    /// The row keyed by `id`, if any.
    pub fn get(&self, id: &str) -> Option<&Record> {
        self.rows.get(id)
    }

    /// Mutable access to the row keyed by `id`.
    pub fn get_mut(&mut self, id: &str) -> Option<&mut Record> {
        self.rows.get_mut(id)
    }

    /// Insert a row under `id`, replacing any existing row.
    ///
    /// The record's `id` field is set to match the key.
    pub fn insert(&mut self, id: &str, mut record: Record) {
        record.set("id", id);
        self.rows.insert(id.to_string(), record);
    }

    /// Remove the row keyed by `id`, returning it.
    pub fn remove(&mut self, id: &str) -> Option<Record> {
        self.rows.remove(id)
    }

    /// Iterate over row ids in key order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.rows.keys().map(String::as_str)
    }

    /// Iterate over `(id, record)` pairs in key order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Record)> {
        self.rows.iter().map(|(id, rec)| (id.as_str(), rec))
    }
}

/// The parsed payload an item caches in memory.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Contents {
    Table(Table),
    Plists(Vec<Record>),
}

impl Contents {
    /// The empty structure a missing file materializes as.
    pub fn empty(format: Format) -> Self {
        match format {
            Format::Table => Contents::Table(Table::new()),
            Format::Plists => Contents::Plists(Vec::new()),
        }
    }

    /// The format this payload belongs to.
    pub fn format(&self) -> Format {
        match self {
            Contents::Table(_) => Format::Table,
            Contents::Plists(_) => Format::Plists,
        }
    }

    pub(crate) fn parse(format: Format, bytes: &[u8]) -> StoreResult<Self> {
        match format {
            Format::Table => Ok(Contents::Table(tables::parse(bytes)?)),
            Format::Plists => Ok(Contents::Plists(plists::parse(bytes)?)),
        }
    }

    pub(crate) fn serialize(&self) -> Vec<u8> {
        match self {
            Contents::Table(table) => tables::serialize(table),
            Contents::Plists(records) => plists::serialize(records),
        }
    }
}

/// The list-of-records codec: blank-line-separated blocks of `tag value`
/// lines.
pub mod records {
    use super::*;

    /// Parse a raw file into a list of records.
    pub fn parse(bytes: &[u8]) -> StoreResult<Vec<Record>> {
        let text = std::str::from_utf8(bytes)
            .map_err(|e| StoreError::Parse(format!("invalid UTF-8: {e}")))?;
        let mut out = Vec::new();
        let mut block: Vec<&str> = Vec::new();
        for line in text.lines() {
            if line.trim().is_empty() {
                if !block.is_empty() {
                    out.push(Record::from_lines(block.drain(..)));
                }
            } else {
                block.push(line);
            }
        }
        if !block.is_empty() {
            out.push(Record::from_lines(block.into_iter()));
        }
        Ok(out)
    }

    /// Serialize a list of records, one blank line between blocks.
    pub fn serialize(records: &[Record]) -> Vec<u8> {
        let mut out = String::new();
        for (i, record) in records.iter().enumerate() {
            if i > 0 {
                out.push('\n');
            }
            record.write_lines(&mut out);
        }
        out.into_bytes()
    }
}

/// The keyed-table codec: the records codec with rows keyed by their `id`
/// field.
pub mod tables {
    use super::*;
    use tracing::warn;

    /// Parse a raw file into an id-keyed table.
    ///
    /// A record without an `id` field is skipped; when two records share
    /// an id, the last one wins. Both cases are logged, not fatal, so a
    /// hand-edited corpus file degrades instead of refusing to load.
    pub fn parse(bytes: &[u8]) -> StoreResult<Table> {
        let mut table = Table::new();
        for record in records::parse(bytes)? {
            let Some(id) = record.get("id").map(str::to_string) else {
                warn!("skipping record without id field");
                continue;
            };
            if table.contains(&id) {
                warn!(id = %id, "duplicate id; keeping the last record");
            }
            table.insert(&id, record);
        }
        Ok(table)
    }

    /// Serialize a table in key order.
    pub fn serialize(table: &Table) -> Vec<u8> {
        let rows: Vec<Record> = table.iter().map(|(_, rec)| rec.clone()).collect();
        records::serialize(&rows)
    }
}

/// The property-list codec: structurally the records codec, but consumers
/// rely on duplicate tags and tag order within each block.
pub mod plists {
    use super::*;

    /// Parse a raw file into a list of property-lists.
    pub fn parse(bytes: &[u8]) -> StoreResult<Vec<Record>> {
        records::parse(bytes)
    }

    /// Serialize a list of property-lists.
    pub fn serialize(records: &[Record]) -> Vec<u8> {
        records::serialize(records)
    }
}
