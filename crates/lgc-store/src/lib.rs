//! Item-disk persistence for the LGC corpus store.
//!
//! This crate implements a lazily-materialized, write-batched object store
//! layered over a virtual filesystem. Every persisted entity in an LGC
//! corpus -- language tables, tables of contents, lexica, sentence lists --
//! is an [`Item`]: a named, format-backed file that is parsed on first
//! access and written back when mutated.
//!
//! # Components
//!
//! - [`VirtualDisk`] -- storage collaborator mapping slash-rooted logical
//!   names to file contents
//! - [`DirDisk`] -- directory-backed disk for real corpora
//! - [`MemDisk`] -- `HashMap`-based disk for tests and embedding
//! - [`Record`] and the [`formats`] codecs -- the line-oriented record
//!   formats items are stored in
//! - [`ItemDisk`] -- the identity-mapped, transaction-batching store of
//!   live [`Item`]s
//!
//! # Design Rules
//!
//! 1. An item name maps to at most one live `Item` at a time; `intern`
//!    always returns the registered instance.
//! 2. Items are loaded lazily: construction performs no I/O, the first
//!    content access does.
//! 3. Mutations go through closures that notify the owning disk, so a
//!    dirty item can never be forgotten.
//! 4. While a [`Hold`] is open, saves are buffered; the outermost commit
//!    flushes each pending item exactly once. An aborted hold writes
//!    nothing and discards the pending items' cached contents.
//! 5. All I/O errors are propagated, never silently ignored.

pub mod dir;
pub mod error;
pub mod formats;
pub mod item;
pub mod memory;
pub mod record;
pub mod vdisk;

// Re-export primary types at crate root for ergonomic imports.
pub use dir::{DirDisk, DiskConfig};
pub use error::{StoreError, StoreResult};
pub use formats::{Contents, Format, Table};
pub use item::{Hold, Item, ItemDisk};
pub use memory::MemDisk;
pub use record::Record;
pub use vdisk::{validate_item_name, VirtualDisk};
