use crate::formats::Format;

/// Errors from the item-disk persistence layer.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// The item name is not a valid slash-rooted path.
    #[error("invalid item name: {0:?}")]
    InvalidName(String),

    /// An item file could not be parsed by its record format.
    #[error("parse error: {0}")]
    Parse(String),

    /// Attempted to save an item whose contents were never materialized.
    #[error("item {0} has no materialized contents to save")]
    NotLoaded(String),

    /// The item is registered under a different record format.
    #[error("item {name} is registered as {registered}, requested {requested}")]
    FormatMismatch {
        name: String,
        registered: Format,
        requested: Format,
    },

    /// The enclosing transaction was aborted; no writes were performed.
    #[error("transaction aborted; pending writes discarded")]
    TransactionAborted,

    /// The owning item disk was dropped while an item was still in use.
    #[error("item disk closed")]
    DiskClosed,

    /// I/O error from the underlying storage backend.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;
