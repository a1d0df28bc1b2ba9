use crate::error::{StoreError, StoreResult};

/// Storage collaborator: maps slash-rooted logical item names to file
/// contents.
///
/// All implementations must satisfy these invariants:
/// - Names are absolute (`/langs`, `/deu/toc`, ...); `/` itself is the
///   root and never names a file.
/// - `read` returns `Ok(None)` for a missing file, so a fresh item can
///   materialize as its empty structure without a prior write.
/// - `delete` reports whether anything was removed; I/O failures
///   propagate, they are never downgraded to `false`.
pub trait VirtualDisk: Send + Sync {
    /// Read the file for `name`. Returns `Ok(None)` if it does not exist.
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>>;

    /// Write the file for `name`, creating intermediate directories.
    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()>;

    /// Delete the file for `name`. Returns `true` iff something was removed.
    fn delete(&self, name: &str) -> StoreResult<bool>;

    /// Check whether a file exists for `name`.
    fn exists(&self, name: &str) -> StoreResult<bool>;
}

/// Validate a logical item name.
///
/// A valid name starts with `/`, has at least one segment, and contains no
/// empty or dot segments. `/` alone is reserved for the registry root.
pub fn validate_item_name(name: &str) -> StoreResult<()> {
    let Some(rest) = name.strip_prefix('/') else {
        return Err(StoreError::InvalidName(name.to_string()));
    };
    if rest.is_empty() {
        return Err(StoreError::InvalidName(name.to_string()));
    }
    for segment in rest.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." {
            return Err(StoreError::InvalidName(name.to_string()));
        }
    }
    Ok(())
}
