use std::collections::HashMap;
use std::sync::RwLock;

use crate::error::StoreResult;
use crate::vdisk::{validate_item_name, VirtualDisk};

/// In-memory, `HashMap`-based virtual disk.
///
/// Intended for tests and embedding. All files are held in memory behind a
/// `RwLock`; contents are cloned on read.
pub struct MemDisk {
    files: RwLock<HashMap<String, Vec<u8>>>,
}

impl MemDisk {
    /// Create a new empty in-memory disk.
    pub fn new() -> Self {
        Self {
            files: RwLock::new(HashMap::new()),
        }
    }

    /// Number of files currently stored.
    pub fn len(&self) -> usize {
        self.files.read().expect("lock poisoned").len()
    }

    /// Returns `true` if the disk holds no files.
    pub fn is_empty(&self) -> bool {
        self.files.read().expect("lock poisoned").is_empty()
    }

    /// Return a sorted list of all file names on the disk.
    pub fn names(&self) -> Vec<String> {
        let map = self.files.read().expect("lock poisoned");
        let mut names: Vec<String> = map.keys().cloned().collect();
        names.sort();
        names
    }

    /// Remove all files.
    pub fn clear(&self) {
        self.files.write().expect("lock poisoned").clear();
    }
}

impl Default for MemDisk {
    fn default() -> Self {
        Self::new()
    }
}

impl VirtualDisk for MemDisk {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        validate_item_name(name)?;
        let map = self.files.read().expect("lock poisoned");
        Ok(map.get(name).cloned())
    }

    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()> {
        validate_item_name(name)?;
        let mut map = self.files.write().expect("lock poisoned");
        map.insert(name.to_string(), content.to_vec());
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        validate_item_name(name)?;
        let mut map = self.files.write().expect("lock poisoned");
        Ok(map.remove(name).is_some())
    }

    fn exists(&self, name: &str) -> StoreResult<bool> {
        validate_item_name(name)?;
        let map = self.files.read().expect("lock poisoned");
        Ok(map.contains_key(name))
    }
}

impl std::fmt::Debug for MemDisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MemDisk")
            .field("file_count", &self.len())
            .finish()
    }
}
