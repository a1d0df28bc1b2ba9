use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use crate::error::{StoreError, StoreResult};
use crate::vdisk::{validate_item_name, VirtualDisk};

/// Configuration for opening a directory-backed disk.
#[derive(Clone, Debug)]
pub struct DiskConfig {
    /// Create the root directory if it does not exist.
    pub create_if_missing: bool,
}

impl Default for DiskConfig {
    fn default() -> Self {
        Self {
            create_if_missing: true,
        }
    }
}

/// Directory-backed virtual disk.
///
/// Maps the logical name `/a/b` to `<root>/a/b`. Intermediate directories
/// are created on write. Name validation keeps every access inside the
/// root (no empty or dot segments).
#[derive(Debug)]
pub struct DirDisk {
    root: PathBuf,
}

impl DirDisk {
    /// Open a disk rooted at `root` with the default configuration.
    pub fn open(root: impl AsRef<Path>) -> StoreResult<Self> {
        Self::open_with(root, DiskConfig::default())
    }

    /// Open a disk rooted at `root`.
    pub fn open_with(root: impl AsRef<Path>, config: DiskConfig) -> StoreResult<Self> {
        let root = root.as_ref().to_path_buf();
        if !root.is_dir() {
            if !config.create_if_missing {
                return Err(StoreError::Io(io::Error::new(
                    io::ErrorKind::NotFound,
                    format!("corpus root not found: {}", root.display()),
                )));
            }
            fs::create_dir_all(&root)?;
        }
        Ok(Self { root })
    }

    /// The root directory this disk maps names under.
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, name: &str) -> StoreResult<PathBuf> {
        validate_item_name(name)?;
        let mut path = self.root.clone();
        for segment in name[1..].split('/') {
            path.push(segment);
        }
        Ok(path)
    }
}

impl VirtualDisk for DirDisk {
    fn read(&self, name: &str) -> StoreResult<Option<Vec<u8>>> {
        let path = self.resolve(name)?;
        match fs::read(&path) {
            Ok(bytes) => Ok(Some(bytes)),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    fn write(&self, name: &str, content: &[u8]) -> StoreResult<()> {
        let path = self.resolve(name)?;
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        fs::write(&path, content)?;
        Ok(())
    }

    fn delete(&self, name: &str) -> StoreResult<bool> {
        let path = self.resolve(name)?;
        match fs::remove_file(&path) {
            Ok(()) => Ok(true),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    fn exists(&self, name: &str) -> StoreResult<bool> {
        Ok(self.resolve(name)?.is_file())
    }
}
