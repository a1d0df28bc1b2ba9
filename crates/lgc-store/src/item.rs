//! The lazy identity cache and its transactional write batching.
//!
//! [`ItemDisk`] keeps a registry mapping item names to live [`Item`]s, so
//! every access to one persisted entity funnels through a single in-memory
//! instance. Mutations notify the disk; outside a [`Hold`] they save
//! immediately, inside one they buffer until the outermost guard commits.

use std::any::Any;
use std::collections::{BTreeSet, HashMap};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock, Weak};

use tracing::debug;

use crate::error::{StoreError, StoreResult};
use crate::formats::{Contents, Format, Table};
use crate::record::Record;
use crate::vdisk::{validate_item_name, VirtualDisk};

/// A named, lazily-loaded, format-backed persisted entity.
///
/// Constructed unloaded: no I/O happens until the first content access,
/// which parses the backing file through the item's [`Format`] (a missing
/// file materializes as the empty structure). Mutations go through the
/// `with_*_mut` closures, which clear the derived-cache slot and notify
/// the owning disk, so a dirty item can never be forgotten.
pub struct Item {
    name: String,
    format: Format,
    disk: Weak<ItemDisk>,
    contents: RwLock<Option<Contents>>,
    backlinks: RwLock<Option<Arc<dyn Any + Send + Sync>>>,
    generation: AtomicU64,
}

impl Item {
    /// The item's name (a slash-rooted path unique within its disk).
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The record format this item is stored in.
    pub fn format(&self) -> Format {
        self.format
    }

    /// Mutation counter. Bumped on every mutation and on transaction
    /// abort; a cheap staleness probe for external caches.
    pub fn generation(&self) -> u64 {
        self.generation.load(Ordering::Relaxed)
    }

    /// Returns `true` once the contents have been materialized.
    pub fn is_loaded(&self) -> bool {
        self.contents.read().expect("lock poisoned").is_some()
    }

    /// Borrow the table payload, loading it on first access.
    pub fn with_table<R>(&self, f: impl FnOnce(&Table) -> R) -> StoreResult<R> {
        self.load()?;
        let slot = self.contents.read().expect("lock poisoned");
        match slot.as_ref() {
            Some(Contents::Table(table)) => Ok(f(table)),
            _ => Err(self.mismatch(Format::Table)),
        }
    }

    /// Mutate the table payload, then notify the owning disk.
    pub fn with_table_mut<R>(&self, f: impl FnOnce(&mut Table) -> R) -> StoreResult<R> {
        self.load()?;
        let result = {
            let mut slot = self.contents.write().expect("lock poisoned");
            match slot.as_mut() {
                Some(Contents::Table(table)) => f(table),
                _ => return Err(self.mismatch(Format::Table)),
            }
        };
        self.mark_modified()?;
        Ok(result)
    }

    /// Borrow the property-list payload, loading it on first access.
    pub fn with_plists<R>(&self, f: impl FnOnce(&[Record]) -> R) -> StoreResult<R> {
        self.load()?;
        let slot = self.contents.read().expect("lock poisoned");
        match slot.as_ref() {
            Some(Contents::Plists(records)) => Ok(f(records)),
            _ => Err(self.mismatch(Format::Plists)),
        }
    }

    /// Mutate the property-list payload, then notify the owning disk.
    pub fn with_plists_mut<R>(&self, f: impl FnOnce(&mut Vec<Record>) -> R) -> StoreResult<R> {
        self.load()?;
        let result = {
            let mut slot = self.contents.write().expect("lock poisoned");
            match slot.as_mut() {
                Some(Contents::Plists(records)) => f(records),
                _ => return Err(self.mismatch(Format::Plists)),
            }
        };
        self.mark_modified()?;
        Ok(result)
    }

    /// Memoized derived cache (backlink tables and the like).
    ///
    /// The builder runs at most once per mutation generation; every
    /// mutation clears the slot. The cache is type-erased so each item
    /// kind can hang its own inverted-index structure here.
    pub fn cached_backlinks<T, E, F>(&self, build: F) -> Result<Arc<T>, E>
    where
        T: Any + Send + Sync,
        E: From<StoreError>,
        F: FnOnce() -> Result<T, E>,
    {
        {
            let slot = self.backlinks.read().expect("lock poisoned");
            if let Some(cached) = slot.as_ref() {
                if let Ok(typed) = Arc::clone(cached).downcast::<T>() {
                    return Ok(typed);
                }
            }
        }
        let built = Arc::new(build()?);
        let mut slot = self.backlinks.write().expect("lock poisoned");
        *slot = Some(Arc::clone(&built) as Arc<dyn Any + Send + Sync>);
        Ok(built)
    }

    fn load(&self) -> StoreResult<()> {
        if self.is_loaded() {
            return Ok(());
        }
        let disk = self.disk.upgrade().ok_or(StoreError::DiskClosed)?;
        let mut slot = self.contents.write().expect("lock poisoned");
        if slot.is_some() {
            return Ok(());
        }
        let contents = match disk.vdisk().read(&self.name)? {
            Some(bytes) => Contents::parse(self.format, &bytes).map_err(|e| match e {
                StoreError::Parse(msg) => StoreError::Parse(format!("{}: {msg}", self.name)),
                other => other,
            })?,
            None => Contents::empty(self.format),
        };
        debug!(item = %self.name, "materialized contents");
        *slot = Some(contents);
        Ok(())
    }

    fn mark_modified(&self) -> StoreResult<()> {
        self.backlinks.write().expect("lock poisoned").take();
        self.generation.fetch_add(1, Ordering::Relaxed);
        let disk = self.disk.upgrade().ok_or(StoreError::DiskClosed)?;
        disk.modified(&self.name)
    }

    /// Serialize the cached contents back through the format.
    ///
    /// It is an error to save an item whose contents were never
    /// materialized: there is nothing to serialize.
    pub(crate) fn save(&self) -> StoreResult<()> {
        let slot = self.contents.read().expect("lock poisoned");
        let contents = slot
            .as_ref()
            .ok_or_else(|| StoreError::NotLoaded(self.name.clone()))?;
        let bytes = contents.serialize();
        let disk = self.disk.upgrade().ok_or(StoreError::DiskClosed)?;
        debug!(item = %self.name, bytes = bytes.len(), "saving item");
        disk.vdisk().write(&self.name, &bytes)
    }

    /// Drop the cached contents so the next access reloads from storage.
    pub(crate) fn discard(&self) {
        self.contents.write().expect("lock poisoned").take();
        self.backlinks.write().expect("lock poisoned").take();
        self.generation.fetch_add(1, Ordering::Relaxed);
    }

    fn mismatch(&self, requested: Format) -> StoreError {
        StoreError::FormatMismatch {
            name: self.name.clone(),
            registered: self.format,
            requested,
        }
    }
}

impl std::fmt::Debug for Item {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Item")
            .field("name", &self.name)
            .field("format", &self.format)
            .field("loaded", &self.is_loaded())
            .finish()
    }
}

struct HoldState {
    depth: u32,
    aborted: bool,
}

/// The identity-mapped, transaction-batching store of [`Item`]s.
///
/// The registry is the single source of truth for "is this item already
/// loaded": all access to a given item name funnels through [`intern`],
/// preventing two divergent in-memory copies of one persisted entity.
/// The registry is rooted at `/`; `/` itself is reserved and never names
/// an item.
///
/// [`intern`]: ItemDisk::intern
pub struct ItemDisk {
    vdisk: Arc<dyn VirtualDisk>,
    registry: RwLock<HashMap<String, Arc<Item>>>,
    pending: Mutex<BTreeSet<String>>,
    hold_state: Mutex<HoldState>,
}

impl ItemDisk {
    /// Open an item disk over the given storage backend.
    pub fn open(vdisk: Arc<dyn VirtualDisk>) -> Arc<Self> {
        Arc::new(Self {
            vdisk,
            registry: RwLock::new(HashMap::new()),
            pending: Mutex::new(BTreeSet::new()),
            hold_state: Mutex::new(HoldState {
                depth: 0,
                aborted: false,
            }),
        })
    }

    /// The underlying storage backend.
    pub fn vdisk(&self) -> &Arc<dyn VirtualDisk> {
        &self.vdisk
    }

    /// Return the live item registered under `name`, or register a new
    /// unloaded one.
    ///
    /// Repeated calls with one name return the same instance; the format
    /// argument only matters on first registration, except that asking
    /// for a registered name under a conflicting format is an error.
    pub fn intern(self: &Arc<Self>, name: &str, format: Format) -> StoreResult<Arc<Item>> {
        validate_item_name(name)?;
        let mut registry = self.registry.write().expect("lock poisoned");
        if let Some(existing) = registry.get(name) {
            if existing.format() != format {
                return Err(StoreError::FormatMismatch {
                    name: name.to_string(),
                    registered: existing.format(),
                    requested: format,
                });
            }
            return Ok(Arc::clone(existing));
        }
        let item = Arc::new(Item {
            name: name.to_string(),
            format,
            disk: Arc::downgrade(self),
            contents: RwLock::new(None),
            backlinks: RwLock::new(None),
            generation: AtomicU64::new(0),
        });
        registry.insert(name.to_string(), Arc::clone(&item));
        Ok(item)
    }

    /// Look up a registered item without creating one.
    pub fn get(&self, name: &str) -> Option<Arc<Item>> {
        self.registry
            .read()
            .expect("lock poisoned")
            .get(name)
            .cloned()
    }

    /// Number of live registered items.
    pub fn live_items(&self) -> usize {
        self.registry.read().expect("lock poisoned").len()
    }

    /// Open a transaction scope.
    ///
    /// Holds nest: overlapping guards compose into a single flush when
    /// the depth returns to zero. Saves requested while any hold is open
    /// are buffered in the pending set.
    pub fn hold(self: &Arc<Self>) -> Hold {
        self.hold_state.lock().expect("lock poisoned").depth += 1;
        Hold {
            disk: Arc::clone(self),
            released: false,
        }
    }

    /// Returns `true` while at least one hold is open.
    pub fn holding(&self) -> bool {
        self.hold_state.lock().expect("lock poisoned").depth > 0
    }

    /// Register an item as dirty. Inside a hold the save is buffered;
    /// otherwise the item saves immediately.
    pub(crate) fn modified(&self, name: &str) -> StoreResult<()> {
        let buffering = self.holding();
        if buffering {
            self.pending
                .lock()
                .expect("lock poisoned")
                .insert(name.to_string());
            return Ok(());
        }
        match self.get(name) {
            Some(item) => item.save(),
            // Removed between mutation and notification; nothing to write.
            None => Ok(()),
        }
    }

    fn release(&self, abort: bool) -> StoreResult<()> {
        let aborted = {
            let mut state = self.hold_state.lock().expect("lock poisoned");
            if state.depth == 0 {
                drop(state);
                panic!("transaction release without a matching hold");
            }
            state.depth -= 1;
            if abort {
                state.aborted = true;
            }
            if state.depth > 0 {
                return Ok(());
            }
            let aborted = state.aborted;
            state.aborted = false;
            aborted
        };

        let names: Vec<String> = {
            let mut pending = self.pending.lock().expect("lock poisoned");
            std::mem::take(&mut *pending).into_iter().collect()
        };

        if aborted {
            for name in &names {
                if let Some(item) = self.get(name) {
                    item.discard();
                }
            }
            debug!(count = names.len(), "transaction aborted; pending items discarded");
            return Err(StoreError::TransactionAborted);
        }

        debug!(count = names.len(), "flushing pending items");
        let mut first_err = None;
        for name in &names {
            if let Some(item) = self.get(name) {
                if let Err(e) = item.save() {
                    first_err.get_or_insert(e);
                }
            }
        }
        match first_err {
            Some(e) => Err(e),
            None => Ok(()),
        }
    }

    /// Remove an item: delete its backing storage, drop its registration,
    /// and scrub it from the pending set (a deleted item must never be
    /// flushed). Returns `true` iff backing storage existed.
    pub fn remove(&self, name: &str) -> StoreResult<bool> {
        validate_item_name(name)?;
        let existed = self.vdisk.delete(name)?;
        self.registry.write().expect("lock poisoned").remove(name);
        self.pending.lock().expect("lock poisoned").remove(name);
        Ok(existed)
    }

    /// Remove every currently-registered item at or under `prefix`.
    ///
    /// Only items already materialized in the registry are covered;
    /// on-disk descendants that were never interned are not touched.
    /// Callers deleting a subtree load the relevant items first. Returns
    /// the number of registrations removed.
    pub fn rmtree(&self, prefix: &str) -> StoreResult<usize> {
        validate_item_name(prefix)?;
        let subtree = format!("{prefix}/");
        let names: Vec<String> = {
            let registry = self.registry.read().expect("lock poisoned");
            registry
                .keys()
                .filter(|name| *name == prefix || name.starts_with(&subtree))
                .cloned()
                .collect()
        };
        for name in &names {
            self.remove(name)?;
        }
        debug!(prefix = %prefix, count = names.len(), "removed subtree items");
        Ok(names.len())
    }
}

impl std::fmt::Debug for ItemDisk {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ItemDisk")
            .field("live_items", &self.live_items())
            .field("holding", &self.holding())
            .finish()
    }
}

/// A nestable transaction scope batching writes until fully released.
///
/// Obtained from [`ItemDisk::hold`]. Call [`commit`] to release normally;
/// dropping the guard without committing (including during unwind)
/// releases with abort, and the whole batch performs zero writes.
///
/// [`commit`]: Hold::commit
#[must_use = "dropping a hold without committing aborts the batch"]
pub struct Hold {
    disk: Arc<ItemDisk>,
    released: bool,
}

impl Hold {
    /// Release this scope normally.
    ///
    /// When this is the outermost hold and no scope in the batch aborted,
    /// every pending item saves exactly once. If any scope aborted, the
    /// batch is discarded and this reports [`StoreError::TransactionAborted`].
    pub fn commit(mut self) -> StoreResult<()> {
        self.released = true;
        self.disk.release(false)
    }

    /// Release this scope with an explicit abort.
    pub fn abort(mut self) {
        self.released = true;
        let _ = self.disk.release(true);
    }
}

impl Drop for Hold {
    fn drop(&mut self) {
        if !self.released {
            let _ = self.disk.release(true);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::memory::MemDisk;

    fn make_disk() -> (Arc<MemDisk>, Arc<ItemDisk>) {
        let mem = Arc::new(MemDisk::new());
        let disk = ItemDisk::open(Arc::clone(&mem) as Arc<dyn VirtualDisk>);
        (mem, disk)
    }

    fn stored_text(mem: &MemDisk, name: &str) -> Option<String> {
        mem.read(name)
            .unwrap()
            .map(|bytes| String::from_utf8(bytes).unwrap())
    }

    // -----------------------------------------------------------------------
    // Identity
    // -----------------------------------------------------------------------

    #[test]
    fn intern_returns_the_same_instance() {
        let (_, disk) = make_disk();
        let a = disk.intern("/langs", Format::Table).unwrap();
        let b = disk.intern("/langs", Format::Table).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(disk.live_items(), 1);
    }

    #[test]
    fn intern_with_conflicting_format_fails() {
        let (_, disk) = make_disk();
        disk.intern("/langs", Format::Table).unwrap();
        let result = disk.intern("/langs", Format::Plists);
        assert!(matches!(result, Err(StoreError::FormatMismatch { .. })));
    }

    #[test]
    fn intern_rejects_reserved_root() {
        let (_, disk) = make_disk();
        assert!(matches!(
            disk.intern("/", Format::Table),
            Err(StoreError::InvalidName(_))
        ));
    }

    #[test]
    fn get_does_not_register() {
        let (_, disk) = make_disk();
        assert!(disk.get("/langs").is_none());
        disk.intern("/langs", Format::Table).unwrap();
        assert!(disk.get("/langs").is_some());
    }

    // -----------------------------------------------------------------------
    // Lazy load
    // -----------------------------------------------------------------------

    #[test]
    fn construction_performs_no_io() {
        let (_, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();
        assert!(!item.is_loaded());
    }

    #[test]
    fn missing_file_materializes_empty() {
        let (_, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();
        let len = item.with_table(|t| t.len()).unwrap();
        assert_eq!(len, 0);
        assert!(item.is_loaded());
    }

    #[test]
    fn existing_file_is_parsed_once() {
        let (mem, disk) = make_disk();
        mem.write("/langs", b"id deu\nname German\n").unwrap();
        let item = disk.intern("/langs", Format::Table).unwrap();
        let name = item
            .with_table(|t| t.get("deu").unwrap().get("name").unwrap().to_string())
            .unwrap();
        assert_eq!(name, "German");
    }

    #[test]
    fn parse_errors_carry_the_item_name() {
        let (mem, disk) = make_disk();
        mem.write("/langs", &[0xff, 0xfe]).unwrap();
        let item = disk.intern("/langs", Format::Table).unwrap();
        match item.with_table(|_| ()) {
            Err(StoreError::Parse(msg)) => assert!(msg.contains("/langs")),
            other => panic!("expected parse error, got {other:?}"),
        }
    }

    #[test]
    fn payload_kind_is_checked() {
        let (_, disk) = make_disk();
        let item = disk.intern("/deu/txt/t01", Format::Plists).unwrap();
        assert!(matches!(
            item.with_table(|_| ()),
            Err(StoreError::FormatMismatch { .. })
        ));
    }

    // -----------------------------------------------------------------------
    // Immediate save (no hold open)
    // -----------------------------------------------------------------------

    #[test]
    fn mutation_outside_hold_saves_immediately() {
        let (mem, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();
        item.with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();
        assert_eq!(stored_text(&mem, "/langs").unwrap(), "id deu\n");
    }

    #[test]
    fn save_before_load_is_an_error() {
        let (_, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();
        assert!(matches!(item.save(), Err(StoreError::NotLoaded(_))));
    }

    // -----------------------------------------------------------------------
    // Hold / flush
    // -----------------------------------------------------------------------

    #[test]
    fn mutations_under_hold_are_invisible_until_commit() {
        let (mem, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();

        let hold = disk.hold();
        item.with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();
        assert!(stored_text(&mem, "/langs").is_none());

        hold.commit().unwrap();
        assert_eq!(stored_text(&mem, "/langs").unwrap(), "id deu\n");
    }

    #[test]
    fn nested_holds_flush_once_at_depth_zero() {
        let (mem, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();

        let outer = disk.hold();
        let inner = disk.hold();
        item.with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();
        inner.commit().unwrap();
        assert!(stored_text(&mem, "/langs").is_none());

        outer.commit().unwrap();
        assert!(stored_text(&mem, "/langs").is_some());
    }

    #[test]
    fn each_pending_item_saves_exactly_once() {
        let (mem, disk) = make_disk();
        let langs = disk.intern("/langs", Format::Table).unwrap();
        let toc = disk.intern("/deu/toc", Format::Table).unwrap();

        let hold = disk.hold();
        langs
            .with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();
        toc.with_table_mut(|t| t.insert("t01", Record::new()))
            .unwrap();
        // A second mutation of the same item does not duplicate the entry.
        langs
            .with_table_mut(|t| t.insert("fin", Record::new()))
            .unwrap();
        hold.commit().unwrap();

        assert_eq!(mem.names(), vec!["/deu/toc".to_string(), "/langs".to_string()]);
        assert_eq!(stored_text(&mem, "/langs").unwrap(), "id deu\n\nid fin\n");
    }

    #[test]
    fn aborted_hold_writes_nothing() {
        let (mem, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();

        let hold = disk.hold();
        item.with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();
        hold.abort();

        assert!(mem.is_empty());
    }

    #[test]
    fn dropping_a_hold_aborts() {
        let (mem, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();
        {
            let _hold = disk.hold();
            item.with_table_mut(|t| t.insert("deu", Record::new()))
                .unwrap();
        }
        assert!(mem.is_empty());
    }

    #[test]
    fn reads_after_abort_see_the_pre_transaction_state() {
        let (mem, disk) = make_disk();
        mem.write("/langs", b"id deu\nname German\n").unwrap();
        let item = disk.intern("/langs", Format::Table).unwrap();

        let hold = disk.hold();
        item.with_table_mut(|t| {
            t.get_mut("deu").unwrap().set("name", "Changed");
        })
        .unwrap();
        hold.abort();

        let name = item
            .with_table(|t| t.get("deu").unwrap().get("name").unwrap().to_string())
            .unwrap();
        assert_eq!(name, "German");
    }

    #[test]
    fn inner_abort_poisons_the_outer_commit() {
        let (mem, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();

        let outer = disk.hold();
        let inner = disk.hold();
        item.with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();
        inner.abort();

        let result = outer.commit();
        assert!(matches!(result, Err(StoreError::TransactionAborted)));
        assert!(mem.is_empty());
    }

    #[test]
    fn abort_flag_resets_for_the_next_batch() {
        let (mem, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();

        let hold = disk.hold();
        item.with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();
        hold.abort();

        let hold = disk.hold();
        item.with_table_mut(|t| t.insert("fin", Record::new()))
            .unwrap();
        hold.commit().unwrap();

        assert_eq!(stored_text(&mem, "/langs").unwrap(), "id fin\n");
    }

    // -----------------------------------------------------------------------
    // Remove / rmtree
    // -----------------------------------------------------------------------

    #[test]
    fn remove_deletes_storage_and_registration() {
        let (mem, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();
        item.with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();

        assert!(disk.remove("/langs").unwrap());
        assert!(mem.is_empty());
        assert!(disk.get("/langs").is_none());
    }

    #[test]
    fn removed_item_is_never_flushed() {
        let (mem, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();

        let hold = disk.hold();
        item.with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();
        disk.remove("/langs").unwrap();
        hold.commit().unwrap();

        assert!(mem.is_empty());
    }

    #[test]
    fn rmtree_respects_segment_boundaries() {
        let (mem, disk) = make_disk();
        for name in ["/deu/toc", "/deu/txt/t01", "/deutsch/toc"] {
            let item = disk.intern(name, Format::Table).unwrap();
            item.with_table_mut(|t| t.insert("x", Record::new())).unwrap();
        }

        let removed = disk.rmtree("/deu").unwrap();
        assert_eq!(removed, 2);
        assert_eq!(mem.names(), vec!["/deutsch/toc".to_string()]);
        assert!(disk.get("/deutsch/toc").is_some());
    }

    #[test]
    fn rmtree_only_covers_registered_items() {
        let (mem, disk) = make_disk();
        mem.write("/deu/txt/t01", b"w never interned\n").unwrap();
        disk.rmtree("/deu").unwrap();
        // The on-disk file was never interned, so it survives.
        assert!(mem.exists("/deu/txt/t01").unwrap());
    }

    // -----------------------------------------------------------------------
    // Backlink cache
    // -----------------------------------------------------------------------

    #[test]
    fn backlinks_are_memoized_until_mutation() {
        let (_, disk) = make_disk();
        let item = disk.intern("/deu/toc", Format::Table).unwrap();

        let mut builds = 0u32;
        let first = item
            .cached_backlinks(|| {
                builds += 1;
                Ok::<u32, StoreError>(builds)
            })
            .unwrap();
        let second = item
            .cached_backlinks(|| {
                builds += 1;
                Ok::<u32, StoreError>(builds)
            })
            .unwrap();
        assert_eq!(builds, 1);
        assert!(Arc::ptr_eq(&first, &second));

        item.with_table_mut(|t| t.insert("t01", Record::new()))
            .unwrap();
        let third = item
            .cached_backlinks(|| {
                builds += 1;
                Ok::<u32, StoreError>(builds)
            })
            .unwrap();
        assert_eq!(builds, 2);
        assert!(!Arc::ptr_eq(&first, &third));
    }

    #[test]
    fn generation_bumps_on_mutation() {
        let (_, disk) = make_disk();
        let item = disk.intern("/langs", Format::Table).unwrap();
        let before = item.generation();
        item.with_table_mut(|t| t.insert("deu", Record::new()))
            .unwrap();
        assert!(item.generation() > before);
    }

    // -----------------------------------------------------------------------
    // Failure semantics
    // -----------------------------------------------------------------------

    #[test]
    #[should_panic(expected = "transaction release without a matching hold")]
    fn releasing_an_unheld_disk_panics() {
        let (_, disk) = make_disk();
        disk.release(false).unwrap();
    }
}
