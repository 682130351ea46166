//! Keyed pool of container readers.
//!
//! One slot per [`ContainerKey`]. The slot's reader is built lazily by the
//! [`ReaderFactory`] on the first acquire and shared by every later acquire of
//! the same key, from any thread. Racing first acquires construct it once.

use crate::error::ContainerError;
use crate::reader::{ContainerKey, ContainerReader, ModuleRef, ReaderFactory};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use once_cell::sync::OnceCell;
use std::fmt;
use std::ops::Deref;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use tracing::debug;

struct PoolSlot {
    reader: OnceCell<Arc<dyn ContainerReader>>,
    leases: AtomicUsize,
}

impl PoolSlot {
    /// A slot holding the lease of the acquire that created it.
    fn leased() -> Self {
        Self {
            reader: OnceCell::new(),
            leases: AtomicUsize::new(1),
        }
    }
}

pub struct ReaderPool {
    factory: Arc<dyn ReaderFactory>,
    slots: DashMap<ContainerKey, Arc<PoolSlot>>,
    // Slots reserved against `capacity`. DashMap::len locks every shard, so it
    // cannot be consulted while an entry guard is held.
    reserved: AtomicUsize,
    capacity: usize,
}

impl ReaderPool {
    pub const DEFAULT_CAPACITY: usize = 1024;

    pub fn new(factory: Arc<dyn ReaderFactory>) -> Self {
        Self::with_capacity(factory, Self::DEFAULT_CAPACITY)
    }

    /// At most `capacity` distinct containers are held at once.
    pub fn with_capacity(factory: Arc<dyn ReaderFactory>, capacity: usize) -> Self {
        Self {
            factory,
            slots: DashMap::new(),
            reserved: AtomicUsize::new(0),
            capacity,
        }
    }

    /// Lease the reader of `module`, creating it if this is the first lease.
    ///
    /// A failed creation leaves the slot empty so that a later acquire retries.
    pub fn acquire_scoped(&self, module: &ModuleRef) -> Result<ScopedReader, ContainerError> {
        let key = module.key();
        let slot = self.lease_slot(&key)?;

        let created = slot.reader.get_or_try_init(|| {
            debug!("Creating reader for {}", module);
            self.factory.create(module).map(Arc::from)
        });
        match created {
            Ok(reader) => Ok(ScopedReader {
                reader: reader.clone(),
                slot,
                key,
            }),
            Err(e) => {
                slot.leases.fetch_sub(1, Ordering::AcqRel);
                Err(e)
            }
        }
    }

    /// The slot of `key` with one more lease.
    ///
    /// The lease is taken under the map's shard lock, so `close()` either
    /// removes the slot before it is found or sees the lease and keeps it.
    fn lease_slot(&self, key: &ContainerKey) -> Result<Arc<PoolSlot>, ContainerError> {
        if let Some(slot) = self.slots.get(key) {
            slot.leases.fetch_add(1, Ordering::AcqRel);
            return Ok(slot.value().clone());
        }
        match self.slots.entry(key.clone()) {
            Entry::Occupied(entry) => {
                let slot = entry.get();
                slot.leases.fetch_add(1, Ordering::AcqRel);
                Ok(slot.clone())
            }
            Entry::Vacant(entry) => {
                let capacity = self.capacity;
                self.reserved
                    .fetch_update(Ordering::AcqRel, Ordering::Acquire, |open| {
                        (open < capacity).then_some(open + 1)
                    })
                    .map_err(|_| ContainerError::PoolExhausted { capacity })?;
                let slot = Arc::new(PoolSlot::leased());
                entry.insert(slot.clone());
                Ok(slot)
            }
        }
    }

    /// Outstanding leases of a container.
    pub fn leases(&self, key: &ContainerKey) -> usize {
        self.slots
            .get(key)
            .map(|slot| slot.leases.load(Ordering::Acquire))
            .unwrap_or(0)
    }

    /// Whether a reader has been created for `key` and is still pooled.
    pub fn is_open(&self, key: &ContainerKey) -> bool {
        self.slots
            .get(key)
            .is_some_and(|slot| slot.reader.get().is_some())
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.slots.is_empty()
    }

    /// Drop every reader without outstanding leases. Returns how many slots
    /// were closed.
    pub fn close(&self) -> usize {
        let mut closed = 0;
        self.slots.retain(|_, slot| {
            let keep = slot.leases.load(Ordering::Acquire) > 0;
            if !keep {
                closed += 1;
            }
            keep
        });
        self.reserved.fetch_sub(closed, Ordering::AcqRel);
        debug!("Closed {} pooled readers", closed);
        closed
    }
}

impl fmt::Debug for ReaderPool {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ReaderPool")
            .field("slots", &self.slots.len())
            .field("capacity", &self.capacity)
            .finish()
    }
}

/// A leased reader. Dropping it returns the lease; the reader stays pooled.
pub struct ScopedReader {
    reader: Arc<dyn ContainerReader>,
    slot: Arc<PoolSlot>,
    key: ContainerKey,
}

impl ScopedReader {
    pub fn key(&self) -> &ContainerKey {
        &self.key
    }
}

impl Deref for ScopedReader {
    type Target = dyn ContainerReader;

    fn deref(&self) -> &Self::Target {
        self.reader.as_ref()
    }
}

impl Drop for ScopedReader {
    fn drop(&mut self) {
        self.slot.leases.fetch_sub(1, Ordering::AcqRel);
    }
}

impl fmt::Debug for ScopedReader {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ScopedReader").field("key", &self.key).finish()
    }
}
