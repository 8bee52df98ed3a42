//! Archive cache keyed by filename.
//!
//! Every load hands out a [`CachedSff`], a shallow copy of the cached archive.
//! Dropping it releases its reference, and the entry goes away with the last
//! one. Entries that stay referenced but are not loaded again are reaped after
//! [`EXPIRY_LIMIT`] load cycles.
//!
//! The cache is single threaded (`Rc` inside) and does no locking.
use std::{
    cell::RefCell,
    collections::HashMap,
    ops::{Deref, DerefMut},
    path::Path,
    rc::{Rc, Weak},
};

use crate::{archive::Sff, error::SffError};

/// Load cycles an entry survives without being loaded again.
pub const EXPIRY_LIMIT: u32 = 2;

#[derive(Debug)]
struct CacheEntry {
    sff: Sff,
    ref_count: usize,
    expiry: u32,
    /// Loaded since the last reap.
    hit: bool,
    generation: u64,
}

#[derive(Debug)]
struct CacheState {
    entries: HashMap<String, CacheEntry>,
    next_generation: u64,
    expiry_limit: u32,
}

impl CacheState {
    fn release(&mut self, filename: &str, generation: u64) {
        let Some(entry) = self.entries.get_mut(filename) else {
            return;
        };

        // a newer entry for the same file is not ours to release
        if entry.generation != generation {
            return;
        }

        entry.ref_count = entry.ref_count.saturating_sub(1);

        if entry.ref_count == 0 {
            log::debug!("Evicting {filename}: no references left");
            self.entries.remove(filename);
        }
    }
}

#[derive(Debug, Clone)]
pub struct SffCache {
    state: Rc<RefCell<CacheState>>,
}

impl Default for SffCache {
    fn default() -> Self {
        Self::new()
    }
}

impl SffCache {
    pub fn new() -> Self {
        Self::with_expiry_limit(EXPIRY_LIMIT)
    }

    pub fn with_expiry_limit(expiry_limit: u32) -> Self {
        Self {
            state: Rc::new(RefCell::new(CacheState {
                entries: HashMap::new(),
                next_generation: 0,
                expiry_limit,
            })),
        }
    }

    /// Loads an archive from disk, or returns a copy of the cached one.
    pub fn load(&self, path: impl AsRef<Path>, character: bool) -> Result<CachedSff, SffError> {
        let path = path.as_ref();

        self.load_with(&path.display().to_string(), || {
            Sff::open_from_file(path, character)
        })
    }

    /// Same as [`SffCache::load`] with the archive already in memory.
    pub fn load_from_bytes(
        &self,
        filename: &str,
        bytes: &[u8],
        character: bool,
    ) -> Result<CachedSff, SffError> {
        self.load_with(filename, || Sff::open_from_bytes(bytes, character))
    }

    /// Cache hit: bump the reference count and reset the expiry. Cache miss:
    /// run `parse` and insert the result. A failed parse leaves the cache untouched.
    pub fn load_with(
        &self,
        filename: &str,
        parse: impl FnOnce() -> Result<Sff, SffError>,
    ) -> Result<CachedSff, SffError> {
        if let Some(res) = self.hit(filename) {
            return Ok(res);
        }

        let mut sff = parse()?;
        sff.set_filename(filename);

        let mut state = self.state.borrow_mut();
        let generation = state.next_generation;
        state.next_generation += 1;

        let expiry = state.expiry_limit;
        state.entries.insert(
            filename.to_string(),
            CacheEntry {
                sff: sff.clone(),
                ref_count: 1,
                expiry,
                hit: true,
                generation,
            },
        );

        log::debug!("Cached {filename}");

        Ok(self.handle(sff, filename, generation))
    }

    fn hit(&self, filename: &str) -> Option<CachedSff> {
        let mut state = self.state.borrow_mut();
        let expiry_limit = state.expiry_limit;
        let entry = state.entries.get_mut(filename)?;

        entry.ref_count += 1;
        entry.expiry = expiry_limit;
        entry.hit = true;

        let (sff, generation) = (entry.sff.clone(), entry.generation);
        drop(state);

        Some(self.handle(sff, filename, generation))
    }

    fn handle(&self, sff: Sff, filename: &str, generation: u64) -> CachedSff {
        CachedSff {
            sff,
            release: Some(Release {
                state: Rc::downgrade(&self.state),
                filename: filename.to_string(),
                generation,
            }),
        }
    }

    /// Ends a load cycle. Entries loaded during the cycle keep their budget,
    /// the others lose one and are evicted when it runs out.
    ///
    /// Returns the number of evicted entries.
    pub fn reap(&self) -> usize {
        let mut state = self.state.borrow_mut();
        let before = state.entries.len();

        state.entries.retain(|filename, entry| {
            if entry.hit {
                entry.hit = false;
                return true;
            }

            entry.expiry = entry.expiry.saturating_sub(1);

            if entry.expiry == 0 {
                log::debug!("Evicting {filename}: expired");
                return false;
            }

            true
        });

        before - state.entries.len()
    }

    pub fn contains(&self, filename: &str) -> bool {
        self.state.borrow().entries.contains_key(filename)
    }

    pub fn ref_count(&self, filename: &str) -> Option<usize> {
        self.state
            .borrow()
            .entries
            .get(filename)
            .map(|entry| entry.ref_count)
    }

    pub fn len(&self) -> usize {
        self.state.borrow().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Drops the entry for `filename`. Live handles stay valid.
    pub fn remove(&self, filename: &str) -> bool {
        self.state.borrow_mut().entries.remove(filename).is_some()
    }

    pub fn clear(&self) {
        self.state.borrow_mut().entries.clear();
    }
}

#[derive(Debug)]
struct Release {
    state: Weak<RefCell<CacheState>>,
    filename: String,
    generation: u64,
}

/// An archive handed out by [`SffCache`]. Releases its reference on drop.
#[derive(Debug)]
pub struct CachedSff {
    sff: Sff,
    release: Option<Release>,
}

impl CachedSff {
    /// Gives up the cache reference now and keeps the archive.
    pub fn into_inner(mut self) -> Sff {
        self.release_now();
        std::mem::take(&mut self.sff)
    }

    fn release_now(&mut self) {
        let Some(release) = self.release.take() else {
            return;
        };

        let Some(state) = release.state.upgrade() else {
            return;
        };

        match state.try_borrow_mut() {
            Ok(mut state) => state.release(&release.filename, release.generation),
            Err(_) => log::warn!(
                "Cannot release {}: cache is busy",
                release.filename
            ),
        };
    }
}

impl Deref for CachedSff {
    type Target = Sff;

    fn deref(&self) -> &Self::Target {
        &self.sff
    }
}

impl DerefMut for CachedSff {
    fn deref_mut(&mut self) -> &mut Self::Target {
        &mut self.sff
    }
}

impl Drop for CachedSff {
    fn drop(&mut self) {
        self.release_now();
    }
}
