//! Compiled expression cache
//!
//! Thread-safe LRU of compiled programs, keyed by expression text.

use super::compiler::{compile, CompiledExpr};
use lru::LruCache;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex, MutexGuard};

/// Default number of compiled expressions kept
pub const DEFAULT_CAPACITY: usize = 64;

/// LRU of compiled XPath expressions keyed by source text
pub struct XPathCache {
    entries: Mutex<LruCache<String, Arc<CompiledExpr>>>,
}

impl XPathCache {
    /// Create a cache holding up to `capacity` expressions (at least one)
    pub fn new(capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        XPathCache {
            entries: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Compiled form of `xpath`, compiling and inserting on a miss.
    /// Failed compilations are not cached.
    pub fn get_or_compile(&self, xpath: &str) -> Result<Arc<CompiledExpr>, String> {
        if let Some(hit) = self.lock().get(xpath) {
            log::trace!(target: "xmlstructure::xpath", "cache hit for {:?}", xpath);
            return Ok(Arc::clone(hit));
        }

        // Compile outside the lock; a concurrent miss on the same text
        // just compiles twice
        log::debug!(target: "xmlstructure::xpath", "compiling {:?}", xpath);
        let compiled = Arc::new(compile(xpath)?);
        self.lock().put(xpath.to_string(), Arc::clone(&compiled));
        Ok(compiled)
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn capacity(&self) -> usize {
        self.lock().cap().get()
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    fn lock(&self) -> MutexGuard<'_, LruCache<String, Arc<CompiledExpr>>> {
        // Poisoning is ignored: no operation leaves the LRU half-updated
        self.entries.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl Default for XPathCache {
    fn default() -> Self {
        XPathCache::new(DEFAULT_CAPACITY)
    }
}

impl std::fmt::Debug for XPathCache {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("XPathCache")
            .field("len", &self.len())
            .field("capacity", &self.capacity())
            .finish()
    }
}
