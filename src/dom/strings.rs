//! String Interning Pool
//!
//! Deduplicated storage for element names, attribute names/values and text
//! content. Every string lives in one contiguous buffer; ids index into an
//! entry table of `(offset, len)` pairs.
//!
//! Id 0 is reserved for the empty string, so "no name" and "empty text" never
//! allocate.

use std::collections::hash_map::DefaultHasher;
use std::collections::HashMap;
use std::hash::{Hash, Hasher};

/// Location of an interned string inside the pool buffer
#[derive(Debug, Clone, Copy)]
struct StringEntry {
    offset: u32,
    len: u32,
}

/// String interning pool
///
/// Memory layout:
/// - `entries`: one entry per interned string id
/// - `data`: all string bytes back to back
/// - `hash_index`: hash -> ids with that hash (handles rare collisions)
#[derive(Debug, Clone, Default)]
pub struct StringPool {
    entries: Vec<StringEntry>,
    data: String,
    hash_index: HashMap<u64, Vec<u32>>,
}

impl StringPool {
    /// Create a new empty string pool
    pub fn new() -> Self {
        let mut pool = StringPool {
            entries: Vec::with_capacity(64),
            data: String::with_capacity(1024),
            hash_index: HashMap::new(),
        };
        pool.entries.push(StringEntry { offset: 0, len: 0 });
        pool
    }

    #[inline]
    fn compute_hash(s: &str) -> u64 {
        let mut hasher = DefaultHasher::new();
        s.hash(&mut hasher);
        hasher.finish()
    }

    /// Intern a string, returning its id. Equal strings share one id.
    pub fn intern(&mut self, s: &str) -> u32 {
        if s.is_empty() {
            return 0;
        }

        let hash = Self::compute_hash(s);
        if let Some(ids) = self.hash_index.get(&hash) {
            for &id in ids {
                if self.get_str(id) == Some(s) {
                    return id;
                }
            }
        }

        let offset = self.data.len() as u32;
        self.data.push_str(s);

        let id = self.entries.len() as u32;
        self.entries.push(StringEntry {
            offset,
            len: s.len() as u32,
        });
        self.hash_index.entry(hash).or_default().push(id);

        id
    }

    /// Intern raw bytes, replacing invalid UTF-8 sequences
    pub fn intern_bytes(&mut self, s: &[u8]) -> u32 {
        let text = String::from_utf8_lossy(s);
        self.intern(&text)
    }

    /// Resolve an id to its string
    pub fn get_str(&self, id: u32) -> Option<&str> {
        let entry = self.entries.get(id as usize)?;
        let start = entry.offset as usize;
        self.data.get(start..start + entry.len as usize)
    }

    /// Look up the id of an already interned string without inserting it
    pub fn lookup(&self, s: &str) -> Option<u32> {
        if s.is_empty() {
            return Some(0);
        }
        self.hash_index
            .get(&Self::compute_hash(s))?
            .iter()
            .copied()
            .find(|&id| self.get_str(id) == Some(s))
    }

    /// Number of unique strings stored (including the reserved empty string)
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when nothing but the reserved empty string is stored
    pub fn is_empty(&self) -> bool {
        self.entries.len() <= 1
    }
}
