//! Shared string table: an insertion-ordered, deduplicating string pool

use std::hash::{Hash, Hasher};

use ahash::AHashMap;

use crate::error::{SstError, SstResult};
use crate::options::{DedupKey, SstOptions};
use crate::string::UnicodeString;

/// Shared string table
///
/// Cells reference strings by index, and every distinct string is stored
/// once. Indices are dense and follow insertion order.
#[derive(Debug, Clone)]
pub struct StringTable {
    /// Unique strings in insertion order
    strings: Vec<UnicodeString>,
    /// Key hash -> indices sharing that hash
    index_map: AHashMap<u64, Vec<u32>>,
    /// Number of `add_string` calls (the SST `cstTotal` field)
    total_refs: u32,
    options: SstOptions,
}

impl StringTable {
    /// Create an empty table with default options
    pub fn new() -> Self {
        Self::with_options(SstOptions::default())
    }

    /// Create an empty table
    pub fn with_options(options: SstOptions) -> Self {
        Self {
            strings: Vec::new(),
            index_map: AHashMap::new(),
            total_refs: 0,
            options,
        }
    }

    pub fn options(&self) -> &SstOptions {
        &self.options
    }

    /// Add a string reference, returning its index
    ///
    /// Every call counts towards the total reference count. If an equal
    /// string (under the configured key) already exists its index is
    /// returned; otherwise the string is appended.
    pub fn add_string(&mut self, s: UnicodeString) -> u32 {
        self.total_refs = self.total_refs.saturating_add(1);
        match self.find(&s) {
            Some(idx) => idx,
            None => self.push(s),
        }
    }

    /// Append a string read from a file, returning its index
    ///
    /// Does not touch the reference count. A collision with an earlier entry
    /// is resolved by the duplicate-padding quirk (see
    /// [`SstOptions::pad_duplicates`]).
    pub fn insert_decoded(&mut self, mut s: UnicodeString) -> SstResult<u32> {
        if self.find(&s).is_none() {
            return Ok(self.push(s));
        }

        if !self.options.pad_duplicates {
            let idx = self.strings.len() as u32;
            log::debug!("keeping duplicate SST entry {idx} ({:?}) unindexed", s.text());
            self.strings.push(s);
            return Ok(idx);
        }

        let original = s.text().to_owned();
        for attempt in 1..=self.options.max_padding {
            s.push_char(' ').map_err(|_| SstError::DuplicateKeyUnresolved {
                text: original.clone(),
                attempts: attempt,
            })?;
            if self.find(&s).is_none() {
                log::debug!(
                    "padded duplicate SST entry {:?} with {attempt} trailing space(s)",
                    original
                );
                return Ok(self.push(s));
            }
        }

        Err(SstError::DuplicateKeyUnresolved {
            text: original,
            attempts: self.options.max_padding,
        })
    }

    /// Get a string by index
    pub fn get(&self, index: u32) -> Option<&UnicodeString> {
        self.strings.get(index as usize)
    }

    /// Index of a string equal to `s` under the configured key
    pub fn index_of(&self, s: &UnicodeString) -> Option<u32> {
        self.find(s)
    }

    /// Iterate over all strings with their indices
    pub fn iter(&self) -> impl Iterator<Item = (u32, &UnicodeString)> {
        self.strings.iter().enumerate().map(|(i, s)| (i as u32, s))
    }

    /// All strings in index order
    pub fn as_slice(&self) -> &[UnicodeString] {
        &self.strings
    }

    pub fn len(&self) -> usize {
        self.strings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.strings.is_empty()
    }

    /// Number of entries (the SST `cstUnique` field)
    pub fn unique_count(&self) -> u32 {
        self.strings.len() as u32
    }

    pub fn total_reference_count(&self) -> u32 {
        self.total_refs
    }

    pub fn set_total_reference_count(&mut self, count: u32) {
        self.total_refs = count;
    }

    fn key_hash(&self, s: &UnicodeString) -> u64 {
        let mut hasher = ahash::AHasher::default();
        s.text().hash(&mut hasher);
        if self.options.dedup_key == DedupKey::Full {
            s.format_runs().hash(&mut hasher);
            s.extension_data().hash(&mut hasher);
        }
        hasher.finish()
    }

    fn same_key(&self, a: &UnicodeString, b: &UnicodeString) -> bool {
        match self.options.dedup_key {
            DedupKey::Full => a == b,
            DedupKey::TextOnly => a.text() == b.text(),
        }
    }

    fn find(&self, s: &UnicodeString) -> Option<u32> {
        let candidates = self.index_map.get(&self.key_hash(s))?;
        candidates
            .iter()
            .copied()
            .find(|&idx| self.same_key(&self.strings[idx as usize], s))
    }

    fn push(&mut self, s: UnicodeString) -> u32 {
        let idx = self.strings.len() as u32;
        let hash = self.key_hash(&s);
        self.index_map.entry(hash).or_default().push(idx);
        self.strings.push(s);
        idx
    }
}

impl Default for StringTable {
    fn default() -> Self {
        Self::new()
    }
}

impl PartialEq for StringTable {
    fn eq(&self, other: &Self) -> bool {
        self.total_refs == other.total_refs && self.strings == other.strings
    }
}

impl Eq for StringTable {}
