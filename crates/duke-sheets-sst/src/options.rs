//! SST options

/// What the string table compares when deduplicating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum DedupKey {
    /// Text, formatting runs and extension bytes
    #[default]
    Full,
    /// Text only. Rich-text variants of the same text collide; this matches
    /// tables produced by writers that normalized rich text away.
    TextOnly,
}

/// Options for building, reading and writing shared string tables
#[derive(Debug, Clone)]
pub struct SstOptions {
    /// Dedup key (default: full rich-text identity)
    pub dedup_key: DedupKey,
    /// Resolve a decoded entry that collides with an earlier one by appending
    /// trailing spaces (default: true).
    ///
    /// Compatibility quirk: older writers relied on this to keep rich-text
    /// variants apart. When disabled, the colliding entry is kept verbatim at
    /// its own index and lookups return the first one.
    pub pad_duplicates: bool,
    /// Maximum number of spaces appended before giving up
    pub max_padding: usize,
    /// Emit an EXTSST record after the SST frames
    pub extsst: bool,
}

impl Default for SstOptions {
    fn default() -> Self {
        Self {
            dedup_key: DedupKey::Full,
            pad_duplicates: true,
            max_padding: 256,
            extsst: true,
        }
    }
}
