//! Error types for `bankkit`

use thiserror::Error;

/// The error type for `bankkit` operations.
#[non_exhaustive]
#[derive(Error, Debug)]
pub enum Error {
    // ==================== IO Errors ====================
    /// IO error from the underlying source or sink.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // ==================== Format Errors ====================
    /// A wem ID appeared more than once in the data index.
    #[error("duplicate wem ID {wem_id} in the data index")]
    DuplicateWemId {
        /// The repeated wem ID.
        wem_id: u32,
    },

    /// The data index length is not a whole number of index entries.
    #[error("data index length {length} is not a multiple of the {entry_size}-byte entry size")]
    MalformedDataIndex {
        /// The declared section length.
        length: u32,
        /// The fixed size of one index entry.
        entry_size: u32,
    },

    /// A section body is shorter than its fixed fields.
    #[error("section {identifier:?} is truncated")]
    TruncatedSection {
        /// The four-byte section identifier.
        identifier: [u8; 4],
    },

    /// The container has no wem data.
    #[error("there are no wems stored within this file")]
    NoWems,

    /// A wem did not begin where its index entry said it would.
    #[error("wem {wem_id} was expected to start at offset {expected} but instead started at offset {actual}")]
    WemOffsetMismatch {
        /// The wem whose placement disagrees with the index.
        wem_id: u32,
        /// The offset recorded in the index.
        expected: u32,
        /// The offset at which the wem data was actually found.
        actual: u64,
    },

    /// Adjacent wems in the data index overlap.
    #[error("wem {wem_id} overlaps the data that follows it")]
    WemOverlap {
        /// The wem whose extent runs past the next wem's offset.
        wem_id: u32,
    },

    /// An object hierarchy entry declared a length too short to hold its own ID.
    #[error("object {object_id} declares impossible length {length}")]
    MalformedObject {
        /// The object whose descriptor is malformed.
        object_id: u32,
        /// The declared length.
        length: u32,
    },

    // ==================== Logical Errors ====================
    /// A wem index was outside the container's wem list.
    #[error("wem index {index} is out of range: the container has {count} wem(s)")]
    WemIndexOutOfRange {
        /// The offending zero-based index.
        index: usize,
        /// The number of wems in the container.
        count: usize,
    },

    /// A loop count that cannot be encoded. Finite loops repeat at least
    /// twice; endless playback is expressed through the infinite setting.
    #[error("invalid loop count {0}: finite loops must play at least twice")]
    InvalidLoopCount(u32),

    /// No sound object in the object hierarchy references the target wem.
    #[error("no sound object references wem {wem_id}")]
    NoSoundObject {
        /// The wem ID with no associated playback object.
        wem_id: u32,
    },
}

/// A specialized Result type for `bankkit` operations.
pub type Result<T> = std::result::Result<T, Error>;
