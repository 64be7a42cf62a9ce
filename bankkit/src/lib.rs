//! BankKit - native Rust access to Wwise audio containers
//!
//! This crate reads, mutates, and rewrites the two container formats the
//! Wwise audio middleware ships sound in: SoundBanks (`.bnk`/`.nbnk`) and
//! File Packages (`.pck`/`.npck`). Both embed a run of compressed audio
//! payloads ("wems") behind an index of IDs, offsets, and lengths; a
//! SoundBank additionally carries an object hierarchy describing playback
//! behavior, notably per-sound looping.
//!
//! An unmodified container always serializes back byte-for-byte. Wems can be
//! swapped for new payloads of any size - descriptors, alignment padding,
//! and every downstream offset are recomputed - and a SoundBank's loop
//! parameters can be edited in place.

pub mod bnk;
pub mod error;
pub mod io;
pub mod pck;
pub mod wwise;

// Re-exports for convenience
pub use error::{Error, Result};

/// Prelude module for common imports
pub mod prelude {
    pub use crate::bnk::{LoopSetting, SoundBank};
    pub use crate::error::{Error, Result};
    pub use crate::pck::FilePackage;
    pub use crate::wwise::{Container, ReplacementWem, Wem, WemDescriptor};
}

pub const VERSION: &str = env!("CARGO_PKG_VERSION");
