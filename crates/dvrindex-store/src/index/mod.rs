//! Per-segment time index.
//!
//! - `entry` - The fixed-width 16-byte record codec.
//! - `store` - The index file handle (record and playback modes).

mod entry;
mod store;

pub use entry::{IndexEntry, ENTRY_SIZE};
pub use store::{IndexStore, OpenMode, VerifyReport};
