//! Dvrindex-Common: Shared types and utilities.
//!
//! This crate provides common functionality used across dvrindex:
//!
//! - **Error Handling**: The error taxonomy shared by the index store and
//!   the segment list, plus a result alias
//! - **Path Utilities**: A length-checked segment path type and the naming
//!   convention that ties a segment file to its index file
//!
//! # Examples
//!
//! ```
//! use dvrindex_common::{Error, Result, SegmentPath};
//!
//! let path = SegmentPath::new("/recordings/news/seg-0001.ts").unwrap();
//! assert_eq!(path.as_str(), "/recordings/news/seg-0001.ts");
//!
//! fn example() -> Result<()> {
//!     Err(Error::not_found("index is empty"))
//! }
//! assert!(example().unwrap_err().is_not_found());
//! ```

pub mod error;
pub mod paths;

pub use error::{Error, Result};
pub use paths::{index_path_for, SegmentPath, MAX_SEGMENT_PATH_LEN};
