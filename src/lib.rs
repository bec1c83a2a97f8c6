//! Dvrindex - DVR recording time index tool
//!
//! This library crate exposes the recording and playback drivers for
//! integration testing.

pub mod config;
pub mod playback;
pub mod recorder;
