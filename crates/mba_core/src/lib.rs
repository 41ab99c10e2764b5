//! Core library for the Media Bitrate Analyzer.
//!
//! This crate contains all the backend logic for probing media files and
//! building time-bucketed bitrate profiles, with no UI dependencies. It can
//! be driven by a terminal front-end or any other consumer that polls the
//! batch event channel.
//!
//! # Architecture
//!
//! - `probe` - ffprobe process launching and metadata reading
//! - `analysis` - packet-size aggregation into fixed-interval bitrate buckets
//! - `batch` - multi-file sequencing on a worker thread, event channel
//! - `render` - chart rendering of a completed bitrate series
//! - `config` - TOML-based settings

pub mod analysis;
pub mod batch;
pub mod config;
pub mod probe;
pub mod render;

/// Library version from Cargo.toml.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
