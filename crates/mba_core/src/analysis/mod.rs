//! Bitrate profiling.
//!
//! Streams per-packet `pts_time,size` rows from a second probe pass and
//! folds them into fixed-width time buckets, each holding the average
//! bitrate of that interval in kbps.

pub mod aggregator;
pub mod types;

pub use aggregator::sample_bitrate;
pub use types::{BitrateSeries, PacketRecord, DEFAULT_INTERVAL_SECS};
