//! Media probing via ffprobe.
//!
//! Two probe invocations are used per file: a JSON metadata probe
//! (`metadata`) and a flat per-packet listing consumed by the analysis
//! module. `launcher` owns the process plumbing shared by both.

pub mod launcher;
pub mod metadata;
pub mod types;

pub use launcher::{ensure_available, ProbeExit, ProbeStream, PROBE_TOOL};
pub use metadata::read_metadata;
pub use types::{MediaDescriptor, ProbeError, ProbeResult, StreamDescriptor, StreamKind};
