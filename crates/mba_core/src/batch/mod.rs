//! Multi-file analysis batches.
//!
//! A batch runs on one worker thread and reports everything it does as
//! `AnalysisEvent`s over an unbounded channel. The consumer polls the
//! receiver without blocking; events per file arrive in a fixed order
//! and a failing file never aborts the rest of the batch.

pub mod coordinator;
pub mod events;

pub use coordinator::{
    AnalysisError, Analyzer, BatchCoordinator, BatchError, BatchState, FileProcessor,
};
pub use events::AnalysisEvent;
