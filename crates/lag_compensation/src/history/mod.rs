//! Pose history
//!
//! Every tracked object keeps a short, bounded record of where it was. Rewinds
//! read poses back out of it at arbitrary past times.

pub mod buffer;
pub mod sample;

pub use buffer::{HistoryBuffer, DEFAULT_HISTORY_CAPACITY};
pub use sample::TransformSample;
