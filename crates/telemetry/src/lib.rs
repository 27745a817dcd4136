//! Agent activity timeline for Switchyard.
//!
//! Every observable action in the system — inputs, streamed progress,
//! tool invocations, outputs, errors — lands in one shared, thread-safe,
//! bounded [`LogStore`]. Consecutive streamed progress notices from the
//! same agent are consolidated into a single entry so token-level deltas
//! don't flood the timeline.

pub mod model;
pub mod store;

pub use model::{LogEvent, Stage};
pub use store::LogStore;
