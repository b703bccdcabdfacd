//! Node merging and merge diagnostics.

mod log;
mod node_merger;

pub use log::{LogEntry, LogKind, MergeLog, Severity};
pub use node_merger::merge_children;
