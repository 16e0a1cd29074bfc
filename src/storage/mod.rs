/// Durable state: the seen-id set and the processed record history.
///
/// Both live in small JSON documents that are rewritten whole through an atomic
/// temp-file-and-rename, so a crash mid-write never leaves a truncated file.

pub mod atomic;
pub mod history;
pub mod seen;

pub use history::{ProcessedRecord, RecordHistory};
pub use seen::SeenSet;
