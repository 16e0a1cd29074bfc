/// Static dashboard publishing
///
/// The page embeds the newest records as a `const videos = [...]` literal; after
/// rewriting it the working tree is committed and pushed.

pub mod git;
pub mod page;

pub use git::{commit_message, GitPublisher};
pub use page::{PageEntry, PagePublisher};
