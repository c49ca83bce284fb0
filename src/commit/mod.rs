//! Change sets: the input model, staged-change collection, and committing.

pub mod change;
pub mod diff;
pub mod message;

pub use change::{ChangeSet, FileChange, FileStatus};
pub use diff::{MAX_DIFF_LENGTH, collect_staged};
pub use message::{SubjectFit, commit_staged, fit_subject, truncate_subject};
