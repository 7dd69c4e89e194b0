//! Git access: staged diff and history via git2, index and commit writes via
//! the `git` binary.

pub mod backend;
pub mod history;
pub mod staged;

pub use backend::{GitCli, StagingBackend};
#[cfg(test)]
pub use backend::MockStagingBackend;
pub use history::recent_messages;
pub use staged::{StagedChanges, collect_staged, open_repository};
