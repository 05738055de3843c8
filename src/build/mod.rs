pub mod builder;
pub mod commit;

pub use builder::DagBuilder;
pub use commit::{BranchHead, Commit, CommitSource};
