pub mod git;

pub use git::{GitSource, SourceScope};
