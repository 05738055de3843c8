use anyhow::Result;
use chrono::{Local, TimeZone};
use smallvec::SmallVec;

use crate::core::CellId;

/// An observed commit. Immutable once supplied by the provider.
#[derive(Debug, Clone)]
pub struct Commit {
    /// Unique commit id (content hash).
    pub id: String,
    /// Parent commit ids, in commit order.
    pub parents: SmallVec<[String; 2]>,
    /// Commit timestamp in seconds. Roughly monotonic, not guaranteed unique.
    pub timestamp: i64,
    pub author: String,
    /// Commit message summary (first line).
    pub summary: String,
}

impl Commit {
    pub fn new(
        id: impl Into<String>,
        parents: impl IntoIterator<Item = String>,
        timestamp: i64,
        author: impl Into<String>,
        summary: impl Into<String>,
    ) -> Self {
        Self {
            id: id.into(),
            parents: parents.into_iter().collect(),
            timestamp,
            author: author.into(),
            summary: summary.into(),
        }
    }

    /// Display label: formatted commit time, author and message summary, one
    /// per line.
    pub fn display_label(&self) -> String {
        let when = match Local.timestamp_opt(self.timestamp, 0).single() {
            Some(time) => time.format("%Y-%m-%d %H:%M").to_string(),
            None => self.timestamp.to_string(),
        };
        format!("{}\n{}\n{}", when, self.author, self.summary)
    }
}

/// A branch tip: name, target commit, and whether the branch is mirrored
/// between local and remote.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BranchHead {
    pub name: String,
    pub target: CellId,
    pub tracked: bool,
}

impl BranchHead {
    pub fn new(name: impl Into<String>, target: impl Into<CellId>, tracked: bool) -> Self {
        Self {
            name: name.into(),
            target: target.into(),
            tracked,
        }
    }
}

/// Read-only contract with the repository data provider.
///
/// The engine only observes repository state through this trait; it never
/// calls back into version-control operations.
pub trait CommitSource {
    /// Every commit reachable from the provider's branch tips.
    fn all_commits(&self) -> Result<Vec<Commit>>;

    /// Current branch heads in the provider's scope.
    fn branch_heads(&self) -> Result<Vec<BranchHead>>;

    /// Commits that are new relative to a prior branch-head snapshot.
    fn commits_since(&self, old_heads: &[BranchHead]) -> Result<Vec<Commit>>;
}
