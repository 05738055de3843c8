use anyhow::{Context, Result};
use git2::{BranchType, Oid, Repository, Sort};
use smallvec::SmallVec;

use crate::build::{BranchHead, Commit, CommitSource};

/// Which side of the repository a view pulls its branch tips from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceScope {
    Local,
    Remote,
}

/// Read-only repository data provider backed by libgit2. Exposes observable
/// state only; clone/fetch/push/commit stay with the surrounding application.
pub struct GitSource {
    repo: Repository,
    scope: SourceScope,
}

impl GitSource {
    pub fn open(path: &str, scope: SourceScope) -> Result<Self> {
        let repo = Repository::open(path).context("Failed to open repository")?;
        Ok(Self { repo, scope })
    }

    pub fn from_env(scope: SourceScope) -> Result<Self> {
        let repo = Repository::open_from_env().context("Failed to open repository")?;
        Ok(Self { repo, scope })
    }

    fn branch_type(&self) -> BranchType {
        match self.scope {
            SourceScope::Local => BranchType::Local,
            SourceScope::Remote => BranchType::Remote,
        }
    }

    fn tips(&self) -> Result<Vec<Oid>> {
        let mut tips = Vec::new();
        for branch in self.repo.branches(Some(self.branch_type()))? {
            let (branch, _) = branch?;
            if let Some(target) = branch.get().target() {
                tips.push(target);
            }
        }
        Ok(tips)
    }

    /// Walks from all branch tips in scope, hiding anything reachable from
    /// the given prior heads.
    fn walk(&self, hide: &[BranchHead]) -> Result<Vec<Commit>> {
        let tips = self.tips()?;
        if tips.is_empty() {
            return Ok(Vec::new());
        }

        let mut revwalk = self.repo.revwalk()?;
        revwalk.set_sorting(Sort::TOPOLOGICAL | Sort::TIME)?;
        for tip in tips {
            revwalk.push(tip)?;
        }
        for head in hide {
            if let Ok(oid) = Oid::from_str(&head.target) {
                // A prior head that no longer exists contributes nothing.
                let _ = revwalk.hide(oid);
            }
        }

        let mut commits = Vec::new();
        for oid in revwalk {
            let oid = oid?;
            commits.push(self.commit_data(oid)?);
        }
        Ok(commits)
    }

    fn commit_data(&self, oid: Oid) -> Result<Commit> {
        let commit = self.repo.find_commit(oid)?;
        let parents: SmallVec<[String; 2]> =
            commit.parent_ids().map(|p| p.to_string()).collect();
        let author = commit.author().name().unwrap_or("Unknown").to_string();
        let summary = commit.summary().unwrap_or("").to_string();

        Ok(Commit {
            id: oid.to_string(),
            parents,
            timestamp: commit.time().seconds(),
            author,
            summary,
        })
    }

    /// Whether a branch is mirrored on the other side: a local branch with a
    /// configured upstream, or a remote branch some local branch tracks.
    fn is_tracked(&self, branch: &git2::Branch, name: &str) -> bool {
        match self.scope {
            SourceScope::Local => branch.upstream().is_ok(),
            SourceScope::Remote => {
                let Ok(locals) = self.repo.branches(Some(BranchType::Local)) else {
                    return false;
                };
                for local in locals.flatten() {
                    if let Ok(upstream) = local.0.upstream() {
                        if let Ok(Some(upstream_name)) = upstream.name() {
                            if upstream_name == name {
                                return true;
                            }
                        }
                    }
                }
                false
            }
        }
    }
}

impl CommitSource for GitSource {
    fn all_commits(&self) -> Result<Vec<Commit>> {
        self.walk(&[])
    }

    fn branch_heads(&self) -> Result<Vec<BranchHead>> {
        let mut heads = Vec::new();
        for branch in self.repo.branches(Some(self.branch_type()))? {
            let (branch, _) = branch?;
            let name = match branch.name()? {
                Some(name) => name.to_string(),
                None => continue,
            };
            let target = match branch.get().target() {
                Some(target) => target,
                None => continue,
            };
            let tracked = self.is_tracked(&branch, &name);
            heads.push(BranchHead {
                name,
                target: target.to_string(),
                tracked,
            });
        }
        heads.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(heads)
    }

    fn commits_since(&self, old_heads: &[BranchHead]) -> Result<Vec<Commit>> {
        self.walk(old_heads)
    }
}
