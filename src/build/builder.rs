use std::collections::{HashMap, HashSet};

use anyhow::Result;
use tracing::{debug, info};

use crate::core::{CellId, CellShape, GraphModel};

use super::{BranchHead, Commit, CommitSource};

/// Translates repository state into graph-model mutations, keeping the model
/// a fully connected ancestry graph at every step: a commit's ancestors are
/// inserted (as invisible placeholders) before the commit itself, even when
/// commits arrive out of ancestry order.
#[derive(Debug, Default)]
pub struct DagBuilder {
    /// Every commit ever observed, kept for ancestor resolution.
    index: HashMap<String, Commit>,
    /// Branch heads as of the last applied snapshot.
    heads: Vec<BranchHead>,
}

impl DagBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn heads(&self) -> &[BranchHead] {
        &self.heads
    }

    /// Feeds commit data into the resolution index without touching the model.
    pub fn observe(&mut self, commits: impl IntoIterator<Item = Commit>) {
        for commit in commits {
            self.index.entry(commit.id.clone()).or_insert(commit);
        }
    }

    /// Inserts every supplied commit, ancestors first, then applies
    /// branch-head markers. Returns true iff at least one new cell was added.
    pub fn build_all(
        &mut self,
        model: &mut GraphModel,
        commits: Vec<Commit>,
        branches: Vec<BranchHead>,
    ) -> bool {
        let ids: Vec<String> = commits.iter().map(|c| c.id.clone()).collect();
        self.observe(commits);

        let mut changed = false;
        for id in &ids {
            changed |= self.ensure_commit(model, id, true);
        }
        self.set_branch_heads(model, &branches);
        self.heads = branches;

        if changed {
            let stats = model.stats();
            info!(cells = stats.cells, edges = stats.edges, "full build updated graph");
        }
        changed
    }

    /// Applies the commits introduced since the previous branch-head
    /// snapshot, derived from the head diff: an unchanged head contributes
    /// nothing, a new branch name contributes its full reachable history, a
    /// moved head contributes the commits between old and new tip. Returns
    /// true iff at least one new cell was added, i.e. relayout is needed.
    pub fn build_incremental(
        &mut self,
        model: &mut GraphModel,
        old_heads: &[BranchHead],
        new_heads: Vec<BranchHead>,
        new_commits: Vec<Commit>,
    ) -> bool {
        self.observe(new_commits);

        let old_by_name: HashMap<&str, &BranchHead> =
            old_heads.iter().map(|h| (h.name.as_str(), h)).collect();

        let mut changed = false;
        for head in &new_heads {
            match old_by_name.get(head.name.as_str()) {
                Some(old) if old.target == head.target => continue,
                Some(old) => {
                    debug!(branch = %head.name, from = %old.target, to = %head.target, "branch head moved");
                    changed |= self.ensure_reachable(model, &head.target);
                }
                None => {
                    debug!(branch = %head.name, target = %head.target, "new branch");
                    changed |= self.ensure_reachable(model, &head.target);
                }
            }
        }

        self.set_branch_heads(model, &new_heads);
        self.heads = new_heads;
        changed
    }

    /// Explicit placeholder insertion for a commit referenced from elsewhere
    /// (e.g. another view's branch head); resolves the commit's own missing
    /// ancestors first. Returns true iff the model changed.
    pub fn add_invisible_commit(&mut self, model: &mut GraphModel, id: &str) -> bool {
        self.ensure_commit(model, id, false)
    }

    /// Re-applies branch-head markers: clears every stale shape, restores the
    /// labels that carried branch annotations, then marks each current head
    /// tracked or untracked and annotates its label.
    pub fn set_branch_heads(&mut self, model: &mut GraphModel, branches: &[BranchHead]) {
        for id in model.reset_cell_shapes() {
            let label = match self.index.get(&id) {
                Some(commit) => commit.display_label(),
                None => model
                    .cell(&id)
                    .map(|c| base_label(&c.label))
                    .unwrap_or_default(),
            };
            let _ = model.set_cell_label(&id, &label);
        }

        let mut by_target: HashMap<&str, Vec<&BranchHead>> = HashMap::new();
        for head in branches {
            by_target.entry(head.target.as_str()).or_default().push(head);
        }

        for (target, heads) in by_target {
            let tracked = heads.iter().any(|h| h.tracked);
            let shape = if tracked {
                CellShape::TrackedBranchHead
            } else {
                CellShape::UntrackedBranchHead
            };
            if model.set_cell_shape(target, shape).is_err() {
                debug!(id = target, "branch head points at a commit not in the model");
                continue;
            }

            let mut label = match self.index.get(target) {
                Some(commit) => commit.display_label(),
                None => model
                    .cell(target)
                    .map(|c| base_label(&c.label))
                    .unwrap_or_default(),
            };
            let mut names: Vec<&str> = heads.iter().map(|h| h.name.as_str()).collect();
            names.sort_unstable();
            for name in names {
                label.push_str("\nBranch: ");
                label.push_str(name);
            }
            let _ = model.set_cell_label(target, &label);
        }
    }

    /// Pulls the provider's full state and rebuilds.
    pub fn sync_full(
        &mut self,
        model: &mut GraphModel,
        source: &impl CommitSource,
    ) -> Result<bool> {
        let commits = source.all_commits()?;
        let branches = source.branch_heads()?;
        Ok(self.build_all(model, commits, branches))
    }

    /// Pulls only what changed since the last applied head snapshot.
    pub fn sync_incremental(
        &mut self,
        model: &mut GraphModel,
        source: &impl CommitSource,
    ) -> Result<bool> {
        let old_heads = self.heads.clone();
        let new_heads = source.branch_heads()?;
        let new_commits = source.commits_since(&old_heads)?;
        Ok(self.build_incremental(model, &old_heads, new_heads, new_commits))
    }

    /// Inserts the tip and everything reachable from it that the model does
    /// not already show, each as a visible cell. Only commits the index can
    /// supply become visible; resolution stops at the rest, which stay
    /// invisible placeholders.
    fn ensure_reachable(&self, model: &mut GraphModel, tip: &str) -> bool {
        let mut pending: Vec<String> = Vec::new();
        let mut stack = vec![tip.to_string()];
        let mut seen: HashSet<String> = HashSet::new();
        while let Some(cur) = stack.pop() {
            if !seen.insert(cur.clone()) {
                continue;
            }
            if model.is_visible(&cur) {
                continue;
            }
            let Some(commit) = self.index.get(&cur) else {
                continue;
            };
            for parent in &commit.parents {
                stack.push(parent.clone());
            }
            pending.push(cur);
        }

        let mut changed = false;
        for id in &pending {
            changed |= self.ensure_commit(model, id, true);
        }
        changed
    }

    /// Inserts `target` (visible, or as a placeholder when `visible` is
    /// false), first making sure every resolvable ancestor is present,
    /// deepest ancestor first. Resolution stops at ids the index cannot
    /// supply; an incomplete (partially rooted) graph is accepted.
    fn ensure_commit(&self, model: &mut GraphModel, target: &str, visible: bool) -> bool {
        if model.is_visible(target) || (!visible && model.contains_id(target)) {
            return false;
        }

        // Post-order walk with an explicit stack so long histories cannot
        // overflow the call stack.
        let mut order: Vec<String> = Vec::new();
        let mut seen: HashSet<String> = HashSet::new();
        let mut walk: Vec<(String, bool)> = vec![(target.to_string(), false)];
        while let Some((cur, expanded)) = walk.pop() {
            if expanded {
                order.push(cur);
                continue;
            }
            if !seen.insert(cur.clone()) {
                continue;
            }
            if model.contains_id(&cur) && cur != target {
                continue;
            }
            walk.push((cur.clone(), true));
            if let Some(commit) = self.index.get(&cur) {
                for parent in &commit.parents {
                    if !model.contains_id(parent) && !seen.contains(parent) {
                        walk.push((parent.clone(), false));
                    }
                }
            }
        }

        let mut changed = false;
        for id in &order {
            let cell_visible = visible && id == target;
            changed |= match self.index.get(id) {
                Some(commit) => model.add_cell(
                    &commit.id,
                    commit.timestamp,
                    &commit.display_label(),
                    &commit.parents,
                    cell_visible,
                ),
                // Unresolvable ancestor: accept it as a bare placeholder.
                None => model.add_cell(id, 0, "", &[], cell_visible),
            };
        }
        changed
    }
}

/// Drops any branch annotation lines from a stored label, leaving the commit
/// text it was derived from.
fn base_label(label: &str) -> String {
    label
        .lines()
        .filter(|line| !line.starts_with("Branch: "))
        .collect::<Vec<_>>()
        .join("\n")
}
