use std::collections::HashMap;

use anyhow::Result;
use tracing::debug;

use crate::build::{CommitSource, DagBuilder};
use crate::core::GraphModel;
use crate::highlight::{Highlighter, SelectOptions};
use crate::layout::LayoutCoordinator;

/// One logical view of a repository (e.g. "local" or "remote"). The view
/// owns its graph model outright, along with the builder, layout coordinator
/// and highlighter operating on it; switching repositories replaces the whole
/// view.
#[derive(Debug, Default)]
pub struct GraphView {
    pub model: GraphModel,
    pub builder: DagBuilder,
    pub coordinator: LayoutCoordinator,
    pub highlighter: Highlighter,
}

impl GraphView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Full rebuild from the provider, then relayout if anything changed.
    /// Returns whether the topology changed.
    pub async fn refresh_full(&mut self, source: &impl CommitSource) -> Result<bool> {
        let changed = self.builder.sync_full(&mut self.model, source)?;
        if changed {
            self.relayout().await;
        }
        Ok(changed)
    }

    /// Incremental sync against the last applied branch-head snapshot, then
    /// relayout if anything changed.
    pub async fn refresh_incremental(&mut self, source: &impl CommitSource) -> Result<bool> {
        let changed = self.builder.sync_incremental(&mut self.model, source)?;
        if changed {
            self.relayout().await;
        }
        Ok(changed)
    }

    /// Recomputes the layout for the current topology and publishes it into
    /// the model. A stale in-flight computation is cancelled and awaited
    /// before the new one starts.
    pub async fn relayout(&mut self) {
        self.coordinator.request_layout(self.model.snapshot()).await;
        if let Some(layout) = self.coordinator.finish().await {
            self.model.apply_layout(&layout);
        }
    }
}

/// Explicit registry of the session's views, replacing process-wide
/// controller state: shared-commit discoveries and selection changes fan out
/// to every registered view.
#[derive(Debug, Default)]
pub struct ViewRegistry {
    views: HashMap<String, GraphView>,
}

impl ViewRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the named view, creating it if needed.
    pub fn register(&mut self, name: &str) -> &mut GraphView {
        self.views.entry(name.to_string()).or_default()
    }

    pub fn view(&self, name: &str) -> Option<&GraphView> {
        self.views.get(name)
    }

    pub fn view_mut(&mut self, name: &str) -> Option<&mut GraphView> {
        self.views.get_mut(name)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.views.keys().map(String::as_str)
    }

    /// Makes a commit known to every view as at least an invisible
    /// placeholder (e.g. a branch head seen by another view), relayouting the
    /// views whose topology changed.
    pub async fn broadcast_commit(&mut self, id: &str) {
        for (name, view) in self.views.iter_mut() {
            if view.builder.add_invisible_commit(&mut view.model, id) {
                debug!(view = %name, id, "inserted cross-view placeholder");
                view.relayout().await;
            }
        }
    }

    /// Applies the selection to every registered view that knows the commit.
    pub fn select_commit(&mut self, id: &str, opts: SelectOptions) {
        for view in self.views.values_mut() {
            view.highlighter.select(&view.model, id, opts);
        }
    }

    pub fn hover_commit(&mut self, id: &str, enter: bool) {
        for view in self.views.values_mut() {
            view.highlighter.hover(&view.model, id, enter);
        }
    }

    pub fn reset_selection(&mut self) {
        for view in self.views.values_mut() {
            view.highlighter.reset_selection();
        }
    }
}

#[cfg(test)]
mod tests {
    use anyhow::Result;

    use crate::build::{BranchHead, Commit, CommitSource};
    use crate::core::CellShape;
    use crate::highlight::HighlightState;

    use super::*;

    /// In-memory provider standing in for a repository.
    struct FakeSource {
        commits: Vec<Commit>,
        heads: Vec<BranchHead>,
    }

    impl CommitSource for FakeSource {
        fn all_commits(&self) -> Result<Vec<Commit>> {
            Ok(self.commits.clone())
        }

        fn branch_heads(&self) -> Result<Vec<BranchHead>> {
            Ok(self.heads.clone())
        }

        fn commits_since(&self, old_heads: &[BranchHead]) -> Result<Vec<Commit>> {
            // Everything not reachable from the old heads; good enough for a
            // fake that only ever appends.
            let known: Vec<&str> = old_heads.iter().map(|h| h.target.as_str()).collect();
            let mut new = Vec::new();
            let mut boundary_seen = false;
            for commit in &self.commits {
                if known.contains(&commit.id.as_str()) {
                    boundary_seen = true;
                    continue;
                }
                if boundary_seen || known.is_empty() {
                    new.push(commit.clone());
                }
            }
            Ok(new)
        }
    }

    fn commit(id: &str, timestamp: i64, parents: &[&str]) -> Commit {
        Commit::new(
            id,
            parents.iter().map(|p| p.to_string()).collect::<Vec<_>>(),
            timestamp,
            "Alice",
            format!("Commit {id}"),
        )
    }

    fn source() -> FakeSource {
        FakeSource {
            commits: vec![
                commit("a", 1, &[]),
                commit("b", 2, &["a"]),
                commit("c", 2, &["a"]),
                commit("d", 3, &["b", "c"]),
            ],
            heads: vec![BranchHead::new("master", "d", true)],
        }
    }

    #[tokio::test]
    async fn refresh_full_builds_and_positions_the_graph() {
        let mut view = GraphView::new();

        let changed = view.refresh_full(&source()).await.expect("refresh");

        assert!(changed);
        assert_eq!(view.model.cell_count(), 4);
        assert!(view.model.cells().all(|c| c.position.is_some()));
        assert_eq!(
            view.model.cell("d").map(|c| c.shape),
            Some(CellShape::TrackedBranchHead)
        );

        // Second refresh with identical state is a no-op.
        let changed = view.refresh_full(&source()).await.expect("refresh");
        assert!(!changed);
    }

    #[tokio::test]
    async fn refresh_incremental_extends_the_graph() {
        let mut view = GraphView::new();
        view.refresh_full(&source()).await.expect("refresh");

        let mut extended = source();
        extended.commits.push(commit("e", 4, &["d"]));
        extended.heads = vec![BranchHead::new("master", "e", true)];

        let changed = view
            .refresh_incremental(&extended)
            .await
            .expect("incremental");

        assert!(changed);
        assert!(view.model.is_visible("e"));
        assert!(view
            .model
            .cell("e")
            .map(|c| c.position.is_some())
            .unwrap_or(false));
        assert_eq!(
            view.model.cell("e").map(|c| c.shape),
            Some(CellShape::TrackedBranchHead)
        );
        assert_eq!(view.model.cell("d").map(|c| c.shape), Some(CellShape::Default));
    }

    #[tokio::test]
    async fn broadcast_commit_places_placeholders_in_lagging_views() {
        let mut registry = ViewRegistry::new();
        registry
            .register("local")
            .refresh_full(&source())
            .await
            .expect("refresh");
        registry.register("remote");

        registry.broadcast_commit("d").await;

        let remote = registry.view("remote").expect("remote view");
        assert!(remote.model.contains_id("d"));
        assert!(!remote.model.is_visible("d"));
        // The local view already had it; unchanged.
        let local = registry.view("local").expect("local view");
        assert!(local.model.is_visible("d"));
    }

    #[tokio::test]
    async fn selection_fans_out_to_all_views() {
        let mut registry = ViewRegistry::new();
        registry
            .register("local")
            .refresh_full(&source())
            .await
            .expect("refresh");
        registry
            .register("remote")
            .refresh_full(&source())
            .await
            .expect("refresh");

        registry.select_commit("a", SelectOptions::descendants_only());
        for name in ["local", "remote"] {
            let view = registry.view(name).expect("view");
            assert!(view.highlighter.is_selected("a"), "{name}");
            assert_eq!(view.highlighter.state("d"), HighlightState::Relative);
        }

        registry.reset_selection();
        for name in ["local", "remote"] {
            let view = registry.view(name).expect("view");
            assert_eq!(view.highlighter.highlighted().count(), 0, "{name}");
        }
    }
}
