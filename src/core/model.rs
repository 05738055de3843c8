use std::collections::HashMap;

use tracing::debug;

use crate::error::GraphError;
use crate::layout::{Layout, LayoutSnapshot, SnapshotCell};

use super::cell::{Cell, CellId, CellShape};
use super::edge::{Edge, EdgeKind};

/// The authoritative in-memory DAG of cells and edges for one view.
///
/// Pure data: the model performs no locking and must never be mutated from
/// two places at once. It only ever grows; a view that switches repositories
/// replaces its model wholesale.
#[derive(Debug, Clone, Default)]
pub struct GraphModel {
    /// All cells indexed by commit id.
    cells: HashMap<CellId, Cell>,
    /// Cached child->parent edges, one per parent reference.
    edges: Vec<Edge>,
    /// Reverse index: commit id -> children ids.
    children: HashMap<CellId, Vec<CellId>>,
}

impl GraphModel {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts a cell and its edges to each parent id.
    ///
    /// Re-inserting an id that is already visible is a no-op. Inserting a
    /// visible cell over an invisible placeholder upgrades it in place,
    /// refreshing timestamp and label and adding edges for any parents not
    /// previously known. Parent ids that are not present yet are created as
    /// invisible placeholders, so every referenced parent always exists.
    ///
    /// Returns true iff the model changed.
    pub fn add_cell(
        &mut self,
        id: &str,
        timestamp: i64,
        label: &str,
        parents: &[CellId],
        visible: bool,
    ) -> bool {
        match self.cells.get(id).map(|c| c.visible) {
            Some(true) => false,
            Some(false) => {
                if !visible {
                    return false;
                }
                let mut new_parents: Vec<CellId> = Vec::new();
                let mut merge = false;
                if let Some(cell) = self.cells.get_mut(id) {
                    cell.visible = true;
                    cell.timestamp = timestamp;
                    cell.label = label.to_string();
                    for parent in parents {
                        if !cell.parents.contains(parent) {
                            cell.parents.push(parent.clone());
                            new_parents.push(parent.clone());
                        }
                    }
                    merge = cell.parents.len() > 1;
                }
                if merge {
                    // Edges cached before the upgrade may predate the second
                    // parent; keep every edge of a merge cell tagged as such.
                    for edge in self.edges.iter_mut().filter(|e| e.child == id) {
                        edge.kind = EdgeKind::Merge;
                    }
                }
                for parent in &new_parents {
                    self.link(id, parent, merge);
                }
                debug!(id, "upgraded placeholder to visible cell");
                true
            }
            None => {
                self.cells
                    .insert(id.to_string(), Cell::new(id, timestamp, label, parents, visible));
                let merge = parents.len() > 1;
                for parent in parents {
                    self.link(id, parent, merge);
                }
                true
            }
        }
    }

    /// Caches the edge to a parent, creating an invisible placeholder for the
    /// parent if it is not in the model yet.
    fn link(&mut self, child: &str, parent: &CellId, merge: bool) {
        if !self.cells.contains_key(parent) {
            self.cells
                .insert(parent.clone(), Cell::placeholder(parent.clone()));
        }
        let edge = if merge {
            Edge::merge(child.to_string(), parent.clone())
        } else {
            Edge::new(child.to_string(), parent.clone())
        };
        self.edges.push(edge);
        self.children
            .entry(parent.clone())
            .or_default()
            .push(child.to_string());
    }

    pub fn contains_id(&self, id: &str) -> bool {
        self.cells.contains_key(id)
    }

    pub fn is_visible(&self, id: &str) -> bool {
        self.cells.get(id).map(|c| c.visible).unwrap_or(false)
    }

    /// Mutates presentation shape only.
    pub fn set_cell_shape(&mut self, id: &str, shape: CellShape) -> Result<(), GraphError> {
        match self.cells.get_mut(id) {
            Some(cell) => {
                cell.shape = shape;
                Ok(())
            }
            None => Err(GraphError::UnknownCell(id.to_string())),
        }
    }

    /// Mutates the display label only.
    pub fn set_cell_label(&mut self, id: &str, label: &str) -> Result<(), GraphError> {
        match self.cells.get_mut(id) {
            Some(cell) => {
                cell.label = label.to_string();
                Ok(())
            }
            None => Err(GraphError::UnknownCell(id.to_string())),
        }
    }

    /// Resets every cell's shape back to default and returns the ids that
    /// changed, so callers can refresh labels embedding shape-derived text.
    pub fn reset_cell_shapes(&mut self) -> Vec<CellId> {
        let mut changed: Vec<CellId> = Vec::new();
        for cell in self.cells.values_mut() {
            if cell.shape != CellShape::Default {
                cell.shape = CellShape::Default;
                changed.push(cell.id.clone());
            }
        }
        changed.sort_unstable();
        changed
    }

    pub fn cell(&self, id: &str) -> Option<&Cell> {
        self.cells.get(id)
    }

    pub fn cells(&self) -> impl Iterator<Item = &Cell> {
        self.cells.values()
    }

    pub fn edges(&self) -> &[Edge] {
        &self.edges
    }

    /// Children of a commit (empty for tips and unknown ids).
    pub fn children_of(&self, id: &str) -> &[CellId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Parents of a commit (empty for roots and unknown ids).
    pub fn parents_of(&self, id: &str) -> &[CellId] {
        self.cells
            .get(id)
            .map(|c| c.parents.as_slice())
            .unwrap_or(&[])
    }

    /// Cells with no children (branch tips).
    pub fn tips(&self) -> Vec<&Cell> {
        self.cells
            .values()
            .filter(|c| !self.children.contains_key(&c.id))
            .collect()
    }

    /// Cells with no parents.
    pub fn roots(&self) -> Vec<&Cell> {
        self.cells.values().filter(|c| c.is_root()).collect()
    }

    pub fn cell_count(&self) -> usize {
        self.cells.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn stats(&self) -> GraphStats {
        GraphStats {
            cells: self.cells.len(),
            visible_cells: self.cells.values().filter(|c| c.visible).count(),
            edges: self.edges.len(),
            merge_cells: self.cells.values().filter(|c| c.is_merge()).count(),
            roots: self.roots().len(),
            tips: self.tips().len(),
        }
    }

    /// Immutable topology snapshot for the layout algorithm. Placeholders are
    /// included so ancestry edges through them stay routable.
    pub fn snapshot(&self) -> LayoutSnapshot {
        LayoutSnapshot {
            cells: self
                .cells
                .values()
                .map(|c| SnapshotCell {
                    id: c.id.clone(),
                    timestamp: c.timestamp,
                    parents: c.parents.clone(),
                })
                .collect(),
        }
    }

    /// Publishes a completed layout: all cell positions and edge lanes in one
    /// call, so consumers never observe a partially applied layout.
    pub fn apply_layout(&mut self, layout: &Layout) {
        for (id, position) in &layout.positions {
            if let Some(cell) = self.cells.get_mut(id) {
                cell.position = Some(*position);
            }
        }
        for edge in &mut self.edges {
            edge.lane = layout
                .edge_lanes
                .get(&(edge.child.clone(), edge.parent.clone()))
                .copied();
        }
    }
}

/// Summary counters, used for logging after sync passes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GraphStats {
    pub cells: usize,
    pub visible_cells: usize,
    pub edges: usize,
    pub merge_cells: usize,
    pub roots: usize,
    pub tips: usize,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_model() -> GraphModel {
        let mut model = GraphModel::new();
        model.add_cell("aaa", 1, "Initial commit", &[], true);
        model.add_cell("bbb", 2, "Second commit", &["aaa".to_string()], true);
        model.add_cell("ccc", 3, "Third commit", &["bbb".to_string()], true);
        model
    }

    #[test]
    fn add_cell_is_idempotent_for_visible_ids() {
        let mut model = sample_model();
        let cells = model.cell_count();
        let edges = model.edge_count();

        let changed = model.add_cell("bbb", 2, "Second commit", &["aaa".to_string()], true);

        assert!(!changed);
        assert_eq!(model.cell_count(), cells);
        assert_eq!(model.edge_count(), edges);
    }

    #[test]
    fn unknown_parents_become_placeholders() {
        let mut model = GraphModel::new();
        model.add_cell("child", 5, "Child", &["missing".to_string()], true);

        assert!(model.contains_id("missing"));
        assert!(!model.is_visible("missing"));
        assert_eq!(model.children_of("missing"), &["child".to_string()]);
    }

    #[test]
    fn placeholder_upgrades_in_place() {
        let mut model = GraphModel::new();
        model.add_cell("child", 5, "Child", &["p".to_string()], true);
        assert!(!model.is_visible("p"));

        let changed = model.add_cell("p", 4, "Parent", &["root".to_string()], true);

        assert!(changed);
        assert!(model.is_visible("p"));
        assert_eq!(model.cell("p").map(|c| c.timestamp), Some(4));
        assert!(model.contains_id("root"));
        assert_eq!(model.parents_of("p"), &["root".to_string()]);
    }

    #[test]
    fn visibility_never_downgrades() {
        let mut model = sample_model();
        let changed = model.add_cell("aaa", 1, "Initial commit", &[], false);
        assert!(!changed);
        assert!(model.is_visible("aaa"));
    }

    #[test]
    fn shape_mutation_on_unknown_id_is_recoverable() {
        let mut model = sample_model();
        let err = model.set_cell_shape("nope", CellShape::TrackedBranchHead);
        assert_eq!(err, Err(GraphError::UnknownCell("nope".to_string())));
        assert_eq!(model.cell_count(), 3);
    }

    #[test]
    fn reset_cell_shapes_reports_changed_ids() {
        let mut model = sample_model();
        model
            .set_cell_shape("ccc", CellShape::TrackedBranchHead)
            .ok();
        model
            .set_cell_shape("aaa", CellShape::UntrackedBranchHead)
            .ok();

        let changed = model.reset_cell_shapes();

        assert_eq!(changed, vec!["aaa".to_string(), "ccc".to_string()]);
        assert!(model.cells().all(|c| c.shape == CellShape::Default));
        assert!(model.reset_cell_shapes().is_empty());
    }

    #[test]
    fn upgrade_retags_edges_when_cell_becomes_a_merge() {
        let mut model = GraphModel::new();
        // First sighting: invisible, one parent known, edge cached as regular.
        model.add_cell("m", 3, "", &["p1".to_string()], false);
        // Own data arrives with a second parent.
        model.add_cell("m", 3, "Merge", &["p1".to_string(), "p2".to_string()], true);

        let kinds: Vec<EdgeKind> = model
            .edges()
            .iter()
            .filter(|e| e.child == "m")
            .map(|e| e.kind)
            .collect();
        assert_eq!(kinds, vec![EdgeKind::Merge, EdgeKind::Merge]);
        assert_eq!(model.stats().merge_cells, 1);
    }

    #[test]
    fn merge_commit_caches_merge_edges() {
        let mut model = sample_model();
        model.add_cell(
            "ddd",
            4,
            "Merge",
            &["bbb".to_string(), "ccc".to_string()],
            true,
        );

        let merge_edges = model
            .edges()
            .iter()
            .filter(|e| e.child == "ddd" && e.kind == crate::core::EdgeKind::Merge)
            .count();
        assert_eq!(merge_edges, 2);
        assert_eq!(model.stats().merge_cells, 1);
    }
}
