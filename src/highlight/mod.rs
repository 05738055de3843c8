use std::collections::{HashMap, HashSet, VecDeque};

use crate::core::{CellId, GraphModel};

/// Presentation state of a cell, kept outside the graph model.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum HighlightState {
    #[default]
    Baseline,
    /// The selected cell itself.
    Selected,
    /// Reachable from the selection per the active options.
    Relative,
    /// Under the pointer, with nothing shadowing it.
    Hovered,
}

/// Which reachability sets a selection highlights. `depth` bounds traversal
/// by generations; zero or negative means unbounded.
#[derive(Debug, Clone, Copy)]
pub struct SelectOptions {
    pub ancestors: bool,
    pub descendants: bool,
    pub depth: i32,
}

impl SelectOptions {
    /// The full transitive closure in both directions.
    pub fn relatives() -> Self {
        Self {
            ancestors: true,
            descendants: true,
            depth: 0,
        }
    }

    /// Direct parents and children only.
    pub fn neighbors() -> Self {
        Self {
            ancestors: true,
            descendants: true,
            depth: 1,
        }
    }

    pub fn ancestors_only() -> Self {
        Self {
            ancestors: true,
            descendants: false,
            depth: 0,
        }
    }

    pub fn descendants_only() -> Self {
        Self {
            ancestors: false,
            descendants: true,
            depth: 0,
        }
    }
}

impl Default for SelectOptions {
    fn default() -> Self {
        Self::relatives()
    }
}

#[derive(Clone, Copy)]
enum Direction {
    Parents,
    Children,
}

/// Selection and hover bookkeeping for one view.
///
/// Pure read-side over the graph model: all mutable state lives in side maps
/// keyed by cell id, so the DAG itself stays free of UI-only concerns.
#[derive(Debug, Default)]
pub struct Highlighter {
    selected: Option<CellId>,
    hovered: Option<CellId>,
    cells: HashMap<CellId, HighlightState>,
    selected_edges: HashSet<(CellId, CellId)>,
    hovered_edges: HashSet<(CellId, CellId)>,
}

impl Highlighter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Selects a cell and highlights its reachable set per `opts`, clearing
    /// any previous selection first. Selecting the already-selected cell
    /// deselects it. Returns false for ids the model does not contain.
    pub fn select(&mut self, model: &GraphModel, id: &str, opts: SelectOptions) -> bool {
        if !model.contains_id(id) {
            return false;
        }
        if self.selected.as_deref() == Some(id) {
            self.reset_selection();
            return true;
        }

        self.reset_selection();
        self.selected = Some(id.to_string());
        self.cells.insert(id.to_string(), HighlightState::Selected);

        if opts.ancestors {
            self.mark_reachable(model, id, opts.depth, Direction::Parents);
        }
        if opts.descendants {
            self.mark_reachable(model, id, opts.depth, Direction::Children);
        }
        true
    }

    /// Hover enter/leave for a cell. The current selection always wins over
    /// hover, so hovering the selected cell is a no-op.
    pub fn hover(&mut self, model: &GraphModel, id: &str, enter: bool) {
        if !model.contains_id(id) || self.selected.as_deref() == Some(id) {
            return;
        }
        if enter {
            self.hovered = Some(id.to_string());
            self.cells
                .entry(id.to_string())
                .or_insert(HighlightState::Hovered);
            for parent in model.parents_of(id) {
                self.hovered_edges.insert((id.to_string(), parent.clone()));
            }
            for child in model.children_of(id) {
                self.hovered_edges.insert((child.clone(), id.to_string()));
            }
        } else {
            if self.hovered.as_deref() == Some(id) {
                self.hovered = None;
            }
            if self.cells.get(id) == Some(&HighlightState::Hovered) {
                self.cells.remove(id);
            }
            self.hovered_edges
                .retain(|(child, parent)| child != id && parent != id);
        }
    }

    /// Clears all highlight state back to baseline.
    pub fn reset_selection(&mut self) {
        self.selected = None;
        self.hovered = None;
        self.cells.clear();
        self.selected_edges.clear();
        self.hovered_edges.clear();
    }

    pub fn is_selected(&self, id: &str) -> bool {
        self.selected.as_deref() == Some(id)
    }

    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Presentation state for a cell; baseline when untouched.
    pub fn state(&self, id: &str) -> HighlightState {
        self.cells.get(id).copied().unwrap_or_default()
    }

    /// True when either the selection or a hover has flagged the edge.
    pub fn edge_highlighted(&self, child: &str, parent: &str) -> bool {
        let key = (child.to_string(), parent.to_string());
        self.selected_edges.contains(&key) || self.hovered_edges.contains(&key)
    }

    /// Cells currently away from baseline.
    pub fn highlighted(&self) -> impl Iterator<Item = (&str, HighlightState)> {
        self.cells.iter().map(|(id, state)| (id.as_str(), *state))
    }

    /// Breadth-first walk over one edge direction, marking reached cells as
    /// relatives and traversed edges as highlighted, bounded by generation.
    fn mark_reachable(&mut self, model: &GraphModel, from: &str, depth: i32, dir: Direction) {
        let unbounded = depth <= 0;
        let mut queue: VecDeque<(CellId, i32)> = VecDeque::new();
        let mut seen: HashSet<CellId> = HashSet::new();
        queue.push_back((from.to_string(), 0));
        seen.insert(from.to_string());

        while let Some((cur, generation)) = queue.pop_front() {
            if !unbounded && generation >= depth {
                continue;
            }
            let next: &[CellId] = match dir {
                Direction::Parents => model.parents_of(&cur),
                Direction::Children => model.children_of(&cur),
            };
            for neighbor in next {
                let edge = match dir {
                    Direction::Parents => (cur.clone(), neighbor.clone()),
                    Direction::Children => (neighbor.clone(), cur.clone()),
                };
                self.selected_edges.insert(edge);
                if seen.insert(neighbor.clone()) {
                    self.cells
                        .entry(neighbor.clone())
                        .or_insert(HighlightState::Relative);
                    queue.push_back((neighbor.clone(), generation + 1));
                }
            }
        }
    }
}
