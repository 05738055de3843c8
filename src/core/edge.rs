use super::cell::CellId;

/// An edge connecting a commit to one of its parents.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Edge {
    /// Source commit id (child).
    pub child: CellId,
    /// Target commit id (parent).
    pub parent: CellId,
    pub kind: EdgeKind,
    /// Lane the edge's vertical run occupies; assigned by layout.
    pub lane: Option<usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EdgeKind {
    /// Regular parent-child relationship.
    Regular,
    /// Edge from a merge commit to one of its parents.
    Merge,
}

impl Edge {
    pub fn new(child: CellId, parent: CellId) -> Self {
        Self {
            child,
            parent,
            kind: EdgeKind::Regular,
            lane: None,
        }
    }

    pub fn merge(child: CellId, parent: CellId) -> Self {
        Self {
            child,
            parent,
            kind: EdgeKind::Merge,
            lane: None,
        }
    }
}
