use smallvec::SmallVec;

/// Commit id (content hash) used as the unique cell key.
pub type CellId = String;

/// Presentation shape of a cell. Reset and reassigned whenever branch-head
/// bookkeeping runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CellShape {
    #[default]
    Default,
    /// Head of a branch that exists on only one side (local or remote).
    UntrackedBranchHead,
    /// Head of a branch mirrored between local and remote.
    TrackedBranchHead,
}

/// Layout-assigned grid position. Row 0 is the newest commit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Position {
    pub row: usize,
    pub column: usize,
}

/// A renderable node in the commit graph.
///
/// A cell is created invisible when it is referenced as a parent before its
/// own commit data has been fetched, and upgraded in place once that data
/// arrives. Visibility never transitions back to false.
#[derive(Debug, Clone)]
pub struct Cell {
    pub id: CellId,
    pub timestamp: i64,
    pub label: String,
    pub shape: CellShape,
    pub visible: bool,
    /// Parent commit ids, in commit order.
    pub parents: SmallVec<[CellId; 2]>,
    /// None until a layout has been published for this cell.
    pub position: Option<Position>,
}

impl Cell {
    pub fn new(
        id: impl Into<CellId>,
        timestamp: i64,
        label: impl Into<String>,
        parents: &[CellId],
        visible: bool,
    ) -> Self {
        Self {
            id: id.into(),
            timestamp,
            label: label.into(),
            shape: CellShape::default(),
            visible,
            parents: parents.iter().cloned().collect(),
            position: None,
        }
    }

    /// An invisible stand-in for a commit whose own data has not arrived yet.
    pub fn placeholder(id: impl Into<CellId>) -> Self {
        Self {
            id: id.into(),
            timestamp: 0,
            label: String::new(),
            shape: CellShape::default(),
            visible: false,
            parents: SmallVec::new(),
            position: None,
        }
    }

    /// Check if this is a root commit (no parents)
    pub fn is_root(&self) -> bool {
        self.parents.is_empty()
    }

    /// Check if this is a merge commit (multiple parents)
    pub fn is_merge(&self) -> bool {
        self.parents.len() > 1
    }
}
