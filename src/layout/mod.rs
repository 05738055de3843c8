pub mod algorithm;
pub mod coordinator;

pub use algorithm::compute_layout;
pub use coordinator::{LayoutCoordinator, LayoutState};

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use smallvec::SmallVec;

use crate::core::{CellId, Position};

/// Immutable topology snapshot the layout algorithm works from. Taken from
/// the graph model at the moment a computation starts; the interaction thread
/// is free to keep mutating the model afterwards.
#[derive(Debug, Clone, Default)]
pub struct LayoutSnapshot {
    pub cells: Vec<SnapshotCell>,
}

impl LayoutSnapshot {
    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }
}

/// The topology facts layout needs about one cell.
#[derive(Debug, Clone)]
pub struct SnapshotCell {
    pub id: CellId,
    pub timestamp: i64,
    pub parents: SmallVec<[CellId; 2]>,
}

/// A complete layout computation result. Published into the graph model as a
/// whole, never piecemeal.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Layout {
    pub positions: HashMap<CellId, Position>,
    /// Lane of the vertical run of each (child, parent) edge.
    pub edge_lanes: HashMap<(CellId, CellId), usize>,
    pub lane_count: usize,
}

/// Cooperative cancellation flag shared between a layout task and its
/// coordinator.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}
