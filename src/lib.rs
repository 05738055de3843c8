//! Commit-history DAG engine: an arena graph model of commit cells, an
//! incremental builder that keeps it in sync with a repository, a
//! deterministic row/lane layout algorithm with a cancellable background
//! coordinator, and a selection/highlight engine for exploring ancestry.

pub mod build;
pub mod core;
pub mod error;
pub mod highlight;
pub mod layout;
pub mod session;
pub mod source;

pub use build::{BranchHead, Commit, CommitSource, DagBuilder};
pub use crate::core::{Cell, CellId, CellShape, Edge, EdgeKind, GraphModel, GraphStats, Position};
pub use error::GraphError;
pub use highlight::{HighlightState, Highlighter, SelectOptions};
pub use layout::{
    compute_layout, CancelFlag, Layout, LayoutCoordinator, LayoutSnapshot, LayoutState,
    SnapshotCell,
};
pub use session::{GraphView, ViewRegistry};
pub use source::{GitSource, SourceScope};
