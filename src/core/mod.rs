pub mod cell;
pub mod edge;
pub mod model;

pub use cell::{Cell, CellId, CellShape, Position};
pub use edge::{Edge, EdgeKind};
pub use model::{GraphModel, GraphStats};
