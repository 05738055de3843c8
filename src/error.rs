use thiserror::Error;

/// Recoverable failures surfaced by single-cell operations on the graph
/// model. None of these corrupt existing state.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum GraphError {
    /// The requested cell id is not present in the model.
    #[error("unknown cell id: {0}")]
    UnknownCell(String),
}
