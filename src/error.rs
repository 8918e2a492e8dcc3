//! Error types for warp editing and solving

use thiserror::Error;

/// Errors reported by the warp model and solver.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum WarpError {
    #[error("control point index {index} out of range (expected 0..4)")]
    InvalidPoint { index: usize },
    #[error("unknown edit command '{0}'")]
    UnknownCommand(String),
    #[error("degenerate corner quad: perspective transform is not invertible")]
    Degenerate,
    #[error("no warp named '{0}' in configuration")]
    UnknownWarp(String),
}
