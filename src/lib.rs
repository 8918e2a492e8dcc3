//! Keystone warp - perspective correction for projector edge blending
//!
//! A warp stretches a rectangular texture onto a quadrilateral given by four
//! draggable corner points. [`WarpPerspective`] holds the corner points and
//! lazily recomputes the 4x4 perspective matrix and its inverse;
//! [`transform::compute_transform`] is the underlying four-point solver.

pub mod config;
pub mod editing;
pub mod error;
pub mod geometry;
pub mod render;
pub mod transform;
pub mod warp;

pub use editing::EditCommand;
pub use error::WarpError;
pub use geometry::{Point, Quad};
pub use transform::{compute_transform, try_compute_transform, Keystone};
pub use warp::WarpPerspective;
