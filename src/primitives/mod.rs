//! Core numeric primitives (Vector, Matrix).
//!
//! Feature data and kernel matrices flow through these types. Kernel
//! computations use `f64` throughout; fidelity estimates live in [0, 1]
//! and the dual solver is sensitive to rounding there.

mod matrix;
mod vector;

pub use matrix::Matrix;
pub use vector::Vector;
