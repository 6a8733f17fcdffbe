//! The `quantum_core` crate provides generic linear algebra over identified vector
//! spaces together with the ODE machinery used to evolve states in them.
//! Everything is generic over the scalar field, so the same code serves `f64`,
//! `Complex<f64>` and any other type that meets the capability traits.
//!
//! Key components:
//! - **Algebra**: capability traits (`Scalar`, `HasAbs`, `Conjugate`, `ComplexNumber`).
//! - **Spaces**: `VectorSpace` identities and tensor product spaces.
//! - **Operators**: dense `Matrix`, coordinate `SparseMatrix`, `DiagonalSparseMatrix`,
//!   tensor products and the `Operator` trait over all three.
//! - **Solvers**: Euler, RK4 and Cash-Karp steps plus the adaptive `integrate` driver.
//! - **Evolution**: `SchrodingerSystem` for time-independent Hamiltonians.

#[macro_use]
mod macros;

pub mod algebra;
pub mod diagonal;
pub mod error;
pub mod evolution;
pub mod integrate;
pub mod interop;
pub mod matrix;
pub mod operator;
pub mod solvers;
pub mod space;
pub mod sparse;
pub mod tensor;
pub mod traits;
pub mod vector;

pub use algebra::{ComplexNumber, Conjugate, HasAbs, Scalar};
pub use diagonal::{DiagonalSparseMatrix, MatrixDiagonal};
pub use error::{AlgebraError, AlgebraResult};
pub use evolution::{EvolutionSettings, SchrodingerSystem};
pub use integrate::{
    integrate, integrate_with, IntegrationOutcome, IntegrationReport, IntegratorSettings,
};
pub use matrix::Matrix;
pub use operator::{Operator, OperatorRepresentation, RepresentationKind};
pub use space::{LivesInSpace, SpaceId, SpaceRegistry, VectorSpace};
pub use sparse::{CoordinateEntry, SparseMatrix};
pub use tensor::{kronecker_product, TensorFactor};
pub use vector::Vector;
