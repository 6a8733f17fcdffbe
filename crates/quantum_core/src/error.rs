use crate::space::SpaceId;
use thiserror::Error;

/// Contract violations raised by space, vector and operator construction or arithmetic.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AlgebraError {
    #[error("Incompatible spaces: {lhs} and {rhs}")]
    SpaceMismatch { lhs: String, rhs: String },

    #[error("Element count mismatch: expected {expected}, got {actual}")]
    ElementCount { expected: usize, actual: usize },

    #[error("Index out of range: ({row}, {col}) in a space of dimension {dimension}")]
    IndexOutOfRange {
        row: usize,
        col: usize,
        dimension: usize,
    },

    #[error("A vector space must have positive dimension")]
    ZeroDimension,

    #[error("Tensor product requires at least {required} spaces, got {actual}")]
    TensorArity { required: usize, actual: usize },

    #[error("Tensor product space has {factors} factors, but {operands} operands were given")]
    OperandCount { factors: usize, operands: usize },

    #[error("The same space ({0}) is included more than once in a tensor product")]
    DuplicateFactor(SpaceId),

    #[error("Operand in space {operand} is not a factor of tensor product space {product}")]
    NotAFactor { operand: String, product: String },

    #[error("Duplicate sparse entry at ({row}, {col})")]
    DuplicateEntry { row: usize, col: usize },

    #[error("Diagonal index {index} is outside (-{dimension}, {dimension})")]
    InvalidDiagonal { index: isize, dimension: usize },

    #[error("Cannot normalize a vector with zero norm")]
    DegenerateNorm,
}

pub type AlgebraResult<T> = Result<T, AlgebraError>;

/// Unwraps the result of a checked operation inside an operator impl.
///
/// Operators cannot return `Result`, so a contract violation there is fatal.
#[track_caller]
pub(crate) fn fail_fast<T>(result: AlgebraResult<T>) -> T {
    match result {
        Ok(value) => value,
        Err(err) => panic!("{err}"),
    }
}
