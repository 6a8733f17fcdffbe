//! A common face for the three operator storage formats.

use crate::algebra::{Conjugate, Scalar};
use crate::diagonal::DiagonalSparseMatrix;
use crate::error::AlgebraResult;
use crate::matrix::Matrix;
use crate::space::{LivesInSpace, VectorSpace};
use crate::sparse::SparseMatrix;
use crate::vector::Vector;
use serde::{Deserialize, Serialize};

/// A linear operator on the vectors of one space.
pub trait Operator<T: Scalar>: LivesInSpace + Sized {
    fn apply(&self, vector: &Vector<T>) -> AlgebraResult<Vector<T>>;

    /// Operator product `self · rhs`.
    fn multiply(&self, rhs: &Self) -> AlgebraResult<Self>;

    fn subtract(&self, rhs: &Self) -> AlgebraResult<Self>;

    /// `[A, B] = AB - BA`.
    fn commutator(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.multiply(rhs)?.subtract(&rhs.multiply(self)?)
    }

    /// `⟨ψ|A|ψ⟩`.
    fn expectation_value(&self, state: &Vector<T>) -> AlgebraResult<T>
    where
        T: Conjugate,
    {
        self.apply(state)?.inner_product(state)
    }
}

macro_rules! storage_operator {
    ($($ty:ident),*) => {
        $(
            impl<T: Scalar> Operator<T> for $ty<T> {
                fn apply(&self, vector: &Vector<T>) -> AlgebraResult<Vector<T>> {
                    self.try_mul_vector(vector)
                }

                fn multiply(&self, rhs: &Self) -> AlgebraResult<Self> {
                    self.try_mul(rhs)
                }

                fn subtract(&self, rhs: &Self) -> AlgebraResult<Self> {
                    self.try_sub(rhs)
                }
            }
        )*
    };
}

storage_operator!(Matrix, SparseMatrix, DiagonalSparseMatrix);

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum RepresentationKind {
    #[default]
    Dense,
    Sparse,
    DiagonalSparse,
}

/// An operator held in exactly one storage format, chosen once.
#[derive(Debug, Clone, PartialEq)]
pub enum OperatorRepresentation<T> {
    Dense(Matrix<T>),
    Sparse(SparseMatrix<T>),
    DiagonalSparse(DiagonalSparseMatrix<T>),
}

impl<T: Scalar> OperatorRepresentation<T> {
    pub fn from_dense(matrix: &Matrix<T>, kind: RepresentationKind) -> Self {
        match kind {
            RepresentationKind::Dense => Self::Dense(matrix.clone()),
            RepresentationKind::Sparse => Self::Sparse(SparseMatrix::from_dense(matrix)),
            RepresentationKind::DiagonalSparse => {
                Self::DiagonalSparse(DiagonalSparseMatrix::from_dense(matrix))
            }
        }
    }

    pub fn kind(&self) -> RepresentationKind {
        match self {
            Self::Dense(_) => RepresentationKind::Dense,
            Self::Sparse(_) => RepresentationKind::Sparse,
            Self::DiagonalSparse(_) => RepresentationKind::DiagonalSparse,
        }
    }

    pub fn to_dense(&self) -> Matrix<T> {
        match self {
            Self::Dense(matrix) => matrix.clone(),
            Self::Sparse(matrix) => matrix.to_dense(),
            Self::DiagonalSparse(matrix) => matrix.to_dense(),
        }
    }

    /// The same operator in another storage format.
    pub fn converted(&self, kind: RepresentationKind) -> Self {
        if kind == self.kind() {
            self.clone()
        } else {
            Self::from_dense(&self.to_dense(), kind)
        }
    }

    pub fn scale(&self, factor: T) -> Self {
        match self {
            Self::Dense(matrix) => Self::Dense(matrix.scale(factor)),
            Self::Sparse(matrix) => Self::Sparse(matrix.scale(factor)),
            Self::DiagonalSparse(matrix) => Self::DiagonalSparse(matrix.scale(factor)),
        }
    }

    /// Combines two representations in `self`'s format.
    fn combine(
        &self,
        rhs: &Self,
        dense: impl Fn(&Matrix<T>, &Matrix<T>) -> AlgebraResult<Matrix<T>>,
        sparse: impl Fn(&SparseMatrix<T>, &SparseMatrix<T>) -> AlgebraResult<SparseMatrix<T>>,
        diagonal: impl Fn(
            &DiagonalSparseMatrix<T>,
            &DiagonalSparseMatrix<T>,
        ) -> AlgebraResult<DiagonalSparseMatrix<T>>,
    ) -> AlgebraResult<Self> {
        let rhs = rhs.converted(self.kind());
        Ok(match (self, &rhs) {
            (Self::Dense(a), Self::Dense(b)) => Self::Dense(dense(a, b)?),
            (Self::Sparse(a), Self::Sparse(b)) => Self::Sparse(sparse(a, b)?),
            (Self::DiagonalSparse(a), Self::DiagonalSparse(b)) => {
                Self::DiagonalSparse(diagonal(a, b)?)
            }
            _ => unreachable!("operands were converted to the same format"),
        })
    }
}

impl<T> LivesInSpace for OperatorRepresentation<T> {
    fn space(&self) -> &VectorSpace {
        match self {
            Self::Dense(matrix) => matrix.space(),
            Self::Sparse(matrix) => matrix.space(),
            Self::DiagonalSparse(matrix) => matrix.space(),
        }
    }
}

impl<T: Scalar> Operator<T> for OperatorRepresentation<T> {
    fn apply(&self, vector: &Vector<T>) -> AlgebraResult<Vector<T>> {
        match self {
            Self::Dense(matrix) => matrix.try_mul_vector(vector),
            Self::Sparse(matrix) => matrix.try_mul_vector(vector),
            Self::DiagonalSparse(matrix) => matrix.try_mul_vector(vector),
        }
    }

    fn multiply(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.combine(rhs, Matrix::try_mul, SparseMatrix::try_mul, DiagonalSparseMatrix::try_mul)
    }

    fn subtract(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.combine(rhs, Matrix::try_sub, SparseMatrix::try_sub, DiagonalSparseMatrix::try_sub)
    }
}

impl<T: Scalar> From<Matrix<T>> for OperatorRepresentation<T> {
    fn from(matrix: Matrix<T>) -> Self {
        Self::Dense(matrix)
    }
}

impl<T: Scalar> From<SparseMatrix<T>> for OperatorRepresentation<T> {
    fn from(matrix: SparseMatrix<T>) -> Self {
        Self::Sparse(matrix)
    }
}

impl<T: Scalar> From<DiagonalSparseMatrix<T>> for OperatorRepresentation<T> {
    fn from(matrix: DiagonalSparseMatrix<T>) -> Self {
        Self::DiagonalSparse(matrix)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AlgebraError;
    use num_complex::Complex;

    type C = Complex<f64>;

    struct Pauli {
        space: VectorSpace,
        x: Matrix<C>,
        y: Matrix<C>,
        z: Matrix<C>,
    }

    fn pauli() -> Pauli {
        let space = VectorSpace::new(2, "qubit").expect("space");
        let (o, l, i) = (C::new(0.0, 0.0), C::new(1.0, 0.0), C::new(0.0, 1.0));
        Pauli {
            x: Matrix::from_elements(vec![o, l, l, o], &space).expect("sigma x"),
            y: Matrix::from_elements(vec![o, -i, i, o], &space).expect("sigma y"),
            z: Matrix::from_elements(vec![l, o, o, -l], &space).expect("sigma z"),
            space,
        }
    }

    #[test]
    fn pauli_commutators_hold_in_every_format() {
        let p = pauli();
        let two_i = C::new(0.0, 2.0);
        for kind in [
            RepresentationKind::Dense,
            RepresentationKind::Sparse,
            RepresentationKind::DiagonalSparse,
        ] {
            let x = OperatorRepresentation::from_dense(&p.x, kind);
            let y = OperatorRepresentation::from_dense(&p.y, kind);
            let z = OperatorRepresentation::from_dense(&p.z, kind);

            let xy = x.commutator(&y).expect("same space");
            assert_eq!(xy.kind(), kind);
            assert!(xy.to_dense().approx_eq_default(&(&p.z * two_i)));
            let yz = y.commutator(&z).expect("same space").to_dense();
            assert!(yz.approx_eq_default(&(&p.x * two_i)));
            let zx = z.commutator(&x).expect("same space").to_dense();
            assert!(zx.approx_eq_default(&(&p.y * two_i)));
            let xx = x.commutator(&x).expect("same space").to_dense();
            assert!(xx.approx_eq_default(&Matrix::zeros(&p.space)));
        }
    }

    #[test]
    fn mixed_formats_combine_in_the_left_format() {
        let p = pauli();
        let dense = OperatorRepresentation::from(p.x.clone());
        let sparse = OperatorRepresentation::from_dense(&p.y, RepresentationKind::Sparse);
        let product = dense.multiply(&sparse).expect("same space");
        assert_eq!(product.kind(), RepresentationKind::Dense);
        assert_eq!(product.to_dense(), &p.x * &p.y);
    }

    #[test]
    fn expectation_values_of_sigma_z() {
        let p = pauli();
        let (o, l) = (C::new(0.0, 0.0), C::new(1.0, 0.0));
        let up = Vector::from_elements(vec![l, o], &p.space).expect("up");
        let down = Vector::from_elements(vec![o, l], &p.space).expect("down");
        let sparse_z = SparseMatrix::from_dense(&p.z);
        assert_eq!(p.z.expectation_value(&up).expect("same space"), l);
        assert_eq!(sparse_z.expectation_value(&down).expect("same space"), -l);
        assert_eq!(
            DiagonalSparseMatrix::from_dense(&p.x)
                .expectation_value(&up)
                .expect("same space"),
            o
        );
    }

    #[test]
    fn foreign_vectors_are_rejected() {
        let p = pauli();
        let elsewhere = VectorSpace::new(2, "elsewhere").expect("space");
        let v = Vector::<C>::zeros(&elsewhere);
        let op = OperatorRepresentation::from_dense(&p.x, RepresentationKind::DiagonalSparse);
        assert!(matches!(op.apply(&v), Err(AlgebraError::SpaceMismatch { .. })));
    }
}
