//! Tensor (Kronecker) products of operators and vectors.

use crate::algebra::Scalar;
use crate::diagonal::DiagonalSparseMatrix;
use crate::error::{AlgebraError, AlgebraResult};
use crate::matrix::Matrix;
use crate::space::{LivesInSpace, VectorSpace};
use crate::sparse::{CoordinateEntry, SparseMatrix};
use crate::vector::Vector;

/// Kronecker product of two row-major matrices:
/// `C[p*r + v, q*s + w] = A[r, s] * B[v, w]` with `p = rows_b`, `q = cols_b`.
pub fn kronecker_product<T: Scalar>(
    a: &[T],
    rows_a: usize,
    cols_a: usize,
    b: &[T],
    rows_b: usize,
    cols_b: usize,
) -> AlgebraResult<Vec<T>> {
    if a.len() != rows_a * cols_a {
        return Err(AlgebraError::ElementCount {
            expected: rows_a * cols_a,
            actual: a.len(),
        });
    }
    if b.len() != rows_b * cols_b {
        return Err(AlgebraError::ElementCount {
            expected: rows_b * cols_b,
            actual: b.len(),
        });
    }

    let cols_c = cols_a * cols_b;
    let mut c = vec![T::zero(); rows_a * rows_b * cols_c];
    for r in 0..rows_a {
        for s in 0..cols_a {
            let a_rs = a[r * cols_a + s];
            for v in 0..rows_b {
                for w in 0..cols_b {
                    c[(rows_b * r + v) * cols_c + cols_b * s + w] = a_rs * b[v * cols_b + w];
                }
            }
        }
    }
    Ok(c)
}

/// Values that can be composed into a tensor product space.
pub trait TensorFactor: LivesInSpace + Sized {
    /// Composes `left ⊗ right` into `product`. Operands arrive in the
    /// product's canonical factor order.
    fn compose(left: &Self, right: &Self, product: &VectorSpace) -> AlgebraResult<Self>;
}

impl<T: Scalar> TensorFactor for Matrix<T> {
    fn compose(left: &Self, right: &Self, product: &VectorSpace) -> AlgebraResult<Self> {
        let (n1, n2) = (left.dimension(), right.dimension());
        let elements = kronecker_product(left.elements(), n1, n1, right.elements(), n2, n2)?;
        Matrix::from_elements(elements, product)
    }
}

impl<T: Scalar> TensorFactor for Vector<T> {
    fn compose(left: &Self, right: &Self, product: &VectorSpace) -> AlgebraResult<Self> {
        let elements = kronecker_product(
            left.elements(),
            left.dimension(),
            1,
            right.elements(),
            right.dimension(),
            1,
        )?;
        Vector::from_elements(elements, product)
    }
}

impl<T: Scalar> TensorFactor for SparseMatrix<T> {
    fn compose(left: &Self, right: &Self, product: &VectorSpace) -> AlgebraResult<Self> {
        let n2 = right.dimension();
        let mut entries = Vec::with_capacity(left.nnz() * right.nnz());
        for a in left.entries() {
            for b in right.entries() {
                let (row, col) = (a.row * n2 + b.row, a.col * n2 + b.col);
                entries.push(CoordinateEntry::new(a.value * b.value, row, col));
            }
        }
        entries.sort_by_key(CoordinateEntry::position);
        Ok(SparseMatrix::from_sorted_unchecked(product.clone(), entries))
    }
}

impl<T: Scalar> TensorFactor for DiagonalSparseMatrix<T> {
    fn compose(left: &Self, right: &Self, product: &VectorSpace) -> AlgebraResult<Self> {
        let diagonals = left
            .diagonals()
            .flat_map(|a| right.diagonals().map(move |b| a.tensor_product(b)));
        DiagonalSparseMatrix::from_diagonals(product, diagonals)
    }
}

impl VectorSpace {
    /// Tensor product of two operands living in this space's two factors.
    ///
    /// Operands may be given in either order; they are matched to the
    /// factors by space identity.
    pub fn tensor_product<A: TensorFactor>(&self, a: &A, b: &A) -> AlgebraResult<A> {
        let not_a_factor = |operand: &A| AlgebraError::NotAFactor {
            operand: operand.space().to_string(),
            product: self.to_string(),
        };
        if !self.is_composite() {
            return Err(not_a_factor(a));
        }
        let factors = self.factors();
        if factors.len() != 2 {
            return Err(AlgebraError::OperandCount {
                factors: factors.len(),
                operands: 2,
            });
        }

        let (left, right) = if a.space().id() <= b.space().id() { (a, b) } else { (b, a) };
        if left.space() != &factors[0] {
            return Err(not_a_factor(left));
        }
        if right.space() != &factors[1] {
            return Err(not_a_factor(right));
        }
        A::compose(left, right, self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::SpaceRegistry;
    use num_complex::Complex;

    type C = Complex<f64>;

    fn assert_err_contains<T: std::fmt::Debug>(result: AlgebraResult<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    struct Spaces {
        first: VectorSpace,
        second: VectorSpace,
        product: VectorSpace,
    }

    fn spaces() -> Spaces {
        let registry = SpaceRegistry::new();
        let first = registry.make_space(2, "first").expect("space");
        let second = registry.make_space(2, "second").expect("space");
        let product = registry
            .make_tensor_product_space(&[&first, &second], "product")
            .expect("product");
        Spaces { first, second, product }
    }

    #[test]
    fn kronecker_layout() {
        let c = kronecker_product(&[1, 2, 3, 4], 2, 2, &[0, 5, 6, 7], 2, 2).expect("valid shapes");
        assert_eq!(c, vec![0, 5, 0, 10, 6, 7, 12, 14, 0, 15, 0, 20, 18, 21, 24, 28]);
        assert_err_contains(kronecker_product(&[1, 2, 3], 2, 2, &[1], 1, 1), "expected 4, got 3");
    }

    #[test]
    fn matrix_product_is_ordered_by_space_identity() {
        let s = spaces();
        let a = Matrix::from_elements(vec![1.0, 2.0, 3.0, 4.0], &s.first).expect("a");
        let b = Matrix::from_elements(vec![0.0, 5.0, 6.0, 7.0], &s.second).expect("b");
        let expected = vec![
            0.0, 5.0, 0.0, 10.0, 6.0, 7.0, 12.0, 14.0, 0.0, 15.0, 0.0, 20.0, 18.0, 21.0, 24.0, 28.0,
        ];

        let forward = s.product.tensor_product(&a, &b).expect("product");
        let reversed = s.product.tensor_product(&b, &a).expect("product");
        assert_eq!(forward.elements(), expected.as_slice());
        assert_eq!(forward, reversed);
        assert_eq!(forward.space(), &s.product);
    }

    #[test]
    fn vector_product_is_column_kronecker() {
        let s = spaces();
        let up = Vector::from_elements(vec![C::new(1.0, 0.0), C::new(0.0, 0.0)], &s.first)
            .expect("up");
        let plus = Vector::from_elements(vec![C::new(1.0, 0.0), C::new(0.0, 1.0)], &s.second)
            .expect("plus");
        let joint = s.product.tensor_product(&up, &plus).expect("product");
        assert_eq!(
            joint.elements(),
            &[C::new(1.0, 0.0), C::new(0.0, 1.0), C::new(0.0, 0.0), C::new(0.0, 0.0)]
        );
    }

    #[test]
    fn sparse_representations_agree_with_dense() {
        let s = spaces();
        let a = Matrix::from_elements(vec![0.0, 1.0, -2.0, 0.0], &s.first).expect("a");
        let b = Matrix::from_elements(vec![3.0, 0.0, 4.0, 5.0], &s.second).expect("b");
        let dense = s.product.tensor_product(&a, &b).expect("dense");

        let sparse = s
            .product
            .tensor_product(&SparseMatrix::from_dense(&b), &SparseMatrix::from_dense(&a))
            .expect("sparse");
        assert_eq!(sparse.to_dense(), dense);

        let diagonal = s
            .product
            .tensor_product(
                &DiagonalSparseMatrix::from_dense(&a),
                &DiagonalSparseMatrix::from_dense(&b),
            )
            .expect("diagonal");
        assert_eq!(diagonal.to_dense(), dense);
    }

    #[test]
    fn operands_outside_the_factors_are_rejected() {
        let s = spaces();
        let stranger = VectorSpace::new(2, "stranger").expect("space");
        let a = Matrix::<f64>::identity(&s.first);
        let b = Matrix::<f64>::identity(&s.second);
        let c = Matrix::<f64>::identity(&stranger);

        assert_err_contains(s.product.tensor_product(&a, &c), "is not a factor");
        assert_err_contains(s.product.tensor_product(&a, &a), "is not a factor");
        assert_err_contains(s.first.tensor_product(&a, &b), "is not a factor");

        let registry = SpaceRegistry::new();
        let x = registry.make_space(2, "x").expect("space");
        let y = registry.make_space(2, "y").expect("space");
        let z = registry.make_space(2, "z").expect("space");
        let triple = registry
            .make_tensor_product_space(&[&x, &y, &z], "triple")
            .expect("triple");
        let pair =
            triple.tensor_product(&Matrix::<f64>::identity(&x), &Matrix::<f64>::identity(&y));
        assert_eq!(
            pair.as_ref().map(|_| ()),
            Err(&AlgebraError::OperandCount {
                factors: 3,
                operands: 2
            })
        );
        assert_err_contains(pair, "has 3 factors, but 2 operands were given");
    }
}
