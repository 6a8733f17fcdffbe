//! Conversions to and from `nalgebra` and `nalgebra-sparse` storage.

use crate::algebra::Scalar;
use crate::error::{AlgebraError, AlgebraResult};
use crate::matrix::Matrix;
use crate::space::VectorSpace;
use crate::sparse::{CoordinateEntry, SparseMatrix};
use crate::vector::Vector;
use nalgebra::{DMatrix, DVector};
use nalgebra_sparse::CooMatrix;
use std::collections::BTreeMap;

fn check_shape(space: &VectorSpace, rows: usize, cols: usize) -> AlgebraResult<()> {
    let dim = space.dimension();
    if rows != dim || cols != dim {
        return Err(AlgebraError::ElementCount {
            expected: dim * dim,
            actual: rows * cols,
        });
    }
    Ok(())
}

pub fn to_dmatrix<T: Scalar>(matrix: &Matrix<T>) -> DMatrix<T> {
    let dim = matrix.dimension();
    DMatrix::from_row_slice(dim, dim, matrix.elements())
}

/// Copies a square `nalgebra` matrix into `space`.
pub fn from_dmatrix<T: Scalar>(
    matrix: &DMatrix<T>,
    space: &VectorSpace,
) -> AlgebraResult<Matrix<T>> {
    check_shape(space, matrix.nrows(), matrix.ncols())?;
    Ok(Matrix::from_fn(space, |row, col| matrix[(row, col)]))
}

pub fn to_dvector<T: Scalar>(vector: &Vector<T>) -> DVector<T> {
    DVector::from_column_slice(vector.elements())
}

pub fn from_dvector<T: Scalar>(
    vector: &DVector<T>,
    space: &VectorSpace,
) -> AlgebraResult<Vector<T>> {
    Vector::from_elements(vector.iter().copied().collect(), space)
}

pub fn to_coo<T: Scalar>(matrix: &SparseMatrix<T>) -> CooMatrix<T> {
    let dim = matrix.dimension();
    let mut coo = CooMatrix::new(dim, dim);
    for entry in matrix.entries() {
        coo.push(entry.row, entry.col, entry.value);
    }
    coo
}

/// Reads a COO matrix into `space`. Duplicate triplets are summed and
/// entries that end up zero are dropped.
pub fn from_coo<T: Scalar>(
    coo: &CooMatrix<T>,
    space: &VectorSpace,
) -> AlgebraResult<SparseMatrix<T>> {
    check_shape(space, coo.nrows(), coo.ncols())?;
    let mut summed: BTreeMap<(usize, usize), T> = BTreeMap::new();
    for (row, col, &value) in coo.triplet_iter() {
        let slot = summed.entry((row, col)).or_insert_with(T::zero);
        *slot = *slot + value;
    }
    let entries = summed
        .into_iter()
        .filter(|(_, value)| *value != T::zero())
        .map(|((row, col), value)| CoordinateEntry::new(value, row, col))
        .collect();
    Ok(SparseMatrix::from_sorted_unchecked(space.clone(), entries))
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    fn space(dimension: usize) -> VectorSpace {
        VectorSpace::new(dimension, "interop").expect("space")
    }

    #[test]
    fn products_match_nalgebra() {
        let mut rng = StdRng::seed_from_u64(42);
        let s = space(5);
        let a = Matrix::from_fn(&s, |_, _| rng.gen_range(-1.0..1.0));
        let b = Matrix::from_fn(&s, |_, _| rng.gen_range(-1.0..1.0));
        let v = Vector::from_elements((0..5).map(|_| rng.gen_range(-1.0..1.0)).collect(), &s)
            .expect("vector");

        let expected = from_dmatrix(&(to_dmatrix(&a) * to_dmatrix(&b)), &s).expect("square");
        assert!((&a * &b).approx_eq(&expected, 1e-12));
        assert!(a.multiply_divide_and_conquer(&b).expect("same space").approx_eq(&expected, 1e-12));

        let expected = from_dvector(&(to_dmatrix(&a) * to_dvector(&v)), &s).expect("vector");
        assert!((&a * &v).approx_eq(&expected, 1e-12));
    }

    #[test]
    fn adjoint_matches_nalgebra() {
        let s = space(3);
        let m = Matrix::from_fn(&s, |r, c| Complex::new(r as f64 - c as f64, (r * 3 + c) as f64));
        let expected = from_dmatrix(&to_dmatrix(&m).adjoint(), &s).expect("square");
        assert_eq!(m.hermitian_adjoint(), expected);
    }

    #[test]
    fn coo_duplicates_are_summed() {
        let s = space(3);
        let mut coo = CooMatrix::new(3, 3);
        coo.push(2, 1, 1.5);
        coo.push(0, 0, 2.0);
        coo.push(2, 1, 2.5);
        coo.push(1, 1, 3.0);
        coo.push(1, 1, -3.0);

        let sparse = from_coo(&coo, &s).expect("square");
        assert_eq!(
            sparse.entries(),
            &[CoordinateEntry::new(2.0, 0, 0), CoordinateEntry::new(4.0, 2, 1)]
        );
        let back = from_coo(&to_coo(&sparse), &s).expect("square");
        assert_eq!(back, sparse);
    }

    #[test]
    fn shapes_must_match_the_space() {
        let s = space(2);
        assert!(matches!(
            from_dmatrix(&DMatrix::<f64>::zeros(2, 3), &s),
            Err(AlgebraError::ElementCount { expected: 4, actual: 6 })
        ));
        assert!(from_dvector(&DVector::<f64>::zeros(3), &s).is_err());
        assert!(from_coo(&CooMatrix::<f64>::new(3, 3), &s).is_err());
    }
}
