//! Coordinate-format sparse operators.
//!
//! Entries are kept sorted row-major with at most one entry per position,
//! which lets addition and subtraction run as a single linear merge.

use crate::algebra::Scalar;
use crate::error::{AlgebraError, AlgebraResult};
use crate::matrix::Matrix;
use crate::space::{LivesInSpace, VectorSpace};
use crate::vector::Vector;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::ops::Range;

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CoordinateEntry<T> {
    pub value: T,
    pub row: usize,
    pub col: usize,
}

impl<T> CoordinateEntry<T> {
    pub fn new(value: T, row: usize, col: usize) -> Self {
        Self { value, row, col }
    }

    pub fn position(&self) -> (usize, usize) {
        (self.row, self.col)
    }
}

impl<T: fmt::Debug> fmt::Display for CoordinateEntry<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}): {:?}", self.row, self.col, self.value)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct SparseMatrix<T> {
    space: VectorSpace,
    entries: Vec<CoordinateEntry<T>>,
}

impl<T: Scalar> SparseMatrix<T> {
    /// Empty (all-zero) operator.
    pub fn new(space: &VectorSpace) -> Self {
        Self {
            space: space.clone(),
            entries: Vec::new(),
        }
    }

    pub fn from_dense(matrix: &Matrix<T>) -> Self {
        let dim = matrix.dimension();
        let entries = matrix
            .elements()
            .iter()
            .enumerate()
            .filter(|(_, value)| !value.is_zero())
            .map(|(offset, &value)| CoordinateEntry::new(value, offset / dim, offset % dim))
            .collect();
        Self {
            space: matrix.space().clone(),
            entries,
        }
    }

    /// Builds an operator from entries in any order. Zero-valued entries are
    /// dropped after validation.
    pub fn from_entries(
        space: &VectorSpace,
        mut entries: Vec<CoordinateEntry<T>>,
    ) -> AlgebraResult<Self> {
        let dimension = space.dimension();
        if let Some(entry) = entries.iter().find(|e| e.row >= dimension || e.col >= dimension) {
            return Err(AlgebraError::IndexOutOfRange {
                row: entry.row,
                col: entry.col,
                dimension,
            });
        }
        entries.sort_by_key(CoordinateEntry::position);
        let duplicate = entries
            .windows(2)
            .find(|pair| pair[0].position() == pair[1].position());
        if let Some(pair) = duplicate {
            return Err(AlgebraError::DuplicateEntry {
                row: pair[0].row,
                col: pair[0].col,
            });
        }
        entries.retain(|entry| !entry.value.is_zero());
        Ok(Self {
            space: space.clone(),
            entries,
        })
    }

    pub(crate) fn from_sorted_unchecked(
        space: VectorSpace,
        entries: Vec<CoordinateEntry<T>>,
    ) -> Self {
        debug_assert!(entries.windows(2).all(|p| p[0].position() < p[1].position()));
        Self { space, entries }
    }

    pub fn dimension(&self) -> usize {
        self.space.dimension()
    }

    pub fn entries(&self) -> &[CoordinateEntry<T>] {
        &self.entries
    }

    /// Number of stored entries.
    pub fn nnz(&self) -> usize {
        self.entries.len()
    }

    pub fn get(&self, row: usize, col: usize) -> AlgebraResult<T> {
        let dimension = self.dimension();
        if row >= dimension || col >= dimension {
            return Err(AlgebraError::IndexOutOfRange { row, col, dimension });
        }
        Ok(self
            .entries
            .binary_search_by_key(&(row, col), CoordinateEntry::position)
            .map_or_else(|_| T::zero(), |found| self.entries[found].value))
    }

    pub fn to_dense(&self) -> Matrix<T> {
        let dim = self.dimension();
        let mut elements = vec![T::zero(); dim * dim];
        for entry in &self.entries {
            elements[entry.row * dim + entry.col] = entry.value;
        }
        Matrix::from_parts_unchecked(self.space.clone(), elements)
    }

    pub fn transpose(&self) -> Self {
        let mut entries: Vec<_> = self
            .entries
            .iter()
            .map(|e| CoordinateEntry::new(e.value, e.col, e.row))
            .collect();
        entries.sort_by_key(CoordinateEntry::position);
        Self::from_sorted_unchecked(self.space.clone(), entries)
    }

    fn map(&self, op: impl Fn(T) -> T) -> Self {
        let entries = self
            .entries
            .iter()
            .map(|e| CoordinateEntry::new(op(e.value), e.row, e.col))
            .collect();
        Self::from_sorted_unchecked(self.space.clone(), entries)
    }

    pub fn negated(&self) -> Self {
        self.map(|x| -x)
    }

    pub fn scale(&self, factor: T) -> Self {
        self.map(|x| x * factor)
    }

    pub fn divide(&self, divisor: T) -> Self {
        self.map(|x| x / divisor)
    }

    /// Three-way merge over both sorted entry lists. A position present on
    /// one side only is combined with zero.
    fn merge(&self, rhs: &Self, op: impl Fn(T, T) -> T) -> AlgebraResult<Self> {
        self.space.ensure_same(&rhs.space)?;
        let (lhs, rhs_entries) = (&self.entries, &rhs.entries);
        let mut output = Vec::with_capacity(lhs.len() + rhs_entries.len());
        let (mut l, mut r) = (0, 0);
        while l < lhs.len() || r < rhs_entries.len() {
            let order = match (lhs.get(l), rhs_entries.get(r)) {
                (Some(a), Some(b)) => a.position().cmp(&b.position()),
                (Some(_), None) => Ordering::Less,
                _ => Ordering::Greater,
            };
            match order {
                Ordering::Less => {
                    let a = lhs[l];
                    output.push(CoordinateEntry::new(op(a.value, T::zero()), a.row, a.col));
                    l += 1;
                }
                Ordering::Greater => {
                    let b = rhs_entries[r];
                    output.push(CoordinateEntry::new(op(T::zero(), b.value), b.row, b.col));
                    r += 1;
                }
                Ordering::Equal => {
                    let (a, b) = (lhs[l], rhs_entries[r]);
                    output.push(CoordinateEntry::new(op(a.value, b.value), a.row, a.col));
                    l += 1;
                    r += 1;
                }
            }
        }
        Ok(Self::from_sorted_unchecked(self.space.clone(), output))
    }

    pub fn try_add(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.merge(rhs, |a, b| a + b)
    }

    pub fn try_sub(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.merge(rhs, |a, b| a - b)
    }

    /// Sparse product: every row of `self` is intersected with every row of
    /// the transposed right operand. Positions with no matching index pair
    /// are left out of the result.
    pub fn try_mul(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.space.ensure_same(&rhs.space)?;
        let columns = rhs.transpose();
        let lhs_rows = row_ranges(&self.entries);
        let rhs_cols = row_ranges(&columns.entries);

        let mut output = Vec::new();
        for lhs_range in &lhs_rows {
            let row_entries = &self.entries[lhs_range.clone()];
            for rhs_range in &rhs_cols {
                let col_entries = &columns.entries[rhs_range.clone()];
                if let Some(value) = intersect(row_entries, col_entries) {
                    let (row, col) = (row_entries[0].row, col_entries[0].row);
                    output.push(CoordinateEntry::new(value, row, col));
                }
            }
        }
        Ok(Self::from_sorted_unchecked(self.space.clone(), output))
    }

    pub fn try_mul_vector(&self, rhs: &Vector<T>) -> AlgebraResult<Vector<T>> {
        self.space.ensure_same(rhs.space())?;
        let input = rhs.elements();
        let mut output = vec![T::zero(); self.dimension()];
        for entry in &self.entries {
            output[entry.row] = output[entry.row] + entry.value * input[entry.col];
        }
        Ok(Vector::from_parts_unchecked(self.space.clone(), output))
    }
}

/// Half-open ranges of consecutive entries sharing a row.
fn row_ranges<T>(entries: &[CoordinateEntry<T>]) -> Vec<Range<usize>> {
    let mut ranges = Vec::new();
    let mut start = 0;
    for index in 1..=entries.len() {
        if index == entries.len() || entries[index].row != entries[start].row {
            if start < index {
                ranges.push(start..index);
            }
            start = index;
        }
    }
    ranges
}

/// Dot product of a row and a transposed column, or `None` if their column
/// indices never coincide.
fn intersect<T: Scalar>(row: &[CoordinateEntry<T>], col: &[CoordinateEntry<T>]) -> Option<T> {
    let (mut i, mut j) = (0, 0);
    let mut sum: Option<T> = None;
    while i < row.len() && j < col.len() {
        match row[i].col.cmp(&col[j].col) {
            Ordering::Less => i += 1,
            Ordering::Greater => j += 1,
            Ordering::Equal => {
                let product = row[i].value * col[j].value;
                sum = Some(sum.map_or(product, |s| s + product));
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

impl<T> LivesInSpace for SparseMatrix<T> {
    fn space(&self) -> &VectorSpace {
        &self.space
    }
}

impl<T: Scalar> From<&Matrix<T>> for SparseMatrix<T> {
    fn from(matrix: &Matrix<T>) -> Self {
        Self::from_dense(matrix)
    }
}

impl<T: Scalar> From<&SparseMatrix<T>> for Matrix<T> {
    fn from(sparse: &SparseMatrix<T>) -> Self {
        sparse.to_dense()
    }
}

checked_binop!(SparseMatrix, Add, add, try_add);
checked_binop!(SparseMatrix, Sub, sub, try_sub);
checked_binop!(SparseMatrix, Mul, mul, try_mul);
scalar_ops!(SparseMatrix);

impl<'a, 'b, T: Scalar> std::ops::Mul<&'b Vector<T>> for &'a SparseMatrix<T> {
    type Output = Vector<T>;

    #[track_caller]
    fn mul(self, rhs: &'b Vector<T>) -> Vector<T> {
        crate::error::fail_fast(self.try_mul_vector(rhs))
    }
}

impl<T: Scalar> fmt::Display for SparseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Sparse operator in space {}", self.space)?;
        for entry in &self.entries {
            writeln!(f, "{entry}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;
    use proptest::prelude::*;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type C = Complex<f64>;

    fn space(dimension: usize) -> VectorSpace {
        VectorSpace::new(dimension, "sparse test").expect("space")
    }

    fn random_sparse(rng: &mut StdRng, space: &VectorSpace, density: f64) -> Matrix<f64> {
        Matrix::from_fn(space, |_, _| {
            if rng.gen_bool(density) {
                f64::from(rng.gen_range(-9..=9))
            } else {
                0.0
            }
        })
    }

    #[test]
    fn from_dense_keeps_non_zeros_in_row_major_order() {
        let s = space(3);
        let dense = Matrix::from_elements(vec![0.0, 2.0, 0.0, 0.0, 0.0, 0.0, 7.0, 0.0, -1.0], &s)
            .expect("matrix");
        let sparse = SparseMatrix::from_dense(&dense);
        let positions: Vec<_> = sparse.entries().iter().map(CoordinateEntry::position).collect();
        assert_eq!(positions, vec![(0, 1), (2, 0), (2, 2)]);
        assert_eq!(sparse.nnz(), 3);
        assert_eq!(sparse.get(2, 0).expect("in range"), 7.0);
        assert_eq!(sparse.get(1, 1).expect("in range"), 0.0);
        assert_eq!(sparse.to_dense(), dense);
    }

    #[test]
    fn from_entries_sorts_and_validates() {
        let s = space(2);
        let sparse = SparseMatrix::from_entries(
            &s,
            vec![CoordinateEntry::new(4.0, 1, 1), CoordinateEntry::new(1.0, 0, 0)],
        )
        .expect("valid entries");
        assert_eq!(sparse.entries()[0].position(), (0, 0));

        let duplicate = SparseMatrix::from_entries(
            &s,
            vec![CoordinateEntry::new(1.0, 0, 1), CoordinateEntry::new(2.0, 0, 1)],
        );
        assert_eq!(duplicate, Err(AlgebraError::DuplicateEntry { row: 0, col: 1 }));

        let outside = SparseMatrix::from_entries(&s, vec![CoordinateEntry::new(1.0, 2, 0)]);
        assert!(matches!(outside, Err(AlgebraError::IndexOutOfRange { row: 2, .. })));
    }

    #[test]
    fn from_entries_drops_zero_values() {
        let s = space(2);
        let sparse = SparseMatrix::from_entries(
            &s,
            vec![CoordinateEntry::new(0.0, 0, 1), CoordinateEntry::new(2.0, 1, 0)],
        )
        .expect("valid entries");
        assert_eq!(sparse.nnz(), 1);
        assert_eq!(sparse.entries(), &[CoordinateEntry::new(2.0, 1, 0)]);
        assert_eq!(SparseMatrix::from_dense(&sparse.to_dense()), sparse);

        let empty = SparseMatrix::from_entries(&s, vec![CoordinateEntry::new(0.0, 1, 1)])
            .expect("valid entries");
        assert_eq!(empty, SparseMatrix::new(&s));
    }

    #[test]
    fn subtraction_negates_right_only_entries() {
        let s = space(2);
        let a = SparseMatrix::from_entries(&s, vec![CoordinateEntry::new(3.0, 0, 0)]).expect("a");
        let b = SparseMatrix::from_entries(
            &s,
            vec![CoordinateEntry::new(3.0, 0, 0), CoordinateEntry::new(5.0, 1, 0)],
        )
        .expect("b");
        let difference = &a - &b;
        assert_eq!(difference.nnz(), 2);
        assert_eq!(difference.get(0, 0).expect("in range"), 0.0);
        assert_eq!(difference.get(1, 0).expect("in range"), -5.0);
        assert_eq!(difference.to_dense(), &a.to_dense() - &b.to_dense());
    }

    #[test]
    fn product_skips_positions_without_matches() {
        let s = space(3);
        let a = SparseMatrix::from_entries(&s, vec![CoordinateEntry::new(2.0, 0, 1)]).expect("a");
        let b = SparseMatrix::from_entries(
            &s,
            vec![CoordinateEntry::new(3.0, 1, 2), CoordinateEntry::new(4.0, 0, 0)],
        )
        .expect("b");
        let product = &a * &b;
        assert_eq!(product.entries(), &[CoordinateEntry::new(6.0, 0, 2)]);
    }

    #[test]
    fn sparse_product_agrees_with_dense_on_random_inputs() {
        let mut rng = StdRng::seed_from_u64(0x5eed);
        for dim in [1, 2, 5, 8] {
            let s = space(dim);
            for _ in 0..10 {
                let a = random_sparse(&mut rng, &s, 0.3);
                let b = random_sparse(&mut rng, &s, 0.3);
                let sparse = &SparseMatrix::from_dense(&a) * &SparseMatrix::from_dense(&b);
                assert!(sparse.to_dense().approx_eq(&(&a * &b), 1e-12));

                let v = Vector::from_elements((0..dim).map(|k| k as f64 - 1.5).collect(), &s)
                    .expect("vector");
                assert_eq!(&SparseMatrix::from_dense(&a) * &v, &a * &v);
            }
        }
    }

    #[test]
    fn complex_transpose_and_scaling() {
        let s = space(2);
        let i = C::new(0.0, 1.0);
        let sparse =
            SparseMatrix::from_entries(&s, vec![CoordinateEntry::new(i, 0, 1)]).expect("entries");
        let transposed = sparse.transpose();
        assert_eq!(transposed.get(1, 0).expect("in range"), i);
        assert_eq!((i * &transposed).get(1, 0).expect("in range"), C::new(-1.0, 0.0));
        assert_eq!((-&sparse).get(0, 1).expect("in range"), -i);
    }

    #[test]
    fn mismatched_spaces_are_rejected() {
        let a = SparseMatrix::<f64>::new(&space(2));
        let b = SparseMatrix::<f64>::new(&space(2));
        assert!(matches!(a.try_add(&b), Err(AlgebraError::SpaceMismatch { .. })));
        assert!(a.try_mul(&b).is_err());
    }

    proptest! {
        #[test]
        fn addition_matches_dense(
            lhs in prop::collection::vec(prop_oneof![Just(0.0f64), -5.0f64..5.0], 16),
            rhs in prop::collection::vec(prop_oneof![Just(0.0f64), -5.0f64..5.0], 16),
        ) {
            let s = space(4);
            let a = Matrix::from_elements(lhs, &s).expect("lhs");
            let b = Matrix::from_elements(rhs, &s).expect("rhs");
            let sum = &SparseMatrix::from_dense(&a) + &SparseMatrix::from_dense(&b);
            prop_assert_eq!(sum.to_dense(), &a + &b);
            prop_assert_eq!(SparseMatrix::from_dense(&a).to_dense(), a);
        }
    }
}
