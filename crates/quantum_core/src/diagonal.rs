//! Operators stored by diagonal.
//!
//! Diagonal `d` holds the entries with `col - row == d`. Each diagonal keeps
//! only its non-zero rows, keyed by row index, and the operator keeps only the
//! diagonals that hold at least one entry.

use crate::algebra::Scalar;
use crate::error::{AlgebraError, AlgebraResult};
use crate::matrix::Matrix;
use crate::space::{LivesInSpace, VectorSpace};
use crate::vector::Vector;
use std::collections::btree_map::Entry;
use std::collections::BTreeMap;
use std::fmt;

/// Inclusive row range `[max(0, -d), dimension - 1 - max(0, d)]` spanned by
/// diagonal `d`. Only meaningful for `-dimension < d < dimension`.
pub fn row_limits(dimension: usize, index: isize) -> (usize, usize) {
    let lower = (-index).max(0) as usize;
    let upper = (dimension as isize - 1 - index.max(0)) as usize;
    (lower, upper)
}

fn validate_index(dimension: usize, index: isize) -> AlgebraResult<()> {
    let bound = dimension as isize;
    if index <= -bound || index >= bound {
        return Err(AlgebraError::InvalidDiagonal { index, dimension });
    }
    Ok(())
}

/// One diagonal of a square operator.
#[derive(Debug, Clone, PartialEq)]
pub struct MatrixDiagonal<T> {
    dimension: usize,
    index: isize,
    elements: BTreeMap<usize, T>,
}

impl<T: Scalar> MatrixDiagonal<T> {
    pub fn new(dimension: usize, index: isize) -> AlgebraResult<Self> {
        validate_index(dimension, index)?;
        Ok(Self {
            dimension,
            index,
            elements: BTreeMap::new(),
        })
    }

    pub fn from_entries(
        dimension: usize,
        index: isize,
        entries: impl IntoIterator<Item = (usize, T)>,
    ) -> AlgebraResult<Self> {
        let mut diagonal = Self::new(dimension, index)?;
        for (row, value) in entries {
            diagonal.set(row, value)?;
        }
        Ok(diagonal)
    }

    fn empty_like(&self, index: isize) -> Self {
        Self {
            dimension: self.dimension,
            index,
            elements: BTreeMap::new(),
        }
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }

    pub fn index(&self) -> isize {
        self.index
    }

    pub fn row_limits(&self) -> (usize, usize) {
        row_limits(self.dimension, self.index)
    }

    /// Column reached by `row` on this diagonal, if it is inside the operator.
    pub fn column(&self, row: usize) -> Option<usize> {
        let (lower, upper) = self.row_limits();
        (lower..=upper)
            .contains(&row)
            .then(|| (row as isize + self.index) as usize)
    }

    /// Stored value at `row`, `None` when the row holds no entry.
    pub fn get(&self, row: usize) -> Option<T> {
        self.elements.get(&row).copied()
    }

    /// Stores `value` at `row`. Writing zero clears the row.
    pub fn set(&mut self, row: usize, value: T) -> AlgebraResult<()> {
        if self.column(row).is_none() {
            return Err(AlgebraError::IndexOutOfRange {
                row,
                col: (row as isize + self.index).max(0) as usize,
                dimension: self.dimension,
            });
        }
        if value.is_zero() {
            self.elements.remove(&row);
        } else {
            self.elements.insert(row, value);
        }
        Ok(())
    }

    pub fn remove(&mut self, row: usize) -> Option<T> {
        self.elements.remove(&row)
    }

    /// `(row, value)` pairs in ascending row order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, T)> + '_ {
        self.elements.iter().map(|(&row, &value)| (row, value))
    }

    pub fn len(&self) -> usize {
        self.elements.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    fn map(&self, op: impl Fn(T) -> T) -> Self {
        Self {
            dimension: self.dimension,
            index: self.index,
            elements: self.elements.iter().map(|(&row, &value)| (row, op(value))).collect(),
        }
    }

    pub fn scale(&self, factor: T) -> Self {
        self.map(|x| x * factor)
    }

    pub fn divide(&self, divisor: T) -> Self {
        self.map(|x| x / divisor)
    }

    pub fn negated(&self) -> Self {
        self.map(|x| -x)
    }

    /// Row-wise combination of two diagonals with the same index; a row
    /// missing on either side counts as zero.
    pub fn combine(&self, rhs: &Self, op: impl Fn(T, T) -> T) -> Self {
        debug_assert_eq!(self.index, rhs.index);
        let mut output = self.empty_like(self.index);
        for (&row, &value) in &self.elements {
            let other = rhs.get(row).unwrap_or_else(T::zero);
            output.elements.insert(row, op(value, other));
        }
        for (&row, &value) in &rhs.elements {
            if !self.elements.contains_key(&row) {
                output.elements.insert(row, op(T::zero(), value));
            }
        }
        output
    }

    pub fn add(&self, rhs: &Self) -> Self {
        self.combine(rhs, |a, b| a + b)
    }

    pub fn sub(&self, rhs: &Self) -> Self {
        self.combine(rhs, |a, b| a - b)
    }

    /// Contribution of this diagonal times `rhs` to diagonal
    /// `self.index() + rhs.index()`, or `None` when that diagonal lies
    /// outside the operator.
    pub fn multiply(&self, rhs: &Self) -> Option<Self> {
        let index = self.index + rhs.index;
        validate_index(self.dimension, index).ok()?;
        let mut output = self.empty_like(index);
        for (&row, &value) in &self.elements {
            let Some(middle) = self.column(row) else {
                continue;
            };
            if let Some(rhs_value) = rhs.get(middle) {
                output.elements.insert(row, value * rhs_value);
            }
        }
        Some(output)
    }

    /// Diagonal of `self ⊗ rhs` with index `d1 * n2 + d2`; row `r1` paired
    /// with row `r2` lands on row `r1 * n2 + r2`.
    pub fn tensor_product(&self, rhs: &Self) -> Self {
        let n2 = rhs.dimension;
        let mut output = Self {
            dimension: self.dimension * n2,
            index: self.index * n2 as isize + rhs.index,
            elements: BTreeMap::new(),
        };
        for (&left_row, &left) in &self.elements {
            for (&right_row, &right) in &rhs.elements {
                output.elements.insert(left_row * n2 + right_row, left * right);
            }
        }
        output
    }

    /// Diagonal of `I_copies ⊗ self`: the block-diagonal operator holding
    /// `copies` copies of this diagonal's operator.
    pub fn tensor_with_identity_from_left(&self, copies: usize) -> Self {
        let block = self.dimension;
        let mut output = Self {
            dimension: block * copies,
            index: self.index,
            elements: BTreeMap::new(),
        };
        for copy in 0..copies {
            for (&row, &value) in &self.elements {
                output.elements.insert(copy * block + row, value);
            }
        }
        output
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct DiagonalSparseMatrix<T> {
    space: VectorSpace,
    diagonals: BTreeMap<isize, MatrixDiagonal<T>>,
}

impl<T: Scalar> DiagonalSparseMatrix<T> {
    pub fn new(space: &VectorSpace) -> Self {
        Self {
            space: space.clone(),
            diagonals: BTreeMap::new(),
        }
    }

    pub fn from_dense(matrix: &Matrix<T>) -> Self {
        let dim = matrix.dimension();
        let elements = matrix.elements();
        let mut diagonals = BTreeMap::new();
        for index in (1 - dim as isize)..(dim as isize) {
            let (lower, upper) = row_limits(dim, index);
            let entries: BTreeMap<usize, T> = (lower..=upper)
                .map(|row| (row, elements[row * dim + (row as isize + index) as usize]))
                .filter(|(_, value)| !value.is_zero())
                .collect();
            if !entries.is_empty() {
                diagonals.insert(
                    index,
                    MatrixDiagonal {
                        dimension: dim,
                        index,
                        elements: entries,
                    },
                );
            }
        }
        Self {
            space: matrix.space().clone(),
            diagonals,
        }
    }

    /// Assembles an operator from diagonals. Diagonals sharing an index are
    /// summed; empty diagonals are dropped.
    pub fn from_diagonals(
        space: &VectorSpace,
        diagonals: impl IntoIterator<Item = MatrixDiagonal<T>>,
    ) -> AlgebraResult<Self> {
        let mut output = Self::new(space);
        for diagonal in diagonals {
            if diagonal.dimension != space.dimension() {
                return Err(AlgebraError::ElementCount {
                    expected: space.dimension(),
                    actual: diagonal.dimension,
                });
            }
            output.accumulate(diagonal);
        }
        output.prune();
        Ok(output)
    }

    fn accumulate(&mut self, diagonal: MatrixDiagonal<T>) {
        match self.diagonals.get_mut(&diagonal.index) {
            Some(existing) => *existing = existing.add(&diagonal),
            None => {
                self.diagonals.insert(diagonal.index, diagonal);
            }
        }
    }

    fn prune(&mut self) {
        self.diagonals.retain(|_, diagonal| !diagonal.is_empty());
    }

    pub fn dimension(&self) -> usize {
        self.space.dimension()
    }

    pub fn diagonal(&self, index: isize) -> Option<&MatrixDiagonal<T>> {
        self.diagonals.get(&index)
    }

    pub fn diagonals(&self) -> impl Iterator<Item = &MatrixDiagonal<T>> {
        self.diagonals.values()
    }

    /// Indices of the stored diagonals in ascending order.
    pub fn diagonal_indices(&self) -> Vec<isize> {
        self.diagonals.keys().copied().collect()
    }

    fn check_position(&self, row: usize, col: usize) -> AlgebraResult<isize> {
        let dimension = self.dimension();
        if row >= dimension || col >= dimension {
            return Err(AlgebraError::IndexOutOfRange { row, col, dimension });
        }
        Ok(col as isize - row as isize)
    }

    pub fn get(&self, row: usize, col: usize) -> AlgebraResult<T> {
        let index = self.check_position(row, col)?;
        Ok(self
            .diagonals
            .get(&index)
            .and_then(|diagonal| diagonal.get(row))
            .unwrap_or_else(T::zero))
    }

    /// Writes an entry, creating its diagonal when needed. Writing zero
    /// clears the entry and drops the diagonal once it is empty.
    pub fn set(&mut self, row: usize, col: usize, value: T) -> AlgebraResult<()> {
        let index = self.check_position(row, col)?;
        if value.is_zero() {
            if let Some(diagonal) = self.diagonals.get_mut(&index) {
                diagonal.remove(row);
                if diagonal.is_empty() {
                    self.diagonals.remove(&index);
                }
            }
            return Ok(());
        }
        let dimension = self.dimension();
        let diagonal = match self.diagonals.entry(index) {
            Entry::Occupied(entry) => entry.into_mut(),
            Entry::Vacant(entry) => entry.insert(MatrixDiagonal::new(dimension, index)?),
        };
        diagonal.set(row, value)
    }

    pub fn to_dense(&self) -> Matrix<T> {
        let dim = self.dimension();
        let mut elements = vec![T::zero(); dim * dim];
        for diagonal in self.diagonals.values() {
            for (row, value) in diagonal.iter() {
                elements[row * dim + (row as isize + diagonal.index) as usize] = value;
            }
        }
        Matrix::from_parts_unchecked(self.space.clone(), elements)
    }

    fn map(&self, op: impl Fn(&MatrixDiagonal<T>) -> MatrixDiagonal<T>) -> Self {
        Self {
            space: self.space.clone(),
            diagonals: self.diagonals.iter().map(|(&index, d)| (index, op(d))).collect(),
        }
    }

    pub fn negated(&self) -> Self {
        self.map(MatrixDiagonal::negated)
    }

    pub fn scale(&self, factor: T) -> Self {
        self.map(|d| d.scale(factor))
    }

    pub fn divide(&self, divisor: T) -> Self {
        self.map(|d| d.divide(divisor))
    }

    pub fn try_add(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.space.ensure_same(&rhs.space)?;
        let mut output = self.clone();
        for diagonal in rhs.diagonals.values() {
            output.accumulate(diagonal.clone());
        }
        Ok(output)
    }

    pub fn try_sub(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.space.ensure_same(&rhs.space)?;
        let mut output = self.clone();
        for (index, diagonal) in &rhs.diagonals {
            let difference = match output.diagonals.get(index) {
                Some(existing) => existing.sub(diagonal),
                None => diagonal.negated(),
            };
            output.diagonals.insert(*index, difference);
        }
        Ok(output)
    }

    /// Every pair of diagonals `(i, j)` contributes to diagonal `i + j`.
    pub fn try_mul(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.space.ensure_same(&rhs.space)?;
        let mut output = Self::new(&self.space);
        for lhs_diagonal in self.diagonals.values() {
            for rhs_diagonal in rhs.diagonals.values() {
                if let Some(product) = lhs_diagonal.multiply(rhs_diagonal) {
                    output.accumulate(product);
                }
            }
        }
        output.prune();
        Ok(output)
    }

    pub fn try_mul_vector(&self, rhs: &Vector<T>) -> AlgebraResult<Vector<T>> {
        self.space.ensure_same(rhs.space())?;
        let input = rhs.elements();
        let mut output = vec![T::zero(); self.dimension()];
        for diagonal in self.diagonals.values() {
            for (row, value) in diagonal.iter() {
                if let Some(col) = diagonal.column(row) {
                    output[row] = output[row] + value * input[col];
                }
            }
        }
        Ok(Vector::from_parts_unchecked(self.space.clone(), output))
    }
}

impl<T> LivesInSpace for DiagonalSparseMatrix<T> {
    fn space(&self) -> &VectorSpace {
        &self.space
    }
}

impl<T: Scalar> From<&Matrix<T>> for DiagonalSparseMatrix<T> {
    fn from(matrix: &Matrix<T>) -> Self {
        Self::from_dense(matrix)
    }
}

impl<T: Scalar> From<&DiagonalSparseMatrix<T>> for Matrix<T> {
    fn from(matrix: &DiagonalSparseMatrix<T>) -> Self {
        matrix.to_dense()
    }
}

checked_binop!(DiagonalSparseMatrix, Add, add, try_add);
checked_binop!(DiagonalSparseMatrix, Sub, sub, try_sub);
checked_binop!(DiagonalSparseMatrix, Mul, mul, try_mul);
scalar_ops!(DiagonalSparseMatrix);

impl<'a, 'b, T: Scalar> std::ops::Mul<&'b Vector<T>> for &'a DiagonalSparseMatrix<T> {
    type Output = Vector<T>;

    #[track_caller]
    fn mul(self, rhs: &'b Vector<T>) -> Vector<T> {
        crate::error::fail_fast(self.try_mul_vector(rhs))
    }
}

impl<T: Scalar> fmt::Display for DiagonalSparseMatrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Diagonal operator in space {}", self.space)?;
        for (index, diagonal) in &self.diagonals {
            let cells: Vec<String> = diagonal
                .iter()
                .map(|(row, value)| format!("{row}: {value:?}"))
                .collect();
            writeln!(f, "[{index}] {}", cells.join(", "))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use num_complex::Complex;
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};

    type C = Complex<f64>;

    fn space(dimension: usize) -> VectorSpace {
        VectorSpace::new(dimension, "diagonal test").expect("space")
    }

    #[test]
    fn row_limits_follow_the_diagonal() {
        assert_eq!(row_limits(4, 0), (0, 3));
        assert_eq!(row_limits(4, 2), (0, 1));
        assert_eq!(row_limits(4, -3), (3, 3));
        assert!(MatrixDiagonal::<f64>::new(4, 4).is_err());
        assert!(MatrixDiagonal::<f64>::new(4, -4).is_err());
    }

    #[test]
    fn set_rejects_rows_off_the_diagonal() {
        let mut diagonal = MatrixDiagonal::new(3, 1).expect("diagonal");
        diagonal.set(1, 2.0).expect("row 1 reaches column 2");
        assert!(diagonal.set(2, 1.0).is_err());
        assert_eq!(diagonal.get(1), Some(2.0));
        assert_eq!(diagonal.get(0), None);
    }

    #[test]
    fn sigma_y_splits_into_two_off_diagonals() {
        let s = space(2);
        let zero = C::new(0.0, 0.0);
        let i = C::new(0.0, 1.0);
        let sigma_y = Matrix::from_elements(vec![zero, -i, i, zero], &s).expect("matrix");
        let sparse = DiagonalSparseMatrix::from_dense(&sigma_y);

        assert_eq!(sparse.space(), &s);
        assert_eq!(sparse.diagonal_indices(), vec![-1, 1]);
        assert_eq!(sparse.diagonal(1).expect("upper").iter().collect::<Vec<_>>(), vec![(0, -i)]);
        assert_eq!(sparse.diagonal(-1).expect("lower").iter().collect::<Vec<_>>(), vec![(1, i)]);
        assert!(sparse.diagonal(0).is_none());
        assert_eq!(sparse.to_dense(), sigma_y);
    }

    #[test]
    fn four_by_four_product_fills_expected_diagonals() {
        let s = space(4);
        let a = Matrix::from_fn(&s, |r, c| match c as isize - r as isize {
            -1 => 2.0,
            0 => 1.0 + r as f64,
            _ => 0.0,
        });
        let b = Matrix::from_fn(&s, |r, c| match c as isize - r as isize {
            -1 => -1.0,
            1 => 3.0 + c as f64,
            _ => 0.0,
        });
        let product = &DiagonalSparseMatrix::from_dense(&a) * &DiagonalSparseMatrix::from_dense(&b);
        assert_eq!(product.diagonal_indices(), vec![-2, -1, 0, 1]);
        assert_eq!(product.to_dense(), &a * &b);
    }

    #[test]
    fn sum_and_difference_match_dense() {
        let s = space(3);
        let a = Matrix::from_elements(vec![1.0, 0.0, 2.0, 0.0, 0.0, 0.0, 4.0, 0.0, 5.0], &s)
            .expect("a");
        let b = Matrix::from_elements(vec![0.0, 3.0, 2.0, 0.0, 6.0, 0.0, 0.0, 0.0, 0.0], &s)
            .expect("b");
        let da = DiagonalSparseMatrix::from_dense(&a);
        let db = DiagonalSparseMatrix::from_dense(&b);
        assert_eq!((&da + &db).to_dense(), &a + &b);
        assert_eq!((&da - &db).to_dense(), &a - &b);
        assert_eq!((&db - &da).get(2, 0).expect("in range"), -4.0);
        assert_eq!((&da * 2.0).to_dense(), &a * 2.0);
    }

    #[test]
    fn operator_times_vector_skips_out_of_range_columns() {
        let mut rng = StdRng::seed_from_u64(7);
        for dim in 1..6 {
            let s = space(dim);
            let dense = Matrix::from_fn(&s, |_, _| {
                if rng.gen_bool(0.4) {
                    rng.gen_range(-2.0..2.0)
                } else {
                    0.0
                }
            });
            let v = Vector::from_elements((0..dim).map(|k| 1.0 + k as f64).collect(), &s)
                .expect("vector");
            let sparse = DiagonalSparseMatrix::from_dense(&dense);
            assert!((&sparse * &v).approx_eq(&(&dense * &v), 1e-12));
            assert_eq!(sparse.to_dense(), dense);
        }
    }

    #[test]
    fn set_creates_diagonals_on_demand() {
        let s = space(3);
        let mut sparse = DiagonalSparseMatrix::new(&s);
        sparse.set(2, 0, 7.0).expect("in range");
        assert_eq!(sparse.diagonal_indices(), vec![-2]);
        assert_eq!(sparse.get(2, 0).expect("in range"), 7.0);
        assert_eq!(sparse.get(0, 0).expect("in range"), 0.0);
        assert!(sparse.set(3, 0, 1.0).is_err());
    }

    #[test]
    fn zero_writes_store_nothing() {
        let s = space(3);
        let mut sparse = DiagonalSparseMatrix::new(&s);
        sparse.set(1, 0, 0.0).expect("in range");
        assert!(sparse.diagonal_indices().is_empty());

        sparse.set(1, 0, 4.0).expect("in range");
        sparse.set(2, 1, 5.0).expect("in range");
        sparse.set(1, 0, 0.0).expect("in range");
        assert_eq!(sparse.diagonal(-1).expect("lower").len(), 1);
        sparse.set(2, 1, 0.0).expect("in range");
        assert!(sparse.diagonal_indices().is_empty());
        assert_eq!(DiagonalSparseMatrix::from_dense(&sparse.to_dense()), sparse);

        let diagonal = MatrixDiagonal::from_entries(3, 0, [(0, 1.0), (1, 0.0), (2, 3.0)])
            .expect("diagonal");
        assert_eq!(diagonal.len(), 2);
        assert_eq!(diagonal.get(1), None);

        let mut cleared = diagonal.clone();
        cleared.set(0, 0.0).expect("on the diagonal");
        assert_eq!(cleared.iter().collect::<Vec<_>>(), vec![(2, 3.0)]);
    }

    #[test]
    fn identity_from_left_builds_block_diagonal() {
        let upper = MatrixDiagonal::from_entries(2, 1, [(0, 5.0)]).expect("diagonal");
        let embedded = upper.tensor_with_identity_from_left(3);
        assert_eq!(embedded.dimension(), 6);
        assert_eq!(embedded.index(), 1);
        assert_eq!(embedded.iter().collect::<Vec<_>>(), vec![(0, 5.0), (2, 5.0), (4, 5.0)]);
    }
}
