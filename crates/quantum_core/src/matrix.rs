//! Dense square operators stored row-major.

mod blocked;

use crate::algebra::{Conjugate, HasAbs, Scalar};
use crate::error::{AlgebraError, AlgebraResult};
use crate::space::{LivesInSpace, VectorSpace};
use crate::vector::Vector;
use num_traits::FromPrimitive;
use std::fmt;
use std::ops::{Index, IndexMut};

/// Tolerance used by [`Matrix::approx_eq_default`].
pub const DEFAULT_TOLERANCE: f64 = 1.0e-6;

/// A `dimension × dimension` matrix; element `(row, col)` lives at
/// `row * dimension + col`.
#[derive(Debug, Clone, PartialEq)]
pub struct Matrix<T> {
    space: VectorSpace,
    elements: Vec<T>,
}

impl<T: Scalar> Matrix<T> {
    pub fn from_elements(elements: Vec<T>, space: &VectorSpace) -> AlgebraResult<Self> {
        let expected = space.dimension() * space.dimension();
        if elements.len() != expected {
            return Err(AlgebraError::ElementCount {
                expected,
                actual: elements.len(),
            });
        }
        Ok(Self {
            space: space.clone(),
            elements,
        })
    }

    pub fn zeros(space: &VectorSpace) -> Self {
        let dim = space.dimension();
        Self {
            space: space.clone(),
            elements: vec![T::zero(); dim * dim],
        }
    }

    pub fn identity(space: &VectorSpace) -> Self {
        Self::from_fn(space, |row, col| if row == col { T::one() } else { T::zero() })
    }

    pub fn from_fn(space: &VectorSpace, mut entry: impl FnMut(usize, usize) -> T) -> Self {
        let dim = space.dimension();
        let mut elements = Vec::with_capacity(dim * dim);
        for row in 0..dim {
            for col in 0..dim {
                elements.push(entry(row, col));
            }
        }
        Self {
            space: space.clone(),
            elements,
        }
    }

    pub(crate) fn from_parts_unchecked(space: VectorSpace, elements: Vec<T>) -> Self {
        debug_assert_eq!(elements.len(), space.dimension() * space.dimension());
        Self { space, elements }
    }

    pub fn dimension(&self) -> usize {
        self.space.dimension()
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<T> {
        self.elements
    }

    fn offset(&self, row: usize, col: usize) -> AlgebraResult<usize> {
        let dimension = self.dimension();
        if row < dimension && col < dimension {
            Ok(row * dimension + col)
        } else {
            Err(AlgebraError::IndexOutOfRange { row, col, dimension })
        }
    }

    pub fn get(&self, row: usize, col: usize) -> AlgebraResult<T> {
        Ok(self.elements[self.offset(row, col)?])
    }

    pub fn set(&mut self, row: usize, col: usize, value: T) -> AlgebraResult<()> {
        let offset = self.offset(row, col)?;
        self.elements[offset] = value;
        Ok(())
    }

    fn zip_with(&self, rhs: &Self, op: impl Fn(T, T) -> T) -> AlgebraResult<Self> {
        self.space.ensure_same(&rhs.space)?;
        let elements = self
            .elements
            .iter()
            .zip(&rhs.elements)
            .map(|(&a, &b)| op(a, b))
            .collect();
        Ok(Self::from_parts_unchecked(self.space.clone(), elements))
    }

    fn map(&self, op: impl Fn(T) -> T) -> Self {
        let elements = self.elements.iter().map(|&x| op(x)).collect();
        Self::from_parts_unchecked(self.space.clone(), elements)
    }

    pub fn try_add(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.zip_with(rhs, |a, b| a + b)
    }

    pub fn try_sub(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.zip_with(rhs, |a, b| a - b)
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

    pub fn scale_by_real(&self, factor: f64) -> Self {
        self.scale(T::from_real(factor))
    }

    pub fn scale_by_int(&self, factor: i64) -> Self {
        self.scale(T::from_int(factor))
    }

    pub fn try_mul_vector(&self, rhs: &Vector<T>) -> AlgebraResult<Vector<T>> {
        self.space.ensure_same(rhs.space())?;
        let dim = self.dimension();
        let input = rhs.elements();
        let output = self
            .elements
            .chunks(dim)
            .map(|row| {
                row.iter()
                    .zip(input)
                    .fold(T::zero(), |sum, (&a, &x)| sum + a * x)
            })
            .collect();
        Ok(Vector::from_parts_unchecked(self.space.clone(), output))
    }

    /// Triple-loop product, O(n³). This is what `*` uses.
    pub fn multiply_brute_force(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.space.ensure_same(&rhs.space)?;
        let dim = self.dimension();
        let mut output = vec![T::zero(); dim * dim];
        for i in 0..dim {
            for k in 0..dim {
                let a = self.elements[i * dim + k];
                for j in 0..dim {
                    output[i * dim + j] = output[i * dim + j] + a * rhs.elements[k * dim + j];
                }
            }
        }
        Ok(Self::from_parts_unchecked(self.space.clone(), output))
    }

    /// Recursive quadrant product. Same O(n³) family as the brute-force
    /// product; odd sizes are zero-padded at each level.
    pub fn multiply_divide_and_conquer(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.space.ensure_same(&rhs.space)?;
        let output = blocked::multiply(&self.elements, &rhs.elements, self.dimension());
        Ok(Self::from_parts_unchecked(self.space.clone(), output))
    }

    pub fn try_mul(&self, rhs: &Self) -> AlgebraResult<Self> {
        self.multiply_brute_force(rhs)
    }

    pub fn transpose(&self) -> Self {
        let dim = self.dimension();
        Self::from_fn(&self.space, |row, col| self.elements[col * dim + row])
    }

    /// Conjugate transpose.
    pub fn hermitian_adjoint(&self) -> Self
    where
        T: Conjugate,
    {
        let dim = self.dimension();
        Self::from_fn(&self.space, |row, col| self.elements[col * dim + row].conjugate())
    }

    pub fn trace(&self) -> T {
        let dim = self.dimension();
        (0..dim).fold(T::zero(), |sum, i| sum + self.elements[i * dim + i])
    }

    /// Same space and every `|a - b| < tolerance`.
    pub fn approx_eq(&self, other: &Self, tolerance: f64) -> bool
    where
        T: HasAbs,
    {
        let Some(tolerance) = T::Real::from_f64(tolerance) else {
            return false;
        };
        self.space == other.space
            && self
                .elements
                .iter()
                .zip(&other.elements)
                .all(|(&a, &b)| (a - b).abs_value() < tolerance)
    }

    pub fn approx_eq_default(&self, other: &Self) -> bool
    where
        T: HasAbs,
    {
        self.approx_eq(other, DEFAULT_TOLERANCE)
    }
}

impl<T> LivesInSpace for Matrix<T> {
    fn space(&self) -> &VectorSpace {
        &self.space
    }
}

impl<T: Scalar> Index<(usize, usize)> for Matrix<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, (row, col): (usize, usize)) -> &T {
        match self.offset(row, col) {
            Ok(offset) => &self.elements[offset],
            Err(err) => panic!("{err}"),
        }
    }
}

impl<T: Scalar> IndexMut<(usize, usize)> for Matrix<T> {
    #[track_caller]
    fn index_mut(&mut self, (row, col): (usize, usize)) -> &mut T {
        match self.offset(row, col) {
            Ok(offset) => &mut self.elements[offset],
            Err(err) => panic!("{err}"),
        }
    }
}

checked_binop!(Matrix, Add, add, try_add);
checked_binop!(Matrix, Sub, sub, try_sub);
checked_binop!(Matrix, Mul, mul, try_mul);
scalar_ops!(Matrix);

impl<'a, 'b, T: Scalar> std::ops::Mul<&'b Vector<T>> for &'a Matrix<T> {
    type Output = Vector<T>;

    #[track_caller]
    fn mul(self, rhs: &'b Vector<T>) -> Vector<T> {
        crate::error::fail_fast(self.try_mul_vector(rhs))
    }
}

impl<T: Scalar> std::ops::Mul<Vector<T>> for Matrix<T> {
    type Output = Vector<T>;

    #[track_caller]
    fn mul(self, rhs: Vector<T>) -> Vector<T> {
        crate::error::fail_fast(self.try_mul_vector(&rhs))
    }
}

impl<T: Scalar> fmt::Display for Matrix<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Operator in space {}", self.space)?;
        for row in self.elements.chunks(self.dimension()) {
            let cells: Vec<String> = row.iter().map(|value| format!("{value:?}")).collect();
            writeln!(f, "{}", cells.join(" , "))?;
        }
        Ok(())
    }
}
