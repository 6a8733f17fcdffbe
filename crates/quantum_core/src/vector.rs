use crate::algebra::{Conjugate, HasAbs, Scalar};
use crate::error::{AlgebraError, AlgebraResult};
use crate::matrix::Matrix;
use crate::space::{LivesInSpace, VectorSpace};
use crate::traits::{AdaptiveIntegrand, Integrand};
use num_traits::{Float, FromPrimitive, Zero};
use std::fmt;
use std::ops::{Div, Index, IndexMut, Mul};

/// A vector with exactly `space.dimension()` elements.
#[derive(Debug, Clone, PartialEq)]
pub struct Vector<T> {
    space: VectorSpace,
    elements: Vec<T>,
}

impl<T: Scalar> Vector<T> {
    pub fn from_elements(elements: Vec<T>, space: &VectorSpace) -> AlgebraResult<Self> {
        if elements.len() != space.dimension() {
            return Err(AlgebraError::ElementCount {
                expected: space.dimension(),
                actual: elements.len(),
            });
        }
        Ok(Self {
            space: space.clone(),
            elements,
        })
    }

    pub fn zeros(space: &VectorSpace) -> Self {
        Self {
            space: space.clone(),
            elements: vec![T::zero(); space.dimension()],
        }
    }

    /// Unit vector along `index`.
    pub fn basis(space: &VectorSpace, index: usize) -> AlgebraResult<Self> {
        let mut output = Self::zeros(space);
        output.set(index, T::one())?;
        Ok(output)
    }

    pub(crate) fn from_parts_unchecked(space: VectorSpace, elements: Vec<T>) -> Self {
        debug_assert_eq!(elements.len(), space.dimension());
        Self { space, elements }
    }

    pub fn dimension(&self) -> usize {
        self.elements.len()
    }

    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    pub fn into_elements(self) -> Vec<T> {
        self.elements
    }

    pub fn iter(&self) -> std::slice::Iter<'_, T> {
        self.elements.iter()
    }

    pub fn get(&self, index: usize) -> AlgebraResult<T> {
        self.elements
            .get(index)
            .copied()
            .ok_or_else(|| self.out_of_range(index))
    }

    pub fn set(&mut self, index: usize, value: T) -> AlgebraResult<()> {
        let error = self.out_of_range(index);
        let slot = self.elements.get_mut(index).ok_or(error)?;
        *slot = value;
        Ok(())
    }

    fn out_of_range(&self, index: usize) -> AlgebraError {
        AlgebraError::IndexOutOfRange {
            row: index,
            col: 0,
            dimension: self.dimension(),
        }
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

    /// Multiplies by a real literal, converted into the scalar field.
    pub fn scale_by_real(&self, factor: f64) -> Self {
        self.scale(T::from_real(factor))
    }

    pub fn scale_by_int(&self, factor: i64) -> Self {
        self.scale(T::from_int(factor))
    }

    fn paired_sum(&self, other: &Self, dual: impl Fn(T) -> T) -> AlgebraResult<T> {
        self.space.ensure_same(&other.space)?;
        Ok(self
            .elements
            .iter()
            .zip(&other.elements)
            .fold(T::zero(), |sum, (&a, &b)| sum + a * dual(b)))
    }

    fn paired_outer(&self, other: &Self, dual: impl Fn(T) -> T) -> AlgebraResult<Matrix<T>> {
        self.space.ensure_same(&other.space)?;
        Ok(Matrix::from_fn(&self.space, |row, col| {
            self.elements[row] * dual(other.elements[col])
        }))
    }

    /// `Σ self_i · conj(dual_i)`. Use [`Vector::dot`] for fields without a
    /// conjugate.
    pub fn inner_product(&self, dual: &Self) -> AlgebraResult<T>
    where
        T: Conjugate,
    {
        self.paired_sum(dual, |x| x.conjugate())
    }

    /// The operator `|self⟩⟨other|`, with entries `self_i · conj(other_j)`.
    pub fn outer_product(&self, other: &Self) -> AlgebraResult<Matrix<T>>
    where
        T: Conjugate,
    {
        self.paired_outer(other, |x| x.conjugate())
    }

    /// Plain bilinear `Σ self_i · other_i`, available for every scalar field.
    pub fn dot(&self, other: &Self) -> AlgebraResult<T> {
        self.paired_sum(other, |x| x)
    }

    /// Entries `self_i · other_j` without conjugation.
    pub fn dyad(&self, other: &Self) -> AlgebraResult<Matrix<T>> {
        self.paired_outer(other, |x| x)
    }

    pub fn norm(&self) -> T::Real
    where
        T: HasAbs,
    {
        self.elements
            .iter()
            .map(|x| {
                let magnitude = x.abs_value();
                magnitude * magnitude
            })
            .fold(T::Real::zero(), |sum, squared| sum + squared)
            .sqrt()
    }

    pub fn normalized(&self) -> AlgebraResult<Self>
    where
        T: HasAbs + Div<<T as HasAbs>::Real, Output = T>,
    {
        let norm = self.norm();
        if norm.is_zero() || !norm.is_finite() {
            return Err(AlgebraError::DegenerateNorm);
        }
        Ok(self.map(|x| x / norm))
    }

    /// Element-wise `|a - b| < tolerance`, plus same space.
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
}

impl<T> LivesInSpace for Vector<T> {
    fn space(&self) -> &VectorSpace {
        &self.space
    }
}

impl<T: Scalar> Index<usize> for Vector<T> {
    type Output = T;

    #[track_caller]
    fn index(&self, index: usize) -> &T {
        match self.elements.get(index) {
            Some(value) => value,
            None => panic!("{}", self.out_of_range(index)),
        }
    }
}

impl<T: Scalar> IndexMut<usize> for Vector<T> {
    #[track_caller]
    fn index_mut(&mut self, index: usize) -> &mut T {
        let error = self.out_of_range(index);
        match self.elements.get_mut(index) {
            Some(value) => value,
            None => panic!("{error}"),
        }
    }
}

checked_binop!(Vector, Add, add, try_add);
checked_binop!(Vector, Sub, sub, try_sub);
scalar_ops!(Vector);

impl<T: Scalar> fmt::Display for Vector<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vector in space {}", self.space)?;
        for value in &self.elements {
            writeln!(f, "{value:?}")?;
        }
        Ok(())
    }
}

impl<T> Integrand for Vector<T>
where
    T: Scalar + HasAbs + Mul<<T as HasAbs>::Real, Output = T>,
{
    type Time = T::Real;

    #[track_caller]
    fn ode_add(&self, rhs: &Self) -> Self {
        crate::error::fail_fast(self.try_add(rhs))
    }

    fn ode_scale(&self, factor: T::Real) -> Self {
        self.map(|x| x * factor)
    }
}

impl<T> AdaptiveIntegrand for Vector<T>
where
    T: Scalar + HasAbs + Mul<<T as HasAbs>::Real, Output = T>,
{
    fn component_magnitudes(&self) -> Vec<T::Real> {
        self.elements.iter().map(HasAbs::abs_value).collect()
    }
}

impl<T> Integrand for Vec<T>
where
    T: Scalar + HasAbs + Mul<<T as HasAbs>::Real, Output = T>,
{
    type Time = T::Real;

    fn ode_add(&self, rhs: &Self) -> Self {
        assert_eq!(self.len(), rhs.len(), "integrand lengths differ");
        self.iter().zip(rhs).map(|(&a, &b)| a + b).collect()
    }

    fn ode_scale(&self, factor: T::Real) -> Self {
        self.iter().map(|&x| x * factor).collect()
    }
}

impl<T> AdaptiveIntegrand for Vec<T>
where
    T: Scalar + HasAbs + Mul<<T as HasAbs>::Real, Output = T>,
{
    fn component_magnitudes(&self) -> Vec<T::Real> {
        self.iter().map(HasAbs::abs_value).collect()
    }
}
