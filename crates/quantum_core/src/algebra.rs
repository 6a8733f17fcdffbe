//! Capability hierarchy for scalar fields.
//!
//! Each capability is a small trait with a blanket implementation over the
//! matching `std::ops` / `num-traits` trait, so generic code can ask for
//! exactly the operations it uses. [`Scalar`] composes all of them.

use crate::traits::RealScalar;
use num_complex::Complex;
use num_traits::{Float, FromPrimitive, Num, One, Zero};
use std::fmt::Debug;
use std::ops::{Add, Div, Mul, Neg, Sub};

pub trait Addable: Add<Output = Self> + Sized {}
impl<T: Add<Output = T>> Addable for T {}

pub trait Subtractable: Sub<Output = Self> + Sized {}
impl<T: Sub<Output = T>> Subtractable for T {}

pub trait Multipliable: Mul<Output = Self> + Sized {}
impl<T: Mul<Output = T>> Multipliable for T {}

/// Positive integers are subtractable but not negatable, hence a separate capability.
pub trait Negatable: Neg<Output = Self> + Sized {}
impl<T: Neg<Output = T>> Negatable for T {}

pub trait Dividable: Div<Output = Self> + Sized {}
impl<T: Div<Output = T>> Dividable for T {}

pub trait HasIntegerConstructor: Sized {
    /// `None` when `value` has no representation in the field.
    fn try_from_int(value: i64) -> Option<Self>;

    /// Literal constructor for values known to fit.
    ///
    /// # Panics
    ///
    /// Panics when `value` is not representable, e.g. an out-of-range `i32`.
    fn from_int(value: i64) -> Self {
        match Self::try_from_int(value) {
            Some(converted) => converted,
            None => panic!("integer literal {value} is not representable in the scalar field"),
        }
    }
}

impl<T: FromPrimitive> HasIntegerConstructor for T {
    fn try_from_int(value: i64) -> Option<Self> {
        T::from_i64(value)
    }
}

pub trait HasRealConstructor: Sized {
    /// `None` when `value` has no representation in the field.
    fn try_from_real(value: f64) -> Option<Self>;

    /// Literal constructor for values known to fit.
    ///
    /// # Panics
    ///
    /// Panics when `value` is not representable, e.g. `NaN` in an integer field.
    fn from_real(value: f64) -> Self {
        match Self::try_from_real(value) {
            Some(converted) => converted,
            None => panic!("real literal {value} is not representable in the scalar field"),
        }
    }
}

impl<T: FromPrimitive> HasRealConstructor for T {
    fn try_from_real(value: f64) -> Option<Self> {
        T::from_f64(value)
    }
}

pub trait HasAdditiveIdentity: Sized {
    fn additive_identity() -> Self;
}

impl<T: Zero> HasAdditiveIdentity for T {
    fn additive_identity() -> Self {
        T::zero()
    }
}

pub trait HasMultiplicativeIdentity: Sized {
    fn multiplicative_identity() -> Self;
}

impl<T: One> HasMultiplicativeIdentity for T {
    fn multiplicative_identity() -> Self {
        T::one()
    }
}

/// Element type of a vector space: a field with literal constructors.
///
/// `Num` and `FromPrimitive` are carried as supertraits so that compound
/// types built over a scalar (such as `Complex<T>`) are scalars too.
pub trait Scalar:
    Copy
    + PartialEq
    + Debug
    + Num
    + FromPrimitive
    + Addable
    + Subtractable
    + Multipliable
    + Dividable
    + Negatable
    + HasIntegerConstructor
    + HasRealConstructor
    + HasAdditiveIdentity
    + HasMultiplicativeIdentity
    + 'static
{
}

impl<T> Scalar for T where
    T: Copy + PartialEq + Debug + Num + Neg<Output = T> + FromPrimitive + 'static
{
}

/// Magnitude of a value, measured in a real field.
pub trait HasAbs {
    type Real: RealScalar;

    fn abs_value(&self) -> Self::Real;
}

macro_rules! real_abs {
    ($($t:ty),*) => {
        $(
            impl HasAbs for $t {
                type Real = $t;

                fn abs_value(&self) -> $t {
                    self.abs()
                }
            }
        )*
    };
}

real_abs!(f32, f64);

impl<T: RealScalar> HasAbs for Complex<T> {
    type Real = T;

    fn abs_value(&self) -> T {
        self.norm()
    }
}

/// Involution used by inner products and adjoints. Identity on real types.
pub trait Conjugate {
    fn conjugate(&self) -> Self;
}

macro_rules! real_conjugate {
    ($($t:ty),*) => {
        $(
            impl Conjugate for $t {
                fn conjugate(&self) -> $t {
                    *self
                }
            }
        )*
    };
}

real_conjugate!(f32, f64, i32, i64);

impl<T: Clone + Num + Neg<Output = T>> Conjugate for Complex<T> {
    fn conjugate(&self) -> Self {
        self.conj()
    }
}

/// A number with real and imaginary parts drawn from an underlying field.
///
/// Arithmetic comes from the parts; the transcendental helpers are only
/// available when the underlying field is a floating type.
pub trait ComplexNumber: Scalar + Conjugate {
    type Field: Scalar;

    fn from_parts(real: Self::Field, imag: Self::Field) -> Self;

    fn real(&self) -> Self::Field;

    fn imag(&self) -> Self::Field;

    fn from_real_part(real: Self::Field) -> Self {
        Self::from_parts(real, Self::Field::zero())
    }

    /// Squared modulus, `re² + im²`.
    fn norm_squared(&self) -> Self::Field {
        self.real() * self.real() + self.imag() * self.imag()
    }

    fn modulus(&self) -> Self::Field
    where
        Self::Field: Float,
    {
        self.norm_squared().sqrt()
    }

    fn argument(&self) -> Self::Field
    where
        Self::Field: Float,
    {
        self.imag().atan2(self.real())
    }

    fn from_polar_parts(modulus: Self::Field, argument: Self::Field) -> Self
    where
        Self::Field: Float,
    {
        Self::from_parts(modulus * argument.cos(), modulus * argument.sin())
    }

    fn exponential(&self) -> Self
    where
        Self::Field: Float,
    {
        let scale = self.real().exp();
        Self::from_parts(scale * self.imag().cos(), scale * self.imag().sin())
    }

    /// Principal square root.
    fn principal_sqrt(&self) -> Self
    where
        Self::Field: Float,
    {
        let two = Self::Field::one() + Self::Field::one();
        Self::from_polar_parts(self.modulus().sqrt(), self.argument() / two)
    }
}

impl<T: Scalar> ComplexNumber for Complex<T> {
    type Field = T;

    fn from_parts(real: T, imag: T) -> Self {
        Complex::new(real, imag)
    }

    fn real(&self) -> T {
        self.re
    }

    fn imag(&self) -> T {
        self.im
    }
}

/// Exponentiation by squaring with an explicit identity element.
pub fn power<T: Multipliable + Clone>(x: T, n: u32, identity: T) -> T {
    match n {
        0 => identity,
        1 => x,
        n if n % 2 == 0 => power(x.clone() * x, n / 2, identity),
        n => x.clone() * power(x.clone() * x, (n - 1) / 2, identity),
    }
}

/// Exponentiation by squaring for types that know their own identity.
pub fn power_of<T: Multipliable + HasMultiplicativeIdentity + Clone>(x: T, n: u32) -> T {
    power(x, n, T::multiplicative_identity())
}

/// Folds `items` left to right with `op`. Returns `None` for an empty slice.
pub fn repeatedly<T: Clone>(items: &[T], op: impl Fn(T, T) -> T) -> Option<T> {
    let (first, rest) = items.split_first()?;
    Some(rest.iter().cloned().fold(first.clone(), op))
}

/// Sum of one or more values.
pub fn sum_all<A: Addable + Clone>(items: &[A]) -> Option<A> {
    repeatedly(items, |acc, item| acc + item)
}

/// Promotes a slice of real values to complex values with zero imaginary part.
pub fn complexify<T: Scalar>(values: &[T]) -> Vec<Complex<T>> {
    values.iter().map(|&re| Complex::new(re, T::zero())).collect()
}
