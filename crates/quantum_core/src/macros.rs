// Operator impls shared by the vector and matrix representations. Each type
// provides `try_*` methods; the operators forward to them and panic on a
// contract violation.

macro_rules! checked_binop {
    ($ty:ident, $trait:ident, $method:ident, $checked:ident) => {
        impl<'a, 'b, T: $crate::algebra::Scalar> std::ops::$trait<&'b $ty<T>> for &'a $ty<T> {
            type Output = $ty<T>;

            #[track_caller]
            fn $method(self, rhs: &'b $ty<T>) -> $ty<T> {
                $crate::error::fail_fast(self.$checked(rhs))
            }
        }

        impl<T: $crate::algebra::Scalar> std::ops::$trait for $ty<T> {
            type Output = $ty<T>;

            #[track_caller]
            fn $method(self, rhs: $ty<T>) -> $ty<T> {
                $crate::error::fail_fast(self.$checked(&rhs))
            }
        }
    };
}

macro_rules! scalar_ops {
    ($ty:ident) => {
        impl<T: $crate::algebra::Scalar> std::ops::Neg for $ty<T> {
            type Output = $ty<T>;

            fn neg(self) -> $ty<T> {
                self.negated()
            }
        }

        impl<'a, T: $crate::algebra::Scalar> std::ops::Neg for &'a $ty<T> {
            type Output = $ty<T>;

            fn neg(self) -> $ty<T> {
                self.negated()
            }
        }

        impl<T: $crate::algebra::Scalar> std::ops::Mul<T> for $ty<T> {
            type Output = $ty<T>;

            fn mul(self, rhs: T) -> $ty<T> {
                self.scale(rhs)
            }
        }

        impl<'a, T: $crate::algebra::Scalar> std::ops::Mul<T> for &'a $ty<T> {
            type Output = $ty<T>;

            fn mul(self, rhs: T) -> $ty<T> {
                self.scale(rhs)
            }
        }

        impl<T: $crate::algebra::Scalar> std::ops::Div<T> for $ty<T> {
            type Output = $ty<T>;

            fn div(self, rhs: T) -> $ty<T> {
                self.divide(rhs)
            }
        }

        impl<'a, T: $crate::algebra::Scalar> std::ops::Div<T> for &'a $ty<T> {
            type Output = $ty<T>;

            fn div(self, rhs: T) -> $ty<T> {
                self.divide(rhs)
            }
        }

        left_scalar_mul!($ty, f32, f64);
        left_scalar_mul!($ty, num_complex::Complex<f32>, num_complex::Complex<f64>);
    };
}

// `scalar * value` cannot be written generically (orphan rules), so it is
// provided for the concrete scalar fields in use.
macro_rules! left_scalar_mul {
    ($ty:ident, $($scalar:ty),*) => {
        $(
            impl std::ops::Mul<$ty<$scalar>> for $scalar {
                type Output = $ty<$scalar>;

                fn mul(self, rhs: $ty<$scalar>) -> $ty<$scalar> {
                    rhs.scale(self)
                }
            }

            impl<'a> std::ops::Mul<&'a $ty<$scalar>> for $scalar {
                type Output = $ty<$scalar>;

                fn mul(self, rhs: &'a $ty<$scalar>) -> $ty<$scalar> {
                    rhs.scale(self)
                }
            }
        )*
    };
}
