use crate::algebra::{Addable, Dividable, HasIntegerConstructor};
use num_traits::{Float, FromPrimitive};
use std::fmt::Debug;

/// A real, ordered floating type usable as an independent variable or as the
/// field a magnitude is measured in.
pub trait RealScalar: Float + FromPrimitive + Debug + 'static {}

impl<T: Float + FromPrimitive + Debug + 'static> RealScalar for T {}

/// Independent variable of a fixed-step method: it must be possible to
/// advance it and to take integer fractions of a step.
pub trait StepVariable: Copy + Addable + Dividable + HasIntegerConstructor {}

impl<T: Copy + Addable + Dividable + HasIntegerConstructor> StepVariable for T {}

/// A value that an ODE integrator can advance: it can be added to another
/// value of the same kind and scaled by the independent variable.
pub trait Integrand: Clone {
    /// Type of the independent variable (usually time).
    type Time: Copy;

    fn ode_add(&self, rhs: &Self) -> Self;

    fn ode_scale(&self, factor: Self::Time) -> Self;
}

/// An integrand whose components can be measured, as required by adaptive
/// step-size control.
pub trait AdaptiveIntegrand: Integrand {
    /// Magnitude of every component, in component order.
    fn component_magnitudes(&self) -> Vec<Self::Time>;
}

/// A solver that can step a state forward.
pub trait Steppable<Y: Integrand> {
    /// Performs one step of size dt.
    /// t: current time (updated after step)
    /// state: current state (updated after step)
    fn step<F>(&mut self, derivative: &mut F, t: &mut Y::Time, state: &mut Y, dt: Y::Time)
    where
        F: FnMut(Y::Time, &Y) -> Y;
}
