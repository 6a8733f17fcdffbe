use crate::algebra::HasIntegerConstructor;
use crate::traits::{Integrand, RealScalar, StepVariable, Steppable};
use num_traits::{Float, FromPrimitive};

/// `Σ weight_i * y_i`, starting from `first`.
fn weighted_sum<Y: Integrand>(first: (Y::Time, &Y), rest: &[(Y::Time, &Y)]) -> Y {
    rest.iter()
        .fold(first.1.ode_scale(first.0), |sum, &(weight, y)| sum.ode_add(&y.ode_scale(weight)))
}

/// `y + h Σ weight_i * k_i`.
fn stage<Y>(y: &Y, h: Y::Time, terms: &[(Y::Time, &Y)]) -> Y
where
    Y: Integrand,
    Y::Time: RealScalar,
{
    terms
        .iter()
        .fold(y.clone(), |sum, &(weight, k)| sum.ode_add(&k.ode_scale(weight * h)))
}

fn derivative_at<Y, F>(t: Y::Time, y: &Y, dydx: Option<&Y>, derivs: &mut F) -> Y
where
    Y: Integrand,
    F: FnMut(Y::Time, &Y) -> Y,
{
    match dydx {
        Some(dydx) => dydx.clone(),
        None => derivs(t, y),
    }
}

/// Explicit Euler step, `y + h f(t, y)`. A precomputed derivative at `(t, y)`
/// may be passed in `dydx`.
pub fn euler_step<Y, F>(t: Y::Time, h: Y::Time, y: &Y, dydx: Option<&Y>, derivs: &mut F) -> Y
where
    Y: Integrand,
    F: FnMut(Y::Time, &Y) -> Y,
{
    let dydx = derivative_at(t, y, dydx, derivs);
    y.ode_add(&dydx.ode_scale(h))
}

/// Classical fourth-order Runge-Kutta step.
pub fn runge_kutta_step<Y, F>(t: Y::Time, h: Y::Time, y: &Y, dydx: Option<&Y>, derivs: &mut F) -> Y
where
    Y: Integrand,
    Y::Time: StepVariable,
    F: FnMut(Y::Time, &Y) -> Y,
{
    let dydx = derivative_at(t, y, dydx, derivs);
    let hh = h / Y::Time::from_int(2);
    let h6 = h / Y::Time::from_int(6);
    let xh = t + hh;

    // k2 and k3 at the midpoint, k4 at the far end.
    let yt = y.ode_add(&dydx.ode_scale(hh));
    let dyt = derivs(xh, &yt);
    let yt = y.ode_add(&dyt.ode_scale(hh));
    let dym = derivs(xh, &yt);
    let yt = y.ode_add(&dym.ode_scale(h));
    let dym = dym.ode_add(&dyt);
    let dyt = derivs(t + h, &yt);

    let sum = dydx.ode_add(&dyt).ode_add(&dym.ode_add(&dym));
    y.ode_add(&sum.ode_scale(h6))
}

/// Fifth-order solution and its embedded fourth-order error estimate.
#[derive(Debug, Clone, PartialEq)]
pub struct CashKarpStep<Y> {
    pub y_out: Y,
    pub y_err: Y,
}

/// One Cash-Karp (1990) embedded Runge-Kutta step.
pub fn cash_karp_step<Y, F>(
    t: Y::Time,
    h: Y::Time,
    y: &Y,
    dydx: Option<&Y>,
    derivs: &mut F,
) -> CashKarpStep<Y>
where
    Y: Integrand,
    Y::Time: RealScalar,
    F: FnMut(Y::Time, &Y) -> Y,
{
    let c = |value: f64| Y::Time::from_f64(value).unwrap_or_else(Y::Time::nan);

    let (a2, a3, a4, a5, a6) = (c(0.2), c(0.3), c(0.6), c(1.0), c(0.875));
    let b21 = c(0.2);
    let (b31, b32) = (c(3.0 / 40.0), c(9.0 / 40.0));
    let (b41, b42, b43) = (c(0.3), c(-0.9), c(1.2));
    let (b51, b52, b53, b54) = (c(-11.0 / 54.0), c(2.5), c(-70.0 / 27.0), c(35.0 / 27.0));
    let (b61, b62, b63, b64, b65) = (
        c(1631.0 / 55296.0),
        c(175.0 / 512.0),
        c(575.0 / 13824.0),
        c(44275.0 / 110592.0),
        c(253.0 / 4096.0),
    );
    let (c1, c3, c4, c6) = (c(37.0 / 378.0), c(250.0 / 621.0), c(125.0 / 594.0), c(512.0 / 1771.0));
    let dc1 = c1 - c(2825.0 / 27648.0);
    let dc3 = c3 - c(18575.0 / 48384.0);
    let dc4 = c4 - c(13525.0 / 55296.0);
    let dc5 = c(-277.0 / 14336.0);
    let dc6 = c6 - c(0.25);

    let k1 = derivative_at(t, y, dydx, derivs);

    let k2 = derivs(t + a2 * h, &stage(y, h, &[(b21, &k1)]));
    let k3 = derivs(t + a3 * h, &stage(y, h, &[(b31, &k1), (b32, &k2)]));
    let k4 = derivs(t + a4 * h, &stage(y, h, &[(b41, &k1), (b42, &k2), (b43, &k3)]));
    let k5 = derivs(t + a5 * h, &stage(y, h, &[(b51, &k1), (b52, &k2), (b53, &k3), (b54, &k4)]));
    let k6 = derivs(
        t + a6 * h,
        &stage(y, h, &[(b61, &k1), (b62, &k2), (b63, &k3), (b64, &k4), (b65, &k5)]),
    );

    let y_out = stage(y, h, &[(c1, &k1), (c3, &k3), (c4, &k4), (c6, &k6)]);
    let y_err =
        weighted_sum((dc1, &k1), &[(dc3, &k3), (dc4, &k4), (dc5, &k5), (dc6, &k6)]).ode_scale(h);
    CashKarpStep { y_out, y_err }
}

/// Forward Euler stepper.
#[derive(Debug, Clone, Copy, Default)]
pub struct Euler;

impl<Y> Steppable<Y> for Euler
where
    Y: Integrand,
    Y::Time: StepVariable,
{
    fn step<F>(&mut self, derivative: &mut F, t: &mut Y::Time, state: &mut Y, dt: Y::Time)
    where
        F: FnMut(Y::Time, &Y) -> Y,
    {
        *state = euler_step(*t, dt, state, None, derivative);
        *t = *t + dt;
    }
}

/// Classic Runge-Kutta 4th Order Solver
#[derive(Debug, Clone, Copy, Default)]
pub struct RungeKutta4;

impl<Y> Steppable<Y> for RungeKutta4
where
    Y: Integrand,
    Y::Time: StepVariable,
{
    fn step<F>(&mut self, derivative: &mut F, t: &mut Y::Time, state: &mut Y, dt: Y::Time)
    where
        F: FnMut(Y::Time, &Y) -> Y,
    {
        *state = runge_kutta_step(*t, dt, state, None, derivative);
        *t = *t + dt;
    }
}

/// Fixed-step Cash-Karp stepper. Keeps the error estimate of the last step.
#[derive(Debug, Clone)]
pub struct CashKarp<Y> {
    last_error: Option<Y>,
}

impl<Y> Default for CashKarp<Y> {
    fn default() -> Self {
        Self { last_error: None }
    }
}

impl<Y> CashKarp<Y> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_error(&self) -> Option<&Y> {
        self.last_error.as_ref()
    }
}

impl<Y> Steppable<Y> for CashKarp<Y>
where
    Y: Integrand,
    Y::Time: RealScalar,
{
    fn step<F>(&mut self, derivative: &mut F, t: &mut Y::Time, state: &mut Y, dt: Y::Time)
    where
        F: FnMut(Y::Time, &Y) -> Y,
    {
        let CashKarpStep { y_out, y_err } = cash_karp_step(*t, dt, state, None, derivative);
        *state = y_out;
        self.last_error = Some(y_err);
        *t = *t + dt;
    }
}
