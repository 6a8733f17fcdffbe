//! Adaptive step-size driver built on the Cash-Karp embedded step.

use crate::solvers::{cash_karp_step, CashKarpStep};
use crate::traits::{AdaptiveIntegrand, RealScalar};
use anyhow::{bail, Result};
use num_traits::{Float, One, Zero};
use serde::{Deserialize, Serialize};
use std::fmt;
use tracing::{debug, warn};

/// Iteration cap of [`integrate`].
pub const MAX_STEPS: usize = 10_000;

const SAFETY: f64 = 0.9;
const PGROW: f64 = -0.2;
const PSHRNK: f64 = -0.25;
const ERRCON: f64 = 1.89e-4;
const TINY: f64 = 1.0e-30;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct IntegratorSettings<R> {
    /// First step tried; its sign is corrected if it points away from the end point.
    pub initial_step: R,
    /// Proposed steps at or below this magnitude are reported.
    pub min_step: R,
    /// Tolerated error relative to each component's scale.
    pub accuracy: R,
    pub max_steps: usize,
}

impl<R> IntegratorSettings<R> {
    pub fn new(initial_step: R, min_step: R, accuracy: R) -> Self {
        Self {
            initial_step,
            min_step,
            accuracy,
            max_steps: MAX_STEPS,
        }
    }
}

impl Default for IntegratorSettings<f64> {
    fn default() -> Self {
        Self::new(1.0e-2, 0.0, 1.0e-6)
    }
}

/// Non-fatal numerical problems met while integrating.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum IntegrationDiagnostic<R> {
    /// Shrinking the step no longer moves the independent variable.
    StepSizeUnderflow { time: R, step: R },
    /// The proposed next step is no larger than the minimum step.
    StepBelowMinimum { time: R, step: R },
    /// The iteration cap was reached before the end point.
    TooManySteps { steps: usize },
}

impl<R: fmt::Display> fmt::Display for IntegrationDiagnostic<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::StepSizeUnderflow { time, step } => {
                write!(f, "step-size underflow at t = {time} (h = {step})")
            }
            Self::StepBelowMinimum { time, step } => {
                write!(f, "step size too small at t = {time} (h = {step})")
            }
            Self::TooManySteps { steps } => write!(f, "too many steps ({steps})"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum IntegrationOutcome {
    Completed,
    StepSizeUnderflow,
    IterationLimit,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IntegrationReport<R> {
    pub outcome: IntegrationOutcome,
    /// Where the independent variable stopped.
    pub end_time: R,
    pub accepted_steps: usize,
    pub rejected_steps: usize,
    /// Size of the last accepted step.
    pub last_step: R,
    /// Step size proposed for a continuation.
    pub next_step: R,
    pub diagnostics: Vec<IntegrationDiagnostic<R>>,
}

impl<R> IntegrationReport<R> {
    pub fn completed(&self) -> bool {
        self.outcome == IntegrationOutcome::Completed
    }
}

/// Integrates `state` from `from` to `to` with adaptive step-size control.
///
/// On return `state` holds the value at the end point, or the last accepted
/// value if integration stopped early; the report says which.
pub fn integrate<Y, F>(
    from: Y::Time,
    to: Y::Time,
    initial_step: Y::Time,
    min_step: Y::Time,
    accuracy: Y::Time,
    state: &mut Y,
    derivs: F,
) -> Result<IntegrationReport<Y::Time>>
where
    Y: AdaptiveIntegrand,
    Y::Time: RealScalar,
    F: FnMut(Y::Time, &Y) -> Y,
{
    let settings = IntegratorSettings::new(initial_step, min_step, accuracy);
    integrate_with(&settings, from, to, state, derivs)
}

pub fn integrate_with<Y, F>(
    settings: &IntegratorSettings<Y::Time>,
    from: Y::Time,
    to: Y::Time,
    state: &mut Y,
    mut derivs: F,
) -> Result<IntegrationReport<Y::Time>>
where
    Y: AdaptiveIntegrand,
    Y::Time: RealScalar,
    F: FnMut(Y::Time, &Y) -> Y,
{
    let zero = Y::Time::zero();
    if !from.is_finite() || !to.is_finite() {
        bail!("Integration bounds must be finite.");
    }
    if !(settings.accuracy > zero) || !settings.accuracy.is_finite() {
        bail!("accuracy must be positive.");
    }
    if settings.initial_step == zero || !settings.initial_step.is_finite() {
        bail!("initial_step must be non-zero and finite.");
    }
    if !(settings.min_step >= zero) {
        bail!("min_step must be non-negative.");
    }
    if settings.max_steps == 0 {
        bail!("max_steps must be greater than zero.");
    }

    let mut report = IntegrationReport {
        outcome: IntegrationOutcome::Completed,
        end_time: from,
        accepted_steps: 0,
        rejected_steps: 0,
        last_step: zero,
        next_step: settings.initial_step,
        diagnostics: Vec::new(),
    };
    if from == to {
        return Ok(report);
    }

    let tiny = real::<Y::Time>(TINY);
    let mut x = from;
    let mut h = settings.initial_step;
    let mut y = state.clone();

    for _ in 0..settings.max_steps {
        let dydx = derivs(x, &y);
        let scale: Vec<Y::Time> = y
            .component_magnitudes()
            .into_iter()
            .zip(dydx.component_magnitudes())
            .map(|(value, slope)| value + slope * h.abs() + tiny)
            .collect();

        if (x + h - to) * (x + h - from) > zero {
            h = to - x;
        }

        let step = quality_step(&mut y, &dydx, &mut x, h, settings.accuracy, &scale, &mut derivs);
        report.rejected_steps += step.rejected;
        report.end_time = x;

        let Some((did, next)) = step.accepted else {
            warn!(time = ?x, step = ?step.last_tried, "step-size underflow");
            report.diagnostics.push(IntegrationDiagnostic::StepSizeUnderflow {
                time: x,
                step: step.last_tried,
            });
            report.outcome = IntegrationOutcome::StepSizeUnderflow;
            *state = y;
            return Ok(report);
        };

        report.accepted_steps += 1;
        report.last_step = did;
        report.next_step = next;
        debug!(time = ?x, step = ?did, next = ?next, "accepted step");

        if (x - to) * (to - from) >= zero {
            *state = y;
            return Ok(report);
        }
        if next * next <= settings.min_step * settings.min_step {
            warn!(time = ?x, step = ?next, "step size too small");
            report
                .diagnostics
                .push(IntegrationDiagnostic::StepBelowMinimum { time: x, step: next });
        }
        h = next;
    }

    warn!(steps = settings.max_steps, "too many steps");
    report
        .diagnostics
        .push(IntegrationDiagnostic::TooManySteps { steps: settings.max_steps });
    report.outcome = IntegrationOutcome::IterationLimit;
    *state = y;
    Ok(report)
}

fn real<R: RealScalar>(value: f64) -> R {
    R::from_f64(value).unwrap_or_else(R::nan)
}

struct QualityStep<R> {
    /// `(step taken, step proposed next)`, or `None` on step-size underflow.
    accepted: Option<(R, R)>,
    last_tried: R,
    rejected: usize,
}

/// Tries Cash-Karp steps from `x`, shrinking the step until the scaled error
/// is within `accuracy`, then advances `x` and `y`.
fn quality_step<Y, F>(
    y: &mut Y,
    dydx: &Y,
    x: &mut Y::Time,
    htry: Y::Time,
    accuracy: Y::Time,
    scale: &[Y::Time],
    derivs: &mut F,
) -> QualityStep<Y::Time>
where
    Y: AdaptiveIntegrand,
    Y::Time: RealScalar,
    F: FnMut(Y::Time, &Y) -> Y,
{
    let zero = Y::Time::zero();
    let one = Y::Time::one();
    let ten = real::<Y::Time>(10.0);
    let mut h = htry;
    let mut rejected = 0;

    loop {
        let CashKarpStep { y_out, y_err } = cash_karp_step(*x, h, y, Some(dydx), derivs);
        let errmax = y_err
            .component_magnitudes()
            .into_iter()
            .zip(scale)
            .fold(zero, |max, (err, &s)| {
                let ratio = err / s;
                if ratio > max || ratio.is_nan() {
                    ratio
                } else {
                    max
                }
            })
            / accuracy;

        // NaN compares false, so a poisoned error estimate is a rejection.
        if !(errmax <= one) {
            rejected += 1;
            let shrunk = real::<Y::Time>(SAFETY) * h * errmax.powf(real(PSHRNK));
            h = if h >= zero { shrunk.max(h / ten) } else { shrunk.min(h / ten) };
            if *x + h == *x {
                return QualityStep {
                    accepted: None,
                    last_tried: h,
                    rejected,
                };
            }
            continue;
        }

        let next = if errmax > real(ERRCON) {
            real::<Y::Time>(SAFETY) * h * errmax.powf(real(PGROW))
        } else {
            real::<Y::Time>(5.0) * h
        };
        *x = *x + h;
        *y = y_out;
        return QualityStep {
            accepted: Some((h, next)),
            last_tried: h,
            rejected,
        };
    }
}
