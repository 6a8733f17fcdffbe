//! Time evolution of a state under a time-independent Hamiltonian.
//!
//! Integrates `dψ/dt = -i H ψ` with the adaptive driver. The generator
//! `-iH` is built once and may be moved to a sparse format.

use crate::error::fail_fast;
use crate::integrate::{integrate_with, IntegrationReport, IntegratorSettings};
use crate::matrix::Matrix;
use crate::operator::{Operator, OperatorRepresentation, RepresentationKind};
use crate::space::ensure_same_space;
use crate::traits::RealScalar;
use crate::vector::Vector;
use anyhow::{bail, Context, Result};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct EvolutionSettings<R> {
    pub min_step: R,
    pub accuracy: R,
}

impl Default for EvolutionSettings<f64> {
    fn default() -> Self {
        Self {
            min_step: 1.0e-8,
            accuracy: 1.0e-5,
        }
    }
}

#[derive(Debug, Clone)]
pub struct SchrodingerSystem<R: RealScalar> {
    psi: Vector<Complex<R>>,
    generator: OperatorRepresentation<Complex<R>>,
    time: R,
    settings: EvolutionSettings<R>,
}

impl SchrodingerSystem<f64> {
    /// A system at `t = 0` with the default settings.
    pub fn new(
        initial_state: Vector<Complex<f64>>,
        hamiltonian: &Matrix<Complex<f64>>,
    ) -> Result<Self> {
        Self::with_settings(initial_state, hamiltonian, EvolutionSettings::default())
    }
}

impl<R: RealScalar> SchrodingerSystem<R> {
    pub fn with_settings(
        initial_state: Vector<Complex<R>>,
        hamiltonian: &Matrix<Complex<R>>,
        settings: EvolutionSettings<R>,
    ) -> Result<Self> {
        ensure_same_space(&initial_state, hamiltonian)
            .context("Initial state and Hamiltonian must share a space.")?;
        let minus_i = Complex::new(R::zero(), -R::one());
        Ok(Self {
            psi: initial_state,
            generator: OperatorRepresentation::Dense(hamiltonian.scale(minus_i)),
            time: R::zero(),
            settings,
        })
    }

    /// Switches the storage format of `-iH`.
    pub fn use_representation(&mut self, kind: RepresentationKind) {
        debug!(from = ?self.generator.kind(), to = ?kind, "switching generator representation");
        self.generator = self.generator.converted(kind);
    }

    pub fn representation(&self) -> RepresentationKind {
        self.generator.kind()
    }

    pub fn state(&self) -> &Vector<Complex<R>> {
        &self.psi
    }

    pub fn time(&self) -> R {
        self.time
    }

    pub fn settings(&self) -> &EvolutionSettings<R> {
        &self.settings
    }

    /// Right-hand side `-iH ψ`.
    pub fn schrodinger_equation(&self, psi: &Vector<Complex<R>>) -> Vector<Complex<R>> {
        fail_fast(self.generator.apply(psi))
    }

    /// Advances the state by `dt`, using `dt` as the first trial step.
    pub fn evolve(&mut self, dt: R) -> Result<IntegrationReport<R>> {
        if dt == R::zero() || !dt.is_finite() {
            bail!("Evolution step must be non-zero and finite.");
        }
        let from = self.time;
        let to = from + dt;
        let settings = IntegratorSettings::new(dt, self.settings.min_step, self.settings.accuracy);
        let generator = &self.generator;
        let rhs = |_t: R, psi: &Vector<Complex<R>>| fail_fast(generator.apply(psi));
        let report = integrate_with(&settings, from, to, &mut self.psi, rhs)
            .context("Schrödinger evolution failed.")?;

        if report.completed() {
            self.time = to;
        } else {
            warn!(outcome = ?report.outcome, time = ?report.end_time, "evolution stopped early");
            self.time = report.end_time;
        }
        Ok(report)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::space::VectorSpace;
    use approx::assert_abs_diff_eq;

    type C = Complex<f64>;

    fn assert_err_contains<T: std::fmt::Debug>(result: Result<T>, needle: &str) {
        let err = result.expect_err("expected error");
        let message = format!("{err:#}");
        assert!(
            message.contains(needle),
            "expected error to contain \"{needle}\", got \"{message}\""
        );
    }

    fn two_level() -> (Vector<C>, Matrix<C>) {
        let space = VectorSpace::new(2, "two level").expect("space");
        let (o, l) = (C::new(0.0, 0.0), C::new(1.0, 0.0));
        let up = Vector::from_elements(vec![l, o], &space).expect("up");
        let sigma_x = Matrix::from_elements(vec![o, l, l, o], &space).expect("sigma x");
        (up, sigma_x)
    }

    #[test]
    fn rabi_oscillation_preserves_the_norm() {
        let (up, sigma_x) = two_level();
        let mut system = SchrodingerSystem::new(up, &sigma_x).expect("same space");
        for _ in 0..10 {
            let report = system.evolve(0.1).expect("valid step");
            assert!(report.completed());
            assert_abs_diff_eq!(system.state().norm(), 1.0, epsilon = 1e-4);
        }
        assert_abs_diff_eq!(system.time(), 1.0, epsilon = 1e-12);

        let population_up = system.state().elements()[0].norm_sqr();
        assert_abs_diff_eq!(population_up, 1.0f64.cos().powi(2), epsilon = 1e-4);
    }

    #[test]
    fn every_representation_gives_the_same_evolution() {
        let (up, sigma_x) = two_level();
        let mut reference = SchrodingerSystem::new(up.clone(), &sigma_x).expect("same space");
        reference.evolve(0.5).expect("valid step");

        for kind in [RepresentationKind::Sparse, RepresentationKind::DiagonalSparse] {
            let mut system = SchrodingerSystem::new(up.clone(), &sigma_x).expect("same space");
            system.use_representation(kind);
            assert_eq!(system.representation(), kind);
            system.evolve(0.5).expect("valid step");
            assert!(system.state().approx_eq(reference.state(), 1e-9));
        }
    }

    #[test]
    fn rejects_mismatched_spaces_and_empty_steps() {
        let (up, sigma_x) = two_level();
        let elsewhere = VectorSpace::new(2, "elsewhere").expect("space");
        let stray = Vector::<C>::zeros(&elsewhere);
        assert_err_contains(SchrodingerSystem::new(stray, &sigma_x), "must share a space");

        let mut system = SchrodingerSystem::new(up, &sigma_x).expect("same space");
        assert_err_contains(system.evolve(0.0), "non-zero");
        assert_eq!(system.time(), 0.0);
    }

    #[test]
    fn right_hand_side_is_minus_i_h_psi() {
        let (up, sigma_x) = two_level();
        let system = SchrodingerSystem::new(up.clone(), &sigma_x).expect("same space");
        let rhs = system.schrodinger_equation(&up);
        assert_eq!(rhs.elements(), &[C::new(0.0, 0.0), C::new(0.0, -1.0)]);
    }
}
