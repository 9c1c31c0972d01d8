//! Bounded quasi-Newton minimiser used by the numerical inverse kinematics.
//!
//! This is a projected BFGS method over a box: the gradient is taken by central
//! differences, variables sitting on a bound with the gradient pushing outward are
//! frozen (active set), and every trial point is clamped back into the box.
//! The objective only needs to be a smooth function of a few variables, which is
//! what the position error of a planar arm is.

use nalgebra::{DMatrix, DVector};
use tracing::trace;

/// Why the minimiser stopped.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Termination {
    /// Projected gradient is below `gtol`.
    GradientTolerance,
    /// Relative decrease of the objective is below `ftol`.
    FunctionTolerance,
    /// Iteration budget exhausted.
    MaxIterations,
    /// No descent step found even along the steepest descent direction.
    LineSearchFailed,
}

impl Termination {
    pub fn is_success(self) -> bool {
        matches!(self, Termination::GradientTolerance | Termination::FunctionTolerance)
    }
}

#[derive(Debug, Clone)]
pub struct OptimizationResult {
    /// Best point found, always inside the bounds.
    pub x: Vec<f64>,
    /// Objective value at `x`.
    pub fun: f64,
    pub success: bool,
    pub iterations: usize,
    pub termination: Termination,
}

/// Settings of the bounded BFGS minimiser.
#[derive(Debug, Clone, Copy)]
pub struct BoundedBfgs {
    pub max_iterations: usize,
    /// Stop when the infinity norm of the projected gradient drops to this value.
    pub gtol: f64,
    /// Stop when `f_old - f_new <= ftol * max(|f_old|, |f_new|, 1)`.
    pub ftol: f64,
    /// Step of the central difference gradient.
    pub gradient_step: f64,
    /// Largest change of any single variable per iteration.
    pub max_step: f64,
    /// Sufficient decrease constant of the Armijo condition.
    pub armijo: f64,
    pub max_backtracks: usize,
}

impl Default for BoundedBfgs {
    fn default() -> Self {
        BoundedBfgs {
            max_iterations: 2000,
            gtol: 1e-9,
            ftol: 1e-12,
            gradient_step: 1e-6,
            max_step: 1.0,
            armijo: 1e-4,
            max_backtracks: 30,
        }
    }
}

impl BoundedBfgs {
    /// Minimise `f` starting from `x0` with every variable kept in `[lower[i], upper[i]]`.
    /// The start point is clamped into the box first. If the three slices differ in
    /// length, only as many variables as the shortest one holds are optimised and `f`
    /// receives (and the result holds) that many values.
    pub fn minimize<F>(&self, f: F, x0: &[f64], lower: &[f64], upper: &[f64]) -> OptimizationResult
    where
        F: Fn(&[f64]) -> f64,
    {
        let n = x0.len().min(lower.len()).min(upper.len());
        if n < x0.len() {
            trace!("Bounds cover {} of {} variables, the rest is dropped", n, x0.len());
        }
        let clamp = |x: &DVector<f64>| -> DVector<f64> {
            DVector::from_fn(n, |i, _| x[i].clamp(lower[i], upper[i]))
        };
        let eval = |x: &DVector<f64>| f(x.as_slice());

        let mut x = clamp(&DVector::from_column_slice(&x0[..n]));
        let mut fx = eval(&x);
        let mut g = self.gradient(&eval, &x);
        let mut h = DMatrix::<f64>::identity(n, n);
        let mut fresh = true;

        let finish = |x: DVector<f64>, fun: f64, iterations: usize, termination: Termination| {
            trace!(
                "Minimiser stopped after {} iterations: {:?}, f = {:e}",
                iterations, termination, fun
            );
            OptimizationResult {
                x: x.as_slice().to_vec(),
                fun,
                success: termination.is_success(),
                iterations,
                termination,
            }
        };

        for iteration in 0..self.max_iterations {
            let free: Vec<bool> = (0..n)
                .map(|i| !((x[i] <= lower[i] && g[i] > 0.0) || (x[i] >= upper[i] && g[i] < 0.0)))
                .collect();

            let projected_gradient = (0..n)
                .filter(|&i| free[i])
                .map(|i| g[i].abs())
                .fold(0.0, f64::max);
            if projected_gradient <= self.gtol {
                return finish(x, fx, iteration, Termination::GradientTolerance);
            }

            let mut direction = self.direction(&h, &g, &free);
            if g.dot(&direction) >= 0.0 {
                // Curvature information went stale, restart from steepest descent
                h = DMatrix::identity(n, n);
                fresh = true;
                direction = self.direction(&h, &g, &free);
            }

            let largest = direction.amax();
            let mut alpha = if largest > 0.0 { (self.max_step / largest).min(1.0) } else { 1.0 };

            let mut accepted = None;
            for _ in 0..self.max_backtracks {
                let candidate = clamp(&(&x + &direction * alpha));
                let f_candidate = eval(&candidate);
                if f_candidate <= fx + self.armijo * g.dot(&(&candidate - &x)) {
                    accepted = Some((candidate, f_candidate));
                    break;
                }
                alpha *= 0.5;
            }

            let Some((x_new, f_new)) = accepted else {
                if fresh {
                    return finish(x, fx, iteration, Termination::LineSearchFailed);
                }
                h = DMatrix::identity(n, n);
                fresh = true;
                continue;
            };

            let g_new = self.gradient(&eval, &x_new);
            let s = &x_new - &x;
            let y = &g_new - &g;
            let sy = s.dot(&y);
            if sy > 1e-12 {
                if fresh {
                    h = DMatrix::identity(n, n) * (sy / y.dot(&y));
                }
                let rho = 1.0 / sy;
                let hy = &h * &y;
                let yhy = y.dot(&hy);
                h += (&s * s.transpose()) * (rho * rho * yhy + rho)
                    - (&hy * s.transpose() + &s * hy.transpose()) * rho;
                fresh = false;
            }

            let converged = fx - f_new <= self.ftol * fx.abs().max(f_new.abs()).max(1.0);
            x = x_new;
            fx = f_new;
            g = g_new;
            if converged {
                return finish(x, fx, iteration + 1, Termination::FunctionTolerance);
            }
        }

        finish(x, fx, self.max_iterations, Termination::MaxIterations)
    }

    fn gradient<E>(&self, eval: &E, x: &DVector<f64>) -> DVector<f64>
    where
        E: Fn(&DVector<f64>) -> f64,
    {
        let step = self.gradient_step;
        DVector::from_fn(x.len(), |i, _| {
            let mut forward = x.clone();
            let mut backward = x.clone();
            forward[i] += step;
            backward[i] -= step;
            (eval(&forward) - eval(&backward)) / (2.0 * step)
        })
    }

    /// Quasi-Newton direction restricted to the free variables.
    fn direction(&self, h: &DMatrix<f64>, g: &DVector<f64>, free: &[bool]) -> DVector<f64> {
        let n = g.len();
        DVector::from_fn(n, |i, _| {
            if !free[i] {
                return 0.0;
            }
            -(0..n).filter(|&j| free[j]).map(|j| h[(i, j)] * g[j]).sum::<f64>()
        })
    }
}
