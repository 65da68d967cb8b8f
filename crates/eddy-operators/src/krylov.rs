//! Preconditioned conjugate gradient on flattened interior vectors.
//!
//! Iteration:
//!
//! 1. `r = b - A x`, `z = M^-1 r`, `p = z`
//! 2. `alpha = (r, z) / (p, A p)`
//! 3. `x += alpha p`, `r -= alpha A p`
//! 4. stop when `||r|| <= max(rtol * ||b||, atol)`
//! 5. `z = M^-1 r`, `beta = (r, z)_new / (r, z)_old`, `p = z + beta p`
//!
//! `M` is the diagonal of `A` (Jacobi) or the identity.

/// Solver settings.
#[derive(Clone, Debug, PartialEq)]
pub struct CgConfig {
    /// Tolerance relative to `||b||`. Default: 1e-10.
    pub rtol: f64,
    /// Absolute tolerance on `||r||`. Default: 1e-14.
    pub atol: f64,
    /// Iteration cap. Default: 1000.
    pub max_iter: usize,
    /// Use the operator diagonal as preconditioner. Default: true.
    pub jacobi: bool,
}

impl Default for CgConfig {
    fn default() -> Self {
        Self {
            rtol: 1e-10,
            atol: 1e-14,
            max_iter: 1000,
            jacobi: true,
        }
    }
}

/// What a solve achieved.
#[derive(Clone, Debug, PartialEq)]
pub struct CgOutcome {
    /// Whether the stopping criterion was met.
    pub converged: bool,
    /// Iterations performed.
    pub iterations: usize,
    /// Final residual 2-norm.
    pub residual_norm: f64,
    /// Residual 2-norm of the initial guess.
    pub initial_residual_norm: f64,
    /// `(p, A p)` was not positive: the operator is not SPD on the
    /// search space.
    pub breakdown: bool,
}

impl CgOutcome {
    /// Final residual relative to the initial one.
    pub fn relative_residual(&self) -> f64 {
        if self.initial_residual_norm > 0.0 {
            self.residual_norm / self.initial_residual_norm
        } else {
            0.0
        }
    }
}

/// A symmetric positive (semi-)definite operator.
pub trait LinearOperator {
    /// Length of the vectors the operator acts on.
    fn dimension(&self) -> usize;

    /// `y = A x`.
    fn apply(&mut self, x: &[f64], y: &mut [f64]);

    /// Diagonal of `A`, for Jacobi preconditioning.
    fn diagonal(&self) -> Option<&[f64]> {
        None
    }
}

fn dot(a: &[f64], b: &[f64]) -> f64 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn precondition(diag: Option<&[f64]>, r: &[f64], z: &mut [f64]) {
    match diag {
        Some(d) => {
            for ((zi, ri), di) in z.iter_mut().zip(r).zip(d) {
                *zi = if *di > 0.0 { ri / di } else { *ri };
            }
        }
        None => z.copy_from_slice(r),
    }
}

/// Solve `A x = b` starting from the contents of `x`.
///
/// # Panics
///
/// Panics if `b` or `x` does not have length `op.dimension()`.
pub fn conjugate_gradient<A: LinearOperator>(
    op: &mut A,
    b: &[f64],
    x: &mut [f64],
    config: &CgConfig,
) -> CgOutcome {
    let n = op.dimension();
    assert_eq!(b.len(), n, "rhs length");
    assert_eq!(x.len(), n, "solution length");

    let mut r = vec![0.0; n];
    let mut z = vec![0.0; n];
    let mut ap = vec![0.0; n];

    op.apply(x, &mut ap);
    for i in 0..n {
        r[i] = b[i] - ap[i];
    }
    let b_norm = dot(b, b).sqrt();
    let tol = (config.rtol * b_norm).max(config.atol);
    let mut r_norm = dot(&r, &r).sqrt();
    let initial = r_norm;
    let mut outcome = CgOutcome {
        converged: r_norm <= tol,
        iterations: 0,
        residual_norm: r_norm,
        initial_residual_norm: initial,
        breakdown: false,
    };
    if outcome.converged {
        return outcome;
    }

    let diag: Option<Vec<f64>> = if config.jacobi {
        op.diagonal().map(<[f64]>::to_vec)
    } else {
        None
    };
    precondition(diag.as_deref(), &r, &mut z);
    let mut p = z.clone();
    let mut rz = dot(&r, &z);

    for it in 1..=config.max_iter {
        op.apply(&p, &mut ap);
        let pap = dot(&p, &ap);
        if !(pap > 0.0) {
            outcome.breakdown = true;
            outcome.iterations = it;
            return outcome;
        }
        let alpha = rz / pap;
        for i in 0..n {
            x[i] += alpha * p[i];
            r[i] -= alpha * ap[i];
        }
        r_norm = dot(&r, &r).sqrt();
        outcome.iterations = it;
        outcome.residual_norm = r_norm;
        if r_norm <= tol {
            outcome.converged = true;
            return outcome;
        }
        precondition(diag.as_deref(), &r, &mut z);
        let rz_new = dot(&r, &z);
        let beta = rz_new / rz;
        rz = rz_new;
        for i in 0..n {
            p[i] = z[i] + beta * p[i];
        }
    }
    outcome
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Dense symmetric matrix for testing.
    struct Dense {
        a: Vec<Vec<f64>>,
        diag: Vec<f64>,
    }

    impl Dense {
        fn new(a: Vec<Vec<f64>>) -> Self {
            let diag = (0..a.len()).map(|i| a[i][i]).collect();
            Self { a, diag }
        }
    }

    impl LinearOperator for Dense {
        fn dimension(&self) -> usize {
            self.a.len()
        }

        fn apply(&mut self, x: &[f64], y: &mut [f64]) {
            for (yi, row) in y.iter_mut().zip(&self.a) {
                *yi = dot(row, x);
            }
        }

        fn diagonal(&self) -> Option<&[f64]> {
            Some(&self.diag)
        }
    }

    fn tridiagonal(n: usize) -> Dense {
        let mut a = vec![vec![0.0; n]; n];
        for i in 0..n {
            a[i][i] = 4.0;
            if i > 0 {
                a[i][i - 1] = -1.0;
            }
            if i + 1 < n {
                a[i][i + 1] = -1.0;
            }
        }
        Dense::new(a)
    }

    #[test]
    fn solves_spd_system() {
        let mut op = tridiagonal(20);
        let expected: Vec<f64> = (0..20).map(|i| (i as f64).sin()).collect();
        let mut b = vec![0.0; 20];
        op.apply(&expected, &mut b);
        let mut x = vec![0.0; 20];
        let out = conjugate_gradient(&mut op, &b, &mut x, &CgConfig::default());
        assert!(out.converged, "{out:?}");
        assert!(out.iterations <= 20);
        for (xi, ei) in x.iter().zip(&expected) {
            assert!((xi - ei).abs() < 1e-8);
        }
    }

    #[test]
    fn exact_initial_guess_needs_no_iterations() {
        let mut op = tridiagonal(5);
        let mut x = vec![1.0; 5];
        let mut b = vec![0.0; 5];
        op.apply(&x.clone(), &mut b);
        let out = conjugate_gradient(&mut op, &b, &mut x, &CgConfig::default());
        assert!(out.converged);
        assert_eq!(out.iterations, 0);
        assert_eq!(out.relative_residual(), 0.0);
    }

    #[test]
    fn reports_exhausted_iterations() {
        let mut op = tridiagonal(50);
        let b = vec![1.0; 50];
        let mut x = vec![0.0; 50];
        let config = CgConfig {
            max_iter: 2,
            jacobi: false,
            ..CgConfig::default()
        };
        let out = conjugate_gradient(&mut op, &b, &mut x, &config);
        assert!(!out.converged);
        assert!(!out.breakdown);
        assert_eq!(out.iterations, 2);
        assert!(out.residual_norm < out.initial_residual_norm);
    }

    #[test]
    fn detects_indefinite_operator() {
        let mut op = Dense::new(vec![vec![-1.0, 0.0], vec![0.0, -2.0]]);
        let mut x = vec![0.0; 2];
        let out = conjugate_gradient(&mut op, &[1.0, 1.0], &mut x, &CgConfig {
            jacobi: false,
            ..CgConfig::default()
        });
        assert!(out.breakdown);
        assert!(!out.converged);
    }
}
