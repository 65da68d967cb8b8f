//! Generalized-Newtonian fluid models.
//!
//! Every model maps a strain-rate magnitude to an effective viscosity
//! through [`FluidModel::viscosity`]. Parameters are validated when a model
//! is built, so an ill-posed model (for example a power law with `n == 1`)
//! never reaches a solve.

use std::error::Error;
use std::fmt;

/// Strain rates below this value are raised to it before evaluation.
///
/// Shear-thinning models diverge at zero strain rate.
pub const STRAIN_RATE_FLOOR: f64 = 1.0e-14;

/// Errors from rheology model construction.
#[derive(Clone, Debug, PartialEq)]
pub enum RheologyError {
    /// A parameter that must be strictly positive was not.
    NonPositive {
        /// Model being built.
        model: &'static str,
        /// Parameter name.
        param: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A parameter was NaN or infinite.
    NotFinite {
        /// Model being built.
        model: &'static str,
        /// Parameter name.
        param: &'static str,
        /// Rejected value.
        value: f64,
    },
    /// A flow index of exactly 1 was given to a model that would then
    /// reduce to a Newtonian or Bingham fluid.
    UnitFlowIndex {
        /// Model being built.
        model: &'static str,
    },
}

impl fmt::Display for RheologyError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NonPositive {
                model,
                param,
                value,
            } => write!(f, "{model}: {param} must be positive, got {value}"),
            Self::NotFinite {
                model,
                param,
                value,
            } => write!(f, "{model}: {param} must be finite, got {value}"),
            Self::UnitFlowIndex { model } => {
                write!(f, "{model}: flow index n must not be 1")
            }
        }
    }
}

impl Error for RheologyError {}

fn positive(model: &'static str, param: &'static str, value: f64) -> Result<f64, RheologyError> {
    if !value.is_finite() {
        return Err(RheologyError::NotFinite {
            model,
            param,
            value,
        });
    }
    if value <= 0.0 {
        return Err(RheologyError::NonPositive {
            model,
            param,
            value,
        });
    }
    Ok(value)
}

/// `(1 - exp(-x)) / x`, accurate down to `x = 0`.
fn expterm(x: f64) -> f64 {
    if x < 1.0e-9 {
        expterm_series(x)
    } else {
        -(-x).exp_m1() / x
    }
}

fn expterm_series(x: f64) -> f64 {
    1.0 - 0.5 * x + x * x / 6.0 - x * x * x / 24.0
}

// ── Parameter sets ─────────────────────────────────────────────────

/// Constant viscosity.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Newtonian {
    mu: f64,
}

impl Newtonian {
    /// Build a Newtonian fluid with dynamic viscosity `mu > 0`.
    pub fn new(mu: f64) -> Result<Self, RheologyError> {
        Ok(Self {
            mu: positive("newtonian", "mu", mu)?,
        })
    }

    /// Dynamic viscosity.
    pub fn mu(&self) -> f64 {
        self.mu
    }
}

impl Default for Newtonian {
    fn default() -> Self {
        Self { mu: 1.0 }
    }
}

/// Ostwald-de Waele power law, `eta = mu * sr^(n-1)`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PowerLaw {
    mu: f64,
    n: f64,
}

impl PowerLaw {
    /// Build a power-law fluid with consistency `mu > 0` and flow index
    /// `n > 0`, `n != 1`.
    pub fn new(mu: f64, n: f64) -> Result<Self, RheologyError> {
        let mu = positive("powerlaw", "mu", mu)?;
        let n = positive("powerlaw", "n", n)?;
        if n == 1.0 {
            return Err(RheologyError::UnitFlowIndex { model: "powerlaw" });
        }
        Ok(Self { mu, n })
    }

    /// Consistency.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Flow index.
    pub fn n(&self) -> f64 {
        self.n
    }
}

/// Regularized Bingham plastic (Papanastasiou regularization).
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bingham {
    mu: f64,
    tau_0: f64,
    papa_reg: f64,
}

impl Bingham {
    /// Build a Bingham fluid with plastic viscosity `mu`, yield stress
    /// `tau_0` and regularization strain rate `papa_reg`, all positive.
    pub fn new(mu: f64, tau_0: f64, papa_reg: f64) -> Result<Self, RheologyError> {
        Ok(Self {
            mu: positive("bingham", "mu", mu)?,
            tau_0: positive("bingham", "tau_0", tau_0)?,
            papa_reg: positive("bingham", "papa_reg", papa_reg)?,
        })
    }

    /// Plastic viscosity.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Yield stress.
    pub fn tau_0(&self) -> f64 {
        self.tau_0
    }

    /// Regularization strain rate.
    pub fn papa_reg(&self) -> f64 {
        self.papa_reg
    }
}

/// Regularized Herschel-Bulkley fluid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct HerschelBulkley {
    mu: f64,
    n: f64,
    tau_0: f64,
    papa_reg: f64,
}

impl HerschelBulkley {
    /// Build a Herschel-Bulkley fluid. All parameters must be positive and
    /// the flow index must not be 1.
    pub fn new(mu: f64, n: f64, tau_0: f64, papa_reg: f64) -> Result<Self, RheologyError> {
        let mu = positive("herschelbulkley", "mu", mu)?;
        let n = positive("herschelbulkley", "n", n)?;
        if n == 1.0 {
            return Err(RheologyError::UnitFlowIndex {
                model: "herschelbulkley",
            });
        }
        Ok(Self {
            mu,
            n,
            tau_0: positive("herschelbulkley", "tau_0", tau_0)?,
            papa_reg: positive("herschelbulkley", "papa_reg", papa_reg)?,
        })
    }

    /// Consistency.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Flow index.
    pub fn n(&self) -> f64 {
        self.n
    }

    /// Yield stress.
    pub fn tau_0(&self) -> f64 {
        self.tau_0
    }

    /// Regularization strain rate.
    pub fn papa_reg(&self) -> f64 {
        self.papa_reg
    }
}

/// de Souza Mendes-Dutra viscoplastic fluid.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SouzaMendesDutra {
    mu: f64,
    n: f64,
    tau_0: f64,
    eta_0: f64,
}

impl SouzaMendesDutra {
    /// Build a de Souza Mendes-Dutra fluid. All parameters must be positive.
    pub fn new(mu: f64, n: f64, tau_0: f64, eta_0: f64) -> Result<Self, RheologyError> {
        Ok(Self {
            mu: positive("smd", "mu", mu)?,
            n: positive("smd", "n", n)?,
            tau_0: positive("smd", "tau_0", tau_0)?,
            eta_0: positive("smd", "eta_0", eta_0)?,
        })
    }

    /// Consistency.
    pub fn mu(&self) -> f64 {
        self.mu
    }

    /// Flow index.
    pub fn n(&self) -> f64 {
        self.n
    }

    /// Yield stress.
    pub fn tau_0(&self) -> f64 {
        self.tau_0
    }

    /// Zero-shear viscosity.
    pub fn eta_0(&self) -> f64 {
        self.eta_0
    }
}

// ── FluidModel ─────────────────────────────────────────────────────

/// A validated fluid model.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum FluidModel {
    /// Constant viscosity.
    Newtonian(Newtonian),
    /// Power-law fluid.
    PowerLaw(PowerLaw),
    /// Regularized Bingham plastic.
    Bingham(Bingham),
    /// Regularized Herschel-Bulkley fluid.
    HerschelBulkley(HerschelBulkley),
    /// de Souza Mendes-Dutra fluid.
    SouzaMendesDutra(SouzaMendesDutra),
}

impl Default for FluidModel {
    fn default() -> Self {
        Self::Newtonian(Newtonian::default())
    }
}

impl FluidModel {
    /// Model name as used in run logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Newtonian(_) => "newtonian",
            Self::PowerLaw(_) => "powerlaw",
            Self::Bingham(_) => "bingham",
            Self::HerschelBulkley(_) => "herschelbulkley",
            Self::SouzaMendesDutra(_) => "smd",
        }
    }

    /// Whether the viscosity is independent of the strain rate.
    pub fn is_newtonian(&self) -> bool {
        matches!(self, Self::Newtonian(_))
    }

    /// Effective viscosity at strain-rate magnitude `strain_rate`.
    ///
    /// Negative and NaN strain rates are treated as zero; values below
    /// [`STRAIN_RATE_FLOOR`] are raised to it.
    pub fn viscosity(&self, strain_rate: f64) -> f64 {
        let sr = if strain_rate > STRAIN_RATE_FLOOR {
            strain_rate
        } else {
            STRAIN_RATE_FLOOR
        };
        match self {
            Self::Newtonian(m) => m.mu,
            Self::PowerLaw(m) => m.mu * sr.powf(m.n - 1.0),
            Self::Bingham(m) => m.mu + m.tau_0 * expterm(sr / m.papa_reg) / m.papa_reg,
            Self::HerschelBulkley(m) => {
                (m.mu * sr.powf(m.n) + m.tau_0) * expterm(sr / m.papa_reg) / m.papa_reg
            }
            Self::SouzaMendesDutra(m) => {
                let ramp = -(-m.eta_0 * sr / m.tau_0).exp_m1();
                ramp * (m.tau_0 / sr + m.mu * sr.powf(m.n - 1.0))
            }
        }
    }
}

impl From<Newtonian> for FluidModel {
    fn from(m: Newtonian) -> Self {
        Self::Newtonian(m)
    }
}

impl From<PowerLaw> for FluidModel {
    fn from(m: PowerLaw) -> Self {
        Self::PowerLaw(m)
    }
}

impl From<Bingham> for FluidModel {
    fn from(m: Bingham) -> Self {
        Self::Bingham(m)
    }
}

impl From<HerschelBulkley> for FluidModel {
    fn from(m: HerschelBulkley) -> Self {
        Self::HerschelBulkley(m)
    }
}

impl From<SouzaMendesDutra> for FluidModel {
    fn from(m: SouzaMendesDutra) -> Self {
        Self::SouzaMendesDutra(m)
    }
}
