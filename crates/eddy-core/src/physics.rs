//! Physical constants of a run.
//!
//! [`PhysicsConfig`] is passed by reference to every component that needs
//! gravity, the background pressure gradient, the reference density or
//! the rheology model.

use std::error::Error;
use std::fmt;

use crate::field::SPACEDIM;
use crate::rheology::{FluidModel, RheologyError};

/// Errors detected by [`PhysicsConfig::validate`].
#[derive(Clone, Debug, PartialEq)]
pub enum PhysicsError {
    /// Reference density is not finite and positive.
    InvalidDensity {
        /// The rejected value.
        value: f64,
    },
    /// A component of a body-force vector is NaN or infinite.
    NonFiniteVector {
        /// Which vector (`gravity` or `gp0`).
        name: &'static str,
        /// Offending component.
        component: usize,
    },
    /// A domain length used to derive `gp0` is not positive.
    InvalidLength {
        /// Axis of the rejected length.
        axis: usize,
        /// The rejected value.
        value: f64,
    },
    /// The rheology model is invalid.
    Rheology(RheologyError),
}

impl fmt::Display for PhysicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidDensity { value } => {
                write!(f, "ro_0 must be finite and positive, got {value}")
            }
            Self::NonFiniteVector { name, component } => {
                write!(f, "{name}[{component}] is not finite")
            }
            Self::InvalidLength { axis, value } => {
                write!(f, "domain length on axis {axis} must be positive, got {value}")
            }
            Self::Rheology(e) => write!(f, "rheology: {e}"),
        }
    }
}

impl Error for PhysicsError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Rheology(e) => Some(e),
            _ => None,
        }
    }
}

impl From<RheologyError> for PhysicsError {
    fn from(e: RheologyError) -> Self {
        Self::Rheology(e)
    }
}

/// Physical parameters shared by the time-step controller, the
/// integrator and the derived-quantity update.
#[derive(Clone, Debug, PartialEq)]
pub struct PhysicsConfig {
    /// Gravitational acceleration. Default: zero.
    pub gravity: [f64; SPACEDIM],
    /// Background pressure gradient, applied as a momentum sink
    /// `-dt * gp0` every stage. Default: zero.
    pub gp0: [f64; SPACEDIM],
    /// Reference density used to initialize the density field. Default: 1.
    pub ro_0: f64,
    /// Rheology model. Default: Newtonian with `mu = 1`.
    pub fluid: FluidModel,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: [0.0; SPACEDIM],
            gp0: [0.0; SPACEDIM],
            ro_0: 1.0,
            fluid: FluidModel::default(),
        }
    }
}

impl PhysicsConfig {
    /// Derive the background pressure gradient from an imposed pressure
    /// drop across the domain: `gp0[d] = -delp[d] / length[d]`.
    pub fn with_pressure_drop(
        mut self,
        delp: [f64; SPACEDIM],
        lengths: [f64; SPACEDIM],
    ) -> Result<Self, PhysicsError> {
        for (axis, &len) in lengths.iter().enumerate() {
            if !(len.is_finite() && len > 0.0) {
                return Err(PhysicsError::InvalidLength { axis, value: len });
            }
        }
        for d in 0..SPACEDIM {
            self.gp0[d] = -delp[d] / lengths[d];
        }
        Ok(self)
    }

    /// Check structural invariants.
    ///
    /// Rheology parameters are validated when the model is built, so only
    /// the scalar and vector constants are checked here.
    pub fn validate(&self) -> Result<(), PhysicsError> {
        if !(self.ro_0.is_finite() && self.ro_0 > 0.0) {
            return Err(PhysicsError::InvalidDensity { value: self.ro_0 });
        }
        for (name, v) in [("gravity", &self.gravity), ("gp0", &self.gp0)] {
            if let Some(component) = v.iter().position(|x| !x.is_finite()) {
                return Err(PhysicsError::NonFiniteVector { name, component });
            }
        }
        Ok(())
    }
}
