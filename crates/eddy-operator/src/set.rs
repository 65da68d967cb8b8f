//! [`OperatorSet`]: the bundle of collaborators driving one simulation.

use std::fmt;

use crate::boundary::BoundaryFill;
use crate::convection::Convection;
use crate::derived::DerivedQuantities;
use crate::diffusion::DiffusionSolve;
use crate::projection::Projection;

/// One instance of each collaborator, stored as trait objects.
pub struct OperatorSet {
    /// Ghost-cell refresh.
    pub boundary: Box<dyn BoundaryFill>,
    /// Advective term.
    pub convection: Box<dyn Convection>,
    /// Implicit viscous update.
    pub diffusion: Box<dyn DiffusionSolve>,
    /// Pressure projection.
    pub projection: Box<dyn Projection>,
    /// Strain rate, viscosity and diagnostics.
    pub derived: Box<dyn DerivedQuantities>,
}

impl OperatorSet {
    /// Bundle five collaborators.
    pub fn new(
        boundary: impl BoundaryFill,
        convection: impl Convection,
        diffusion: impl DiffusionSolve,
        projection: impl Projection,
        derived: impl DerivedQuantities,
    ) -> Self {
        Self {
            boundary: Box::new(boundary),
            convection: Box::new(convection),
            diffusion: Box::new(diffusion),
            projection: Box::new(projection),
            derived: Box::new(derived),
        }
    }

    /// Collaborator names in call order within a stage.
    pub fn names(&self) -> [&str; 5] {
        [
            self.boundary.name(),
            self.convection.name(),
            self.derived.name(),
            self.diffusion.name(),
            self.projection.name(),
        ]
    }
}

impl fmt::Debug for OperatorSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OperatorSet")
            .field("boundary", &self.boundary.name())
            .field("convection", &self.convection.name())
            .field("diffusion", &self.diffusion.name())
            .field("projection", &self.projection.name())
            .field("derived", &self.derived.name())
            .finish()
    }
}
