//! Field kinds and the named field slots carried by every level.

use std::fmt;

/// Number of spatial dimensions. Vector fields carry this many components.
pub const SPACEDIM: usize = 3;

/// The shape of the value stored at each cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FieldKind {
    /// One `f64` per cell.
    Scalar,
    /// [`SPACEDIM`] `f64` components per cell.
    Vector3,
}

impl FieldKind {
    /// Number of `f64` components per cell for this kind.
    pub fn components(&self) -> usize {
        match self {
            Self::Scalar => 1,
            Self::Vector3 => SPACEDIM,
        }
    }
}

/// The fields every level state owns.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum LevelField {
    /// Velocity at the new time.
    Velocity,
    /// Velocity at the start of the step.
    VelocityOld,
    /// Advective term `-(u.grad)u` of the corrector stage.
    Convection,
    /// Advective term `-(u.grad)u` of the predictor stage.
    ConvectionOld,
    /// Pressure.
    Pressure,
    /// Pressure gradient, lagged into the next stage as explicit forcing.
    PressureGradient,
    /// Density.
    Density,
    /// Effective viscosity.
    Viscosity,
    /// Magnitude of the strain-rate tensor.
    StrainRate,
}

impl LevelField {
    /// Every slot, in declaration order.
    pub const ALL: [LevelField; 9] = [
        Self::Velocity,
        Self::VelocityOld,
        Self::Convection,
        Self::ConvectionOld,
        Self::Pressure,
        Self::PressureGradient,
        Self::Density,
        Self::Viscosity,
        Self::StrainRate,
    ];

    /// The value shape stored in this slot.
    pub fn kind(&self) -> FieldKind {
        match self {
            Self::Velocity
            | Self::VelocityOld
            | Self::Convection
            | Self::ConvectionOld
            | Self::PressureGradient => FieldKind::Vector3,
            Self::Pressure | Self::Density | Self::Viscosity | Self::StrainRate => {
                FieldKind::Scalar
            }
        }
    }

    /// Short lowercase name, as used in logs and plot variables.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Velocity => "vel",
            Self::VelocityOld => "vel_old",
            Self::Convection => "conv",
            Self::ConvectionOld => "conv_old",
            Self::Pressure => "p",
            Self::PressureGradient => "gp",
            Self::Density => "ro",
            Self::Viscosity => "eta",
            Self::StrainRate => "strainrate",
        }
    }
}

impl fmt::Display for LevelField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vector_slots_have_three_components() {
        assert_eq!(LevelField::Velocity.kind().components(), 3);
        assert_eq!(LevelField::PressureGradient.kind().components(), 3);
        assert_eq!(LevelField::Density.kind().components(), 1);
    }

    #[test]
    fn slot_names_are_unique() {
        let mut names: Vec<_> = LevelField::ALL.iter().map(|f| f.name()).collect();
        names.sort_unstable();
        names.dedup();
        assert_eq!(names.len(), LevelField::ALL.len());
    }
}
