//! Domain-face behaviour for box levels.

/// What lies beyond a domain face along one axis.
///
/// Ghost-cell fills and the reference solvers branch on this value. It
/// describes both the topology (periodic or not) and the homogeneous
/// boundary condition a face carries.
///
/// # Examples
///
/// ```
/// use eddy_space::EdgeBehavior;
///
/// assert!(EdgeBehavior::Wrap.is_periodic());
/// assert!(!EdgeBehavior::Absorb.is_periodic());
/// ```
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EdgeBehavior {
    /// Zero normal gradient: ghost cells copy the nearest interior cell.
    Clamp,
    /// Periodic: ghost cells copy the cell one domain length away.
    Wrap,
    /// Homogeneous Dirichlet: ghost cells hold zero.
    Absorb,
}

impl EdgeBehavior {
    /// Whether this face is periodic.
    pub fn is_periodic(&self) -> bool {
        matches!(self, Self::Wrap)
    }
}
