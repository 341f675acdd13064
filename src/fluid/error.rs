//! Setup errors for the fluid simulation.
//!
//! Every variant is raised while building or calibrating a simulation. Ticks
//! themselves never fail: numerical trouble is reported through
//! [`super::diagnostics`] instead.

use thiserror::Error;

/// Fatal configuration errors detected before the first tick.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum FluidError {
    /// The fluid population cannot be split into whole work groups.
    #[error("fluid particle count {particles} is not divisible by work-group width {workgroup}")]
    WorkgroupMismatch { particles: usize, workgroup: u32 },

    /// A work-group width of zero was configured.
    #[error("work-group width must be at least 1")]
    InvalidWorkgroup,

    /// A numeric parameter is outside its accepted range.
    #[error("invalid parameter `{name}`: {value}")]
    InvalidParameter { name: &'static str, value: f32 },

    /// Boundary samples do not define a positive spacing.
    #[error("boundary geometry of {count} points has no positive spacing")]
    DegenerateBoundary { count: usize },

    /// No fluid particles were supplied.
    #[error("simulation needs at least one fluid particle")]
    EmptyPopulation,
}

/// Convenience alias used by setup functions.
pub type FluidResult<T> = Result<T, FluidError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_workgroup_message() {
        let err = FluidError::WorkgroupMismatch {
            particles: 10,
            workgroup: 4,
        };
        assert_eq!(
            err.to_string(),
            "fluid particle count 10 is not divisible by work-group width 4"
        );
    }
}
