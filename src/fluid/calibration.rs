//! One-time calibration from sampled boundary geometry.
//!
//! The characteristic spacing is the smallest positive distance from a
//! reference boundary sample (the middle one) to any other sample. The
//! smoothing radius follows from it; the remaining constants are tuned
//! values, not derived ones.

use bevy::prelude::*;

use super::error::{FluidError, FluidResult};
use super::params::FluidParams;
use super::particle::BoundaryParticle;

/// Tuned constants assigned during calibration.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct CalibrationConstants {
    pub spacing_multiplier: f32,
    pub rest_density: f32,
    pub boundary_mass: f32,
    pub fluid_mass: f32,
    pub wind: f32,
    pub pressure_min: f32,
    pub pressure_max: f32,
}

impl Default for CalibrationConstants {
    fn default() -> Self {
        Self {
            spacing_multiplier: 1.45,
            rest_density: 0.9,
            boundary_mass: 4.5,
            fluid_mass: 1.0,
            wind: 5.5,
            pressure_min: -20.0,
            pressure_max: 120.0,
        }
    }
}

/// Result of calibrating against a boundary sample set.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Calibration {
    /// Minimum positive distance from the reference sample.
    pub spacing: f32,
    /// `spacing * spacing_multiplier`.
    pub smoothing_radius: f32,
    pub constants: CalibrationConstants,
}

impl Calibration {
    /// Write the calibrated values into `params`.
    ///
    /// The spacing itself is stored, so h keeps following
    /// `spacing_multiplier` if that is tuned later.
    pub fn apply(&self, params: &mut FluidParams) {
        params.spacing_multiplier = self.constants.spacing_multiplier;
        params.boundary_spacing = Some(self.spacing);
        params.smoothing_radius = self.smoothing_radius;
        params.rest_density = self.constants.rest_density;
        params.boundary_mass = self.constants.boundary_mass;
        params.fluid_mass = self.constants.fluid_mass;
        params.wind = self.constants.wind;
        params.pressure_min = self.constants.pressure_min;
        params.pressure_max = self.constants.pressure_max;
    }
}

/// Smallest positive distance from the middle sample to any other sample.
pub fn boundary_spacing(boundary: &[BoundaryParticle]) -> FluidResult<f32> {
    let degenerate = || FluidError::DegenerateBoundary {
        count: boundary.len(),
    };

    if boundary.len() < 2 {
        return Err(degenerate());
    }

    let reference = boundary.len() / 2;
    let origin = boundary[reference].position;

    boundary
        .iter()
        .enumerate()
        .filter(|(i, _)| *i != reference)
        .map(|(_, p)| p.position.distance(origin))
        .filter(|d| *d > 0.0 && d.is_finite())
        .min_by(|a, b| a.total_cmp(b))
        .ok_or_else(degenerate)
}

/// Calibrate against `boundary` with the given tuned constants.
pub fn calibrate(
    boundary: &[BoundaryParticle],
    constants: CalibrationConstants,
) -> FluidResult<Calibration> {
    let spacing = boundary_spacing(boundary)?;
    let calibration = Calibration {
        spacing,
        smoothing_radius: spacing * constants.spacing_multiplier,
        constants,
    };

    info!(
        "calibrated {} boundary samples: spacing {:.4}, smoothing radius {:.4}",
        boundary.len(),
        calibration.spacing,
        calibration.smoothing_radius
    );

    Ok(calibration)
}
