//! Time integration.
//!
//! Semi-implicit Euler with velocity damping:
//! `v ← (v + dt a) · damping`, then `x ← x + dt v`, then boundary handling.
//! A zero step is the identity, boundary handling included.

use bevy::prelude::*;

use super::params::{BoundaryMode, FluidParams};
use super::particle::FluidParticle;

/// Output of the integration stage for one particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct IntegrationSample {
    pub position: Vec3,
    pub velocity: Vec3,
}

/// Integration kernel for one particle.
pub fn integrate(particle: &FluidParticle, params: &FluidParams, dt: f32) -> IntegrationSample {
    if dt == 0.0 {
        return IntegrationSample {
            position: particle.position,
            velocity: particle.velocity,
        };
    }

    let mut velocity = (particle.velocity + dt * particle.acceleration) * params.damping_factor(dt);
    let mut position = particle.position + dt * velocity;

    match &params.boundary_mode {
        BoundaryMode::ReflectiveBox(bounds) => bounds.apply_collision(&mut position, &mut velocity),
        BoundaryMode::BoundaryParticles => {}
    }

    IntegrationSample { position, velocity }
}
