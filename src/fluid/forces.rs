//! Force stage.
//!
//! Pressure force uses the symmetrized form
//! `F_i = -Σ_j m_ij (p_i + p_j) / (2 ρ_ij) ∇W(x_i - x_j, h)`, where `m_ij`
//! and `ρ_ij` are pair means. For equal densities this is the classic
//! `m_j (p_i + p_j) / (2 ρ_j)` weighting, and for any densities the pair
//! forces are equal and opposite. The spiky gradient already points from
//! `i` towards `j`, so with positive pressure the force pushes `i` away
//! from `j`. Viscosity uses the same pair means.
//!
//! Boundary neighbors carry no density or pressure of their own: they are
//! treated as sitting at rest density with the fluid particle's pressure
//! mirrored onto them, and with zero velocity. Their mass is
//! `boundary_mass`, read every tick.

use bevy::prelude::*;

use super::kernels::KernelCoefficients;
use super::neighbors::{NeighborQuery, ParticleRef};
use super::params::FluidParams;
use super::particle::FluidParticle;

/// Output of the force stage for one particle.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct ForceSample {
    pub pressure_force: Vec3,
    pub viscosity_force: Vec3,
    pub acceleration: Vec3,
}

/// Field values of one fluid particle as seen by the pair sums.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ParticleState {
    pub mass: f32,
    pub density: f32,
    pub pressure: f32,
    pub velocity: Vec3,
}

impl From<&FluidParticle> for ParticleState {
    fn from(p: &FluidParticle) -> Self {
        Self {
            mass: p.mass,
            density: p.density,
            pressure: p.pressure,
            velocity: p.velocity,
        }
    }
}

/// Pressure force exerted on fluid particle `i` by fluid neighbor `j`.
///
/// Masses and densities enter as pair means, so swapping `i` and `j` only
/// flips the gradient and the pair forces cancel exactly.
#[inline]
pub fn pressure_contribution(i: &ParticleState, j: &ParticleState, gradient: Vec3) -> Vec3 {
    let mass = 0.5 * (i.mass + j.mass);
    -mass * (i.pressure + j.pressure) / (i.density + j.density) * gradient
}

/// Viscosity force exerted on fluid particle `i` by fluid neighbor `j`,
/// before the resistance factor.
#[inline]
pub fn viscosity_contribution(i: &ParticleState, j: &ParticleState, laplacian: f32) -> Vec3 {
    (i.mass + j.mass) * (j.velocity - i.velocity) / (i.density + j.density) * laplacian
}

/// Pressure force from a boundary neighbor at rest density that mirrors
/// the fluid particle's pressure.
#[inline]
pub fn boundary_pressure_contribution(
    pressure_i: f32,
    boundary_mass: f32,
    rest_density: f32,
    gradient: Vec3,
) -> Vec3 {
    -boundary_mass * pressure_i / rest_density * gradient
}

/// No-slip viscosity against a static boundary neighbor.
#[inline]
pub fn boundary_viscosity_contribution(
    velocity_i: Vec3,
    boundary_mass: f32,
    rest_density: f32,
    laplacian: f32,
) -> Vec3 {
    -boundary_mass * velocity_i / rest_density * laplacian
}

/// Force-stage kernel for fluid particle `i`.
///
/// Reads densities and pressures committed by the density stage.
pub fn forces(
    query: &NeighborQuery,
    i: usize,
    params: &FluidParams,
    coeffs: &KernelCoefficients,
) -> ForceSample {
    let fluid = query.fluid();
    let particle = &fluid[i];
    let state = ParticleState::from(particle);
    let mut pressure_force = Vec3::ZERO;
    let mut diffusion = Vec3::ZERO;

    query.for_each_neighbor(i, |n| {
        let gradient = coeffs.pressure_gradient(n.offset, n.distance);
        let laplacian = coeffs.viscosity(n.distance);

        match n.particle {
            ParticleRef::Fluid(j) => {
                let neighbor = ParticleState::from(&fluid[j]);
                pressure_force += pressure_contribution(&state, &neighbor, gradient);
                diffusion += viscosity_contribution(&state, &neighbor, laplacian);
            }
            ParticleRef::Boundary(_) => {
                pressure_force += boundary_pressure_contribution(
                    particle.pressure,
                    params.boundary_mass,
                    params.rest_density,
                    gradient,
                );
                diffusion += boundary_viscosity_contribution(
                    particle.velocity,
                    params.boundary_mass,
                    params.rest_density,
                    laplacian,
                );
            }
        }
    });

    let viscosity_force = params.viscosity * diffusion;
    let external_force = particle.density * params.external_acceleration();
    let acceleration = (pressure_force + viscosity_force + external_force) / particle.density;

    ForceSample {
        pressure_force,
        viscosity_force,
        acceleration,
    }
}
