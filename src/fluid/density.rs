//! Density and pressure stage.
//!
//! `density_i = floor + Σ_j m_j W(|x_i - x_j|, h)` over fluid and boundary
//! neighbors, followed by the equation of state. Pressure is allowed to go
//! negative.

use super::kernels::KernelCoefficients;
use super::neighbors::{NeighborQuery, ParticleRef};
use super::params::{EquationOfState, FluidParams};

impl EquationOfState {
    /// Pressure at `density` for the given stiffness parameters.
    #[inline]
    pub fn pressure(&self, density: f32, rest_density: f32, gas_constant: f32, exponent: f32) -> f32 {
        match self {
            EquationOfState::Linear => gas_constant * (density - rest_density),
            EquationOfState::Exponent => {
                gas_constant * ((density / rest_density).powf(exponent) - 1.0)
            }
        }
    }
}

impl FluidParams {
    /// Pressure at `density` under the configured equation of state.
    #[inline]
    pub fn pressure_at(&self, density: f32) -> f32 {
        self.equation_of_state
            .pressure(density, self.rest_density, self.gas_constant, self.exponent)
    }
}

/// Output of the density stage for one particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DensitySample {
    pub density: f32,
    pub pressure: f32,
}

/// Kernel-weighted mass sum around fluid particle `i`, plus the floor.
pub fn density_at(
    query: &NeighborQuery,
    i: usize,
    density_floor: f32,
    boundary_mass: f32,
    coeffs: &KernelCoefficients,
) -> f32 {
    let fluid = query.fluid();
    let mut density = density_floor;

    query.for_each_neighbor(i, |n| {
        let mass = match n.particle {
            ParticleRef::Fluid(j) => fluid[j].mass,
            ParticleRef::Boundary(_) => boundary_mass,
        };
        density += mass * coeffs.density(n.distance);
    });

    density
}

/// Density-stage kernel for fluid particle `i`.
pub fn density_pressure(
    query: &NeighborQuery,
    i: usize,
    params: &FluidParams,
    coeffs: &KernelCoefficients,
) -> DensitySample {
    let density = density_at(query, i, params.density_floor, params.boundary_mass, coeffs);
    DensitySample {
        density,
        pressure: params.pressure_at(density),
    }
}
