//! Smoothed Particle Hydrodynamics (SPH) fluid simulation module for Bevy.
//!
//! Every tick runs three data-parallel stages over the fluid population:
//! density and pressure from neighbor mass sums, pressure and viscosity
//! forces, then semi-implicit Euler integration. Static boundary particles
//! take part in the neighbor sums but are never integrated.
//!
//! # Architecture
//!
//! - [`kernels`]: poly6, spiky gradient and viscosity Laplacian kernels
//! - [`neighbors`]: radius queries (brute force and uniform grid)
//! - [`density`]: density summation and equations of state
//! - [`forces`]: symmetrized pressure force and viscosity diffusion
//! - [`integrator`]: time integration with friction damping
//! - [`boundary`]: reflective box and boundary sampling
//! - [`calibration`]: smoothing radius from sampled boundary spacing
//! - [`dispatch`]: serial and rayon kernel backends
//! - [`simulation`]: particle store and tick pipeline
//! - [`diagnostics`]: per-frame statistics
//! - [`plugin`]: Bevy plugin for easy integration
//!
//! # Example
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use spira_sph::fluid::prelude::*;
//!
//! let params = FluidParams::default();
//! let mut simulation = FluidSimulation::from_lattice(
//!     &FluidLattice::reference(),
//!     &Transform::IDENTITY,
//!     Vec::new(),
//!     &params,
//! )
//! .unwrap();
//!
//! for _ in 0..100 {
//!     simulation.tick(&params);
//! }
//! ```

pub mod boundary;
pub mod calibration;
pub mod density;
pub mod diagnostics;
pub mod dispatch;
pub mod error;
pub mod forces;
pub mod integrator;
pub mod kernels;
pub mod neighbors;
pub mod params;
pub mod particle;
pub mod plugin;
pub mod simulation;

/// Prelude for convenient imports.
pub mod prelude {
    pub use super::boundary::*;
    pub use super::calibration::*;
    pub use super::density::*;
    pub use super::diagnostics::*;
    pub use super::dispatch::*;
    pub use super::error::*;
    pub use super::forces::*;
    pub use super::integrator::*;
    pub use super::kernels::*;
    pub use super::neighbors::*;
    pub use super::params::*;
    pub use super::particle::*;
    pub use super::plugin::*;
    pub use super::simulation::*;
}
