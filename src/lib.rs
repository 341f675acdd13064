//! Spira SPH - particle fluid simulation for Bevy
//!
//! This library provides a Smoothed Particle Hydrodynamics solver with a
//! data-parallel tick pipeline. It runs headless; rendering only needs the
//! packed particle buffers it exposes.
//!
//! # Features
//!
//! - **SPH Simulation**: poly6 density, symmetrized spiky pressure force, viscosity diffusion
//! - **Parallel Dispatch**: rayon kernels with a barrier between stages
//! - **Boundary Handling**: reflective box or sampled boundary particles
//! - **Calibration**: smoothing radius derived from boundary sample spacing
//! - **Easy Integration**: Simple Bevy plugin interface
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use bevy::prelude::*;
//! use spira_sph::prelude::*;
//!
//! fn main() {
//!     App::new()
//!         .add_plugins(MinimalPlugins)
//!         .add_plugins(FluidPlugin::default())
//!         .add_systems(Startup, setup)
//!         .run();
//! }
//!
//! fn setup(mut commands: Commands, params: Res<FluidParams>) {
//!     let lattice = FluidLattice::new(UVec3::new(8, 16, 16), 1.0);
//!     if let Ok(simulation) =
//!         FluidSimulation::from_lattice(&lattice, &Transform::IDENTITY, Vec::new(), &params)
//!     {
//!         commands.insert_resource(simulation);
//!     }
//! }
//! ```

pub mod fluid;

/// Prelude for convenient imports.
pub mod prelude {
    pub use crate::fluid::prelude::*;
}
