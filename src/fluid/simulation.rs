//! Particle store and tick pipeline.
//!
//! A tick runs three stages over the whole fluid population, strictly in
//! order: density/pressure, forces, integration. Each stage is dispatched as
//! a data-parallel kernel that reads only the state committed by the
//! previous stage; its outputs are written back after the dispatch returns,
//! so no invocation ever sees a half-updated neighbor.

use bevy::prelude::*;

use super::density::density_pressure;
use super::diagnostics::FluidDiagnostics;
use super::dispatch::{validate_workgroup, workgroup_count, KernelStage};
use super::error::{FluidError, FluidResult};
use super::forces::forces;
use super::integrator::integrate;
use super::neighbors::{NeighborQuery, NeighborSearch, UniformGrid};
use super::params::FluidParams;
use super::particle::{
    BoundaryParticle, FluidLattice, FluidParticle, GpuBoundaryParticle, GpuFluidParticle,
};

/// Main fluid simulation resource.
///
/// Owns the fluid and boundary particles. Population sizes are fixed at
/// construction; boundary positions may be moved between ticks through
/// [`FluidSimulation::boundary_mut`].
#[derive(Resource)]
pub struct FluidSimulation {
    fluid: Vec<FluidParticle>,
    boundary: Vec<BoundaryParticle>,
    /// Seeded state restored by [`FluidSimulation::reset`].
    initial: Vec<FluidParticle>,
    grid: UniformGrid,
    ticks: u64,
    elapsed: f32,
}

impl FluidSimulation {
    /// Build a simulation from seeded particles.
    ///
    /// Fails if the parameters are out of range, if there is no fluid, if a
    /// fluid particle has no positive mass or if the fluid count is not a
    /// whole number of work groups.
    pub fn new(
        mut fluid: Vec<FluidParticle>,
        boundary: Vec<BoundaryParticle>,
        params: &FluidParams,
    ) -> FluidResult<Self> {
        params.validate()?;
        if fluid.is_empty() {
            return Err(FluidError::EmptyPopulation);
        }
        if let Some(p) = fluid.iter().find(|p| !(p.mass.is_finite() && p.mass > 0.0)) {
            return Err(FluidError::InvalidParameter {
                name: "particle mass",
                value: p.mass,
            });
        }
        validate_workgroup(fluid.len(), params.workgroup_size)?;

        let rest_pressure = params.pressure_at(params.density_floor);
        for p in &mut fluid {
            p.density = params.density_floor;
            p.pressure = rest_pressure;
        }

        info!(
            "fluid simulation ready: {} fluid particles in {} work groups, {} boundary particles",
            fluid.len(),
            workgroup_count(fluid.len(), params.workgroup_size),
            boundary.len()
        );

        Ok(Self {
            initial: fluid.clone(),
            fluid,
            boundary,
            grid: UniformGrid::new(),
            ticks: 0,
            elapsed: 0.0,
        })
    }

    /// Seed the fluid from a lattice placed with `transform`.
    pub fn from_lattice(
        lattice: &FluidLattice,
        transform: &Transform,
        boundary: Vec<BoundaryParticle>,
        params: &FluidParams,
    ) -> FluidResult<Self> {
        Self::new(lattice.spawn(transform, params.fluid_mass), boundary, params)
    }

    /// Returns the number of fluid particles.
    pub fn fluid_count(&self) -> usize {
        self.fluid.len()
    }

    /// Returns the number of boundary particles.
    pub fn boundary_count(&self) -> usize {
        self.boundary.len()
    }

    /// Read-only view of the fluid particles.
    pub fn fluid(&self) -> &[FluidParticle] {
        &self.fluid
    }

    /// Read-only view of the boundary particles.
    pub fn boundary(&self) -> &[BoundaryParticle] {
        &self.boundary
    }

    /// Externally driven boundary positions. Must not be changed mid-tick,
    /// which the borrow rules already guarantee.
    pub fn boundary_mut(&mut self) -> &mut [BoundaryParticle] {
        &mut self.boundary
    }

    /// Completed ticks since construction or the last reset.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Simulated time since construction or the last reset.
    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    /// Run one tick with the configured time step.
    pub fn tick(&mut self, params: &FluidParams) {
        self.advance(params, params.time_step);
    }

    /// Run one tick of length `dt`: density/pressure, forces, integration.
    ///
    /// Every parameter is read afresh, so changes to `params` between ticks
    /// (calibrated spacing multiplier, boundary mass, rest density, wind)
    /// take effect on the next tick.
    pub fn advance(&mut self, params: &FluidParams, dt: f32) {
        if params.neighbor_search == NeighborSearch::UniformGrid {
            self.grid
                .build(&self.fluid, &self.boundary, params.kernel_radius());
        }

        self.density_pressure_stage(params);
        self.force_stage(params);
        self.integrate_stage(params, dt);

        self.ticks += 1;
        self.elapsed += dt;
    }

    /// Run `fast_forward_substeps` ticks for one external frame and return
    /// the resulting diagnostics.
    pub fn step_frame(&mut self, params: &FluidParams) -> FluidDiagnostics {
        for _ in 0..params.fast_forward_substeps {
            self.tick(params);
        }

        let diagnostics = self.diagnostics(params);
        diagnostics.report();
        diagnostics
    }

    /// Statistics over the current fluid state.
    pub fn diagnostics(&self, params: &FluidParams) -> FluidDiagnostics {
        FluidDiagnostics::collect(&self.fluid, params, self.ticks)
    }

    /// Restore the seeded positions and velocities.
    pub fn reset(&mut self) {
        self.fluid.copy_from_slice(&self.initial);
        self.ticks = 0;
        self.elapsed = 0.0;
    }

    fn query(&self, params: &FluidParams) -> NeighborQuery<'_> {
        match params.neighbor_search {
            NeighborSearch::BruteForce => {
                NeighborQuery::brute_force(&self.fluid, &self.boundary, params.kernel_radius())
            }
            NeighborSearch::UniformGrid => NeighborQuery::with_grid(
                &self.fluid,
                &self.boundary,
                params.kernel_radius(),
                &self.grid,
            ),
        }
    }

    /// Stage 1: writes `density` and `pressure`.
    fn density_pressure_stage(&mut self, params: &FluidParams) {
        let coeffs = params.kernel_coefficients();
        let samples = {
            let query = self.query(params);
            params.backend.dispatch(
                KernelStage::DensityPressure,
                self.fluid.len(),
                params.workgroup_size,
                |i| density_pressure(&query, i, params, &coeffs),
            )
        };

        for (p, s) in self.fluid.iter_mut().zip(samples) {
            p.density = s.density;
            p.pressure = s.pressure;
        }
    }

    /// Stage 2: writes `pressure_force`, `viscosity_force` and `acceleration`.
    fn force_stage(&mut self, params: &FluidParams) {
        let coeffs = params.kernel_coefficients();
        let samples = {
            let query = self.query(params);
            params.backend.dispatch(
                KernelStage::Forces,
                self.fluid.len(),
                params.workgroup_size,
                |i| forces(&query, i, params, &coeffs),
            )
        };

        for (p, s) in self.fluid.iter_mut().zip(samples) {
            p.pressure_force = s.pressure_force;
            p.viscosity_force = s.viscosity_force;
            p.acceleration = s.acceleration;
        }
    }

    /// Stage 3: writes `velocity` and `position`.
    fn integrate_stage(&mut self, params: &FluidParams, dt: f32) {
        let fluid = &self.fluid;
        let samples = params.backend.dispatch(
            KernelStage::Integrate,
            fluid.len(),
            params.workgroup_size,
            |i| integrate(&fluid[i], params, dt),
        );

        for (p, s) in self.fluid.iter_mut().zip(samples) {
            p.velocity = s.velocity;
            p.position = s.position;
        }
    }

    /// Pressures mapped onto `[0, 1]` with the visualization bounds.
    pub fn normalized_pressures(&self, params: &FluidParams) -> Vec<f32> {
        self.fluid
            .iter()
            .map(|p| params.normalized_pressure(p.pressure))
            .collect()
    }

    /// Fluid state packed for a GPU structured buffer.
    pub fn gpu_particles(&self) -> Vec<GpuFluidParticle> {
        self.fluid.iter().map(GpuFluidParticle::from).collect()
    }

    /// Boundary positions packed for a GPU structured buffer.
    pub fn gpu_boundary(&self) -> Vec<GpuBoundaryParticle> {
        self.boundary.iter().map(GpuBoundaryParticle::from).collect()
    }
}

/// Advance `simulation` by one tick of length `dt`.
///
/// The caller owns the loop; this is the only entry point that mutates the
/// particle store.
pub fn advance(simulation: &mut FluidSimulation, params: &FluidParams, dt: f32) {
    simulation.advance(params, dt);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fluid::params::BoundaryMode;

    fn small_params() -> FluidParams {
        FluidParams::default().with_workgroup_size(1)
    }

    #[test]
    fn test_rejects_empty_population() {
        let result = FluidSimulation::new(Vec::new(), Vec::new(), &small_params());
        assert!(matches!(result, Err(FluidError::EmptyPopulation)));
    }

    #[test]
    fn test_rejects_partial_workgroup() {
        let fluid = vec![FluidParticle::new(Vec3::ZERO, 1.0); 300];
        let result = FluidSimulation::new(fluid, Vec::new(), &FluidParams::default());
        assert!(matches!(
            result,
            Err(FluidError::WorkgroupMismatch {
                particles: 300,
                workgroup: 256
            })
        ));
    }

    #[test]
    fn test_rejects_non_positive_particle_mass() {
        let mut fluid = vec![FluidParticle::new(Vec3::ZERO, 1.0); 2];
        fluid[1].mass = 0.0;
        let result = FluidSimulation::new(fluid.clone(), Vec::new(), &small_params());
        assert_eq!(
            result.err(),
            Some(FluidError::InvalidParameter {
                name: "particle mass",
                value: 0.0
            })
        );

        fluid[1].mass = -2.0;
        assert!(FluidSimulation::new(fluid, Vec::new(), &small_params()).is_err());
    }

    #[test]
    fn test_grid_tick_survives_runaway_particle() {
        let params = small_params()
            .with_neighbor_search(NeighborSearch::UniformGrid)
            .with_boundary_mode(BoundaryMode::BoundaryParticles);
        let fluid = vec![
            FluidParticle::new(Vec3::ZERO, 1.0),
            FluidParticle::new(Vec3::new(1.0e30, 0.0, 0.0), 1.0),
            FluidParticle::new(Vec3::new(f32::INFINITY, 0.0, 0.0), 1.0),
        ];
        let mut sim = FluidSimulation::new(fluid, Vec::new(), &params).unwrap();

        sim.tick(&params);
        let diagnostics = sim.diagnostics(&params);
        assert_eq!(diagnostics.non_finite, 1);
        assert!(!diagnostics.is_healthy());
        assert_eq!(sim.fluid()[0].density, params.density_floor);
    }

    #[test]
    fn test_parameter_changes_apply_next_tick() {
        let mut params = small_params()
            .with_boundary_mode(BoundaryMode::BoundaryParticles)
            .with_boundary_spacing(1.0);
        let fluid = vec![FluidParticle::new(Vec3::ZERO, 1.0)];
        let boundary = vec![BoundaryParticle::new(Vec3::new(0.0, -1.2, 0.0))];
        let mut sim = FluidSimulation::new(fluid, boundary, &params).unwrap();

        // h = 1.45 reaches the boundary particle
        advance(&mut sim, &params, 0.0);
        let light = sim.fluid()[0].density;
        assert!(light > params.density_floor);

        params.boundary_mass *= 2.0;
        advance(&mut sim, &params, 0.0);
        let heavy = sim.fluid()[0].density;
        let expected = params.density_floor + 2.0 * (light - params.density_floor);
        assert!((heavy - expected).abs() < 1e-5);

        // Shrinking the multiplier pulls h below the boundary distance
        params.spacing_multiplier = 1.0;
        advance(&mut sim, &params, 0.0);
        assert_eq!(sim.fluid()[0].density, params.density_floor);
    }

    #[test]
    fn test_seeded_density_is_floor() {
        let lattice = FluidLattice::new(UVec3::new(2, 2, 2), 1.0);
        let sim = FluidSimulation::from_lattice(&lattice, &Transform::IDENTITY, Vec::new(), &small_params())
            .unwrap();
        assert_eq!(sim.fluid_count(), 8);
        assert!(sim.fluid().iter().all(|p| p.density == 1.0));
    }

    #[test]
    fn test_tick_counts_time() {
        let params = small_params();
        let lattice = FluidLattice::new(UVec3::new(2, 2, 2), 1.0);
        let mut sim =
            FluidSimulation::from_lattice(&lattice, &Transform::IDENTITY, Vec::new(), &params).unwrap();

        sim.step_frame(&params.clone().with_fast_forward(3));
        assert_eq!(sim.ticks(), 3);
        assert!((sim.elapsed() - 3.0 * params.time_step).abs() < 1e-6);
    }

    #[test]
    fn test_free_fall_single_particle() {
        let params = small_params()
            .with_friction(1.0)
            .with_boundary_mode(BoundaryMode::BoundaryParticles);
        let mut sim =
            FluidSimulation::new(vec![FluidParticle::new(Vec3::ZERO, 1.0)], Vec::new(), &params).unwrap();

        advance(&mut sim, &params, 0.1);
        let p = sim.fluid()[0];
        assert!((p.velocity.y + 0.981).abs() < 1e-4);
        assert!((p.position.y + 0.0981).abs() < 1e-4);
    }

    #[test]
    fn test_reset_restores_seed() {
        let params = small_params();
        let lattice = FluidLattice::new(UVec3::new(2, 2, 2), 1.0);
        let mut sim =
            FluidSimulation::from_lattice(&lattice, &Transform::IDENTITY, Vec::new(), &params).unwrap();
        let seeded: Vec<Vec3> = sim.fluid().iter().map(|p| p.position).collect();

        for _ in 0..5 {
            sim.tick(&params);
        }
        assert_ne!(sim.fluid()[0].position, seeded[0]);

        sim.reset();
        let restored: Vec<Vec3> = sim.fluid().iter().map(|p| p.position).collect();
        assert_eq!(restored, seeded);
        assert_eq!(sim.ticks(), 0);
    }

    #[test]
    fn test_gpu_bytes() {
        let params = small_params();
        let boundary = vec![BoundaryParticle::new(Vec3::new(0.0, -5.0, 0.0))];
        let lattice = FluidLattice::new(UVec3::new(1, 1, 2), 1.0);
        let sim = FluidSimulation::from_lattice(&lattice, &Transform::IDENTITY, boundary, &params).unwrap();

        let particles = sim.gpu_particles();
        let bytes: &[u8] = bytemuck::cast_slice(&particles);
        assert_eq!(bytes.len(), 2 * 68);

        let boundary = sim.gpu_boundary();
        assert_eq!(bytemuck::cast_slice::<_, u8>(&boundary).len(), 12);
        assert_eq!(boundary[0].position, [0.0, -5.0, 0.0]);
    }
}
