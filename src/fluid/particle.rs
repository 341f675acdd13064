//! Particle data structures and lattice seeding.
//!
//! The particle store is a flat array of structs owned by
//! [`super::simulation::FluidSimulation`]. This module defines the element
//! types, the lattice used to seed the fluid block and the packed layouts
//! handed to a renderer.

use bevy::prelude::*;

/// A single fluid particle.
///
/// Mutated in place every tick: the density stage writes `density` and
/// `pressure`, the force stage writes the two forces and `acceleration`,
/// and the integrator writes `velocity` and `position`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FluidParticle {
    pub position: Vec3,
    pub velocity: Vec3,
    pub acceleration: Vec3,
    pub density: f32,
    /// May be negative (tension); never clamped.
    pub pressure: f32,
    pub pressure_force: Vec3,
    pub viscosity_force: Vec3,
    pub mass: f32,
}

impl FluidParticle {
    /// Create a particle at rest at a given position.
    pub fn new(position: Vec3, mass: f32) -> Self {
        Self {
            position,
            velocity: Vec3::ZERO,
            acceleration: Vec3::ZERO,
            density: 0.0,
            pressure: 0.0,
            pressure_force: Vec3::ZERO,
            viscosity_force: Vec3::ZERO,
            mass,
        }
    }

    /// Create a particle with initial velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.velocity = velocity;
        self
    }

    /// Total force acting on the particle during the last force stage.
    pub fn internal_force(&self) -> Vec3 {
        self.pressure_force + self.viscosity_force
    }
}

/// A static particle sampled from solid geometry.
///
/// Contributes to the density and force sums of nearby fluid particles but
/// is never integrated. Its mass is [`FluidParams::boundary_mass`], read
/// every tick so it stays tunable at runtime.
///
/// [`FluidParams::boundary_mass`]: super::params::FluidParams::boundary_mass
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundaryParticle {
    pub position: Vec3,
}

impl BoundaryParticle {
    pub fn new(position: Vec3) -> Self {
        Self { position }
    }
}

/// Regular block of fluid particles.
///
/// Particles are placed on an integer lattice centered on the transform
/// origin, `counts` per axis, `spacing` apart.
#[derive(Clone, Debug, Reflect)]
pub struct FluidLattice {
    /// Number of particles along each axis.
    pub counts: UVec3,
    /// Distance between neighboring lattice points.
    pub spacing: f32,
    /// Initial velocity for spawned particles.
    pub initial_velocity: Vec3,
}

impl Default for FluidLattice {
    fn default() -> Self {
        Self::reference()
    }
}

impl FluidLattice {
    /// Reference water block: 10 x 32 x 32 particles at unit spacing.
    pub fn reference() -> Self {
        Self::new(UVec3::new(10, 32, 32), 1.0)
    }

    pub fn new(counts: UVec3, spacing: f32) -> Self {
        Self {
            counts,
            spacing,
            initial_velocity: Vec3::ZERO,
        }
    }

    /// Set initial velocity.
    pub fn with_velocity(mut self, velocity: Vec3) -> Self {
        self.initial_velocity = velocity;
        self
    }

    /// Number of particles the lattice produces.
    pub fn particle_count(&self) -> usize {
        self.counts.x as usize * self.counts.y as usize * self.counts.z as usize
    }

    /// Generate lattice positions in simulation space.
    pub fn generate_positions(&self, transform: &Transform) -> Vec<Vec3> {
        let mut positions = Vec::with_capacity(self.particle_count());
        // Integer halving keeps the reference block aligned to whole units.
        let adjust = (self.counts / 2).as_vec3();

        for i in 0..self.counts.x {
            for j in 0..self.counts.y {
                for k in 0..self.counts.z {
                    let cell = Vec3::new(i as f32, j as f32, k as f32) - adjust;
                    positions.push(transform.transform_point(cell * self.spacing));
                }
            }
        }

        positions
    }

    /// Spawn fluid particles of the given mass.
    pub fn spawn(&self, transform: &Transform, mass: f32) -> Vec<FluidParticle> {
        self.generate_positions(transform)
            .into_iter()
            .map(|p| FluidParticle::new(p, mass).with_velocity(self.initial_velocity))
            .collect()
    }
}

/// Packed fluid particle for GPU buffers.
///
/// Field order matches the 68-byte structured buffer a particle shader reads.
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuFluidParticle {
    pub density: f32,
    pub pressure: f32,
    pub pressure_force: [f32; 3],
    pub viscosity_force: [f32; 3],
    pub acceleration: [f32; 3],
    pub velocity: [f32; 3],
    pub position: [f32; 3],
}

impl From<&FluidParticle> for GpuFluidParticle {
    fn from(p: &FluidParticle) -> Self {
        Self {
            density: p.density,
            pressure: p.pressure,
            pressure_force: p.pressure_force.to_array(),
            viscosity_force: p.viscosity_force.to_array(),
            acceleration: p.acceleration.to_array(),
            velocity: p.velocity.to_array(),
            position: p.position.to_array(),
        }
    }
}

/// Packed boundary particle for GPU buffers (position only).
#[repr(C)]
#[derive(Clone, Copy, Debug, Default, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct GpuBoundaryParticle {
    pub position: [f32; 3],
}

impl From<&BoundaryParticle> for GpuBoundaryParticle {
    fn from(p: &BoundaryParticle) -> Self {
        Self {
            position: p.position.to_array(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reference_lattice_count() {
        let lattice = FluidLattice::reference();
        let positions = lattice.generate_positions(&Transform::IDENTITY);
        assert_eq!(positions.len(), 10 * 32 * 32);
        assert_eq!(positions.len(), lattice.particle_count());
    }

    #[test]
    fn test_lattice_is_centered_on_transform() {
        let lattice = FluidLattice::new(UVec3::new(2, 2, 2), 0.5);
        let transform = Transform::from_xyz(10.0, 0.0, 0.0);
        let positions = lattice.generate_positions(&transform);

        assert_eq!(positions.len(), 8);
        assert_eq!(positions[0], Vec3::new(9.5, -0.5, -0.5));
        assert_eq!(positions[7], Vec3::new(10.0, 0.0, 0.0));
    }

    #[test]
    fn test_spawn_sets_mass_and_velocity() {
        let lattice = FluidLattice::new(UVec3::splat(2), 1.0).with_velocity(Vec3::X);
        let particles = lattice.spawn(&Transform::IDENTITY, 2.0);
        assert!(particles.iter().all(|p| p.mass == 2.0 && p.velocity == Vec3::X));
    }

    #[test]
    fn test_gpu_particle_layout() {
        assert_eq!(std::mem::size_of::<GpuFluidParticle>(), 68);
        assert_eq!(std::mem::size_of::<GpuBoundaryParticle>(), 12);
    }

    #[test]
    fn test_gpu_particle_from_particle() {
        let mut p = FluidParticle::new(Vec3::new(1.0, 2.0, 3.0), 1.0);
        p.density = 4.0;
        p.pressure = -1.5;
        let gpu = GpuFluidParticle::from(&p);
        assert_eq!(gpu.position, [1.0, 2.0, 3.0]);
        assert_eq!(gpu.density, 4.0);
        assert_eq!(gpu.pressure, -1.5);
    }
}
