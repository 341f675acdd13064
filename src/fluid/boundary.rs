//! Boundary handling for fluid simulation.
//!
//! Two kinds of containment are supported:
//! - an axis-aligned [`ReflectiveBox`] applied by the integrator, and
//! - static [`BoundaryParticle`]s sampled from solid geometry, which repel
//!   fluid through the ordinary pressure and viscosity sums.
//!
//! The sampling helpers here stand in for a mesh: they produce point sets in
//! local space which are then placed with a [`Transform`].

use bevy::prelude::*;

use super::particle::BoundaryParticle;

/// Axis-aligned box that fluid particles are clamped into.
///
/// A particle that leaves the box on some axis is put back on the face and
/// its outward velocity component is reflected, scaled by `restitution`.
/// With the default restitution of 0 this is clamp-and-zero: the particle
/// stops moving through the wall but keeps its tangential motion.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub struct ReflectiveBox {
    /// Center of the box.
    pub center: Vec3,
    /// Half of the box size along each axis.
    pub half_extents: Vec3,
    /// Restitution coefficient for collisions (0 = no bounce, 1 = perfect bounce).
    pub restitution: f32,
}

impl Default for ReflectiveBox {
    fn default() -> Self {
        Self {
            center: Vec3::ZERO,
            half_extents: Vec3::new(5.0, 16.0, 16.0),
            restitution: 0.0,
        }
    }
}

impl ReflectiveBox {
    pub fn new(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            center,
            half_extents,
            ..default()
        }
    }

    /// Set restitution.
    pub fn with_restitution(mut self, restitution: f32) -> Self {
        self.restitution = restitution;
        self
    }

    /// Minimum corner of the box.
    pub fn min(&self) -> Vec3 {
        self.center - self.half_extents
    }

    /// Maximum corner of the box.
    pub fn max(&self) -> Vec3 {
        self.center + self.half_extents
    }

    /// Check if a point is inside the box (faces included).
    pub fn contains(&self, point: Vec3) -> bool {
        let min = self.min();
        let max = self.max();
        point.cmpge(min).all() && point.cmple(max).all()
    }

    /// Clamp a particle into the box.
    pub fn apply_collision(&self, position: &mut Vec3, velocity: &mut Vec3) {
        let min = self.min();
        let max = self.max();

        for axis in 0..3 {
            if position[axis] < min[axis] {
                position[axis] = min[axis];
                if velocity[axis] < 0.0 {
                    velocity[axis] *= -self.restitution;
                }
            } else if position[axis] > max[axis] {
                position[axis] = max[axis];
                if velocity[axis] > 0.0 {
                    velocity[axis] *= -self.restitution;
                }
            }
        }
    }
}

/// Point samplers for boundary geometry.
pub struct BoundarySampler;

impl BoundarySampler {
    /// Place local-space points into simulation space as boundary particles.
    pub fn from_points(points: &[Vec3], transform: &Transform) -> Vec<BoundaryParticle> {
        points
            .iter()
            .map(|&p| BoundaryParticle::new(transform.transform_point(p)))
            .collect()
    }

    /// Vertices of a subdivided plane in the local XZ plane, centered on the
    /// origin. `subdivisions` quads per side give `subdivisions + 1` vertices
    /// per side.
    pub fn plane_grid(size: Vec2, subdivisions: UVec2) -> Vec<Vec3> {
        let subdivisions = subdivisions.max(UVec2::ONE);
        let step = size / subdivisions.as_vec2();
        let half = size * 0.5;

        let mut points = Vec::with_capacity(((subdivisions.x + 1) * (subdivisions.y + 1)) as usize);
        for iz in 0..=subdivisions.y {
            for ix in 0..=subdivisions.x {
                let x = ix as f32 * step.x - half.x;
                let z = iz as f32 * step.y - half.y;
                points.push(Vec3::new(x, 0.0, z));
            }
        }
        points
    }

    /// Default sampled floor: a 10 x 10 plane with 11 x 11 vertices.
    pub fn reference_plane() -> Vec<Vec3> {
        Self::plane_grid(Vec2::splat(10.0), UVec2::splat(10))
    }

    /// Points on the surface of an axis-aligned box, `spacing` apart.
    ///
    /// Only lattice points on at least one face are kept, so the interior
    /// stays free for fluid.
    pub fn box_cage(min: Vec3, max: Vec3, spacing: f32) -> Vec<Vec3> {
        let counts = ((max - min) / spacing).round().as_uvec3();
        let mut points = Vec::new();

        for i in 0..=counts.x {
            for j in 0..=counts.y {
                for k in 0..=counts.z {
                    let on_face = i == 0
                        || j == 0
                        || k == 0
                        || i == counts.x
                        || j == counts.y
                        || k == counts.z;
                    if on_face {
                        points.push(min + Vec3::new(i as f32, j as f32, k as f32) * spacing);
                    }
                }
            }
        }
        points
    }
}
