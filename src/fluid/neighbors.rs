//! Neighbor search.
//!
//! The reference strategy is an exhaustive scan over the whole fluid and
//! boundary population. [`UniformGrid`] is an accelerator that buckets
//! particles into cells one smoothing radius wide and scans only the 3x3x3
//! block around the query; it returns exactly the same neighbor set.

use std::collections::HashMap;

use bevy::prelude::*;

use super::particle::{BoundaryParticle, FluidParticle};

/// Identifies a particle in the combined fluid + boundary population.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ParticleRef {
    Fluid(usize),
    Boundary(usize),
}

/// A particle within the smoothing radius of a query particle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Neighbor {
    pub particle: ParticleRef,
    /// `pos_i - pos_j`.
    pub offset: Vec3,
    /// `|pos_i - pos_j|`, never greater than the smoothing radius.
    pub distance: f32,
}

/// Neighbor search strategy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum NeighborSearch {
    /// Scan every particle for every query, O(n²) per stage.
    #[default]
    BruteForce,
    /// Bucket particles into a uniform grid rebuilt once per tick.
    UniformGrid,
}

/// Offsets of the 3x3x3 cell neighborhood.
static NEIGHBOR_OFFSETS: [IVec3; 27] = {
    let mut offsets = [IVec3::ZERO; 27];
    let mut n = 0;
    let mut x = -1;
    while x <= 1 {
        let mut y = -1;
        while y <= 1 {
            let mut z = -1;
            while z <= 1 {
                offsets[n] = IVec3::new(x, y, z);
                n += 1;
                z += 1;
            }
            y += 1;
        }
        x += 1;
    }
    offsets
};

/// Uniform grid over the combined population.
#[derive(Default, Debug)]
pub struct UniformGrid {
    cell_size: f32,
    cells: HashMap<IVec3, Vec<ParticleRef>>,
}

impl UniformGrid {
    /// Cells are slightly wider than `h` so rounding in the cell lookup can
    /// never put two particles within `h` of each other two cells apart.
    const CELL_PADDING: f32 = 1.001;

    pub fn new() -> Self {
        Self::default()
    }

    /// Calculate the grid cell for a position.
    pub fn position_to_cell(&self, position: Vec3) -> IVec3 {
        (position / self.cell_size).floor().as_ivec3()
    }

    /// Rebuild the grid from current positions. Cell vectors are reused.
    pub fn build(
        &mut self,
        fluid: &[FluidParticle],
        boundary: &[BoundaryParticle],
        smoothing_radius: f32,
    ) {
        self.cell_size = smoothing_radius * Self::CELL_PADDING;
        for bucket in self.cells.values_mut() {
            bucket.clear();
        }

        for (i, p) in fluid.iter().enumerate() {
            let cell = self.position_to_cell(p.position);
            self.cells.entry(cell).or_default().push(ParticleRef::Fluid(i));
        }
        for (i, p) in boundary.iter().enumerate() {
            let cell = self.position_to_cell(p.position);
            self.cells.entry(cell).or_default().push(ParticleRef::Boundary(i));
        }

        self.cells.retain(|_, bucket| !bucket.is_empty());
    }

    /// Candidates in the 3x3x3 block around `position`.
    ///
    /// Runaway positions land in the saturated edge cells, so the lookup
    /// saturates too instead of overflowing.
    fn candidates(&self, position: Vec3) -> impl Iterator<Item = ParticleRef> + '_ {
        let cell = self.position_to_cell(position);
        NEIGHBOR_OFFSETS
            .iter()
            .filter_map(move |offset| self.cells.get(&cell.saturating_add(*offset)))
            .flatten()
            .copied()
    }

    /// Number of occupied cells.
    pub fn occupied_cells(&self) -> usize {
        self.cells.len()
    }
}

/// Read-only view used by the stages to visit neighbors of fluid particles.
#[derive(Clone, Copy)]
pub struct NeighborQuery<'a> {
    fluid: &'a [FluidParticle],
    boundary: &'a [BoundaryParticle],
    smoothing_radius: f32,
    grid: Option<&'a UniformGrid>,
}

impl<'a> NeighborQuery<'a> {
    /// Exhaustive query over the whole population.
    pub fn brute_force(
        fluid: &'a [FluidParticle],
        boundary: &'a [BoundaryParticle],
        smoothing_radius: f32,
    ) -> Self {
        Self {
            fluid,
            boundary,
            smoothing_radius,
            grid: None,
        }
    }

    /// Grid-accelerated query. `grid` must have been built from the same
    /// particles with the same radius.
    pub fn with_grid(
        fluid: &'a [FluidParticle],
        boundary: &'a [BoundaryParticle],
        smoothing_radius: f32,
        grid: &'a UniformGrid,
    ) -> Self {
        Self {
            fluid,
            boundary,
            smoothing_radius,
            grid: Some(grid),
        }
    }

    pub fn fluid(&self) -> &'a [FluidParticle] {
        self.fluid
    }

    pub fn boundary(&self) -> &'a [BoundaryParticle] {
        self.boundary
    }

    pub fn position_of(&self, particle: ParticleRef) -> Vec3 {
        match particle {
            ParticleRef::Fluid(j) => self.fluid[j].position,
            ParticleRef::Boundary(j) => self.boundary[j].position,
        }
    }

    /// Visit every particle within the smoothing radius of fluid particle
    /// `i`, excluding `i` itself. Coincident distinct particles are visited
    /// with a zero distance.
    pub fn for_each_neighbor(&self, i: usize, mut visit: impl FnMut(Neighbor)) {
        let position = self.fluid[i].position;
        let mut test = |particle: ParticleRef| {
            if particle == ParticleRef::Fluid(i) {
                return;
            }
            let offset = position - self.position_of(particle);
            let distance = offset.length();
            if distance <= self.smoothing_radius {
                visit(Neighbor {
                    particle,
                    offset,
                    distance,
                });
            }
        };

        match self.grid {
            Some(grid) => grid.candidates(position).for_each(&mut test),
            None => {
                (0..self.fluid.len()).for_each(|j| test(ParticleRef::Fluid(j)));
                (0..self.boundary.len()).for_each(|j| test(ParticleRef::Boundary(j)));
            }
        }
    }

    /// Collect the neighbors of fluid particle `i`.
    pub fn neighbors_of(&self, i: usize) -> Vec<Neighbor> {
        let mut neighbors = Vec::new();
        self.for_each_neighbor(i, |n| neighbors.push(n));
        neighbors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fluid_at(positions: &[Vec3]) -> Vec<FluidParticle> {
        positions.iter().map(|&p| FluidParticle::new(p, 1.0)).collect()
    }

    #[test]
    fn test_neighbor_offsets_cover_block() {
        assert_eq!(NEIGHBOR_OFFSETS[0], IVec3::splat(-1));
        assert_eq!(NEIGHBOR_OFFSETS[13], IVec3::ZERO);
        assert_eq!(NEIGHBOR_OFFSETS[26], IVec3::ONE);
    }

    #[test]
    fn test_brute_force_excludes_self_and_far() {
        let fluid = fluid_at(&[Vec3::ZERO, Vec3::new(0.5, 0.0, 0.0), Vec3::new(3.0, 0.0, 0.0)]);
        let boundary = vec![BoundaryParticle::new(Vec3::new(0.0, -1.0, 0.0))];
        let query = NeighborQuery::brute_force(&fluid, &boundary, 1.0);

        let mut refs: Vec<ParticleRef> = query.neighbors_of(0).iter().map(|n| n.particle).collect();
        refs.sort();
        assert_eq!(refs, vec![ParticleRef::Fluid(1), ParticleRef::Boundary(0)]);
    }

    #[test]
    fn test_radius_is_inclusive() {
        let fluid = fluid_at(&[Vec3::ZERO, Vec3::new(1.0, 0.0, 0.0)]);
        let query = NeighborQuery::brute_force(&fluid, &[], 1.0);
        assert_eq!(query.neighbors_of(0).len(), 1);
    }

    #[test]
    fn test_coincident_particles_are_neighbors() {
        let fluid = fluid_at(&[Vec3::ONE, Vec3::ONE]);
        let query = NeighborQuery::brute_force(&fluid, &[], 1.0);
        let neighbors = query.neighbors_of(0);
        assert_eq!(neighbors.len(), 1);
        assert_eq!(neighbors[0].distance, 0.0);
    }

    #[test]
    fn test_grid_matches_brute_force() {
        // Deterministic jittered cloud spanning several cells
        let mut positions = Vec::new();
        for i in 0..200u32 {
            let f = i as f32;
            positions.push(Vec3::new(
                (f * 0.37).sin() * 2.5,
                (f * 0.73).cos() * 2.5,
                (f * 0.11).sin() * (f * 0.05).cos() * 2.5,
            ));
        }
        let fluid = fluid_at(&positions);
        let boundary: Vec<BoundaryParticle> = (0..20)
            .map(|i| BoundaryParticle::new(Vec3::new(i as f32 * 0.25 - 2.5, -2.6, 0.0)))
            .collect();
        let h = 0.6;

        let mut grid = UniformGrid::new();
        grid.build(&fluid, &boundary, h);

        let brute = NeighborQuery::brute_force(&fluid, &boundary, h);
        let fast = NeighborQuery::with_grid(&fluid, &boundary, h, &grid);

        for i in 0..fluid.len() {
            let mut a: Vec<ParticleRef> = brute.neighbors_of(i).iter().map(|n| n.particle).collect();
            let mut b: Vec<ParticleRef> = fast.neighbors_of(i).iter().map(|n| n.particle).collect();
            a.sort();
            b.sort();
            assert_eq!(a, b, "neighbor sets differ for particle {i}");
        }
    }

    #[test]
    fn test_grid_tolerates_runaway_positions() {
        let fluid = fluid_at(&[
            Vec3::ZERO,
            Vec3::new(0.5, 0.0, 0.0),
            Vec3::new(1.0e30, 0.0, 0.0),
            Vec3::new(f32::INFINITY, f32::NEG_INFINITY, 0.0),
            Vec3::splat(f32::NAN),
        ]);
        let mut grid = UniformGrid::new();
        grid.build(&fluid, &[], 1.0);

        let query = NeighborQuery::with_grid(&fluid, &[], 1.0, &grid);
        let refs: Vec<ParticleRef> = query.neighbors_of(0).iter().map(|n| n.particle).collect();
        assert_eq!(refs, vec![ParticleRef::Fluid(1)]);
        for i in 2..fluid.len() {
            assert!(query.neighbors_of(i).is_empty());
        }
    }

    #[test]
    fn test_grid_rebuild_drops_stale_entries() {
        let mut fluid = fluid_at(&[Vec3::ZERO, Vec3::new(0.2, 0.0, 0.0)]);
        let mut grid = UniformGrid::new();
        grid.build(&fluid, &[], 1.0);
        assert_eq!(grid.occupied_cells(), 1);

        fluid[1].position = Vec3::new(10.0, 0.0, 0.0);
        grid.build(&fluid, &[], 1.0);
        assert_eq!(grid.occupied_cells(), 2);

        let query = NeighborQuery::with_grid(&fluid, &[], 1.0, &grid);
        assert!(query.neighbors_of(0).is_empty());
    }
}
