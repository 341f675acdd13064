//! Fluid simulation parameters.
//!
//! These parameters are the whole configuration surface of the solver. They
//! are a Bevy resource so they can be inspected and tweaked at runtime, but
//! nothing in the core depends on an `App` being present.

use bevy::prelude::*;

use super::boundary::ReflectiveBox;
use super::dispatch::ComputeBackend;
use super::error::{FluidError, FluidResult};
use super::kernels::KernelCoefficients;
use super::neighbors::NeighborSearch;

/// Mapping from local density to pressure.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum EquationOfState {
    /// `k * (rho - rho0)`.
    #[default]
    Linear,
    /// `k * ((rho / rho0)^exponent - 1)`, stiffer near rest density.
    Exponent,
}

/// How fluid particles are kept inside the domain.
#[derive(Clone, Copy, Debug, PartialEq, Reflect)]
pub enum BoundaryMode {
    /// Clamp positions into an axis-aligned box after integration.
    ReflectiveBox(ReflectiveBox),
    /// No clamping; containment comes from static boundary particles.
    BoundaryParticles,
}

impl Default for BoundaryMode {
    fn default() -> Self {
        BoundaryMode::ReflectiveBox(ReflectiveBox::default())
    }
}

/// Parameters controlling the fluid simulation behavior.
///
/// The defaults reproduce the reference water tuning: unit lattice spacing,
/// unit fluid mass and a rest density just below the density floor, so a
/// freshly seeded block settles under gravity instead of exploding.
#[derive(Resource, Clone, Debug, Reflect)]
#[reflect(Resource)]
pub struct FluidParams {
    /// Smoothing kernel radius (h) used while no boundary spacing is set.
    /// Neighbors farther than h are ignored.
    pub smoothing_radius: f32,

    /// Ratio between smoothing radius and sampled boundary spacing.
    pub spacing_multiplier: f32,

    /// Boundary spacing found by calibration. While set, h is
    /// `boundary_spacing * spacing_multiplier`, re-derived every tick.
    pub boundary_spacing: Option<f32>,

    /// Constant added to every density sum before any kernel contribution.
    /// A numerical floor, not a physical quantity; it keeps the later
    /// divisions by density well defined for isolated particles.
    pub density_floor: f32,

    /// Equilibrium density where the equation of state yields zero pressure.
    pub rest_density: f32,

    /// Equation of state form.
    pub equation_of_state: EquationOfState,

    /// Stiffness of the equation of state.
    pub gas_constant: f32,

    /// Exponent used by [`EquationOfState::Exponent`].
    pub exponent: f32,

    /// Mass of every fluid particle.
    pub fluid_mass: f32,

    /// Mass of every boundary particle.
    pub boundary_mass: f32,

    /// Viscosity resistance coefficient.
    pub viscosity: f32,

    /// Downward gravity acceleration magnitude (applied along -Y).
    pub gravity: f32,

    /// Lateral wind acceleration magnitude.
    pub wind: f32,

    /// Direction of the wind; normalized on use.
    pub wind_direction: Vec3,

    /// Integration step size in seconds.
    pub time_step: f32,

    /// Velocity damping factor per `friction_reference_step`.
    /// Values above 1 amplify velocity and are almost certainly a mistake.
    pub friction: f32,

    /// Step length over which `friction` is applied exactly once.
    pub friction_reference_step: f32,

    /// Number of ticks executed per external frame.
    pub fast_forward_substeps: u32,

    /// Boundary handling mode.
    pub boundary_mode: BoundaryMode,

    /// Neighbor search strategy.
    pub neighbor_search: NeighborSearch,

    /// Kernel dispatch backend.
    pub backend: ComputeBackend,

    /// Work-group width; the fluid count must be a multiple of it.
    pub workgroup_size: u32,

    /// Lower pressure bound for visualization.
    pub pressure_min: f32,

    /// Upper pressure bound for visualization.
    pub pressure_max: f32,
}

impl Default for FluidParams {
    fn default() -> Self {
        Self {
            smoothing_radius: 1.45,
            spacing_multiplier: 1.45,
            boundary_spacing: None,
            density_floor: 1.0,
            rest_density: 0.9,
            equation_of_state: EquationOfState::Linear,
            gas_constant: 80.0,
            exponent: 7.0,
            fluid_mass: 1.0,
            boundary_mass: 4.5,
            viscosity: 0.1,
            gravity: 9.81,
            wind: 0.0,
            wind_direction: Vec3::X,
            time_step: 0.008,
            friction: 0.997,
            friction_reference_step: 0.008,
            fast_forward_substeps: 1,
            boundary_mode: BoundaryMode::default(),
            neighbor_search: NeighborSearch::BruteForce,
            backend: ComputeBackend::Parallel,
            workgroup_size: 256,
            pressure_min: -20.0,
            pressure_max: 120.0,
        }
    }
}

impl FluidParams {
    /// The reference tuning.
    pub fn reference() -> Self {
        Self::default()
    }

    /// Fluid poured onto a sampled plane, contained only by boundary
    /// particles and pushed sideways by wind.
    pub fn boundary_plane() -> Self {
        Self {
            boundary_mode: BoundaryMode::BoundaryParticles,
            wind: 5.5,
            ..Self::default()
        }
    }

    /// Fluid confined to an axis-aligned box.
    pub fn reflective_box(center: Vec3, half_extents: Vec3) -> Self {
        Self {
            boundary_mode: BoundaryMode::ReflectiveBox(ReflectiveBox::new(center, half_extents)),
            ..Self::default()
        }
    }

    /// Honey-like viscous fluid.
    pub fn viscous() -> Self {
        Self {
            viscosity: 2.0,
            friction: 0.99,
            ..Self::default()
        }
    }

    /// Fix h directly, dropping any calibrated boundary spacing.
    pub fn with_smoothing_radius(mut self, h: f32) -> Self {
        self.smoothing_radius = h;
        self.boundary_spacing = None;
        self
    }

    pub fn with_boundary_spacing(mut self, spacing: f32) -> Self {
        self.boundary_spacing = Some(spacing);
        self
    }

    pub fn with_density_floor(mut self, floor: f32) -> Self {
        self.density_floor = floor;
        self
    }

    pub fn with_rest_density(mut self, rest_density: f32) -> Self {
        self.rest_density = rest_density;
        self
    }

    pub fn with_equation_of_state(mut self, eos: EquationOfState) -> Self {
        self.equation_of_state = eos;
        self
    }

    pub fn with_gas_constant(mut self, gas_constant: f32) -> Self {
        self.gas_constant = gas_constant;
        self
    }

    pub fn with_exponent(mut self, exponent: f32) -> Self {
        self.exponent = exponent;
        self
    }

    pub fn with_masses(mut self, fluid_mass: f32, boundary_mass: f32) -> Self {
        self.fluid_mass = fluid_mass;
        self.boundary_mass = boundary_mass;
        self
    }

    pub fn with_viscosity(mut self, viscosity: f32) -> Self {
        self.viscosity = viscosity;
        self
    }

    pub fn with_gravity(mut self, gravity: f32) -> Self {
        self.gravity = gravity;
        self
    }

    pub fn with_wind(mut self, wind: f32, direction: Vec3) -> Self {
        self.wind = wind;
        self.wind_direction = direction;
        self
    }

    pub fn with_time_step(mut self, time_step: f32) -> Self {
        self.time_step = time_step;
        self
    }

    pub fn with_friction(mut self, friction: f32) -> Self {
        self.friction = friction;
        self
    }

    pub fn with_fast_forward(mut self, substeps: u32) -> Self {
        self.fast_forward_substeps = substeps;
        self
    }

    pub fn with_boundary_mode(mut self, mode: BoundaryMode) -> Self {
        self.boundary_mode = mode;
        self
    }

    pub fn with_neighbor_search(mut self, search: NeighborSearch) -> Self {
        self.neighbor_search = search;
        self
    }

    pub fn with_backend(mut self, backend: ComputeBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_workgroup_size(mut self, workgroup_size: u32) -> Self {
        self.workgroup_size = workgroup_size;
        self
    }

    /// Gravity as an acceleration vector.
    pub fn gravity_vector(&self) -> Vec3 {
        Vec3::new(0.0, -self.gravity, 0.0)
    }

    /// Wind as an acceleration vector.
    pub fn wind_vector(&self) -> Vec3 {
        self.wind_direction.normalize_or_zero() * self.wind
    }

    /// Combined external acceleration.
    pub fn external_acceleration(&self) -> Vec3 {
        self.gravity_vector() + self.wind_vector()
    }

    /// Smoothing radius in effect for the next tick.
    pub fn kernel_radius(&self) -> f32 {
        match self.boundary_spacing {
            Some(spacing) => spacing * self.spacing_multiplier,
            None => self.smoothing_radius,
        }
    }

    /// Kernel normalization constants for the current smoothing radius.
    pub fn kernel_coefficients(&self) -> KernelCoefficients {
        KernelCoefficients::new(self.kernel_radius())
    }

    /// Damping factor applied to velocity over a step of length `dt`.
    ///
    /// Equals `friction` when `dt` is the reference step and 1 when `dt` is 0.
    pub fn damping_factor(&self, dt: f32) -> f32 {
        if dt == 0.0 {
            return 1.0;
        }
        self.friction.powf(dt / self.friction_reference_step)
    }

    /// Maps a pressure onto `[0, 1]` using the visualization bounds.
    pub fn normalized_pressure(&self, pressure: f32) -> f32 {
        let span = self.pressure_max - self.pressure_min;
        if span <= 0.0 {
            return 0.0;
        }
        ((pressure - self.pressure_min) / span).clamp(0.0, 1.0)
    }

    /// Checks every parameter range. Called once at simulation setup.
    pub fn validate(&self) -> FluidResult<()> {
        fn positive(name: &'static str, value: f32) -> FluidResult<()> {
            if value.is_finite() && value > 0.0 {
                Ok(())
            } else {
                Err(FluidError::InvalidParameter { name, value })
            }
        }

        fn non_negative(name: &'static str, value: f32) -> FluidResult<()> {
            if value.is_finite() && value >= 0.0 {
                Ok(())
            } else {
                Err(FluidError::InvalidParameter { name, value })
            }
        }

        match self.boundary_spacing {
            Some(spacing) => {
                positive("boundary_spacing", spacing)?;
                positive("spacing_multiplier", self.spacing_multiplier)?;
            }
            None => positive("smoothing_radius", self.smoothing_radius)?,
        }
        positive("density_floor", self.density_floor)?;
        positive("rest_density", self.rest_density)?;
        positive("fluid_mass", self.fluid_mass)?;
        non_negative("boundary_mass", self.boundary_mass)?;
        non_negative("gas_constant", self.gas_constant)?;
        non_negative("viscosity", self.viscosity)?;
        non_negative("time_step", self.time_step)?;
        non_negative("friction", self.friction)?;
        positive("friction_reference_step", self.friction_reference_step)?;

        if self.equation_of_state == EquationOfState::Exponent {
            positive("exponent", self.exponent)?;
        }
        if !self.gravity.is_finite() {
            return Err(FluidError::InvalidParameter {
                name: "gravity",
                value: self.gravity,
            });
        }
        if !self.wind.is_finite() {
            return Err(FluidError::InvalidParameter {
                name: "wind",
                value: self.wind,
            });
        }
        if self.fast_forward_substeps == 0 {
            return Err(FluidError::InvalidParameter {
                name: "fast_forward_substeps",
                value: 0.0,
            });
        }
        if self.workgroup_size == 0 {
            return Err(FluidError::InvalidWorkgroup);
        }
        if let BoundaryMode::ReflectiveBox(bounds) = &self.boundary_mode {
            let min_extent = bounds.half_extents.min_element();
            positive("half_extents", min_extent)?;
        }

        if self.friction > 1.0 {
            warn!(
                "friction {} is above 1 and amplifies velocity every step",
                self.friction
            );
        }

        Ok(())
    }
}
