//! Bevy plugin for fluid simulation.

use bevy::prelude::*;

use super::diagnostics::FluidDiagnostics;
use super::params::FluidParams;
use super::particle::FluidLattice;
use super::simulation::FluidSimulation;

/// Plugin that drives a [`FluidSimulation`] from the fixed timestep.
///
/// The plugin owns the parameters and the run state. The simulation itself
/// is inserted by the app once its particles are seeded, since seeding can
/// fail and depends on scene data.
///
/// # Example
///
/// ```rust,ignore
/// use bevy::prelude::*;
/// use spira_sph::prelude::*;
///
/// fn main() {
///     App::new()
///         .add_plugins(MinimalPlugins)
///         .add_plugins(FluidPlugin::with_params(FluidParams::boundary_plane()))
///         .run();
/// }
/// ```
#[derive(Default)]
pub struct FluidPlugin {
    pub params: FluidParams,
}

impl FluidPlugin {
    pub fn with_params(params: FluidParams) -> Self {
        Self { params }
    }
}

impl Plugin for FluidPlugin {
    fn build(&self, app: &mut App) {
        app.register_type::<FluidParams>()
            .register_type::<FluidState>()
            .register_type::<FluidDiagnostics>()
            .register_type::<FluidLattice>();

        app.insert_resource(self.params.clone())
            .insert_resource(Time::<Fixed>::from_seconds(self.params.time_step as f64))
            .init_resource::<FluidState>();

        app.add_systems(FixedUpdate, run_simulation);
    }
}

/// Run state of the simulation as seen from the app.
#[derive(Resource, Clone, Debug, Default, Reflect)]
#[reflect(Resource)]
pub struct FluidState {
    pub paused: bool,
    /// Advance exactly one frame while paused.
    pub step_requested: bool,
    /// External frames executed.
    pub frame: u64,
    /// Ticks executed, `frame * fast_forward_substeps` unless params changed.
    pub ticks: u64,
    /// Diagnostics after the last frame.
    pub last: FluidDiagnostics,
}

impl FluidState {
    pub fn toggle_pause(&mut self) {
        self.paused = !self.paused;
    }

    pub fn request_step(&mut self) {
        self.step_requested = true;
    }
}

fn run_simulation(
    params: Res<FluidParams>,
    mut state: ResMut<FluidState>,
    simulation: Option<ResMut<FluidSimulation>>,
) {
    let Some(mut simulation) = simulation else {
        return;
    };

    if state.paused && !state.step_requested {
        return;
    }
    state.step_requested = false;

    state.last = simulation.step_frame(&params);
    state.frame += 1;
    state.ticks = simulation.ticks();
}

#[cfg(test)]
mod tests {
    use super::*;

    fn app_with_simulation() -> App {
        let params = FluidParams::default().with_workgroup_size(8);
        let mut app = App::new();
        app.add_plugins(FluidPlugin::with_params(params.clone()));

        let lattice = FluidLattice::new(UVec3::new(2, 2, 2), 1.0);
        let simulation =
            FluidSimulation::from_lattice(&lattice, &Transform::IDENTITY, Vec::new(), &params).unwrap();
        app.insert_resource(simulation);
        app
    }

    #[test]
    fn test_fixed_update_advances_simulation() {
        let mut app = app_with_simulation();
        app.world_mut().run_schedule(FixedUpdate);
        app.world_mut().run_schedule(FixedUpdate);

        let state = app.world().resource::<FluidState>();
        assert_eq!(state.frame, 2);
        assert_eq!(state.ticks, 2);
        assert_eq!(state.last.tick, 2);
        assert_eq!(app.world().resource::<FluidSimulation>().ticks(), 2);
    }

    #[test]
    fn test_paused_simulation_steps_on_request() {
        let mut app = app_with_simulation();
        app.world_mut().resource_mut::<FluidState>().toggle_pause();

        app.world_mut().run_schedule(FixedUpdate);
        assert_eq!(app.world().resource::<FluidSimulation>().ticks(), 0);

        app.world_mut().resource_mut::<FluidState>().request_step();
        app.world_mut().run_schedule(FixedUpdate);
        app.world_mut().run_schedule(FixedUpdate);
        assert_eq!(app.world().resource::<FluidSimulation>().ticks(), 1);
    }

    #[test]
    fn test_missing_simulation_is_skipped() {
        let mut app = App::new();
        app.add_plugins(FluidPlugin::default());
        app.world_mut().run_schedule(FixedUpdate);
        assert_eq!(app.world().resource::<FluidState>().frame, 0);
    }
}
