//! Spira SPH - headless fluid simulation demo
//!
//! Seeds a block of fluid and runs it for a fixed number of frames, either
//! inside a reflective box (dam break) or poured onto a sampled plane with
//! wind. Progress is reported through the log.

use bevy::log::LogPlugin;
use bevy::prelude::*;
use clap::{Parser, ValueEnum};
use spira_sph::prelude::*;

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum BoundaryKind {
    /// Dam break inside a reflective box.
    Box,
    /// Fluid poured onto a plane of boundary particles.
    Plane,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum EosKind {
    Linear,
    Exponent,
}

#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// Frames to run before exiting.
    #[arg(short, long, default_value_t = 300)]
    frames: u64,

    #[arg(short, long, value_enum, default_value_t = BoundaryKind::Box)]
    boundary: BoundaryKind,

    #[arg(short, long, value_enum, default_value_t = EosKind::Linear)]
    eos: EosKind,

    /// Ticks per frame.
    #[arg(long, default_value_t = 1)]
    fast_forward: u32,

    /// Run kernels on a single thread.
    #[arg(long)]
    serial: bool,

    /// Use the uniform grid instead of brute-force neighbor search.
    #[arg(long)]
    grid: bool,

    #[arg(long, default_value_t = 8)]
    nx: u32,

    #[arg(long, default_value_t = 16)]
    ny: u32,

    #[arg(long, default_value_t = 16)]
    nz: u32,

    /// Work-group width; nx * ny * nz must be a multiple of it.
    #[arg(short, long, default_value_t = 256)]
    workgroup: u32,
}

impl Args {
    fn lattice(&self) -> FluidLattice {
        FluidLattice::new(UVec3::new(self.nx, self.ny, self.nz), 1.0)
    }

    fn params(&self) -> FluidParams {
        let counts = self.lattice().counts.as_vec3();
        let mut params = match self.boundary {
            // Twice as wide as the block so it has room to collapse into.
            BoundaryKind::Box => FluidParams::reflective_box(
                Vec3::ZERO,
                Vec3::new(counts.x, counts.y * 0.5 + 1.0, counts.z * 0.5 + 1.0),
            ),
            BoundaryKind::Plane => FluidParams::boundary_plane(),
        };

        params = params
            .with_equation_of_state(match self.eos {
                EosKind::Linear => EquationOfState::Linear,
                EosKind::Exponent => EquationOfState::Exponent,
            })
            .with_fast_forward(self.fast_forward)
            .with_workgroup_size(self.workgroup);

        if self.serial {
            params = params.with_backend(ComputeBackend::Serial);
        }
        if self.grid {
            params = params.with_neighbor_search(NeighborSearch::UniformGrid);
        }
        params
    }
}

/// Scene description handed from the command line to the startup system.
#[derive(Resource)]
struct DemoConfig {
    frames: u64,
    boundary: BoundaryKind,
    lattice: FluidLattice,
}

fn main() -> AppExit {
    let args = Args::parse();

    App::new()
        .add_plugins((MinimalPlugins, LogPlugin::default()))
        .add_plugins(FluidPlugin::with_params(args.params()))
        .insert_resource(DemoConfig {
            frames: args.frames,
            boundary: args.boundary,
            lattice: args.lattice(),
        })
        .add_systems(Startup, setup_scene)
        .add_systems(Update, exit_when_done)
        .run()
}

/// Seed the fluid and, in plane mode, sample and calibrate the floor.
fn setup_scene(
    mut commands: Commands,
    mut params: ResMut<FluidParams>,
    config: Res<DemoConfig>,
    mut exit: EventWriter<AppExit>,
) {
    let counts = config.lattice.counts.as_vec3() * config.lattice.spacing;

    let (transform, boundary) = match config.boundary {
        BoundaryKind::Box => {
            // Push the block against the -X wall.
            let transform = Transform::from_xyz(-counts.x * 0.5, 0.0, 0.0);
            (transform, Vec::new())
        }
        BoundaryKind::Plane => {
            let floor = Transform::from_xyz(0.0, -(counts.y * 0.5 + 1.0), 0.0);
            let size = Vec2::new(counts.x, counts.z) * 2.0;
            let points = BoundarySampler::plane_grid(size, size.as_uvec2());
            let boundary = BoundarySampler::from_points(&points, &floor);

            match calibrate(&boundary, CalibrationConstants::default()) {
                Ok(calibration) => calibration.apply(&mut params),
                Err(err) => {
                    error!("calibration failed: {err}");
                    exit.write(AppExit::error());
                    return;
                }
            }
            (Transform::IDENTITY, boundary)
        }
    };

    match FluidSimulation::from_lattice(&config.lattice, &transform, boundary, &params) {
        Ok(simulation) => {
            info!(
                "running {} frames of {} ticks, {:?} boundary",
                config.frames, params.fast_forward_substeps, config.boundary
            );
            commands.insert_resource(simulation);
        }
        Err(err) => {
            error!("could not seed fluid: {err}");
            exit.write(AppExit::error());
        }
    }
}

fn exit_when_done(
    state: Res<FluidState>,
    config: Res<DemoConfig>,
    simulation: Option<Res<FluidSimulation>>,
    mut exit: EventWriter<AppExit>,
) {
    let Some(simulation) = simulation else {
        return;
    };

    if state.last.non_finite > 0 {
        error!(
            "simulation diverged at tick {}: {} particles non-finite",
            state.last.tick, state.last.non_finite
        );
        exit.write(AppExit::error());
        return;
    }

    if state.frame >= config.frames {
        let last = &state.last;
        info!(
            "done: {} ticks, {:.2}s simulated, density {:.3}..{:.3}, max speed {:.3}",
            simulation.ticks(),
            simulation.elapsed(),
            last.min_density,
            last.max_density,
            last.max_speed
        );
        exit.write(AppExit::Success);
    }
}
