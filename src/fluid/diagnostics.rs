//! Per-frame statistics over the particle store.
//!
//! Negative pressure and velocity blow-up are tuning problems, not errors;
//! they are logged here and never clamped.

use bevy::prelude::*;

use super::params::{BoundaryMode, FluidParams};
use super::particle::FluidParticle;

/// Speed above which the run is considered to be blowing up.
pub const BLOW_UP_SPEED: f32 = 1.0e3;

/// Summary of the fluid state after a tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Reflect)]
pub struct FluidDiagnostics {
    pub tick: u64,
    pub min_density: f32,
    pub max_density: f32,
    pub mean_density: f32,
    pub min_pressure: f32,
    pub max_pressure: f32,
    pub max_speed: f32,
    /// Particles currently under tension.
    pub negative_pressure: usize,
    /// Particles with a NaN or infinite position, velocity or density.
    pub non_finite: usize,
    /// Particles outside the reflective box (always 0 in boundary-particle mode).
    pub escaped: usize,
}

impl FluidDiagnostics {
    pub fn collect(fluid: &[FluidParticle], params: &FluidParams, tick: u64) -> Self {
        if fluid.is_empty() {
            return Self { tick, ..default() };
        }

        let mut stats = Self {
            tick,
            min_density: f32::INFINITY,
            max_density: f32::NEG_INFINITY,
            min_pressure: f32::INFINITY,
            max_pressure: f32::NEG_INFINITY,
            ..default()
        };
        let mut density_sum = 0.0;

        for p in fluid {
            if !(p.position.is_finite() && p.velocity.is_finite() && p.density.is_finite()) {
                stats.non_finite += 1;
                continue;
            }

            stats.min_density = stats.min_density.min(p.density);
            stats.max_density = stats.max_density.max(p.density);
            stats.min_pressure = stats.min_pressure.min(p.pressure);
            stats.max_pressure = stats.max_pressure.max(p.pressure);
            stats.max_speed = stats.max_speed.max(p.velocity.length());
            density_sum += p.density;

            if p.pressure < 0.0 {
                stats.negative_pressure += 1;
            }
            if let BoundaryMode::ReflectiveBox(bounds) = &params.boundary_mode {
                if !bounds.contains(p.position) {
                    stats.escaped += 1;
                }
            }
        }

        let finite = fluid.len() - stats.non_finite;
        if finite > 0 {
            stats.mean_density = density_sum / finite as f32;
        }
        stats
    }

    /// No NaNs and no runaway velocities.
    pub fn is_healthy(&self) -> bool {
        self.non_finite == 0 && self.max_speed < BLOW_UP_SPEED
    }

    /// Log the summary; problems go to `warn!`.
    pub fn report(&self) {
        if self.non_finite > 0 {
            warn!(
                "tick {}: {} particles have non-finite state",
                self.tick, self.non_finite
            );
        }
        if self.max_speed >= BLOW_UP_SPEED {
            warn!(
                "tick {}: max speed {:.1} suggests the simulation is blowing up",
                self.tick, self.max_speed
            );
        }
        debug!(
            "tick {}: density {:.3} → {:.3} (mean {:.3}), pressure {:.3} → {:.3}, {} under tension, max speed {:.3}",
            self.tick,
            self.min_density,
            self.max_density,
            self.mean_density,
            self.min_pressure,
            self.max_pressure,
            self.negative_pressure,
            self.max_speed
        );
    }
}
