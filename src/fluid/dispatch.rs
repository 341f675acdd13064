//! Data-parallel kernel dispatch.
//!
//! Each simulation stage is a pure kernel `Fn(usize) -> T` evaluated once
//! per fluid particle against the state committed by the previous stage.
//! A dispatch returns only when every invocation has finished, which is the
//! barrier between stages: the caller commits the returned outputs before
//! the next stage starts.

use bevy::prelude::*;
use rayon::prelude::*;

use super::error::{FluidError, FluidResult};

/// The three kernel entry points of a tick.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Reflect)]
pub enum KernelStage {
    DensityPressure,
    Forces,
    Integrate,
}

/// Where kernels run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Reflect)]
pub enum ComputeBackend {
    /// Single-threaded, in index order. Useful for debugging.
    Serial,
    /// Rayon thread pool, split into chunks of at least one work group.
    #[default]
    Parallel,
}

impl ComputeBackend {
    /// Run `kernel` for every index in `0..len` and collect the outputs in
    /// index order.
    pub fn dispatch<T, F>(&self, stage: KernelStage, len: usize, workgroup: u32, kernel: F) -> Vec<T>
    where
        T: Send,
        F: Fn(usize) -> T + Sync + Send,
    {
        trace!(
            "dispatch {:?}: {} invocations, {} work groups",
            stage,
            len,
            workgroup_count(len, workgroup)
        );

        match self {
            ComputeBackend::Serial => (0..len).map(kernel).collect(),
            ComputeBackend::Parallel => (0..len)
                .into_par_iter()
                .with_min_len(workgroup.max(1) as usize)
                .map(kernel)
                .collect(),
        }
    }
}

/// Number of work groups needed to cover `len` invocations.
pub fn workgroup_count(len: usize, workgroup: u32) -> usize {
    len.div_ceil(workgroup.max(1) as usize)
}

/// The fluid population must split into whole work groups.
pub fn validate_workgroup(particles: usize, workgroup: u32) -> FluidResult<()> {
    if workgroup == 0 {
        return Err(FluidError::InvalidWorkgroup);
    }
    if particles % workgroup as usize != 0 {
        return Err(FluidError::WorkgroupMismatch {
            particles,
            workgroup,
        });
    }
    Ok(())
}
