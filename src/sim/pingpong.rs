//! Ping-pong buffer manager
//!
//! Owns the two field buffers. Each step reads the current buffer, writes the
//! output buffer and then swaps roles. The read and write halves are taken
//! through disjoint borrows, so a step can never alias them.

use super::emitter::EmissionPoint;
use super::field::{FieldCell, WaveParams, step_field};
use crate::error::WaveError;

/// Which of the two buffers currently holds the readable state
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BufferRole {
    A,
    B,
}

impl BufferRole {
    fn index(self) -> usize {
        match self {
            BufferRole::A => 0,
            BufferRole::B => 1,
        }
    }

    pub fn other(self) -> Self {
        match self {
            BufferRole::A => BufferRole::B,
            BufferRole::B => BufferRole::A,
        }
    }
}

/// Double-buffered field state
#[derive(Debug)]
pub struct PingPong {
    buffers: [Vec<FieldCell>; 2],
    current: BufferRole,
    resolution: usize,
    steps: u64,
}

/// Allocate a zeroed buffer, reporting failure instead of aborting
fn allocate(resolution: usize) -> Result<Vec<FieldCell>, WaveError> {
    if resolution == 0 {
        return Err(WaveError::ZeroResolution);
    }
    let cells = resolution
        .checked_mul(resolution)
        .ok_or(WaveError::Allocation { cells: usize::MAX })?;
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(cells)
        .map_err(|_| WaveError::Allocation { cells })?;
    buffer.resize(cells, FieldCell::default());
    Ok(buffer)
}

impl PingPong {
    pub fn new(resolution: usize) -> Result<Self, WaveError> {
        Ok(Self {
            buffers: [allocate(resolution)?, allocate(resolution)?],
            current: BufferRole::A,
            resolution,
            steps: 0,
        })
    }

    /// Cells per side
    pub fn resolution(&self) -> usize {
        self.resolution
    }

    /// Completed steps since the last reset
    pub fn steps(&self) -> u64 {
        self.steps
    }

    pub fn current_role(&self) -> BufferRole {
        self.current
    }

    /// Readable state (what the renderer samples)
    pub fn current(&self) -> &[FieldCell] {
        &self.buffers[self.current.index()]
    }

    /// Buffer the next step will overwrite
    pub fn output(&self) -> &[FieldCell] {
        &self.buffers[self.current.other().index()]
    }

    /// Mutable access to the readable state, for seeding or manual pokes
    pub fn current_mut(&mut self) -> &mut [FieldCell] {
        &mut self.buffers[self.current.index()]
    }

    /// Height at cell (x, y) of the readable state
    pub fn height_at(&self, x: usize, y: usize) -> Option<f32> {
        if x >= self.resolution || y >= self.resolution {
            return None;
        }
        Some(self.current()[y * self.resolution + x].height)
    }

    /// Run one integration step and swap roles
    pub fn step(&mut self, params: &WaveParams, emitters: &[EmissionPoint], t: f64) {
        let [a, b] = &mut self.buffers;
        let (read, write) = match self.current {
            BufferRole::A => (&*a, b),
            BufferRole::B => (&*b, a),
        };
        step_field(read, write, self.resolution, params, emitters, t);
        self.current = self.current.other();
        self.steps += 1;
    }

    /// Replace both buffers with freshly allocated zeroed ones.
    ///
    /// On allocation failure the previous state is left untouched.
    pub fn reset(&mut self) -> Result<(), WaveError> {
        self.resize(self.resolution)
    }

    /// Reallocate both buffers at a new resolution
    pub fn resize(&mut self, resolution: usize) -> Result<(), WaveError> {
        let fresh = [allocate(resolution)?, allocate(resolution)?];
        self.buffers = fresh;
        self.resolution = resolution;
        self.current = BufferRole::A;
        self.steps = 0;
        log::debug!("field buffers reallocated at {0}x{0}", resolution);
        Ok(())
    }
}
