// Dispatch sizes for compute passes. Missing dimensions default to 1.

use crate::gpu::error::GpuError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Workgroups {
    pub x: u32,
    pub y: u32,
    pub z: u32,
}

impl Workgroups {
    pub fn new(x: u32, y: u32, z: u32) -> Result<Self, GpuError> {
        Self::from_slice(&[x, y, z])
    }

    pub fn from_slice(counts: &[u32]) -> Result<Self, GpuError> {
        if counts.is_empty() || counts.len() > 3 {
            return Err(GpuError::WorkgroupDimensions(counts.len()));
        }
        if let Some(dim) = counts.iter().position(|&c| c == 0) {
            return Err(GpuError::EmptyWorkgroupDimension(dim));
        }

        let get = |i: usize| counts.get(i).copied().unwrap_or(1);
        Ok(Self {
            x: get(0),
            y: get(1),
            z: get(2),
        })
    }

    /// Enough workgroups of `workgroup_size` threads to cover `len` items.
    pub fn covering(len: u32, workgroup_size: u32) -> Result<Self, GpuError> {
        if workgroup_size == 0 {
            return Err(GpuError::EmptyWorkgroupDimension(0));
        }
        Self::from_slice(&[len.div_ceil(workgroup_size).max(1)])
    }

    pub fn total(&self) -> u64 {
        self.x as u64 * self.y as u64 * self.z as u64
    }
}
