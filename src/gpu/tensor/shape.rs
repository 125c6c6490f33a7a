use std::fmt;

use crate::gpu::dtype::DType;
use crate::gpu::error::GpuError;

/// Row-major dimensions. An empty shape is a scalar.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub struct Shape(Vec<usize>);

impl Shape {
    pub fn new(dims: impl Into<Vec<usize>>) -> Self {
        Self(dims.into())
    }

    pub fn dims(&self) -> &[usize] {
        &self.0
    }

    pub fn rank(&self) -> usize {
        self.0.len()
    }

    pub fn numel(&self) -> Result<usize, GpuError> {
        self.0
            .iter()
            .try_fold(1usize, |acc, &d| acc.checked_mul(d))
            .ok_or_else(|| GpuError::ShapeOverflow(self.0.clone()))
    }

    /// Size in bytes of a tensor of this shape holding `dtype` elements.
    pub fn byte_len(&self, dtype: DType) -> Result<u64, GpuError> {
        self.numel()?
            .checked_mul(dtype.byte_size())
            .and_then(|bytes| u64::try_from(bytes).ok())
            .ok_or_else(|| GpuError::ShapeOverflow(self.0.clone()))
    }

    pub fn strides(&self) -> Result<Vec<usize>, GpuError> {
        let mut strides = vec![1usize; self.0.len()];
        for i in (0..self.0.len().saturating_sub(1)).rev() {
            strides[i] = strides[i + 1]
                .checked_mul(self.0[i + 1])
                .ok_or_else(|| GpuError::ShapeOverflow(self.0.clone()))?;
        }
        Ok(strides)
    }

    /// Layout of the shape buffer uploaded next to tensor data.
    pub fn to_u32_words(&self) -> Result<Vec<u32>, GpuError> {
        self.0
            .iter()
            .map(|&d| u32::try_from(d).map_err(|_| GpuError::DimensionTooLarge(d)))
            .collect()
    }

    pub fn check_len(&self, len: usize) -> Result<(), GpuError> {
        let expected = self.numel()?;
        if expected != len {
            return Err(GpuError::ShapeMismatch {
                shape: self.0.clone(),
                expected,
                actual: len,
            });
        }
        Ok(())
    }
}

impl From<&[usize]> for Shape {
    fn from(dims: &[usize]) -> Self {
        Self(dims.to_vec())
    }
}

impl<const N: usize> From<[usize; N]> for Shape {
    fn from(dims: [usize; N]) -> Self {
        Self(dims.to_vec())
    }
}

impl From<Vec<usize>> for Shape {
    fn from(dims: Vec<usize>) -> Self {
        Self(dims)
    }
}

impl fmt::Display for Shape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}
