//! PyCUDA-style helpers over the browser WebGPU compute API.
//!
//! ```ignore
//! let gpu = Gpu::init().await?;
//! let data = gpu.mem_alloc_init(&[1.0f32, 2.0, 3.0, 4.0])?;
//! let length = gpu.mem_alloc_init(&[4u32])?;
//!
//! let module = gpu.source_module(shaders::square_kernel(256));
//! module.get_function("square").await?.call(&[1], &[&data, &length])?;
//!
//! let squared = gpu.map_gpu_to_cpu::<f32>(&data).await?;
//! ```

pub mod gpu;
pub mod selftest;

pub use gpu::context::{AdapterInfo, Gpu, GpuOptions, PowerPreference};
pub use gpu::dtype::{DType, Scalar};
pub use gpu::error::GpuError;
pub use gpu::memory::{BufferGuard, DEFAULT_USAGE, STAGING_USAGE, byte_len};
pub use gpu::pipeline::{Binding, Kernel, SourceModule, Workgroups};
pub use gpu::shaders;
pub use gpu::tensor::{Shape, Tensor};
