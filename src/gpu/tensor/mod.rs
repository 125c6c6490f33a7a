// Tensor
// Minimal device-resident tensor: a data buffer, its element type and a
// u32 shape buffer kernels can bind next to the data.

mod shape;

pub use shape::Shape;

use wasm_bindgen::prelude::*;
use web_sys::GpuBuffer;

use crate::console_log;
use crate::gpu::context::Gpu;
use crate::gpu::dtype::{DType, Scalar};
use crate::gpu::error::GpuError;
use crate::gpu::memory::BufferGuard;

struct TensorBuffers {
    data: GpuBuffer,
    // None for rank-0 tensors, which have no dims to upload.
    shape: Option<GpuBuffer>,
}

pub struct Tensor {
    gpu: Gpu,
    buffers: Option<TensorBuffers>,
    shape: Shape,
    numel: usize,
    dtype: DType,
}

// Everything a tensor needs that can fail without touching the device.
#[derive(Debug, PartialEq, Eq)]
struct Layout {
    numel: usize,
    bytes: u64,
    words: Vec<u32>,
}

fn layout(shape: &Shape, dtype: DType) -> Result<Layout, GpuError> {
    Ok(Layout {
        numel: shape.numel()?,
        bytes: shape.byte_len(dtype)?,
        words: shape.to_u32_words()?,
    })
}

impl Tensor {
    pub fn new<T: Scalar>(gpu: &Gpu, data: &[T], shape: impl Into<Shape>) -> Result<Self, JsValue> {
        let shape = shape.into();
        let plan = layout(&shape, T::DTYPE)?;
        shape.check_len(data.len())?;

        let data = BufferGuard::new(gpu.mem_alloc_init(data)?);
        let shape_buffer = upload_shape(gpu, &plan.words)?;
        Ok(Self::from_parts(gpu, data.keep(), shape_buffer, shape, plan, T::DTYPE))
    }

    pub fn from_slice<T: Scalar>(gpu: &Gpu, data: &[T]) -> Result<Self, JsValue> {
        Self::new(gpu, data, [data.len()])
    }

    /// New device buffers start zeroed, so nothing is uploaded for the data.
    pub fn zeros(gpu: &Gpu, shape: impl Into<Shape>, dtype: DType) -> Result<Self, JsValue> {
        let shape = shape.into();
        let plan = layout(&shape, dtype)?;

        let data = BufferGuard::new(gpu.mem_alloc(plan.bytes)?);
        let shape_buffer = upload_shape(gpu, &plan.words)?;
        Ok(Self::from_parts(gpu, data.keep(), shape_buffer, shape, plan, dtype))
    }

    fn from_parts(
        gpu: &Gpu,
        data: GpuBuffer,
        shape_buffer: Option<GpuBuffer>,
        shape: Shape,
        plan: Layout,
        dtype: DType,
    ) -> Self {
        Self {
            gpu: gpu.clone(),
            buffers: Some(TensorBuffers {
                data,
                shape: shape_buffer,
            }),
            shape,
            numel: plan.numel,
            dtype,
        }
    }

    pub fn shape(&self) -> &Shape {
        &self.shape
    }

    pub fn dtype(&self) -> DType {
        self.dtype
    }

    pub fn numel(&self) -> usize {
        self.numel
    }

    pub fn is_freed(&self) -> bool {
        self.buffers.is_none()
    }

    fn buffers(&self) -> Result<&TensorBuffers, GpuError> {
        self.buffers.as_ref().ok_or(GpuError::Freed)
    }

    pub fn data_buffer(&self) -> Result<&GpuBuffer, GpuError> {
        Ok(&self.buffers()?.data)
    }

    pub fn shape_buffer(&self) -> Result<Option<&GpuBuffer>, GpuError> {
        Ok(self.buffers()?.shape.as_ref())
    }

    pub async fn to_vec<T: Scalar>(&self) -> Result<Vec<T>, JsValue> {
        check_dtype::<T>(self.dtype)?;
        let mut values = self.gpu.map_gpu_to_cpu::<T>(self.data_buffer()?).await?;
        values.truncate(self.numel());
        Ok(values)
    }

    pub async fn print(&self) -> Result<(), JsValue> {
        let bytes = self.gpu.read_buffer_bytes(self.data_buffer()?).await?;
        console_log!("{}", describe(self.dtype, &bytes, self.numel(), &self.shape));
        Ok(())
    }

    pub fn free(&mut self) {
        if let Some(buffers) = self.buffers.take() {
            self.gpu.free(&buffers.data);
            if let Some(shape) = &buffers.shape {
                self.gpu.free(shape);
            }
        }
    }
}

fn upload_shape(gpu: &Gpu, words: &[u32]) -> Result<Option<GpuBuffer>, JsValue> {
    if words.is_empty() {
        return Ok(None);
    }
    Ok(Some(gpu.mem_alloc_init(words)?))
}

fn check_dtype<T: Scalar>(dtype: DType) -> Result<(), GpuError> {
    if T::DTYPE != dtype {
        return Err(GpuError::DTypeMismatch {
            expected: dtype.name(),
            actual: T::DTYPE.name(),
        });
    }
    Ok(())
}

fn decoded<T: Scalar>(bytes: &[u8], len: usize) -> String {
    let mut values = T::decode(bytes);
    values.truncate(len);
    format!("{:?}", values)
}

fn describe(dtype: DType, bytes: &[u8], len: usize, shape: &Shape) -> String {
    let data = match dtype {
        DType::Float32 => decoded::<f32>(bytes, len),
        DType::Float64 => decoded::<f64>(bytes, len),
        DType::Int8 => decoded::<i8>(bytes, len),
        DType::Uint8 => decoded::<u8>(bytes, len),
        DType::Int16 => decoded::<i16>(bytes, len),
        DType::Uint16 => decoded::<u16>(bytes, len),
        DType::Int32 => decoded::<i32>(bytes, len),
        DType::Uint32 => decoded::<u32>(bytes, len),
    };
    format!("Tensor(dtype={}, data={}, shape={})", dtype, data, shape)
}
