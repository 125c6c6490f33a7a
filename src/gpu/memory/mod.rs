// Buffer Memory Management
// Allocation and host <-> device copies on top of the GPU context
// Responsibilities:
// - Allocate storage buffers with default usage flags
// - Upload host slices through the queue
// - Read device buffers back through a mappable staging buffer
// - Free buffers

use js_sys::Uint8Array;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{GpuBuffer, gpu_buffer_usage, gpu_map_mode};

use crate::console_log;
use crate::gpu::context::Gpu;
use crate::gpu::dtype::Scalar;
use crate::gpu::error::GpuError;
use crate::gpu::utils::{align_to_copy, pad_to_copy_alignment, submit};

pub const DEFAULT_USAGE: u32 =
    gpu_buffer_usage::STORAGE | gpu_buffer_usage::COPY_DST | gpu_buffer_usage::COPY_SRC;

pub const STAGING_USAGE: u32 = gpu_buffer_usage::COPY_DST | gpu_buffer_usage::MAP_READ;

pub fn byte_len<T: Scalar>(values: &[T]) -> u64 {
    (values.len() * T::DTYPE.byte_size()) as u64
}

fn allocation_size(bytes: u64) -> Result<u64, GpuError> {
    if bytes == 0 {
        return Err(GpuError::ZeroSizedAllocation);
    }
    Ok(align_to_copy(bytes))
}

fn check_fits(data: u64, buffer: u64) -> Result<(), GpuError> {
    if data > buffer {
        return Err(GpuError::HostDataTooLarge { data, buffer });
    }
    Ok(())
}

// Same contract as TypedArray.set: the device contents must fit, shorter
// contents only overwrite the prefix. Alignment padding is not counted, so
// up to 3 bytes of real data past the host slice are dropped without an
// error (a 4 byte buffer holding two u16 values fits a one element slice).
fn copy_into_host<T: Scalar>(host: &mut [T], device: &[T]) -> Result<(), GpuError> {
    let size = T::DTYPE.byte_size() as u64;
    let host_bytes = align_to_copy(host.len() as u64 * size);
    if device.len() as u64 * size > host_bytes {
        return Err(GpuError::HostSliceTooSmall {
            device: device.len(),
            host: host.len(),
        });
    }
    let n = host.len().min(device.len());
    host[..n].copy_from_slice(&device[..n]);
    Ok(())
}

/// Owns a buffer and destroys it on drop unless released with `keep`.
pub struct BufferGuard {
    buffer: GpuBuffer,
    armed: bool,
}

impl BufferGuard {
    pub fn new(buffer: GpuBuffer) -> Self {
        Self {
            buffer,
            armed: true,
        }
    }

    pub fn buffer(&self) -> &GpuBuffer {
        &self.buffer
    }

    pub fn keep(mut self) -> GpuBuffer {
        self.armed = false;
        self.buffer.clone()
    }
}

impl Drop for BufferGuard {
    fn drop(&mut self) {
        if self.armed {
            self.buffer.unmap();
            self.buffer.destroy();
        }
    }
}

impl Gpu {
    pub fn mem_alloc(&self, bytes: u64) -> Result<GpuBuffer, JsValue> {
        self.mem_alloc_with_usage(bytes, DEFAULT_USAGE)
    }

    pub fn mem_alloc_with_usage(&self, bytes: u64, usage: u32) -> Result<GpuBuffer, JsValue> {
        let size = allocation_size(bytes)?;
        let descriptor = web_sys::GpuBufferDescriptor::new(size as f64, usage);
        descriptor.set_mapped_at_creation(false);
        self.device.create_buffer(&descriptor)
    }

    /// Allocates a buffer sized for `data` and uploads it.
    pub fn mem_alloc_init<T: Scalar>(&self, data: &[T]) -> Result<GpuBuffer, JsValue> {
        let buffer = BufferGuard::new(self.mem_alloc(byte_len(data))?);
        self.memcpy_host_to_device(buffer.buffer(), data)?;
        Ok(buffer.keep())
    }

    pub fn memcpy_host_to_device<T: Scalar>(
        &self,
        buffer: &GpuBuffer,
        data: &[T],
    ) -> Result<(), JsValue> {
        let bytes = pad_to_copy_alignment(T::encode(data));
        check_fits(bytes.len() as u64, buffer.size() as u64)?;

        let data = Uint8Array::from(bytes.as_slice());
        self.queue().write_buffer_with_u32_and_u8_array(buffer, 0, &data)
    }

    pub async fn memcpy_device_to_host<T: Scalar>(
        &self,
        host: &mut [T],
        buffer: &GpuBuffer,
    ) -> Result<(), JsValue> {
        let values = self.map_gpu_to_cpu::<T>(buffer).await?;
        copy_into_host(host, &values)?;
        Ok(())
    }

    pub async fn map_gpu_to_cpu<T: Scalar>(&self, src: &GpuBuffer) -> Result<Vec<T>, JsValue> {
        let bytes = self.read_buffer_bytes(src).await?;
        Ok(T::decode(&bytes))
    }

    /// Copies `src` into a fresh staging buffer, maps it and returns its bytes.
    /// The staging buffer is destroyed on every path, including failures.
    pub async fn read_buffer_bytes(&self, src: &GpuBuffer) -> Result<Vec<u8>, JsValue> {
        let size = src.size();
        let staging = BufferGuard::new(self.mem_alloc_with_usage(size as u64, STAGING_USAGE)?);

        let command_encoder = self.device.create_command_encoder();
        command_encoder.copy_buffer_to_buffer_with_f64_and_f64_and_f64(
            src,
            0.0,
            staging.buffer(),
            0.0,
            size,
        )?;
        submit(&self.device, &command_encoder);

        JsFuture::from(staging.buffer().map_async(gpu_map_mode::READ)).await?;
        let range = staging.buffer().get_mapped_range()?;
        Ok(Uint8Array::new(&range).to_vec())
    }

    pub fn free(&self, buffer: &GpuBuffer) {
        buffer.destroy();
    }

    pub async fn print_gpu_buffer<T: Scalar>(
        &self,
        buffer: &GpuBuffer,
        label: &str,
    ) -> Result<(), JsValue> {
        let values = self.map_gpu_to_cpu::<T>(buffer).await?;
        console_log!("{} {:?}", label, values);
        Ok(())
    }
}
