// WebGPU Utilities
// Helper functions for common WebGPU operations
// - Console logging
// - Copy alignment for buffer writes and buffer-to-buffer copies
// - Command buffer submission

use wasm_bindgen::prelude::*;
use web_sys::{GpuCommandEncoder, GpuDevice};

#[wasm_bindgen]
extern "C" {
    #[wasm_bindgen(js_namespace = console)]
    pub fn log(s: &str);
}

#[macro_export]
macro_rules! console_log {
    ($($t:tt)*) => ($crate::gpu::utils::log(&format_args!($($t)*).to_string()))
}

/// `writeBuffer` and `copyBufferToBuffer` sizes must be multiples of this.
pub const COPY_BUFFER_ALIGNMENT: u64 = 4;

pub fn align_to_copy(bytes: u64) -> u64 {
    bytes.div_ceil(COPY_BUFFER_ALIGNMENT) * COPY_BUFFER_ALIGNMENT
}

pub fn pad_to_copy_alignment(mut bytes: Vec<u8>) -> Vec<u8> {
    let aligned = align_to_copy(bytes.len() as u64) as usize;
    bytes.resize(aligned, 0);
    bytes
}

pub fn submit(device: &GpuDevice, command_encoder: &GpuCommandEncoder) {
    device
        .queue()
        .submit(&js_sys::Array::of1(&command_encoder.finish()));
}
