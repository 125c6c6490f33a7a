// GPU module - organizes all WebGPU compute functionality
// This module provides abstractions for WebGPU operations including:
// - Context management (adapter, device)
// - Buffer allocation and host/device copies
// - Kernel compilation and dispatch
// - A minimal tensor type and bundled WGSL kernels

pub mod context;
pub mod dtype;
pub mod error;
pub mod memory;
pub mod pipeline;
pub mod shaders;
pub mod tensor;
pub mod utils;
