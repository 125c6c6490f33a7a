// Compute Pipeline Management
// Compiles WGSL kernels and turns their entry points into callable kernels
// Responsibilities:
// - Create shader modules from kernel source
// - Create compute pipelines with an automatic layout
// - Build bind groups from explicit or positional bindings
// - Encode, dispatch and submit compute passes

mod workgroups;

pub use workgroups::Workgroups;

use std::collections::HashSet;

use wasm_bindgen::JsCast;
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{GpuBindGroupLayout, GpuBuffer, GpuComputePipeline, GpuDevice, GpuErrorFilter};

use crate::gpu::context::Gpu;
use crate::gpu::error::GpuError;
use crate::gpu::utils::submit;

/// A buffer bound to a slot of bind group 0.
#[derive(Clone)]
pub struct Binding {
    pub binding: u32,
    pub buffer: GpuBuffer,
    pub offset: Option<u64>,
    pub size: Option<u64>,
}

impl Binding {
    pub fn new(binding: u32, buffer: &GpuBuffer) -> Self {
        Self {
            binding,
            buffer: buffer.clone(),
            offset: None,
            size: None,
        }
    }

    pub fn with_range(mut self, offset: u64, size: u64) -> Self {
        self.offset = Some(offset);
        self.size = Some(size);
        self
    }

    /// Binding numbers inferred from position: buffer `i` goes to binding `i`.
    pub fn positional(buffers: &[&GpuBuffer]) -> Vec<Self> {
        buffers
            .iter()
            .zip(0u32..)
            .map(|(buffer, binding)| Self::new(binding, buffer))
            .collect()
    }

    fn entry(&self) -> web_sys::GpuBindGroupEntry {
        let resource = web_sys::GpuBufferBinding::new(&self.buffer);
        if let Some(offset) = self.offset {
            resource.set_offset(offset as f64);
        }
        if let Some(size) = self.size {
            resource.set_size(size as f64);
        }
        web_sys::GpuBindGroupEntry::new(self.binding, &resource)
    }
}

fn check_unique_bindings(bindings: impl IntoIterator<Item = u32>) -> Result<(), GpuError> {
    let mut seen = HashSet::new();
    for binding in bindings {
        if !seen.insert(binding) {
            return Err(GpuError::DuplicateBinding(binding));
        }
    }
    Ok(())
}

pub struct SourceModule {
    device: GpuDevice,
    kernel: String,
}

impl SourceModule {
    pub fn new(gpu: &Gpu, kernel: impl Into<String>) -> Self {
        Self {
            device: gpu.device().clone(),
            kernel: kernel.into(),
        }
    }

    pub fn source(&self) -> &str {
        &self.kernel
    }

    /// Compiles the module and returns the compute entry point `name`
    /// (e.g. `main` for `fn main`). WGSL errors and unknown entry points are
    /// reported here rather than on the first dispatch.
    pub async fn get_function(&self, name: &str) -> Result<Kernel, JsValue> {
        self.device.push_error_scope(GpuErrorFilter::Validation);

        let descriptor = web_sys::GpuShaderModuleDescriptor::new(&self.kernel);
        descriptor.set_label(name);
        let module = self.device.create_shader_module(&descriptor);

        let compute_stage = web_sys::GpuProgrammableStage::new(&module);
        compute_stage.set_entry_point(name);

        let pipeline_desc =
            web_sys::GpuComputePipelineDescriptor::new(&JsValue::from_str("auto"), &compute_stage);
        pipeline_desc.set_label(name);
        let pipeline = self.device.create_compute_pipeline(&pipeline_desc);

        let scope = JsFuture::from(self.device.pop_error_scope()).await?;
        if !scope.is_null() && !scope.is_undefined() {
            let err: web_sys::GpuError = scope.unchecked_into();
            return Err(GpuError::Validation {
                entry_point: name.to_string(),
                message: err.message(),
            }
            .into());
        }

        let bind_group_layout = pipeline.get_bind_group_layout(0);
        Ok(Kernel {
            device: self.device.clone(),
            pipeline,
            bind_group_layout,
            name: name.to_string(),
        })
    }
}

pub struct Kernel {
    device: GpuDevice,
    pipeline: GpuComputePipeline,
    bind_group_layout: GpuBindGroupLayout,
    name: String,
}

impl Kernel {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn pipeline(&self) -> &GpuComputePipeline {
        &self.pipeline
    }

    /// Dispatches with `buffers[i]` bound to binding `i`.
    pub fn call(&self, workgroups: &[u32], buffers: &[&GpuBuffer]) -> Result<(), JsValue> {
        self.call_with_bindings(workgroups, &Binding::positional(buffers))
    }

    pub fn call_with_bindings(
        &self,
        workgroups: &[u32],
        bindings: &[Binding],
    ) -> Result<(), JsValue> {
        let workgroups = Workgroups::from_slice(workgroups)?;
        self.dispatch(workgroups, bindings)
    }

    pub fn dispatch(&self, workgroups: Workgroups, bindings: &[Binding]) -> Result<(), JsValue> {
        check_unique_bindings(bindings.iter().map(|b| b.binding))?;

        let entries = js_sys::Array::new();
        for binding in bindings {
            entries.push(&binding.entry());
        }
        let bind_group_desc =
            web_sys::GpuBindGroupDescriptor::new(&entries, &self.bind_group_layout);
        let bind_group = self.device.create_bind_group(&bind_group_desc);

        let command_encoder = self.device.create_command_encoder();
        let pass = command_encoder.begin_compute_pass();
        pass.set_pipeline(&self.pipeline);
        pass.set_bind_group(0, Some(&bind_group));
        pass.dispatch_workgroups_with_workgroup_count_y_and_workgroup_count_z(
            workgroups.x,
            workgroups.y,
            workgroups.z,
        );
        pass.end();

        submit(&self.device, &command_encoder);
        Ok(())
    }
}
