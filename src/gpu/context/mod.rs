// GPU Context Management
// Handles WebGPU initialization and adapter/device creation
// Main responsibilities:
// - Request and configure GPU adapter
// - Create and manage GPU device
// - Report adapter information
// - Hand out SourceModules bound to the device

mod options;

pub use options::{GpuOptions, PowerPreference};

use serde::{Deserialize, Serialize};
use wasm_bindgen::prelude::*;
use wasm_bindgen_futures::JsFuture;
use web_sys::{GpuAdapter, GpuDevice, GpuQueue};

use crate::console_log;
use crate::gpu::error::GpuError;
use crate::gpu::pipeline::SourceModule;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdapterInfo {
    pub vendor: String,
    pub architecture: String,
    pub device: String,
    pub description: String,
}

#[derive(Clone)]
pub struct Gpu {
    pub(crate) adapter: GpuAdapter,
    pub(crate) device: GpuDevice,
}

impl Gpu {
    pub async fn init() -> Result<Self, JsValue> {
        Self::init_with_options(&GpuOptions::default()).await
    }

    pub async fn init_with_options(options: &GpuOptions) -> Result<Self, JsValue> {
        let window = web_sys::window().ok_or_else(|| JsValue::from_str("no window available"))?;
        let gpu = window.navigator().gpu();

        // Request adapter
        let adapter_promise = gpu.request_adapter_with_options(&options.adapter_options());
        let adapter = JsFuture::from(adapter_promise).await?;
        if adapter.is_null() || adapter.is_undefined() {
            return Err(GpuError::NoAdapter.into());
        }
        let adapter: GpuAdapter = adapter.into();

        // Request device
        let device_promise = adapter.request_device_with_descriptor(&options.device_descriptor());
        let device = JsFuture::from(device_promise).await?;
        if device.is_null() || device.is_undefined() {
            return Err(GpuError::NoDevice.into());
        }
        let device: GpuDevice = device.into();

        console_log!("WebGPU device ready");
        Ok(Self { adapter, device })
    }

    pub fn adapter(&self) -> &GpuAdapter {
        &self.adapter
    }

    pub fn device(&self) -> &GpuDevice {
        &self.device
    }

    pub fn queue(&self) -> GpuQueue {
        self.device.queue()
    }

    pub fn device_info(&self) -> AdapterInfo {
        let info = self.adapter.info();
        AdapterInfo {
            vendor: info.vendor(),
            architecture: info.architecture(),
            device: info.device(),
            description: info.description(),
        }
    }

    pub fn print_device_info(&self) {
        web_sys::console::table_1(&self.adapter.info());
    }

    pub fn source_module(&self, kernel: impl Into<String>) -> SourceModule {
        SourceModule::new(self, kernel)
    }
}
