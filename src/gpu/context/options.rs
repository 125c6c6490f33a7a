// Adapter/device options. Defaults match a plain `requestAdapter()` call.

use serde::{Deserialize, Serialize};
use web_sys::GpuPowerPreference;

use crate::gpu::error::GpuError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PowerPreference {
    LowPower,
    HighPerformance,
}

impl From<PowerPreference> for GpuPowerPreference {
    fn from(pref: PowerPreference) -> Self {
        match pref {
            PowerPreference::LowPower => GpuPowerPreference::LowPower,
            PowerPreference::HighPerformance => GpuPowerPreference::HighPerformance,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct GpuOptions {
    pub power_preference: Option<PowerPreference>,
    pub force_fallback_adapter: bool,
    pub device_label: Option<String>,
}

impl GpuOptions {
    pub fn from_json(json: &str) -> Result<Self, GpuError> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn high_performance() -> Self {
        Self {
            power_preference: Some(PowerPreference::HighPerformance),
            ..Self::default()
        }
    }

    pub(crate) fn adapter_options(&self) -> web_sys::GpuRequestAdapterOptions {
        let options = web_sys::GpuRequestAdapterOptions::new();
        if let Some(pref) = self.power_preference {
            options.set_power_preference(pref.into());
        }
        options.set_force_fallback_adapter(self.force_fallback_adapter);
        options
    }

    pub(crate) fn device_descriptor(&self) -> web_sys::GpuDeviceDescriptor {
        let descriptor = web_sys::GpuDeviceDescriptor::new();
        if let Some(label) = &self.device_label {
            descriptor.set_label(label);
        }
        descriptor
    }
}
