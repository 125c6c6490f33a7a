// Error Types
// Host-side validation failures raised before anything reaches the device.
// Browser-facing functions return JsValue errors; GpuError converts into a
// JS `Error` so it can be thrown back to callers.

use wasm_bindgen::JsValue;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum GpuError {
    #[error("adapter exists")]
    NoAdapter,

    #[error("device exists")]
    NoDevice,

    #[error("cannot allocate a zero-sized buffer")]
    ZeroSizedAllocation,

    #[error("host data is {data} bytes but the device buffer holds {buffer} bytes")]
    HostDataTooLarge { data: u64, buffer: u64 },

    #[error("device buffer holds {device} elements but the host slice only has room for {host}")]
    HostSliceTooSmall { device: usize, host: usize },

    #[error("workgroups must have between 1 and 3 dimensions, got {0}")]
    WorkgroupDimensions(usize),

    #[error("workgroup count in dimension {0} must be at least 1")]
    EmptyWorkgroupDimension(usize),

    #[error("binding {0} is specified more than once")]
    DuplicateBinding(u32),

    #[error("shape {shape:?} describes {expected} elements but {actual} were given")]
    ShapeMismatch {
        shape: Vec<usize>,
        expected: usize,
        actual: usize,
    },

    #[error("shape {0:?} has more elements than fit in memory")]
    ShapeOverflow(Vec<usize>),

    #[error("dimension {0} does not fit in a u32 shape buffer")]
    DimensionTooLarge(usize),

    #[error("tensor holds {expected} elements, not {actual}")]
    DTypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("{0} has no WGSL storage type")]
    NoWgslType(&'static str),

    #[error("entry point `{entry_point}` failed validation: {message}")]
    Validation {
        entry_point: String,
        message: String,
    },

    #[error("tensor has already been freed")]
    Freed,

    #[error("invalid options: {0}")]
    Options(String),
}

impl From<GpuError> for JsValue {
    fn from(err: GpuError) -> Self {
        js_sys::Error::new(&err.to_string()).into()
    }
}

impl From<serde_json::Error> for GpuError {
    fn from(err: serde_json::Error) -> Self {
        GpuError::Options(err.to_string())
    }
}
