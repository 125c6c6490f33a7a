// Shader Generation
// WGSL compute kernels used by the self-test and the demo page
// - Element-wise square of an f32 array
// - Single-workgroup dot product over f32/i32/u32 storage arrays

use crate::gpu::dtype::DType;
use crate::gpu::error::GpuError;

pub const THREADS_PER_BLOCK: u32 = 256;

/// Where the dot product kernel reads the element count from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LengthSource {
    /// Baked into the shader text.
    Constant(u32),
    /// Read from a `u32` storage buffer at binding 3.
    Binding,
}

/// Squares `data` in place. Binding 0: `array<f32>`, binding 1: `u32` length.
pub fn square_kernel(workgroup_size: u32) -> String {
    format!(
        r#"
@group(0) @binding(0) var<storage, read_write> data: array<f32>;
@group(0) @binding(1) var<storage, read> length: u32;

@compute @workgroup_size({workgroup_size})
fn square(@builtin(global_invocation_id) gid : vec3u) {{
    if (gid.x < length) {{
        data[gid.x] = data[gid.x] * data[gid.x];
    }}
}}
"#
    )
}

/// Dot product of bindings 0 and 1, accumulated into the scalar at binding 2.
/// Only the first `workgroup_size` elements are covered, so dispatch one
/// workgroup.
pub fn dot_product_kernel(
    dtype: DType,
    workgroup_size: u32,
    length: LengthSource,
) -> Result<String, GpuError> {
    let scalar = dtype.wgsl().ok_or(GpuError::NoWgslType(dtype.name()))?;

    let (length_decl, length_expr) = match length {
        LengthSource::Constant(n) => (String::new(), format!("{n}u")),
        LengthSource::Binding => (
            "@group(0) @binding(3) var<storage, read> n: u32;\n".to_string(),
            "n".to_string(),
        ),
    };

    Ok(format!(
        r#"
@group(0) @binding(0) var<storage, read> a: array<{scalar}>;
@group(0) @binding(1) var<storage, read> b: array<{scalar}>;
@group(0) @binding(2) var<storage, read_write> c: {scalar};
{length_decl}
var<workgroup> partialSums: array<{scalar}, {workgroup_size}>;

@compute @workgroup_size({workgroup_size})
fn myDot(@builtin(global_invocation_id) gid : vec3u, @builtin(local_invocation_id) lid : vec3u) {{
    if (gid.x < {length_expr}) {{
        partialSums[lid.x] = a[gid.x] * b[gid.x];
    }}
    workgroupBarrier();

    if (lid.x == 0u) {{
        var summed: {scalar} = {scalar}(0);
        for (var i: u32 = 0u; i < {workgroup_size}u; i++) {{
            summed += partialSums[i];
        }}
        c += summed;
    }}
}}
"#
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn square_kernel_uses_workgroup_size() {
        let src = square_kernel(64);
        assert!(src.contains("@workgroup_size(64)"));
        assert!(src.contains("fn square("));
    }

    #[test]
    fn constant_length_is_inlined() {
        let src = dot_product_kernel(DType::Float32, 256, LengthSource::Constant(128)).unwrap();
        assert!(src.contains("array<f32>"));
        assert!(src.contains("gid.x < 128u"));
        assert!(!src.contains("@binding(3)"));
    }

    #[test]
    fn binding_length_declares_fourth_buffer() {
        let src = dot_product_kernel(DType::Uint32, 256, LengthSource::Binding).unwrap();
        assert!(src.contains("var<storage, read_write> c: u32;"));
        assert!(src.contains("@group(0) @binding(3) var<storage, read> n: u32;"));
        assert!(src.contains("gid.x < n"));
    }

    #[test]
    fn rejects_types_without_wgsl_storage() {
        assert_eq!(
            dot_product_kernel(DType::Uint8, 256, LengthSource::Binding),
            Err(GpuError::NoWgslType("Uint8Array"))
        );
    }
}
