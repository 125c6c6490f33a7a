//! Browser tests. Run with `wasm-pack test --headless --chrome` on a
//! WebGPU-capable browser.

#![cfg(target_arch = "wasm32")]

use ezwebgpu::{
    Binding, BufferGuard, DType, Gpu, GpuOptions, STAGING_USAGE, Tensor, Workgroups, byte_len,
    selftest, shaders,
};
use wasm_bindgen::{JsCast, JsValue};
use wasm_bindgen_futures::JsFuture;
use wasm_bindgen_test::*;
use web_sys::gpu_map_mode;

wasm_bindgen_test_configure!(run_in_browser);

fn message(err: JsValue) -> String {
    err.dyn_into::<js_sys::Error>()
        .map(|e| String::from(e.message()))
        .unwrap_or_default()
}

// Marks out[flat workgroup index] for every workgroup that runs.
const MARK_WORKGROUPS: &str = r#"
@group(0) @binding(0) var<storage, read_write> out: array<u32>;

@compute @workgroup_size(1)
fn mark(@builtin(workgroup_id) wid : vec3u, @builtin(num_workgroups) n : vec3u) {
    out[wid.x + wid.y * n.x + wid.z * n.x * n.y] = wid.x + 10u * wid.y + 100u * wid.z + 1u;
}
"#;

async fn marked(gpu: &Gpu, workgroups: Workgroups) -> Vec<u32> {
    let kernel = gpu.source_module(MARK_WORKGROUPS).get_function("mark").await.unwrap();
    let out = gpu.mem_alloc_init(&vec![0u32; workgroups.total() as usize]).unwrap();
    kernel.dispatch(workgroups, &[Binding::new(0, &out)]).unwrap();
    let values = gpu.map_gpu_to_cpu::<u32>(&out).await.unwrap();
    gpu.free(&out);
    values
}

#[wasm_bindgen_test]
async fn copies_round_trip() {
    let gpu = Gpu::init().await.unwrap();
    let host = [1.0f32, 2.0, 3.0];
    let buffer = gpu.mem_alloc_init(&host).unwrap();

    let mut back = [0.0f32; 3];
    gpu.memcpy_device_to_host(&mut back, &buffer).await.unwrap();
    assert_eq!(back, host);
    gpu.free(&buffer);
}

#[wasm_bindgen_test]
async fn byte_sized_data_is_padded() {
    let gpu = Gpu::init().await.unwrap();
    let host = [7u8, 8, 9];
    let buffer = gpu.mem_alloc(byte_len(&host)).unwrap();
    assert_eq!(buffer.size(), 4.0);

    gpu.memcpy_host_to_device(&buffer, &host).unwrap();
    let mut back = [0u8; 3];
    gpu.memcpy_device_to_host(&mut back, &buffer).await.unwrap();
    assert_eq!(back, host);
    gpu.free(&buffer);
}

#[wasm_bindgen_test]
async fn oversized_upload_is_rejected() {
    let gpu = Gpu::init().await.unwrap();
    let buffer = gpu.mem_alloc(4).unwrap();
    assert!(gpu.memcpy_host_to_device(&buffer, &[1u32, 2]).is_err());
    gpu.free(&buffer);
}

#[wasm_bindgen_test]
async fn zero_sized_allocation_fails() {
    let gpu = Gpu::init().await.unwrap();
    assert!(gpu.mem_alloc(0).is_err());
}

#[wasm_bindgen_test]
async fn square_example_squares() {
    let squared = selftest::square_example().await.unwrap();
    assert_eq!(squared, vec![1.0, 4.0, 9.0, 16.0]);
}

#[wasm_bindgen_test]
async fn explicit_and_positional_bindings_agree() {
    let gpu = Gpu::init().await.unwrap();
    let a: Vec<i32> = (0..16).collect();
    let b = vec![2i32; 16];

    let module = gpu.source_module(
        shaders::dot_product_kernel(DType::Int32, 64, shaders::LengthSource::Binding).unwrap(),
    );
    let dot = module.get_function("myDot").await.unwrap();

    let gpu_a = gpu.mem_alloc_init(&a).unwrap();
    let gpu_b = gpu.mem_alloc_init(&b).unwrap();
    let gpu_n = gpu.mem_alloc_init(&[16u32]).unwrap();
    let positional = gpu.mem_alloc_init(&[0i32]).unwrap();
    let explicit = gpu.mem_alloc_init(&[0i32]).unwrap();

    dot.call(&[1], &[&gpu_a, &gpu_b, &positional, &gpu_n]).unwrap();
    // Out of order on purpose: binding numbers, not positions, matter here.
    dot.call_with_bindings(
        &[1],
        &[
            Binding::new(3, &gpu_n),
            Binding::new(2, &explicit),
            Binding::new(1, &gpu_b),
            Binding::new(0, &gpu_a),
        ],
    )
    .unwrap();

    let expected: i32 = a.iter().zip(&b).map(|(x, y)| x * y).sum();
    assert_eq!(gpu.map_gpu_to_cpu::<i32>(&positional).await.unwrap(), vec![expected]);
    assert_eq!(gpu.map_gpu_to_cpu::<i32>(&explicit).await.unwrap(), vec![expected]);
}

#[wasm_bindgen_test]
async fn duplicate_bindings_are_rejected() {
    let gpu = Gpu::init().await.unwrap();
    let module = gpu.source_module(shaders::square_kernel(64));
    let square = module.get_function("square").await.unwrap();
    let data = gpu.mem_alloc_init(&[1.0f32]).unwrap();

    let result = square.call_with_bindings(&[1], &[Binding::new(0, &data), Binding::new(0, &data)]);
    assert!(result.is_err());
    assert!(square.call(&[], &[&data]).is_err());
}

#[wasm_bindgen_test]
async fn tensor_keeps_data_and_shape() {
    let gpu = Gpu::init().await.unwrap();
    let mut t = Tensor::new(&gpu, &[1u32, 2, 3, 4, 5, 6], [2, 3]).unwrap();
    assert_eq!(t.dtype(), DType::Uint32);
    assert_eq!(t.to_vec::<u32>().await.unwrap(), vec![1, 2, 3, 4, 5, 6]);
    assert!(t.to_vec::<f32>().await.is_err());

    let dims = gpu
        .map_gpu_to_cpu::<u32>(t.shape_buffer().unwrap().unwrap())
        .await
        .unwrap();
    assert_eq!(dims, vec![2, 3]);

    t.free();
    assert!(t.is_freed());
    assert!(t.data_buffer().is_err());
}

#[wasm_bindgen_test]
async fn tensor_shape_must_match_data() {
    let gpu = Gpu::init().await.unwrap();
    assert!(Tensor::new(&gpu, &[1.0f32, 2.0, 3.0], [2, 2]).is_err());
}

#[wasm_bindgen_test]
async fn zeros_tensor_reads_back_zero() {
    let gpu = Gpu::init().await.unwrap();
    let t = Tensor::zeros(&gpu, [4], DType::Float32).unwrap();
    assert_eq!(t.to_vec::<f32>().await.unwrap(), vec![0.0; 4]);
}

#[wasm_bindgen_test]
async fn self_test_passes() {
    selftest::self_test().await.unwrap();
}

#[wasm_bindgen_test]
async fn init_with_options_labels_the_device() {
    let options = GpuOptions::from_json(
        r#"{"powerPreference": "low-power", "deviceLabel": "ezwebgpu-tests"}"#,
    )
    .unwrap();
    let gpu = Gpu::init_with_options(&options).await.unwrap();
    assert_eq!(gpu.device().label(), "ezwebgpu-tests");

    let gpu = Gpu::init_with_options(&GpuOptions::high_performance()).await.unwrap();
    let data = gpu.mem_alloc_init(&[3u32]).unwrap();
    assert_eq!(gpu.map_gpu_to_cpu::<u32>(&data).await.unwrap(), vec![3]);
}

#[wasm_bindgen_test]
async fn ranged_binding_only_touches_its_window() {
    let gpu = Gpu::init().await.unwrap();
    // Offsets must be multiples of the 256 byte storage alignment.
    let host: Vec<f32> = (0..68).map(|i| i as f32).collect();
    let data = gpu.mem_alloc_init(&host).unwrap();
    let length = gpu.mem_alloc_init(&[4u32]).unwrap();

    let square = gpu
        .source_module(shaders::square_kernel(64))
        .get_function("square")
        .await
        .unwrap();
    square
        .call_with_bindings(
            &[1],
            &[
                Binding::new(0, &data).with_range(256, 16),
                Binding::new(1, &length),
            ],
        )
        .unwrap();

    let back = gpu.map_gpu_to_cpu::<f32>(&data).await.unwrap();
    assert_eq!(&back[..64], &host[..64]);
    assert_eq!(&back[64..], &[4096.0, 4225.0, 4356.0, 4489.0]);
}

#[wasm_bindgen_test]
async fn two_dimensional_dispatch_runs_every_workgroup() {
    let gpu = Gpu::init().await.unwrap();
    let values = marked(&gpu, Workgroups::new(2, 3, 1).unwrap()).await;
    assert_eq!(values, vec![1, 2, 11, 12, 21, 22]);

    let values = marked(&gpu, Workgroups::from_slice(&[3, 2]).unwrap()).await;
    assert_eq!(values, vec![1, 2, 3, 11, 12, 13]);
}

#[wasm_bindgen_test]
async fn three_dimensional_dispatch_runs_every_workgroup() {
    let gpu = Gpu::init().await.unwrap();
    let values = marked(&gpu, Workgroups::new(2, 2, 2).unwrap()).await;
    assert_eq!(values, vec![1, 2, 11, 12, 101, 102, 111, 112]);
}

#[wasm_bindgen_test]
async fn invalid_wgsl_fails_at_get_function() {
    let gpu = Gpu::init().await.unwrap();
    let module = gpu.source_module("@compute @workgroup_size(1) fn broken( {");
    let err = module.get_function("broken").await.err().unwrap();
    assert!(message(err).starts_with("entry point `broken` failed validation"));
}

#[wasm_bindgen_test]
async fn unknown_entry_point_fails_at_get_function() {
    let gpu = Gpu::init().await.unwrap();
    let module = gpu.source_module(shaders::square_kernel(64));
    assert!(module.get_function("square").await.is_ok());

    let err = module.get_function("cube").await.err().unwrap();
    assert!(message(err).starts_with("entry point `cube` failed validation"));
}

#[wasm_bindgen_test]
async fn print_gpu_buffer_reads_the_buffer() {
    let gpu = Gpu::init().await.unwrap();
    let buffer = gpu.mem_alloc_init(&[1i16, -2, 3]).unwrap();
    gpu.print_gpu_buffer::<i16>(&buffer, "values").await.unwrap();
    gpu.free(&buffer);
}

#[wasm_bindgen_test]
async fn from_slice_is_one_dimensional() {
    let gpu = Gpu::init().await.unwrap();
    let t = Tensor::from_slice(&gpu, &[1.5f64, 2.5, 3.5]).unwrap();
    assert_eq!(t.shape().dims(), &[3]);
    assert_eq!(t.numel(), 3);
    assert_eq!(t.dtype(), DType::Float64);
    assert_eq!(t.to_vec::<f64>().await.unwrap(), vec![1.5, 2.5, 3.5]);
}

#[wasm_bindgen_test]
async fn scalar_tensor_has_no_shape_buffer() {
    let gpu = Gpu::init().await.unwrap();
    let t = Tensor::new(&gpu, &[42u32], Vec::<usize>::new()).unwrap();
    assert_eq!(t.shape().rank(), 0);
    assert!(t.shape_buffer().unwrap().is_none());
    assert_eq!(t.to_vec::<u32>().await.unwrap(), vec![42]);
    t.print().await.unwrap();
}

#[wasm_bindgen_test]
async fn print_after_free_reports_freed() {
    let gpu = Gpu::init().await.unwrap();
    let mut t = Tensor::from_slice(&gpu, &[1u8, 2, 3]).unwrap();
    t.print().await.unwrap();
    t.free();

    let err = t.print().await.err().unwrap();
    assert_eq!(message(err), "tensor has already been freed");
    assert!(t.shape_buffer().is_err());
}

#[wasm_bindgen_test]
async fn dropped_guard_destroys_its_buffer() {
    let gpu = Gpu::init().await.unwrap();

    let buffer = gpu.mem_alloc_with_usage(16, STAGING_USAGE).unwrap();
    drop(BufferGuard::new(buffer.clone()));
    assert!(JsFuture::from(buffer.map_async(gpu_map_mode::READ)).await.is_err());

    let buffer = BufferGuard::new(gpu.mem_alloc_with_usage(16, STAGING_USAGE).unwrap()).keep();
    assert!(JsFuture::from(buffer.map_async(gpu_map_mode::READ)).await.is_ok());
    buffer.unmap();
    gpu.free(&buffer);
}
