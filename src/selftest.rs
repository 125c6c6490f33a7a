// Self Test
// In-browser checks of the copy helpers, kernels and tensors, plus the
// square example shown on the demo page. Each returns an error describing
// the first failed check.

use wasm_bindgen::prelude::*;

use crate::console_log;
use crate::gpu::context::Gpu;
use crate::gpu::dtype::DType;
use crate::gpu::memory::byte_len;
use crate::gpu::pipeline::Binding;
use crate::gpu::shaders::{self, LengthSource, THREADS_PER_BLOCK};
use crate::gpu::tensor::Tensor;

fn check(truth: bool, msg: &str) -> Result<(), JsValue> {
    if truth {
        Ok(())
    } else {
        Err(js_sys::Error::new(msg).into())
    }
}

fn random_f32(len: usize) -> Vec<f32> {
    (0..len).map(|_| js_sys::Math::random() as f32).collect()
}

#[wasm_bindgen]
pub async fn test_mem_alloc_and_copy() -> Result<(), JsValue> {
    let gpu = Gpu::init().await?;
    let c = [1.0f32, 2.0, 3.0];
    let mut result = [0.0f32; 3];

    let c_gpu = gpu.mem_alloc(byte_len(&c))?;
    gpu.memcpy_host_to_device(&c_gpu, &c)?;
    gpu.memcpy_device_to_host(&mut result, &c_gpu).await?;

    check(
        c == result,
        "[testMemAllocAndCopy] Data not copied to or from GPU correctly.",
    )?;
    console_log!("[testMemAllocAndCopy] PASSED");

    gpu.free(&c_gpu);
    Ok(())
}

#[wasm_bindgen]
pub async fn test_single_workgroup() -> Result<(), JsValue> {
    let gpu = Gpu::init().await?;

    let length = 128;
    let cpu_a = random_f32(length);
    let cpu_b = random_f32(length);
    let mut cpu_c = [0.0f32];

    let gpu_a = gpu.mem_alloc_init(&cpu_a)?;
    let gpu_b = gpu.mem_alloc_init(&cpu_b)?;
    let gpu_c = gpu.mem_alloc_init(&cpu_c)?;

    let module = gpu.source_module(shaders::dot_product_kernel(
        DType::Float32,
        THREADS_PER_BLOCK,
        LengthSource::Constant(length as u32),
    )?);
    let dot = module.get_function("myDot").await?;
    dot.call_with_bindings(
        &[1],
        &[
            Binding::new(0, &gpu_a),
            Binding::new(1, &gpu_b),
            Binding::new(2, &gpu_c),
        ],
    )?;

    // copy back the result and compare
    gpu.memcpy_device_to_host(&mut cpu_c, &gpu_c).await?;
    let expected: f32 = cpu_a.iter().zip(&cpu_b).map(|(a, b)| a * b).sum();

    check(
        expected.round() == cpu_c[0].round() || (expected - cpu_c[0]).abs() < 1e-3,
        "[testSingleWorkgroup] incorrect dot product",
    )?;
    console_log!("[testSingleWorkgroup] PASSED");

    for buffer in [&gpu_a, &gpu_b, &gpu_c] {
        gpu.free(buffer);
    }
    Ok(())
}

#[wasm_bindgen]
pub async fn test_other_types() -> Result<(), JsValue> {
    let gpu = Gpu::init().await?;

    let length = 256u32;
    let cpu_a: Vec<u32> = (0..length).collect();
    let cpu_b = vec![1u32; length as usize];
    let mut cpu_c = [0u32];
    let cpu_n = [length];

    let gpu_a = gpu.mem_alloc_init(&cpu_a)?;
    let gpu_b = gpu.mem_alloc_init(&cpu_b)?;
    let gpu_c = gpu.mem_alloc_init(&cpu_c)?;
    let gpu_n = gpu.mem_alloc_init(&cpu_n)?;

    let module = gpu.source_module(shaders::dot_product_kernel(
        DType::Uint32,
        THREADS_PER_BLOCK,
        LengthSource::Binding,
    )?);
    let dot = module.get_function("myDot").await?;
    dot.call(&[1], &[&gpu_a, &gpu_b, &gpu_c, &gpu_n])?;

    gpu.memcpy_device_to_host(&mut cpu_c, &gpu_c).await?;
    let expected: u32 = cpu_a.iter().zip(&cpu_b).map(|(a, b)| a * b).sum();

    check(expected == cpu_c[0], "[testOtherTypes] incorrect dot product")?;
    console_log!("[testOtherTypes] PASSED");

    for buffer in [&gpu_a, &gpu_b, &gpu_c, &gpu_n] {
        gpu.free(buffer);
    }
    Ok(())
}

#[wasm_bindgen]
pub async fn test_tensor() -> Result<(), JsValue> {
    let gpu = Gpu::init().await?;
    let mut a = Tensor::new(&gpu, &[1.0f32, 2.0, 3.0, 4.0], [2, 2])?;
    a.print().await?;

    let values = a.to_vec::<f32>().await?;
    check(values == [1.0, 2.0, 3.0, 4.0], "[testTensor] data mismatch")?;

    let shape_buffer = a.shape_buffer()?.ok_or_else(|| JsValue::from_str("missing shape buffer"))?;
    let dims = gpu.map_gpu_to_cpu::<u32>(shape_buffer).await?;
    check(dims == [2, 2], "[testTensor] shape mismatch")?;
    console_log!("[testTensor] PASSED");

    a.free();
    Ok(())
}

#[wasm_bindgen]
pub async fn self_test() -> Result<(), JsValue> {
    test_mem_alloc_and_copy().await?;
    test_single_workgroup().await?;
    test_other_types().await?;
    test_tensor().await?;
    Ok(())
}

/// Squares [1, 2, 3, 4] on the GPU and returns the result.
#[wasm_bindgen]
pub async fn square_example() -> Result<Vec<f32>, JsValue> {
    let gpu = Gpu::init().await?;

    // cpu data
    let mut cpu_data = [1.0f32, 2.0, 3.0, 4.0];
    let cpu_length = [cpu_data.len() as u32];

    // move cpu data to gpu
    let gpu_data = gpu.mem_alloc(byte_len(&cpu_data))?;
    let gpu_length = gpu.mem_alloc(byte_len(&cpu_length))?;
    gpu.memcpy_host_to_device(&gpu_data, &cpu_data)?;
    gpu.memcpy_host_to_device(&gpu_length, &cpu_length)?;

    let module = gpu.source_module(shaders::square_kernel(THREADS_PER_BLOCK));
    let square = module.get_function("square").await?;
    square.call(&[1], &[&gpu_data, &gpu_length])?;

    // bring result back to cpu
    gpu.memcpy_device_to_host(&mut cpu_data, &gpu_data).await?;
    console_log!("{:?}", cpu_data);

    gpu.free(&gpu_data);
    gpu.free(&gpu_length);
    Ok(cpu_data.to_vec())
}
