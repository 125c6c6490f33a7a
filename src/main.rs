use ezwebgpu::{Gpu, console_log, selftest};
use leptos::prelude::*;
use wasm_bindgen::prelude::*;

async fn run_square() -> Result<(), JsValue> {
    console_log!("Starting square example...");
    let squared = selftest::square_example().await?;
    console_log!("Squared: {:?}", squared);
    Ok(())
}

async fn run_self_test() -> Result<(), JsValue> {
    console_log!("Running self test...");
    selftest::self_test().await?;
    console_log!("Self test passed!");
    Ok(())
}

async fn show_device_info() -> Result<(), JsValue> {
    let gpu = Gpu::init().await?;
    gpu.print_device_info();
    let info = serde_json::to_string(&gpu.device_info())
        .map_err(|e| JsValue::from_str(&e.to_string()))?;
    console_log!("Adapter: {}", info);
    Ok(())
}

fn main() {
    leptos::mount::mount_to_body(|| {
        view! {
            <div>
                <h1>"WebGPU Compute"</h1>
                <p>"Results are written to the browser console."</p>
                <div>
                    <button on:click=move |_| {
                        wasm_bindgen_futures::spawn_local(async {
                            if let Err(e) = run_square().await {
                                console_log!("WebGPU error: {:?}", e);
                            }
                        });
                    }>
                        "Square"
                    </button>
                    <button on:click=move |_| {
                        wasm_bindgen_futures::spawn_local(async {
                            if let Err(e) = run_self_test().await {
                                console_log!("Self test failed: {:?}", e);
                            }
                        });
                    }>
                        "Run Self Test"
                    </button>
                    <button on:click=move |_| {
                        wasm_bindgen_futures::spawn_local(async {
                            if let Err(e) = show_device_info().await {
                                console_log!("WebGPU error: {:?}", e);
                            }
                        });
                    }>
                        "Device Info"
                    </button>
                </div>
            </div>
        }
    })
}
