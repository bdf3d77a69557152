mod app;
mod gl;
mod input;
mod renderer;
mod theme;

pub use app::FlameApp;
pub use gl::{GlowBackend, GlowError};

#[cfg(target_arch = "wasm32")]
use wasm_bindgen::JsCast;
#[cfg(target_arch = "wasm32")]
use wasm_bindgen::prelude::*;

/// Mounts the viewer on the page's `flamechart_canvas` element.
#[cfg(target_arch = "wasm32")]
#[wasm_bindgen(start)]
pub fn start() -> Result<(), JsValue> {
    console_error_panic_hook::set_once();

    let canvas = web_sys::window()
        .and_then(|w| w.document())
        .and_then(|d| d.get_element_by_id("flamechart_canvas"))
        .ok_or_else(|| JsValue::from_str("no canvas element with id 'flamechart_canvas'"))?
        .dyn_into::<web_sys::HtmlCanvasElement>()
        .map_err(|_| JsValue::from_str("'flamechart_canvas' is not a canvas"))?;

    let web_options = eframe::WebOptions::default();
    wasm_bindgen_futures::spawn_local(async move {
        let start_result = eframe::WebRunner::new()
            .start(
                canvas,
                web_options,
                Box::new(|cc| {
                    Ok(Box::new(FlameApp::new(
                        cc,
                        flamechart_core::ChartConfig::default(),
                    )))
                }),
            )
            .await;
        if let Err(e) = start_result {
            web_sys::console::error_1(&format!("failed to start eframe: {e:?}").into());
        }
    });
    Ok(())
}
