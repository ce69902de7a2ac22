//! WASM bindings for the Riemann surface core library.
//!
//! The JavaScript host receives Plotly-compatible figure objects and is
//! responsible for putting them on screen.

mod gallery;
mod surface;

pub use gallery::WasmRiemannGalleryRunner;
pub use surface::render_riemann_surface;

use riemann_core::figure::RenderSettings;
use serde_wasm_bindgen::from_value;
use wasm_bindgen::prelude::*;

pub(crate) fn install_hooks() {
    console_error_panic_hook::set_once();
    init_logger();
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use std::sync::Once;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;

    static LOGGER: Once = Once::new();
    LOGGER.call_once(|| {
        if log::set_logger(&DEFAULT_LOGGER).is_ok() {
            log::set_max_level(LevelFilter::Debug);
        }
    });
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {}

/// Missing or `null` settings fall back to the defaults.
pub(crate) fn parse_settings(settings_val: JsValue) -> Result<RenderSettings, JsValue> {
    if settings_val.is_undefined() || settings_val.is_null() {
        return Ok(RenderSettings::default());
    }
    from_value(settings_val)
        .map_err(|e| JsValue::from_str(&format!("Invalid render settings: {}", e)))
}

#[cfg(all(test, target_arch = "wasm32"))]
mod wasm_tests {
    use super::parse_settings;
    use riemann_core::figure::RenderSettings;
    use wasm_bindgen::JsValue;
    use wasm_bindgen_test::wasm_bindgen_test;

    #[wasm_bindgen_test]
    fn missing_settings_fall_back_to_defaults() {
        let settings = parse_settings(JsValue::UNDEFINED).expect("defaults");
        assert_eq!(settings, RenderSettings::default());
        let settings = parse_settings(JsValue::NULL).expect("defaults");
        assert_eq!(settings, RenderSettings::default());
    }

    #[wasm_bindgen_test]
    fn malformed_settings_are_rejected() {
        assert!(parse_settings(JsValue::from_str("not an object")).is_err());
    }
}
