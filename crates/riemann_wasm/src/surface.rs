//! Single-surface entry point.

use crate::{install_hooks, parse_settings};
use riemann_core::figure::{surface_figure, PlotlyFigure, RenderSettings};
use riemann_core::surface::SurfaceRequest;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

pub(crate) fn build_request(
    order: i32,
    theta_max: Option<f64>,
    sheets: Option<i32>,
    title: Option<String>,
) -> SurfaceRequest {
    SurfaceRequest {
        order: i64::from(order),
        theta_max,
        sheets: sheets.map(i64::from),
        title: title.unwrap_or_default(),
    }
}

pub(crate) fn figure_for(
    request: &SurfaceRequest,
    settings: &RenderSettings,
) -> anyhow::Result<PlotlyFigure> {
    surface_figure(request, settings)
}

/// Builds the figure of `w = z^(1/order)`.
///
/// `settings_val` may be `undefined`, `null`, or a partial settings object
/// `{ surface: {...}, figure: {...} }`.
#[wasm_bindgen]
pub fn render_riemann_surface(
    order: i32,
    theta_max: Option<f64>,
    sheets: Option<i32>,
    title: Option<String>,
    settings_val: JsValue,
) -> Result<JsValue, JsValue> {
    install_hooks();
    let settings = parse_settings(settings_val)?;
    let request = build_request(order, theta_max, sheets, title);
    let figure = figure_for(&request, &settings)
        .map_err(|e| JsValue::from_str(&format!("Surface rendering failed: {}", e)))?;
    to_value(&figure).map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
}
