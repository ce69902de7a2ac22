//! Stepped runner over the standard gallery, one figure per step.

use crate::{install_hooks, parse_settings};
use log::debug;
use riemann_core::figure::{surface_figure, PlotlyFigure, RenderSettings};
use riemann_core::gallery::gallery_requests;
use riemann_core::surface::SurfaceRequest;
use serde::Serialize;
use serde_wasm_bindgen::to_value;
use wasm_bindgen::prelude::*;

#[derive(Debug, Serialize)]
struct GalleryProgress {
    done: bool,
    figures_rendered: usize,
    total_figures: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    next_order: Option<u32>,
}

struct GalleryRunnerState {
    requests: Vec<SurfaceRequest>,
    settings: RenderSettings,
    figures: Vec<PlotlyFigure>,
}

impl GalleryRunnerState {
    fn new(settings: RenderSettings) -> Self {
        let requests = gallery_requests();
        Self {
            figures: Vec::with_capacity(requests.len()),
            requests,
            settings,
        }
    }

    fn done(&self) -> bool {
        self.figures.len() >= self.requests.len()
    }

    fn progress(&self) -> GalleryProgress {
        GalleryProgress {
            done: self.done(),
            figures_rendered: self.figures.len(),
            total_figures: self.requests.len(),
            next_order: self
                .requests
                .get(self.figures.len())
                .and_then(|r| u32::try_from(r.order).ok()),
        }
    }
}

fn advance_gallery(state: &mut GalleryRunnerState, batch_size: u32) -> anyhow::Result<()> {
    for _ in 0..batch_size {
        let Some(request) = state.requests.get(state.figures.len()) else {
            break;
        };
        let figure = surface_figure(request, &state.settings)?;
        debug!(
            "gallery figure {}/{} ready",
            state.figures.len() + 1,
            state.requests.len()
        );
        state.figures.push(figure);
    }
    Ok(())
}

#[wasm_bindgen]
pub struct WasmRiemannGalleryRunner {
    state: Option<GalleryRunnerState>,
}

#[wasm_bindgen]
impl WasmRiemannGalleryRunner {
    #[wasm_bindgen(constructor)]
    pub fn new(settings_val: JsValue) -> Result<WasmRiemannGalleryRunner, JsValue> {
        install_hooks();
        let settings = parse_settings(settings_val)?;
        settings
            .validate()
            .map_err(|e| JsValue::from_str(&format!("Invalid render settings: {}", e)))?;
        Ok(WasmRiemannGalleryRunner {
            state: Some(GalleryRunnerState::new(settings)),
        })
    }

    pub fn is_done(&self) -> bool {
        self.state.as_ref().map_or(true, GalleryRunnerState::done)
    }

    pub fn run_steps(&mut self, batch_size: u32) -> Result<JsValue, JsValue> {
        let state = self
            .state
            .as_mut()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        advance_gallery(state, batch_size)
            .map_err(|e| JsValue::from_str(&format!("Gallery rendering failed: {}", e)))?;
        to_value(&state.progress())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    pub fn get_progress(&self) -> Result<JsValue, JsValue> {
        let state = self
            .state
            .as_ref()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        to_value(&state.progress())
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }

    /// Hands over every rendered figure, in gallery order.
    pub fn get_result(&mut self) -> Result<JsValue, JsValue> {
        let state = self
            .state
            .take()
            .ok_or_else(|| JsValue::from_str("Runner not initialized"))?;
        if !state.done() {
            let message = format!(
                "Gallery is not finished yet ({} of {} figures).",
                state.figures.len(),
                state.requests.len()
            );
            self.state = Some(state);
            return Err(JsValue::from_str(&message));
        }
        to_value(&state.figures)
            .map_err(|e| JsValue::from_str(&format!("Serialization error: {}", e)))
    }
}
