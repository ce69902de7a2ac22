//! The standard gallery: one figure each for the square, fourth, eighth and
//! sixteenth roots of `z`.

use crate::figure::{render_surface, RenderSettings};
use crate::surface::SurfaceRequest;
use crate::traits::SurfaceRenderer;
use anyhow::Result;
use log::debug;

pub const GALLERY_ORDERS: [u32; 4] = [2, 4, 8, 16];
pub const ROOT_SIGN: &str = "√";

/// Number of nested square roots that make up `z^(1/order)`, i.e.
/// `floor(log2(order))`.
pub fn root_sign_count(order: u32) -> u32 {
    order.checked_ilog2().unwrap_or(0)
}

pub fn gallery_title(order: u32) -> String {
    let roots = ROOT_SIGN.repeat(root_sign_count(order) as usize);
    format!("Riemann surface of {roots}z ({order} sheets)")
}

pub fn gallery_requests() -> Vec<SurfaceRequest> {
    GALLERY_ORDERS
        .iter()
        .map(|&order| SurfaceRequest::new(i64::from(order)).with_title(gallery_title(order)))
        .collect()
}

/// Renders every gallery order with a fresh renderer from `make_renderer`,
/// so no state carries over between figures.
pub fn render_gallery<R, F>(mut make_renderer: F, settings: &RenderSettings) -> Result<Vec<R::Output>>
where
    R: SurfaceRenderer,
    F: FnMut() -> R,
{
    let mut figures = Vec::with_capacity(GALLERY_ORDERS.len());
    for request in gallery_requests() {
        debug!("gallery: order {}", request.order);
        let mut renderer = make_renderer();
        figures.push(render_surface(&mut renderer, &request, settings)?);
    }
    Ok(figures)
}
