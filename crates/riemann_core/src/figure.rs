//! Figure description and the rendering pipeline.
//!
//! `render_surface` validates the request, builds the surface and streams the
//! sheet patches into any [`SurfaceRenderer`]. [`PlotlyRenderer`] is the
//! default consumer: it produces a Plotly-compatible figure object that a
//! display host can show as-is.

use crate::error::SurfaceError;
use crate::surface::{build_surface, SheetPatch, SurfaceParams, SurfaceRequest, SurfaceSettings};
use crate::traits::SurfaceRenderer;
use anyhow::{anyhow, Result};
use log::{debug, trace};
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

const CAMERA_DISTANCE: f64 = 2.165;
const PATCH_COLORS: [&str; 10] = [
    "#1f77b4", "#ff7f0e", "#2ca02c", "#d62728", "#9467bd", "#8c564b", "#e377c2", "#7f7f7f",
    "#bcbd22", "#17becf",
];
const Z_TICK_LABELS: [&str; 5] = ["0", "π/2", "π", "3π/2", "2π"];

/// View and styling settings for a single figure.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FigureSettings {
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    /// x : y : z box aspect.
    pub aspect: [f64; 3],
    /// Sampling stride over patch rows and columns.
    pub stride: usize,
    pub opacity: f64,
    /// Extra z-axis room per sheet above the unfolded height.
    pub z_headroom: f64,
    pub width: u32,
    pub height: u32,
}

impl Default for FigureSettings {
    fn default() -> Self {
        Self {
            elevation_deg: 25.0,
            azimuth_deg: 35.0,
            aspect: [1.0, 1.0, 0.6],
            stride: 30,
            opacity: 0.9,
            z_headroom: 0.1,
            width: 700,
            height: 600,
        }
    }
}

impl FigureSettings {
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if self.stride == 0 {
            return Err(SurfaceError::ZeroStride);
        }
        if !(0.0..=1.0).contains(&self.opacity) {
            return Err(SurfaceError::InvalidOpacity(self.opacity));
        }
        for (name, value) in [
            ("elevation_deg", self.elevation_deg),
            ("azimuth_deg", self.azimuth_deg),
        ] {
            if !value.is_finite() {
                return Err(SurfaceError::NonFinite { name, value });
            }
        }
        for (name, value) in [
            ("aspect", self.aspect[0]),
            ("aspect", self.aspect[1]),
            ("aspect", self.aspect[2]),
            ("z_headroom", self.z_headroom),
        ] {
            if !value.is_finite() || value < 0.0 {
                return Err(SurfaceError::InvalidSetting { name, value });
            }
        }
        Ok(())
    }
}

/// Everything a caller may override, grouped the way the host sends it.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RenderSettings {
    pub surface: SurfaceSettings,
    pub figure: FigureSettings,
}

impl RenderSettings {
    pub fn validate(&self) -> Result<(), SurfaceError> {
        self.surface.validate()?;
        self.figure.validate()
    }
}

/// Renderer-independent axes and view configuration of one figure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FigureLayout {
    pub window_title: String,
    pub title: String,
    pub width: u32,
    pub height: u32,
    pub elevation_deg: f64,
    pub azimuth_deg: f64,
    pub aspect: [f64; 3],
    pub axis_labels: [String; 3],
    pub z_ticks: Vec<f64>,
    pub z_tick_labels: Vec<String>,
    pub z_range: [f64; 2],
    pub stride: usize,
    pub opacity: f64,
}

impl FigureLayout {
    pub fn for_surface(params: &SurfaceParams, settings: &FigureSettings) -> Self {
        let order = params.order;
        let z_top = params.theta_max / f64::from(order)
            + settings.z_headroom * f64::from(params.sheets.saturating_sub(1));
        Self {
            window_title: format!("Riemann Surface Visualizer (order={order})"),
            title: params.title.clone(),
            width: settings.width,
            height: settings.height,
            elevation_deg: settings.elevation_deg,
            azimuth_deg: settings.azimuth_deg,
            aspect: settings.aspect,
            axis_labels: [
                "Re(z)".to_string(),
                "Im(z)".to_string(),
                format!("z ~ θ/{order}"),
            ],
            z_ticks: (0..Z_TICK_LABELS.len())
                .map(|k| 0.5 * PI * k as f64)
                .collect(),
            z_tick_labels: Z_TICK_LABELS.iter().map(|label| label.to_string()).collect(),
            z_range: [0.0, z_top],
            stride: settings.stride,
            opacity: settings.opacity,
        }
    }
}

/// Validates, builds and streams one surface into `renderer`.
///
/// Nothing is allocated and the renderer is not touched when a parameter is
/// invalid.
pub fn render_surface<R: SurfaceRenderer>(
    renderer: &mut R,
    request: &SurfaceRequest,
    settings: &RenderSettings,
) -> Result<R::Output> {
    let params = request.resolve()?;
    settings.validate()?;

    let surface = build_surface(&params, &settings.surface)?;
    let layout = FigureLayout::for_surface(&params, &settings.figure);

    renderer.begin_figure(&layout)?;
    for patch in surface.draw_order() {
        renderer.add_sheet(patch)?;
    }
    let output = renderer.finish(&layout)?;
    debug!("rendered \"{}\"", layout.window_title);
    Ok(output)
}

/// Renders one surface with the default Plotly consumer.
pub fn surface_figure(request: &SurfaceRequest, settings: &RenderSettings) -> Result<PlotlyFigure> {
    render_surface(&mut PlotlyRenderer::default(), request, settings)
}

/// Row (or column) indices kept by a sampling stride. The last index is
/// always included so patch edges survive downsampling.
pub fn stride_indices(len: usize, stride: usize) -> Vec<usize> {
    if len == 0 {
        return Vec::new();
    }
    let mut indices: Vec<usize> = (0..len - 1).step_by(stride.max(1)).collect();
    indices.push(len - 1);
    indices
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Vec3 {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotlyTitle {
    pub text: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceTrace {
    #[serde(rename = "type")]
    pub kind: String,
    pub name: String,
    pub x: Vec<Vec<f64>>,
    pub y: Vec<Vec<f64>>,
    pub z: Vec<Vec<f64>>,
    pub opacity: f64,
    pub colorscale: Vec<(f64, String)>,
    pub showscale: bool,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotlyAxis {
    pub title: PlotlyTitle,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tickvals: Option<Vec<f64>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ticktext: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub range: Option<[f64; 2]>,
}

impl PlotlyAxis {
    fn titled(text: &str) -> Self {
        Self {
            title: PlotlyTitle {
                text: text.to_string(),
            },
            tickvals: None,
            ticktext: None,
            range: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotlyCamera {
    pub eye: Vec3,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotlyScene {
    pub camera: PlotlyCamera,
    pub aspectmode: String,
    pub aspectratio: Vec3,
    pub xaxis: PlotlyAxis,
    pub yaxis: PlotlyAxis,
    pub zaxis: PlotlyAxis,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotlyLayout {
    pub title: PlotlyTitle,
    pub width: u32,
    pub height: u32,
    pub showlegend: bool,
    pub scene: PlotlyScene,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotlyFigure {
    pub window_title: String,
    /// Traces in draw order.
    pub data: Vec<SurfaceTrace>,
    pub layout: PlotlyLayout,
}

fn camera_eye(elevation_deg: f64, azimuth_deg: f64) -> Vec3 {
    let elevation = elevation_deg.to_radians();
    let azimuth = azimuth_deg.to_radians();
    Vec3 {
        x: CAMERA_DISTANCE * elevation.cos() * azimuth.cos(),
        y: CAMERA_DISTANCE * elevation.cos() * azimuth.sin(),
        z: CAMERA_DISTANCE * elevation.sin(),
    }
}

fn plotly_layout(layout: &FigureLayout) -> PlotlyLayout {
    let mut zaxis = PlotlyAxis::titled(&layout.axis_labels[2]);
    zaxis.tickvals = Some(layout.z_ticks.clone());
    zaxis.ticktext = Some(layout.z_tick_labels.clone());
    zaxis.range = Some(layout.z_range);
    PlotlyLayout {
        title: PlotlyTitle {
            text: layout.title.clone(),
        },
        width: layout.width,
        height: layout.height,
        showlegend: false,
        scene: PlotlyScene {
            camera: PlotlyCamera {
                eye: camera_eye(layout.elevation_deg, layout.azimuth_deg),
            },
            aspectmode: "manual".to_string(),
            aspectratio: Vec3 {
                x: layout.aspect[0],
                y: layout.aspect[1],
                z: layout.aspect[2],
            },
            xaxis: PlotlyAxis::titled(&layout.axis_labels[0]),
            yaxis: PlotlyAxis::titled(&layout.axis_labels[1]),
            zaxis,
        },
    }
}

struct PendingFigure {
    window_title: String,
    stride: usize,
    opacity: f64,
    traces: Vec<SurfaceTrace>,
}

/// Builds a [`PlotlyFigure`], one surface trace per non-empty sheet.
#[derive(Default)]
pub struct PlotlyRenderer {
    pending: Option<PendingFigure>,
}

impl SurfaceRenderer for PlotlyRenderer {
    type Output = PlotlyFigure;

    fn begin_figure(&mut self, layout: &FigureLayout) -> Result<()> {
        self.pending = Some(PendingFigure {
            window_title: layout.window_title.clone(),
            stride: layout.stride,
            opacity: layout.opacity,
            traces: Vec::new(),
        });
        Ok(())
    }

    fn add_sheet(&mut self, patch: &SheetPatch) -> Result<()> {
        let pending = self
            .pending
            .as_mut()
            .ok_or_else(|| anyhow!("add_sheet called before begin_figure"))?;
        if patch.is_empty() {
            trace!("sheet {} has no rows inside its band; skipped", patch.sheet());
            return Ok(());
        }

        let rows = stride_indices(patch.row_count(), pending.stride);
        let cols = stride_indices(patch.col_count(), pending.stride);
        let sample = |values: &nalgebra::DMatrix<f64>| -> Vec<Vec<f64>> {
            rows.iter()
                .map(|&i| cols.iter().map(|&j| values[(i, j)]).collect())
                .collect()
        };

        let color = PATCH_COLORS[pending.traces.len() % PATCH_COLORS.len()];
        pending.traces.push(SurfaceTrace {
            kind: "surface".to_string(),
            name: format!("sheet {}", patch.sheet()),
            x: sample(&patch.x),
            y: sample(&patch.y),
            z: sample(&patch.z),
            opacity: pending.opacity,
            colorscale: vec![(0.0, color.to_string()), (1.0, color.to_string())],
            showscale: false,
        });
        Ok(())
    }

    fn finish(&mut self, layout: &FigureLayout) -> Result<PlotlyFigure> {
        let pending = self
            .pending
            .take()
            .ok_or_else(|| anyhow!("finish called before begin_figure"))?;
        Ok(PlotlyFigure {
            window_title: pending.window_title,
            data: pending.traces,
            layout: plotly_layout(layout),
        })
    }
}
