pub mod error;
pub mod figure;
pub mod gallery;
pub mod surface;
/// The `riemann_core` crate builds the multi-sheeted Riemann surface of
/// `w = z^(1/n)` and describes it as a figure.
///
/// Key components:
/// - **Surface**: grid generation, height unfolding and sheet classification,
///   producing one explicit point patch per sheet.
/// - **Traits**: `SurfaceRenderer`, the seam between geometry and display.
/// - **Figure**: view/axes layout, the `render_surface` pipeline and a
///   Plotly-compatible renderer.
/// - **Gallery**: the standard set of square-root towers (orders 2 to 16).
pub mod traits;
