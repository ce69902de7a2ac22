use crate::figure::FigureLayout;
use crate::surface::SheetPatch;
use anyhow::Result;

/// A consumer that turns sheet patches into something displayable.
///
/// `render_surface` drives an implementation in a fixed sequence:
/// `begin_figure` once, `add_sheet` once per sheet from the top sheet down to
/// sheet 0, then `finish` to apply the axes configuration and hand back the
/// finished figure.
pub trait SurfaceRenderer {
    type Output;

    fn begin_figure(&mut self, layout: &FigureLayout) -> Result<()>;

    /// Submits one sheet. Patches arrive back-to-front.
    fn add_sheet(&mut self, patch: &SheetPatch) -> Result<()>;

    fn finish(&mut self, layout: &FigureLayout) -> Result<Self::Output>;
}
