//! Surface builder for the Riemann surface of `w = z^(1/n)`.
//!
//! The angle coordinate is unwrapped into a height (`θ / order`) so that the
//! branches of the root stack into a helix. Each full turn of the angle
//! domain is classified into a sheet, and every sheet keeps only the rows
//! that lie strictly inside its band, leaving a small gap at the branch cut.

use crate::error::SurfaceError;
use log::{debug, trace};
use nalgebra::{DMatrix, DVector};
use num_complex::Complex;
use serde::{Deserialize, Serialize};
use std::f64::consts::TAU;

pub const DEFAULT_RADIUS_MIN: f64 = 0.15;
pub const DEFAULT_RADIUS_MAX: f64 = 2.0;
pub const DEFAULT_RADIUS_SAMPLES: usize = 160;
pub const DEFAULT_ANGLE_SAMPLES: usize = 1600;
/// Angular margin removed from both edges of every sheet band [rad].
pub const DEFAULT_BRANCH_GAP: f64 = 1e-3;
/// Vertical displacement per sheet index, keeps overlapping edges apart.
pub const DEFAULT_SHEET_OFFSET: f64 = 0.03;

/// Grid resolution and visual tuning constants for the surface builder.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SurfaceSettings {
    pub radius_min: f64,
    pub radius_max: f64,
    pub radius_samples: usize,
    pub angle_samples: usize,
    pub gap: f64,
    pub sheet_offset: f64,
}

impl Default for SurfaceSettings {
    fn default() -> Self {
        Self {
            radius_min: DEFAULT_RADIUS_MIN,
            radius_max: DEFAULT_RADIUS_MAX,
            radius_samples: DEFAULT_RADIUS_SAMPLES,
            angle_samples: DEFAULT_ANGLE_SAMPLES,
            gap: DEFAULT_BRANCH_GAP,
            sheet_offset: DEFAULT_SHEET_OFFSET,
        }
    }
}

impl SurfaceSettings {
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if !self.radius_min.is_finite()
            || !self.radius_max.is_finite()
            || self.radius_min <= 0.0
            || self.radius_max <= self.radius_min
        {
            return Err(SurfaceError::InvalidRadiusRange {
                min: self.radius_min,
                max: self.radius_max,
            });
        }
        if self.radius_samples < 2 {
            return Err(SurfaceError::TooFewSamples {
                name: "radius_samples",
                count: self.radius_samples,
            });
        }
        if self.angle_samples < 2 {
            return Err(SurfaceError::TooFewSamples {
                name: "angle_samples",
                count: self.angle_samples,
            });
        }
        check_non_negative("gap", self.gap)?;
        check_non_negative("sheet_offset", self.sheet_offset)?;
        Ok(())
    }
}

fn check_non_negative(name: &'static str, value: f64) -> Result<(), SurfaceError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(SurfaceError::InvalidSetting { name, value })
    }
}

/// Unvalidated caller input. `order` and `sheets` are signed so that
/// non-positive values can be reported instead of silently wrapping.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SurfaceRequest {
    pub order: i64,
    #[serde(default)]
    pub theta_max: Option<f64>,
    #[serde(default)]
    pub sheets: Option<i64>,
    #[serde(default)]
    pub title: String,
}

impl SurfaceRequest {
    pub fn new(order: i64) -> Self {
        Self {
            order,
            ..Self::default()
        }
    }

    pub fn with_theta_max(mut self, theta_max: f64) -> Self {
        self.theta_max = Some(theta_max);
        self
    }

    pub fn with_sheets(mut self, sheets: i64) -> Self {
        self.sheets = Some(sheets);
        self
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    /// Checks every parameter and fills in the defaults
    /// (`theta_max = 2π·order`, `sheets = order`).
    pub fn resolve(&self) -> Result<SurfaceParams, SurfaceError> {
        let order = positive_u32(self.order).ok_or(SurfaceError::InvalidOrder(self.order))?;
        let sheets = match self.sheets {
            Some(sheets) => positive_u32(sheets).ok_or(SurfaceError::InvalidSheets(sheets))?,
            None => order,
        };
        let theta_max = self.theta_max.unwrap_or(TAU * f64::from(order));
        if !theta_max.is_finite() || theta_max <= 0.0 {
            return Err(SurfaceError::InvalidThetaMax(theta_max));
        }
        Ok(SurfaceParams {
            order,
            theta_max,
            sheets,
            title: self.title.clone(),
        })
    }
}

fn positive_u32(value: i64) -> Option<u32> {
    u32::try_from(value).ok().filter(|&v| v > 0)
}

/// Validated parameters of one surface.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SurfaceParams {
    pub order: u32,
    pub theta_max: f64,
    pub sheets: u32,
    pub title: String,
}

impl SurfaceParams {
    pub fn validate(&self) -> Result<(), SurfaceError> {
        if self.order == 0 {
            return Err(SurfaceError::InvalidOrder(0));
        }
        if self.sheets == 0 {
            return Err(SurfaceError::InvalidSheets(0));
        }
        if !self.theta_max.is_finite() || self.theta_max <= 0.0 {
            return Err(SurfaceError::InvalidThetaMax(self.theta_max));
        }
        Ok(())
    }
}

/// `count` evenly spaced values over `[start, end]`, endpoints included.
pub fn linspace(start: f64, end: f64, count: usize) -> DVector<f64> {
    match count {
        0 => DVector::zeros(0),
        1 => DVector::from_element(1, start),
        _ => {
            let step = (end - start) / (count - 1) as f64;
            DVector::from_fn(count, |i, _| {
                if i + 1 == count {
                    end
                } else {
                    start + step * i as f64
                }
            })
        }
    }
}

/// Sheet that the angle falls in: `floor(θ / 2π) mod sheets`.
pub fn sheet_index(theta: f64, sheets: u32) -> u32 {
    let turn = (theta / TAU).floor() as i64;
    turn.rem_euclid(i64::from(sheets)) as u32
}

/// Unfolded height of an angle for the given root order.
pub fn unfolded_height(theta: f64, order: u32) -> f64 {
    theta / f64::from(order)
}

/// Open angular interval that a sheet may occupy, trimmed by the branch gap.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SheetBand {
    pub sheet: u32,
    pub lo: f64,
    pub hi: f64,
}

impl SheetBand {
    pub fn new(sheet: u32, gap: f64) -> Self {
        let s = f64::from(sheet);
        Self {
            sheet,
            lo: TAU * s + gap,
            hi: TAU * (s + 1.0) - gap,
        }
    }

    pub fn contains(&self, theta: f64) -> bool {
        theta > self.lo && theta < self.hi
    }
}

/// Dense (angle × radius) mesh. Row `i` holds angle sample `i`, column `j`
/// holds radius sample `j`.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceGrid {
    pub radius: DVector<f64>,
    pub angle: DVector<f64>,
    pub x: DMatrix<f64>,
    pub y: DMatrix<f64>,
    pub height: DMatrix<f64>,
    pub sheet_index: Vec<u32>,
}

impl SurfaceGrid {
    fn build(params: &SurfaceParams, settings: &SurfaceSettings) -> Self {
        let radius = linspace(
            settings.radius_min,
            settings.radius_max,
            settings.radius_samples,
        );
        let angle = linspace(0.0, params.theta_max, settings.angle_samples);
        let rows = angle.len();
        let cols = radius.len();

        let mut x = DMatrix::zeros(rows, cols);
        let mut y = DMatrix::zeros(rows, cols);
        for i in 0..rows {
            for j in 0..cols {
                let z = Complex::from_polar(radius[j], angle[i]);
                x[(i, j)] = z.re;
                y[(i, j)] = z.im;
            }
        }
        let height = DMatrix::from_fn(rows, cols, |i, _| unfolded_height(angle[i], params.order));
        let sheet_index = angle
            .iter()
            .map(|&theta| sheet_index(theta, params.sheets))
            .collect();

        Self {
            radius,
            angle,
            x,
            y,
            height,
            sheet_index,
        }
    }

    pub fn rows(&self) -> usize {
        self.angle.len()
    }

    pub fn cols(&self) -> usize {
        self.radius.len()
    }
}

/// Points of one sheet. Only the angle rows listed in `rows` are present;
/// everything else on the mesh belongs to another sheet or to a branch gap.
#[derive(Debug, Clone, PartialEq)]
pub struct SheetPatch {
    pub band: SheetBand,
    pub height_offset: f64,
    /// Indices into the grid's angle samples, ascending.
    pub rows: Vec<usize>,
    pub x: DMatrix<f64>,
    pub y: DMatrix<f64>,
    pub z: DMatrix<f64>,
}

impl SheetPatch {
    fn select(grid: &SurfaceGrid, band: SheetBand, height_offset: f64) -> Self {
        let rows: Vec<usize> = (0..grid.rows())
            .filter(|&i| grid.sheet_index[i] == band.sheet && band.contains(grid.angle[i]))
            .collect();
        let x = grid.x.select_rows(rows.iter());
        let y = grid.y.select_rows(rows.iter());
        let z = grid.height.select_rows(rows.iter()).add_scalar(height_offset);
        Self {
            band,
            height_offset,
            rows,
            x,
            y,
            z,
        }
    }

    pub fn sheet(&self) -> u32 {
        self.band.sheet
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn col_count(&self) -> usize {
        self.x.ncols()
    }

    pub fn point(&self, row: usize, col: usize) -> [f64; 3] {
        [self.x[(row, col)], self.y[(row, col)], self.z[(row, col)]]
    }
}

/// A fully built surface: the mesh plus one patch per sheet, ascending.
#[derive(Debug, Clone, PartialEq)]
pub struct RiemannSurface {
    pub params: SurfaceParams,
    pub grid: SurfaceGrid,
    pub patches: Vec<SheetPatch>,
}

impl RiemannSurface {
    /// Patches from the top sheet down to sheet 0.
    pub fn draw_order(&self) -> impl Iterator<Item = &SheetPatch> {
        self.patches.iter().rev()
    }

    pub fn patch(&self, sheet: u32) -> Option<&SheetPatch> {
        self.patches.get(sheet as usize)
    }
}

pub fn build_surface(
    params: &SurfaceParams,
    settings: &SurfaceSettings,
) -> Result<RiemannSurface, SurfaceError> {
    params.validate()?;
    settings.validate()?;

    let grid = SurfaceGrid::build(params, settings);
    debug!(
        "order {}: {}x{} mesh over [0, {:.4}] split into {} sheets",
        params.order,
        grid.rows(),
        grid.cols(),
        params.theta_max,
        params.sheets
    );

    let patches = (0..params.sheets)
        .map(|sheet| {
            let band = SheetBand::new(sheet, settings.gap);
            let offset = settings.sheet_offset * f64::from(sheet);
            let patch = SheetPatch::select(&grid, band, offset);
            trace!(
                "sheet {sheet}: band ({:.6}, {:.6}), {} rows",
                band.lo,
                band.hi,
                patch.row_count()
            );
            patch
        })
        .collect();

    Ok(RiemannSurface {
        params: params.clone(),
        grid,
        patches,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::f64::consts::PI;

    fn coarse_settings(angle_samples: usize) -> SurfaceSettings {
        SurfaceSettings {
            radius_samples: 6,
            angle_samples,
            ..SurfaceSettings::default()
        }
    }

    fn build(request: SurfaceRequest, settings: SurfaceSettings) -> RiemannSurface {
        let params = request.resolve().expect("request should resolve");
        build_surface(&params, &settings).expect("surface should build")
    }

    #[test]
    fn resolve_fills_defaults_from_order() {
        let params = SurfaceRequest::new(2).resolve().expect("order 2 is valid");
        assert_eq!(params.order, 2);
        assert_eq!(params.sheets, 2);
        assert!((params.theta_max - 4.0 * PI).abs() < 1e-12);
        assert!(params.title.is_empty());
    }

    #[test]
    fn resolve_rejects_non_positive_order() {
        assert_eq!(
            SurfaceRequest::new(0).resolve(),
            Err(SurfaceError::InvalidOrder(0))
        );
        let err = SurfaceRequest::new(-1).resolve().expect_err("negative order");
        assert_eq!(err, SurfaceError::InvalidOrder(-1));
        assert!(err.to_string().contains("order"), "unexpected error: {err}");
    }

    #[test]
    fn resolve_rejects_bad_sheets_and_theta_max() {
        let err = SurfaceRequest::new(3).with_sheets(0).resolve();
        assert_eq!(err, Err(SurfaceError::InvalidSheets(0)));
        let err = SurfaceRequest::new(3).with_sheets(-4).resolve();
        assert_eq!(err, Err(SurfaceError::InvalidSheets(-4)));
        assert!(matches!(
            SurfaceRequest::new(3).with_theta_max(f64::NAN).resolve(),
            Err(SurfaceError::InvalidThetaMax(_))
        ));
        assert!(matches!(
            SurfaceRequest::new(3).with_theta_max(-1.0).resolve(),
            Err(SurfaceError::InvalidThetaMax(_))
        ));
    }

    #[test]
    fn build_surface_rejects_invalid_params_and_settings() {
        let params = SurfaceParams {
            order: 0,
            theta_max: 1.0,
            sheets: 1,
            title: String::new(),
        };
        assert_eq!(
            build_surface(&params, &SurfaceSettings::default()),
            Err(SurfaceError::InvalidOrder(0))
        );

        let params = SurfaceRequest::new(2).resolve().expect("valid");
        let bad_radius = SurfaceSettings {
            radius_min: 0.0,
            ..SurfaceSettings::default()
        };
        assert!(matches!(
            build_surface(&params, &bad_radius),
            Err(SurfaceError::InvalidRadiusRange { .. })
        ));
        let bad_samples = coarse_settings(1);
        assert_eq!(
            build_surface(&params, &bad_samples),
            Err(SurfaceError::TooFewSamples {
                name: "angle_samples",
                count: 1
            })
        );
        let bad_gap = SurfaceSettings {
            gap: -1e-3,
            ..SurfaceSettings::default()
        };
        assert!(matches!(
            build_surface(&params, &bad_gap),
            Err(SurfaceError::InvalidSetting { name: "gap", .. })
        ));
    }

    #[test]
    fn angle_samples_span_full_sweep() {
        let surface = build(SurfaceRequest::new(3), coarse_settings(200));
        assert_eq!(surface.grid.angle[0], 0.0);
        assert_eq!(surface.grid.angle[199], 6.0 * PI);

        let custom = build(
            SurfaceRequest::new(3).with_theta_max(5.0),
            coarse_settings(50),
        );
        assert_eq!(custom.grid.angle[49], 5.0);
    }

    #[test]
    fn default_grid_uses_reference_resolution() {
        let surface = build(SurfaceRequest::new(1), SurfaceSettings::default());
        assert_eq!(surface.grid.rows(), 1600);
        assert_eq!(surface.grid.cols(), 160);
        assert_eq!(surface.grid.radius[0], 0.15);
        assert_eq!(surface.grid.radius[159], 2.0);
        assert!(surface.grid.radius.iter().all(|&r| r > 0.0));
    }

    #[test]
    fn grid_sheet_index_matches_floor_mod() {
        let surface = build(
            SurfaceRequest::new(4).with_sheets(3),
            coarse_settings(401),
        );
        for (i, &theta) in surface.grid.angle.iter().enumerate() {
            let expected = ((theta / TAU).floor() as i64 % 3) as u32;
            assert_eq!(surface.grid.sheet_index[i], expected, "theta = {theta}");
        }
    }

    #[test]
    fn cartesian_points_keep_polar_radius() {
        let surface = build(SurfaceRequest::new(2), coarse_settings(64));
        let grid = &surface.grid;
        for i in 0..grid.rows() {
            for j in 0..grid.cols() {
                let r = grid.radius[j];
                let rho2 = grid.x[(i, j)].powi(2) + grid.y[(i, j)].powi(2);
                assert!((rho2 - r * r).abs() < 1e-12, "row {i}, col {j}");
            }
        }
    }

    #[test]
    fn height_is_monotone_in_angle() {
        let surface = build(SurfaceRequest::new(5), coarse_settings(300));
        let column: Vec<f64> = surface.grid.height.column(0).iter().copied().collect();
        for pair in column.windows(2) {
            assert!(pair[0] <= pair[1]);
        }
    }

    #[test]
    fn sheet_bands_do_not_overlap() {
        let gap = DEFAULT_BRANCH_GAP;
        let bands: Vec<SheetBand> = (0..6).map(|s| SheetBand::new(s, gap)).collect();
        let samples = linspace(0.0, 6.0 * TAU, 5000);
        for &theta in samples.iter() {
            let hits = bands.iter().filter(|band| band.contains(theta)).count();
            assert!(hits <= 1, "theta {theta} lies in {hits} bands");
        }
    }

    #[test]
    fn branch_gap_excludes_boundary_angles() {
        let gap = DEFAULT_BRANCH_GAP;
        let lower = SheetBand::new(0, gap);
        let upper = SheetBand::new(1, gap);
        for theta in [TAU - 0.5 * gap, TAU, TAU + 0.5 * gap, TAU + gap] {
            assert!(!lower.contains(theta), "sheet 0 kept {theta}");
            assert!(!upper.contains(theta), "sheet 1 kept {theta}");
        }
        assert!(!lower.contains(0.0));
        assert!(lower.contains(gap * 2.0));
    }

    #[test]
    fn boundary_rows_belong_to_no_patch() {
        // 0, π, 2π, 3π, 4π: rows 0, 2 and 4 sit on branch cuts.
        let surface = build(SurfaceRequest::new(2), coarse_settings(5));
        let covered: Vec<usize> = surface
            .patches
            .iter()
            .flat_map(|patch| patch.rows.iter().copied())
            .collect();
        assert_eq!(covered, vec![1, 3]);
    }

    #[test]
    fn order_two_scenario() {
        assert_eq!(sheet_index(PI, 2), 0);
        assert!((unfolded_height(PI, 2) - 1.5708).abs() < 1e-4);
        assert_eq!(sheet_index(3.0 * PI, 2), 1);

        let surface = build(SurfaceRequest::new(2), coarse_settings(5));
        let band0 = surface.patch(0).expect("sheet 0").band;
        assert!((band0.lo - 1e-3).abs() < 1e-15);
        assert!((band0.hi - (TAU - 1e-3)).abs() < 1e-12);
        let band1 = surface.patch(1).expect("sheet 1").band;
        assert!((band1.lo - (TAU + 1e-3)).abs() < 1e-12);
        assert!((band1.hi - (2.0 * TAU - 1e-3)).abs() < 1e-12);

        let sheet0 = surface.patch(0).expect("sheet 0");
        assert_eq!(sheet0.rows, vec![1]);
        assert!((sheet0.point(0, 0)[2] - PI / 2.0).abs() < 1e-12);

        let sheet1 = surface.patch(1).expect("sheet 1");
        assert_eq!(sheet1.rows, vec![3]);
        let height = sheet1.point(0, 0)[2];
        assert!((height - (1.5 * PI + 0.03)).abs() < 1e-12, "height {height}");
        assert!((height - 4.742).abs() < 1e-3);
    }

    #[test]
    fn order_four_scenario() {
        let surface = build(SurfaceRequest::new(4).with_sheets(4), coarse_settings(9));
        assert_eq!(surface.patches.len(), 4);
        assert_eq!(surface.grid.sheet_index[7], 3);
        let sheet3 = surface.patch(3).expect("sheet 3");
        assert_eq!(sheet3.rows, vec![7]);
        let expected = 7.0 * PI / 4.0 + 0.09;
        for col in 0..sheet3.col_count() {
            assert!((sheet3.point(0, col)[2] - expected).abs() < 1e-12);
        }
    }

    #[test]
    fn extra_turns_beyond_sheet_count_are_not_drawn() {
        let surface = build(
            SurfaceRequest::new(2).with_theta_max(4.0 * TAU),
            coarse_settings(400),
        );
        for patch in &surface.patches {
            for &row in &patch.rows {
                let theta = surface.grid.angle[row];
                assert!(patch.band.contains(theta));
                assert!(theta < 2.0 * TAU);
            }
        }
        // Turns 2 and 3 wrap back onto sheet indices 0 and 1.
        let wrapped = surface
            .grid
            .angle
            .iter()
            .position(|&theta| theta > 2.0 * TAU + 0.1)
            .expect("sample in third turn");
        assert_eq!(surface.grid.sheet_index[wrapped], 0);
    }

    #[test]
    fn draw_order_is_descending() {
        let surface = build(SurfaceRequest::new(4), coarse_settings(64));
        let order: Vec<u32> = surface.draw_order().map(SheetPatch::sheet).collect();
        assert_eq!(order, vec![3, 2, 1, 0]);
    }

    #[test]
    fn sheet_index_handles_negative_angles() {
        assert_eq!(sheet_index(-0.5, 3), 2);
        assert_eq!(sheet_index(-TAU - 0.5, 3), 1);
    }
}
