//! Injectable rendering of pipeline results
//!
//! The pipeline never depends on rendering. Reporters are only invoked when
//! verbose output is requested, after all numeric work is done.

use crate::analysis::distance::{Distance, DistanceComponent};
use crate::analysis::fitting::FitResult;
use crate::analysis::histogram::Distribution;
use crate::field::DifferenceField;
use image::{Rgba, RgbaImage};
use ndarray::Array2;

// Three-stop colour ramp from low to high values
const PALETTE: [[u8; 3]; 3] = [[68, 1, 84], [33, 145, 140], [253, 231, 37]];
const TRANSPARENT: [u8; 4] = [0, 0, 0, 0];

/// Receives pipeline results for display
pub trait Reporter {
    /// Render a lag's difference field
    fn render_difference(&mut self, lag: usize, field: &DifferenceField);

    /// Render a lag's distribution together with its fit, if one exists
    fn render_distribution(&mut self, lag: usize, distribution: &Distribution, fit: Option<&FitResult>);

    /// Render the per-lag breakdown of a distance
    fn render_distance(&mut self, _distance: &Distance) {}
}

/// Reporter that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullReporter;

impl Reporter for NullReporter {
    fn render_difference(&mut self, _lag: usize, _field: &DifferenceField) {}

    fn render_distribution(
        &mut self,
        _lag: usize,
        _distribution: &Distribution,
        _fit: Option<&FitResult>,
    ) {
    }
}

/// Data for plotting a distribution with its fitted curve
#[derive(Debug, Clone, PartialEq)]
pub struct Overlay {
    /// Lag of the distribution
    pub lag: usize,
    /// Bin centres (x axis)
    pub bin_centres: Vec<f64>,
    /// Observed log-density per bin
    pub observed: Vec<f64>,
    /// Fitted curve at each bin centre, if the fit succeeded
    pub model: Option<Vec<f64>>,
}

/// Captures rendered images and plot series in memory
#[derive(Debug, Clone, Default)]
pub struct PlotCapture {
    images: Vec<(usize, RgbaImage)>,
    overlays: Vec<Overlay>,
    distances: Vec<Vec<DistanceComponent>>,
}

impl PlotCapture {
    /// Create an empty capture
    pub fn new() -> Self {
        Self::default()
    }

    /// Rendered difference fields with their lags, in report order
    pub fn images(&self) -> &[(usize, RgbaImage)] {
        &self.images
    }

    /// Distribution overlays, in report order
    pub fn overlays(&self) -> &[Overlay] {
        &self.overlays
    }

    /// Per-lag distance breakdowns, one entry per reported distance
    pub fn distances(&self) -> &[Vec<DistanceComponent>] {
        &self.distances
    }
}

impl Reporter for PlotCapture {
    fn render_difference(&mut self, lag: usize, field: &DifferenceField) {
        self.images.push((lag, render_field(field.values())));
    }

    fn render_distribution(&mut self, lag: usize, distribution: &Distribution, fit: Option<&FitResult>) {
        let bin_centres = distribution.bin_centres().to_vec();
        let model = fit.map(|fit| bin_centres.iter().map(|&x| fit.evaluate(x)).collect());

        self.overlays.push(Overlay {
            lag,
            bin_centres,
            observed: distribution.log_density().to_vec(),
            model,
        });
    }

    fn render_distance(&mut self, distance: &Distance) {
        self.distances.push(distance.components().to_vec());
    }
}

/// Render a field as a colour-mapped image
///
/// Row 0 of the field is drawn at the bottom of the image. Values are scaled
/// between the finite minimum and maximum; non-finite values are transparent.
pub fn render_field(values: &Array2<f64>) -> RgbaImage {
    let (rows, cols) = values.dim();
    let mut img = RgbaImage::new(cols as u32, rows as u32);

    let (min, max) = values
        .iter()
        .filter(|v| v.is_finite())
        .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &v| {
            (lo.min(v), hi.max(v))
        });
    let span = max - min;

    for ((row, col), &value) in values.indexed_iter() {
        let color = if value.is_finite() {
            let t = if span > 0.0 { (value - min) / span } else { 0.5 };
            colour_ramp(t)
        } else {
            TRANSPARENT
        };
        img.put_pixel(col as u32, (rows - 1 - row) as u32, Rgba(color));
    }

    img
}

fn colour_ramp(t: f64) -> [u8; 4] {
    let [low, mid, high] = PALETTE;
    let t = t.clamp(0.0, 1.0);
    let (from, to, local) = if t < 0.5 {
        (low, mid, t * 2.0)
    } else {
        (mid, high, (t - 0.5) * 2.0)
    };

    let channel = |a: u8, b: u8| (f64::from(b) - f64::from(a)).mul_add(local, f64::from(a)).round() as u8;
    [
        channel(from[0], to[0]),
        channel(from[1], to[1]),
        channel(from[2], to[2]),
        255,
    ]
}
