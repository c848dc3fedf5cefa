//! Density data for the prediction plot
//!
//! The plotted sample is a deterministic ±10% band around the estimate, not
//! an uncertainty estimate. The curve is a Gaussian KDE with Scott's rule
//! bandwidth, evaluated on a grid extending three bandwidths past the data.

use serde::Serialize;

/// Band half-width in percent steps
pub const BAND_STEPS: i64 = 10;

/// Number of curve points
pub const GRID_SIZE: usize = 200;

/// Grid extension past the data, in bandwidths
pub const CUT: f64 = 3.0;

/// The 21 values `p * (1 + i/100)` for `i` in `-10..=10`.
///
/// Evaluated as `p * (100 + i) / 100`, which is exact whenever the product
/// is a multiple of 100.
pub fn perturbation_band(prediction: i64) -> Vec<f64> {
    (-BAND_STEPS..=BAND_STEPS)
        .map(|i| (prediction as f64 * (100 + i) as f64) / 100.0)
        .collect()
}

/// One evaluated point of the density curve
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct DensityPoint {
    pub x: f64,
    pub density: f64,
}

/// Gaussian kernel density estimate over a 1-D sample
#[derive(Debug, Clone)]
pub struct KernelDensity {
    samples: Vec<f64>,
    bandwidth: f64,
}

impl KernelDensity {
    /// Fit with Scott's rule, `std(ddof=1) * n^(-1/5)`.
    ///
    /// Returns `None` for fewer than two samples or zero spread.
    pub fn fit(samples: &[f64]) -> Option<Self> {
        let n = samples.len();
        if n < 2 {
            return None;
        }

        let mean = samples.iter().sum::<f64>() / n as f64;
        let variance = samples.iter().map(|x| (x - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
        let bandwidth = variance.sqrt() * (n as f64).powf(-0.2);
        if !bandwidth.is_finite() || bandwidth <= 0.0 {
            return None;
        }

        Some(Self {
            samples: samples.to_vec(),
            bandwidth,
        })
    }

    pub fn bandwidth(&self) -> f64 {
        self.bandwidth
    }

    /// Density at `x`
    pub fn evaluate(&self, x: f64) -> f64 {
        let norm = 1.0 / ((2.0 * std::f64::consts::PI).sqrt() * self.bandwidth);
        let sum: f64 = self
            .samples
            .iter()
            .map(|s| {
                let z = (x - s) / self.bandwidth;
                (-0.5 * z * z).exp()
            })
            .sum();
        norm * sum / self.samples.len() as f64
    }

    /// Evenly spaced curve over `[min - cut*bw, max + cut*bw]`
    pub fn curve(&self, grid_size: usize, cut: f64) -> Vec<DensityPoint> {
        let min = self.samples.iter().copied().fold(f64::INFINITY, f64::min);
        let max = self.samples.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let lo = min - cut * self.bandwidth;
        let hi = max + cut * self.bandwidth;

        if grid_size < 2 {
            return vec![DensityPoint {
                x: lo,
                density: self.evaluate(lo),
            }];
        }

        let step = (hi - lo) / (grid_size - 1) as f64;
        (0..grid_size)
            .map(|i| {
                let x = lo + step * i as f64;
                DensityPoint {
                    x,
                    density: self.evaluate(x),
                }
            })
            .collect()
    }
}

/// Everything the page needs to draw the prediction plot
#[derive(Debug, Clone, Serialize)]
pub struct DensityPlot {
    pub samples: Vec<f64>,
    /// Empty when the sample has no spread (a zero prediction)
    pub curve: Vec<DensityPoint>,
}

impl DensityPlot {
    pub fn for_prediction(prediction: i64) -> Self {
        let samples = perturbation_band(prediction);
        let curve = KernelDensity::fit(&samples)
            .map(|kde| kde.curve(GRID_SIZE, CUT))
            .unwrap_or_default();
        Self { samples, curve }
    }
}
