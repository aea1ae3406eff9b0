//! Binned log-density of a difference field

use crate::field::DifferenceField;
use crate::io::error::{Result, degenerate_input, invalid_parameter};

/// Which samples form the denominator of the normalized density
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum CountPolicy {
    /// Only finite samples are counted; the denominator equals the sum of bin counts
    #[default]
    FiniteOnly,
    /// Every sample is counted, so non-finite entries dilute the density without
    /// landing in any bin
    AllSamples,
}

/// Raw bin occupancy behind a histogrammed distribution
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinCounts {
    /// Samples per bin
    pub counts: Vec<usize>,
    /// Denominator used for the density
    pub total: usize,
}

/// Empirical log-density over equal-width bins
#[derive(Debug, Clone, PartialEq)]
pub struct Distribution {
    bin_centres: Vec<f64>,
    log_density: Vec<f64>,
    bins: Option<BinCounts>,
}

impl Distribution {
    /// Build a distribution directly from bin centres and log-densities
    ///
    /// Distributions built this way carry no bin counts.
    ///
    /// # Errors
    ///
    /// Returns an error if the sequences are empty, differ in length, or the
    /// centres are not strictly ascending
    pub fn from_log_density(bin_centres: Vec<f64>, log_density: Vec<f64>) -> Result<Self> {
        if bin_centres.is_empty() {
            return Err(invalid_parameter(
                "bin_centres",
                &"[]",
                &"at least one bin is required",
            ));
        }
        if bin_centres.len() != log_density.len() {
            return Err(invalid_parameter(
                "log_density",
                &log_density.len(),
                &format!("expected {} values to match the bin centres", bin_centres.len()),
            ));
        }
        if bin_centres.windows(2).any(|pair| match pair {
            [a, b] => a.partial_cmp(b) != Some(std::cmp::Ordering::Less),
            _ => false,
        }) {
            return Err(invalid_parameter(
                "bin_centres",
                &format!("{bin_centres:?}"),
                &"bin centres must be strictly ascending",
            ));
        }

        Ok(Self {
            bin_centres,
            log_density,
            bins: None,
        })
    }

    /// Ascending bin midpoints
    pub fn bin_centres(&self) -> &[f64] {
        &self.bin_centres
    }

    /// `log10(count / total)` per bin, `-inf` where a bin is empty
    pub fn log_density(&self) -> &[f64] {
        &self.log_density
    }

    /// Number of bins
    pub const fn num_bins(&self) -> usize {
        self.bin_centres.len()
    }

    /// Samples per bin, if this distribution was histogrammed
    pub fn counts(&self) -> Option<&[usize]> {
        self.bins.as_ref().map(|bins| bins.counts.as_slice())
    }

    /// Denominator used for the density, if this distribution was histogrammed
    pub fn total_count(&self) -> Option<usize> {
        self.bins.as_ref().map(|bins| bins.total)
    }

    /// Iterate over `(bin_centre, log_density)` pairs
    pub fn points(&self) -> impl Iterator<Item = (f64, f64)> + '_ {
        self.bin_centres
            .iter()
            .copied()
            .zip(self.log_density.iter().copied())
    }
}

/// Reduces difference fields to normalized log-histograms
#[derive(Debug, Clone, Copy)]
pub struct HistogramReducer {
    num_bins: usize,
    count_policy: CountPolicy,
}

impl HistogramReducer {
    /// Create a reducer producing `num_bins` bins
    ///
    /// # Errors
    ///
    /// Returns an error if `num_bins` is zero
    pub fn new(num_bins: usize, count_policy: CountPolicy) -> Result<Self> {
        if num_bins == 0 {
            return Err(invalid_parameter(
                "num_bins",
                &num_bins,
                &"at least one bin is required",
            ));
        }
        Ok(Self {
            num_bins,
            count_policy,
        })
    }

    /// Number of bins produced per distribution
    pub const fn num_bins(&self) -> usize {
        self.num_bins
    }

    /// Histogram a difference field
    ///
    /// # Errors
    ///
    /// Returns an error if the field has no finite values or they span a zero range
    pub fn reduce(&self, field: &DifferenceField) -> Result<Distribution> {
        self.reduce_values(field.values().iter().copied())
    }

    /// Histogram an arbitrary sample
    ///
    /// Bins span the observed finite minimum and maximum with equal widths.
    /// Every bin is half-open except the last, which also includes the maximum.
    ///
    /// # Errors
    ///
    /// Returns an error if no finite values are present or they span a zero range
    pub fn reduce_values(&self, values: impl IntoIterator<Item = f64>) -> Result<Distribution> {
        let mut sample_count = 0_usize;
        let finite: Vec<f64> = values
            .into_iter()
            .inspect(|_| sample_count += 1)
            .filter(|v| v.is_finite())
            .collect();

        let (min, max) = finite
            .iter()
            .fold(None, |range: Option<(f64, f64)>, &v| match range {
                None => Some((v, v)),
                Some((lo, hi)) => Some((lo.min(v), hi.max(v))),
            })
            .ok_or_else(|| degenerate_input("histogram", &"no finite values to bin"))?;

        if max <= min {
            return Err(degenerate_input(
                "histogram",
                &format!("all {} finite values equal {min}", finite.len()),
            ));
        }

        let edges = self.bin_edges(min, max);
        let mut counts = vec![0_usize; self.num_bins];
        for &v in &finite {
            if let Some(count) = counts.get_mut(self.bin_index(&edges, v)) {
                *count += 1;
            }
        }

        let total = match self.count_policy {
            CountPolicy::FiniteOnly => counts.iter().sum(),
            CountPolicy::AllSamples => sample_count,
        };

        let bin_centres = edges
            .windows(2)
            .map(|pair| match pair {
                [lo, hi] => f64::midpoint(*lo, *hi),
                _ => f64::NAN,
            })
            .collect();

        let log_density = counts
            .iter()
            .map(|&count| (count as f64 / total as f64).log10())
            .collect();

        Ok(Distribution {
            bin_centres,
            log_density,
            bins: Some(BinCounts { counts, total }),
        })
    }

    fn bin_edges(&self, min: f64, max: f64) -> Vec<f64> {
        let span = max - min;
        let n = self.num_bins as f64;
        (0..=self.num_bins)
            .map(|k| {
                if k == self.num_bins {
                    max
                } else {
                    (k as f64 / n).mul_add(span, min)
                }
            })
            .collect()
    }

    fn bin_index(&self, edges: &[f64], value: f64) -> usize {
        let (Some(&min), Some(&max)) = (edges.first(), edges.last()) else {
            return 0;
        };
        let last = self.num_bins - 1;
        let mut index = (((value - min) / (max - min)) * self.num_bins as f64) as usize;
        index = index.min(last);

        // Floating-point division can land one bin off near an edge
        if edges.get(index).is_some_and(|&lo| value < lo) {
            index = index.saturating_sub(1);
        } else if index < last && edges.get(index + 1).is_some_and(|&hi| value >= hi) {
            index += 1;
        }
        index
    }
}
