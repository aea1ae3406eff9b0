//! Terminal progress over the lags of a statistic

use crate::analysis::distance::Distance;
use crate::analysis::fitting::FitResult;
use crate::analysis::histogram::Distribution;
use crate::field::DifferenceField;
use crate::io::configuration::PROGRESS_BAR_WIDTH;
use crate::io::visualization::Reporter;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static LAG_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "{{msg}} [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} lags"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Advances a progress bar once per reported lag, forwarding to another reporter
///
/// Lags reach a reporter through [`TsallisStatistic::report`], which runs only
/// after every lag has been computed. The bar therefore tracks rendering, not
/// the difference-histogram-fit work itself, and lags that failed are never
/// reported, so the bar can finish short of its length.
///
/// [`TsallisStatistic::report`]: crate::analysis::statistic::TsallisStatistic::report
pub struct ProgressReporter<R: Reporter> {
    bar: ProgressBar,
    inner: R,
}

impl<R: Reporter> ProgressReporter<R> {
    /// Show a progress bar on the terminal for `lag_count` lags
    pub fn new(lag_count: usize, inner: R) -> Self {
        let bar = ProgressBar::new(lag_count as u64);
        bar.set_style(LAG_STYLE.clone());
        Self { bar, inner }
    }

    /// Track progress without drawing anything
    pub fn hidden(lag_count: usize, inner: R) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(lag_count as u64);
        Self { bar, inner }
    }

    /// Lags reported so far
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Total lags expected
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    /// Finish the bar and return the wrapped reporter
    pub fn finish(self) -> R {
        self.bar.finish_with_message("done");
        self.inner
    }
}

impl<R: Reporter> Reporter for ProgressReporter<R> {
    fn render_difference(&mut self, lag: usize, field: &DifferenceField) {
        self.bar.set_message(format!("lag {lag}"));
        self.inner.render_difference(lag, field);
    }

    fn render_distribution(&mut self, lag: usize, distribution: &Distribution, fit: Option<&FitResult>) {
        self.inner.render_distribution(lag, distribution, fit);
        self.bar.inc(1);
    }

    fn render_distance(&mut self, distance: &Distance) {
        self.inner.render_distance(distance);
    }
}
