//! Log-normal average.
//!
//! Samples are treated as log-normally distributed. A pass accumulates the
//! sum and sum of squares of `ln(x)` together with the number `n` of samples
//! that have a logarithm, and scales both sums by `1/sqrt(n)` when it
//! completes; passes are then merged by plain summation with `sqrt(n)` as
//! pass weight. Passes without a single valid sample carry no weight. The output reconstructs the distribution moments from
//! `mu = sum / weights` and `sigma^2 = sum_sq / weights - mu^2`:
//!
//! ```text
//! mean   = exp(mu + sigma^2 / 2)
//! sigma  = mean * sqrt(exp(sigma^2) - 1)
//! median = exp(mu)
//! mode   = exp(mu - sigma^2)
//! ```

use super::{AggregatorPhases, FeatureNames};
use crate::vector::BinContext;

#[derive(Debug, Clone, PartialEq)]
pub struct AverageLogNormal {
    var_index: usize,
    names: FeatureNames,
}

impl AverageLogNormal {
    pub fn new(var_name: &str, var_index: usize) -> Self {
        Self {
            var_index,
            names: FeatureNames::with_suffixes(
                var_name,
                &["sum", "sum_sq", "counts"],
                &["sum", "sum_sq", "weights"],
                &["mean", "sigma", "median", "mode"],
            ),
        }
    }
}

impl AggregatorPhases for AverageLogNormal {
    fn spatial_feature_names(&self) -> &[String] {
        &self.names.spatial
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.names.temporal
    }

    fn output_feature_names(&self) -> &[String] {
        &self.names.output
    }

    fn init_spatial(&self, _ctx: &mut BinContext, spatial: &mut [f64]) {
        spatial[..3].fill(0.0);
    }

    fn aggregate_spatial(&self, _ctx: &mut BinContext, samples: &[f64], spatial: &mut [f64]) {
        let value = samples[self.var_index].ln();
        // NaN and non-positive samples have no logarithm.
        if !value.is_finite() {
            return;
        }
        spatial[0] += value;
        spatial[1] += value * value;
        spatial[2] += 1.0;
    }

    fn complete_spatial(&self, _ctx: &mut BinContext, _num_obs: u32, spatial: &mut [f64]) {
        let count = spatial[2];
        if !(count > 0.0) {
            return;
        }
        let scale = count.sqrt();
        spatial[0] /= scale;
        spatial[1] /= scale;
    }

    fn init_temporal(&self, _ctx: &mut BinContext, temporal: &mut [f64]) {
        temporal[0] = 0.0;
        temporal[1] = 0.0;
        temporal[2] = 0.0;
    }

    fn aggregate_temporal(
        &self,
        _ctx: &mut BinContext,
        spatial: &[f64],
        _num_spatial_obs: u32,
        temporal: &mut [f64],
    ) {
        let count = spatial[2];
        if !(count > 0.0) {
            return;
        }
        temporal[0] += spatial[0];
        temporal[1] += spatial[1];
        temporal[2] += count.sqrt();
    }

    fn complete_temporal(&self, _ctx: &mut BinContext, _num_obs: u32, _temporal: &mut [f64]) {}

    fn compute_output(&self, temporal: &[f64], output: &mut [f64]) {
        let weights = temporal[2];
        if !(weights > 0.0) {
            output[..4].fill(self.output_fill_value());
            return;
        }

        let mu = temporal[0] / weights;
        let variance = (temporal[1] / weights - mu * mu).max(0.0);
        let mean = (mu + 0.5 * variance).exp();

        output[0] = mean;
        output[1] = mean * (variance.exp() - 1.0).sqrt();
        output[2] = mu.exp();
        output[3] = (mu - variance).exp();
    }
}
