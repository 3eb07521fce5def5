//! Weighted arithmetic mean and standard deviation.
//!
//! A pass contributes its mean and mean of squares; passes are combined with
//! weight `n^weight_coeff`, where `n` is the pass's count of non-NaN samples.
//! `weight_coeff = 0` weighs every pass equally and `weight_coeff = 1` weighs
//! every sample equally.

use super::{AggregatorPhases, FeatureNames};
use crate::vector::BinContext;

#[derive(Debug, Clone, PartialEq)]
pub struct Average {
    var_index: usize,
    weight_coeff: f64,
    names: FeatureNames,
}

impl Average {
    pub fn new(var_name: &str, var_index: usize, weight_coeff: f64) -> Self {
        Self {
            var_index,
            weight_coeff,
            names: FeatureNames::with_suffixes(
                var_name,
                &["sum", "sum_sq", "counts"],
                &["sum", "sum_sq", "weights", "counts"],
                &["mean", "sigma", "counts"],
            ),
        }
    }
}

impl AggregatorPhases for Average {
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
        let value = samples[self.var_index];
        if value.is_nan() {
            return;
        }
        spatial[0] += value;
        spatial[1] += value * value;
        spatial[2] += 1.0;
    }

    fn complete_spatial(&self, _ctx: &mut BinContext, _num_obs: u32, spatial: &mut [f64]) {
        let count = spatial[2];
        if !(count > 0.0) {
            spatial[0] = f64::NAN;
            spatial[1] = f64::NAN;
            return;
        }
        spatial[0] /= count;
        spatial[1] /= count;
    }

    fn init_temporal(&self, _ctx: &mut BinContext, temporal: &mut [f64]) {
        temporal[..4].fill(0.0);
    }

    fn aggregate_temporal(
        &self,
        _ctx: &mut BinContext,
        spatial: &[f64],
        _num_spatial_obs: u32,
        temporal: &mut [f64],
    ) {
        let count = spatial[2];
        if spatial[0].is_nan() || !(count > 0.0) {
            return;
        }
        let weight = count.powf(self.weight_coeff);
        temporal[0] += spatial[0] * weight;
        temporal[1] += spatial[1] * weight;
        temporal[2] += weight;
        temporal[3] += count;
    }

    fn complete_temporal(&self, _ctx: &mut BinContext, _num_obs: u32, _temporal: &mut [f64]) {}

    fn compute_output(&self, temporal: &[f64], output: &mut [f64]) {
        let weights = temporal[2];
        if !(weights > 0.0) {
            output[..3].fill(self.output_fill_value());
            return;
        }
        let mean = temporal[0] / weights;
        let variance = (temporal[1] / weights - mean * mean).max(0.0);
        output[0] = mean;
        output[1] = variance.sqrt();
        output[2] = temporal[3];
    }
}
