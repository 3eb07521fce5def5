//! Minimum and maximum.

use super::{AggregatorPhases, FeatureNames};
use crate::vector::BinContext;

#[derive(Debug, Clone, PartialEq)]
pub struct MinMax {
    var_index: usize,
    names: FeatureNames,
}

impl MinMax {
    pub fn new(var_name: &str, var_index: usize) -> Self {
        Self {
            var_index,
            names: FeatureNames::with_suffixes(
                var_name,
                &["min", "max"],
                &["min", "max"],
                &["min", "max"],
            ),
        }
    }

    fn reset(vector: &mut [f64]) {
        vector[0] = f64::INFINITY;
        vector[1] = f64::NEG_INFINITY;
    }

    fn fold(vector: &mut [f64], min: f64, max: f64) {
        // f64::min/max ignore a NaN operand.
        vector[0] = vector[0].min(min);
        vector[1] = vector[1].max(max);
    }
}

impl AggregatorPhases for MinMax {
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
        Self::reset(spatial);
    }

    fn aggregate_spatial(&self, _ctx: &mut BinContext, samples: &[f64], spatial: &mut [f64]) {
        let value = samples[self.var_index];
        Self::fold(spatial, value, value);
    }

    fn complete_spatial(&self, _ctx: &mut BinContext, _num_obs: u32, _spatial: &mut [f64]) {}

    fn init_temporal(&self, _ctx: &mut BinContext, temporal: &mut [f64]) {
        Self::reset(temporal);
    }

    fn aggregate_temporal(
        &self,
        _ctx: &mut BinContext,
        spatial: &[f64],
        _num_spatial_obs: u32,
        temporal: &mut [f64],
    ) {
        Self::fold(temporal, spatial[0], spatial[1]);
    }

    fn complete_temporal(&self, _ctx: &mut BinContext, _num_obs: u32, _temporal: &mut [f64]) {}

    fn compute_output(&self, temporal: &[f64], output: &mut [f64]) {
        if temporal[0] > temporal[1] || temporal[0].is_nan() {
            output[..2].fill(self.output_fill_value());
        } else {
            output[..2].copy_from_slice(&temporal[..2]);
        }
    }
}
