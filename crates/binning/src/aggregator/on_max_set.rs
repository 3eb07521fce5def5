//! Values carried by the maximum of a key variable.
//!
//! The vector of every phase is `[<key>_max, <set_1>, ..., <set_k>]`. An
//! incoming observation (or pass) replaces the whole vector only if its key
//! is strictly greater than the current maximum, so ties keep the first
//! winner.

use super::{AggregatorPhases, FeatureNames};
use crate::vector::BinContext;

#[derive(Debug, Clone, PartialEq)]
pub struct OnMaxSet {
    on_max_index: usize,
    set_indices: Vec<usize>,
    names: FeatureNames,
}

impl OnMaxSet {
    pub fn new(
        on_max_name: &str,
        on_max_index: usize,
        set_names: &[String],
        set_indices: Vec<usize>,
    ) -> Self {
        let mut names = vec![format!("{}_max", on_max_name)];
        names.extend(set_names.iter().cloned());
        Self {
            on_max_index,
            set_indices,
            names: FeatureNames {
                spatial: names.clone(),
                temporal: names.clone(),
                output: names,
            },
        }
    }

    fn reset(vector: &mut [f64]) {
        vector[0] = f64::NEG_INFINITY;
        vector[1..].fill(f64::NAN);
    }
}

impl AggregatorPhases for OnMaxSet {
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
        let key = samples[self.on_max_index];
        if key > spatial[0] {
            spatial[0] = key;
            for (slot, &index) in spatial[1..].iter_mut().zip(&self.set_indices) {
                *slot = samples[index];
            }
        }
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
        if spatial[0] > temporal[0] {
            temporal.copy_from_slice(spatial);
        }
    }

    fn complete_temporal(&self, _ctx: &mut BinContext, _num_obs: u32, _temporal: &mut [f64]) {}

    fn compute_output(&self, temporal: &[f64], output: &mut [f64]) {
        if temporal[0] == f64::NEG_INFINITY || temporal[0].is_nan() {
            output.fill(self.output_fill_value());
        } else {
            output.copy_from_slice(temporal);
        }
    }
}
