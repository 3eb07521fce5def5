//! Percentile of per-pass means.
//!
//! Each pass contributes the mean of its valid samples. During the temporal
//! phase the means are collected in the bin's context; the percentile is
//! computed once all passes are in.

use super::{AggregatorPhases, FeatureNames};
use crate::vector::BinContext;

#[derive(Debug, Clone, PartialEq)]
pub struct Percentile {
    var_index: usize,
    percentage: u32,
    count_key: String,
    values_key: String,
    names: FeatureNames,
}

impl Percentile {
    pub fn new(var_name: &str, var_index: usize, percentage: u32) -> Self {
        let p = format!("p{}", percentage);
        Self {
            var_index,
            percentage,
            count_key: format!("percentile.{}.{}.count", var_name, p),
            values_key: format!("percentile.{}.{}.values", var_name, p),
            names: FeatureNames::with_suffixes(var_name, &["sum"], &[&p], &[&p]),
        }
    }

    pub fn percentage(&self) -> u32 {
        self.percentage
    }
}

/// Percentile of sorted values, linearly interpolated between the closest
/// ranks (`rank = p/100 * (N - 1) + 1`).
pub fn compute_percentile(percentage: u32, sorted: &[f64]) -> f64 {
    let len = sorted.len();
    if len == 0 {
        return f64::NAN;
    }
    let rank = f64::from(percentage) / 100.0 * (len - 1) as f64 + 1.0;
    if rank <= 1.0 {
        return sorted[0];
    }
    if rank >= len as f64 {
        return sorted[len - 1];
    }
    let k = rank.floor() as usize;
    let d = rank - k as f64;
    sorted[k - 1] + d * (sorted[k] - sorted[k - 1])
}

impl AggregatorPhases for Percentile {
    fn spatial_feature_names(&self) -> &[String] {
        &self.names.spatial
    }

    fn temporal_feature_names(&self) -> &[String] {
        &self.names.temporal
    }

    fn output_feature_names(&self) -> &[String] {
        &self.names.output
    }

    fn init_spatial(&self, ctx: &mut BinContext, spatial: &mut [f64]) {
        spatial[0] = 0.0;
        ctx.put(self.count_key.as_str(), 0u32);
    }

    fn aggregate_spatial(&self, ctx: &mut BinContext, samples: &[f64], spatial: &mut [f64]) {
        let value = samples[self.var_index];
        if value.is_nan() {
            return;
        }
        spatial[0] += value;
        if let Some(count) = ctx.get_mut::<u32>(&self.count_key) {
            *count += 1;
        }
    }

    fn complete_spatial(&self, ctx: &mut BinContext, _num_obs: u32, spatial: &mut [f64]) {
        match ctx.take::<u32>(&self.count_key).unwrap_or(0) {
            0 => spatial[0] = f64::NAN,
            count => spatial[0] /= f64::from(count),
        }
    }

    fn init_temporal(&self, ctx: &mut BinContext, temporal: &mut [f64]) {
        temporal[0] = f64::NAN;
        ctx.put(self.values_key.as_str(), Vec::<f64>::new());
    }

    fn aggregate_temporal(
        &self,
        ctx: &mut BinContext,
        spatial: &[f64],
        _num_spatial_obs: u32,
        _temporal: &mut [f64],
    ) {
        if spatial[0].is_nan() {
            return;
        }
        if let Some(values) = ctx.get_mut::<Vec<f64>>(&self.values_key) {
            values.push(spatial[0]);
        }
    }

    fn complete_temporal(&self, ctx: &mut BinContext, _num_obs: u32, temporal: &mut [f64]) {
        let mut values = ctx.take::<Vec<f64>>(&self.values_key).unwrap_or_default();
        values.sort_by(f64::total_cmp);
        temporal[0] = compute_percentile(self.percentage, &values);
    }

    fn compute_output(&self, temporal: &[f64], output: &mut [f64]) {
        output[0] = if temporal[0].is_nan() {
            self.output_fill_value()
        } else {
            temporal[0]
        };
    }
}
