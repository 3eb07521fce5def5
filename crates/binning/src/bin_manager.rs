//! Bin vectors and the aggregator layout inside them.
//!
//! Every bin carries one flat vector per phase. Each aggregator owns a
//! contiguous slice of that vector, in configuration order:
//!
//! ```text
//! spatial:  [ agg0 spatial features | agg1 spatial features | ... ]
//!            ^offsets[0]             ^offsets[1]             ^offsets[n] = len
//! ```

use serde::Serialize;

use crate::aggregator::{Aggregator, AggregatorConfig, VariableContext};
use crate::error::{BinningError, Result};
use crate::vector::{BinContext, FeatureSchema, FeatureVector, VectorRole};

/// One pass's accumulation for one bin.
#[derive(Debug, Clone, PartialEq)]
pub struct SpatialBin {
    pub index: u64,
    pub num_obs: u32,
    pub features: FeatureVector,
}

/// Accumulation across passes for one bin.
#[derive(Debug, Clone, PartialEq)]
pub struct TemporalBin {
    pub index: u64,
    pub num_obs: u32,
    pub num_passes: u32,
    pub features: FeatureVector,
}

/// Final features of one bin.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutputBin {
    pub index: u64,
    pub num_obs: u32,
    pub num_passes: u32,
    pub features: FeatureVector,
}

/// Slice layout of one vector role.
#[derive(Debug, Clone)]
struct Layout {
    schema: FeatureSchema,
    offsets: Vec<usize>,
}

impl Layout {
    fn new(role: VectorRole, aggregators: &[Aggregator], names: fn(&Aggregator) -> &[String]) -> Self {
        let mut offsets = Vec::with_capacity(aggregators.len() + 1);
        let mut all_names = Vec::new();
        offsets.push(0);
        for agg in aggregators {
            all_names.extend(names(agg).iter().cloned());
            offsets.push(all_names.len());
        }
        Self {
            schema: FeatureSchema::new(role, all_names),
            offsets,
        }
    }

    #[inline]
    fn range(&self, i: usize) -> std::ops::Range<usize> {
        self.offsets[i]..self.offsets[i + 1]
    }
}

/// Drives all aggregators of a run over the bins' vectors.
#[derive(Debug, Clone)]
pub struct BinManager {
    aggregators: Vec<Aggregator>,
    spatial: Layout,
    temporal: Layout,
    output: Layout,
}

impl BinManager {
    pub fn new(aggregators: Vec<Aggregator>) -> Result<Self> {
        if aggregators.is_empty() {
            return Err(BinningError::config("at least one aggregator is required"));
        }
        let spatial = Layout::new(VectorRole::Spatial, &aggregators, Aggregator::spatial_feature_names);
        let temporal = Layout::new(VectorRole::Temporal, &aggregators, Aggregator::temporal_feature_names);
        let output = Layout::new(VectorRole::Output, &aggregators, Aggregator::output_feature_names);

        if let Some(name) = first_duplicate(output.schema.names()) {
            return Err(BinningError::config(format!(
                "output feature '{}' is produced by more than one aggregator",
                name
            )));
        }

        Ok(Self {
            aggregators,
            spatial,
            temporal,
            output,
        })
    }

    /// Build the aggregators of a configuration against its variables.
    pub fn from_configs(configs: &[AggregatorConfig], variables: &VariableContext) -> Result<Self> {
        let aggregators = configs
            .iter()
            .map(|c| c.create(variables))
            .collect::<Result<Vec<_>>>()?;
        Self::new(aggregators)
    }

    pub fn aggregators(&self) -> &[Aggregator] {
        &self.aggregators
    }

    pub fn spatial_schema(&self) -> &FeatureSchema {
        &self.spatial.schema
    }

    pub fn temporal_schema(&self) -> &FeatureSchema {
        &self.temporal.schema
    }

    pub fn output_schema(&self) -> &FeatureSchema {
        &self.output.schema
    }

    /// Fill value of the output, taken from the first aggregator.
    pub fn output_fill_value(&self) -> f64 {
        self.aggregators
            .first()
            .map_or(f64::NAN, Aggregator::output_fill_value)
    }

    // ========================================================================
    // Spatial phase
    // ========================================================================

    pub fn create_spatial_bin(&self, ctx: &mut BinContext) -> SpatialBin {
        let mut features = FeatureVector::new(self.spatial.schema.len());
        let values = features.as_mut_slice();
        for (i, agg) in self.aggregators.iter().enumerate() {
            agg.init_spatial(ctx, &mut values[self.spatial.range(i)]);
        }
        SpatialBin {
            index: ctx.index(),
            num_obs: 0,
            features,
        }
    }

    pub fn aggregate_spatial(&self, ctx: &mut BinContext, samples: &[f64], bin: &mut SpatialBin) {
        let values = bin.features.as_mut_slice();
        for (i, agg) in self.aggregators.iter().enumerate() {
            agg.aggregate_spatial(ctx, samples, &mut values[self.spatial.range(i)]);
        }
        bin.num_obs += 1;
    }

    pub fn complete_spatial_bin(&self, ctx: &mut BinContext, bin: &mut SpatialBin) {
        let values = bin.features.as_mut_slice();
        for (i, agg) in self.aggregators.iter().enumerate() {
            agg.complete_spatial(ctx, bin.num_obs, &mut values[self.spatial.range(i)]);
        }
    }

    // ========================================================================
    // Temporal phase
    // ========================================================================

    pub fn create_temporal_bin(&self, ctx: &mut BinContext) -> TemporalBin {
        let mut features = FeatureVector::new(self.temporal.schema.len());
        let values = features.as_mut_slice();
        for (i, agg) in self.aggregators.iter().enumerate() {
            agg.init_temporal(ctx, &mut values[self.temporal.range(i)]);
        }
        TemporalBin {
            index: ctx.index(),
            num_obs: 0,
            num_passes: 0,
            features,
        }
    }

    pub fn aggregate_temporal_bin(
        &self,
        ctx: &mut BinContext,
        spatial: &SpatialBin,
        bin: &mut TemporalBin,
    ) {
        let input = spatial.features.as_slice();
        let values = bin.features.as_mut_slice();
        for (i, agg) in self.aggregators.iter().enumerate() {
            agg.aggregate_temporal(
                ctx,
                &input[self.spatial.range(i)],
                spatial.num_obs,
                &mut values[self.temporal.range(i)],
            );
        }
        bin.num_obs += spatial.num_obs;
        bin.num_passes += 1;
    }

    pub fn complete_temporal_bin(&self, ctx: &mut BinContext, bin: &mut TemporalBin) {
        let values = bin.features.as_mut_slice();
        for (i, agg) in self.aggregators.iter().enumerate() {
            agg.complete_temporal(ctx, bin.num_obs, &mut values[self.temporal.range(i)]);
        }
    }

    // ========================================================================
    // Output
    // ========================================================================

    pub fn compute_output(&self, bin: &TemporalBin) -> OutputBin {
        let mut features = FeatureVector::new(self.output.schema.len());
        let input = bin.features.as_slice();
        let values = features.as_mut_slice();
        for (i, agg) in self.aggregators.iter().enumerate() {
            agg.compute_output(
                &input[self.temporal.range(i)],
                &mut values[self.output.range(i)],
            );
        }
        OutputBin {
            index: bin.index,
            num_obs: bin.num_obs,
            num_passes: bin.num_passes,
            features,
        }
    }
}

fn first_duplicate(names: &[String]) -> Option<&String> {
    names
        .iter()
        .enumerate()
        .find(|(i, name)| names[..*i].contains(name))
        .map(|(_, name)| name)
}
