//! Statistical reduction of observations into bin features.
//!
//! Every aggregator runs the same three-phase state machine per bin:
//!
//! ```text
//! SPATIAL:  init_spatial  -> aggregate_spatial*  -> complete_spatial    (one pass)
//! TEMPORAL: init_temporal -> aggregate_temporal* -> complete_temporal   (all passes)
//! OUTPUT:   compute_output(temporal vector)
//! ```
//!
//! Aggregators are immutable and hold no per-bin state; the vectors they
//! write and the [`BinContext`] they may use are owned by the caller. One
//! aggregator can therefore serve any number of bins on any number of
//! threads.

mod average;
mod log_normal;
mod min_max;
mod on_max_set;
mod percentile;

pub use average::Average;
pub use log_normal::AverageLogNormal;
pub use min_max::MinMax;
pub use on_max_set::OnMaxSet;
pub use percentile::Percentile;

use serde::{Deserialize, Serialize};

use crate::error::{BinningError, Result};
use crate::vector::BinContext;

/// The per-phase functions of an aggregator.
///
/// Vectors passed in are exactly as long as the corresponding feature name
/// lists.
pub trait AggregatorPhases: Send + Sync {
    fn spatial_feature_names(&self) -> &[String];

    fn temporal_feature_names(&self) -> &[String];

    fn output_feature_names(&self) -> &[String];

    /// Set the spatial vector to its empty state.
    fn init_spatial(&self, ctx: &mut BinContext, spatial: &mut [f64]);

    /// Fold one observation's samples into the spatial vector.
    fn aggregate_spatial(&self, ctx: &mut BinContext, samples: &[f64], spatial: &mut [f64]);

    /// Normalize the spatial vector after the last observation of a pass.
    fn complete_spatial(&self, ctx: &mut BinContext, num_obs: u32, spatial: &mut [f64]);

    /// Set the temporal vector to its empty state.
    fn init_temporal(&self, ctx: &mut BinContext, temporal: &mut [f64]);

    /// Fold one pass's completed spatial vector into the temporal vector.
    fn aggregate_temporal(
        &self,
        ctx: &mut BinContext,
        spatial: &[f64],
        num_spatial_obs: u32,
        temporal: &mut [f64],
    );

    /// Finish the temporal vector after the last pass.
    fn complete_temporal(&self, ctx: &mut BinContext, num_obs: u32, temporal: &mut [f64]);

    /// Derive output features from a completed temporal vector.
    fn compute_output(&self, temporal: &[f64], output: &mut [f64]);

    /// Value written for features without data.
    fn output_fill_value(&self) -> f64 {
        f64::NAN
    }
}

/// Feature names of the three vector roles.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct FeatureNames {
    pub spatial: Vec<String>,
    pub temporal: Vec<String>,
    pub output: Vec<String>,
}

impl FeatureNames {
    /// Prefix every suffix with the variable name: `<var>_<suffix>`.
    pub fn with_suffixes(var: &str, spatial: &[&str], temporal: &[&str], output: &[&str]) -> Self {
        let expand = |suffixes: &[&str]| -> Vec<String> {
            suffixes.iter().map(|s| format!("{}_{}", var, s)).collect()
        };
        Self {
            spatial: expand(spatial),
            temporal: expand(temporal),
            output: expand(output),
        }
    }
}

/// A configured aggregator.
#[derive(Debug, Clone, PartialEq)]
pub enum Aggregator {
    AverageLogNormal(AverageLogNormal),
    OnMaxSet(OnMaxSet),
    Average(Average),
    MinMax(MinMax),
    Percentile(Percentile),
}

impl Aggregator {
    fn phases(&self) -> &dyn AggregatorPhases {
        match self {
            Self::AverageLogNormal(a) => a,
            Self::OnMaxSet(a) => a,
            Self::Average(a) => a,
            Self::MinMax(a) => a,
            Self::Percentile(a) => a,
        }
    }

    /// Short type name, as used in configuration files.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::AverageLogNormal(_) => "average_log_normal",
            Self::OnMaxSet(_) => "on_max_set",
            Self::Average(_) => "average",
            Self::MinMax(_) => "min_max",
            Self::Percentile(_) => "percentile",
        }
    }

    pub fn spatial_feature_names(&self) -> &[String] {
        self.phases().spatial_feature_names()
    }

    pub fn temporal_feature_names(&self) -> &[String] {
        self.phases().temporal_feature_names()
    }

    pub fn output_feature_names(&self) -> &[String] {
        self.phases().output_feature_names()
    }

    #[inline]
    pub fn init_spatial(&self, ctx: &mut BinContext, spatial: &mut [f64]) {
        self.phases().init_spatial(ctx, spatial)
    }

    #[inline]
    pub fn aggregate_spatial(&self, ctx: &mut BinContext, samples: &[f64], spatial: &mut [f64]) {
        self.phases().aggregate_spatial(ctx, samples, spatial)
    }

    #[inline]
    pub fn complete_spatial(&self, ctx: &mut BinContext, num_obs: u32, spatial: &mut [f64]) {
        self.phases().complete_spatial(ctx, num_obs, spatial)
    }

    #[inline]
    pub fn init_temporal(&self, ctx: &mut BinContext, temporal: &mut [f64]) {
        self.phases().init_temporal(ctx, temporal)
    }

    #[inline]
    pub fn aggregate_temporal(
        &self,
        ctx: &mut BinContext,
        spatial: &[f64],
        num_spatial_obs: u32,
        temporal: &mut [f64],
    ) {
        self.phases()
            .aggregate_temporal(ctx, spatial, num_spatial_obs, temporal)
    }

    #[inline]
    pub fn complete_temporal(&self, ctx: &mut BinContext, num_obs: u32, temporal: &mut [f64]) {
        self.phases().complete_temporal(ctx, num_obs, temporal)
    }

    pub fn compute_output(&self, temporal: &[f64], output: &mut [f64]) {
        self.phases().compute_output(temporal, output)
    }

    pub fn output_fill_value(&self) -> f64 {
        self.phases().output_fill_value()
    }
}

// ============================================================================
// Variables and configuration
// ============================================================================

/// Names of the sample variables of a run, in sample-vector order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct VariableContext {
    names: Vec<String>,
}

impl VariableContext {
    pub fn new<S: Into<String>>(names: impl IntoIterator<Item = S>) -> Self {
        Self {
            names: names.into_iter().map(Into::into).collect(),
        }
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|n| n == name)
    }

    /// Index of a variable, or a configuration error naming it.
    pub fn require(&self, name: &str) -> Result<usize> {
        self.index_of(name).ok_or_else(|| {
            BinningError::config(format!(
                "unknown variable '{}', expected one of {:?}",
                name, self.names
            ))
        })
    }
}

fn default_percentage() -> u32 {
    90
}

/// Aggregator selection as written in configuration files.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum AggregatorConfig {
    /// Log-normal mean, sigma, median and mode.
    AverageLogNormal { variable: String },

    /// Values of `set` at the maximum of `on_max`.
    OnMaxSet { on_max: String, set: Vec<String> },

    /// Weighted arithmetic mean and sigma. Pass weight is `n^weight_coeff`.
    Average {
        variable: String,
        #[serde(default)]
        weight_coeff: f64,
    },

    /// Minimum and maximum.
    MinMax { variable: String },

    /// Percentile of the per-pass means.
    Percentile {
        variable: String,
        #[serde(default = "default_percentage")]
        percentage: u32,
    },
}

impl AggregatorConfig {
    /// Resolve variable names and build the aggregator.
    pub fn create(&self, variables: &VariableContext) -> Result<Aggregator> {
        Ok(match self {
            Self::AverageLogNormal { variable } => Aggregator::AverageLogNormal(
                AverageLogNormal::new(variable, variables.require(variable)?),
            ),
            Self::OnMaxSet { on_max, set } => {
                let set_indices = set
                    .iter()
                    .map(|name| variables.require(name))
                    .collect::<Result<Vec<_>>>()?;
                Aggregator::OnMaxSet(OnMaxSet::new(
                    on_max,
                    variables.require(on_max)?,
                    set,
                    set_indices,
                ))
            }
            Self::Average {
                variable,
                weight_coeff,
            } => {
                if !weight_coeff.is_finite() {
                    return Err(BinningError::config("average weight_coeff must be finite"));
                }
                Aggregator::Average(Average::new(
                    variable,
                    variables.require(variable)?,
                    *weight_coeff,
                ))
            }
            Self::MinMax { variable } => {
                Aggregator::MinMax(MinMax::new(variable, variables.require(variable)?))
            }
            Self::Percentile {
                variable,
                percentage,
            } => {
                if *percentage > 100 {
                    return Err(BinningError::config(format!(
                        "percentile must be within 0..=100, got {}",
                        percentage
                    )));
                }
                Aggregator::Percentile(Percentile::new(
                    variable,
                    variables.require(variable)?,
                    *percentage,
                ))
            }
        })
    }
}
