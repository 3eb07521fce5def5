//! Binning run orchestration.
//!
//! Each pass is binned spatially on its own, then all passes are merged per
//! bin. In parallel mode passes run on the rayon pool and the merge is split
//! into shards of disjoint bin indices, so no bin is ever touched by two
//! workers at once.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Instant;

use rayon::prelude::*;
use serde::Serialize;
use tracing::{debug, info, warn};

use crate::aggregator::VariableContext;
use crate::bin_manager::{BinManager, OutputBin, SpatialBin};
use crate::binner::{SpatialBinner, TemporalBinner};
use crate::config::BinningConfig;
use crate::error::{BinningError, Result};
use crate::geocoding::{GeoCoding, TimeCoding};
use crate::grid::{GridKind, PlanetaryGrid};
use crate::observation::{validate_planes, ObservationStream};
use crate::raster::{PixelRect, SamplePlane};
use crate::sample_pointer::SamplePointer;

// ============================================================================
// Inputs
// ============================================================================

/// One source raster (for example one satellite overpass).
///
/// Planes are given in the order of the configured variables.
#[derive(Clone)]
pub struct Pass<'a> {
    pub name: String,
    pub planes: Vec<&'a dyn SamplePlane>,
    pub mask: Option<&'a dyn SamplePlane>,
    pub geo_coding: &'a dyn GeoCoding,
    pub time_coding: Option<&'a dyn TimeCoding>,
    /// Slice to bin, the whole raster if `None`.
    pub rect: Option<PixelRect>,
}

impl<'a> Pass<'a> {
    pub fn new(
        name: impl Into<String>,
        planes: Vec<&'a dyn SamplePlane>,
        geo_coding: &'a dyn GeoCoding,
    ) -> Self {
        Self {
            name: name.into(),
            planes,
            mask: None,
            geo_coding,
            time_coding: None,
            rect: None,
        }
    }

    pub fn with_mask(mut self, mask: &'a dyn SamplePlane) -> Self {
        self.mask = Some(mask);
        self
    }

    pub fn with_time_coding(mut self, time_coding: &'a dyn TimeCoding) -> Self {
        self.time_coding = Some(time_coding);
        self
    }

    pub fn with_rect(mut self, rect: PixelRect) -> Self {
        self.rect = Some(rect);
        self
    }

    fn raster_size(&self) -> Option<(usize, usize)> {
        self.planes
            .first()
            .or(self.mask.as_ref())
            .map(|p| (p.width(), p.height()))
    }
}

/// Cooperative cancellation flag shared between a run and its controller.
///
/// Checked once before each pass; a pass that already started is finished.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Result
// ============================================================================

/// Grid description carried with a result.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct GridInfo {
    pub kind: GridKind,
    pub num_rows: usize,
    pub num_bins: u64,
}

/// Output of a binning run. Only bins that received observations are present.
#[derive(Debug, Clone, Serialize)]
pub struct BinningResult {
    pub grid: GridInfo,
    pub feature_names: Vec<String>,
    pub fill_value: f64,
    pub num_passes: usize,
    pub bins: BTreeMap<u64, OutputBin>,
}

impl BinningResult {
    /// Value of a named output feature for a bin.
    pub fn feature(&self, bin_index: u64, name: &str) -> Option<f64> {
        let slot = self.feature_names.iter().position(|n| n == name)?;
        self.bins.get(&bin_index).map(|bin| bin.features[slot])
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string(self)
    }
}

// ============================================================================
// Reducer
// ============================================================================

/// Bins passes onto a planetary grid.
pub struct BinningReducer {
    config: BinningConfig,
    grid: PlanetaryGrid,
    variables: VariableContext,
    manager: BinManager,
}

impl BinningReducer {
    /// Validate the configuration, load the grid and build the aggregators.
    pub fn new(config: BinningConfig) -> Result<Self> {
        config.validate()?;
        let grid = PlanetaryGrid::from_config(&config.grid)?;
        let variables = VariableContext::new(config.variables.iter().cloned());
        let manager = BinManager::from_configs(&config.aggregators, &variables)?;

        info!(
            grid = %config.grid.kind,
            rows = grid.num_rows(),
            bins = grid.num_bins(),
            aggregators = manager.aggregators().len(),
            super_sampling = config.super_sampling,
            "Created binning reducer"
        );

        Ok(Self {
            config,
            grid,
            variables,
            manager,
        })
    }

    pub fn config(&self) -> &BinningConfig {
        &self.config
    }

    pub fn grid(&self) -> &PlanetaryGrid {
        &self.grid
    }

    pub fn manager(&self) -> &BinManager {
        &self.manager
    }

    /// Bin all passes and compute the output features.
    pub fn run(&self, passes: &[Pass<'_>], cancel: &CancellationToken) -> Result<BinningResult> {
        let start = Instant::now();
        info!(passes = passes.len(), parallel = self.config.parallel, "Starting binning run");

        let spatial: Vec<Vec<SpatialBin>> = if self.config.parallel {
            passes
                .par_iter()
                .map(|pass| self.bin_pass_checked(pass, cancel))
                .collect::<Result<_>>()?
        } else {
            passes
                .iter()
                .map(|pass| self.bin_pass_checked(pass, cancel))
                .collect::<Result<_>>()?
        };

        let bins = if self.config.parallel {
            self.merge_sharded(&spatial)
        } else {
            let mut temporal = TemporalBinner::new(&self.manager);
            for pass_bins in &spatial {
                temporal.add_spatial_bins(pass_bins);
            }
            temporal.finish()
        };

        info!(
            passes = passes.len(),
            bins = bins.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "Binning run complete"
        );

        Ok(BinningResult {
            grid: GridInfo {
                kind: self.grid.kind(),
                num_rows: self.grid.num_rows(),
                num_bins: self.grid.num_bins(),
            },
            feature_names: self.manager.output_schema().names().to_vec(),
            fill_value: self.manager.output_fill_value(),
            num_passes: passes.len(),
            bins,
        })
    }

    fn bin_pass_checked(&self, pass: &Pass<'_>, cancel: &CancellationToken) -> Result<Vec<SpatialBin>> {
        if cancel.is_cancelled() {
            warn!(pass = %pass.name, "Binning run cancelled");
            return Err(BinningError::Cancelled);
        }
        self.bin_pass(pass)
    }

    /// Spatially bin a single pass.
    pub fn bin_pass(&self, pass: &Pass<'_>) -> Result<Vec<SpatialBin>> {
        if self.config.data_period.is_some() && pass.time_coding.is_none() {
            return Err(BinningError::missing_time(&pass.name));
        }
        if pass.planes.len() != self.variables.len() {
            return Err(BinningError::invalid_input(format!(
                "pass '{}' has {} planes, expected {} ({:?})",
                pass.name,
                pass.planes.len(),
                self.variables.len(),
                self.variables.names()
            )));
        }

        let (width, height) = pass.raster_size().ok_or_else(|| {
            BinningError::invalid_input(format!("pass '{}' has no planes", pass.name))
        })?;
        let rect = pass.rect.unwrap_or_else(|| PixelRect::full(width, height));
        validate_planes(&pass.planes, pass.mask, rect)?;

        let pointer = SamplePointer::new(rect, self.config.super_sampling)?;
        let stream = ObservationStream::new(
            pointer,
            pass.planes.clone(),
            pass.mask,
            pass.geo_coding,
            pass.time_coding,
        );

        let mut binner = SpatialBinner::new(&self.manager, &self.grid, self.config.data_period);
        let consumed = binner.add_observations(stream);
        let bins = binner.complete();

        if bins.is_empty() {
            warn!(pass = %pass.name, observations = consumed, "Pass produced no binned observations");
            return Ok(bins);
        }

        debug!(
            pass = %pass.name,
            observations = consumed,
            bins = bins.len(),
            "Binned pass"
        );
        Ok(bins)
    }

    /// Merge per-pass bins on the rayon pool, sharded by bin index.
    fn merge_sharded(&self, spatial: &[Vec<SpatialBin>]) -> BTreeMap<u64, OutputBin> {
        let num_shards = rayon::current_num_threads().max(1);
        let mut shards: Vec<Vec<&SpatialBin>> = vec![Vec::new(); num_shards];
        // Pass order is kept within each shard.
        for bin in spatial.iter().flatten() {
            shards[(bin.index % num_shards as u64) as usize].push(bin);
        }

        shards
            .into_par_iter()
            .map(|shard| {
                let mut temporal = TemporalBinner::new(&self.manager);
                temporal.add_spatial_bins(shard);
                temporal.finish()
            })
            .reduce(BTreeMap::new, |mut acc, part| {
                acc.extend(part);
                acc
            })
    }
}
