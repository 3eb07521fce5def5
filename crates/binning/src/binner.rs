//! Spatial and temporal binning.
//!
//! A [`SpatialBinner`] folds the observations of a single pass into
//! per-bin spatial vectors. A [`TemporalBinner`] merges the completed
//! spatial bins of any number of passes and produces the output bins.

use std::collections::{BTreeMap, HashMap};

use tracing::debug;

use crate::bin_manager::{BinManager, OutputBin, SpatialBin, TemporalBin};
use crate::grid::PlanetaryGrid;
use crate::observation::Observation;
use crate::period::DataPeriod;
use crate::vector::BinContext;

/// Bins the observations of one pass.
pub struct SpatialBinner<'a> {
    manager: &'a BinManager,
    grid: &'a PlanetaryGrid,
    data_period: Option<DataPeriod>,
    bins: HashMap<u64, (SpatialBin, BinContext)>,
    num_observations: u64,
    num_outside_period: u64,
}

impl<'a> SpatialBinner<'a> {
    pub fn new(
        manager: &'a BinManager,
        grid: &'a PlanetaryGrid,
        data_period: Option<DataPeriod>,
    ) -> Self {
        Self {
            manager,
            grid,
            data_period,
            bins: HashMap::new(),
            num_observations: 0,
            num_outside_period: 0,
        }
    }

    /// Fold one observation into its bin.
    pub fn add_observation(&mut self, obs: &Observation) {
        if let Some(period) = &self.data_period {
            if !period.contains(obs.mjd) {
                self.num_outside_period += 1;
                return;
            }
        }

        let index = self.grid.bin_index_of(obs.lat, obs.lon);
        let manager = self.manager;
        let (bin, ctx) = self.bins.entry(index).or_insert_with(|| {
            let mut ctx = BinContext::new(index);
            let bin = manager.create_spatial_bin(&mut ctx);
            (bin, ctx)
        });
        manager.aggregate_spatial(ctx, obs.samples(), bin);
        self.num_observations += 1;
    }

    /// Fold a sequence of observations, returning how many were consumed.
    pub fn add_observations(&mut self, observations: impl IntoIterator<Item = Observation>) -> u64 {
        let mut count = 0;
        for obs in observations {
            self.add_observation(&obs);
            count += 1;
        }
        count
    }

    /// Observations binned so far.
    pub fn num_observations(&self) -> u64 {
        self.num_observations
    }

    /// Observations dropped by the data period.
    pub fn num_outside_period(&self) -> u64 {
        self.num_outside_period
    }

    /// Bins touched so far.
    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Complete every touched bin, ordered by bin index.
    pub fn complete(self) -> Vec<SpatialBin> {
        let manager = self.manager;
        let mut completed: Vec<SpatialBin> = self
            .bins
            .into_values()
            .map(|(mut bin, mut ctx)| {
                manager.complete_spatial_bin(&mut ctx, &mut bin);
                bin
            })
            .collect();
        completed.sort_unstable_by_key(|bin| bin.index);

        debug!(
            bins = completed.len(),
            observations = self.num_observations,
            outside_period = self.num_outside_period,
            "Completed spatial binning"
        );
        completed
    }
}

/// Merges spatial bins of many passes.
pub struct TemporalBinner<'a> {
    manager: &'a BinManager,
    bins: HashMap<u64, (TemporalBin, BinContext)>,
}

impl<'a> TemporalBinner<'a> {
    pub fn new(manager: &'a BinManager) -> Self {
        Self {
            manager,
            bins: HashMap::new(),
        }
    }

    /// Fold one pass's completed spatial bin.
    pub fn add_spatial_bin(&mut self, spatial: &SpatialBin) {
        if spatial.num_obs == 0 {
            return;
        }
        let manager = self.manager;
        let (bin, ctx) = self.bins.entry(spatial.index).or_insert_with(|| {
            let mut ctx = BinContext::new(spatial.index);
            let bin = manager.create_temporal_bin(&mut ctx);
            (bin, ctx)
        });
        manager.aggregate_temporal_bin(ctx, spatial, bin);
    }

    pub fn add_spatial_bins<'b>(&mut self, bins: impl IntoIterator<Item = &'b SpatialBin>) {
        for bin in bins {
            self.add_spatial_bin(bin);
        }
    }

    pub fn num_bins(&self) -> usize {
        self.bins.len()
    }

    /// Complete every bin and compute its output features.
    pub fn finish(self) -> BTreeMap<u64, OutputBin> {
        let manager = self.manager;
        self.bins
            .into_iter()
            .map(|(index, (mut bin, mut ctx))| {
                manager.complete_temporal_bin(&mut ctx, &mut bin);
                (index, manager.compute_output(&bin))
            })
            .collect()
    }
}
