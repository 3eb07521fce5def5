//! Spatio-temporal Binning of Satellite Swath Data
//!
//! This crate reduces pixels of satellite passes onto a fixed global grid.
//! Every pixel becomes an observation (position, time, sample values) that
//! is assigned to a grid bin; the observations of a bin are reduced by
//! configurable aggregators, first per pass and then across passes.
//!
//! - **Grids**: regular equal-angle, reduced Gaussian (bundled row tables)
//!   and equal-area layouts, all numbered north to south
//! - **Aggregators**: log-normal average, value set at maximum, arithmetic
//!   average, min/max and percentile
//! - **Parallel**: passes are binned on the rayon pool, and the cross-pass
//!   merge is sharded by bin index
//!
//! # Architecture
//!
//! ```text
//! Pass (planes, mask, geo-coding, time-coding)
//!      │
//!      ▼
//! SamplePointer ──► ObservationStream ──► Observation { lat, lon, mjd, samples }
//!                                              │
//!                                              ▼
//!                          PlanetaryGrid::bin_index_of(lat, lon)
//!                                              │
//!                                              ▼
//!                 SpatialBinner (init → aggregate* → complete, per pass)
//!                                              │
//!                                              ▼
//!                 TemporalBinner (init → aggregate* → complete, all passes)
//!                                              │
//!                                              ▼
//!                         compute_output ──► BinningResult
//! ```
//!
//! # Example
//!
//! ```ignore
//! use binning::{BinningConfig, BinningReducer, CancellationToken, Pass};
//!
//! let config = BinningConfig::from_yaml_file("binning.yaml")?;
//! let reducer = BinningReducer::new(config)?;
//!
//! let pass = Pass::new("A2024001", vec![&chl, &sst], &geo_coding)
//!     .with_mask(&valid)
//!     .with_time_coding(&time_coding);
//!
//! let result = reducer.run(&[pass], &CancellationToken::new())?;
//! for (index, bin) in &result.bins {
//!     // ...
//! }
//! ```

pub mod aggregator;
pub mod bin_manager;
pub mod binner;
pub mod config;
pub mod error;
pub mod geocoding;
pub mod grid;
pub mod observation;
pub mod period;
pub mod raster;
pub mod reducer;
pub mod sample_pointer;
pub mod vector;

// Re-export commonly used types at crate root
pub use aggregator::{Aggregator, AggregatorConfig, AggregatorPhases, VariableContext};
pub use bin_manager::{BinManager, OutputBin, SpatialBin, TemporalBin};
pub use binner::{SpatialBinner, TemporalBinner};
pub use config::{BinningConfig, GridConfig};
pub use error::{BinningError, Result};
pub use geocoding::{
    AffineGeoCoding, ConstantTimeCoding, GeoCoding, GeoPos, GeostationaryGeoCoding,
    LinearTimeCoding, TimeCoding,
};
pub use grid::{EqualAreaGrid, GridKind, PlanetaryGrid, ReducedGaussianGrid, RegularGrid};
pub use observation::{Observation, ObservationExtractor, ObservationStream};
pub use period::DataPeriod;
pub use raster::{PixelRect, RasterPlane, SamplePlane};
pub use reducer::{BinningReducer, BinningResult, CancellationToken, GridInfo, Pass};
pub use sample_pointer::{SamplePointer, SamplePosition, MAX_SUPER_SAMPLING};
pub use vector::{BinContext, FeatureSchema, FeatureVector, VectorRole};
