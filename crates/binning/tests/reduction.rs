//! End-to-end binning runs over synthetic passes.

use std::collections::BTreeMap;

use binning::{
    AffineGeoCoding, AggregatorConfig, BinContext, BinningConfig, BinningError, BinningReducer,
    CancellationToken, ConstantTimeCoding, DataPeriod, GridConfig, GridKind, Observation,
    ObservationStream, OutputBin, Pass, PixelRect, RasterPlane, SamplePlane, SamplePointer,
    SpatialBinner,
};
use test_utils::{
    assert_approx_eq, create_periodic_mask, create_random_grid, insert_missing,
    shuffled_pixel_order, swath, time, write_temp_file,
};

fn init_tracing() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("binning=debug")
        .with_test_writer()
        .try_init();
}

fn config(kind: GridKind, rows: u32, parallel: bool) -> BinningConfig {
    BinningConfig {
        grid: GridConfig { kind, rows },
        variables: vec!["chl".into(), "sst".into()],
        aggregators: vec![
            AggregatorConfig::AverageLogNormal {
                variable: "chl".into(),
            },
            AggregatorConfig::OnMaxSet {
                on_max: "sst".into(),
                set: vec!["chl".into()],
            },
        ],
        parallel,
        ..Default::default()
    }
}

struct SyntheticPass {
    chl: RasterPlane,
    sst: RasterPlane,
    geo: AffineGeoCoding,
}

impl SyntheticPass {
    fn new(spec: &swath::SwathSpec, seed: u64) -> Self {
        let (w, h) = (spec.width, spec.height);
        let mut chl = create_random_grid(w, h, 0.05, 5.0, seed);
        insert_missing(&mut chl, 0.05, seed + 1000);
        let (min_lon, min_lat, max_lon, max_lat) = spec.bbox();
        Self {
            chl: RasterPlane::new(w, h, chl).unwrap(),
            sst: RasterPlane::new(w, h, create_random_grid(w, h, -2.0, 30.0, seed + 1)).unwrap(),
            geo: AffineGeoCoding::from_bounds(min_lon, min_lat, max_lon, max_lat, w, h),
        }
    }

    fn pass(&self, name: &str) -> Pass<'_> {
        Pass::new(
            name,
            vec![&self.chl as &dyn SamplePlane, &self.sst as &dyn SamplePlane],
            &self.geo,
        )
    }
}

fn assert_bins_close(a: &BTreeMap<u64, OutputBin>, b: &BTreeMap<u64, OutputBin>) {
    assert_eq!(a.len(), b.len());
    for (index, left) in a {
        let right = &b[index];
        assert_eq!(left.num_obs, right.num_obs, "bin {}", index);
        assert_eq!(left.num_passes, right.num_passes, "bin {}", index);
        for (l, r) in left.features.as_slice().iter().zip(right.features.as_slice()) {
            assert_approx_eq!(*l, *r, 1e-9 * l.abs().max(1.0));
        }
    }
}

#[test]
fn test_pixel_order_does_not_change_spatial_bins() {
    let spec = swath::NORTH_ATLANTIC;
    let data = SyntheticPass::new(&spec, 1);
    let reducer = BinningReducer::new(config(GridKind::ReducedGaussian, 128, false)).unwrap();

    let observations: Vec<Observation> = ObservationStream::new(
        SamplePointer::new(PixelRect::full(spec.width, spec.height), 1).unwrap(),
        vec![&data.chl as &dyn SamplePlane, &data.sst],
        None,
        &data.geo,
        None,
    )
    .collect();
    assert_eq!(observations.len(), spec.size());

    let mut in_order = SpatialBinner::new(reducer.manager(), reducer.grid(), None);
    for obs in &observations {
        in_order.add_observation(obs);
    }
    let mut shuffled = SpatialBinner::new(reducer.manager(), reducer.grid(), None);
    for (x, y) in shuffled_pixel_order(spec.width, spec.height, 99) {
        shuffled.add_observation(&observations[y * spec.width + x]);
    }

    let a = in_order.complete();
    let b = shuffled.complete();
    assert_eq!(a.len(), b.len());
    for (left, right) in a.iter().zip(&b) {
        assert_eq!(left.index, right.index);
        assert_eq!(left.num_obs, right.num_obs);
        for (l, r) in left.features.as_slice().iter().zip(right.features.as_slice()) {
            assert_approx_eq!(*l, *r, 1e-9 * l.abs().max(1.0));
        }
    }
}

#[test]
fn test_row_slices_bin_like_the_whole_raster() {
    let spec = swath::EQUATORIAL;
    let data = SyntheticPass::new(&spec, 4);
    let reducer = BinningReducer::new(config(GridKind::ReducedGaussian, 256, false)).unwrap();
    let full = PixelRect::full(spec.width, spec.height);
    let planes = vec![&data.chl as &dyn SamplePlane, &data.sst];

    let mut whole = SpatialBinner::new(reducer.manager(), reducer.grid(), None);
    whole.add_observations(ObservationStream::new(
        SamplePointer::new(full, 1).unwrap(),
        planes.clone(),
        None,
        &data.geo,
        None,
    ));

    let mut sliced = SpatialBinner::new(reducer.manager(), reducer.grid(), None);
    let stripes = full.split_rows(7);
    assert!(stripes.len() > 1);
    assert_eq!(stripes.iter().map(|r| r.pixel_count()).sum::<usize>(), full.pixel_count());
    for stripe in stripes {
        sliced.add_observations(ObservationStream::new(
            SamplePointer::new(stripe, 1).unwrap(),
            planes.clone(),
            None,
            &data.geo,
            None,
        ));
    }

    assert_eq!(whole.num_observations(), sliced.num_observations());
    let a = whole.complete();
    let b = sliced.complete();
    assert_eq!(a.len(), b.len());
    for (left, right) in a.iter().zip(&b) {
        assert_eq!(left.index, right.index);
        assert_eq!(left.num_obs, right.num_obs);
    }
}

#[test]
fn test_pass_order_does_not_change_output() {
    init_tracing();
    let spec = swath::NORTH_ATLANTIC;
    let data: Vec<SyntheticPass> = (0..4).map(|seed| SyntheticPass::new(&spec, seed * 17)).collect();
    let passes: Vec<Pass<'_>> = data
        .iter()
        .enumerate()
        .map(|(i, d)| d.pass(&format!("pass-{}", i)))
        .collect();
    let mut reversed = passes.clone();
    reversed.reverse();
    let rotated: Vec<Pass<'_>> = passes[2..].iter().chain(&passes[..2]).cloned().collect();

    for parallel in [false, true] {
        let reducer = BinningReducer::new(config(GridKind::ReducedGaussian, 128, parallel)).unwrap();
        let token = CancellationToken::new();
        let forward = reducer.run(&passes, &token).unwrap();
        assert!(forward.bins.values().all(|b| b.num_passes == 4));
        assert_bins_close(&forward.bins, &reducer.run(&reversed, &token).unwrap().bins);
        assert_bins_close(&forward.bins, &reducer.run(&rotated, &token).unwrap().bins);
    }
}

#[test]
fn test_untouched_bins_are_absent() {
    let spec = swath::SMALL;
    let data = SyntheticPass::new(&spec, 5);
    let reducer = BinningReducer::new(config(GridKind::Regular, 180, false)).unwrap();
    let result = reducer.run(&[data.pass("small")], &CancellationToken::new()).unwrap();

    // 2°x2° swath on a 1° grid.
    assert_eq!(result.bins.len(), 4);
    assert!(result.bins.values().all(|b| b.num_obs > 0));
    let far_away = reducer.grid().bin_index_of(-60.0, 120.0);
    assert!(!result.bins.contains_key(&far_away));
    assert!(result.feature(far_away, "chl_mean").is_none());
    assert!(result.fill_value.is_nan());
}

#[test]
fn test_completing_an_empty_temporal_bin_yields_fill() {
    let reducer = BinningReducer::new(config(GridKind::Regular, 18, false)).unwrap();
    let manager = reducer.manager();
    let mut ctx = BinContext::new(3);
    let mut bin = manager.create_temporal_bin(&mut ctx);
    manager.complete_temporal_bin(&mut ctx, &mut bin);
    let output = manager.compute_output(&bin);
    assert_eq!(output.num_obs, 0);
    assert!(output.features.as_slice().iter().all(|v| v.is_nan()));
}

#[test]
fn test_bins_without_valid_chlorophyll_are_fill() {
    let spec = swath::SMALL;
    let (w, h) = (spec.width, spec.height);
    let chl = RasterPlane::filled(w, h, f32::NAN);
    let sst = RasterPlane::new(w, h, create_random_grid(w, h, -2.0, 30.0, 5)).unwrap();
    let (min_lon, min_lat, max_lon, max_lat) = spec.bbox();
    let geo = AffineGeoCoding::from_bounds(min_lon, min_lat, max_lon, max_lat, w, h);
    let reducer = BinningReducer::new(config(GridKind::Regular, 180, false)).unwrap();

    let pass = Pass::new("no-chl", vec![&chl as &dyn SamplePlane, &sst], &geo);
    let result = reducer.run(&[pass], &CancellationToken::new()).unwrap();
    assert!(!result.bins.is_empty());
    for (index, bin) in &result.bins {
        assert!(bin.num_obs > 0);
        for name in ["chl_mean", "chl_sigma", "chl_median", "chl_mode"] {
            assert!(result.feature(*index, name).unwrap().is_nan(), "{} in bin {}", name, index);
        }
        assert!(result.feature(*index, "sst_max").unwrap().is_finite());
    }
}

#[test]
fn test_masked_pixels_are_not_binned() {
    let spec = swath::EQUATORIAL;
    let data = SyntheticPass::new(&spec, 8);
    let mask = RasterPlane::new(spec.width, spec.height, create_periodic_mask(spec.width, spec.height, 4))
        .unwrap();
    let reducer = BinningReducer::new(config(GridKind::Regular, 180, false)).unwrap();

    let result = reducer
        .run(&[data.pass("masked").with_mask(&mask)], &CancellationToken::new())
        .unwrap();
    let total: u32 = result.bins.values().map(|b| b.num_obs).sum();
    assert_eq!(total as usize, spec.size() - spec.size() / 4);
}

#[test]
fn test_yaml_config_run_with_data_period() {
    init_tracing();
    let yaml = format!(
        r#"
grid:
  kind: equal_area
  rows: 360
variables: [chl, sst]
parallel: true
super_sampling: 2
data_period:
  start_mjd: {}
  duration_days: 1.0
aggregators:
  - type: average_log_normal
    variable: chl
  - type: average
    variable: sst
    weight_coeff: 1.0
  - type: min_max
    variable: sst
  - type: percentile
    variable: sst
    percentage: 50
"#,
        time::MJD_2024_01_15
    );
    let file = write_temp_file(&yaml).unwrap();
    let config = BinningConfig::from_yaml_file(file.path()).unwrap();
    let reducer = BinningReducer::new(config).unwrap();

    let spec = swath::DATELINE;
    let inside = SyntheticPass::new(&spec, 21);
    let outside = SyntheticPass::new(&spec, 22);
    let t_inside = ConstantTimeCoding(time::MJD_2024_01_15 + 0.5);
    let t_outside = ConstantTimeCoding(time::MJD_2024_01_15 + 1.5);

    let result = reducer
        .run(
            &[
                inside.pass("inside").with_time_coding(&t_inside),
                outside.pass("outside").with_time_coding(&t_outside),
            ],
            &CancellationToken::new(),
        )
        .unwrap();

    let total: u32 = result.bins.values().map(|b| b.num_obs).sum();
    assert_eq!(total as usize, spec.size() * 4);
    assert!(result.bins.values().all(|b| b.num_passes == 1));
    assert_eq!(result.feature_names.len(), 4 + 3 + 2 + 1);
    assert!(result.feature_names.contains(&"sst_p50".to_string()));

    for (index, bin) in &result.bins {
        let min = result.feature(*index, "sst_min").unwrap();
        let max = result.feature(*index, "sst_max").unwrap();
        let mean = result.feature(*index, "sst_mean").unwrap();
        let median = result.feature(*index, "sst_p50").unwrap();
        let eps = 1e-9 * max.abs().max(1.0);
        assert!(min - eps <= mean && mean <= max + eps, "bin {}: {:?}", index, bin);
        assert!(min - eps <= median && median <= max + eps);
        assert_eq!(result.feature(*index, "sst_counts"), Some(bin.num_obs as f64));
    }

    let json = result.to_json().unwrap();
    assert!(json.contains("\"kind\":\"equal_area\""));
}

#[test]
fn test_missing_time_and_cancellation() {
    let spec = swath::SMALL;
    let data = SyntheticPass::new(&spec, 2);

    let mut cfg = config(GridKind::Regular, 180, true);
    cfg.data_period = Some(DataPeriod::new(time::MJD_2024_01_15, 1.0));
    let reducer = BinningReducer::new(cfg).unwrap();
    let result = reducer.run(&[data.pass("no-time")], &CancellationToken::new());
    assert!(matches!(
        result,
        Err(BinningError::MissingTime { ref pass }) if pass == "no-time"
    ));

    let reducer = BinningReducer::new(config(GridKind::Regular, 180, true)).unwrap();
    let token = CancellationToken::new();
    let clone = token.clone();
    clone.cancel();
    assert!(token.is_cancelled());
    assert!(matches!(
        reducer.run(&[data.pass("a"), data.pass("b")], &token),
        Err(BinningError::Cancelled)
    ));
}

#[test]
fn test_invalid_configs_are_rejected() {
    let mut bad_rows = config(GridKind::ReducedGaussian, 100, false);
    assert!(matches!(
        BinningReducer::new(bad_rows.clone()),
        Err(BinningError::Config(_))
    ));
    bad_rows.grid.rows = 128;
    bad_rows.aggregators.push(AggregatorConfig::MinMax {
        variable: "kd490".into(),
    });
    assert!(matches!(
        BinningReducer::new(bad_rows),
        Err(BinningError::Config(_))
    ));
}
