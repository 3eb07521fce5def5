//! Binning pipeline benchmarks.
//!
//! This benchmark suite covers:
//! 1. Bin index lookup on the three grid families
//! 2. Observation extraction with and without a mask plane
//! 3. Spatial binning of a single swath
//! 4. Full multi-pass runs, sequential and parallel
//!
//! Run with: cargo bench --package binning --bench binning_benchmarks

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use rand::Rng;

use binning::{
    AffineGeoCoding, AggregatorConfig, BinningConfig, BinningReducer, CancellationToken,
    GridConfig, GridKind, ObservationStream, Pass, PixelRect, PlanetaryGrid, RasterPlane,
    SamplePlane, SamplePointer, SpatialBinner,
};

const SWATH_WIDTH: usize = 1354;
const SWATH_HEIGHT: usize = 203;

fn random_plane(rng: &mut impl Rng, min: f32, max: f32) -> RasterPlane {
    let data = (0..SWATH_WIDTH * SWATH_HEIGHT)
        .map(|_| rng.gen_range(min..max))
        .collect();
    RasterPlane::new(SWATH_WIDTH, SWATH_HEIGHT, data).unwrap()
}

fn swath_geo() -> AffineGeoCoding {
    // Roughly one MODIS 5-minute granule at 1 km.
    AffineGeoCoding::from_bounds(-40.0, 30.0, -27.0, 32.0, SWATH_WIDTH, SWATH_HEIGHT)
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

// =============================================================================
// GRID LOOKUP
// =============================================================================

fn bench_bin_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("bin_index_of");
    let mut rng = rand::thread_rng();
    let points: Vec<(f64, f64)> = (0..10_000)
        .map(|_| (rng.gen_range(-90.0..90.0), rng.gen_range(-180.0..180.0)))
        .collect();
    group.throughput(Throughput::Elements(points.len() as u64));

    for (kind, rows) in [
        (GridKind::Regular, 2160),
        (GridKind::ReducedGaussian, 640),
        (GridKind::EqualArea, 2160),
    ] {
        let grid = PlanetaryGrid::from_config(&GridConfig { kind, rows }).unwrap();
        group.bench_with_input(BenchmarkId::new(kind.as_str(), rows), &points, |b, points| {
            b.iter(|| {
                let mut acc = 0u64;
                for &(lat, lon) in points {
                    acc = acc.wrapping_add(grid.bin_index_of(black_box(lat), black_box(lon)));
                }
                acc
            });
        });
    }
    group.finish();
}

// =============================================================================
// EXTRACTION
// =============================================================================

fn bench_extraction(c: &mut Criterion) {
    let mut group = c.benchmark_group("extraction");
    let mut rng = rand::thread_rng();
    let chl = random_plane(&mut rng, 0.05, 5.0);
    let sst = random_plane(&mut rng, -2.0, 30.0);
    let ones = RasterPlane::filled(SWATH_WIDTH, SWATH_HEIGHT, 1.0);
    let geo = swath_geo();
    let rect = PixelRect::full(SWATH_WIDTH, SWATH_HEIGHT);
    group.throughput(Throughput::Elements(rect.pixel_count() as u64));

    for (name, mask) in [("unmasked", None), ("masked", Some(&ones as &dyn SamplePlane))] {
        group.bench_function(name, |b| {
            b.iter(|| {
                ObservationStream::new(
                    SamplePointer::new(rect, 1).unwrap(),
                    vec![&chl as &dyn SamplePlane, &sst],
                    mask,
                    &geo,
                    None,
                )
                .count()
            });
        });
    }
    group.finish();
}

// =============================================================================
// SPATIAL BINNING
// =============================================================================

fn bench_spatial_binning(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_binning");
    group.sample_size(20);
    let mut rng = rand::thread_rng();
    let chl = random_plane(&mut rng, 0.05, 5.0);
    let sst = random_plane(&mut rng, -2.0, 30.0);
    let geo = swath_geo();
    let rect = PixelRect::full(SWATH_WIDTH, SWATH_HEIGHT);
    group.throughput(Throughput::Elements(rect.pixel_count() as u64));

    for rows in [128u32, 640] {
        let reducer = BinningReducer::new(config(GridKind::ReducedGaussian, rows, false)).unwrap();
        group.bench_with_input(BenchmarkId::new("reduced_gaussian", rows), &rows, |b, _| {
            b.iter(|| {
                let mut binner = SpatialBinner::new(reducer.manager(), reducer.grid(), None);
                binner.add_observations(ObservationStream::new(
                    SamplePointer::new(rect, 1).unwrap(),
                    vec![&chl as &dyn SamplePlane, &sst],
                    None,
                    &geo,
                    None,
                ));
                binner.complete().len()
            });
        });
    }
    group.finish();
}

// =============================================================================
// FULL RUNS
// =============================================================================

fn bench_full_run(c: &mut Criterion) {
    let mut group = c.benchmark_group("full_run");
    group.sample_size(10);
    let mut rng = rand::thread_rng();
    let planes: Vec<(RasterPlane, RasterPlane)> = (0..8)
        .map(|_| (random_plane(&mut rng, 0.05, 5.0), random_plane(&mut rng, -2.0, 30.0)))
        .collect();
    let geo = swath_geo();
    let passes: Vec<Pass<'_>> = planes
        .iter()
        .enumerate()
        .map(|(i, (chl, sst))| {
            Pass::new(
                format!("granule-{}", i),
                vec![chl as &dyn SamplePlane, sst as &dyn SamplePlane],
                &geo,
            )
        })
        .collect();
    group.throughput(Throughput::Elements(
        (passes.len() * SWATH_WIDTH * SWATH_HEIGHT) as u64,
    ));

    for parallel in [false, true] {
        let reducer = BinningReducer::new(config(GridKind::ReducedGaussian, 640, parallel)).unwrap();
        let name = if parallel { "parallel" } else { "sequential" };
        group.bench_function(name, |b| {
            b.iter(|| {
                reducer
                    .run(black_box(&passes), &CancellationToken::new())
                    .unwrap()
                    .bins
                    .len()
            });
        });
    }
    group.finish();
}

criterion_group!(grid_benches, bench_bin_index);

criterion_group!(extraction_benches, bench_extraction);

criterion_group!(binning_benches, bench_spatial_binning, bench_full_run);

criterion_main!(grid_benches, extraction_benches, binning_benches);
