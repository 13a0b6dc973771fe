//! Integration tests running remap and fill together on synthetic fields.

use grid_processor::{GapFiller, GridProcessorConfig, GridRemapper, InterpolationMethod};
use ndarray::Axis;
use ocean_common::{HarmonizeError, OceanMask, Variable};
use test_utils::{
    assert_approx_eq, assert_arrays_approx_eq, cmip6_meta, coastal_scenario, grid, oras5_meta,
    period, sample_raw_field, small_mask,
};

// =============================================================================
// Remap
// =============================================================================

#[test]
fn test_remap_preserves_time_and_grid_shape() {
    let raw = sample_raw_field(oras5_meta(Variable::Sss, period::reference()), 0.0);
    let remapper = GridRemapper::new(grid::small(), InterpolationMethod::Bilinear);
    let remapped = remapper.remap(&raw).unwrap();

    assert_eq!(remapped.series().data().dim(), (36, 10, 12));
    assert_eq!(remapped.series().dates(), raw.dates.as_slice());
    assert_eq!(remapped.series().meta(), &raw.meta);
}

#[test]
fn test_remap_leaves_coastal_gaps_as_nan() {
    let raw = sample_raw_field(oras5_meta(Variable::Sss, period::single_year()), 0.0);
    let remapped = GridRemapper::new(grid::small(), InterpolationMethod::Bilinear)
        .remap(&raw)
        .unwrap();
    let mask = small_mask();

    // Native land reaches further than the target land.
    let missing: Vec<_> = remapped
        .series()
        .missing_ocean_cells(&mask)
        .filter(|&(t, _, _)| t == 0)
        .map(|(_, row, col)| (row, col))
        .collect();
    assert_eq!(missing, vec![(0, 2), (1, 2), (2, 2), (3, 0), (3, 1), (3, 2)]);

    // No sentinel leaks through.
    assert!(remapped.series().data().iter().all(|v| v.is_nan() || *v < 100.0));
}

#[test]
fn test_nearest_and_bilinear_agree_on_native_nodes() {
    // Target centres sit on native nodes, so both kernels pick the node value.
    let raw = sample_raw_field(oras5_meta(Variable::Sss, period::single_year()), 0.0);
    let bilinear = GridRemapper::new(grid::small(), InterpolationMethod::Bilinear)
        .remap(&raw)
        .unwrap();
    let nearest = GridRemapper::new(grid::small(), InterpolationMethod::Nearest)
        .remap(&raw)
        .unwrap();

    assert_arrays_approx_eq!(bilinear.series().data(), nearest.series().data(), 1e-12);
}

// =============================================================================
// Remap + fill
// =============================================================================

#[test]
fn test_pipeline_fills_every_ocean_cell() {
    let config = GridProcessorConfig {
        grid: grid::small(),
        ..Default::default()
    };
    let mask = small_mask();
    let raw = sample_raw_field(cmip6_meta(Some("r1i1p1f1"), Variable::Sss, period::reference()), 0.2);

    let remapped = GridRemapper::from_config(&config).remap(&raw).unwrap();
    let (filled, report) = GapFiller::from_config(&config)
        .fill_with_report(remapped, &mask)
        .unwrap();

    assert_eq!(filled.series().missing_ocean_cells(&mask).count(), 0);
    assert_eq!(report.filled_per_step, vec![6; 36]);
    assert_eq!(report.max_radius_used, 1);

    // Land stays untouched (NaN from the remapper).
    for step in filled.series().data().axis_iter(Axis(0)) {
        assert!(step[[0, 0]].is_nan());
        assert!(step[[2, 1]].is_nan());
    }
}

#[test]
fn test_pipeline_fill_is_idempotent() {
    let config = GridProcessorConfig {
        grid: grid::small(),
        ..Default::default()
    };
    let mask = small_mask();
    let raw = sample_raw_field(oras5_meta(Variable::S200mAvg, period::single_year()), 0.0);
    let filler = GapFiller::from_config(&config);

    let once = filler
        .fill(GridRemapper::from_config(&config).remap(&raw).unwrap(), &mask)
        .unwrap();
    let (twice, report) = filler
        .fill_with_report(once.clone().into_remapped(), &mask)
        .unwrap();

    assert!(report.is_noop());
    assert_arrays_approx_eq!(once.series().data(), twice.series().data(), 0.0);
}

#[test]
fn test_coastal_scenario_averages_neighbouring_columns() {
    let (field, mask) = coastal_scenario();
    let filled = GapFiller::new(1).fill(field, &mask).unwrap();
    let step = filled.series().step(0);

    assert_approx_eq!(step[[1, 1]], 15.0, 1e-12);
    assert_eq!(step[[0, 2]], test_utils::SENTINEL);
    assert_eq!(step[[2, 0]], -999.0);
}

#[test]
fn test_unfillable_with_tiny_radius() {
    let mask = OceanMask::all_ocean(10, 12);
    let raw = sample_raw_field(oras5_meta(Variable::Sss, period::single_year()), 0.0);
    let remapped = GridRemapper::new(grid::small(), InterpolationMethod::Bilinear)
        .remap(&raw)
        .unwrap();

    // With every cell ocean, (0, 0) sits two cells away from the nearest donor.
    let err = GapFiller::new(1).fill(remapped, &mask).unwrap_err();
    match err {
        HarmonizeError::UnfillableCell {
            time_index,
            row,
            col,
            max_radius,
            ..
        } => {
            assert_eq!((time_index, row, col, max_radius), (0, 0, 0, 1));
        }
        other => panic!("unexpected error: {other:?}"),
    }
}
