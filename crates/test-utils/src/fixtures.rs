//! Common test fixtures for the harmonization workspace.
//!
//! This module provides pre-defined records, grids and masks that represent
//! common scenarios in ocean data harmonization.

use crate::generators::{create_axis, create_raw_field, salinity_at};
use chrono::NaiveDate;
use ndarray::{array, Array3};
use ocean_common::time::monthly_dates;
use ocean_common::{
    FieldMeta, GriddedSeries, OceanMask, RawField, RemappedField, Source, TimeRange, Variable,
};

/// Fill sentinel used by the synthetic native fields.
pub const SENTINEL: f64 = 1e20;

/// Common grid specifications for testing.
pub mod grid {
    use ocean_common::GridSpec;

    /// Small regional grid: 12 x 10 cells at 1 degree, first centre (30E, 30S).
    pub fn small() -> GridSpec {
        GridSpec::new(12, 10, 1.0, 1.0, 30.0, -30.0)
    }

    /// Default 85 x 85 regional grid.
    pub fn regional() -> GridSpec {
        GridSpec::regional_85()
    }
}

/// Common record periods for testing.
pub mod period {
    use ocean_common::TimeRange;

    /// Three-year reference period, long enough for every calendar month.
    pub fn reference() -> TimeRange {
        TimeRange::new(2000, 2002)
    }

    /// One-year period.
    pub fn single_year() -> TimeRange {
        TimeRange::new(2000, 2000)
    }
}

/// Reanalysis record identity.
pub fn oras5_meta(variable: Variable, period: TimeRange) -> FieldMeta {
    FieldMeta::new(Source::Oras5, variable, period)
}

/// Model record identity.
pub fn cmip6_meta(member: Option<&str>, variable: Variable, period: TimeRange) -> FieldMeta {
    FieldMeta::new(
        Source::Cmip6 {
            member: member.map(str::to_string),
        },
        variable,
        period,
    )
}

/// Target mask for [`grid::small`]: land in the south-west corner
/// (rows 0..=2, cols 0..=1).
pub fn small_mask() -> OceanMask {
    let (ny, nx) = grid::small().shape();
    let mut mask = OceanMask::all_ocean(ny, nx).to_mask1();
    for row in 0..=2 {
        for col in 0..=1 {
            mask[[row, col]] = 0.0;
        }
    }
    OceanMask::from_mask1(mask.view()).expect("mask holds only 0 and 1")
}

/// Native 0.5 degree field covering [`grid::small`], latitude descending.
///
/// The native land region (lon < 32.5, lat < -26.5) is wider than the land in
/// [`small_mask`], so remapping leaves coastal ocean cells missing and the
/// gap filler has work to do. Land nodes hold [`SENTINEL`].
///
/// # Arguments
///
/// * `meta` - Record identity (its period selects the dates)
/// * `bias` - Constant added to every ocean value, to tell sources apart
pub fn sample_raw_field(meta: FieldMeta, bias: f64) -> RawField {
    let dates = monthly_dates(meta.period);
    let lon = create_axis(29.0, 0.5, 27);
    let lat = create_axis(-18.0, -0.5, 27);
    let mut raw = create_raw_field(meta, lon, lat, dates, |lon, lat, date| {
        if lon < 32.5 && lat < -26.5 {
            SENTINEL
        } else {
            salinity_at(lon, lat, date) + bias
        }
    });
    raw.missing_value = Some(SENTINEL);
    raw
}

/// 3 x 3 coastal scenario as remapper output.
///
/// Land at (2, 0) and (0, 2); the middle ocean column is missing; column 0
/// holds 10 and column 2 holds 20. Land cells carry junk values.
pub fn coastal_scenario() -> (RemappedField, OceanMask) {
    let nan = f64::NAN;
    let step = array![[10.0, nan, SENTINEL], [10.0, nan, 20.0], [-999.0, nan, 20.0]];
    let data: Array3<f64> = step.insert_axis(ndarray::Axis(0));
    let meta = oras5_meta(Variable::Sss, period::single_year());
    let dates = vec![NaiveDate::from_ymd_opt(2000, 1, 15).expect("valid date")];
    let series = GriddedSeries::new(meta, dates, data).expect("one date per step");
    let mask = OceanMask::new(array![
        [true, true, false],
        [true, true, true],
        [false, true, true]
    ]);
    (RemappedField::new(series), mask)
}

/// Fresh temporary directory for filesystem tests; removed on drop.
pub fn scratch_dir() -> tempfile::TempDir {
    tempfile::Builder::new()
        .prefix("harmonizer-test-")
        .tempdir()
        .expect("create temp dir")
}
