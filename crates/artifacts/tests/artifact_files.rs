//! Filesystem tests for artifact files and the data layout.

use artifacts::{
    load_norm_params, save_norm_params, ArtifactError, ArtifactFile, ArtifactKind, DataLayout,
    RawArtifact, MASK_ARRAY,
};
use calibration::{Calibration, NormalizationMethod};
use ocean_common::time::monthly_dates;
use ocean_common::{FilledField, GriddedSeries, OceanMask, Source, TimeRange, Variable};
use test_utils::{
    assert_arrays_approx_eq, cmip6_meta, create_coastal_mask, create_salinity_series, grid,
    oras5_meta, period, poison_land, sample_raw_field, scratch_dir,
};

fn filled(meta: ocean_common::FieldMeta, mask: &OceanMask) -> FilledField {
    let (ny, nx) = mask.shape();
    let dates = monthly_dates(meta.period);
    let (meta, dates, mut data) = create_salinity_series(meta, dates, ny, nx, 3).into_parts();
    poison_land(&mut data, mask, f64::NAN);
    FilledField::try_new(GriddedSeries::new(meta, dates, data).unwrap(), mask).unwrap()
}

#[test]
fn test_filled_artifact_survives_disk() {
    let dir = scratch_dir();
    let layout = DataLayout::new(dir.path().join("data"), dir.path().join("output"));
    layout.ensure_output_dirs(Variable::Sss).unwrap();

    let grid = grid::small();
    let (ny, nx) = grid.shape();
    let mask = create_coastal_mask(ny, nx, 3);
    let field = filled(oras5_meta(Variable::Sss, period::reference()), &mask);

    let mut file = ArtifactFile::for_grid(Variable::Sss, grid);
    file.insert_series(field.series()).unwrap();
    file.insert_mask(&mask).unwrap();

    let path = layout.filled_path(Variable::Sss, &Source::Oras5, period::reference());
    file.save(&path).unwrap();
    let back = ArtifactFile::load(&path).unwrap();

    assert_eq!(back.header, file.header);
    assert_eq!(back.mask().unwrap(), mask);
    let series = back.filled_series(&Source::Oras5, &mask).unwrap();
    assert_arrays_approx_eq!(series.series().data(), field.series().data(), 0.0);
    assert!(series.series().data()[[0, 0, 0]].is_nan());
}

#[test]
fn test_load_rejects_inconsistent_file() {
    let dir = scratch_dir();
    let path = dir.path().join("broken.json");
    let json = r#"{
        "header": {
            "variable": "sss",
            "created_at": "2024-01-01T00:00:00Z",
            "producer": "hand written"
        },
        "dates": [],
        "arrays": {
            "mask1": {"shape": [2, 2], "values": [1.0, 1.0, 0.0, 1.0]},
            "oras5_mclim": {"shape": [12, 3, 3], "values": []}
        }
    }"#;
    std::fs::write(&path, json).unwrap();

    let err = ArtifactFile::load(&path).unwrap_err();
    assert!(matches!(err, ArtifactError::InvalidShape { .. }), "{err}");

    let missing = ArtifactFile::load(dir.path().join("absent.json")).unwrap_err();
    assert!(matches!(missing, ArtifactError::Io { .. }));
}

#[test]
fn test_mask_values_must_be_binary() {
    let dir = scratch_dir();
    let path = dir.path().join("mask.json");
    let json = r#"{
        "header": {"variable": "sss", "created_at": "2024-01-01T00:00:00Z", "producer": "x"},
        "arrays": {"mask1": {"shape": [1, 2], "values": [1.0, 0.5]}}
    }"#;
    std::fs::write(&path, json).unwrap();

    let file = ArtifactFile::load(&path).unwrap();
    assert!(matches!(file.mask(), Err(ArtifactError::Harmonize(_))));
    assert!(file.contains(MASK_ARRAY));
}

#[test]
fn test_availability_and_directories() {
    let dir = scratch_dir();
    let layout = DataLayout::new(dir.path().join("data"), dir.path().join("output"));
    let training = TimeRange::new(1958, 2014);
    let climatology = TimeRange::new(1958, 2020);
    let models = [Source::Cmip6 { member: None }];

    let created = layout.ensure_output_dirs(Variable::S200mAvg).unwrap();
    assert_eq!(created.len(), 3);
    assert!(layout.models_dir().is_dir());
    assert!(layout.ensure_output_dirs(Variable::S200mAvg).unwrap().is_empty());

    let missing = layout.check_availability(Variable::S200mAvg, &models, training, climatology);
    assert_eq!(
        missing,
        layout.essential_files(Variable::S200mAvg, &models, training, climatology)
    );

    std::fs::write(layout.climatology_path(Variable::S200mAvg, climatology), "{}").unwrap();
    let missing = layout.check_availability(Variable::S200mAvg, &models, training, climatology);
    assert_eq!(missing.len(), 2);
    assert!(missing.iter().all(|p| p.to_string_lossy().ends_with("_fill_diststen.json")));
}

#[test]
fn test_discover_classifies_files() {
    let dir = scratch_dir();
    let layout = DataLayout::new(dir.path(), dir.path().join("output"));
    layout.ensure_output_dirs(Variable::Sss).unwrap();

    let raw = sample_raw_field(cmip6_meta(None, Variable::Sss, period::single_year()), 0.0);
    let cmip6 = Source::Cmip6 { member: None };
    RawArtifact::save(&raw, layout.raw_path(Variable::Sss, &cmip6, period::single_year())).unwrap();
    std::fs::write(layout.climatology_path(Variable::Sss, period::reference()), "{}").unwrap();
    std::fs::write(layout.variable_dir(Variable::Sss).join("notes.txt"), "x").unwrap();

    let found = layout.discover(Variable::Sss).unwrap();
    let kinds: Vec<_> = found.iter().map(|a| a.kind).collect();
    assert_eq!(kinds, vec![ArtifactKind::Raw, ArtifactKind::Climatology]);
    assert_eq!(found[0].period, Some(period::single_year()));
    assert_eq!(found[1].period, Some(period::reference()));

    assert!(layout.discover(Variable::S200mAvg).unwrap().is_empty());
}

#[test]
fn test_norm_params_file() {
    let dir = scratch_dir();
    let mask = create_coastal_mask(6, 6, 2);
    let field = filled(oras5_meta(Variable::Sss, period::reference()), &mask);
    let calibration = Calibration::from_reference(&field, mask, NormalizationMethod::ZScore).unwrap();

    let path = dir.path().join("sss_norm_params.json");
    save_norm_params(calibration.params(), &path).unwrap();
    assert_eq!(&load_norm_params(&path).unwrap(), calibration.params());

    let mut doc: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
    doc["scale"] = serde_json::json!(0.0);
    std::fs::write(&path, doc.to_string()).unwrap();
    assert!(matches!(load_norm_params(&path), Err(ArtifactError::Harmonize(_))));
}
