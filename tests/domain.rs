use assert_matches::assert_matches;

use genotypeload::domain::{AccessionId, INPUT_FIELD_COUNT, InputRow, RunMode};
use genotypeload::error::LoadError;

#[test]
fn parse_run_mode() {
    let mode: RunMode = "preview".parse().unwrap();
    assert!(mode.is_preview());
    assert_eq!(mode.to_string(), "preview");
}

#[test]
fn parse_run_mode_invalid() {
    let err = "".parse::<RunMode>().unwrap_err();
    assert_matches!(err, LoadError::InvalidMode(_));
}

#[test]
fn row_fields_keep_input_order() {
    let raw = (0..INPUT_FIELD_COUNT)
        .map(|idx| format!("f{idx}"))
        .collect::<Vec<_>>();
    let row = InputRow::from_fields(raw.iter().map(String::as_str)).unwrap();
    assert_eq!(row.marker_id, "f4");
    assert_eq!(row.pair_state, "f13");
    assert_eq!(row.fields().to_vec(), raw.iter().map(String::as_str).collect::<Vec<_>>());
    assert!(row.is_existing_genotype());
}

#[test]
fn accession_id_formats_prefix_and_number() {
    let id = AccessionId::new("MGI:", 6283190);
    assert_eq!(id.to_string(), "MGI:6283190");
    assert_eq!(id.prefix(), "MGI:");
}
