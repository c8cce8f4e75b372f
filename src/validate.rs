use std::fmt;

use crate::config::LoaderSettings;
use crate::domain::{InputRow, Key};
use crate::error::LoadError;
use crate::resolve::Resolver;
use crate::store::ReferenceStore;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Strain,
    Marker,
    Allele1,
    CellLine1,
    Allele2,
    CellLine2,
    ExistsAs,
    PairState,
    Compound,
    CreatedBy,
    GeneralNote,
    PrivateNote,
}

impl Field {
    pub fn label(self) -> &'static str {
        match self {
            Field::Strain => "Strain",
            Field::Marker => "Marker",
            Field::Allele1 => "Allele 1",
            Field::CellLine1 => "Mutant Cell Line 1",
            Field::Allele2 => "Allele 2",
            Field::CellLine2 => "Mutant Cell Line 2",
            Field::ExistsAs => "Exists As",
            Field::PairState => "Pair State",
            Field::Compound => "Compound",
            Field::CreatedBy => "User",
            Field::GeneralNote => "General Note",
            Field::PrivateNote => "Private Note",
        }
    }

    /// Unresolvable mutant cell lines are reported but leave the row intact.
    pub fn rejects_row(self) -> bool {
        !matches!(self, Field::CellLine1 | Field::CellLine2)
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionFailure {
    pub field: Field,
    pub value: String,
}

/// A row whose every required reference resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedRow {
    pub line: u64,
    pub row: InputRow,
    pub strain: Key,
    pub marker: Key,
    pub allele1: Key,
    pub allele2: Option<Key>,
    pub cell_line1: Option<Key>,
    pub cell_line2: Option<Key>,
    pub conditional: bool,
    pub exists_as: Key,
    pub pair_state: Key,
    pub compound: Key,
    pub created_by: Key,
    /// Cell-line failures that were reported without rejecting the row.
    pub warnings: Vec<ResolutionFailure>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RowOutcome {
    /// The row names a genotype that already exists; echo it and move on.
    Existing(InputRow),
    Rejected {
        row: InputRow,
        failures: Vec<ResolutionFailure>,
    },
    Resolved(Box<ResolvedRow>),
}

/// Resolves every reference of a row. All lookups are attempted even after
/// one fails, so a row reports each bad value once.
pub fn validate<S: ReferenceStore + ?Sized>(
    row: InputRow,
    line: u64,
    resolver: &mut Resolver<'_, S>,
    settings: &LoaderSettings,
) -> Result<RowOutcome, LoadError> {
    if row.is_existing_genotype() {
        return Ok(RowOutcome::Existing(row));
    }

    let types = &settings.types;
    let vocab = &settings.vocabularies;
    let mut failures = Vec::new();
    let mut check = |field: Field, value: &str, key: Option<Key>| {
        if key.is_none() {
            failures.push(ResolutionFailure {
                field,
                value: value.to_string(),
            });
        }
        key
    };

    let strain =
        resolver.resolve_entity(&row.strain_id, types.strain, Field::Strain.label(), line)?;
    let strain = check(Field::Strain, &row.strain_id, strain);

    let marker =
        resolver.resolve_entity(&row.marker_id, types.marker, Field::Marker.label(), line)?;
    let marker = check(Field::Marker, &row.marker_id, marker);

    let allele1 =
        resolver.resolve_allele(&row.allele1_id, types.allele, Field::Allele1.label(), line)?;
    let allele1 = check(Field::Allele1, &row.allele1_id, allele1);

    let cell_line1 = optional(&row.cell_line1_id, |id| {
        resolver.resolve_entity(id, types.cell_line, Field::CellLine1.label(), line)
    })?;
    let cell_line1 = cell_line1.map(|key| check(Field::CellLine1, &row.cell_line1_id, key));

    let allele2 = optional(&row.allele2_id, |id| {
        resolver.resolve_allele(id, types.allele, Field::Allele2.label(), line)
    })?;
    let allele2 = allele2.map(|key| check(Field::Allele2, &row.allele2_id, key));

    let cell_line2 = optional(&row.cell_line2_id, |id| {
        resolver.resolve_entity(id, types.cell_line, Field::CellLine2.label(), line)
    })?;
    let cell_line2 = cell_line2.map(|key| check(Field::CellLine2, &row.cell_line2_id, key));

    let exists_as =
        resolver.resolve_term(vocab.exists_as, &row.exists_as, Field::ExistsAs.label(), line)?;
    let exists_as = check(Field::ExistsAs, &row.exists_as, exists_as);

    let pair_state =
        resolver.resolve_term(vocab.pair_state, &row.pair_state, Field::PairState.label(), line)?;
    let pair_state = check(Field::PairState, &row.pair_state, pair_state);

    let compound =
        resolver.resolve_term(vocab.compound, &row.compound, Field::Compound.label(), line)?;
    let compound = check(Field::Compound, &row.compound, compound);

    let created_by = resolver.resolve_user(&row.created_by, line)?;
    let created_by = check(Field::CreatedBy, &row.created_by, created_by);

    for (field, text) in [
        (Field::GeneralNote, row.general_note.as_str()),
        (Field::PrivateNote, row.private_note.as_str()),
    ] {
        if !note_is_loadable(text, settings.bulk_delimiter) {
            resolver.report(field.label(), line, text)?;
            check(field, text, None);
        }
    }

    let (warnings, rejecting): (Vec<_>, Vec<_>) =
        failures.into_iter().partition(|failure| !failure.field.rejects_row());

    match (strain, marker, allele1, exists_as, pair_state, compound, created_by) {
        (
            Some(strain),
            Some(marker),
            Some(allele1),
            Some(exists_as),
            Some(pair_state),
            Some(compound),
            Some(created_by),
        ) if rejecting.is_empty() => {
            let conditional = row.is_conditional();
            Ok(RowOutcome::Resolved(Box::new(ResolvedRow {
                line,
                row,
                strain,
                marker,
                allele1,
                allele2: allele2.flatten(),
                cell_line1: cell_line1.flatten(),
                cell_line2: cell_line2.flatten(),
                conditional,
                exists_as,
                pair_state,
                compound,
                created_by,
                warnings,
            })))
        }
        _ => {
            let mut failures = rejecting;
            failures.extend(warnings);
            Ok(RowOutcome::Rejected { row, failures })
        }
    }
}

/// Resolves a value only when present. The outer `Option` is `None` for an
/// empty field; the inner one is `None` when resolution failed.
fn optional<F>(value: &str, resolve: F) -> Result<Option<Option<Key>>, LoadError>
where
    F: FnOnce(&str) -> Result<Option<Key>, LoadError>,
{
    if value.is_empty() {
        return Ok(None);
    }
    resolve(value).map(Some)
}

fn note_is_loadable(text: &str, delimiter: char) -> bool {
    !text.contains(delimiter) && !text.contains(['\n', '\r'])
}

#[cfg(test)]
mod tests {
    use std::collections::BTreeMap;

    use assert_matches::assert_matches;
    use camino::Utf8PathBuf;

    use super::*;
    use crate::domain::INPUT_FIELD_COUNT;
    use crate::runlog::RunLog;
    use crate::store::{
        Snapshot, SnapshotAccession, SnapshotMaxima, SnapshotStore, SnapshotTerm, SnapshotUser,
    };

    fn store() -> SnapshotStore {
        let acc = |acc_id: &str, mgi_type, object_key, status| SnapshotAccession {
            acc_id: acc_id.to_string(),
            mgi_type,
            object_key,
            status,
        };
        let term = |vocab, term: &str, key| SnapshotTerm {
            vocab,
            term: term.to_string(),
            key,
        };
        SnapshotStore::from_snapshot(Snapshot {
            maxima: SnapshotMaxima::default(),
            accession_max: BTreeMap::new(),
            accessions: vec![
                acc("STRAIN:1", 10, 501, None),
                acc("MRK:1", 2, 601, None),
                acc("ALL:1", 11, 701, Some(847114)),
                acc("ALL:2", 11, 702, Some(3983021)),
                acc("ALL:RESERVED", 11, 703, Some(847115)),
                acc("CL:1", 28, 801, None),
            ],
            terms: vec![
                term(60, "Mouse Line", 9001),
                term(39, "Homozygous", 9002),
                term(42, "Not Applicable", 9003),
            ],
            users: vec![SnapshotUser {
                login: "user1".to_string(),
                key: 1001,
            }],
        })
    }

    fn row(overrides: &[(usize, &str)]) -> InputRow {
        let mut fields = vec![
            "1", "", "STRAIN:1", "StrainA", "MRK:1", "ALL:1", "", "", "", "no", "Mouse Line", "",
            "", "Homozygous", "Not Applicable", "user1",
        ];
        assert_eq!(fields.len(), INPUT_FIELD_COUNT);
        for &(idx, value) in overrides {
            fields[idx] = value;
        }
        InputRow::from_fields(fields).unwrap()
    }

    fn run(row: InputRow) -> (RowOutcome, String) {
        let temp = tempfile::tempdir().unwrap();
        let path = Utf8PathBuf::from_path_buf(temp.path().join("test.error")).unwrap();
        let store = store();
        let settings = LoaderSettings::default();
        let mut errors = RunLog::create(&path).unwrap();
        let outcome = {
            let mut resolver =
                Resolver::new(&store, &mut errors, &settings.approved_allele_statuses);
            validate(row, 7, &mut resolver, &settings).unwrap()
        };
        errors.finish().unwrap();
        let log = std::fs::read_to_string(path.as_std_path()).unwrap();
        (outcome, log)
    }

    #[test]
    fn resolves_complete_row() {
        let (outcome, log) = run(row(&[]));
        let resolved = match outcome {
            RowOutcome::Resolved(resolved) => resolved,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(resolved.strain, 501);
        assert_eq!(resolved.marker, 601);
        assert_eq!(resolved.allele1, 701);
        assert_eq!(resolved.allele2, None);
        assert_eq!(resolved.created_by, 1001);
        assert!(!resolved.conditional);
        assert!(!log.contains("Invalid"));
    }

    #[test]
    fn existing_genotype_skips_resolution() {
        let (outcome, log) = run(row(&[(1, "MGI:123"), (2, "STRAIN:404")]));
        assert_matches!(outcome, RowOutcome::Existing(_));
        assert!(!log.contains("Invalid"));
    }

    #[test]
    fn collects_every_failure() {
        let (outcome, log) = run(row(&[(4, "MRK:404"), (13, "Heterozygous"), (15, "nobody")]));
        let failures = match outcome {
            RowOutcome::Rejected { failures, .. } => failures,
            other => panic!("unexpected outcome: {other:?}"),
        };
        let fields = failures.iter().map(|f| f.field).collect::<Vec<_>>();
        assert_eq!(fields, vec![Field::Marker, Field::PairState, Field::CreatedBy]);
        assert!(log.contains("Invalid Marker (row 7) MRK:404"));
        assert!(log.contains("Invalid Pair State (row 7) Heterozygous"));
        assert!(log.contains("Invalid User (row 7) nobody"));
    }

    #[test]
    fn allele_status_is_restricted() {
        let (outcome, log) = run(row(&[(5, "ALL:RESERVED")]));
        assert_matches!(outcome, RowOutcome::Rejected { .. });
        assert!(log.contains("Invalid Allele 1 (row 7) ALL:RESERVED"));

        let (outcome, _) = run(row(&[(5, "ALL:2")]));
        assert_matches!(outcome, RowOutcome::Resolved(_));
    }

    #[test]
    fn unresolvable_allele2_rejects() {
        let (outcome, log) = run(row(&[(7, "ALL:404")]));
        assert_matches!(outcome, RowOutcome::Rejected { .. });
        assert!(log.contains("Invalid Allele 2 (row 7) ALL:404"));

        let (outcome, _) = run(row(&[(7, "ALL:2")]));
        let resolved = match outcome {
            RowOutcome::Resolved(resolved) => resolved,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(resolved.allele2, Some(702));
    }

    #[test]
    fn unresolvable_cell_line_is_a_warning() {
        let (outcome, log) = run(row(&[(6, "CL:404"), (8, "CL:1")]));
        let resolved = match outcome {
            RowOutcome::Resolved(resolved) => resolved,
            other => panic!("unexpected outcome: {other:?}"),
        };
        assert_eq!(resolved.cell_line1, None);
        assert_eq!(resolved.cell_line2, Some(801));
        assert_eq!(resolved.warnings.len(), 1);
        assert!(log.contains("Invalid Mutant Cell Line 1 (row 7) CL:404"));
    }

    #[test]
    fn note_with_delimiter_rejects() {
        let (outcome, log) = run(row(&[(11, "a|b")]));
        assert_matches!(outcome, RowOutcome::Rejected { .. });
        assert!(log.contains("Invalid General Note (row 7) a|b"));
    }

    #[test]
    fn conditional_flag() {
        let (outcome, _) = run(row(&[(9, "yes")]));
        assert_matches!(outcome, RowOutcome::Resolved(resolved) if resolved.conditional);
        let (outcome, _) = run(row(&[(9, "Yes")]));
        assert_matches!(outcome, RowOutcome::Resolved(resolved) if !resolved.conditional);
    }
}
