use std::time::{Duration, Instant};

use camino::Utf8PathBuf;
use serde::Serialize;

use crate::accession::AccessionMinter;
use crate::bulk::BulkLoader;
use crate::config::LoaderSettings;
use crate::domain::{AccessionId, Key, RunMode};
use crate::emit::{ArtifactEmitter, EmitCounts};
use crate::error::LoadError;
use crate::group::GenotypeGrouper;
use crate::input::InputReader;
use crate::keys::{Counter, KeyAllocator};
use crate::records::{AllelePairRecord, GenotypeRecord, NoteChunkRecord, NoteRecord, chunk_note};
use crate::resolve::Resolver;
use crate::runlog::{OutputLayout, RunLog};
use crate::store::ReferenceStore;
use crate::validate::{ResolvedRow, RowOutcome, validate};

#[derive(Debug, Clone)]
pub struct RunPaths {
    pub input: Utf8PathBuf,
    pub output_dir: Utf8PathBuf,
    pub echo: Utf8PathBuf,
}

#[derive(Debug, Clone)]
pub struct ProgressEvent {
    pub message: String,
    pub elapsed: Option<Duration>,
}

pub trait ProgressSink {
    fn event(&self, event: ProgressEvent);
}

/// Per-row tallies from the processing loop.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RowStats {
    pub lines_read: u64,
    pub rows_created: u64,
    pub rows_existing: u64,
    pub rows_rejected: u64,
    pub first_accession: Option<String>,
    pub last_accession: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    pub mode: RunMode,
    pub rows: RowStats,
    pub emitted: EmitCounts,
    pub accession_max_advanced_by: Option<u64>,
    pub bulk_loaded: bool,
}

/// Decides what happens to persisted state once every row is processed.
pub struct RunFinalizer<'a> {
    pub mode: RunMode,
    pub prefix: &'a str,
    pub delimiter: char,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Finalization {
    pub accession_max_advanced_by: Option<u64>,
    pub bulk_loaded: bool,
}

impl RunFinalizer<'_> {
    /// Advances the accession-number maximum by the number of lines read,
    /// not the number created, so skipped rows never get their numbers
    /// reused by a later run. Preview runs and runs that created nothing
    /// leave the store untouched and load nothing.
    pub fn finalize<S: ReferenceStore + ?Sized>(
        &self,
        store: &mut S,
        stats: &RowStats,
        emitter: &mut ArtifactEmitter,
        loader: Option<&dyn BulkLoader>,
        diagnostics: &mut RunLog,
    ) -> Result<Finalization, LoadError> {
        emitter.flush()?;

        if self.mode.is_preview() || stats.rows_created == 0 {
            diagnostics.line(format!(
                "Skipping bulk load (mode={}, rows created={})",
                self.mode, stats.rows_created
            ))?;
            return Ok(Finalization {
                accession_max_advanced_by: None,
                bulk_loaded: false,
            });
        }

        store.advance_accession_max(self.prefix, stats.lines_read)?;
        diagnostics.line(format!(
            "Advanced {} accession maximum by {}",
            self.prefix, stats.lines_read
        ))?;

        let Some(loader) = loader else {
            diagnostics.line("No bulk load program configured")?;
            return Ok(Finalization {
                accession_max_advanced_by: Some(stats.lines_read),
                bulk_loaded: false,
            });
        };
        for (table, path) in emitter.table_paths() {
            let command = loader.load(table, &path, self.delimiter)?;
            diagnostics.line(&command)?;
        }
        Ok(Finalization {
            accession_max_advanced_by: Some(stats.lines_read),
            bulk_loaded: true,
        })
    }
}

pub struct GenotypeLoad<S: ReferenceStore> {
    store: S,
    settings: LoaderSettings,
}

impl<S: ReferenceStore> GenotypeLoad<S> {
    pub fn new(store: S, settings: LoaderSettings) -> Self {
        Self { store, settings }
    }

    pub fn into_store(self) -> S {
        self.store
    }

    /// Runs one load end to end. The diagnostics and error logs get their
    /// end markers on every exit path, fatal errors included; the mode is
    /// checked after the logs are open so a bad mode is logged too.
    pub fn run(
        &mut self,
        paths: &RunPaths,
        mode: &str,
        loader: Option<&dyn BulkLoader>,
        sink: &dyn ProgressSink,
    ) -> Result<RunSummary, LoadError> {
        let layout = OutputLayout::new(paths.output_dir.clone(), &paths.input);
        let mut diagnostics = RunLog::create(&layout.diagnostics_path())?;
        let mut errors = match RunLog::create(&layout.error_path()) {
            Ok(errors) => errors,
            Err(err) => {
                let _ = diagnostics.line(err.to_string());
                let _ = diagnostics.finish();
                return Err(err);
            }
        };

        let result = self.run_logged(
            paths,
            &layout,
            mode,
            loader,
            sink,
            &mut diagnostics,
            &mut errors,
        );
        if let Err(err) = &result {
            tracing::error!(%err, "genotype load aborted");
            let _ = diagnostics.line(format!("Fatal: {err}"));
        }
        let closed = diagnostics.finish().and_then(|()| errors.finish());
        let summary = result?;
        closed?;
        Ok(summary)
    }

    #[allow(clippy::too_many_arguments)]
    fn run_logged(
        &mut self,
        paths: &RunPaths,
        layout: &OutputLayout,
        mode: &str,
        loader: Option<&dyn BulkLoader>,
        sink: &dyn ProgressSink,
        diagnostics: &mut RunLog,
        errors: &mut RunLog,
    ) -> Result<RunSummary, LoadError> {
        let start = Instant::now();
        diagnostics.start()?;
        diagnostics.line(format!("Reference store: {}", self.store.location()))?;
        diagnostics.line(format!("Input file: {}", paths.input))?;
        diagnostics.line(format!("Mode: {mode}"))?;
        let mode: RunMode = mode.parse()?;
        errors.start()?;
        errors.line("")?;

        sink.event(ProgressEvent {
            message: "phase=Open; opening input and artifacts".to_string(),
            elapsed: None,
        });
        let mut input = InputReader::open(&paths.input)?;
        let mut emitter = ArtifactEmitter::create(
            layout,
            &paths.echo,
            self.settings.bulk_delimiter,
            crate::runlog::timestamp(),
        )?;

        sink.event(ProgressEvent {
            message: "phase=Seed; reading key maxima".to_string(),
            elapsed: None,
        });
        let mut keys = KeyAllocator::seed(&self.store, &self.settings.primary.prefix)?;
        diagnostics.line(format!(
            "Next keys: genotype={} allele pair={} accession={} note={} {}={}",
            keys.peek(Counter::Genotype),
            keys.peek(Counter::AllelePair),
            keys.peek(Counter::Accession),
            keys.peek(Counter::Note),
            self.settings.primary.prefix,
            keys.peek(Counter::AccessionNumber),
        ))?;

        sink.event(ProgressEvent {
            message: "phase=Process; resolving rows".to_string(),
            elapsed: None,
        });
        let stats = self.process(&mut input, &mut keys, &mut emitter, errors)?;
        sink.event(ProgressEvent {
            message: format!(
                "phase=Process; lines={} created={} existing={} rejected={}",
                stats.lines_read, stats.rows_created, stats.rows_existing, stats.rows_rejected
            ),
            elapsed: Some(start.elapsed()),
        });

        sink.event(ProgressEvent {
            message: "phase=Finalize; updating store".to_string(),
            elapsed: None,
        });
        let finalizer = RunFinalizer {
            mode,
            prefix: &self.settings.primary.prefix,
            delimiter: self.settings.bulk_delimiter,
        };
        let finalization =
            finalizer.finalize(&mut self.store, &stats, &mut emitter, loader, diagnostics)?;

        Ok(RunSummary {
            mode,
            rows: stats,
            emitted: emitter.counts().clone(),
            accession_max_advanced_by: finalization.accession_max_advanced_by,
            bulk_loaded: finalization.bulk_loaded,
        })
    }

    /// The single sequential pass over the input.
    pub fn process(
        &self,
        input: &mut InputReader,
        keys: &mut KeyAllocator,
        emitter: &mut ArtifactEmitter,
        errors: &mut RunLog,
    ) -> Result<RowStats, LoadError> {
        let minter = AccessionMinter::new(&self.settings);
        let mut grouper = GenotypeGrouper::new();
        let mut current_id: Option<AccessionId> = None;
        let mut current_notes: Option<[String; 2]> = None;
        let mut stats = RowStats::default();

        while let Some((line, row)) = input.next_row()? {
            let outcome = {
                let mut resolver = Resolver::new(
                    &self.store,
                    errors,
                    &self.settings.approved_allele_statuses,
                );
                validate(row, line, &mut resolver, &self.settings)?
            };

            match outcome {
                RowOutcome::Existing(row) => {
                    emitter.echo(&row, &row.genotype_id)?;
                    stats.rows_existing += 1;
                }
                RowOutcome::Rejected { row, failures } => {
                    tracing::warn!(line, failures = failures.len(), "row rejected");
                    emitter.echo(&row, "")?;
                    stats.rows_rejected += 1;
                }
                RowOutcome::Resolved(resolved) => {
                    let placement = grouper.place(&resolved.row.genotype_order, keys);
                    if placement.is_new {
                        emitter.emit(&GenotypeRecord {
                            key: placement.genotype_key,
                            strain: resolved.strain,
                            conditional: resolved.conditional,
                            exists_as: resolved.exists_as,
                            created_by: resolved.created_by,
                        })?;
                        let minted =
                            minter.mint(placement.genotype_key, resolved.created_by, keys);
                        for record in minted.records() {
                            emitter.emit(record)?;
                        }
                        let id = minted.primary.id;
                        if stats.first_accession.is_none() {
                            stats.first_accession = Some(id.to_string());
                        }
                        stats.last_accession = Some(id.to_string());
                        current_id = Some(id);
                        self.emit_notes(&resolved, placement.genotype_key, keys, emitter)?;
                        current_notes = Some([
                            resolved.row.general_note.clone(),
                            resolved.row.private_note.clone(),
                        ]);
                    } else if let Some(notes) = &current_notes {
                        report_ignored_notes(&resolved, notes, errors)?;
                    }

                    emitter.emit(&AllelePairRecord {
                        key: keys.next(Counter::AllelePair),
                        genotype: placement.genotype_key,
                        allele1: resolved.allele1,
                        allele2: resolved.allele2,
                        marker: resolved.marker,
                        cell_line1: resolved.cell_line1,
                        cell_line2: resolved.cell_line2,
                        pair_state: resolved.pair_state,
                        compound: resolved.compound,
                        sequence_num: placement.sequence_num,
                        created_by: resolved.created_by,
                    })?;

                    let id = current_id
                        .as_ref()
                        .map(ToString::to_string)
                        .unwrap_or_default();
                    emitter.echo(&resolved.row, &id)?;
                    stats.rows_created += 1;
                }
            }
        }

        stats.lines_read = input.lines_read();
        Ok(stats)
    }

    fn emit_notes(
        &self,
        resolved: &ResolvedRow,
        genotype_key: Key,
        keys: &mut KeyAllocator,
        emitter: &mut ArtifactEmitter,
    ) -> Result<(), LoadError> {
        let notes = &self.settings.notes;
        for (note_type, text) in [
            (notes.general, &resolved.row.general_note),
            (notes.private, &resolved.row.private_note),
        ] {
            if text.is_empty() {
                continue;
            }
            let note_key = keys.next(Counter::Note);
            emitter.emit(&NoteRecord {
                key: note_key,
                object_key: genotype_key,
                mgi_type: self.settings.types.genotype,
                note_type,
                created_by: resolved.created_by,
            })?;
            for (sequence_num, chunk) in (1u32..).zip(chunk_note(text, notes.chunk_size)) {
                emitter.emit(&NoteChunkRecord {
                    note_key,
                    sequence_num,
                    text: chunk,
                    created_by: resolved.created_by,
                })?;
            }
        }
        Ok(())
    }
}

/// Notes belong to the genotype and are taken from its opening row. A later
/// row of the same genotype carrying a different note is reported, and its
/// note is not loaded.
fn report_ignored_notes(
    resolved: &ResolvedRow,
    opening: &[String; 2],
    errors: &mut RunLog,
) -> Result<(), LoadError> {
    let row = &resolved.row;
    for (label, text, kept) in [
        ("General Note", &row.general_note, &opening[0]),
        ("Private Note", &row.private_note, &opening[1]),
    ] {
        if !text.is_empty() && text != kept {
            errors.line(format!("Ignored {label} (row {}) {text}", resolved.line))?;
        }
    }
    Ok(())
}
