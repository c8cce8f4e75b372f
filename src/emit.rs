use std::collections::HashMap;
use std::fs::File;

use camino::{Utf8Path, Utf8PathBuf};
use csv::{QuoteStyle, Terminator, Writer, WriterBuilder};
use serde::Serialize;

use crate::domain::InputRow;
use crate::error::LoadError;
use crate::records::{BulkRecord, Table};
use crate::runlog::OutputLayout;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct EmitCounts {
    pub genotypes: u64,
    pub allele_pairs: u64,
    pub accessions: u64,
    pub notes: u64,
    pub note_chunks: u64,
    pub echoed: u64,
}

/// Append-only writers for the bulk-load tables and the echo file.
pub struct ArtifactEmitter {
    tables: HashMap<Table, (Utf8PathBuf, Writer<File>)>,
    echo: Writer<File>,
    echo_path: Utf8PathBuf,
    stamp: String,
    counts: EmitCounts,
}

impl ArtifactEmitter {
    /// Creates every artifact up front; any file that cannot be opened
    /// aborts the run before a row is read.
    pub fn create(
        layout: &OutputLayout,
        echo_path: &Utf8Path,
        delimiter: char,
        stamp: impl Into<String>,
    ) -> Result<Self, LoadError> {
        let mut tables = HashMap::new();
        for table in Table::ALL {
            let path = layout.table_path(table.name());
            let writer = open_writer(&path, delimiter)?;
            tables.insert(table, (path, writer));
        }
        let echo = open_writer(echo_path, '\t')?;

        Ok(Self {
            tables,
            echo,
            echo_path: echo_path.to_path_buf(),
            stamp: stamp.into(),
            counts: EmitCounts::default(),
        })
    }

    pub fn emit<R: BulkRecord>(&mut self, record: &R) -> Result<(), LoadError> {
        let created_by = record.created_by().to_string();
        let mut fields = record
            .columns()
            .into_iter()
            .map(Option::unwrap_or_default)
            .collect::<Vec<_>>();
        fields.extend([
            created_by.clone(),
            created_by,
            self.stamp.clone(),
            self.stamp.clone(),
        ]);

        let (_, writer) = self
            .tables
            .get_mut(&R::TABLE)
            .ok_or_else(|| LoadError::write(R::TABLE.name(), "writer not open"))?;
        writer
            .write_record(&fields)
            .map_err(|err| LoadError::write(R::TABLE.name(), err))?;

        let counter = match R::TABLE {
            Table::Genotype => &mut self.counts.genotypes,
            Table::AllelePair => &mut self.counts.allele_pairs,
            Table::Accession => &mut self.counts.accessions,
            Table::Note => &mut self.counts.notes,
            Table::NoteChunk => &mut self.counts.note_chunks,
        };
        *counter += 1;
        Ok(())
    }

    /// Echoes an input row with the genotype accession ID appended; the ID
    /// column is empty for rejected rows.
    pub fn echo(&mut self, row: &InputRow, genotype_id: &str) -> Result<(), LoadError> {
        let mut fields = row.fields().to_vec();
        fields.push(genotype_id);
        self.echo
            .write_record(&fields)
            .map_err(|err| LoadError::write(self.echo_path.as_str(), err))?;
        self.counts.echoed += 1;
        Ok(())
    }

    pub fn counts(&self) -> &EmitCounts {
        &self.counts
    }

    pub fn table_paths(&self) -> Vec<(Table, Utf8PathBuf)> {
        Table::ALL
            .iter()
            .filter_map(|table| {
                self.tables
                    .get(table)
                    .map(|(path, _)| (*table, path.clone()))
            })
            .collect()
    }

    /// Flushes every artifact so the files are complete for bulk loading.
    pub fn flush(&mut self) -> Result<(), LoadError> {
        for (table, (_, writer)) in &mut self.tables {
            writer
                .flush()
                .map_err(|err| LoadError::write(table.name(), err))?;
        }
        self.echo
            .flush()
            .map_err(|err| LoadError::write(self.echo_path.as_str(), err))
    }
}

fn open_writer(path: &Utf8Path, delimiter: char) -> Result<Writer<File>, LoadError> {
    let file = File::create(path.as_std_path()).map_err(|err| LoadError::open(path, err))?;
    Ok(WriterBuilder::new()
        .delimiter(delimiter as u8)
        .quote_style(QuoteStyle::Never)
        .terminator(Terminator::Any(b'\n'))
        .flexible(false)
        .from_writer(file))
}
