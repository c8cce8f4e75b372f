//! Bulk-load records. Each table's columns end with the shared audit
//! columns `createdBy|modifiedBy|creation_date|modification_date`, which
//! the emitter appends.

use std::fmt;

use crate::domain::{AccessionId, Key};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Genotype,
    AllelePair,
    Accession,
    Note,
    NoteChunk,
}

impl Table {
    pub const ALL: [Table; 5] = [
        Table::Genotype,
        Table::AllelePair,
        Table::Accession,
        Table::Note,
        Table::NoteChunk,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Table::Genotype => "GXD_Genotype",
            Table::AllelePair => "GXD_AllelePair",
            Table::Accession => "ACC_Accession",
            Table::Note => "MGI_Note",
            Table::NoteChunk => "MGI_NoteChunk",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

pub trait BulkRecord {
    const TABLE: Table;

    /// Columns before the audit columns; `None` becomes an empty field.
    fn columns(&self) -> Vec<Option<String>>;

    fn created_by(&self) -> Key;
}

fn col(value: impl ToString) -> Option<String> {
    Some(value.to_string())
}

fn flag(value: bool) -> Option<String> {
    col(u8::from(value))
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GenotypeRecord {
    pub key: Key,
    pub strain: Key,
    pub conditional: bool,
    pub exists_as: Key,
    pub created_by: Key,
}

impl BulkRecord for GenotypeRecord {
    const TABLE: Table = Table::Genotype;

    fn columns(&self) -> Vec<Option<String>> {
        // the note column exists in the table but is never populated
        vec![
            col(self.key),
            col(self.strain),
            flag(self.conditional),
            None,
            col(self.exists_as),
        ]
    }

    fn created_by(&self) -> Key {
        self.created_by
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AllelePairRecord {
    pub key: Key,
    pub genotype: Key,
    pub allele1: Key,
    pub allele2: Option<Key>,
    pub marker: Key,
    pub cell_line1: Option<Key>,
    pub cell_line2: Option<Key>,
    pub pair_state: Key,
    pub compound: Key,
    pub sequence_num: u32,
    pub created_by: Key,
}

impl BulkRecord for AllelePairRecord {
    const TABLE: Table = Table::AllelePair;

    fn columns(&self) -> Vec<Option<String>> {
        vec![
            col(self.key),
            col(self.genotype),
            col(self.allele1),
            self.allele2.map(|key| key.to_string()),
            col(self.marker),
            self.cell_line1.map(|key| key.to_string()),
            self.cell_line2.map(|key| key.to_string()),
            col(self.pair_state),
            col(self.compound),
            col(self.sequence_num),
        ]
    }

    fn created_by(&self) -> Key {
        self.created_by
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessionRecord {
    pub key: Key,
    pub id: AccessionId,
    pub logical_db: Key,
    pub object_key: Key,
    pub mgi_type: Key,
    pub private: bool,
    pub preferred: bool,
    pub created_by: Key,
}

impl BulkRecord for AccessionRecord {
    const TABLE: Table = Table::Accession;

    fn columns(&self) -> Vec<Option<String>> {
        vec![
            col(self.key),
            col(&self.id),
            col(self.id.prefix()),
            col(self.id.numeric()),
            col(self.logical_db),
            col(self.object_key),
            col(self.mgi_type),
            flag(self.private),
            flag(self.preferred),
        ]
    }

    fn created_by(&self) -> Key {
        self.created_by
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteRecord {
    pub key: Key,
    pub object_key: Key,
    pub mgi_type: Key,
    pub note_type: Key,
    pub created_by: Key,
}

impl BulkRecord for NoteRecord {
    const TABLE: Table = Table::Note;

    fn columns(&self) -> Vec<Option<String>> {
        vec![
            col(self.key),
            col(self.object_key),
            col(self.mgi_type),
            col(self.note_type),
        ]
    }

    fn created_by(&self) -> Key {
        self.created_by
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoteChunkRecord {
    pub note_key: Key,
    pub sequence_num: u32,
    pub text: String,
    pub created_by: Key,
}

impl BulkRecord for NoteChunkRecord {
    const TABLE: Table = Table::NoteChunk;

    fn columns(&self) -> Vec<Option<String>> {
        vec![
            col(self.note_key),
            col(self.sequence_num),
            Some(self.text.clone()),
        ]
    }

    fn created_by(&self) -> Key {
        self.created_by
    }
}

/// Splits note text into chunks of at most `size` characters.
pub fn chunk_note(text: &str, size: usize) -> Vec<String> {
    let chars = text.chars().collect::<Vec<_>>();
    chars
        .chunks(size.max(1))
        .map(|chunk| chunk.iter().collect())
        .collect()
}
