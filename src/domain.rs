use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::LoadError;

/// Internal database key.
pub type Key = u64;

pub const INPUT_FIELD_COUNT: usize = 16;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RunMode {
    Load,
    Preview,
}

impl RunMode {
    pub fn is_preview(self) -> bool {
        matches!(self, RunMode::Preview)
    }
}

impl fmt::Display for RunMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunMode::Load => write!(f, "load"),
            RunMode::Preview => write!(f, "preview"),
        }
    }
}

impl FromStr for RunMode {
    type Err = LoadError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "load" => Ok(RunMode::Load),
            "preview" => Ok(RunMode::Preview),
            _ => Err(LoadError::InvalidMode(value.to_string())),
        }
    }
}

/// One line of the genotype input file, fields kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InputRow {
    pub genotype_order: String,
    pub genotype_id: String,
    pub strain_id: String,
    pub strain_name: String,
    pub marker_id: String,
    pub allele1_id: String,
    pub cell_line1_id: String,
    pub allele2_id: String,
    pub cell_line2_id: String,
    pub conditional: String,
    pub exists_as: String,
    pub general_note: String,
    pub private_note: String,
    pub pair_state: String,
    pub compound: String,
    pub created_by: String,
}

impl InputRow {
    /// Builds a row from its fields. Returns `None` when fewer than
    /// [`INPUT_FIELD_COUNT`] fields are present; trailing extras are ignored.
    pub fn from_fields<'a, I>(fields: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a str>,
    {
        let fields = fields.into_iter().take(INPUT_FIELD_COUNT).collect::<Vec<_>>();
        if fields.len() < INPUT_FIELD_COUNT {
            return None;
        }
        let get = |idx: usize| fields[idx].to_string();
        Some(Self {
            genotype_order: get(0),
            genotype_id: get(1),
            strain_id: get(2),
            strain_name: get(3),
            marker_id: get(4),
            allele1_id: get(5),
            cell_line1_id: get(6),
            allele2_id: get(7),
            cell_line2_id: get(8),
            conditional: get(9),
            exists_as: get(10),
            general_note: get(11),
            private_note: get(12),
            pair_state: get(13),
            compound: get(14),
            created_by: get(15),
        })
    }

    pub fn fields(&self) -> [&str; INPUT_FIELD_COUNT] {
        [
            &self.genotype_order,
            &self.genotype_id,
            &self.strain_id,
            &self.strain_name,
            &self.marker_id,
            &self.allele1_id,
            &self.cell_line1_id,
            &self.allele2_id,
            &self.cell_line2_id,
            &self.conditional,
            &self.exists_as,
            &self.general_note,
            &self.private_note,
            &self.pair_state,
            &self.compound,
            &self.created_by,
        ]
    }

    /// A non-empty genotype ID marks a genotype that already exists.
    pub fn is_existing_genotype(&self) -> bool {
        !self.genotype_id.is_empty()
    }

    /// Only the exact token `yes` marks a conditional genotype.
    pub fn is_conditional(&self) -> bool {
        self.conditional == "yes"
    }
}

/// An accession ID split into prefix and numeric part, e.g. `MGI:6283190`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AccessionId {
    prefix: String,
    numeric: Key,
}

impl AccessionId {
    pub fn new(prefix: impl Into<String>, numeric: Key) -> Self {
        Self {
            prefix: prefix.into(),
            numeric,
        }
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }

    pub fn numeric(&self) -> Key {
        self.numeric
    }
}

impl fmt::Display for AccessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}{}", self.prefix, self.numeric)
    }
}
