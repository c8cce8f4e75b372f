use std::fs;

use camino::Utf8Path;
use serde::{Deserialize, Serialize};

use crate::domain::Key;
use crate::error::LoadError;

/// On-disk loader settings. Every field is optional.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub accession: Option<AccessionConfig>,
    #[serde(default)]
    pub types: Option<TypeConfig>,
    #[serde(default)]
    pub vocabularies: Option<VocabularyConfig>,
    #[serde(default)]
    pub approved_allele_statuses: Option<Vec<Key>>,
    #[serde(default)]
    pub notes: Option<NoteConfig>,
    #[serde(default)]
    pub bulk_delimiter: Option<char>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct AccessionConfig {
    pub primary_prefix: Option<String>,
    pub primary_logical_db: Option<Key>,
    pub xref_prefix: Option<String>,
    pub xref_logical_db: Option<Key>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct TypeConfig {
    pub genotype: Option<Key>,
    pub strain: Option<Key>,
    pub allele: Option<Key>,
    pub marker: Option<Key>,
    pub cell_line: Option<Key>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct VocabularyConfig {
    pub exists_as: Option<Key>,
    pub pair_state: Option<Key>,
    pub compound: Option<Key>,
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct NoteConfig {
    pub general_type: Option<Key>,
    pub private_type: Option<Key>,
    pub chunk_size: Option<usize>,
}

/// Prefix and logical database of one minted accession.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessionSpec {
    pub prefix: String,
    pub logical_db: Key,
}

/// MGI type keys the loader resolves against.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ObjectTypes {
    pub genotype: Key,
    pub strain: Key,
    pub allele: Key,
    pub marker: Key,
    pub cell_line: Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Vocabularies {
    pub exists_as: Key,
    pub pair_state: Key,
    pub compound: Key,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct NoteTypes {
    pub general: Key,
    pub private: Key,
    pub chunk_size: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoaderSettings {
    pub primary: AccessionSpec,
    pub xref: AccessionSpec,
    pub types: ObjectTypes,
    pub vocabularies: Vocabularies,
    pub approved_allele_statuses: Vec<Key>,
    pub notes: NoteTypes,
    pub bulk_delimiter: char,
}

impl Default for LoaderSettings {
    fn default() -> Self {
        Self {
            primary: AccessionSpec {
                prefix: "MGI:".to_string(),
                logical_db: 1,
            },
            xref: AccessionSpec {
                prefix: "RRID:MGI:".to_string(),
                logical_db: 179,
            },
            types: ObjectTypes {
                genotype: 12,
                strain: 10,
                allele: 11,
                marker: 2,
                cell_line: 28,
            },
            vocabularies: Vocabularies {
                exists_as: 60,
                pair_state: 39,
                compound: 42,
            },
            // Approved, Autoload
            approved_allele_statuses: vec![847114, 3983021],
            notes: NoteTypes {
                general: 1027,
                private: 1028,
                chunk_size: 255,
            },
            bulk_delimiter: '|',
        }
    }
}

pub struct ConfigLoader;

impl ConfigLoader {
    pub fn resolve(path: Option<&Utf8Path>) -> Result<LoaderSettings, LoadError> {
        let Some(path) = path else {
            return Ok(LoaderSettings::default());
        };
        if !path.as_std_path().exists() {
            return Err(LoadError::MissingConfig(path.to_path_buf()));
        }

        let content = fs::read_to_string(path.as_std_path())
            .map_err(|_| LoadError::ConfigRead(path.to_path_buf()))?;
        let config: Config = serde_json::from_str(&content)
            .map_err(|err| LoadError::ConfigParse(err.to_string()))?;

        Self::resolve_config(config)
    }

    pub fn resolve_config(config: Config) -> Result<LoaderSettings, LoadError> {
        let defaults = LoaderSettings::default();

        let accession = config.accession.unwrap_or_default();
        let primary = AccessionSpec {
            prefix: accession.primary_prefix.unwrap_or(defaults.primary.prefix),
            logical_db: accession
                .primary_logical_db
                .unwrap_or(defaults.primary.logical_db),
        };
        let xref = AccessionSpec {
            prefix: accession.xref_prefix.unwrap_or(defaults.xref.prefix),
            logical_db: accession.xref_logical_db.unwrap_or(defaults.xref.logical_db),
        };
        if primary.prefix.is_empty() || xref.prefix.is_empty() {
            return Err(LoadError::ConfigParse(
                "accession prefixes must not be empty".to_string(),
            ));
        }
        if primary.prefix == xref.prefix {
            return Err(LoadError::ConfigParse(format!(
                "primary and cross-reference prefixes must differ (both {})",
                primary.prefix
            )));
        }

        let types = config.types.unwrap_or_default();
        let types = ObjectTypes {
            genotype: types.genotype.unwrap_or(defaults.types.genotype),
            strain: types.strain.unwrap_or(defaults.types.strain),
            allele: types.allele.unwrap_or(defaults.types.allele),
            marker: types.marker.unwrap_or(defaults.types.marker),
            cell_line: types.cell_line.unwrap_or(defaults.types.cell_line),
        };

        let vocabularies = config.vocabularies.unwrap_or_default();
        let vocabularies = Vocabularies {
            exists_as: vocabularies
                .exists_as
                .unwrap_or(defaults.vocabularies.exists_as),
            pair_state: vocabularies
                .pair_state
                .unwrap_or(defaults.vocabularies.pair_state),
            compound: vocabularies
                .compound
                .unwrap_or(defaults.vocabularies.compound),
        };

        let notes = config.notes.unwrap_or_default();
        let notes = NoteTypes {
            general: notes.general_type.unwrap_or(defaults.notes.general),
            private: notes.private_type.unwrap_or(defaults.notes.private),
            chunk_size: notes.chunk_size.unwrap_or(defaults.notes.chunk_size),
        };
        if notes.chunk_size == 0 {
            return Err(LoadError::ConfigParse(
                "note chunk size must be positive".to_string(),
            ));
        }

        let bulk_delimiter = config.bulk_delimiter.unwrap_or(defaults.bulk_delimiter);
        if !bulk_delimiter.is_ascii() || bulk_delimiter == '\n' {
            return Err(LoadError::ConfigParse(format!(
                "unsupported bulk delimiter {bulk_delimiter:?}"
            )));
        }

        Ok(LoaderSettings {
            primary,
            xref,
            types,
            vocabularies,
            approved_allele_statuses: config
                .approved_allele_statuses
                .unwrap_or(defaults.approved_allele_statuses),
            notes,
            bulk_delimiter,
        })
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    #[test]
    fn empty_config_uses_defaults() {
        let resolved = ConfigLoader::resolve_config(Config::default()).unwrap();
        assert_eq!(resolved, LoaderSettings::default());
        assert_eq!(resolved.primary.prefix, "MGI:");
        assert_eq!(resolved.xref.logical_db, 179);
    }

    #[test]
    fn partial_override() {
        let config: Config =
            serde_json::from_str(r#"{"accession": {"xref_logical_db": 200}}"#).unwrap();
        let resolved = ConfigLoader::resolve_config(config).unwrap();
        assert_eq!(resolved.xref.logical_db, 200);
        assert_eq!(resolved.xref.prefix, "RRID:MGI:");
    }

    #[test]
    fn identical_prefixes_rejected() {
        let config: Config =
            serde_json::from_str(r#"{"accession": {"xref_prefix": "MGI:"}}"#).unwrap();
        let err = ConfigLoader::resolve_config(config).unwrap_err();
        assert_matches!(err, LoadError::ConfigParse(_));
    }
}
