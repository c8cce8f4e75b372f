use crate::config::{AccessionSpec, LoaderSettings};
use crate::domain::{AccessionId, Key};
use crate::keys::{Counter, KeyAllocator};
use crate::records::AccessionRecord;

/// The two accessions minted for a new genotype. Both share one numeric
/// part drawn from the accession-number sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MintedAccessions {
    pub primary: AccessionRecord,
    pub xref: AccessionRecord,
}

impl MintedAccessions {
    pub fn records(&self) -> [&AccessionRecord; 2] {
        [&self.primary, &self.xref]
    }
}

pub struct AccessionMinter {
    primary: AccessionSpec,
    xref: AccessionSpec,
    genotype_type: Key,
}

impl AccessionMinter {
    pub fn new(settings: &LoaderSettings) -> Self {
        Self {
            primary: settings.primary.clone(),
            xref: settings.xref.clone(),
            genotype_type: settings.types.genotype,
        }
    }

    /// Call once per new genotype, never per allele pair.
    pub fn mint(
        &self,
        genotype_key: Key,
        created_by: Key,
        keys: &mut KeyAllocator,
    ) -> MintedAccessions {
        let numeric = keys.next(Counter::AccessionNumber);
        let mut record = |spec: &AccessionSpec| AccessionRecord {
            key: keys.next(Counter::Accession),
            id: AccessionId::new(spec.prefix.clone(), numeric),
            logical_db: spec.logical_db,
            object_key: genotype_key,
            mgi_type: self.genotype_type,
            private: false,
            preferred: true,
            created_by,
        };
        let primary = record(&self.primary);
        let xref = record(&self.xref);
        MintedAccessions { primary, xref }
    }
}
