use std::fmt;

use serde::Serialize;

use crate::domain::Key;
use crate::error::LoadError;
use crate::store::{ReferenceStore, StoreMaxima};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Counter {
    Genotype,
    AllelePair,
    Accession,
    Note,
    AccessionNumber,
}

impl fmt::Display for Counter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Counter::Genotype => write!(f, "genotype"),
            Counter::AllelePair => write!(f, "allele pair"),
            Counter::Accession => write!(f, "accession"),
            Counter::Note => write!(f, "note"),
            Counter::AccessionNumber => write!(f, "accession number"),
        }
    }
}

/// In-process key sequences. Each slot holds the next value to hand out,
/// one past the persisted maximum it was seeded from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyAllocator {
    next: [Key; 5],
}

impl KeyAllocator {
    pub fn seed<S: ReferenceStore + ?Sized>(store: &S, prefix: &str) -> Result<Self, LoadError> {
        Ok(Self::from_maxima(store.maxima(prefix)?))
    }

    pub fn from_maxima(maxima: StoreMaxima) -> Self {
        Self {
            next: [
                maxima.genotype + 1,
                maxima.allele_pair + 1,
                maxima.accession + 1,
                maxima.note + 1,
                maxima.accession_number + 1,
            ],
        }
    }

    pub fn next(&mut self, counter: Counter) -> Key {
        let slot = &mut self.next[Self::slot(counter)];
        let value = *slot;
        *slot += 1;
        value
    }

    /// The value the next call to [`KeyAllocator::next`] will return.
    pub fn peek(&self, counter: Counter) -> Key {
        self.next[Self::slot(counter)]
    }

    fn slot(counter: Counter) -> usize {
        match counter {
            Counter::Genotype => 0,
            Counter::AllelePair => 1,
            Counter::Accession => 2,
            Counter::Note => 3,
            Counter::AccessionNumber => 4,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn maxima() -> StoreMaxima {
        StoreMaxima {
            genotype: 100,
            allele_pair: 200,
            accession: 300,
            note: 400,
            accession_number: 5000,
        }
    }

    #[test]
    fn counters_start_past_maximum() {
        let mut keys = KeyAllocator::from_maxima(maxima());
        assert_eq!(keys.next(Counter::Genotype), 101);
        assert_eq!(keys.next(Counter::Genotype), 102);
        assert_eq!(keys.next(Counter::AccessionNumber), 5001);
        assert_eq!(keys.peek(Counter::Genotype), 103);
    }

    #[test]
    fn counters_are_independent() {
        let mut keys = KeyAllocator::from_maxima(maxima());
        keys.next(Counter::Accession);
        keys.next(Counter::Accession);
        assert_eq!(keys.peek(Counter::Note), 401);
        assert_eq!(keys.peek(Counter::AllelePair), 201);
        assert_eq!(keys.peek(Counter::Accession), 303);
    }
}
