use crate::domain::Key;
use crate::keys::{Counter, KeyAllocator};

/// Where an accepted row lands: a new genotype, or the next allele pair of
/// the genotype opened by the previous accepted row.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub genotype_key: Key,
    pub sequence_num: u32,
    pub is_new: bool,
}

/// Groups consecutive accepted rows that share a genotype-order token.
///
/// Tokens are compared verbatim. Rows of one genotype must be adjacent and
/// carry identical tokens, otherwise each run of rows becomes its own
/// genotype. Rejected and pre-existing rows never reach the grouper.
#[derive(Debug, Default)]
pub struct GenotypeGrouper {
    previous_order: Option<String>,
    current: Option<(Key, u32)>,
}

impl GenotypeGrouper {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn place(&mut self, order: &str, keys: &mut KeyAllocator) -> Placement {
        let continues = self.previous_order.as_deref() == Some(order);
        let placement = match self.current {
            Some((genotype_key, sequence_num)) if continues => Placement {
                genotype_key,
                sequence_num: sequence_num + 1,
                is_new: false,
            },
            _ => Placement {
                genotype_key: keys.next(Counter::Genotype),
                sequence_num: 1,
                is_new: true,
            },
        };
        self.current = Some((placement.genotype_key, placement.sequence_num));
        self.previous_order = Some(order.to_string());
        placement
    }
}
