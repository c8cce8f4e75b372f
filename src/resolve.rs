use crate::domain::Key;
use crate::error::LoadError;
use crate::runlog::RunLog;
use crate::store::ReferenceStore;

/// Resolves human-readable references to keys. A failed lookup writes one
/// line to the error log and yields `None`; callers must not report it again.
pub struct Resolver<'a, S: ReferenceStore + ?Sized> {
    store: &'a S,
    errors: &'a mut RunLog,
    approved_statuses: &'a [Key],
}

impl<'a, S: ReferenceStore + ?Sized> Resolver<'a, S> {
    pub fn new(store: &'a S, errors: &'a mut RunLog, approved_statuses: &'a [Key]) -> Self {
        Self {
            store,
            errors,
            approved_statuses,
        }
    }

    pub fn resolve_entity(
        &mut self,
        acc_id: &str,
        mgi_type: Key,
        label: &str,
        line: u64,
    ) -> Result<Option<Key>, LoadError> {
        match self.store.accession(acc_id, mgi_type) {
            Some(found) => Ok(Some(found.object_key)),
            None => self.fail(label, line, acc_id),
        }
    }

    /// Like [`Resolver::resolve_entity`], but only accepts alleles whose
    /// status is one of the approved statuses.
    pub fn resolve_allele(
        &mut self,
        acc_id: &str,
        mgi_type: Key,
        label: &str,
        line: u64,
    ) -> Result<Option<Key>, LoadError> {
        let found = self.store.accession(acc_id, mgi_type).filter(|found| {
            found
                .status_key
                .is_some_and(|status| self.approved_statuses.contains(&status))
        });
        match found {
            Some(found) => Ok(Some(found.object_key)),
            None => self.fail(label, line, acc_id),
        }
    }

    pub fn resolve_term(
        &mut self,
        vocab: Key,
        term: &str,
        label: &str,
        line: u64,
    ) -> Result<Option<Key>, LoadError> {
        match self.store.term(vocab, term) {
            Some(key) => Ok(Some(key)),
            None => self.fail(label, line, term),
        }
    }

    pub fn resolve_user(&mut self, login: &str, line: u64) -> Result<Option<Key>, LoadError> {
        match self.store.user(login) {
            Some(key) => Ok(Some(key)),
            None => self.fail("User", line, login),
        }
    }

    /// Records a failure that did not come from a store lookup.
    pub fn report(&mut self, label: &str, line: u64, value: &str) -> Result<(), LoadError> {
        tracing::debug!(line, label, value, "rejected value");
        self.errors
            .line(format!("Invalid {label} (row {line}) {value}"))
    }

    fn fail(&mut self, label: &str, line: u64, value: &str) -> Result<Option<Key>, LoadError> {
        self.report(label, line, value)?;
        Ok(None)
    }
}
