use tracing::{debug, trace};

use crate::domain::DirError;
use crate::record::{PersonRecord, RecordId, RecordPatch};

/// The session's authoritative, ordered collection of people.
///
/// Insertion order is the unsorted display order. Every mutation bumps
/// `revision`, which the table view compares against to know when to re-derive.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<PersonRecord>,
    next_id: u64,
    revision: u64,
}

impl RecordStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_records(records: impl IntoIterator<Item = PersonRecord>) -> Self {
        let mut store = Self::new();
        for record in records {
            store.add(record);
        }
        store
    }

    pub fn records(&self) -> &[PersonRecord] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn revision(&self) -> u64 {
        self.revision
    }

    pub fn get(&self, index: usize) -> Option<&PersonRecord> {
        self.records.get(index)
    }

    pub fn find(&self, id: RecordId) -> Option<&PersonRecord> {
        self.records.iter().find(|r| r.id == id)
    }

    /// Appends the record under a freshly assigned id. No duplicate checks.
    pub fn add(&mut self, mut record: PersonRecord) -> RecordId {
        self.next_id += 1;
        record.id = RecordId(self.next_id);
        trace!("Adding {} \"{}\"", record.id, record.name);
        self.records.push(record);
        self.revision += 1;
        RecordId(self.next_id)
    }

    /// Merges `patch` into every record whose e-mail equals `email`.
    /// Returns how many records were touched; zero leaves the store untouched.
    pub fn update_by_email(&mut self, email: &str, patch: &RecordPatch) -> usize {
        let mut touched = 0;
        for record in self.records.iter_mut().filter(|r| r.email == email) {
            patch.apply(record);
            touched += 1;
        }
        if touched > 0 {
            self.revision += 1;
        }
        debug!("update_by_email({email}) touched {touched} records");
        touched
    }

    pub fn update(&mut self, id: RecordId, patch: &RecordPatch) -> bool {
        match self.records.iter_mut().find(|r| r.id == id) {
            Some(record) => {
                patch.apply(record);
                self.revision += 1;
                debug!("Updated {id}");
                true
            }
            None => {
                debug!("Update of unknown {id} ignored");
                false
            }
        }
    }

    /// Removes the record at store position `index`.
    pub fn remove(&mut self, index: usize) -> Result<PersonRecord, DirError> {
        if index >= self.records.len() {
            return Err(DirError::OutOfRange {
                index,
                len: self.records.len(),
            });
        }
        let removed = self.records.remove(index);
        self.revision += 1;
        debug!("Removed {} at {index}", removed.id);
        Ok(removed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::{Role, Team, sample};

    fn three() -> RecordStore {
        RecordStore::from_records([
            sample("Ann Lee", "ann@x.com", Role::ProductManager, &[Team::Product]),
            sample("Bo Chen", "a@x.com", Role::ProductDesigner, &[Team::Design]),
            sample("Cy Diaz", "cy@x.com", Role::QaEngineer, &[Team::Technology]),
        ])
    }

    #[test]
    fn add_assigns_increasing_ids_and_keeps_order() {
        let store = three();
        let ids: Vec<u64> = store.records().iter().map(|r| r.id.0).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        assert_eq!(store.revision(), 3);
    }

    #[test]
    fn update_by_email_changes_only_the_match() {
        let mut store = three();
        let before = store.records().to_vec();
        let patch = RecordPatch {
            email: Some("a@x.com".into()),
            role: Some(Role::BackendDeveloper),
            ..Default::default()
        };
        assert_eq!(store.update_by_email("a@x.com", &patch), 1);
        assert_eq!(store.records()[1].role, Role::BackendDeveloper);
        assert_eq!(store.records()[0], before[0]);
        assert_eq!(store.records()[2], before[2]);
    }

    #[test]
    fn update_by_email_without_match_is_a_no_op() {
        let mut store = three();
        let before = store.records().to_vec();
        let revision = store.revision();
        let patch = RecordPatch {
            role: Some(Role::UxCopywriter),
            ..Default::default()
        };
        assert_eq!(store.update_by_email("nobody@x.com", &patch), 0);
        assert_eq!(store.records(), before.as_slice());
        assert_eq!(store.revision(), revision);
    }

    #[test]
    fn update_by_email_hits_every_duplicate() {
        let mut store = three();
        store.add(sample("Dup", "a@x.com", Role::UxDesigner, &[Team::Design]));
        let patch = RecordPatch {
            name: Some("Same".into()),
            ..Default::default()
        };
        assert_eq!(store.update_by_email("a@x.com", &patch), 2);
    }

    #[test]
    fn update_by_id_survives_email_change() {
        let mut store = three();
        let id = store.records()[1].id;
        let patch = RecordPatch {
            email: Some("new@x.com".into()),
            ..Default::default()
        };
        assert!(store.update(id, &patch));
        assert_eq!(store.find(id).unwrap().email, "new@x.com");
        assert!(!store.update(RecordId(99), &patch));
    }

    #[test]
    fn remove_middle_keeps_neighbours_in_order() {
        let mut store = three();
        let before = store.records().to_vec();
        let removed = store.remove(1).unwrap();
        assert_eq!(removed, before[1]);
        assert_eq!(store.records(), &[before[0].clone(), before[2].clone()]);
    }

    #[test]
    fn remove_out_of_range_fails_and_keeps_store() {
        let mut store = three();
        let revision = store.revision();
        match store.remove(3) {
            Err(DirError::OutOfRange { index: 3, len: 3 }) => {}
            other => panic!("unexpected {other:?}"),
        }
        assert_eq!(store.len(), 3);
        assert_eq!(store.revision(), revision);
    }
}
