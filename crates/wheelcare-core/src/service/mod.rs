//! Domain services over the two registry collections.
//!
//! [`Database`] owns the store and the rehydrated collections. Every mutation
//! builds the next version of the affected collection(s), writes it, and
//! only then replaces the in-memory copy, so a failed write leaves the
//! database exactly as it was.

pub mod beneficiary;
pub mod wheelchair;

use chrono::{DateTime, NaiveDate, Utc};

use crate::clock::{Clock, SystemClock};
use crate::error::Result;
use crate::id::IdGenerator;
use crate::model::{Beneficiary, Wheelchair};
use crate::store::{Collection, KeyValueStore, MemoryStore, Record, StoreError};

pub use beneficiary::Beneficiaries;
pub use wheelchair::Wheelchairs;

pub struct Database {
    store: Box<dyn KeyValueStore>,
    clock: Box<dyn Clock>,
    ids: IdGenerator,
    wheelchairs: Collection<Wheelchair>,
    beneficiaries: Collection<Beneficiary>,
}

impl std::fmt::Debug for Database {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Database")
            .field("clock", &self.clock)
            .field("wheelchairs", &self.wheelchairs.len())
            .field("beneficiaries", &self.beneficiaries.len())
            .finish_non_exhaustive()
    }
}

impl Database {
    /// Rehydrate both collections from `store`.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection cannot be read or holds invalid JSON.
    pub fn open(
        store: impl KeyValueStore + 'static,
        clock: impl Clock + 'static,
    ) -> Result<Self, StoreError> {
        let wheelchairs = Collection::load(&store)?;
        let beneficiaries = Collection::load(&store)?;
        tracing::debug!(
            wheelchairs = wheelchairs.len(),
            beneficiaries = beneficiaries.len(),
            "database opened"
        );
        Ok(Self {
            store: Box::new(store),
            clock: Box::new(clock),
            ids: IdGenerator::new(),
            wheelchairs,
            beneficiaries,
        })
    }

    /// An empty database over a [`MemoryStore`] and the system clock.
    #[must_use]
    pub fn in_memory() -> Self {
        Self {
            store: Box::new(MemoryStore::new()),
            clock: Box::new(SystemClock),
            ids: IdGenerator::new(),
            wheelchairs: Collection::default(),
            beneficiaries: Collection::default(),
        }
    }

    pub const fn wheelchairs(&mut self) -> Wheelchairs<'_> {
        Wheelchairs { db: self }
    }

    pub const fn beneficiaries(&mut self) -> Beneficiaries<'_> {
        Beneficiaries { db: self }
    }

    #[must_use]
    pub fn now(&self) -> DateTime<Utc> {
        self.clock.now()
    }

    #[must_use]
    pub fn today(&self) -> NaiveDate {
        self.clock.today()
    }

    /// Discard the in-memory copies and read both collections again.
    ///
    /// # Errors
    ///
    /// Returns an error if a collection cannot be read or holds invalid JSON.
    /// The previous copies are kept in that case.
    pub fn reload(&mut self) -> Result<(), StoreError> {
        let wheelchairs = Collection::load(self.store.as_ref())?;
        let beneficiaries = Collection::load(self.store.as_ref())?;
        self.wheelchairs = wheelchairs;
        self.beneficiaries = beneficiaries;
        Ok(())
    }

    /// Cross-reference problems between the two collections. Empty when the
    /// registry is consistent.
    #[must_use]
    pub fn integrity_problems(&self) -> Vec<String> {
        let mut problems = Vec::new();
        for ben in self.beneficiaries.all() {
            let Some(whc_id) = ben.wheelchair_id() else {
                continue;
            };
            match self.wheelchairs.get(whc_id) {
                None => problems.push(format!("{} references missing wheelchair {whc_id}", ben.id)),
                Some(whc) if whc.assigned_to() != Some(ben.id.as_str()) => problems.push(format!(
                    "{} references {whc_id}, which is not assigned to it",
                    ben.id
                )),
                Some(_) => {}
            }
        }
        for whc in self.wheelchairs.all() {
            let Some(ben_id) = whc.assigned_to() else {
                continue;
            };
            let holders = self
                .beneficiaries
                .all()
                .iter()
                .filter(|ben| ben.wheelchair_id() == Some(whc.id.as_str()))
                .count();
            if holders != 1 {
                problems.push(format!(
                    "{} is assigned to {ben_id} but referenced by {holders} beneficiaries",
                    whc.id
                ));
            }
        }
        problems
    }

    fn next_wheelchair_id(&mut self) -> String {
        let at = self.clock.now();
        let taken = &self.wheelchairs;
        self.ids.next(Wheelchair::ID_PREFIX, at, |id| taken.contains(id))
    }

    fn next_beneficiary_id(&mut self) -> String {
        let at = self.clock.now();
        let taken = &self.beneficiaries;
        self.ids.next(Beneficiary::ID_PREFIX, at, |id| taken.contains(id))
    }

    fn commit_wheelchairs(&mut self, next: Collection<Wheelchair>) -> Result<()> {
        self.store.set(Wheelchair::COLLECTION, next.encode()?)?;
        self.wheelchairs = next;
        Ok(())
    }

    fn commit_beneficiaries(&mut self, next: Collection<Beneficiary>) -> Result<()> {
        self.store.set(Beneficiary::COLLECTION, next.encode()?)?;
        self.beneficiaries = next;
        Ok(())
    }

    /// Write both collections in one store call.
    fn commit_both(
        &mut self,
        wheelchairs: Collection<Wheelchair>,
        beneficiaries: Collection<Beneficiary>,
    ) -> Result<()> {
        self.store.set_many(vec![
            (Beneficiary::COLLECTION, beneficiaries.encode()?),
            (Wheelchair::COLLECTION, wheelchairs.encode()?),
        ])?;
        self.wheelchairs = wheelchairs;
        self.beneficiaries = beneficiaries;
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::clock::FixedClock;
    use chrono::TimeZone;

    pub(crate) fn fixed_db() -> Database {
        let clock = FixedClock(Utc.with_ymd_and_hms(2024, 6, 1, 10, 0, 0).unwrap());
        Database::open(MemoryStore::new(), clock).unwrap()
    }

    /// A store whose writes can be switched off.
    #[derive(Debug, Default)]
    pub(crate) struct FlakyStore {
        pub(crate) inner: MemoryStore,
        pub(crate) fail_writes: std::rc::Rc<std::cell::Cell<bool>>,
    }

    impl KeyValueStore for FlakyStore {
        fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
            self.inner.get(key)
        }

        fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
            if self.fail_writes.get() {
                return Err(StoreError::Io {
                    path: key.into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set(key, value)
        }

        fn set_many(&mut self, entries: Vec<(&str, String)>) -> Result<(), StoreError> {
            if self.fail_writes.get() {
                return Err(StoreError::Io {
                    path: "set_many".into(),
                    source: std::io::Error::other("disk full"),
                });
            }
            self.inner.set_many(entries)
        }

        fn remove(&mut self, key: &str) -> Result<(), StoreError> {
            self.inner.remove(key)
        }
    }

    #[test]
    fn open_reads_existing_collections() {
        let mut store = MemoryStore::new();
        store.set("wheelchairs", "[]".into()).unwrap();
        let db = Database::open(store, SystemClock).unwrap();
        assert_eq!(db.wheelchairs.len(), 0);
        assert!(db.integrity_problems().is_empty());
    }

    #[test]
    fn open_rejects_corrupt_collection() {
        let mut store = MemoryStore::new();
        store.set("beneficiaries", "{\"nope\":1}".into()).unwrap();
        let err = Database::open(store, SystemClock).unwrap_err();
        assert!(matches!(err, StoreError::Corrupt { ref key, .. } if key == "beneficiaries"));
    }

    #[test]
    fn generated_ids_use_record_prefix() {
        let mut db = fixed_db();
        assert!(db.next_wheelchair_id().starts_with("whc-"));
        assert!(db.next_beneficiary_id().starts_with("ben-"));
    }
}
