//! Registry state across store backends and reopen cycles.

use chrono::NaiveDate;
use tempfile::TempDir;

use wheelcare_core::clock::SystemClock;
use wheelcare_core::model::{
    BeneficiaryStatus, Condition, Delivery, NewBeneficiary, NewWheelchair, Source, WheelchairStatus,
    WheelchairType,
};
use wheelcare_core::store::{JsonDirStore, KeyValueStore, MemoryStore, SqliteStore, StoreError};
use wheelcare_core::validate::AssignInput;
use wheelcare_core::{Database, Error, ErrorCode};

/// Register one delivered beneficiary and one spare wheelchair.
fn populate(db: &mut Database) -> (String, String, String) {
    let kind = WheelchairType::Electric;
    let assigned = db
        .wheelchairs()
        .create(NewWheelchair::new(kind, Condition::Good, Source::Partner))
        .unwrap();
    let spare = db
        .wheelchairs()
        .create(NewWheelchair::new(kind, Condition::Fair, Source::Government))
        .unwrap();
    let ben = db
        .beneficiaries()
        .create(NewBeneficiary::new("Aisha", "K"))
        .unwrap();
    db.beneficiaries()
        .assign(AssignInput {
            beneficiary_id: ben.id.clone(),
            wheelchair_id: assigned.id.clone(),
            assigned_by: None,
        })
        .unwrap();
    db.beneficiaries()
        .deliver(
            &ben.id,
            Delivery {
                delivery_date: NaiveDate::from_ymd_opt(2024, 3, 1).unwrap(),
                delivery_location: "Community Hall".into(),
                ceremony_date: None,
            },
        )
        .unwrap();
    (ben.id, assigned.id, spare.id)
}

fn assert_reopened(db: &mut Database, ben: &str, assigned: &str, spare: &str) {
    let record = db.beneficiaries().get(ben).unwrap();
    assert_eq!(record.status(), BeneficiaryStatus::Delivered);
    assert_eq!(record.wheelchair_id(), Some(assigned));
    assert_eq!(
        db.wheelchairs().get(assigned).unwrap().status(),
        WheelchairStatus::Assigned
    );
    assert_eq!(
        db.wheelchairs().get(spare).unwrap().status(),
        WheelchairStatus::Available
    );
    assert_eq!(db.wheelchairs().stats().total, 2);
    assert!(db.integrity_problems().is_empty());
}

#[test]
fn json_directory_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let (ben, assigned, spare) = {
        let mut db = Database::open(JsonDirStore::open(dir.path()).unwrap(), SystemClock).unwrap();
        populate(&mut db)
    };
    assert!(dir.path().join("wheelchairs.json").is_file());
    assert!(dir.path().join("beneficiaries.json").is_file());

    let mut db = Database::open(JsonDirStore::open(dir.path()).unwrap(), SystemClock).unwrap();
    assert_reopened(&mut db, &ben, &assigned, &spare);
}

#[test]
fn sqlite_store_survives_reopen() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("registry.sqlite3");
    let (ben, assigned, spare) = {
        let mut db = Database::open(SqliteStore::open(&path).unwrap(), SystemClock).unwrap();
        populate(&mut db)
    };

    let mut db = Database::open(SqliteStore::open(&path).unwrap(), SystemClock).unwrap();
    assert_reopened(&mut db, &ben, &assigned, &spare);
}

#[test]
fn collections_are_json_arrays_under_fixed_keys() {
    let dir = TempDir::new().unwrap();
    {
        let mut db = Database::open(JsonDirStore::open(dir.path()).unwrap(), SystemClock).unwrap();
        populate(&mut db);
    }
    let store = JsonDirStore::open(dir.path()).unwrap();
    let raw = store.get("beneficiaries").unwrap().unwrap();
    let rows: serde_json::Value = serde_json::from_str(&raw).unwrap();
    let first = &rows.as_array().unwrap()[0];
    assert_eq!(first["status"], "DELIVERED");
    assert_eq!(first["delivery"]["delivery_location"], "Community Hall");
    assert!(first["assignment"]["wheelchair_id"].is_string());
}

#[test]
fn corrupt_collection_blocks_open() {
    let dir = TempDir::new().unwrap();
    std::fs::write(dir.path().join("wheelchairs.json"), "[{\"id\": 3}]").unwrap();
    let err = Database::open(JsonDirStore::open(dir.path()).unwrap(), SystemClock).unwrap_err();
    assert!(matches!(err, StoreError::Corrupt { .. }));
    assert_eq!(err.code(), ErrorCode::CorruptStore);
}

/// Accepts single-key writes but fails every multi-key write.
#[derive(Debug, Default)]
struct NoBatchStore {
    inner: MemoryStore,
}

impl KeyValueStore for NoBatchStore {
    fn get(&self, key: &str) -> Result<Option<String>, StoreError> {
        self.inner.get(key)
    }

    fn set(&mut self, key: &str, value: String) -> Result<(), StoreError> {
        self.inner.set(key, value)
    }

    fn set_many(&mut self, _entries: Vec<(&str, String)>) -> Result<(), StoreError> {
        Err(StoreError::Io {
            path: "batch".into(),
            source: std::io::Error::other("batch rejected"),
        })
    }

    fn remove(&mut self, key: &str) -> Result<(), StoreError> {
        self.inner.remove(key)
    }
}

#[test]
fn failed_assignment_write_leaves_both_collections() {
    let mut db = Database::open(NoBatchStore::default(), SystemClock).unwrap();
    let whc = db
        .wheelchairs()
        .create(NewWheelchair::new(
            WheelchairType::Sports,
            Condition::Excellent,
            Source::Donation,
        ))
        .unwrap();
    let ben = db
        .beneficiaries()
        .create(NewBeneficiary::new("Omar", "S"))
        .unwrap();

    let err = db
        .beneficiaries()
        .assign(AssignInput {
            beneficiary_id: ben.id.clone(),
            wheelchair_id: whc.id.clone(),
            assigned_by: None,
        })
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(db.beneficiaries().get(&ben.id).unwrap(), ben);
    assert_eq!(db.wheelchairs().get(&whc.id).unwrap(), whc);

    db.reload().unwrap();
    assert_eq!(db.beneficiaries().get(&ben.id).unwrap(), ben);
    assert_eq!(db.wheelchairs().get(&whc.id).unwrap(), whc);
}

#[test]
fn json_assignment_rolls_back_when_second_file_fails() {
    let dir = TempDir::new().unwrap();
    let mut db = Database::open(JsonDirStore::open(dir.path()).unwrap(), SystemClock).unwrap();
    let whc = db
        .wheelchairs()
        .create(NewWheelchair::new(
            WheelchairType::Manual,
            Condition::Good,
            Source::Donation,
        ))
        .unwrap();
    let ben = db
        .beneficiaries()
        .create(NewBeneficiary::new("Layla", "H"))
        .unwrap();

    let wheelchairs_file = dir.path().join("wheelchairs.json");
    let saved_wheelchairs = std::fs::read_to_string(&wheelchairs_file).unwrap();
    let beneficiaries_file = dir.path().join("beneficiaries.json");
    let saved_beneficiaries = std::fs::read_to_string(&beneficiaries_file).unwrap();
    std::fs::remove_file(&wheelchairs_file).unwrap();
    std::fs::create_dir(&wheelchairs_file).unwrap();

    let err = db
        .beneficiaries()
        .assign(AssignInput {
            beneficiary_id: ben.id.clone(),
            wheelchair_id: whc.id.clone(),
            assigned_by: None,
        })
        .unwrap_err();
    assert!(matches!(err, Error::Store(_)));
    assert_eq!(
        std::fs::read_to_string(&beneficiaries_file).unwrap(),
        saved_beneficiaries
    );
    let leftovers: Vec<_> = std::fs::read_dir(dir.path())
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().into_owned())
        .filter(|name| name.ends_with(".tmp"))
        .collect();
    assert!(leftovers.is_empty(), "temp files left behind: {leftovers:?}");

    std::fs::remove_dir(&wheelchairs_file).unwrap();
    std::fs::write(&wheelchairs_file, saved_wheelchairs).unwrap();
    db.reload().unwrap();
    assert_eq!(
        db.beneficiaries().get(&ben.id).unwrap().status(),
        BeneficiaryStatus::Pending
    );
    assert_eq!(
        db.wheelchairs().get(&whc.id).unwrap().status(),
        WheelchairStatus::Available
    );
    assert!(db.integrity_problems().is_empty());
}
