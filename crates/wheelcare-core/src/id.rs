//! Record id generation.
//!
//! Ids look like `whc-1f3a9c0b`: the record prefix and the first eight hex
//! digits of a BLAKE3 hash over the collection, the creation instant and a
//! per-generator counter.

use chrono::{DateTime, Utc};

const HASH_CHARS: usize = 8;

#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    counter: u64,
}

impl IdGenerator {
    #[must_use]
    pub const fn new() -> Self {
        Self { counter: 0 }
    }

    /// Next id for `prefix` that `taken` does not already hold.
    pub fn next(
        &mut self,
        prefix: &str,
        at: DateTime<Utc>,
        taken: impl Fn(&str) -> bool,
    ) -> String {
        loop {
            self.counter += 1;
            let mut hasher = blake3::Hasher::new();
            hasher.update(prefix.as_bytes());
            hasher.update(&at.timestamp_nanos_opt().unwrap_or_default().to_le_bytes());
            hasher.update(&self.counter.to_le_bytes());
            let hex = hasher.finalize().to_hex();
            let id = format!("{prefix}-{}", &hex.as_str()[..HASH_CHARS]);
            if !taken(&id) {
                return id;
            }
            tracing::debug!(%id, "generated id already taken, rehashing");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::IdGenerator;
    use chrono::{TimeZone, Utc};
    use std::collections::HashSet;

    #[test]
    fn ids_carry_prefix_and_fixed_width_hash() {
        let mut ids = IdGenerator::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let id = ids.next("whc", at, |_| false);
        assert!(id.starts_with("whc-"));
        assert_eq!(id.len(), "whc-".len() + 8);
        assert!(id[4..].chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn same_instant_yields_distinct_ids() {
        let mut ids = IdGenerator::new();
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let generated: HashSet<String> = (0..200).map(|_| ids.next("ben", at, |_| false)).collect();
        assert_eq!(generated.len(), 200);
    }

    #[test]
    fn taken_ids_are_skipped() {
        let at = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let first = IdGenerator::new().next("ben", at, |_| false);
        let mut ids = IdGenerator::new();
        let second = ids.next("ben", at, |candidate| candidate == first);
        assert_ne!(first, second);
    }
}
