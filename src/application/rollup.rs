use chrono::{DateTime, TimeDelta, Utc};
use tracing::{debug, warn};

use crate::domain::{start_of_day, truncate_to_hour, HostSnapshot};
use crate::error::StoreResult;

use super::snapshot_store::{validate_range, SnapshotStore};

/// Merges hourly snapshots into one record per UTC calendar day
#[derive(Clone)]
pub struct DailyRollup {
    store: SnapshotStore,
}

impl DailyRollup {
    pub fn new(store: SnapshotStore) -> Self {
        Self { store }
    }

    /// One bucket per UTC day covered by the hours in `[start, end)`, oldest
    /// first, stamped with the day's midnight.
    ///
    /// Nothing is walked when `start == end`. Otherwise hours are walked from
    /// the hour containing `start`; an hour at 00:00 opens its own day. The
    /// day containing `start` is always present, and days without data come
    /// back with every field at zero. Within a day
    /// `active_contracts` is the last stored hour's value, all other fields
    /// are summed.
    pub fn daily(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StoreResult<Vec<HostSnapshot>> {
        validate_range(start, end)?;

        let first_hour = truncate_to_hour(start);
        let first_day = start_of_day(first_hour);
        let mut buckets = vec![HostSnapshot::new(first_day)];

        if end <= start {
            return Ok(buckets);
        }

        let last_hour = truncate_to_hour(end - TimeDelta::nanoseconds(1));
        let last_day = start_of_day(last_hour);

        let mut day = first_day;
        while day < last_day {
            day += TimeDelta::days(1);
            buckets.push(HostSnapshot::new(day));
        }

        let txn = self.store.begin_read()?;
        let hours = self.store.scan(txn.as_ref(), first_hour, last_hour)?;

        for snapshot in &hours {
            let index = (start_of_day(snapshot.timestamp) - first_day).num_days();
            match usize::try_from(index).ok().and_then(|i| buckets.get_mut(i)) {
                Some(bucket) => bucket.merge_hour(snapshot),
                None => warn!(
                    "Skipping snapshot stamped {} outside rollup window {}..{}",
                    snapshot.timestamp, first_hour, end
                ),
            }
        }

        debug!(
            "Rolled {} hourly snapshots into {} days starting {}",
            hours.len(),
            buckets.len(),
            first_day.date_naive()
        );
        Ok(buckets)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use crate::adapters::MemoryEngine;
    use crate::application::test_support::{hour, CountingEngine};
    use crate::codec::time_key;
    use crate::config::Namespaces;
    use crate::domain::Currency;
    use crate::error::StoreError;
    use crate::ports::KvEngine;

    fn rollup() -> (SnapshotStore, DailyRollup) {
        let store = SnapshotStore::new(Arc::new(MemoryEngine::new()), &Namespaces::default());
        (store.clone(), DailyRollup::new(store))
    }

    #[test]
    fn test_full_day_of_payouts() {
        let (store, rollup) = rollup();
        for h in 0..24 {
            store
                .save(HostSnapshot::new(hour(2020, 1, 1, h)).with_revenue(
                    Currency::from(1u64),
                    Currency::zero(),
                    Currency::zero(),
                    Currency::zero(),
                ))
                .unwrap();
        }

        let days = rollup.daily(hour(2020, 1, 1, 0), hour(2020, 1, 2, 0)).unwrap();

        assert_eq!(days.len(), 1);
        assert_eq!(days[0].timestamp, hour(2020, 1, 1, 0));
        assert_eq!(days[0].payout, Currency::from(24u64));
    }

    #[test]
    fn test_additive_counters_sum() {
        let (store, rollup) = rollup();
        for h in 0..24 {
            store
                .save(HostSnapshot::new(hour(2020, 1, 1, h)).with_contracts(1, 0, 2, 0))
                .unwrap();
        }

        let days = rollup.daily(hour(2020, 1, 1, 0), hour(2020, 1, 2, 0)).unwrap();
        assert_eq!(days[0].new_contracts, 24);
        assert_eq!(days[0].successful_contracts, 48);
        assert_eq!(days[0].failed_contracts, 0);
    }

    #[test]
    fn test_gauge_keeps_last_hour() {
        let (store, rollup) = rollup();
        for h in 0..24 {
            let active = if h == 23 { 9 } else { 5 };
            store
                .save(HostSnapshot::new(hour(2020, 1, 1, h)).with_active_contracts(active))
                .unwrap();
        }

        let days = rollup.daily(hour(2020, 1, 1, 0), hour(2020, 1, 2, 0)).unwrap();
        assert_eq!(days[0].active_contracts, 9);
    }

    #[test]
    fn test_gaps_yield_empty_days() {
        let (_, rollup) = rollup();

        let days = rollup.daily(hour(2020, 1, 1, 0), hour(2020, 1, 4, 0)).unwrap();

        let stamps: Vec<_> = days.iter().map(|d| d.timestamp).collect();
        assert_eq!(
            stamps,
            vec![hour(2020, 1, 1, 0), hour(2020, 1, 2, 0), hour(2020, 1, 3, 0)]
        );
        assert!(days.iter().all(|d| *d == HostSnapshot::new(d.timestamp)));
    }

    #[test]
    fn test_midnight_hour_opens_new_day() {
        let (store, rollup) = rollup();
        store
            .save(HostSnapshot::new(hour(2020, 1, 1, 23)).with_contracts(1, 0, 0, 0))
            .unwrap();
        store
            .save(HostSnapshot::new(hour(2020, 1, 2, 0)).with_contracts(10, 0, 0, 0))
            .unwrap();

        let days = rollup.daily(hour(2020, 1, 1, 12), hour(2020, 1, 2, 6)).unwrap();

        assert_eq!(days.len(), 2);
        assert_eq!(days[0].timestamp, hour(2020, 1, 1, 0));
        assert_eq!(days[0].new_contracts, 1);
        assert_eq!(days[1].timestamp, hour(2020, 1, 2, 0));
        assert_eq!(days[1].new_contracts, 10);
    }

    #[test]
    fn test_end_is_exclusive() {
        let (store, rollup) = rollup();
        store
            .save(HostSnapshot::new(hour(2020, 1, 1, 5)).with_contracts(3, 0, 0, 0))
            .unwrap();
        store
            .save(HostSnapshot::new(hour(2020, 1, 1, 6)).with_contracts(4, 0, 0, 0))
            .unwrap();

        let days = rollup.daily(hour(2020, 1, 1, 0), hour(2020, 1, 1, 6)).unwrap();
        assert_eq!(days.len(), 1);
        assert_eq!(days[0].new_contracts, 3);
    }

    #[test]
    fn test_mid_hour_start_includes_its_hour() {
        let (store, rollup) = rollup();
        store
            .save(HostSnapshot::new(hour(2020, 1, 1, 10)).with_contracts(2, 0, 0, 0))
            .unwrap();

        let start = hour(2020, 1, 1, 10) + TimeDelta::minutes(30);
        let days = rollup.daily(start, start + TimeDelta::minutes(10)).unwrap();
        assert_eq!(days[0].new_contracts, 2);
    }

    #[test]
    fn test_equal_bounds_yield_start_day_only() {
        let (store, rollup) = rollup();
        store.save(HostSnapshot::new(hour(2020, 1, 1, 4)).with_contracts(1, 0, 0, 0)).unwrap();
        store.save(HostSnapshot::new(hour(2020, 1, 1, 10)).with_contracts(5, 0, 0, 0)).unwrap();

        let days = rollup.daily(hour(2020, 1, 1, 4), hour(2020, 1, 1, 4)).unwrap();
        assert_eq!(days, vec![HostSnapshot::new(hour(2020, 1, 1, 0))]);

        let mid_hour = hour(2020, 1, 1, 10) + TimeDelta::minutes(30);
        let days = rollup.daily(mid_hour, mid_hour).unwrap();
        assert_eq!(days, vec![HostSnapshot::new(hour(2020, 1, 1, 0))]);
    }

    #[test]
    fn test_counters_saturate_instead_of_overflowing() {
        let (store, rollup) = rollup();
        store
            .save(HostSnapshot::new(hour(2020, 1, 1, 0)).with_contracts(u64::MAX, 0, 0, 0))
            .unwrap();
        store
            .save(HostSnapshot::new(hour(2020, 1, 1, 1)).with_contracts(2, 0, 0, 0))
            .unwrap();

        let days = rollup.daily(hour(2020, 1, 1, 0), hour(2020, 1, 2, 0)).unwrap();
        assert_eq!(days[0].new_contracts, u64::MAX);
    }

    #[test]
    fn test_decode_failure_propagates() {
        let engine = Arc::new(MemoryEngine::new());
        let namespaces = Namespaces::default();
        let store = SnapshotStore::new(engine.clone(), &namespaces);
        let rollup = DailyRollup::new(store.clone());

        store.save(HostSnapshot::new(hour(2020, 1, 1, 1))).unwrap();

        let mut txn = engine.begin_write().unwrap();
        txn.put(
            &namespaces.host_snapshots,
            &time_key::encode(hour(2020, 1, 1, 7)),
            b"\xff\x00",
        )
        .unwrap();
        txn.commit().unwrap();

        match rollup.daily(hour(2020, 1, 1, 0), hour(2020, 1, 2, 0)) {
            Err(StoreError::Decoding { key, partial, .. }) => {
                assert_eq!(time_key::decode(&key), Some(hour(2020, 1, 1, 7)));
                assert_eq!(partial.len(), 1);
            }
            other => panic!("expected decoding error, got {other:?}"),
        }

        // Corrupt hours outside the window are never read
        assert!(rollup.daily(hour(2020, 1, 1, 0), hour(2020, 1, 1, 7)).is_ok());
    }

    #[test]
    fn test_inverted_range_touches_no_storage() {
        let engine = Arc::new(CountingEngine::default());
        let rollup = DailyRollup::new(SnapshotStore::new(engine.clone(), &Namespaces::default()));

        let err = rollup.daily(hour(2020, 1, 2, 0), hour(2020, 1, 1, 0)).unwrap_err();
        assert!(err.is_validation());
        assert_eq!(engine.transactions(), 0);
    }
}
