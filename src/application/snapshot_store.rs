use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::debug;

use crate::codec::{snapshot as snapshot_codec, time_key};
use crate::config::Namespaces;
use crate::domain::{truncate_to_hour, HostSnapshot};
use crate::error::{StoreError, StoreResult};
use crate::ports::{KvEngine, ReadTxn};

/// Hourly snapshot persistence over an ordered key-value engine.
///
/// Each call opens and closes its own transaction; nothing is held between
/// calls, so one store may be shared freely across threads.
#[derive(Clone)]
pub struct SnapshotStore {
    engine: Arc<dyn KvEngine>,
    namespace: String,
}

impl SnapshotStore {
    pub fn new(engine: Arc<dyn KvEngine>, namespaces: &Namespaces) -> Self {
        Self {
            engine,
            namespace: namespaces.host_snapshots.clone(),
        }
    }

    /// Upsert `snapshot` under the hour containing its timestamp, replacing
    /// whatever was stored for that hour.
    pub fn save(&self, mut snapshot: HostSnapshot) -> StoreResult<()> {
        snapshot.timestamp = truncate_to_hour(snapshot.timestamp);

        let value = snapshot_codec::encode(&snapshot).map_err(|source| StoreError::Encoding {
            timestamp: snapshot.timestamp,
            source,
        })?;
        let key = time_key::encode(snapshot.timestamp);

        let mut txn = self.engine.begin_write().map_err(StoreError::storage("save"))?;
        txn.put(&self.namespace, &key, &value)
            .map_err(StoreError::storage("save"))?;
        txn.commit().map_err(StoreError::storage("save"))?;

        debug!("Saved host snapshot for {}", snapshot.timestamp);
        Ok(())
    }

    /// Snapshot stored for the hour containing `at`, if any
    pub fn get(&self, at: DateTime<Utc>) -> StoreResult<Option<HostSnapshot>> {
        let key = time_key::encode(truncate_to_hour(at));
        let txn = self.engine.begin_read().map_err(StoreError::storage("get"))?;

        let Some(value) = txn
            .get(&self.namespace, &key)
            .map_err(StoreError::storage("get"))?
        else {
            return Ok(None);
        };

        snapshot_codec::decode(&value)
            .map(Some)
            .map_err(|source| StoreError::Decoding {
                key: key.to_vec(),
                source,
                partial: Vec::new(),
            })
    }

    /// All snapshots keyed within `[start, end]`, oldest first.
    ///
    /// A value that fails to decode stops the scan with
    /// [`StoreError::Decoding`], which carries the records read before it.
    pub fn get_range(&self, start: DateTime<Utc>, end: DateTime<Utc>) -> StoreResult<Vec<HostSnapshot>> {
        validate_range(start, end)?;

        let txn = self
            .engine
            .begin_read()
            .map_err(StoreError::storage("get_range"))?;
        let snapshots = self.scan(txn.as_ref(), start, end)?;

        debug!("Loaded {} host snapshots between {} and {}", snapshots.len(), start, end);
        Ok(snapshots)
    }

    pub(crate) fn begin_read(&self) -> StoreResult<Box<dyn ReadTxn + '_>> {
        self.engine.begin_read().map_err(StoreError::storage("begin_read"))
    }

    /// Cursor scan of `[start, end]` inside an already open read transaction
    pub(crate) fn scan(
        &self,
        txn: &dyn ReadTxn,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
    ) -> StoreResult<Vec<HostSnapshot>> {
        let start_key = time_key::encode(start);
        let end_key = time_key::encode(end);

        let mut cursor = txn
            .cursor(&self.namespace)
            .map_err(StoreError::storage("scan"))?;
        let mut snapshots = Vec::new();

        let mut entry = cursor.seek(&start_key).map_err(StoreError::storage("scan"))?;
        while let Some((key, value)) = entry {
            if key.as_slice() > end_key.as_slice() {
                break;
            }

            match snapshot_codec::decode(&value) {
                Ok(snapshot) => snapshots.push(snapshot),
                Err(source) => {
                    return Err(StoreError::Decoding {
                        key,
                        source,
                        partial: snapshots,
                    })
                }
            }

            entry = cursor.next().map_err(StoreError::storage("scan"))?;
        }

        Ok(snapshots)
    }
}

/// Reject inverted ranges before any storage access
pub(crate) fn validate_range(start: DateTime<Utc>, end: DateTime<Utc>) -> StoreResult<()> {
    if start > end {
        return Err(StoreError::Validation { start, end });
    }
    Ok(())
}
