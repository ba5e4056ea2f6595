pub mod rollup;
pub mod snapshot_store;

#[cfg(test)]
mod test_support;

pub use rollup::DailyRollup;
pub use snapshot_store::SnapshotStore;
