pub mod snapshot;
pub mod time_key;
