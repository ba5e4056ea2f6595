pub mod store;

pub use store::{MemoryEngine, RedbEngine};
