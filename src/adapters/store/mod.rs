pub mod memory;
pub mod redb_store;

pub use memory::MemoryEngine;
pub use redb_store::RedbEngine;
