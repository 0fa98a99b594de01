//! Store gateway: request/response access to remote note stores

mod memory;
mod traits;
mod wire;

pub use memory::{MemoryStore, StoreCall};
pub use traits::{StoreError, StoreGateway, StoreResult};
pub use wire::{WireCollection, WireNote};
