//! Collection federation: which collections are known locally, on which
//! stores they live, and how they are created, connected, moved and removed

mod manager;
mod migrate;
mod registry;


pub use manager::{CollectionStatus, FederationManager, RefreshReport, TitleAvailability};
pub use migrate::{MigrationFailure, MigrationReport, RetargetOutcome};
pub use registry::{
    CollectionRegistry, JsonFileRegistry, MemoryRegistry, RegistryError, RegistryResult, RegistrySnapshot,
};
