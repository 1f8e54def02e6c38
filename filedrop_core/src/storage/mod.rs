//! Object storage: backend trait, backends, and the gateway the rest of the
//! crate talks to.

pub mod factory;
pub mod gateway;
#[cfg(feature = "gcs")]
pub mod gcs;
pub mod local;
pub mod memory;
pub mod traits;

pub use factory::{create_gateway, create_object_store};
pub use gateway::{validate_name, StorageGateway};
#[cfg(feature = "gcs")]
pub use gcs::GcsObjectStore;
pub use local::LocalObjectStore;
pub use memory::InMemoryObjectStore;
pub use traits::{ObjectStore, StorageError, StorageResult};
