//! Persistence adapters for the parcel and user repository ports.

mod memory;

pub use memory::{InMemoryParcelRepository, InMemoryUserRepository};
