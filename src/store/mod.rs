// src/store/mod.rs
pub mod firestore;
pub mod memory;

pub use firestore::FirestoreGateway;
pub use memory::{InMemoryStore, StoreOp};
