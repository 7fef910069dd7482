// src/config/mod.rs
pub mod credentials;
pub mod ingest;

pub use credentials::{FirestoreSettings, StoreBackend, YouTubeCredentials};
pub use ingest::IngestConfig;
