//! Persistence collaborators. The database and object storage themselves
//! are out of scope (§1) — these are the trait boundaries plus a default
//! in-process implementation good enough to run the whole pipeline in
//! tests and a single-process deployment.

pub mod objectstore;
pub mod store;

pub use objectstore::{LocalObjectStore, ObjectStore};
pub use store::{GenerationStore, InMemoryGenerationStore};
