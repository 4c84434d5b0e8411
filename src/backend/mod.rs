//! Search backend module.
//!
//! Provides the `SearchBackend` trait, the Elasticsearch REST client, and an
//! in-memory implementation that emulates the index schema for tests and
//! local development.

pub mod elastic;
pub mod memory;
pub mod traits;

pub use elastic::ElasticBackend;
pub use memory::InMemoryBackend;
pub use traits::{Hit, PingInfo, SearchBackend};
