//! postal-search: REST API over an Elasticsearch index of postal codes.

pub mod analysis;
pub mod backend;
pub mod config;
pub mod documents;
pub mod error;
pub mod failure;
pub mod logging;
pub mod metrics;
pub mod query;
pub mod schema;
pub mod server;
pub mod startup;
pub mod types;
