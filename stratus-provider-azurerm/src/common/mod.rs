//! Helpers shared by the Cosmos DB handlers

pub mod capabilities;
pub mod throughput;

pub use capabilities::is_serverless_capacity_mode;
