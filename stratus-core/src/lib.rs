//! Stratus Core
//!
//! Provider-agnostic building blocks for infrastructure providers: resource
//! values and state, declarative schemas, drift detection, named locks and
//! long-running operation polling.

pub mod differ;
pub mod locks;
pub mod poll;
pub mod provider;
pub mod resource;
pub mod schema;
pub mod timeouts;
