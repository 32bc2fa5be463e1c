//! Mercury - a lightweight authoritative and recursive DNS resolver with a
//! block-list sinkhole and an in-memory response cache.
//!
//! This library exposes the wire codec, cache, and resolution pipeline for
//! benchmarking and testing.

pub mod cache;
pub mod dns;
pub mod error;
pub mod filter;
pub mod recurse;
pub mod resolver;
pub mod server;
pub mod stats;
pub mod upstream;
pub mod zone;
