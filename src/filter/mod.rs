//! DNS query filtering.
//!
//! A block-list sinkholes unwanted names: queries for a listed name are
//! answered locally instead of being resolved.

mod blocklist;

pub use blocklist::Blocklist;
