//! Local caching module for geokoding results.
//!
//! This module provides the `GeometryCache`, a JSON object on disk mapping
//! normalized matrikkel identifiers to the first feature Kartverket returned
//! for them. It is loaded before an enrichment run and persisted after.

pub mod manager;

pub use manager::GeometryCache;
