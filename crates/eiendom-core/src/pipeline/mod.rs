//! Owner/geometry enrichment pipeline.
//!
//! Resolves each owner record to Kartverket geometry (through the
//! [`GeometryCache`](crate::cache::GeometryCache) when one is supplied),
//! stamps ownership onto the features and collects them into a
//! FeatureCollection.

pub mod enrich;
pub mod error;

pub use enrich::{EnrichOptions, EnrichStats, Enricher, Enrichment, Resolution};
pub use error::PipelineError;
