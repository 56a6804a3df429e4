//! Core library for eiendom.
//!
//! Resolves cadastral owner records (`matrikkelnummer` + `eier`) to property
//! polygons from Kartverket's geokoding API, memoizing results in a JSON
//! cache on disk.
//!
//! # Flow
//! 1. Load owners ([`models::load_owners`]).
//! 2. Open the cache ([`cache::GeometryCache::load`]), if the caller wants one.
//! 3. Run [`pipeline::Enricher::enrich`] against a [`api::GeometrySource`].
//! 4. Persist the cache when the run reports it modified.

pub mod api;
pub mod cache;
pub mod config;
pub mod models;
pub mod pipeline;
pub mod utils;

pub use api::{ApiClient, ApiError, GeometrySource};
pub use cache::GeometryCache;
pub use config::Config;
pub use models::{Feature, FeatureCollection, OwnerRecord};
pub use pipeline::{EnrichOptions, Enricher, Enrichment, PipelineError, Resolution};
