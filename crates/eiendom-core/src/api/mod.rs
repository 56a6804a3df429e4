//! REST API client module for Kartverket's property services.
//!
//! This module provides the `ApiClient` for the `eiendom/v1` API
//! (geokoding by matrikkelnummer, and area lookup by point), plus the
//! `GeometrySource` seam the enrichment pipeline resolves geometry through.

pub mod client;
pub mod error;

pub use client::{ApiClient, GeometrySource, PointLookup};
pub use error::ApiError;
