//! Data models for owner records and GeoJSON geometry.
//!
//! - `OwnerRecord`: one `{matrikkelnummer, eier}` row of the owners file
//! - `Feature`, `FeatureCollection`: GeoJSON envelopes passed through from Kartverket

pub mod feature;
pub mod owner;

pub use feature::{Feature, FeatureCollection};
pub use owner::{load_owners, OwnerRecord};
