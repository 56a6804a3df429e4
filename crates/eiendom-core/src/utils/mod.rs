//! Identifier helpers.

pub mod matrikkel;

pub use matrikkel::normalize;
