//! Bulk pre-fetch: resolve every owner straight from Kartverket, without the
//! geometry cache, and write one static GeoJSON file for the frontend.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use eiendom_core::models::load_owners;
use eiendom_core::pipeline::EnrichStats;
use eiendom_core::{ApiClient, Config, EnrichOptions, Enricher, FeatureCollection, GeometrySource};

pub async fn run(config: &Config, output: &Path, keep_all_features: bool) -> Result<EnrichStats> {
    let client = ApiClient::new(config)?;
    let options = EnrichOptions {
        keep_all_features,
        pacing: config.request_delay(),
    };
    prefetch(&client, &config.owners_path, output, options).await
}

pub async fn prefetch(
    source: &dyn GeometrySource,
    owners_path: &Path,
    output: &Path,
    options: EnrichOptions,
) -> Result<EnrichStats> {
    info!(path = %owners_path.display(), "Reading owners");
    let owners = load_owners(owners_path)?;
    info!(count = owners.len(), "Fetching geometry for properties");

    let result = Enricher::new(source, options).enrich(&owners, None).await;
    write_collection(output, &result.collection)?;

    info!(
        polygons = result.collection.len(),
        output = %output.display(),
        not_found = result.stats.not_found,
        failed = result.stats.failed,
        "Saved polygons"
    );
    Ok(result.stats)
}

fn write_collection(path: &Path, collection: &FeatureCollection) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }
    let contents = serde_json::to_string(collection)?;
    std::fs::write(path, contents)
        .with_context(|| format!("Failed to write {}", path.display()))
}
