use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::GeometrySource;
use crate::cache::GeometryCache;
use crate::models::{Feature, FeatureCollection, OwnerRecord};
use crate::utils::normalize;

/// Default pause after each successful fetch, to go easy on Kartverket.
const DEFAULT_PACING_MS: u64 = 100;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnrichOptions {
    /// Emit every feature of a response instead of only the first.
    ///
    /// The cache only ever memoizes the first feature, so with a cache a miss
    /// emits every feature while a later hit for the same identifier emits
    /// one. Cached runs should use [`EnrichOptions::first_only`].
    pub keep_all_features: bool,
    /// Pause after each successful network fetch.
    pub pacing: Duration,
}

impl EnrichOptions {
    /// Settings for the cached owner-properties endpoint: first feature only.
    pub fn first_only(pacing: Duration) -> Self {
        Self {
            keep_all_features: false,
            pacing,
        }
    }

    /// Settings for the bulk pre-fetch: every polygon returned.
    pub fn all_features(pacing: Duration) -> Self {
        Self {
            keep_all_features: true,
            pacing,
        }
    }
}

impl Default for EnrichOptions {
    fn default() -> Self {
        Self::first_only(Duration::from_millis(DEFAULT_PACING_MS))
    }
}

/// Outcome of resolving one identifier against the geometry source.
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// Non-empty; a single feature unless `keep_all_features` is set.
    Found(Vec<Feature>),
    NotFound,
    FetchError(String),
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EnrichStats {
    pub records: usize,
    pub skipped: usize,
    pub cache_hits: usize,
    pub fetched: usize,
    pub not_found: usize,
    pub failed: usize,
}

#[derive(Debug, Clone)]
pub struct Enrichment {
    pub collection: FeatureCollection,
    /// The caller should persist the cache.
    pub cache_modified: bool,
    pub stats: EnrichStats,
}

/// Runs owner records through a [`GeometrySource`], one at a time.
pub struct Enricher<'a> {
    source: &'a dyn GeometrySource,
    options: EnrichOptions,
}

impl<'a> Enricher<'a> {
    pub fn new(source: &'a dyn GeometrySource, options: EnrichOptions) -> Self {
        Self { source, options }
    }

    /// Fetch geometry for a normalized identifier. Pacing is applied only
    /// when something was found.
    pub async fn resolve(&self, matrikkel_id: &str) -> Resolution {
        match self.source.lookup(matrikkel_id).await {
            Ok(features) if features.is_empty() => Resolution::NotFound,
            Ok(mut features) => {
                if !self.options.keep_all_features {
                    features.truncate(1);
                }
                tokio::time::sleep(self.options.pacing).await;
                Resolution::Found(features)
            }
            Err(e) => Resolution::FetchError(e.to_string()),
        }
    }

    /// Resolve every record in order and collect the owner-stamped features.
    ///
    /// With a cache, hits skip the network and each fetch stores its first
    /// feature (see [`EnrichOptions::keep_all_features`] for how that
    /// interacts with emitting every feature). Without one, every record is fetched. Records that resolve
    /// to nothing are dropped from the output.
    pub async fn enrich(
        &self,
        records: &[OwnerRecord],
        mut cache: Option<&mut GeometryCache>,
    ) -> Enrichment {
        let total = records.len();
        let mut stats = EnrichStats {
            records: total,
            ..EnrichStats::default()
        };
        let mut features = Vec::new();
        let mut cache_modified = false;

        for (index, record) in records.iter().enumerate() {
            let Some(raw_id) = record.raw_id() else {
                stats.skipped += 1;
                continue;
            };
            let matrikkel_id = normalize(raw_id);
            let progress = format!("{}/{}", index + 1, total);

            let cached = cache
                .as_deref()
                .and_then(|c| c.get(&matrikkel_id))
                .cloned();

            let resolved = match cached {
                Some(feature) => {
                    stats.cache_hits += 1;
                    debug!(progress = %progress, matrikkel_id = %matrikkel_id, "Cache hit");
                    vec![feature]
                }
                None => match self.resolve(&matrikkel_id).await {
                    Resolution::Found(found) => {
                        stats.fetched += 1;
                        info!(
                            progress = %progress,
                            matrikkel_id = %matrikkel_id,
                            polygons = found.len(),
                            "Fetched geometry"
                        );
                        if let (Some(cache), Some(first)) = (cache.as_deref_mut(), found.first()) {
                            cache.insert(matrikkel_id.clone(), first.clone());
                            cache_modified = true;
                        }
                        found
                    }
                    Resolution::NotFound => {
                        stats.not_found += 1;
                        info!(progress = %progress, matrikkel_id = %matrikkel_id, "No feature");
                        continue;
                    }
                    Resolution::FetchError(reason) => {
                        stats.failed += 1;
                        warn!(
                            progress = %progress,
                            matrikkel_id = %matrikkel_id,
                            error = %reason,
                            "Failed to fetch geometry"
                        );
                        continue;
                    }
                },
            };

            for mut feature in resolved {
                feature.merge_owner(record.eier.as_deref(), raw_id);
                features.push(feature);
            }
        }

        Enrichment {
            collection: FeatureCollection::new(features),
            cache_modified,
            stats,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
