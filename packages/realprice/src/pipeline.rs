//! End-to-end pipeline wiring.
//!
//! Locate → Merge → Normalize produce a clean table; the Address Resolver
//! produces a center point; the Geo Filter combines both. Each stage hands
//! the next an owned, immutable snapshot.

use std::time::Duration;

use tracing::info;

use crate::cache::TtlCache;
use crate::error::{PipelineError, Result};
use crate::geo::{filter_records, FilterOutcome};
use crate::geocode::{AddressResolver, CachedGeocoder, Geocoder};
use crate::locator::{is_tabular, locate_documents};
use crate::merger::merge_documents;
use crate::normalize::normalize_rows;
use crate::records::{Category, Coordinates, FilteredRecord, RawRecord};
use crate::store::DocumentStore;

/// Default time-to-live for the merged-table cache.
pub const DEFAULT_TABLE_TTL: Duration = Duration::from_secs(600);

/// One radius query.
#[derive(Debug, Clone)]
pub struct QueryParams {
    /// Free-text center address.
    pub address: String,
    /// Search radius in kilometers; must be positive.
    pub radius_km: f64,
    pub category: Category,
    /// Maximum building age; only applied when the category is `Building`.
    pub max_age_years: Option<u32>,
    /// Reference year for age computation, supplied by the caller.
    pub current_year: i32,
}

/// Aggregate counters describing how the result set was produced.
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub documents_found: usize,
    pub documents_failed: usize,
    pub folders_failed: usize,
    pub rows_merged: usize,
    /// Rows excluded during normalization (unparseable date or price).
    pub rows_dropped: usize,
    pub rows_clean: usize,
    /// Clean rows carrying no coordinates; they never enter the geo filter.
    pub rows_unlocated: usize,
}

/// Structural outcome of a query. These are reportable states, not errors.
#[derive(Debug, Clone)]
pub enum QueryOutcome {
    /// Matching records, most recent transaction first.
    Matches(Vec<FilteredRecord>),
    /// The merge and normalization stages produced no usable rows.
    NoData,
    /// Clean rows exist but none carries coordinates.
    NoLocationData,
    /// Located rows exist but none passed the predicates.
    NoMatches,
}

#[derive(Debug, Clone)]
pub struct QueryResult {
    /// The resolved center point the distances were measured from.
    pub center: Coordinates,
    pub outcome: QueryOutcome,
    pub report: PipelineReport,
}

/// The assembled pipeline: a document store on one side, a geocoder on the
/// other, with explicit caches injected in between.
pub struct Pipeline<S, G> {
    store: S,
    resolver: AddressResolver<CachedGeocoder<G>>,
    root_folder_id: String,
    table_cache: TtlCache<Vec<RawRecord>>,
}

impl<S, G> Pipeline<S, G>
where
    S: DocumentStore,
    G: Geocoder,
{
    pub fn new(store: S, geocoder: G, root_folder_id: impl Into<String>) -> Self {
        Self {
            store,
            resolver: AddressResolver::new(CachedGeocoder::new(geocoder)),
            root_folder_id: root_folder_id.into(),
            table_cache: TtlCache::new(DEFAULT_TABLE_TTL),
        }
    }

    /// Replace the merged-table cache (for a different TTL).
    pub fn with_table_cache(mut self, cache: TtlCache<Vec<RawRecord>>) -> Self {
        self.table_cache = cache;
        self
    }

    /// Shorten the resolver's rate-limit pause (tests use this).
    pub fn with_fallback_pause(mut self, pause: Duration) -> Self {
        self.resolver = self.resolver.with_fallback_pause(pause);
        self
    }

    /// Fetch the merged raw table, reusing a cached copy while it is fresh.
    async fn merged_table(&self) -> (Vec<RawRecord>, PipelineReport) {
        if let Some(rows) = self.table_cache.get(&self.root_folder_id) {
            info!(rows = rows.len(), "Reusing cached merged table");
            let report = PipelineReport {
                rows_merged: rows.len(),
                ..Default::default()
            };
            return (rows, report);
        }

        let located = locate_documents(&self.store, &self.root_folder_id, is_tabular).await;
        let merged = merge_documents(&self.store, &located.documents).await;

        let report = PipelineReport {
            documents_found: located.documents.len(),
            documents_failed: merged.documents_failed,
            folders_failed: located.folders_failed,
            rows_merged: merged.rows.len(),
            ..Default::default()
        };

        self.table_cache
            .insert(self.root_folder_id.clone(), merged.rows.clone());
        (merged.rows, report)
    }

    /// Run one radius query end to end.
    ///
    /// An unresolvable address aborts before any data is fetched; every
    /// other degraded condition shows up in the report or as a structural
    /// outcome.
    pub async fn run(&self, params: &QueryParams) -> Result<QueryResult> {
        if !(params.radius_km > 0.0) {
            return Err(PipelineError::InvalidQuery {
                reason: format!("radius must be positive, got {}", params.radius_km),
            });
        }

        let center = self.resolver.resolve(&params.address).await.ok_or_else(|| {
            PipelineError::UnresolvableAddress {
                address: params.address.clone(),
            }
        })?;

        let (rows, mut report) = self.merged_table().await;

        let normalized = normalize_rows(&rows, params.current_year);
        report.rows_dropped = normalized.rows_dropped;
        report.rows_clean = normalized.records.len();
        report.rows_unlocated = normalized
            .records
            .iter()
            .filter(|r| r.coordinates.is_none())
            .count();

        if normalized.records.is_empty() {
            return Ok(QueryResult {
                center,
                outcome: QueryOutcome::NoData,
                report,
            });
        }

        let outcome = match filter_records(
            &normalized.records,
            center,
            params.radius_km,
            params.category,
            params.max_age_years,
        ) {
            FilterOutcome::Matches(records) => QueryOutcome::Matches(records),
            FilterOutcome::NoLocationData => QueryOutcome::NoLocationData,
            FilterOutcome::NoMatches => QueryOutcome::NoMatches,
        };

        Ok(QueryResult {
            center,
            outcome,
            report,
        })
    }
}
