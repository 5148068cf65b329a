//! Radius query pipeline over real-price transaction registers.
//!
//! Ingests CSV documents scattered across a hierarchical remote store,
//! normalizes the ROC-calendar date and price-per-area encodings, resolves
//! a free-text address to coordinates with a degrading fallback, and
//! returns the transactions within a great-circle radius that match a
//! category and an optional building-age cap.
//!
//! # Pipeline
//!
//! ```text
//! locate ──► merge ──► normalize ──┐
//!                                  ├──► filter ──► QueryResult
//! resolve address ─────────────────┘
//! ```
//!
//! Per-source failures (an unreadable subtree, a corrupt document, a
//! malformed row) degrade the result set and are counted in the report;
//! only an unresolvable address or invalid parameters abort a query.
//!
//! # Usage
//!
//! ```rust,ignore
//! use drive_client::DriveClient;
//! use realprice::{Category, DriveStore, NominatimGeocoder, Pipeline, QueryParams};
//!
//! let store = DriveStore::new(DriveClient::new(token));
//! let geocoder = NominatimGeocoder::new("my-app/1.0")?;
//! let pipeline = Pipeline::new(store, geocoder, root_folder_id);
//!
//! let result = pipeline
//!     .run(&QueryParams {
//!         address: "台中市大里區西湖路427號".into(),
//!         radius_km: 1.5,
//!         category: Category::Building,
//!         max_age_years: Some(30),
//!         current_year: 2023,
//!     })
//!     .await?;
//! ```

pub mod cache;
pub mod error;
pub mod geo;
pub mod geocode;
pub mod locator;
pub mod merger;
pub mod normalize;
pub mod pipeline;
pub mod records;
pub mod store;
pub mod testing;

pub use cache::TtlCache;
pub use error::{GeocodeError, PipelineError, Result, StoreError};
pub use geo::{filter_records, haversine_km, FilterOutcome};
pub use geocode::{
    strip_house_number, AddressResolver, CachedGeocoder, Geocoder, NominatimGeocoder,
};
pub use locator::{is_tabular, locate_documents, LocateReport};
pub use merger::{merge_documents, MergeReport};
pub use normalize::{normalize_rows, parse_roc_date, NormalizeReport};
pub use pipeline::{
    Pipeline, PipelineReport, QueryOutcome, QueryParams, QueryResult, DEFAULT_TABLE_TTL,
};
pub use records::{Category, CleanRecord, Coordinates, FilteredRecord, RawRecord};
pub use store::{DocumentRef, DocumentStore, DriveStore, NodeKind, RemoteNode};
pub use testing::{MockDocumentStore, MockGeocoder};
