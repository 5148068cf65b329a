//! Document Merger - fetches located documents and unions their tables.

use futures::stream::{self, StreamExt};
use tracing::{info, warn};

use crate::records::RawRecord;
use crate::store::{DocumentRef, DocumentStore};

/// Maximum concurrent document fetches.
const MAX_CONCURRENT_FETCHES: usize = 5;

/// Number of leading non-data lines before the real column header in every
/// source document.
const METADATA_LINES: usize = 1;

/// Result of a merge operation. Zero successfully parsed documents is an
/// empty row set, not an error, so downstream stages can report "no data"
/// distinctly from a pipeline fault.
#[derive(Debug, Clone, Default)]
pub struct MergeReport {
    pub rows: Vec<RawRecord>,
    pub documents_merged: usize,
    pub documents_failed: usize,
}

/// Parse one document's bytes into rows keyed by column name.
///
/// The first [`METADATA_LINES`] rows are skipped; the next row is the
/// column header. Cells beyond the header width are dropped; cells missing
/// at the end of a short row are simply absent keys.
fn parse_table(bytes: &[u8]) -> Result<Vec<RawRecord>, csv::Error> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(false)
        .flexible(true)
        .from_reader(bytes);

    let mut rows = Vec::new();
    let mut header: Option<Vec<String>> = None;
    let mut skipped = 0;

    for result in reader.records() {
        let record = result?;
        if skipped < METADATA_LINES {
            skipped += 1;
            continue;
        }
        match header {
            None => {
                header = Some(record.iter().map(|s| s.trim().to_string()).collect());
            }
            Some(ref header) => {
                let mut row = RawRecord::new();
                for (i, cell) in record.iter().enumerate() {
                    if let Some(name) = header.get(i) {
                        if !name.is_empty() {
                            row.insert(name.clone(), cell.to_string());
                        }
                    }
                }
                rows.push(row);
            }
        }
    }

    Ok(rows)
}

/// Fetch every located document and concatenate the successfully parsed
/// tables, aligning rows by column name.
///
/// A single document failing to fetch or parse excludes only that
/// document's rows; fetches run with bounded concurrency and failures stay
/// isolated per document.
pub async fn merge_documents<S>(store: &S, documents: &[DocumentRef]) -> MergeReport
where
    S: DocumentStore,
{
    let results: Vec<(String, Result<Vec<RawRecord>, String>)> =
        stream::iter(documents.iter().cloned())
            .map(|doc| async move {
                let parsed = match store.fetch(&doc.id).await {
                    Ok(bytes) => parse_table(&bytes).map_err(|e| e.to_string()),
                    Err(e) => Err(e.to_string()),
                };
                (doc.name, parsed)
            })
            .buffer_unordered(MAX_CONCURRENT_FETCHES)
            .collect()
            .await;

    let mut report = MergeReport::default();
    for (name, parsed) in results {
        match parsed {
            Ok(rows) => {
                report.documents_merged += 1;
                report.rows.extend(rows);
            }
            Err(error) => {
                warn!(document = %name, error = %error, "Excluding unreadable document");
                report.documents_failed += 1;
            }
        }
    }

    info!(
        rows = report.rows.len(),
        merged = report.documents_merged,
        failed = report.documents_failed,
        "Merge finished"
    );
    report
}
