//! Document Locator - walks the remote folder tree and collects documents.

use std::collections::{HashSet, VecDeque};

use tracing::{debug, warn};

use crate::store::{DocumentRef, DocumentStore, NodeKind, RemoteNode};

/// Result of a locate operation. A partial result is still usable: folders
/// whose listing failed are counted rather than aborting the traversal.
#[derive(Debug, Clone, Default)]
pub struct LocateReport {
    /// Documents matching the predicate, in no particular order.
    pub documents: Vec<DocumentRef>,
    pub folders_visited: usize,
    pub folders_failed: usize,
}

/// True for nodes that look like tabular data documents.
pub fn is_tabular(node: &RemoteNode) -> bool {
    node.name.to_ascii_lowercase().contains(".csv")
        || node.media_type.as_deref() == Some("text/csv")
}

/// Walk the tree under `root_id` and collect every document matching
/// `predicate`, at any depth.
///
/// Traversal uses an explicit worklist rather than recursion, and every
/// node is listed at most once; the visited-set also terminates traversal
/// of malformed namespaces that alias a folder into a cycle. Sibling order
/// is unspecified.
pub async fn locate_documents<S, P>(store: &S, root_id: &str, predicate: P) -> LocateReport
where
    S: DocumentStore,
    P: Fn(&RemoteNode) -> bool,
{
    let mut report = LocateReport::default();
    let mut worklist: VecDeque<String> = VecDeque::new();
    let mut visited: HashSet<String> = HashSet::new();

    worklist.push_back(root_id.to_string());

    while let Some(folder_id) = worklist.pop_front() {
        if !visited.insert(folder_id.clone()) {
            continue;
        }
        report.folders_visited += 1;

        let children = match store.list_children(&folder_id).await {
            Ok(children) => children,
            Err(e) => {
                warn!(folder_id = %folder_id, error = %e, "Skipping unreadable subtree");
                report.folders_failed += 1;
                continue;
            }
        };

        for child in children {
            match child.kind {
                NodeKind::Folder => worklist.push_back(child.id),
                NodeKind::Document => {
                    if predicate(&child) {
                        report.documents.push(DocumentRef {
                            id: child.id,
                            name: child.name,
                        });
                    }
                }
            }
        }
    }

    debug!(
        documents = report.documents.len(),
        folders_visited = report.folders_visited,
        folders_failed = report.folders_failed,
        "Locate finished"
    );
    report
}
