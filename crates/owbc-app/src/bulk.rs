//! Bulk delete over the current selection.
//!
//! Deletes run one at a time: bounded load on the backend and trivial
//! per-item error attribution. A failed id stays selected and is
//! reported; a succeeded id leaves the selection immediately, so an
//! interrupted batch leaves exactly the still-pending ids selected.

use std::collections::HashSet;
use std::future::Future;

use owbc_core::prelude::*;

/// Delete every selected id sequentially and report the outcome.
///
/// - Empty selection: reports `no <label> selected`, performs no calls,
///   and does not invoke `refresh`.
/// - Otherwise each failure is recorded as `<id>: <error>` without
///   aborting the batch, and `refresh` is invoked exactly once after
///   all ids have been attempted.
pub async fn execute<D, DFut, R>(
    label: &str,
    selection: &mut HashSet<String>,
    mut delete: D,
    mut refresh: R,
) -> String
where
    D: FnMut(String) -> DFut,
    DFut: Future<Output = Result<()>>,
    R: FnMut(),
{
    if selection.is_empty() {
        return format!("no {label} selected");
    }

    let mut ids: Vec<String> = selection.iter().cloned().collect();
    ids.sort();
    let total = ids.len();
    let mut succeeded = 0usize;
    let mut failures: Vec<String> = Vec::new();

    for id in ids {
        match delete(id.clone()).await {
            Ok(()) => {
                selection.remove(&id);
                succeeded += 1;
            }
            Err(err) => {
                warn!("delete {id} failed: {err}");
                failures.push(format!("{id}: {err}"));
            }
        }
    }

    refresh();

    if failures.is_empty() {
        format!("Deleted {total} {label}")
    } else {
        format!("Deleted {succeeded}/{total} {label}\n{}", failures.join("\n"))
    }
}
