// User confirmation for destructive operations

use crate::error::Result;
use crate::render::{Notice, Renderer};
use crate::snapshot;
use crate::storage::Storage;
use crate::store::TaskStore;
use serde_json::Value;
use tracing::debug;

/// Asks the user a yes/no question
pub trait Confirm {
    fn confirm(&mut self, prompt: &str) -> bool;
}

impl<F: FnMut(&str) -> bool> Confirm for F {
    fn confirm(&mut self, prompt: &str) -> bool {
        self(prompt)
    }
}

/// Answers yes to everything (e.g. `--yes` on the command line)
#[derive(Debug, Clone, Copy, Default)]
pub struct AlwaysConfirm;

impl Confirm for AlwaysConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

#[derive(Debug, Clone, Copy, Default)]
pub struct NeverConfirm;

impl Confirm for NeverConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}

/// Clear every task once the user agrees
///
/// Returns `Ok(false)` when there was nothing to clear or the user declined.
pub fn clear_all_confirmed<S, R>(store: &mut TaskStore<S, R>, confirm: &mut dyn Confirm) -> Result<bool>
where
    S: Storage,
    R: Renderer,
{
    let count = store.tasks().len();
    if count == 0 {
        store.renderer_mut().notify(Notice::Warning, "No tasks to clear");
        return Ok(false);
    }

    let prompt = format!(
        "Are you sure you want to delete all {} tasks? This action cannot be undone.",
        count
    );
    if !confirm.confirm(&prompt) {
        debug!(count, "Clear all declined");
        return Ok(false);
    }

    store.clear_all()?;
    Ok(true)
}

/// Validate an import document, then replace the task list once the user agrees
///
/// Malformed documents are rejected before the user is asked. Returns the
/// number of imported tasks, or `None` if the user declined.
pub fn import_confirmed<S, R>(
    store: &mut TaskStore<S, R>,
    doc: &Value,
    confirm: &mut dyn Confirm,
) -> Result<Option<usize>>
where
    S: Storage,
    R: Renderer,
{
    let count = snapshot::tasks_from_document(doc)?.len();

    let prompt = format!("Import {} tasks? This will replace your current tasks.", count);
    if !confirm.confirm(&prompt) {
        debug!(count, "Import declined");
        return Ok(None);
    }

    store.import(doc).map(Some)
}
