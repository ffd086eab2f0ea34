// Task store: owns the task list, persists it, and derives views

use crate::error::{Result, TaskError};
use crate::models::{self, Priority, Stats, Task};
use crate::render::{Notice, NullRenderer, Renderer};
use crate::snapshot::{self, Snapshot};
use crate::storage::Storage;
use crate::view::{self, SortOrder, TaskFilter};
use chrono::{DateTime, SubsecRound, Utc};
use serde_json::Value;
use tracing::{debug, info, warn};

/// Storage key holding the serialized task array
pub const TASKS_KEY: &str = "taskflow_tasks";

/// Storage key holding the next id to assign
pub const COUNTER_KEY: &str = "taskflow_task_id_counter";

type Clock = Box<dyn Fn() -> DateTime<Utc>>;

/// In-memory task list backed by a key-value storage collaborator
///
/// Every mutation validates first, applies in memory, persists, then hands the
/// fresh view to the renderer. A failed write is reported as
/// `TaskError::Persistence` but the in-memory change is kept.
pub struct TaskStore<S: Storage, R: Renderer = NullRenderer> {
    tasks: Vec<Task>,
    next_id: u64,
    filter: TaskFilter,
    sort: SortOrder,
    storage: S,
    renderer: R,
    clock: Clock,
}

impl<S: Storage> TaskStore<S, NullRenderer> {
    /// Open a store with no renderer attached
    pub fn open(storage: S) -> Self {
        Self::with_renderer(storage, NullRenderer)
    }
}

impl<S: Storage, R: Renderer> TaskStore<S, R> {
    /// Open a store and restore any previously persisted state
    ///
    /// Restoring never fails: unreadable state falls back to an empty list
    /// after notifying the renderer.
    pub fn with_renderer(storage: S, renderer: R) -> Self {
        let mut store = Self {
            tasks: Vec::new(),
            next_id: 1,
            filter: TaskFilter::default(),
            sort: SortOrder::default(),
            storage,
            renderer,
            clock: Box::new(models::now),
        };
        store.restore();
        store.refresh();
        store
    }

    /// Replace the timestamp source
    pub fn with_clock(mut self, clock: impl Fn() -> DateTime<Utc> + 'static) -> Self {
        self.clock = Box::new(clock);
        self
    }

    pub fn storage(&self) -> &S {
        &self.storage
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn renderer_mut(&mut self) -> &mut R {
        &mut self.renderer
    }

    /// Tasks in storage order
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    pub fn get(&self, id: u64) -> Option<&Task> {
        self.tasks.iter().find(|t| t.id == id)
    }

    /// Id the next `add` will assign
    pub fn next_id(&self) -> u64 {
        self.next_id
    }

    pub fn filter(&self) -> TaskFilter {
        self.filter
    }

    pub fn sort(&self) -> SortOrder {
        self.sort
    }

    // ========================================================================
    // Mutations
    // ========================================================================

    /// Add a task at the front of the list
    pub fn add(&mut self, text: &str, priority: Priority) -> Result<Task> {
        let text = models::validate_text(text)?;

        let next_id = self
            .next_id
            .checked_add(1)
            .ok_or_else(|| TaskError::persistence(COUNTER_KEY, "task id counter is exhausted"))?;

        let task = Task::new(self.next_id, text, priority, self.now());
        self.next_id = next_id;
        self.tasks.insert(0, task.clone());

        debug!(id = task.id, priority = %task.priority, "Added task");
        self.commit("Task added successfully!")?;
        Ok(task)
    }

    /// Flip completion of a task; unknown ids are ignored
    pub fn toggle(&mut self, id: u64) -> Result<()> {
        let now = self.now();
        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "toggle: no such task");
            return Ok(());
        };

        task.toggle(now);
        let message = if task.completed {
            "Task completed!"
        } else {
            "Task marked as pending"
        };

        debug!(id, completed = task.completed, "Toggled task");
        self.commit(message)
    }

    /// Replace a task's text; unknown ids are ignored once the text is valid
    pub fn edit(&mut self, id: u64, text: &str) -> Result<()> {
        let text = models::validate_text(text)?;

        let Some(task) = self.tasks.iter_mut().find(|t| t.id == id) else {
            debug!(id, "edit: no such task");
            return Ok(());
        };

        task.text = text;
        debug!(id, "Edited task");
        self.commit("Task updated successfully!")
    }

    /// Remove a task; unknown ids are ignored
    pub fn delete(&mut self, id: u64) -> Result<()> {
        let Some(index) = self.tasks.iter().position(|t| t.id == id) else {
            debug!(id, "delete: no such task");
            return Ok(());
        };

        self.tasks.remove(index);
        debug!(id, "Deleted task");
        self.commit("Task deleted")
    }

    /// Remove every task. Callers confirm with the user first.
    pub fn clear_all(&mut self) -> Result<()> {
        let count = self.tasks.len();
        self.tasks.clear();
        info!(count, "Cleared all tasks");
        self.commit("All tasks cleared")
    }

    /// Replace the whole list from an import document
    ///
    /// Rejected documents leave the store untouched. Callers confirm with the
    /// user first since the current list is discarded.
    pub fn import(&mut self, doc: &Value) -> Result<usize> {
        let tasks = snapshot::tasks_from_document(doc)?;
        let count = tasks.len();
        let next_id = snapshot::next_id_after(&tasks)
            .ok_or_else(|| TaskError::import("task ids leave no room for new tasks"))?;

        self.next_id = next_id;
        self.tasks = tasks;

        info!(count, next_id = self.next_id, "Imported tasks");
        self.commit("Tasks imported successfully!")?;
        Ok(count)
    }

    /// Parse raw file contents and import them
    pub fn import_json(&mut self, text: &str) -> Result<usize> {
        let doc = snapshot::parse_document(text)?;
        self.import(&doc)
    }

    // ========================================================================
    // View state
    // ========================================================================

    pub fn set_filter(&mut self, filter: TaskFilter) {
        self.filter = filter;
        self.refresh();
    }

    pub fn set_sort(&mut self, sort: SortOrder) {
        self.sort = sort;
        self.refresh();
    }

    /// Advance to the next sort mode and return it
    pub fn cycle_sort(&mut self) -> SortOrder {
        self.set_sort(self.sort.next());
        self.sort
    }

    /// Tasks matching the active filter, in the active sort order
    pub fn view(&self) -> Vec<Task> {
        view::project(&self.tasks, self.filter, self.sort)
    }

    pub fn stats(&self) -> Stats {
        Stats::from_tasks(&self.tasks)
    }

    /// Snapshot of the full list, not the filtered view
    pub fn export(&self) -> Snapshot {
        Snapshot::new(self.tasks.clone(), self.now())
    }

    // ========================================================================
    // Persistence
    // ========================================================================

    /// Write the task list and id counter to storage
    pub fn persist(&mut self) -> Result<()> {
        let json = serde_json::to_string(&self.tasks).map_err(|e| TaskError::persistence(TASKS_KEY, e.to_string()))?;

        self.storage.set(TASKS_KEY, &json)?;
        self.storage.set(COUNTER_KEY, &self.next_id.to_string())?;

        debug!(count = self.tasks.len(), next_id = self.next_id, "Persisted tasks");
        Ok(())
    }

    /// Reload state from storage, falling back to an empty list on any problem
    pub fn restore(&mut self) {
        match self.load() {
            Ok((tasks, next_id)) => {
                info!(count = tasks.len(), next_id, "Restored tasks");
                self.tasks = tasks;
                self.next_id = next_id;
            }
            Err(e) => {
                warn!(error = %e, "Failed to load saved tasks, starting empty");
                self.tasks.clear();
                self.next_id = 1;
                self.renderer.notify(Notice::Error, "Failed to load saved tasks");
            }
        }
    }

    fn load(&self) -> Result<(Vec<Task>, u64)> {
        let tasks = match self.storage.get(TASKS_KEY)? {
            Some(json) => {
                let doc: Value =
                    serde_json::from_str(&json).map_err(|e| TaskError::persistence(TASKS_KEY, e.to_string()))?;
                snapshot::tasks_from_document(&serde_json::json!({ "tasks": doc }))
                    .map_err(|e| TaskError::persistence(TASKS_KEY, e.to_string()))?
            }
            None => Vec::new(),
        };

        let floor = snapshot::next_id_after(&tasks)
            .ok_or_else(|| TaskError::persistence(TASKS_KEY, "stored task ids leave no room for new tasks"))?;
        let next_id = match self.storage.get(COUNTER_KEY)? {
            Some(raw) => {
                let stored: u64 = raw.trim().parse().map_err(|_| {
                    TaskError::persistence(COUNTER_KEY, format!("invalid id counter '{}'", raw.trim()))
                })?;
                if stored < floor {
                    warn!(stored, floor, "Stored id counter is behind existing ids, raising it");
                }
                stored.max(floor)
            }
            None => floor,
        };

        Ok((tasks, next_id))
    }

    /// Clock reading at the millisecond precision timestamps are stored with
    fn now(&self) -> DateTime<Utc> {
        (self.clock)().trunc_subsecs(3)
    }

    /// Persist, re-render, and announce the outcome of a mutation
    fn commit(&mut self, success: &str) -> Result<()> {
        let saved = self.persist();
        self.refresh();

        match saved {
            Ok(()) => {
                self.renderer.notify(Notice::Success, success);
                Ok(())
            }
            Err(e) => {
                warn!(error = %e, "Failed to save tasks");
                self.renderer.notify(Notice::Error, "Failed to save tasks");
                Err(e)
            }
        }
    }

    fn refresh(&mut self) {
        let view = self.view();
        let stats = self.stats();
        self.renderer.render(&view, stats);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::render::RecordingRenderer;
    use crate::storage::{FileStorage, MemoryStorage};
    use chrono::{Duration, TimeZone};
    use serde_json::json;
    use std::cell::Cell;
    use std::rc::Rc;
    use tempfile::TempDir;

    /// Clock that advances one minute per call
    fn ticking_clock() -> impl Fn() -> DateTime<Utc> + 'static {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap();
        let ticks = Rc::new(Cell::new(0i64));
        move || {
            let n = ticks.get();
            ticks.set(n + 1);
            start + Duration::minutes(n)
        }
    }

    fn memory_store() -> TaskStore<MemoryStorage, RecordingRenderer> {
        TaskStore::with_renderer(MemoryStorage::new(), RecordingRenderer::new()).with_clock(ticking_clock())
    }

    fn view_ids(store: &TaskStore<impl Storage, impl Renderer>) -> Vec<u64> {
        store.view().iter().map(|t| t.id).collect()
    }

    #[test]
    fn test_add_places_new_task_first() {
        let mut store = memory_store();
        store.add("first", Priority::Low).unwrap();
        store.add("second", Priority::High).unwrap();
        let task = store.add("  third  ", Priority::Medium).unwrap();

        assert_eq!(task.text, "third");
        assert_eq!(task.id, 3);
        assert!(!task.completed);
        assert_eq!(view_ids(&store), vec![3, 2, 1]);
        assert_eq!(store.tasks()[0].id, 3);
    }

    #[test]
    fn test_add_without_clock_ticks_still_newest_first() {
        // Equal timestamps fall back to insertion order
        let fixed = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let mut store = TaskStore::open(MemoryStorage::new()).with_clock(move || fixed);
        store.add("a", Priority::Medium).unwrap();
        store.add("b", Priority::Medium).unwrap();
        assert_eq!(view_ids(&store), vec![2, 1]);
    }

    #[test]
    fn test_add_rejects_invalid_text_without_mutation() {
        let mut store = memory_store();
        let renders = store.renderer().renders;

        assert!(matches!(store.add("   ", Priority::Medium), Err(TaskError::Validation { .. })));
        assert!(matches!(store.add(&"x".repeat(101), Priority::Medium), Err(TaskError::Validation { .. })));

        assert!(store.tasks().is_empty());
        assert_eq!(store.next_id(), 1);
        assert_eq!(store.renderer().renders, renders);
        assert_eq!(store.storage().get(TASKS_KEY).unwrap(), None);
    }

    #[test]
    fn test_toggle_is_its_own_inverse() {
        let mut store = memory_store();
        let task = store.add("flip me", Priority::Medium).unwrap();

        store.toggle(task.id).unwrap();
        let done = store.get(task.id).unwrap();
        assert!(done.completed);
        assert!(done.completed_at.is_some());
        assert_eq!(store.renderer().last_notice(), Some((Notice::Success, "Task completed!")));

        store.toggle(task.id).unwrap();
        let back = store.get(task.id).unwrap();
        assert_eq!(back, &task);
        assert_eq!(store.renderer().last_notice(), Some((Notice::Success, "Task marked as pending")));
    }

    #[test]
    fn test_toggle_unknown_id_is_noop() {
        let mut store = memory_store();
        store.add("a", Priority::Medium).unwrap();
        let before = store.tasks().to_vec();

        store.toggle(99).unwrap();
        assert_eq!(store.tasks(), before.as_slice());
    }

    #[test]
    fn test_edit_boundaries() {
        let mut store = memory_store();
        let task = store.add("original", Priority::High).unwrap();

        assert!(store.edit(task.id, "").is_err());
        assert!(store.edit(task.id, &"x".repeat(101)).is_err());
        assert_eq!(store.get(task.id).unwrap().text, "original");

        store.edit(task.id, "y").unwrap();
        assert_eq!(store.get(task.id).unwrap().text, "y");

        store.edit(task.id, &"z".repeat(100)).unwrap();
        let edited = store.get(task.id).unwrap();
        assert_eq!(edited.text, "z".repeat(100));
        assert_eq!(edited.created_at, task.created_at);
        assert_eq!(edited.completed, task.completed);
        assert_eq!(edited.priority, Priority::High);
    }

    #[test]
    fn test_delete_removes_from_every_view() {
        let mut store = memory_store();
        let a = store.add("a", Priority::Low).unwrap();
        let b = store.add("b", Priority::High).unwrap();
        store.toggle(a.id).unwrap();

        store.delete(a.id).unwrap();
        store.delete(a.id).unwrap();

        for filter in [TaskFilter::All, TaskFilter::Pending, TaskFilter::Completed] {
            for sort in [
                SortOrder::Newest,
                SortOrder::Oldest,
                SortOrder::Priority,
                SortOrder::Alphabetical,
            ] {
                store.set_filter(filter);
                store.set_sort(sort);
                assert!(store.view().iter().all(|t| t.id != a.id));
            }
        }
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.tasks()[0].id, b.id);
    }

    #[test]
    fn test_ids_never_reused() {
        let mut store = memory_store();
        let a = store.add("a", Priority::Medium).unwrap();
        store.delete(a.id).unwrap();
        store.clear_all().unwrap();
        let b = store.add("b", Priority::Medium).unwrap();
        assert_eq!(b.id, 2);
    }

    #[test]
    fn test_clear_all() {
        let mut store = memory_store();
        store.add("a", Priority::Medium).unwrap();
        store.add("b", Priority::Medium).unwrap();

        store.clear_all().unwrap();
        assert!(store.tasks().is_empty());
        assert_eq!(store.stats(), Stats::default());
        assert_eq!(store.storage().get(TASKS_KEY).unwrap().as_deref(), Some("[]"));
    }

    #[test]
    fn test_stats_after_adds_and_toggle() {
        let mut store = memory_store();
        let a = store.add("a", Priority::Medium).unwrap();
        store.add("b", Priority::Medium).unwrap();
        store.add("c", Priority::Medium).unwrap();
        store.toggle(a.id).unwrap();

        assert_eq!(
            store.stats(),
            Stats {
                total: 3,
                completed: 1,
                pending: 2
            }
        );
        assert_eq!(store.renderer().last_stats, store.stats());
    }

    #[test]
    fn test_view_filter_and_sort() {
        let mut store = memory_store();
        store.add("a", Priority::Low).unwrap();
        let b = store.add("b", Priority::High).unwrap();
        store.add("c", Priority::Medium).unwrap();

        store.set_sort(SortOrder::Priority);
        let texts: Vec<String> = store.view().into_iter().map(|t| t.text).collect();
        assert_eq!(texts, vec!["b", "c", "a"]);

        store.set_sort(SortOrder::Oldest);
        assert_eq!(view_ids(&store), vec![1, 2, 3]);

        store.toggle(b.id).unwrap();
        store.set_filter(TaskFilter::Completed);
        assert_eq!(view_ids(&store), vec![2]);
        store.set_filter(TaskFilter::Pending);
        assert_eq!(view_ids(&store), vec![1, 3]);

        // The renderer saw the latest view
        assert_eq!(store.renderer().last_view.len(), 2);
    }

    #[test]
    fn test_view_does_not_mutate() {
        let mut store = memory_store();
        store.add("b", Priority::Low).unwrap();
        store.add("a", Priority::High).unwrap();
        let saved = store.storage().get(TASKS_KEY).unwrap();
        let before = store.tasks().to_vec();

        store.set_sort(SortOrder::Alphabetical);
        let _ = store.view();

        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(store.next_id(), 3);
        assert_eq!(store.storage().get(TASKS_KEY).unwrap(), saved);
    }

    #[test]
    fn test_cycle_sort() {
        let mut store = memory_store();
        assert_eq!(store.cycle_sort(), SortOrder::Oldest);
        assert_eq!(store.cycle_sort(), SortOrder::Priority);
        assert_eq!(store.cycle_sort(), SortOrder::Alphabetical);
        assert_eq!(store.cycle_sort(), SortOrder::Newest);
    }

    #[test]
    fn test_export_captures_full_list() {
        let mut store = memory_store();
        let a = store.add("a", Priority::Medium).unwrap();
        store.add("b", Priority::Medium).unwrap();
        store.toggle(a.id).unwrap();
        store.set_filter(TaskFilter::Pending);

        let snapshot = store.export();
        assert_eq!(snapshot.version, "1.0");
        assert_eq!(snapshot.tasks, store.tasks());
        assert_eq!(snapshot.tasks.len(), 2);
    }

    #[test]
    fn test_import_then_export_roundtrip() {
        let mut source = memory_store();
        let a = source.add("alpha", Priority::High).unwrap();
        source.add("beta", Priority::Low).unwrap();
        source.toggle(a.id).unwrap();
        let exported = source.export().to_json_pretty().unwrap();

        let mut target = memory_store();
        target.add("to be replaced", Priority::Medium).unwrap();
        let count = target.import_json(&exported).unwrap();

        assert_eq!(count, 2);
        assert_eq!(target.export().tasks, source.tasks());
    }

    #[test]
    fn test_import_sets_counter_past_max_id() {
        let mut store = memory_store();
        let doc = json!({
            "tasks": [
                { "id": 5, "text": "five", "completed": false, "priority": "low",
                  "createdAt": "2024-05-01T10:00:00Z", "completedAt": null },
                { "id": 2, "text": "two", "completed": true, "priority": "high",
                  "createdAt": "2024-05-01T09:00:00Z", "completedAt": "2024-05-01T11:00:00Z" }
            ]
        });

        store.import(&doc).unwrap();
        assert_eq!(store.next_id(), 6);
        assert_eq!(store.add("next", Priority::Medium).unwrap().id, 6);
    }

    #[test]
    fn test_import_rejects_largest_id_without_mutation() {
        let mut store = memory_store();
        store.add("keep me", Priority::Medium).unwrap();
        let before = store.tasks().to_vec();

        let doc = json!({ "tasks": [
            { "id": u64::MAX, "text": "big", "createdAt": "2024-05-01T10:00:00Z" }
        ]});
        assert!(matches!(store.import(&doc), Err(TaskError::Import { .. })));

        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(store.next_id(), 2);
    }

    #[test]
    fn test_import_empty_resets_counter() {
        let mut store = memory_store();
        store.add("a", Priority::Medium).unwrap();
        store.import(&json!({ "tasks": [] })).unwrap();
        assert!(store.tasks().is_empty());
        assert_eq!(store.next_id(), 1);
    }

    #[test]
    fn test_import_rejects_bad_documents_without_mutation() {
        let mut store = memory_store();
        store.add("keep me", Priority::Medium).unwrap();
        let before = store.tasks().to_vec();

        assert!(matches!(store.import(&json!({})), Err(TaskError::Import { .. })));
        assert!(matches!(store.import(&json!({ "tasks": {} })), Err(TaskError::Import { .. })));
        assert!(matches!(store.import_json("not json"), Err(TaskError::Import { .. })));

        let dup = json!({ "tasks": [
            { "id": 1, "text": "a", "createdAt": "2024-05-01T10:00:00Z" },
            { "id": 1, "text": "b", "createdAt": "2024-05-01T10:00:00Z" }
        ]});
        assert!(matches!(store.import(&dup), Err(TaskError::Import { .. })));

        assert_eq!(store.tasks(), before.as_slice());
        assert_eq!(store.next_id(), 2);
    }

    #[test]
    fn test_persist_and_restore() {
        let temp = TempDir::new().unwrap();

        let created = {
            let mut store = TaskStore::open(FileStorage::open(temp.path()).unwrap());
            let a = store.add("persisted", Priority::High).unwrap();
            store.add("deleted", Priority::Low).unwrap();
            store.delete(2).unwrap();
            store.toggle(a.id).unwrap();
            store.tasks().to_vec()
        };

        let store = TaskStore::open(FileStorage::open(temp.path()).unwrap());
        assert_eq!(store.tasks(), created.as_slice());
        assert_eq!(store.next_id(), 3);
    }

    #[test]
    fn test_restore_malformed_falls_back_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(TASKS_KEY, "{ definitely not an array").unwrap();
        storage.set(COUNTER_KEY, "42").unwrap();

        let store = TaskStore::with_renderer(storage, RecordingRenderer::new());
        assert!(store.tasks().is_empty());
        assert_eq!(store.next_id(), 1);
        assert_eq!(store.renderer().last_notice(), Some((Notice::Error, "Failed to load saved tasks")));
    }

    #[test]
    fn test_restore_bad_counter_falls_back_empty() {
        let mut storage = MemoryStorage::new();
        storage.set(TASKS_KEY, "[]").unwrap();
        storage.set(COUNTER_KEY, "abc").unwrap();

        let store = TaskStore::with_renderer(storage, RecordingRenderer::new());
        assert_eq!(store.next_id(), 1);
        assert_eq!(store.renderer().notices.len(), 1);
    }

    #[test]
    fn test_restore_raises_stale_counter() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                TASKS_KEY,
                r#"[{"id":7,"text":"x","completed":false,"priority":"medium","createdAt":"2024-05-01T10:00:00Z","completedAt":null}]"#,
            )
            .unwrap();
        storage.set(COUNTER_KEY, "3").unwrap();

        let store = TaskStore::open(storage);
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.next_id(), 8);
    }

    #[test]
    fn test_restore_missing_counter_uses_max_id() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                TASKS_KEY,
                r#"[{"id":4,"text":"x","createdAt":"2024-05-01T10:00:00Z"}]"#,
            )
            .unwrap();

        let store = TaskStore::open(storage);
        assert_eq!(store.next_id(), 5);
        assert_eq!(store.get(4).unwrap().priority, Priority::Medium);
    }

    #[test]
    fn test_restore_largest_id_falls_back_empty() {
        let mut storage = MemoryStorage::new();
        storage
            .set(
                TASKS_KEY,
                &format!(r#"[{{"id":{},"text":"big","createdAt":"2024-05-01T10:00:00Z"}}]"#, u64::MAX),
            )
            .unwrap();

        let store = TaskStore::with_renderer(storage, RecordingRenderer::new());
        assert!(store.tasks().is_empty());
        assert_eq!(store.next_id(), 1);
        assert_eq!(store.renderer().last_notice(), Some((Notice::Error, "Failed to load saved tasks")));
    }

    #[test]
    fn test_add_with_exhausted_counter_is_rejected() {
        let mut storage = MemoryStorage::new();
        storage.set(COUNTER_KEY, &u64::MAX.to_string()).unwrap();

        let mut store = TaskStore::with_renderer(storage, RecordingRenderer::new());
        assert_eq!(store.next_id(), u64::MAX);

        let err = store.add("x", Priority::Medium).unwrap_err();
        assert!(matches!(err, TaskError::Persistence { ref key, .. } if key == COUNTER_KEY));
        assert!(store.tasks().is_empty());
        assert_eq!(store.next_id(), u64::MAX);
    }

    #[test]
    fn test_timestamps_stored_at_millisecond_precision() {
        let precise = Utc.with_ymd_and_hms(2024, 5, 1, 10, 0, 0).unwrap() + Duration::nanoseconds(123_456_789);
        let mut store = TaskStore::open(MemoryStorage::new()).with_clock(move || precise);

        let task = store.add("a", Priority::Medium).unwrap();
        assert_eq!(task.created_at.timestamp_subsec_nanos(), 123_000_000);

        let saved = store.storage().get(TASKS_KEY).unwrap().unwrap();
        assert!(saved.contains("\"createdAt\":\"2024-05-01T10:00:00.123Z\""));
    }

    #[test]
    fn test_restore_empty_storage() {
        let store = memory_store();
        assert!(store.tasks().is_empty());
        assert_eq!(store.next_id(), 1);
        assert!(store.renderer().notices.is_empty());
        assert_eq!(store.renderer().renders, 1);
    }

    #[test]
    fn test_persistence_failure_keeps_memory_state() {
        let storage = MemoryStorage::with_quota(64);
        let mut store = TaskStore::with_renderer(storage, RecordingRenderer::new()).with_clock(ticking_clock());

        let err = store.add(&"x".repeat(90), Priority::Medium).unwrap_err();
        assert!(matches!(err, TaskError::Persistence { .. }));

        // Mutation stays applied in memory and the renderer was told
        assert_eq!(store.tasks().len(), 1);
        assert_eq!(store.next_id(), 2);
        assert_eq!(store.renderer().last_notice(), Some((Notice::Error, "Failed to save tasks")));
        assert_eq!(store.renderer().last_view.len(), 1);
    }
}
