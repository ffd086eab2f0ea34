// TaskFlow - persistent to-do list with filtered views and JSON import/export

pub mod config;
pub mod confirm;
pub mod error;
pub mod models;
pub mod render;
pub mod snapshot;
pub mod storage;
pub mod store;
pub mod view;

// Re-export main types for convenience
pub use config::Config;
pub use confirm::{AlwaysConfirm, Confirm, NeverConfirm, clear_all_confirmed, import_confirmed};
pub use error::{Result, TaskError};
pub use models::{Priority, Stats, Task, now, time_ago};
pub use render::{Notice, NullRenderer, RecordingRenderer, Renderer};
pub use snapshot::Snapshot;
pub use storage::{FileStorage, MemoryStorage, Storage};
pub use store::TaskStore;
pub use view::{SortOrder, TaskFilter};
