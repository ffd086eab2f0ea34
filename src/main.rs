use clap::{Parser, Subcommand};
use colored::Colorize;
use eyre::{Result, WrapErr};
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use taskflow::{
    AlwaysConfirm, Config, Confirm, FileStorage, Notice, Priority, Renderer, SortOrder, Stats, Storage, Task,
    TaskFilter, TaskStore, clear_all_confirmed, import_confirmed, now, snapshot, time_ago,
};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "taskflow")]
#[command(about = "TaskFlow - to-do list with priorities, filtered views and JSON import/export")]
#[command(version = env!("GIT_DESCRIBE"))]
struct Cli {
    /// Path to the config file (default: <config dir>/taskflow/config.yaml)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Directory holding the task data (overrides the config file)
    #[arg(short, long)]
    store_path: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Add a new task
    Add {
        text: String,

        /// low, medium or high
        #[arg(short, long)]
        priority: Option<Priority>,
    },

    /// Show tasks
    List {
        /// all, pending or completed
        #[arg(short, long)]
        filter: Option<TaskFilter>,

        /// newest, oldest, priority or alphabetical
        #[arg(long)]
        sort: Option<SortOrder>,
    },

    /// Mark a task completed, or pending again
    Toggle { id: u64 },

    /// Replace a task's text
    Edit { id: u64, text: String },

    /// Delete a task
    Delete { id: u64 },

    /// Delete every task
    Clear {
        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },

    /// Show task counts
    Stats,

    /// Write all tasks to a JSON file
    Export {
        /// Output file (default: tasks_<date>.json)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Replace all tasks with the contents of an export file
    Import {
        file: PathBuf,

        /// Skip the confirmation prompt
        #[arg(short, long)]
        yes: bool,
    },
}

/// Prints notifications as they arrive and keeps the latest view for display
#[derive(Default)]
struct ConsoleRenderer {
    view: Vec<Task>,
    stats: Stats,
}

impl Renderer for ConsoleRenderer {
    fn render(&mut self, view: &[Task], stats: Stats) {
        self.view = view.to_vec();
        self.stats = stats;
    }

    fn notify(&mut self, level: Notice, message: &str) {
        match level {
            Notice::Success => println!("{}", message.green()),
            Notice::Info => println!("{}", message),
            Notice::Warning => eprintln!("{}", message.yellow()),
            Notice::Error => eprintln!("{}", message.red().bold()),
        }
    }
}

impl ConsoleRenderer {
    fn print_view(&self, filter: TaskFilter, sort: SortOrder) {
        println!("{}", sort.label().dimmed());

        if self.view.is_empty() {
            println!("{}", filter.empty_message().bold());
            println!("{}", filter.empty_description().dimmed());
            return;
        }

        let current = now();
        for task in &self.view {
            let check = if task.completed { "[x]".green() } else { "[ ]".normal() };
            let text = if task.completed {
                task.text.strikethrough().dimmed()
            } else {
                task.text.normal()
            };
            let priority = match task.priority {
                Priority::High => task.priority.to_string().red(),
                Priority::Medium => task.priority.to_string().yellow(),
                Priority::Low => task.priority.to_string().green(),
            };
            println!(
                "{} {:>4}  {}  {}  {}",
                check,
                task.id,
                text,
                priority,
                time_ago(task.created_at, current).dimmed()
            );
        }
    }

    fn print_stats(&self) {
        println!(
            "{} total, {} completed, {} pending",
            self.stats.total.to_string().bold(),
            self.stats.completed.to_string().green(),
            self.stats.pending.to_string().yellow()
        );
    }
}

/// Asks on stdin, defaulting to no
struct StdinConfirm;

impl Confirm for StdinConfirm {
    fn confirm(&mut self, prompt: &str) -> bool {
        print!("{} [y/N] ", prompt);
        if io::stdout().flush().is_err() {
            return false;
        }

        let mut answer = String::new();
        if io::stdin().lock().read_line(&mut answer).is_err() {
            return false;
        }
        matches!(answer.trim().to_ascii_lowercase().as_str(), "y" | "yes")
    }
}

fn confirmer(yes: bool) -> Box<dyn Confirm> {
    if yes { Box::new(AlwaysConfirm) } else { Box::new(StdinConfirm) }
}

/// Warn through the renderer when `id` names no task
fn task_exists<S: Storage, R: Renderer>(store: &mut TaskStore<S, R>, id: u64) -> bool {
    if store.get(id).is_some() {
        return true;
    }
    store
        .renderer_mut()
        .notify(Notice::Warning, &format!("Task {} not found", id));
    false
}

fn main() -> Result<()> {
    // Setup tracing; RUST_LOG overrides the warn default, stdout stays reserved for command output
    tracing_subscriber::fmt()
        .with_writer(io::stderr)
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .init();

    let cli = Cli::parse();

    let mut config = Config::load(cli.config.as_deref())?;
    if let Some(path) = cli.store_path {
        config.store_path = path;
    }

    // Open store
    let storage = FileStorage::open(&config.store_path)
        .wrap_err_with(|| format!("Failed to open task store at {}", config.store_path.display()))?;
    let mut store = TaskStore::with_renderer(storage, ConsoleRenderer::default());
    store.set_filter(config.default_filter);
    store.set_sort(config.default_sort);

    match cli.command {
        Commands::Add { text, priority } => {
            let task = store.add(&text, priority.unwrap_or(config.default_priority))?;
            println!("{} {}", "Created task".dimmed(), task.id);
        }
        Commands::List { filter, sort } => {
            if let Some(filter) = filter {
                store.set_filter(filter);
            }
            if let Some(sort) = sort {
                store.set_sort(sort);
            }
            store.renderer().print_view(store.filter(), store.sort());
            store.renderer().print_stats();
        }
        Commands::Toggle { id } => {
            if task_exists(&mut store, id) {
                store.toggle(id)?;
            }
        }
        Commands::Edit { id, text } => {
            if task_exists(&mut store, id) {
                store.edit(id, &text)?;
            }
        }
        Commands::Delete { id } => {
            if task_exists(&mut store, id) {
                store.delete(id)?;
            }
        }
        Commands::Clear { yes } => {
            clear_all_confirmed(&mut store, confirmer(yes).as_mut())?;
        }
        Commands::Stats => store.renderer().print_stats(),
        Commands::Export { output } => {
            if store.tasks().is_empty() {
                store.renderer_mut().notify(Notice::Warning, "No tasks to export");
                return Ok(());
            }

            let export = store.export();
            let path = output.unwrap_or_else(|| PathBuf::from(export.file_name()));
            let json = export.to_json_pretty().wrap_err("Failed to serialize tasks")?;
            fs::write(&path, json).wrap_err_with(|| format!("Failed to write {}", path.display()))?;

            store
                .renderer_mut()
                .notify(Notice::Success, &format!("Tasks exported successfully to {}", path.display()));
        }
        Commands::Import { file, yes } => {
            let content = fs::read_to_string(&file).wrap_err_with(|| format!("Failed to read {}", file.display()))?;
            let doc = snapshot::parse_document(&content)?;

            if import_confirmed(&mut store, &doc, confirmer(yes).as_mut())?.is_none() {
                println!("Import cancelled");
            }
        }
    }

    Ok(())
}
