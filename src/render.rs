// Rendering collaborator interface

use crate::models::{Stats, Task};
use std::fmt;

/// Severity of a user-facing notification
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Notice {
    Success,
    Info,
    Warning,
    Error,
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Success => write!(f, "success"),
            Notice::Info => write!(f, "info"),
            Notice::Warning => write!(f, "warning"),
            Notice::Error => write!(f, "error"),
        }
    }
}

/// Receives the current view after every change, plus transient notifications
///
/// The store never draws anything itself; hosts implement this to update
/// their display.
pub trait Renderer {
    fn render(&mut self, view: &[Task], stats: Stats);

    fn notify(&mut self, _level: Notice, _message: &str) {}
}

/// Renderer that discards everything
#[derive(Debug, Clone, Copy, Default)]
pub struct NullRenderer;

impl Renderer for NullRenderer {
    fn render(&mut self, _view: &[Task], _stats: Stats) {}
}

/// Renderer that keeps what it was given
#[derive(Debug, Clone, Default)]
pub struct RecordingRenderer {
    pub renders: usize,
    pub last_view: Vec<Task>,
    pub last_stats: Stats,
    pub notices: Vec<(Notice, String)>,
}

impl RecordingRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Most recent notification, if any
    pub fn last_notice(&self) -> Option<(Notice, &str)> {
        self.notices.last().map(|(level, msg)| (*level, msg.as_str()))
    }
}

impl Renderer for RecordingRenderer {
    fn render(&mut self, view: &[Task], stats: Stats) {
        self.renders += 1;
        self.last_view = view.to_vec();
        self.last_stats = stats;
    }

    fn notify(&mut self, level: Notice, message: &str) {
        self.notices.push((level, message.to_string()));
    }
}
