//! User-facing log sink.
//!
//! Components that report to the user hold an `Rc<dyn LogSink>` handed to
//! them at construction. Sinks timestamp messages themselves and never block.

use std::cell::RefCell;

pub trait LogSink {
    fn log(&self, message: &str);
}

/// Forwards to the `log` facade under the `procframe` target.
#[derive(Debug, Default, Clone, Copy)]
pub struct FacadeSink;

impl LogSink for FacadeSink {
    fn log(&self, message: &str) {
        log::info!(target: "procframe", "{message}");
    }
}

/// In-memory console, one `[HH:MM:SS] message` line per entry.
#[derive(Debug, Default)]
pub struct LogConsole {
    lines: RefCell<Vec<String>>,
}

impl LogConsole {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn lines(&self) -> Vec<String> {
        self.lines.borrow().clone()
    }

    pub fn len(&self) -> usize {
        self.lines.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lines.borrow().is_empty()
    }

    /// True if any line contains `needle`.
    pub fn contains(&self, needle: &str) -> bool {
        self.lines.borrow().iter().any(|l| l.contains(needle))
    }

    pub fn clear(&self) {
        self.lines.borrow_mut().clear();
    }
}

impl LogSink for LogConsole {
    fn log(&self, message: &str) {
        let stamp = chrono::Local::now().format("%H:%M:%S");
        // A sink re-entered from a borrow (e.g. logging while rendering the
        // console) drops the line instead of panicking.
        if let Ok(mut lines) = self.lines.try_borrow_mut() {
            lines.push(format!("[{stamp}] {message}"));
        }
    }
}
