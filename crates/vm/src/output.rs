//! Where `print` writes.
//!
//! One sink is shared by the main machine and every goroutine of a run,
//! so implementations must accept lines from several threads. A line is
//! emitted whole; lines from different contexts never interleave.

use parking_lot::Mutex;
use std::io::Write;
use std::sync::Arc;

/// Destination for program output.
pub trait OutputSink: Send + Sync {
    fn emit(&self, line: &str);
}

/// Writes each line to standard output.
#[derive(Debug, Default, Clone, Copy)]
pub struct StdoutSink;

impl OutputSink for StdoutSink {
    fn emit(&self, line: &str) {
        let mut out = std::io::stdout().lock();
        // A closed stdout has nowhere to report to.
        let _ = writeln!(out, "{line}");
    }
}

/// Collects lines in memory.
#[derive(Debug, Default, Clone)]
pub struct BufferSink {
    lines: Arc<Mutex<Vec<String>>>,
}

impl BufferSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Lines emitted so far, in emission order.
    pub fn lines(&self) -> Vec<String> {
        self.lines.lock().clone()
    }
}

impl OutputSink for BufferSink {
    fn emit(&self, line: &str) {
        self.lines.lock().push(line.to_string());
    }
}
