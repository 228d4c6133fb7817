//! Where console output ends up.

use tracing::Level;

/// Receives the text a guest writes to its console.
///
/// `depth` is the current group nesting; sinks decide how to render it.
pub trait ConsoleSink {
    /// Writes one line of output at `level`.
    fn emit(&mut self, level: Level, depth: usize, text: &str);

    /// Clears previously written output, if the sink can.
    fn clear(&mut self) {}
}

/// Forwards console output to `tracing` events under the `jtl::console`
/// target, indented two spaces per group level.
#[derive(Clone, Copy, Debug, Default)]
pub struct TracingSink;

impl ConsoleSink for TracingSink {
    fn emit(&mut self, level: Level, depth: usize, text: &str) {
        let indent = depth * 2;
        match level {
            Level::ERROR => tracing::error!(target: "jtl::console", "{:indent$}{text}", ""),
            Level::WARN => tracing::warn!(target: "jtl::console", "{:indent$}{text}", ""),
            Level::INFO => tracing::info!(target: "jtl::console", "{:indent$}{text}", ""),
            Level::DEBUG => tracing::debug!(target: "jtl::console", "{:indent$}{text}", ""),
            _ => tracing::trace!(target: "jtl::console", "{:indent$}{text}", ""),
        }
    }

    fn clear(&mut self) {
        tracing::debug!(target: "jtl::console", "console cleared");
    }
}

/// A line captured by [`RecordingSink`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Line {
    /// Level the line was written at.
    pub level: Level,
    /// Group depth at the time of writing.
    pub depth: usize,
    /// The text, without indentation.
    pub text: String,
}

/// Keeps console output in memory.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    /// Lines written since the last clear.
    pub lines: Vec<Line>,
    /// Number of times the console was cleared.
    pub clears: usize,
}

impl RecordingSink {
    /// Text of every recorded line, in order.
    pub fn texts(&self) -> Vec<&str> {
        self.lines.iter().map(|l| l.text.as_str()).collect()
    }
}

impl ConsoleSink for RecordingSink {
    fn emit(&mut self, level: Level, depth: usize, text: &str) {
        self.lines.push(Line {
            level,
            depth,
            text: text.to_owned(),
        });
    }

    fn clear(&mut self) {
        self.lines.clear();
        self.clears += 1;
    }
}
