use crate::sink::ConsoleSink;
use jtl::{HostContext, Lifecycle, Phase, Result};
use std::collections::HashMap;
use std::time::Instant;
use tracing::Level;
use wasmtime::{Linker, Memory};

const DEFAULT_LABEL: &str = "default";

/// The console translation layer for one guest instance.
///
/// Besides plain leveled output this keeps the small amount of state the
/// browser console has: per-label counters and timers, the group depth, and
/// a line buffer filled by `jsConsoleLogWrite` and emitted on flush.
pub struct ConsoleCtx<S> {
    sink: S,
    lifecycle: Lifecycle,
    counters: HashMap<String, u64>,
    timers: HashMap<String, Instant>,
    depth: usize,
    pending: String,
}

impl<S: ConsoleSink> ConsoleCtx<S> {
    /// Creates a console that writes to `sink`.
    pub fn new(sink: S) -> Self {
        Self {
            sink,
            lifecycle: Lifecycle::new(),
            counters: HashMap::new(),
            timers: HashMap::new(),
            depth: 0,
            pending: String::new(),
        }
    }

    /// The output sink.
    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Mutable access to the output sink.
    pub fn sink_mut(&mut self) -> &mut S {
        &mut self.sink
    }

    /// The current lifecycle phase.
    pub fn phase(&self) -> Phase {
        self.lifecycle.phase()
    }

    /// Current group nesting depth.
    pub fn depth(&self) -> usize {
        self.depth
    }

    /// Registers the console bindings in `linker` under `module`.
    ///
    /// Calling this again replaces the earlier registrations with identical
    /// ones. Shadowing is left disabled on `linker` afterwards.
    pub fn export_bindings<T: 'static>(
        &mut self,
        linker: &mut Linker<T>,
        module: &str,
        get_cx: impl Fn(&mut T) -> &mut ConsoleCtx<S> + Send + Sync + Copy + 'static,
    ) -> wasmtime::Result<()>
    where
        S: 'static,
    {
        linker.allow_shadowing(true);
        let registered = crate::bindings::add_to_linker(linker, module, get_cx);
        linker.allow_shadowing(false);
        registered?;
        self.lifecycle.bind();
        tracing::debug!(module, "exported console bindings");
        Ok(())
    }

    /// Supplies the guest's memory. Fails if already active.
    pub fn activate(&mut self, memory: Memory) -> Result<()> {
        self.lifecycle.activate(memory)?;
        tracing::debug!("console translation layer active");
        Ok(())
    }

    /// Writes `text` at `level`, indented by the current group depth.
    pub fn print(&mut self, level: Level, text: &str) {
        self.sink.emit(level, self.depth, text);
    }

    /// `console.assert`: prints an error only when `condition` is false.
    pub fn assert(&mut self, condition: bool, message: Option<&str>) {
        if condition {
            return;
        }
        match message {
            Some(message) => self.print(Level::ERROR, &format!("Assertion failed: {message}")),
            None => self.print(Level::ERROR, "Assertion failed"),
        }
    }

    /// `console.trace`.
    pub fn trace(&mut self, tag: Option<&str>) {
        match tag {
            Some(tag) => self.print(Level::TRACE, &format!("Trace: {tag}")),
            None => self.print(Level::TRACE, "Trace"),
        }
    }

    /// `console.clear`.
    pub fn clear(&mut self) {
        self.sink.clear();
    }

    /// `console.count`: bumps and prints the counter for `label`.
    pub fn count(&mut self, label: Option<&str>) {
        let label = label.unwrap_or(DEFAULT_LABEL);
        let count = self.counters.entry(label.to_owned()).or_insert(0);
        *count += 1;
        let text = format!("{label}: {count}");
        self.print(Level::INFO, &text);
    }

    /// `console.countReset`.
    pub fn count_reset(&mut self, label: Option<&str>) {
        let label = label.unwrap_or(DEFAULT_LABEL);
        match self.counters.get_mut(label) {
            Some(count) => *count = 0,
            None => self.print(Level::WARN, &format!("Count for '{label}' does not exist")),
        }
    }

    /// `console.group` and `console.groupCollapsed`; there is nothing to
    /// collapse here, so both behave the same.
    pub fn group(&mut self, label: Option<&str>) {
        self.print(Level::INFO, label.unwrap_or("console.group"));
        self.depth += 1;
    }

    /// `console.groupEnd`. Does nothing outside a group.
    pub fn group_end(&mut self) {
        self.depth = self.depth.saturating_sub(1);
    }

    /// `console.time`: starts a timer named `label`.
    pub fn time(&mut self, label: Option<&str>) {
        let label = label.unwrap_or(DEFAULT_LABEL);
        if self.timers.contains_key(label) {
            self.print(Level::WARN, &format!("Timer '{label}' already exists"));
        } else {
            self.timers.insert(label.to_owned(), Instant::now());
        }
    }

    /// `console.timeLog`: prints the elapsed time of a running timer.
    pub fn time_log(&mut self, label: Option<&str>) {
        let label = label.unwrap_or(DEFAULT_LABEL);
        match self.timers.get(label) {
            Some(start) => {
                let text = elapsed(label, *start);
                self.print(Level::INFO, &text);
            }
            None => self.missing_timer(label),
        }
    }

    /// `console.timeEnd`: prints the elapsed time and stops the timer.
    pub fn time_end(&mut self, label: Option<&str>) {
        let label = label.unwrap_or(DEFAULT_LABEL);
        match self.timers.remove(label) {
            Some(start) => {
                let text = elapsed(label, start);
                self.print(Level::INFO, &text);
            }
            None => self.missing_timer(label),
        }
    }

    fn missing_timer(&mut self, label: &str) {
        self.print(Level::WARN, &format!("Timer '{label}' does not exist"));
    }

    /// Appends `text` to the pending line.
    pub fn write(&mut self, text: &str) {
        self.pending.push_str(text);
    }

    /// Prints the pending line, even if empty, and starts a new one.
    pub fn flush(&mut self) {
        let line = std::mem::take(&mut self.pending);
        self.print(Level::INFO, &line);
    }
}

fn elapsed(label: &str, start: Instant) -> String {
    let ms = start.elapsed().as_secs_f64() * 1000.0;
    format!("{label}: {ms:.3} ms")
}

impl<S> HostContext for ConsoleCtx<S> {
    fn lifecycle(&self) -> &Lifecycle {
        &self.lifecycle
    }
}
