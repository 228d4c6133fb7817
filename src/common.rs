//! Host state and helpers shared by the commands.

use anyhow::{Context as _, Result, bail};
use jtl_console::{ConsoleCtx, TracingSink};
use jtl_webgl::{HeadlessGl, WebglCtx};
use std::time::Instant;
use wasmtime::{Memory, Val, ValType};

/// Log filter used when `JTL_LOG` is not set: guest console output and the
/// runner's own progress, warnings from everything else.
const DEFAULT_LOG_FILTER: &str = "warn,jtl::console=trace,jtl_cli=info";

/// Store data for one guest: a translation layer per import surface.
pub struct Host {
    /// Graphics surface.
    pub webgl: WebglCtx<HeadlessGl>,
    /// Console surface.
    pub console: ConsoleCtx<TracingSink>,
}

impl Host {
    /// Creates a host with a fresh headless graphics context.
    pub fn new() -> Self {
        Self {
            webgl: WebglCtx::new(HeadlessGl::new()),
            console: ConsoleCtx::new(TracingSink),
        }
    }

    /// Projection used by the graphics bindings.
    pub fn webgl(&mut self) -> &mut WebglCtx<HeadlessGl> {
        &mut self.webgl
    }

    /// Projection used by the console bindings.
    pub fn console(&mut self) -> &mut ConsoleCtx<TracingSink> {
        &mut self.console
    }

    /// Activates both surfaces with the guest's exported memory.
    pub fn activate(&mut self, memory: Memory) -> Result<()> {
        self.webgl.activate(memory)?;
        self.console.activate(memory)?;
        Ok(())
    }
}

/// Installs the global `tracing` subscriber, writing to stderr.
///
/// The filter comes from `JTL_LOG` in the usual `env_logger` syntax, falling
/// back to a default that shows guest console output.
pub fn init_logging(quiet: bool) {
    if quiet {
        return;
    }
    use std::io::IsTerminal;
    use tracing_subscriber::{EnvFilter, FmtSubscriber};
    let filter =
        EnvFilter::try_from_env("JTL_LOG").unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));
    FmtSubscriber::builder()
        .with_writer(std::io::stderr)
        .with_env_filter(filter)
        .with_ansi(std::io::stderr().is_terminal())
        .init();
}

/// Frame timestamps in milliseconds since the clock was started.
///
/// Every timestamp is strictly greater than the one before it, even when
/// frames run faster than the clock resolution. This holds separately for
/// fractional ([`FrameClock::tick`]) and whole ([`FrameClock::tick_whole`])
/// timestamps.
#[derive(Debug)]
pub struct FrameClock {
    start: Instant,
    last: Option<f64>,
    last_whole: Option<i64>,
}

impl FrameClock {
    /// Starts the clock.
    pub fn new() -> Self {
        Self {
            start: Instant::now(),
            last: None,
            last_whole: None,
        }
    }

    /// Timestamp for the next frame.
    pub fn tick(&mut self) -> f64 {
        let now = self.start.elapsed().as_secs_f64() * 1000.0;
        let now = match self.last {
            Some(last) if now <= last => last + 0.001,
            _ => now,
        };
        self.last = Some(now);
        now
    }

    /// Timestamp for the next frame, rounded up to a whole millisecond.
    pub fn tick_whole(&mut self) -> i64 {
        let now = self.tick().ceil() as i64;
        let now = match self.last_whole {
            Some(last) if now <= last => last + 1,
            _ => now,
        };
        self.last_whole = Some(now);
        now
    }
}

/// Takes the next timestamp from `clock` as the parameters a frame callback
/// takes.
///
/// A callback may take no parameters or a single numeric timestamp. Integer
/// timestamps are whole milliseconds and still strictly increase.
pub fn timestamp_params(params: &[ValType], clock: &mut FrameClock) -> Result<Vec<Val>> {
    let val = match params {
        [] => {
            clock.tick();
            return Ok(Vec::new());
        }
        [ValType::F64] => Val::F64(clock.tick().to_bits()),
        [ValType::F32] => Val::F32((clock.tick() as f32).to_bits()),
        [ValType::I32] => {
            let now = clock.tick_whole();
            Val::I32(i32::try_from(now).with_context(|| format!("timestamp {now} overflows i32"))?)
        }
        [ValType::I64] => Val::I64(clock.tick_whole()),
        _ => bail!("frame callback must take no parameters or one numeric timestamp"),
    };
    Ok(vec![val])
}
