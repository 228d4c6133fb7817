//! The module that implements the `jtl run` command.

use crate::common::{FrameClock, Host, init_logging, timestamp_params};
use crate::config::RunnerConfig;
use anyhow::{Context as _, Result, bail};
use clap::Parser;
use jtl_webgl::GraphicsApi;
use std::path::PathBuf;
use std::thread;
use std::time::Duration;
use wasmtime::{Engine, Func, Instance, Linker, Module, Store, Val};

fn parse_module(s: &str) -> Result<PathBuf, String> {
    // Do not accept jtl subcommand names as the module name
    match s {
        "help" | "config" | "run" => Err("module name cannot be the same as a subcommand".into()),
        _ => Ok(s.into()),
    }
}

fn parse_viewport(s: &str) -> Result<(u32, u32)> {
    let Some((width, height)) = s.split_once('x') else {
        bail!("must be of the form `WIDTHxHEIGHT`");
    };
    Ok((width.trim().parse()?, height.trim().parse()?))
}

/// Runs a WebAssembly module against the graphics and console bindings
#[derive(Parser)]
pub struct RunCommand {
    /// Read `[runner]` settings from this file
    #[arg(long, value_name = "CONFIG_PATH")]
    config: Option<PathBuf>,

    /// Number of frames to run after `enter`
    #[arg(long, value_name = "N")]
    frames: Option<u32>,

    /// Time between frames, e.g. `16ms` or `1s`
    #[arg(long, value_name = "DURATION", value_parser = humantime::parse_duration)]
    frame_interval: Option<Duration>,

    /// Import module name of the graphics bindings
    #[arg(long, value_name = "NAME")]
    webgl_module: Option<String>,

    /// Import module name of the console bindings
    #[arg(long, value_name = "NAME")]
    console_module: Option<String>,

    /// Viewport size issued before `enter`
    #[arg(long, value_name = "WIDTHxHEIGHT", value_parser = parse_viewport)]
    viewport: Option<(u32, u32)>,

    /// Do not define GL enumerants as globals
    #[arg(long)]
    no_constants: bool,

    /// Disable logging, including guest console output
    #[arg(short, long)]
    quiet: bool,

    /// The path of the WebAssembly module to run, in binary or text format
    #[arg(required = true, value_name = "WASM", value_parser = parse_module)]
    module: PathBuf,
}

impl RunCommand {
    /// Executes the command.
    pub fn execute(self) -> Result<()> {
        init_logging(self.quiet);
        let config = self.runner_config()?;

        let engine = Engine::default();
        let module = Module::from_file(&engine, &self.module)
            .with_context(|| format!("failed to load module: {}", self.module.display()))?;

        let mut linker = Linker::new(&engine);
        let mut store = Store::new(&engine, Host::new());
        store
            .data_mut()
            .webgl
            .export_bindings(&mut linker, config.webgl_module(), Host::webgl)?;
        store
            .data_mut()
            .console
            .export_bindings(&mut linker, config.console_module(), Host::console)?;
        if config.define_constants() {
            jtl_webgl::define_constants(&mut linker, &mut store, config.webgl_module())?;
        }

        let instance = linker
            .instantiate(&mut store, &module)
            .with_context(|| format!("failed to instantiate {:?}", self.module))?;
        let memory = instance
            .get_memory(&mut store, config.memory_export())
            .with_context(|| {
                format!(
                    "module does not export a memory named `{}`",
                    config.memory_export()
                )
            })?;
        store.data_mut().activate(memory)?;

        let (width, height) = config.viewport();
        GraphicsApi::viewport(store.data_mut().webgl.api_mut(), 0, 0, width, height);

        let enter = export_func(&mut store, &instance, config.enter_export())?;
        call(&mut store, enter, &[]).context("failed to run `enter`")?;

        run_frames(&mut store, &instance, &config)?;

        let stats = store.data().webgl.api().stats();
        tracing::info!(
            frames = config.frames(),
            draw_calls = stats.draw_calls,
            vertices = stats.vertices,
            clears = stats.clears,
            uploads = stats.uploads,
            lookups = stats.lookups,
            objects = store.data().webgl.objects().len(),
            "finished"
        );
        Ok(())
    }

    fn runner_config(&self) -> Result<RunnerConfig> {
        let mut config = RunnerConfig::from_file(self.config.as_deref())?;
        if let Some(frames) = self.frames {
            config.with_frames(frames);
        }
        if let Some(interval) = self.frame_interval {
            config.with_frame_interval(interval);
        }
        if let Some(name) = &self.webgl_module {
            config.with_webgl_module(name);
        }
        if let Some(name) = &self.console_module {
            config.with_console_module(name);
        }
        if let Some((width, height)) = self.viewport {
            config.with_viewport(width, height);
        }
        if self.no_constants {
            config.with_define_constants(false);
        }
        config.validated()
    }
}

/// Calls `step` once per frame with a strictly increasing timestamp.
fn run_frames(store: &mut Store<Host>, instance: &Instance, config: &RunnerConfig) -> Result<()> {
    if config.frames() == 0 {
        return Ok(());
    }
    let step = export_func(&mut *store, instance, config.step_export())?;
    let params = step.ty(&*store).params().collect::<Vec<_>>();
    let mut clock = FrameClock::new();
    for frame in 0..config.frames() {
        let args = timestamp_params(&params, &mut clock)
            .with_context(|| format!("bad signature for `{}`", config.step_export()))?;
        tracing::trace!(frame, ?args, "step");
        call(&mut *store, step, &args).with_context(|| format!("failed to run frame {frame}"))?;
        if frame + 1 < config.frames() && !config.frame_interval().is_zero() {
            thread::sleep(config.frame_interval());
        }
    }
    Ok(())
}

fn export_func(store: &mut Store<Host>, instance: &Instance, name: &str) -> Result<Func> {
    instance
        .get_func(store, name)
        .with_context(|| format!("module does not export a function named `{name}`"))
}

// Results are ignored; only the side effects on the host matter.
fn call(store: &mut Store<Host>, func: Func, args: &[Val]) -> Result<()> {
    let mut results = vec![Val::I32(0); func.ty(&*store).results().len()];
    func.call(store, args, &mut results)
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn viewport_argument() {
        assert_eq!(parse_viewport("640x480").unwrap(), (640, 480));
        assert!(parse_viewport("640").is_err());
        assert!(parse_viewport("640xtall").is_err());
    }

    #[test]
    fn subcommand_names_are_not_modules() {
        assert!(parse_module("run").is_err());
        assert!(parse_module("config").is_err());
        assert_eq!(
            parse_module("guest.wat").unwrap(),
            PathBuf::from("guest.wat")
        );
    }
}
