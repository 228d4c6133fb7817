//! Module for configuring how `jtl run` drives a guest.

use anyhow::{Context, Result, anyhow, bail};
use log::{trace, warn};
use serde::{Deserialize, de::Deserializer};
use std::fmt::Debug;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

// wrapped, so the file has a named section
#[derive(serde_derive::Deserialize, Debug)]
#[serde(deny_unknown_fields)]
struct Config {
    #[serde(default)]
    runner: RunnerConfig,
}

/// Settings for the `run` command, read from the `[runner]` section.
#[derive(serde_derive::Deserialize, Debug, Clone, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct RunnerConfig {
    #[serde(default = "default_webgl_module", rename = "webgl-module")]
    webgl_module: String,
    #[serde(default = "default_console_module", rename = "console-module")]
    console_module: String,
    #[serde(default = "default_memory_export", rename = "memory-export")]
    memory_export: String,
    #[serde(default = "default_enter_export", rename = "enter-export")]
    enter_export: String,
    #[serde(default = "default_step_export", rename = "step-export")]
    step_export: String,
    #[serde(default = "default_frames")]
    frames: u32,
    #[serde(
        default = "default_frame_interval",
        rename = "frame-interval",
        deserialize_with = "deserialize_duration"
    )]
    frame_interval: Duration,
    #[serde(default = "default_define_constants", rename = "define-constants")]
    define_constants: bool,
    #[serde(default = "default_viewport_width", rename = "viewport-width")]
    viewport_width: u32,
    #[serde(default = "default_viewport_height", rename = "viewport-height")]
    viewport_height: u32,
}

impl Default for RunnerConfig {
    fn default() -> Self {
        Self {
            webgl_module: default_webgl_module(),
            console_module: default_console_module(),
            memory_export: default_memory_export(),
            enter_export: default_enter_export(),
            step_export: default_step_export(),
            frames: default_frames(),
            frame_interval: default_frame_interval(),
            define_constants: default_define_constants(),
            viewport_width: default_viewport_width(),
            viewport_height: default_viewport_height(),
        }
    }
}

const DEFAULT_CONFIG_FILE: &str = "jtl.toml";

/// Creates a new configuration file at the specified path, or `jtl.toml` in
/// the current directory if None is passed. Fails if the file already exists.
pub fn create_new_config<P: AsRef<Path> + Debug>(config_file: Option<P>) -> Result<PathBuf> {
    trace!("Creating new config file, path: {config_file:?}");

    let config_file = match config_file {
        Some(path) => path.as_ref().to_path_buf(),
        None => PathBuf::from(DEFAULT_CONFIG_FILE),
    };

    if config_file.exists() {
        bail!(
            "Configuration file '{}' already exists.",
            config_file.display()
        );
    }

    if let Some(parent_dir) = config_file.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent_dir).with_context(|| {
            format!(
                "Failed to create config directory, config path: {}",
                config_file.display(),
            )
        })?;
    }

    let content = "\
# Uncomment a setting to override its default value.

[runner]
# Import module names the guest uses for each surface.
# webgl-module = \"webgl\"
# console-module = \"console\"

# Exports the runner looks up after instantiation.
# memory-export = \"memory\"
# enter-export = \"enter\"
# step-export = \"step\"

# Frames to run after `enter`, and the time between them.
# frames = 60
# frame-interval = \"16ms\"

# Define GL enumerants such as VERTEX_SHADER as globals in the webgl module.
# define-constants = true

# viewport-width = 800
# viewport-height = 600
";

    fs::write(&config_file, content).with_context(|| {
        format!(
            "Failed to flush config to the disk, path: {}",
            config_file.display(),
        )
    })?;

    Ok(config_file)
}

fn default_webgl_module() -> String {
    "webgl".to_owned()
}
fn default_console_module() -> String {
    "console".to_owned()
}
fn default_memory_export() -> String {
    "memory".to_owned()
}
fn default_enter_export() -> String {
    "enter".to_owned()
}
fn default_step_export() -> String {
    "step".to_owned()
}
const fn default_frames() -> u32 {
    60
}
// roughly one display refresh at 60Hz
const fn default_frame_interval() -> Duration {
    Duration::from_millis(16)
}
const fn default_define_constants() -> bool {
    true
}
const fn default_viewport_width() -> u32 {
    800
}
const fn default_viewport_height() -> u32 {
    600
}

fn deserialize_duration<'de, D>(deserializer: D) -> Result<Duration, D::Error>
where
    D: Deserializer<'de>,
{
    let text = String::deserialize(deserializer)?;
    humantime::parse_duration(text.trim()).map_err(serde::de::Error::custom)
}

// The borrowed arm comes first: `&str` would also match `$setting_type:ty`.
macro_rules! generate_setting_getter {
    ($setting:ident: &$setting_type:ty) => {
        #[doc = concat!("Returns ", "`", stringify!($setting), "`.")]
        pub fn $setting(&self) -> &$setting_type {
            &self.$setting
        }
    };
    ($setting:ident: $setting_type:ty) => {
        #[doc = concat!("Returns ", "`", stringify!($setting), "`.")]
        pub fn $setting(&self) -> $setting_type {
            self.$setting
        }
    };
}

impl RunnerConfig {
    /// Creates the default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads the runner configuration from `config_file`, or returns the
    /// defaults when no file is given.
    ///
    /// # Errors
    ///
    /// Fails if the file cannot be read, is not valid TOML, contains unknown
    /// keys, or holds values outside their allowed range.
    pub fn from_file(config_file: Option<&Path>) -> Result<Self> {
        let Some(config_file) = config_file else {
            trace!("No config file given, using defaults");
            return Ok(Self::new());
        };
        let contents = fs::read_to_string(config_file)
            .with_context(|| format!("failed to read config file: {}", config_file.display()))?;
        let config = Self::from_toml(&contents)
            .with_context(|| format!("failed to parse config file: {}", config_file.display()))?;
        trace!("Loaded config from {}: {config:?}", config_file.display());
        Ok(config)
    }

    /// Parses and validates configuration text.
    pub fn from_toml(contents: &str) -> Result<Self> {
        let config = toml::from_str::<Config>(contents)?;
        let config = config.runner;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        for (key, value) in [
            ("webgl-module", &self.webgl_module),
            ("console-module", &self.console_module),
            ("memory-export", &self.memory_export),
            ("enter-export", &self.enter_export),
            ("step-export", &self.step_export),
        ] {
            if value.is_empty() {
                bail!("`{key}` must not be empty");
            }
        }
        if self.webgl_module == self.console_module {
            bail!(
                "`webgl-module` and `console-module` must differ, both are `{}`",
                self.webgl_module
            );
        }
        for (key, value) in [
            ("viewport-width", self.viewport_width),
            ("viewport-height", self.viewport_height),
        ] {
            i32::try_from(value).map_err(|_| anyhow!("`{key}` is too large: {value}"))?;
        }
        if self.frame_interval.is_zero() && self.frames > 0 {
            warn!("frame-interval is zero; frames will run back to back");
        }
        Ok(())
    }

    generate_setting_getter!(webgl_module: &str);
    generate_setting_getter!(console_module: &str);
    generate_setting_getter!(memory_export: &str);
    generate_setting_getter!(enter_export: &str);
    generate_setting_getter!(step_export: &str);
    generate_setting_getter!(frames: u32);
    generate_setting_getter!(frame_interval: Duration);
    generate_setting_getter!(define_constants: bool);

    /// Returns the viewport size as `(width, height)`.
    pub fn viewport(&self) -> (i32, i32) {
        // Both are checked to fit in `validate`.
        (
            i32::try_from(self.viewport_width).unwrap_or(i32::MAX),
            i32::try_from(self.viewport_height).unwrap_or(i32::MAX),
        )
    }

    /// Import module name for the graphics bindings.
    pub fn with_webgl_module(&mut self, name: impl Into<String>) -> &mut Self {
        self.webgl_module = name.into();
        self
    }

    /// Import module name for the console bindings.
    pub fn with_console_module(&mut self, name: impl Into<String>) -> &mut Self {
        self.console_module = name.into();
        self
    }

    /// Number of frames to run after `enter`.
    pub fn with_frames(&mut self, frames: u32) -> &mut Self {
        self.frames = frames;
        self
    }

    /// Time to wait between frames.
    pub fn with_frame_interval(&mut self, interval: Duration) -> &mut Self {
        self.frame_interval = interval;
        self
    }

    /// Whether GL enumerants are defined as globals.
    pub fn with_define_constants(&mut self, define: bool) -> &mut Self {
        self.define_constants = define;
        self
    }

    /// Viewport size issued before `enter`.
    pub fn with_viewport(&mut self, width: u32, height: u32) -> &mut Self {
        self.viewport_width = width;
        self.viewport_height = height;
        self
    }

    /// Re-checks the settings after overrides were applied.
    pub fn validated(self) -> Result<Self> {
        self.validate()?;
        Ok(self)
    }
}
