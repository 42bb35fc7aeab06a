//! Runtime options shared by the recorders and the shutdown path
//!
//! [`Settings`] holds the plain values that can come from a TOML file or the
//! environment. [`Options`] adds the swappable diagnostic sink and
//! termination handler, plus the [`ShutdownHooks`] the default handler runs.
//! The application owns one `Options` and hands clones to whatever needs it;
//! nothing here is process-global.

use std::fmt;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use figment::providers::{Env, Format, Serialized, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::ConfigError;
use crate::hooks::ShutdownHooks;

pub const DEFAULT_OUTPUT_DIR: &str = ".output";
pub const DEFAULT_CSV_SEPARATOR: char = '\t';
pub const ENV_PREFIX: &str = "MULTICHAN_";

/// Exit code used by [`Options::handle_signal`].
pub const SIGNAL_EXIT_CODE: i32 = -2;

/// Formatted diagnostic writer. Returns the number of bytes written.
pub type PrintFn = Arc<dyn Fn(fmt::Arguments<'_>) -> io::Result<usize> + Send + Sync>;

/// Termination handler, called with the exit code.
pub type FatalFn = Arc<dyn Fn(i32) + Send + Sync>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub debug: bool,
    #[serde(default)]
    pub verbose: bool,
    /// Where recorders create their files. Must already exist.
    #[serde(default = "default_output_dir")]
    pub output_dir: PathBuf,
    #[serde(default = "default_csv_separator")]
    pub csv_separator: char,
}

fn default_output_dir() -> PathBuf {
    PathBuf::from(DEFAULT_OUTPUT_DIR)
}

fn default_csv_separator() -> char {
    DEFAULT_CSV_SEPARATOR
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            debug: false,
            verbose: false,
            output_dir: default_output_dir(),
            csv_separator: default_csv_separator(),
        }
    }
}

impl Settings {
    /// Defaults, then the TOML file at `path` (if given), then `MULTICHAN_*`
    /// environment variables.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut figment = Figment::from(Serialized::defaults(Settings::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        let settings = figment.merge(Env::prefixed(ENV_PREFIX)).extract()?;
        Ok(settings)
    }
}

/// The configuration object handed to collaborators.
#[derive(Clone)]
pub struct Options {
    settings: Settings,
    printf: PrintFn,
    // `None` runs the hooks through `finish_close` and exits.
    fatal: Option<FatalFn>,
    hooks: Arc<ShutdownHooks>,
}

impl Options {
    pub fn new(settings: Settings) -> Self {
        Self {
            settings,
            printf: Arc::new(stderr_printf),
            fatal: None,
            hooks: Arc::new(ShutdownHooks::new()),
        }
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn is_debug(&self) -> bool {
        self.settings.debug
    }

    pub fn is_verbose(&self) -> bool {
        self.settings.verbose
    }

    pub fn output_dir(&self) -> &Path {
        &self.settings.output_dir
    }

    pub fn csv_separator(&self) -> char {
        self.settings.csv_separator
    }

    pub fn hooks(&self) -> &Arc<ShutdownHooks> {
        &self.hooks
    }

    /// Each setter returns the value it replaced.
    pub fn set_debug(&mut self, debug: bool) -> bool {
        std::mem::replace(&mut self.settings.debug, debug)
    }

    pub fn set_verbose(&mut self, verbose: bool) -> bool {
        std::mem::replace(&mut self.settings.verbose, verbose)
    }

    pub fn set_output_dir(&mut self, dir: impl Into<PathBuf>) -> PathBuf {
        std::mem::replace(&mut self.settings.output_dir, dir.into())
    }

    pub fn set_printf(&mut self, printf: PrintFn) -> PrintFn {
        std::mem::replace(&mut self.printf, printf)
    }

    /// Installs a termination handler. Returns the previous one, or `None`
    /// if the default (run the hooks, then exit) was in place.
    pub fn set_fatal(&mut self, fatal: FatalFn) -> Option<FatalFn> {
        self.fatal.replace(fatal)
    }

    /// Writes to the diagnostic sink. Use with `format_args!`.
    pub fn printf(&self, args: fmt::Arguments<'_>) -> io::Result<usize> {
        (self.printf)(args)
    }

    /// Hands `code` to the termination handler.
    ///
    /// Without a handler installed this runs [`finish_close`], so hook
    /// failures go through the current diagnostic sink, then exits the
    /// process with `code`.
    ///
    /// [`finish_close`]: #method.finish_close
    pub fn fatal(&self, code: i32) {
        match &self.fatal {
            Some(fatal) => fatal(code),
            None => {
                let ran = self.finish_close();
                info!(code, hooks = ran, "terminating");
                std::process::exit(code)
            }
        }
    }

    /// Runs the shutdown hooks, reporting failures through the sink.
    pub fn finish_close(&self) -> usize {
        if self.settings.debug {
            let _ = self.printf(format_args!(
                "Number of shutdown hooks is {}\n",
                self.hooks.len()
            ));
        }
        self.hooks.finish(|name, err| {
            let _ = self.printf(format_args!(
                "shutdown hook {name} failed because {err}\n"
            ));
        })
    }

    /// Waits for the first signal on `signals`, reports it and calls the
    /// termination handler. Returns without terminating if the stream ends
    /// first.
    pub fn handle_signal<S, I>(&self, signals: I)
    where
        S: fmt::Debug,
        I: IntoIterator<Item = S>,
    {
        if let Some(signal) = signals.into_iter().next() {
            let _ = self.printf(format_args!("Got signal {signal:?}, exiting immediately\n"));
            self.fatal(SIGNAL_EXIT_CODE);
        }
    }
}

impl Default for Options {
    fn default() -> Self {
        Self::new(Settings::default())
    }
}

impl fmt::Debug for Options {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Options")
            .field("settings", &self.settings)
            .field("hooks", &self.hooks)
            .finish_non_exhaustive()
    }
}

fn stderr_printf(args: fmt::Arguments<'_>) -> io::Result<usize> {
    let text = args.to_string();
    io::stderr().lock().write_all(text.as_bytes())?;
    Ok(text.len())
}
