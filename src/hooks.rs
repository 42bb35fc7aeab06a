//! Cleanup actions run once, newest first, when the process winds down

use std::any::type_name;
use std::fmt;
use std::panic::Location;

use parking_lot::Mutex;
use tracing::{debug, warn};

/// Initial room in the hook list; most programs register only a few.
const HOOK_CAPACITY: usize = 4;

type HookFn = Box<dyn FnOnce() -> anyhow::Result<()> + Send>;

struct Hook {
    name: String,
    run: HookFn,
}

/// An ordered registry of zero-argument cleanup actions.
///
/// Hooks run in the reverse of their registration order, each exactly once,
/// when [`finish`](#method.finish) is called. A failing hook is reported and
/// the remaining hooks still run.
pub struct ShutdownHooks {
    hooks: Mutex<Vec<Hook>>,
}

impl ShutdownHooks {
    pub fn new() -> Self {
        Self {
            hooks: Mutex::new(Vec::with_capacity(HOOK_CAPACITY)),
        }
    }

    /// Registers an infallible action, named after its type.
    pub fn at_close<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        self.push(type_name::<F>().to_string(), Box::new(move || {
            f();
            Ok(())
        }));
    }

    /// Registers a fallible action, named after its type.
    pub fn at_close_err<F, E>(&self, f: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        self.at_close_named(type_name::<F>(), f);
    }

    /// Registers a fallible action under an explicit name.
    pub fn at_close_named<F, E>(&self, name: impl Into<String>, f: F)
    where
        F: FnOnce() -> Result<(), E> + Send + 'static,
        E: Into<anyhow::Error> + 'static,
    {
        self.push(name.into(), Box::new(move || f().map_err(Into::into)));
    }

    fn push(&self, name: String, run: HookFn) {
        let mut hooks = self.hooks.lock();
        debug!(hook = %name, position = hooks.len(), "registered shutdown hook");
        hooks.push(Hook { name, run });
    }

    /// Number of hooks waiting to run.
    pub fn len(&self) -> usize {
        self.hooks.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.lock().is_empty()
    }

    /// Runs every registered hook, newest first, and returns how many ran.
    ///
    /// The list is taken out before any hook runs, so a hook may register
    /// new hooks without deadlocking; those wait for the next `finish`.
    /// Each failure is handed to `report` together with the hook's name.
    pub fn finish<R>(&self, mut report: R) -> usize
    where
        R: FnMut(&str, &anyhow::Error),
    {
        let hooks = std::mem::take(&mut *self.hooks.lock());
        let count = hooks.len();
        for hook in hooks.into_iter().rev() {
            if let Err(err) = (hook.run)() {
                report(&hook.name, &err);
            }
        }
        count
    }

    /// [`finish`](#method.finish), logging failures at `warn`.
    pub fn finish_logged(&self) -> usize {
        self.finish(|name, err| warn!(hook = name, error = %err, "shutdown hook failed"))
    }
}

impl Default for ShutdownHooks {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for ShutdownHooks {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let hooks = self.hooks.lock();
        f.debug_list().entries(hooks.iter().map(|h| &h.name)).finish()
    }
}

/// Runs a fallible close action whose error has nowhere to go, logging the
/// failure with the caller's location.
///
/// ```
/// use multi_chan::defer_error;
///
/// defer_error(|| std::fs::remove_file("/nonexistent/scratch"));
/// ```
#[track_caller]
pub fn defer_error<F, E>(f: F)
where
    F: FnOnce() -> Result<(), E>,
    E: fmt::Display,
{
    let caller = Location::caller();
    if let Err(err) = f() {
        warn!(
            file = caller.file(),
            line = caller.line(),
            error = %err,
            "deferred close failed (may be harmless)"
        );
    }
}
