//! Background load controller.
//!
//! Script (re)loading and preset switching may block on file I/O and the
//! compiler, so they run on a dedicated worker thread. The audio thread
//! keeps driving the previously installed effect; installation of a newly
//! built one is just a swap under the effect lock. Requests are one slot
//! per kind, last writer wins; a failed load parks in a sticky retry state
//! instead of discarding the request.

use std::path::PathBuf;
use std::sync::Arc;
use std::sync::atomic::{AtomicU8, Ordering};
use std::thread::JoinHandle;

use parking_lot::{Condvar, Mutex};

use crate::compiler::ScriptCompiler;
use crate::effect::Effect;
use crate::environment::Environment;
use crate::loader::{LoadOptions, load_program};
use crate::state::SavedState;

/// Outcome state of the most recent load, sticky across failures.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryState {
    /// Last load succeeded (or nothing has been loaded).
    Ok,
    /// Last load failed; a retry is available.
    MustRetry,
    /// A retry has been requested and is in flight.
    Retrying,
    /// The retry also failed.
    FailedRetry,
}

impl RetryState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => RetryState::MustRetry,
            2 => RetryState::Retrying,
            3 => RetryState::FailedRetry,
            _ => RetryState::Ok,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            RetryState::Ok => 0,
            RetryState::MustRetry => 1,
            RetryState::Retrying => 2,
            RetryState::FailedRetry => 3,
        }
    }
}

/// A pending script load.
#[derive(Debug, Clone)]
pub struct LoadRequest {
    /// Script file to load.
    pub path: PathBuf,
    /// Loader switches.
    pub options: LoadOptions,
}

#[derive(Debug)]
struct Status {
    wakes: u32,
    busy: bool,
    quit: bool,
}

struct Shared {
    effect: Mutex<Effect>,
    load_slot: Mutex<Option<LoadRequest>>,
    state_slot: Mutex<Option<SavedState>>,
    last_failed: Mutex<Option<LoadRequest>>,
    retry: AtomicU8,
    status: Mutex<Status>,
    wake_cond: Condvar,
    idle_cond: Condvar,
}

/// Owns the worker thread and the installed effect.
pub struct LoadController {
    shared: Arc<Shared>,
    worker: Option<JoinHandle<()>>,
}

impl LoadController {
    /// Start a controller with an empty installed effect.
    pub fn new(env: Environment, compiler: Arc<dyn ScriptCompiler + Send + Sync>) -> Self {
        let shared = Arc::new(Shared {
            effect: Mutex::new(Effect::new()),
            load_slot: Mutex::new(None),
            state_slot: Mutex::new(None),
            last_failed: Mutex::new(None),
            retry: AtomicU8::new(RetryState::Ok.as_u8()),
            status: Mutex::new(Status {
                wakes: 0,
                busy: false,
                quit: false,
            }),
            wake_cond: Condvar::new(),
            idle_cond: Condvar::new(),
        });

        let worker_shared = Arc::clone(&shared);
        let worker = std::thread::Builder::new()
            .name("rsfx-loader".to_string())
            .spawn(move || worker_loop(&worker_shared, &env, &*compiler));

        Self {
            shared,
            // Spawn only fails on OS thread exhaustion; treat as no worker
            // and let requests sit unserviced rather than panic the host.
            worker: worker.ok(),
        }
    }

    /// Run `f` against the installed effect.
    ///
    /// The audio thread calls this once per block; the lock is only ever
    /// contended for the duration of an install swap or a preset apply.
    pub fn with_effect<R>(&self, f: impl FnOnce(&mut Effect) -> R) -> R {
        f(&mut self.shared.effect.lock())
    }

    /// Queue a script load, replacing any not-yet-serviced load request.
    pub fn request_load(&self, path: impl Into<PathBuf>, options: LoadOptions) {
        *self.shared.load_slot.lock() = Some(LoadRequest {
            path: path.into(),
            options,
        });
        self.wake();
    }

    /// Load a script and wait for the attempt to finish.
    pub fn load_sync(&self, path: impl Into<PathBuf>, options: LoadOptions) -> RetryState {
        self.request_load(path, options);
        self.wait_idle();
        self.retry_state()
    }

    /// Queue a saved state to apply to the installed effect, replacing any
    /// not-yet-serviced state request.
    pub fn request_state(&self, state: SavedState) {
        *self.shared.state_slot.lock() = Some(state);
        self.wake();
    }

    /// Apply a saved state and wait for it to be applied.
    pub fn load_state_sync(&self, state: SavedState) {
        self.request_state(state);
        self.wait_idle();
    }

    /// Current sticky load state.
    pub fn retry_state(&self) -> RetryState {
        RetryState::from_u8(self.shared.retry.load(Ordering::Acquire))
    }

    /// Re-submit the last failed load, if one is parked.
    pub fn request_retry(&self) {
        let Some(request) = self.shared.last_failed.lock().take() else {
            return;
        };
        self.shared
            .retry
            .store(RetryState::Retrying.as_u8(), Ordering::Release);
        *self.shared.load_slot.lock() = Some(request);
        self.wake();
    }

    /// Retry the last failed load and wait for the attempt to finish.
    pub fn retry_sync(&self) -> RetryState {
        self.request_retry();
        self.wait_idle();
        self.retry_state()
    }

    fn wake(&self) {
        let mut status = self.shared.status.lock();
        status.wakes += 1;
        self.shared.wake_cond.notify_one();
    }

    fn wait_idle(&self) {
        let mut status = self.shared.status.lock();
        while status.wakes > 0 || status.busy {
            self.shared.idle_cond.wait(&mut status);
        }
    }
}

impl Drop for LoadController {
    fn drop(&mut self) {
        {
            let mut status = self.shared.status.lock();
            status.quit = true;
            self.shared.wake_cond.notify_one();
        }
        if let Some(worker) = self.worker.take() {
            let _ = worker.join();
        }
    }
}

fn worker_loop(shared: &Shared, env: &Environment, compiler: &dyn ScriptCompiler) {
    loop {
        {
            let mut status = shared.status.lock();
            while status.wakes == 0 && !status.quit {
                shared.wake_cond.wait(&mut status);
            }
            if status.quit {
                return;
            }
            status.wakes -= 1;
            status.busy = true;
        }

        if let Some(request) = shared.load_slot.lock().take() {
            service_load(shared, env, compiler, request);
        }
        if let Some(state) = shared.state_slot.lock().take() {
            shared.effect.lock().load_state(&state);
        }

        let mut status = shared.status.lock();
        status.busy = false;
        shared.idle_cond.notify_all();
    }
}

fn service_load(
    shared: &Shared,
    env: &Environment,
    compiler: &dyn ScriptCompiler,
    request: LoadRequest,
) {
    let was_retrying =
        RetryState::from_u8(shared.retry.load(Ordering::Acquire)) == RetryState::Retrying;

    // All slow work happens before touching the installed effect.
    let built = load_program(&request.path, env, request.options).and_then(|program| {
        let mut effect = Effect::new();
        effect.load(program);
        effect.compile(compiler)?;
        Ok(effect)
    });

    match built {
        Ok(effect) => {
            *shared.effect.lock() = effect;
            shared
                .retry
                .store(RetryState::Ok.as_u8(), Ordering::Release);
            tracing::debug!(path = %request.path.display(), "effect installed");
        }
        Err(err) => {
            tracing::warn!(path = %request.path.display(), error = %err, "load failed");
            let next = if was_retrying {
                RetryState::FailedRetry
            } else {
                RetryState::MustRetry
            };
            *shared.last_failed.lock() = Some(request);
            shared.retry.store(next.as_u8(), Ordering::Release);
        }
    }
}
