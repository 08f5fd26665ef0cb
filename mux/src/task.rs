//! Cooperative shutdown plumbing shared by the dispatcher and its
//! background tasks.
//!
//! Every background task spawned while evaluating a pipeline (child
//! waiters, stream pumps, the daemon signal watcher) registers with the
//! dispatcher's [`Tasks`] group and observes its [`Stop`] token:
//!
//! ```ignore
//! let stop = mux.stop.clone();
//! mux.tasks.spawn(move || {
//!     while !stop.is_tripped() {
//!         // ... one unit of work, or stop.wait(period) between units
//!     }
//! });
//! ```

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Condvar, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use nix::libc::c_int;
use nix::sys::signal::{self, SigHandler, Signal};

/// One-shot broadcast used to ask background tasks to wind down.
///
/// A fresh token is installed at the start of every top-level dispatch;
/// daemon supervision trips it on SIGTERM.
#[derive(Clone, Debug, Default)]
pub struct Stop {
    inner: Arc<StopInner>,
}

#[derive(Debug, Default)]
struct StopInner {
    tripped: AtomicBool,
    lock: Mutex<()>,
    cond: Condvar,
}

impl Stop {
    pub fn new() -> Self {
        Self::default()
    }

    /// Trip the token and wake every waiter. Idempotent.
    pub fn trip(&self) {
        self.inner.tripped.store(true, Ordering::SeqCst);
        let _guard = self.inner.lock.lock().unwrap();
        self.inner.cond.notify_all();
    }

    pub fn is_tripped(&self) -> bool {
        self.inner.tripped.load(Ordering::SeqCst)
    }

    /// Sleep for up to `timeout`, returning early when tripped.
    /// Returns true when the token has tripped.
    pub fn wait(&self, timeout: Duration) -> bool {
        let guard = self.inner.lock.lock().unwrap();
        if self.is_tripped() {
            return true;
        }
        let _unused = self
            .inner
            .cond
            .wait_timeout(guard, timeout)
            .unwrap();
        self.is_tripped()
    }
}

/// A joinable group of background threads.
///
/// The group owns the join handles; [`Tasks::wait`] drains them, including
/// any spawned while the drain is in progress.
#[derive(Clone, Default)]
pub struct Tasks {
    handles: Arc<Mutex<Vec<JoinHandle<()>>>>,
}

impl Tasks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn spawn<F>(&self, f: F)
    where
        F: FnOnce() + Send + 'static,
    {
        let handle = thread::spawn(f);
        self.handles.lock().unwrap().push(handle);
    }

    /// Join every registered task.
    pub fn wait(&self) {
        loop {
            let drained: Vec<JoinHandle<()>> =
                std::mem::take(&mut *self.handles.lock().unwrap());
            if drained.is_empty() {
                return;
            }
            for handle in drained {
                let _ = handle.join();
            }
        }
    }
}

// SIGTERM delivery is process-global; the flag below is the only global
// state, bridged into the dispatcher-scoped Stop token by the daemon
// supervisor.
static SIGTERM_SEEN: AtomicBool = AtomicBool::new(false);

extern "C" fn note_sigterm(_: c_int) {
    SIGTERM_SEEN.store(true, Ordering::SeqCst);
}

/// Install the SIGTERM handler for daemon supervision.
pub(crate) fn arm_sigterm() -> anyhow::Result<()> {
    SIGTERM_SEEN.store(false, Ordering::SeqCst);
    unsafe { signal::signal(Signal::SIGTERM, SigHandler::Handler(note_sigterm)) }?;
    Ok(())
}

pub(crate) fn sigterm_seen() -> bool {
    SIGTERM_SEEN.load(Ordering::SeqCst)
}

/// Restore the default SIGTERM disposition.
pub(crate) fn disarm_sigterm() {
    let _ = unsafe { signal::signal(Signal::SIGTERM, SigHandler::SigDfl) };
}
