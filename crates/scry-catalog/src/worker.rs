//! Background catalog construction.
//!
//! One build per settings reload, running on its own worker thread. The
//! driving loop polls the handle once per tick; a finished catalog is
//! published as an `Arc` and treated as read-only from then on.
//! Cancellation is explicit (a new reload) and cooperative: the scan
//! checks the token between types.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::sync::Arc;
use std::thread;

use scry_common::settings::Settings;
use scry_registry::Registry;

use crate::Catalog;

/// Cooperative cancellation flag shared with the build thread.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }
}

/// Poll result of an in-flight build.
#[derive(Debug)]
pub enum BuildPoll {
    /// Still scanning; dependent operations report "not ready".
    Pending,
    /// Finished; the catalog is now immutable and shareable.
    Ready(Arc<Catalog>),
    /// The build was cancelled (or its thread went away). Retry by
    /// spawning a new build.
    Cancelled,
}

/// Handle to one in-flight background build.
pub struct CatalogBuild {
    cancel: CancelToken,
    rx: Receiver<Option<Catalog>>,
    finished: bool,
}

impl CatalogBuild {
    /// Cancel the in-flight scan. The thread notices at its next
    /// per-type check.
    pub fn cancel(&self) {
        self.cancel.cancel();
    }

    /// Non-blocking progress check. Call once per tick.
    pub fn poll(&mut self) -> BuildPoll {
        if self.finished {
            return BuildPoll::Cancelled;
        }
        match self.rx.try_recv() {
            Ok(Some(catalog)) => {
                self.finished = true;
                BuildPoll::Ready(Arc::new(catalog))
            }
            Ok(None) => {
                self.finished = true;
                BuildPoll::Cancelled
            }
            Err(TryRecvError::Empty) => BuildPoll::Pending,
            Err(TryRecvError::Disconnected) => {
                self.finished = true;
                BuildPoll::Cancelled
            }
        }
    }
}

/// Spawn a catalog build on a worker thread.
pub fn spawn_build(registry: Arc<Registry>, settings: Settings) -> CatalogBuild {
    let cancel = CancelToken::new();
    let token = cancel.clone();
    let (tx, rx) = mpsc::channel();
    thread::Builder::new()
        .name("scry-catalog-build".to_string())
        .spawn(move || {
            let catalog = crate::build(&registry, &settings, &token);
            // The receiver may be gone if the console shut down; nothing
            // to do about it.
            let _ = tx.send(catalog);
        })
        .expect("spawn catalog build thread");
    CatalogBuild { cancel, rx, finished: false }
}
