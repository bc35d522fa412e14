//! Background suggestion builds.
//!
//! One request in flight at a time: while a build runs, further requests
//! are refused rather than queued, and the caller retries on a later
//! keystroke. A delivery echoes the input and cursor it was computed for
//! so the caller can discard results the user has already typed past.

use std::sync::mpsc::{self, Receiver, TryRecvError};
use std::thread;

use crate::engine::{suggest, SuggestContext};
use crate::Suggestions;

/// A finished suggestion build, tagged with the request it answers.
#[derive(Debug)]
pub struct Delivered {
    pub input: String,
    pub cursor: usize,
    pub suggestions: Suggestions,
}

/// Single-flight suggestion worker.
#[derive(Default)]
pub struct SuggestWorker {
    inflight: Option<Receiver<Delivered>>,
}

impl SuggestWorker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_busy(&self) -> bool {
        self.inflight.is_some()
    }

    /// Start a build for `input` at `cursor`. Returns `false` without
    /// doing anything if a build is already in flight.
    pub fn request(&mut self, ctx: SuggestContext, input: &str, cursor: usize) -> bool {
        if self.inflight.is_some() {
            return false;
        }
        let (tx, rx) = mpsc::channel();
        let input = input.to_string();
        thread::Builder::new()
            .name("scry-suggest".to_string())
            .spawn(move || {
                let suggestions = suggest(&ctx, &input, cursor);
                // The receiver may be gone if the console shut down;
                // nothing to do about it.
                let _ = tx.send(Delivered { input, cursor, suggestions });
            })
            .expect("spawn suggestion thread");
        self.inflight = Some(rx);
        true
    }

    /// Non-blocking delivery check. Call once per tick. Clears the
    /// in-flight slot when the build finishes or its thread went away.
    pub fn poll(&mut self) -> Option<Delivered> {
        let rx = self.inflight.as_ref()?;
        match rx.try_recv() {
            Ok(delivered) => {
                self.inflight = None;
                Some(delivered)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => {
                self.inflight = None;
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use scry_catalog::{build as build_catalog, CancelToken};
    use scry_common::settings::Settings;
    use scry_resolve::Scope;

    fn context() -> SuggestContext {
        let demo = scry_registry::demo::build_demo();
        let settings = Settings {
            using_namespaces: vec!["Game".to_string()],
            ..Settings::default()
        };
        let catalog = build_catalog(&demo.registry, &settings, &CancelToken::new())
            .expect("uncancelled build completes");
        SuggestContext {
            registry: Arc::new(demo.registry),
            catalog: Arc::new(catalog),
            usings: settings.using_namespaces,
            safe_mode: true,
            globals: Arc::new(Vec::new()),
            scope: Scope::new(),
        }
    }

    fn wait(worker: &mut SuggestWorker) -> Delivered {
        for _ in 0..500 {
            match worker.poll() {
                Some(delivered) => return delivered,
                None if worker.is_busy() => thread::sleep(Duration::from_millis(2)),
                None => panic!("worker lost its in-flight build"),
            }
        }
        panic!("suggestion build did not finish in time");
    }

    #[test]
    fn delivery_echoes_the_request() {
        let mut worker = SuggestWorker::new();
        assert!(worker.request(context(), "Game.Pl", 7));
        let delivered = wait(&mut worker);
        assert_eq!(delivered.input, "Game.Pl");
        assert_eq!(delivered.cursor, 7);
        assert!(delivered
            .suggestions
            .candidates
            .iter()
            .any(|c| c.display == "Player"));
        assert!(!worker.is_busy());
    }

    #[test]
    fn second_request_is_refused_while_busy() {
        let mut worker = SuggestWorker::new();
        assert!(worker.request(context(), "Game.", 5));
        // No supersession: the slot stays taken until delivery.
        assert!(!worker.request(context(), "Game.Pl", 7));
        let delivered = wait(&mut worker);
        assert_eq!(delivered.input, "Game.");
        assert!(worker.request(context(), "Game.Pl", 7));
        wait(&mut worker);
    }
}
