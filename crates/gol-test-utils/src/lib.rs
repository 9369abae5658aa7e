//! Test utilities for Game of Life engine development.
//!
//! Provides an in-memory [`ImageStore`], pattern and random-world
//! fixtures, controllable backends, and helpers for reading the event
//! stream with timeouts.

#![forbid(unsafe_code)]
#![allow(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

pub mod fixtures;

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::{Duration, Instant};

use crossbeam_channel::{Receiver, RecvTimeoutError};
use gol_core::{Event, World};
use gol_engine::{ImageError, ImageStore};

pub use fixtures::{
    blinker, block, glider, random_world, FailingBackend, Gate, GatedBackend,
};

/// Default timeout used by the event helpers.
pub const EVENT_TIMEOUT: Duration = Duration::from_secs(10);

/// [`ImageStore`] backed by a `HashMap`.
///
/// Pre-populate inputs with [`insert`](Self::insert) or
/// [`insert_input`](Self::insert_input); inspect outputs with
/// [`saved`](Self::saved).
#[derive(Default)]
pub struct MemoryImageStore {
    images: Mutex<HashMap<String, Vec<u8>>>,
    saves: Mutex<Vec<String>>,
    fail_saves: AtomicBool,
}

impl MemoryImageStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store `world` under the input name a run of its size loads.
    pub fn with_input(world: &World) -> Self {
        let store = Self::new();
        store.insert_input(world);
        store
    }

    pub fn insert(&self, name: impl Into<String>, bytes: Vec<u8>) {
        self.images.lock().unwrap().insert(name.into(), bytes);
    }

    pub fn insert_input(&self, world: &World) {
        self.insert(
            format!("{}x{}", world.height(), world.width()),
            world.to_bytes(),
        );
    }

    /// Bytes stored under `name`.
    pub fn saved(&self, name: &str) -> Option<Vec<u8>> {
        self.images.lock().unwrap().get(name).cloned()
    }

    /// Names passed to `save`, in call order.
    pub fn save_log(&self) -> Vec<String> {
        self.saves.lock().unwrap().clone()
    }

    /// Make every subsequent `save` fail.
    pub fn fail_saves(&self, fail: bool) {
        self.fail_saves.store(fail, Ordering::SeqCst);
    }
}

impl ImageStore for MemoryImageStore {
    fn load(&self, name: &str, height: usize, width: usize) -> Result<Vec<u8>, ImageError> {
        let bytes = self
            .images
            .lock()
            .unwrap()
            .get(name)
            .cloned()
            .ok_or_else(|| ImageError::NotFound { name: name.into() })?;
        if bytes.len() != height * width {
            return Err(ImageError::SizeMismatch {
                name: name.into(),
                expected: height * width,
                actual: bytes.len(),
            });
        }
        Ok(bytes)
    }

    fn save(
        &self,
        name: &str,
        _height: usize,
        _width: usize,
        bytes: &[u8],
    ) -> Result<(), ImageError> {
        if self.fail_saves.load(Ordering::SeqCst) {
            return Err(ImageError::Io {
                name: name.into(),
                source: std::io::Error::other("injected save failure"),
            });
        }
        self.saves.lock().unwrap().push(name.into());
        self.insert(name, bytes.to_vec());
        Ok(())
    }
}

/// Collect events until the sender side disconnects.
///
/// # Panics
///
/// Panics if the stream stays open longer than [`EVENT_TIMEOUT`].
pub fn drain_events(events: &Receiver<Event>) -> Vec<Event> {
    let deadline = Instant::now() + EVENT_TIMEOUT;
    let mut out = Vec::new();
    loop {
        match events.recv_deadline(deadline) {
            Ok(ev) => out.push(ev),
            Err(RecvTimeoutError::Disconnected) => return out,
            Err(RecvTimeoutError::Timeout) => {
                panic!("event stream still open after {EVENT_TIMEOUT:?}; got {out:?}")
            }
        }
    }
}

/// Receive events until one matches `pred`, returning everything
/// received including the match.
///
/// # Panics
///
/// Panics if no matching event arrives within [`EVENT_TIMEOUT`].
pub fn events_until<F>(events: &Receiver<Event>, mut pred: F) -> Vec<Event>
where
    F: FnMut(&Event) -> bool,
{
    let deadline = Instant::now() + EVENT_TIMEOUT;
    let mut out = Vec::new();
    loop {
        match events.recv_deadline(deadline) {
            Ok(ev) => {
                let done = pred(&ev);
                out.push(ev);
                if done {
                    return out;
                }
            }
            Err(e) => panic!("no matching event ({e:?}); got {out:?}"),
        }
    }
}

/// Number of events matching `pred`.
pub fn count<F: Fn(&Event) -> bool>(events: &[Event], pred: F) -> usize {
    events.iter().filter(|e| pred(e)).count()
}
