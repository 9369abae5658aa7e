//! Fixed-capacity history of per-turn records.
//!
//! [`TurnRing`] keeps the last `capacity` records keyed by [`TurnId`].
//! Slot index is `turn % capacity`; each slot stores its turn tag next to
//! the record, so a lookup for an overwritten turn misses instead of
//! returning a newer record.

use std::sync::Arc;

use gol_core::TurnId;

/// A tagged slot: the turn the record was stored under.
type Slot<T> = Option<(TurnId, Arc<T>)>;

/// A fixed-capacity ring of `Arc<T>` records, one per turn.
///
/// Turns must be pushed in increasing order. [`clear`](Self::clear)
/// forgets everything, after which numbering may restart anywhere.
#[derive(Debug)]
pub struct TurnRing<T> {
    slots: Vec<Slot<T>>,
    newest: Option<TurnId>,
    len: usize,
}

impl<T> TurnRing<T> {
    /// Create an empty ring.
    ///
    /// # Panics
    ///
    /// Panics if `capacity < 2`.
    pub fn new(capacity: usize) -> Self {
        assert!(capacity >= 2, "TurnRing capacity must be >= 2, got {capacity}");
        Self {
            slots: (0..capacity).map(|_| None).collect(),
            newest: None,
            len: 0,
        }
    }

    fn index(&self, turn: TurnId) -> usize {
        turn.0 as usize % self.slots.len()
    }

    /// Store `record` for `turn`, returning the record it displaced.
    pub fn push(&mut self, turn: TurnId, record: T) -> Option<Arc<T>> {
        debug_assert!(
            self.newest.is_none_or(|n| turn > n),
            "turns must be pushed in increasing order"
        );
        let idx = self.index(turn);
        let evicted = self.slots[idx].replace((turn, Arc::new(record)));
        if evicted.is_none() {
            self.len += 1;
        }
        self.newest = Some(turn);
        evicted.map(|(_, record)| record)
    }

    /// The record stored for exactly `turn`, if still retained.
    pub fn get(&self, turn: TurnId) -> Option<Arc<T>> {
        match &self.slots[self.index(turn)] {
            Some((tag, record)) if *tag == turn => Some(Arc::clone(record)),
            _ => None,
        }
    }

    /// The most recently pushed record and its turn.
    pub fn latest(&self) -> Option<(TurnId, Arc<T>)> {
        let turn = self.newest?;
        self.get(turn).map(|record| (turn, record))
    }

    /// Drop every record.
    pub fn clear(&mut self) {
        self.slots.iter_mut().for_each(|s| *s = None);
        self.newest = None;
        self.len = 0;
    }

    /// Number of records currently stored (up to `capacity`).
    pub fn len(&self) -> usize {
        self.len
    }

    /// Whether the ring is empty.
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The ring capacity.
    pub fn capacity(&self) -> usize {
        self.slots.len()
    }
}
