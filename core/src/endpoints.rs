//! Candidate base URLs and the shared "current primary".
//!
//! # Design
//! The candidate list is fixed at construction: the configured primary at
//! index 0, then the fallbacks in declared order, with trailing slashes
//! trimmed and duplicates collapsed. The only mutable state is the index of
//! the current primary, an `AtomicUsize`, so a client can be cloned across
//! tasks and threads without a lock.
//!
//! Promotion is a compare-and-swap against the primary a call observed when
//! it started. A call that began before someone else promoted cannot undo
//! that newer promotion.

use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct EndpointSet {
    candidates: Vec<String>,
    primary: AtomicUsize,
}

impl EndpointSet {
    pub fn new<I, S>(primary: &str, fallbacks: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut candidates = vec![normalize(primary)];
        for url in fallbacks {
            let url = normalize(url.as_ref());
            if !url.is_empty() && !candidates.contains(&url) {
                candidates.push(url);
            }
        }
        Self {
            candidates,
            primary: AtomicUsize::new(0),
        }
    }

    /// Every distinct base URL, in declared order.
    pub fn candidates(&self) -> &[String] {
        &self.candidates
    }

    pub fn primary_index(&self) -> usize {
        self.primary.load(Ordering::Acquire)
    }

    /// Base URL the next call will try first.
    pub fn primary(&self) -> &str {
        &self.candidates[self.primary_index()]
    }

    /// Indices to attempt for a call that observed `primary`: that index
    /// first, then every other candidate in declared order.
    pub fn attempt_order(&self, primary: usize) -> Vec<usize> {
        std::iter::once(primary)
            .chain((0..self.candidates.len()).filter(|&i| i != primary))
            .collect()
    }

    /// Make `winner` the primary if the primary is still `observed`.
    ///
    /// Returns whether the swap happened.
    pub fn promote(&self, observed: usize, winner: usize) -> bool {
        if winner >= self.candidates.len() {
            return false;
        }
        self.primary
            .compare_exchange(observed, winner, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    /// Unconditionally make `url` the primary. Returns `false` when `url` is
    /// not one of the candidates.
    pub fn promote_url(&self, url: &str) -> bool {
        let url = normalize(url);
        match self.candidates.iter().position(|c| *c == url) {
            Some(index) => {
                self.primary.store(index, Ordering::Release);
                true
            }
            None => false,
        }
    }
}

fn normalize(url: &str) -> String {
    url.trim().trim_end_matches('/').to_string()
}
