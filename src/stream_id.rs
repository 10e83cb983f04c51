// src/stream_id.rs
//! Render stream identifiers.
//!
//! Every `WindowRenderer` gets its own `RenderStreamId`, which names its stream
//! inside the render backend. Ids come from a `StreamIdIssuer`: either the
//! process-wide one or an issuer injected by the caller.

use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};

/// Identifies one renderer's stream inside a render backend.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RenderStreamId(u64);

impl RenderStreamId {
    #[inline]
    pub fn get(self) -> u64 {
        self.0
    }
}

impl fmt::Display for RenderStreamId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Hands out strictly increasing, never reused stream ids.
#[derive(Debug)]
pub struct StreamIdIssuer {
    next: AtomicU64,
}

static GLOBAL_ISSUER: StreamIdIssuer = StreamIdIssuer::new();

impl StreamIdIssuer {
    pub const fn new() -> Self {
        Self::starting_at(0)
    }

    pub const fn starting_at(first: u64) -> Self {
        Self {
            next: AtomicU64::new(first),
        }
    }

    /// The issuer shared by every renderer in the process.
    pub fn global() -> &'static StreamIdIssuer {
        &GLOBAL_ISSUER
    }

    /// Issues the next id. A 64-bit counter does not wrap in practice.
    pub fn issue(&self) -> RenderStreamId {
        RenderStreamId(self.next.fetch_add(1, Ordering::Relaxed))
    }
}

impl Default for StreamIdIssuer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn ids_increase_in_issue_order() {
        let issuer = StreamIdIssuer::new();
        let ids: Vec<_> = (0..16).map(|_| issuer.issue()).collect();
        for pair in ids.windows(2) {
            assert!(pair[0] < pair[1], "{} should precede {}", pair[0], pair[1]);
        }
        assert_eq!(ids[0].get(), 0);
    }

    #[test]
    fn ids_are_unique_across_threads() {
        let issuer = Arc::new(StreamIdIssuer::starting_at(100));
        let handles: Vec<_> = (0..4)
            .map(|_| {
                let issuer = Arc::clone(&issuer);
                thread::spawn(move || (0..250).map(|_| issuer.issue()).collect::<Vec<_>>())
            })
            .collect();

        let mut seen = HashSet::new();
        for handle in handles {
            let ids = handle.join().expect("issuer thread panicked");
            for pair in ids.windows(2) {
                assert!(pair[0] < pair[1]);
            }
            for id in ids {
                assert!(seen.insert(id), "id {} issued twice", id);
            }
        }
        assert_eq!(seen.len(), 1000);
        assert!(seen.iter().all(|id| id.get() >= 100));
    }

    #[test]
    fn global_issuer_never_repeats() {
        let a = StreamIdIssuer::global().issue();
        let b = StreamIdIssuer::global().issue();
        assert!(a < b);
    }
}
