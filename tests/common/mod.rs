#![allow(dead_code)]

use holdpool::{Producer, Resource};
use parking_lot::Mutex;
use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

#[derive(Debug)]
pub struct TestError(pub &'static str);

impl fmt::Display for TestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl std::error::Error for TestError {}

/// Per-id release counts shared between a producer and its connections
#[derive(Clone, Default)]
pub struct Ledger {
    releases: Arc<Mutex<HashMap<usize, usize>>>,
}

impl Ledger {
    pub fn total(&self) -> usize {
        self.releases.lock().values().sum()
    }

    pub fn distinct(&self) -> usize {
        self.releases.lock().len()
    }

    pub fn count(&self, id: usize) -> usize {
        self.releases.lock().get(&id).copied().unwrap_or(0)
    }

    pub fn max_per_id(&self) -> usize {
        self.releases.lock().values().copied().max().unwrap_or(0)
    }
}

#[derive(Debug)]
pub struct Conn {
    pub id: usize,
    ledger: Ledger,
}

impl fmt::Debug for Ledger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Ledger")
    }
}

impl Resource for Conn {
    type Error = TestError;

    fn release(self) -> Result<(), Self::Error> {
        *self.ledger.releases.lock().entry(self.id).or_insert(0) += 1;
        Ok(())
    }
}

/// Hands out connections with increasing ids; optionally fails after a
/// number of successful productions.
pub struct CountingProducer {
    next: AtomicUsize,
    fail_after: Option<usize>,
    pub ledger: Ledger,
}

impl CountingProducer {
    pub fn new() -> Self {
        Self {
            next: AtomicUsize::new(0),
            fail_after: None,
            ledger: Ledger::default(),
        }
    }

    pub fn failing_after(count: usize) -> Self {
        Self {
            fail_after: Some(count),
            ..Self::new()
        }
    }

    pub fn produced(&self) -> usize {
        self.next.load(Ordering::SeqCst)
    }
}

impl Producer for CountingProducer {
    type Resource = Conn;
    type Error = TestError;

    fn produce(&self) -> Result<Conn, TestError> {
        if let Some(limit) = self.fail_after {
            if self.next.load(Ordering::SeqCst) >= limit {
                return Err(TestError("producer exhausted"));
            }
        }
        Ok(Conn {
            id: self.next.fetch_add(1, Ordering::SeqCst),
            ledger: self.ledger.clone(),
        })
    }
}
