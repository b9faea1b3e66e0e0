//! Mock `PaymentLedger` implementations for tests.

use std::sync::Mutex;

use async_trait::async_trait;
use paygate_core::error::LedgerError;
use paygate_core::ledger::{LedgerChange, PaymentLedger};

/// A ledger that records every applied change and always succeeds.
#[derive(Debug, Default)]
pub struct RecordingLedger {
    applied: Mutex<Vec<LedgerChange>>,
}

impl RecordingLedger {
    /// Creates an empty recording ledger.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns a snapshot of all changes applied.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn applied(&self) -> Vec<LedgerChange> {
        self.applied.lock().unwrap().clone()
    }

    /// Number of changes applied.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentLedger for RecordingLedger {
    async fn apply(&self, change: LedgerChange) -> Result<(), LedgerError> {
        self.applied.lock().unwrap().push(change);
        Ok(())
    }
}

/// A ledger that always fails with the configured error.
#[derive(Debug)]
pub struct FailingLedger {
    error: LedgerError,
}

impl FailingLedger {
    /// Creates a ledger that fails every apply with `error`.
    #[must_use]
    pub fn new(error: LedgerError) -> Self {
        Self { error }
    }
}

#[async_trait]
impl PaymentLedger for FailingLedger {
    async fn apply(&self, _change: LedgerChange) -> Result<(), LedgerError> {
        Err(self.error.clone())
    }
}

/// A ledger that fails the first `failures` applies with `Unavailable`
/// and succeeds afterwards. Models a downstream outage that recovers
/// between deliveries.
#[derive(Debug)]
pub struct FlakyLedger {
    failures_remaining: Mutex<usize>,
    applied: Mutex<Vec<LedgerChange>>,
}

impl FlakyLedger {
    /// Creates a ledger whose first `failures` applies fail.
    #[must_use]
    pub fn new(failures: usize) -> Self {
        Self {
            failures_remaining: Mutex::new(failures),
            applied: Mutex::new(Vec::new()),
        }
    }

    /// Number of changes applied after the outage cleared.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned.
    #[must_use]
    pub fn applied_count(&self) -> usize {
        self.applied.lock().unwrap().len()
    }
}

#[async_trait]
impl PaymentLedger for FlakyLedger {
    async fn apply(&self, change: LedgerChange) -> Result<(), LedgerError> {
        {
            let mut remaining = self.failures_remaining.lock().unwrap();
            if *remaining > 0 {
                *remaining -= 1;
                return Err(LedgerError::Unavailable("simulated outage".into()));
            }
        }
        self.applied.lock().unwrap().push(change);
        Ok(())
    }
}
