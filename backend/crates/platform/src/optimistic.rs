//! Optimistic Update Helper
//!
//! Speculative local mutation reconciled against the authoritative result:
//! apply tentative state, issue the request, then either reconcile with the
//! server's truth or restore the prior state exactly.

/// A value with a committed version and a possibly tentative current version
#[derive(Debug, Clone)]
pub struct Optimistic<T: Clone> {
    committed: T,
    current: T,
    pending: bool,
}

impl<T: Clone> Optimistic<T> {
    pub fn new(committed: T) -> Self {
        Self {
            current: committed.clone(),
            committed,
            pending: false,
        }
    }

    /// Apply a tentative mutation on top of the current value
    ///
    /// If `mutate` fails, the current value is left as it was before the call.
    pub fn apply<E>(&mut self, mutate: impl FnOnce(&mut T) -> Result<(), E>) -> Result<&T, E> {
        let mut draft = self.current.clone();
        mutate(&mut draft)?;
        self.current = draft;
        self.pending = true;
        Ok(&self.current)
    }

    /// Accept the authoritative value from the store
    pub fn reconcile(&mut self, server_truth: T) -> &T {
        self.committed = server_truth.clone();
        self.current = server_truth;
        self.pending = false;
        &self.current
    }

    /// Discard tentative changes and restore the committed value
    pub fn rollback(&mut self) -> &T {
        self.current = self.committed.clone();
        self.pending = false;
        &self.current
    }

    /// Settle the tentative state with the outcome of the request
    pub fn settle<E>(&mut self, outcome: Result<T, E>) -> Result<&T, E> {
        match outcome {
            Ok(server_truth) => Ok(self.reconcile(server_truth)),
            Err(err) => {
                self.rollback();
                Err(err)
            }
        }
    }

    pub fn current(&self) -> &T {
        &self.current
    }

    pub fn committed(&self) -> &T {
        &self.committed
    }

    pub fn is_pending(&self) -> bool {
        self.pending
    }
}
