//! Synchronization primitives
//!
//! This module provides the two primitives the match protocol is built on:
//! a mutual-exclusion cell guarding the shared match state, and counting
//! semaphore gates for the start/end rendezvous.
//!
//! # Design
//!
//! All shared-state access goes through [`GuardedState`], which hands out a
//! scoped guard: the lock is released on every exit path, including panics
//! and early returns. The cell also carries a condition variable so that
//! team-formation events can wake the referee without unsynchronized reads.
//!
//! [`Gate`] is a counting semaphore that starts with zero permits. Waiters
//! block until a permit exists; the releaser adds permits one at a time.
//! Exactly one entity (the referee) ever posts to a gate, while many
//! entities wait on it.
//!
//! Failures are not recovered from: a poisoned lock means some participant
//! crashed inside a critical section, and the error is propagated so the
//! owning entity can terminate. There is no timeout or cancellation path on
//! gate waits.

use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;
use thiserror::Error;

/// Errors raised by the synchronization primitives
///
/// These are always fatal for the entity that observes them. A poisoned
/// primitive means another participant panicked while holding the lock or
/// manipulating the gate, and the protocol cannot make progress.
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum SyncError {
    /// The shared-state mutex was poisoned by a crashed participant
    #[error("shared state lock poisoned: a participant crashed inside a critical section")]
    StatePoisoned,

    /// A gate's internal lock was poisoned by a crashed participant
    #[error("gate '{0}' poisoned: a participant crashed while waiting or signaling")]
    GatePoisoned(&'static str),
}

/// Mutual-exclusion cell for shared coordination state
///
/// Wraps a value so that it can only be reached through a scoped lock guard.
/// The guard releases the lock when dropped, on every exit path. The cell is
/// non-reentrant: a thread that already holds the guard must not call
/// [`GuardedState::lock`] again, and the protocol never does.
///
/// A condition variable is attached so writers can signal interested waiters
/// after a mutation (used to wake the referee on team formation). Waiting
/// through [`GuardedState::wait_timeout`] atomically releases the lock while
/// parked, so no waiter ever blocks other critical sections.
pub struct GuardedState<T> {
    cell: Mutex<T>,
    changed: Condvar,
}

impl<T> GuardedState<T> {
    /// Create a new cell around `value`
    pub fn new(value: T) -> Self {
        Self {
            cell: Mutex::new(value),
            changed: Condvar::new(),
        }
    }

    /// Acquire the lock, blocking until this thread is the sole holder
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::StatePoisoned`] if a participant panicked while
    /// holding the lock. The protocol treats this as fatal.
    pub fn lock(&self) -> Result<MutexGuard<'_, T>, SyncError> {
        self.cell.lock().map_err(|_| SyncError::StatePoisoned)
    }

    /// Wake every thread parked in [`GuardedState::wait_timeout`]
    ///
    /// Callers should hold the guard while performing the mutation the
    /// notification is about, but the notification itself does not require
    /// the lock.
    pub fn notify_all(&self) {
        self.changed.notify_all();
    }

    /// Park on the condition variable, releasing the guard while parked
    ///
    /// Returns the re-acquired guard once notified or after `timeout`.
    /// Callers re-check their predicate in a loop; the timeout bounds how
    /// stale a missed wakeup can leave them.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::StatePoisoned`] if the lock was poisoned while
    /// this thread was parked.
    pub fn wait_timeout<'a>(
        &self,
        guard: MutexGuard<'a, T>,
        timeout: Duration,
    ) -> Result<MutexGuard<'a, T>, SyncError> {
        self.changed
            .wait_timeout(guard, timeout)
            .map(|(guard, _)| guard)
            .map_err(|_| SyncError::StatePoisoned)
    }
}

/// Counting-semaphore gate for a phase rendezvous
///
/// A gate starts with zero permits, so every waiter blocks until the
/// releaser has posted. Each [`Gate::wait`] consumes exactly one permit;
/// each [`Gate::post`] adds exactly one. Releasing a whole phase is done
/// with [`Gate::post_many`], which performs one single-unit post per seat.
pub struct Gate {
    name: &'static str,
    permits: Mutex<u32>,
    available: Condvar,
}

impl Gate {
    /// Create a gate with zero permits
    pub fn new(name: &'static str) -> Self {
        Self {
            name,
            permits: Mutex::new(0),
            available: Condvar::new(),
        }
    }

    /// The gate's name, used in diagnostics
    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Block until a permit is available, then consume it
    ///
    /// There is no timeout: a waiter whose releaser never posts waits
    /// indefinitely.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::GatePoisoned`] if a participant panicked while
    /// holding the gate's internal lock.
    pub fn wait(&self) -> Result<(), SyncError> {
        let mut permits = self
            .permits
            .lock()
            .map_err(|_| SyncError::GatePoisoned(self.name))?;
        while *permits == 0 {
            permits = self
                .available
                .wait(permits)
                .map_err(|_| SyncError::GatePoisoned(self.name))?;
        }
        *permits -= 1;
        Ok(())
    }

    /// Add one permit, releasing at most one waiter
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::GatePoisoned`] if the gate's internal lock was
    /// poisoned.
    pub fn post(&self) -> Result<(), SyncError> {
        let mut permits = self
            .permits
            .lock()
            .map_err(|_| SyncError::GatePoisoned(self.name))?;
        *permits += 1;
        drop(permits);
        self.available.notify_one();
        Ok(())
    }

    /// Post `seats` permits as repeated single-unit signals
    ///
    /// Used by the releaser to open the gate for an entire phase: one post
    /// per expected waiter.
    ///
    /// # Errors
    ///
    /// Returns [`SyncError::GatePoisoned`] on the first failing post.
    pub fn post_many(&self, seats: u32) -> Result<(), SyncError> {
        for _ in 0..seats {
            self.post()?;
        }
        Ok(())
    }

    /// Current permit count (observational; racy outside tests)
    pub fn permits(&self) -> Result<u32, SyncError> {
        self.permits
            .lock()
            .map(|permits| *permits)
            .map_err(|_| SyncError::GatePoisoned(self.name))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;
    use std::time::Instant;

    #[test]
    fn test_guarded_state_serializes_increments() {
        let cell = Arc::new(GuardedState::new(0u64));
        let mut handles = Vec::new();

        for _ in 0..8 {
            let cell = Arc::clone(&cell);
            handles.push(thread::spawn(move || {
                for _ in 0..1000 {
                    let mut value = cell.lock().unwrap();
                    *value += 1;
                }
            }));
        }
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*cell.lock().unwrap(), 8000);
    }

    #[test]
    fn test_guarded_state_reports_poison() {
        let cell = Arc::new(GuardedState::new(0u64));
        let poisoner = Arc::clone(&cell);

        let result = thread::spawn(move || {
            let _guard = poisoner.lock().unwrap();
            panic!("simulated crash inside critical section");
        })
        .join();
        assert!(result.is_err());

        assert_eq!(cell.lock().unwrap_err(), SyncError::StatePoisoned);
    }

    #[test]
    fn test_wait_timeout_returns_without_notify() {
        let cell = GuardedState::new(1u32);
        let guard = cell.lock().unwrap();

        let start = Instant::now();
        let guard = cell
            .wait_timeout(guard, Duration::from_millis(20))
            .unwrap();
        assert!(start.elapsed() >= Duration::from_millis(20));
        assert_eq!(*guard, 1);
    }

    #[test]
    fn test_notify_wakes_waiter() {
        let cell = Arc::new(GuardedState::new(false));
        let writer = Arc::clone(&cell);

        let waiter = thread::spawn(move || {
            let mut ready = cell.lock().unwrap();
            while !*ready {
                ready = cell.wait_timeout(ready, Duration::from_secs(5)).unwrap();
            }
        });

        thread::sleep(Duration::from_millis(10));
        *writer.lock().unwrap() = true;
        writer.notify_all();

        waiter.join().unwrap();
    }

    #[test]
    fn test_gate_starts_closed() {
        let gate = Gate::new("start");
        assert_eq!(gate.permits().unwrap(), 0);
    }

    #[test]
    fn test_gate_wait_blocks_until_post() {
        let gate = Arc::new(Gate::new("start"));
        let waiter_gate = Arc::clone(&gate);

        let waiter = thread::spawn(move || {
            waiter_gate.wait().unwrap();
        });

        // Give the waiter time to park before releasing it.
        thread::sleep(Duration::from_millis(10));
        gate.post().unwrap();

        waiter.join().unwrap();
        assert_eq!(gate.permits().unwrap(), 0);
    }

    #[test]
    fn test_post_many_releases_exactly_that_many() {
        let gate = Arc::new(Gate::new("end"));
        let released = Arc::new(GuardedState::new(0u32));
        let mut handles = Vec::new();

        for _ in 0..4 {
            let gate = Arc::clone(&gate);
            let released = Arc::clone(&released);
            handles.push(thread::spawn(move || {
                gate.wait().unwrap();
                *released.lock().unwrap() += 1;
            }));
        }

        gate.post_many(4).unwrap();
        for handle in handles {
            handle.join().unwrap();
        }

        assert_eq!(*released.lock().unwrap(), 4);
        assert_eq!(gate.permits().unwrap(), 0);
    }

    #[test]
    fn test_post_before_wait_is_not_lost() {
        let gate = Gate::new("start");
        gate.post().unwrap();
        // A permit posted before anyone waits is consumed by the next waiter.
        gate.wait().unwrap();
        assert_eq!(gate.permits().unwrap(), 0);
    }
}
