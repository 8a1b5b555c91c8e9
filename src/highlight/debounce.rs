//! Debounced re-scans after buffer mutations
//!
//! Each buffer owns a [`ScanState`] behind an `Rc`. The [`Debouncer`] only
//! holds `Weak` references to those states, so a buffer that is closed
//! while a re-scan is pending simply fails the upgrade when the deadline
//! arrives and the re-scan is dropped.

use std::cell::RefCell;
use std::rc::{Rc, Weak};
use std::time::{Duration, Instant};

use tracing::debug;

/// Identifies a buffer to the host
pub type BufferId = usize;

/// Per-buffer re-scan bookkeeping
#[derive(Debug)]
pub struct ScanState {
    buffer: BufferId,
    /// A re-scan is scheduled and has not fired yet
    pending: bool,
    /// Mutations folded into the pending re-scan
    mutations: usize,
}

/// Shared handle to a buffer's scan state
pub type SharedScanState = Rc<RefCell<ScanState>>;

impl ScanState {
    pub fn new(buffer: BufferId) -> Self {
        Self {
            buffer,
            pending: false,
            mutations: 0,
        }
    }

    /// Create a shared state for a newly opened buffer
    pub fn shared(buffer: BufferId) -> SharedScanState {
        Rc::new(RefCell::new(Self::new(buffer)))
    }

    pub fn buffer(&self) -> BufferId {
        self.buffer
    }

    #[cfg(test)]
    pub fn is_pending(&self) -> bool {
        self.pending
    }

    #[cfg(test)]
    pub fn mutations(&self) -> usize {
        self.mutations
    }
}

/// A scheduled re-scan
struct Scheduled {
    due: Instant,
    target: Weak<RefCell<ScanState>>,
}

impl Scheduled {
    fn is_for(&self, state: &SharedScanState) -> bool {
        std::ptr::eq(self.target.as_ptr(), Rc::as_ptr(state))
    }
}

/// Fire-once deferred re-scans with a fixed quiescence delay
pub struct Debouncer {
    delay: Duration,
    queue: Vec<Scheduled>,
}

impl Debouncer {
    pub const DEFAULT_DELAY: Duration = Duration::from_secs(3);

    pub fn new(delay: Duration) -> Self {
        Self {
            delay,
            queue: Vec::new(),
        }
    }

    #[cfg(test)]
    pub fn delay(&self) -> Duration {
        self.delay
    }

    /// Record a mutation of the buffer owning `state`
    ///
    /// Schedules a re-scan unless one is already pending; in that case the
    /// pending deadline moves so the re-scan trails the latest mutation.
    /// Returns true when a new re-scan was scheduled.
    pub fn notify(&mut self, state: &SharedScanState, now: Instant) -> bool {
        let due = now + self.delay;
        let mut scan = state.borrow_mut();
        scan.mutations += 1;

        if scan.pending {
            if let Some(entry) = self.queue.iter_mut().find(|e| e.is_for(state)) {
                entry.due = due;
                debug!(buffer = scan.buffer, mutations = scan.mutations, "re-scan already pending");
                return false;
            }
        }

        scan.pending = true;
        self.queue.push(Scheduled {
            due,
            target: Rc::downgrade(state),
        });
        debug!(buffer = scan.buffer, delay_ms = self.delay.as_millis() as u64, "re-scan scheduled");
        true
    }

    /// Drop any pending re-scan for `state`
    pub fn cancel(&mut self, state: &SharedScanState) {
        self.queue.retain(|e| !e.is_for(state));
        let mut scan = state.borrow_mut();
        scan.pending = false;
        scan.mutations = 0;
    }

    /// Earliest deadline in the queue
    pub fn next_deadline(&self) -> Option<Instant> {
        self.queue.iter().map(|e| e.due).min()
    }

    /// Time left until the earliest deadline
    pub fn time_until_next(&self, now: Instant) -> Option<Duration> {
        self.next_deadline().map(|due| due.saturating_duration_since(now))
    }

    /// Number of queued re-scans, live or not
    #[cfg(test)]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Fire every re-scan whose deadline has passed
    ///
    /// Returns the buffers that should be re-scanned now. Entries whose
    /// buffer has been dropped are discarded without firing.
    pub fn take_due(&mut self, now: Instant) -> Vec<BufferId> {
        let mut fired = Vec::new();

        self.queue.retain(|entry| {
            if entry.due > now {
                return true;
            }
            match entry.target.upgrade() {
                Some(state) => {
                    let mut scan = state.borrow_mut();
                    scan.pending = false;
                    scan.mutations = 0;
                    fired.push(scan.buffer);
                }
                None => debug!("buffer closed before re-scan, dropping"),
            }
            false
        });

        fired
    }
}

impl Default for Debouncer {
    fn default() -> Self {
        Self::new(Self::DEFAULT_DELAY)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn test_first_mutation_schedules() {
        let mut debouncer = Debouncer::new(ms(3000));
        let state = ScanState::shared(7);
        let t0 = Instant::now();

        assert!(debouncer.notify(&state, t0));
        assert!(state.borrow().is_pending());
        assert_eq!(debouncer.next_deadline(), Some(t0 + ms(3000)));
        assert_eq!(debouncer.time_until_next(t0 + ms(1000)), Some(ms(2000)));
    }

    #[test]
    fn test_not_due_before_delay() {
        let mut debouncer = Debouncer::new(ms(3000));
        let state = ScanState::shared(0);
        let t0 = Instant::now();

        debouncer.notify(&state, t0);
        assert!(debouncer.take_due(t0 + ms(2999)).is_empty());
        assert_eq!(debouncer.take_due(t0 + ms(3000)), vec![0]);
        assert!(!state.borrow().is_pending());
        assert_eq!(debouncer.queued(), 0);
    }

    #[test]
    fn test_mutations_collapse_into_one_trailing_rescan() {
        let mut debouncer = Debouncer::new(ms(3000));
        let state = ScanState::shared(1);
        let t0 = Instant::now();

        assert!(debouncer.notify(&state, t0));
        assert!(!debouncer.notify(&state, t0 + ms(1000)));
        assert!(!debouncer.notify(&state, t0 + ms(2000)));
        assert_eq!(debouncer.queued(), 1);
        assert_eq!(state.borrow().mutations(), 3);

        assert!(debouncer.take_due(t0 + ms(3000)).is_empty());
        assert_eq!(debouncer.take_due(t0 + ms(5000)), vec![1]);
        assert!(debouncer.take_due(t0 + ms(9000)).is_empty());
        assert_eq!(state.borrow().mutations(), 0);
    }

    #[test]
    fn test_closed_buffer_drops_pending_rescan() {
        let mut debouncer = Debouncer::new(ms(3000));
        let state = ScanState::shared(2);
        let t0 = Instant::now();

        for i in 0..5 {
            debouncer.notify(&state, t0 + ms(i * 100));
        }
        drop(state);

        assert!(debouncer.take_due(t0 + ms(10_000)).is_empty());
        assert_eq!(debouncer.queued(), 0);
    }

    #[test]
    fn test_buffers_are_independent() {
        let mut debouncer = Debouncer::new(ms(1000));
        let a = ScanState::shared(10);
        let b = ScanState::shared(11);
        let t0 = Instant::now();

        assert!(debouncer.notify(&a, t0));
        assert!(debouncer.notify(&b, t0 + ms(500)));
        assert_eq!(debouncer.take_due(t0 + ms(1000)), vec![10]);
        assert!(b.borrow().is_pending());
        assert_eq!(debouncer.take_due(t0 + ms(1500)), vec![11]);
    }

    #[test]
    fn test_cancel_clears_pending() {
        let mut debouncer = Debouncer::new(ms(1000));
        let state = ScanState::shared(3);
        let t0 = Instant::now();

        debouncer.notify(&state, t0);
        debouncer.cancel(&state);
        assert!(!state.borrow().is_pending());
        assert!(debouncer.take_due(t0 + ms(2000)).is_empty());

        assert!(debouncer.notify(&state, t0 + ms(3000)));
    }

    #[test]
    fn test_reschedules_after_firing() {
        let mut debouncer = Debouncer::new(ms(100));
        let state = ScanState::shared(4);
        let t0 = Instant::now();

        debouncer.notify(&state, t0);
        assert_eq!(debouncer.take_due(t0 + ms(100)), vec![4]);
        assert!(debouncer.notify(&state, t0 + ms(150)));
        assert_eq!(debouncer.take_due(t0 + ms(250)), vec![4]);
    }
}
