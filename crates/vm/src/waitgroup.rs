//! The wait-group: a counter that goroutine completions count down and
//! `waitGroupWait` blocks on.
//!
//! All state sits behind one lock so that a completion and a waiter's
//! check of the counter can never interleave: a waiter that observes zero
//! has observed every completion that produced it.

use crate::error::RuntimeError;
use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct WaitState {
    counter: i64,
    /// The main program is blocked in `wait`.
    main_waiting: bool,
    /// Goroutines started and not yet finished.
    running: usize,
    /// Running goroutines currently blocked in `wait`.
    blocked: usize,
    /// The main program has finished and can no longer move the counter.
    closed: bool,
}

impl WaitState {
    /// Execution contexts that can still change the counter.
    fn live(&self) -> usize {
        let main = usize::from(!self.closed && !self.main_waiting);
        self.running.saturating_sub(self.blocked) + main
    }
}

/// The kind of execution context making a call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Context {
    Main,
    Goroutine,
}

/// Counter plus block-until-zero.
#[derive(Debug, Default)]
pub struct WaitGroup {
    state: Mutex<WaitState>,
    wake: Condvar,
}

impl WaitGroup {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `delta` to the counter and return the new value.
    pub fn add(&self, delta: i64) -> Result<i64, RuntimeError> {
        let mut state = self.state.lock();
        let counter = state.counter.saturating_add(delta);
        if counter < 0 {
            return Err(RuntimeError::WaitGroupMisuse { counter });
        }
        state.counter = counter;
        if counter == 0 {
            self.wake.notify_all();
        }
        Ok(counter)
    }

    /// Block the main program until the counter is zero.
    pub fn wait(&self) -> Result<(), RuntimeError> {
        self.wait_as(Context::Main)
    }

    /// Block until the counter is zero.
    ///
    /// Fails with `Deadlock` if the counter is positive and every context
    /// that could bring it down is itself blocked here or gone.
    pub fn wait_as(&self, context: Context) -> Result<(), RuntimeError> {
        let mut state = self.state.lock();
        match context {
            Context::Main => state.main_waiting = true,
            Context::Goroutine => state.blocked += 1,
        }
        let mut outcome = Ok(());
        while state.counter > 0 {
            if state.live() == 0 {
                outcome = Err(RuntimeError::Deadlock {
                    counter: state.counter,
                });
                break;
            }
            self.wake.wait(&mut state);
        }
        match context {
            Context::Main => state.main_waiting = false,
            Context::Goroutine => state.blocked = state.blocked.saturating_sub(1),
        }
        // Other waiters re-check against the new set of live contexts.
        self.wake.notify_all();
        outcome
    }

    /// Record that the main program finished. Goroutines still waiting
    /// with nothing left to release them fail with `Deadlock`.
    pub(crate) fn close(&self) {
        self.state.lock().closed = true;
        self.wake.notify_all();
    }

    /// Record that a goroutine is about to start.
    pub(crate) fn started(&self) {
        self.state.lock().running += 1;
    }

    /// Record that a goroutine finished, successfully or not. The counter
    /// never drops below zero here.
    pub(crate) fn finished(&self) {
        let mut state = self.state.lock();
        state.running = state.running.saturating_sub(1);
        state.counter = (state.counter - 1).max(0);
        self.wake.notify_all();
    }

    /// Undo `started` for a goroutine whose thread never launched.
    pub(crate) fn abandoned(&self) {
        let mut state = self.state.lock();
        state.running = state.running.saturating_sub(1);
        self.wake.notify_all();
    }

    pub fn counter(&self) -> i64 {
        self.state.lock().counter
    }

    /// True while any context is blocked in `wait`.
    pub fn is_waiting(&self) -> bool {
        let state = self.state.lock();
        state.main_waiting || state.blocked > 0
    }

    pub fn running(&self) -> usize {
        self.state.lock().running
    }
}
