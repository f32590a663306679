//! Local day/night countdown.
//!
//! The timer only approximates the server's phase clock: when it runs out it
//! flips the local [`PhaseStore`] and starts over, but it never ends a phase
//! on the server's behalf.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::{AbortHandle, JoinHandle};
use tokio::time::{Instant, interval_at};

/// Day or night.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phase {
    Day,
    Night,
}

impl Phase {
    pub fn flipped(self) -> Phase {
        match self {
            Phase::Day => Phase::Night,
            Phase::Night => Phase::Day,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Phase::Day => "Día",
            Phase::Night => "Noche",
        }
    }
}

// ---------------------------------------------------------------------------
// Phase store
// ---------------------------------------------------------------------------

/// Observable day/night flag. Dependents subscribe instead of polling.
#[derive(Clone)]
pub struct PhaseStore {
    tx: Arc<watch::Sender<Phase>>,
}

impl PhaseStore {
    pub fn new(initial: Phase) -> Self {
        let (tx, _rx) = watch::channel(initial);
        Self { tx: Arc::new(tx) }
    }

    pub fn get(&self) -> Phase {
        *self.tx.borrow()
    }

    /// Set the phase, notifying subscribers only when it actually changes.
    pub fn set(&self, phase: Phase) -> bool {
        self.tx.send_if_modified(|current| {
            if *current == phase {
                false
            } else {
                *current = phase;
                true
            }
        })
    }

    /// Flip the phase and return the new value.
    pub fn flip(&self) -> Phase {
        self.tx.send_modify(|current| *current = current.flipped());
        self.get()
    }

    pub fn subscribe(&self) -> watch::Receiver<Phase> {
        self.tx.subscribe()
    }
}

// ---------------------------------------------------------------------------
// Timer
// ---------------------------------------------------------------------------

/// Shared handle to the timer ceiling. The countdown reads it at rollover
/// time, so updates made while the driver runs take effect on the next lap.
#[derive(Debug, Clone)]
pub struct MaxHandle(Arc<AtomicU32>);

impl MaxHandle {
    pub fn get(&self) -> u32 {
        self.0.load(Ordering::Acquire)
    }

    pub fn set(&self, max: u32) {
        self.0.store(max.max(1), Ordering::Release);
    }
}

#[derive(Debug)]
pub struct PhaseTimer {
    remaining: u32,
    max: MaxHandle,
    active: bool,
}

impl PhaseTimer {
    /// A stopped timer with `max` seconds on the clock (at least one).
    pub fn new(max: u32) -> Self {
        let max = max.max(1);
        Self {
            remaining: max,
            max: MaxHandle(Arc::new(AtomicU32::new(max))),
            active: false,
        }
    }

    pub fn start(&mut self) {
        self.active = true;
    }

    pub fn stop(&mut self) {
        self.active = false;
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    pub fn remaining(&self) -> u32 {
        self.remaining
    }

    pub fn max(&self) -> u32 {
        self.max.get()
    }

    pub fn max_handle(&self) -> MaxHandle {
        self.max.clone()
    }

    /// Set both the ceiling and the remaining time.
    pub fn reset(&mut self, new_max: u32) {
        self.max.set(new_max);
        self.remaining = self.max.get();
    }

    /// Advance one second. On reaching zero, flips `store` and restarts from
    /// the current ceiling; returns the new phase in that case.
    pub fn tick(&mut self, store: &PhaseStore) -> Option<Phase> {
        if !self.active || self.remaining == 0 {
            return None;
        }
        self.remaining -= 1;
        if self.remaining > 0 {
            return None;
        }
        let phase = store.flip();
        self.remaining = self.max.get();
        tracing::debug!(phase = phase.label(), next_in = self.remaining, "phase timer rolled over");
        Some(phase)
    }
}

// ---------------------------------------------------------------------------
// Driver
// ---------------------------------------------------------------------------

/// Ticks a [`PhaseTimer`] once per second on the tokio runtime.
///
/// The interval task belongs to the driver: dropping the driver aborts it.
pub struct TimerDriver {
    timer: Arc<Mutex<PhaseTimer>>,
    task: JoinHandle<()>,
}

impl TimerDriver {
    pub fn spawn(timer: PhaseTimer, store: PhaseStore) -> Self {
        let timer = Arc::new(Mutex::new(timer));
        let shared = Arc::clone(&timer);
        let task = tokio::spawn(async move {
            let period = Duration::from_secs(1);
            let mut ticker = interval_at(Instant::now() + period, period);
            loop {
                ticker.tick().await;
                shared
                    .lock()
                    .unwrap_or_else(PoisonError::into_inner)
                    .tick(&store);
            }
        });
        Self { timer, task }
    }

    /// Lock the timer to start, stop, reset or inspect it.
    pub fn timer(&self) -> MutexGuard<'_, PhaseTimer> {
        self.timer.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn abort_handle(&self) -> AbortHandle {
        self.task.abort_handle()
    }
}

impl Drop for TimerDriver {
    fn drop(&mut self) {
        self.task.abort();
    }
}
