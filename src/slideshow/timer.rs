//! Timer primitives used by the slideshow.
//!
//! The slideshow never sleeps itself; it asks a [`TimerHost`] for intervals and
//! timeouts and clears them when the state that justified them goes away.

use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

/// Identifier of an established timer.
pub type TimerId = u64;

/// Callback run when a timer fires.
pub type TimerCallback = Arc<dyn Fn() + Send + Sync>;

/// Source of repeating and one-shot timers.
///
/// Hosts must never run a callback from inside `set_interval`, `set_timeout`
/// or `clear`; callers may hold their own locks across these calls.
pub trait TimerHost: Send + Sync {
    /// Fire `callback` every `period`, the first time one period from now.
    fn set_interval(&self, period: Duration, callback: TimerCallback) -> TimerId;

    /// Fire `callback` once after `delay`.
    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId;

    /// Cancel a timer. Unknown or already finished ids are ignored.
    fn clear(&self, id: TimerId);
}

/// Timer host backed by tokio tasks, one task per timer.
pub struct TokioTimerHost {
    runtime: Handle,
    next_id: AtomicU64,
    tasks: Arc<Mutex<HashMap<TimerId, JoinHandle<()>>>>,
}

impl TokioTimerHost {
    pub fn new(runtime: Handle) -> Self {
        Self {
            runtime,
            next_id: AtomicU64::new(1),
            tasks: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Number of timers currently scheduled.
    pub fn active(&self) -> usize {
        self.tasks.lock().len()
    }

    fn allocate(&self) -> TimerId {
        self.next_id.fetch_add(1, Ordering::Relaxed)
    }
}

impl TimerHost for TokioTimerHost {
    fn set_interval(&self, period: Duration, callback: TimerCallback) -> TimerId {
        let id = self.allocate();
        // Hold the map lock so the task cannot observe a missing entry
        let mut tasks = self.tasks.lock();
        let handle = self.runtime.spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                callback();
            }
        });
        tasks.insert(id, handle);
        id
    }

    fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
        let id = self.allocate();
        let tasks_ref = Arc::clone(&self.tasks);
        let mut tasks = self.tasks.lock();
        let handle = self.runtime.spawn(async move {
            tokio::time::sleep(delay).await;
            callback();
            tasks_ref.lock().remove(&id);
        });
        tasks.insert(id, handle);
        id
    }

    fn clear(&self, id: TimerId) {
        if let Some(handle) = self.tasks.lock().remove(&id) {
            handle.abort();
        }
    }
}

impl Drop for TokioTimerHost {
    fn drop(&mut self) {
        for (_, handle) in self.tasks.lock().drain() {
            handle.abort();
        }
    }
}

/// Virtual-time host that records every timer it hands out.
#[cfg(test)]
pub(crate) mod manual {
    use super::*;
    use std::collections::BTreeMap;

    struct Scheduled {
        due: Duration,
        period: Option<Duration>,
        callback: TimerCallback,
    }

    #[derive(Default)]
    struct State {
        now: Duration,
        next_id: TimerId,
        timers: BTreeMap<TimerId, Scheduled>,
        established: Vec<TimerId>,
        timeouts: usize,
        cleared: Vec<TimerId>,
    }

    #[derive(Default)]
    pub(crate) struct ManualTimerHost {
        state: Mutex<State>,
    }

    impl ManualTimerHost {
        pub(crate) fn new() -> Arc<Self> {
            Arc::new(Self::default())
        }

        /// Move virtual time forward, firing due timers in order.
        pub(crate) fn advance(&self, by: Duration) {
            let target = self.state.lock().now + by;
            loop {
                let next = {
                    let mut state = self.state.lock();
                    let due = state
                        .timers
                        .iter()
                        .filter(|(_, t)| t.due <= target)
                        .min_by_key(|(id, t)| (t.due, **id))
                        .map(|(id, _)| *id);
                    match due {
                        None => {
                            state.now = target;
                            None
                        }
                        Some(id) => {
                            let timer = state.timers.get(&id).map(|t| (t.due, t.period));
                            let (due, period) = timer.unwrap();
                            state.now = due;
                            let callback = match period {
                                Some(period) => {
                                    let t = state.timers.get_mut(&id).unwrap();
                                    t.due = due + period;
                                    Arc::clone(&t.callback)
                                }
                                None => state.timers.remove(&id).unwrap().callback,
                            };
                            Some(callback)
                        }
                    }
                };
                match next {
                    Some(callback) => callback(),
                    None => break,
                }
            }
        }

        pub(crate) fn advance_ms(&self, ms: u64) {
            self.advance(Duration::from_millis(ms));
        }

        pub(crate) fn pending(&self) -> usize {
            self.state.lock().timers.len()
        }

        pub(crate) fn established(&self) -> Vec<TimerId> {
            self.state.lock().established.clone()
        }

        /// Number of one-shot timers established so far.
        pub(crate) fn timeouts(&self) -> usize {
            self.state.lock().timeouts
        }

        pub(crate) fn cleared(&self) -> Vec<TimerId> {
            self.state.lock().cleared.clone()
        }

        fn schedule(&self, delay: Duration, period: Option<Duration>, cb: TimerCallback) -> TimerId {
            let mut state = self.state.lock();
            state.next_id += 1;
            let id = state.next_id;
            let due = state.now + delay;
            state.timers.insert(
                id,
                Scheduled {
                    due,
                    period,
                    callback: cb,
                },
            );
            state.established.push(id);
            if period.is_none() {
                state.timeouts += 1;
            }
            id
        }
    }

    impl TimerHost for ManualTimerHost {
        fn set_interval(&self, period: Duration, callback: TimerCallback) -> TimerId {
            self.schedule(period, Some(period), callback)
        }

        fn set_timeout(&self, delay: Duration, callback: TimerCallback) -> TimerId {
            self.schedule(delay, None, callback)
        }

        fn clear(&self, id: TimerId) {
            let mut state = self.state.lock();
            state.timers.remove(&id);
            state.cleared.push(id);
        }
    }
}
