// SPDX-License-Identifier: Apache-2.0 OR MIT

//! `TimedEventQueue`: the single cooperative timed-event scheduler thread
//! per Participant. It drives heartbeat periods, nack-response delays,
//! nack-suppression expiries, lease watchdogs, and PDP/WLP announcement
//! ticks off one min-heap rather than one thread per timer, generalized to
//! arbitrary callbacks so a Participant needs only one scheduler thread
//! instead of one dedicated thread per timer purpose.
//!
//! Callbacks must return promptly — this is a cooperative scheduler, not a
//! thread pool. Anything that might block (transport I/O, retransmission
//! encode) is handed off by the callback rather than run inline.

use parking_lot::{Condvar, Mutex};
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

type Callback = Box<dyn FnMut() + Send>;

/// Opaque handle to a scheduled event, usable with [`TimedEventQueue::cancel`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EventHandle(u64);

struct ScheduledEvent {
    due: Instant,
    id: u64,
    callback: Callback,
    /// `Some(period)` re-schedules the event after it fires; `None` runs once.
    period: Option<Duration>,
}

struct HeapEntry {
    due: Instant,
    id: u64,
}

impl PartialEq for HeapEntry {
    fn eq(&self, other: &Self) -> bool {
        self.due == other.due && self.id == other.id
    }
}
impl Eq for HeapEntry {}
impl PartialOrd for HeapEntry {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for HeapEntry {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.due.cmp(&other.due).then(self.id.cmp(&other.id))
    }
}

struct Shared {
    heap: Mutex<BinaryHeap<Reverse<HeapEntry>>>,
    events: Mutex<std::collections::HashMap<u64, ScheduledEvent>>,
    cancelled: Mutex<std::collections::HashSet<u64>>,
    wakeup: Condvar,
    next_id: AtomicU64,
    stop: AtomicBool,
}

/// A running scheduler thread plus the handle used to enqueue new events.
///
/// Dropping the queue signals the thread to stop and joins it, so a
/// Participant's scheduler winds down cleanly with the Participant itself.
pub struct TimedEventQueue {
    shared: Arc<Shared>,
    thread: Option<JoinHandle<()>>,
}

impl TimedEventQueue {
    pub fn new() -> Self {
        let shared = Arc::new(Shared {
            heap: Mutex::new(BinaryHeap::new()),
            events: Mutex::new(std::collections::HashMap::new()),
            cancelled: Mutex::new(std::collections::HashSet::new()),
            wakeup: Condvar::new(),
            next_id: AtomicU64::new(1),
            stop: AtomicBool::new(false),
        });

        let worker_shared = Arc::clone(&shared);
        let thread = thread::Builder::new()
            .name("rtps-resource-event".into())
            .spawn(move || run(worker_shared))
            .expect("failed to spawn scheduler thread");

        Self {
            shared,
            thread: Some(thread),
        }
    }

    /// Schedule `callback` to run once after `delay`.
    pub fn schedule_after(&self, delay: Duration, callback: impl FnMut() + Send + 'static) -> EventHandle {
        self.insert(delay, None, Box::new(callback))
    }

    /// Schedule `callback` to run every `period`, starting after one period.
    pub fn schedule_periodic(&self, period: Duration, callback: impl FnMut() + Send + 'static) -> EventHandle {
        self.insert(period, Some(period), Box::new(callback))
    }

    fn insert(&self, delay: Duration, period: Option<Duration>, callback: Callback) -> EventHandle {
        let id = self.shared.next_id.fetch_add(1, Ordering::Relaxed);
        let due = Instant::now() + delay;
        self.shared.events.lock().insert(
            id,
            ScheduledEvent {
                due,
                id,
                callback,
                period,
            },
        );
        self.shared.heap.lock().push(Reverse(HeapEntry { due, id }));
        self.shared.wakeup.notify_one();
        EventHandle(id)
    }

    /// Cancel a previously-scheduled event. A no-op if it already fired
    /// (for one-shot events) or was already cancelled.
    pub fn cancel(&self, handle: EventHandle) {
        self.shared.cancelled.lock().insert(handle.0);
        self.shared.events.lock().remove(&handle.0);
    }
}

impl Default for TimedEventQueue {
    fn default() -> Self {
        Self::new()
    }
}

impl Drop for TimedEventQueue {
    fn drop(&mut self) {
        self.shared.stop.store(true, Ordering::Release);
        self.shared.wakeup.notify_all();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

fn run(shared: Arc<Shared>) {
    loop {
        if shared.stop.load(Ordering::Acquire) {
            return;
        }

        let mut heap = shared.heap.lock();
        let next_due = heap.peek().map(|Reverse(entry)| entry.due);

        let Some(due) = next_due else {
            // Nothing scheduled: wait until woken by a new `insert` or stop.
            shared.wakeup.wait(&mut heap);
            continue;
        };

        let now = Instant::now();
        if due > now {
            let timeout = due - now;
            shared.wakeup.wait_for(&mut heap, timeout);
            drop(heap);
            continue;
        }

        let Reverse(entry) = heap.pop().expect("peeked entry must exist");
        drop(heap);

        if shared.cancelled.lock().remove(&entry.id) {
            continue;
        }

        let mut events = shared.events.lock();
        let Some(mut scheduled) = events.remove(&entry.id) else {
            continue;
        };
        drop(events);

        (scheduled.callback)();

        if let Some(period) = scheduled.period {
            let next_due = Instant::now() + period;
            let id = scheduled.id;
            scheduled.due = next_due;
            shared.events.lock().insert(id, scheduled);
            shared.heap.lock().push(Reverse(HeapEntry { due: next_due, id }));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::mpsc;

    #[test]
    fn one_shot_event_fires_once_after_the_delay() {
        let queue = TimedEventQueue::new();
        let (tx, rx) = mpsc::channel();
        queue.schedule_after(Duration::from_millis(5), move || {
            tx.send(()).unwrap();
        });

        rx.recv_timeout(Duration::from_secs(1)).expect("event should have fired");
        assert!(rx.recv_timeout(Duration::from_millis(50)).is_err());
    }

    #[test]
    fn periodic_event_fires_more_than_once() {
        let queue = TimedEventQueue::new();
        let (tx, rx) = mpsc::channel();
        queue.schedule_periodic(Duration::from_millis(5), move || {
            let _ = tx.send(());
        });

        rx.recv_timeout(Duration::from_secs(1)).unwrap();
        rx.recv_timeout(Duration::from_secs(1)).unwrap();
    }

    #[test]
    fn cancelling_a_one_shot_event_prevents_it_from_firing() {
        let queue = TimedEventQueue::new();
        let (tx, rx) = mpsc::channel();
        let handle = queue.schedule_after(Duration::from_millis(20), move || {
            tx.send(()).unwrap();
        });
        queue.cancel(handle);

        assert!(rx.recv_timeout(Duration::from_millis(100)).is_err());
    }
}
