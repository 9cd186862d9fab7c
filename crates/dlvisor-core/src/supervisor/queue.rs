use std::collections::VecDeque;
use std::sync::{Condvar, Mutex, MutexGuard};
use std::time::Duration;

struct QueueState<T> {
    items: VecDeque<T>,
    /// Items handed out or waiting that have not been acknowledged yet.
    unfinished: usize,
}

/// Multi-consumer work queue with acknowledgement.
///
/// The items are fixed at construction. Consumers `pop` with a timeout and
/// call `task_done` per item; `join` blocks until every item has been
/// acknowledged.
pub struct JobQueue<T> {
    state: Mutex<QueueState<T>>,
    drained: Condvar,
}

impl<T> JobQueue<T> {
    pub fn new(items: impl IntoIterator<Item = T>) -> Self {
        let items: VecDeque<T> = items.into_iter().collect();
        Self {
            state: Mutex::new(QueueState {
                unfinished: items.len(),
                items,
            }),
            drained: Condvar::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, QueueState<T>> {
        self.state.lock().unwrap_or_else(|p| p.into_inner())
    }

    /// Next item. When the queue is empty, waits at most `timeout` or until
    /// the last outstanding item is acknowledged.
    pub fn pop(&self, timeout: Duration) -> Option<T> {
        let mut state = self.lock();
        if state.items.is_empty() {
            state = self
                .drained
                .wait_timeout(state, timeout)
                .map(|(guard, _)| guard)
                .unwrap_or_else(|p| p.into_inner().0);
        }
        state.items.pop_front()
    }

    /// Acknowledge one popped item.
    pub fn task_done(&self) {
        let mut state = self.lock();
        state.unfinished = state.unfinished.saturating_sub(1);
        if state.unfinished == 0 {
            self.drained.notify_all();
        }
    }

    /// Block until every item has been acknowledged.
    pub fn join(&self) {
        let mut state = self.lock();
        while state.unfinished > 0 {
            state = self
                .drained
                .wait(state)
                .unwrap_or_else(|p| p.into_inner());
        }
    }
}

/// Acknowledges its item when dropped, so a panicking consumer cannot leave
/// `join` waiting forever.
pub struct TaskGuard<'a, T> {
    queue: &'a JobQueue<T>,
}

impl<'a, T> TaskGuard<'a, T> {
    pub fn new(queue: &'a JobQueue<T>) -> Self {
        Self { queue }
    }
}

impl<T> Drop for TaskGuard<'_, T> {
    fn drop(&mut self) {
        self.queue.task_done();
    }
}
