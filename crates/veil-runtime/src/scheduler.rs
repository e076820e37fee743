#![forbid(unsafe_code)]

//! Cooperative task queue.
//!
//! Models the single UI thread's event queue: tasks run one at a time, in
//! the order they were deferred, and each runs to completion before the next
//! starts. A task may defer further tasks; they run after everything already
//! queued.
//!
//! # Invariants
//!
//! 1. FIFO order is preserved, including for tasks deferred by tasks.
//! 2. The queue borrow is released before a task runs, so tasks may call
//!    back into the queue.
//!
//! # Example
//!
//! ```
//! use std::cell::Cell;
//! use std::rc::Rc;
//! use veil_runtime::TaskQueue;
//!
//! let queue = TaskQueue::new();
//! let hits = Rc::new(Cell::new(0));
//! let h = Rc::clone(&hits);
//! queue.defer(move || h.set(h.get() + 1));
//! assert_eq!(queue.run_until_idle(), 1);
//! assert_eq!(hits.get(), 1);
//! ```

use std::cell::RefCell;
use std::collections::VecDeque;
use std::fmt;
use std::rc::Rc;

type Task = Box<dyn FnOnce()>;

thread_local! {
    static GLOBAL_QUEUE: TaskQueue = TaskQueue::new();
}

/// Shared handle to a FIFO of deferred tasks.
#[derive(Clone, Default)]
pub struct TaskQueue {
    tasks: Rc<RefCell<VecDeque<Task>>>,
}

impl fmt::Debug for TaskQueue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TaskQueue")
            .field("pending", &self.pending())
            .finish()
    }
}

impl TaskQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Access the global queue (thread-local).
    #[must_use]
    pub fn global() -> Self {
        GLOBAL_QUEUE.with(Clone::clone)
    }

    /// Queue `task` to run after everything already pending.
    pub fn defer(&self, task: impl FnOnce() + 'static) {
        self.tasks.borrow_mut().push_back(Box::new(task));
    }

    /// Run the oldest pending task. Returns `false` if the queue was empty.
    pub fn run_next(&self) -> bool {
        let task = self.tasks.borrow_mut().pop_front();
        match task {
            Some(task) => {
                task();
                true
            }
            None => false,
        }
    }

    /// Run tasks until none remain, including ones deferred along the way.
    /// Returns how many ran.
    ///
    /// A task that unconditionally re-defers itself keeps this from
    /// returning.
    pub fn run_until_idle(&self) -> usize {
        let mut ran = 0;
        while self.run_next() {
            ran += 1;
        }
        if ran > 0 {
            tracing::trace!(ran, "task queue drained");
        }
        ran
    }

    /// Number of tasks waiting to run.
    #[must_use]
    pub fn pending(&self) -> usize {
        self.tasks.borrow().len()
    }

    /// Whether no tasks are waiting.
    #[must_use]
    pub fn is_idle(&self) -> bool {
        self.tasks.borrow().is_empty()
    }

    /// Drop every pending task without running it. Returns how many were
    /// dropped.
    pub fn clear(&self) -> usize {
        let dropped: Vec<Task> = self.tasks.borrow_mut().drain(..).collect();
        dropped.len()
    }
}

#[cfg(test)]
mod tests {
    use proptest::prelude::*;

    use super::*;

    #[test]
    fn runs_in_fifo_order() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        for i in 0..3 {
            let log = Rc::clone(&log);
            queue.defer(move || log.borrow_mut().push(i));
        }
        assert_eq!(queue.pending(), 3);
        assert!(queue.run_next());
        assert_eq!(*log.borrow(), vec![0]);
        assert_eq!(queue.run_until_idle(), 2);
        assert_eq!(*log.borrow(), vec![0, 1, 2]);
        assert!(!queue.run_next());
    }

    #[test]
    fn tasks_may_defer_tasks() {
        let queue = TaskQueue::new();
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner_queue = queue.clone();
        let inner_log = Rc::clone(&log);
        queue.defer(move || {
            inner_log.borrow_mut().push("outer");
            let log = Rc::clone(&inner_log);
            inner_queue.defer(move || log.borrow_mut().push("inner"));
        });
        let log2 = Rc::clone(&log);
        queue.defer(move || log2.borrow_mut().push("second"));

        assert_eq!(queue.run_until_idle(), 3);
        assert_eq!(*log.borrow(), vec!["outer", "second", "inner"]);
        assert!(queue.is_idle());
    }

    #[test]
    fn clear_drops_without_running() {
        let queue = TaskQueue::new();
        let ran = Rc::new(RefCell::new(false));
        let flag = Rc::clone(&ran);
        queue.defer(move || *flag.borrow_mut() = true);
        assert_eq!(queue.clear(), 1);
        assert_eq!(queue.run_until_idle(), 0);
        assert!(!*ran.borrow());
    }

    #[test]
    fn global_queue_is_shared() {
        let a = TaskQueue::global();
        let b = TaskQueue::global();
        a.defer(|| {});
        assert_eq!(b.pending(), 1);
        assert_eq!(b.run_until_idle(), 1);
    }

    proptest! {
        #[test]
        fn partial_runs_preserve_order(count in 0usize..32, first in 0usize..32) {
            let queue = TaskQueue::new();
            let log = Rc::new(RefCell::new(Vec::new()));
            for i in 0..count {
                let log = Rc::clone(&log);
                queue.defer(move || log.borrow_mut().push(i));
            }
            let mut ran = 0;
            while ran < first && queue.run_next() {
                ran += 1;
            }
            prop_assert_eq!(ran, first.min(count));
            prop_assert_eq!(queue.run_until_idle(), count - ran);
            prop_assert_eq!(log.borrow().clone(), (0..count).collect::<Vec<_>>());
        }
    }
}
