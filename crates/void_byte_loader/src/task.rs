//! Background load tasks
//!
//! A [`LoadTask`] is a cloneable handle to one background load. The tick
//! thread polls [`LoadTask::is_completed`]; consumers block in
//! [`LoadTask::wait`]. Completion is signalled by a drop guard inside the
//! worker, so a panicking worker still completes its task.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use parking_lot::{Condvar, Mutex};

use crate::error::{ByteLoaderError, Result};

struct TaskInner {
    name: String,
    completed: Mutex<bool>,
    done: Condvar,
}

/// Handle to a background load
#[derive(Clone)]
pub struct LoadTask {
    inner: Arc<TaskInner>,
}

impl LoadTask {
    /// Create a task that has not started yet
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: Arc::new(TaskInner {
                name: name.into(),
                completed: Mutex::new(false),
                done: Condvar::new(),
            }),
        }
    }

    /// Name of the loader this task runs
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// Run `work` on a new named thread, completing the task when it returns
    pub fn start<F>(&self, thread_name: &str, work: F) -> Result<()>
    where
        F: FnOnce() + Send + 'static,
    {
        let guard = CompletionGuard(self.clone());

        thread::Builder::new()
            .name(thread_name.to_string())
            .spawn(move || {
                let _guard = guard;
                work();
            })
            .map(|_| ())
            .map_err(|source| ByteLoaderError::Spawn {
                name: self.inner.name.clone(),
                source,
            })
    }

    /// Mark the task completed and wake all waiters
    pub fn complete(&self) {
        let mut completed = self.inner.completed.lock();
        *completed = true;
        self.inner.done.notify_all();
    }

    /// Check without blocking
    pub fn is_completed(&self) -> bool {
        *self.inner.completed.lock()
    }

    /// Block until the task completes
    pub fn wait(&self) {
        let mut completed = self.inner.completed.lock();
        while !*completed {
            self.inner.done.wait(&mut completed);
        }
    }

    /// Block until the task completes or `timeout` elapses.
    /// Returns whether the task completed.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let mut completed = self.inner.completed.lock();
        if !*completed {
            self.inner.done.wait_while_for(&mut completed, |done| !*done, timeout);
        }
        *completed
    }
}

impl std::fmt::Debug for LoadTask {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LoadTask")
            .field("name", &self.inner.name)
            .field("completed", &self.is_completed())
            .finish()
    }
}

struct CompletionGuard(LoadTask);

impl Drop for CompletionGuard {
    fn drop(&mut self) {
        self.0.complete();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};

    #[test]
    fn test_task_completes() {
        let task = LoadTask::new("test");
        let ran = Arc::new(AtomicBool::new(false));
        let flag = Arc::clone(&ran);

        assert!(!task.is_completed());
        task.start("test-loader", move || flag.store(true, Ordering::SeqCst)).unwrap();
        task.wait();

        assert!(task.is_completed());
        assert!(ran.load(Ordering::SeqCst));
    }

    #[test]
    fn test_wait_timeout_on_unstarted_task() {
        let task = LoadTask::new("never");
        assert!(!task.wait_timeout(Duration::from_millis(10)));
    }

    #[test]
    fn test_panicking_worker_still_completes() {
        let task = LoadTask::new("panics");
        task.start("test-loader", || panic!("decoder blew up")).unwrap();
        assert!(task.wait_timeout(Duration::from_secs(5)));
    }

    #[test]
    fn test_multiple_waiters() {
        let task = LoadTask::new("shared");
        let (tx, rx) = std::sync::mpsc::channel::<()>();

        let waiters: Vec<_> = (0..3)
            .map(|_| {
                let task = task.clone();
                thread::spawn(move || task.wait())
            })
            .collect();

        task.start("test-loader", move || {
            rx.recv().ok();
        })
        .unwrap();
        tx.send(()).unwrap();

        for waiter in waiters {
            waiter.join().unwrap();
        }
        assert!(task.is_completed());
    }
}
