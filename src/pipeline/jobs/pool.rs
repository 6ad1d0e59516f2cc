//! Fixed-size worker pool fed by an unbounded queue.
//!
//! Submitting never blocks; at most `size` tasks run at once and the rest
//! wait in the queue. A panicking task is logged and its worker keeps
//! serving the queue. Dropping the pool closes the queue, lets queued
//! tasks drain and joins every worker.

use std::panic::{self, AssertUnwindSafe};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};

use super::JobError;

type Task = Box<dyn FnOnce() + Send + 'static>;

pub struct WorkerPool {
    sender: Option<Sender<Task>>,
    workers: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn new(size: usize) -> Self {
        let size = size.max(1);
        let (sender, receiver) = mpsc::channel::<Task>();
        let receiver = Arc::new(Mutex::new(receiver));

        let workers = (0..size)
            .map(|id| {
                let receiver = Arc::clone(&receiver);
                thread::spawn(move || worker_loop(id, &receiver))
            })
            .collect();

        tracing::debug!(workers = size, "Worker pool started");
        Self {
            sender: Some(sender),
            workers,
        }
    }

    pub fn size(&self) -> usize {
        self.workers.len()
    }

    pub fn execute<F>(&self, task: F) -> Result<(), JobError>
    where
        F: FnOnce() + Send + 'static,
    {
        let sender = self.sender.as_ref().ok_or(JobError::PoolClosed)?;
        sender.send(Box::new(task)).map_err(|_| JobError::PoolClosed)
    }
}

fn worker_loop(id: usize, receiver: &Mutex<Receiver<Task>>) {
    loop {
        let next = match receiver.lock() {
            Ok(rx) => rx.recv(),
            Err(_) => {
                tracing::warn!(worker = id, "Task queue lock poisoned, worker exiting");
                return;
            }
        };
        match next {
            Ok(task) => {
                if panic::catch_unwind(AssertUnwindSafe(task)).is_err() {
                    tracing::warn!(worker = id, "Task panicked");
                }
            }
            // queue closed
            Err(_) => return,
        }
    }
}

impl Drop for WorkerPool {
    fn drop(&mut self) {
        drop(self.sender.take());
        for handle in self.workers.drain(..) {
            let _ = handle.join();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    #[test]
    fn runs_every_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(3);
            for _ in 0..20 {
                let counter = Arc::clone(&counter);
                pool.execute(move || {
                    counter.fetch_add(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        }
        // drop drains the queue before joining
        assert_eq!(counter.load(Ordering::SeqCst), 20);
    }

    #[test]
    fn worker_survives_panicking_task() {
        let counter = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(1);
            pool.execute(|| panic!("task failure")).unwrap();
            let counter = Arc::clone(&counter);
            pool.execute(move || {
                counter.fetch_add(1, Ordering::SeqCst);
            })
            .unwrap();
        }
        assert_eq!(counter.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn zero_size_gets_one_worker() {
        assert_eq!(WorkerPool::new(0).size(), 1);
    }

    #[test]
    fn concurrency_is_bounded() {
        let running = Arc::new(AtomicUsize::new(0));
        let peak = Arc::new(AtomicUsize::new(0));
        {
            let pool = WorkerPool::new(2);
            for _ in 0..8 {
                let running = Arc::clone(&running);
                let peak = Arc::clone(&peak);
                pool.execute(move || {
                    let now = running.fetch_add(1, Ordering::SeqCst) + 1;
                    peak.fetch_max(now, Ordering::SeqCst);
                    thread::sleep(Duration::from_millis(10));
                    running.fetch_sub(1, Ordering::SeqCst);
                })
                .unwrap();
            }
        }
        assert!(peak.load(Ordering::SeqCst) <= 2);
    }

    #[test]
    fn submission_does_not_wait_for_workers() {
        let pool = WorkerPool::new(1);
        let (tx, rx) = mpsc::channel::<()>();
        pool.execute(move || {
            let _ = rx.recv_timeout(Duration::from_secs(5));
        })
        .unwrap();
        // worker is busy; queuing more work still returns immediately
        for _ in 0..5 {
            pool.execute(|| {}).unwrap();
        }
        tx.send(()).unwrap();
    }
}
