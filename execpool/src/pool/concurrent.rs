// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::{spawn_worker, Job};
use crate::configuration::RegistryConfig;
use crate::error::Error;
use crossbeam_channel::{bounded, Receiver, RecvTimeoutError, Sender, TrySendError};
use log::debug;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Outcome of offering work to a concurrent pool
pub enum Admission {
    /// The work was handed to a worker and will run
    Accepted,
    /// The pool is at its worker bound and no worker was idle;
    /// the work is handed back to the caller untouched
    Rejected(Job),
}

/// A pool with no minimum worker count, a bounded maximum and no queue.
///
/// Work is handed directly to an idle worker. If none is idle and the worker
/// bound has not been reached, a new worker is spawned for the work. If the
/// bound has been reached, the work is rejected immediately and handed back
/// to the caller. Workers that stay idle for the configured keep-alive
/// retire on their own.
pub struct ConcurrentPool {
    name: String,
    sender: Mutex<Option<Sender<Job>>>,
    receiver: Receiver<Job>,
    workers: Arc<AtomicUsize>,
    spawned: AtomicUsize,
    max_workers: usize,
    keep_alive: Duration,
    stack_size: Option<usize>,
}

impl ConcurrentPool {
    /// Create a new concurrent pool; workers are spawned on demand only
    pub fn new(name: &str, config: &RegistryConfig) -> ConcurrentPool {
        // Rendezvous channel: a handoff succeeds only while a worker is
        // blocked waiting for work, nothing is ever buffered
        let (sender, receiver) = bounded::<Job>(0);

        ConcurrentPool {
            name: name.to_owned(),
            sender: Mutex::new(Some(sender)),
            receiver,
            workers: Arc::new(AtomicUsize::new(0)),
            spawned: AtomicUsize::new(0),
            max_workers: config.max_workers,
            keep_alive: config.keep_alive,
            stack_size: config.stack_size,
        }
    }

    /// Offer a unit of work to the pool.
    ///
    /// Saturation is not an error: work the pool cannot admit is returned as
    /// [`Admission::Rejected`] so the caller can decide where it goes.
    pub fn try_submit(&self, job: Job) -> Result<Admission, Error> {
        let sender = self.sender.lock().expect("poisoned pool lock");
        let sender = match sender.as_ref() {
            Some(sender) => sender,
            None => return Err(Error::PoolClosed("pool has been shut down")),
        };

        // Hand off to an idle worker if one is waiting
        let job = match sender.try_send(job) {
            Ok(()) => return Ok(Admission::Accepted),
            Err(TrySendError::Full(job)) => job,
            Err(TrySendError::Disconnected(_)) => {
                return Err(Error::PoolClosed("pool has been shut down"))
            }
        };

        // No idle worker: claim a worker slot unless the bound is reached
        loop {
            let running = self.workers.load(Ordering::Acquire);
            if running >= self.max_workers {
                return Ok(Admission::Rejected(job));
            }
            if self
                .workers
                .compare_exchange(running, running + 1, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                break;
            }
        }

        let index = self.spawned.fetch_add(1, Ordering::Relaxed);
        let thread_name = format!("{}-{index}", self.name).to_lowercase();
        let workers = Arc::clone(&self.workers);
        let receiver = self.receiver.clone();
        let keep_alive = self.keep_alive;
        let spawn_result = spawn_worker(thread_name.clone(), self.stack_size, move || {
            run(thread_name, job, receiver, workers, keep_alive)
        });
        if let Err(e) = spawn_result {
            // Give the unused slot back before propagating
            self.workers.fetch_sub(1, Ordering::AcqRel);
            return Err(e);
        }
        Ok(Admission::Accepted)
    }

    /// Shut down the pool immediately.
    ///
    /// Work that is currently running completes; idle workers exit. There is
    /// no queue, so nothing is discarded.
    pub fn shutdown(&self) {
        let mut sender = self.sender.lock().expect("poisoned pool lock");
        if sender.take().is_some() {
            debug!("Shut down concurrent pool {}", self.name);
        }
    }

    /// Check if the pool has been shut down
    pub fn is_closed(&self) -> bool {
        self.sender.lock().expect("poisoned pool lock").is_none()
    }

    /// Number of currently live workers
    pub fn worker_count(&self) -> usize {
        self.workers.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Worker thread main function
fn run(
    thread_name: String,
    first: Job,
    receiver: Receiver<Job>,
    workers: Arc<AtomicUsize>,
    keep_alive: Duration,
) {
    debug!("Worker {thread_name} starting");
    first();
    loop {
        match receiver.recv_timeout(keep_alive) {
            Ok(job) => job(),
            // Idle for the whole keep-alive window, or the pool was shut down
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => break,
        }
    }
    workers.fetch_sub(1, Ordering::AcqRel);
    debug!("Worker {thread_name} retiring");
}

/////////////
// Tests
/////////////

#[cfg(test)]
mod test {
    use super::*;
    use std::sync::mpsc;

    fn config(max_workers: usize, keep_alive: Duration) -> RegistryConfig {
        let mut config = RegistryConfig::new();
        config.max_workers(max_workers).keep_alive(keep_alive);
        config
    }

    #[test]
    fn test_rejects_beyond_worker_bound() {
        let pool = ConcurrentPool::new("BoundExecutor", &config(2, Duration::from_secs(3)));
        let (gate_sender, gate_receiver) = mpsc::channel::<()>();
        let gate_receiver = Arc::new(Mutex::new(gate_receiver));

        for _ in 0..2 {
            let gate_receiver = Arc::clone(&gate_receiver);
            let admission = pool
                .try_submit(Box::new(move || {
                    gate_receiver.lock().unwrap().recv().ok();
                }))
                .unwrap();
            assert!(matches!(admission, Admission::Accepted));
        }
        assert_eq!(pool.worker_count(), 2);

        // Both workers are busy and the bound is reached
        let admission = pool.try_submit(Box::new(|| {})).unwrap();
        assert!(matches!(admission, Admission::Rejected(_)));

        drop(gate_sender);
    }

    #[test]
    fn test_rejected_job_is_handed_back_intact() {
        let pool = ConcurrentPool::new("HandbackExecutor", &config(1, Duration::from_secs(3)));
        let (gate_sender, gate_receiver) = mpsc::channel::<()>();

        pool.try_submit(Box::new(move || {
            gate_receiver.recv().ok();
        }))
        .unwrap();

        let (done_sender, done_receiver) = mpsc::channel();
        let admission = pool
            .try_submit(Box::new(move || {
                done_sender.send(()).unwrap();
            }))
            .unwrap();
        let job = match admission {
            Admission::Rejected(job) => job,
            Admission::Accepted => panic!("job must not be admitted at the bound"),
        };

        // The caller still owns the work and can run it elsewhere
        job();
        done_receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("rejected job was lost");

        drop(gate_sender);
    }

    #[test]
    fn test_idle_workers_retire() {
        let pool = ConcurrentPool::new("RetireExecutor", &config(4, Duration::from_millis(50)));
        let (done_sender, done_receiver) = mpsc::channel();

        pool.try_submit(Box::new(move || {
            done_sender.send(()).unwrap();
        }))
        .unwrap();
        done_receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("job did not complete");

        // The single worker has been idle well beyond the keep-alive
        std::thread::sleep(Duration::from_millis(500));
        assert_eq!(pool.worker_count(), 0);
    }

    #[test]
    fn test_submit_after_shutdown() {
        let pool = ConcurrentPool::new("ClosedExecutor", &config(2, Duration::from_secs(3)));
        pool.shutdown();
        assert!(pool.is_closed());
        let result = pool.try_submit(Box::new(|| {}));
        assert!(matches!(result, Err(Error::PoolClosed(_))));
    }
}
