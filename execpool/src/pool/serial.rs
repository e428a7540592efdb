// Copyright 2025 Accenture.
//
// SPDX-License-Identifier: Apache-2.0

use super::{spawn_worker, Job};
use crate::error::Error;
use log::debug;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc, Mutex};
use std::thread;

/// A pool with a single worker and an unbounded queue.
///
/// Submitted work executes one item at a time, in submission order, for as
/// long as the pool is alive. Shutdown is immediate: work that has not
/// started when [`shutdown`](SerialPool::shutdown) is called never runs.
pub struct SerialPool {
    name: String,
    sender: Mutex<Option<mpsc::Sender<Job>>>,
    closed: Arc<AtomicBool>,
    #[allow(unused)]
    worker: thread::JoinHandle<()>,
}

impl SerialPool {
    /// Create a new serial pool and spawn its worker thread
    pub fn new(name: &str, stack_size: Option<usize>) -> Result<SerialPool, Error> {
        let (sender, receiver) = mpsc::channel::<Job>();
        let closed = Arc::new(AtomicBool::new(false));
        let thread_name = name.to_lowercase();
        let worker = spawn_worker(thread_name.clone(), stack_size, {
            let closed = Arc::clone(&closed);
            move || run(thread_name, receiver, closed)
        })?;

        Ok(SerialPool {
            name: name.to_owned(),
            sender: Mutex::new(Some(sender)),
            closed,
            worker,
        })
    }

    /// Enqueue a unit of work behind all previously submitted work
    pub fn submit(&self, job: Job) -> Result<(), Error> {
        let sender = self.sender.lock().expect("poisoned pool lock");
        match sender.as_ref() {
            Some(sender) => sender
                .send(job)
                .map_err(|_| Error::PoolClosed("serial worker is gone")),
            None => Err(Error::PoolClosed("pool has been shut down")),
        }
    }

    /// Shut down the pool immediately.
    ///
    /// Work that is currently running completes; queued work is discarded.
    pub fn shutdown(&self) {
        self.closed.store(true, Ordering::Release);
        let mut sender = self.sender.lock().expect("poisoned pool lock");
        if sender.take().is_some() {
            debug!("Shut down serial pool {}", self.name);
        }
    }

    /// Check if the pool has been shut down
    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::Acquire)
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Worker thread main function
fn run(thread_name: String, receiver: mpsc::Receiver<Job>, closed: Arc<AtomicBool>) {
    while let Ok(job) = receiver.recv() {
        // The queue may still hold jobs that were submitted before shutdown;
        // dropping out here discards them along with the receiver
        if closed.load(Ordering::Acquire) {
            break;
        }
        job();
    }
    debug!("Serial worker {thread_name} exiting");
}

/////////////
// Tests
/////////////

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_strict_submission_order() {
        let pool = SerialPool::new("OrderTransactionalExecutor", None).unwrap();
        let executed = Arc::new(Mutex::new(Vec::new()));
        let (done_sender, done_receiver) = mpsc::channel();

        for i in 0..10 {
            let executed = Arc::clone(&executed);
            let done_sender = done_sender.clone();
            pool.submit(Box::new(move || {
                executed.lock().unwrap().push(i);
                done_sender.send(()).unwrap();
            }))
            .unwrap();
        }

        for _ in 0..10 {
            done_receiver
                .recv_timeout(Duration::from_secs(5))
                .expect("job did not complete");
        }
        assert_eq!(*executed.lock().unwrap(), (0..10).collect::<Vec<_>>());
    }

    #[test]
    fn test_submit_after_shutdown() {
        let pool = SerialPool::new("ClosedTransactionalExecutor", None).unwrap();
        pool.shutdown();
        assert!(pool.is_closed());
        let result = pool.submit(Box::new(|| {}));
        assert!(matches!(result, Err(Error::PoolClosed(_))));
    }

    #[test]
    fn test_shutdown_discards_queued_work() {
        let pool = SerialPool::new("DiscardTransactionalExecutor", None).unwrap();
        let (gate_sender, gate_receiver) = mpsc::channel::<()>();
        let executed = Arc::new(AtomicBool::new(false));

        // First job blocks the worker until the gate opens
        pool.submit(Box::new(move || {
            gate_receiver.recv().ok();
        }))
        .unwrap();

        // Queue jobs behind the blocker; each one owns a guard sender that is
        // released when the job runs or is discarded
        let (guard_sender, guard_receiver) = mpsc::channel::<()>();
        for _ in 0..5 {
            let executed = Arc::clone(&executed);
            let guard = guard_sender.clone();
            pool.submit(Box::new(move || {
                executed.store(true, Ordering::Release);
                let _guard = guard;
            }))
            .unwrap();
        }
        drop(guard_sender);

        pool.shutdown();
        gate_sender.send(()).unwrap();

        // All queued jobs have been dropped once the guard channel disconnects
        assert!(matches!(
            guard_receiver.recv_timeout(Duration::from_secs(5)),
            Err(mpsc::RecvTimeoutError::Disconnected)
        ));
        assert!(!executed.load(Ordering::Acquire));
    }

    #[test]
    fn test_running_work_completes_on_shutdown() {
        let pool = SerialPool::new("InflightTransactionalExecutor", None).unwrap();
        let (started_sender, started_receiver) = mpsc::channel();
        let (gate_sender, gate_receiver) = mpsc::channel::<()>();
        let (finished_sender, finished_receiver) = mpsc::channel();

        pool.submit(Box::new(move || {
            started_sender.send(()).unwrap();
            gate_receiver.recv().ok();
            finished_sender.send(()).unwrap();
        }))
        .unwrap();

        started_receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("job did not start");
        pool.shutdown();
        gate_sender.send(()).unwrap();
        finished_receiver
            .recv_timeout(Duration::from_secs(5))
            .expect("in-flight job did not run to completion");
    }
}
