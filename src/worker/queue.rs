//! In-process job queue and worker threads
//!
//! The dispatcher only sees [`JobQueue`]; the shipped implementation is a
//! channel drained by a fixed pool of threads, each running one job at a
//! time to completion.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::sync::mpsc::{self, Receiver, Sender};
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use log::{error, info, warn};
use thiserror::Error;

use super::{Job, Worker};

/// The queue no longer accepts jobs
#[derive(Debug, Clone, Copy, Error)]
#[error("job queue is closed")]
pub struct QueueError;

/// Accepts jobs for asynchronous execution
pub trait JobQueue: Send + Sync {
    /// Enqueue a job
    fn enqueue(&self, job: Job) -> Result<(), QueueError>;
}

/// Sending half of the worker pool channel
#[derive(Debug, Clone)]
pub struct ChannelQueue {
    sender: Sender<Job>,
}

impl JobQueue for ChannelQueue {
    fn enqueue(&self, job: Job) -> Result<(), QueueError> {
        self.sender.send(job).map_err(|_| QueueError)
    }
}

/// Threads draining a [`ChannelQueue`]
#[derive(Debug)]
pub struct WorkerPool {
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    /// Start `threads` workers; the pool stops once every queue clone is dropped
    pub fn start(worker: Arc<Worker>, threads: usize, timeout: Duration) -> std::io::Result<(ChannelQueue, Self)> {
        let (sender, receiver) = mpsc::channel();
        let receiver = Arc::new(Mutex::new(receiver));

        let handles = (0..threads.max(1))
            .map(|index| {
                let worker = Arc::clone(&worker);
                let receiver = Arc::clone(&receiver);
                thread::Builder::new()
                    .name(format!("kwalitee-worker-{index}"))
                    .spawn(move || drain(&worker, &receiver, timeout))
            })
            .collect::<std::io::Result<Vec<_>>>()?;

        info!("Started {} worker thread(s)", handles.len());
        Ok((ChannelQueue { sender }, Self { handles }))
    }

    /// Wait for every thread to finish
    pub fn join(self) {
        for handle in self.handles {
            if handle.join().is_err() {
                error!("A worker thread panicked");
            }
        }
    }
}

fn next_job(receiver: &Mutex<Receiver<Job>>) -> Option<Job> {
    let receiver = receiver.lock().ok()?;
    receiver.recv().ok()
}

fn drain(worker: &Worker, receiver: &Mutex<Receiver<Job>>, timeout: Duration) {
    while let Some(job) = next_job(receiver) {
        let started = Instant::now();
        match catch_unwind(AssertUnwindSafe(|| worker.run(&job))) {
            Ok(Ok(_)) => {},
            Ok(Err(e)) => error!("{} failed: {e}", job.describe()),
            Err(_) => error!("{} panicked", job.describe()),
        }
        let elapsed = started.elapsed();
        if elapsed > timeout {
            warn!("{} overdue: took {}s, limit {}s", job.describe(), elapsed.as_secs(), timeout.as_secs());
        }
    }
}
