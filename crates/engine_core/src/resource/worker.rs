// crates/engine_core/src/resource/worker.rs
//! Background thread running asynchronous resource reads and writes.
//!
//! Jobs go in through one channel and completions come back through another;
//! the manager drains completions on its own thread so callbacks never run on
//! the worker.

use std::io;
use std::sync::{Arc, Mutex};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{unbounded, Receiver, RecvTimeoutError, Sender};
use tracing::debug;

use super::types::{read_fully, OpenResource};

pub(crate) type SharedResource = Arc<Mutex<Box<dyn OpenResource>>>;

pub(crate) type OpId = u64;

pub(crate) enum Job {
    Read { resource: SharedResource, size: usize },
    Write { resource: SharedResource, data: Vec<u8> },
}

pub(crate) enum Completion {
    Read(io::Result<Vec<u8>>),
    Write(io::Result<usize>),
}

fn poisoned() -> io::Error {
    io::Error::new(io::ErrorKind::Other, "resource lock poisoned")
}

fn run_read(resource: &SharedResource, size: usize) -> io::Result<Vec<u8>> {
    let mut guard = resource.lock().map_err(|_| poisoned())?;
    let mut buffer = vec![0u8; size];
    let count = read_fully(&mut **guard, &mut buffer)?;
    buffer.truncate(count);
    Ok(buffer)
}

fn run_write(resource: &SharedResource, data: &[u8]) -> io::Result<usize> {
    let mut guard = resource.lock().map_err(|_| poisoned())?;
    guard.write(data)
}

impl Job {
    fn run(self) -> Completion {
        match self {
            Job::Read { resource, size } => Completion::Read(run_read(&resource, size)),
            Job::Write { resource, data } => Completion::Write(run_write(&resource, &data)),
        }
    }
}

pub(crate) struct Worker {
    jobs: Option<Sender<(OpId, Job)>>,
    completions: Receiver<(OpId, Completion)>,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    pub fn spawn() -> io::Result<Self> {
        let (job_tx, job_rx) = unbounded::<(OpId, Job)>();
        let (done_tx, done_rx) = unbounded();

        let thread = thread::Builder::new()
            .name("resource-worker".to_string())
            .spawn(move || {
                for (op, job) in job_rx {
                    if done_tx.send((op, job.run())).is_err() {
                        break;
                    }
                }
                debug!("resource worker stopped");
            })?;

        Ok(Self {
            jobs: Some(job_tx),
            completions: done_rx,
            thread: Some(thread),
        })
    }

    /// Returns the job back if the worker is gone.
    pub fn submit(&self, op: OpId, job: Job) -> Result<(), Job> {
        match &self.jobs {
            Some(tx) => tx.send((op, job)).map_err(|err| err.into_inner().1),
            None => Err(job),
        }
    }

    pub fn try_completion(&self) -> Option<(OpId, Completion)> {
        self.completions.try_recv().ok()
    }

    /// Waits at most `timeout` for the next completion.
    pub fn wait_completion(&self, timeout: Duration) -> Option<(OpId, Completion)> {
        match self.completions.recv_timeout(timeout) {
            Ok(done) => Some(done),
            Err(RecvTimeoutError::Timeout) | Err(RecvTimeoutError::Disconnected) => None,
        }
    }

    pub fn stop(&mut self) {
        // Closing the job channel ends the worker loop once the queue is drained.
        self.jobs.take();
        if let Some(thread) = self.thread.take() {
            let _ = thread.join();
        }
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        self.stop();
    }
}
