//! Worker execution context
//!
//! One background thread draining a serial job queue. Every device and
//! session callback, and every capture request, runs here instead of on the
//! caller's thread. Shutdown mirrors a "quit safely" looper: jobs queued
//! before the quit still run, then the thread is joined.

use crate::errors::CameraError;
use crossbeam_channel::{Receiver, Sender};
use std::any::Any;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{JoinHandle, ThreadId};

/// Unit of work executed on the worker thread
pub type Job = Box<dyn FnOnce() + Send + 'static>;

enum Message {
    Run(Job),
    Quit,
}

/// Cloneable posting side of a [`Worker`]
#[derive(Clone)]
pub struct WorkerHandle {
    sender: Sender<Message>,
    accepting: Arc<AtomicBool>,
    thread_id: ThreadId,
    name: Arc<str>,
}

impl WorkerHandle {
    /// Queue a job. Fails once the worker has been asked to quit.
    pub fn post<F>(&self, job: F) -> Result<(), CameraError>
    where
        F: FnOnce() + Send + 'static,
    {
        if !self.accepting.load(Ordering::Acquire) {
            return Err(CameraError::WorkerError(format!(
                "worker {} is shut down",
                self.name
            )));
        }
        self.sender
            .send(Message::Run(Box::new(job)))
            .map_err(|_| CameraError::WorkerError(format!("worker {} is gone", self.name)))
    }

    pub fn is_accepting(&self) -> bool {
        self.accepting.load(Ordering::Acquire)
    }

    /// True when called from inside a job on this worker
    pub fn is_worker_thread(&self) -> bool {
        std::thread::current().id() == self.thread_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

/// Owning side of the worker thread
pub struct Worker {
    handle: WorkerHandle,
    thread: Option<JoinHandle<()>>,
}

impl Worker {
    /// Spawn the worker thread with the given name
    pub fn spawn(name: &str) -> Result<Self, CameraError> {
        let (sender, receiver) = crossbeam_channel::unbounded();
        let thread_name = name.to_string();

        let thread = std::thread::Builder::new()
            .name(thread_name.clone())
            .spawn(move || run_jobs(receiver, thread_name))
            .map_err(|e| CameraError::WorkerError(format!("spawn failed: {}", e)))?;

        log::debug!("Started worker thread {}", name);

        Ok(Self {
            handle: WorkerHandle {
                sender,
                accepting: Arc::new(AtomicBool::new(true)),
                thread_id: thread.thread().id(),
                name: Arc::from(name),
            },
            thread: Some(thread),
        })
    }

    pub fn handle(&self) -> WorkerHandle {
        self.handle.clone()
    }

    pub fn is_running(&self) -> bool {
        self.thread.is_some()
    }

    /// Stop accepting jobs, let the queued ones finish, then join.
    pub fn shutdown(mut self) -> Result<(), CameraError> {
        self.quit_and_join()
    }

    fn quit_and_join(&mut self) -> Result<(), CameraError> {
        let Some(thread) = self.thread.take() else {
            return Ok(());
        };

        self.handle.accepting.store(false, Ordering::Release);
        // The receiver outlives every job, so this only fails if the thread already died.
        let _ = self.handle.sender.send(Message::Quit);

        if self.handle.is_worker_thread() {
            log::warn!(
                "Worker {} asked to join itself; leaving it to exit on its own",
                self.handle.name
            );
            return Ok(());
        }

        thread.join().map_err(|panic| {
            CameraError::WorkerError(format!(
                "worker {} terminated abnormally: {}",
                self.handle.name,
                panic_message(panic.as_ref())
            ))
        })?;

        log::debug!("Joined worker thread {}", self.handle.name);
        Ok(())
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if let Err(e) = self.quit_and_join() {
            log::error!("{}", e);
        }
    }
}

fn run_jobs(receiver: Receiver<Message>, name: String) {
    for message in receiver.iter() {
        match message {
            Message::Run(job) => {
                if let Err(panic) = panic::catch_unwind(AssertUnwindSafe(job)) {
                    log::error!(
                        "Job on worker {} panicked: {}",
                        name,
                        panic_message(panic.as_ref())
                    );
                }
            }
            Message::Quit => break,
        }
    }
    log::trace!("Worker {} drained", name);
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(message) = panic.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = panic.downcast_ref::<String>() {
        message.clone()
    } else {
        "unknown panic".to_string()
    }
}
