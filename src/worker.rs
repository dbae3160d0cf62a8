use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};

use crate::error::{ShutdownError, WorkerError};

/// The behaviour a [`Worker`] runs on its thread.
///
/// `run_once` is called over and over until the worker is asked to stop or
/// `should_continue` returns `false`. A stop request is only noticed between
/// two calls, never during one.
///
/// Work only ever talks to the display through the
/// [`VisibilityHandles`] it was constructed with.
///
/// [`Worker`]: struct.Worker.html
/// [`VisibilityHandles`]: struct.VisibilityHandles.html
pub trait Work: Send + 'static {
    fn run_once(&mut self) -> anyhow::Result<()>;

    fn should_continue(&self) -> bool {
        true
    }
}

impl<F> Work for F
where
    F: FnMut() -> anyhow::Result<()> + Send + 'static,
{
    fn run_once(&mut self) -> anyhow::Result<()> {
        self()
    }
}

/// What the worker does when `run_once` returns an error.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub enum ErrorPolicy {
    /// End the loop. The error is handed back by [`Worker::stop`].
    ///
    /// [`Worker::stop`]: struct.Worker.html#method.stop
    #[default]
    Stop,
    /// Log the error and keep going.
    LogAndContinue,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WorkerState {
    Created,
    Running,
    StopRequested,
    Stopped,
}

impl WorkerState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => WorkerState::Created,
            1 => WorkerState::Running,
            2 => WorkerState::StopRequested,
            _ => WorkerState::Stopped,
        }
    }
}

struct Shared {
    stop: AtomicBool,
    state: AtomicU8,
}

impl Shared {
    fn state(&self) -> WorkerState {
        WorkerState::from_u8(self.state.load(Ordering::Acquire))
    }

    fn set_state(&self, state: WorkerState) {
        self.state.store(state as u8, Ordering::Release);
    }
}

/// Marks the worker stopped when its thread exits, even by panic. Dropping
/// the sender wakes up a bounded [`Worker::stop_timeout`].
///
/// [`Worker::stop_timeout`]: struct.Worker.html#method.stop_timeout
struct ExitGuard {
    shared: Arc<Shared>,
    _done: Sender<()>,
}

impl Drop for ExitGuard {
    fn drop(&mut self) {
        self.shared.set_state(WorkerState::Stopped);
    }
}

/// Runs a [`Work`] on a dedicated thread until stopped.
///
/// [`Work`]: trait.Work.html
pub struct Worker {
    name: String,
    policy: ErrorPolicy,
    shared: Arc<Shared>,
    work: Option<Box<dyn Work>>,
    stack_size: Option<usize>,
    thread: Option<JoinHandle<anyhow::Result<()>>>,
    done: Option<Receiver<()>>,
}

impl Worker {
    pub fn new<N: Into<String>, W: Work>(name: N, work: W, policy: ErrorPolicy) -> Self {
        Self {
            name: name.into(),
            policy,
            shared: Arc::new(Shared {
                stop: AtomicBool::new(false),
                state: AtomicU8::new(WorkerState::Created as u8),
            }),
            work: Some(Box::new(work)),
            stack_size: None,
            thread: None,
            done: None,
        }
    }

    /// Sets the stack size of the worker thread, in bytes.
    pub fn with_stack_size(mut self, bytes: usize) -> Self {
        self.stack_size = Some(bytes);
        self
    }

    /// Spawns the worker thread.
    ///
    /// If the thread cannot be spawned the worker keeps its work and stays
    /// [`Created`], so starting can be retried.
    ///
    /// [`Created`]: enum.WorkerState.html#variant.Created
    pub fn start(&mut self) -> Result<(), WorkerError> {
        let work = match self.work.take() {
            Some(work) => work,
            None => return Err(WorkerError::AlreadyStarted(self.name.clone())),
        };

        let (done_tx, done_rx) = crossbeam_channel::bounded(1);
        let guard = ExitGuard {
            shared: Arc::clone(&self.shared),
            _done: done_tx,
        };
        // The work is handed over only once the thread exists.
        let (work_tx, work_rx) = crossbeam_channel::bounded::<Box<dyn Work>>(1);
        let name = self.name.clone();
        let policy = self.policy;

        self.shared.set_state(WorkerState::Running);

        let mut builder = thread::Builder::new().name(self.name.clone());
        if let Some(bytes) = self.stack_size {
            builder = builder.stack_size(bytes);
        }
        let spawned = builder.spawn(move || match work_rx.recv() {
            Ok(work) => run(name, work, policy, guard),
            Err(_) => Ok(()),
        });

        match spawned {
            Ok(thread) => {
                if work_tx.send(work).is_err() {
                    log::error!("worker {} exited before receiving its work", self.name);
                }
                log::info!("worker {} started", self.name);
                self.thread = Some(thread);
                self.done = Some(done_rx);
                Ok(())
            }
            Err(source) => {
                self.work = Some(work);
                self.shared.set_state(WorkerState::Created);
                log::error!("could not spawn worker {}: {}", self.name, source);
                Err(WorkerError::Spawn {
                    name: self.name.clone(),
                    source,
                })
            }
        }
    }

    /// Asks the worker to stop and blocks until its thread has exited.
    ///
    /// Once this returns `Ok`, the worker pushes no more commands.
    pub fn stop(&mut self) -> Result<(), ShutdownError> {
        self.shutdown(None)
    }

    /// Like [`stop`], but gives up after `timeout`.
    ///
    /// On [`ShutdownError::Timeout`] the worker keeps its thread, so stopping
    /// can be retried.
    ///
    /// [`stop`]: #method.stop
    /// [`ShutdownError::Timeout`]: enum.ShutdownError.html#variant.Timeout
    pub fn stop_timeout(&mut self, timeout: Duration) -> Result<(), ShutdownError> {
        self.shutdown(Some(timeout))
    }

    fn shutdown(&mut self, timeout: Option<Duration>) -> Result<(), ShutdownError> {
        let thread = match self.thread.take() {
            Some(thread) => thread,
            None => {
                // Never started, or already joined.
                self.work = None;
                self.shared.set_state(WorkerState::Stopped);
                return Ok(());
            }
        };

        self.shared.stop.store(true, Ordering::Release);
        let _ = self.shared.state.compare_exchange(
            WorkerState::Running as u8,
            WorkerState::StopRequested as u8,
            Ordering::AcqRel,
            Ordering::Acquire,
        );

        if let (Some(timeout), Some(done)) = (timeout, &self.done) {
            if let Err(RecvTimeoutError::Timeout) = done.recv_timeout(timeout) {
                log::warn!("worker {} did not stop within {:?}", self.name, timeout);
                self.thread = Some(thread);
                return Err(ShutdownError::Timeout(timeout));
            }
        }
        self.done = None;

        let result = match thread.join() {
            Ok(Ok(())) => Ok(()),
            Ok(Err(err)) => Err(ShutdownError::WorkFailed(err)),
            Err(_) => Err(ShutdownError::Panicked),
        };
        log::info!("worker {} stopped", self.name);

        result
    }

    pub fn state(&self) -> WorkerState {
        self.shared.state()
    }

    /// `true` once the worker thread has exited.
    pub fn is_finished(&self) -> bool {
        self.state() == WorkerState::Stopped
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl Drop for Worker {
    fn drop(&mut self) {
        if self.thread.is_none() {
            return;
        }

        // A bounded stop already gave up on this thread. Detach it rather
        // than block forever.
        if self.state() == WorkerState::StopRequested {
            log::warn!("detaching worker {} which did not stop in time", self.name);
            self.thread = None;
            return;
        }

        if let Err(err) = self.stop() {
            log::error!("worker {} shut down with an error: {}", self.name, err);
        }
    }
}

impl std::fmt::Debug for Worker {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Worker")
            .field("name", &self.name)
            .field("policy", &self.policy)
            .field("state", &self.state())
            .finish()
    }
}

fn run(
    name: String,
    mut work: Box<dyn Work>,
    policy: ErrorPolicy,
    guard: ExitGuard,
) -> anyhow::Result<()> {
    loop {
        if guard.shared.stop.load(Ordering::Acquire) {
            return Ok(());
        }

        if !work.should_continue() {
            log::debug!("worker {} has no more work", name);
            return Ok(());
        }

        if let Err(err) = work.run_once() {
            match policy {
                ErrorPolicy::Stop => {
                    log::error!("worker {} failed: {:#}", name, err);
                    return Err(err);
                }
                ErrorPolicy::LogAndContinue => {
                    log::warn!("worker {} iteration failed: {:#}", name, err);
                }
            }
        }
    }
}
