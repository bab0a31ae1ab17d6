//! Background signal detection
//!
//! One worker thread owns the resolver, the signal source and the
//! dispatcher. It reads frames with a short timeout so a stop request is
//! noticed within one read.

use std::fmt;
use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc as std_mpsc;
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use irplus_engine::{ActionResolver, Bindings, Signal};
use parking_lot::Mutex;
use thiserror::Error;
use tokio::sync::mpsc;
use tracing::{debug, error, info, warn};

use crate::device::InputSink;
use crate::dispatch::Dispatcher;
use crate::serial::{decode_frame, SignalSource, SourceError};

/// Cooperative stop flag shared between threads
#[derive(Debug, Clone, Default)]
pub struct StopToken(Arc<AtomicBool>);

impl StopToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn request(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_requested(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Resolve once a stop has been requested
    pub async fn cancelled(&self) {
        while !self.is_requested() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }
}

/// The worker thread could not be started. Carries the dispatcher back so
/// its device outlives the failure.
#[derive(Error)]
#[error("Failed to spawn detection worker: {source}")]
pub struct StartError<S> {
    #[source]
    pub source: io::Error,
    pub dispatcher: Dispatcher<S>,
}

impl<S> fmt::Debug for StartError<S> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StartError")
            .field("source", &self.source)
            .finish_non_exhaustive()
    }
}

/// State visible to the front-end while the worker runs
#[derive(Debug, Default)]
struct Shared {
    actions_enabled: AtomicBool,
    echo: AtomicBool,
    last_seen: Mutex<Option<Signal>>,
}

struct Worker<S> {
    stop: StopToken,
    updates: mpsc::UnboundedSender<Bindings>,
    handle: JoinHandle<Option<Dispatcher<S>>>,
}

/// Starts and stops the detection worker
pub struct Detector<S> {
    shared: Arc<Shared>,
    retry_delay: Duration,
    worker: Option<Worker<S>>,
}

impl<S: InputSink + 'static> Detector<S> {
    /// `retry_delay` is how long to back off after a failed read; use the
    /// source's read timeout.
    pub fn new(retry_delay: Duration) -> Self {
        Self {
            shared: Arc::new(Shared::default()),
            retry_delay,
            worker: None,
        }
    }

    /// Spawn the worker. Returns `false` (and drops the given parts) if a
    /// worker is already running.
    pub fn start<Src>(
        &mut self,
        source: Src,
        resolver: ActionResolver,
        dispatcher: Dispatcher<S>,
    ) -> Result<bool, StartError<S>>
    where
        Src: SignalSource + 'static,
    {
        if self.is_running() {
            debug!("Detection already running");
            return Ok(false);
        }
        // A worker that ended on its own still needs joining
        self.reap();

        let stop = StopToken::new();
        let (tx, rx) = mpsc::unbounded_channel();
        let session = Session {
            source,
            resolver,
            dispatcher,
            shared: Arc::clone(&self.shared),
            stop: stop.clone(),
            updates: rx,
            retry_delay: self.retry_delay,
        };
        let builder = thread::Builder::new().name("ir-detector".to_string());
        let handle = spawn_worker(builder, session).map_err(|(source, session)| StartError {
            source,
            dispatcher: session.dispatcher,
        })?;

        self.worker = Some(Worker {
            stop,
            updates: tx,
            handle,
        });
        Ok(true)
    }

    /// Stop the worker and wait for it. Returns the dispatcher so its device
    /// can be reused, or `None` if nothing was running.
    pub fn stop(&mut self) -> Option<Dispatcher<S>> {
        let worker = self.worker.take()?;
        worker.stop.request();
        match worker.handle.join() {
            Ok(dispatcher) => dispatcher,
            Err(_) => {
                error!("Detection worker panicked");
                None
            }
        }
    }

    /// Join a worker that already finished, keeping its dispatcher.
    pub fn reap(&mut self) -> Option<Dispatcher<S>> {
        if self
            .worker
            .as_ref()
            .is_some_and(|w| w.handle.is_finished())
        {
            return self.stop();
        }
        None
    }

    pub fn is_running(&self) -> bool {
        self.worker
            .as_ref()
            .is_some_and(|w| !w.handle.is_finished())
    }

    /// Resolve once no worker is running, including one that ended on its
    /// own because the receiver went away.
    pub async fn finished(&self) {
        while self.is_running() {
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
    }

    /// Hand a new binding snapshot to the running worker.
    pub fn update_bindings(&self, bindings: Bindings) {
        if let Some(worker) = &self.worker {
            if worker.updates.send(bindings).is_err() {
                debug!("Worker gone, binding update dropped");
            }
        }
    }

    pub fn set_actions_enabled(&self, enabled: bool) {
        self.shared.actions_enabled.store(enabled, Ordering::SeqCst);
    }

    pub fn actions_enabled(&self) -> bool {
        self.shared.actions_enabled.load(Ordering::SeqCst)
    }

    /// Log every received signal at info level
    pub fn set_echo(&self, echo: bool) {
        self.shared.echo.store(echo, Ordering::SeqCst);
    }

    /// Most recent decoded signal, bound or not
    pub fn last_seen(&self) -> Option<Signal> {
        self.shared.last_seen.lock().clone()
    }
}

impl<S> Drop for Detector<S> {
    fn drop(&mut self) {
        if let Some(worker) = self.worker.take() {
            worker.stop.request();
            let _ = worker.handle.join();
        }
    }
}

/// Spawn a thread for `session`. If the thread cannot be created the session
/// is returned with the error.
#[allow(clippy::type_complexity)]
fn spawn_worker<Src, S>(
    builder: thread::Builder,
    session: Session<Src, S>,
) -> Result<JoinHandle<Option<Dispatcher<S>>>, (io::Error, Session<Src, S>)>
where
    Src: SignalSource + 'static,
    S: InputSink + 'static,
{
    // Hand the session over only once the thread exists
    let (tx, rx) = std_mpsc::sync_channel::<Session<Src, S>>(1);
    let handle = match builder.spawn(move || rx.recv().ok().map(Session::run)) {
        Ok(handle) => handle,
        Err(e) => return Err((e, session)),
    };
    if let Err(std_mpsc::SendError(session)) = tx.send(session) {
        let _ = handle.join();
        return Err((io::Error::other("detection worker exited early"), session));
    }
    Ok(handle)
}

/// Everything the worker thread owns for one detection session
struct Session<Src, S> {
    source: Src,
    resolver: ActionResolver,
    dispatcher: Dispatcher<S>,
    shared: Arc<Shared>,
    stop: StopToken,
    updates: mpsc::UnboundedReceiver<Bindings>,
    retry_delay: Duration,
}

impl<Src: SignalSource, S: InputSink> Session<Src, S> {
    fn run(mut self) -> Dispatcher<S> {
        info!("Detection started");
        let clock = Instant::now();

        while !self.stop.is_requested() {
            while let Ok(bindings) = self.updates.try_recv() {
                self.resolver.set_bindings(bindings);
                debug!("Bindings updated, modes: {:?}", self.resolver.available_modes());
            }

            let frame = match self.source.next_frame() {
                Ok(Some(frame)) => frame,
                Ok(None) => continue,
                Err(SourceError::Closed) => {
                    warn!("Receiver disconnected");
                    break;
                }
                Err(e) => {
                    warn!("Receiver read failed: {}", e);
                    thread::sleep(self.retry_delay);
                    continue;
                }
            };

            let Some(signal) = decode_frame(&frame) else {
                continue;
            };
            if self.shared.echo.load(Ordering::Relaxed) {
                info!("<{}>", signal);
            } else {
                debug!("<{}>", signal);
            }
            *self.shared.last_seen.lock() = Some(signal.clone());

            if !self.shared.actions_enabled.load(Ordering::SeqCst) {
                continue;
            }
            let now_ms = clock.elapsed().as_millis() as u64;
            if let Some(action) = self.resolver.resolve(&signal, now_ms) {
                if let Err(e) = self.dispatcher.dispatch(&action) {
                    warn!("Failed to perform {:?}: {}", action, e);
                }
            }
        }

        self.resolver.reset();
        info!("Detection stopped");
        self.dispatcher
    }
}
