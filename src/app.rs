//! Wiring between the front-end, the binding store and the detector

use std::sync::Arc;

use anyhow::{bail, Result};
use irplus_engine::{ActionId, ActionResolver, Bindings, Signal};
use tracing::info;

use crate::config::AppConfig;
use crate::detector::{Detector, StartError};
use crate::device::InputSink;
use crate::dispatch::Dispatcher;
use crate::notify::{Notice, Notifier};
use crate::serial::{SignalSource, SourceError};
use crate::store::{ConfigStore, StoreError};

pub type BoxedSink = Box<dyn InputSink>;
pub type BoxedSource = Box<dyn SignalSource>;

/// Opens the receiver; called again on every restart after the first.
pub type SourceOpener = Box<dyn FnMut(&AppConfig) -> Result<BoxedSource, SourceError> + Send>;

pub struct App {
    config: AppConfig,
    store: ConfigStore,
    notifier: Arc<dyn Notifier>,
    detector: Detector<BoxedSink>,
    /// Dispatcher parked while no worker runs
    idle: Option<Dispatcher<BoxedSink>>,
    pending_source: Option<BoxedSource>,
    open_source: SourceOpener,
}

impl App {
    pub fn new(
        config: AppConfig,
        store: ConfigStore,
        notifier: Arc<dyn Notifier>,
        sink: BoxedSink,
        open_source: SourceOpener,
    ) -> Self {
        let detector = Detector::new(config.serial.read_timeout());
        let idle = Some(Dispatcher::new(sink, Arc::clone(&notifier)));
        Self {
            config,
            store,
            notifier,
            detector,
            idle,
            pending_source: None,
            open_source,
        }
    }

    /// Open the receiver now so a missing device is reported at startup.
    pub fn connect(&mut self) -> Result<(), SourceError> {
        if self.pending_source.is_none() {
            self.pending_source = Some((self.open_source)(&self.config)?);
        }
        Ok(())
    }

    pub fn notify(&self, notice: Notice) {
        self.notifier.notify(notice);
    }

    /// Start a fresh detection session. `Ok(false)` if one is running.
    pub fn start_detection(&mut self) -> Result<bool> {
        if let Some(dispatcher) = self.detector.reap() {
            self.idle = Some(dispatcher);
        }
        if self.detector.is_running() {
            return Ok(false);
        }
        let Some(dispatcher) = self.idle.take() else {
            bail!("Input device was lost; restart irplus");
        };

        let source = match self.pending_source.take() {
            Some(source) => source,
            None => match (self.open_source)(&self.config) {
                Ok(source) => source,
                Err(e) => {
                    self.idle = Some(dispatcher);
                    return Err(e.into());
                }
            },
        };

        let bindings = self.store.load();
        info!("Loaded {} bindings from {:?}", bindings.len(), self.store.path());
        let resolver = ActionResolver::new(bindings, self.config.timing(), self.config.ramp());
        if let Err(StartError { source, dispatcher }) =
            self.detector.start(source, resolver, dispatcher)
        {
            self.idle = Some(dispatcher);
            return Err(anyhow::Error::new(source).context("Failed to spawn detection worker"));
        }
        self.notify(Notice::new("Starting remote control"));
        Ok(true)
    }

    /// Stop detection. `false` if it was not running.
    pub fn stop_detection(&mut self) -> bool {
        match self.detector.stop() {
            Some(dispatcher) => {
                self.idle = Some(dispatcher);
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self) -> bool {
        self.detector.is_running()
    }

    /// Resolve once detection is no longer running
    pub async fn detection_finished(&self) {
        self.detector.finished().await
    }

    pub fn set_actions_enabled(&self, enabled: bool) {
        self.detector.set_actions_enabled(enabled);
    }

    pub fn actions_enabled(&self) -> bool {
        self.detector.actions_enabled()
    }

    pub fn set_echo(&self, echo: bool) {
        self.detector.set_echo(echo);
    }

    pub fn last_seen(&self) -> Option<Signal> {
        self.detector.last_seen()
    }

    pub fn bindings(&self) -> Bindings {
        self.store.load()
    }

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Bind the last seen signal to `action`. Returns the signal, or `None`
    /// if nothing has been received yet.
    pub fn save(&mut self, action: ActionId) -> Result<Option<Signal>, StoreError> {
        let Some(signal) = self.last_seen() else {
            return Ok(None);
        };
        let bindings = self.store.bind(signal.clone(), action)?;
        info!("Bound {} to {}", signal, action);
        self.detector.update_bindings(bindings);
        self.notify(Notice::new("Saved!"));
        Ok(Some(signal))
    }

    /// Forget every binding.
    pub fn reset_bindings(&mut self) -> Result<(), StoreError> {
        self.store.clear()?;
        self.detector.update_bindings(Bindings::new());
        info!("Cleared all bindings");
        Ok(())
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.stop_detection();
    }
}
