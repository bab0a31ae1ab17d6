//! IR+ remote control bridge
//!
//! Reads decoded IR codes from an Arduino receiver over serial, resolves them
//! with [`irplus_engine`], and injects keyboard and mouse input through a
//! uinput virtual device.

pub mod app;
pub mod config;
pub mod console;
pub mod detector;
pub mod device;
pub mod dispatch;
pub mod notify;
pub mod serial;
pub mod store;

pub use app::App;
pub use config::AppConfig;
pub use detector::{Detector, StopToken};
pub use device::{DeviceError, InputSink, RecordingSink, SinkEvent, VirtualInput};
pub use dispatch::Dispatcher;
pub use notify::{CloseAction, LogNotifier, Notice, Notifier};
pub use serial::{LineReader, SignalSource, SourceError};
pub use store::{ConfigStore, StoreError};
