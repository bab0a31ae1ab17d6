//! Turns resolved actions into device input and notifications

use std::sync::Arc;
use std::time::Duration;

use irplus_engine::{ConcreteAction, KeySymbol, Mode, NamedKey};

use crate::device::{DeviceError, InputSink};
use crate::notify::{Notice, Notifier};

/// How long the mode-switch toast stays up
const MODE_NOTICE_TIMEOUT: Duration = Duration::from_millis(3000);

pub struct Dispatcher<S> {
    sink: S,
    notifier: Arc<dyn Notifier>,
}

impl<S: InputSink> Dispatcher<S> {
    pub fn new(sink: S, notifier: Arc<dyn Notifier>) -> Self {
        Self { sink, notifier }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    pub fn dispatch(&mut self, action: &ConcreteAction) -> Result<(), DeviceError> {
        match *action {
            ConcreteAction::MoveMouse { dx, dy } => self.sink.move_mouse(dx, dy),
            ConcreteAction::Click { button, count } => self.sink.click_mouse(button, count),
            ConcreteAction::Tap(symbol) => self.tap(symbol),
            ConcreteAction::Retype(symbol) => {
                self.tap(KeySymbol::Named(NamedKey::Backspace))?;
                self.tap(symbol)
            }
            ConcreteAction::SwitchMode(mode) => {
                self.notifier.notify(
                    Notice::new(mode_message(mode)).with_timeout(MODE_NOTICE_TIMEOUT),
                );
                Ok(())
            }
            ConcreteAction::Quit => {
                self.notifier
                    .notify(Notice::new("Stopping remote control").then_exit());
                Ok(())
            }
        }
    }

    fn tap(&mut self, symbol: KeySymbol) -> Result<(), DeviceError> {
        self.sink.press_key(symbol)?;
        self.sink.release_key(symbol)
    }
}

fn mode_message(mode: Option<Mode>) -> String {
    match mode {
        Some(mode) => format!("Switched to {} mode", mode.display_name()),
        None => "Switched to default mode".to_string(),
    }
}
