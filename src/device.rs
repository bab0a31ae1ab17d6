//! Virtual keyboard and mouse using evdev/uinput
//!
//! Creates one virtual device with the keys the engine can emit, the two
//! mouse buttons, and relative X/Y axes.

use evdev::{
    uinput::{VirtualDevice, VirtualDeviceBuilder},
    AttributeSet, EventType, InputEvent, Key, RelativeAxisType,
};
use irplus_engine::{KeySymbol, MouseButton, NamedKey};
use thiserror::Error;
use tracing::info;

/// Errors from virtual input operations
#[derive(Debug, Error)]
pub enum DeviceError {
    #[error("Failed to create virtual device: {0}")]
    CreateDevice(#[source] std::io::Error),
    #[error("Failed to emit event: {0}")]
    EmitEvent(#[source] std::io::Error),
    #[error("No key code for symbol {0}")]
    Unmappable(KeySymbol),
}

/// Keyboard and mouse injection capability.
pub trait InputSink: Send {
    fn press_key(&mut self, key: KeySymbol) -> Result<(), DeviceError>;
    fn release_key(&mut self, key: KeySymbol) -> Result<(), DeviceError>;
    fn move_mouse(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError>;
    fn click_mouse(&mut self, button: MouseButton, count: u8) -> Result<(), DeviceError>;
}

impl<T: InputSink + ?Sized> InputSink for Box<T> {
    fn press_key(&mut self, key: KeySymbol) -> Result<(), DeviceError> {
        (**self).press_key(key)
    }

    fn release_key(&mut self, key: KeySymbol) -> Result<(), DeviceError> {
        (**self).release_key(key)
    }

    fn move_mouse(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError> {
        (**self).move_mouse(dx, dy)
    }

    fn click_mouse(&mut self, button: MouseButton, count: u8) -> Result<(), DeviceError> {
        (**self).click_mouse(button, count)
    }
}

/// uinput-backed keyboard + mouse
pub struct VirtualInput {
    device: VirtualDevice,
}

impl VirtualInput {
    /// Create a new virtual input device
    ///
    /// # Arguments
    /// * `name` - Device name (shown in `evtest` and `libinput list-devices`)
    pub fn new(name: &str) -> Result<Self, DeviceError> {
        let mut keys = AttributeSet::<Key>::new();
        for key in supported_keys() {
            keys.insert(key);
        }
        keys.insert(Key::BTN_LEFT);
        keys.insert(Key::BTN_RIGHT);

        let mut axes = AttributeSet::<RelativeAxisType>::new();
        axes.insert(RelativeAxisType::REL_X);
        axes.insert(RelativeAxisType::REL_Y);

        let device = VirtualDeviceBuilder::new()
            .map_err(DeviceError::CreateDevice)?
            .name(name)
            .with_keys(&keys)
            .map_err(DeviceError::CreateDevice)?
            .with_relative_axes(&axes)
            .map_err(DeviceError::CreateDevice)?
            .build()
            .map_err(DeviceError::CreateDevice)?;

        info!("Created virtual input device: {}", name);
        Ok(Self { device })
    }

    /// Get the device path (e.g., /dev/input/eventX)
    pub fn device_path(&mut self) -> Option<std::path::PathBuf> {
        self.device
            .enumerate_dev_nodes_blocking()
            .ok()?
            .next()?
            .ok()
    }

    fn emit_key(&mut self, key: Key, value: i32) -> Result<(), DeviceError> {
        let event = InputEvent::new_now(EventType::KEY, key.code(), value);
        self.device.emit(&[event]).map_err(DeviceError::EmitEvent)
    }
}

impl InputSink for VirtualInput {
    fn press_key(&mut self, key: KeySymbol) -> Result<(), DeviceError> {
        self.emit_key(key_code(key)?, 1)
    }

    fn release_key(&mut self, key: KeySymbol) -> Result<(), DeviceError> {
        self.emit_key(key_code(key)?, 0)
    }

    fn move_mouse(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError> {
        let mut events = Vec::with_capacity(2);
        if dx != 0 {
            events.push(InputEvent::new_now(
                EventType::RELATIVE,
                RelativeAxisType::REL_X.0,
                dx,
            ));
        }
        if dy != 0 {
            events.push(InputEvent::new_now(
                EventType::RELATIVE,
                RelativeAxisType::REL_Y.0,
                dy,
            ));
        }
        if events.is_empty() {
            return Ok(());
        }
        self.device.emit(&events).map_err(DeviceError::EmitEvent)
    }

    fn click_mouse(&mut self, button: MouseButton, count: u8) -> Result<(), DeviceError> {
        let code = match button {
            MouseButton::Left => Key::BTN_LEFT,
            MouseButton::Right => Key::BTN_RIGHT,
        };
        for _ in 0..count {
            self.emit_key(code, 1)?;
            self.emit_key(code, 0)?;
        }
        Ok(())
    }
}

/// Convert a key symbol to its evdev key code
pub fn key_code(symbol: KeySymbol) -> Result<Key, DeviceError> {
    let key = match symbol {
        KeySymbol::Named(named) => match named {
            NamedKey::Space => Key::KEY_SPACE,
            NamedKey::Enter => Key::KEY_ENTER,
            NamedKey::Backspace => Key::KEY_BACKSPACE,
            NamedKey::Escape => Key::KEY_ESC,
            NamedKey::Up => Key::KEY_UP,
            NamedKey::Down => Key::KEY_DOWN,
            NamedKey::Left => Key::KEY_LEFT,
            NamedKey::Right => Key::KEY_RIGHT,
        },
        KeySymbol::Char(c) => match c {
            'a' => Key::KEY_A,
            'b' => Key::KEY_B,
            'c' => Key::KEY_C,
            'd' => Key::KEY_D,
            'e' => Key::KEY_E,
            'f' => Key::KEY_F,
            'g' => Key::KEY_G,
            'h' => Key::KEY_H,
            'i' => Key::KEY_I,
            'j' => Key::KEY_J,
            'k' => Key::KEY_K,
            'l' => Key::KEY_L,
            'm' => Key::KEY_M,
            'n' => Key::KEY_N,
            'o' => Key::KEY_O,
            'p' => Key::KEY_P,
            'q' => Key::KEY_Q,
            'r' => Key::KEY_R,
            's' => Key::KEY_S,
            't' => Key::KEY_T,
            'u' => Key::KEY_U,
            'v' => Key::KEY_V,
            'w' => Key::KEY_W,
            'x' => Key::KEY_X,
            'y' => Key::KEY_Y,
            'z' => Key::KEY_Z,
            '0' => Key::KEY_0,
            '1' => Key::KEY_1,
            '2' => Key::KEY_2,
            '3' => Key::KEY_3,
            '4' => Key::KEY_4,
            '5' => Key::KEY_5,
            '6' => Key::KEY_6,
            '7' => Key::KEY_7,
            '8' => Key::KEY_8,
            '9' => Key::KEY_9,
            _ => return Err(DeviceError::Unmappable(symbol)),
        },
    };
    Ok(key)
}

/// Every keyboard key the engine can emit.
fn supported_keys() -> impl Iterator<Item = Key> {
    let named = [
        NamedKey::Space,
        NamedKey::Enter,
        NamedKey::Backspace,
        NamedKey::Escape,
        NamedKey::Up,
        NamedKey::Down,
        NamedKey::Left,
        NamedKey::Right,
    ]
    .into_iter()
    .map(KeySymbol::Named);
    let chars = ('a'..='z').chain('0'..='9').map(KeySymbol::Char);
    named.chain(chars).filter_map(|s| key_code(s).ok())
}

/// One call recorded by [`RecordingSink`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SinkEvent {
    Press(KeySymbol),
    Release(KeySymbol),
    Move(i32, i32),
    Click(MouseButton, u8),
}

/// Sink that records calls instead of injecting them (`--dry-run`, tests)
///
/// A verbose sink logs each call and keeps nothing, so a long dry run does
/// not grow without bound.
#[derive(Debug, Default)]
pub struct RecordingSink {
    pub events: Vec<SinkEvent>,
    /// Log each call at info level instead of storing it
    pub verbose: bool,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn verbose() -> Self {
        Self {
            events: Vec::new(),
            verbose: true,
        }
    }

    fn record(&mut self, event: SinkEvent) {
        if self.verbose {
            info!("dry-run: {:?}", event);
        } else {
            self.events.push(event);
        }
    }
}

impl InputSink for RecordingSink {
    fn press_key(&mut self, key: KeySymbol) -> Result<(), DeviceError> {
        self.record(SinkEvent::Press(key));
        Ok(())
    }

    fn release_key(&mut self, key: KeySymbol) -> Result<(), DeviceError> {
        self.record(SinkEvent::Release(key));
        Ok(())
    }

    fn move_mouse(&mut self, dx: i32, dy: i32) -> Result<(), DeviceError> {
        self.record(SinkEvent::Move(dx, dy));
        Ok(())
    }

    fn click_mouse(&mut self, button: MouseButton, count: u8) -> Result<(), DeviceError> {
        self.record(SinkEvent::Click(button, count));
        Ok(())
    }
}
