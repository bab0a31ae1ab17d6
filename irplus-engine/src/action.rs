//! Symbolic actions, modes and the concrete actions they resolve to.
//!
//! [`ActionId`] is the closed set of things a remote button can be bound to.
//! Its [`Display`](fmt::Display) form is the human-readable name stored in
//! the bindings file, and [`FromStr`] parses it back (case-insensitive).
//!
//! ```text
//! Move mouse left     → MoveMouse(Left)
//! Mouse double click  → MouseDoubleClick
//! Type p q r s 7      → TypeDigit(Digit::D7)
//! type 0              → TypeDigit(Digit::D0)
//! Navigation wildcard → NavigationWildcard
//! ```

use std::fmt;
use std::str::FromStr;

use crate::error::EngineError;

/// Direction of a mouse move.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Left,
    Right,
    Up,
    Down,
}

impl Direction {
    /// Unit vector for this direction (screen coordinates, y grows downward).
    pub fn unit(self) -> (i32, i32) {
        match self {
            Direction::Left => (-1, 0),
            Direction::Right => (1, 0),
            Direction::Up => (0, -1),
            Direction::Down => (0, 1),
        }
    }
}

/// A keypad digit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Digit {
    D0,
    D1,
    D2,
    D3,
    D4,
    D5,
    D6,
    D7,
    D8,
    D9,
}

impl Digit {
    pub const ALL: [Digit; 10] = [
        Digit::D0,
        Digit::D1,
        Digit::D2,
        Digit::D3,
        Digit::D4,
        Digit::D5,
        Digit::D6,
        Digit::D7,
        Digit::D8,
        Digit::D9,
    ];

    pub fn value(self) -> u8 {
        self as u8
    }

    pub fn as_char(self) -> char {
        char::from(b'0' + self.value())
    }
}

impl TryFrom<u8> for Digit {
    type Error = EngineError;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        Digit::ALL
            .get(usize::from(value))
            .copied()
            .ok_or(EngineError::InvalidDigit(value))
    }
}

impl fmt::Display for Digit {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.value())
    }
}

/// Arrow key direction for navigation actions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arrow {
    Up,
    Down,
    Left,
    Right,
}

/// Mouse buttons that can be clicked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MouseButton {
    Left,
    Right,
}

/// Non-character keys the engine can emit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NamedKey {
    Space,
    Enter,
    Backspace,
    Escape,
    Up,
    Down,
    Left,
    Right,
}

/// A single key to press and release.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySymbol {
    /// Lowercase letter `a`-`z` or digit `0`-`9`.
    Char(char),
    Named(NamedKey),
}

impl fmt::Display for KeySymbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeySymbol::Char(c) => write!(f, "{c}"),
            KeySymbol::Named(key) => write!(f, "{key:?}"),
        }
    }
}

/// Named action groups. Declaration order is the mode cycling order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Mode {
    MouseControl,
    Typing,
    NavigationControl,
    AppCommands,
}

impl Mode {
    /// All modes in declaration order.
    pub const ALL: &'static [Mode] = &[
        Mode::MouseControl,
        Mode::Typing,
        Mode::NavigationControl,
        Mode::AppCommands,
    ];

    /// Display name for the mode
    pub fn display_name(&self) -> &'static str {
        match self {
            Mode::MouseControl => "Mouse control",
            Mode::Typing => "Typing",
            Mode::NavigationControl => "Navigation control",
            Mode::AppCommands => "App commands",
        }
    }

    /// Whether `Mode` actions may switch to this mode.
    pub fn is_cyclable(&self) -> bool {
        !matches!(self, Mode::AppCommands)
    }

    /// Actions belonging to this mode, in menu order.
    pub fn actions(&self) -> impl Iterator<Item = ActionId> + '_ {
        ActionId::ALL.iter().copied().filter(move |a| a.mode() == *self)
    }

    /// Wildcard action of this mode's category, if it has one.
    pub fn wildcard(&self) -> Option<ActionId> {
        match self {
            Mode::MouseControl => Some(ActionId::MouseWildcard),
            Mode::Typing => Some(ActionId::TypingWildcard),
            Mode::NavigationControl => Some(ActionId::NavigationWildcard),
            Mode::AppCommands => None,
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

/// Every action a remote signal can be bound to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ActionId {
    MoveMouse(Direction),
    MouseLeftClick,
    MouseRightClick,
    MouseDoubleClick,
    MouseWildcard,
    /// Digit key 0-9. 2-9 go through multi-tap typing.
    TypeDigit(Digit),
    Space,
    Backspace,
    TypingWildcard,
    Arrow(Arrow),
    Enter,
    Escape,
    NavigationWildcard,
    Quit,
    Mode,
}

/// How an action is gated against repeats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    /// Continuous motion, never debounced.
    MouseMove(Direction),
    /// Debounced with the click threshold.
    Click { button: MouseButton, count: u8 },
    /// Debounced with the general threshold.
    Key(KeySymbol),
    /// Multi-tap digit 2-9.
    MultiTap(Digit),
    Quit,
    Mode,
    /// Repeat code, continues the previous action of `Mode`.
    Wildcard(Mode),
}

impl ActionId {
    /// Every action, grouped by mode in declaration order.
    pub const ALL: &'static [ActionId] = &[
        ActionId::MoveMouse(Direction::Left),
        ActionId::MoveMouse(Direction::Right),
        ActionId::MoveMouse(Direction::Up),
        ActionId::MoveMouse(Direction::Down),
        ActionId::MouseLeftClick,
        ActionId::MouseRightClick,
        ActionId::MouseDoubleClick,
        ActionId::MouseWildcard,
        ActionId::TypeDigit(Digit::D0),
        ActionId::TypeDigit(Digit::D1),
        ActionId::TypeDigit(Digit::D2),
        ActionId::TypeDigit(Digit::D3),
        ActionId::TypeDigit(Digit::D4),
        ActionId::TypeDigit(Digit::D5),
        ActionId::TypeDigit(Digit::D6),
        ActionId::TypeDigit(Digit::D7),
        ActionId::TypeDigit(Digit::D8),
        ActionId::TypeDigit(Digit::D9),
        ActionId::Space,
        ActionId::Backspace,
        ActionId::TypingWildcard,
        ActionId::Arrow(Arrow::Up),
        ActionId::Arrow(Arrow::Down),
        ActionId::Arrow(Arrow::Left),
        ActionId::Arrow(Arrow::Right),
        ActionId::Enter,
        ActionId::Escape,
        ActionId::NavigationWildcard,
        ActionId::Quit,
        ActionId::Mode,
    ];

    /// The mode group this action belongs to.
    pub fn mode(&self) -> Mode {
        match self {
            ActionId::MoveMouse(_)
            | ActionId::MouseLeftClick
            | ActionId::MouseRightClick
            | ActionId::MouseDoubleClick
            | ActionId::MouseWildcard => Mode::MouseControl,
            ActionId::TypeDigit(_)
            | ActionId::Space
            | ActionId::Backspace
            | ActionId::TypingWildcard => Mode::Typing,
            ActionId::Arrow(_)
            | ActionId::Enter
            | ActionId::Escape
            | ActionId::NavigationWildcard => Mode::NavigationControl,
            ActionId::Quit | ActionId::Mode => Mode::AppCommands,
        }
    }

    /// Repeat-gating category of this action.
    pub fn category(&self) -> Category {
        match *self {
            ActionId::MoveMouse(dir) => Category::MouseMove(dir),
            ActionId::MouseLeftClick => Category::Click {
                button: MouseButton::Left,
                count: 1,
            },
            ActionId::MouseRightClick => Category::Click {
                button: MouseButton::Right,
                count: 1,
            },
            ActionId::MouseDoubleClick => Category::Click {
                button: MouseButton::Left,
                count: 2,
            },
            ActionId::TypeDigit(d @ (Digit::D0 | Digit::D1)) => {
                Category::Key(KeySymbol::Char(d.as_char()))
            }
            ActionId::TypeDigit(d) => Category::MultiTap(d),
            ActionId::Space => Category::Key(KeySymbol::Named(NamedKey::Space)),
            ActionId::Backspace => Category::Key(KeySymbol::Named(NamedKey::Backspace)),
            ActionId::Enter => Category::Key(KeySymbol::Named(NamedKey::Enter)),
            ActionId::Escape => Category::Key(KeySymbol::Named(NamedKey::Escape)),
            ActionId::Arrow(arrow) => Category::Key(KeySymbol::Named(match arrow {
                Arrow::Up => NamedKey::Up,
                Arrow::Down => NamedKey::Down,
                Arrow::Left => NamedKey::Left,
                Arrow::Right => NamedKey::Right,
            })),
            ActionId::Quit => Category::Quit,
            ActionId::Mode => Category::Mode,
            ActionId::MouseWildcard => Category::Wildcard(Mode::MouseControl),
            ActionId::TypingWildcard => Category::Wildcard(Mode::Typing),
            ActionId::NavigationWildcard => Category::Wildcard(Mode::NavigationControl),
        }
    }

    /// Whether this is one of the three repeat-code wildcards.
    pub fn is_wildcard(&self) -> bool {
        matches!(self.category(), Category::Wildcard(_))
    }

    /// Human-readable name, also the persisted form.
    pub fn name(&self) -> &'static str {
        match self {
            ActionId::MoveMouse(Direction::Left) => "Move mouse left",
            ActionId::MoveMouse(Direction::Right) => "Move mouse right",
            ActionId::MoveMouse(Direction::Up) => "Move mouse up",
            ActionId::MoveMouse(Direction::Down) => "Move mouse down",
            ActionId::MouseLeftClick => "Mouse left click",
            ActionId::MouseRightClick => "Mouse right click",
            ActionId::MouseDoubleClick => "Mouse double click",
            ActionId::MouseWildcard => "Mouse movement wildcard",
            ActionId::TypeDigit(Digit::D0) => "Type 0",
            ActionId::TypeDigit(Digit::D1) => "Type 1",
            ActionId::TypeDigit(Digit::D2) => "Type a b c 2",
            ActionId::TypeDigit(Digit::D3) => "Type d e f 3",
            ActionId::TypeDigit(Digit::D4) => "Type g h i 4",
            ActionId::TypeDigit(Digit::D5) => "Type j k l 5",
            ActionId::TypeDigit(Digit::D6) => "Type m n o 6",
            ActionId::TypeDigit(Digit::D7) => "Type p q r s 7",
            ActionId::TypeDigit(Digit::D8) => "Type t u v 8",
            ActionId::TypeDigit(Digit::D9) => "Type w x y z 9",
            ActionId::Space => "Space",
            ActionId::Backspace => "Backspace",
            ActionId::TypingWildcard => "Typing wildcard",
            ActionId::Arrow(Arrow::Up) => "Up arrow",
            ActionId::Arrow(Arrow::Down) => "Down arrow",
            ActionId::Arrow(Arrow::Left) => "Left arrow",
            ActionId::Arrow(Arrow::Right) => "Right arrow",
            ActionId::Enter => "Enter",
            ActionId::Escape => "Escape",
            ActionId::NavigationWildcard => "Navigation wildcard",
            ActionId::Quit => "Quit",
            ActionId::Mode => "Mode",
        }
    }
}

impl fmt::Display for ActionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ActionId {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.split_whitespace().collect::<Vec<_>>().join(" ");
        ActionId::ALL
            .iter()
            .copied()
            .find(|a| a.name().eq_ignore_ascii_case(&wanted))
            .ok_or_else(|| EngineError::UnknownAction(s.to_string()))
    }
}

/// What the dispatcher should do after a signal has been resolved.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConcreteAction {
    /// Relative pointer motion.
    MoveMouse { dx: i32, dy: i32 },
    Click { button: MouseButton, count: u8 },
    /// Press and release one key.
    Tap(KeySymbol),
    /// Backspace over the last multi-tap symbol, then type this one.
    Retype(KeySymbol),
    /// Mode after the switch (`None` when nothing is available to cycle to).
    SwitchMode(Option<Mode>),
    Quit,
}
