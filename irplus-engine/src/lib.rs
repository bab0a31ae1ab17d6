//! IR+ resolution engine
//!
//! Translates decoded IR remote codes into keyboard and mouse actions.
//! Repeat codes are disambiguated purely from timing: held buttons continue,
//! rapid digit repeats cycle multi-tap letters, and a pause starts over.
//!
//! This crate does no I/O. Feed it [`Signal`]s with monotonic timestamps and
//! execute the [`ConcreteAction`]s it returns.

pub mod action;
pub mod bindings;
pub mod error;
pub mod modes;
pub mod motion;
pub mod resolver;
pub mod typing;

pub use action::{
    ActionId, Arrow, Category, ConcreteAction, Digit, Direction, KeySymbol, Mode, MouseButton,
    NamedKey,
};
pub use bindings::{Bindings, Signal};
pub use error::EngineError;
pub use motion::{MouseMotionRamp, RampConfig};
pub use resolver::{ActionResolver, EngineState, Timing};
pub use typing::MultiTapTypewriter;
