//! Signal → concrete action resolution.
//!
//! [`ActionResolver`] owns all timing state. Each call to
//! [`resolve`](ActionResolver::resolve) picks one bound action for the
//! active mode, expands wildcard repeat codes into the action they continue,
//! and applies the repeat gate for that action's category:
//!
//! | Category            | Gate                                        |
//! |---------------------|---------------------------------------------|
//! | mouse move          | never gated, speed ramps while held         |
//! | click               | changed action or elapsed > click threshold |
//! | key / quit / mode   | changed action or elapsed > threshold       |
//! | multi-tap digit     | [`MultiTapTypewriter`]                      |
//!
//! State is only committed when something is emitted.

use tracing::{debug, trace};

use crate::action::{ActionId, Category, ConcreteAction, Mode};
use crate::bindings::{Bindings, Signal};
use crate::modes;
use crate::motion::{MouseMotionRamp, RampConfig};
use crate::typing::MultiTapTypewriter;

/// Repeat thresholds in milliseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Timing {
    /// Minimum gap before a key, quit or mode action repeats
    pub threshold_ms: u64,
    /// Minimum gap between multi-tap cycles (shorter than `threshold_ms`)
    pub typing_threshold_ms: u64,
    /// Minimum gap before a click repeats
    pub click_threshold_ms: u64,
}

impl Default for Timing {
    fn default() -> Self {
        Self {
            threshold_ms: 800,
            typing_threshold_ms: 250,
            click_threshold_ms: 400,
        }
    }
}

/// Mutable engine state for one detection session.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EngineState {
    last_action: Option<ActionId>,
    last_action_time: u64,
    current_mode: Option<Mode>,
    available_modes: Vec<Mode>,
    ramp: MouseMotionRamp,
    typewriter: MultiTapTypewriter,
}

impl EngineState {
    pub fn last_action(&self) -> Option<ActionId> {
        self.last_action
    }

    pub fn last_action_time(&self) -> u64 {
        self.last_action_time
    }

    pub fn current_mode(&self) -> Option<Mode> {
        self.current_mode
    }

    pub fn available_modes(&self) -> &[Mode] {
        &self.available_modes
    }

    pub fn mouse_speed(&self) -> i32 {
        self.ramp.speed()
    }

    pub fn typing_index(&self) -> usize {
        self.typewriter.index()
    }
}

/// Turns received signals into concrete actions.
#[derive(Debug, Clone)]
pub struct ActionResolver {
    bindings: Bindings,
    timing: Timing,
    ramp_config: RampConfig,
    state: EngineState,
}

impl ActionResolver {
    pub fn new(bindings: Bindings, timing: Timing, ramp_config: RampConfig) -> Self {
        let mut resolver = Self {
            bindings: Bindings::new(),
            timing,
            ramp_config,
            state: EngineState::default(),
        };
        resolver.set_bindings(bindings);
        resolver
    }

    pub fn state(&self) -> &EngineState {
        &self.state
    }

    pub fn bindings(&self) -> &Bindings {
        &self.bindings
    }

    pub fn current_mode(&self) -> Option<Mode> {
        self.state.current_mode
    }

    pub fn available_modes(&self) -> &[Mode] {
        &self.state.available_modes
    }

    /// Swap in a new binding snapshot and recompute the available modes.
    ///
    /// A current mode that is no longer available is cleared.
    pub fn set_bindings(&mut self, bindings: Bindings) {
        self.state.available_modes = modes::available_modes(&bindings);
        if let Some(mode) = self.state.current_mode {
            if !self.state.available_modes.contains(&mode) {
                debug!("Mode {} no longer available, clearing", mode);
                self.state.current_mode = None;
            }
        }
        self.bindings = bindings;
    }

    /// Return to the at-rest state, keeping bindings and available modes.
    pub fn reset(&mut self) {
        self.state = EngineState {
            available_modes: std::mem::take(&mut self.state.available_modes),
            ..EngineState::default()
        };
    }

    /// Resolve one received signal at monotonic time `now_ms`.
    pub fn resolve(&mut self, signal: &Signal, now_ms: u64) -> Option<ConcreteAction> {
        let Some(selected) = self.bindings.get(signal).and_then(|a| self.select(a)) else {
            trace!("Unbound signal <{}>", signal);
            return None;
        };

        let action = if selected.is_wildcard() {
            self.continuation(selected)?
        } else {
            selected
        };

        let elapsed = now_ms.saturating_sub(self.state.last_action_time);
        let repeated = self.state.last_action == Some(action);
        let repeat_after = repeated.then_some(elapsed);
        let gate = |threshold: u64| !repeated || elapsed > threshold;

        let concrete = match action.category() {
            Category::MouseMove(direction) => {
                let (dx, dy) = self
                    .state
                    .ramp
                    .step(direction, repeat_after, &self.ramp_config);
                ConcreteAction::MoveMouse { dx, dy }
            }
            Category::Click { button, count } => {
                if !gate(self.timing.click_threshold_ms) {
                    return None;
                }
                ConcreteAction::Click { button, count }
            }
            Category::Key(symbol) => {
                if !gate(self.timing.threshold_ms) {
                    return None;
                }
                ConcreteAction::Tap(symbol)
            }
            Category::Quit => {
                if !gate(self.timing.threshold_ms) {
                    return None;
                }
                ConcreteAction::Quit
            }
            Category::Mode => {
                if !gate(self.timing.threshold_ms) {
                    return None;
                }
                self.state.current_mode =
                    modes::advance(self.state.current_mode, &self.state.available_modes);
                ConcreteAction::SwitchMode(self.state.current_mode)
            }
            Category::MultiTap(digit) => {
                self.state
                    .typewriter
                    .tap(digit, repeat_after, &self.timing)?
            }
            Category::Wildcard(_) => {
                debug!("Wildcard {} reached the gate unexpanded", action);
                return None;
            }
        };

        if !repeated && !matches!(action.category(), Category::MultiTap(_)) {
            self.state.typewriter.reset();
        }
        self.state.last_action = Some(action);
        self.state.last_action_time = now_ms;

        debug!("<{}> → {} → {:?}", signal, action, concrete);
        Some(concrete)
    }

    /// Pick the binding for the active mode, falling back to the default.
    fn select(&self, actions: &[ActionId]) -> Option<ActionId> {
        let default = *actions.first()?;
        let Some(mode) = self.state.current_mode else {
            return Some(default);
        };
        Some(
            actions
                .iter()
                .copied()
                .find(|a| a.mode() == mode)
                .unwrap_or(default),
        )
    }

    /// Action a wildcard repeat code continues, if any.
    fn continuation(&self, wildcard: ActionId) -> Option<ActionId> {
        let Category::Wildcard(mode) = wildcard.category() else {
            return Some(wildcard);
        };
        match self.state.last_action {
            Some(last) if last.mode() == mode && last != wildcard => Some(last),
            _ => {
                trace!("{} has nothing to continue", wildcard);
                None
            }
        }
    }
}
