//! Multi-tap text entry, as on a phone keypad.
//!
//! Repeats of the same digit inside the typing window cycle through that
//! digit's letters, replacing the previous one. A pause longer than the
//! general threshold commits the letter and starts over from the first.

use crate::action::{ConcreteAction, Digit, KeySymbol};
use crate::resolver::Timing;

/// Symbol cycle for a multi-tap digit (2-9).
pub fn cycle(digit: Digit) -> Option<&'static [char]> {
    let symbols: &'static [char] = match digit {
        Digit::D2 => &['a', 'b', 'c', '2'],
        Digit::D3 => &['d', 'e', 'f', '3'],
        Digit::D4 => &['g', 'h', 'i', '4'],
        Digit::D5 => &['j', 'k', 'l', '5'],
        Digit::D6 => &['m', 'n', 'o', '6'],
        Digit::D7 => &['p', 'q', 'r', 's', '7'],
        Digit::D8 => &['t', 'u', 'v', '8'],
        Digit::D9 => &['w', 'x', 'y', 'z', '9'],
        Digit::D0 | Digit::D1 => return None,
    };
    Some(symbols)
}

/// Position within the current digit's cycle.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MultiTapTypewriter {
    index: usize,
}

impl MultiTapTypewriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn reset(&mut self) {
        self.index = 0;
    }

    /// Handle a tap of `digit`.
    ///
    /// `repeat_after_ms` is the time since the previous action when that
    /// action was this same digit, `None` for a new key. Returns `None` when
    /// the tap is debounced (or `digit` has no cycle); the index is left
    /// untouched in that case.
    pub fn tap(
        &mut self,
        digit: Digit,
        repeat_after_ms: Option<u64>,
        timing: &Timing,
    ) -> Option<ConcreteAction> {
        let symbols = cycle(digit)?;

        match repeat_after_ms {
            Some(elapsed) if elapsed <= timing.threshold_ms => {
                if elapsed <= timing.typing_threshold_ms {
                    return None;
                }
                self.index = (self.index + 1) % symbols.len();
                Some(ConcreteAction::Retype(KeySymbol::Char(symbols[self.index])))
            }
            // New key, or same key after a long pause
            _ => {
                self.index = 0;
                Some(ConcreteAction::Tap(KeySymbol::Char(symbols[0])))
            }
        }
    }
}
