//! Mode availability and cycling.
//!
//! A mode is offered only when at least one of its actions is bound to some
//! signal. `App commands` is never offered.

use crate::action::Mode;
use crate::bindings::Bindings;

/// Modes that overlap the bound actions, in declaration order.
pub fn available_modes(bindings: &Bindings) -> Vec<Mode> {
    let used = bindings.used_actions();
    Mode::ALL
        .iter()
        .copied()
        .filter(Mode::is_cyclable)
        .filter(|mode| mode.actions().any(|a| used.contains(&a)))
        .collect()
}

/// Next mode after `current`.
///
/// With fewer than two available modes there is nothing to cycle to and
/// `current` is returned unchanged. A `current` that is no longer available
/// restarts from the first mode.
pub fn advance(current: Option<Mode>, available: &[Mode]) -> Option<Mode> {
    if available.len() <= 1 {
        return current;
    }
    let next = match current.and_then(|m| available.iter().position(|a| *a == m)) {
        Some(idx) => (idx + 1) % available.len(),
        None => 0,
    };
    Some(available[next])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::action::{ActionId, Digit, Direction};
    use crate::bindings::Signal;

    fn bindings(entries: &[(&str, &[ActionId])]) -> Bindings {
        let mut b = Bindings::new();
        for (code, actions) in entries {
            b.insert(Signal::new(code).unwrap(), actions.to_vec())
                .unwrap();
        }
        b
    }

    #[test]
    fn test_empty_bindings_have_no_modes() {
        assert!(available_modes(&Bindings::new()).is_empty());
    }

    #[test]
    fn test_app_commands_never_offered() {
        let b = bindings(&[("A", &[ActionId::Quit]), ("B", &[ActionId::Mode])]);
        assert!(available_modes(&b).is_empty());
    }

    #[test]
    fn test_mouse_only_bindings() {
        let b = bindings(&[
            ("A", &[ActionId::MoveMouse(Direction::Left)]),
            ("B", &[ActionId::MouseLeftClick, ActionId::Mode]),
        ]);
        assert_eq!(available_modes(&b), vec![Mode::MouseControl]);
    }

    #[test]
    fn test_declaration_order_not_binding_order() {
        let b = bindings(&[
            ("A", &[ActionId::Enter]),
            ("B", &[ActionId::TypeDigit(Digit::D2)]),
            ("C", &[ActionId::MouseWildcard]),
        ]);
        assert_eq!(
            available_modes(&b),
            vec![Mode::MouseControl, Mode::Typing, Mode::NavigationControl]
        );
    }

    #[test]
    fn test_advance_wraps() {
        let available = [Mode::MouseControl, Mode::Typing];
        assert_eq!(advance(None, &available), Some(Mode::MouseControl));
        assert_eq!(
            advance(Some(Mode::MouseControl), &available),
            Some(Mode::Typing)
        );
        assert_eq!(
            advance(Some(Mode::Typing), &available),
            Some(Mode::MouseControl)
        );
    }

    #[test]
    fn test_advance_needs_two_modes() {
        assert_eq!(advance(None, &[Mode::Typing]), None);
        assert_eq!(advance(None, &[]), None);
        assert_eq!(
            advance(Some(Mode::Typing), &[Mode::Typing]),
            Some(Mode::Typing)
        );
    }

    #[test]
    fn test_advance_from_stale_mode_restarts() {
        let available = [Mode::Typing, Mode::NavigationControl];
        assert_eq!(
            advance(Some(Mode::MouseControl), &available),
            Some(Mode::Typing)
        );
    }
}
