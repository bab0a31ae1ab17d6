//! Signal codes and the actions bound to them.

use std::collections::{BTreeMap, HashSet};
use std::fmt;
use std::str::FromStr;

use crate::action::ActionId;
use crate::error::EngineError;

/// One decoded remote-button code, as received over the serial link.
///
/// Compared by exact string equality. Surrounding whitespace is trimmed on
/// construction; an empty code is not a signal.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Signal(String);

impl Signal {
    pub fn new(code: impl AsRef<str>) -> Result<Self, EngineError> {
        let code = code.as_ref();
        let trimmed = code.trim();
        if trimmed.is_empty() || trimmed.chars().any(char::is_control) {
            return Err(EngineError::InvalidSignal(code.to_string()));
        }
        Ok(Self(trimmed.to_string()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for Signal {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Signal::new(s)
    }
}

/// Signal → ordered action list, most recently saved first.
///
/// Every stored list is non-empty; its first element is the default action.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Bindings {
    map: BTreeMap<Signal, Vec<ActionId>>,
}

impl Bindings {
    pub fn new() -> Self {
        Self::default()
    }

    /// Actions bound to `signal`, default first.
    pub fn get(&self, signal: &Signal) -> Option<&[ActionId]> {
        self.map.get(signal).map(Vec::as_slice)
    }

    /// Replace the whole list for `signal`.
    ///
    /// Duplicate actions keep their first occurrence.
    pub fn insert(&mut self, signal: Signal, actions: Vec<ActionId>) -> Result<(), EngineError> {
        if actions.is_empty() {
            return Err(EngineError::EmptyBinding(signal.to_string()));
        }
        let mut seen = HashSet::new();
        let actions = actions.into_iter().filter(|a| seen.insert(*a)).collect();
        self.map.insert(signal, actions);
        Ok(())
    }

    /// Make `action` the new default for `signal`, keeping older bindings
    /// behind it.
    pub fn prepend(&mut self, signal: Signal, action: ActionId) {
        let list = self.map.entry(signal).or_default();
        list.retain(|a| *a != action);
        list.insert(0, action);
    }

    pub fn remove(&mut self, signal: &Signal) -> Option<Vec<ActionId>> {
        self.map.remove(signal)
    }

    pub fn clear(&mut self) {
        self.map.clear();
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Signal, &[ActionId])> {
        self.map.iter().map(|(s, a)| (s, a.as_slice()))
    }

    /// Union of every action bound to any signal.
    pub fn used_actions(&self) -> HashSet<ActionId> {
        self.map.values().flatten().copied().collect()
    }
}
