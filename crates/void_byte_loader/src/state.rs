//! Loader lifecycle state

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle of a byte loader
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum LoadState {
    /// Not loaded yet (bytes may or may not be present)
    Pending = 0,
    /// A background task is decoding the bytes
    Loading = 1,
    /// Decoded, result available
    Succeeded = 2,
    /// Finished without a result
    Failed = 3,
}

impl LoadState {
    /// Terminal states count as loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self, Self::Succeeded | Self::Failed)
    }
}

impl From<u8> for LoadState {
    fn from(v: u8) -> Self {
        match v {
            1 => Self::Loading,
            2 => Self::Succeeded,
            3 => Self::Failed,
            _ => Self::Pending,
        }
    }
}

impl std::fmt::Display for LoadState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Loading => write!(f, "loading"),
            Self::Succeeded => write!(f, "succeeded"),
            Self::Failed => write!(f, "failed"),
        }
    }
}

/// Atomic cell holding a [`LoadState`]
///
/// Terminal states are sticky: once loaded, further transitions are ignored.
#[derive(Debug)]
pub struct StateCell(AtomicU8);

impl StateCell {
    pub fn new() -> Self {
        Self(AtomicU8::new(LoadState::Pending as u8))
    }

    pub fn get(&self) -> LoadState {
        LoadState::from(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` unless already in a terminal state.
    /// Returns whether the transition happened.
    pub fn transition(&self, next: LoadState) -> bool {
        self.0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                if LoadState::from(current).is_loaded() {
                    None
                } else {
                    Some(next as u8)
                }
            })
            .is_ok()
    }
}

impl Default for StateCell {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_terminal_states_are_sticky() {
        let cell = StateCell::new();
        assert_eq!(cell.get(), LoadState::Pending);

        assert!(cell.transition(LoadState::Loading));
        assert!(cell.transition(LoadState::Failed));
        assert!(!cell.transition(LoadState::Pending));
        assert!(!cell.transition(LoadState::Succeeded));
        assert_eq!(cell.get(), LoadState::Failed);
    }

    #[test]
    fn test_is_loaded() {
        assert!(!LoadState::Pending.is_loaded());
        assert!(!LoadState::Loading.is_loaded());
        assert!(LoadState::Succeeded.is_loaded());
        assert!(LoadState::Failed.is_loaded());
    }
}
