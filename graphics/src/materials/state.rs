//! Program cache lifecycle state.

use std::sync::atomic::{AtomicU8, Ordering};

/// Lifecycle state of a material's compiled programs.
///
/// ```text
/// Ready ──────────► ToBeUpdated ──► Ready
///   │                  │  ▲
///   │                  └──┘
///   ▼                  ▼
/// Suspend ◄────────────┘
///   │
///   ▼
/// ToBeDeleted (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum MaterialState {
    /// Programs are built and current.
    Ready = 0,
    /// Sources changed; every program is rebuilt on next use.
    ToBeUpdated = 1,
    /// Programs are released on next use.
    Suspend = 2,
    /// Programs were released; the material will not build again.
    ToBeDeleted = 3,
}

impl MaterialState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Ready,
            1 => Self::ToBeUpdated,
            2 => Self::Suspend,
            _ => Self::ToBeDeleted,
        }
    }

    /// Returns `true` if moving from `self` to `next` is allowed.
    pub fn can_transition_to(self, next: Self) -> bool {
        use MaterialState::*;
        matches!(
            (self, next),
            (Ready, ToBeUpdated)
                | (Ready, Suspend)
                | (ToBeUpdated, Ready)
                | (ToBeUpdated, ToBeUpdated)
                | (ToBeUpdated, Suspend)
                | (Suspend, ToBeDeleted)
        )
    }
}

/// A [`MaterialState`] shared between the render thread and loader threads.
///
/// Writers publish with release ordering and readers observe with acquire
/// ordering, so a state read on the render thread sees every declaration
/// written before the transition.
#[derive(Debug)]
pub struct AtomicMaterialState(AtomicU8);

impl AtomicMaterialState {
    /// Create a state flag.
    pub fn new(state: MaterialState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    /// Current state.
    pub fn load(&self) -> MaterialState {
        MaterialState::from_u8(self.0.load(Ordering::Acquire))
    }

    /// Move to `next` if the transition table allows it from the current state.
    ///
    /// Returns the state observed before the attempt; the transition happened
    /// iff `previous.can_transition_to(next)`.
    pub fn transition(&self, next: MaterialState) -> MaterialState {
        let result = self
            .0
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |current| {
                MaterialState::from_u8(current)
                    .can_transition_to(next)
                    .then_some(next as u8)
            });
        let previous = MaterialState::from_u8(match result {
            Ok(previous) | Err(previous) => previous,
        });
        if result.is_err() {
            log::trace!("Ignored material state transition {previous:?} -> {next:?}");
        }
        previous
    }

    /// Move to `next`, returning `true` if the transition was allowed.
    pub fn try_transition(&self, next: MaterialState) -> bool {
        self.transition(next).can_transition_to(next)
    }
}

impl Default for AtomicMaterialState {
    fn default() -> Self {
        Self::new(MaterialState::Ready)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transition_table() {
        use MaterialState::*;
        let all = [Ready, ToBeUpdated, Suspend, ToBeDeleted];
        let allowed = [
            (Ready, ToBeUpdated),
            (Ready, Suspend),
            (ToBeUpdated, Ready),
            (ToBeUpdated, ToBeUpdated),
            (ToBeUpdated, Suspend),
            (Suspend, ToBeDeleted),
        ];
        for from in all {
            for to in all {
                assert_eq!(
                    from.can_transition_to(to),
                    allowed.contains(&(from, to)),
                    "{from:?} -> {to:?}"
                );
            }
        }
    }

    #[test]
    fn test_atomic_transition() {
        let state = AtomicMaterialState::default();
        assert_eq!(state.load(), MaterialState::Ready);

        assert!(state.try_transition(MaterialState::ToBeUpdated));
        assert!(state.try_transition(MaterialState::Suspend));
        // Suspended materials cannot be revived.
        assert!(!state.try_transition(MaterialState::ToBeUpdated));
        assert_eq!(state.load(), MaterialState::Suspend);

        assert!(state.try_transition(MaterialState::ToBeDeleted));
        assert!(!state.try_transition(MaterialState::Ready));
        assert_eq!(state.load(), MaterialState::ToBeDeleted);
    }
}
