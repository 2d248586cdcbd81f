//! Run/cancel toggle state machine
//!
//! One control both submits and cancels. Instead of branching inside a click
//! handler, every (state, trigger) pair resolves through [`transition`] to the
//! action to perform and the state to move to.

use serde::{Deserialize, Serialize};

/// UI-facing state of the run button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ButtonState {
    #[default]
    Ready,
    Pending,
    Error,
}

impl ButtonState {
    /// Label shown on the control
    pub fn label(&self) -> &'static str {
        match self {
            Self::Ready => "Run",
            Self::Pending => "Cancel",
            Self::Error => "Failed",
        }
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, Self::Pending)
    }
}

/// Events that can move the button
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonTrigger {
    /// The user pressed the control
    Press,
    /// The job finished successfully
    JobDone,
    /// The job failed
    JobFailed,
    /// The error auto-reset delay elapsed
    ResetElapsed,
}

/// Side effect attached to a transition
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ButtonAction {
    Submit,
    Cancel,
    ArmReset,
    None,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Transition {
    pub action: ButtonAction,
    pub next: ButtonState,
}

/// Resolve a trigger against the current state.
///
/// Returns `None` for pairs that have no effect (for example a late
/// `JobDone` after the user already cancelled).
pub fn transition(state: ButtonState, trigger: ButtonTrigger) -> Option<Transition> {
    use ButtonAction as A;
    use ButtonState as S;
    use ButtonTrigger as T;

    let (action, next) = match (state, trigger) {
        (S::Ready | S::Error, T::Press) => (A::Submit, S::Pending),
        (S::Pending, T::Press) => (A::Cancel, S::Ready),
        (S::Pending, T::JobDone) => (A::None, S::Ready),
        (S::Pending, T::JobFailed) => (A::ArmReset, S::Error),
        (S::Error, T::ResetElapsed) => (A::None, S::Ready),
        _ => return None,
    };
    Some(Transition { action, next })
}
