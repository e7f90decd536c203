//! Shell lifecycle state and the control enablement derived from it

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ShellState {
    #[default]
    Idle,
    Evaluating,
    Aborting,
}

impl ShellState {
    pub fn is_idle(self) -> bool {
        self == ShellState::Idle
    }

    /// True while a submission is outstanding (evaluating or aborting)
    pub fn is_busy(self) -> bool {
        !self.is_idle()
    }
}

impl fmt::Display for ShellState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ShellState::Idle => "idle",
            ShellState::Evaluating => "evaluating",
            ShellState::Aborting => "aborting",
        };
        f.write_str(name)
    }
}

/// Which controls the user can interact with.
///
/// Never stored: always computed from the state, so evaluate is enabled only
/// in `Idle` and abort only in `Evaluating`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Controls {
    pub evaluate_enabled: bool,
    /// `None` when the layout has no abort button
    pub abort_enabled: Option<bool>,
}

impl Controls {
    pub fn for_state(state: ShellState, has_abort: bool) -> Self {
        Controls {
            evaluate_enabled: state == ShellState::Idle,
            abort_enabled: has_abort.then_some(state == ShellState::Evaluating),
        }
    }
}
