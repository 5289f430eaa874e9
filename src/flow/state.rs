//! Flow progress state machine.

use serde::{Deserialize, Serialize};

/// The two phases of a question flow.
///
/// `Collecting` while steps remain, then `Complete`. Nothing leaves
/// `Complete` except a full session reset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FlowPhase {
    Collecting,
    Complete,
}

impl FlowPhase {
    /// Whether this phase is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Complete)
    }
}

impl std::fmt::Display for FlowPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            Self::Collecting => "collecting",
            Self::Complete => "complete",
        };
        write!(f, "{s}")
    }
}

/// Persisted progress through the step registry.
///
/// `completed` always equals `current_step >= total_steps`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProgressState {
    pub current_step: usize,
    pub total_steps: usize,
    pub completed: bool,
}

impl ProgressState {
    /// Fresh progress at step 0.
    pub fn new(total_steps: usize) -> Self {
        Self {
            current_step: 0,
            total_steps,
            completed: total_steps == 0,
        }
    }

    pub fn phase(&self) -> FlowPhase {
        if self.completed || self.current_step >= self.total_steps {
            FlowPhase::Complete
        } else {
            FlowPhase::Collecting
        }
    }

    /// Move forward by exactly one step and return the resulting phase.
    ///
    /// `total_steps` is refreshed from the caller so a stale stored total
    /// can't keep a session open.
    pub fn advance(&mut self, total_steps: usize) -> FlowPhase {
        self.current_step += 1;
        self.total_steps = total_steps;
        if self.current_step >= self.total_steps {
            self.completed = true;
        }
        self.phase()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_state_is_collecting() {
        let state = ProgressState::new(3);
        assert_eq!(state.current_step, 0);
        assert_eq!(state.total_steps, 3);
        assert!(!state.completed);
        assert_eq!(state.phase(), FlowPhase::Collecting);
    }

    #[test]
    fn advance_walks_to_complete() {
        let mut state = ProgressState::new(3);
        assert_eq!(state.advance(3), FlowPhase::Collecting);
        assert_eq!(state.advance(3), FlowPhase::Collecting);
        assert_eq!(state.advance(3), FlowPhase::Complete);
        assert!(state.completed);
        assert_eq!(state.current_step, 3);
        assert!(state.phase().is_terminal());
    }

    #[test]
    fn advance_refreshes_stale_total() {
        let mut state = ProgressState {
            current_step: 1,
            total_steps: 10,
            completed: false,
        };
        assert_eq!(state.advance(2), FlowPhase::Complete);
        assert_eq!(state.total_steps, 2);
        assert!(state.completed);
    }

    #[test]
    fn serde_uses_camel_case() {
        let state = ProgressState::new(13);
        let json = serde_json::to_value(&state).unwrap();
        assert_eq!(
            json,
            serde_json::json!({"currentStep": 0, "totalSteps": 13, "completed": false})
        );
    }

    #[test]
    fn display_matches_serde() {
        for phase in [FlowPhase::Collecting, FlowPhase::Complete] {
            let json = serde_json::to_string(&phase).unwrap();
            assert_eq!(format!("\"{phase}\""), json);
        }
    }
}
