//! Progress snapshot for display.

use serde::Serialize;

use super::registry::StepRegistry;
use super::state::ProgressState;

/// Presentation-ready progress.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Progress {
    pub current_step: usize,
    pub total_steps: usize,
    pub completed: bool,
}

impl Progress {
    /// Project stored progress against the registry. The total always comes
    /// from the registry, never from what was stored.
    pub fn of(state: &ProgressState, registry: &StepRegistry) -> Self {
        Self {
            current_step: state.current_step,
            total_steps: registry.len(),
            completed: state.completed,
        }
    }
}
