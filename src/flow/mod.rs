//! Question flow: the fixed interview that fills a resume document.
//!
//! A `StepRegistry` lists the questions in order. `FlowEngine` takes one
//! answer at a time for a session: the answer is validated against the
//! current step's rule, reshaped by its transform, written into the session's
//! document at the step's path, and progress moves on by one. Rejected
//! answers leave the session untouched so the same question is asked again.

pub mod engine;
pub mod path;
pub mod progress;
pub mod registry;
pub mod rules;
pub mod state;

pub use engine::{FlowEngine, FlowOutcome};
pub use path::FieldPath;
pub use progress::Progress;
pub use registry::{Step, StepRegistry};
pub use rules::{Rule, Transform};
pub use state::{FlowPhase, ProgressState};
