//! Core types for VIGIL

mod phase;
mod choice;
mod metrics;
mod session;
mod state;
mod reason;
mod output;
mod pacing;

pub use phase::{PhaseKind, BlockKind, ContentBlock, ChoiceOption, PhaseDefinition};
pub use choice::ResolvedChoice;
pub use metrics::{HiddenMetrics, MetricEvent};
pub use session::SessionState;
pub use state::SubPhase;
pub use reason::ReasonCode;
pub use output::SessionView;
pub use pacing::Pacing;
