//! Phase states
//!
//! ## Episode
//! ```text
//! Reset → Search → Approach → Rise → Touch → Reset
//!            │         │        │       │
//!            └─────────┴────────┴───────┴──► Reset  (lost / invalid candidate)
//! ```
//! Every state except Reset follows the candidate surface through the
//! trigger callbacks in [`tracking`].

mod approach;
mod reset;
mod rise;
mod search;
mod touch;
pub mod tracking;

pub use approach::ApproachState;
pub use reset::ResetState;
pub use rise::RiseState;
pub use search::SearchState;
pub use touch::TouchState;

use serde::{Deserialize, Serialize};

use crate::collider::Collider;
use crate::context::InteractionContext;
use crate::fsm::BoxedState;
use crate::query::SpatialQuery;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum InteractionPhase {
    Search,
    Approach,
    Rise,
    Touch,
    Reset,
}

impl InteractionPhase {
    pub const ALL: [InteractionPhase; 5] = [
        InteractionPhase::Search,
        InteractionPhase::Approach,
        InteractionPhase::Rise,
        InteractionPhase::Touch,
        InteractionPhase::Reset,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            InteractionPhase::Search => "search",
            InteractionPhase::Approach => "approach",
            InteractionPhase::Rise => "rise",
            InteractionPhase::Touch => "touch",
            InteractionPhase::Reset => "reset",
        }
    }
}

impl std::fmt::Display for InteractionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.as_str())
    }
}

/// World handed to every phase update.
pub type InteractionWorld = dyn SpatialQuery;

/// Boxed state specialised to environment interaction.
pub type BoxedInteractionState =
    BoxedState<InteractionPhase, InteractionContext, InteractionWorld, Collider>;
