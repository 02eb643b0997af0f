//! Profile matching module.
//!
//! - `observation` - the scored behavioral snapshot being matched
//! - `weights` - standard and cold-start factor weights
//! - `matcher` - pure scoring and ranking over the catalog

mod matcher;
mod observation;
mod weights;

pub use matcher::{MatchResult, ProfileMatcher, ProfileScore, ScoreComponents};
pub use observation::BehavioralObservation;
pub use weights::{MatchingWeights, WeightMode};
