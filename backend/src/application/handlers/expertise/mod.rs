//! Domain expertise handlers.

mod decay_expertise;
mod update_expertise;

pub use decay_expertise::{DecayExpertiseHandler, DecayExpertiseResult};
pub use update_expertise::{UpdateExpertiseCommand, UpdateExpertiseHandler, UpdateExpertiseResult};
