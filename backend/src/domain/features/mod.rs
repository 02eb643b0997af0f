//! Feature extractors that turn raw prompt history into observation inputs.

mod complexity;
mod consistency;
mod expertise;

pub use complexity::{ComplexityCalculator, DEFAULT_COMPLEXITY};
pub use consistency::{ConsistencyCalculator, DEFAULT_CONSISTENCY};
pub use expertise::{
    confidence_delta, DomainExpertise, ExpertiseLevel, COLD_START_CONFIDENCE, DECAY_FACTOR,
    DECAY_IDLE_DAYS,
};
