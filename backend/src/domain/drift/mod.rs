//! Drift detection module.
//!
//! Notices when an assigned user's behavior has durably moved to a
//! different profile.

mod detector;

pub use detector::{DriftFinding, DriftPolicy, DriftSeverity};
