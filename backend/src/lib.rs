//! Profile Assignment - behavioral profile matching and assignment engine
//!
//! Scores behavioral observations against a fixed catalog of user profiles,
//! keeps per-profile ranking state over time, assigns a stable profile once
//! the evidence is strong enough, and reassigns it when behavior drifts.

pub mod adapters;
pub mod application;
pub mod config;
pub mod domain;
pub mod ports;
