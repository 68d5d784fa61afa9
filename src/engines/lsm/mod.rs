//! Least-squares Monte Carlo early exercise.

pub mod longstaff_schwartz;

pub use longstaff_schwartz::{LongstaffSchwartz, LsmOutcome};
