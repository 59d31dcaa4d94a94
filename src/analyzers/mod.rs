//! Filing timing analyses.
//!
//! This module groups acceptances into daily-normalized time-of-day buckets,
//! builds cumulative distributions, filters same-day and market-hours
//! subsets, finds extreme acceptance times, and composes these stages into
//! the reports the CLI writes out.

pub mod cumulative;
pub mod distribution;
pub mod extremum;
pub mod filter;
pub mod report;
pub mod types;
pub mod utility;
