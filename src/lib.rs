//! Residential solar and battery recommendation engine.
//!
//! Turns a short customer intake into priced system candidates across three
//! package tiers, models their energy flows, rebates and returns, and picks a
//! brand-diverse shortlist.

#[cfg(feature = "api")]
pub mod api;
pub mod candidate;
pub mod catalog;
pub mod config;
pub mod energy;
pub mod engine;
pub mod error;
pub mod intake;
pub mod io;
pub mod rebate;
pub mod report;
pub mod roi;
/// Sub-scores, weighted totals and the diversified shortlist.
pub mod scoring;
pub mod sizing;
pub mod sku;
pub mod tariff;

pub use engine::{Engine, Recommendation};
pub use error::EngineError;
