//! `tagtrend-recon`: incremental tag-history reconciliation engine.
//!
//! Pure engine crate: receives a sheet source and store handles, decides
//! what to recompute, and writes the reconciled history back through the
//! stores. No file or CLI dependencies.

pub mod classify;
pub mod engine;
pub mod error;
pub mod evaluate;
pub mod model;
pub mod trend;

pub use classify::{classify, tag_status, TagChanges, TagStatus};
pub use engine::{run, RunOptions, Stores};
pub use error::ReconError;
pub use evaluate::{evaluate, Evaluation};
pub use model::{Diagnostic, Outcome, RunReport};
pub use trend::{trend, TrendSummary};
