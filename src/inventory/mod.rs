//! Inventory Module
//!
//! The aggregation core: indexing of fetched collections, storage tier
//! classification, per-VM aggregation, the collection run and the report.

pub mod aggregator;
pub mod classifier;
pub mod collector;
pub mod index;
pub mod report;

pub use aggregator::*;
pub use classifier::*;
pub use collector::*;
pub use index::*;
pub use report::*;
